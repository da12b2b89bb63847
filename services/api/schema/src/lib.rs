//! sea-orm entities for the Citywatch API database.

pub mod issue_types;
pub mod issues;
pub mod photos;
pub mod roles;
pub mod users;
