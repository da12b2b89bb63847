pub mod admin;
pub mod auth;
pub mod issue;
pub mod issue_type;
pub mod password;
pub mod photo;
pub mod statistics;
pub mod user;
