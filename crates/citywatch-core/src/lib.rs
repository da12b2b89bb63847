//! Plumbing shared by Citywatch binaries: health probe, request ids,
//! tracing bootstrap, serde helpers and the response cache.

pub mod cache;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
