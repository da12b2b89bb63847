pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod infra;
pub mod router;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod usecase;
