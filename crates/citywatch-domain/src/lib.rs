//! Domain values shared by the Citywatch service and its tooling.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod issue;
pub mod pagination;
pub mod user;
