pub mod issue;
pub mod issue_type;
pub mod photo;
pub mod statistics;
pub mod user;

use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Parse a raw query string with `serde_qs`; an absent query yields the default.
pub(crate) fn parse_query<T: DeserializeOwned + Default>(
    raw_query: Option<String>,
) -> Result<T, ApiError> {
    raw_query
        .as_deref()
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|e| ApiError::Validation(format!("invalid query string: {e}")))
        .map(Option::unwrap_or_default)
}
