use thiserror::Error;

/// A purchase payload is missing required fields.
///
/// `missing` lists exactly the absent or falsy fields, in the order the
/// provider declares them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// Errors returned by relay operations.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("provider call failed: {0}")]
    ProviderCall(String),

    #[error("malformed notification: {0}")]
    MalformedNotification(String),
}

impl RelayError {
    /// True for errors whose detail may be shown to the caller.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RelayError::Validation(_))
    }
}
