use thiserror::Error;

pub type Result<T, E = HistoryError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("`<{operation}>` {reason} Got {actual:?}")]
    InvalidArgument {
        operation: &'static str,
        reason: &'static str,
        actual: String,
    },
    #[error(
        "`<{0}>` No usable document context could be found. Use a memory history in test or \
         server-side environments."
    )]
    EnvironmentUnavailable(&'static str),
    #[error("Platform history error: {0}")]
    Platform(String),
    #[error("Entry state could not be serialized")]
    State(#[from] serde_json::Error),
    #[error("Entry state could not be handed to the platform: {0}")]
    StateConversion(String),
}

impl HistoryError {
    pub(crate) fn invalid(
        operation: &'static str,
        reason: &'static str,
        actual: impl Into<String>,
    ) -> Self {
        HistoryError::InvalidArgument {
            operation,
            reason,
            actual: actual.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, HistoryError::InvalidArgument { .. })
    }
}

/// Rejects anything that is not an absolute path. Search or hash only uris are not
/// accepted by `push` and `replace`.
pub(crate) fn assert_absolute_uri(operation: &'static str, uri: &str) -> Result<()> {
    if !uri.starts_with('/') {
        return Err(HistoryError::invalid(
            operation,
            "First argument must start with \"/\".",
            uri,
        ));
    }
    Ok(())
}
