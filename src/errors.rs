use thiserror::Error;

/// Failures reported by a [`crate::store::DocumentStore`].
///
/// The query layer never inspects these beyond deciding whether they are retryable.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("invalid field path `{path}`: {reason}")]
    InvalidFieldPath { path: String, reason: &'static str },

    #[error("invalid query input: {0}")]
    InvalidInput(String),

    #[error("expected at most one action, found {found}")]
    MultipleMatches { found: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("authorization evaluation failed: {0}")]
    Authorization(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("BSON: {0}")]
    Decode(#[from] bson::error::Error),
}

/// Coarse classification used by callers to route failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before reaching storage.
    Input,
    Authorization,
    Storage,
}

impl ActionError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFieldPath { .. }
            | Self::InvalidInput(_)
            | Self::MultipleMatches { .. }
            | Self::Config(_) => ErrorKind::Input,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Storage(_) | Self::Decode(_) => ErrorKind::Storage,
        }
    }

    /// True for infrastructure failures a caller may retry. This layer never retries itself.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(StoreError::Unavailable(_) | StoreError::Timeout { .. }))
    }
}

impl From<toml::de::Error> for ActionError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}
