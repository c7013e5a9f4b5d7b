// ============================================================================
// Error Handling
// ============================================================================

/// Failure of one fetch against an upstream feed, or of a collaborator the
/// poller depends on. A failed poll never touches the current view state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Station '{0}' has no matching information record")]
    JoinMiss(String),

    #[error("No {0} endpoint configured")]
    NotConfigured(&'static str),

    #[error("Location permission denied")]
    PermissionDenied,
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid map region: {0}")]
    Region(#[from] crate::models::InvalidRegion),

    #[error("Unknown timezone '{0}'")]
    Timezone(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
