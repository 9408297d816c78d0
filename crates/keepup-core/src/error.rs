use thiserror::Error;

/// Errors reported by an [`ApplicationPlatform`](crate::ApplicationPlatform)
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Running applications cannot be listed: {0}")]
    QueryUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to spawn application: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Other platform error: {0}")]
    Other(String),
}

/// Outcome of a failed launch attempt
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Application not found: {0}")]
    NotFound(String),

    #[error("Failed to launch {identifier}: {cause}")]
    LaunchFailed {
        identifier: String,
        #[source]
        cause: PlatformError,
    },
}

impl LaunchError {
    /// Identifier of the application the launch was attempted for
    pub fn identifier(&self) -> &str {
        match self {
            LaunchError::NotFound(identifier) => identifier,
            LaunchError::LaunchFailed { identifier, .. } => identifier,
        }
    }

    /// Short, stable name of the failure kind, used in events and logs
    pub fn kind(&self) -> &'static str {
        match self {
            LaunchError::NotFound(_) => "not_found",
            LaunchError::LaunchFailed { .. } => "launch_failed",
        }
    }
}

/// Setup-time errors. Nothing that happens inside a running supervision
/// loop is ever surfaced through this type.
#[derive(Error, Debug)]
pub enum KeepupError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl KeepupError {
    pub fn configuration(message: impl Into<String>) -> Self {
        KeepupError::Configuration(message.into())
    }
}
