use crate::error::{KeepupError, PlatformError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Unique identifier for a process
pub type ProcessId = u32;

/// The application a supervisor keeps alive.
///
/// The identifier is fixed at construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    identifier: String,
}

impl Target {
    /// Create a target, rejecting empty or whitespace-only identifiers
    pub fn new(identifier: impl Into<String>) -> Result<Self, KeepupError> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(KeepupError::configuration(
                "target identifier must not be empty",
            ));
        }
        Ok(Self { identifier })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// One entry of a running-applications snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningApplication {
    pub identifier: String,
    pub pid: ProcessId,
    /// Other names the process answers to (launch name, process name)
    pub aliases: Vec<String>,
}

/// Resolved, launchable reference to an installed application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReference {
    pub identifier: String,
    pub location: PathBuf,
}

/// Options passed to the platform when launching an application.
///
/// The supervisor always launches with `LaunchOptions::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// Process introspection and application launching on the host
///
/// Implementations are expected to return quickly; a slow call only delays
/// the next supervision tick.
#[async_trait]
pub trait ApplicationPlatform: Send + Sync {
    /// Snapshot of the applications currently running on the host
    async fn list_running_applications(&self) -> Result<Vec<RunningApplication>, PlatformError>;

    /// Whether `application` is an instance of `identifier`.
    ///
    /// Platforms with richer identifier schemes (paths, links) override this.
    fn matches(&self, identifier: &str, application: &RunningApplication) -> bool {
        application.identifier == identifier
            || application.aliases.iter().any(|alias| alias == identifier)
    }

    /// The first running instance of `identifier`, if any
    async fn find_running(
        &self,
        identifier: &str,
    ) -> Result<Option<RunningApplication>, PlatformError> {
        let applications = self.list_running_applications().await?;
        Ok(applications
            .into_iter()
            .find(|application| self.matches(identifier, application)))
    }

    /// Resolve an identifier to something that can be launched
    async fn resolve_application(&self, identifier: &str) -> Option<LaunchReference>;

    /// Ask the host to start the referenced application
    async fn launch_application(
        &self,
        reference: &LaunchReference,
        options: &LaunchOptions,
    ) -> Result<(), PlatformError>;

    /// Platform name for logging and debugging
    fn platform_name(&self) -> &'static str;
}
