use crate::error::KeepupError;
use crate::platform::Target;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Identifier supervised when none is configured
pub const DEFAULT_IDENTIFIER: &str = "com.yourcompany.BISPlayer";

/// Poll interval used when none is configured (in milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Startup configuration of a supervisor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct SupervisorConfig {
    /// Identifier of the application to keep running
    #[serde(default = "default_identifier")]
    #[builder(default = "default_identifier()")]
    pub identifier: String,

    /// Delay between two liveness checks (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    #[builder(default = "default_poll_interval_ms()")]
    pub poll_interval_ms: u64,

    /// Directories searched when resolving the identifier.
    /// Empty means the platform default (`$PATH` on Unix).
    #[serde(default)]
    #[builder(default)]
    #[builder(setter(custom))]
    pub search_paths: Vec<PathBuf>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            identifier: default_identifier(),
            poll_interval_ms: default_poll_interval_ms(),
            search_paths: Vec::new(),
        }
    }
}

impl SupervisorConfig {
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, KeepupError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, KeepupError> {
        let config: SupervisorConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid
    pub fn validate(&self) -> Result<(), KeepupError> {
        if self.identifier.trim().is_empty() {
            return Err(KeepupError::configuration(
                "identifier must not be empty",
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(KeepupError::configuration(
                "poll_interval_ms must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Get the poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Build the supervised target from the configured identifier
    pub fn target(&self) -> Result<Target, KeepupError> {
        Target::new(self.identifier.clone())
    }
}

impl SupervisorConfigBuilder {
    pub fn search_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.search_paths
            .get_or_insert_with(Vec::new)
            .push(path.into());
        self
    }

    pub fn search_paths<P: Into<PathBuf>, I: IntoIterator<Item = P>>(
        &mut self,
        iter: I,
    ) -> &mut Self {
        let paths = self.search_paths.get_or_insert_with(Vec::new);
        paths.extend(iter.into_iter().map(Into::into));
        self
    }
}

// Default value functions for serde
fn default_identifier() -> String {
    DEFAULT_IDENTIFIER.to_string()
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
