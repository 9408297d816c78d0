//! keepup - keeps a single application running
//!
//! Selects the platform implementation for the current host and wires it
//! to the supervisor from `keepup-core`.

mod cli;
mod logging;
mod platform_factory;

pub use cli::Cli;
pub use logging::{DEFAULT_LOG_FILTER, LogFormat, init_logging};
pub use platform_factory::{PlatformApplicationFactory, create_platform};

// Re-export core functionality
pub use keepup_core::*;

/// Validate `config` and start supervising its target on the current runtime
pub fn supervise(config: &SupervisorConfig) -> Result<SupervisionHandle, KeepupError> {
    config.validate()?;
    let target = config.target()?;
    let platform = create_platform(config);
    Supervisor::new(target, platform).start(config.poll_interval())
}
