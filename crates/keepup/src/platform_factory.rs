use keepup_core::{ApplicationPlatform, SupervisorConfig};
use std::sync::Arc;
use tracing::info;

#[cfg(not(unix))]
compile_error!("Unsupported platform: only Unix is currently supported");

/// Platform-independent factory that selects the appropriate implementation at compile time
pub struct PlatformApplicationFactory;

impl PlatformApplicationFactory {
    pub fn create_platform(config: &SupervisorConfig) -> Arc<dyn ApplicationPlatform> {
        #[cfg(unix)]
        {
            info!("Creating Unix application platform");
            Arc::new(keepup_unix::UnixApplicationPlatformFactory::create_platform(
                config,
            ))
        }
    }

    pub fn platform_name() -> &'static str {
        #[cfg(unix)]
        {
            keepup_unix::UnixApplicationPlatformFactory::platform_name()
        }
    }
}

/// Convenience function to create the platform for the current host
pub fn create_platform(config: &SupervisorConfig) -> Arc<dyn ApplicationPlatform> {
    PlatformApplicationFactory::create_platform(config)
}
