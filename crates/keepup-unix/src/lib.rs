#[cfg(unix)]
mod unix_platform;

#[cfg(unix)]
pub use unix_platform::UnixApplicationPlatform;

#[cfg(unix)]
pub struct UnixApplicationPlatformFactory;

#[cfg(unix)]
impl UnixApplicationPlatformFactory {
    pub fn create_platform(config: &keepup_core::SupervisorConfig) -> UnixApplicationPlatform {
        UnixApplicationPlatform::with_search_paths(config.search_paths.clone())
    }

    pub fn platform_name() -> &'static str {
        "Unix"
    }
}
