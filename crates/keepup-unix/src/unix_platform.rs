use async_trait::async_trait;
use keepup_core::{
    ApplicationPlatform, LaunchOptions, LaunchReference, PlatformError, RunningApplication,
};
use nix::unistd::{AccessFlags, access};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use sysinfo::{Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Linux truncates a process name (`comm`) to this many bytes
const COMM_NAME_LEN: usize = 15;

/// Unix host platform.
///
/// An identifier is either a bare executable name (`"firefox"`), resolved
/// through the search directories, or a path containing `/`, resolved as
/// that exact executable.
///
/// A running process is an instance of the identifier when its executable
/// is one of the files the identifier resolves to after following symlinks,
/// or, for bare names, when its executable file name, process name or
/// launch name (`argv[0]`) equals the identifier.
pub struct UnixApplicationPlatform {
    system: Arc<Mutex<System>>,
    search_paths: Vec<PathBuf>,
}

impl Default for UnixApplicationPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl UnixApplicationPlatform {
    /// Platform resolving bare names through `$PATH`
    pub fn new() -> Self {
        Self::with_search_paths(Vec::new())
    }

    /// Platform resolving bare names through `search_paths`, or `$PATH` when empty
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        info!("Initializing Unix application platform with system monitoring");
        Self {
            system: Arc::new(Mutex::new(System::new())),
            search_paths,
        }
    }

    fn search_dirs(search_paths: &[PathBuf]) -> Vec<PathBuf> {
        if !search_paths.is_empty() {
            return search_paths.to_vec();
        }

        std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default()
    }

    fn is_executable(path: &Path) -> bool {
        path.is_file() && access(path, AccessFlags::X_OK).is_ok()
    }

    fn is_path_identifier(identifier: &str) -> bool {
        identifier.contains('/')
    }

    /// Executable path when readable, process name otherwise
    fn application_identifier(process: &Process) -> String {
        match process.exe() {
            Some(exe) if !exe.as_os_str().is_empty() => exe.to_string_lossy().into_owned(),
            _ => process.name().to_string_lossy().into_owned(),
        }
    }

    /// Process name and launch name, minus duplicates of `identifier`
    fn aliases(process: &Process, identifier: &str) -> Vec<String> {
        let name = process.name().to_string_lossy().into_owned();
        let launch_name = process
            .cmd()
            .first()
            .and_then(|arg0| Path::new(arg0).file_name())
            .map(|name| name.to_string_lossy().into_owned());

        let mut aliases: Vec<String> = Vec::new();
        for alias in std::iter::once(name).chain(launch_name) {
            if !alias.is_empty() && alias != identifier && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
        aliases
    }

    fn snapshot(system: &mut System) -> Result<Vec<RunningApplication>, PlatformError> {
        // Always re-read: a pid that exec'd since the last tick has a new exe and argv
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_exe(UpdateKind::Always)
                .with_cmd(UpdateKind::Always),
        );

        if system.processes().is_empty() {
            return Err(PlatformError::QueryUnavailable(
                "process table is empty".to_string(),
            ));
        }

        let applications: Vec<RunningApplication> = system
            .processes()
            .iter()
            .filter(|(_, process)| process.thread_kind().is_none())
            .filter(|(_, process)| !matches!(process.status(), ProcessStatus::Zombie))
            .map(|(pid, process)| {
                let identifier = Self::application_identifier(process);
                RunningApplication {
                    aliases: Self::aliases(process, &identifier),
                    identifier,
                    pid: pid.as_u32(),
                }
            })
            .collect();

        debug!("Listed {} running applications", applications.len());
        Ok(applications)
    }

    fn with_locked_system<T>(
        system: &Mutex<System>,
        f: impl FnOnce(&mut System) -> Result<T, PlatformError>,
    ) -> Result<T, PlatformError> {
        let mut system = system.lock().map_err(|_| {
            PlatformError::QueryUnavailable("process table lock poisoned".to_string())
        })?;
        f(&mut system)
    }

    async fn blocking_query<T, F>(&self, f: F) -> Result<T, PlatformError>
    where
        T: Send + 'static,
        F: FnOnce(&mut System) -> Result<T, PlatformError> + Send + 'static,
    {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(PlatformError::QueryUnavailable(
                "process listing is not supported on this system".to_string(),
            ));
        }

        let system = Arc::clone(&self.system);
        tokio::task::spawn_blocking(move || Self::with_locked_system(&system, f))
            .await
            .map_err(|e| {
                PlatformError::QueryUnavailable(format!("process listing worker failed: {e}"))
            })?
    }

    fn spawn_error(location: &Path, error: std::io::Error) -> PlatformError {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                PlatformError::PermissionDenied(format!("{}: {error}", location.display()))
            }
            _ => PlatformError::Spawn(error),
        }
    }
}

#[async_trait]
impl ApplicationPlatform for UnixApplicationPlatform {
    async fn list_running_applications(&self) -> Result<Vec<RunningApplication>, PlatformError> {
        self.blocking_query(Self::snapshot).await
    }

    /// Resolves `identifier` on every call; prefer [`find_running`](Self::find_running)
    fn matches(&self, identifier: &str, application: &RunningApplication) -> bool {
        IdentifierMatcher::new(identifier, &self.search_paths).matches(application)
    }

    async fn find_running(
        &self,
        identifier: &str,
    ) -> Result<Option<RunningApplication>, PlatformError> {
        let search_paths = self.search_paths.clone();
        let identifier = identifier.to_string();

        self.blocking_query(move |system| {
            let applications = Self::snapshot(system)?;
            let matcher = IdentifierMatcher::new(&identifier, &search_paths);
            Ok(applications
                .into_iter()
                .find(|application| matcher.matches(application)))
        })
        .await
    }

    async fn resolve_application(&self, identifier: &str) -> Option<LaunchReference> {
        let location = if Self::is_path_identifier(identifier) {
            let path = PathBuf::from(identifier);
            Self::is_executable(&path).then_some(path)
        } else {
            Self::search_dirs(&self.search_paths)
                .into_iter()
                .map(|dir| dir.join(identifier))
                .find(|candidate| Self::is_executable(candidate))
        };

        match location {
            Some(location) => Some(LaunchReference {
                identifier: identifier.to_string(),
                location,
            }),
            None => {
                debug!("No executable found for {}", identifier);
                None
            }
        }
    }

    async fn launch_application(
        &self,
        reference: &LaunchReference,
        options: &LaunchOptions,
    ) -> Result<(), PlatformError> {
        let mut command = Command::new(&reference.location);
        command
            .args(&options.args)
            .envs(&options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            // Own process group so a Ctrl-C aimed at the supervisor leaves the app alone
            .process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| Self::spawn_error(&reference.location, e))?;

        let pid = child.id();
        info!(
            "Spawned {} (PID: {:?}) from {}",
            reference.identifier,
            pid,
            reference.location.display()
        );

        // Reap the child so an exited app never lingers as a zombie entry
        let identifier = reference.identifier.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => info!("{} (PID: {:?}) exited: {}", identifier, pid, status),
                Err(e) => warn!("Failed to wait on {} (PID: {:?}): {}", identifier, pid, e),
            }
        });

        Ok(())
    }

    fn platform_name(&self) -> &'static str {
        "Unix"
    }
}

/// An identifier resolved once for matching against a whole snapshot
struct IdentifierMatcher<'a> {
    identifier: &'a str,
    is_path: bool,
    /// Canonical executables the identifier resolves to
    locations: Vec<PathBuf>,
}

impl<'a> IdentifierMatcher<'a> {
    fn new(identifier: &'a str, search_paths: &[PathBuf]) -> Self {
        let is_path = UnixApplicationPlatform::is_path_identifier(identifier);
        let candidates = if is_path {
            vec![PathBuf::from(identifier)]
        } else {
            UnixApplicationPlatform::search_dirs(search_paths)
                .into_iter()
                .map(|dir| dir.join(identifier))
                .collect()
        };

        let mut locations: Vec<PathBuf> = Vec::new();
        for location in candidates.iter().filter_map(|c| c.canonicalize().ok()) {
            if !locations.contains(&location) {
                locations.push(location);
            }
        }

        Self {
            identifier,
            is_path,
            locations,
        }
    }

    fn matches(&self, application: &RunningApplication) -> bool {
        let running = Path::new(&application.identifier);

        // The kernel reports exe paths with symlinks already resolved
        if running == Path::new(self.identifier) || self.locations.iter().any(|l| l == running) {
            return true;
        }

        if self.is_path {
            return false;
        }

        running.file_name().is_some_and(|name| self.is_name(name))
            || application
                .aliases
                .iter()
                .any(|alias| self.is_name(OsStr::new(alias)))
    }

    fn is_name(&self, name: &OsStr) -> bool {
        if name == self.identifier {
            return true;
        }

        let name = name.as_encoded_bytes();
        cfg!(target_os = "linux")
            && name.len() == COMM_NAME_LEN
            && self.identifier.as_bytes().starts_with(name)
    }
}
