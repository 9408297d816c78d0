use crate::error::{KeepupError, LaunchError};
use crate::event::{EventPublisher, SupervisionEvent};
use crate::platform::{ApplicationPlatform, LaunchOptions, Target};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long `stop` lets an in-flight tick finish before discarding it
pub const IN_FLIGHT_TICK_GRACE: Duration = Duration::from_secs(2);

/// What a single tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// The target was running; nothing was done
    AlreadyRunning,
    /// The target was absent and the platform accepted the launch
    Launched,
    /// The target was absent and the launch attempt failed
    LaunchFailed(LaunchError),
}

/// Keeps a single target application running.
///
/// Each tick checks liveness and launches the target when it is absent. A
/// launch is never assumed to have worked; the next tick checks again.
pub struct Supervisor<P: ApplicationPlatform + ?Sized> {
    target: Target,
    platform: Arc<P>,
    events: EventPublisher,
}

impl<P: ApplicationPlatform + ?Sized + 'static> Supervisor<P> {
    pub fn new(target: Target, platform: Arc<P>) -> Self {
        Self {
            target,
            platform,
            events: EventPublisher::new(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Receive the events of this supervisor, including those emitted after `start`
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisionEvent> {
        self.events.subscribe()
    }

    /// Whether the target currently appears in the running applications.
    ///
    /// A failed query counts as "not running" so the caller attempts a launch.
    pub async fn is_running(&self) -> bool {
        let identifier = self.target.identifier();
        match self.platform.find_running(identifier).await {
            Ok(Some(application)) => {
                debug!("{} is running as PID {}", identifier, application.pid);
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.events.publish(SupervisionEvent::QueryUnavailable {
                    identifier: identifier.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Resolve the target and ask the platform to start it with default options
    pub async fn launch(&self) -> Result<(), LaunchError> {
        let identifier = self.target.identifier();

        let reference = self
            .platform
            .resolve_application(identifier)
            .await
            .ok_or_else(|| LaunchError::NotFound(identifier.to_string()))?;

        debug!(
            "Resolved {} to {}",
            identifier,
            reference.location.display()
        );

        self.platform
            .launch_application(&reference, &LaunchOptions::default())
            .await
            .map_err(|cause| LaunchError::LaunchFailed {
                identifier: identifier.to_string(),
                cause,
            })?;

        self.events.publish(SupervisionEvent::Launched {
            identifier: identifier.to_string(),
        });
        Ok(())
    }

    /// Run one check-and-launch pass. Never fails; failures become events.
    pub async fn tick(&self) -> TickOutcome {
        let identifier = self.target.identifier();

        if self.is_running().await {
            return TickOutcome::AlreadyRunning;
        }

        self.events.publish(SupervisionEvent::NotRunning {
            identifier: identifier.to_string(),
        });

        match self.launch().await {
            Ok(()) => TickOutcome::Launched,
            Err(e) => {
                self.events.publish(SupervisionEvent::LaunchFailed {
                    identifier: identifier.to_string(),
                    kind: e.kind(),
                    message: e.to_string(),
                });
                TickOutcome::LaunchFailed(e)
            }
        }
    }

    /// Start ticking every `interval` on the current tokio runtime.
    ///
    /// The first tick fires one interval after this call. The returned
    /// handle owns the loop; dropping it cancels supervision.
    pub fn start(self, interval: Duration) -> Result<SupervisionHandle, KeepupError> {
        if interval.is_zero() {
            return Err(KeepupError::configuration(
                "poll interval must be greater than zero",
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            KeepupError::configuration(format!("supervision requires a tokio runtime: {e}"))
        })?;

        let cancellation_token = CancellationToken::new();
        let events = self.events.clone();
        let target = self.target.clone();

        info!(
            "Supervising {} every {:?} on {}",
            target,
            interval,
            self.platform.platform_name()
        );

        let task = runtime.spawn(run_loop(
            Arc::new(self),
            interval,
            cancellation_token.clone(),
        ));

        Ok(SupervisionHandle {
            target,
            cancellation_token,
            task: Some(task),
            events,
        })
    }
}

async fn run_loop<P: ApplicationPlatform + ?Sized + 'static>(
    supervisor: Arc<Supervisor<P>>,
    interval: Duration,
    cancellation_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Each tick runs in its own task so a panicking platform call only costs that tick
        let mut tick = tokio::spawn({
            let supervisor = Arc::clone(&supervisor);
            async move { supervisor.tick().await }
        });

        let joined = tokio::select! {
            biased;
            result = &mut tick => Some(result),
            _ = cancellation_token.cancelled() => {
                match tokio::time::timeout(IN_FLIGHT_TICK_GRACE, &mut tick).await {
                    Ok(result) => Some(result),
                    Err(_) => {
                        warn!(
                            "Tick for {} still running after {:?}, abandoning it",
                            supervisor.target, IN_FLIGHT_TICK_GRACE
                        );
                        tick.abort();
                        let _ = tick.await;
                        None
                    }
                }
            }
        };

        if let Some(Err(e)) = joined {
            supervisor.events.publish(SupervisionEvent::TickFailed {
                identifier: supervisor.target.identifier().to_string(),
                reason: join_error_reason(e),
            });
        }
    }

    supervisor.events.publish(SupervisionEvent::Stopped {
        identifier: supervisor.target.identifier().to_string(),
    });
}

fn join_error_reason(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }

    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

/// Handle to a running supervision loop
pub struct SupervisionHandle {
    target: Target,
    cancellation_token: CancellationToken,
    task: Option<JoinHandle<()>>,
    events: EventPublisher,
}

impl SupervisionHandle {
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SupervisionEvent> {
        self.events.subscribe()
    }

    /// Request cancellation without waiting for the loop to exit.
    ///
    /// A tick in flight gets [`IN_FLIGHT_TICK_GRACE`] to finish before it is
    /// discarded; no new tick starts afterwards.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// Whether the loop has been asked to stop or has exited
    pub fn is_stopped(&self) -> bool {
        self.cancellation_token.is_cancelled()
            || self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop supervision and wait for the loop to exit.
    ///
    /// Once this returns the platform is no longer queried. A hung tick
    /// delays this by at most [`IN_FLIGHT_TICK_GRACE`]. Calling it again is
    /// a no-op.
    pub async fn stop(&mut self) {
        self.cancellation_token.cancel();

        let Some(task) = self.task.take() else {
            return;
        };

        if let Err(e) = task.await {
            warn!("Supervision loop for {} ended abnormally: {}", self.target, e);
        }
    }
}

impl Drop for SupervisionHandle {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
