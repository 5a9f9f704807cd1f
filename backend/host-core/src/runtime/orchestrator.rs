//! Supervises one session of the rendering process.
//!
//! `Idle -> Starting -> Running -> ShuttingDown -> Terminated`
//!
//! Starting binds the relay, starts the background tasks and spawns the
//! rendering process. Running lasts until the shared shutdown signal is set,
//! by either side, or the process exits on its own. ShuttingDown stops the
//! process with bounded escalation while every background task is cancelled
//! and drained.

use crate::broker::Broker;
use crate::config::HostConfig;
use crate::error::orchestrator::OrchestratorError;
use crate::error::spawn::SpawnError;
use crate::native::link::serve_native_link;
use crate::native::process::{
    EscalationPolicy, ManagedProcess, spawn_native, terminate_process_safely,
};
use crate::registry::CommandRegistry;
use crate::relay::RelayServer;
use crate::runtime::context::RuntimeContext;

use common::ErrorLocation;
use models::{NativeLaunch, NativeLaunchBuilder};

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::spawn_blocking;

const SIGNAL_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

pub struct Orchestrator {
    context: RuntimeContext,
    policy: EscalationPolicy,
}

impl Orchestrator {
    pub fn new(config: HostConfig, registry: Arc<CommandRegistry>, broker: Broker) -> Self {
        let policy = EscalationPolicy {
            grace: Duration::from_millis(config.shutdown.grace_ms),
            terminate: Duration::from_millis(config.shutdown.terminate_ms),
            ..EscalationPolicy::default()
        };

        Self {
            context: RuntimeContext::new(config, registry, broker),
            policy,
        }
    }

    pub fn with_policy(mut self, policy: EscalationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    /// Run one session with the configured rendering binary.
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        self.run_with(spawn_native).await
    }

    /// Run one session, using `spawn` to start the rendering process.
    ///
    /// Returns once the session is Terminated. A spawn failure ends the
    /// session without ever reaching Running.
    pub async fn run_with<P, S>(&self, spawn: S) -> Result<(), OrchestratorError>
    where
        P: ManagedProcess,
        S: FnOnce(&NativeLaunch) -> Result<P, SpawnError>,
    {
        let state = self.context.state();
        if state != LifecycleState::Idle {
            return Err(OrchestratorError::Lifecycle {
                message: format!("Session cannot start from {state:?}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.context.transition(LifecycleState::Starting);

        let mut process = match self.start(spawn).await {
            Ok(process) => process,
            Err(e) => {
                error!("Session failed to start: {e}");
                self.drain().await;
                self.finish();
                return Err(e);
            }
        };
        self.context.transition(LifecycleState::Running);

        self.wait_for_shutdown(&mut process).await;
        self.context.transition(LifecycleState::ShuttingDown);

        let (termination, ()) = tokio::join!(
            terminate_process_safely(&mut process, &self.policy),
            self.drain()
        );
        self.finish();

        let outcome = termination?;
        info!("Native process stopped: {outcome:?}");
        Ok(())
    }

    async fn start<P, S>(&self, spawn: S) -> Result<P, OrchestratorError>
    where
        P: ManagedProcess,
        S: FnOnce(&NativeLaunch) -> Result<P, SpawnError>,
    {
        let ctx = &self.context;
        let config = ctx.config();

        let relay = RelayServer::bind(&config.server.host, config.server.port).await?;
        let launch = self.build_launch(relay.local_addr().port())?;

        ctx.tasks().spawn(
            "relay",
            relay.serve(
                ctx.dispatcher().clone(),
                ctx.clients().clone(),
                ctx.tasks().clone(),
                config.server.allow_remote,
            ),
        );
        ctx.tasks().spawn(
            "native-link",
            serve_native_link(config.native.channel_name.clone(), ctx.broker().clone()),
        );

        let process = spawn(&launch)?;
        info!(
            "Native process {:?} started; page connects to {}",
            process.id(),
            launch.socket_url()
        );
        Ok(process)
    }

    #[track_caller]
    fn build_launch(&self, port: u16) -> Result<NativeLaunch, SpawnError> {
        let config = self.context.config();

        let binary = config
            .native
            .binary
            .clone()
            .ok_or_else(|| SpawnError::Validation {
                message: String::from("native.binary is not configured"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config_json =
            serde_json::to_string(&config.window).map_err(|e| SpawnError::Validation {
                message: format!("Failed to serialize window options: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let launch = NativeLaunchBuilder::default()
            .with_binary(binary)
            .with_config_json(config_json)
            .with_host(config.server.host.clone())
            .with_port(port)
            .with_channel_name(config.native.channel_name.clone())
            .with_shutdown_signal(self.context.shutdown_signal().path())
            .build()?;

        Ok(launch)
    }

    async fn wait_for_shutdown<P: ManagedProcess>(&self, process: &mut P) {
        let signal = self.context.shutdown_signal().clone();
        let mut waiter = spawn_blocking(move || signal.wait_blocking(SIGNAL_POLL_INTERVAL));

        tokio::select! {
            joined = &mut waiter => {
                if let Err(e) = joined {
                    error!("Shutdown signal waiter failed: {e}");
                }
                info!("Shutdown signal observed");
            }
            exited = process.wait() => {
                match exited {
                    Ok(()) => warn!("Native process exited without setting the shutdown signal"),
                    Err(e) => warn!("Lost track of native process: {e}"),
                }
                if let Err(e) = self.context.shutdown_signal().set() {
                    error!("Failed to set shutdown signal: {e}");
                }
                let _ = waiter.await;
            }
        }
    }

    async fn drain(&self) {
        self.context.broker().cancel_all();
        let report = self.context.tasks().cancel_all().await;
        if report.panicked > 0 {
            error!("{} background task(s) panicked", report.panicked);
        }
        let dropped = self.context.clients().clear().await;
        if dropped > 0 {
            debug!("Dropped {dropped} frontend client(s) on shutdown");
        }
    }

    fn finish(&self) {
        if let Err(e) = self.context.shutdown_signal().clear() {
            warn!("Failed to remove shutdown signal: {e}");
        }
        self.context.transition(LifecycleState::Terminated);
    }
}
