//! Spawning and stopping the rendering process.

use crate::error::orchestrator::OrchestratorError;
use crate::error::spawn::SpawnError;

use common::ErrorLocation;
use models::NativeLaunch;

use std::future::Future;
use std::io::Result as IoResult;
use std::panic::Location;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info, trace, warn};
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;
use tokio::time::timeout as TokioTimeout;

const DEFAULT_GRACE: Duration = Duration::from_secs(3);
const DEFAULT_TERMINATE: Duration = Duration::from_secs(2);
const DEFAULT_KILL_CONFIRM: Duration = Duration::from_secs(5);

/// The operations termination escalation needs from a process.
pub trait ManagedProcess: Send {
    fn id(&self) -> Option<u32>;

    /// Wait until the process exits. Returns `true` if it exited within `limit`.
    fn wait_for_exit(&mut self, limit: Duration) -> impl Future<Output = bool> + Send;

    /// Wait for the process to exit with no time limit.
    fn wait(&mut self) -> impl Future<Output = IoResult<()>> + Send;

    /// Ask the process to exit. Returns `false` if the request could not be delivered.
    fn terminate(&mut self) -> bool;

    /// Force the process to exit.
    fn kill(&mut self) -> impl Future<Output = IoResult<()>> + Send;
}

/// Time allowed at each escalation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub grace: Duration,
    pub terminate: Duration,
    pub kill_confirm: Duration,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE,
            terminate: DEFAULT_TERMINATE,
            kill_confirm: DEFAULT_KILL_CONFIRM,
        }
    }
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// Exited on its own within the grace period.
    Exited,
    /// Exited after a termination request.
    Terminated,
    /// Had to be force-killed.
    Killed,
}

/// Stop `process`: wait, then request termination, then kill.
///
/// Each step is bounded by `policy`. Only a kill that cannot be confirmed is
/// reported as an error.
pub async fn terminate_process_safely<P: ManagedProcess>(
    process: &mut P,
    policy: &EscalationPolicy,
) -> Result<TerminationOutcome, OrchestratorError> {
    let pid = process.id();

    if process.wait_for_exit(policy.grace).await {
        info!("Native process {pid:?} exited");
        return Ok(TerminationOutcome::Exited);
    }

    warn!(
        "Native process {pid:?} still running after {:?}; requesting termination",
        policy.grace
    );
    if !process.terminate() {
        debug!("Termination request for {pid:?} could not be delivered");
    }
    if process.wait_for_exit(policy.terminate).await {
        info!("Native process {pid:?} terminated");
        return Ok(TerminationOutcome::Terminated);
    }

    warn!(
        "Native process {pid:?} ignored termination for {:?}; killing",
        policy.terminate
    );
    if let Err(e) = process.kill().await {
        warn!("Kill of {pid:?} reported: {e}");
    }
    if process.wait_for_exit(policy.kill_confirm).await {
        info!("Native process {pid:?} killed");
        return Ok(TerminationOutcome::Killed);
    }

    Err(OrchestratorError::Termination {
        message: format!(
            "Native process {pid:?} still alive {:?} after kill",
            policy.kill_confirm
        ),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// A spawned rendering process.
pub struct ChildProcess {
    child: TokioChild,
}

impl ChildProcess {
    pub fn new(child: TokioChild) -> Self {
        Self { child }
    }
}

impl ManagedProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait_for_exit(&mut self, limit: Duration) -> bool {
        match TokioTimeout(limit, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Native process exited with {status}");
                true
            }
            Ok(Err(e)) => {
                warn!("Failed to wait on native process: {e}");
                false
            }
            Err(_) => false,
        }
    }

    async fn wait(&mut self) -> IoResult<()> {
        let status = self.child.wait().await?;
        debug!("Native process exited with {status}");
        Ok(())
    }

    fn terminate(&mut self) -> bool {
        let Some(pid) = self.child.id() else {
            return false;
        };

        let mut sys = System::new();
        let pid = Pid::from_u32(pid);
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        match sys.process(pid).and_then(|p| p.kill_with(Signal::Term)) {
            Some(sent) => {
                debug!("Sent SIGTERM to PID {pid}: success={sent}");
                sent
            }
            None => {
                debug!("SIGTERM unsupported for PID {pid}");
                false
            }
        }
    }

    async fn kill(&mut self) -> IoResult<()> {
        self.child.start_kill()
    }
}

pub(crate) fn build_spawn_command(launch: &NativeLaunch) -> TokioCommand {
    let mut cmd = TokioCommand::new(launch.binary());
    cmd.args(launch.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Spawn the rendering process with its positional launch arguments.
///
/// Its stdout and stderr are forwarded to the log.
#[track_caller]
pub fn spawn_native(launch: &NativeLaunch) -> Result<ChildProcess, SpawnError> {
    let binary = launch.binary().display().to_string();
    debug!("Spawning {binary} for {}", launch.socket_url());

    let mut child = build_spawn_command(launch)
        .spawn()
        .map_err(|e| SpawnError::Spawn {
            message: format!("Failed to spawn {binary}: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;

    if let Some(stdout) = child.stdout.take() {
        TokioSpawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                trace!("Native stdout: {line}");
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        TokioSpawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("Native stderr: {line}");
            }
        });
    }

    info!("Spawned {binary} (PID: {:?})", child.id());
    Ok(ChildProcess::new(child))
}
