//! External service startup.
//!
//! Starting a model service (installing packages, staging scripts, building a server)
//! belongs to an external collaborator. The gateway only asks a [`ServiceLauncher`]
//! to start it and then polls liveness. `CommandLauncher` shells out to `/bin/sh`;
//! `ExternalLauncher` assumes something else is already bringing the service up.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::config::ModelKind;
use super::error::{GatewayError, GatewayResult};
use crate::constants::MAX_LAUNCH_OUTPUT_BYTES;

#[async_trait]
/// Starts the process behind a model service.
pub trait ServiceLauncher: Send + Sync {
    async fn launch(&self, kind: ModelKind) -> GatewayResult<LaunchedService>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Handle to a started service and its captured output.
pub struct LaunchedService {
    child: Option<Child>,
    output: Arc<Mutex<String>>,
    drains: Vec<JoinHandle<()>>,
}

impl LaunchedService {
    /// A service started by someone else; nothing to watch.
    pub fn detached() -> Self {
        Self {
            child: None,
            output: Arc::new(Mutex::new(String::new())),
            drains: Vec::new(),
        }
    }

    /// Wraps a child whose stdout/stderr are piped; output is drained in the background.
    pub fn from_child(mut child: Child) -> Self {
        let output = Arc::new(Mutex::new(String::new()));
        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(spawn_drain(stdout, Arc::clone(&output)));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(spawn_drain(stderr, Arc::clone(&output)));
        }
        Self {
            child: Some(child),
            output,
            drains,
        }
    }

    /// Returns the exit status if the process already exited unsuccessfully.
    pub fn failed_exit(&mut self) -> Option<ExitStatus> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) if !status.success() => Some(status),
            _ => None,
        }
    }

    /// The tail of what the process printed so far, at most
    /// [`MAX_LAUNCH_OUTPUT_BYTES`].
    pub fn captured_output(&self) -> String {
        self.output.lock().clone()
    }

    /// Waits (bounded by `grace`) for the output pipes to close, then returns the output.
    ///
    /// Only meaningful once the process has exited.
    pub async fn collect_output(&mut self, grace: Duration) -> String {
        for drain in self.drains.drain(..) {
            if tokio::time::timeout(grace, drain).await.is_err() {
                debug!("Output drain did not finish in time");
            }
        }
        self.captured_output()
    }
}

impl std::fmt::Debug for LaunchedService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchedService")
            .field("pid", &self.child.as_ref().and_then(|c| c.id()))
            .field("output_len", &self.output.lock().len())
            .finish()
    }
}

fn spawn_drain<R>(mut reader: R, sink: Arc<Mutex<String>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        // Keeps reading for the life of the process so the pipe never fills up.
        while let Ok(n) = reader.read(&mut buf).await {
            if n == 0 {
                break;
            }
            push_tail(
                &mut sink.lock(),
                &String::from_utf8_lossy(&buf[..n]),
                MAX_LAUNCH_OUTPUT_BYTES,
            );
        }
    })
}

/// Appends `chunk`, then drops the oldest bytes so at most `cap` remain.
pub(crate) fn push_tail(out: &mut String, chunk: &str, cap: usize) {
    out.push_str(chunk);
    if out.len() <= cap {
        return;
    }
    let mut cut = out.len() - cap;
    while !out.is_char_boundary(cut) {
        cut += 1;
    }
    out.drain(..cut);
}

/// Launcher that does nothing; startup is owned entirely by the environment.
#[derive(Debug, Default, Clone)]
pub struct ExternalLauncher;

#[async_trait]
impl ServiceLauncher for ExternalLauncher {
    async fn launch(&self, kind: ModelKind) -> GatewayResult<LaunchedService> {
        debug!(%kind, "No launcher configured, waiting for externally managed service");
        Ok(LaunchedService::detached())
    }

    fn name(&self) -> &'static str {
        "external"
    }
}

/// Runs a shell command to start the service.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    command: String,
}

impl CommandLauncher {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl ServiceLauncher for CommandLauncher {
    async fn launch(&self, kind: ModelKind) -> GatewayResult<LaunchedService> {
        info!(%kind, command = %self.command, "Launching model service");

        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(&self.command)
            .kill_on_drop(true)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GatewayError::LaunchFailed {
                kind,
                reason: format!("failed to spawn `{}`: {e}", self.command),
            })?;

        Ok(LaunchedService::from_child(child))
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Picks a [`CommandLauncher`] when a command is configured, else [`ExternalLauncher`].
pub fn launcher_for(command: Option<&str>) -> Arc<dyn ServiceLauncher> {
    match command.map(str::trim).filter(|c| !c.is_empty()) {
        Some(cmd) => Arc::new(CommandLauncher::new(cmd)),
        None => Arc::new(ExternalLauncher),
    }
}
