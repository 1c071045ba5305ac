//! Session lifecycle: one supervised child from spawn to exit.
//!
//! The session loop is the only place state lives. Readiness probing and
//! signal listening run as helper tasks that feed the event channel; the
//! child itself stays owned here and its exit is awaited directly, so no
//! event can race the loop into an inconsistent state.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::browser;
use crate::events::{Event, TermSignal};
use crate::launch::LaunchRequest;
use crate::probe;
use crate::supervisor::Supervisor;
use crate::ui;

/// Lifecycle of one supervised launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The child is being spawned.
    Starting,
    /// The child is alive; probing may still be in flight.
    Running,
    /// An operator stop request is being forwarded to the child.
    ShuttingDown,
    /// Terminal. The stored code becomes the invocation's exit code.
    Exited(i32),
}

/// Behavior toggles for one session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Probe the server's port and report readiness.
    pub wait_ready: bool,
    /// Open the browser once the port accepts connections.
    pub open_browser: bool,
    /// Overall window for the readiness probe.
    pub probe_timeout: Duration,
}

/// Runs one session to completion and returns the process exit code.
///
/// Signal handling is scoped to the session: the listener task is aborted on
/// the way out so nothing keeps reacting to Ctrl-C after the child is gone.
pub async fn run(request: LaunchRequest, options: SessionOptions) -> Result<i32> {
    let (event_tx, event_rx) = mpsc::channel(16);
    let signals = spawn_signal_listener(event_tx.clone());
    let outcome = drive(&request, options, event_tx, event_rx).await;
    signals.abort();
    outcome
}

/// The session loop proper, driven by whatever feeds the event channel.
async fn drive(
    request: &LaunchRequest,
    options: SessionOptions,
    event_tx: mpsc::Sender<Event>,
    mut event_rx: mpsc::Receiver<Event>,
) -> Result<i32> {
    let mut state = SessionState::Starting;
    tracing::debug!(?state, cmd = %request.command_line(), "session starting");

    let mut supervisor = match Supervisor::spawn(request) {
        Ok(supervisor) => supervisor,
        Err(err) => {
            state = SessionState::Exited(1);
            tracing::debug!(?state, "spawn failed");
            return Err(err);
        }
    };
    state = SessionState::Running;
    tracing::debug!(?state, pid = supervisor.id(), "child running");

    let prober = options
        .wait_ready
        .then(|| spawn_prober(request, options.probe_timeout, event_tx.clone()));
    drop(event_tx);

    let url = request.url();
    let code;
    loop {
        tokio::select! {
            status = supervisor.wait() => {
                let status = status.context("failed waiting on the server process")?;
                let exit = status.code();
                state = SessionState::Exited(exit.unwrap_or(0));
                tracing::debug!(?state, "child exited on its own");
                match exit {
                    Some(0) => ui::success("process ended successfully"),
                    Some(nonzero) => ui::warn(&format!("process ended with code {nonzero}")),
                    None => ui::info("process ended"),
                }
                code = exit.unwrap_or(0);
                break;
            }
            Some(event) = event_rx.recv() => match event {
                Event::Ready => {
                    if state == SessionState::Running {
                        ui::success(&format!("ready at {url}"));
                        if options.open_browser {
                            browser::open_browser(&url);
                        }
                    }
                }
                Event::ProbeTimedOut { elapsed } => {
                    ui::warn(&format!(
                        "no response at {url} after {}s, the server may still be compiling",
                        elapsed.as_secs()
                    ));
                }
                Event::Shutdown(signal) => {
                    state = SessionState::ShuttingDown;
                    tracing::debug!(?state, signal = signal.label(), "operator stop request");
                    ui::info(&format!("received {}, stopping the server", signal.label()));
                    supervisor.terminate(signal);
                    state = SessionState::Exited(0);
                    code = 0;
                    break;
                }
            }
        }
    }

    if let Some(prober) = prober {
        prober.abort();
    }
    tracing::debug!(?state, code, "session finished");
    Ok(code)
}

/// Probes the server port in the background and reports the outcome.
fn spawn_prober(
    request: &LaunchRequest,
    timeout: Duration,
    tx: mpsc::Sender<Event>,
) -> JoinHandle<()> {
    let host = request.host.clone();
    let port = request.port;
    tokio::spawn(async move {
        match probe::probe(&host, port, timeout).await {
            Ok(()) => {
                let _ = tx.send(Event::Ready).await;
            }
            Err(probe::ProbeError::Timeout { elapsed, .. }) => {
                let _ = tx.send(Event::ProbeTimedOut { elapsed }).await;
            }
        }
    })
}

/// Translates OS termination signals into session events.
fn spawn_signal_listener(tx: mpsc::Sender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(_) => return,
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    let _ = tx.send(Event::Shutdown(TermSignal::Int)).await;
                }
                _ = sigterm.recv() => {
                    let _ = tx.send(Event::Shutdown(TermSignal::Term)).await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            let _ = tx.send(Event::Shutdown(TermSignal::Int)).await;
        }
    })
}
