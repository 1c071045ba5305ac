//! Child-process supervision.
//!
//! This module owns the one child process of a session: spawning it attached
//! to the operator's terminal, observing its exit, and forwarding stop
//! requests to it. Escalation is deliberately absent; a request is sent once
//! and the child is trusted to honor it.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};

use crate::events::TermSignal;
use crate::launch::LaunchRequest;

/// Owns the supervised child for the lifetime of a session.
pub struct Supervisor {
    child: Child,
    pid: u32,
}

impl Supervisor {
    /// Spawns the launch command with all three stdio streams inherited.
    ///
    /// The child is placed in its own process group so stop requests reach
    /// the whole tree the package manager spawns, not just its top process.
    pub fn spawn(request: &LaunchRequest) -> Result<Self> {
        let mut command = Command::new(&request.cmd);
        command
            .args(&request.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            command.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        #[cfg(unix)]
        unsafe {
            command.pre_exec(|| {
                let _ = libc::setpgid(0, 0);
                Ok(())
            });
        }

        let child = command
            .spawn()
            .with_context(|| format!("failed to start `{}`", request.command_line()))?;
        let pid = child.id().unwrap_or(0);
        tracing::debug!(pid, cmd = %request.cmd, "child spawned");
        Ok(Self { child, pid })
    }

    /// Process id of the supervised child.
    pub fn id(&self) -> u32 {
        self.pid
    }

    /// Waits for the child to exit.
    ///
    /// Cancel-safe, so the session loop can race it against other events
    /// without losing the exit status.
    pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }

    /// Forwards a stop request to the child's process group.
    ///
    /// One-way by contract: the exit, if the child honors the request, is
    /// observed through [`Supervisor::wait`] like any other exit.
    pub fn terminate(&self, signal: TermSignal) {
        if self.pid == 0 {
            return;
        }
        tracing::debug!(pid = self.pid, signal = signal.label(), "forwarding stop request");
        send_os_signal(self.pid, signal);
    }
}

#[cfg(unix)]
fn send_os_signal(pid: u32, signal: TermSignal) {
    unsafe {
        let sig = match signal {
            TermSignal::Int => libc::SIGINT,
            TermSignal::Term => libc::SIGTERM,
        };
        let pid = pid as i32;
        let _ = libc::kill(-pid, sig);
        let _ = libc::kill(pid, sig);
    }
}

#[cfg(not(unix))]
fn send_os_signal(pid: u32, signal: TermSignal) {
    send_ctrl_break(pid, signal);
}

#[cfg(all(not(unix), windows))]
fn send_ctrl_break(pid: u32, signal: TermSignal) {
    use windows_sys::Win32::System::Console::GenerateConsoleCtrlEvent;
    use windows_sys::Win32::System::Console::CTRL_BREAK_EVENT;
    // Windows has no SIGTERM/SIGINT; CTRL_BREAK is the closest console signal we can emit.
    let _ = signal;
    unsafe {
        let _ = GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid);
    }
}

#[cfg(all(not(unix), not(windows)))]
fn send_ctrl_break(_pid: u32, _signal: TermSignal) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(cmd: &str, args: &[&str]) -> LaunchRequest {
        LaunchRequest {
            port: 3000,
            host: "localhost".to_string(),
            cmd: cmd.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn spawn_fails_for_a_missing_executable() {
        let result = Supervisor::spawn(&request("slipway-test-missing-binary", &[]));
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn wait_reports_the_child_exit_code() {
        let mut supervisor = Supervisor::spawn(&request("sh", &["-c", "exit 7"])).unwrap();
        let status = supervisor.wait().await.unwrap();
        assert_eq!(status.code(), Some(7));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_stops_a_long_running_child() {
        let mut supervisor = Supervisor::spawn(&request("sleep", &["30"])).unwrap();
        supervisor.terminate(TermSignal::Term);
        let status = tokio::time::timeout(Duration::from_secs(5), supervisor.wait())
            .await
            .expect("child ignored the stop request")
            .unwrap();
        assert!(!status.success());
    }
}
