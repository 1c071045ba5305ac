//! TCP readiness probing.
//!
//! A dev server is considered ready as soon as its port accepts a TCP
//! connection. Nothing is written to or read from the socket, so the check
//! works the same for any HTTP framework and never confuses the server.

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Timeout for a single connection attempt.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(200);
/// Pause between the start of consecutive attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(200);
/// Default overall window before the probe gives up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Failure modes of a readiness probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The port never accepted a connection inside the window.
    #[error("no response from {host}:{port} after {}ms", .elapsed.as_millis())]
    Timeout {
        host: String,
        port: u16,
        elapsed: Duration,
    },
}

/// Polls `host:port` until a TCP connection succeeds or `timeout` elapses.
///
/// Individual attempts are capped at [`ATTEMPT_TIMEOUT`] and retried every
/// [`RETRY_INTERVAL`], so the error arrives at most one interval after the
/// deadline. Refused and unreachable attempts are indistinguishable here;
/// both simply mean "not ready yet".
pub async fn probe(host: &str, port: u16, timeout: Duration) -> Result<(), ProbeError> {
    let target = probe_addr(probe_host(host), port);
    let start = Instant::now();
    let deadline = start + timeout;

    loop {
        match tokio::time::timeout(ATTEMPT_TIMEOUT, TcpStream::connect(target.as_str())).await {
            Ok(Ok(stream)) => {
                drop(stream);
                tracing::debug!(
                    %target,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "port accepted a connection"
                );
                return Ok(());
            }
            Ok(Err(err)) => {
                tracing::trace!(%target, %err, "connection attempt failed");
            }
            Err(_) => {
                tracing::trace!(%target, "connection attempt timed out");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(timeout_error(host, port, now - start));
        }
        tokio::time::sleep_until(deadline.min(now + RETRY_INTERVAL)).await;
        if Instant::now() >= deadline {
            return Err(timeout_error(host, port, start.elapsed()));
        }
    }
}

fn timeout_error(host: &str, port: u16, elapsed: Duration) -> ProbeError {
    ProbeError::Timeout {
        host: host.to_string(),
        port,
        elapsed,
    }
}

/// Rewrites unspecified bind addresses to a connectable loopback name.
///
/// A server bound to `0.0.0.0` or `::` listens on every interface, but those
/// addresses are not meaningful as connection targets; `localhost` is.
pub fn probe_host(host: &str) -> &str {
    match host {
        "0.0.0.0" | "::" | "[::]" => "localhost",
        other => other,
    }
}

/// Formats a `host:port` connection target, bracketing bare IPv6 literals.
pub fn probe_addr(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
