//! Event definitions for the session event loop.
//!
//! This module defines the `Event` enum which encapsulates everything that can
//! interrupt a running session from the outside: readiness-probe results and
//! operator termination signals. Child exit is not an event; the session
//! awaits it directly on the supervisor.

use std::time::Duration;

/// An operator stop request, normalized across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    /// Interrupt, usually Ctrl-C at the terminal (SIGINT on unix).
    Int,
    /// Termination request (SIGTERM on unix).
    Term,
}

impl TermSignal {
    /// Human-readable name used in status lines.
    pub fn label(self) -> &'static str {
        match self {
            TermSignal::Int => "interrupt",
            TermSignal::Term => "terminate",
        }
    }
}

/// Represents an event in the session's event loop.
#[derive(Debug, Clone)]
pub enum Event {
    /// The readiness probe connected to the server's port.
    Ready,
    /// The readiness probe gave up after the configured window.
    ProbeTimedOut { elapsed: Duration },
    /// An operator termination signal was received.
    Shutdown(TermSignal),
}
