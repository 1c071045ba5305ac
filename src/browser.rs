//! Fire-and-forget launching of the operator's default browser.

use std::io;
use std::process::{Command, Stdio};

/// Opens `url` in the platform's default browser.
///
/// Failures never reach the caller. A machine that cannot open a browser
/// (headless CI, missing helper binary) gets a debug-level note and the
/// session continues unaffected.
pub fn open_browser(url: &str) {
    let (program, args) = launch_command(url);
    match spawn_detached(program, &args) {
        Ok(()) => tracing::debug!(%url, %program, "browser launch dispatched"),
        Err(err) => tracing::debug!(%url, %program, %err, "browser launch failed"),
    }
}

/// Spawns the opener with all stdio disconnected and lets go of the handle.
fn spawn_detached(program: &str, args: &[String]) -> io::Result<()> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
}

#[cfg(target_os = "macos")]
fn launch_command(url: &str) -> (&'static str, Vec<String>) {
    ("open", vec![url.to_string()])
}

#[cfg(windows)]
fn launch_command(url: &str) -> (&'static str, Vec<String>) {
    // `start` is a cmd.exe builtin; the empty argument fills its title slot
    // so the URL is not mistaken for a window title.
    (
        "cmd",
        vec![
            "/C".to_string(),
            "start".to_string(),
            String::new(),
            url.to_string(),
        ],
    )
}

#[cfg(not(any(target_os = "macos", windows)))]
fn launch_command(url: &str) -> (&'static str, Vec<String>) {
    ("xdg-open", vec![url.to_string()])
}
