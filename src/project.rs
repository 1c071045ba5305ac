//! Project inspection.
//!
//! Figures out how to invoke the wrapped framework for a given project:
//! which package manager drives it, whether the expected script exists in
//! `package.json`, and the final command line with port, host and
//! passthrough arguments in place.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::launch::Mode;

/// JavaScript package managers slipway knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    /// Executable name of the manager.
    pub fn bin(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Bun => "bun",
        }
    }

    /// Parses a manager name from config.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "npm" => Ok(PackageManager::Npm),
            "pnpm" => Ok(PackageManager::Pnpm),
            "yarn" => Ok(PackageManager::Yarn),
            "bun" => Ok(PackageManager::Bun),
            other => Err(anyhow!(
                "unknown package manager {other:?}, expected npm, pnpm, yarn or bun"
            )),
        }
    }

    /// npm swallows script flags unless they sit behind a `--` separator.
    fn needs_separator(self) -> bool {
        matches!(self, PackageManager::Npm)
    }
}

/// Lockfiles checked during detection, most specific manager first.
const LOCKFILES: [(&str, PackageManager); 5] = [
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
];

/// Detects the package manager from lockfiles in `dir`, defaulting to npm.
pub fn detect_package_manager(dir: &Path) -> PackageManager {
    for (file, manager) in LOCKFILES {
        if dir.join(file).exists() {
            tracing::debug!(lockfile = file, manager = manager.bin(), "package manager detected");
            return manager;
        }
    }
    PackageManager::Npm
}

/// The subset of `package.json` slipway reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    /// Script names to script commands.
    #[serde(default)]
    pub scripts: HashMap<String, String>,
}

/// Reads `package.json` from `dir` if one exists.
pub fn read_package_json(dir: &Path) -> Result<Option<PackageJson>> {
    let path = dir.join("package.json");
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let package: PackageJson = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(package))
}

/// Fails early when the project declares scripts but not the one `mode` runs.
///
/// Projects without a `package.json` pass: the package manager will produce
/// its own error at spawn time and that exit is propagated like any other.
pub fn ensure_script(package: Option<&PackageJson>, mode: Mode) -> Result<()> {
    let Some(package) = package else {
        return Ok(());
    };
    if package.scripts.contains_key(mode.script()) {
        return Ok(());
    }
    bail!("package.json has no \"{}\" script", mode.script())
}

/// Resolves the full command line for `mode`.
///
/// A configured override replaces the package-manager invocation entirely.
/// Server modes get `--port` and `--host` appended either way; passthrough
/// arguments always come last so the operator has the final word.
pub fn resolve_command(
    mode: Mode,
    override_cmd: Option<&str>,
    manager: PackageManager,
    port: u16,
    host: &str,
    passthrough: &[String],
) -> Result<(String, Vec<String>)> {
    let (cmd, mut args) = match override_cmd {
        Some(raw) => {
            let mut parts = shell_words::split(raw)
                .with_context(|| format!("failed to parse the {} command override", mode.script()))?;
            if parts.is_empty() {
                bail!("the {} command override is empty", mode.script());
            }
            let cmd = parts.remove(0);
            (cmd, parts)
        }
        None => {
            let mut args = vec!["run".to_string(), mode.script().to_string()];
            if manager.needs_separator() && (mode.is_server() || !passthrough.is_empty()) {
                args.push("--".to_string());
            }
            (manager.bin().to_string(), args)
        }
    };

    if mode.is_server() {
        args.push("--port".to_string());
        args.push(port.to_string());
        args.push("--host".to_string());
        args.push(host.to_string());
    }
    args.extend(passthrough.iter().cloned());
    Ok((cmd, args))
}
