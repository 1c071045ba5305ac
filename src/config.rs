//! Configuration management for slipway.
//!
//! This module defines the structure of the `slipway.toml` configuration file
//! and the scan of the project's env files. Both feed launch defaults that
//! sit below command-line flags: flags beat `slipway.toml`, which beats
//! `.env`/`.env.local`, which beat the built-in defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::launch::Mode;

/// Top-level configuration structure corresponding to `slipway.toml`.
/// Every field is optional; an empty file is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Port handed to the wrapped server command.
    pub port: Option<u16>,
    /// Host handed to the wrapped server command.
    pub host: Option<String>,
    /// Whether to open the browser once the server is reachable (default: true).
    pub open: Option<bool>,
    /// Package manager override ("npm", "pnpm", "yarn", "bun").
    pub package_manager: Option<String>,
    /// Overall readiness-probe window in milliseconds.
    pub ready_timeout_ms: Option<u64>,
    /// Full command overrides per mode.
    pub commands: Option<CommandOverrides>,
}

/// Command strings that replace the package-manager invocation per mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandOverrides {
    /// Override for `slipway dev`.
    pub dev: Option<String>,
    /// Override for `slipway build`.
    pub build: Option<String>,
    /// Override for `slipway start`.
    pub start: Option<String>,
}

impl CommandOverrides {
    /// The override configured for `mode`, if any.
    pub fn for_mode(&self, mode: Mode) -> Option<&str> {
        match mode {
            Mode::Dev => self.dev.as_deref(),
            Mode::Build => self.build.as_deref(),
            Mode::Start => self.start.as_deref(),
        }
    }
}

/// Loads and parses the configuration from a file path.
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Launch defaults recovered from the project's env files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub port: Option<u16>,
    pub host: Option<String>,
}

/// Env files consulted, in order. Later files win on conflicts.
const ENV_FILES: [&str; 2] = [".env", ".env.local"];

/// Scans the project's env files for `PORT` and `HOST` defaults.
///
/// Missing and unreadable files are skipped silently; env files are advisory
/// input, not configuration the operator asked slipway to load.
pub fn scan_env_files(dir: &Path) -> EnvDefaults {
    let mut defaults = EnvDefaults::default();
    for name in ENV_FILES {
        let Ok(raw) = std::fs::read_to_string(dir.join(name)) else {
            continue;
        };
        apply_env_content(&mut defaults, &raw);
    }
    defaults
}

fn apply_env_content(defaults: &mut EnvDefaults, raw: &str) {
    for line in raw.lines() {
        let Some((key, value)) = parse_env_line(line) else {
            continue;
        };
        match key {
            "PORT" => {
                if let Some(port) = parse_port(value) {
                    defaults.port = Some(port);
                }
            }
            "HOST" => {
                if !value.is_empty() {
                    defaults.host = Some(value.to_string());
                }
            }
            _ => {}
        }
    }
}

/// Parses one `KEY=VALUE` env-file line.
///
/// Blank lines, comments and lines without `=` yield `None`. An `export `
/// prefix and one layer of matching single or double quotes around the value
/// are stripped; anything fancier (multiline values, interpolation) is out.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line
        .strip_prefix("export ")
        .map(str::trim_start)
        .unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, strip_matching_quotes(value.trim())))
}

fn strip_matching_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parses a port string, rejecting zero and anything out of range.
pub fn parse_port(value: &str) -> Option<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_optional_fields() {
        let raw = r#"
port = 4321
host = "0.0.0.0"
open = false
package_manager = "pnpm"
ready_timeout_ms = 120000

[commands]
dev = "astro dev"
build = "astro build"
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.port, Some(4321));
        assert_eq!(config.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(config.open, Some(false));
        assert_eq!(config.package_manager.as_deref(), Some("pnpm"));
        assert_eq!(config.ready_timeout_ms, Some(120_000));
        let commands = config.commands.unwrap();
        assert_eq!(commands.for_mode(Mode::Dev), Some("astro dev"));
        assert_eq!(commands.for_mode(Mode::Build), Some("astro build"));
        assert_eq!(commands.for_mode(Mode::Start), None);
    }

    #[test]
    fn an_empty_config_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.port, None);
        assert_eq!(config.host, None);
        assert!(config.commands.is_none());
    }

    #[test]
    fn env_lines_parse_assignments_only() {
        assert_eq!(parse_env_line("PORT=4000"), Some(("PORT", "4000")));
        assert_eq!(parse_env_line("  HOST = 0.0.0.0 "), Some(("HOST", "0.0.0.0")));
        assert_eq!(parse_env_line("export PORT=4000"), Some(("PORT", "4000")));
        assert_eq!(parse_env_line("HOST=\"example.dev\""), Some(("HOST", "example.dev")));
        assert_eq!(parse_env_line("HOST='example.dev'"), Some(("HOST", "example.dev")));
        assert_eq!(parse_env_line("# PORT=4000"), None);
        assert_eq!(parse_env_line(""), None);
        assert_eq!(parse_env_line("not an assignment"), None);
        assert_eq!(parse_env_line("BAD KEY=1"), None);
    }

    #[test]
    fn ports_must_be_nonzero_u16() {
        assert_eq!(parse_port("3000"), Some(3000));
        assert_eq!(parse_port(" 65535 "), Some(65535));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("65536"), None);
        assert_eq!(parse_port("dev"), None);
    }

    #[test]
    fn later_env_files_win() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "PORT=3000\nHOST=127.0.0.1\n").unwrap();
        std::fs::write(dir.path().join(".env.local"), "PORT=4000\n# HOST stays\n").unwrap();

        let defaults = scan_env_files(dir.path());
        assert_eq!(defaults.port, Some(4000));
        assert_eq!(defaults.host.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "PORT=not-a-port\nHOST=\n").unwrap();

        let defaults = scan_env_files(dir.path());
        assert_eq!(defaults, EnvDefaults::default());
    }

    #[test]
    fn missing_env_files_yield_no_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(scan_env_files(dir.path()), EnvDefaults::default());
    }
}
