//! Slipway: a launcher for web-project dev, build and start commands.
//!
//! This is the entry point of the application. It parses command-line
//! arguments, merges launch settings from flags, `slipway.toml` and the
//! project's env files, resolves the package-manager command line, and hands
//! exactly one supervised session to the session module.

mod browser;
mod config;
mod events;
mod launch;
mod menu;
mod probe;
mod project;
mod session;
mod supervisor;
mod ui;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::builder::styling::{AnsiColor, Effects, Style};
use clap::builder::Styles;
use clap::{Parser, Subcommand};
use crossterm::tty::IsTty;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, EnvDefaults};
use crate::launch::{LaunchRequest, Mode};
use crate::project::PackageManager;
use crate::session::SessionOptions;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "localhost";

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(
    name = "slipway",
    version,
    about = "Launcher for web-project dev servers with readiness reporting",
    styles = help_styles(),
    color = clap::ColorChoice::Always,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Path to slipway.toml configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Ignore any slipway.toml in the current directory.
    #[arg(long, global = true)]
    no_config: bool,
    /// Readiness-probe window in milliseconds before giving up.
    #[arg(long, global = true)]
    ready_timeout_ms: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the development server.
    Dev(ServerArgs),
    /// Produce a production build.
    Build(BuildArgs),
    /// Serve the production build.
    Start(ServerArgs),
}

#[derive(Debug, Default, clap::Args)]
struct ServerArgs {
    /// Port for the underlying server.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
    /// Host for the underlying server.
    #[arg(long)]
    host: Option<String>,
    /// Do not open the browser when the server becomes reachable.
    #[arg(long)]
    no_open: bool,
    /// Extra arguments passed through to the underlying command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Default, clap::Args)]
struct BuildArgs {
    /// Extra arguments passed through to the underlying command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// One mode invocation, normalized across the three subcommands and the menu.
struct Invocation {
    mode: Mode,
    port: Option<u16>,
    host: Option<String>,
    no_open: bool,
    passthrough: Vec<String>,
}

impl Invocation {
    fn server(mode: Mode, args: ServerArgs) -> Self {
        Self {
            mode,
            port: args.port,
            host: args.host,
            no_open: args.no_open,
            passthrough: args.args,
        }
    }

    fn build(args: BuildArgs) -> Self {
        Self {
            mode: Mode::Build,
            port: None,
            host: None,
            no_open: true,
            passthrough: args.args,
        }
    }

    fn bare(mode: Mode) -> Self {
        Self {
            mode,
            port: None,
            host: None,
            no_open: false,
            passthrough: Vec::new(),
        }
    }
}

/// Launch settings after merging every source.
#[derive(Debug, PartialEq, Eq)]
struct LaunchDefaults {
    port: u16,
    host: String,
    open: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();
    match run().await {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(err) => {
            ui::error(&format!("{err:#}"));
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to resolve the working directory")?;

    let invocation = match cli.command {
        Some(Commands::Dev(args)) => Invocation::server(Mode::Dev, args),
        Some(Commands::Start(args)) => Invocation::server(Mode::Start, args),
        Some(Commands::Build(args)) => Invocation::build(args),
        None => {
            if !(std::io::stdin().is_tty() && std::io::stdout().is_tty()) {
                bail!("no mode given; run `slipway dev`, `slipway build` or `slipway start`");
            }
            match menu::pick_mode()? {
                Some(mode) => Invocation::bare(mode),
                None => return Ok(0),
            }
        }
    };
    let mode = invocation.mode;

    let config = if cli.no_config {
        Config::default()
    } else {
        let path = cli.config.clone().or_else(|| default_config_path(&cwd));
        match path {
            Some(path) => config::load_config(&path)?,
            None => Config::default(),
        }
    };
    let env_defaults = config::scan_env_files(&cwd);

    let defaults = resolve_launch_defaults(&invocation, &config, &env_defaults);
    if defaults.port == 0 {
        bail!("port must be between 1 and 65535");
    }
    if defaults.host.trim().is_empty() {
        bail!("host must not be empty");
    }

    let manager = match config.package_manager.as_deref() {
        Some(name) => PackageManager::parse(name)?,
        None => project::detect_package_manager(&cwd),
    };

    let override_cmd = config.commands.as_ref().and_then(|c| c.for_mode(mode));
    if override_cmd.is_none() {
        let package = project::read_package_json(&cwd)?;
        project::ensure_script(package.as_ref(), mode)?;
    }
    let (cmd, args) = project::resolve_command(
        mode,
        override_cmd,
        manager,
        defaults.port,
        &defaults.host,
        &invocation.passthrough,
    )?;
    let request = LaunchRequest {
        port: defaults.port,
        host: defaults.host,
        cmd,
        args,
    };

    ui::title(&format!(
        "slipway {} · {}",
        env!("CARGO_PKG_VERSION"),
        mode.describe()
    ));
    ui::info(&format!("starting: {}", request.command_line()));
    if mode.is_server() {
        ui::info(&format!("waiting for {}", request.url()));
    }

    let probe_timeout = cli
        .ready_timeout_ms
        .or(config.ready_timeout_ms)
        .map(Duration::from_millis)
        .unwrap_or(probe::DEFAULT_TIMEOUT);
    let options = SessionOptions {
        wait_ready: mode.is_server(),
        open_browser: defaults.open,
        probe_timeout,
    };
    session::run(request, options).await
}

/// Merges port, host and browser behavior: flags beat `slipway.toml`, which
/// beats env files, which beat the built-in defaults. Build mode never opens
/// a browser regardless of the other sources.
fn resolve_launch_defaults(
    invocation: &Invocation,
    config: &Config,
    env: &EnvDefaults,
) -> LaunchDefaults {
    let port = invocation
        .port
        .or(config.port)
        .or(env.port)
        .unwrap_or(DEFAULT_PORT);
    let host = invocation
        .host
        .clone()
        .or_else(|| config.host.clone())
        .or_else(|| env.host.clone())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let open = invocation.mode.is_server() && !invocation.no_open && config.open.unwrap_or(true);
    LaunchDefaults { port, host, open }
}

fn default_config_path(cwd: &Path) -> Option<PathBuf> {
    let path = cwd.join("slipway.toml");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

fn help_styles() -> Styles {
    Styles::styled()
        .header(
            Style::new()
                .fg_color(Some(AnsiColor::Cyan.into()))
                .effects(Effects::BOLD),
        )
        .usage(
            Style::new()
                .fg_color(Some(AnsiColor::Green.into()))
                .effects(Effects::BOLD),
        )
        .literal(Style::new().fg_color(Some(AnsiColor::Yellow.into())))
        .placeholder(Style::new().fg_color(Some(AnsiColor::Magenta.into())))
        .valid(Style::new().fg_color(Some(AnsiColor::Green.into())))
        .invalid(
            Style::new()
                .fg_color(Some(AnsiColor::Red.into()))
                .effects(Effects::BOLD),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_server_flags_and_passthrough() {
        let cli = Cli::try_parse_from([
            "slipway", "dev", "--port", "4321", "--host", "0.0.0.0", "--no-open", "--",
            "--verbose",
        ])
        .unwrap();
        let Some(Commands::Dev(args)) = cli.command else {
            panic!("expected the dev subcommand");
        };
        assert_eq!(args.port, Some(4321));
        assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
        assert!(args.no_open);
        assert_eq!(args.args, ["--verbose"]);
    }

    #[test]
    fn cli_rejects_port_zero() {
        assert!(Cli::try_parse_from(["slipway", "dev", "--port", "0"]).is_err());
    }

    #[test]
    fn flags_beat_config_beats_env() {
        let invocation = Invocation {
            mode: Mode::Dev,
            port: Some(5000),
            host: None,
            no_open: false,
            passthrough: Vec::new(),
        };
        let config = Config {
            port: Some(4000),
            host: Some("0.0.0.0".to_string()),
            ..Config::default()
        };
        let env = EnvDefaults {
            port: Some(3500),
            host: Some("127.0.0.1".to_string()),
        };

        let defaults = resolve_launch_defaults(&invocation, &config, &env);
        assert_eq!(defaults.port, 5000);
        assert_eq!(defaults.host, "0.0.0.0");
        assert!(defaults.open);
    }

    #[test]
    fn builtin_defaults_apply_when_nothing_is_configured() {
        let invocation = Invocation::bare(Mode::Dev);
        let defaults =
            resolve_launch_defaults(&invocation, &Config::default(), &EnvDefaults::default());
        assert_eq!(
            defaults,
            LaunchDefaults {
                port: DEFAULT_PORT,
                host: DEFAULT_HOST.to_string(),
                open: true,
            }
        );
    }

    #[test]
    fn browser_opening_can_be_vetoed_by_flag_or_config() {
        let mut invocation = Invocation::bare(Mode::Dev);
        invocation.no_open = true;
        let defaults =
            resolve_launch_defaults(&invocation, &Config::default(), &EnvDefaults::default());
        assert!(!defaults.open);

        let invocation = Invocation::bare(Mode::Dev);
        let config = Config {
            open: Some(false),
            ..Config::default()
        };
        let defaults = resolve_launch_defaults(&invocation, &config, &EnvDefaults::default());
        assert!(!defaults.open);
    }

    #[test]
    fn build_mode_never_opens_a_browser() {
        let invocation = Invocation::build(BuildArgs::default());
        let config = Config {
            open: Some(true),
            ..Config::default()
        };
        let defaults = resolve_launch_defaults(&invocation, &config, &EnvDefaults::default());
        assert!(!defaults.open);
    }
}
