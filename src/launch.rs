//! Launch parameter types shared by the CLI layer and the session core.

/// Which wrapped command an invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Long-running development server.
    Dev,
    /// One-shot production build.
    Build,
    /// Long-running server for the production build.
    Start,
}

impl Mode {
    /// Script name used in `package.json` and in config command overrides.
    pub fn script(self) -> &'static str {
        match self {
            Mode::Dev => "dev",
            Mode::Build => "build",
            Mode::Start => "start",
        }
    }

    /// Whether this mode launches a server worth probing and browsing to.
    pub fn is_server(self) -> bool {
        !matches!(self, Mode::Build)
    }

    /// Human description used in the startup title.
    pub fn describe(self) -> &'static str {
        match self {
            Mode::Dev => "development server",
            Mode::Build => "production build",
            Mode::Start => "production server",
        }
    }
}

/// Validated parameters for one supervised launch. Immutable once built.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Port the server is expected to bind, 1..=65535.
    pub port: u16,
    /// Host the server is expected to bind. Non-empty, otherwise opaque.
    pub host: String,
    /// Executable to spawn.
    pub cmd: String,
    /// Arguments for the executable, port and host flags included.
    pub args: Vec<String>,
}

impl LaunchRequest {
    /// URL the launched server should be reachable at from this machine.
    ///
    /// Unspecified bind addresses are rewritten to `localhost` and bare IPv6
    /// literals are bracketed, so the result is always pasteable.
    pub fn url(&self) -> String {
        let host = crate::probe::probe_host(&self.host);
        if host.contains(':') {
            format!("http://[{}]:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }

    /// Shell-quoted rendering of the full command for status lines.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(1 + self.args.len());
        parts.push(self.cmd.clone());
        parts.extend(self.args.iter().cloned());
        shell_words::join(&parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_match_mode_names() {
        assert_eq!(Mode::Dev.script(), "dev");
        assert_eq!(Mode::Build.script(), "build");
        assert_eq!(Mode::Start.script(), "start");
    }

    #[test]
    fn only_build_is_not_a_server() {
        assert!(Mode::Dev.is_server());
        assert!(Mode::Start.is_server());
        assert!(!Mode::Build.is_server());
    }

    fn request(host: &str, port: u16) -> LaunchRequest {
        LaunchRequest {
            port,
            host: host.to_string(),
            cmd: "npm".to_string(),
            args: vec!["run".to_string(), "dev".to_string()],
        }
    }

    #[test]
    fn url_uses_the_host_verbatim_for_names_and_ipv4() {
        assert_eq!(request("localhost", 3000).url(), "http://localhost:3000");
        assert_eq!(request("127.0.0.1", 8080).url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn url_rewrites_unspecified_bind_addresses() {
        assert_eq!(request("0.0.0.0", 3000).url(), "http://localhost:3000");
        assert_eq!(request("::", 3000).url(), "http://localhost:3000");
    }

    #[test]
    fn url_brackets_ipv6_literals() {
        assert_eq!(request("::1", 4000).url(), "http://[::1]:4000");
    }

    #[test]
    fn command_line_quotes_arguments_with_spaces() {
        let mut request = request("localhost", 3000);
        request.args.push("hello world".to_string());
        assert_eq!(request.command_line(), "npm run dev 'hello world'");
    }
}
