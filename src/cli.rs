//! Command-line interface for session-keeper.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to (overrides config file).
    pub host: Option<IpAddr>,
    /// Port to listen on (overrides config file).
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Default container timeout in seconds (overrides config file).
    pub timeout: Option<u64>,
    /// Default container resolution in seconds (overrides config file).
    pub resolution: Option<u64>,
    /// Disable the background sweeper.
    pub no_sweep: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                result.timeout = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("timeout", value))?,
                );
            }
            Short('r') | Long("resolution") => {
                let value: String = parser.value()?.parse()?;
                result.resolution = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("resolution", value))?,
                );
            }
            Long("no-sweep") => {
                result.no_sweep = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-keeper {version}
Server-side session data with namespaced packages and resolution-gated expiry

USAGE:
    session-keeper [OPTIONS]

OPTIONS:
    -H, --host <ADDR>         Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>         Port to listen on [default: 3000]
    -c, --config <FILE>       Path to configuration file (JSON)
    -t, --timeout <SECS>      Default container timeout, 0 = never [default: 3600]
    -r, --resolution <SECS>   Default container resolution [default: 600]
    -l, --log-level <LVL>     Log level (error, warn, info, debug, trace)
        --no-sweep            Disable the background sweeper
    -h, --help                Print help
    -V, --version             Print version

ENVIRONMENT VARIABLES:
    SESSION_KEEPER_HOST        Host address (overrides config)
    SESSION_KEEPER_PORT        Port number (overrides config)
    SESSION_KEEPER_TIMEOUT     Default timeout (overrides config)
    SESSION_KEEPER_RESOLUTION  Default resolution (overrides config)
    SESSION_KEEPER_LOG_LEVEL   Log level (overrides config)
    RUST_LOG                   Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:3000, in-memory, 1h timeout)
    session-keeper

    # Short sessions, recorded at one-minute granularity
    session-keeper -t 900 -r 60

    # Start with config file
    session-keeper -c /etc/session-keeper/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("session-keeper {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("session-keeper")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.host.is_none());
        assert!(result.port.is_none());
        assert!(result.timeout.is_none());
        assert!(!result.no_sweep);
    }

    #[test]
    fn test_host_port() {
        let result = parse_args_from(args(&["-H", "0.0.0.0", "-p", "8080"])).unwrap();
        assert_eq!(result.host, Some(IpAddr::from([0, 0, 0, 0])));
        assert_eq!(result.port, Some(8080));
    }

    #[test]
    fn test_policy_options() {
        let result = parse_args_from(args(&["-t", "900", "--resolution", "60"])).unwrap();
        assert_eq!(result.timeout, Some(900));
        assert_eq!(result.resolution, Some(60));
    }

    #[test]
    fn test_invalid_timeout() {
        let result = parse_args_from(args(&["--timeout", "-5"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/config.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/config.json")));
    }

    #[test]
    fn test_no_sweep() {
        let result = parse_args_from(args(&["--no-sweep"])).unwrap();
        assert!(result.no_sweep);
    }

    #[test]
    fn test_help_and_version_flags() {
        assert!(parse_args_from(args(&["-h"])).unwrap().help);
        assert!(parse_args_from(args(&["--help"])).unwrap().help);
        assert!(parse_args_from(args(&["-V"])).unwrap().version);
        assert!(parse_args_from(args(&["--version"])).unwrap().version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_invalid_port() {
        let result = parse_args_from(args(&["-p", "invalid"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_unexpected_positional() {
        let result = parse_args_from(args(&["serve"]));
        assert!(matches!(result, Err(ArgsError::UnexpectedArgument(_))));
    }
}
