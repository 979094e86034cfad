//! Command-line interface for outcome-sessions.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Durable snapshot file (overrides config file).
    pub log_file: Option<PathBuf>,
    /// Seconds between reclamation passes.
    pub reclaim_interval_secs: Option<u64>,
    /// Keep the snapshot untouched when reclaiming.
    pub no_persist_on_reclaim: bool,
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
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('f') | Long("log-file") => {
                result.log_file = Some(parser.value()?.parse()?);
            }
            Short('i') | Long("reclaim-interval") => {
                let value: String = parser.value()?.parse()?;
                let secs: u64 = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("reclaim-interval", value.clone()))?;
                if secs == 0 {
                    return Err(ArgsError::InvalidValue("reclaim-interval", value));
                }
                result.reclaim_interval_secs = Some(secs);
            }
            Long("no-persist-on-reclaim") => {
                result.no_persist_on_reclaim = true;
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
        r#"outcome-sessions {version}
In-process session store with expiry and a durable snapshot

USAGE:
    outcome-sessions [OPTIONS]

OPTIONS:
    -c, --config <FILE>             Path to configuration file (JSON)
    -f, --log-file <FILE>           Durable session snapshot [default: sessions.log]
    -i, --reclaim-interval <SECS>   Seconds between expiry sweeps [default: 900]
        --no-persist-on-reclaim     Do not rewrite the snapshot after a sweep
    -l, --log-level <LVL>           Log level (error, warn, info, debug, trace)
    -h, --help                      Print help
    -V, --version                   Print version

ENVIRONMENT VARIABLES:
    OUTCOME_SESSIONS_LOG_PATH       Snapshot path (overrides config)
    OUTCOME_SESSIONS_RECLAIM_SECS   Sweep interval (overrides config)
    OUTCOME_SESSIONS_LOG_LEVEL      Log level (overrides config)
    RUST_LOG                        Alternative log level setting

EXAMPLES:
    # Recover ./sessions.log and sweep every 15 minutes
    outcome-sessions

    # Custom snapshot location with a one-minute sweep
    outcome-sessions -f /var/lib/outcomes/sessions.log -i 60
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("outcome-sessions {}", env!("CARGO_PKG_VERSION"));
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
        std::iter::once("outcome-sessions")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.config.is_none());
        assert!(result.log_file.is_none());
        assert!(result.reclaim_interval_secs.is_none());
        assert!(!result.no_persist_on_reclaim);
    }

    #[test]
    fn test_short_options() {
        let result = parse_args_from(args(&["-f", "/tmp/s.log", "-i", "60"])).unwrap();
        assert_eq!(result.log_file, Some(PathBuf::from("/tmp/s.log")));
        assert_eq!(result.reclaim_interval_secs, Some(60));
    }

    #[test]
    fn test_long_options() {
        let result = parse_args_from(args(&[
            "--log-file",
            "state/sessions.log",
            "--reclaim-interval",
            "30",
            "--no-persist-on-reclaim",
        ]))
        .unwrap();
        assert_eq!(result.log_file, Some(PathBuf::from("state/sessions.log")));
        assert_eq!(result.reclaim_interval_secs, Some(30));
        assert!(result.no_persist_on_reclaim);
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/outcome-sessions.json"])).unwrap();
        assert_eq!(
            result.config,
            Some(PathBuf::from("/etc/outcome-sessions.json"))
        );
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
    fn test_invalid_interval() {
        assert!(parse_args_from(args(&["-i", "soon"])).is_err());
        assert!(matches!(
            parse_args_from(args(&["-i", "0"])),
            Err(ArgsError::InvalidValue("reclaim-interval", _))
        ));
    }

    #[test]
    fn test_unexpected_positional() {
        let result = parse_args_from(args(&["serve"]));
        assert!(matches!(result, Err(ArgsError::UnexpectedArgument(_))));
    }
}
