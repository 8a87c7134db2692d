//! Command-line interface for session-gate.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

/// Action to run against the persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    /// Restore and print the session.
    #[default]
    Status,
    /// Sign in with email and password.
    SignIn { email: String, password: String },
    /// Register and sign in.
    Register { email: String, password: String },
    /// Sign out and clear storage.
    SignOut,
    /// Re-read the cached user.
    Refresh,
    /// Drop the session as if its token had expired.
    Expire,
}

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Session storage file (overrides config file).
    pub store: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Skip simulated backend latency.
    pub no_latency: bool,
    /// Action to run.
    pub command: Command,
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
    let mut positional: Vec<String> = Vec::new();
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
            Short('s') | Long("store") => {
                result.store = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("no-latency") => {
                result.no_latency = true;
            }
            Value(val) => {
                positional.push(val.string()?);
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if !positional.is_empty() {
        result.command = parse_command(positional)?;
    }

    Ok(result)
}

fn parse_command(positional: Vec<String>) -> Result<Command, ArgsError> {
    let mut words = positional.into_iter();
    let Some(name) = words.next() else {
        return Ok(Command::default());
    };

    let command = match name.as_str() {
        "status" => Command::Status,
        "sign-in" | "login" => {
            let email = words.next().ok_or(ArgsError::MissingArgument("email"))?;
            let password = words.next().ok_or(ArgsError::MissingArgument("password"))?;
            Command::SignIn { email, password }
        }
        "register" => {
            let email = words.next().ok_or(ArgsError::MissingArgument("email"))?;
            let password = words.next().ok_or(ArgsError::MissingArgument("password"))?;
            Command::Register { email, password }
        }
        "sign-out" | "logout" => Command::SignOut,
        "refresh" => Command::Refresh,
        "expire" => Command::Expire,
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = words.next() {
        return Err(ArgsError::UnexpectedArgument(extra));
    }

    Ok(command)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-gate {version}
Persisted sign-in session with navigation gating

USAGE:
    session-gate [OPTIONS] [COMMAND]

COMMANDS:
    status                      Restore and show the session [default]
    sign-in <EMAIL> <PASSWORD>  Sign in
    register <EMAIL> <PASSWORD> Register and sign in
    sign-out                    Sign out and clear storage
    refresh                     Re-read the cached user
    expire                      Drop the session as if the token expired

OPTIONS:
    -c, --config <FILE>     Path to configuration file (JSON)
    -s, --store <FILE>      Session storage file [default: session-gate.json]
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
        --no-latency        Skip simulated backend latency
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SESSION_GATE_STORE      Storage file (overrides config)
    SESSION_GATE_LOG_LEVEL  Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Sign in with the test account
    session-gate sign-in test@example.com 'Test1234!'

    # Later run: session is restored without contacting the backend
    session-gate status

    # Sign out
    session-gate sign-out
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("session-gate {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Command name not recognised.
    UnknownCommand(String),
    /// Command is missing a required value.
    MissingArgument(&'static str),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::UnknownCommand(name) => write!(f, "unknown command: '{}'", name),
            Self::MissingArgument(name) => write!(f, "missing argument: <{}>", name),
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
