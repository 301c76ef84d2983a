use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use roverlink_wire::Direction;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod configs;
pub mod drive;
pub mod send;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect, send one command, and disconnect.
    Send(SendArgs),
    /// Interactive teleoperation from stdin.
    Drive(DriveArgs),
    /// Print telemetry from the robot.
    Watch(WatchArgs),
    /// Manage named robot configurations.
    Configs(ConfigsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args),
        Command::Drive(args) => drive::run(args),
        Command::Watch(args) => watch::run(args, format),
        Command::Configs(args) => configs::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum MoveDir {
    Forward,
    Backward,
    Left,
    Right,
}

impl From<MoveDir> for Direction {
    fn from(dir: MoveDir) -> Self {
        match dir {
            MoveDir::Forward => Direction::Forward,
            MoveDir::Backward => Direction::Backward,
            MoveDir::Left => Direction::Left,
            MoveDir::Right => Direction::Right,
        }
    }
}

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("action")
    .required(true)
    .multiple(false)
    .args(["move", "stop", "config", "path"]))]
pub struct SendArgs {
    /// Robot endpoint (host:port).
    pub endpoint: String,
    /// Drive in a direction.
    #[arg(long, value_enum)]
    pub r#move: Option<MoveDir>,
    /// Stop all motion.
    #[arg(long)]
    pub stop: bool,
    /// Send the named configuration from the store.
    #[arg(long, value_name = "NAME", requires = "store")]
    pub config: Option<String>,
    /// Send a waypoint path from a JSON file.
    #[arg(long, value_name = "FILE")]
    pub path: Option<PathBuf>,
    /// Configuration store file (JSON).
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct DriveArgs {
    /// Robot endpoint (host:port).
    pub endpoint: String,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Robot endpoint (host:port).
    pub endpoint: String,
    /// Exit after printing N telemetry messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ConfigsArgs {
    #[command(subcommand)]
    pub action: ConfigsAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigsAction {
    /// List stored configurations.
    List {
        /// Configuration store file (JSON).
        #[arg(long, value_name = "FILE")]
        store: PathBuf,
    },
    /// Add a configuration.
    Add {
        /// Configuration store file (JSON).
        #[arg(long, value_name = "FILE")]
        store: PathBuf,
        /// Configuration name.
        name: String,
        /// Wheel diameter in centimeters.
        diameter: f64,
        /// Track offset in centimeters.
        offset: f64,
    },
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

/// Split "host:port" into its parts. IPv6 literals use bracket syntax
/// ("[::1]:1111").
pub fn parse_endpoint(endpoint: &str) -> CliResult<(String, u16)> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| CliError::new(USAGE, format!("invalid endpoint (want host:port): {endpoint}")))?;
    if host.is_empty() {
        return Err(CliError::new(USAGE, format!("missing host in endpoint: {endpoint}")));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid port in endpoint: {endpoint}")))?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    Ok((host.to_string(), port))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_endpoint_host_and_port() {
        assert_eq!(
            parse_endpoint("10.0.1.1:1111").unwrap(),
            ("10.0.1.1".to_string(), 1111)
        );
        assert_eq!(
            parse_endpoint("robot.local:80").unwrap(),
            ("robot.local".to_string(), 80)
        );
        assert_eq!(parse_endpoint("[::1]:9000").unwrap(), ("::1".to_string(), 9000));
    }

    #[test]
    fn parse_endpoint_rejects_bad_input() {
        assert!(parse_endpoint("no-port").is_err());
        assert!(parse_endpoint(":1111").is_err());
        assert!(parse_endpoint("host:notaport").is_err());
        assert!(parse_endpoint("host:70000").is_err());
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
    }

    #[test]
    fn move_dir_maps_to_direction() {
        assert_eq!(Direction::from(MoveDir::Forward), Direction::Forward);
        assert_eq!(Direction::from(MoveDir::Right), Direction::Right);
    }
}
