use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use ptmp_frame::{IpcData, LengthMode};
use ptmp_session::{authentication, generate_app_id, NegotiationInfo, SessionConfig};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod encode;
pub mod negotiate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Negotiate, authenticate, issue one IPC call and print its returns.
    Call(CallArgs),
    /// Negotiate only and print the server's parameters.
    Negotiate(NegotiateArgs),
    /// Print the wire bytes of an IPC call frame without connecting.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Call(args) => call::run(args, format),
        Command::Negotiate(args) => negotiate::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Authentication method advertised in the negotiation request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuthMethod {
    Cleartext,
    Simple,
    Md5,
}

impl AuthMethod {
    pub fn code(self) -> i32 {
        match self {
            AuthMethod::Cleartext => authentication::CLEARTEXT,
            AuthMethod::Simple => authentication::SIMPLE,
            AuthMethod::Md5 => authentication::MD5,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Server address, `host:port` (port defaults to 39000).
    #[arg(env = "PTMP_ADDR")]
    pub addr: String,
    /// Timeout for connecting and for each read or write (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Application id sent during negotiation. Default: random UUID.
    #[arg(long, value_name = "ID")]
    pub app_id: Option<String>,
    /// Authentication method to advertise.
    #[arg(long, value_enum, default_value = "cleartext")]
    pub auth: AuthMethod,
    /// Fail on frames whose body does not match the declared length.
    #[arg(long)]
    pub strict: bool,
    /// Accept negotiation responses that are not PTMP version 1.
    #[arg(long)]
    pub no_validate: bool,
}

impl ConnectArgs {
    pub fn session_config(&self) -> CliResult<SessionConfig> {
        Ok(SessionConfig {
            timeout: Some(parse_timeout(&self.timeout)?),
            length_mode: if self.strict {
                LengthMode::Strict
            } else {
                LengthMode::Lenient
            },
            validate_negotiation: !self.no_validate,
            ..SessionConfig::default()
        })
    }

    pub fn negotiation(&self) -> NegotiationInfo {
        let app_id = self.app_id.clone().unwrap_or_else(generate_app_id);
        NegotiationInfo::new(app_id, self.auth.code())
    }
}

#[derive(Args, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Dotted call name, e.g. `appWindow.getVersion`.
    pub call_name: String,
    /// Call argument as TYPE:VALUE (e.g. qstring:Router0, int:3). Repeatable.
    #[arg(long = "arg", value_name = "TYPE:VALUE")]
    pub args: Vec<String>,
    /// Call id to send.
    #[arg(long, default_value_t = 1)]
    pub call_id: u32,
    /// Username sent in the authentication request.
    #[arg(long, env = "PTMP_USERNAME")]
    pub username: String,
    /// Digest sent in the authentication response.
    #[arg(long, env = "PTMP_DIGEST", hide_env_values = true)]
    pub digest: String,
}

#[derive(Args, Debug)]
pub struct NegotiateArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Dotted call name, e.g. `appWindow.getVersion`.
    pub call_name: String,
    /// Call argument as TYPE:VALUE. Repeatable.
    #[arg(long = "arg", value_name = "TYPE:VALUE")]
    pub args: Vec<String>,
    /// Call id to encode.
    #[arg(long, default_value_t = 1)]
    pub call_id: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_call_args(args: &[String]) -> CliResult<Vec<IpcData>> {
    args.iter()
        .map(|arg| {
            IpcData::parse_arg(arg)
                .map_err(|err| CliError::new(USAGE, format!("invalid --arg {arg:?}: {err}")))
        })
        .collect()
}

pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
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
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
