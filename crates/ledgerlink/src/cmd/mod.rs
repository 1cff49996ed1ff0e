use std::time::Duration;

use clap::{Args, Subcommand};
use ledgerlink_session::{LedgerSpec, Session, SessionConfig};
use tracing::debug;

use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

pub mod account_tx;
pub mod query;
pub mod request;
pub mod submit;
pub mod subscribe;
pub mod version;

pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:6006";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up a transaction by hash.
    Tx(TxArgs),
    /// Show an account's root entry.
    AccountInfo(AccountInfoArgs),
    /// List transactions affecting an account.
    AccountTx(AccountTxArgs),
    /// Show a ledger header.
    Ledger(LedgerArgs),
    /// Show current transaction cost and queue state.
    Fee,
    /// Submit signed transaction blobs.
    Submit(SubmitArgs),
    /// Send an arbitrary command and print its result.
    Request(RequestArgs),
    /// Print stream messages until Ctrl-C.
    Subscribe(SubscribeArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Connection settings shared by every command that talks to a node.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Node WebSocket endpoint.
    #[arg(
        long,
        short = 'e',
        env = "LEDGERLINK_ENDPOINT",
        default_value = DEFAULT_ENDPOINT,
        global = true
    )]
    pub endpoint: String,
    /// Close instead of reconnecting when the connection drops.
    #[arg(long, global = true)]
    pub no_reconnect: bool,
    /// Per-request reply deadline (e.g. 60s, 500ms).
    #[arg(long, default_value = "60s", global = true)]
    pub request_timeout: String,
    /// Dial deadline (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    pub connect_timeout: String,
}

impl ConnectArgs {
    pub fn session_config(&self) -> CliResult<SessionConfig> {
        let mut config = SessionConfig::new(&self.endpoint)
            .with_reconnect(!self.no_reconnect)
            .with_request_timeout(parse_duration(&self.request_timeout)?);
        config.transport.connect_timeout = parse_duration(&self.connect_timeout)?;
        Ok(config)
    }
}

pub async fn run(command: Command, connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    if let Command::Version(args) = &command {
        return version::run(args);
    }

    let config = connect.session_config()?;
    debug!(endpoint = %config.endpoint, reconnect = config.reconnect, "connecting");
    let mut session = Session::open_with_config(config)
        .await
        .map_err(|err| session_error("connect failed", err))?;

    let client = session.client().clone();
    let result = match command {
        Command::Tx(args) => query::tx(&client, args, format).await,
        Command::AccountInfo(args) => query::account_info(&client, args, format).await,
        Command::AccountTx(args) => account_tx::run(&client, args, format).await,
        Command::Ledger(args) => query::ledger(&client, args, format).await,
        Command::Fee => query::fee(&client, format).await,
        Command::Submit(args) => submit::run(&client, args, format).await,
        Command::Request(args) => request::run(&client, args, format).await,
        Command::Subscribe(args) => subscribe::run(&mut session, args, format).await,
        Command::Version(_) => Ok(SUCCESS),
    };

    session.close().await;
    result
}

#[derive(Args, Debug)]
pub struct TxArgs {
    /// Transaction hash (64 hex characters).
    pub hash: String,
}

#[derive(Args, Debug)]
pub struct AccountInfoArgs {
    /// Account address.
    pub account: String,
    /// Ledger to read: validated, closed, current, a sequence, or a hash.
    #[arg(long, default_value = "validated", value_parser = parse_ledger)]
    pub ledger: LedgerSpec,
}

#[derive(Args, Debug)]
pub struct AccountTxArgs {
    /// Account address.
    pub account: String,
    /// Transactions per page.
    #[arg(long, default_value_t = 200)]
    pub page_size: u32,
    /// Earliest ledger (-1 for the earliest available).
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub min_ledger: i64,
    /// Latest ledger (-1 for the latest validated).
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub max_ledger: i64,
    /// Stop after N transactions.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Ledger to read: validated, closed, current, a sequence, or a hash.
    #[arg(default_value = "validated", value_parser = parse_ledger)]
    pub ledger: LedgerSpec,
    /// Include expanded transactions.
    #[arg(long)]
    pub transactions: bool,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Hex-encoded signed transaction blobs.
    #[arg(required = true)]
    pub blobs: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Command name, e.g. server_info.
    pub command: String,
    /// Params as a JSON object.
    #[arg(long, default_value = "{}")]
    pub params: String,
}

#[derive(Args, Debug)]
pub struct SubscribeArgs {
    /// Closed ledgers.
    #[arg(long)]
    pub ledger: bool,
    /// Validated transactions.
    #[arg(long)]
    pub transactions: bool,
    /// Proposed transactions.
    #[arg(long)]
    pub proposed: bool,
    /// Server status changes.
    #[arg(long)]
    pub server: bool,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `validated` / `closed` / `current`, a ledger sequence, or a
/// 64-character ledger hash.
pub fn parse_ledger(input: &str) -> Result<LedgerSpec, String> {
    let input = input.trim();
    match input {
        "validated" => return Ok(LedgerSpec::Validated),
        "closed" => return Ok(LedgerSpec::Closed),
        "current" => return Ok(LedgerSpec::Current),
        _ => {}
    }
    if let Ok(index) = input.parse::<u64>() {
        return Ok(LedgerSpec::Index(index));
    }
    if input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(LedgerSpec::Hash(input.to_ascii_uppercase()));
    }
    Err(format!(
        "invalid ledger '{input}' (expected validated, closed, current, a sequence, or a hash)"
    ))
}

/// Parse durations like `5s`, `150ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parse_duration_millis() {
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_ledger_selectors() {
        assert_eq!(parse_ledger("validated").unwrap(), LedgerSpec::Validated);
        assert_eq!(parse_ledger("current").unwrap(), LedgerSpec::Current);
        assert_eq!(parse_ledger("7125358").unwrap(), LedgerSpec::Index(7125358));

        let hash = "687f604ef6b2f67319e8dcc8c66ef49d84d18a1e18f948421fc24d2c7c3db464";
        assert_eq!(
            parse_ledger(hash).unwrap(),
            LedgerSpec::Hash(hash.to_ascii_uppercase())
        );
        assert!(parse_ledger("latest").is_err());
    }

    #[test]
    fn session_config_from_args() {
        let args = ConnectArgs {
            endpoint: "wss://s1.example.net".to_string(),
            no_reconnect: true,
            request_timeout: "10s".to_string(),
            connect_timeout: "500ms".to_string(),
        };
        let config = args.session_config().unwrap();
        assert!(!config.reconnect);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.transport.connect_timeout, Duration::from_millis(500));
    }
}
