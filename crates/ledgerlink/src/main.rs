mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, ConnectArgs};
use crate::exit::{CliError, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "ledgerlink", version, about = "Ledger node WebSocket client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    connect: ConnectArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))
        .and_then(|runtime| runtime.block_on(cmd::run(cli.command, &cli.connect, format)));

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_account_info_subcommand() {
        let cli = Cli::try_parse_from([
            "ledgerlink",
            "account-info",
            "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
            "--ledger",
            "current",
        ])
        .expect("account-info args should parse");

        let Command::AccountInfo(args) = cli.command else {
            panic!("expected account-info");
        };
        assert_eq!(args.ledger, ledgerlink_session::LedgerSpec::Current);
    }

    #[test]
    fn connection_flags_are_global() {
        let cli = Cli::try_parse_from([
            "ledgerlink",
            "fee",
            "--endpoint",
            "wss://s2.example.net",
            "--no-reconnect",
            "--request-timeout",
            "3s",
        ])
        .expect("fee args should parse");

        assert!(matches!(cli.command, Command::Fee));
        assert_eq!(cli.connect.endpoint, "wss://s2.example.net");
        assert!(cli.connect.no_reconnect);
        assert_eq!(cli.connect.request_timeout, "3s");
    }

    #[test]
    fn account_tx_accepts_negative_bounds() {
        let cli = Cli::try_parse_from([
            "ledgerlink",
            "account-tx",
            "rAccount",
            "--min-ledger",
            "-1",
            "--max-ledger",
            "90000",
            "--count",
            "5",
        ])
        .expect("account-tx args should parse");

        let Command::AccountTx(args) = cli.command else {
            panic!("expected account-tx");
        };
        assert_eq!(args.min_ledger, -1);
        assert_eq!(args.max_ledger, 90000);
        assert_eq!(args.count, Some(5));
    }

    #[test]
    fn rejects_bad_ledger_selector() {
        let err = Cli::try_parse_from(["ledgerlink", "ledger", "latest"])
            .expect_err("unknown selector should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn submit_requires_a_blob() {
        let err = Cli::try_parse_from(["ledgerlink", "submit"])
            .expect_err("submit without blobs should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
