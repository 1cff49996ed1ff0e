//! Single-request lookups.

use ledgerlink_session::Client;

use crate::cmd::{AccountInfoArgs, LedgerArgs, TxArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_result, OutputFormat};

pub async fn tx(client: &Client, args: TxArgs, format: OutputFormat) -> CliResult<i32> {
    if args.hash.len() != 64 || !args.hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CliError::new(
            USAGE,
            format!("invalid transaction hash: {}", args.hash),
        ));
    }
    let result = client
        .tx(&args.hash)
        .await
        .map_err(|err| session_error("tx failed", err))?;
    print_result(&result, format);
    Ok(SUCCESS)
}

pub async fn account_info(
    client: &Client,
    args: AccountInfoArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let result = client
        .account_info(&args.account, &args.ledger)
        .await
        .map_err(|err| session_error("account_info failed", err))?;
    print_result(&result.account_data, format);
    Ok(SUCCESS)
}

pub async fn ledger(client: &Client, args: LedgerArgs, format: OutputFormat) -> CliResult<i32> {
    let result = client
        .ledger(&args.ledger, args.transactions)
        .await
        .map_err(|err| session_error("ledger failed", err))?;
    print_result(&result.ledger, format);
    Ok(SUCCESS)
}

pub async fn fee(client: &Client, format: OutputFormat) -> CliResult<i32> {
    let result = client
        .fee()
        .await
        .map_err(|err| session_error("fee failed", err))?;
    print_result(&result, format);
    Ok(SUCCESS)
}
