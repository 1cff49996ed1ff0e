use ledgerlink_session::Client;
use serde_json::Value;

use crate::cmd::RequestArgs;
use crate::exit::{session_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_result, OutputFormat};

pub async fn run(client: &Client, args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let params = parse_params(&args.params)?;
    let result = client
        .request_raw(&args.command, params)
        .await
        .map_err(|err| session_error(&format!("{} failed", args.command), err))?;
    print_result(&result, format);
    Ok(SUCCESS)
}

fn parse_params(input: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(input)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid --params JSON: {err}")))?;
    if !value.is_object() {
        return Err(CliError::new(
            DATA_INVALID,
            "--params must be a JSON object",
        ));
    }
    Ok(value)
}
