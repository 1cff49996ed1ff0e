use ledgerlink_session::Client;

use crate::cmd::SubmitArgs;
use crate::exit::{session_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_result, print_rows, OutputFormat};

pub async fn run(client: &Client, args: SubmitArgs, format: OutputFormat) -> CliResult<i32> {
    if let [blob] = args.blobs.as_slice() {
        let result = client
            .submit(blob)
            .await
            .map_err(|err| session_error("submit failed", err))?;
        let accepted = result.is_accepted();
        print_result(&result, format);
        return Ok(if accepted { SUCCESS } else { FAILURE });
    }

    let results = client.submit_batch(&args.blobs).await;
    let mut all_accepted = true;
    let rows = results
        .iter()
        .enumerate()
        .map(|(n, result)| match result {
            Ok(submitted) => {
                all_accepted &= submitted.is_accepted();
                vec![
                    n.to_string(),
                    submitted.engine_result.clone(),
                    submitted.engine_result_message.clone().unwrap_or_default(),
                ]
            }
            Err(err) => {
                all_accepted = false;
                vec![n.to_string(), "error".to_string(), err.to_string()]
            }
        })
        .collect();

    print_rows(&["INDEX", "RESULT", "MESSAGE"], rows, format);
    Ok(if all_accepted { SUCCESS } else { FAILURE })
}
