use ledgerlink_session::{AccountTransaction, Client};
use serde_json::Value;

use crate::cmd::AccountTxArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_rows, OutputFormat};

pub async fn run(client: &Client, args: AccountTxArgs, format: OutputFormat) -> CliResult<i32> {
    let mut stream = client.account_tx(
        &args.account,
        args.page_size,
        args.min_ledger,
        args.max_ledger,
    );

    let mut rows = Vec::new();
    while let Some(item) = stream.recv().await {
        let item = item.map_err(|err| session_error("account_tx failed", err))?;
        rows.push(row(&item));
        if args.count.is_some_and(|count| rows.len() >= count) {
            break;
        }
    }

    print_rows(
        &["LEDGER", "HASH", "TYPE", "RESULT", "VALIDATED"],
        rows,
        format,
    );
    Ok(SUCCESS)
}

fn row(item: &AccountTransaction) -> Vec<String> {
    let field = |value: &Value, key: &str| match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => "-".to_string(),
    };
    vec![
        field(&item.tx, "ledger_index"),
        field(&item.tx, "hash"),
        field(&item.tx, "TransactionType"),
        field(&item.meta, "TransactionResult"),
        item.validated.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn row_picks_summary_fields() {
        let item = AccountTransaction {
            tx: json!({"ledger_index": 7, "hash": "AB", "TransactionType": "Payment"}),
            meta: json!({"TransactionResult": "tesSUCCESS"}),
            validated: true,
        };
        assert_eq!(row(&item), vec!["7", "AB", "Payment", "tesSUCCESS", "true"]);
    }

    #[test]
    fn row_tolerates_missing_meta() {
        let item = AccountTransaction {
            tx: json!({}),
            meta: Value::Null,
            validated: false,
        };
        assert_eq!(row(&item), vec!["-", "-", "-", "-", "false"]);
    }
}
