use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ledgerlink_frame::StreamMessage;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Print a command result.
///
/// Tables show one row per top-level field; nested values are rendered as
/// compact JSON.
pub fn print_result<T: Serialize>(result: &T, format: OutputFormat) {
    let value = serde_json::to_value(result).unwrap_or(Value::Null);
    match format {
        OutputFormat::Json => println!("{value}"),
        OutputFormat::Pretty => println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
        ),
        OutputFormat::Table => match &value {
            Value::Object(fields) => println!("{}", field_table(fields)),
            other => println!("{}", cell(other)),
        },
    }
}

/// Print homogeneous records, one table row each.
pub fn print_rows(headers: &[&str], rows: Vec<Vec<String>>, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Pretty => {
            for row in rows {
                let record: Map<String, Value> = headers
                    .iter()
                    .map(|h| h.to_ascii_lowercase())
                    .zip(row.into_iter().map(Value::from))
                    .collect();
                let record = Value::Object(record);
                if format == OutputFormat::Pretty {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&record).unwrap_or_else(|_| record.to_string())
                    );
                } else {
                    println!("{record}");
                }
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(headers.to_vec());
            for row in rows {
                table.add_row(row);
            }
            println!("{table}");
        }
    }
}

/// Print one unsolicited stream message as it arrives.
pub fn print_stream_message(message: &StreamMessage, format: OutputFormat) {
    match (message, format) {
        (StreamMessage::LedgerClosed(ledger), OutputFormat::Table | OutputFormat::Pretty) => {
            println!(
                "ledger {} closed: hash={} txns={}",
                ledger.ledger_index,
                ledger.ledger_hash,
                ledger
                    .txn_count
                    .map_or_else(|| "?".to_string(), |n| n.to_string())
            );
        }
        (StreamMessage::ServerStatus(status), OutputFormat::Table | OutputFormat::Pretty) => {
            println!(
                "server {}: load_factor={}/{}",
                status.server_status, status.load_factor, status.load_base
            );
        }
        (StreamMessage::Transaction(tx), OutputFormat::Table | OutputFormat::Pretty) => {
            println!(
                "transaction {} {} in ledger {}",
                tx.transaction
                    .get("hash")
                    .and_then(Value::as_str)
                    .unwrap_or("?"),
                tx.engine_result,
                tx.ledger_index
                    .map_or_else(|| "?".to_string(), |n| n.to_string())
            );
        }
        _ => println!("{}", stream_message_json(message)),
    }
}

pub fn stream_message_json(message: &StreamMessage) -> Value {
    let body = match message {
        StreamMessage::LedgerClosed(ledger) => serde_json::to_value(ledger),
        StreamMessage::ServerStatus(status) => serde_json::to_value(status),
        StreamMessage::Transaction(tx) => serde_json::to_value(tx),
        StreamMessage::Other { body, .. } => Ok(Value::Object(body.clone())),
    };
    let mut body = match body {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let _ = body.insert("type".to_string(), Value::from(message.kind()));
    Value::Object(body)
}

fn field_table(fields: &Map<String, Value>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (key, value) in fields {
        table.add_row(vec![key.clone(), cell(value)]);
    }
    table
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use ledgerlink_frame::ServerStatus;
    use serde_json::json;

    use super::*;

    #[test]
    fn cells_unquote_strings() {
        assert_eq!(cell(&json!("rAccount")), "rAccount");
        assert_eq!(cell(&json!(12)), "12");
        assert_eq!(cell(&Value::Null), "-");
        assert_eq!(cell(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn stream_json_keeps_type() {
        let message = StreamMessage::ServerStatus(ServerStatus {
            server_status: "full".to_string(),
            load_base: 256,
            load_factor: 256,
            base_fee: None,
            load_factor_server: None,
        });
        let value = stream_message_json(&message);
        assert_eq!(value["type"], "serverStatus");
        assert_eq!(value["server_status"], "full");
    }
}
