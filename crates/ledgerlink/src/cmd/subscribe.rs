use ledgerlink_session::{Session, Streams};
use tracing::info;

use crate::cmd::SubscribeArgs;
use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_stream_message, OutputFormat};

pub async fn run(session: &mut Session, args: SubscribeArgs, format: OutputFormat) -> CliResult<i32> {
    let streams = streams(&args)?;
    let snapshot = session
        .client()
        .subscribe(streams)
        .await
        .map_err(|err| session_error("subscribe failed", err))?;
    info!(
        streams = ?streams.names(),
        ledger_index = ?snapshot.ledger_index,
        "subscribed"
    );

    let mut printed = 0usize;
    loop {
        let message = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(SUCCESS);
            }
            message = session.recv() => message,
        };

        let Some(message) = message else {
            return Err(CliError::new(
                crate::exit::TRANSPORT_ERROR,
                "session ended: connection lost",
            ));
        };

        print_stream_message(&message, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                return Ok(SUCCESS);
            }
        }
    }
}

/// Selected streams; the ledger stream when none is named.
fn streams(args: &SubscribeArgs) -> CliResult<Streams> {
    if args.count == Some(0) {
        return Err(CliError::new(USAGE, "--count must be greater than zero"));
    }
    let mut streams = Streams {
        ledger: args.ledger,
        transactions: args.transactions,
        transactions_proposed: args.proposed,
        server: args.server,
    };
    if streams.names().is_empty() {
        streams.ledger = true;
    }
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SubscribeArgs {
        SubscribeArgs {
            ledger: false,
            transactions: false,
            proposed: false,
            server: false,
            count: None,
        }
    }

    #[test]
    fn defaults_to_ledger_stream() {
        assert_eq!(streams(&args()).unwrap().names(), vec!["ledger"]);
    }

    #[test]
    fn keeps_explicit_selection() {
        let selected = SubscribeArgs {
            server: true,
            proposed: true,
            ..args()
        };
        assert_eq!(
            streams(&selected).unwrap().names(),
            vec!["transactions_proposed", "server"]
        );
    }

    #[test]
    fn zero_count_is_usage_error() {
        let selected = SubscribeArgs {
            count: Some(0),
            ..args()
        };
        assert_eq!(streams(&selected).unwrap_err().code, USAGE);
    }
}
