use logledger::file_log::format_line;
use logledger::{Logger, NO_CHECKPOINT};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::{AnyError, load_config};

const ECHO_BUFFER: usize = 1024;

pub async fn run(args: IngestArgs) -> Result<(), AnyError> {
    let config = load_config(args.config)?;
    let logger = Logger::initialize(config)?;

    let echo = if args.echo {
        let mut watch = logger.watch(ECHO_BUFFER)?;
        Some(tokio::spawn(async move {
            loop {
                match watch.receiver.recv().await {
                    Ok(entry) => print!("{}", format_line(&entry)),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Echo fell behind"),
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    } else {
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut accepted = 0u64;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    logger.append(line, args.kind)?;
                    accepted += 1;
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    let retained = logger.query(NO_CHECKPOINT)?.len();
    logger.shutdown()?;
    let metrics = logger.writer_metrics();

    if let Some(echo) = echo {
        echo.await?;
    }

    println!("accepted {accepted} messages, {retained} retained in memory");
    if let Some(metrics) = metrics {
        println!(
            "file writer: {} written, {} dropped, {} failed, {} rotations",
            metrics.entries_written,
            metrics.entries_dropped,
            metrics.write_failures,
            metrics.rotations
        );
    }
    Ok(())
}
