use std::io::{self, BufRead};

use chain::traits::TransactionsInput;
use slog::Logger;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const CHANNEL_CAPACITY: usize = 100;

/// Reads one message per line from standard input.
///
/// Reads happen on a dedicated OS thread outside the runtime, so a read
/// pending on the terminal never delays runtime shutdown.
pub struct StdinInput {
    logger: Logger,
}

impl StdinInput {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl TransactionsInput for StdinInput {
    fn input_channel(self: Box<Self>, cancel: CancellationToken) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let logger = self.logger.clone();
        let spawned = std::thread::Builder::new()
            .name("stdin-input".into())
            .spawn(move || forward_lines(io::stdin().lock(), tx, cancel, logger));
        if let Err(e) = spawned {
            slog::error!(self.logger, "Failed to start stdin reader"; "error" => %e);
        }
        rx
    }
}

/// Strips the line terminator; blank lines yield nothing.
pub fn normalize_line(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    (!line.trim().is_empty()).then_some(line)
}

/// Forwards every non-blank line of `reader` until EOF, a read error, a
/// closed receiver or cancellation. Cancellation is observed between lines.
pub(crate) fn forward_lines<R: BufRead>(
    reader: R,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
    logger: Logger,
) {
    for line in reader.lines() {
        if cancel.is_cancelled() {
            break;
        }
        match line {
            Ok(line) => {
                let Some(message) = normalize_line(&line) else {
                    continue;
                };
                if tx.blocking_send(message.to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                slog::warn!(logger, "Failed to read input"; "error" => %e);
                break;
            }
        }
    }
    slog::debug!(logger, "Input stream closed");
}
