use std::str::FromStr;

use anyhow::{Result, anyhow};
use slog::{Drain, Level, Logger, o};

/// Terminal logger filtered at `level` (`info`, `debug`, ...).
///
/// Records are formatted off the calling thread; the returned logger must be
/// kept alive for buffered records to flush.
pub fn build_logger(level: &str) -> Result<Logger> {
    let level = Level::from_str(level).map_err(|_| anyhow!("invalid log level: {level}"))?;

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain)
        .build()
        .fuse()
        .filter_level(level)
        .fuse();

    Ok(Logger::root(drain, o!("app" => "minchain")))
}
