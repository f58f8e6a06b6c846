//! Diagnostics go to stderr through `simplelog`, keeping stdout for the report.

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use time::macros::format_description;

use crate::error::Result;

/// Log level for a `-v` count, falling back to the config file's `verbose`.
///
/// Warnings and hashing errors always show; `-v` adds progress and totals,
/// `-vv` adds per-file debug output.
pub fn level_for(verbosity: u8, verbose: bool) -> LevelFilter {
    match verbosity {
        0 if verbose => LevelFilter::Info,
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Installs the global logger. Call once, before any logging.
pub fn init_logging(level: LevelFilter) -> Result<()> {
    let mut builder = ConfigBuilder::new();
    let builder = match builder.set_time_offset_to_local() {
        Ok(builder) | Err(builder) => builder,
    };
    let config = builder
        .set_time_format_custom(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .set_thread_level(LevelFilter::Off)
        .build();

    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)?;
    Ok(())
}
