/*
 * Scheduler Logging
 *
 * Adapted from the CLUU kernel's `utils::debug::logger` (`CluuLogger`,
 * a `log::Log` implementation writing to a COM2 serial sink). This
 * crate runs hosted, so the sink is stderr instead of serial, and
 * `init` never panics on double-registration — a host harness that
 * already installed its own logger (e.g. `env_logger` in an
 * integration test) is expected to skip calling this at all, so a
 * second call here is a caller bug, not fatal.
 */

use log::{Level, LevelFilter, Metadata, Record};

struct SchedLogger;

impl log::Log for SchedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: SchedLogger = SchedLogger;

/// Install the scheduler's stderr logger at `LevelFilter::Debug`.
/// Returns `false` (rather than panicking) if a logger is already
/// installed, since that is a routine outcome when a host harness
/// brings its own.
pub fn init() -> bool {
    match log::set_logger(&LOGGER) {
        Ok(()) => {
            log::set_max_level(LevelFilter::Debug);
            true
        }
        Err(_) => false,
    }
}
