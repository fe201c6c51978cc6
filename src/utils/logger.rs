// src/utils/logger.rs

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::sync::OnceLock;

static MAX_LEVEL: OnceLock<LevelFilter> = OnceLock::new();
static LOGGER: ConsoleLogger = ConsoleLogger;

struct ConsoleLogger;

/// Installs the console logger. Fails if another logger is already set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  let _ = MAX_LEVEL.set(level);
  log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Icon prefix per level.
pub fn level_icon(level: Level) -> &'static str {
  match level {
    Level::Error => "🔴",
    Level::Warn => "🟠",
    Level::Info => "🔵",
    Level::Debug => "⚪",
    Level::Trace => "▫️",
  }
}

impl log::Log for ConsoleLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= *MAX_LEVEL.get().unwrap_or(&LevelFilter::Info)
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      // Format: "🔴  [simview::controller] Gateway failed"
      let line = format!("{}  [{}] {}\n", level_icon(record.level()), record.target(), record.args());
      let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
  }

  fn flush(&self) {
    let _ = std::io::stderr().flush();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_once() {
    // A second install must fail rather than replace the sink.
    let _ = init(LevelFilter::Debug);
    assert!(init(LevelFilter::Trace).is_err());
    log::debug!("logger installed");
  }

  #[test]
  fn test_icons() {
    assert_eq!(level_icon(Level::Error), "🔴");
    assert_eq!(level_icon(Level::Info), "🔵");
  }
}
