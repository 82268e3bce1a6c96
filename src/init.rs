//! Process-wide engine initialization and log forwarding
//!
//! FFmpeg needs no registration calls since 4.0, but its logger writes straight to
//! stderr. [`init`] reroutes it into `tracing` (target `"ffmpeg"`) once per process.

use crate::ffi::{
  accessors::fflog_set_sink,
  avutil::{av_log_get_level, av_log_set_level, log_level},
};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::Once;

static INIT: Once = Once::new();

/// Verbosity of the engine's own log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
  Quiet,
  Panic,
  Fatal,
  Error,
  Warning,
  Info,
  Verbose,
  Debug,
  Trace,
}

impl LogLevel {
  fn as_raw(self) -> c_int {
    match self {
      LogLevel::Quiet => log_level::QUIET,
      LogLevel::Panic => log_level::PANIC,
      LogLevel::Fatal => log_level::FATAL,
      LogLevel::Error => log_level::ERROR,
      LogLevel::Warning => log_level::WARNING,
      LogLevel::Info => log_level::INFO,
      LogLevel::Verbose => log_level::VERBOSE,
      LogLevel::Debug => log_level::DEBUG,
      LogLevel::Trace => log_level::TRACE,
    }
  }

  fn from_raw(level: c_int) -> Self {
    match level {
      l if l < log_level::PANIC => LogLevel::Quiet,
      l if l < log_level::FATAL => LogLevel::Panic,
      l if l < log_level::ERROR => LogLevel::Fatal,
      l if l < log_level::WARNING => LogLevel::Error,
      l if l < log_level::INFO => LogLevel::Warning,
      l if l < log_level::VERBOSE => LogLevel::Info,
      l if l < log_level::DEBUG => LogLevel::Verbose,
      l if l < log_level::TRACE => LogLevel::Debug,
      _ => LogLevel::Trace,
    }
  }
}

/// Initialize the engine for this process
///
/// Idempotent and cheap after the first call; every constructor that touches the engine
/// calls it, so explicit calls are only needed to change the log level before first use.
pub fn init() {
  INIT.call_once(|| {
    unsafe {
      av_log_set_level(log_level::WARNING);
      fflog_set_sink(Some(forward_log_line));
    }
    tracing::debug!(target: "avflow", "engine initialized");
  });
}

/// Set how verbose the engine's log output is
pub fn set_log_level(level: LogLevel) {
  init();
  unsafe { av_log_set_level(level.as_raw()) }
}

/// Current engine log level
pub fn log_level() -> LogLevel {
  LogLevel::from_raw(unsafe { av_log_get_level() })
}

unsafe extern "C" fn forward_log_line(level: c_int, line: *const c_char) {
  if line.is_null() {
    return;
  }
  let line = unsafe { CStr::from_ptr(line) }.to_string_lossy();
  let line = line.trim_end();
  if line.is_empty() {
    return;
  }

  match LogLevel::from_raw(level) {
    LogLevel::Quiet => {}
    LogLevel::Panic | LogLevel::Fatal | LogLevel::Error => {
      tracing::error!(target: "ffmpeg", "{}", line)
    }
    LogLevel::Warning => tracing::warn!(target: "ffmpeg", "{}", line),
    LogLevel::Info => tracing::info!(target: "ffmpeg", "{}", line),
    LogLevel::Verbose | LogLevel::Debug => tracing::debug!(target: "ffmpeg", "{}", line),
    LogLevel::Trace => tracing::trace!(target: "ffmpeg", "{}", line),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_is_idempotent() {
    init();
    init();
    assert!(INIT.is_completed());
  }

  #[test]
  fn test_level_mapping() {
    for level in [
      LogLevel::Quiet,
      LogLevel::Panic,
      LogLevel::Fatal,
      LogLevel::Error,
      LogLevel::Warning,
      LogLevel::Info,
      LogLevel::Verbose,
      LogLevel::Debug,
      LogLevel::Trace,
    ] {
      assert_eq!(LogLevel::from_raw(level.as_raw()), level);
    }
  }
}
