//! FFmpeg error handling
//!
//! Error codes returned by the engine, their conversion into [`FFmpegError`], and the
//! return-code checking helpers used throughout the safe wrappers.

use std::ffi::CStr;
use std::fmt;
use std::os::raw::{c_char, c_int};

// ============================================================================
// FFmpeg Error Codes
// ============================================================================

/// End of file / stream reached
pub const AVERROR_EOF: c_int = fferrtag(b'E', b'O', b'F', b' ');

/// Unknown error, typically from an external library
pub const AVERROR_UNKNOWN: c_int = fferrtag(b'U', b'N', b'K', b'N');

// FFmpeg negates errno values, so these are platform specific

/// Resource temporarily unavailable (output not ready / input not accepted)
#[cfg(target_os = "macos")]
pub const AVERROR_EAGAIN: c_int = -35;

#[cfg(not(target_os = "macos"))]
pub const AVERROR_EAGAIN: c_int = -11;

/// Invalid argument
pub const AVERROR_EINVAL: c_int = -22;

/// Create FFmpeg error tag from 4 bytes
const fn fferrtag(a: u8, b: u8, c: u8, d: u8) -> c_int {
  -((a as c_int) | ((b as c_int) << 8) | ((c as c_int) << 16) | ((d as c_int) << 24))
}

// ============================================================================
// FFmpeg Error Type
// ============================================================================

/// Engine error: the negative return code and its `av_strerror` description
#[derive(Clone, PartialEq, Eq)]
pub struct FFmpegError {
  /// Error code (negative)
  pub code: c_int,
  /// Human-readable message
  pub message: String,
}

impl FFmpegError {
  /// Create error from FFmpeg error code
  pub fn from_code(code: c_int) -> Self {
    Self {
      code,
      message: error_message(code),
    }
  }

  /// Create error with custom message
  pub fn new(code: c_int, message: impl Into<String>) -> Self {
    Self {
      code,
      message: message.into(),
    }
  }

  #[inline]
  pub fn is_eagain(&self) -> bool {
    self.code == AVERROR_EAGAIN
  }

  #[inline]
  pub fn is_eof(&self) -> bool {
    self.code == AVERROR_EOF
  }
}

impl fmt::Debug for FFmpegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FFmpegError")
      .field("code", &self.code)
      .field("message", &self.message)
      .finish()
  }
}

impl fmt::Display for FFmpegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} (code {})", self.message, self.code)
  }
}

impl std::error::Error for FFmpegError {}

/// Result type for raw FFmpeg calls
pub type FFmpegResult<T> = Result<T, FFmpegError>;

// ============================================================================
// Error Checking
// ============================================================================

/// Check FFmpeg return code and convert to Result
///
/// Returns Ok with the value if >= 0, Err with FFmpegError if < 0
#[inline]
pub fn check_error(ret: c_int) -> FFmpegResult<c_int> {
  if ret < 0 {
    Err(FFmpegError::from_code(ret))
  } else {
    Ok(ret)
  }
}

/// Check FFmpeg return code, mapping EAGAIN and EOF to `Ok(None)`
#[inline]
pub fn check_error_except_eagain_eof(ret: c_int) -> FFmpegResult<Option<c_int>> {
  if ret >= 0 {
    Ok(Some(ret))
  } else if ret == AVERROR_EAGAIN || ret == AVERROR_EOF {
    Ok(None)
  } else {
    Err(FFmpegError::from_code(ret))
  }
}

/// Get error message for an FFmpeg error code
pub fn error_message(code: c_int) -> String {
  let mut buf = [0 as c_char; 256];
  unsafe {
    if super::avutil::av_strerror(code, buf.as_mut_ptr(), buf.len()) < 0 {
      return format!("Error number {} occurred", code);
    }
    CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_codes_are_negative() {
    assert!(AVERROR_EOF < 0);
    assert!(AVERROR_EAGAIN < 0);
    assert!(AVERROR_EINVAL < 0);
    assert!(AVERROR_UNKNOWN < 0);
  }

  #[test]
  fn test_check_error() {
    assert_eq!(check_error(0).unwrap(), 0);
    assert_eq!(check_error(100).unwrap(), 100);
    assert!(check_error(AVERROR_EINVAL).is_err());
    assert!(check_error(AVERROR_EAGAIN).unwrap_err().is_eagain());
  }

  #[test]
  fn test_check_error_except_eagain_eof() {
    assert_eq!(check_error_except_eagain_eof(7).unwrap(), Some(7));
    assert_eq!(check_error_except_eagain_eof(AVERROR_EOF).unwrap(), None);
    assert_eq!(check_error_except_eagain_eof(AVERROR_EAGAIN).unwrap(), None);
    assert!(!check_error_except_eagain_eof(AVERROR_EINVAL).unwrap_err().is_eof());
  }

  #[test]
  fn test_message_from_engine() {
    let err = FFmpegError::from_code(AVERROR_EOF);
    assert_eq!(err.code, AVERROR_EOF);
    assert_eq!(err.message, "End of file");
  }
}
