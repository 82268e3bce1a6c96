//! Safe Rust wrappers for the demux/decode/encode/mux pipeline
//!
//! This module provides RAII wrappers around FFmpeg's C structures,
//! ensuring proper resource cleanup and memory safety.

pub mod avio_context;
pub mod context;
pub mod descriptor;
pub mod dictionary;
pub mod format;
pub mod frame;
pub mod packet;
pub mod rational;
pub mod stream;
pub mod synthetic;

pub use avio_context::{AvioContext, AvioHandlers, IO_BUFFER_SIZE};
pub use context::{CodecContext, CodecState};
pub use descriptor::{Codec, CodecType, MediaType};
pub use dictionary::Dictionary;
pub use format::{FormatContext, FormatMode, OutputFormat, OutputTarget, Packets};
pub use frame::Frame;
pub use packet::Packet;
pub use rational::{rescale, Rational, TimeBase};
pub use stream::Stream;
pub use synthetic::SyntheticVideo;

use crate::ffi::{AVCodecID, AVPixelFormat, AVSampleFormat, FFmpegError};
use std::ffi::CStr;
use std::os::raw::c_char;

/// Codec context configuration, applied in one batch by [`CodecContext::configure`]
///
/// Fields left as `None` keep the value the engine allocated the context with.
#[derive(Debug, Clone, Default)]
pub struct CodecOptions {
  /// Video width in pixels
  pub width: Option<u32>,
  /// Video height in pixels
  pub height: Option<u32>,
  /// Pixel format of the frames fed to / produced by the codec
  pub pixel_format: Option<AVPixelFormat>,
  /// Target bitrate in bits per second
  pub bit_rate: Option<i64>,
  /// Unit of frame and packet timestamps on the codec side
  pub time_base: Option<TimeBase>,
  /// Nominal frame rate
  pub frame_rate: Option<Rational>,
  /// Codec profile (see [`crate::ffi::avcodec::profile`])
  pub profile: Option<i32>,
  /// `AV_CODEC_FLAG_*` bits, replacing the current flags
  pub flags: Option<i32>,
  /// Group of pictures size (keyframe interval)
  pub gop_size: Option<u32>,
  /// Maximum B-frames between non-B frames
  pub max_b_frames: Option<u32>,
  /// Macroblock decision mode (see [`crate::ffi::avcodec::mb_decision`])
  pub mb_decision: Option<i32>,
  /// Number of threads (0 for auto)
  pub thread_count: Option<u32>,
  /// Audio sample rate in Hz
  pub sample_rate: Option<u32>,
  /// Audio sample format
  pub sample_format: Option<AVSampleFormat>,
  /// Audio channel layout as a native channel mask (e.g. 0x3 for stereo)
  pub channel_layout: Option<u64>,
}

/// Codec error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
  #[error("FFmpeg error: {0}")]
  Ffmpeg(#[from] FFmpegError),

  #[error("output format is not initialized. Unable to allocate context")]
  OutputFormat,

  #[error("Failed to open input '{url}': {source}")]
  OpenInput { url: String, source: FFmpegError },

  #[error("Failed to open output '{url}': {source}")]
  OpenOutput { url: String, source: FFmpegError },

  #[error("Failed to open codec '{codec}': {source}")]
  CodecOpen { codec: String, source: FFmpegError },

  #[error("Encode failed: {0}")]
  Encode(FFmpegError),

  #[error("Decode failed: {0}")]
  Decode(FFmpegError),

  #[error("Failed to write header: {0}")]
  HeaderWrite(String),

  #[error("Failed to write packet: {0}")]
  Write(FFmpegError),

  #[error("Failed to read packet: {0}")]
  Read(FFmpegError),

  #[error("Codec not found: {0}")]
  CodecNotFound(String),

  #[error("Encoder not found for codec: {0:?}")]
  EncoderNotFound(AVCodecID),

  #[error("Decoder not found for codec: {0:?}")]
  DecoderNotFound(AVCodecID),

  #[error("Invalid time base {num}/{den}: denominator must be positive")]
  InvalidTimeBase { num: i32, den: i32 },

  #[error("Failed to allocate {0}")]
  AllocationFailed(&'static str),

  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("Invalid state: {0}")]
  InvalidState(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Borrow a static C string owned by the engine's registries
///
/// Null pointers and non UTF-8 contents yield an empty string.
pub(crate) fn static_str(ptr: *const c_char) -> &'static str {
  if ptr.is_null() {
    return "";
  }
  unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("")
}

/// Convert a Rust string into a C string for the engine
pub(crate) fn to_cstring(value: &str, what: &str) -> CodecResult<std::ffi::CString> {
  std::ffi::CString::new(value).map_err(|_| {
    CodecError::InvalidConfig(format!("{} contains a NUL byte: {:?}", what, value))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_output_format_message_is_stable() {
    assert_eq!(
      CodecError::OutputFormat.to_string(),
      "output format is not initialized. Unable to allocate context"
    );
  }

  #[test]
  fn test_to_cstring_rejects_nul() {
    assert!(to_cstring("mp4", "format name").is_ok());
    let err = to_cstring("m\0p4", "format name").unwrap_err();
    assert!(matches!(err, CodecError::InvalidConfig(_)));
  }

  #[test]
  fn test_static_str_null() {
    assert_eq!(static_str(std::ptr::null()), "");
  }
}
