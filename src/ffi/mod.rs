//! Hand-written FFmpeg C bindings (no bindgen)
//!
//! Minimal declarations for libavformat, libavcodec and libavutil.
//! All FFmpeg structs are opaque - fields are reached through the thin C accessor library.

pub mod accessors;
pub mod avcodec;
pub mod avformat;
pub mod avutil;
pub mod error;
pub mod types;

pub use error::{check_error, FFmpegError, FFmpegResult};
pub use types::*;
