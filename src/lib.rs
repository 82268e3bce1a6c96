#![deny(clippy::all)]

//! Demux, decode, encode and mux media streams on top of FFmpeg
//!
//! A [`FormatContext`] is an open container. Output containers own [`Stream`]s bound to
//! [`CodecContext`]s; frames go through the encoder, packets are rescaled from the codec
//! time base to the stream time base and written between the header and the trailer.
//! Input containers yield their [`Packet`]s through a lazy [`Packets`] iterator.

// Linked in for the static FFmpeg build, which depends on zlib
#[cfg(feature = "static")]
extern crate libz_sys as _;

// FFmpeg C bindings (hand-written, no bindgen)
pub mod ffi;

// Safe wrappers (RAII)
pub mod codec;

// Process-wide initialization and log forwarding
pub mod init;

pub use codec::{
  rescale, AvioContext, AvioHandlers, Codec, CodecContext, CodecError, CodecOptions,
  CodecResult, CodecState, CodecType, Dictionary, FormatContext, FormatMode, Frame, MediaType,
  OutputFormat, OutputTarget, Packet, Packets, Rational, Stream, SyntheticVideo, TimeBase,
  IO_BUFFER_SIZE,
};
pub use ffi::{AVCodecID, AVPixelFormat, AVSampleFormat, AV_NOPTS_VALUE};
pub use init::{init, set_log_level, LogLevel};
