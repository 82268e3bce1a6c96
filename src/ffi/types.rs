//! Core FFmpeg type definitions
//!
//! All FFmpeg structs are opaque (zero-sized) to avoid version-specific layout dependencies.
//! Field access is done via the thin C accessor library in accessors.c

use std::marker::PhantomData;
use std::os::raw::{c_char, c_int};

// ============================================================================
// Rational Number
// ============================================================================

/// Rational number as laid out by libavutil (passed by value across the FFI)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AVRational {
  /// Numerator
  pub num: c_int,
  /// Denominator
  pub den: c_int,
}

impl AVRational {
  pub const fn new(num: c_int, den: c_int) -> Self {
    Self { num, den }
  }
}

// ============================================================================
// Codec IDs
// ============================================================================

/// Codec IDs known to this crate
///
/// Values mirror `enum AVCodecID`; they have been stable across FFmpeg 4.x - 7.x.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVCodecID {
  None = 0,
  // Video
  Mpeg1Video = 1,
  Mpeg2Video = 2,
  H263 = 4,
  Mjpeg = 7,
  Mpeg4 = 12,
  RawVideo = 13,
  H264 = 27,
  Vp8 = 139,
  Vp9 = 167,
  Hevc = 173,
  Av1 = 226,
  // Audio
  PcmS16le = 0x10000,
  Mp2 = 0x15000,
  Mp3 = 0x15001,
  Aac = 0x15002,
  Ac3 = 0x15003,
  Vorbis = 0x15005,
  Flac = 0x1500c,
  Opus = 0x1503c,
}

impl AVCodecID {
  /// Convert from the raw FFmpeg value; unknown IDs map to `None`
  pub fn from_raw(value: c_int) -> Self {
    match value {
      1 => Self::Mpeg1Video,
      2 => Self::Mpeg2Video,
      4 => Self::H263,
      7 => Self::Mjpeg,
      12 => Self::Mpeg4,
      13 => Self::RawVideo,
      27 => Self::H264,
      139 => Self::Vp8,
      167 => Self::Vp9,
      173 => Self::Hevc,
      226 => Self::Av1,
      0x10000 => Self::PcmS16le,
      0x15000 => Self::Mp2,
      0x15001 => Self::Mp3,
      0x15002 => Self::Aac,
      0x15003 => Self::Ac3,
      0x15005 => Self::Vorbis,
      0x1500c => Self::Flac,
      0x1503c => Self::Opus,
      _ => Self::None,
    }
  }

  /// Get the raw FFmpeg codec ID value
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }

  /// Whether this ID names an audio codec
  pub fn is_audio(&self) -> bool {
    self.as_raw() >= 0x10000
  }
}

// ============================================================================
// Pixel Formats
// ============================================================================

/// Video pixel formats
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVPixelFormat {
  None = -1,
  // Planar YUV formats
  Yuv420p = 0,
  Yuyv422 = 1,
  Yuv422p = 4,
  Yuv444p = 5,
  Gray8 = 8,
  Yuvj420p = 12,
  Yuva420p = 33,
  // Semi-planar formats
  Nv12 = 23,
  Nv21 = 24,
  // RGB formats
  Rgb24 = 2,
  Bgr24 = 3,
  Argb = 25,
  Rgba = 26,
  Abgr = 27,
  Bgra = 28,
}

impl AVPixelFormat {
  /// Convert from the raw FFmpeg value; unknown formats map to `None`
  pub fn from_raw(value: c_int) -> Self {
    match value {
      0 => Self::Yuv420p,
      1 => Self::Yuyv422,
      2 => Self::Rgb24,
      3 => Self::Bgr24,
      4 => Self::Yuv422p,
      5 => Self::Yuv444p,
      8 => Self::Gray8,
      12 => Self::Yuvj420p,
      23 => Self::Nv12,
      24 => Self::Nv21,
      25 => Self::Argb,
      26 => Self::Rgba,
      27 => Self::Abgr,
      28 => Self::Bgra,
      33 => Self::Yuva420p,
      _ => Self::None,
    }
  }

  /// Get the raw FFmpeg pixel format value
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }

  /// Number of planes for this pixel format
  pub fn num_planes(&self) -> usize {
    match self {
      Self::Yuv420p | Self::Yuvj420p | Self::Yuv422p | Self::Yuv444p => 3,
      Self::Yuva420p => 4,
      Self::Nv12 | Self::Nv21 => 2,
      Self::Gray8 | Self::Yuyv422 => 1,
      Self::Rgb24 | Self::Bgr24 | Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr => 1,
      Self::None => 0,
    }
  }

  /// Vertical chroma subsampling shift (log2) for planes other than luma/alpha
  pub fn chroma_shift_h(&self) -> u32 {
    match self {
      Self::Yuv420p | Self::Yuvj420p | Self::Yuva420p | Self::Nv12 | Self::Nv21 => 1,
      _ => 0,
    }
  }

  /// Horizontal chroma subsampling shift (log2) for planes other than luma/alpha
  pub fn chroma_shift_w(&self) -> u32 {
    match self {
      Self::Yuv420p | Self::Yuvj420p | Self::Yuva420p | Self::Yuv422p => 1,
      _ => 0,
    }
  }
}

// ============================================================================
// Sample Formats
// ============================================================================

/// Audio sample formats
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVSampleFormat {
  None = -1,
  U8 = 0,
  S16 = 1,
  S32 = 2,
  Flt = 3,
  Dbl = 4,
  U8p = 5,
  S16p = 6,
  S32p = 7,
  Fltp = 8,
  Dblp = 9,
}

impl AVSampleFormat {
  /// Convert from the raw FFmpeg value; unknown formats map to `None`
  pub fn from_raw(value: c_int) -> Self {
    match value {
      0 => Self::U8,
      1 => Self::S16,
      2 => Self::S32,
      3 => Self::Flt,
      4 => Self::Dbl,
      5 => Self::U8p,
      6 => Self::S16p,
      7 => Self::S32p,
      8 => Self::Fltp,
      9 => Self::Dblp,
      _ => Self::None,
    }
  }

  /// Get the raw FFmpeg sample format value
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }

  /// Whether samples of each channel live in their own plane
  pub fn is_planar(&self) -> bool {
    matches!(
      self,
      Self::U8p | Self::S16p | Self::S32p | Self::Fltp | Self::Dblp
    )
  }
}

// ============================================================================
// Media Types
// ============================================================================

/// Media types (`enum AVMediaType`)
pub mod media_type {
  use std::os::raw::c_int;

  pub const UNKNOWN: c_int = -1;
  pub const VIDEO: c_int = 0;
  pub const AUDIO: c_int = 1;
  pub const DATA: c_int = 2;
  pub const SUBTITLE: c_int = 3;
  pub const ATTACHMENT: c_int = 4;
}

// ============================================================================
// Opaque FFmpeg Types
// ============================================================================

/// Opaque AVCodec structure (codec implementation descriptor)
#[repr(C)]
pub struct AVCodec {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecContext structure (encoder/decoder instance)
#[repr(C)]
pub struct AVCodecContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVFrame structure (uncompressed video/audio data)
#[repr(C)]
pub struct AVFrame {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVPacket structure (compressed data)
#[repr(C)]
pub struct AVPacket {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVDictionary structure (key-value options)
#[repr(C)]
pub struct AVDictionary {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Public layout of a dictionary entry (stable since the API was introduced)
#[repr(C)]
pub struct AVDictionaryEntry {
  pub key: *mut c_char,
  pub value: *mut c_char,
}

// ============================================================================
// Constants
// ============================================================================

/// No timestamp value
pub const AV_NOPTS_VALUE: i64 = 0x8000000000000000u64 as i64;

/// Internal time base of libavformat durations (microseconds)
pub const AV_TIME_BASE: i64 = 1_000_000;

/// Packet flags
pub mod pkt_flag {
  use std::os::raw::c_int;

  pub const KEY: c_int = 0x0001;
  pub const CORRUPT: c_int = 0x0002;
  pub const DISCARD: c_int = 0x0004;
  pub const TRUSTED: c_int = 0x0008;
  pub const DISPOSABLE: c_int = 0x0010;
}

/// Encoder/decoder compliance levels (for avformat_query_codec)
pub mod compliance {
  use std::os::raw::c_int;

  pub const VERY_STRICT: c_int = 2;
  pub const STRICT: c_int = 1;
  pub const NORMAL: c_int = 0;
  pub const UNOFFICIAL: c_int = -1;
  pub const EXPERIMENTAL: c_int = -2;
}
