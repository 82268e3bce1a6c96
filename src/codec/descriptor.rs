//! Codec descriptors
//!
//! A [`Codec`] names one encoder or decoder implementation from the engine's static
//! registry. The direction is part of the value, so a decoder can never be opened
//! as an encoder by accident.

use crate::ffi::{
  accessors::{
    ffcodec_get_id, ffcodec_get_long_name, ffcodec_get_name, ffcodec_get_pix_fmt,
    ffcodec_get_sample_fmt, ffcodec_get_type,
  },
  avcodec::{
    av_codec_is_decoder, av_codec_is_encoder, avcodec_find_decoder,
    avcodec_find_decoder_by_name, avcodec_find_encoder, avcodec_find_encoder_by_name,
  },
  media_type, AVCodec, AVCodecID, AVPixelFormat, AVSampleFormat,
};
use std::os::raw::c_int;

use super::{static_str, to_cstring, CodecError, CodecResult};

/// Direction of a codec (encoder or decoder)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecType {
  Encoder,
  Decoder,
}

/// Kind of data carried by a codec or stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
  Unknown,
  Video,
  Audio,
  Data,
  Subtitle,
  Attachment,
}

impl MediaType {
  pub fn from_raw(value: c_int) -> Self {
    match value {
      media_type::VIDEO => MediaType::Video,
      media_type::AUDIO => MediaType::Audio,
      media_type::DATA => MediaType::Data,
      media_type::SUBTITLE => MediaType::Subtitle,
      media_type::ATTACHMENT => MediaType::Attachment,
      _ => MediaType::Unknown,
    }
  }

  pub fn as_raw(&self) -> c_int {
    match self {
      MediaType::Unknown => media_type::UNKNOWN,
      MediaType::Video => media_type::VIDEO,
      MediaType::Audio => media_type::AUDIO,
      MediaType::Data => media_type::DATA,
      MediaType::Subtitle => media_type::SUBTITLE,
      MediaType::Attachment => media_type::ATTACHMENT,
    }
  }
}

/// An encoder or decoder from the engine's registry
///
/// Registry entries live for the whole process, so descriptors are plain copies.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Codec {
  ptr: *const AVCodec,
  codec_type: CodecType,
}

impl Codec {
  // ========================================================================
  // Lookup
  // ========================================================================

  /// Find the default encoder for a codec ID
  pub fn find_encoder(id: AVCodecID) -> CodecResult<Self> {
    crate::init::init();
    let ptr = unsafe { avcodec_find_encoder(id.as_raw()) };
    Self::from_ptr(ptr, CodecType::Encoder).ok_or(CodecError::EncoderNotFound(id))
  }

  /// Find an encoder by name (e.g. "mpeg4", "libx264")
  pub fn find_encoder_by_name(name: &str) -> CodecResult<Self> {
    crate::init::init();
    let c_name = to_cstring(name, "codec name")?;
    let ptr = unsafe { avcodec_find_encoder_by_name(c_name.as_ptr()) };
    Self::from_ptr(ptr, CodecType::Encoder)
      .ok_or_else(|| CodecError::CodecNotFound(name.to_string()))
  }

  /// Find the default decoder for a codec ID
  pub fn find_decoder(id: AVCodecID) -> CodecResult<Self> {
    crate::init::init();
    let ptr = unsafe { avcodec_find_decoder(id.as_raw()) };
    Self::from_ptr(ptr, CodecType::Decoder).ok_or(CodecError::DecoderNotFound(id))
  }

  /// Find a decoder by name
  pub fn find_decoder_by_name(name: &str) -> CodecResult<Self> {
    crate::init::init();
    let c_name = to_cstring(name, "codec name")?;
    let ptr = unsafe { avcodec_find_decoder_by_name(c_name.as_ptr()) };
    Self::from_ptr(ptr, CodecType::Decoder)
      .ok_or_else(|| CodecError::CodecNotFound(name.to_string()))
  }

  /// Decoder for a raw codec ID read from a container, which may be outside [`AVCodecID`]
  pub(crate) fn find_decoder_raw(id: c_int) -> CodecResult<Self> {
    let ptr = unsafe { avcodec_find_decoder(id) };
    Self::from_ptr(ptr, CodecType::Decoder)
      .ok_or_else(|| CodecError::DecoderNotFound(AVCodecID::from_raw(id)))
  }

  fn from_ptr(ptr: *const AVCodec, codec_type: CodecType) -> Option<Self> {
    if ptr.is_null() {
      return None;
    }
    let matches = unsafe {
      match codec_type {
        CodecType::Encoder => av_codec_is_encoder(ptr) != 0,
        CodecType::Decoder => av_codec_is_decoder(ptr) != 0,
      }
    };
    matches.then_some(Self { ptr, codec_type })
  }

  // ========================================================================
  // Properties
  // ========================================================================

  /// Short name (e.g. "mpeg1video")
  pub fn name(&self) -> &'static str {
    static_str(unsafe { ffcodec_get_name(self.ptr) })
  }

  /// Descriptive name (e.g. "MPEG-1 video")
  pub fn long_name(&self) -> &'static str {
    static_str(unsafe { ffcodec_get_long_name(self.ptr) })
  }

  /// Codec ID; IDs outside [`AVCodecID`] map to `None`, see [`Codec::raw_id`]
  pub fn id(&self) -> AVCodecID {
    AVCodecID::from_raw(self.raw_id())
  }

  /// Raw engine codec ID
  pub fn raw_id(&self) -> c_int {
    unsafe { ffcodec_get_id(self.ptr) }
  }

  pub fn media_type(&self) -> MediaType {
    MediaType::from_raw(unsafe { ffcodec_get_type(self.ptr) })
  }

  #[inline]
  pub fn codec_type(&self) -> CodecType {
    self.codec_type
  }

  #[inline]
  pub fn is_encoder(&self) -> bool {
    self.codec_type == CodecType::Encoder
  }

  #[inline]
  pub fn is_decoder(&self) -> bool {
    self.codec_type == CodecType::Decoder
  }

  /// Pixel formats the codec accepts, empty when unknown or not a video codec
  ///
  /// Formats without an [`AVPixelFormat`] variant are skipped.
  pub fn pixel_formats(&self) -> Vec<AVPixelFormat> {
    let mut formats = Vec::new();
    for index in 0.. {
      let raw = unsafe { ffcodec_get_pix_fmt(self.ptr, index) };
      if raw < 0 {
        break;
      }
      match AVPixelFormat::from_raw(raw) {
        AVPixelFormat::None => {}
        fmt => formats.push(fmt),
      }
    }
    formats
  }

  /// Sample formats the codec accepts, empty when unknown or not an audio codec
  pub fn sample_formats(&self) -> Vec<AVSampleFormat> {
    let mut formats = Vec::new();
    for index in 0.. {
      let raw = unsafe { ffcodec_get_sample_fmt(self.ptr, index) };
      if raw < 0 {
        break;
      }
      match AVSampleFormat::from_raw(raw) {
        AVSampleFormat::None => {}
        fmt => formats.push(fmt),
      }
    }
    formats
  }

  /// Get raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVCodec {
    self.ptr
  }
}

// Registry entries are immutable and live for the process lifetime
unsafe impl Send for Codec {}
unsafe impl Sync for Codec {}

impl std::fmt::Debug for Codec {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Codec")
      .field("name", &self.name())
      .field("id", &self.id())
      .field("type", &self.codec_type)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_find_encoder_by_id() {
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    assert_eq!(codec.name(), "mpeg1video");
    assert_eq!(codec.id(), AVCodecID::Mpeg1Video);
    assert_eq!(codec.media_type(), MediaType::Video);
    assert!(codec.is_encoder());
    assert!(!codec.is_decoder());
    assert!(!codec.long_name().is_empty());
    assert!(codec.pixel_formats().contains(&AVPixelFormat::Yuv420p));
  }

  #[test]
  fn test_find_decoder_by_name() {
    let codec = Codec::find_decoder_by_name("mpeg4").unwrap();
    assert_eq!(codec.id(), AVCodecID::Mpeg4);
    assert_eq!(codec.codec_type(), CodecType::Decoder);
  }

  #[test]
  fn test_direction_is_checked() {
    // Looking up an encoder name through the decoder registry must not succeed
    assert!(Codec::find_encoder_by_name("no-such-codec").is_err());
    let enc = Codec::find_encoder(AVCodecID::Mpeg4).unwrap();
    let dec = Codec::find_decoder(AVCodecID::Mpeg4).unwrap();
    assert_ne!(enc, dec);
  }

  #[test]
  fn test_unknown_name() {
    let err = Codec::find_decoder_by_name("definitely-not-a-codec").unwrap_err();
    assert!(matches!(err, CodecError::CodecNotFound(name) if name == "definitely-not-a-codec"));
  }

  #[test]
  fn test_audio_codec_formats() {
    let codec = Codec::find_encoder(AVCodecID::Mp2).unwrap();
    assert_eq!(codec.media_type(), MediaType::Audio);
    assert!(codec.sample_formats().contains(&crate::ffi::AVSampleFormat::S16));
    assert!(codec.pixel_formats().is_empty());
  }
}
