//! Streams of a container
//!
//! The AVStream itself belongs to the format context; a [`Stream`] is only handed out
//! by reference from [`super::FormatContext`], so it can never outlive the container.

use crate::ffi::{
  accessors::{
    ffcodecpar_get_bit_rate, ffcodecpar_get_channels, ffcodecpar_get_codec_id,
    ffcodecpar_get_codec_type, ffcodecpar_get_format, ffcodecpar_get_height,
    ffcodecpar_get_sample_rate, ffcodecpar_get_width, ffcodecpar_set_codec_tag,
    ffstream_get_avg_frame_rate, ffstream_get_codecpar, ffstream_get_duration,
    ffstream_get_nb_frames, ffstream_get_start_time, ffstream_get_time_base,
    ffstream_set_avg_frame_rate, ffstream_set_time_base,
  },
  avcodec::{avcodec_get_name, avcodec_parameters_copy, avcodec_parameters_from_context},
  avformat::{AVCodecParameters, AVStream},
  check_error, AVCodecID, AVPixelFormat, AVSampleFormat,
};
use std::ptr::NonNull;

use super::{
  static_str, CodecContext, CodecError, CodecResult, CodecState, MediaType, Rational,
  TimeBase,
};

/// One elementary stream of an input or output container
pub struct Stream {
  ptr: NonNull<AVStream>,
  index: usize,
  /// Encoder feeding this stream, owned by the stream once attached
  codec_ctx: Option<CodecContext>,
  /// Parameters were copied from another stream; no codec context is needed
  params_only: bool,
}

impl Stream {
  pub(crate) fn new(ptr: NonNull<AVStream>, index: usize) -> Self {
    Self {
      ptr,
      index,
      codec_ctx: None,
      params_only: false,
    }
  }

  /// Position of the stream in the container
  #[inline]
  pub fn index(&self) -> usize {
    self.index
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVStream {
    self.ptr.as_ptr()
  }

  fn codecpar(&self) -> *mut AVCodecParameters {
    unsafe { ffstream_get_codecpar(self.ptr.as_ptr()) }
  }

  // ========================================================================
  // Timing
  // ========================================================================

  /// Time base of the stream's packets
  ///
  /// Read from the container every time: muxers may replace the requested value when
  /// the header is written.
  pub fn time_base(&self) -> Option<TimeBase> {
    let (mut num, mut den) = (0, 0);
    unsafe { ffstream_get_time_base(self.ptr.as_ptr(), &mut num, &mut den) };
    Rational::from_raw(num, den)
  }

  pub fn set_time_base(&mut self, time_base: TimeBase) {
    unsafe { ffstream_set_time_base(self.ptr.as_ptr(), time_base.num(), time_base.den()) }
  }

  /// Average frame rate, `None` when the container does not know it
  pub fn avg_frame_rate(&self) -> Option<Rational> {
    let (mut num, mut den) = (0, 0);
    unsafe { ffstream_get_avg_frame_rate(self.ptr.as_ptr(), &mut num, &mut den) };
    if num == 0 {
      return None;
    }
    Rational::from_raw(num, den)
  }

  /// Duration in stream time base units, [`crate::AV_NOPTS_VALUE`] if unknown
  pub fn duration(&self) -> i64 {
    unsafe { ffstream_get_duration(self.ptr.as_ptr()) }
  }

  pub fn start_time(&self) -> i64 {
    unsafe { ffstream_get_start_time(self.ptr.as_ptr()) }
  }

  /// Number of frames if known, 0 otherwise
  pub fn nb_frames(&self) -> i64 {
    unsafe { ffstream_get_nb_frames(self.ptr.as_ptr()) }
  }

  // ========================================================================
  // Codec Parameters
  // ========================================================================

  pub fn media_type(&self) -> MediaType {
    MediaType::from_raw(unsafe { ffcodecpar_get_codec_type(self.codecpar()) })
  }

  pub fn codec_id(&self) -> AVCodecID {
    AVCodecID::from_raw(unsafe { ffcodecpar_get_codec_id(self.codecpar()) })
  }

  /// Engine name of the stream's codec, e.g. "mpeg4"
  pub fn codec_name(&self) -> &'static str {
    static_str(unsafe { avcodec_get_name(ffcodecpar_get_codec_id(self.codecpar())) })
  }

  /// Bit rate in bits per second, 0 if unknown
  pub fn bit_rate(&self) -> i64 {
    unsafe { ffcodecpar_get_bit_rate(self.codecpar()) }
  }

  pub fn width(&self) -> u32 {
    unsafe { ffcodecpar_get_width(self.codecpar()) }.max(0) as u32
  }

  pub fn height(&self) -> u32 {
    unsafe { ffcodecpar_get_height(self.codecpar()) }.max(0) as u32
  }

  /// Pixel format of a video stream, `AVPixelFormat::None` otherwise
  pub fn pixel_format(&self) -> AVPixelFormat {
    if self.media_type() != MediaType::Video {
      return AVPixelFormat::None;
    }
    AVPixelFormat::from_raw(unsafe { ffcodecpar_get_format(self.codecpar()) })
  }

  /// Sample format of an audio stream, `AVSampleFormat::None` otherwise
  pub fn sample_format(&self) -> AVSampleFormat {
    if self.media_type() != MediaType::Audio {
      return AVSampleFormat::None;
    }
    AVSampleFormat::from_raw(unsafe { ffcodecpar_get_format(self.codecpar()) })
  }

  pub fn sample_rate(&self) -> u32 {
    unsafe { ffcodecpar_get_sample_rate(self.codecpar()) }.max(0) as u32
  }

  pub fn channels(&self) -> u32 {
    unsafe { ffcodecpar_get_channels(self.codecpar()) }.max(0) as u32
  }

  /// Open-ready decoder context for this stream's parameters
  ///
  /// The context's time base is the stream's, so decoded frame timestamps are in
  /// stream units.
  pub fn decoder(&self) -> CodecResult<CodecContext> {
    let codec_id = unsafe { ffcodecpar_get_codec_id(self.codecpar()) };
    unsafe { CodecContext::from_parameters(self.codecpar(), codec_id, self.time_base()) }
  }

  /// Copy another stream's codec parameters, for remuxing without re-encoding
  pub fn copy_parameters_from(&mut self, source: &Stream) -> CodecResult<()> {
    let ret = unsafe { avcodec_parameters_copy(self.codecpar(), source.codecpar()) };
    check_error(ret)?;
    // The source container's tag may mean nothing to this muxer
    unsafe { ffcodecpar_set_codec_tag(self.codecpar(), 0) };
    if let Some(tb) = source.time_base() {
      self.set_time_base(tb);
    }
    self.params_only = true;
    Ok(())
  }

  // ========================================================================
  // Codec Context
  // ========================================================================

  /// Attach the encoder feeding this stream
  ///
  /// The stream takes ownership and adopts the codec's time base and frame rate.
  /// Returns the previously attached context, if any.
  pub fn set_codec_ctx(&mut self, ctx: CodecContext) -> Option<CodecContext> {
    if let Some(tb) = ctx.time_base() {
      self.set_time_base(tb);
    }
    if let Some(rate) = ctx.frame_rate() {
      unsafe { ffstream_set_avg_frame_rate(self.ptr.as_ptr(), rate.num(), rate.den()) };
    }
    tracing::trace!(
      target: "avflow",
      stream = self.index,
      codec = ctx.codec().name(),
      "attached codec context"
    );
    self.codec_ctx.replace(ctx)
  }

  #[inline]
  pub fn codec_ctx(&self) -> Option<&CodecContext> {
    self.codec_ctx.as_ref()
  }

  #[inline]
  pub fn codec_ctx_mut(&mut self) -> Option<&mut CodecContext> {
    self.codec_ctx.as_mut()
  }

  /// Detach the codec context, handing ownership back to the caller
  pub fn take_codec_ctx(&mut self) -> Option<CodecContext> {
    self.codec_ctx.take()
  }

  /// Check the attached encoder and publish its parameters to the muxer
  pub(crate) fn prepare_for_header(&mut self) -> CodecResult<()> {
    let index = self.index;
    let Some(ctx) = self.codec_ctx.as_ref() else {
      if self.params_only {
        return Ok(());
      }
      return Err(CodecError::HeaderWrite(format!(
        "stream {} has no codec context",
        index
      )));
    };

    if ctx.state() != CodecState::Open {
      return Err(CodecError::HeaderWrite(format!(
        "codec context of stream {} is {:?}, not open",
        index,
        ctx.state()
      )));
    }
    let Some(time_base) = ctx.time_base() else {
      return Err(CodecError::HeaderWrite(format!(
        "codec context of stream {} has no time base",
        index
      )));
    };
    if ctx.media_type() == MediaType::Video && (ctx.width() == 0 || ctx.height() == 0) {
      return Err(CodecError::HeaderWrite(format!(
        "video stream {} has no dimensions",
        index
      )));
    }

    let raw = ctx.raw_mut()?;
    let ret = unsafe { avcodec_parameters_from_context(self.codecpar(), raw) };
    check_error(ret)?;
    self.set_time_base(time_base);
    Ok(())
  }
}

// The stream is only reachable through its owning format context
unsafe impl Send for Stream {}

impl std::fmt::Debug for Stream {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Stream")
      .field("index", &self.index)
      .field("media_type", &self.media_type())
      .field("codec_id", &self.codec_id())
      .field("time_base", &self.time_base())
      .field("codec_ctx", &self.codec_ctx.as_ref().map(|c| c.codec().name()))
      .finish()
  }
}
