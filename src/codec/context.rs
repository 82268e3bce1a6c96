//! Safe wrapper around FFmpeg AVCodecContext
//!
//! A codec context is configured while unopened, opened once, used for encoding or
//! decoding, and closed. Closing is terminal: a closed context cannot be reopened.
//!
//! The engine's send/receive API may buffer several inputs before producing output, or
//! produce several outputs for one input. [`CodecContext::encode_frame`] and
//! [`CodecContext::decode_frame`] smooth this into "zero or one output per call" by
//! queueing surplus outputs; callers drain the queue by calling with `None` until
//! nothing comes back.

use crate::ffi::{
  accessors::{
    ffctx_get_bit_rate, ffctx_get_channel_layout, ffctx_get_channels, ffctx_get_codec_id,
    ffctx_get_codec_type, ffctx_get_extradata, ffctx_get_extradata_size, ffctx_get_flags,
    ffctx_get_frame_size, ffctx_get_framerate, ffctx_get_gop_size, ffctx_get_height,
    ffctx_get_max_b_frames, ffctx_get_mb_decision, ffctx_get_pix_fmt, ffctx_get_profile,
    ffctx_get_sample_fmt, ffctx_get_sample_rate, ffctx_get_thread_count,
    ffctx_get_time_base, ffctx_get_width, ffctx_set_bit_rate, ffctx_set_channel_layout,
    ffctx_set_flags, ffctx_set_framerate, ffctx_set_gop_size, ffctx_set_height,
    ffctx_set_max_b_frames, ffctx_set_mb_decision, ffctx_set_pix_fmt, ffctx_set_profile,
    ffctx_set_sample_fmt, ffctx_set_sample_rate, ffctx_set_thread_count,
    ffctx_set_time_base, ffctx_set_width,
  },
  avcodec::{
    avcodec_alloc_context3, avcodec_flush_buffers, avcodec_free_context, avcodec_open2,
    avcodec_parameters_to_context, avcodec_receive_frame, avcodec_receive_packet,
    avcodec_send_frame, avcodec_send_packet,
  },
  avformat::AVCodecParameters,
  check_error,
  error::check_error_except_eagain_eof,
  AVCodecContext, AVCodecID, AVPixelFormat, AVSampleFormat, FFmpegError,
};
use std::collections::VecDeque;
use std::ptr::NonNull;

use super::{
  Codec, CodecError, CodecOptions, CodecResult, CodecType, Dictionary, Frame, MediaType,
  Packet, Rational, TimeBase,
};

/// Lifecycle of a codec context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecState {
  /// Allocated, accepting configuration
  Unopened,
  /// Opened, accepting frames or packets
  Open,
  /// Released; terminal
  Closed,
}

/// Safe wrapper around AVCodecContext
pub struct CodecContext {
  ptr: Option<NonNull<AVCodecContext>>,
  codec: Codec,
  state: CodecState,
  /// A NULL frame/packet has been sent; the codec only produces output from now on
  draining: bool,
  /// Outputs received from the engine but not yet handed to the caller
  pending_packets: VecDeque<Packet>,
  pending_frames: VecDeque<Frame>,
}

impl CodecContext {
  // ========================================================================
  // Creation
  // ========================================================================

  /// Allocate a context for the given encoder or decoder
  pub fn new(codec: Codec) -> CodecResult<Self> {
    crate::init::init();
    let ptr = unsafe { avcodec_alloc_context3(codec.as_ptr()) };
    NonNull::new(ptr)
      .map(|ptr| Self {
        ptr: Some(ptr),
        codec,
        state: CodecState::Unopened,
        draining: false,
        pending_packets: VecDeque::new(),
        pending_frames: VecDeque::new(),
      })
      .ok_or(CodecError::AllocationFailed("AVCodecContext"))
  }

  /// Allocate a decoder context filled from a demuxed stream's codec parameters
  ///
  /// # Safety
  /// `par` must point to valid codec parameters for the duration of the call
  pub(crate) unsafe fn from_parameters(
    par: *const AVCodecParameters,
    codec_id: i32,
    time_base: Option<TimeBase>,
  ) -> CodecResult<Self> {
    let codec = Codec::find_decoder_raw(codec_id)?;
    let mut ctx = Self::new(codec)?;
    let raw = ctx.raw_mut()?;
    let ret = unsafe { avcodec_parameters_to_context(raw, par) };
    check_error(ret)?;
    if let Some(tb) = time_base {
      unsafe { ffctx_set_time_base(raw, tb.num(), tb.den()) };
    }
    Ok(ctx)
  }

  // ========================================================================
  // Configuration
  // ========================================================================

  /// Apply every option that is set; valid only before [`CodecContext::open`]
  pub fn configure(&mut self, options: &CodecOptions) -> CodecResult<&mut Self> {
    if self.state != CodecState::Unopened {
      return Err(CodecError::InvalidState(format!(
        "cannot configure a {:?} codec context",
        self.state
      )));
    }
    let ctx = self.raw_mut()?;

    unsafe {
      if let Some(width) = options.width {
        ffctx_set_width(ctx, to_c_int(width, "width")?);
      }
      if let Some(height) = options.height {
        ffctx_set_height(ctx, to_c_int(height, "height")?);
      }
      if let Some(format) = options.pixel_format {
        ffctx_set_pix_fmt(ctx, format.as_raw());
      }
      if let Some(bit_rate) = options.bit_rate {
        ffctx_set_bit_rate(ctx, bit_rate);
      }
      if let Some(tb) = options.time_base {
        ffctx_set_time_base(ctx, tb.num(), tb.den());
      }
      if let Some(rate) = options.frame_rate {
        ffctx_set_framerate(ctx, rate.num(), rate.den());
      }
      if let Some(profile) = options.profile {
        ffctx_set_profile(ctx, profile);
      }
      if let Some(flags) = options.flags {
        ffctx_set_flags(ctx, flags);
      }
      if let Some(gop) = options.gop_size {
        ffctx_set_gop_size(ctx, to_c_int(gop, "gop_size")?);
      }
      if let Some(b_frames) = options.max_b_frames {
        ffctx_set_max_b_frames(ctx, to_c_int(b_frames, "max_b_frames")?);
      }
      if let Some(decision) = options.mb_decision {
        ffctx_set_mb_decision(ctx, decision);
      }
      if let Some(threads) = options.thread_count {
        ffctx_set_thread_count(ctx, to_c_int(threads, "thread_count")?);
      }
      if let Some(rate) = options.sample_rate {
        ffctx_set_sample_rate(ctx, to_c_int(rate, "sample_rate")?);
      }
      if let Some(format) = options.sample_format {
        ffctx_set_sample_fmt(ctx, format.as_raw());
      }
      if let Some(layout) = options.channel_layout {
        ffctx_set_channel_layout(ctx, layout);
      }
    }

    Ok(self)
  }

  /// OR `AV_CODEC_FLAG_*` bits into the current flags; valid only before open
  pub fn add_flags(&mut self, flags: i32) -> CodecResult<&mut Self> {
    let current = self.flags();
    self.configure(&CodecOptions {
      flags: Some(current | flags),
      ..Default::default()
    })
  }

  /// Open the codec with extra private options (e.g. `("preset", "fast")`)
  ///
  /// Options the codec does not recognize are logged and otherwise ignored. On failure
  /// the context stays unopened and may be reconfigured.
  pub fn open(&mut self, options: &[(&str, &str)]) -> CodecResult<()> {
    match self.state {
      CodecState::Unopened => {}
      CodecState::Open => {
        return Err(CodecError::InvalidState("codec context is already open".into()))
      }
      CodecState::Closed => {
        return Err(CodecError::InvalidState(
          "a closed codec context cannot be reopened".into(),
        ))
      }
    }

    let ctx = self.raw_mut()?;
    let mut dict = Dictionary::from_pairs(options)?;
    let ret = unsafe { avcodec_open2(ctx, self.codec.as_ptr(), dict.as_mut_ptr()) };
    if ret < 0 {
      return Err(CodecError::CodecOpen {
        codec: self.codec.name().to_string(),
        source: FFmpegError::from_code(ret),
      });
    }

    for (key, value) in dict.entries() {
      tracing::warn!(
        target: "avflow",
        codec = self.codec.name(),
        "Ignoring unknown codec option {}={}",
        key,
        value
      );
    }

    self.state = CodecState::Open;
    tracing::debug!(
      target: "avflow",
      codec = self.codec.name(),
      kind = ?self.codec.codec_type(),
      "codec opened"
    );
    Ok(())
  }

  /// Release the codec; idempotent, and a no-op beyond marking the state on a closed context
  pub fn close(&mut self) {
    if let Some(ptr) = self.ptr.take() {
      unsafe {
        let mut raw = ptr.as_ptr();
        avcodec_free_context(&mut raw);
      }
      tracing::debug!(target: "avflow", codec = self.codec.name(), "codec closed");
    }
    self.pending_packets.clear();
    self.pending_frames.clear();
    self.state = CodecState::Closed;
  }

  // ========================================================================
  // Encoding
  // ========================================================================

  /// Feed one frame, or `None` to flush, and return at most one ready packet
  ///
  /// `Ok(None)` means the encoder needs more input, or after a flush that it is fully
  /// drained. After the last frame, keep calling with `None` until it returns `Ok(None)`.
  pub fn encode_frame(&mut self, frame: Option<&Frame>) -> CodecResult<Option<Packet>> {
    self.feed_encoder(frame)?;
    Ok(self.pending_packets.pop_front())
  }

  /// Feed one frame, or `None` to flush, and return every packet ready so far
  pub fn encode(&mut self, frame: Option<&Frame>) -> CodecResult<Vec<Packet>> {
    self.feed_encoder(frame)?;
    Ok(self.pending_packets.drain(..).collect())
  }

  /// Flush the encoder and return all remaining packets
  pub fn flush_encoder(&mut self) -> CodecResult<Vec<Packet>> {
    self.encode(None)
  }

  fn feed_encoder(&mut self, frame: Option<&Frame>) -> CodecResult<()> {
    let ctx = self.ready(CodecType::Encoder)?;

    match frame {
      Some(_) if self.draining => {
        return Err(CodecError::InvalidState(
          "encoder is flushing and accepts no more frames".into(),
        ))
      }
      None if self.draining => {}
      _ => {
        let frame_ptr = frame.map(|f| f.as_ptr()).unwrap_or(std::ptr::null());
        let mut sent = check_error(unsafe { avcodec_send_frame(ctx, frame_ptr) });
        if sent.as_ref().is_err_and(|err| err.is_eagain()) {
          // Encoder is full, drain first
          self.receive_packets(ctx)?;
          sent = check_error(unsafe { avcodec_send_frame(ctx, frame_ptr) });
        }
        match sent {
          Err(err) if !err.is_eof() => return Err(CodecError::Encode(err)),
          _ => self.draining = frame.is_none(),
        }
      }
    }

    self.receive_packets(ctx)
  }

  fn receive_packets(&mut self, ctx: *mut AVCodecContext) -> CodecResult<()> {
    loop {
      let mut pkt = Packet::new()?;
      let ret = unsafe { avcodec_receive_packet(ctx, pkt.as_mut_ptr()) };
      if check_error_except_eagain_eof(ret).map_err(CodecError::Encode)?.is_none() {
        return Ok(());
      }
      tracing::trace!(
        target: "avflow",
        pts = pkt.pts(),
        dts = pkt.dts(),
        size = pkt.size(),
        "encoded packet"
      );
      self.pending_packets.push_back(pkt);
    }
  }

  // ========================================================================
  // Decoding
  // ========================================================================

  /// Feed one packet, or `None` to flush, and return at most one decoded frame
  ///
  /// Same contract as [`CodecContext::encode_frame`].
  pub fn decode_frame(&mut self, packet: Option<&Packet>) -> CodecResult<Option<Frame>> {
    self.feed_decoder(packet)?;
    Ok(self.pending_frames.pop_front())
  }

  /// Feed one packet, or `None` to flush, and return every frame ready so far
  pub fn decode(&mut self, packet: Option<&Packet>) -> CodecResult<Vec<Frame>> {
    self.feed_decoder(packet)?;
    Ok(self.pending_frames.drain(..).collect())
  }

  /// Flush the decoder and return all remaining frames
  pub fn flush_decoder(&mut self) -> CodecResult<Vec<Frame>> {
    self.decode(None)
  }

  fn feed_decoder(&mut self, packet: Option<&Packet>) -> CodecResult<()> {
    let ctx = self.ready(CodecType::Decoder)?;

    match packet {
      Some(_) if self.draining => {
        return Err(CodecError::InvalidState(
          "decoder is flushing and accepts no more packets".into(),
        ))
      }
      // Empty packets would be taken as a flush request
      Some(pkt) if pkt.is_empty() => {}
      None if self.draining => {}
      _ => {
        let pkt_ptr = packet.map(|p| p.as_ptr()).unwrap_or(std::ptr::null());
        let mut sent = check_error(unsafe { avcodec_send_packet(ctx, pkt_ptr) });
        if sent.as_ref().is_err_and(|err| err.is_eagain()) {
          // Decoder is full, drain first
          self.receive_frames(ctx)?;
          sent = check_error(unsafe { avcodec_send_packet(ctx, pkt_ptr) });
        }
        match sent {
          Err(err) if !err.is_eof() => return Err(CodecError::Decode(err)),
          _ => self.draining = packet.is_none(),
        }
      }
    }

    self.receive_frames(ctx)
  }

  fn receive_frames(&mut self, ctx: *mut AVCodecContext) -> CodecResult<()> {
    loop {
      let mut frame = Frame::new()?;
      let ret = unsafe { avcodec_receive_frame(ctx, frame.as_mut_ptr()) };
      if check_error_except_eagain_eof(ret).map_err(CodecError::Decode)?.is_none() {
        return Ok(());
      }
      self.pending_frames.push_back(frame);
    }
  }

  /// Discard buffered data and leave flushing mode (e.g. after a seek)
  pub fn reset(&mut self) -> CodecResult<()> {
    let ctx = self.ready(self.codec.codec_type())?;
    unsafe { avcodec_flush_buffers(ctx) };
    self.pending_packets.clear();
    self.pending_frames.clear();
    self.draining = false;
    Ok(())
  }

  // ========================================================================
  // Utility
  // ========================================================================

  /// Raw pointer of an open context used in the given direction
  fn ready(&self, direction: CodecType) -> CodecResult<*mut AVCodecContext> {
    if self.state != CodecState::Open {
      return Err(CodecError::InvalidState(format!(
        "codec context is {:?}, not open",
        self.state
      )));
    }
    if self.codec.codec_type() != direction {
      return Err(CodecError::InvalidState(format!(
        "{} cannot be used as {}",
        self.codec.name(),
        match direction {
          CodecType::Encoder => "an encoder",
          CodecType::Decoder => "a decoder",
        }
      )));
    }
    self.raw_mut()
  }

  /// Raw pointer while the context is not closed
  pub(crate) fn raw_mut(&self) -> CodecResult<*mut AVCodecContext> {
    self.ptr
      .map(|p| p.as_ptr())
      .ok_or_else(|| CodecError::InvalidState("codec context is closed".into()))
  }

  /// Read a field, or the default when the context is closed
  fn read<T: Default>(&self, get: impl FnOnce(*const AVCodecContext) -> T) -> T {
    self.ptr.map(|p| get(p.as_ptr())).unwrap_or_default()
  }

  #[inline]
  pub fn codec(&self) -> Codec {
    self.codec
  }

  #[inline]
  pub fn state(&self) -> CodecState {
    self.state
  }

  #[inline]
  pub fn is_open(&self) -> bool {
    self.state == CodecState::Open
  }

  pub fn media_type(&self) -> MediaType {
    MediaType::from_raw(self.read(|c| unsafe { ffctx_get_codec_type(c) }))
  }

  /// Codec id as set on the context; stays valid when the lookup went by name
  pub fn codec_id(&self) -> AVCodecID {
    match self.ptr {
      Some(p) => AVCodecID::from_raw(unsafe { ffctx_get_codec_id(p.as_ptr()) }),
      None => self.codec.id(),
    }
  }

  pub fn width(&self) -> u32 {
    self.read(|c| unsafe { ffctx_get_width(c) }).max(0) as u32
  }

  pub fn height(&self) -> u32 {
    self.read(|c| unsafe { ffctx_get_height(c) }).max(0) as u32
  }

  pub fn pixel_format(&self) -> AVPixelFormat {
    match self.ptr {
      Some(p) => AVPixelFormat::from_raw(unsafe { ffctx_get_pix_fmt(p.as_ptr()) }),
      None => AVPixelFormat::None,
    }
  }

  pub fn bit_rate(&self) -> i64 {
    self.read(|c| unsafe { ffctx_get_bit_rate(c) })
  }

  /// Codec time base, `None` while unset
  pub fn time_base(&self) -> Option<TimeBase> {
    let (num, den) = self.read(|c| {
      let (mut num, mut den) = (0, 0);
      unsafe { ffctx_get_time_base(c, &mut num, &mut den) };
      (num, den)
    });
    Rational::from_raw(num, den)
  }

  /// Nominal frame rate, `None` while unset
  pub fn frame_rate(&self) -> Option<Rational> {
    let (num, den) = self.read(|c| {
      let (mut num, mut den) = (0, 0);
      unsafe { ffctx_get_framerate(c, &mut num, &mut den) };
      (num, den)
    });
    Rational::from_raw(num, den).filter(|r| r.num() != 0)
  }

  pub fn profile(&self) -> i32 {
    self.read(|c| unsafe { ffctx_get_profile(c) })
  }

  pub fn flags(&self) -> i32 {
    self.read(|c| unsafe { ffctx_get_flags(c) })
  }

  pub fn gop_size(&self) -> i32 {
    self.read(|c| unsafe { ffctx_get_gop_size(c) })
  }

  pub fn max_b_frames(&self) -> i32 {
    self.read(|c| unsafe { ffctx_get_max_b_frames(c) })
  }

  /// `FF_MB_DECISION_*` macroblock decision mode
  pub fn mb_decision(&self) -> i32 {
    self.read(|c| unsafe { ffctx_get_mb_decision(c) })
  }

  /// Worker threads requested; 0 lets the engine decide
  pub fn thread_count(&self) -> u32 {
    self.read(|c| unsafe { ffctx_get_thread_count(c) }).max(0) as u32
  }

  pub fn sample_rate(&self) -> u32 {
    self.read(|c| unsafe { ffctx_get_sample_rate(c) }).max(0) as u32
  }

  pub fn sample_format(&self) -> AVSampleFormat {
    match self.ptr {
      Some(p) => AVSampleFormat::from_raw(unsafe { ffctx_get_sample_fmt(p.as_ptr()) }),
      None => AVSampleFormat::None,
    }
  }

  /// Native channel mask, 0 when unset or not a native layout
  pub fn channel_layout(&self) -> u64 {
    self.read(|c| unsafe { ffctx_get_channel_layout(c) })
  }

  pub fn channels(&self) -> u32 {
    self.read(|c| unsafe { ffctx_get_channels(c) }).max(0) as u32
  }

  /// Samples per channel an audio encoder expects in each frame (0 = any)
  pub fn frame_size(&self) -> u32 {
    self.read(|c| unsafe { ffctx_get_frame_size(c) }).max(0) as u32
  }

  /// Get codec extradata (global headers, set on open with the global header flag)
  pub fn extradata(&self) -> Option<&[u8]> {
    let ptr = self.ptr?;
    unsafe {
      let data = ffctx_get_extradata(ptr.as_ptr());
      let size = ffctx_get_extradata_size(ptr.as_ptr());
      if data.is_null() || size <= 0 {
        None
      } else {
        Some(std::slice::from_raw_parts(data, size as usize))
      }
    }
  }
}

fn to_c_int(value: u32, what: &str) -> CodecResult<i32> {
  i32::try_from(value)
    .map_err(|_| CodecError::InvalidConfig(format!("{} out of range: {}", what, value)))
}

impl Drop for CodecContext {
  fn drop(&mut self) {
    self.close();
  }
}

// CodecContext is NOT Sync - FFmpeg contexts are not thread-safe
unsafe impl Send for CodecContext {}

impl std::fmt::Debug for CodecContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CodecContext")
      .field("codec", &self.codec.name())
      .field("type", &self.codec.codec_type())
      .field("state", &self.state)
      .field("width", &self.width())
      .field("height", &self.height())
      .field("pixel_format", &self.pixel_format())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::SyntheticVideo;
  use crate::ffi::{avcodec::mb_decision, AVCodecID};

  fn mpeg1_options() -> CodecOptions {
    CodecOptions {
      width: Some(320),
      height: Some(240),
      pixel_format: Some(AVPixelFormat::Yuv420p),
      bit_rate: Some(400_000),
      time_base: Some(TimeBase::new(1, 25).unwrap()),
      frame_rate: Some(Rational::new(25, 1).unwrap()),
      gop_size: Some(10),
      max_b_frames: Some(1),
      mb_decision: Some(mb_decision::RD),
      ..Default::default()
    }
  }

  fn open_mpeg1() -> CodecContext {
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let mut ctx = CodecContext::new(codec).unwrap();
    ctx.configure(&mpeg1_options()).unwrap();
    ctx.open(&[]).unwrap();
    ctx
  }

  #[test]
  fn test_configure_is_applied() {
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let mut ctx = CodecContext::new(codec).unwrap();
    ctx.configure(&CodecOptions {
      thread_count: Some(2),
      ..mpeg1_options()
    })
    .unwrap();

    assert_eq!(ctx.state(), CodecState::Unopened);
    assert_eq!(ctx.codec_id(), AVCodecID::Mpeg1Video);
    assert_eq!(ctx.width(), 320);
    assert_eq!(ctx.height(), 240);
    assert_eq!(ctx.pixel_format(), AVPixelFormat::Yuv420p);
    assert_eq!(ctx.bit_rate(), 400_000);
    assert_eq!(ctx.time_base(), Some(TimeBase::new(1, 25).unwrap()));
    assert_eq!(ctx.gop_size(), 10);
    assert_eq!(ctx.max_b_frames(), 1);
    assert_eq!(ctx.mb_decision(), mb_decision::RD);
    assert_eq!(ctx.thread_count(), 2);
    assert_eq!(ctx.media_type(), MediaType::Video);
  }

  #[test]
  fn test_lifecycle() {
    let mut ctx = open_mpeg1();
    assert!(ctx.is_open());

    // Configuration is frozen once open
    assert!(matches!(
      ctx.configure(&CodecOptions::default()),
      Err(CodecError::InvalidState(_))
    ));
    assert!(matches!(ctx.open(&[]), Err(CodecError::InvalidState(_))));

    ctx.close();
    ctx.close();
    assert_eq!(ctx.state(), CodecState::Closed);
    assert_eq!(ctx.width(), 0);
    assert!(matches!(ctx.open(&[]), Err(CodecError::InvalidState(_))));
    assert!(matches!(ctx.encode_frame(None), Err(CodecError::InvalidState(_))));
  }

  #[test]
  fn test_close_unopened() {
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let mut ctx = CodecContext::new(codec).unwrap();
    ctx.close();
    assert_eq!(ctx.state(), CodecState::Closed);
  }

  #[test]
  fn test_open_rejects_unsupported_pixel_format() {
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let mut ctx = CodecContext::new(codec).unwrap();
    ctx.configure(&CodecOptions {
      pixel_format: Some(AVPixelFormat::Rgba),
      ..mpeg1_options()
    })
    .unwrap();

    let err = ctx.open(&[]).unwrap_err();
    assert!(matches!(err, CodecError::CodecOpen { ref codec, .. } if codec == "mpeg1video"));
    assert_eq!(ctx.state(), CodecState::Unopened);
  }

  #[test]
  fn test_encode_requires_open() {
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let mut ctx = CodecContext::new(codec).unwrap();
    let frame = Frame::new_video(320, 240, AVPixelFormat::Yuv420p).unwrap();
    assert!(matches!(ctx.encode_frame(Some(&frame)), Err(CodecError::InvalidState(_))));
  }

  #[test]
  fn test_direction_mismatch() {
    let mut ctx = open_mpeg1();
    assert!(matches!(ctx.decode_frame(None), Err(CodecError::InvalidState(_))));
  }

  #[test]
  fn test_encode_then_flush_yields_every_frame() {
    let mut ctx = open_mpeg1();
    let mut packets = Vec::new();

    for frame in SyntheticVideo::new(320, 240, AVPixelFormat::Yuv420p).unwrap().take(12) {
      if let Some(pkt) = ctx.encode_frame(Some(&frame.unwrap())).unwrap() {
        packets.push(pkt);
      }
    }
    while let Some(pkt) = ctx.encode_frame(None).unwrap() {
      packets.push(pkt);
    }

    // mpeg1video emits exactly one packet per input frame
    assert_eq!(packets.len(), 12);
    assert!(packets.iter().all(|p| p.size() > 0));
    assert!(packets[0].is_key());
    // Draining is sticky
    assert!(ctx.encode_frame(None).unwrap().is_none());
    let frame = Frame::new_video(320, 240, AVPixelFormat::Yuv420p).unwrap();
    assert!(matches!(ctx.encode_frame(Some(&frame)), Err(CodecError::InvalidState(_))));
  }

  #[test]
  fn test_decode_then_flush_yields_every_frame() {
    let mut encoder = open_mpeg1();
    let source = SyntheticVideo::new(320, 240, AVPixelFormat::Yuv420p).unwrap();
    let mut packets = Vec::new();
    for frame in source.take(8) {
      packets.extend(encoder.encode(Some(&frame.unwrap())).unwrap());
    }
    packets.extend(encoder.flush_encoder().unwrap());

    let codec = Codec::find_decoder(AVCodecID::Mpeg1Video).unwrap();
    let mut decoder = CodecContext::new(codec).unwrap();
    decoder.open(&[]).unwrap();

    let mut frames = Vec::new();
    for pkt in &packets {
      if let Some(frame) = decoder.decode_frame(Some(pkt)).unwrap() {
        frames.push(frame);
      }
    }
    // A drained decoder answers EOF, which is not an error
    while let Some(frame) = decoder.decode_frame(None).unwrap() {
      frames.push(frame);
    }
    assert_eq!(frames.len(), 8);
    assert!(frames.iter().all(|f| f.width() == 320));
    assert!(decoder.decode_frame(None).unwrap().is_none());
  }

  #[test]
  fn test_unknown_options_do_not_fail_open() {
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let mut ctx = CodecContext::new(codec).unwrap();
    ctx.configure(&mpeg1_options()).unwrap();
    ctx.open(&[("no_such_option", "1")]).unwrap();
    assert!(ctx.is_open());
  }

  #[test]
  fn test_global_header_produces_extradata() {
    let codec = Codec::find_encoder(AVCodecID::Mpeg4).unwrap();
    let mut ctx = CodecContext::new(codec).unwrap();
    ctx.configure(&mpeg1_options()).unwrap();
    ctx.add_flags(crate::ffi::avcodec::codec_flag::GLOBAL_HEADER).unwrap();
    ctx.open(&[]).unwrap();
    assert!(ctx.extradata().is_some_and(|d| !d.is_empty()));
  }
}
