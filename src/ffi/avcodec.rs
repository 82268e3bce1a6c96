//! libavcodec function declarations
//!
//! Codec lookup, the send/receive encode and decode API, packets and codec parameters.

use super::avformat::AVCodecParameters;
use super::types::*;
use std::os::raw::{c_char, c_int};

unsafe extern "C" {
  // ========================================================================
  // Codec Discovery
  // ========================================================================

  /// Find a registered encoder with a matching codec ID
  pub fn avcodec_find_encoder(id: c_int) -> *const AVCodec;

  /// Find a registered encoder by name (e.g. "mpeg4", "libx264")
  pub fn avcodec_find_encoder_by_name(name: *const c_char) -> *const AVCodec;

  /// Find a registered decoder with a matching codec ID
  pub fn avcodec_find_decoder(id: c_int) -> *const AVCodec;

  /// Find a registered decoder by name
  pub fn avcodec_find_decoder_by_name(name: *const c_char) -> *const AVCodec;

  /// Non-zero if the codec is an encoder
  pub fn av_codec_is_encoder(codec: *const AVCodec) -> c_int;

  /// Non-zero if the codec is a decoder
  pub fn av_codec_is_decoder(codec: *const AVCodec) -> c_int;

  /// Get the name of a codec ID ("unknown_codec" if none)
  pub fn avcodec_get_name(id: c_int) -> *const c_char;

  // ========================================================================
  // Codec Context Lifecycle
  // ========================================================================

  /// Allocate an AVCodecContext and set its fields to default values
  pub fn avcodec_alloc_context3(codec: *const AVCodec) -> *mut AVCodecContext;

  /// Free the codec context and everything associated with it, writing NULL to the pointer
  pub fn avcodec_free_context(avctx: *mut *mut AVCodecContext);

  /// Initialize the AVCodecContext to use the given AVCodec
  ///
  /// On return `options` holds the entries the codec did not consume.
  pub fn avcodec_open2(
    avctx: *mut AVCodecContext,
    codec: *const AVCodec,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  // ========================================================================
  // Encoding (send frame, receive packet)
  // ========================================================================

  /// Supply a raw frame to the encoder, or NULL to enter draining mode
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) - input not accepted, packets must be received first
  /// * AVERROR_EOF - the encoder has been flushed
  /// * AVERROR(EINVAL) - codec not opened or it is a decoder
  pub fn avcodec_send_frame(avctx: *mut AVCodecContext, frame: *const AVFrame) -> c_int;

  /// Read encoded data from the encoder
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) - output not available, more input is needed
  /// * AVERROR_EOF - the encoder has been fully flushed
  pub fn avcodec_receive_packet(avctx: *mut AVCodecContext, avpkt: *mut AVPacket) -> c_int;

  // ========================================================================
  // Decoding (send packet, receive frame)
  // ========================================================================

  /// Supply compressed data to the decoder, or NULL to enter draining mode
  pub fn avcodec_send_packet(avctx: *mut AVCodecContext, avpkt: *const AVPacket) -> c_int;

  /// Return decoded output data from the decoder
  pub fn avcodec_receive_frame(avctx: *mut AVCodecContext, frame: *mut AVFrame) -> c_int;

  /// Reset the internal codec state / flush internal buffers
  pub fn avcodec_flush_buffers(avctx: *mut AVCodecContext);

  // ========================================================================
  // Packet Management
  // ========================================================================

  /// Allocate an AVPacket and set its fields to default values
  pub fn av_packet_alloc() -> *mut AVPacket;

  /// Free the packet, unreferencing its buffer first
  pub fn av_packet_free(pkt: *mut *mut AVPacket);

  /// Wipe the packet. Unreference the buffer and reset fields to defaults
  pub fn av_packet_unref(pkt: *mut AVPacket);

  /// Set up a new reference to the data described by `src`
  pub fn av_packet_ref(dst: *mut AVPacket, src: *const AVPacket) -> c_int;

  /// Allocate the payload of a packet (padding is zeroed)
  pub fn av_new_packet(pkt: *mut AVPacket, size: c_int) -> c_int;

  // ========================================================================
  // Codec Parameters
  // ========================================================================

  /// Fill the parameters struct from the values of a codec context
  pub fn avcodec_parameters_from_context(
    par: *mut AVCodecParameters,
    codec: *const AVCodecContext,
  ) -> c_int;

  /// Fill the codec context from the values of a parameters struct
  pub fn avcodec_parameters_to_context(
    codec: *mut AVCodecContext,
    par: *const AVCodecParameters,
  ) -> c_int;

  /// Copy the contents of `src` to `dst`
  pub fn avcodec_parameters_copy(dst: *mut AVCodecParameters, src: *const AVCodecParameters)
  -> c_int;
}

// ============================================================================
// Codec Context Flags
// ============================================================================

/// `AV_CODEC_FLAG_*` values for `AVCodecContext.flags`
pub mod codec_flag {
  use std::os::raw::c_int;

  /// Use fixed qscale
  pub const QSCALE: c_int = 1 << 1;
  /// Use internal 2-pass ratecontrol, first pass
  pub const PASS1: c_int = 1 << 9;
  /// Use internal 2-pass ratecontrol, second pass
  pub const PASS2: c_int = 1 << 10;
  /// Only decode/encode grayscale
  pub const GRAY: c_int = 1 << 13;
  /// Force low delay
  pub const LOW_DELAY: c_int = 1 << 19;
  /// Place global headers in extradata instead of every keyframe
  pub const GLOBAL_HEADER: c_int = 1 << 22;
  /// Use only bitexact stuff (except (I)DCT)
  pub const BITEXACT: c_int = 1 << 23;
  /// Closed GOP
  pub const CLOSED_GOP: c_int = 1 << 31;
}

/// `FF_MB_DECISION_*` values for `AVCodecContext.mb_decision`
pub mod mb_decision {
  use std::os::raw::c_int;

  /// Uses mb_cmp
  pub const SIMPLE: c_int = 0;
  /// Chooses the one which needs the fewest bits
  pub const BITS: c_int = 1;
  /// Rate distortion
  pub const RD: c_int = 2;
}

/// Selected `AV_PROFILE_*` / `FF_PROFILE_*` values
pub mod profile {
  use std::os::raw::c_int;

  pub const UNKNOWN: c_int = -99;
  pub const MPEG4_SIMPLE: c_int = 0;
  pub const MPEG4_ADVANCED_SIMPLE: c_int = 15;
  pub const H264_BASELINE: c_int = 66;
  pub const H264_MAIN: c_int = 77;
  pub const H264_HIGH: c_int = 100;
  pub const AAC_LOW: c_int = 1;
}
