//! Rust declarations for C accessor functions
//!
//! These functions provide access to FFmpeg struct fields via the thin C accessor library
//! (`accessors.c`), keeping the Rust side independent of struct layouts.

use super::avformat::{
  AVCodecParameters, AVFormatContext, AVIOContext, AVInputFormat, AVOutputFormat, AVStream,
};
use super::types::*;
use std::os::raw::{c_char, c_int, c_uint};

/// Receives one formatted line of FFmpeg log output
pub type LogSinkFn = unsafe extern "C" fn(level: c_int, line: *const c_char);

unsafe extern "C" {
  // ========================================================================
  // AVCodec
  // ========================================================================

  pub fn ffcodec_get_name(codec: *const AVCodec) -> *const c_char;
  pub fn ffcodec_get_long_name(codec: *const AVCodec) -> *const c_char;
  pub fn ffcodec_get_id(codec: *const AVCodec) -> c_int;
  pub fn ffcodec_get_type(codec: *const AVCodec) -> c_int;
  /// `index`-th supported pixel format, -1 past the end
  pub fn ffcodec_get_pix_fmt(codec: *const AVCodec, index: c_int) -> c_int;
  /// `index`-th supported sample format, -1 past the end
  pub fn ffcodec_get_sample_fmt(codec: *const AVCodec, index: c_int) -> c_int;

  // ========================================================================
  // AVCodecContext Setters
  // ========================================================================

  pub fn ffctx_set_width(ctx: *mut AVCodecContext, width: c_int);
  pub fn ffctx_set_height(ctx: *mut AVCodecContext, height: c_int);
  pub fn ffctx_set_pix_fmt(ctx: *mut AVCodecContext, pix_fmt: c_int);
  pub fn ffctx_set_bit_rate(ctx: *mut AVCodecContext, bit_rate: i64);
  pub fn ffctx_set_gop_size(ctx: *mut AVCodecContext, gop_size: c_int);
  pub fn ffctx_set_max_b_frames(ctx: *mut AVCodecContext, max_b_frames: c_int);
  pub fn ffctx_set_profile(ctx: *mut AVCodecContext, profile: c_int);
  pub fn ffctx_set_flags(ctx: *mut AVCodecContext, flags: c_int);
  pub fn ffctx_set_mb_decision(ctx: *mut AVCodecContext, mb_decision: c_int);
  pub fn ffctx_set_thread_count(ctx: *mut AVCodecContext, thread_count: c_int);
  pub fn ffctx_set_time_base(ctx: *mut AVCodecContext, num: c_int, den: c_int);
  pub fn ffctx_set_framerate(ctx: *mut AVCodecContext, num: c_int, den: c_int);
  pub fn ffctx_set_sample_rate(ctx: *mut AVCodecContext, sample_rate: c_int);
  pub fn ffctx_set_sample_fmt(ctx: *mut AVCodecContext, sample_fmt: c_int);
  pub fn ffctx_set_channel_layout(ctx: *mut AVCodecContext, mask: u64);

  // ========================================================================
  // AVCodecContext Getters
  // ========================================================================

  pub fn ffctx_get_width(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_height(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_pix_fmt(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_bit_rate(ctx: *const AVCodecContext) -> i64;
  pub fn ffctx_get_gop_size(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_max_b_frames(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_profile(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_flags(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_mb_decision(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_thread_count(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_time_base(ctx: *const AVCodecContext, num: *mut c_int, den: *mut c_int);
  pub fn ffctx_get_framerate(ctx: *const AVCodecContext, num: *mut c_int, den: *mut c_int);
  pub fn ffctx_get_sample_rate(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_sample_fmt(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_channel_layout(ctx: *const AVCodecContext) -> u64;
  pub fn ffctx_get_channels(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_frame_size(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_codec_id(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_codec_type(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_extradata(ctx: *const AVCodecContext) -> *const u8;
  pub fn ffctx_get_extradata_size(ctx: *const AVCodecContext) -> c_int;

  // ========================================================================
  // AVFrame
  // ========================================================================

  pub fn ffframe_set_width(frame: *mut AVFrame, width: c_int);
  pub fn ffframe_set_height(frame: *mut AVFrame, height: c_int);
  pub fn ffframe_set_format(frame: *mut AVFrame, format: c_int);
  pub fn ffframe_set_pts(frame: *mut AVFrame, pts: i64);
  pub fn ffframe_set_pkt_dts(frame: *mut AVFrame, pkt_dts: i64);
  pub fn ffframe_set_duration(frame: *mut AVFrame, duration: i64);
  pub fn ffframe_set_nb_samples(frame: *mut AVFrame, nb_samples: c_int);
  pub fn ffframe_set_sample_rate(frame: *mut AVFrame, sample_rate: c_int);
  pub fn ffframe_set_channel_layout(frame: *mut AVFrame, mask: u64);

  pub fn ffframe_get_width(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_height(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_format(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_pts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_pkt_dts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_duration(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_key_frame(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_nb_samples(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_sample_rate(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_channels(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_data(frame: *const AVFrame, plane: c_int) -> *mut u8;
  pub fn ffframe_get_linesize(frame: *const AVFrame, plane: c_int) -> c_int;

  // ========================================================================
  // AVPacket
  // ========================================================================

  pub fn ffpkt_set_pts(pkt: *mut AVPacket, pts: i64);
  pub fn ffpkt_set_dts(pkt: *mut AVPacket, dts: i64);
  pub fn ffpkt_set_duration(pkt: *mut AVPacket, duration: i64);
  pub fn ffpkt_set_flags(pkt: *mut AVPacket, flags: c_int);
  pub fn ffpkt_set_stream_index(pkt: *mut AVPacket, stream_index: c_int);
  pub fn ffpkt_set_pos(pkt: *mut AVPacket, pos: i64);

  pub fn ffpkt_get_data(pkt: *const AVPacket) -> *mut u8;
  pub fn ffpkt_get_size(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_get_pts(pkt: *const AVPacket) -> i64;
  pub fn ffpkt_get_dts(pkt: *const AVPacket) -> i64;
  pub fn ffpkt_get_duration(pkt: *const AVPacket) -> i64;
  pub fn ffpkt_get_flags(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_get_stream_index(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_get_pos(pkt: *const AVPacket) -> i64;

  // ========================================================================
  // AVFormatContext
  // ========================================================================

  pub fn fffmt_get_nb_streams(ctx: *const AVFormatContext) -> c_uint;
  /// Stream at `index`, NULL when out of range
  pub fn fffmt_get_stream(ctx: *const AVFormatContext, index: c_uint) -> *mut AVStream;
  pub fn fffmt_get_oformat(ctx: *const AVFormatContext) -> *const AVOutputFormat;
  pub fn fffmt_get_iformat(ctx: *const AVFormatContext) -> *const AVInputFormat;
  pub fn fffmt_get_pb(ctx: *const AVFormatContext) -> *mut AVIOContext;
  pub fn fffmt_set_pb(ctx: *mut AVFormatContext, pb: *mut AVIOContext);
  /// Address of the `pb` field, for avio_open / avio_closep
  pub fn fffmt_get_pb_ptr(ctx: *mut AVFormatContext) -> *mut *mut AVIOContext;
  pub fn fffmt_get_flags(ctx: *const AVFormatContext) -> c_int;
  pub fn fffmt_set_flags(ctx: *mut AVFormatContext, flags: c_int);
  pub fn fffmt_get_duration(ctx: *const AVFormatContext) -> i64;
  pub fn fffmt_get_start_time(ctx: *const AVFormatContext) -> i64;
  pub fn fffmt_set_start_time(ctx: *mut AVFormatContext, start_time: i64);
  pub fn fffmt_get_bit_rate(ctx: *const AVFormatContext) -> i64;

  // ========================================================================
  // AVOutputFormat / AVInputFormat
  // ========================================================================

  pub fn ffofmt_get_name(fmt: *const AVOutputFormat) -> *const c_char;
  pub fn ffofmt_get_long_name(fmt: *const AVOutputFormat) -> *const c_char;
  pub fn ffofmt_get_mime_type(fmt: *const AVOutputFormat) -> *const c_char;
  pub fn ffofmt_get_extensions(fmt: *const AVOutputFormat) -> *const c_char;
  pub fn ffofmt_get_flags(fmt: *const AVOutputFormat) -> c_int;
  pub fn ffofmt_get_video_codec(fmt: *const AVOutputFormat) -> c_int;
  pub fn ffofmt_get_audio_codec(fmt: *const AVOutputFormat) -> c_int;

  pub fn ffifmt_get_name(fmt: *const AVInputFormat) -> *const c_char;
  pub fn ffifmt_get_long_name(fmt: *const AVInputFormat) -> *const c_char;

  // ========================================================================
  // AVStream
  // ========================================================================

  pub fn ffstream_get_codecpar(stream: *const AVStream) -> *mut AVCodecParameters;
  pub fn ffstream_get_duration(stream: *const AVStream) -> i64;
  pub fn ffstream_get_nb_frames(stream: *const AVStream) -> i64;
  pub fn ffstream_get_start_time(stream: *const AVStream) -> i64;
  pub fn ffstream_get_time_base(stream: *const AVStream, num: *mut c_int, den: *mut c_int);
  pub fn ffstream_set_time_base(stream: *mut AVStream, num: c_int, den: c_int);
  pub fn ffstream_get_avg_frame_rate(stream: *const AVStream, num: *mut c_int, den: *mut c_int);
  pub fn ffstream_set_avg_frame_rate(stream: *mut AVStream, num: c_int, den: c_int);

  // ========================================================================
  // AVCodecParameters
  // ========================================================================

  pub fn ffcodecpar_get_codec_id(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_codec_type(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_width(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_height(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_format(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_sample_rate(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_bit_rate(par: *const AVCodecParameters) -> i64;
  pub fn ffcodecpar_get_channels(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_set_codec_tag(par: *mut AVCodecParameters, tag: c_uint);

  // ========================================================================
  // AVIOContext / Logging
  // ========================================================================

  /// Free a custom AVIOContext and its buffer, setting `*pb` to NULL
  pub fn ffio_free(pb: *mut *mut AVIOContext);

  /// Route av_log output to `sink` (None restores the default stderr logger)
  pub fn fflog_set_sink(sink: Option<LogSinkFn>);
}
