//! libavformat function declarations
//!
//! Container muxing/demuxing, format lookup and byte I/O contexts.

use super::types::*;
use std::os::raw::{c_char, c_int, c_uchar, c_void};

// ============================================================================
// Opaque Types (format-specific)
// ============================================================================

/// Opaque AVFormatContext structure (muxer/demuxer context)
#[repr(C)]
pub struct AVFormatContext {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVOutputFormat structure (muxer descriptor)
#[repr(C)]
pub struct AVOutputFormat {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVInputFormat structure (demuxer descriptor)
#[repr(C)]
pub struct AVInputFormat {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVIOContext structure (byte I/O)
#[repr(C)]
pub struct AVIOContext {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVStream structure (stream within a container)
#[repr(C)]
pub struct AVStream {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecParameters structure (codec properties of a stream)
#[repr(C)]
pub struct AVCodecParameters {
  _opaque: [u8; 0],
  _marker: std::marker::PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Callback Types for Custom I/O
// ============================================================================

/// Read callback: fill `buf` with up to `buf_size` bytes
///
/// Returns the number of bytes read, or a negative AVERROR (AVERROR_EOF at end of stream)
pub type ReadPacketFn =
  unsafe extern "C" fn(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int;

/// Write callback: consume `buf_size` bytes from `buf`
///
/// Returns the number of bytes written, or a negative AVERROR
pub type WritePacketFn =
  unsafe extern "C" fn(opaque: *mut c_void, buf: *const u8, buf_size: c_int) -> c_int;

/// Seek callback, `whence` is SEEK_SET/SEEK_CUR/SEEK_END or AVSEEK_SIZE
///
/// Returns the new position (or total size for AVSEEK_SIZE), or a negative AVERROR
pub type SeekFn = unsafe extern "C" fn(opaque: *mut c_void, offset: i64, whence: c_int) -> i64;

unsafe extern "C" {
  // ========================================================================
  // Output Context (Muxing)
  // ========================================================================

  /// Allocate an AVFormatContext for output
  ///
  /// The muxer is taken from `oformat`, then `format_name`, then the extension of
  /// `filename`. `*ctx` is NULL on failure.
  pub fn avformat_alloc_output_context2(
    ctx: *mut *mut AVFormatContext,
    oformat: *const AVOutputFormat,
    format_name: *const c_char,
    filename: *const c_char,
  ) -> c_int;

  /// Return the output format that best matches the given parameters, or NULL
  pub fn av_guess_format(
    short_name: *const c_char,
    filename: *const c_char,
    mime_type: *const c_char,
  ) -> *const AVOutputFormat;

  /// Test if the muxer can store codec `codec_id`
  ///
  /// Returns 1 if supported, 0 if not, a negative AVERROR if the muxer cannot tell
  pub fn avformat_query_codec(
    ofmt: *const AVOutputFormat,
    codec_id: c_int,
    std_compliance: c_int,
  ) -> c_int;

  /// Allocate an empty AVFormatContext
  pub fn avformat_alloc_context() -> *mut AVFormatContext;

  /// Free an AVFormatContext and all its streams (does not close `pb`)
  pub fn avformat_free_context(ctx: *mut AVFormatContext);

  /// Add a new stream to the format context, NULL on failure
  pub fn avformat_new_stream(ctx: *mut AVFormatContext, codec: *const AVCodec) -> *mut AVStream;

  // ========================================================================
  // Muxing Operations
  // ========================================================================

  /// Allocate the stream private data and write the stream header
  pub fn avformat_write_header(ctx: *mut AVFormatContext, options: *mut *mut AVDictionary)
  -> c_int;

  /// Write a packet, buffering as needed for correct interleaving
  ///
  /// Takes ownership of the packet's reference; the packet is blank on return.
  pub fn av_interleaved_write_frame(ctx: *mut AVFormatContext, pkt: *mut AVPacket) -> c_int;

  /// Flush the interleaving queue and write the stream trailer
  pub fn av_write_trailer(ctx: *mut AVFormatContext) -> c_int;

  // ========================================================================
  // Input Context (Demuxing)
  // ========================================================================

  /// Find an input format by short name
  pub fn av_find_input_format(short_name: *const c_char) -> *const AVInputFormat;

  /// Open an input and read its header
  ///
  /// `*ps` may be a pre-allocated context (e.g. with a custom pb set). On failure the
  /// context is freed and `*ps` set to NULL.
  pub fn avformat_open_input(
    ps: *mut *mut AVFormatContext,
    url: *const c_char,
    fmt: *const AVInputFormat,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  /// Close an opened input, free it and set `*s` to NULL
  pub fn avformat_close_input(s: *mut *mut AVFormatContext);

  /// Read packets to get stream information
  pub fn avformat_find_stream_info(ic: *mut AVFormatContext, options: *mut *mut AVDictionary)
  -> c_int;

  /// Find the "best" stream of the given media type, or a negative AVERROR
  pub fn av_find_best_stream(
    ic: *mut AVFormatContext,
    media_type: c_int,
    wanted_stream_nb: c_int,
    related_stream: c_int,
    decoder_ret: *mut *const AVCodec,
    flags: c_int,
  ) -> c_int;

  /// Return the next packet of a stream
  ///
  /// Returns 0 if OK, AVERROR_EOF at end of file, another negative AVERROR on error
  pub fn av_read_frame(s: *mut AVFormatContext, pkt: *mut AVPacket) -> c_int;

  /// Seek to the keyframe at `timestamp` in `stream_index` (-1 for AV_TIME_BASE units)
  pub fn av_seek_frame(
    s: *mut AVFormatContext,
    stream_index: c_int,
    timestamp: i64,
    flags: c_int,
  ) -> c_int;

  /// Print detailed information about the format to the log
  pub fn av_dump_format(
    ic: *mut AVFormatContext,
    index: c_int,
    url: *const c_char,
    is_output: c_int,
  );

  // ========================================================================
  // I/O Context
  // ========================================================================

  /// Allocate an AVIOContext for buffered I/O through the given callbacks
  ///
  /// `buffer` must come from av_malloc; the context may replace it.
  pub fn avio_alloc_context(
    buffer: *mut c_uchar,
    buffer_size: c_int,
    write_flag: c_int,
    opaque: *mut c_void,
    read_packet: Option<ReadPacketFn>,
    write_packet: Option<WritePacketFn>,
    seek: Option<SeekFn>,
  ) -> *mut AVIOContext;

  /// Create and initialize an AVIOContext for accessing `url`
  pub fn avio_open(s: *mut *mut AVIOContext, url: *const c_char, flags: c_int) -> c_int;

  /// Close a resource opened with avio_open and set `*s` to NULL
  pub fn avio_closep(s: *mut *mut AVIOContext) -> c_int;

  /// Force flushing of buffered data to the output
  pub fn avio_flush(s: *mut AVIOContext);
}

// ============================================================================
// Constants
// ============================================================================

/// `AVFMT_*` format flags
pub mod format_flag {
  use std::os::raw::c_int;

  /// Demuxer/muxer does not need a file handle (pb)
  pub const NOFILE: c_int = 0x0001;
  /// Needs '%d' in filename
  pub const NEEDNUMBER: c_int = 0x0002;
  /// Format wants global header
  pub const GLOBALHEADER: c_int = 0x0040;
  /// Format does not need or have any timestamps
  pub const NOTIMESTAMPS: c_int = 0x0080;
  /// Format allows variable fps
  pub const VARIABLE_FPS: c_int = 0x0400;
}

/// `AVFMT_FLAG_*` context flags
pub mod context_flag {
  use std::os::raw::c_int;

  /// Generate missing pts even if it requires parsing future frames
  pub const GENPTS: c_int = 0x0001;
  /// Ignore index
  pub const IGNIDX: c_int = 0x0002;
  /// Do not block when reading packets from input
  pub const NONBLOCK: c_int = 0x0004;
  /// Ignore dts if pts is set
  pub const IGNDTS: c_int = 0x0008;
  /// Do not infer any values from other values
  pub const NOFILLIN: c_int = 0x0010;
  /// The caller has supplied a custom AVIOContext, don't avio_close() it
  pub const CUSTOM_IO: c_int = 0x0080;
  /// Flush the AVIOContext every packet
  pub const FLUSH_PACKETS: c_int = 0x0200;
}

/// Seek flags for `av_seek_frame`
pub mod seek_flag {
  use std::os::raw::c_int;

  /// Seek backward
  pub const BACKWARD: c_int = 1;
  /// Seek based on position in bytes
  pub const BYTE: c_int = 2;
  /// Seek to any frame, even non-keyframes
  pub const ANY: c_int = 4;
  /// Seek based on frame number
  pub const FRAME: c_int = 8;
}

/// `whence` values passed to the seek callback
pub mod seek_whence {
  use std::os::raw::c_int;

  pub const SEEK_SET: c_int = 0;
  pub const SEEK_CUR: c_int = 1;
  pub const SEEK_END: c_int = 2;
  /// Return the stream size instead of seeking
  pub const AVSEEK_SIZE: c_int = 0x10000;
  /// OR'ed into whence; the seek may be slow but must be performed
  pub const AVSEEK_FORCE: c_int = 0x20000;
}

/// `AVIO_FLAG_*` for avio_open
pub mod avio_flag {
  use std::os::raw::c_int;

  pub const READ: c_int = 1;
  pub const WRITE: c_int = 2;
  pub const READ_WRITE: c_int = READ | WRITE;
}
