//! Container contexts for demuxing and muxing
//!
//! A [`FormatContext`] is either an input (opened from a URL or a custom I/O adapter and
//! read packet by packet) or an output (created for a muxer, given streams, then written
//! header, packets, trailer). It owns its streams and the codec contexts attached to them.

use crate::ffi::{
  accessors::{
    fffmt_get_bit_rate, fffmt_get_duration, fffmt_get_flags, fffmt_get_iformat,
    fffmt_get_nb_streams, fffmt_get_oformat, fffmt_get_pb, fffmt_get_pb_ptr,
    fffmt_get_start_time, fffmt_get_stream, fffmt_set_flags, fffmt_set_pb,
    fffmt_set_start_time, ffifmt_get_long_name, ffifmt_get_name, ffofmt_get_audio_codec,
    ffofmt_get_extensions, ffofmt_get_flags, ffofmt_get_long_name, ffofmt_get_mime_type,
    ffofmt_get_name, ffofmt_get_video_codec,
  },
  avformat::{
    av_dump_format, av_find_best_stream, av_find_input_format, av_guess_format,
    av_interleaved_write_frame, av_read_frame, av_seek_frame, av_write_trailer,
    avformat_alloc_context, avformat_alloc_output_context2, avformat_close_input,
    avformat_find_stream_info, avformat_free_context, avformat_new_stream,
    avformat_open_input, avformat_query_codec, avformat_write_header, avio_closep,
    avio_flag, avio_open, context_flag, format_flag, AVFormatContext, AVInputFormat,
    AVOutputFormat,
  },
  compliance,
  error::AVERROR_EOF,
  AVCodecID, FFmpegError,
};
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::{
  static_str, to_cstring, AvioContext, Codec, CodecError, CodecResult, Dictionary, MediaType,
  Packet, Stream,
};

/// Container MIME types the muxers do not advertise themselves
const MIME_ALIASES: &[(&str, &str)] = &[
  ("application/mp4", "mp4"),
  ("video/mp4", "mp4"),
  ("audio/mp4", "mp4"),
  ("video/webm", "webm"),
  ("audio/webm", "webm"),
  ("video/x-matroska", "matroska"),
  ("video/mp2t", "mpegts"),
  ("video/mpeg", "mpeg"),
  ("video/quicktime", "mov"),
  ("audio/mpeg", "mp3"),
  ("audio/ogg", "ogg"),
];

// ============================================================================
// Output Format
// ============================================================================

/// A resolved muxer, plus the filename to write to if any
#[derive(Clone)]
pub struct OutputFormat {
  ptr: NonNull<AVOutputFormat>,
  filename: Option<String>,
}

impl OutputFormat {
  /// Resolve a muxer from a format name, a MIME type or a filename extension
  ///
  /// Candidates are tried in that order and the first that resolves wins; empty strings
  /// count as absent. Fails with [`CodecError::OutputFormat`] when none resolves.
  pub fn new(
    name: Option<&str>,
    filename: Option<&str>,
    mime: Option<&str>,
  ) -> CodecResult<Self> {
    crate::init::init();
    let name = name.filter(|s| !s.is_empty());
    let filename = filename.filter(|s| !s.is_empty());
    let mime = mime.filter(|s| !s.is_empty());

    let resolved = name
      .and_then(|n| guess(Some(n), None, None))
      .or_else(|| {
        let mime = mime?;
        guess(None, None, Some(mime)).or_else(|| {
          MIME_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(mime))
            .and_then(|(_, muxer)| guess(Some(muxer), None, None))
        })
      })
      .or_else(|| filename.and_then(|f| guess(None, Some(f), None)));

    match resolved {
      Some(ptr) => Ok(Self {
        ptr,
        filename: filename.map(str::to_owned),
      }),
      None => {
        tracing::debug!(
          target: "avflow",
          ?name,
          ?filename,
          ?mime,
          "no muxer matches output target"
        );
        Err(CodecError::OutputFormat)
      }
    }
  }

  pub fn from_name(name: &str) -> CodecResult<Self> {
    Self::new(Some(name), None, None)
  }

  pub fn from_mime(mime: &str) -> CodecResult<Self> {
    Self::new(None, None, Some(mime))
  }

  /// Attach the file the muxer should write to
  pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
    self.filename = Some(filename.into());
    self
  }

  pub fn filename(&self) -> Option<&str> {
    self.filename.as_deref()
  }

  /// Short muxer name, e.g. "mp4"
  pub fn name(&self) -> &'static str {
    static_str(unsafe { ffofmt_get_name(self.ptr.as_ptr()) })
  }

  pub fn long_name(&self) -> &'static str {
    static_str(unsafe { ffofmt_get_long_name(self.ptr.as_ptr()) })
  }

  pub fn mime_type(&self) -> &'static str {
    static_str(unsafe { ffofmt_get_mime_type(self.ptr.as_ptr()) })
  }

  /// Comma separated filename extensions
  pub fn extensions(&self) -> &'static str {
    static_str(unsafe { ffofmt_get_extensions(self.ptr.as_ptr()) })
  }

  /// `AVFMT_*` flags
  pub fn flags(&self) -> i32 {
    unsafe { ffofmt_get_flags(self.ptr.as_ptr()) }
  }

  /// Codec parameters go in the container header instead of in-band
  pub fn is_global_header(&self) -> bool {
    self.flags() & format_flag::GLOBALHEADER != 0
  }

  /// The muxer writes through an AVIOContext (not a device or a URL protocol of its own)
  pub fn needs_file(&self) -> bool {
    self.flags() & format_flag::NOFILE == 0
  }

  pub fn default_video_codec(&self) -> AVCodecID {
    AVCodecID::from_raw(unsafe { ffofmt_get_video_codec(self.ptr.as_ptr()) })
  }

  pub fn default_audio_codec(&self) -> AVCodecID {
    AVCodecID::from_raw(unsafe { ffofmt_get_audio_codec(self.ptr.as_ptr()) })
  }

  #[inline]
  pub fn as_ptr(&self) -> *const AVOutputFormat {
    self.ptr.as_ptr()
  }
}

// Muxer descriptors are immutable statics inside the engine
unsafe impl Send for OutputFormat {}
unsafe impl Sync for OutputFormat {}

impl std::fmt::Debug for OutputFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OutputFormat")
      .field("name", &self.name())
      .field("filename", &self.filename)
      .finish()
  }
}

fn guess(
  name: Option<&str>,
  filename: Option<&str>,
  mime: Option<&str>,
) -> Option<NonNull<AVOutputFormat>> {
  let name = name.map(|s| to_cstring(s, "format name")).transpose().ok()?;
  let filename = filename.map(|s| to_cstring(s, "filename")).transpose().ok()?;
  let mime = mime.map(|s| to_cstring(s, "mime type")).transpose().ok()?;
  let ptr = unsafe {
    av_guess_format(
      name.as_ref().map_or(std::ptr::null(), |s| s.as_ptr()),
      filename.as_ref().map_or(std::ptr::null(), |s| s.as_ptr()),
      mime.as_ref().map_or(std::ptr::null(), |s| s.as_ptr()),
    )
  };
  NonNull::new(ptr as *mut AVOutputFormat)
}

/// Where an output context writes
#[derive(Debug, Clone)]
pub enum OutputTarget {
  /// A file; the muxer is picked from its extension
  File(String),
  /// An explicitly resolved muxer
  Format(OutputFormat),
}

impl From<&str> for OutputTarget {
  fn from(filename: &str) -> Self {
    OutputTarget::File(filename.to_owned())
  }
}

impl From<String> for OutputTarget {
  fn from(filename: String) -> Self {
    OutputTarget::File(filename)
  }
}

impl From<&std::path::Path> for OutputTarget {
  fn from(path: &std::path::Path) -> Self {
    OutputTarget::File(path.to_string_lossy().into_owned())
  }
}

impl From<OutputFormat> for OutputTarget {
  fn from(format: OutputFormat) -> Self {
    OutputTarget::Format(format)
  }
}

// ============================================================================
// Format Context
// ============================================================================

/// What a format context is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatMode {
  /// Allocated, not yet opened for input
  Unopened,
  /// Demuxing
  Input,
  /// Muxing
  Output,
  /// Released; terminal
  Closed,
}

/// Safe wrapper around AVFormatContext
pub struct FormatContext {
  ptr: Option<NonNull<AVFormatContext>>,
  mode: FormatMode,
  url: String,
  streams: Vec<Stream>,
  /// Custom I/O; must outlive every engine call on `ptr`
  pb: Option<AvioContext>,
  input_format: *const AVInputFormat,
  /// The output file was opened by [`FormatContext::write_header_with`] and is closed by us
  output_file_opened: bool,
  header_written: bool,
  last_error: Option<CodecError>,
}

impl FormatContext {
  // ========================================================================
  // Creation
  // ========================================================================

  /// Allocate an empty context, to be configured and then opened for input
  pub fn new() -> CodecResult<Self> {
    crate::init::init();
    let ptr = unsafe { avformat_alloc_context() };
    NonNull::new(ptr)
      .map(|ptr| Self::with_ptr(ptr, FormatMode::Unopened, String::new()))
      .ok_or(CodecError::AllocationFailed("AVFormatContext"))
  }

  fn with_ptr(ptr: NonNull<AVFormatContext>, mode: FormatMode, url: String) -> Self {
    Self {
      ptr: Some(ptr),
      mode,
      url,
      streams: Vec::new(),
      pb: None,
      input_format: std::ptr::null(),
      output_file_opened: false,
      header_written: false,
      last_error: None,
    }
  }

  /// Open `url` for demuxing, probing its format
  pub fn new_input(url: &str) -> CodecResult<Self> {
    let mut ctx = Self::new()?;
    ctx.open_input(url)?;
    Ok(ctx)
  }

  /// Create a muxing context for a file or an explicit muxer
  ///
  /// Nothing is touched on disk here: a filename is opened for writing when the header
  /// is written, unless custom I/O was attached by then. Without a filename, attach a
  /// custom I/O context with [`FormatContext::set_pb`] before writing the header.
  pub fn new_output(target: impl Into<OutputTarget>) -> CodecResult<Self> {
    crate::init::init();
    let format = match target.into() {
      OutputTarget::File(filename) => OutputFormat::new(None, Some(&filename), None)?,
      OutputTarget::Format(format) => format,
    };
    let filename = format.filename().map(str::to_owned);
    let c_filename = filename
      .as_deref()
      .map(|f| to_cstring(f, "filename"))
      .transpose()?;

    let mut raw = std::ptr::null_mut();
    let ret = unsafe {
      avformat_alloc_output_context2(
        &mut raw,
        format.as_ptr(),
        std::ptr::null(),
        c_filename.as_ref().map_or(std::ptr::null(), |s| s.as_ptr()),
      )
    };
    let Some(ptr) = NonNull::new(raw).filter(|_| ret >= 0) else {
      return Err(CodecError::OutputFormat);
    };

    let ctx = Self::with_ptr(ptr, FormatMode::Output, filename.unwrap_or_default());
    tracing::debug!(
      target: "avflow",
      format = format.name(),
      url = %ctx.url,
      "created output context"
    );
    Ok(ctx)
  }

  // ========================================================================
  // Configuration
  // ========================================================================

  /// Force the demuxer instead of probing; required for custom I/O without seeking
  pub fn set_input_format(&mut self, name: &str) -> CodecResult<&mut Self> {
    self.expect_mode(FormatMode::Unopened)?;
    let c_name = to_cstring(name, "input format")?;
    let format = unsafe { av_find_input_format(c_name.as_ptr()) };
    if format.is_null() {
      return Err(CodecError::InvalidConfig(format!("unknown input format: {}", name)));
    }
    self.input_format = format;
    Ok(self)
  }

  /// Route all byte I/O through a custom I/O context
  ///
  /// Valid before [`FormatContext::open_input`], or on an output context before the
  /// header is written; it then takes the place of the output file. Replaces any
  /// previous adapter.
  pub fn set_pb(&mut self, pb: AvioContext) -> CodecResult<&mut Self> {
    let ctx = self.raw_mut()?;
    match self.mode {
      FormatMode::Unopened => {}
      FormatMode::Output if !self.output_file_opened && !self.header_written => {}
      mode => {
        return Err(CodecError::InvalidState(format!(
          "cannot attach custom I/O to a {:?} context",
          mode
        )))
      }
    }
    unsafe {
      fffmt_set_pb(ctx, pb.as_ptr());
      fffmt_set_flags(ctx, fffmt_get_flags(ctx) | context_flag::CUSTOM_IO);
    }
    self.pb = Some(pb);
    Ok(self)
  }

  /// Add `AVFMT_FLAG_*` bits to the context flags
  pub fn add_flags(&mut self, flags: i32) -> CodecResult<&mut Self> {
    let ctx = self.raw_mut()?;
    unsafe { fffmt_set_flags(ctx, fffmt_get_flags(ctx) | flags) };
    Ok(self)
  }

  pub fn flags(&self) -> i32 {
    self.ptr.map_or(0, |p| unsafe { fffmt_get_flags(p.as_ptr()) })
  }

  /// Container start time in microseconds
  pub fn set_start_time(&mut self, start_time: i64) -> CodecResult<&mut Self> {
    let ctx = self.raw_mut()?;
    unsafe { fffmt_set_start_time(ctx, start_time) };
    Ok(self)
  }

  pub fn start_time(&self) -> i64 {
    self.ptr
      .map_or(crate::ffi::AV_NOPTS_VALUE, |p| unsafe { fffmt_get_start_time(p.as_ptr()) })
  }

  // ========================================================================
  // Input
  // ========================================================================

  /// Open the input and read stream information
  ///
  /// With custom I/O attached, `url` is only used for logging and may be empty.
  pub fn open_input(&mut self, url: &str) -> CodecResult<()> {
    self.expect_mode(FormatMode::Unopened)?;
    let c_url = to_cstring(url, "url")?;
    let mut raw = self.raw_mut()?;

    let ret = unsafe {
      avformat_open_input(&mut raw, c_url.as_ptr(), self.input_format, std::ptr::null_mut())
    };
    if ret < 0 {
      // The engine freed the context on failure
      self.ptr = None;
      self.mode = FormatMode::Closed;
      let err = CodecError::OpenInput {
        url: url.to_owned(),
        source: FFmpegError::from_code(ret),
      };
      self.last_error = Some(err.clone());
      return Err(err);
    }
    self.ptr = NonNull::new(raw);
    self.mode = FormatMode::Input;
    self.url = url.to_owned();

    let ret = unsafe { avformat_find_stream_info(raw, std::ptr::null_mut()) };
    if ret < 0 {
      let err = CodecError::OpenInput {
        url: url.to_owned(),
        source: FFmpegError::from_code(ret),
      };
      self.close_input();
      self.last_error = Some(err.clone());
      return Err(err);
    }

    let count = unsafe { fffmt_get_nb_streams(raw) };
    for i in 0..count {
      if let Some(stream) = NonNull::new(unsafe { fffmt_get_stream(raw, i) }) {
        self.streams.push(Stream::new(stream, i as usize));
      }
    }

    tracing::debug!(
      target: "avflow",
      url,
      format = self.input_format_name(),
      streams = self.streams.len(),
      "opened input"
    );
    Ok(())
  }

  /// Read the next packet in container order
  ///
  /// `Ok(None)` at end of stream.
  pub fn read_packet(&mut self) -> CodecResult<Option<Packet>> {
    self.expect_mode(FormatMode::Input)?;
    let ctx = self.raw_mut()?;
    let mut packet = Packet::new()?;
    let ret = unsafe { av_read_frame(ctx, packet.as_mut_ptr()) };
    if ret == AVERROR_EOF {
      return Ok(None);
    }
    if ret < 0 {
      return Err(CodecError::Read(FFmpegError::from_code(ret)));
    }
    tracing::trace!(
      target: "avflow",
      stream = packet.stream_index(),
      size = packet.size(),
      pts = packet.pts(),
      "read packet"
    );
    Ok(Some(packet))
  }

  /// Lazy sequence of packets in container order
  ///
  /// The sequence ends at end of stream or at the first read error; the error is kept
  /// in [`FormatContext::last_error`]. Stopping early needs no cleanup.
  pub fn packets(&mut self) -> Packets<'_> {
    Packets {
      ctx: self,
      done: false,
    }
  }

  /// Seek to the keyframe at or before `timestamp`
  ///
  /// The timestamp is in the stream's time base, or in microseconds when `stream_index`
  /// is `None`. `flags` are `AVSEEK_FLAG_*` bits.
  pub fn seek(
    &mut self,
    stream_index: Option<usize>,
    timestamp: i64,
    flags: i32,
  ) -> CodecResult<()> {
    self.expect_mode(FormatMode::Input)?;
    let ctx = self.raw_mut()?;
    let index = match stream_index {
      Some(i) if i < self.streams.len() => i as c_int,
      Some(i) => {
        return Err(CodecError::InvalidConfig(format!("no stream with index {}", i)))
      }
      None => -1,
    };
    let ret = unsafe { av_seek_frame(ctx, index, timestamp, flags) };
    if ret < 0 {
      return Err(CodecError::Read(FFmpegError::from_code(ret)));
    }
    Ok(())
  }

  /// Index of the stream the engine considers best for `media_type`
  pub fn best_stream(&self, media_type: MediaType) -> Option<usize> {
    if self.mode != FormatMode::Input {
      return None;
    }
    let ctx = self.ptr?.as_ptr();
    let ret = unsafe {
      av_find_best_stream(ctx, media_type.as_raw(), -1, -1, std::ptr::null_mut(), 0)
    };
    usize::try_from(ret).ok()
  }

  /// Name of the demuxer in use
  pub fn input_format_name(&self) -> Option<&'static str> {
    let format = self.input_format_ptr()?;
    Some(static_str(unsafe { ffifmt_get_name(format.as_ptr()) }))
  }

  /// Descriptive name of the demuxer in use
  pub fn input_format_long_name(&self) -> Option<&'static str> {
    let format = self.input_format_ptr()?;
    Some(static_str(unsafe { ffifmt_get_long_name(format.as_ptr()) }))
  }

  fn input_format_ptr(&self) -> Option<NonNull<AVInputFormat>> {
    let format = unsafe { fffmt_get_iformat(self.ptr?.as_ptr()) };
    NonNull::new(format as *mut AVInputFormat)
  }

  /// Release the demuxer; no-op unless opened for input
  pub fn close_input(&mut self) {
    if self.mode != FormatMode::Input {
      return;
    }
    self.streams.clear();
    if let Some(ptr) = self.ptr.take() {
      let mut raw = ptr.as_ptr();
      unsafe { avformat_close_input(&mut raw) };
    }
    self.pb = None;
    self.mode = FormatMode::Closed;
    tracing::debug!(target: "avflow", url = %self.url, "closed input");
  }

  // ========================================================================
  // Output
  // ========================================================================

  /// The muxer wants codec parameters in the header; set the global header codec flag
  pub fn is_global_header(&self) -> bool {
    self.output_format().is_some_and(|f| f.is_global_header())
  }

  /// Muxer of an output context
  pub fn output_format(&self) -> Option<OutputFormat> {
    if self.mode != FormatMode::Output {
      return None;
    }
    let format = unsafe { fffmt_get_oformat(self.ptr?.as_ptr()) };
    NonNull::new(format as *mut AVOutputFormat).map(|ptr| OutputFormat {
      ptr,
      filename: (!self.url.is_empty()).then(|| self.url.clone()),
    })
  }

  /// Add a stream for `codec`
  ///
  /// Returns `None` when the muxer cannot store the codec or the engine refuses to
  /// allocate the stream. The stream gets the next sequential index.
  pub fn new_stream(&mut self, codec: &Codec) -> Option<&mut Stream> {
    if self.mode != FormatMode::Output || self.header_written {
      return None;
    }
    let ctx = self.ptr?.as_ptr();
    let format = unsafe { fffmt_get_oformat(ctx) };
    // 0 is a definite no; negative means the muxer cannot tell
    if unsafe { avformat_query_codec(format, codec.raw_id(), compliance::NORMAL) } == 0 {
      tracing::debug!(
        target: "avflow",
        codec = codec.name(),
        "muxer cannot store codec"
      );
      return None;
    }
    self.push_stream(ctx)
  }

  /// Add a stream carrying another stream's codec parameters as-is
  pub fn new_stream_copy(&mut self, source: &Stream) -> CodecResult<&mut Stream> {
    self.expect_mode(FormatMode::Output)?;
    if self.header_written {
      return Err(CodecError::InvalidState("header already written".into()));
    }
    let ctx = self.raw_mut()?;
    let stream = self
      .push_stream(ctx)
      .ok_or(CodecError::AllocationFailed("AVStream"))?;
    stream.copy_parameters_from(source)?;
    Ok(stream)
  }

  fn push_stream(&mut self, ctx: *mut AVFormatContext) -> Option<&mut Stream> {
    let raw = unsafe { avformat_new_stream(ctx, std::ptr::null()) };
    let stream = NonNull::new(raw)?;
    let index = self.streams.len();
    self.streams.push(Stream::new(stream, index));
    tracing::trace!(target: "avflow", index, "added output stream");
    self.streams.last_mut()
  }

  /// Write the container header
  pub fn write_header(&mut self) -> CodecResult<()> {
    self.write_header_with(&[])
  }

  /// Write the container header, passing muxer options (e.g. `movflags`)
  ///
  /// Must be called exactly once, after every stream has an open codec context and
  /// before the first packet.
  pub fn write_header_with(&mut self, options: &[(&str, &str)]) -> CodecResult<()> {
    self.expect_mode(FormatMode::Output)?;
    if self.header_written {
      return Err(CodecError::InvalidState("header already written".into()));
    }
    let ctx = self.raw_mut()?;
    if self.streams.is_empty() {
      return Err(CodecError::HeaderWrite("output has no streams".into()));
    }
    let muxer_flags = unsafe { ffofmt_get_flags(fffmt_get_oformat(ctx)) };
    let needs_io = muxer_flags & format_flag::NOFILE == 0;
    let has_io = !unsafe { fffmt_get_pb(ctx) }.is_null();
    if needs_io && !has_io && self.url.is_empty() {
      return Err(CodecError::HeaderWrite(
        "output has neither a file nor custom I/O".into(),
      ));
    }
    for stream in &mut self.streams {
      stream.prepare_for_header()?;
    }
    let mut dict = Dictionary::from_pairs(options)?;

    if needs_io && !has_io {
      self.open_output_file(ctx)?;
    }
    let ret = unsafe { avformat_write_header(ctx, dict.as_mut_ptr()) };
    if ret < 0 {
      return Err(CodecError::HeaderWrite(FFmpegError::from_code(ret).to_string()));
    }
    if !dict.is_empty() {
      tracing::warn!(
        target: "avflow",
        unused = ?dict.entries(),
        "muxer ignored options"
      );
    }
    self.header_written = true;
    tracing::debug!(
      target: "avflow",
      url = %self.url,
      streams = self.streams.len(),
      "wrote header"
    );
    Ok(())
  }

  fn open_output_file(&mut self, ctx: *mut AVFormatContext) -> CodecResult<()> {
    let c_url = to_cstring(&self.url, "filename")?;
    let ret = unsafe { avio_open(fffmt_get_pb_ptr(ctx), c_url.as_ptr(), avio_flag::WRITE) };
    if ret < 0 {
      return Err(CodecError::OpenOutput {
        url: self.url.clone(),
        source: FFmpegError::from_code(ret),
      });
    }
    self.output_file_opened = true;
    tracing::debug!(target: "avflow", url = %self.url, "opened output file");
    Ok(())
  }

  #[inline]
  pub fn header_written(&self) -> bool {
    self.header_written
  }

  /// Append a packet to the container
  ///
  /// Timestamps must already be in the target stream's time base. The muxer takes the
  /// packet's payload; the packet is blank afterwards.
  pub fn write_packet(&mut self, packet: &mut Packet) -> CodecResult<()> {
    self.expect_mode(FormatMode::Output)?;
    if !self.header_written {
      return Err(CodecError::InvalidState("header not written".into()));
    }
    let index = packet.stream_index();
    if index >= self.streams.len() {
      return Err(CodecError::InvalidConfig(format!(
        "packet for stream {} but output has {}",
        index,
        self.streams.len()
      )));
    }
    tracing::trace!(
      target: "avflow",
      stream = index,
      size = packet.size(),
      pts = packet.pts(),
      dts = packet.dts(),
      "write packet"
    );
    let ctx = self.raw_mut()?;
    let ret = unsafe { av_interleaved_write_frame(ctx, packet.as_mut_ptr()) };
    if ret < 0 {
      return Err(CodecError::Write(FFmpegError::from_code(ret)));
    }
    Ok(())
  }

  /// Write the trailer (if a header was written) and release the muxer
  ///
  /// No-op unless opened for output. Failures are logged and kept in
  /// [`FormatContext::last_error`].
  pub fn close_output(&mut self) {
    if self.mode != FormatMode::Output {
      return;
    }
    if let Some(ptr) = self.ptr.take() {
      let raw = ptr.as_ptr();
      if self.header_written {
        let ret = unsafe { av_write_trailer(raw) };
        if ret < 0 {
          let err = CodecError::Write(FFmpegError::from_code(ret));
          tracing::warn!(
            target: "avflow",
            url = %self.url,
            error = %err,
            "trailer write failed"
          );
          self.last_error = Some(err);
        } else {
          tracing::debug!(target: "avflow", url = %self.url, "wrote trailer");
        }
      }
      if self.output_file_opened {
        unsafe { avio_closep(fffmt_get_pb_ptr(raw)) };
      } else if self.pb.is_some() {
        unsafe { fffmt_set_pb(raw, std::ptr::null_mut()) };
      }
      self.streams.clear();
      unsafe { avformat_free_context(raw) };
    }
    self.pb = None;
    self.mode = FormatMode::Closed;
    tracing::debug!(target: "avflow", url = %self.url, "closed output");
  }

  // ========================================================================
  // Streams and Info
  // ========================================================================

  pub fn streams(&self) -> &[Stream] {
    &self.streams
  }

  pub fn streams_count(&self) -> usize {
    self.streams.len()
  }

  pub fn stream(&self, index: usize) -> Option<&Stream> {
    self.streams.get(index)
  }

  pub fn stream_mut(&mut self, index: usize) -> Option<&mut Stream> {
    self.streams.get_mut(index)
  }

  /// Container duration in microseconds, [`crate::AV_NOPTS_VALUE`] if unknown
  pub fn duration(&self) -> i64 {
    self.ptr
      .map_or(crate::ffi::AV_NOPTS_VALUE, |p| unsafe { fffmt_get_duration(p.as_ptr()) })
  }

  /// Total bit rate in bits per second, 0 if unknown
  pub fn bit_rate(&self) -> i64 {
    self.ptr.map_or(0, |p| unsafe { fffmt_get_bit_rate(p.as_ptr()) })
  }

  /// Log a description of the container and its streams through the engine's logger
  pub fn dump(&self) {
    let Some(ptr) = self.ptr else {
      return;
    };
    let Ok(url) = to_cstring(&self.url, "url") else {
      return;
    };
    let is_output = (self.mode == FormatMode::Output) as c_int;
    unsafe { av_dump_format(ptr.as_ptr(), 0, url.as_ptr(), is_output) };
  }

  #[inline]
  pub fn mode(&self) -> FormatMode {
    self.mode
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// The error that ended the last packet sequence or close, if any
  pub fn last_error(&self) -> Option<&CodecError> {
    self.last_error.as_ref()
  }

  pub fn take_last_error(&mut self) -> Option<CodecError> {
    self.last_error.take()
  }

  fn raw_mut(&self) -> CodecResult<*mut AVFormatContext> {
    self.ptr
      .map(|p| p.as_ptr())
      .ok_or_else(|| CodecError::InvalidState("format context is closed".into()))
  }

  fn expect_mode(&self, mode: FormatMode) -> CodecResult<()> {
    if self.mode != mode {
      return Err(CodecError::InvalidState(format!(
        "format context is {:?}, expected {:?}",
        self.mode, mode
      )));
    }
    Ok(())
  }
}

impl Drop for FormatContext {
  fn drop(&mut self) {
    match self.mode {
      FormatMode::Input => self.close_input(),
      FormatMode::Output => self.close_output(),
      FormatMode::Unopened | FormatMode::Closed => {
        self.streams.clear();
        if let Some(ptr) = self.ptr.take() {
          unsafe {
            // A custom pb is ours, not the engine's
            fffmt_set_pb(ptr.as_ptr(), std::ptr::null_mut());
            avformat_free_context(ptr.as_ptr());
          }
        }
        self.pb = None;
      }
    }
  }
}

// A format context is used from one thread at a time
unsafe impl Send for FormatContext {}

impl std::fmt::Debug for FormatContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FormatContext")
      .field("mode", &self.mode)
      .field("url", &self.url)
      .field("streams", &self.streams.len())
      .field("custom_io", &self.pb.is_some())
      .field("header_written", &self.header_written)
      .finish()
  }
}

/// Iterator over the packets of an input, see [`FormatContext::packets`]
pub struct Packets<'a> {
  ctx: &'a mut FormatContext,
  done: bool,
}

impl Iterator for Packets<'_> {
  type Item = Packet;

  fn next(&mut self) -> Option<Packet> {
    if self.done || self.ctx.mode != FormatMode::Input {
      return None;
    }
    match self.ctx.read_packet() {
      Ok(Some(packet)) => Some(packet),
      Ok(None) => {
        self.done = true;
        None
      }
      Err(err) => {
        tracing::warn!(
          target: "avflow",
          url = %self.ctx.url,
          error = %err,
          "packet sequence ended by read error"
        );
        self.ctx.last_error = Some(err);
        self.done = true;
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::{AvioHandlers, CodecContext, CodecOptions, Rational, TimeBase};
  use crate::ffi::{avcodec::codec_flag, AVPixelFormat};
  use std::sync::{Arc, Mutex};

  fn mpeg1_context(global_header: bool) -> CodecContext {
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let mut ctx = CodecContext::new(codec).unwrap();
    ctx.configure(&CodecOptions {
      width: Some(320),
      height: Some(240),
      pixel_format: Some(AVPixelFormat::Yuv420p),
      bit_rate: Some(400_000),
      time_base: Some(TimeBase::new(1, 25).unwrap()),
      frame_rate: Some(Rational::new(25, 1).unwrap()),
      ..Default::default()
    })
    .unwrap();
    if global_header {
      ctx.add_flags(codec_flag::GLOBAL_HEADER).unwrap();
    }
    ctx
  }

  #[test]
  fn test_new_and_drop() {
    let ctx = FormatContext::new().unwrap();
    assert_eq!(ctx.mode(), FormatMode::Unopened);
    assert_eq!(ctx.streams_count(), 0);
  }

  #[test]
  fn test_close_never_opened() {
    let mut ctx = FormatContext::new().unwrap();
    ctx.close_input();
    ctx.close_output();
    assert_eq!(ctx.mode(), FormatMode::Unopened);
    assert!(ctx.packets().next().is_none());
    assert!(ctx.last_error().is_none());
  }

  #[test]
  fn test_output_format_resolution() {
    assert_eq!(OutputFormat::from_name("mp4").unwrap().name(), "mp4");
    assert_eq!(
      OutputFormat::new(None, Some("clip.mkv"), None).unwrap().name(),
      "matroska"
    );
    assert_eq!(OutputFormat::from_mime("application/mp4").unwrap().name(), "mp4");
    assert_eq!(
      OutputFormat::from_name("mp4").unwrap().default_audio_codec(),
      AVCodecID::Aac
    );
    // Name wins over extension
    let format = OutputFormat::new(Some("mpegts"), Some("clip.mp4"), None).unwrap();
    assert_eq!(format.name(), "mpegts");
    assert_eq!(format.filename(), Some("clip.mp4"));
  }

  #[test]
  fn test_unknown_output_format() {
    let err = OutputFormat::from_mime("wrong/mime").unwrap_err();
    assert_eq!(
      err.to_string(),
      "output format is not initialized. Unable to allocate context"
    );
    assert!(matches!(
      FormatContext::new_output("no-extension"),
      Err(CodecError::OutputFormat)
    ));
    assert!(matches!(
      OutputFormat::new(None, Some(""), Some("")),
      Err(CodecError::OutputFormat)
    ));
  }

  #[test]
  fn test_output_context_from_targets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.mp4");

    let mut ctx = FormatContext::new_output(path.as_path()).unwrap();
    assert_eq!(ctx.mode(), FormatMode::Output);
    assert!(ctx.is_global_header());
    ctx.close_output();
    ctx.close_output();
    assert_eq!(ctx.mode(), FormatMode::Closed);
    assert!(ctx.last_error().is_none());
    // No header, no file
    assert!(!path.exists());

    let ctx = FormatContext::new_output(OutputFormat::from_name("mp4").unwrap()).unwrap();
    assert_eq!(ctx.output_format().unwrap().name(), "mp4");
  }

  #[test]
  fn test_header_requires_open_codec() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("header.mp4");
    let mut output = FormatContext::new_output(path.as_path()).unwrap();

    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let global = output.is_global_header();
    let stream = output.new_stream(&codec).unwrap();
    assert_eq!(stream.index(), 0);
    stream.set_codec_ctx(mpeg1_context(global));

    let err = output.write_header().unwrap_err();
    assert!(matches!(err, CodecError::HeaderWrite(_)));
    assert!(!output.header_written());
    assert!(!path.exists());

    output
      .stream_mut(0)
      .and_then(|s| s.codec_ctx_mut())
      .unwrap()
      .open(&[])
      .unwrap();
    output.write_header().unwrap();
    assert!(output.header_written());
    assert!(matches!(
      output.write_header(),
      Err(CodecError::InvalidState(_))
    ));

    // The muxer picks its own time base
    assert!(output.stream(0).unwrap().time_base().is_some());
    output.close_output();
    assert!(path.exists());
  }

  #[test]
  fn test_unwritable_output_fails_at_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.mp4");
    let mut output = FormatContext::new_output(path.as_path()).unwrap();

    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let global = output.is_global_header();
    let mut ctx = mpeg1_context(global);
    ctx.open(&[]).unwrap();
    output.new_stream(&codec).unwrap().set_codec_ctx(ctx);

    let err = output.write_header().unwrap_err();
    assert!(matches!(err, CodecError::OpenOutput { ref url, .. } if url.ends_with("out.mp4")));
    assert!(!output.header_written());
    output.close_output();
    assert_eq!(output.mode(), FormatMode::Closed);
  }

  #[test]
  fn test_custom_io_takes_the_place_of_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routed.mkv");
    let mut output = FormatContext::new_output(path.as_path()).unwrap();

    let sink = Arc::new(Mutex::new(Vec::new()));
    let target = sink.clone();
    let pb = AvioContext::new(AvioHandlers::writer(move |buf| {
      target.lock().unwrap().extend_from_slice(buf);
      buf.len()
    }))
    .unwrap();
    output.set_pb(pb).unwrap();

    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    let global = output.is_global_header();
    let mut ctx = mpeg1_context(global);
    ctx.open(&[]).unwrap();
    output.new_stream(&codec).unwrap().set_codec_ctx(ctx);
    output.write_header().unwrap();
    output.close_output();

    assert!(output.last_error().is_none());
    assert!(!path.exists());
    // Matroska files start with the EBML magic
    assert!(sink.lock().unwrap().starts_with(&[0x1a, 0x45, 0xdf, 0xa3]));
  }

  #[test]
  fn test_header_without_streams() {
    let dir = tempfile::tempdir().unwrap();
    let mut output = FormatContext::new_output(dir.path().join("empty.mp4").as_path()).unwrap();
    assert!(matches!(output.write_header(), Err(CodecError::HeaderWrite(_))));

    let mut packet = Packet::from_data(&[0; 4]).unwrap();
    assert!(matches!(
      output.write_packet(&mut packet),
      Err(CodecError::InvalidState(_))
    ));
  }

  #[test]
  fn test_new_stream_rejected_by_muxer() {
    let webm = OutputFormat::from_name("webm").unwrap();
    let mut output = FormatContext::new_output(webm).unwrap();
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    assert!(output.new_stream(&codec).is_none());
    assert_eq!(output.streams_count(), 0);
  }

  #[test]
  fn test_stream_indices_are_sequential() {
    let mpegts = OutputFormat::from_name("mpegts").unwrap();
    let mut output = FormatContext::new_output(mpegts).unwrap();
    let codec = Codec::find_encoder(AVCodecID::Mpeg1Video).unwrap();
    assert_eq!(output.new_stream(&codec).unwrap().index(), 0);
    assert_eq!(output.new_stream(&codec).unwrap().index(), 1);
    assert_eq!(output.streams_count(), 2);
  }

  #[test]
  fn test_open_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.mp4");
    let err = FormatContext::new_input(&missing.to_string_lossy()).unwrap_err();
    assert!(matches!(err, CodecError::OpenInput { .. }));
  }

  #[test]
  fn test_unknown_input_format() {
    let mut ctx = FormatContext::new().unwrap();
    assert!(ctx.set_input_format("not-a-demuxer").is_err());
    assert!(ctx.set_input_format("mov").is_ok());
  }
}
