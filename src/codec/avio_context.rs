//! Custom I/O context for FFmpeg's AVIO system
//!
//! Lets a format context read from or write to Rust callbacks instead of a URL. The
//! handlers are boxed and handed to the engine as the opaque pointer; the engine calls
//! back into them through the `extern "C"` trampolines below.

use crate::ffi::accessors::ffio_free;
use crate::ffi::avformat::{avio_alloc_context, avio_flush, seek_whence, AVIOContext};
use crate::ffi::avutil::{av_free, av_malloc};
use crate::ffi::error::{AVERROR_EOF, AVERROR_UNKNOWN};
use std::io::{Read, Seek, SeekFrom, Write};
use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;

use super::{CodecError, CodecResult};

/// Default buffer size handed to the engine (32KB)
pub const IO_BUFFER_SIZE: usize = 32 * 1024;

/// Fills the buffer, returns the byte count; 0 means end of stream
pub type ReadHandler = Box<dyn FnMut(&mut [u8]) -> usize + Send>;
/// Consumes the buffer, returns the byte count accepted; 0 is a write failure
pub type WriteHandler = Box<dyn FnMut(&[u8]) -> usize + Send>;
/// Repositions the source, returns the new absolute offset
pub type SeekHandler = Box<dyn FnMut(SeekFrom) -> Option<u64> + Send>;

/// Callbacks backing an [`AvioContext`]
///
/// At least one of `read_packet` or `write_packet` must be present. A seek handler makes
/// the context seekable, which containers with trailing indexes (mp4/mov) need.
pub struct AvioHandlers {
  pub read_packet: Option<ReadHandler>,
  pub write_packet: Option<WriteHandler>,
  pub seek: Option<SeekHandler>,
  /// Size of the engine-side buffer; 0 falls back to [`IO_BUFFER_SIZE`]
  pub buffer_size: usize,
}

impl AvioHandlers {
  /// Handlers that only read
  pub fn reader(read: impl FnMut(&mut [u8]) -> usize + Send + 'static) -> Self {
    Self {
      read_packet: Some(Box::new(read)),
      ..Self::default()
    }
  }

  /// Handlers that only write
  pub fn writer(write: impl FnMut(&[u8]) -> usize + Send + 'static) -> Self {
    Self {
      write_packet: Some(Box::new(write)),
      ..Self::default()
    }
  }

  pub fn with_seek(mut self, seek: impl FnMut(SeekFrom) -> Option<u64> + Send + 'static) -> Self {
    self.seek = Some(Box::new(seek));
    self
  }

  pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
    self.buffer_size = buffer_size;
    self
  }
}

impl Default for AvioHandlers {
  fn default() -> Self {
    Self {
      read_packet: None,
      write_packet: None,
      seek: None,
      buffer_size: IO_BUFFER_SIZE,
    }
  }
}

impl std::fmt::Debug for AvioHandlers {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AvioHandlers")
      .field("read_packet", &self.read_packet.is_some())
      .field("write_packet", &self.write_packet.is_some())
      .field("seek", &self.seek.is_some())
      .field("buffer_size", &self.buffer_size)
      .finish()
  }
}

/// Owned AVIOContext driven by [`AvioHandlers`]
///
/// Attach it to a format context with `FormatContext::set_pb`; the format context then
/// keeps it alive for as long as the engine may call into it.
pub struct AvioContext {
  ptr: NonNull<AVIOContext>,
  /// Boxed handlers passed as the opaque pointer, reclaimed in Drop
  handlers: *mut AvioHandlers,
  writable: bool,
}

impl AvioContext {
  /// Allocate a context calling back into `handlers`
  pub fn new(handlers: AvioHandlers) -> CodecResult<Self> {
    if handlers.read_packet.is_none() && handlers.write_packet.is_none() {
      return Err(CodecError::InvalidConfig(
        "custom I/O needs a read or a write handler".into(),
      ));
    }

    let buffer_size = match handlers.buffer_size {
      0 => IO_BUFFER_SIZE,
      n => n,
    };
    let buffer_len = c_int::try_from(buffer_size)
      .map_err(|_| CodecError::InvalidConfig(format!("I/O buffer of {} bytes", buffer_size)))?;

    let buffer = unsafe { av_malloc(buffer_size) } as *mut u8;
    if buffer.is_null() {
      return Err(CodecError::AllocationFailed("AVIO buffer"));
    }

    let writable = handlers.write_packet.is_some();
    let read_cb: Option<crate::ffi::avformat::ReadPacketFn> = handlers
      .read_packet
      .as_ref()
      .map(|_| read_callback as crate::ffi::avformat::ReadPacketFn);
    let write_cb: Option<crate::ffi::avformat::WritePacketFn> = handlers
      .write_packet
      .as_ref()
      .map(|_| write_callback as crate::ffi::avformat::WritePacketFn);
    let seek_cb: Option<crate::ffi::avformat::SeekFn> = handlers
      .seek
      .as_ref()
      .map(|_| seek_callback as crate::ffi::avformat::SeekFn);

    // Leaked here, reclaimed in Drop
    let opaque = Box::into_raw(Box::new(handlers));

    let ptr = unsafe {
      avio_alloc_context(
        buffer,
        buffer_len,
        writable as c_int,
        opaque as *mut c_void,
        read_cb,
        write_cb,
        seek_cb,
      )
    };

    match NonNull::new(ptr) {
      Some(ptr) => {
        tracing::trace!(
          target: "avflow",
          buffer_size,
          writable,
          seekable = seek_cb.is_some(),
          "allocated custom I/O context"
        );
        Ok(Self {
          ptr,
          handlers: opaque,
          writable,
        })
      }
      None => {
        unsafe {
          av_free(buffer as *mut c_void);
          drop(Box::from_raw(opaque));
        }
        Err(CodecError::AllocationFailed("AVIOContext"))
      }
    }
  }

  /// Read sequentially from `reader`
  pub fn from_reader<R: Read + Send + 'static>(mut reader: R) -> CodecResult<Self> {
    Self::new(AvioHandlers::reader(move |buf| read_some(&mut reader, buf)))
  }

  /// Read from `reader`, letting the demuxer seek in it
  pub fn from_seekable_reader<R: Read + Seek + Send + 'static>(reader: R) -> CodecResult<Self> {
    let shared = std::sync::Arc::new(std::sync::Mutex::new(reader));
    let seeker = shared.clone();
    let handlers = AvioHandlers::reader(move |buf| match shared.lock() {
      Ok(mut reader) => read_some(&mut *reader, buf),
      Err(_) => 0,
    })
    .with_seek(move |pos| seeker.lock().ok()?.seek(pos).ok());
    Self::new(handlers)
  }

  /// Write sequentially into `writer`
  pub fn from_writer<W: Write + Send + 'static>(mut writer: W) -> CodecResult<Self> {
    Self::new(AvioHandlers::writer(move |buf| match writer.write_all(buf) {
      Ok(()) => buf.len(),
      Err(err) => {
        tracing::warn!(target: "avflow", error = %err, "custom I/O write failed");
        0
      }
    }))
  }

  /// Get the raw AVIOContext pointer
  #[inline]
  pub fn as_ptr(&self) -> *mut AVIOContext {
    self.ptr.as_ptr()
  }

  #[inline]
  pub fn is_writable(&self) -> bool {
    self.writable
  }

  /// Push buffered output through the write handler
  pub fn flush(&mut self) {
    if self.writable {
      unsafe { avio_flush(self.ptr.as_ptr()) };
    }
  }
}

impl Drop for AvioContext {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      ffio_free(&mut ptr);
      drop(Box::from_raw(self.handlers));
    }
  }
}

// The handlers are Send and the context is only touched through &mut self
unsafe impl Send for AvioContext {}

impl std::fmt::Debug for AvioContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AvioContext")
      .field("writable", &self.writable)
      .finish()
  }
}

/// Read until `buf` is full or the reader reports end of stream
fn read_some<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> usize {
  let mut filled = 0;
  while filled < buf.len() {
    match reader.read(&mut buf[filled..]) {
      Ok(0) => break,
      Ok(n) => filled += n,
      Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
      Err(err) => {
        tracing::warn!(target: "avflow", error = %err, "custom I/O read failed");
        break;
      }
    }
  }
  filled
}

// ============================================================================
// Callbacks
// ============================================================================

unsafe extern "C" fn read_callback(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
  if opaque.is_null() || buf.is_null() || buf_size <= 0 {
    return AVERROR_EOF;
  }
  let handlers = unsafe { &mut *(opaque as *mut AvioHandlers) };
  let Some(read) = handlers.read_packet.as_mut() else {
    return AVERROR_EOF;
  };
  let slice = unsafe { std::slice::from_raw_parts_mut(buf, buf_size as usize) };
  match read(slice).min(buf_size as usize) {
    0 => AVERROR_EOF,
    n => n as c_int,
  }
}

unsafe extern "C" fn write_callback(opaque: *mut c_void, buf: *const u8, buf_size: c_int) -> c_int {
  if opaque.is_null() || buf.is_null() || buf_size < 0 {
    return AVERROR_UNKNOWN;
  }
  let handlers = unsafe { &mut *(opaque as *mut AvioHandlers) };
  let Some(write) = handlers.write_packet.as_mut() else {
    return AVERROR_UNKNOWN;
  };
  let slice = unsafe { std::slice::from_raw_parts(buf, buf_size as usize) };
  match write(slice) {
    0 if buf_size > 0 => AVERROR_UNKNOWN,
    n => n.min(buf_size as usize) as c_int,
  }
}

unsafe extern "C" fn seek_callback(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
  if opaque.is_null() {
    return -1;
  }
  let handlers = unsafe { &mut *(opaque as *mut AvioHandlers) };
  let Some(seek) = handlers.seek.as_mut() else {
    return -1;
  };

  let whence = whence & !seek_whence::AVSEEK_FORCE;
  if whence == seek_whence::AVSEEK_SIZE {
    // Size query: measure the end, then go back to where we were
    let Some(current) = seek(SeekFrom::Current(0)) else {
      return -1;
    };
    let Some(end) = seek(SeekFrom::End(0)) else {
      return -1;
    };
    if seek(SeekFrom::Start(current)).is_none() {
      return -1;
    }
    return end as i64;
  }

  let pos = match whence {
    seek_whence::SEEK_SET if offset >= 0 => SeekFrom::Start(offset as u64),
    seek_whence::SEEK_SET => return -1,
    seek_whence::SEEK_CUR => SeekFrom::Current(offset),
    seek_whence::SEEK_END => SeekFrom::End(offset),
    _ => return -1,
  };
  seek(pos).map(|p| p as i64).unwrap_or(-1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;
  use std::sync::{Arc, Mutex};

  #[test]
  fn test_requires_a_handler() {
    let err = AvioContext::new(AvioHandlers::default()).unwrap_err();
    assert!(matches!(err, CodecError::InvalidConfig(_)));
  }

  #[test]
  fn test_read_callback_maps_zero_to_eof() {
    let ctx = AvioContext::from_reader(Cursor::new(vec![7u8; 10])).unwrap();
    assert!(!ctx.is_writable());

    let opaque = ctx.handlers as *mut c_void;
    let mut buf = [0u8; 8];
    let n = unsafe { read_callback(opaque, buf.as_mut_ptr(), buf.len() as c_int) };
    assert_eq!(n, 8);
    assert_eq!(buf, [7u8; 8]);

    let n = unsafe { read_callback(opaque, buf.as_mut_ptr(), buf.len() as c_int) };
    assert_eq!(n, 2);

    let n = unsafe { read_callback(opaque, buf.as_mut_ptr(), buf.len() as c_int) };
    assert_eq!(n, AVERROR_EOF);
  }

  #[test]
  fn test_seek_callback_reports_size_and_restores_position() {
    let data: Vec<u8> = (0..100u8).collect();
    let ctx = AvioContext::from_seekable_reader(Cursor::new(data)).unwrap();
    let opaque = ctx.handlers as *mut c_void;

    assert_eq!(unsafe { seek_callback(opaque, 40, seek_whence::SEEK_SET) }, 40);
    assert_eq!(unsafe { seek_callback(opaque, 0, seek_whence::AVSEEK_SIZE) }, 100);

    let mut buf = [0u8; 2];
    let n = unsafe { read_callback(opaque, buf.as_mut_ptr(), 2) };
    assert_eq!(n, 2);
    assert_eq!(buf, [40, 41]);

    assert_eq!(unsafe { seek_callback(opaque, -10, seek_whence::SEEK_END) }, 90);
    assert_eq!(unsafe { seek_callback(opaque, -5, seek_whence::SEEK_SET) }, -1);
  }

  #[test]
  fn test_seek_without_handler() {
    let ctx = AvioContext::from_reader(Cursor::new(vec![0u8; 4])).unwrap();
    assert!(unsafe { (*ctx.handlers).seek.is_none() });
    let opaque = ctx.handlers as *mut c_void;
    assert_eq!(unsafe { seek_callback(opaque, 0, seek_whence::SEEK_SET) }, -1);
  }

  #[test]
  fn test_write_callback_forwards_bytes() {
    let sink = Arc::new(Mutex::new(Vec::new()));
    let target = sink.clone();
    let ctx = AvioContext::new(AvioHandlers::writer(move |buf| {
      target.lock().unwrap().extend_from_slice(buf);
      buf.len()
    }))
    .unwrap();
    assert!(ctx.is_writable());

    let opaque = ctx.handlers as *mut c_void;
    let payload = b"header";
    let n = unsafe { write_callback(opaque, payload.as_ptr(), payload.len() as c_int) };
    assert_eq!(n, 6);
    assert_eq!(sink.lock().unwrap().as_slice(), b"header");
  }

  #[test]
  fn test_write_failure_is_an_error() {
    let ctx = AvioContext::new(AvioHandlers::writer(|_| 0)).unwrap();
    let opaque = ctx.handlers as *mut c_void;
    let n = unsafe { write_callback(opaque, b"x".as_ptr(), 1) };
    assert!(n < 0);
  }
}
