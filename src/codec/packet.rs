//! Safe wrapper around FFmpeg AVPacket
//!
//! Provides RAII-based memory management for compressed media units.

use crate::ffi::{
  self,
  accessors::{
    ffpkt_get_data, ffpkt_get_dts, ffpkt_get_duration, ffpkt_get_flags, ffpkt_get_pos,
    ffpkt_get_pts, ffpkt_get_size, ffpkt_get_stream_index, ffpkt_set_dts,
    ffpkt_set_duration, ffpkt_set_flags, ffpkt_set_pos, ffpkt_set_pts,
    ffpkt_set_stream_index,
  },
  avcodec::{av_new_packet, av_packet_alloc, av_packet_free, av_packet_ref, av_packet_unref},
  pkt_flag, AVPacket, AV_NOPTS_VALUE,
};
use std::ptr::NonNull;

use super::{rescale, CodecError, CodecResult, TimeBase};

/// Safe wrapper around AVPacket with RAII cleanup
pub struct Packet {
  ptr: NonNull<AVPacket>,
}

impl Packet {
  /// Allocate a new empty packet (pts/dts unset)
  pub fn new() -> CodecResult<Self> {
    let ptr = unsafe { av_packet_alloc() };
    NonNull::new(ptr)
      .map(|ptr| Self { ptr })
      .ok_or(CodecError::AllocationFailed("AVPacket"))
  }

  /// Allocate a packet holding a copy of `data`
  pub fn from_data(data: &[u8]) -> CodecResult<Self> {
    let size = i32::try_from(data.len())
      .map_err(|_| CodecError::InvalidConfig("packet payload too large".into()))?;
    let mut pkt = Self::new()?;
    let ret = unsafe { av_new_packet(pkt.as_mut_ptr(), size) };
    ffi::check_error(ret)?;
    if !data.is_empty() {
      unsafe {
        let dst = ffpkt_get_data(pkt.as_ptr());
        std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
      }
    }
    Ok(pkt)
  }

  /// Get the raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVPacket {
    self.ptr.as_ptr()
  }

  /// Get the mutable raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVPacket {
    self.ptr.as_ptr()
  }

  // ========================================================================
  // Data Access
  // ========================================================================

  /// Get packet payload as a slice
  pub fn data(&self) -> &[u8] {
    let ptr = unsafe { ffpkt_get_data(self.as_ptr()) };
    let size = self.size();
    if ptr.is_null() || size == 0 {
      &[]
    } else {
      unsafe { std::slice::from_raw_parts(ptr, size) }
    }
  }

  /// Payload size in bytes; 0 marks an empty (heartbeat) packet
  #[inline]
  pub fn size(&self) -> usize {
    unsafe { ffpkt_get_size(self.as_ptr()).max(0) as usize }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.size() == 0
  }

  /// Copy the payload to a new Vec
  pub fn to_vec(&self) -> Vec<u8> {
    self.data().to_vec()
  }

  // ========================================================================
  // Timestamps
  // ========================================================================

  /// Presentation timestamp, [`AV_NOPTS_VALUE`] when unset
  #[inline]
  pub fn pts(&self) -> i64 {
    unsafe { ffpkt_get_pts(self.as_ptr()) }
  }

  #[inline]
  pub fn set_pts(&mut self, pts: i64) {
    unsafe { ffpkt_set_pts(self.as_mut_ptr(), pts) }
  }

  /// Decoding timestamp, [`AV_NOPTS_VALUE`] when unset
  #[inline]
  pub fn dts(&self) -> i64 {
    unsafe { ffpkt_get_dts(self.as_ptr()) }
  }

  #[inline]
  pub fn set_dts(&mut self, dts: i64) {
    unsafe { ffpkt_set_dts(self.as_mut_ptr(), dts) }
  }

  /// Duration in time base units, 0 if unknown
  #[inline]
  pub fn duration(&self) -> i64 {
    unsafe { ffpkt_get_duration(self.as_ptr()) }
  }

  #[inline]
  pub fn set_duration(&mut self, duration: i64) {
    unsafe { ffpkt_set_duration(self.as_mut_ptr(), duration) }
  }

  /// Convert pts, dts and duration from one time base to another
  ///
  /// Unset timestamps stay unset; an unknown (zero) duration stays zero.
  pub fn rescale_ts(&mut self, from: TimeBase, to: TimeBase) {
    let pts = self.pts();
    if pts != AV_NOPTS_VALUE {
      self.set_pts(rescale(pts, from, to));
    }
    let dts = self.dts();
    if dts != AV_NOPTS_VALUE {
      self.set_dts(rescale(dts, from, to));
    }
    let duration = self.duration();
    if duration > 0 {
      self.set_duration(rescale(duration, from, to));
    }
  }

  // ========================================================================
  // Container Placement
  // ========================================================================

  /// Index of the stream this packet belongs to
  #[inline]
  pub fn stream_index(&self) -> usize {
    unsafe { ffpkt_get_stream_index(self.as_ptr()).max(0) as usize }
  }

  #[inline]
  pub fn set_stream_index(&mut self, index: usize) {
    unsafe { ffpkt_set_stream_index(self.as_mut_ptr(), index as i32) }
  }

  /// Byte position in the source container, -1 if unknown
  #[inline]
  pub fn pos(&self) -> i64 {
    unsafe { ffpkt_get_pos(self.as_ptr()) }
  }

  #[inline]
  pub fn set_pos(&mut self, pos: i64) {
    unsafe { ffpkt_set_pos(self.as_mut_ptr(), pos) }
  }

  // ========================================================================
  // Flags
  // ========================================================================

  /// Get packet flags (`AV_PKT_FLAG_*`)
  #[inline]
  pub fn flags(&self) -> i32 {
    unsafe { ffpkt_get_flags(self.as_ptr()) }
  }

  #[inline]
  pub fn set_flags(&mut self, flags: i32) {
    unsafe { ffpkt_set_flags(self.as_mut_ptr(), flags) }
  }

  /// Check if this packet starts a key frame
  #[inline]
  pub fn is_key(&self) -> bool {
    (self.flags() & pkt_flag::KEY) != 0
  }

  /// Mark or unmark the packet as a key frame
  pub fn set_key(&mut self, key: bool) {
    let flags = if key {
      self.flags() | pkt_flag::KEY
    } else {
      self.flags() & !pkt_flag::KEY
    };
    self.set_flags(flags);
  }

  #[inline]
  pub fn is_corrupt(&self) -> bool {
    (self.flags() & pkt_flag::CORRUPT) != 0
  }

  // ========================================================================
  // Lifecycle
  // ========================================================================

  /// Drop the payload and reset every field to its default
  pub fn unref(&mut self) {
    unsafe { av_packet_unref(self.as_mut_ptr()) }
  }

  /// Create a new reference to this packet's data, copying all properties
  pub fn try_clone(&self) -> CodecResult<Self> {
    let mut new_pkt = Self::new()?;
    let ret = unsafe { av_packet_ref(new_pkt.as_mut_ptr(), self.as_ptr()) };
    ffi::check_error(ret)?;
    Ok(new_pkt)
  }
}

impl Drop for Packet {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_packet_free(&mut ptr);
    }
  }
}

// Packet data can be sent between threads
unsafe impl Send for Packet {}

impl std::fmt::Debug for Packet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Packet")
      .field("stream_index", &self.stream_index())
      .field("size", &self.size())
      .field("pts", &self.pts())
      .field("dts", &self.dts())
      .field("duration", &self.duration())
      .field("is_key", &self.is_key())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tb(num: i32, den: i32) -> TimeBase {
    TimeBase::new(num, den).unwrap()
  }

  #[test]
  fn test_packet_allocation() {
    let pkt = Packet::new().unwrap();
    assert!(pkt.is_empty());
    assert_eq!(pkt.size(), 0);
    assert_eq!(pkt.pts(), AV_NOPTS_VALUE);
    assert_eq!(pkt.dts(), AV_NOPTS_VALUE);
  }

  #[test]
  fn test_from_data() {
    let pkt = Packet::from_data(&[1, 2, 3, 4, 5]).unwrap();
    assert_eq!(pkt.size(), 5);
    assert_eq!(pkt.data(), &[1, 2, 3, 4, 5]);
  }

  #[test]
  fn test_rescale_keeps_unset_timestamps() {
    let mut pkt = Packet::from_data(&[0; 8]).unwrap();
    pkt.set_pts(10);
    pkt.set_duration(1);
    pkt.rescale_ts(tb(1, 25), tb(1, 90000));
    assert_eq!(pkt.pts(), 36000);
    assert_eq!(pkt.dts(), AV_NOPTS_VALUE);
    assert_eq!(pkt.duration(), 3600);
  }

  #[test]
  fn test_clone_preserves_properties() {
    let mut pkt = Packet::from_data(b"payload").unwrap();
    pkt.set_pts(AV_NOPTS_VALUE);
    pkt.set_dts(41);
    pkt.set_stream_index(2);
    pkt.set_key(true);

    let copy = pkt.try_clone().unwrap();
    assert_eq!(copy.data(), b"payload");
    assert_eq!(copy.pts(), AV_NOPTS_VALUE);
    assert_eq!(copy.dts(), 41);
    assert_eq!(copy.stream_index(), 2);
    assert!(copy.is_key());

    pkt.set_key(false);
    assert!(!pkt.is_key());
    assert!(copy.is_key());
  }

  #[test]
  fn test_unref_resets() {
    let mut pkt = Packet::from_data(&[9; 16]).unwrap();
    pkt.set_pts(5);
    pkt.unref();
    assert!(pkt.is_empty());
    assert_eq!(pkt.pts(), AV_NOPTS_VALUE);
  }
}
