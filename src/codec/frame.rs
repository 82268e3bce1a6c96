//! Safe wrapper around FFmpeg AVFrame
//!
//! Provides RAII-based memory management and safe access to frame data.

use crate::ffi::{
  self,
  accessors::{
    ffframe_get_channels, ffframe_get_data, ffframe_get_duration, ffframe_get_format,
    ffframe_get_height, ffframe_get_key_frame, ffframe_get_linesize, ffframe_get_nb_samples,
    ffframe_get_pkt_dts, ffframe_get_pts, ffframe_get_sample_rate, ffframe_get_width,
    ffframe_set_channel_layout, ffframe_set_duration, ffframe_set_format,
    ffframe_set_height, ffframe_set_nb_samples, ffframe_set_pkt_dts, ffframe_set_pts,
    ffframe_set_sample_rate, ffframe_set_width,
  },
  avutil::{
    av_frame_alloc, av_frame_clone, av_frame_free, av_frame_get_buffer,
    av_frame_make_writable, av_frame_unref,
  },
  AVFrame, AVPixelFormat, AVSampleFormat,
};
use std::ptr::NonNull;

use super::{CodecError, CodecResult};

/// Safe wrapper around AVFrame with RAII cleanup
pub struct Frame {
  ptr: NonNull<AVFrame>,
}

impl Frame {
  /// Allocate a new empty frame (no buffers, pts unset)
  pub fn new() -> CodecResult<Self> {
    let ptr = unsafe { av_frame_alloc() };
    NonNull::new(ptr)
      .map(|ptr| Self { ptr })
      .ok_or(CodecError::AllocationFailed("AVFrame"))
  }

  /// Allocate a frame with buffer for the given format and dimensions
  pub fn new_video(width: u32, height: u32, format: AVPixelFormat) -> CodecResult<Self> {
    if width == 0 || height == 0 || format == AVPixelFormat::None {
      return Err(CodecError::InvalidConfig(format!(
        "invalid video frame {}x{} {:?}",
        width, height, format
      )));
    }
    let mut frame = Self::new()?;

    unsafe {
      ffframe_set_width(frame.as_mut_ptr(), width as i32);
      ffframe_set_height(frame.as_mut_ptr(), height as i32);
      ffframe_set_format(frame.as_mut_ptr(), format.as_raw());
    }

    // Allocate buffer with 32-byte alignment for SIMD
    let ret = unsafe { av_frame_get_buffer(frame.as_mut_ptr(), 32) };
    ffi::check_error(ret)?;

    Ok(frame)
  }

  /// Allocate an audio frame holding `nb_samples` samples per channel
  pub fn new_audio(
    nb_samples: u32,
    format: AVSampleFormat,
    sample_rate: u32,
    channel_layout: u64,
  ) -> CodecResult<Self> {
    if nb_samples == 0 || format == AVSampleFormat::None || channel_layout == 0 {
      return Err(CodecError::InvalidConfig(format!(
        "invalid audio frame: {} samples {:?} layout {:#x}",
        nb_samples, format, channel_layout
      )));
    }
    let mut frame = Self::new()?;

    unsafe {
      ffframe_set_nb_samples(frame.as_mut_ptr(), nb_samples as i32);
      ffframe_set_format(frame.as_mut_ptr(), format.as_raw());
      ffframe_set_sample_rate(frame.as_mut_ptr(), sample_rate as i32);
      ffframe_set_channel_layout(frame.as_mut_ptr(), channel_layout);
    }

    let ret = unsafe { av_frame_get_buffer(frame.as_mut_ptr(), 0) };
    ffi::check_error(ret)?;

    Ok(frame)
  }

  /// Get the raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVFrame {
    self.ptr.as_ptr()
  }

  /// Get the mutable raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVFrame {
    self.ptr.as_ptr()
  }

  // ========================================================================
  // Dimensions and Format
  // ========================================================================

  #[inline]
  pub fn width(&self) -> u32 {
    unsafe { ffframe_get_width(self.as_ptr()).max(0) as u32 }
  }

  #[inline]
  pub fn height(&self) -> u32 {
    unsafe { ffframe_get_height(self.as_ptr()).max(0) as u32 }
  }

  /// Pixel format of a video frame
  pub fn pixel_format(&self) -> AVPixelFormat {
    AVPixelFormat::from_raw(unsafe { ffframe_get_format(self.as_ptr()) })
  }

  /// Sample format of an audio frame
  pub fn sample_format(&self) -> AVSampleFormat {
    AVSampleFormat::from_raw(unsafe { ffframe_get_format(self.as_ptr()) })
  }

  /// Samples per channel of an audio frame
  #[inline]
  pub fn nb_samples(&self) -> u32 {
    unsafe { ffframe_get_nb_samples(self.as_ptr()).max(0) as u32 }
  }

  #[inline]
  pub fn sample_rate(&self) -> u32 {
    unsafe { ffframe_get_sample_rate(self.as_ptr()).max(0) as u32 }
  }

  #[inline]
  pub fn channels(&self) -> u32 {
    unsafe { ffframe_get_channels(self.as_ptr()).max(0) as u32 }
  }

  // ========================================================================
  // Timestamps
  // ========================================================================

  /// Presentation timestamp in codec time base units, [`ffi::AV_NOPTS_VALUE`] when unset
  #[inline]
  pub fn pts(&self) -> i64 {
    unsafe { ffframe_get_pts(self.as_ptr()) }
  }

  #[inline]
  pub fn set_pts(&mut self, pts: i64) {
    unsafe { ffframe_set_pts(self.as_mut_ptr(), pts) }
  }

  /// dts of the packet that produced this frame when decoding
  #[inline]
  pub fn pkt_dts(&self) -> i64 {
    unsafe { ffframe_get_pkt_dts(self.as_ptr()) }
  }

  #[inline]
  pub fn set_pkt_dts(&mut self, dts: i64) {
    unsafe { ffframe_set_pkt_dts(self.as_mut_ptr(), dts) }
  }

  #[inline]
  pub fn duration(&self) -> i64 {
    unsafe { ffframe_get_duration(self.as_ptr()) }
  }

  #[inline]
  pub fn set_duration(&mut self, duration: i64) {
    unsafe { ffframe_set_duration(self.as_mut_ptr(), duration) }
  }

  /// Check if this is a key frame
  #[inline]
  pub fn is_key_frame(&self) -> bool {
    unsafe { ffframe_get_key_frame(self.as_ptr()) != 0 }
  }

  // ========================================================================
  // Data Access
  // ========================================================================

  /// Line size (stride) in bytes of a plane
  #[inline]
  pub fn linesize(&self, plane: usize) -> i32 {
    unsafe { ffframe_get_linesize(self.as_ptr(), plane as i32) }
  }

  /// Number of rows in a plane of a video frame, `None` if the format has no such plane
  fn plane_rows(&self, plane: usize) -> Option<usize> {
    let format = self.pixel_format();
    if plane >= format.num_planes() {
      return None;
    }
    let height = self.height() as usize;
    // Luma and alpha are full height
    let chroma = plane == 1 || plane == 2;
    if chroma {
      let shift = format.chroma_shift_h();
      Some((height + (1 << shift) - 1) >> shift)
    } else {
      Some(height)
    }
  }

  /// Bytes in one plane, including stride padding
  fn plane_len(&self, plane: usize) -> Option<usize> {
    let linesize = self.linesize(plane);
    if linesize <= 0 {
      return None;
    }
    let rows = if self.nb_samples() > 0 && self.width() == 0 {
      // Audio planes are a single "row" of linesize bytes
      1
    } else {
      self.plane_rows(plane)?
    };
    Some(linesize as usize * rows)
  }

  /// Get plane data as a slice (read-only)
  ///
  /// Returns None if the plane doesn't exist or has no data
  pub fn plane(&self, plane: usize) -> Option<&[u8]> {
    let ptr = unsafe { ffframe_get_data(self.as_ptr(), plane as i32) };
    if ptr.is_null() {
      return None;
    }
    let len = self.plane_len(plane)?;
    Some(unsafe { std::slice::from_raw_parts(ptr, len) })
  }

  /// Get mutable plane data as a slice
  ///
  /// Call [`Frame::make_writable`] first if the buffers may be shared with another frame.
  pub fn plane_mut(&mut self, plane: usize) -> Option<&mut [u8]> {
    let ptr = unsafe { ffframe_get_data(self.as_ptr(), plane as i32) };
    if ptr.is_null() {
      return None;
    }
    let len = self.plane_len(plane)?;
    Some(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
  }

  // ========================================================================
  // Lifecycle
  // ========================================================================

  /// Ensure the frame owns its buffers exclusively, copying them if shared
  pub fn make_writable(&mut self) -> CodecResult<()> {
    let ret = unsafe { av_frame_make_writable(self.as_mut_ptr()) };
    ffi::check_error(ret)?;
    Ok(())
  }

  /// Unreference the frame data (but keep the frame structure)
  pub fn unref(&mut self) {
    unsafe { av_frame_unref(self.as_mut_ptr()) }
  }

  /// Clone the frame (creates a new reference to the same data, with all properties)
  pub fn try_clone(&self) -> CodecResult<Self> {
    let ptr = unsafe { av_frame_clone(self.as_ptr()) };
    NonNull::new(ptr)
      .map(|ptr| Self { ptr })
      .ok_or(CodecError::AllocationFailed("frame clone"))
  }
}

impl Drop for Frame {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_frame_free(&mut ptr);
    }
  }
}

// Frame data can be sent between threads
unsafe impl Send for Frame {}

impl std::fmt::Debug for Frame {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Frame")
      .field("width", &self.width())
      .field("height", &self.height())
      .field("nb_samples", &self.nb_samples())
      .field("pts", &self.pts())
      .field("key_frame", &self.is_key_frame())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ffi::AV_NOPTS_VALUE;

  #[test]
  fn test_frame_allocation() {
    let frame = Frame::new().unwrap();
    assert_eq!(frame.width(), 0);
    assert_eq!(frame.height(), 0);
    assert_eq!(frame.pts(), AV_NOPTS_VALUE);
    assert!(frame.plane(0).is_none());
  }

  #[test]
  fn test_video_frame_allocation() {
    let frame = Frame::new_video(320, 241, AVPixelFormat::Yuv420p).unwrap();
    assert_eq!(frame.width(), 320);
    assert_eq!(frame.height(), 241);
    assert_eq!(frame.pixel_format(), AVPixelFormat::Yuv420p);

    let luma = frame.plane(0).unwrap();
    assert_eq!(luma.len(), frame.linesize(0) as usize * 241);
    let cb = frame.plane(1).unwrap();
    assert_eq!(cb.len(), frame.linesize(1) as usize * 121);
    assert!(frame.plane(2).is_some());
    assert!(frame.plane(3).is_none());
  }

  #[test]
  fn test_invalid_video_frame() {
    assert!(Frame::new_video(0, 240, AVPixelFormat::Yuv420p).is_err());
    assert!(Frame::new_video(320, 240, AVPixelFormat::None).is_err());
  }

  #[test]
  fn test_audio_frame_allocation() {
    let frame = Frame::new_audio(1152, AVSampleFormat::S16, 44100, 0x3).unwrap();
    assert_eq!(frame.nb_samples(), 1152);
    assert_eq!(frame.channels(), 2);
    assert_eq!(frame.sample_rate(), 44100);
    assert_eq!(frame.sample_format(), AVSampleFormat::S16);
    // Interleaved stereo s16: 4 bytes per sample frame
    assert!(frame.plane(0).unwrap().len() >= 1152 * 4);
  }

  #[test]
  fn test_clone_preserves_timestamps() {
    let mut frame = Frame::new_video(64, 64, AVPixelFormat::Yuv420p).unwrap();
    frame.set_pts(7);
    frame.set_pkt_dts(AV_NOPTS_VALUE);
    let copy = frame.try_clone().unwrap();
    assert_eq!(copy.pts(), 7);
    assert_eq!(copy.pkt_dts(), AV_NOPTS_VALUE);

    let unset = Frame::new_video(64, 64, AVPixelFormat::Yuv420p).unwrap();
    assert_eq!(unset.try_clone().unwrap().pts(), AV_NOPTS_VALUE);
  }

  #[test]
  fn test_make_writable_detaches_clone() {
    let mut frame = Frame::new_video(16, 16, AVPixelFormat::Gray8).unwrap();
    frame.plane_mut(0).unwrap().fill(10);
    let copy = frame.try_clone().unwrap();

    frame.make_writable().unwrap();
    frame.plane_mut(0).unwrap().fill(200);
    assert_eq!(copy.plane(0).unwrap()[0], 10);
    assert_eq!(frame.plane(0).unwrap()[0], 200);
  }
}
