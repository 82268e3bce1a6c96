//! Synthetic video source for tests and demos
//!
//! Produces planar YUV frames with a moving gradient pattern. Frame `i` carries pts `i`,
//! so the natural codec time base is one tick per frame (e.g. 1/25 at 25 fps).

use crate::ffi::AVPixelFormat;

use super::{CodecError, CodecResult, Frame};

/// Endless iterator of generated frames; bound it with [`Iterator::take`]
#[derive(Debug, Clone)]
pub struct SyntheticVideo {
  width: u32,
  height: u32,
  format: AVPixelFormat,
  index: i64,
}

impl SyntheticVideo {
  /// Generator for `width`x`height` frames in a planar YUV or gray format
  pub fn new(width: u32, height: u32, format: AVPixelFormat) -> CodecResult<Self> {
    let supported = matches!(
      format,
      AVPixelFormat::Yuv420p
        | AVPixelFormat::Yuvj420p
        | AVPixelFormat::Yuv422p
        | AVPixelFormat::Yuv444p
        | AVPixelFormat::Gray8
    );
    if !supported {
      return Err(CodecError::InvalidConfig(format!(
        "synthetic video does not support {:?}",
        format
      )));
    }
    if width == 0 || height == 0 {
      return Err(CodecError::InvalidConfig(format!(
        "invalid synthetic video size {}x{}",
        width, height
      )));
    }
    Ok(Self {
      width,
      height,
      format,
      index: 0,
    })
  }

  /// Render frame number `index`
  pub fn frame_at(&self, index: i64) -> CodecResult<Frame> {
    let mut frame = Frame::new_video(self.width, self.height, self.format)?;
    frame.set_pts(index);

    // Pattern values wrap at 8 bits
    let i = index as usize;
    let (width, height) = (self.width as usize, self.height as usize);

    let stride = frame.linesize(0) as usize;
    if let Some(luma) = frame.plane_mut(0) {
      for y in 0..height {
        for x in 0..width {
          luma[y * stride + x] = (x + y + i * 3) as u8;
        }
      }
    }

    if self.format.num_planes() >= 3 {
      let chroma_w = (width + (1 << self.format.chroma_shift_w()) - 1)
        >> self.format.chroma_shift_w();
      let chroma_h = (height + (1 << self.format.chroma_shift_h()) - 1)
        >> self.format.chroma_shift_h();

      let stride = frame.linesize(1) as usize;
      if let Some(cb) = frame.plane_mut(1) {
        for y in 0..chroma_h {
          for x in 0..chroma_w {
            cb[y * stride + x] = (128 + y + i * 2) as u8;
          }
        }
      }

      let stride = frame.linesize(2) as usize;
      if let Some(cr) = frame.plane_mut(2) {
        for y in 0..chroma_h {
          for x in 0..chroma_w {
            cr[y * stride + x] = (64 + x + i * 5) as u8;
          }
        }
      }
    }

    Ok(frame)
  }
}

impl Iterator for SyntheticVideo {
  type Item = CodecResult<Frame>;

  fn next(&mut self) -> Option<Self::Item> {
    let frame = self.frame_at(self.index);
    self.index += 1;
    Some(frame)
  }
}
