//! Rational numbers and timestamp rescaling
//!
//! Timestamps are integers counted in units of a time base (`num/den` seconds).
//! Moving a timestamp between the codec side and the container side is a rescale.

use crate::ffi::{AVRational, AV_NOPTS_VALUE};
use std::fmt;

use super::{CodecError, CodecResult};

/// A rational number with a positive denominator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
  num: i32,
  den: i32,
}

/// Unit of frame, packet and stream timestamps
pub type TimeBase = Rational;

impl Rational {
  /// Create a rational; the denominator must be positive
  pub fn new(num: i32, den: i32) -> CodecResult<Self> {
    if den <= 0 {
      return Err(CodecError::InvalidTimeBase { num, den });
    }
    Ok(Self { num, den })
  }

  /// Build from a value read back from the engine, which may be unset (0/0)
  pub(crate) fn from_raw(num: i32, den: i32) -> Option<Self> {
    Self::new(num, den).ok()
  }

  #[inline]
  pub fn num(&self) -> i32 {
    self.num
  }

  #[inline]
  pub fn den(&self) -> i32 {
    self.den
  }

  /// Value as a floating point number
  pub fn as_f64(&self) -> f64 {
    self.num as f64 / self.den as f64
  }

  /// Reciprocal (e.g. frame rate 25/1 to time base 1/25)
  pub fn invert(&self) -> CodecResult<Self> {
    match self.num {
      n if n > 0 => Self::new(self.den, n),
      n if n < 0 => Self::new(-self.den, -n),
      _ => Err(CodecError::InvalidTimeBase {
        num: self.den,
        den: self.num,
      }),
    }
  }

  /// Rescale `value` expressed in `self` units into `to` units
  #[inline]
  pub fn rescale(&self, value: i64, to: Rational) -> i64 {
    rescale(value, *self, to)
  }
}

/// Rescale `value` from one time base to another
///
/// Computes `value * from / to` exactly in 128-bit arithmetic and rounds to the nearest
/// integer, halfway cases away from zero. [`AV_NOPTS_VALUE`] is returned unchanged, and so
/// is produced when `to` is zero. Results beyond the `i64` range saturate without ever
/// colliding with the unset sentinel.
pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
  if value == AV_NOPTS_VALUE || to.num == 0 {
    return AV_NOPTS_VALUE;
  }

  let mut numer = value as i128 * from.num as i128 * to.den as i128;
  let mut denom = from.den as i128 * to.num as i128;
  if denom < 0 {
    numer = -numer;
    denom = -denom;
  }

  let half = denom / 2;
  let rounded = if numer >= 0 {
    (numer + half) / denom
  } else {
    -((-numer + half) / denom)
  };

  rounded.clamp(i64::MIN as i128 + 1, i64::MAX as i128) as i64
}

impl fmt::Display for Rational {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.num, self.den)
  }
}

impl From<Rational> for AVRational {
  fn from(r: Rational) -> Self {
    AVRational::new(r.num, r.den)
  }
}

impl TryFrom<AVRational> for Rational {
  type Error = CodecError;

  fn try_from(r: AVRational) -> CodecResult<Self> {
    Self::new(r.num, r.den)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ffi::avutil::{av_rescale_q_rnd, rounding};

  fn tb(num: i32, den: i32) -> Rational {
    Rational::new(num, den).unwrap()
  }

  #[test]
  fn test_zero_denominator_rejected() {
    let err = Rational::new(1, 0).unwrap_err();
    assert!(matches!(err, CodecError::InvalidTimeBase { num: 1, den: 0 }));
    assert!(Rational::new(1, -25).is_err());
  }

  #[test]
  fn test_codec_to_stream_rescale() {
    // 1/25 codec time base into the usual mp4 stream time base
    assert_eq!(rescale(0, tb(1, 25), tb(1, 12800)), 0);
    assert_eq!(rescale(1, tb(1, 25), tb(1, 12800)), 512);
    assert_eq!(rescale(250, tb(1, 25), tb(1, 90000)), 900_000);
    assert_eq!(tb(1, 1000).rescale(1500, tb(1, 1)), 2);
  }

  #[test]
  fn test_rounds_half_away_from_zero() {
    assert_eq!(rescale(1, tb(1, 2), tb(1, 1)), 1);
    assert_eq!(rescale(-1, tb(1, 2), tb(1, 1)), -1);
    assert_eq!(rescale(3, tb(1, 2), tb(1, 1)), 2);
    assert_eq!(rescale(-3, tb(1, 2), tb(1, 1)), -2);
    assert_eq!(rescale(1, tb(1, 3), tb(1, 1)), 0);
    assert_eq!(rescale(2, tb(1, 3), tb(1, 1)), 1);
  }

  #[test]
  fn test_unset_sentinel_passes_through() {
    assert_eq!(rescale(AV_NOPTS_VALUE, tb(1, 25), tb(1, 90000)), AV_NOPTS_VALUE);
    assert_eq!(rescale(AV_NOPTS_VALUE, tb(1, 90000), tb(1, 25)), AV_NOPTS_VALUE);
  }

  #[test]
  fn test_no_overflow_on_large_values() {
    let v = i64::MAX / 4;
    assert_eq!(rescale(v, tb(1, 90000), tb(1, 90000)), v);
    assert_eq!(rescale(v, tb(1000, 1), tb(1, 1)), i64::MAX);
    assert_eq!(rescale(-v, tb(1000, 1), tb(1, 1)), i64::MIN + 1);
  }

  #[test]
  fn test_matches_engine_rounding() {
    let bases = [tb(1, 25), tb(1, 90000), tb(1001, 30000), tb(1, 44100), tb(1, 12800)];
    let values = [0i64, 1, -1, 7, 12345, -98765, 3_000_000_007];
    for from in bases {
      for to in bases {
        for v in values {
          let engine =
            unsafe { av_rescale_q_rnd(v, from.into(), to.into(), rounding::NEAR_INF) };
          assert_eq!(rescale(v, from, to), engine, "{} from {} to {}", v, from, to);
        }
      }
    }
  }

  #[test]
  fn test_round_trip_within_one_unit() {
    let bases = [tb(1, 25), tb(1, 30), tb(1001, 30000), tb(1, 48000), tb(1, 90000)];
    for a in bases {
      for b in bases {
        // When b is coarser than a, the trip back can only be as precise as b
        let unit = rescale(1, b, a).abs().max(1);
        for v in [-100_000i64, -1, 0, 1, 2, 99, 1234, 100_000] {
          let back = rescale(rescale(v, a, b), b, a);
          assert!(
            (back - v).abs() <= unit,
            "{} via {} -> {} came back as {}",
            v,
            a,
            b,
            back
          );
        }
      }
    }
  }

  #[test]
  fn test_invert_and_display() {
    assert_eq!(tb(25, 1).invert().unwrap(), tb(1, 25));
    assert!(tb(0, 1).invert().is_err());
    assert_eq!(tb(1001, 30000).to_string(), "1001/30000");
    assert!(Rational::try_from(AVRational::new(0, 0)).is_err());
  }
}
