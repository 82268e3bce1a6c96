//! libavutil function declarations
//!
//! Frames, memory, dictionaries, errors, timestamps and logging.

use super::types::*;
use std::os::raw::{c_char, c_int, c_void};

unsafe extern "C" {
  // ========================================================================
  // Frame Management
  // ========================================================================

  /// Allocate an AVFrame and set its fields to default values
  pub fn av_frame_alloc() -> *mut AVFrame;

  /// Free the frame and any dynamically allocated objects in it
  pub fn av_frame_free(frame: *mut *mut AVFrame);

  /// Create a new frame that references the same data as src
  pub fn av_frame_clone(src: *const AVFrame) -> *mut AVFrame;

  /// Unreference all buffers referenced by frame and reset to defaults
  pub fn av_frame_unref(frame: *mut AVFrame);

  /// Allocate buffers for the format, dimensions / nb_samples and layout already set
  ///
  /// `align` of 0 picks a suitable alignment for the current CPU.
  pub fn av_frame_get_buffer(frame: *mut AVFrame, align: c_int) -> c_int;

  /// Ensure the frame data is writable, copying it if it is shared
  pub fn av_frame_make_writable(frame: *mut AVFrame) -> c_int;

  // ========================================================================
  // Memory Allocation
  // ========================================================================

  /// Allocate a memory block with alignment suitable for all memory accesses
  pub fn av_malloc(size: usize) -> *mut c_void;

  /// Free a memory block which has been allocated with av_malloc
  pub fn av_free(ptr: *mut c_void);

  // ========================================================================
  // Error Handling
  // ========================================================================

  /// Put a description of the AVERROR code errnum in errbuf
  ///
  /// Returns 0 on success, negative if no description was found
  pub fn av_strerror(errnum: c_int, errbuf: *mut c_char, errbuf_size: usize) -> c_int;

  // ========================================================================
  // Time/Timestamp Utilities
  // ========================================================================

  /// Rescale a 64-bit integer by 2 rational numbers with the given rounding
  pub fn av_rescale_q_rnd(a: i64, bq: AVRational, cq: AVRational, rnd: c_int) -> i64;

  // ========================================================================
  // Dictionary (Options)
  // ========================================================================

  /// Set an entry in the dictionary, allocating it when `*pm` is NULL
  pub fn av_dict_set(
    pm: *mut *mut AVDictionary,
    key: *const c_char,
    value: *const c_char,
    flags: c_int,
  ) -> c_int;

  /// Get a dictionary entry with matching key, starting after `prev`
  pub fn av_dict_get(
    m: *const AVDictionary,
    key: *const c_char,
    prev: *const AVDictionaryEntry,
    flags: c_int,
  ) -> *mut AVDictionaryEntry;

  /// Get number of entries in dictionary
  pub fn av_dict_count(m: *const AVDictionary) -> c_int;

  /// Free all memory allocated for an AVDictionary and set `*m` to NULL
  pub fn av_dict_free(m: *mut *mut AVDictionary);

  // ========================================================================
  // Logging
  // ========================================================================

  /// Set the logging level
  pub fn av_log_set_level(level: c_int);

  /// Get the current logging level
  pub fn av_log_get_level() -> c_int;
}

// ============================================================================
// Logging Levels
// ============================================================================

pub mod log_level {
  use std::os::raw::c_int;

  pub const QUIET: c_int = -8;
  pub const PANIC: c_int = 0;
  pub const FATAL: c_int = 8;
  pub const ERROR: c_int = 16;
  pub const WARNING: c_int = 24;
  pub const INFO: c_int = 32;
  pub const VERBOSE: c_int = 40;
  pub const DEBUG: c_int = 48;
  pub const TRACE: c_int = 56;
}

// ============================================================================
// Dictionary Flags
// ============================================================================

pub mod dict_flag {
  use std::os::raw::c_int;

  pub const MATCH_CASE: c_int = 1;
  /// Return first entry whose key starts with the given key (an empty key matches all)
  pub const IGNORE_SUFFIX: c_int = 2;
  pub const DONT_OVERWRITE: c_int = 16;
  pub const APPEND: c_int = 32;
}

// ============================================================================
// Rounding Modes
// ============================================================================

pub mod rounding {
  use std::os::raw::c_int;

  pub const ZERO: c_int = 0;
  pub const INF: c_int = 1;
  pub const DOWN: c_int = 2;
  pub const UP: c_int = 3;
  /// Round to nearest, halfway cases away from zero
  pub const NEAR_INF: c_int = 5;
  /// Pass INT64_MIN/MAX through unchanged
  pub const PASS_MINMAX: c_int = 8192;
}
