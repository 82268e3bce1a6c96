//! Owned AVDictionary for passing key/value options to the engine

use crate::ffi::{
  avutil::{av_dict_count, av_dict_free, av_dict_get, av_dict_set, dict_flag},
  check_error, AVDictionary,
};
use std::ffi::CStr;

use super::{to_cstring, CodecResult};

/// Key/value options, freed on drop
///
/// Calls such as `avcodec_open2` remove the entries they consume, so after a call the
/// dictionary holds exactly the options nobody recognized.
pub struct Dictionary {
  ptr: *mut AVDictionary,
}

impl Dictionary {
  /// Create an empty dictionary (allocated lazily on first insert)
  pub fn new() -> Self {
    Self {
      ptr: std::ptr::null_mut(),
    }
  }

  /// Build a dictionary from key/value pairs
  pub fn from_pairs(pairs: &[(&str, &str)]) -> CodecResult<Self> {
    let mut dict = Self::new();
    for (key, value) in pairs {
      dict.set(key, value)?;
    }
    Ok(dict)
  }

  /// Insert or replace an entry
  pub fn set(&mut self, key: &str, value: &str) -> CodecResult<()> {
    let c_key = to_cstring(key, "option key")?;
    let c_value = to_cstring(value, "option value")?;
    let ret = unsafe { av_dict_set(&mut self.ptr, c_key.as_ptr(), c_value.as_ptr(), 0) };
    check_error(ret)?;
    Ok(())
  }

  /// Look up an entry
  pub fn get(&self, key: &str) -> Option<String> {
    let c_key = to_cstring(key, "option key").ok()?;
    let entry = unsafe { av_dict_get(self.ptr, c_key.as_ptr(), std::ptr::null(), 0) };
    if entry.is_null() {
      return None;
    }
    let value = unsafe { CStr::from_ptr((*entry).value) };
    Some(value.to_string_lossy().into_owned())
  }

  pub fn len(&self) -> usize {
    unsafe { av_dict_count(self.ptr).max(0) as usize }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// All entries, in the engine's storage order
  pub fn entries(&self) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut prev = std::ptr::null();
    loop {
      // An empty key with IGNORE_SUFFIX matches every entry
      let entry =
        unsafe { av_dict_get(self.ptr, c"".as_ptr(), prev, dict_flag::IGNORE_SUFFIX) };
      if entry.is_null() {
        break;
      }
      unsafe {
        entries.push((
          CStr::from_ptr((*entry).key).to_string_lossy().into_owned(),
          CStr::from_ptr((*entry).value).to_string_lossy().into_owned(),
        ));
      }
      prev = entry;
    }
    entries
  }

  /// Pointer to the dictionary pointer, for calls that consume entries
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut *mut AVDictionary {
    &mut self.ptr
  }
}

impl Default for Dictionary {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for Dictionary {
  fn drop(&mut self) {
    unsafe { av_dict_free(&mut self.ptr) }
  }
}

unsafe impl Send for Dictionary {}

impl std::fmt::Debug for Dictionary {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_map().entries(self.entries()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_dictionary() {
    let dict = Dictionary::new();
    assert!(dict.is_empty());
    assert!(dict.entries().is_empty());
    assert_eq!(dict.get("anything"), None);
  }

  #[test]
  fn test_set_get_replace() {
    let mut dict = Dictionary::from_pairs(&[("preset", "fast"), ("crf", "23")]).unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(dict.get("crf").as_deref(), Some("23"));

    dict.set("preset", "slow").unwrap();
    assert_eq!(dict.len(), 2);
    let mut entries = dict.entries();
    entries.sort();
    assert_eq!(
      entries,
      vec![
        ("crf".to_string(), "23".to_string()),
        ("preset".to_string(), "slow".to_string())
      ]
    );
  }
}
