#![forbid(unsafe_code)]

//! User preference storage.
//!
//! Views read their toggle defaults and colors from a [`PreferenceStore`] and
//! write them back only on an explicit save. [`MemoryPreferences`] is the
//! in-process backend used by tests and by hosts without a settings file.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::geometry::Rgb;

/// Well-known preference keys.
pub mod keys {
    pub const FOREGROUND: &str = "View.Foreground";
    pub const BACKGROUND: &str = "View.Background";
}

/// A typed key/value preference backend.
pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: &str) -> Option<bool>;

    fn put_bool(&self, key: &str, value: bool);

    fn get_color(&self, key: &str) -> Option<Rgb>;

    fn put_color(&self, key: &str, value: Rgb);

    /// Typed get with a default.
    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PrefValue {
    Bool(bool),
    Color(Rgb),
}

/// In-memory preference backend.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, PrefValue>>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`PreferenceStore::put_bool`].
    #[must_use]
    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.put_bool(key, value);
        self
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &str) -> Option<PrefValue> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .copied()
    }

    fn put(&self, key: &str, value: PrefValue) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(PrefValue::Bool(b)) => Some(b),
            _ => None,
        }
    }

    fn put_bool(&self, key: &str, value: bool) {
        self.put(key, PrefValue::Bool(value));
    }

    fn get_color(&self, key: &str) -> Option<Rgb> {
        match self.get(key) {
            Some(PrefValue::Color(c)) => Some(c),
            _ => None,
        }
    }

    fn put_color(&self, key: &str, value: Rgb) {
        self.put(key, PrefValue::Color(value));
    }
}
