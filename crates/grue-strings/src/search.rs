//! Unit and subsequence search.
//!
//! Plain linear scans. Config-key and path lookups in the runtime deal in
//! strings of a few dozen units, so skip tables would be all setup cost;
//! the naive scan is also what the legacy data was authored against.

use std::ops::RangeBounds;

use crate::string::{SharedString, normalize_range};
use crate::unit::CodeUnit;

impl<U: CodeUnit, const INLINE: usize> SharedString<U, INLINE> {
    /// Index of the first occurrence of `c` at or after `from`.
    #[must_use]
    pub fn find_unit(&self, c: U, from: usize) -> Option<usize> {
        self.as_units()
            .get(from..)?
            .iter()
            .position(|&u| u == c)
            .map(|i| from + i)
    }

    /// Index of the first occurrence of `needle` at or after `from`.
    ///
    /// A start position at or past the end never matches, even for an
    /// empty needle; an empty needle otherwise matches at `from`.
    #[must_use]
    pub fn find_units(&self, needle: &[U], from: usize) -> Option<usize> {
        if from >= self.len() {
            return None;
        }
        let hay = &self.as_units()[from..];
        if needle.len() > hay.len() {
            return None;
        }
        (0..=hay.len() - needle.len())
            .find(|&i| &hay[i..i + needle.len()] == needle)
            .map(|i| from + i)
    }

    /// Whether `c` occurs anywhere in the string.
    #[must_use]
    pub fn contains_unit(&self, c: U) -> bool {
        self.as_units().contains(&c)
    }

    /// Whether `needle` occurs anywhere in the string.
    ///
    /// Empty operands never contain / are never contained — the lookup
    /// tables this serves treat the empty key as "no key".
    #[must_use]
    pub fn contains_units(&self, needle: &[U]) -> bool {
        if self.is_empty() || needle.is_empty() || self.len() < needle.len() {
            return false;
        }
        self.find_units(needle, 0).is_some()
    }

    /// Whether the string starts with `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &[U]) -> bool {
        self.as_units().starts_with(prefix)
    }

    /// Whether the string ends with `suffix`.
    #[must_use]
    pub fn ends_with(&self, suffix: &[U]) -> bool {
        self.as_units().ends_with(suffix)
    }

    /// A new string holding a copy of the given sub-range (clamped).
    ///
    /// Always an independent copy — sub-ranges of a shared buffer do not
    /// alias it.
    #[must_use]
    pub fn substring<R: RangeBounds<usize>>(&self, range: R) -> Self {
        let (start, end) = normalize_range(range, self.len());
        Self::from_units(&self.as_units()[start..end])
    }
}
