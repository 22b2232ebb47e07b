//! Content hashing.
//!
//! Two hashes with two jobs:
//! - [`SharedString::hash_code`] is the engine's persisted hash. Save
//!   files and precomputed resource tables store these values, so the
//!   algorithm is frozen: CPython's multiplicative string hash with
//!   multiplier 1000003, folded over the zero-extended unit values and
//!   finished with an XOR of the length. Changing any step breaks every
//!   shipped table.
//! - The [`Hash`] impl feeds the unit slice to a standard hasher for
//!   in-memory `HashMap` keys; it is consistent with `Eq` and makes no
//!   stability promise.

use std::hash::{Hash, Hasher};

use crate::string::SharedString;
use crate::unit::CodeUnit;

/// The frozen multiplier of the persisted hash.
const HASH_MULTIPLIER: u32 = 1_000_003;

impl<U: CodeUnit, const INLINE: usize> SharedString<U, INLINE> {
    /// The engine's persisted content hash (stable across runs, widths,
    /// and releases).
    ///
    /// The seed reads the unit at index 0, which for the empty string is
    /// the terminator — that slot is always valid.
    #[must_use]
    pub fn hash_code(&self) -> u32 {
        let units = self.as_units_with_nul();
        let mut h = units[0].to_raw().wrapping_shl(7);
        for &u in &units[..self.len()] {
            h = h.wrapping_mul(HASH_MULTIPLIER) ^ u.to_raw();
        }
        h ^ self.len() as u32
    }
}

impl<U: CodeUnit, const INLINE: usize> Hash for SharedString<U, INLINE> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_units().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use crate::{Str8, Str16, Str32};

    /// Reference values computed step-by-step from the frozen algorithm.
    fn reference_hash(units: &[u32]) -> u32 {
        let seed = units.first().copied().unwrap_or(0);
        let mut h = seed.wrapping_shl(7);
        for &u in units {
            h = h.wrapping_mul(1_000_003) ^ u;
        }
        h ^ units.len() as u32
    }

    #[test]
    fn matches_the_frozen_algorithm() {
        for text in ["", "a", "intro", "GAME.INI", "a slightly longer key"] {
            let s = Str8::from(text);
            let raw: Vec<u32> = text.bytes().map(u32::from).collect();
            assert_eq!(s.hash_code(), reference_hash(&raw), "mismatch for {text:?}");
        }
    }

    #[test]
    fn empty_string_hash() {
        // Seed reads the terminator (0), so the hash is 0 ^ len = 0.
        assert_eq!(Str8::new().hash_code(), 0);
    }

    #[test]
    fn equal_width_agnostic_content_hashes_agree() {
        // The same numeric units hash identically at every width — the
        // fold sees zero-extended values.
        let narrow = Str8::from("level");
        let wide: Str16 = narrow.iter().map(u16::from).collect();
        let wider: Str32 = narrow.iter().map(u32::from).collect();
        assert_eq!(narrow.hash_code(), wide.hash_code());
        assert_eq!(narrow.hash_code(), wider.hash_code());
    }

    #[test]
    fn high_units_fold_zero_extended() {
        // 0xFFFF must fold as 0x0000FFFF, never sign-extended.
        let s = Str16::from_units(&[0xFFFF]);
        assert_eq!(s.hash_code(), reference_hash(&[0xFFFF]));
    }

    #[test]
    fn equal_strings_hash_equal_in_maps() {
        use rustc_hash::FxHashMap;

        let mut volumes: FxHashMap<Str8, u8> = FxHashMap::default();
        volumes.insert(Str8::from("music_volume"), 192);
        volumes.insert(Str8::from("sfx_volume"), 255);

        // Lookup through an independently built, heap-backed key.
        let mut key = Str8::from("music_");
        key.append_units(b"volume");
        assert_eq!(volumes.get(&key), Some(&192));
    }

    #[test]
    fn clone_and_original_hash_identically() {
        let a = Str8::from_units(&[b'h'; 50]);
        let b = a.clone();
        assert_eq!(a.hash_code(), b.hash_code());
    }
}
