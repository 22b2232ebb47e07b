//! The shared small-buffer string store.
//!
//! [`SharedString`] keeps short strings in a fixed inline buffer inside the
//! value and long strings in a shared, atomically refcounted heap buffer.
//! Clones of a heap-backed string alias the same buffer; every in-place
//! mutator re-establishes exclusive ownership before writing, so edits are
//! never visible through another instance (copy-on-write).
//!
//! Storage invariants:
//! - `len` counts live units; slot `len` always holds the terminator and is
//!   valid to read (`as_units_with_nul`, `Index`).
//! - A string with `len < INLINE` constructed from scratch is inline and is
//!   never reference counted.
//! - A heap buffer's slice length is its capacity; capacities are rounded
//!   up to 32-slot blocks and grow by doubling.
//! - A shared heap buffer is immutable until some instance re-acquires
//!   exclusive ownership of it (or replaces it).

use std::fmt::{self, Write as _};
use std::iter;
use std::ops::{Add, AddAssign, Bound, Index, RangeBounds};
use std::slice;
use std::str::FromStr;
use std::sync::Arc;

use crate::unit::{CodeUnit, is_ascii_space, map_ascii};

/// Heap capacities are rounded up to multiples of this many slots.
const CAPACITY_BLOCK: usize = 32;

/// Allocations at or above this many slots get a debug event; resource
/// names and script lines should never be close to this.
const LARGE_ALLOC_LOG_THRESHOLD: usize = 16_384;

/// A shared, small-buffer-optimized string of raw code units.
///
/// `U` is the element type (`u8`, `u16`, or `u32`); `INLINE` is the inline
/// buffer size in slots, terminator included. Strings shorter than `INLINE`
/// live entirely inside the value; longer ones share a refcounted heap
/// buffer between clones until one of them mutates.
///
/// # Example
/// ```
/// use grue_strings::Str8;
///
/// let mut key = Str8::from("music_volume");
/// key.push(b'=');
/// key.append_units(b"255");
/// assert_eq!(key, "music_volume=255");
/// ```
pub struct SharedString<U: CodeUnit = u8, const INLINE: usize = 20> {
    /// Unit count, excluding the terminator at index `len`.
    len: usize,
    repr: Repr<U, INLINE>,
}

enum Repr<U, const INLINE: usize> {
    /// Short strings live in the value itself. Never reference counted.
    Inline([U; INLINE]),
    /// Long strings live in a shared allocation. The slice length is the
    /// capacity; the live prefix is tracked by `SharedString::len`.
    Heap(Arc<[U]>),
}

/// Allocate a fresh heap buffer of `capacity` slots holding `content`
/// followed by zero fill (the terminator comes along for free).
fn alloc_heap<U: CodeUnit>(content: &[U], capacity: usize) -> Arc<[U]> {
    debug_assert!(content.len() < capacity);
    if capacity >= LARGE_ALLOC_LOG_THRESHOLD {
        tracing::debug!(
            capacity,
            len = content.len(),
            "allocating large shared string buffer"
        );
    }
    let mut slots = vec![U::NUL; capacity];
    slots[..content.len()].copy_from_slice(content);
    Arc::from(slots)
}

/// Round a slot count up to the next capacity block.
#[inline]
fn block_capacity(slots: usize) -> usize {
    slots.div_ceil(CAPACITY_BLOCK) * CAPACITY_BLOCK
}

/// Resolve a `RangeBounds` against a length, clamping both ends.
pub(crate) fn normalize_range<R>(range: R, max: usize) -> (usize, usize)
where
    R: RangeBounds<usize>,
{
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => max,
    };

    let start = start.min(max);
    let end = end.min(max);
    if end < start { (start, start) } else { (start, end) }
}

impl<U: CodeUnit, const INLINE: usize> SharedString<U, INLINE> {
    const INLINE_HOLDS_TERMINATOR: () =
        assert!(INLINE > 0, "inline capacity must hold at least the terminator");

    /// Create an empty string (inline, zero-terminated).
    #[must_use]
    pub fn new() -> Self {
        let () = Self::INLINE_HOLDS_TERMINATOR;
        Self {
            len: 0,
            repr: Repr::Inline([U::NUL; INLINE]),
        }
    }

    /// Create a string from a unit slice.
    ///
    /// Short content is copied into the inline buffer; longer content gets
    /// a heap buffer rounded up to the capacity block.
    #[must_use]
    pub fn from_units(units: &[U]) -> Self {
        let () = Self::INLINE_HOLDS_TERMINATOR;
        let len = units.len();
        if len < INLINE {
            let mut buf = [U::NUL; INLINE];
            buf[..len].copy_from_slice(units);
            Self {
                len,
                repr: Repr::Inline(buf),
            }
        } else {
            Self {
                len,
                repr: Repr::Heap(alloc_heap(units, block_capacity(len + 1))),
            }
        }
    }

    /// Create a one-unit string. The terminator value yields the empty
    /// string, matching the on-disk convention that NUL ends a string.
    #[must_use]
    pub fn from_unit(c: U) -> Self {
        if c == U::NUL {
            Self::new()
        } else {
            Self::from_units(&[c])
        }
    }

    /// Unit count, excluding the terminator.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the string has zero units.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated slots, terminator slot included.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.repr {
            Repr::Inline(_) => INLINE,
            Repr::Heap(data) => data.len(),
        }
    }

    /// Whether the content lives in the inline buffer. Mainly for tests
    /// and diagnostics.
    #[inline]
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self.repr, Repr::Inline(_))
    }

    /// Whether this string currently aliases a heap buffer with at least
    /// one other instance. Mainly for tests and diagnostics; the answer
    /// can be stale the moment it is returned if other threads hold
    /// clones.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        match &self.repr {
            Repr::Inline(_) => false,
            Repr::Heap(data) => Arc::strong_count(data) > 1,
        }
    }

    /// Whether `self` and `other` alias the same heap buffer.
    #[must_use]
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Heap(a), Repr::Heap(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The live units, terminator excluded.
    #[inline]
    #[must_use]
    pub fn as_units(&self) -> &[U] {
        match &self.repr {
            Repr::Inline(buf) => &buf[..self.len],
            Repr::Heap(data) => &data[..self.len],
        }
    }

    /// The live units plus the terminator slot.
    #[inline]
    #[must_use]
    pub fn as_units_with_nul(&self) -> &[U] {
        match &self.repr {
            Repr::Inline(buf) => &buf[..=self.len],
            Repr::Heap(data) => &data[..=self.len],
        }
    }

    /// The unit at `pos`, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<U> {
        self.as_units().get(pos).copied()
    }

    /// The first unit, if any.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<U> {
        self.as_units().first().copied()
    }

    /// The last unit, if any.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<U> {
        self.as_units().last().copied()
    }

    /// Iterate over the live units by value.
    pub fn iter(&self) -> iter::Copied<slice::Iter<'_, U>> {
        self.as_units().iter().copied()
    }

    /// Move the content out, leaving `self` empty, inline, and reusable.
    ///
    /// This is the ownership-transfer operation: inline content is copied
    /// (it lives inside the source value), heap storage is transplanted
    /// without touching the reference count.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    // ── Capacity management ─────────────────────────────────────────────

    /// Make room for at least `additional` more units without breaking the
    /// terminator invariant. Growing past a shared buffer un-shares it.
    pub fn reserve(&mut self, additional: usize) {
        self.ensure_capacity(self.len + additional, true);
    }

    /// Re-establish exclusive ownership of the storage, copying out of a
    /// shared buffer if necessary. No-op when already unique.
    pub(crate) fn make_unique(&mut self) {
        self.ensure_capacity(self.len, true);
    }

    /// Guarantee unshared storage with room for `new_len` units plus the
    /// terminator. When `keep_old` is false the content is reset to empty
    /// instead of copied.
    ///
    /// The old buffer is released only after the replacement is populated;
    /// sibling instances keep shared storage alive through their own
    /// references.
    fn ensure_capacity(&mut self, new_len: usize, keep_old: bool) {
        let (shared, cur_capacity) = match &self.repr {
            Repr::Inline(_) => (false, INLINE),
            Repr::Heap(data) => (Arc::strong_count(data) > 1, data.len()),
        };

        // Fast path: unshared storage with room to spare.
        if !shared && new_len < cur_capacity {
            return;
        }

        if shared && new_len < INLINE {
            // Shared, but the inline buffer is big enough: drop back to it
            // and break the share without allocating.
            let mut buf = [U::NUL; INLINE];
            if keep_old {
                debug_assert!(self.len <= new_len);
                buf[..=self.len].copy_from_slice(self.as_units_with_nul());
            } else {
                self.len = 0;
            }
            self.repr = Repr::Inline(buf);
            return;
        }

        // Grow (or break sharing) on the heap. Reuse the current capacity
        // when it is already sufficient; otherwise double, at minimum the
        // next block above the requested size.
        let new_capacity = if new_len < cur_capacity {
            cur_capacity
        } else {
            (cur_capacity * 2).max(block_capacity(new_len + 1))
        };

        let data = if keep_old {
            debug_assert!(self.len < new_capacity);
            alloc_heap(self.as_units(), new_capacity)
        } else {
            self.len = 0;
            alloc_heap(&[], new_capacity)
        };
        self.repr = Repr::Heap(data);
    }

    /// Exclusive view of the full storage, terminator slots included.
    ///
    /// Callers must have established uniqueness via `ensure_capacity` /
    /// `make_unique` on this same `&mut` borrow.
    fn storage_mut(&mut self) -> &mut [U] {
        match &mut self.repr {
            Repr::Inline(buf) => buf,
            Repr::Heap(data) => match Arc::get_mut(data) {
                Some(slots) => slots,
                None => unreachable!("mutating shared storage without exclusive ownership"),
            },
        }
    }

    // ── Mutators ────────────────────────────────────────────────────────

    /// Insert one unit at `pos`, shifting the tail right.
    ///
    /// # Panics
    /// Panics if `pos > len`.
    pub fn insert_unit(&mut self, pos: usize, c: U) {
        assert!(
            pos <= self.len,
            "insert position {pos} out of bounds (len {})",
            self.len
        );
        self.ensure_capacity(self.len + 1, true);
        let len = self.len;
        let storage = self.storage_mut();
        storage.copy_within(pos..=len, pos + 1); // terminator moves too
        storage[pos] = c;
        self.len += 1;
    }

    /// Insert a run of units at `pos`, shifting the tail right once.
    ///
    /// # Panics
    /// Panics if `pos > len`.
    pub fn insert_units(&mut self, pos: usize, units: &[U]) {
        assert!(
            pos <= self.len,
            "insert position {pos} out of bounds (len {})",
            self.len
        );
        if units.is_empty() {
            return;
        }
        let n = units.len();
        self.ensure_capacity(self.len + n, true);
        let len = self.len;
        let storage = self.storage_mut();
        storage.copy_within(pos..=len, pos + n);
        storage[pos..pos + n].copy_from_slice(units);
        self.len += n;
    }

    /// Remove and return the unit at `pos`, shifting the tail left.
    ///
    /// # Panics
    /// Panics if `pos >= len`.
    pub fn remove_unit(&mut self, pos: usize) -> U {
        assert!(
            pos < self.len,
            "remove position {pos} out of bounds (len {})",
            self.len
        );
        self.make_unique();
        let len = self.len;
        let storage = self.storage_mut();
        let removed = storage[pos];
        storage.copy_within(pos + 1..=len, pos);
        self.len -= 1;
        removed
    }

    /// Remove and return the last unit, if any.
    pub fn pop(&mut self) -> Option<U> {
        if self.len == 0 {
            None
        } else {
            Some(self.remove_unit(self.len - 1))
        }
    }

    /// Overwrite the unit at `pos`.
    ///
    /// # Panics
    /// Panics if `pos >= len`.
    pub fn set_unit(&mut self, pos: usize, c: U) {
        assert!(
            pos < self.len,
            "set position {pos} out of bounds (len {})",
            self.len
        );
        self.make_unique();
        self.storage_mut()[pos] = c;
    }

    /// Remove a range of units. The range is clamped to the current
    /// length; removal through the end is a plain truncation, an interior
    /// removal shifts the remainder left.
    pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = normalize_range(range, self.len);
        if start >= end {
            return;
        }
        self.make_unique();
        let len = self.len;
        let storage = self.storage_mut();
        if end == len {
            storage[start] = U::NUL;
            self.len = start;
            return;
        }
        storage.copy_within(end..=len, start);
        self.len -= end - start;
    }

    /// Keep only the first `new_len` units. No-op if already shorter.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len < self.len {
            self.chop(self.len - new_len);
        }
    }

    /// Drop up to `n` trailing units (clamped to the current length).
    pub fn chop(&mut self, n: usize) {
        let new_len = self.len - self.len.min(n);
        if new_len == self.len {
            return;
        }
        self.make_unique();
        let storage = self.storage_mut();
        storage[new_len] = U::NUL;
        self.len = new_len;
    }

    /// Release any held storage and reset to the empty inline state.
    pub fn clear(&mut self) {
        self.len = 0;
        self.repr = Repr::Inline([U::NUL; INLINE]);
    }

    /// Replace the content with a single unit, always dropping back to the
    /// inline buffer. The terminator value clears the string.
    pub fn assign_unit(&mut self, c: U) {
        self.clear();
        if c != U::NUL {
            self.push(c);
        }
    }

    /// Replace the content with a unit slice, reusing unshared storage
    /// when it is large enough.
    pub fn assign_units(&mut self, units: &[U]) {
        self.ensure_capacity(units.len(), false);
        let n = units.len();
        let storage = self.storage_mut();
        storage[..n].copy_from_slice(units);
        storage[n] = U::NUL;
        self.len = n;
    }

    /// Append one unit.
    ///
    /// Appending the terminator value is permitted — the terminator
    /// invariant still holds — but flagged, because embedded NULs confuse
    /// C-style readers downstream.
    pub fn push(&mut self, c: U) {
        if c == U::NUL {
            tracing::debug!("appending a NUL unit to a string");
        }
        self.ensure_capacity(self.len + 1, true);
        let len = self.len;
        let storage = self.storage_mut();
        storage[len] = c;
        storage[len + 1] = U::NUL;
        self.len += 1;
    }

    /// Append a unit slice.
    ///
    /// A slice borrowed from this same string cannot be passed here (the
    /// borrow checker rejects it); use [`append_from_within`] to duplicate
    /// part of the string into its own tail.
    ///
    /// [`append_from_within`]: Self::append_from_within
    pub fn append_units(&mut self, units: &[U]) {
        if units.is_empty() {
            return;
        }
        let n = units.len();
        self.ensure_capacity(self.len + n, true);
        let len = self.len;
        let storage = self.storage_mut();
        storage[len..len + n].copy_from_slice(units);
        storage[len + n] = U::NUL;
        self.len += n;
    }

    /// Append another string.
    ///
    /// `other` may alias this string's heap buffer (a clone). Growth then
    /// reallocates `self`, while `other`'s own reference keeps the old
    /// buffer alive, so the copy below always reads intact data.
    pub fn append(&mut self, other: &Self) {
        if other.len == 0 {
            return;
        }
        let n = other.len;
        self.ensure_capacity(self.len + n, true);
        let len = self.len;
        let storage = self.storage_mut();
        storage[len..len + n].copy_from_slice(other.as_units());
        storage[len + n] = U::NUL;
        self.len += n;
    }

    /// Append a copy of one of this string's own sub-ranges (clamped).
    ///
    /// This is the self-append path: uniqueness and capacity are
    /// established first, then the duplication is a bounded in-buffer
    /// copy, so reallocation can never invalidate the source range.
    pub fn append_from_within<R: RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = normalize_range(range, self.len);
        if start >= end {
            return;
        }
        let n = end - start;
        self.ensure_capacity(self.len + n, true);
        let len = self.len;
        let storage = self.storage_mut();
        storage.copy_within(start..end, len);
        storage[len + n] = U::NUL;
        self.len += n;
    }

    // ── Whitespace and case ─────────────────────────────────────────────

    /// Strip leading and trailing ASCII whitespace in place.
    ///
    /// Nothing to trim means nothing happens — in particular, a shared
    /// buffer stays shared.
    pub fn trim(&mut self) {
        if self.len == 0 {
            return;
        }
        let units = self.as_units();
        let leading = units.iter().take_while(|&&u| is_ascii_space(u)).count();
        let trailing = if leading == self.len {
            0
        } else {
            units.iter().rev().take_while(|&&u| is_ascii_space(u)).count()
        };
        if leading == 0 && trailing == 0 {
            return;
        }

        self.make_unique();
        let new_len = self.len - leading - trailing;
        let storage = self.storage_mut();
        storage.copy_within(leading..leading + new_len, 0);
        storage[new_len] = U::NUL;
        self.len = new_len;
    }

    /// Lowercase ASCII-range units in place; everything else is untouched.
    ///
    /// Sharing is only broken once a unit actually changes — converting an
    /// already-lowercase string leaves a shared buffer shared.
    pub fn make_ascii_lowercase(&mut self) {
        self.map_ascii_case(|b| b.to_ascii_lowercase());
    }

    /// Uppercase ASCII-range units in place; everything else is untouched.
    pub fn make_ascii_uppercase(&mut self) {
        self.map_ascii_case(|b| b.to_ascii_uppercase());
    }

    fn map_ascii_case(&mut self, map: fn(u8) -> u8) {
        // Scan for the first unit the mapping changes before touching the
        // storage; a no-op conversion must not break copy-on-write.
        let first_change = self
            .as_units()
            .iter()
            .position(|&u| map_ascii(u, map) != u);
        let Some(first) = first_change else {
            return;
        };

        self.make_unique();
        let len = self.len;
        let storage = self.storage_mut();
        for u in &mut storage[first..len] {
            *u = map_ascii(*u, map);
        }
    }
}

// ── Core trait impls ────────────────────────────────────────────────────

impl<U: CodeUnit, const INLINE: usize> Default for SharedString<U, INLINE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: CodeUnit, const INLINE: usize> Clone for SharedString<U, INLINE> {
    /// Inline content is copied; heap content is shared by bumping the
    /// buffer's reference count. The actual duplication happens later, if
    /// and when one of the copies mutates.
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Inline(buf) => Repr::Inline(*buf),
            Repr::Heap(data) => Repr::Heap(Arc::clone(data)),
        };
        Self {
            len: self.len,
            repr,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.len = source.len;
        self.repr = match &source.repr {
            Repr::Inline(buf) => Repr::Inline(*buf),
            Repr::Heap(data) => Repr::Heap(Arc::clone(data)),
        };
    }
}

impl<U: CodeUnit, const INLINE: usize> fmt::Debug for SharedString<U, INLINE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lossy: String = self.iter().map(U::to_char_lossy).collect();
        write!(f, "{lossy:?}")
    }
}

impl<U: CodeUnit, const INLINE: usize> fmt::Display for SharedString<U, INLINE> {
    /// Per-unit lossy rendering (see [`CodeUnit::to_char_lossy`]); useful
    /// for logs and debugging, not a codec.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for u in self.iter() {
            f.write_char(u.to_char_lossy())?;
        }
        Ok(())
    }
}

impl<U: CodeUnit, const INLINE: usize> Index<usize> for SharedString<U, INLINE> {
    type Output = U;

    /// Indexing is valid up to and including `len`; slot `len` is the
    /// terminator.
    fn index(&self, pos: usize) -> &U {
        &self.as_units_with_nul()[pos]
    }
}

impl<'a, U: CodeUnit, const INLINE: usize> IntoIterator for &'a SharedString<U, INLINE> {
    type Item = U;
    type IntoIter = iter::Copied<slice::Iter<'a, U>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<U: CodeUnit, const INLINE: usize> Extend<U> for SharedString<U, INLINE> {
    fn extend<I: IntoIterator<Item = U>>(&mut self, iter: I) {
        let it = iter.into_iter();
        let (lower, _) = it.size_hint();
        self.reserve(lower);
        for u in it {
            self.push(u);
        }
    }
}

impl<U: CodeUnit, const INLINE: usize> FromIterator<U> for SharedString<U, INLINE> {
    fn from_iter<I: IntoIterator<Item = U>>(iter: I) -> Self {
        let mut s = Self::new();
        s.extend(iter);
        s
    }
}

impl<U: CodeUnit, const INLINE: usize> From<&[U]> for SharedString<U, INLINE> {
    fn from(units: &[U]) -> Self {
        Self::from_units(units)
    }
}

impl<const INLINE: usize> From<&str> for SharedString<u8, INLINE> {
    fn from(s: &str) -> Self {
        Self::from_units(s.as_bytes())
    }
}

impl<const INLINE: usize> From<String> for SharedString<u8, INLINE> {
    fn from(s: String) -> Self {
        Self::from_units(s.as_bytes())
    }
}

impl<const INLINE: usize> FromStr for SharedString<u8, INLINE> {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_units(s.as_bytes()))
    }
}

impl<U: CodeUnit, const INLINE: usize> Add for SharedString<U, INLINE> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self.append(&rhs);
        self
    }
}

impl<U: CodeUnit, const INLINE: usize> Add<&SharedString<U, INLINE>> for SharedString<U, INLINE> {
    type Output = Self;

    fn add(mut self, rhs: &Self) -> Self {
        self.append(rhs);
        self
    }
}

impl<U: CodeUnit, const INLINE: usize> AddAssign<&SharedString<U, INLINE>>
    for SharedString<U, INLINE>
{
    fn add_assign(&mut self, rhs: &Self) {
        self.append(rhs);
    }
}

impl<U: CodeUnit, const INLINE: usize> AddAssign<U> for SharedString<U, INLINE> {
    fn add_assign(&mut self, rhs: U) {
        self.push(rhs);
    }
}

// ── u8 conveniences ─────────────────────────────────────────────────────

impl<const INLINE: usize> SharedString<u8, INLINE> {
    /// The live bytes, terminator excluded.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.as_units()
    }

    /// Interpret the bytes as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn to_utf8_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}
