#![forbid(unsafe_code)]

//! Shared copy-on-write string storage for the grue runtime.
//!
//! # Role in grue
//! `grue-strings` is the text substrate. Every script line, configuration
//! key, and resource name in the runtime is a [`SharedString`]: a
//! small-buffer-optimized sequence of raw code units that shares heap
//! storage between copies and only duplicates it when a copy is mutated.
//!
//! # Primary responsibilities
//! - **[`SharedString`]**: inline storage for short strings, shared
//!   refcounted heap storage for long ones, copy-on-write mutation.
//! - **[`CodeUnit`]**: the element seam — 8-, 16-, and 32-bit raw code
//!   units, matching the width each legacy title encoded its text in.
//! - **Legacy text helpers**: lenient numeric parsing, the engine's
//!   persisted content hash, in-place word wrapping and trimming.
//!
//! # How it fits in the system
//! The config, script, and resource layers consume this crate's contract
//! (construction, comparison, concatenation, hashing) and never touch the
//! storage representation. Nothing here interprets encodings: a
//! [`SharedString`] is a sequence of numbers with a zero terminator, which
//! is exactly how the supported titles ship their text.
//!
//! # Sharing discipline
//! Cloning a heap-backed string aliases its buffer and bumps an atomic
//! reference count; the buffer is immutable for as long as it is shared.
//! Every in-place mutator re-establishes exclusive ownership first, so two
//! strings can never observe each other's edits. A single instance is not
//! synchronized — mutating one string from several threads needs external
//! locking, same as any `&mut` access.

pub mod unit;

mod cmp;
mod hash;
mod parse;
mod search;
mod string;
mod wrap;

pub use string::SharedString;
pub use unit::{CodeUnit, is_ascii_space};

/// 8-bit string: script text and resource names in byte-oriented titles.
pub type Str8 = SharedString<u8>;

/// 16-bit string: titles that ship UCS-2 style wide text.
pub type Str16 = SharedString<u16>;

/// 32-bit string: one code point per unit.
pub type Str32 = SharedString<u32>;
