//! Lenient numeric parsing.
//!
//! Script and INI values in the supported titles encode counts and flags
//! as bare digit runs, sometimes with trailing junk (`"12fps"`) and
//! sometimes in the C notations (`0x1A`, `0755`). These parsers read the
//! longest valid prefix and never fail: garbage input is 0, and overflow
//! wraps, exactly as the original interpreters behaved. Do not use them
//! where overflow must be detected.

use crate::string::SharedString;
use crate::unit::CodeUnit;

/// Numeric value of an ASCII digit in any base up to 16, hex digits
/// case-insensitive.
#[inline]
fn ascii_digit_value(raw: u32) -> Option<u64> {
    match raw {
        0x30..=0x39 => Some(u64::from(raw - 0x30)),        // '0'..='9'
        0x61..=0x66 => Some(u64::from(raw - 0x61 + 10)),   // 'a'..='f'
        0x41..=0x46 => Some(u64::from(raw - 0x41 + 10)),   // 'A'..='F'
        _ => None,
    }
}

impl<U: CodeUnit, const INLINE: usize> SharedString<U, INLINE> {
    /// Parse a leading run of decimal digits, stopping at the first
    /// non-digit. Empty or non-digit-leading input yields 0; overflow
    /// wraps.
    #[must_use]
    pub fn parse_u64(&self) -> u64 {
        let mut result: u64 = 0;
        for u in self.iter() {
            let raw = u.to_raw();
            if !(0x30..=0x39).contains(&raw) {
                break;
            }
            result = result.wrapping_mul(10).wrapping_add(u64::from(raw - 0x30));
        }
        result
    }

    /// Parse with C-style base detection: `0x` selects base 16 (the
    /// prefix is lowercase-`x` only, hex digits either case), a leading
    /// `0` selects base 8, anything else base 10. Stops at the first
    /// digit invalid for the base; overflow wraps.
    #[must_use]
    pub fn parse_u64_with_prefix(&self) -> u64 {
        let units = self.as_units();
        let raw_at = |i: usize| units[i].to_raw();

        let (base, skip) = if self.len() >= 3 && raw_at(0) == 0x30 && raw_at(1) == 0x78 {
            (16u64, 2)
        } else if self.len() >= 2 && raw_at(0) == 0x30 {
            (8u64, 1)
        } else {
            (10u64, 0)
        };

        let mut result: u64 = 0;
        for u in &units[skip..] {
            let Some(digit) = ascii_digit_value(u.to_raw()) else {
                break;
            };
            if digit >= base {
                break;
            }
            result = result.wrapping_mul(base).wrapping_add(digit);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::{Str8, Str16};

    #[test]
    fn decimal_prefix() {
        assert_eq!(Str8::from("1234").parse_u64(), 1234);
        assert_eq!(Str8::from("12fps").parse_u64(), 12);
        assert_eq!(Str8::from("").parse_u64(), 0);
        assert_eq!(Str8::from("fps12").parse_u64(), 0);
        assert_eq!(Str8::from("007").parse_u64(), 7);
    }

    #[test]
    fn base_detection() {
        assert_eq!(Str8::from("0x1A").parse_u64_with_prefix(), 26);
        assert_eq!(Str8::from("0xff").parse_u64_with_prefix(), 255);
        assert_eq!(Str8::from("0755").parse_u64_with_prefix(), 0o755);
        assert_eq!(Str8::from("42").parse_u64_with_prefix(), 42);
        assert_eq!(Str8::from("0").parse_u64_with_prefix(), 0);
    }

    #[test]
    fn prefix_is_lowercase_x_only() {
        // "0X1A" is not a hex prefix: the leading 0 selects octal and 'X'
        // is not a digit at all.
        assert_eq!(Str8::from("0X1A").parse_u64_with_prefix(), 0);
        // "0x" alone: octal string "x" has no digits.
        assert_eq!(Str8::from("0x").parse_u64_with_prefix(), 0);
    }

    #[test]
    fn digits_invalid_for_base_stop_the_parse() {
        assert_eq!(Str8::from("0778").parse_u64_with_prefix(), 0o77);
        assert_eq!(Str8::from("12ab").parse_u64_with_prefix(), 12);
        assert_eq!(Str8::from("0x1G").parse_u64_with_prefix(), 1);
    }

    #[test]
    fn overflow_wraps() {
        // 2^64 = 18446744073709551616; wrapping brings it back to 0.
        assert_eq!(Str8::from("18446744073709551616").parse_u64(), 0);
        assert_eq!(Str8::from("18446744073709551617").parse_u64(), 1);
    }

    #[test]
    fn wide_units_parse_the_same() {
        let s = Str16::from_units(&[0x30, 0x78, 0x31, 0x41]); // "0x1A"
        assert_eq!(s.parse_u64_with_prefix(), 26);
    }
}
