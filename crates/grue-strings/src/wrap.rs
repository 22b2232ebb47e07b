//! In-place word wrapping.
//!
//! Dialog and UI text in the supported titles is wrapped by mutating the
//! string itself: a breaking space is overwritten with `\n`, and a word
//! longer than the window gets a `\n` forced in front of the overflowing
//! unit. Width is measured in units — the legacy renderers draw one glyph
//! per unit, so there is no notion of display columns here.

use crate::string::SharedString;
use crate::unit::{CodeUnit, is_ascii_space};

impl<U: CodeUnit, const INLINE: usize> SharedString<U, INLINE> {
    /// Wrap in place so no line exceeds `max_length` units.
    ///
    /// Scans a window of `max_length` units at a time, breaking at the
    /// last ASCII whitespace seen in the window, or right before the
    /// overflowing unit when the window holds a single long word. An
    /// existing `\n` resets the window. `max_length == 0` is a no-op.
    pub fn word_wrap(&mut self, max_length: usize) {
        if max_length == 0 || self.len() < max_length {
            return;
        }

        self.make_unique();

        let newline = U::from_byte(b'\n');
        let mut i = 0;
        while i < self.len() {
            let mut last_space: Option<usize> = None;
            let mut x = 0;
            while i < self.len() && x <= max_length {
                let c = self.as_units()[i];
                if c == newline {
                    last_space = None;
                    x = 0;
                } else {
                    if is_ascii_space(c) {
                        last_space = Some(i);
                    }
                    x += 1;
                }
                i += 1;
            }

            if x > max_length {
                match last_space {
                    // No break point in the window: force one before the
                    // unit that overflowed. It gets rescanned as the start
                    // of the next window.
                    None => self.insert_unit(i - 1, newline),
                    Some(pos) => {
                        self.set_unit(pos, newline);
                        i = pos + 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Str8;

    fn wrapped(text: &str, max_length: usize) -> String {
        let mut s = Str8::from(text);
        s.word_wrap(max_length);
        s.to_string()
    }

    #[test]
    fn breaks_at_whitespace() {
        assert_eq!(wrapped("aaaa bbbb cccc", 5), "aaaa\nbbbb\ncccc");
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(wrapped("hi", 10), "hi");
        assert_eq!(wrapped("", 10), "");
    }

    #[test]
    fn long_word_gets_a_forced_break() {
        let out = wrapped("aaaaaaaa", 5);
        assert_eq!(out, "aaaaa\naaa");
    }

    #[test]
    fn every_line_fits_the_window() {
        let out = wrapped("you are likely to be eaten by a grue", 10);
        for line in out.split('\n') {
            assert!(line.len() <= 10, "line {line:?} exceeds the window");
        }
        // Wrapping only rewrites whitespace; the words survive.
        let words: Vec<&str> = out.split_whitespace().collect();
        assert_eq!(words.join(" "), "you are likely to be eaten by a grue");
    }

    #[test]
    fn existing_newlines_reset_the_window() {
        assert_eq!(wrapped("ab\ncdef", 4), "ab\ncdef");
    }

    #[test]
    fn zero_width_is_a_no_op() {
        assert_eq!(wrapped("does not hang", 0), "does not hang");
    }

    #[test]
    fn wrap_breaks_sharing_before_writing() {
        let a = Str8::from_units(&b"word ".repeat(8));
        let mut b = a.clone();
        b.word_wrap(7);
        assert!(a.iter().all(|u| u != b'\n'), "original must be untouched");
        assert!(b.contains_unit(b'\n'));
    }
}
