// src/core/wrap.rs

//! Fits text into terminal columns.
//!
//! `gap` is the space reserved on the first line for whatever the caller
//! prints before the text (an index, a bullet). Every following line is
//! prefixed with `gap + indent` spaces, so the returned lines can be printed
//! as they are.

use crate::models::WrapStyle;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Wraps `text` to `width` columns with the given strategy.
///
/// Text that already fits after the gap is returned untouched, and the result
/// always holds at least one line.
pub fn wrap_lines(text: &str, style: WrapStyle, width: usize, gap: usize, indent: usize) -> Vec<String> {
    if char_len(text) <= width.saturating_sub(gap) {
        return vec![text.to_string()];
    }

    let lines = match style {
        WrapStyle::Regular => greedy(text, width, gap, indent, false),
        WrapStyle::Justify => greedy(text, width, gap, indent, true),
        WrapStyle::Cut => cut(text, width, gap, indent),
    };
    indent_and_connect(lines, gap + indent)
}

/// Wraps like [`wrap_lines`] and right-pads every line so the block is
/// exactly `width` columns wide (the first line counts the gap).
pub fn wrap_and_pad(text: &str, style: WrapStyle, width: usize, gap: usize, indent: usize) -> Vec<String> {
    wrap_lines(text, style, width, gap, indent)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let occupied = char_len(&line) + if i == 0 { gap } else { 0 };
            let padding = width.saturating_sub(occupied);
            format!("{}{}", line, " ".repeat(padding))
        })
        .collect()
}

fn indent_and_connect(mut lines: Vec<String>, prefix_len: usize) -> Vec<String> {
    let prefix = " ".repeat(prefix_len);
    for line in lines.iter_mut().skip(1) {
        line.insert_str(0, &prefix);
    }
    lines
}

/// Word-based wrapping. A word moves to the next line only when the current
/// line already holds something, so a word wider than the line stays whole.
fn greedy(text: &str, width: usize, gap: usize, indent: usize, justify: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line: Vec<String> = Vec::new();
    let mut used = gap;

    for word in text.split_whitespace() {
        let word_len = char_len(word);
        if !line.is_empty() && used + word_len > width {
            if justify {
                // `used` counts one trailing space past the last word.
                justify_line(&mut line, width.saturating_sub(used - 1));
            }
            lines.push(line.join(" "));
            line.clear();
            used = gap + indent;
        }
        line.push(word.to_string());
        used += word_len + 1;
    }

    lines.push(line.join(" "));
    lines
}

/// Spreads `filling` extra spaces over the gaps between words, left to right.
fn justify_line(words: &mut [String], filling: usize) {
    let slots = words.len().saturating_sub(1);
    if slots == 0 {
        return;
    }
    for i in 0..filling {
        if let Some(word) = words.get_mut(i % slots) {
            word.push(' ');
        }
    }
}

/// Slices the raw text at the column boundary, ignoring word boundaries.
fn cut(text: &str, width: usize, gap: usize, indent: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let first_len = width.saturating_sub(gap).max(1);
    let rest_len = width.saturating_sub(gap + indent).max(1);

    let mut lines = Vec::new();
    let mut pos = 0;
    let mut slice_len = first_len;
    while pos < chars.len() {
        let end = (pos + slice_len).min(chars.len());
        let slice: String = chars.get(pos..end).unwrap_or_default().iter().collect();
        lines.push(mark_forced_break(&slice));

        pos = end;
        while chars.get(pos).is_some_and(|c| c.is_whitespace()) {
            pos += 1;
        }
        slice_len = rest_len;
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// A slice that ends on a space doubles its first space, so the break point
/// survives copy-paste once the line is trimmed.
fn mark_forced_break(slice: &str) -> String {
    if slice.ends_with(' ') {
        slice.replacen(' ', "  ", 1).trim().to_string()
    } else {
        slice.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "the quick brown fox jumps over the lazy dog while a very \
                          patient observer quietly takes extensive notes about everything";

    #[test]
    fn test_greedy_breaks_on_word_boundary() {
        let lines = wrap_lines("one two three four", WrapStyle::Regular, 10, 0, 0);
        assert_eq!(lines, vec!["one two", "three four"]);
    }

    #[test]
    fn test_short_text_is_returned_unchanged() {
        let text = "  keeps   its  spacing ";
        assert_eq!(wrap_lines(text, WrapStyle::Justify, 79, 3, 0), vec![text]);
    }

    #[test]
    fn test_empty_text_gives_one_empty_line() {
        for style in [WrapStyle::Regular, WrapStyle::Justify, WrapStyle::Cut] {
            assert_eq!(wrap_lines("", style, 10, 4, 2), vec![String::new()]);
        }
    }

    #[test]
    fn test_following_lines_carry_gap_and_indent() {
        let lines = wrap_lines("aaa bbb ccc ddd", WrapStyle::Regular, 9, 2, 1);
        assert_eq!(lines, vec!["aaa bbb", "   ccc", "   ddd"]);
    }

    #[test]
    fn test_no_line_exceeds_width_and_no_word_is_split() {
        for style in [WrapStyle::Regular, WrapStyle::Justify] {
            for width in 16..40 {
                for gap in 0..4 {
                    for indent in 0..3 {
                        if width <= gap + indent {
                            continue;
                        }
                        let lines = wrap_lines(SAMPLE, style, width, gap, indent);
                        // --- Assert: widths ---
                        assert!(char_len(&lines[0]) + gap <= width, "{:?} {}", style, width);
                        for line in &lines[1..] {
                            assert!(char_len(line) <= width, "{:?} {} {:?}", style, width, line);
                        }
                        // --- Assert: words survive intact and in order ---
                        let rejoined: Vec<&str> =
                            lines.iter().flat_map(|l| l.split_whitespace()).collect();
                        let original: Vec<&str> = SAMPLE.split_whitespace().collect();
                        assert_eq!(rejoined, original);
                    }
                }
            }
        }
    }

    #[test]
    fn test_justified_lines_fill_the_width_exactly() {
        for width in 15..40 {
            let gap = 3;
            let lines = wrap_lines(SAMPLE, WrapStyle::Justify, width, gap, 0);
            let last = lines.len() - 1;
            for (i, line) in lines.iter().enumerate() {
                if i == last || line.split_whitespace().count() < 2 {
                    continue;
                }
                let occupied = char_len(line) + if i == 0 { gap } else { 0 };
                assert_eq!(occupied, width, "line {} of width {}: {:?}", i, width, line);
            }
        }
    }

    #[test]
    fn test_justify_distributes_spaces_from_the_left() {
        let lines = wrap_lines("aa bb cc dddddddddd", WrapStyle::Justify, 12, 0, 0);
        assert_eq!(lines[0], "aa   bb   cc");
    }

    #[test]
    fn test_cut_slices_regardless_of_words() {
        let lines = wrap_lines("abcdefghij klmnopqrst", WrapStyle::Cut, 8, 0, 0);
        assert_eq!(lines, vec!["abcdefgh", "ij klmno", "pqrst"]);
    }

    #[test]
    fn test_cut_doubles_space_before_forced_break() {
        let lines = wrap_lines("ab cdef ghij", WrapStyle::Cut, 8, 0, 0);
        assert_eq!(lines, vec!["ab  cdef", "ghij"]);
    }

    #[test]
    fn test_wrap_and_pad_gives_a_rectangle() {
        let lines = wrap_and_pad("one two three four five", WrapStyle::Regular, 12, 2, 0);
        assert_eq!(char_len(&lines[0]) + 2, 12);
        for line in &lines[1..] {
            assert_eq!(char_len(line), 12);
        }
    }
}
