//! Splitting normalized text into comparison units.

use crate::models::{Granularity, NormalizationOptions};

/// Split `text` into tokens borrowed from it.
///
/// Word granularity with whitespace kept yields alternating word and
/// whitespace runs, with each newline that begins a run standing alone.
/// Without whitespace, words are split on whitespace and empties dropped.
/// Character granularity yields one token per character.
pub fn tokenize<'a>(
    text: &'a str,
    granularity: Granularity,
    options: &NormalizationOptions,
) -> Vec<&'a str> {
    match granularity {
        Granularity::Word if options.keep_whitespace => split_keeping_whitespace(text),
        Granularity::Word => text.split_whitespace().collect(),
        Granularity::Character => text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect(),
    }
}

fn split_keeping_whitespace(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == '\n' {
            tokens.push(&text[start..start + 1]);
            continue;
        }

        let in_space = c.is_whitespace();
        let mut end = start + c.len_utf8();
        while let Some(&(i, next)) = chars.peek() {
            if next.is_whitespace() != in_space {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }
        tokens.push(&text[start..end]);
    }

    tokens
}

/// Number of whitespace-delimited words.
#[inline]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
