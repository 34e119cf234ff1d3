//! Normalization of historical and OCR text before comparison.
//!
//! Transformations run in a fixed order, and each sees the output of the
//! previous one:
//! 1. logograms, ligatures, archaic letters, u/v/w digraphs (table folds)
//! 2. u → v, then j → i
//! 3. case folding, punctuation stripping
//! 4. whitespace policy

use crate::models::{Granularity, NormalizationOptions};

/// Abbreviation signs and their expansions.
pub const LOGOGRAMS: &[(&str, &str)] = &[
    ("&", "and"),
    ("\u{204A}", "et"),
    ("\u{A751}", "per"),
    ("\u{A753}", "pro"),
    ("\u{A757}", "que"),
    ("\u{A76F}", "con"),
];

/// Typographic ligatures and their letter sequences.
pub const LIGATURES: &[(&str, &str)] = &[
    ("Æ", "AE"),
    ("æ", "ae"),
    ("Œ", "OE"),
    ("œ", "oe"),
    ("Ĳ", "IJ"),
    ("ĳ", "ij"),
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{FB05}", "st"),
    ("\u{FB06}", "st"),
];

/// Letter forms that fell out of use (long s, r rotunda).
pub const ARCHAIC_LETTERS: &[(&str, &str)] = &[("\u{017F}", "s"), ("\u{A75B}", "r")];

/// Doubled u/v spellings of w.
pub const UVW_FORMS: &[(&str, &str)] = &[
    ("uu", "w"),
    ("UU", "W"),
    ("Uu", "W"),
    ("uU", "W"),
    ("vv", "w"),
    ("VV", "W"),
    ("Vv", "W"),
    ("vV", "W"),
];

/// Characters removed when punctuation is excluded.
pub const PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '?', '$', '%', '\\', '^', '&', '*', ';', ':', '{', '}', '=', '-',
    '_', '`', '~', '(', ')', '\'', '"', '[', ']', '<', '>', '|', '¡', '¿', '†', '‡', '…', '–',
    '—',
];

/// Every variant form with its expansion, in table order.
pub fn all_variant_forms() -> impl Iterator<Item = &'static (&'static str, &'static str)> {
    LOGOGRAMS
        .iter()
        .chain(LIGATURES)
        .chain(ARCHAIC_LETTERS)
        .chain(UVW_FORMS)
}

#[inline]
pub fn is_punctuation(c: char) -> bool {
    PUNCTUATION.contains(&c)
}

fn fold_table(text: String, table: &[(&str, &str)]) -> String {
    table.iter().fold(text, |acc, &(form, expansion)| {
        if acc.contains(form) {
            acc.replace(form, expansion)
        } else {
            acc
        }
    })
}

/// Apply the enabled transformations to `text`.
///
/// Whitespace handling: collapsing wins over keeping; with neither set,
/// character comparisons drop whitespace entirely while word comparisons
/// leave it for the tokenizer.
pub fn normalize(text: &str, options: &NormalizationOptions, granularity: Granularity) -> String {
    let mut out = text.to_string();

    if options.fold_logograms {
        out = fold_table(out, LOGOGRAMS);
    }
    if options.fold_ligatures {
        out = fold_table(out, LIGATURES);
    }
    if options.fold_archaic_letters {
        out = fold_table(out, ARCHAIC_LETTERS);
    }
    if options.normalize_uv_w {
        out = fold_table(out, UVW_FORMS);
    }

    if options.fold_u_to_v {
        out = out.replace('u', "v").replace('U', "V");
    }
    if options.fold_j_to_i {
        out = out.replace('j', "i").replace('J', "I");
    }

    if !options.keep_capitalization {
        out = out.to_lowercase();
    }
    if !options.keep_punctuation {
        out.retain(|c| !is_punctuation(c));
    }

    if options.collapse_whitespace {
        out = out.split_whitespace().collect::<Vec<_>>().join(" ");
    } else if options.keep_whitespace {
        out.retain(|c| c != '\r');
    } else if granularity == Granularity::Character {
        out.retain(|c| !c.is_whitespace());
    }

    out
}
