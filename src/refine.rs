//! Turning raw diff chunks into a typed edit script.

use crate::diff::{diff_chars, diff_tokens, DiffError, DiffOp};
use crate::models::{ComparisonParams, EditOperation, Granularity};
use crate::normalize::normalize;
use crate::tokenize::tokenize;
use tracing::{debug, warn};

/// Classify raw `(op, text)` items, merging each adjacent delete/insert
/// pair (in either order) into a substitution.
pub fn refine(raw: Vec<(DiffOp, String)>) -> Vec<EditOperation> {
    let mut ops = Vec::with_capacity(raw.len());
    let mut iter = raw.into_iter().peekable();

    while let Some((op, text)) = iter.next() {
        let refined = match op {
            DiffOp::Equal => EditOperation::Equal { text },
            DiffOp::Delete => match iter.next_if(|(next, _)| *next == DiffOp::Insert) {
                Some((_, inserted)) => EditOperation::Substitution {
                    text1: text,
                    text2: inserted,
                },
                None => EditOperation::Deletion { text },
            },
            DiffOp::Insert => match iter.next_if(|(next, _)| *next == DiffOp::Delete) {
                Some((_, deleted)) => EditOperation::Substitution {
                    text1: deleted,
                    text2: text,
                },
                None => EditOperation::Insertion { text },
            },
        };
        ops.push(refined);
    }

    ops
}

/// Drop changes whose both sides are blank after trimming.
pub fn drop_blank_changes(ops: Vec<EditOperation>) -> Vec<EditOperation> {
    let blank = |side: Option<&str>| side.map_or(true, |t| t.trim().is_empty());
    ops.into_iter()
        .filter(|op| !(op.is_change() && blank(op.text1()) && blank(op.text2())))
        .collect()
}

/// Edit script for two raw texts: normalize, tokenize, diff, refine.
///
/// A diff that exceeds its deadline yields an empty script.
pub fn edit_script(text1: &str, text2: &str, params: &ComparisonParams) -> Vec<EditOperation> {
    let norm1 = normalize(text1, &params.options, params.granularity);
    let norm2 = normalize(text2, &params.options, params.granularity);
    edit_script_normalized(&norm1, &norm2, params)
}

/// Edit script for texts that are already normalized under `params`.
pub fn edit_script_normalized(
    norm1: &str,
    norm2: &str,
    params: &ComparisonParams,
) -> Vec<EditOperation> {
    match try_edit_script_normalized(norm1, norm2, params) {
        Ok(ops) => ops,
        Err(e) => {
            warn!("Diff abandoned, returning empty edit script: {}", e);
            Vec::new()
        }
    }
}

pub fn try_edit_script_normalized(
    norm1: &str,
    norm2: &str,
    params: &ComparisonParams,
) -> Result<Vec<EditOperation>, DiffError> {
    let ops = match params.granularity {
        Granularity::Word => {
            let tokens1 = tokenize(norm1, Granularity::Word, &params.options);
            let tokens2 = tokenize(norm2, Granularity::Word, &params.options);
            let chunks = diff_tokens(&tokens1, &tokens2, &params.diff)?;

            // one raw item per token
            let raw = chunks
                .into_iter()
                .flat_map(|chunk| {
                    let op = chunk.op;
                    chunk.items.into_iter().map(move |t| (op, t.to_string()))
                })
                .collect();
            let ops = refine(raw);
            if params.options.keep_whitespace {
                ops
            } else {
                drop_blank_changes(ops)
            }
        }
        Granularity::Character => {
            let chunks = diff_chars(norm1, norm2, &params.diff)?;
            refine(chunks.iter().map(|c| (c.op, c.text())).collect())
        }
    };

    debug!(
        "Edit script: {} operations, {} changes",
        ops.len(),
        ops.iter().filter(|op| op.is_change()).count()
    );
    Ok(ops)
}
