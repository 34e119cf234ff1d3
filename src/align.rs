//! Character alignment derived from an edit script.
//!
//! Every character of both normalized texts appears in exactly one pair, in
//! order. Substitutions of unequal length are padded with the absent marker
//! (`None`) on the shorter side.

use crate::models::{AlignmentPair, EditOperation};
use tracing::debug;

/// Expand an edit script into position-aligned character pairs.
///
/// # Arguments
/// * `ops` - Edit operations in text order
///
/// Equal text pairs each character with itself; deletions and insertions
/// pair with the absent marker; substitutions pair position by position.
pub fn character_alignment(ops: &[EditOperation]) -> Vec<AlignmentPair> {
    let mut pairs = Vec::with_capacity(ops.len());

    for op in ops {
        match op {
            EditOperation::Equal { text } => {
                pairs.extend(text.chars().map(|c| AlignmentPair::new(Some(c), Some(c))));
            }
            EditOperation::Deletion { text } => {
                pairs.extend(text.chars().map(|c| AlignmentPair::new(Some(c), None)));
            }
            EditOperation::Insertion { text } => {
                pairs.extend(text.chars().map(|c| AlignmentPair::new(None, Some(c))));
            }
            EditOperation::Substitution { text1, text2 } => {
                let mut left = text1.chars();
                let mut right = text2.chars();
                loop {
                    match (left.next(), right.next()) {
                        (None, None) => break,
                        (a, b) => pairs.push(AlignmentPair::new(a, b)),
                    }
                }
            }
        }
    }

    debug!(
        "Aligned {} character pairs ({} mismatched)",
        pairs.len(),
        pairs.iter().filter(|p| p.char1 != p.char2).count()
    );
    pairs
}

/// Counts of pair kinds in an alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub matches: usize,
    pub mismatches: usize,
    pub gaps1: usize, // absent on the text1 side
    pub gaps2: usize, // absent on the text2 side
}

#[inline]
pub fn summarize_alignment(pairs: &[AlignmentPair]) -> AlignmentSummary {
    pairs
        .iter()
        .fold(AlignmentSummary::default(), |mut acc, pair| {
            match (pair.char1, pair.char2) {
                (Some(a), Some(b)) if a == b => acc.matches += 1,
                (Some(_), Some(_)) => acc.mismatches += 1,
                (None, _) => acc.gaps1 += 1,
                (_, None) => acc.gaps2 += 1,
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_eq(s: &str) -> EditOperation {
        EditOperation::Equal {
            text: s.to_string(),
        }
    }

    #[test]
    fn test_equal_and_substitution() {
        let ops = vec![
            op_eq("c"),
            EditOperation::Substitution {
                text1: "a".to_string(),
                text2: "o".to_string(),
            },
            op_eq("t"),
        ];
        let pairs = character_alignment(&ops);
        assert_eq!(
            pairs,
            vec![
                AlignmentPair::new(Some('c'), Some('c')),
                AlignmentPair::new(Some('a'), Some('o')),
                AlignmentPair::new(Some('t'), Some('t')),
            ]
        );
    }

    #[test]
    fn test_unequal_substitution_is_padded() {
        let ops = vec![EditOperation::Substitution {
            text1: "æ".to_string(),
            text2: "ae".to_string(),
        }];
        assert_eq!(
            character_alignment(&ops),
            vec![
                AlignmentPair::new(Some('æ'), Some('a')),
                AlignmentPair::new(None, Some('e')),
            ]
        );
    }

    #[test]
    fn test_gaps() {
        let ops = vec![
            EditOperation::Deletion {
                text: "ab".to_string(),
            },
            EditOperation::Insertion {
                text: "c".to_string(),
            },
        ];
        let pairs = character_alignment(&ops);
        let summary = summarize_alignment(&pairs);
        assert_eq!(summary.gaps2, 2);
        assert_eq!(summary.gaps1, 1);
        assert_eq!(summary.matches + summary.mismatches, 0);
    }

    #[test]
    fn test_every_character_appears_once() {
        let ops = vec![
            op_eq("the "),
            EditOperation::Substitution {
                text1: "quick".to_string(),
                text2: "slow".to_string(),
            },
            op_eq(" fox"),
        ];
        let pairs = character_alignment(&ops);
        let left: String = pairs.iter().filter_map(|p| p.char1).collect();
        let right: String = pairs.iter().filter_map(|p| p.char2).collect();
        assert_eq!(left, "the quick fox");
        assert_eq!(right, "the slow fox");
        assert_eq!(pairs.len(), 13);
    }

    #[test]
    fn test_empty_script() {
        assert!(character_alignment(&[]).is_empty());
        assert_eq!(summarize_alignment(&[]), AlignmentSummary::default());
    }
}
