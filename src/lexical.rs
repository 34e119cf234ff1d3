//! Vocabulary-level statistics for word comparisons.

use crate::models::{CapitalizedWordChanges, EditOperation, WordMetrics};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Word counts after stripping symbols other than apostrophes.
pub fn word_frequencies(tokens: &[&str], keep_capitalization: bool) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for token in tokens {
        let cleaned: String = token
            .chars()
            .filter(|&c| c.is_alphanumeric() || c == '_' || c == '\'' || c.is_whitespace())
            .collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }
        let word = if keep_capitalization {
            cleaned.to_string()
        } else {
            cleaned.to_lowercase()
        };
        *freq.entry(word).or_insert(0) += 1;
    }
    freq
}

/// Jaccard index of the lowercased token sets, in percent.
pub fn jaccard_similarity(tokens1: &[&str], tokens2: &[&str]) -> f64 {
    let set_a: HashSet<String> = tokens1.iter().map(|t| t.to_lowercase()).collect();
    let set_b: HashSet<String> = tokens2.iter().map(|t| t.to_lowercase()).collect();

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64 * 100.0
    }
}

/// Cosine of the two word-frequency vectors, in percent.
pub fn cosine_similarity(freq1: &HashMap<String, usize>, freq2: &HashMap<String, usize>) -> f64 {
    let dot: f64 = freq1
        .iter()
        .filter_map(|(word, &a)| freq2.get(word).map(|&b| (a * b) as f64))
        .sum();
    let magnitude = |freq: &HashMap<String, usize>| {
        freq.values()
            .map(|&n| (n * n) as f64)
            .sum::<f64>()
            .sqrt()
    };
    let (m1, m2) = (magnitude(freq1), magnitude(freq2));

    if m1 == 0.0 || m2 == 0.0 {
        0.0
    } else {
        dot / (m1 * m2) * 100.0
    }
}

/// Shared vocabulary over the mean vocabulary size, in percent.
pub fn vocabulary_overlap(freq1: &HashMap<String, usize>, freq2: &HashMap<String, usize>) -> f64 {
    let common = freq1.keys().filter(|w| freq2.contains_key(*w)).count();
    let average = (freq1.len() + freq2.len()) as f64 / 2.0;
    if average == 0.0 {
        0.0
    } else {
        common as f64 / average * 100.0
    }
}

/// Distinct words over total words, in percent.
pub fn type_token_ratio(freq: &HashMap<String, usize>, total_words: usize) -> f64 {
    if total_words == 0 {
        0.0
    } else {
        freq.len() as f64 / total_words as f64 * 100.0
    }
}

/// Mean characters per word.
pub fn average_word_length(freq: &HashMap<String, usize>) -> f64 {
    let (chars, words) = freq
        .iter()
        .fold((0usize, 0usize), |(chars, words), (word, &n)| {
            (chars + word.chars().count() * n, words + n)
        });
    if words == 0 {
        0.0
    } else {
        chars as f64 / words as f64
    }
}

/// Number of words of each length (in characters).
pub fn word_length_distribution(freq: &HashMap<String, usize>) -> BTreeMap<usize, usize> {
    let mut distribution = BTreeMap::new();
    for (word, &n) in freq {
        *distribution.entry(word.chars().count()).or_insert(0) += n;
    }
    distribution
}

/// Occurrences of every character in a text, whitespace included.
pub fn character_counts(text: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for c in text.chars() {
        *counts.entry(c.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Match capitalized words between two token lists by count.
///
/// A word with an uppercase letter seen `n1` times in text 1 and `n2` times
/// in text 2 contributes `min(n1, n2)` unchanged, and the surplus on either
/// side as removed or added.
pub fn capitalized_word_changes(tokens1: &[&str], tokens2: &[&str]) -> CapitalizedWordChanges {
    let capitalized = |tokens: &[&str]| {
        let mut freq: BTreeMap<String, usize> = BTreeMap::new();
        for token in tokens.iter().filter(|t| t.chars().any(char::is_uppercase)) {
            *freq.entry(token.to_string()).or_insert(0) += 1;
        }
        freq
    };
    let freq1 = capitalized(tokens1);
    let freq2 = capitalized(tokens2);

    let mut changes = CapitalizedWordChanges::default();
    let words: BTreeSet<&String> = freq1.keys().chain(freq2.keys()).collect();
    for word in words {
        let n1 = freq1.get(word).copied().unwrap_or(0);
        let n2 = freq2.get(word).copied().unwrap_or(0);
        let kept = n1.min(n2);

        if n1 > kept {
            changes.removed += n1 - kept;
            changes.removed_words.insert(word.clone(), n1 - kept);
        }
        if n2 > kept {
            changes.added += n2 - kept;
            changes.added_words.insert(word.clone(), n2 - kept);
        }
        if kept > 0 {
            changes.unchanged += kept;
            changes.unchanged_words.insert(word.clone(), kept);
        }
    }
    changes
}

/// Substitution, deletion, and insertion counts of a word edit script.
pub fn count_edits(ops: &[EditOperation]) -> (usize, usize, usize) {
    ops.iter().fold((0, 0, 0), |(s, d, i), op| match op {
        EditOperation::Substitution { .. } => (s + 1, d, i),
        EditOperation::Deletion { .. } => (s, d + 1, i),
        EditOperation::Insertion { .. } => (s, d, i + 1),
        EditOperation::Equal { .. } => (s, d, i),
    })
}

/// Word statistics from whitespace-free token lists and their edit script.
pub fn word_metrics(
    tokens1: &[&str],
    tokens2: &[&str],
    ops: &[EditOperation],
    keep_capitalization: bool,
) -> WordMetrics {
    let (substitutions, deletions, insertions) = count_edits(ops);
    let freq1 = word_frequencies(tokens1, keep_capitalization);
    let freq2 = word_frequencies(tokens2, keep_capitalization);

    WordMetrics {
        words1: tokens1.len(),
        words2: tokens2.len(),
        substitutions,
        deletions,
        insertions,
        jaccard_similarity: jaccard_similarity(tokens1, tokens2),
        cosine_similarity: cosine_similarity(&freq1, &freq2),
        vocabulary_overlap: vocabulary_overlap(&freq1, &freq2),
        type_token_ratio1: type_token_ratio(&freq1, tokens1.len()),
        type_token_ratio2: type_token_ratio(&freq2, tokens2.len()),
        average_word_length1: average_word_length(&freq1),
        average_word_length2: average_word_length(&freq2),
        word_length_distribution1: word_length_distribution(&freq1),
        word_length_distribution2: word_length_distribution(&freq2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_frequencies_cleans_tokens() {
        let freq = word_frequencies(&["The", "cat's", "the,", "--"], false);
        assert_eq!(freq.get("the"), Some(&2));
        assert_eq!(freq.get("cat's"), Some(&1));
        assert_eq!(freq.len(), 2);

        let freq = word_frequencies(&["The", "the"], true);
        assert_eq!(freq.len(), 2);
    }

    #[test]
    fn test_jaccard_similarity() {
        // {the, quick, fox} vs {the, slow, fox}: 2 / 4
        let similarity = jaccard_similarity(&["the", "quick", "fox"], &["The", "slow", "fox"]);
        assert!((similarity - 50.0).abs() < 0.001);
        assert_eq!(jaccard_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_similarity() {
        let freq1 = word_frequencies(&["a", "b"], true);
        let freq2 = word_frequencies(&["a", "b"], true);
        assert!((cosine_similarity(&freq1, &freq2) - 100.0).abs() < 0.001);

        let freq3 = word_frequencies(&["c"], true);
        assert!(cosine_similarity(&freq1, &freq3) < 0.001);
        assert_eq!(cosine_similarity(&freq1, &HashMap::new()), 0.0);
    }

    #[test]
    fn test_vocabulary_and_ttr() {
        let freq1 = word_frequencies(&["a", "a", "b"], true);
        let freq2 = word_frequencies(&["b", "c"], true);
        assert!((vocabulary_overlap(&freq1, &freq2) - 50.0).abs() < 0.001);
        assert!((type_token_ratio(&freq1, 3) - 66.667).abs() < 0.001);
        assert_eq!(type_token_ratio(&freq1, 0), 0.0);
        assert!((average_word_length(&word_frequencies(&["ab", "abcd"], true)) - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_word_metrics() {
        let ops = vec![
            EditOperation::Equal {
                text: "the".to_string(),
            },
            EditOperation::Substitution {
                text1: "quick".to_string(),
                text2: "slow".to_string(),
            },
            EditOperation::Equal {
                text: "fox".to_string(),
            },
        ];
        let metrics = word_metrics(&["the", "quick", "fox"], &["the", "slow", "fox"], &ops, true);
        assert_eq!(metrics.words1, 3);
        assert_eq!(
            (metrics.substitutions, metrics.deletions, metrics.insertions),
            (1, 0, 0)
        );
        assert!((metrics.type_token_ratio1 - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_word_length_distribution() {
        let freq = word_frequencies(&["in", "the", "the", "beginning"], true);
        let distribution = word_length_distribution(&freq);
        assert_eq!(distribution.get(&2), Some(&1));
        assert_eq!(distribution.get(&3), Some(&2));
        assert_eq!(distribution.get(&9), Some(&1));
        assert_eq!(distribution.len(), 3);
    }

    #[test]
    fn test_character_counts() {
        let counts = character_counts("Aña a");
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("A"), Some(&1));
        assert_eq!(counts.get("ñ"), Some(&1));
        assert_eq!(counts.get(" "), Some(&1));
    }

    #[test]
    fn test_capitalized_word_changes() {
        let changes = capitalized_word_changes(
            &["Rome", "Rome", "Caesar", "said", "Hail"],
            &["Rome", "caesar", "said", "Hail", "Brutus"],
        );
        assert_eq!(changes.unchanged, 2); // Rome, Hail
        assert_eq!(changes.removed, 2); // one Rome, Caesar
        assert_eq!(changes.added, 1); // Brutus
        assert_eq!(changes.removed_words.get("Rome"), Some(&1));
        assert_eq!(changes.removed_words.get("Caesar"), Some(&1));
        assert_eq!(changes.added_words.get("Brutus"), Some(&1));
        assert_eq!(changes.unchanged_words.get("Hail"), Some(&1));
        assert!(!changes.added_words.contains_key("caesar"));
    }
}
