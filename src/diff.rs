//! Minimal-edit sequence diff with merge and semantic cleanup.
//!
//! The engine works over any slice of comparable items. Character diffs run
//! over `char`s; word diffs intern each distinct token to a `u32` id so that
//! vocabulary size is unbounded and comparisons stay cheap.
//!
//! The core is Myers' O(ND) algorithm in its linear-space bisection form:
//! trim the common prefix and suffix, handle the trivial shapes directly,
//! then find the middle snake and recurse on both halves.

use crate::models::DiffSettings;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("diff exceeded its {0} ms deadline")]
    Timeout(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffOp {
    Equal,
    Delete,
    Insert,
}

/// A run of items sharing one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<T> {
    pub op: DiffOp,
    pub items: Vec<T>,
}

impl<T> Chunk<T> {
    pub fn new(op: DiffOp, items: Vec<T>) -> Self {
        Self { op, items }
    }
}

impl Chunk<char> {
    pub fn text(&self) -> String {
        self.items.iter().collect()
    }
}

struct Deadline {
    at: Option<Instant>,
    budget_ms: u64,
}

impl Deadline {
    fn new(timeout_ms: Option<u64>) -> Self {
        Self {
            at: timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms)),
            budget_ms: timeout_ms.unwrap_or(0),
        }
    }

    #[inline]
    fn check(&self) -> Result<(), DiffError> {
        match self.at {
            Some(at) if Instant::now() >= at => Err(DiffError::Timeout(self.budget_ms)),
            _ => Ok(()),
        }
    }
}

/// Diff two sequences into a merged chunk list.
///
/// Equal-run lengths sum to the longest common subsequence found by the
/// bisection; adjacent chunks never share an operation and a Delete always
/// precedes the Insert it sits next to.
pub fn diff_main<T: PartialEq + Clone>(
    a: &[T],
    b: &[T],
    settings: &DiffSettings,
) -> Result<Vec<Chunk<T>>, DiffError> {
    let deadline = Deadline::new(settings.timeout_ms);
    let mut chunks = diff_inner(a, b, &deadline)?;
    cleanup_merge(&mut chunks);
    Ok(chunks)
}

/// Character diff of two strings, with semantic cleanup when enabled.
pub fn diff_chars(
    text1: &str,
    text2: &str,
    settings: &DiffSettings,
) -> Result<Vec<Chunk<char>>, DiffError> {
    let a: Vec<char> = text1.chars().collect();
    let b: Vec<char> = text2.chars().collect();
    let mut chunks = diff_main(&a, &b, settings)?;
    if settings.semantic_cleanup {
        cleanup_semantic(&mut chunks);
    }
    Ok(chunks)
}

/// Token diff: each distinct token gets an id, the id sequences are diffed,
/// and the chunks are mapped back to the borrowed tokens.
pub fn diff_tokens<'a>(
    tokens1: &[&'a str],
    tokens2: &[&'a str],
    settings: &DiffSettings,
) -> Result<Vec<Chunk<&'a str>>, DiffError> {
    let mut ids: HashMap<&str, u32> = HashMap::new();
    let mut vocab: Vec<&'a str> = Vec::new();
    let mut intern = |token: &'a str| -> u32 {
        *ids.entry(token).or_insert_with(|| {
            vocab.push(token);
            (vocab.len() - 1) as u32
        })
    };

    let a: Vec<u32> = tokens1.iter().map(|&t| intern(t)).collect();
    let b: Vec<u32> = tokens2.iter().map(|&t| intern(t)).collect();

    let chunks = diff_main(&a, &b, settings)?;
    Ok(chunks
        .into_iter()
        .map(|chunk| {
            Chunk::new(
                chunk.op,
                chunk.items.iter().map(|&id| vocab[id as usize]).collect(),
            )
        })
        .collect())
}

fn diff_inner<T: PartialEq + Clone>(
    a: &[T],
    b: &[T],
    deadline: &Deadline,
) -> Result<Vec<Chunk<T>>, DiffError> {
    if a == b {
        let mut chunks = Vec::new();
        push_nonempty(&mut chunks, DiffOp::Equal, a);
        return Ok(chunks);
    }

    let prefix = common_prefix(a, b);
    let (a_rest, b_rest) = (&a[prefix..], &b[prefix..]);
    let suffix = common_suffix(a_rest, b_rest);
    let a_mid = &a_rest[..a_rest.len() - suffix];
    let b_mid = &b_rest[..b_rest.len() - suffix];

    let mut chunks = Vec::new();
    push_nonempty(&mut chunks, DiffOp::Equal, &a[..prefix]);
    chunks.extend(compute(a_mid, b_mid, deadline)?);
    push_nonempty(&mut chunks, DiffOp::Equal, &a_rest[a_rest.len() - suffix..]);
    Ok(chunks)
}

fn compute<T: PartialEq + Clone>(
    a: &[T],
    b: &[T],
    deadline: &Deadline,
) -> Result<Vec<Chunk<T>>, DiffError> {
    if a.is_empty() {
        return Ok(vec![Chunk::new(DiffOp::Insert, b.to_vec())]);
    }
    if b.is_empty() {
        return Ok(vec![Chunk::new(DiffOp::Delete, a.to_vec())]);
    }

    let (long, short, op) = if a.len() > b.len() {
        (a, b, DiffOp::Delete)
    } else {
        (b, a, DiffOp::Insert)
    };

    // shorter sequence sits inside the longer one
    if let Some(pos) = find_subslice(long, short) {
        let mut chunks = Vec::with_capacity(3);
        push_nonempty(&mut chunks, op, &long[..pos]);
        push_nonempty(&mut chunks, DiffOp::Equal, short);
        push_nonempty(&mut chunks, op, &long[pos + short.len()..]);
        return Ok(chunks);
    }

    // single item that is not in the other side
    if short.len() == 1 {
        return Ok(vec![
            Chunk::new(DiffOp::Delete, a.to_vec()),
            Chunk::new(DiffOp::Insert, b.to_vec()),
        ]);
    }

    bisect(a, b, deadline)
}

/// Find the middle snake of the edit graph and split there.
fn bisect<T: PartialEq + Clone>(
    a: &[T],
    b: &[T],
    deadline: &Deadline,
) -> Result<Vec<Chunk<T>>, DiffError> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2;
    let v_offset = max_d;
    let v_length = 2 * max_d;
    let mut v1 = vec![-1isize; v_length as usize];
    let mut v2 = vec![-1isize; v_length as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = n - m;
    // odd delta: forward path detects the overlap
    let front = delta % 2 != 0;

    let (mut k1start, mut k1end, mut k2start, mut k2end) = (0isize, 0isize, 0isize, 0isize);

    for d in 0..max_d {
        deadline.check()?;

        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 >= 0 && y1 >= 0 && x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;

            if x1 > n {
                k1end += 2;
            } else if y1 > m {
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                    let x2 = n - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return bisect_split(a, b, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 >= 0
                && y2 >= 0
                && x2 < n
                && y2 < m
                && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;

            if x2 > n {
                k2end += 2;
            } else if y2 > m {
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    if x1 >= n - x2 {
                        return bisect_split(a, b, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k2 += 2;
        }
    }

    // no commonality at all
    Ok(vec![
        Chunk::new(DiffOp::Delete, a.to_vec()),
        Chunk::new(DiffOp::Insert, b.to_vec()),
    ])
}

fn bisect_split<T: PartialEq + Clone>(
    a: &[T],
    b: &[T],
    x: usize,
    y: usize,
    deadline: &Deadline,
) -> Result<Vec<Chunk<T>>, DiffError> {
    let mut chunks = diff_inner(&a[..x], &b[..y], deadline)?;
    chunks.extend(diff_inner(&a[x..], &b[y..], deadline)?);
    Ok(chunks)
}

#[inline]
fn push_nonempty<T: Clone>(chunks: &mut Vec<Chunk<T>>, op: DiffOp, items: &[T]) {
    if !items.is_empty() {
        chunks.push(Chunk::new(op, items.to_vec()));
    }
}

#[inline]
fn common_prefix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[inline]
fn common_suffix<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Longest suffix of `a` that is also a prefix of `b`.
fn common_overlap<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let max = a.len().min(b.len());
    (1..=max)
        .rev()
        .find(|&k| a[a.len() - k..] == b[..k])
        .unwrap_or(0)
}

fn find_subslice<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn push_equal<T>(chunks: &mut Vec<Chunk<T>>, mut items: Vec<T>) {
    if items.is_empty() {
        return;
    }
    match chunks.last_mut() {
        Some(last) if last.op == DiffOp::Equal => last.items.append(&mut items),
        _ => chunks.push(Chunk::new(DiffOp::Equal, items)),
    }
}

/// Coalesce runs, factor shared affixes out of paired edits, and slide
/// single edits sideways when that lets neighbouring equalities merge.
pub fn cleanup_merge<T: PartialEq + Clone>(chunks: &mut Vec<Chunk<T>>) {
    loop {
        merge_runs(chunks);
        if !shift_single_edits(chunks) {
            break;
        }
    }
}

fn merge_runs<T: PartialEq + Clone>(chunks: &mut Vec<Chunk<T>>) {
    let mut merged: Vec<Chunk<T>> = Vec::with_capacity(chunks.len());
    let mut deleted: Vec<T> = Vec::new();
    let mut inserted: Vec<T> = Vec::new();

    for chunk in chunks.drain(..) {
        match chunk.op {
            DiffOp::Delete => deleted.extend(chunk.items),
            DiffOp::Insert => inserted.extend(chunk.items),
            DiffOp::Equal => {
                let mut equal = chunk.items;
                flush_edits(&mut merged, &mut deleted, &mut inserted, Some(&mut equal));
                push_equal(&mut merged, equal);
            }
        }
    }
    flush_edits(&mut merged, &mut deleted, &mut inserted, None);

    *chunks = merged;
}

fn flush_edits<T: PartialEq + Clone>(
    merged: &mut Vec<Chunk<T>>,
    deleted: &mut Vec<T>,
    inserted: &mut Vec<T>,
    next_equal: Option<&mut Vec<T>>,
) {
    let mut trailing = Vec::new();

    if !deleted.is_empty() && !inserted.is_empty() {
        let prefix = common_prefix(deleted, inserted);
        if prefix > 0 {
            let shared: Vec<T> = inserted.drain(..prefix).collect();
            deleted.drain(..prefix);
            push_equal(merged, shared);
        }

        let suffix = common_suffix(deleted, inserted);
        if suffix > 0 {
            let mut shared = inserted.split_off(inserted.len() - suffix);
            deleted.truncate(deleted.len() - suffix);
            match next_equal {
                Some(equal) => {
                    shared.append(equal);
                    *equal = shared;
                }
                None => trailing = shared,
            }
        }
    }

    if !deleted.is_empty() {
        merged.push(Chunk::new(DiffOp::Delete, std::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        merged.push(Chunk::new(DiffOp::Insert, std::mem::take(inserted)));
    }
    push_equal(merged, trailing);
}

/// `A<ba>C` → `<ab>aC` and `A<bc>bD` → `Ab<cb>D`.
fn shift_single_edits<T: PartialEq + Clone>(chunks: &mut Vec<Chunk<T>>) -> bool {
    let mut changed = false;
    let mut i = 1;

    while i + 1 < chunks.len() {
        if chunks[i - 1].op == DiffOp::Equal && chunks[i + 1].op == DiffOp::Equal {
            let prev_len = chunks[i - 1].items.len();
            let next_len = chunks[i + 1].items.len();
            let edit_len = chunks[i].items.len();

            if edit_len >= prev_len && chunks[i].items[edit_len - prev_len..] == chunks[i - 1].items[..] {
                let prev = chunks.remove(i - 1).items;
                let mut edit = prev.clone();
                edit.extend_from_slice(&chunks[i - 1].items[..edit_len - prev_len]);
                chunks[i - 1].items = edit;
                let mut next = prev;
                next.append(&mut chunks[i].items);
                chunks[i].items = next;
                changed = true;
            } else if edit_len >= next_len && chunks[i].items[..next_len] == chunks[i + 1].items[..] {
                let next = chunks.remove(i + 1).items;
                chunks[i - 1].items.extend_from_slice(&next);
                let edit = &mut chunks[i].items;
                edit.drain(..next_len);
                edit.extend(next);
                changed = true;
            }
        }
        i += 1;
    }

    changed
}

/// Rewrite a character diff for human reading: drop short equalities that
/// split larger edits, align edit boundaries with word and line breaks, and
/// pull overlaps between adjacent deletions and insertions into equalities.
pub fn cleanup_semantic(chunks: &mut Vec<Chunk<char>>) {
    if eliminate_short_equalities(chunks) {
        cleanup_merge(chunks);
    }
    cleanup_semantic_lossless(chunks);
    extract_overlaps(chunks);
    chunks.retain(|c| !c.items.is_empty());

    let mut coalesced: Vec<Chunk<char>> = Vec::with_capacity(chunks.len());
    for chunk in chunks.drain(..) {
        match coalesced.last_mut() {
            Some(last) if last.op == chunk.op && chunk.op == DiffOp::Equal => {
                last.items.extend(chunk.items)
            }
            _ => coalesced.push(chunk),
        }
    }
    *chunks = coalesced;
}

fn eliminate_short_equalities(chunks: &mut Vec<Chunk<char>>) -> bool {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<usize> = None;
    // edit lengths before (1) and after (2) the latest equality
    let (mut ins1, mut del1, mut ins2, mut del2) = (0usize, 0usize, 0usize, 0usize);
    let mut pointer: isize = 0;

    while (pointer as usize) < chunks.len() {
        let p = pointer as usize;
        if chunks[p].op == DiffOp::Equal {
            equalities.push(p);
            ins1 = ins2;
            del1 = del2;
            ins2 = 0;
            del2 = 0;
            last_equality = Some(chunks[p].items.len());
        } else {
            if chunks[p].op == DiffOp::Insert {
                ins2 += chunks[p].items.len();
            } else {
                del2 += chunks[p].items.len();
            }

            let dominated = last_equality
                .map(|len| len <= ins1.max(del1) && len <= ins2.max(del2))
                .unwrap_or(false);
            if let (true, Some(&idx)) = (dominated, equalities.last()) {
                let duplicate = chunks[idx].items.clone();
                chunks.insert(idx, Chunk::new(DiffOp::Delete, duplicate));
                chunks[idx + 1].op = DiffOp::Insert;

                equalities.pop();
                equalities.pop();
                pointer = equalities.last().map(|&e| e as isize).unwrap_or(-1);
                ins1 = 0;
                del1 = 0;
                ins2 = 0;
                del2 = 0;
                last_equality = None;
                changed = true;
            }
        }
        pointer += 1;
    }

    changed
}

fn ends_with_blank_line(s: &[char]) -> bool {
    s.ends_with(&['\n', '\n']) || s.ends_with(&['\n', '\r', '\n'])
}

fn starts_with_blank_line(s: &[char]) -> bool {
    let s = s.strip_prefix(&['\r']).unwrap_or(s);
    match s.strip_prefix(&['\n']) {
        Some(rest) => rest.starts_with(&['\n']) || rest.starts_with(&['\r', '\n']),
        None => false,
    }
}

/// How good a split between `one` and `two` looks: 6 at an edge of the
/// text, down to 0 in the middle of a word.
fn boundary_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&c1), Some(&c2)) = (one.last(), two.first()) else {
        return 6;
    };

    let non_alnum1 = !c1.is_alphanumeric();
    let non_alnum2 = !c2.is_alphanumeric();
    let space1 = non_alnum1 && c1.is_whitespace();
    let space2 = non_alnum2 && c2.is_whitespace();
    let break1 = space1 && (c1 == '\n' || c1 == '\r');
    let break2 = space2 && (c2 == '\n' || c2 == '\r');
    let blank1 = break1 && ends_with_blank_line(one);
    let blank2 = break2 && starts_with_blank_line(two);

    if blank1 || blank2 {
        5
    } else if break1 || break2 {
        4
    } else if non_alnum1 && !space1 && space2 {
        3
    } else if space1 || space2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

/// Slide single edits bounded by equalities to the best-scoring boundary.
pub fn cleanup_semantic_lossless(chunks: &mut Vec<Chunk<char>>) {
    let mut i = 1;
    while i + 1 < chunks.len() {
        if chunks[i - 1].op == DiffOp::Equal && chunks[i + 1].op == DiffOp::Equal {
            let mut eq1 = chunks[i - 1].items.clone();
            let mut edit = chunks[i].items.clone();
            let mut eq2 = chunks[i + 1].items.clone();

            // shift the edit as far left as it will go
            let offset = common_suffix(&eq1, &edit);
            if offset > 0 {
                let common = edit[edit.len() - offset..].to_vec();
                eq1.truncate(eq1.len() - offset);
                edit.truncate(edit.len() - offset);
                edit = [common.as_slice(), edit.as_slice()].concat();
                eq2 = [common.as_slice(), eq2.as_slice()].concat();
            }

            let mut best = (eq1.clone(), edit.clone(), eq2.clone());
            let mut best_score = boundary_score(&eq1, &edit) + boundary_score(&edit, &eq2);

            // then step right one item at a time
            while !edit.is_empty() && !eq2.is_empty() && edit[0] == eq2[0] {
                let c = edit.remove(0);
                eq1.push(c);
                edit.push(eq2.remove(0));
                let score = boundary_score(&eq1, &edit) + boundary_score(&edit, &eq2);
                if score >= best_score {
                    best_score = score;
                    best = (eq1.clone(), edit.clone(), eq2.clone());
                }
            }

            let (best1, best_edit, best2) = best;
            if chunks[i - 1].items != best1 {
                if best1.is_empty() {
                    chunks.remove(i - 1);
                    i -= 1;
                } else {
                    chunks[i - 1].items = best1;
                }
                chunks[i].items = best_edit;
                if best2.is_empty() {
                    chunks.remove(i + 1);
                    i = i.saturating_sub(1);
                } else {
                    chunks[i + 1].items = best2;
                }
            }
        }
        i += 1;
    }
}

fn extract_overlaps(chunks: &mut Vec<Chunk<char>>) {
    let mut i = 1;
    while i < chunks.len() {
        if chunks[i - 1].op == DiffOp::Delete && chunks[i].op == DiffOp::Insert {
            let deletion = chunks[i - 1].items.clone();
            let insertion = chunks[i].items.clone();
            let forward = common_overlap(&deletion, &insertion);
            let reverse = common_overlap(&insertion, &deletion);

            if forward >= reverse {
                if forward * 2 >= deletion.len() || forward * 2 >= insertion.len() {
                    chunks.insert(i, Chunk::new(DiffOp::Equal, insertion[..forward].to_vec()));
                    chunks[i - 1].items = deletion[..deletion.len() - forward].to_vec();
                    chunks[i + 1].items = insertion[forward..].to_vec();
                    i += 1;
                }
            } else if reverse * 2 >= deletion.len() || reverse * 2 >= insertion.len() {
                chunks.insert(i, Chunk::new(DiffOp::Equal, deletion[..reverse].to_vec()));
                chunks[i - 1] = Chunk::new(
                    DiffOp::Insert,
                    insertion[..insertion.len() - reverse].to_vec(),
                );
                chunks[i + 1] = Chunk::new(DiffOp::Delete, deletion[reverse..].to_vec());
                i += 1;
            }
            i += 1;
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn render(chunks: &[Chunk<char>]) -> Vec<(DiffOp, String)> {
        chunks.iter().map(|c| (c.op, c.text())).collect()
    }

    fn rebuild(chunks: &[Chunk<char>]) -> (String, String) {
        let mut left = String::new();
        let mut right = String::new();
        for chunk in chunks {
            let text = chunk.text();
            match chunk.op {
                DiffOp::Equal => {
                    left.push_str(&text);
                    right.push_str(&text);
                }
                DiffOp::Delete => left.push_str(&text),
                DiffOp::Insert => right.push_str(&text),
            }
        }
        (left, right)
    }

    fn equal_len(chunks: &[Chunk<char>]) -> usize {
        chunks
            .iter()
            .filter(|c| c.op == DiffOp::Equal)
            .map(|c| c.items.len())
            .sum()
    }

    #[test]
    fn test_identical_and_empty() {
        let settings = DiffSettings::default();
        let chunks = diff_main(&chars("cat"), &chars("cat"), &settings).unwrap();
        assert_eq!(render(&chunks), vec![(DiffOp::Equal, "cat".to_string())]);

        let none: Vec<char> = Vec::new();
        assert!(diff_main(&none, &none, &settings).unwrap().is_empty());

        let chunks = diff_main(&none, &chars("ab"), &settings).unwrap();
        assert_eq!(render(&chunks), vec![(DiffOp::Insert, "ab".to_string())]);
    }

    #[test]
    fn test_single_substitution() {
        let chunks = diff_main(&chars("cat"), &chars("cot"), &DiffSettings::default()).unwrap();
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Equal, "c".to_string()),
                (DiffOp::Delete, "a".to_string()),
                (DiffOp::Insert, "o".to_string()),
                (DiffOp::Equal, "t".to_string()),
            ]
        );
    }

    #[test]
    fn test_containment() {
        let chunks = diff_main(&chars("abcdef"), &chars("cd"), &DiffSettings::default()).unwrap();
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Delete, "ab".to_string()),
                (DiffOp::Equal, "cd".to_string()),
                (DiffOp::Delete, "ef".to_string()),
            ]
        );
    }

    #[test]
    fn test_bisect_finds_lcs() {
        let a = chars("abcabba");
        let b = chars("cbabac");
        let chunks = diff_main(&a, &b, &DiffSettings::default()).unwrap();
        assert_eq!(equal_len(&chunks), 4);
        assert_eq!(rebuild(&chunks), ("abcabba".to_string(), "cbabac".to_string()));
    }

    #[test]
    fn test_no_common_items() {
        let chunks = diff_main(&chars("abc"), &chars("xyz"), &DiffSettings::default()).unwrap();
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Delete, "abc".to_string()),
                (DiffOp::Insert, "xyz".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_factors_common_affixes() {
        let mut chunks = vec![
            Chunk::new(DiffOp::Delete, chars("abc")),
            Chunk::new(DiffOp::Insert, chars("abd")),
        ];
        cleanup_merge(&mut chunks);
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Equal, "ab".to_string()),
                (DiffOp::Delete, "c".to_string()),
                (DiffOp::Insert, "d".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_orders_delete_before_insert() {
        let mut chunks = vec![
            Chunk::new(DiffOp::Insert, chars("x")),
            Chunk::new(DiffOp::Delete, chars("y")),
            Chunk::new(DiffOp::Equal, chars("z")),
        ];
        cleanup_merge(&mut chunks);
        assert_eq!(chunks[0].op, DiffOp::Delete);
        assert_eq!(chunks[1].op, DiffOp::Insert);
    }

    #[test]
    fn test_merge_shifts_single_edit() {
        let mut chunks = vec![
            Chunk::new(DiffOp::Equal, chars("a")),
            Chunk::new(DiffOp::Insert, chars("ba")),
            Chunk::new(DiffOp::Equal, chars("c")),
        ];
        cleanup_merge(&mut chunks);
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Insert, "ab".to_string()),
                (DiffOp::Equal, "ac".to_string()),
            ]
        );
    }

    #[test]
    fn test_semantic_removes_short_equality() {
        let mut chunks = vec![
            Chunk::new(DiffOp::Delete, chars("a")),
            Chunk::new(DiffOp::Equal, chars("b")),
            Chunk::new(DiffOp::Delete, chars("c")),
        ];
        cleanup_semantic(&mut chunks);
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Delete, "abc".to_string()),
                (DiffOp::Insert, "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_semantic_backpass_elimination() {
        let mut chunks = vec![
            Chunk::new(DiffOp::Delete, chars("ab")),
            Chunk::new(DiffOp::Equal, chars("cd")),
            Chunk::new(DiffOp::Delete, chars("e")),
            Chunk::new(DiffOp::Equal, chars("f")),
            Chunk::new(DiffOp::Insert, chars("g")),
        ];
        cleanup_semantic(&mut chunks);
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Delete, "abcdef".to_string()),
                (DiffOp::Insert, "cdfg".to_string()),
            ]
        );
    }

    #[test]
    fn test_semantic_aligns_to_word_boundary() {
        let mut chunks = vec![
            Chunk::new(DiffOp::Equal, chars("The c")),
            Chunk::new(DiffOp::Insert, chars("ow and the c")),
            Chunk::new(DiffOp::Equal, chars("at.")),
        ];
        cleanup_semantic(&mut chunks);
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Equal, "The ".to_string()),
                (DiffOp::Insert, "cow and the ".to_string()),
                (DiffOp::Equal, "cat.".to_string()),
            ]
        );
    }

    #[test]
    fn test_semantic_extracts_overlap() {
        let mut chunks = vec![
            Chunk::new(DiffOp::Delete, chars("abcxxx")),
            Chunk::new(DiffOp::Insert, chars("xxxdef")),
        ];
        cleanup_semantic(&mut chunks);
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Delete, "abc".to_string()),
                (DiffOp::Equal, "xxx".to_string()),
                (DiffOp::Insert, "def".to_string()),
            ]
        );
    }

    #[test]
    fn test_semantic_preserves_both_texts() {
        let pairs = [
            ("æsthetic", "aesthetic"),
            ("the quick brown fox", "teh quikc brwn fx"),
            ("ſaid the uuife", "said the wife"),
            ("line one\n\nline two", "line 1\nline too"),
        ];
        for (a, b) in pairs {
            let chunks = diff_chars(a, b, &DiffSettings::default()).unwrap();
            assert_eq!(rebuild(&chunks), (a.to_string(), b.to_string()));
        }
    }

    #[test]
    fn test_ligature_diff_groups_change() {
        let chunks = diff_chars("æsthetic", "aesthetic", &DiffSettings::default()).unwrap();
        assert_eq!(
            render(&chunks),
            vec![
                (DiffOp::Delete, "æ".to_string()),
                (DiffOp::Insert, "ae".to_string()),
                (DiffOp::Equal, "sthetic".to_string()),
            ]
        );
    }

    #[test]
    fn test_token_diff() {
        let a = ["the", "quick", "fox"];
        let b = ["the", "slow", "fox"];
        let chunks = diff_tokens(&a, &b, &DiffSettings::default()).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[1], Chunk::new(DiffOp::Delete, vec!["quick"]));
        assert_eq!(chunks[2], Chunk::new(DiffOp::Insert, vec!["slow"]));
    }

    #[test]
    fn test_timeout_surfaces_error() {
        let a: Vec<u32> = (0..4000).map(|i| i % 7).collect();
        let b: Vec<u32> = (0..4000).map(|i| (i * 3) % 11).collect();
        let settings = DiffSettings {
            timeout_ms: Some(0),
            semantic_cleanup: false,
        };
        assert_eq!(diff_main(&a, &b, &settings), Err(DiffError::Timeout(0)));
    }

    #[test]
    fn test_common_overlap() {
        assert_eq!(common_overlap(&chars("abc"), &chars("bcd")), 2);
        assert_eq!(common_overlap(&chars("abc"), &chars("xyz")), 0);
        assert_eq!(common_overlap(&chars(""), &chars("abc")), 0);
    }
}
