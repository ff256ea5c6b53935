//! String similarity between free-text answers.
//!
//! The comparison is purely lexical: two answers are close when few single
//! character edits turn one into the other, once case and surrounding
//! whitespace are ignored.

/// The comparison key of an answer: lowercased and trimmed.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Levenshtein distance, counted in characters (not bytes).
///
/// Insertions, deletions and substitutions all cost 1.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    // Only two rows of the matrix are needed at any time.
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr: Vec<usize> = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Similarity of two answers, between 0 (nothing in common) and 1 (identical).
///
/// Both texts are normalized first. Equal texts (including two empty texts)
/// have a similarity of 1, otherwise an empty text has a similarity of 0 with
/// anything.
pub fn similarity(a: &str, b: &str) -> f64 {
    let s1 = normalize(a);
    let s2 = normalize(b);
    if s1 == s2 {
        return 1.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }
    let max_len = s1.chars().count().max(s2.chars().count());
    let distance = edit_distance(&s1, &s2);
    (1.0 - (distance as f64) / (max_len as f64)).max(0.0)
}
