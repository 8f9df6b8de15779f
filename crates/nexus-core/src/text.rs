//! Name normalization and lexical similarity shared by extraction and dedup.

use std::collections::HashSet;

/// Normalize an entity name for matching: lowercase, strip possessive `'s`,
/// drop punctuation other than `&`, collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let lower = lower
        .strip_suffix("'s")
        .or_else(|| lower.strip_suffix("\u{2019}s"))
        .unwrap_or(&lower);

    let mut out = String::with_capacity(lower.len());
    let mut pending_space = false;
    for ch in lower.chars() {
        if ch.is_alphanumeric() || ch == '&' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Sørensen–Dice coefficient over character bigrams.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    let ba = bigrams(a);
    let mut bb = bigrams(b);
    if ba.is_empty() || bb.is_empty() {
        return if a == b && !a.is_empty() { 1.0 } else { 0.0 };
    }
    let total = ba.len() + bb.len();
    let mut matches = 0usize;
    for gram in &ba {
        if let Some(pos) = bb.iter().position(|g| g == gram) {
            bb.swap_remove(pos);
            matches += 1;
        }
    }
    (2 * matches) as f64 / total as f64
}

/// Jaccard similarity over whitespace tokens.
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    let ta: HashSet<&str> = a.split_whitespace().collect();
    let tb: HashSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let inter = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    inter as f64 / union as f64
}

/// Lexical similarity of two names in [0, 1]. Identical normalized names score 1.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let na = normalize_name(a);
    let nb = normalize_name(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    if na == nb {
        return 1.0;
    }
    dice_coefficient(&na, &nb).max(token_jaccard(&na, &nb))
}
