// State-name normalization.
//
// Raw region strings from every source are lowercased, trimmed and then
// matched against a fixed list of Indian states / union territories. The
// list is small enough that a brute-force scan per row is all we need.
use serde::{Deserialize, Serialize};

/// Canonical region names. Changing this list changes every join key, so
/// downstream outputs must be regenerated after an edit.
pub const CANONICAL_STATES: [&str; 31] = [
    "andhra pradesh",
    "arunachal pradesh",
    "assam",
    "bihar",
    "chhattisgarh",
    "goa",
    "gujarat",
    "haryana",
    "himachal pradesh",
    "jharkhand",
    "karnataka",
    "kerala",
    "madhya pradesh",
    "maharashtra",
    "manipur",
    "meghalaya",
    "mizoram",
    "nagaland",
    "odisha",
    "punjab",
    "rajasthan",
    "sikkim",
    "tamil nadu",
    "telangana",
    "tripura",
    "uttar pradesh",
    "uttarakhand",
    "west bengal",
    "delhi",
    "jammu and kashmir",
    "ladakh",
];

pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Key used for every unmatched name under `UnmatchedPolicy::MarkUnmatched`.
pub const UNMATCHED_KEY: &str = "(unmatched)";

/// Result of normalizing one raw cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Canonical(&'static str),
    /// No candidate cleared the threshold; holds the lowercased, trimmed input.
    Unmatched(String),
    Missing,
}

/// What to do with a name that did not match any canonical entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    #[default]
    KeepOriginal,
    Discard,
    MarkUnmatched,
}

impl Normalized {
    /// Grouping key for this outcome, or `None` if the row has no usable region.
    pub fn key(&self, policy: UnmatchedPolicy) -> Option<String> {
        match self {
            Normalized::Canonical(name) => Some((*name).to_string()),
            Normalized::Unmatched(raw) => match policy {
                UnmatchedPolicy::KeepOriginal => Some(raw.clone()),
                UnmatchedPolicy::Discard => None,
                UnmatchedPolicy::MarkUnmatched => Some(UNMATCHED_KEY.to_string()),
            },
            Normalized::Missing => None,
        }
    }
}

/// Lowercase + trim. Empty results count as absent.
pub fn clean_name(raw: Option<&str>) -> Option<String> {
    let s = raw?.to_lowercase();
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Some(s.to_string())
}

/// InDel distance: Levenshtein with substitutions costing 2 (a delete plus an insert).
fn indel_distance(s1: &[char], s2: &[char]) -> usize {
    let len1 = s1.len();
    let len2 = s2.len();
    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    // Single rolling row is enough; `prev[j]` is the distance for s1[..i], s2[..j].
    let mut prev: Vec<usize> = (0..=len2).collect();
    let mut cur = vec![0usize; len2 + 1];
    for (i, c1) in s1.iter().enumerate() {
        cur[0] = i + 1;
        for (j, c2) in s2.iter().enumerate() {
            let sub = if c1 == c2 { prev[j] } else { prev[j] + 2 };
            cur[j + 1] = sub.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[len2]
}

/// Similarity on a 0-100 scale. Symmetric; identical strings score 100.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let dist = indel_distance(&a, &b);
    100.0 * (1.0 - dist as f64 / total as f64)
}

/// Highest-scoring candidate and its score. Ties keep the earliest candidate.
pub fn best_match<'a>(query: &str, choices: &[&'a str]) -> Option<(&'a str, f64)> {
    let mut best: Option<(&'a str, f64)> = None;
    for &candidate in choices {
        let score = similarity_ratio(query, candidate);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best
}

pub fn normalize_name(raw: Option<&str>, choices: &[&'static str], threshold: f64) -> Normalized {
    let Some(cleaned) = clean_name(raw) else {
        return Normalized::Missing;
    };
    match best_match(&cleaned, choices) {
        Some((name, score)) if score >= threshold => Normalized::Canonical(name),
        _ => Normalized::Unmatched(cleaned),
    }
}

/// Normalizer bound to the canonical state list and a threshold.
#[derive(Debug, Clone, Copy)]
pub struct StateNormalizer {
    pub threshold: f64,
    pub policy: UnmatchedPolicy,
}

impl Default for StateNormalizer {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            policy: UnmatchedPolicy::default(),
        }
    }
}

impl StateNormalizer {
    pub fn new(threshold: f64, policy: UnmatchedPolicy) -> Self {
        Self { threshold, policy }
    }

    pub fn normalize(&self, raw: Option<&str>) -> Normalized {
        normalize_name(raw, &CANONICAL_STATES, self.threshold)
    }

    pub fn key(&self, raw: Option<&str>) -> Option<String> {
        self.normalize(raw).key(self.policy)
    }
}
