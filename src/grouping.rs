//! Fuzzy grouping of free-form answers.
//!
//! Answers are normalized (case, whitespace, a trailing colon) and then
//! clustered first-fit: a new answer joins the first existing group whose key
//! is more than 90% similar by normalized edit distance. Group creation order
//! therefore matters, which keeps results deterministic for a given input
//! order. Each group is displayed with its most frequent original spelling.

use std::collections::HashMap;

use crate::cell::CellValue;

/// Minimum similarity (exclusive) for an answer to join an existing group.
pub const SIMILARITY_THRESHOLD: f64 = 0.90;

/// Lowercases, trims, collapses whitespace runs and strips one trailing `:`.
pub fn normalize_answer(raw: &str) -> String {
    let collapsed = raw
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match collapsed.strip_suffix(':') {
        Some(stripped) => stripped.to_string(),
        None => collapsed,
    }
}

/// Character-level Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (cur[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// `1 - distance / max_len`; identical strings score 1 and a lone empty
/// string scores 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Splits a multi-select answer on commas and semicolons, dropping empty parts.
pub fn split_choices(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', ';']).map(str::trim).filter(|p| !p.is_empty())
}

#[derive(Debug, Clone)]
struct AnswerGroup {
    key: String,
    key_chars: usize,
    count: usize,
    /// Original spellings with their counts, first-seen order.
    spellings: Vec<(String, usize)>,
}

impl AnswerGroup {
    fn record(&mut self, original: &str) {
        self.count += 1;
        match self.spellings.iter_mut().find(|(s, _)| s == original) {
            Some((_, n)) => *n += 1,
            None => self.spellings.push((original.to_string(), 1)),
        }
    }

    fn display_label(&self) -> String {
        let mut best: Option<&(String, usize)> = None;
        for spelling in &self.spellings {
            if best.is_none_or(|b| spelling.1 > b.1) {
                best = Some(spelling);
            }
        }
        let label = best.map(|(s, _)| s.as_str()).unwrap_or_default();
        capitalize_if_lowercase(label)
    }
}

/// Capitalizes the first character of an all-lowercase label.
fn capitalize_if_lowercase(label: &str) -> String {
    if label.is_empty() || label != label.to_lowercase() {
        return label.to_string();
    }
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Accumulates answers into fuzzy groups.
#[derive(Debug, Clone, Default)]
pub struct AnswerGrouper {
    groups: Vec<AnswerGroup>,
    index: HashMap<String, usize>,
}

impl AnswerGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of groups created so far.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Adds one answer; blank answers are ignored.
    pub fn add(&mut self, raw: &str) {
        let key = normalize_answer(raw);
        if key.is_empty() {
            return;
        }
        let original = raw.trim();

        if let Some(&i) = self.index.get(&key) {
            self.groups[i].record(original);
            return;
        }

        let key_chars = key.chars().count();
        let matched = self.groups.iter().position(|g| {
            // the length gap alone already bounds the similarity from above
            let longest = g.key_chars.max(key_chars) as f64;
            let gap = g.key_chars.abs_diff(key_chars) as f64;
            1.0 - gap / longest > SIMILARITY_THRESHOLD
                && similarity(&g.key, &key) > SIMILARITY_THRESHOLD
        });

        match matched {
            Some(i) => {
                self.index.insert(key, i);
                self.groups[i].record(original);
            }
            None => {
                let mut group = AnswerGroup {
                    key: key.clone(),
                    key_chars,
                    count: 0,
                    spellings: Vec::new(),
                };
                group.record(original);
                self.index.insert(key, self.groups.len());
                self.groups.push(group);
            }
        }
    }

    /// Adds every choice of a comma/semicolon separated answer.
    pub fn add_choices(&mut self, raw: &str) {
        for part in split_choices(raw) {
            self.add(part);
        }
    }

    /// Display labels with counts, in group creation order.
    ///
    /// Groups that end up with the same display label are merged so labels
    /// stay unique and no count is lost.
    pub fn finish(self) -> Vec<(String, usize)> {
        let mut out: Vec<(String, usize)> = Vec::with_capacity(self.groups.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        for group in &self.groups {
            let label = group.display_label();
            match positions.get(&label) {
                Some(&i) => out[i].1 += group.count,
                None => {
                    positions.insert(label.clone(), out.len());
                    out.push((label, group.count));
                }
            }
        }
        out
    }
}

/// Groups the given cells, splitting multi-select answers into choices.
pub fn group_answers<'a, I>(values: I, multi_select: bool) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let mut grouper = AnswerGrouper::new();
    for value in values {
        let text = value.as_text();
        if multi_select {
            grouper.add_choices(&text);
        } else {
            grouper.add(&text);
        }
    }
    grouper.finish()
}
