use crate::config::StatusVocabulary;
use crate::issue::Issue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// StatusCounts
// ---------------------------------------------------------------------------

/// Issue counts per normalized status, in first-seen order. Serializes as an
/// ordered `status: count` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    entries: Vec<(String, usize)>,
}

impl StatusCounts {
    fn bump(&mut self, status: &str) {
        match self.entries.iter_mut().find(|(s, _)| s == status) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((status.to_string(), 1)),
        }
    }

    pub fn get(&self, status: &str) -> usize {
        self.entries
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(s, c)| (s.as_str(), *c))
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reorder by the vocabulary's display order; statuses it doesn't list
    /// follow in first-seen order.
    pub fn ordered(&self, vocab: &StatusVocabulary) -> StatusCounts {
        let mut entries: Vec<(String, usize)> = vocab
            .display_order
            .iter()
            .filter_map(|s| {
                self.entries
                    .iter()
                    .find(|(name, _)| name == s)
                    .cloned()
            })
            .collect();
        for entry in &self.entries {
            if !vocab.display_order.contains(&entry.0) {
                entries.push(entry.clone());
            }
        }
        StatusCounts { entries }
    }
}

impl Serialize for StatusCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (status, count) in &self.entries {
            map.serialize_entry(status, count)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Buckets issues by status according to one [`StatusVocabulary`].
///
/// Done, remaining, total and dropped tests use the literal tracker status;
/// only [`Classifier::status_counts`] applies normalization.
pub struct Classifier<'a> {
    vocab: &'a StatusVocabulary,
}

impl<'a> Classifier<'a> {
    pub fn new(vocab: &'a StatusVocabulary) -> Self {
        Self { vocab }
    }

    pub fn status_counts(&self, issues: &[Issue]) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for issue in issues {
            if self.vocab.is_dropped(&issue.status) {
                continue;
            }
            counts.bump(self.vocab.normalize(&issue.status));
        }
        counts
    }

    pub fn count_done(&self, issues: &[Issue]) -> usize {
        issues
            .iter()
            .filter(|i| self.vocab.is_done(&i.status))
            .count()
    }

    /// Issues still to be worked, in input order.
    pub fn remaining<'i>(&self, issues: &'i [Issue]) -> Vec<&'i Issue> {
        issues
            .iter()
            .filter(|i| self.vocab.is_remaining(&i.status))
            .collect()
    }

    pub fn count_total(&self, issues: &[Issue]) -> usize {
        issues
            .iter()
            .filter(|i| !self.vocab.is_dropped(&i.status))
            .count()
    }

    pub fn count_dropped(&self, issues: &[Issue]) -> usize {
        issues
            .iter()
            .filter(|i| self.vocab.is_dropped(&i.status))
            .count()
    }

    pub fn count_in_progress(&self, issues: &[Issue]) -> usize {
        issues
            .iter()
            .filter(|i| self.vocab.is_in_progress(&i.status))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
