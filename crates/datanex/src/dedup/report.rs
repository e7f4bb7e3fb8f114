//! Duplicate groups and deduplication reports.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::{SnapshotId, Value};
use crate::error::{DatanexError, Result};

/// Duplicate detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMethod {
    /// Identical values in every column.
    Exact,
    /// Identical after trimming and lower-casing text.
    Fuzzy,
    /// Embedding similarity of the text columns.
    ///
    /// The default embedder hashes character trigrams, so out of the box
    /// this catches near-identical spellings rather than paraphrases. Set
    /// `dedup.embedder` to `{"kind": "ollama", "model": "nomic-embed-text"}`
    /// for a pre-trained sentence embedding.
    Semantic,
    /// Exact, then fuzzy on what is left.
    #[default]
    Hybrid,
}

impl DedupMethod {
    /// Lower-case name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupMethod::Exact => "exact",
            DedupMethod::Fuzzy => "fuzzy",
            DedupMethod::Semantic => "semantic",
            DedupMethod::Hybrid => "hybrid",
        }
    }
}

impl FromStr for DedupMethod {
    type Err = DatanexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(DedupMethod::Exact),
            "fuzzy" => Ok(DedupMethod::Fuzzy),
            "semantic" => Ok(DedupMethod::Semantic),
            "hybrid" => Ok(DedupMethod::Hybrid),
            _ => Err(DatanexError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for DedupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the members of a group were judged duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupEvidence {
    /// Shared digest of the normalized row.
    Hash {
        digest: String,
        /// Raw member rows as they appear in the dataset (capped).
        variants: Vec<IndexMap<String, Value>>,
    },
    /// Cosine similarity of each member to the group seed.
    Similarity { seed: usize, scores: Vec<f64> },
}

/// Rows judged to be duplicates of one another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Method that formed the group.
    pub method: DedupMethod,
    /// Member row indices in dataset order.
    pub indices: Vec<usize>,
    /// First member's row.
    pub representative: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<GroupEvidence>,
}

impl DuplicateGroup {
    /// Number of member rows.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Result of one duplicate search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeduplicationReport {
    /// Dataset the report was computed from.
    pub dataset_id: SnapshotId,
    pub method: DedupMethod,
    pub original_count: usize,
    /// Rows belonging to any group.
    pub duplicates_found: usize,
    pub groups: Vec<DuplicateGroup>,
    /// `original_count - duplicates_found + groups.len()`.
    pub unique_count: usize,
    /// Similarity threshold used by a semantic pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Explanation when a pass could not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Duplicate rows found by each pass of a hybrid search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<IndexMap<String, usize>>,
}

impl DeduplicationReport {
    pub(crate) fn new(
        dataset_id: SnapshotId,
        method: DedupMethod,
        original_count: usize,
        groups: Vec<DuplicateGroup>,
    ) -> Self {
        let duplicates_found: usize = groups.iter().map(DuplicateGroup::len).sum();
        Self {
            dataset_id,
            method,
            original_count,
            duplicates_found,
            unique_count: original_count - duplicates_found + groups.len(),
            groups,
            threshold: None,
            note: None,
            breakdown: None,
        }
    }

    /// Whether any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("FUZZY".parse::<DedupMethod>().unwrap(), DedupMethod::Fuzzy);
        assert!(matches!(
            "cosine".parse::<DedupMethod>(),
            Err(DatanexError::UnknownMethod(m)) if m == "cosine"
        ));
    }

    #[test]
    fn test_unique_count() {
        let group = |indices: Vec<usize>| DuplicateGroup {
            method: DedupMethod::Exact,
            indices,
            representative: IndexMap::new(),
            evidence: None,
        };
        let report = DeduplicationReport::new(
            SnapshotId::next(),
            DedupMethod::Exact,
            10,
            vec![group(vec![0, 3, 4]), group(vec![1, 7])],
        );
        assert_eq!(report.duplicates_found, 5);
        assert_eq!(report.unique_count, 7);
    }
}
