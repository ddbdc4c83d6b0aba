//! Controlled area vocabulary derived from the researcher collection

use super::models::Researcher;
use serde::Serialize;
use std::collections::BTreeSet;

/// Sorted set of every distinct area tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Vocabulary {
    areas: BTreeSet<String>,
}

impl Vocabulary {
    /// Derive the vocabulary from loaded researchers
    pub fn from_researchers(researchers: &[Researcher]) -> Self {
        Self::from_areas(researchers.iter().flat_map(|r| r.areas.iter().cloned()))
    }

    /// Build from arbitrary area strings, trimming and dropping blanks
    pub fn from_areas<I, S>(areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let areas = areas
            .into_iter()
            .map(|a| a.as_ref().trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        Self { areas }
    }

    /// Exact membership after trimming
    pub fn contains(&self, area: &str) -> bool {
        self.areas.contains(area.trim())
    }

    /// Keep only vocabulary members, trimmed, first occurrence wins
    pub fn validate<I, S>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut valid: Vec<String> = Vec::new();
        for candidate in candidates {
            let area = candidate.as_ref().trim();
            if self.areas.contains(area) && !valid.iter().any(|v| v == area) {
                valid.push(area.to_string());
            }
        }
        valid
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.areas.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.areas.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_deduplicated() {
        let vocab = Vocabulary::from_areas([" MATEMATICAS", "BIOTECNOLOGIA", "MATEMATICAS ", ""]);
        assert_eq!(vocab.to_vec(), vec!["BIOTECNOLOGIA", "MATEMATICAS"]);
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn test_validate_drops_unknown_areas() {
        let vocab = Vocabulary::from_areas(["MATEMATICAS", "BIOTECNOLOGIA"]);
        let valid = vocab.validate(["MATEMATICAS", "ASTROLOGIA", " BIOTECNOLOGIA ", "MATEMATICAS"]);
        assert_eq!(valid, vec!["MATEMATICAS", "BIOTECNOLOGIA"]);
    }

    #[test]
    fn test_membership_is_case_sensitive() {
        let vocab = Vocabulary::from_areas(["MATEMATICAS"]);
        assert!(vocab.contains(" MATEMATICAS"));
        assert!(!vocab.contains("matematicas"));
    }
}
