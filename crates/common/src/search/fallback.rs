//! Deterministic local classification used when the model cannot answer

use super::intent::{Intent, MAX_AREAS, MAX_TERMS};
use crate::catalog::Vocabulary;

/// Keyword match of query tokens against the vocabulary.
///
/// An area is detected when any lower-cased query token is a substring of
/// the lower-cased area. The result is always an area intent.
pub fn classify(query: &str, vocabulary: &Vocabulary) -> Intent {
    let lowered = query.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    let detected: Vec<String> = vocabulary
        .iter()
        .filter(|area| {
            let area = area.to_lowercase();
            tokens.iter().any(|token| area.contains(token))
        })
        .map(str::to_string)
        .collect();

    let summary = format!(
        "Búsqueda simple por '{}'. {} áreas relacionadas detectadas.",
        query,
        detected.len()
    );

    let terms = tokens
        .iter()
        .filter(|token| token.chars().count() > 2)
        .take(MAX_TERMS)
        .map(|token| token.to_string())
        .collect();

    Intent::Area {
        areas: detected.into_iter().take(MAX_AREAS).collect(),
        terms,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_matching_area_only() {
        let vocab = Vocabulary::from_areas(["BIOTECNOLOGIA", "MATEMATICAS"]);
        let intent = classify("quiero experta en biotecnologia", &vocab);

        match intent {
            Intent::Area {
                areas,
                terms,
                summary,
            } => {
                assert_eq!(areas, vec!["BIOTECNOLOGIA"]);
                assert_eq!(terms, vec!["quiero", "experta", "biotecnologia"]);
                assert_eq!(
                    summary,
                    "Búsqueda simple por 'quiero experta en biotecnologia'. 1 áreas relacionadas detectadas."
                );
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn test_caps_areas() {
        let vocab = Vocabulary::from_areas(["A1", "A2", "A3", "A4", "A5", "A6"]);
        let intent = classify("a", &vocab);
        assert_eq!(intent.areas().len(), MAX_AREAS);
        assert!(intent.summary().contains("6 áreas"));
    }

    #[test]
    fn test_no_match() {
        let vocab = Vocabulary::from_areas(["MATEMATICAS"]);
        let intent = classify("zzz", &vocab);
        assert!(intent.areas().is_empty());
    }
}
