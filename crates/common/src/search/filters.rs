//! Active filter state and the intent merge policy

use super::intent::Intent;
use crate::catalog::Vocabulary;
use serde::Serialize;

/// Filters driving the researcher listing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterState {
    search_term: String,
    /// Insertion-ordered, no duplicates
    selected_areas: Vec<String>,
    /// Subset of `selected_areas` contributed by the last classification
    ai_detected_areas: Vec<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn selected_areas(&self) -> &[String] {
        &self.selected_areas
    }

    pub fn ai_detected_areas(&self) -> &[String] {
        &self.ai_detected_areas
    }

    /// Merge a classification into the filters.
    ///
    /// | intent  | search term                       | areas     |
    /// |---------|-----------------------------------|-----------|
    /// | name    | names, else raw query             | cleared   |
    /// | area    | cleared                           | validated |
    /// | title   | titles + terms, else raw query    | cleared   |
    /// | hybrid  | names + titles + terms, else raw  | validated |
    /// | unknown | terms, else raw query             | validated |
    pub fn apply_intent(&mut self, intent: &Intent, raw_query: &str, vocabulary: &Vocabulary) {
        let raw_query = raw_query.trim();

        match intent {
            Intent::Name { names, .. } => {
                self.search_term = join_or(names.iter(), raw_query);
                self.selected_areas.clear();
            }
            Intent::Area { areas, .. } => {
                self.search_term.clear();
                self.selected_areas = vocabulary.validate(areas);
            }
            Intent::Title { titles, terms, .. } => {
                self.search_term = join_or(titles.iter().chain(terms), raw_query);
                self.selected_areas.clear();
            }
            Intent::Hybrid {
                names,
                titles,
                terms,
                areas,
                ..
            } => {
                self.search_term = join_or(names.iter().chain(titles).chain(terms), raw_query);
                self.selected_areas = vocabulary.validate(areas);
            }
            Intent::Unknown { areas, terms, .. } => {
                self.search_term = join_or(terms.iter(), raw_query);
                self.selected_areas = vocabulary.validate(areas);
            }
        }

        self.ai_detected_areas = match intent {
            Intent::Name { .. } | Intent::Title { .. } => Vec::new(),
            _ => self.selected_areas.clone(),
        };
    }

    /// Returns whether the selection changed
    pub fn add_area(&mut self, area: &str) -> bool {
        let area = area.trim();
        if area.is_empty() || self.selected_areas.iter().any(|a| a == area) {
            return false;
        }
        self.selected_areas.push(area.to_string());
        true
    }

    /// Returns whether the selection changed
    pub fn remove_area(&mut self, area: &str) -> bool {
        let area = area.trim();
        let before = self.selected_areas.len();
        self.selected_areas.retain(|a| a != area);
        self.ai_detected_areas.retain(|a| a != area);
        self.selected_areas.len() != before
    }

    pub fn clear_areas(&mut self) {
        self.selected_areas.clear();
        self.ai_detected_areas.clear();
    }

    /// Drop the attribution only; selections stay
    pub fn clear_detected_areas(&mut self) {
        self.ai_detected_areas.clear();
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    /// Drop selections that are no longer in the vocabulary
    pub fn revalidate(&mut self, vocabulary: &Vocabulary) {
        self.selected_areas = vocabulary.validate(&self.selected_areas);
        let selected = &self.selected_areas;
        self.ai_detected_areas.retain(|a| selected.contains(a));
    }
}

fn join_or<'a>(parts: impl Iterator<Item = &'a String>, fallback: &str) -> String {
    let joined = parts
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        fallback.to_string()
    } else {
        joined
    }
}
