//! Record types held by the catalog

use serde::{Deserialize, Serialize};

/// Delimiter used when an area set is rendered as a single string
pub const AREA_DELIMITER: &str = ",";

/// Degree label used when the source leaves it blank
pub const DEFAULT_DEGREE: &str = "INVESTIGADORA";

/// Placeholder for projects without a discipline
pub const DEFAULT_DISCIPLINE: &str = "SIN INFO";

/// Placeholder for projects without a role
pub const DEFAULT_ROLE: &str = "Sin Info";

/// A researcher profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Researcher {
    /// Unique numeric identifier
    pub id: i64,

    pub name: String,

    /// Highest academic degree
    pub degree: String,

    /// ORCID, empty when unknown
    pub orcid: String,

    pub email: String,

    /// Area tags in source order, trimmed and deduplicated
    pub areas: Vec<String>,

    /// Institutional key joining projects and publications
    pub rut_ir: String,

    /// Contract unit
    pub unit: String,

    pub program: Option<String>,
}

impl Researcher {
    /// Area set rendered with the canonical delimiter
    pub fn area_text(&self) -> String {
        self.areas.join(AREA_DELIMITER)
    }

    /// Two-letter initials from the first two name parts
    pub fn initials(&self) -> String {
        let mut parts = self.name.split_whitespace();

        let first = parts.next().and_then(|p| p.chars().next());
        let second = parts.next().and_then(|p| p.chars().next());

        match (first, second) {
            (Some(a), Some(b)) => format!("{a}{b}").to_uppercase(),
            (Some(a), None) => a.to_uppercase().to_string(),
            _ => "??".to_string(),
        }
    }
}

/// A funded research project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub rut_ir: String,
    pub code: String,
    pub title: String,
    /// 0 when the source leaves it blank
    pub year: i32,
    pub discipline: String,
    pub project_type: String,
    pub role: String,
    pub lead_investigator: String,
    pub co_investigator: String,
    pub unit: String,
}

impl Project {
    /// Fields covered by the free-text project search
    pub fn searchable_fields(&self) -> [String; 8] {
        [
            self.code.clone(),
            self.title.clone(),
            self.year.to_string(),
            self.discipline.clone(),
            self.project_type.clone(),
            self.lead_investigator.clone(),
            self.co_investigator.clone(),
            self.unit.clone(),
        ]
    }
}

/// An indexed publication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Publication {
    pub rut_ir: String,
    /// 0 when the source leaves it blank
    pub year: i32,
    pub title: String,
    pub journal: String,
    pub quartile: String,
    pub author: String,
    pub wos_id: String,
    /// Whether the researcher led the publication, as labelled in the source
    pub led: String,
    pub url: String,
    pub doi: String,
}

impl Publication {
    /// Fields covered by the free-text publication search
    pub fn searchable_fields(&self) -> [String; 8] {
        [
            self.year.to_string(),
            self.title.clone(),
            self.journal.clone(),
            self.quartile.clone(),
            self.author.clone(),
            self.wos_id.clone(),
            self.led.clone(),
            self.url.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn researcher(name: &str) -> Researcher {
        Researcher {
            id: 1,
            name: name.to_string(),
            degree: DEFAULT_DEGREE.to_string(),
            orcid: String::new(),
            email: String::new(),
            areas: vec!["MATEMATICAS".to_string(), "FISICA".to_string()],
            rut_ir: "1".to_string(),
            unit: String::new(),
            program: None,
        }
    }

    #[test]
    fn test_initials() {
        assert_eq!(researcher("alba zambrano constanzo").initials(), "AZ");
        assert_eq!(researcher("Ana").initials(), "A");
        assert_eq!(researcher("   ").initials(), "??");
    }

    #[test]
    fn test_area_text_uses_canonical_delimiter() {
        assert_eq!(researcher("Ana").area_text(), "MATEMATICAS,FISICA");
    }
}
