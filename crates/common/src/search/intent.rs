//! Structured search intent and the classifier reply format

use crate::catalog::Vocabulary;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

pub const MAX_AREAS: usize = 5;
pub const MAX_NAMES: usize = 3;
pub const MAX_TITLES: usize = 3;
pub const MAX_TERMS: usize = 5;

/// Interpretation of a free-text query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Looking for people by name
    Name { names: Vec<String>, summary: String },

    /// Looking for researchers in one or more areas
    Area {
        areas: Vec<String>,
        terms: Vec<String>,
        summary: String,
    },

    /// Looking for a publication or project title
    Title {
        titles: Vec<String>,
        terms: Vec<String>,
        summary: String,
    },

    /// Names or titles combined with areas
    Hybrid {
        names: Vec<String>,
        titles: Vec<String>,
        terms: Vec<String>,
        areas: Vec<String>,
        summary: String,
    },

    /// Model returned an unrecognized search type
    Unknown {
        areas: Vec<String>,
        terms: Vec<String>,
        summary: String,
    },
}

impl Intent {
    /// Stable label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Name { .. } => "name",
            Intent::Area { .. } => "area",
            Intent::Title { .. } => "title",
            Intent::Hybrid { .. } => "hybrid",
            Intent::Unknown { .. } => "unknown",
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Intent::Name { summary, .. }
            | Intent::Area { summary, .. }
            | Intent::Title { summary, .. }
            | Intent::Hybrid { summary, .. }
            | Intent::Unknown { summary, .. } => summary,
        }
    }

    /// Areas carried by the intent, empty for name and title searches
    pub fn areas(&self) -> &[String] {
        match self {
            Intent::Area { areas, .. }
            | Intent::Hybrid { areas, .. }
            | Intent::Unknown { areas, .. } => areas,
            Intent::Name { .. } | Intent::Title { .. } => &[],
        }
    }
}

/// JSON object the model is instructed to produce
#[derive(Debug, Deserialize)]
struct ClassifierReply {
    tipo_busqueda: Option<String>,
    areas_detectadas: Option<Vec<String>>,
    nombres_detectados: Option<Vec<String>>,
    titulos_detectados: Option<Vec<String>>,
    terminos_busqueda: Option<Vec<String>>,
    resumen: Option<String>,
}

/// Parse a raw model reply into an [`Intent`].
///
/// The JSON object is taken from the first `{` to the last `}`. Areas are
/// restricted to the vocabulary and every list is capped.
pub fn parse_reply(text: &str, vocabulary: &Vocabulary) -> Result<Intent> {
    let json = extract_object(text).ok_or_else(|| AppError::MalformedModelReply {
        message: "Reply contains no JSON object".to_string(),
    })?;

    let reply: ClassifierReply =
        serde_json::from_str(json).map_err(|e| AppError::MalformedModelReply {
            message: format!("Invalid JSON: {}", e),
        })?;

    let areas = |raw: Vec<String>| {
        let mut valid = vocabulary.validate(raw);
        valid.truncate(MAX_AREAS);
        valid
    };

    match reply {
        ClassifierReply {
            tipo_busqueda: Some(kind),
            areas_detectadas: Some(raw_areas),
            nombres_detectados: Some(names),
            titulos_detectados,
            terminos_busqueda: Some(terms),
            resumen: Some(summary),
        } => {
            let names = capped(names, MAX_NAMES);
            let titles = capped(titulos_detectados.unwrap_or_default(), MAX_TITLES);
            let terms = capped(terms, MAX_TERMS);
            let areas = areas(raw_areas);

            Ok(match kind.trim() {
                "nombre" => Intent::Name { names, summary },
                "area" => Intent::Area {
                    areas,
                    terms,
                    summary,
                },
                "titulo" => Intent::Title {
                    titles,
                    terms,
                    summary,
                },
                "hibrida" => Intent::Hybrid {
                    names,
                    titles,
                    terms,
                    areas,
                    summary,
                },
                _ => Intent::Unknown {
                    areas,
                    terms,
                    summary,
                },
            })
        }
        // Older prompt revision without a search type
        ClassifierReply {
            areas_detectadas: Some(raw_areas),
            terminos_busqueda: Some(terms),
            resumen: Some(summary),
            ..
        } => Ok(Intent::Area {
            areas: areas(raw_areas),
            terms: capped(terms, MAX_TERMS),
            summary,
        }),
        _ => Err(AppError::MalformedModelReply {
            message: "Reply is missing required fields".to_string(),
        }),
    }
}

fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn capped(values: Vec<String>, cap: usize) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .take(cap)
        .collect()
}
