//! PDF text extraction for the document chatbot
//!
//! Extracts text content from PDF files using lopdf.

use crate::errors::{AppError, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Extracted text of one PDF
#[derive(Debug, Clone, Serialize)]
pub struct PdfDocument {
    /// File name without directory
    pub name: String,
    #[serde(skip)]
    pub content: String,
}

/// Extract text content from a PDF file
pub fn extract_text(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| AppError::DataLoad {
        source_name: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!(page_count = pages.len(), path = %path.display(), "Extracting text from PDF");

    let mut text = String::new();
    for page in pages {
        match doc.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    let cleaned = clean_text(&text);
    if cleaned.is_empty() {
        return Err(AppError::DataLoad {
            source_name: path.display().to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    Ok(cleaned)
}

/// Load every `*.pdf` in `dir`, sorted by file name.
///
/// A missing directory yields no documents; unreadable files are skipped.
pub fn load_directory(dir: &Path) -> Vec<PdfDocument> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Document directory unavailable");
            return Vec::new();
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match extract_text(&path) {
            Ok(content) => {
                debug!(document = %name, chars = content.chars().count(), "Document loaded");
                documents.push(PdfDocument { name, content });
            }
            Err(e) => {
                warn!(document = %name, error = %e, "Skipping unreadable document");
            }
        }
    }

    info!(dir = %dir.display(), documents = documents.len(), "Chatbot documents loaded");
    documents
}

/// Collapse whitespace runs and strip byte-order marks
fn clean_text(text: &str) -> String {
    text.replace('\u{FEFF}', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
