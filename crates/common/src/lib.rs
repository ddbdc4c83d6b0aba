//! Observatory Common Library
//!
//! Shared code for the observatory services including:
//! - Catalog of researchers, projects and publications loaded from CSV
//! - Search-intent classification, filter state and pagination
//! - Language model abstraction and the document chatbot
//! - Per-user search sessions
//! - Error types, configuration and metrics

pub mod catalog;
pub mod chatbot;
pub mod config;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod search;
pub mod session;

// Re-export commonly used types
pub use catalog::{Catalog, SharedCatalog};
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use llm::LanguageModel;
pub use search::IntentClassifier;
pub use session::SearchSession;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
