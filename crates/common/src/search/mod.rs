//! Search-intent resolution and list filtering
//!
//! Pipeline: free text → [`IntentClassifier`] → [`Intent`] →
//! [`FilterState::apply_intent`] → [`listing`] filters → [`Paginator`] pages.

pub mod classifier;
pub mod fallback;
pub mod filters;
pub mod intent;
pub mod listing;
pub mod pagination;
pub mod prompt;

pub use classifier::{Classification, ClassificationSource, IntentClassifier};
pub use filters::FilterState;
pub use intent::{parse_reply, Intent};
pub use listing::{filter_projects, filter_publications, filter_researchers};
pub use pagination::{Page, Paginator};
