//! Read-only record store and its derived vocabulary
//!
//! A [`Catalog`] is built completely before it becomes visible. Sessions
//! hold an `Arc<Catalog>` snapshot; [`SharedCatalog::reload`] swaps the
//! pointer so in-flight readers keep the previous generation.

pub mod loader;
pub mod models;
pub mod vocabulary;

pub use loader::{LoadReport, RowOutcome, SkipReason};
pub use models::{Project, Publication, Researcher};
pub use vocabulary::Vocabulary;

use crate::config::DataConfig;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Researchers, projects and publications plus lookup indexes
#[derive(Debug)]
pub struct Catalog {
    researchers: Vec<Researcher>,
    projects: Vec<Project>,
    publications: Vec<Publication>,
    vocabulary: Vocabulary,
    reports: Vec<LoadReport>,
    loaded_at: DateTime<Utc>,
    by_id: HashMap<i64, usize>,
    projects_by_key: HashMap<String, Vec<usize>>,
    publications_by_key: HashMap<String, Vec<usize>>,
}

/// Everything the profile view needs for one researcher
#[derive(Debug, Clone, Serialize)]
pub struct ResearcherProfile {
    pub researcher: Researcher,
    pub initials: String,
    pub projects: Vec<Project>,
    pub publications: Vec<Publication>,
    pub project_count: usize,
    pub publication_count: usize,
    /// Distinct known project years, ascending
    pub project_years: Vec<i32>,
}

/// Catalog statistics for the readiness and reload endpoints
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummary {
    pub researchers: usize,
    pub projects: usize,
    pub publications: usize,
    pub areas: usize,
    pub loaded_at: DateTime<Utc>,
    pub reports: Vec<LoadReport>,
}

impl Catalog {
    /// Build a catalog from already coerced records
    pub fn new(
        researchers: Vec<Researcher>,
        projects: Vec<Project>,
        publications: Vec<Publication>,
    ) -> Self {
        let vocabulary = Vocabulary::from_researchers(&researchers);

        let by_id = researchers
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.id, idx))
            .collect();

        let mut projects_by_key: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, project) in projects.iter().enumerate() {
            projects_by_key.entry(project.rut_ir.clone()).or_default().push(idx);
        }

        let mut publications_by_key: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, publication) in publications.iter().enumerate() {
            publications_by_key
                .entry(publication.rut_ir.clone())
                .or_default()
                .push(idx);
        }

        Self {
            researchers,
            projects,
            publications,
            vocabulary,
            reports: Vec::new(),
            loaded_at: Utc::now(),
            by_id,
            projects_by_key,
            publications_by_key,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    /// Load all three sources from disk.
    ///
    /// The researcher file is mandatory; missing project or publication
    /// files load as empty collections.
    pub fn load(config: &DataConfig) -> Result<Self> {
        let (researchers, researcher_report) = loader::load_researchers(&config.researchers_path)?;

        let (projects, project_report) = if exists_or_warn(&config.projects_path, "projects") {
            loader::load_projects(&config.projects_path)?
        } else {
            (Vec::new(), LoadReport::empty("projects"))
        };

        let (publications, publication_report) =
            if exists_or_warn(&config.publications_path, "publications") {
                loader::load_publications(&config.publications_path)?
            } else {
                (Vec::new(), LoadReport::empty("publications"))
            };

        let mut catalog = Self::new(researchers, projects, publications);
        catalog.reports = vec![researcher_report, project_report, publication_report];

        info!(
            researchers = catalog.researchers.len(),
            projects = catalog.projects.len(),
            publications = catalog.publications.len(),
            areas = catalog.vocabulary.len(),
            "Catalog loaded"
        );

        Ok(catalog)
    }

    pub fn researchers(&self) -> &[Researcher] {
        &self.researchers
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn reports(&self) -> &[LoadReport] {
        &self.reports
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Look up a researcher by textual id; non-numeric ids never match
    pub fn find_researcher(&self, id: &str) -> Option<&Researcher> {
        self.researcher(id.trim().parse().ok()?)
    }

    pub fn researcher(&self, id: i64) -> Option<&Researcher> {
        self.by_id.get(&id).map(|&idx| &self.researchers[idx])
    }

    pub fn projects_for(&self, rut_ir: &str) -> Vec<&Project> {
        self.projects_by_key
            .get(rut_ir)
            .map(|idxs| idxs.iter().map(|&i| &self.projects[i]).collect())
            .unwrap_or_default()
    }

    pub fn publications_for(&self, rut_ir: &str) -> Vec<&Publication> {
        self.publications_by_key
            .get(rut_ir)
            .map(|idxs| idxs.iter().map(|&i| &self.publications[i]).collect())
            .unwrap_or_default()
    }

    /// Profile view for a researcher, `None` for unknown ids
    pub fn profile(&self, id: &str) -> Option<ResearcherProfile> {
        self.find_researcher(id).map(|r| self.profile_of(r))
    }

    pub fn profile_of(&self, researcher: &Researcher) -> ResearcherProfile {
        let (projects, publications): (Vec<Project>, Vec<Publication>) =
            if researcher.rut_ir.is_empty() {
                (Vec::new(), Vec::new())
            } else {
                (
                    self.projects_for(&researcher.rut_ir).into_iter().cloned().collect(),
                    self.publications_for(&researcher.rut_ir)
                        .into_iter()
                        .cloned()
                        .collect(),
                )
            };

        let mut project_years: Vec<i32> =
            projects.iter().map(|p| p.year).filter(|&y| y > 0).collect();
        project_years.sort_unstable();
        project_years.dedup();

        ResearcherProfile {
            initials: researcher.initials(),
            researcher: researcher.clone(),
            project_count: projects.len(),
            publication_count: publications.len(),
            projects,
            publications,
            project_years,
        }
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            researchers: self.researchers.len(),
            projects: self.projects.len(),
            publications: self.publications.len(),
            areas: self.vocabulary.len(),
            loaded_at: self.loaded_at,
            reports: self.reports.clone(),
        }
    }
}

fn exists_or_warn(path: &Path, source: &str) -> bool {
    let exists = path.exists();
    if !exists {
        warn!(source, path = %path.display(), "Source file missing, loading empty collection");
    }
    exists
}

/// Process-wide handle to the current catalog generation
#[derive(Clone)]
pub struct SharedCatalog {
    current: Arc<RwLock<Arc<Catalog>>>,
    config: DataConfig,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog, config: DataConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(catalog))),
            config,
        }
    }

    /// Load the initial generation from the configured sources
    pub async fn load(config: DataConfig) -> Result<Self> {
        let catalog = Self::build(config.clone()).await?;
        Ok(Self::new(catalog, config))
    }

    /// Current generation
    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    /// Rebuild from disk and swap; on failure the current generation stays
    pub async fn reload(&self) -> Result<Arc<Catalog>> {
        let catalog = Arc::new(Self::build(self.config.clone()).await?);
        *self.current.write().await = catalog.clone();
        info!(loaded_at = %catalog.loaded_at(), "Catalog swapped");
        Ok(catalog)
    }

    async fn build(config: DataConfig) -> Result<Catalog> {
        tokio::task::spawn_blocking(move || Catalog::load(&config))
            .await
            .map_err(|e| AppError::Internal {
                message: format!("Catalog load task failed: {}", e),
            })?
    }
}
