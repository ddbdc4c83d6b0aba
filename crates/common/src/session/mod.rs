//! Per-user search session
//!
//! A [`SearchSession`] owns the filter state, one paginator per table, the
//! selected profile and the chat history. It only holds a snapshot of the
//! shared catalog.
//!
//! The two suspending operations are split into `begin_*` / `finish_*`
//! halves so callers can release their session lock while the model call
//! is in flight.

pub mod chat;

pub use chat::{ChatHistory, ChatMessage, ChatRole, ChatStatus, PendingQuestion};

use crate::catalog::{Catalog, Project, Publication, Researcher, ResearcherProfile};
use crate::config::SearchConfig;
use crate::errors::{AppError, Result};
use crate::search::{
    filter_projects, filter_publications, filter_researchers, Classification,
    ClassificationSource, FilterState, Page, Paginator,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub const EMPTY_QUERY_MESSAGE: &str = "Por favor ingresa una consulta de búsqueda";

/// Paginated tables in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Researchers,
    Projects,
    Publications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageAction {
    First,
    Prev,
    Next,
    Last,
}

/// Search accepted by [`SearchSession::begin_search`]
#[derive(Debug, Clone)]
pub struct PendingSearch {
    pub query: String,
    pub catalog: Arc<Catalog>,
}

/// Serializable view of the session state
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub search_input: String,
    pub search_term: String,
    pub selected_areas: Vec<String>,
    pub ai_detected_areas: Vec<String>,
    pub search_summary: String,
    pub search_error: Option<String>,
    pub search_loading: bool,
    pub classification_source: Option<ClassificationSource>,
    pub project_search: String,
    pub publication_search: String,
    pub selected_researcher: Option<i64>,
    pub chat: ChatHistory,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

pub struct SearchSession {
    id: Uuid,
    catalog: Arc<Catalog>,
    filters: FilterState,
    search_input: String,
    search_loading: bool,
    search_error: Option<String>,
    search_summary: String,
    classification_source: Option<ClassificationSource>,
    researcher_pager: Paginator,
    project_search: String,
    project_pager: Paginator,
    publication_search: String,
    publication_pager: Paginator,
    selected_researcher: Option<i64>,
    chat: ChatHistory,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl SearchSession {
    pub fn new(catalog: Arc<Catalog>, config: &SearchConfig, chatbot_ready: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            catalog,
            filters: FilterState::new(),
            search_input: String::new(),
            search_loading: false,
            search_error: None,
            search_summary: String::new(),
            classification_source: None,
            researcher_pager: Paginator::new(config.page_size),
            project_search: String::new(),
            project_pager: Paginator::new(config.page_size),
            publication_search: String::new(),
            publication_pager: Paginator::new(config.page_size),
            selected_researcher: None,
            chat: ChatHistory::new(chatbot_ready),
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search_error(&self) -> Option<&str> {
        self.search_error.as_deref()
    }

    pub fn search_summary(&self) -> &str {
        &self.search_summary
    }

    pub fn is_search_loading(&self) -> bool {
        self.search_loading
    }

    pub fn chat(&self) -> &ChatHistory {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatHistory {
        &mut self.chat
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    // ---- search box ----

    pub fn set_search_input(&mut self, text: &str) {
        self.search_input = text.to_string();
    }

    /// Validate the input and mark the search as in flight.
    ///
    /// A blank query sets the validation message and mutates nothing else.
    pub fn begin_search(&mut self) -> Result<PendingSearch> {
        let query = self.search_input.trim().to_string();

        if query.is_empty() {
            self.search_error = Some(EMPTY_QUERY_MESSAGE.to_string());
            return Err(AppError::Validation {
                message: EMPTY_QUERY_MESSAGE.to_string(),
                field: Some("query".to_string()),
            });
        }

        if self.search_loading {
            return Err(AppError::SearchInProgress {
                id: self.id.to_string(),
            });
        }

        self.search_loading = true;
        self.search_error = None;
        self.search_summary.clear();

        Ok(PendingSearch {
            query,
            catalog: self.catalog.clone(),
        })
    }

    /// Merge a finished classification into the filters
    pub fn finish_search(&mut self, pending: &PendingSearch, classification: Classification) {
        self.filters.apply_intent(
            &classification.intent,
            &pending.query,
            self.catalog.vocabulary(),
        );
        self.search_summary = classification.intent.summary().to_string();
        self.classification_source = Some(classification.source);
        self.search_loading = false;
        self.researcher_pager.reset();

        info!(
            session_id = %self.id,
            intent = classification.intent.kind(),
            search_term = self.filters.search_term(),
            areas = self.filters.selected_areas().len(),
            "Search applied"
        );
    }

    /// Both halves around the classifier, for callers holding the session
    /// exclusively
    #[cfg(test)]
    pub(crate) async fn submit_search(
        &mut self,
        classifier: &crate::search::IntentClassifier,
    ) -> Result<()> {
        let pending = self.begin_search()?;
        let classification = classifier.classify(&pending.query, &pending.catalog).await;
        self.finish_search(&pending, classification);
        Ok(())
    }

    // ---- area filters ----

    /// Values outside the vocabulary are ignored
    pub fn add_area(&mut self, area: &str) -> bool {
        if !self.catalog.vocabulary().contains(area) {
            debug!(session_id = %self.id, area, "Ignoring area outside vocabulary");
            return false;
        }
        let changed = self.filters.add_area(area);
        if changed {
            self.researcher_pager.reset();
        }
        changed
    }

    pub fn remove_area(&mut self, area: &str) -> bool {
        let changed = self.filters.remove_area(area);
        if changed {
            self.researcher_pager.reset();
        }
        changed
    }

    pub fn clear_areas(&mut self) {
        self.filters.clear_areas();
        self.researcher_pager.reset();
    }

    /// Forget which areas came from the classifier, keeping the selection
    pub fn clear_detected_areas(&mut self) {
        self.filters.clear_detected_areas();
        self.search_summary.clear();
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.filters.set_search_term(term);
        self.researcher_pager.reset();
    }

    // ---- tables ----

    pub fn set_project_search(&mut self, text: &str) {
        self.project_search = text.to_string();
        self.project_pager.reset();
    }

    pub fn set_publication_search(&mut self, text: &str) {
        self.publication_search = text.to_string();
        self.publication_pager.reset();
    }

    pub fn navigate(&mut self, table: Table, action: PageAction) {
        let total = match table {
            Table::Researchers => self.filtered_researchers().len(),
            Table::Projects => self.filtered_projects().len(),
            Table::Publications => self.filtered_publications().len(),
        };

        let pager = match table {
            Table::Researchers => &mut self.researcher_pager,
            Table::Projects => &mut self.project_pager,
            Table::Publications => &mut self.publication_pager,
        };

        match action {
            PageAction::First => pager.first(),
            PageAction::Prev => pager.prev(),
            PageAction::Next => pager.next(total),
            PageAction::Last => pager.last(total),
        }
    }

    fn filtered_researchers(&self) -> Vec<&Researcher> {
        filter_researchers(
            self.catalog.researchers(),
            self.filters.search_term(),
            self.filters.selected_areas(),
        )
    }

    fn selected_key(&self) -> Option<&str> {
        let id = self.selected_researcher?;
        self.catalog
            .researcher(id)
            .map(|r| r.rut_ir.as_str())
            .filter(|key| !key.is_empty())
    }

    fn filtered_projects(&self) -> Vec<&Project> {
        match self.selected_key() {
            Some(key) => filter_projects(self.catalog.projects_for(key), &self.project_search),
            None => Vec::new(),
        }
    }

    fn filtered_publications(&self) -> Vec<&Publication> {
        match self.selected_key() {
            Some(key) => {
                filter_publications(self.catalog.publications_for(key), &self.publication_search)
            }
            None => Vec::new(),
        }
    }

    pub fn researchers_page(&self) -> Page<Researcher> {
        let filtered: Vec<Researcher> = self.filtered_researchers().into_iter().cloned().collect();
        crate::metrics::record_filtered("researchers", filtered.len());
        self.researcher_pager.page(&filtered)
    }

    /// Projects of the selected researcher; empty without a selection
    pub fn projects_page(&self) -> Page<Project> {
        let filtered: Vec<Project> = self.filtered_projects().into_iter().cloned().collect();
        crate::metrics::record_filtered("projects", filtered.len());
        self.project_pager.page(&filtered)
    }

    /// Publications of the selected researcher; empty without a selection
    pub fn publications_page(&self) -> Page<Publication> {
        let filtered: Vec<Publication> =
            self.filtered_publications().into_iter().cloned().collect();
        crate::metrics::record_filtered("publications", filtered.len());
        self.publication_pager.page(&filtered)
    }

    // ---- profile ----

    /// Select a researcher profile by textual id
    pub fn select_researcher(&mut self, id: &str) -> Result<ResearcherProfile> {
        let profile = self
            .catalog
            .profile(id)
            .ok_or_else(|| AppError::ResearcherNotFound { id: id.to_string() })?;

        self.selected_researcher = Some(profile.researcher.id);
        self.project_search.clear();
        self.publication_search.clear();
        self.project_pager.reset();
        self.publication_pager.reset();

        Ok(profile)
    }

    pub fn selected_profile(&self) -> Option<ResearcherProfile> {
        self.selected_researcher
            .and_then(|id| self.catalog.researcher(id))
            .map(|r| self.catalog.profile_of(r))
    }

    // ---- catalog ----

    /// Move to a newer catalog generation
    pub fn refresh_catalog(&mut self, catalog: Arc<Catalog>) {
        if Arc::ptr_eq(&self.catalog, &catalog) {
            return;
        }
        self.catalog = catalog;
        self.filters.revalidate(self.catalog.vocabulary());

        if let Some(id) = self.selected_researcher {
            if self.catalog.researcher(id).is_none() {
                self.selected_researcher = None;
            }
        }

        let researchers = self.filtered_researchers().len();
        let projects = self.filtered_projects().len();
        let publications = self.filtered_publications().len();
        self.researcher_pager.clamp(researchers);
        self.project_pager.clamp(projects);
        self.publication_pager.clamp(publications);
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            search_input: self.search_input.clone(),
            search_term: self.filters.search_term().to_string(),
            selected_areas: self.filters.selected_areas().to_vec(),
            ai_detected_areas: self.filters.ai_detected_areas().to_vec(),
            search_summary: self.search_summary.clone(),
            search_error: self.search_error.clone(),
            search_loading: self.search_loading,
            classification_source: self.classification_source,
            project_search: self.project_search.clone(),
            publication_search: self.publication_search.clone(),
            selected_researcher: self.selected_researcher,
            chat: self.chat.clone(),
            created_at: self.created_at,
            last_active: self.last_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{self, researcher};
    use crate::llm::{LanguageModel, MockModel};
    use crate::search::IntentClassifier;

    fn session() -> SearchSession {
        SearchSession::new(Arc::new(fixtures::catalog()), &SearchConfig::default(), false)
    }

    fn fallback() -> IntentClassifier {
        IntentClassifier::fallback_only(SearchConfig::default())
    }

    #[tokio::test]
    async fn test_blank_submit_changes_nothing() {
        let mut session = session();
        session.set_search_term("ana");
        session.add_area("MATEMATICAS");

        session.set_search_input("   ");
        let err = session.submit_search(&fallback()).await.unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(session.search_error(), Some(EMPTY_QUERY_MESSAGE));
        assert_eq!(session.filters().search_term(), "ana");
        assert_eq!(session.filters().selected_areas(), ["MATEMATICAS".to_string()]);
        assert!(!session.is_search_loading());
    }

    #[tokio::test]
    async fn test_submit_with_fallback() {
        let mut session = session();
        session.set_search_input("biotecnologia");
        session.submit_search(&fallback()).await.unwrap();

        let view = session.view();
        assert_eq!(view.selected_areas, vec!["BIOTECNOLOGIA"]);
        assert_eq!(view.ai_detected_areas, vec!["BIOTECNOLOGIA"]);
        assert_eq!(view.classification_source, Some(ClassificationSource::Fallback));
        assert!(view.search_summary.starts_with("Búsqueda simple"));
        assert_eq!(session.researchers_page().items[0].name, "Bruno Diaz");
    }

    #[tokio::test]
    async fn test_submit_with_model_hybrid() {
        let model: Arc<dyn LanguageModel> = Arc::new(MockModel::with_replies([
            r#"{"tipo_busqueda": "hibrida", "areas_detectadas": ["MATEMATICAS"],
                "nombres_detectados": ["Ana Soto"], "titulos_detectados": [],
                "terminos_busqueda": [], "resumen": "Ana en matemáticas"}"#,
        ]));
        let classifier = IntentClassifier::new(Some(model), SearchConfig::default());

        let mut session = session();
        session.set_search_input("ana soto matematicas");
        session.submit_search(&classifier).await.unwrap();

        assert_eq!(session.filters().search_term(), "Ana Soto");
        assert_eq!(session.search_summary(), "Ana en matemáticas");
        let page = session.researchers_page();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, 1);
    }

    #[tokio::test]
    async fn test_title_query_resolves_to_owner() {
        let model = Arc::new(MockModel::with_replies([
            r#"{"tipo_busqueda": "nombre", "areas_detectadas": [],
                "nombres_detectados": ["Alba Zambrano"],
                "titulos_detectados": ["Escala de soledad"],
                "terminos_busqueda": [], "resumen": "Autora de la escala"}"#,
        ]));
        let classifier = IntentClassifier::new(
            Some(model.clone() as Arc<dyn LanguageModel>),
            SearchConfig::default(),
        );

        let mut session = session();
        session.set_search_input("validacion escala de soledad");
        session.submit_search(&classifier).await.unwrap();

        let (system, _) = model.prompts().await.remove(0);
        assert!(system.contains("INSTRUCCIONES PARA BÚSQUEDA POR TÍTULOS"));
        assert!(system.contains("Publicaciones: Escala de soledad"));

        let page = session.researchers_page();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Alba Zambrano");
    }

    #[test]
    fn test_duplicate_submission_rejected() {
        let mut session = session();
        session.set_search_input("algo");
        let pending = session.begin_search().unwrap();

        assert!(matches!(
            session.begin_search(),
            Err(AppError::SearchInProgress { .. })
        ));

        let classification = Classification {
            intent: crate::search::fallback::classify(&pending.query, pending.catalog.vocabulary()),
            source: ClassificationSource::Fallback,
        };
        session.finish_search(&pending, classification);
        assert!(!session.is_search_loading());
    }

    #[test]
    fn test_add_area_outside_vocabulary_ignored() {
        let mut session = session();
        assert!(!session.add_area("ASTROLOGIA"));
        assert!(session.add_area("FISICA"));
        assert!(!session.add_area("FISICA"));
        assert!(!session.remove_area("PSICOLOGIA"));
        assert_eq!(session.filters().selected_areas().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_detected_areas_clears_summary() {
        let mut session = session();
        session.set_search_input("matematicas");
        session.submit_search(&fallback()).await.unwrap();

        session.clear_detected_areas();
        assert!(session.filters().ai_detected_areas().is_empty());
        assert_eq!(session.filters().selected_areas(), ["MATEMATICAS".to_string()]);
        assert!(session.search_summary().is_empty());
    }

    #[test]
    fn test_researcher_pagination_resets_on_filter_change() {
        let researchers: Vec<Researcher> = (1..=50)
            .map(|i| researcher(i, &format!("Persona {i}"), &["X"], &i.to_string()))
            .collect();
        let catalog = Arc::new(Catalog::new(researchers, vec![], vec![]));
        let mut session = SearchSession::new(catalog, &SearchConfig::default(), false);

        session.navigate(Table::Researchers, PageAction::Last);
        assert_eq!(session.researchers_page().offset, 48);
        session.navigate(Table::Researchers, PageAction::Next);
        assert_eq!(session.researchers_page().page_number, 3);

        session.add_area("X");
        assert_eq!(session.researchers_page().offset, 0);
    }

    #[test]
    fn test_profile_tables() {
        let mut session = session();
        assert!(session.projects_page().items.is_empty());
        assert!(matches!(
            session.select_researcher("abc"),
            Err(AppError::ResearcherNotFound { .. })
        ));

        let profile = session.select_researcher("1").unwrap();
        assert_eq!(profile.project_count, 2);
        assert_eq!(session.projects_page().total, 2);

        session.set_project_search("geometria");
        assert_eq!(session.projects_page().items[0].code, "DI-2");
        assert_eq!(session.publications_page().total, 1);
    }

    #[test]
    fn test_refresh_catalog_revalidates() {
        let mut session = session();
        session.add_area("PSICOLOGIA");
        session.select_researcher("2").unwrap();

        let next = Arc::new(Catalog::new(
            vec![researcher(1, "Ana Soto", &["MATEMATICAS"], "100")],
            vec![],
            vec![],
        ));
        session.refresh_catalog(next);

        assert!(session.filters().selected_areas().is_empty());
        assert!(session.selected_profile().is_none());
    }
}
