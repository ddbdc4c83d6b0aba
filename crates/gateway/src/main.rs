//! Research Observatory API Gateway
//!
//! The entry point for the observatory's HTTP API.
//! Handles:
//! - Search sessions (query classification, area filters, paginated tables)
//! - Researcher profiles and the document chatbot
//! - Rate limiting
//! - Observability (logging, metrics)

mod handlers;
mod middleware;
mod registry;

use anyhow::Context;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use observatory_common::{
    catalog::{Catalog, SharedCatalog},
    chatbot::DocumentChatbot,
    config::{AppConfig, ObservabilityConfig},
    llm,
    metrics::{self, LATENCY_BUCKETS, METRICS_PREFIX, MODEL_BUCKETS},
    IntentClassifier,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::middleware::{
    metrics::track_metrics,
    rate_limit::{rate_limit_middleware, RateLimit},
};
use crate::registry::SessionRegistry;

/// How often idle sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: SharedCatalog,
    pub classifier: IntentClassifier,
    pub chatbot: Arc<DocumentChatbot>,
    pub sessions: SessionRegistry,
    pub metrics: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load().context("Failed to load configuration")?);

    init_tracing(&config.observability)?;

    info!(
        service = %config.observability.service_name,
        "Starting Research Observatory API Gateway v{}",
        observatory_common::VERSION
    );

    // Initialize metrics
    let metrics_handle = install_metrics_recorder()?;
    metrics::register_metrics();

    // Load the catalog; a failed initial load starts empty and can be
    // retried through the reload endpoint
    let catalog = match SharedCatalog::load(config.data.clone()).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "Initial catalog load failed, starting empty");
            SharedCatalog::new(Catalog::empty(), config.data.clone())
        }
    };

    // Language model backend
    let model = llm::from_config(&config.llm)?;
    if model.is_none() {
        warn!("No language model configured; search runs on the local fallback");
    }
    let classifier = IntentClassifier::new(model.clone(), config.search.clone());

    // Document chatbot
    let documents_dir = config.data.documents_dir.clone();
    let chatbot = tokio::task::spawn_blocking(move || {
        DocumentChatbot::from_directory(model, &documents_dir)
    })
    .await
    .context("Chatbot initialization task failed")?;

    // Sessions
    let sessions = SessionRegistry::new(config.session_ttl());
    sessions.spawn_cleanup(SESSION_SWEEP_INTERVAL);

    // Create app state
    let state = AppState {
        config: config.clone(),
        catalog,
        classifier,
        chatbot: Arc::new(chatbot),
        sessions,
        metrics: metrics_handle,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber from the observability section
fn init_tracing(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    }
    .context("Failed to initialize tracing")
}

/// Install the Prometheus recorder with latency-aligned buckets
fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_request_duration_seconds", METRICS_PREFIX)),
            LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_classification_duration_seconds", METRICS_PREFIX)),
            MODEL_BUCKETS,
        )?
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    Ok(handle)
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Catalog endpoints
        .route("/areas", get(handlers::catalog::list_areas))
        .route("/catalog/reload", post(handlers::catalog::reload))
        .route("/researchers/{id}", get(handlers::profiles::get_researcher))
        .route("/chatbot", get(handlers::chat::status))

        // Session endpoints
        .route("/sessions", post(handlers::sessions::create_session))
        .route(
            "/sessions/{id}",
            get(handlers::sessions::get_session).delete(handlers::sessions::delete_session),
        )

        // Search box
        .route("/sessions/{id}/search/input", put(handlers::search::set_input))
        .route("/sessions/{id}/search", post(handlers::search::submit))

        // Area filters
        .route(
            "/sessions/{id}/areas",
            post(handlers::areas::add_area).delete(handlers::areas::clear_areas),
        )
        .route("/sessions/{id}/areas/{area}", delete(handlers::areas::remove_area))
        .route(
            "/sessions/{id}/detected-areas",
            delete(handlers::areas::clear_detected_areas),
        )

        // Tables
        .route("/sessions/{id}/tables/{table}", get(handlers::tables::get_page))
        .route("/sessions/{id}/tables/{table}/search", put(handlers::tables::set_search))
        .route("/sessions/{id}/tables/{table}/page", post(handlers::tables::navigate))

        // Profile and chat
        .route(
            "/sessions/{id}/profile",
            post(handlers::profiles::select_profile).get(handlers::profiles::get_selected_profile),
        )
        .route("/sessions/{id}/chat", post(handlers::chat::send_message))
        .route_layer(from_fn(track_metrics));

    let rate_limit = &state.config.rate_limit;
    let api_routes = if rate_limit.enabled {
        api_routes.layer(from_fn_with_state(
            RateLimit::new(rate_limit.requests_per_second, rate_limit.burst),
            rate_limit_middleware,
        ))
    } else {
        api_routes
    };

    let timeout = state.config.request_timeout();

    // Compose the app
    Router::new()
        // Health endpoints (no rate limit)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/v1", api_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use observatory_common::{
        catalog::{Project, Researcher},
        chatbot::UNAVAILABLE_MESSAGE,
        config::DataConfig,
        llm::{LanguageModel, MockModel},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn researcher(id: i64, name: &str, areas: &[&str], rut: &str) -> Researcher {
        Researcher {
            id,
            name: name.to_string(),
            degree: "DOCTORA".to_string(),
            orcid: String::new(),
            email: String::new(),
            areas: areas.iter().map(|a| a.to_string()).collect(),
            rut_ir: rut.to_string(),
            unit: "Facultad".to_string(),
            program: None,
        }
    }

    fn test_state(model: Option<Arc<dyn LanguageModel>>) -> AppState {
        let catalog = Catalog::new(
            vec![
                researcher(1, "Ana Soto", &["MATEMATICAS", "FISICA"], "100"),
                researcher(2, "Bruno Diaz", &["BIOTECNOLOGIA"], "200"),
            ],
            vec![Project {
                rut_ir: "100".to_string(),
                code: "DI-1".to_string(),
                title: "Teoria espectral".to_string(),
                year: 2021,
                discipline: "MATEMATICAS".to_string(),
                project_type: "Regular".to_string(),
                role: "Directora".to_string(),
                lead_investigator: "Ana Soto".to_string(),
                co_investigator: String::new(),
                unit: "Facultad".to_string(),
            }],
            vec![],
        );
        let config = AppConfig::default();

        AppState {
            catalog: SharedCatalog::new(catalog, DataConfig::default()),
            classifier: IntentClassifier::new(model, config.search.clone()),
            chatbot: Arc::new(DocumentChatbot::new(None, Vec::new())),
            sessions: SessionRegistry::new(config.session_ttl()),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
            config: Arc::new(config),
        }
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state(None));
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_reports_fallback() {
        let app = create_router(test_state(None));
        let (status, body) = call(&app, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["classifier"]["status"], "degraded");
        assert_eq!(body["checks"]["chatbot"]["ready"], false);
    }

    #[tokio::test]
    async fn test_areas_sorted() {
        let app = create_router(test_state(None));
        let (_, body) = call(&app, Method::GET, "/v1/areas", None).await;
        assert_eq!(body["areas"], json!(["BIOTECNOLOGIA", "FISICA", "MATEMATICAS"]));
    }

    #[tokio::test]
    async fn test_fallback_search_flow() {
        let app = create_router(test_state(None));
        let id = create_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/search"),
            Some(json!({ "query": "quiero experta en biotecnologia" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["selected_areas"], json!(["BIOTECNOLOGIA"]));
        assert_eq!(body["session"]["classification_source"], "fallback");
        assert_eq!(body["researchers"]["total"], 1);
        assert_eq!(body["researchers"]["items"][0]["name"], "Bruno Diaz");
    }

    #[tokio::test]
    async fn test_model_search_flow() {
        let model: Arc<dyn LanguageModel> = Arc::new(MockModel::with_replies([
            r#"{"tipo_busqueda": "nombre", "nombres_detectados": ["Ana Soto"],
                "areas_detectadas": [], "titulos_detectados": [],
                "terminos_busqueda": [], "resumen": "Busca a Ana Soto"}"#,
        ]));
        let app = create_router(test_state(Some(model)));
        let id = create_session(&app).await;

        let (_, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/search"),
            Some(json!({ "query": "ana soto" })),
        )
        .await;

        assert_eq!(body["session"]["search_term"], "Ana Soto");
        assert_eq!(body["session"]["search_summary"], "Busca a Ana Soto");
        assert_eq!(body["session"]["classification_source"], "model");
    }

    #[tokio::test]
    async fn test_blank_search_rejected() {
        let app = create_router(test_state(None));
        let id = create_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/search"),
            Some(json!({ "query": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].is_string());

        let (_, view) = call(&app, Method::GET, &format!("/v1/sessions/{id}"), None).await;
        assert!(view["search_error"].is_string());
        assert_eq!(view["search_term"], "");
    }

    #[tokio::test]
    async fn test_area_filters() {
        let app = create_router(test_state(None));
        let id = create_session(&app).await;
        let uri = format!("/v1/sessions/{id}/areas");

        let (_, body) = call(&app, Method::POST, &uri, Some(json!({ "area": "FISICA" }))).await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["researchers"]["total"], 1);

        let (_, body) = call(&app, Method::POST, &uri, Some(json!({ "area": "ASTROLOGIA" }))).await;
        assert_eq!(body["changed"], false);

        let (_, body) = call(&app, Method::DELETE, &format!("{uri}/FISICA"), None).await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["researchers"]["total"], 2);
    }

    #[tokio::test]
    async fn test_profile_and_tables() {
        let app = create_router(test_state(None));
        let id = create_session(&app).await;

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/profile"),
            Some(json!({ "researcher_id": "99" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, profile) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/profile"),
            Some(json!({ "researcher_id": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["initials"], "AS");
        assert_eq!(profile["project_count"], 1);

        let uri = format!("/v1/sessions/{id}/tables/projects");
        let (_, page) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(page["total"], 1);

        let (_, page) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/tables/projects/page"),
            Some(json!({ "action": "next" })),
        )
        .await;
        assert_eq!(page["offset"], 0);
    }

    #[tokio::test]
    async fn test_chat_unavailable() {
        let app = create_router(test_state(None));
        let id = create_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/v1/sessions/{id}/chat"),
            Some(json!({ "message": "¿Qué dice el informe?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let messages = body["chat"]["messages"].as_array().unwrap();
        assert_eq!(messages.last().unwrap()["content"], UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let app = create_router(test_state(None));
        let (status, body) = call(
            &app,
            Method::GET,
            "/v1/sessions/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
    }
}
