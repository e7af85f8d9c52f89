//! Celestial Archive API Server
//!
//! HTTP surface for the reflection flow, theme switch, emotional monitor
//! toggle and intervention gate.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use camera_session::{CameraDevice, ReplayCamera};
use expression::{DistressDetector, ModelLoader, ModelState, OnnxModelSource};
use intervention::InterventionGate;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use monitor::{DistressObserver, MonitorController, MonitorState};
use prompt_service::{PromptClient, PromptService};
use reflection::{ReflectionFlow, SharedTheme, ThemeVariant};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod logging;
mod routes;
pub mod settings;

pub use error::ApiError;
pub use logging::init_logging;
pub use settings::AppSettings;

/// Application state shared across handlers
pub struct AppState {
    pub flow: RwLock<ReflectionFlow>,
    pub theme: SharedTheme,
    pub gate: Arc<InterventionGate>,
    pub monitor: MonitorController,
    pub loader: Arc<ModelLoader>,
    pub prompts: Arc<dyn PromptService>,
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the components together. The monitor's distress events open the
    /// intervention gate.
    pub fn new(
        settings: &AppSettings,
        camera: Arc<dyn CameraDevice>,
        loader: Arc<ModelLoader>,
        prompts: Arc<dyn PromptService>,
    ) -> Self {
        let theme = SharedTheme::new(ThemeVariant::default());
        let gate = Arc::new(InterventionGate::new(
            settings.intervention.clone(),
            theme.clone(),
        ));

        let detector = Arc::new(DistressDetector::new(
            loader.clone(),
            settings.detection.clone(),
        ));
        let observer: Arc<dyn DistressObserver> = {
            let gate = gate.clone();
            Arc::new(move || {
                gate.on_distress();
            })
        };
        let monitor = MonitorController::new(camera, detector, observer, settings.monitor.clone());

        Self {
            flow: RwLock::new(ReflectionFlow::new()),
            theme,
            gate,
            monitor,
            loader,
            prompts,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Production wiring: replay camera, ONNX models, HTTP prompt client
    pub fn from_settings(settings: &AppSettings) -> Result<Self, ApiError> {
        let camera = Arc::new(ReplayCamera::new(settings.camera.replay_dir.clone()));
        let loader = ModelLoader::install_global(Arc::new(OnnxModelSource::new(&settings.detection)));
        let prompts = Arc::new(PromptClient::new(settings.prompt.clone())?);
        Ok(Self::new(settings, camera, loader, prompts))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub monitor: MonitorState,
    pub models: ModelState,
    pub intervention_open: bool,
    pub theme: ThemeVariant,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/behaviors", get(routes::catalog::behaviors))
        .route("/api/v1/questions", get(routes::catalog::questions))
        .route("/api/v1/flow", get(routes::flow::get_flow))
        .route("/api/v1/flow/start", post(routes::flow::start))
        .route("/api/v1/flow/behavior", post(routes::flow::select_behavior))
        .route("/api/v1/flow/answer", post(routes::flow::answer))
        .route("/api/v1/flow/next", post(routes::flow::next))
        .route("/api/v1/flow/back", post(routes::flow::back))
        .route("/api/v1/flow/journal", post(routes::flow::journal))
        .route("/api/v1/flow/start-over", post(routes::flow::start_over))
        .route(
            "/api/v1/theme",
            get(routes::theme::get_theme).post(routes::theme::set_theme),
        )
        .route("/api/v1/monitor", get(routes::monitor::get_status))
        .route("/api/v1/monitor/enable", post(routes::monitor::enable))
        .route("/api/v1/monitor/disable", post(routes::monitor::disable))
        .route("/api/v1/intervention", get(routes::intervention::get_status))
        .route("/api/v1/intervention/open", post(routes::intervention::open))
        .route("/api/v1/intervention/close", post(routes::intervention::close))
        .route(
            "/api/v1/intervention/grounding",
            post(routes::intervention::show_grounding),
        )
        .route(
            "/api/v1/intervention/breathing",
            post(routes::intervention::back_to_breathing),
        )
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            monitor: state.monitor.state(),
            models: state.loader.state(),
            intervention_open: state.gate.is_open(),
            theme: state.theme.get(),
        },
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Install the Prometheus recorder
pub fn install_metrics() -> Result<PrometheusHandle, ApiError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ApiError::Metrics(e.to_string()))
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: AppSettings) -> Result<(), ApiError> {
    let handle = install_metrics()?;
    let state = Arc::new(AppState::from_settings(&settings)?.with_metrics(handle));
    let app = create_router(state.clone());

    info!("Starting API server on {}", settings.server.addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.monitor.disable();
    state.monitor.wait_idle().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
