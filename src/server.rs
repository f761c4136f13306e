use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::alert::{apply_alert_rules, dispatch_alerts, evaluate_alerts, sinks_from_config};
use crate::classifiers::{ClassifierRegistry, DiffSettings};
use crate::config::Config;
use crate::engine::DiffEngine;
use crate::model::codes::CODE_TABLE;
use crate::model::{ComparisonMeta, EnvDiff, FindingCategory, SignalEnvelope};
use crate::output::json::DiffReport;
use crate::snapshot::{DiffRecord, DiffStore};

const DEFAULT_COMPARISON_ID: &str = "adhoc";
const MAX_HISTORY_LIMIT: usize = 500;

#[derive(Clone)]
struct ApiState {
    config: Config,
    engine: DiffEngine,
    db_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Deserialize)]
struct DiffRequest {
    left: SignalEnvelope,
    right: SignalEnvelope,
    comparison_id: Option<String>,
    left_probe_id: Option<String>,
    right_probe_id: Option<String>,
    #[serde(default)]
    persist: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct HistoryQuery {
    comparison_id: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct CodeInfo {
    code: &'static str,
    category: FindingCategory,
    summary: &'static str,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    records: Vec<DiffRecord>,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let state = ApiState {
        db_path: config.resolved_db_path(),
        engine: DiffEngine::new(ClassifierRegistry::with_defaults(), config.diff_settings()),
        config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/codes", get(codes))
        .route("/v1/config", get(show_config))
        .route("/v1/diff", post(create_diff))
        .route("/v1/history", get(history))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn codes(State(state): State<ApiState>) -> Json<ApiResponse<Vec<CodeInfo>>> {
    ok(code_catalog(state.engine.settings()))
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn create_diff(
    State(state): State<ApiState>,
    Json(request): Json<DiffRequest>,
) -> ApiResult<DiffReport> {
    let comparison_id = request
        .comparison_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_COMPARISON_ID)
        .to_string();
    let meta = ComparisonMeta {
        comparison_id,
        left_probe_id: request.left_probe_id,
        right_probe_id: request.right_probe_id,
    };
    let diff = state.engine.build(&request.left, &request.right, &meta);

    if !request.persist {
        let alerts = apply_alert_rules(evaluate_alerts(None, &diff), &state.config.alerts.rules);
        return Ok(ok(DiffReport::new(diff, alerts)));
    }

    let previous = persist_diff(&state, &diff)?;
    let alerts = apply_alert_rules(
        evaluate_alerts(previous.as_ref(), &diff),
        &state.config.alerts.rules,
    );
    let sinks = sinks_from_config(&state.config.alerts).map_err(ApiError::internal)?;
    dispatch_alerts(&sinks, &alerts).await;
    Ok(ok(DiffReport::new(diff, alerts)))
}

async fn history(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<HistoryResponse> {
    let limit = clamp_limit(query.limit)?;
    let store = open_store(&state)?;
    let records = store
        .list_recent(query.comparison_id.as_deref(), limit)
        .map_err(ApiError::internal)?;
    Ok(ok(HistoryResponse { records }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn open_store(state: &ApiState) -> std::result::Result<DiffStore, ApiError> {
    DiffStore::open(&state.db_path).map_err(ApiError::internal)
}

/// Returns the previously stored diff for the same comparison, if any.
fn persist_diff(
    state: &ApiState,
    diff: &EnvDiff,
) -> std::result::Result<Option<EnvDiff>, ApiError> {
    let store = open_store(state)?;
    let previous = store
        .latest_for_comparison(&diff.comparison_id)
        .map_err(ApiError::internal)?;
    let id = store.insert_diff(diff).map_err(ApiError::internal)?;
    info!(comparison = %diff.comparison_id, id, "persisted diff");
    Ok(previous)
}

fn code_catalog(settings: &DiffSettings) -> Vec<CodeInfo> {
    CODE_TABLE
        .iter()
        .map(|entry| CodeInfo {
            code: entry.code,
            category: entry.category,
            summary: entry.summary,
            enabled: settings.is_enabled(entry.code),
        })
        .collect()
}

fn clamp_limit(limit: Option<usize>) -> std::result::Result<usize, ApiError> {
    match limit {
        None => Ok(20),
        Some(0) => Err(ApiError::bad_request("limit must be at least 1")),
        Some(limit) => Ok(limit.min(MAX_HISTORY_LIMIT)),
    }
}
