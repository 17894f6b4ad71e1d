//! JSON HTTP surface over a shared [`Dispenser`].
//!
//! Handlers are thin: request bodies are validated here, everything else is
//! delegated to the allocator, whose refusals are mapped to status codes
//! through [`PublicErrorCode`].

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Number, Value};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use dispenser_core::{AssignmentRecord, Dispenser, DispenserError, Territory, TerritoryId};

use crate::config::DaemonConfig;
use crate::public_error::PublicErrorCode;
use crate::telemetry::Telemetry;

#[derive(Clone)]
pub struct HttpApiState {
    pub cfg: DaemonConfig,
    pub dispenser: Dispenser,
    pub telemetry: Telemetry,
}

pub fn build_state(cfg: DaemonConfig, dispenser: Dispenser, telemetry: Telemetry) -> HttpApiState {
    HttpApiState {
        cfg,
        dispenser,
        telemetry,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhausted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToggleResponse {
    pub success: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssignResponse {
    pub territory: Territory,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminAssignResponse {
    pub success: bool,
    pub assignment: AssignmentRecord,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub cleared: usize,
}

#[derive(Debug)]
pub struct HttpErr {
    pub(crate) status: StatusCode,
    pub(crate) response: ErrorResponse,
}

impl HttpErr {
    fn new(code: PublicErrorCode, error: &str) -> Self {
        Self {
            status: code.status(),
            response: ErrorResponse {
                error: error.to_string(),
                code: code.as_str().to_string(),
                exhausted: None,
            },
        }
    }

    fn invalid_body() -> Self {
        Self::new(PublicErrorCode::InvalidInput, "Invalid request body")
    }

    fn invalid_id() -> Self {
        Self::new(PublicErrorCode::InvalidInput, "Invalid territory ID")
    }

    fn not_found() -> Self {
        Self::new(PublicErrorCode::NotFound, "Territory not found")
    }

    fn from_dispenser(err: &DispenserError) -> Self {
        let code = PublicErrorCode::from(err);
        match err {
            DispenserError::NotFound(_) => Self::not_found(),
            DispenserError::AlreadyAssigned(_) => Self::new(code, "Territory already assigned"),
            DispenserError::Exhausted => Self {
                response: ErrorResponse {
                    exhausted: Some(true),
                    ..Self::new(code, "All territories assigned").response
                },
                status: code.status(),
            },
            DispenserError::NoEligibleTerritory | DispenserError::CatalogLoad(_) => Self {
                response: ErrorResponse {
                    exhausted: Some(true),
                    ..Self::new(code, "Failed to assign territory").response
                },
                status: code.status(),
            },
        }
    }
}

pub fn router(state: HttpApiState) -> Router {
    Router::new()
        .route(
            "/api/territories",
            get(list_territories).patch(toggle_territory),
        )
        .route("/api/territories/:id", get(get_territory))
        .route("/api/assign", get(assign_next))
        .route("/api/stats", get(stats))
        .route("/api/admin/assign", post(admin_assign))
        .route("/api/admin/reset", post(admin_reset))
        .route("/api/admin/assignments", get(admin_assignments))
        .route("/metrics", get(metrics))
        .layer(RequestBodyLimitLayer::new(state.cfg.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: HttpApiState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

pub async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener, std::io::Error> {
    let socket: SocketAddr = match addr.parse() {
        Ok(v) => v,
        Err(_) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "invalid listen address",
            ))
        }
    };
    tokio::net::TcpListener::bind(socket).await
}

fn finish<T: Serialize>(
    state: &HttpApiState,
    route: &'static str,
    started: Instant,
    outcome: Result<T, HttpErr>,
) -> Response {
    let response = match outcome {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => (err.status, Json(err.response)).into_response(),
    };
    state
        .telemetry
        .record_latency_ms(started.elapsed().as_millis() as u64);
    state
        .telemetry
        .record_request(route, response.status().as_u16());
    response
}

async fn list_territories(State(state): State<HttpApiState>) -> Response {
    let started = Instant::now();
    let territories = state.dispenser.list();
    finish(&state, "/api/territories", started, Ok::<_, HttpErr>(territories))
}

async fn toggle_territory(State(state): State<HttpApiState>, body: axum::body::Bytes) -> Response {
    let started = Instant::now();
    let outcome = toggle_territory_impl(&state, &body);
    finish(&state, "/api/territories", started, outcome)
}

async fn get_territory(State(state): State<HttpApiState>, Path(raw_id): Path<String>) -> Response {
    let started = Instant::now();
    let outcome = get_territory_impl(&state, &raw_id);
    finish(&state, "/api/territories/:id", started, outcome)
}

async fn assign_next(State(state): State<HttpApiState>) -> Response {
    let started = Instant::now();
    let outcome = assign_next_impl(&state);
    finish(&state, "/api/assign", started, outcome)
}

async fn stats(State(state): State<HttpApiState>) -> Response {
    let started = Instant::now();
    let stats = state.dispenser.stats();
    finish(&state, "/api/stats", started, Ok::<_, HttpErr>(stats))
}

async fn admin_assign(State(state): State<HttpApiState>, body: axum::body::Bytes) -> Response {
    let started = Instant::now();
    let outcome = admin_assign_impl(&state, &body);
    finish(&state, "/api/admin/assign", started, outcome)
}

async fn admin_reset(State(state): State<HttpApiState>) -> Response {
    let started = Instant::now();
    let outcome = admin_reset_impl(&state);
    finish(&state, "/api/admin/reset", started, Ok::<_, HttpErr>(outcome))
}

async fn admin_assignments(State(state): State<HttpApiState>) -> Response {
    let started = Instant::now();
    let records = state.dispenser.assignments();
    finish(&state, "/api/admin/assignments", started, Ok::<_, HttpErr>(records))
}

async fn metrics(State(state): State<HttpApiState>) -> Response {
    let body = state.telemetry.render(&state.dispenser.stats());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

/// Extracts `id` from a `{"id": n}` body.
///
/// Anything that is not a JSON number is rejected as invalid input. Numbers
/// that cannot name a territory (fractions, zero, negatives, out of range)
/// are reported as not found, the same as an unknown id.
pub fn parse_territory_id(body: &[u8]) -> Result<TerritoryId, HttpErr> {
    let value: Value = serde_json::from_slice(body).map_err(|_| HttpErr::invalid_body())?;
    match value.get("id") {
        Some(Value::Number(n)) => territory_id_from_number(n).ok_or_else(HttpErr::not_found),
        _ => Err(HttpErr::invalid_id()),
    }
}

fn territory_id_from_number(n: &Number) -> Option<TerritoryId> {
    match n.as_u64() {
        Some(id) => TerritoryId::try_from(id).ok().filter(|id| *id > 0),
        None => territory_id_from_f64(n.as_f64()?),
    }
}

fn territory_id_from_f64(v: f64) -> Option<TerritoryId> {
    if v.fract() == 0.0 && v >= 1.0 && v <= f64::from(TerritoryId::MAX) {
        Some(v as TerritoryId)
    } else {
        None
    }
}

pub fn toggle_territory_impl(state: &HttpApiState, body: &[u8]) -> Result<ToggleResponse, HttpErr> {
    let id = parse_territory_id(body)?;
    let active = state
        .dispenser
        .toggle_active(id)
        .map_err(|err| HttpErr::from_dispenser(&err))?;
    state.telemetry.record_toggle();
    Ok(ToggleResponse {
        success: true,
        active,
    })
}

pub fn get_territory_impl(state: &HttpApiState, raw_id: &str) -> Result<Territory, HttpErr> {
    // Unparseable path segments name no territory.
    let id = match raw_id.parse::<u64>() {
        Ok(id) => TerritoryId::try_from(id).ok().filter(|id| *id > 0),
        Err(_) => raw_id.parse::<f64>().ok().and_then(territory_id_from_f64),
    }
    .ok_or_else(HttpErr::not_found)?;
    state
        .dispenser
        .get_by_id(id)
        .ok_or_else(|| HttpErr::from_dispenser(&DispenserError::NotFound(id)))
}

pub fn assign_next_impl(state: &HttpApiState) -> Result<AssignResponse, HttpErr> {
    match state.dispenser.claim() {
        Ok(territory) => {
            state.telemetry.record_assignment("assigned");
            Ok(AssignResponse { territory })
        }
        Err(err) => {
            let outcome = match err {
                DispenserError::Exhausted => "exhausted",
                _ => "failed",
            };
            state.telemetry.record_assignment(outcome);
            if outcome == "failed" {
                tracing::error!(error = %err, "assignment failed with capacity remaining");
            }
            Err(HttpErr::from_dispenser(&err))
        }
    }
}

pub fn admin_assign_impl(
    state: &HttpApiState,
    body: &[u8],
) -> Result<AdminAssignResponse, HttpErr> {
    let id = parse_territory_id(body)?;
    let assignment = state
        .dispenser
        .assign_specific(id)
        .map_err(|err| HttpErr::from_dispenser(&err))?;
    state.telemetry.record_assignment("manual");
    Ok(AdminAssignResponse {
        success: true,
        assignment,
    })
}

pub fn admin_reset_impl(state: &HttpApiState) -> ResetResponse {
    let cleared = state.dispenser.reset();
    state.telemetry.record_reset();
    ResetResponse {
        success: true,
        message: "System reset successfully".to_string(),
        cleared,
    }
}
