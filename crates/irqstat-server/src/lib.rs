//! HTTP API for irqstat.
//!
//! Serves IRQ listings, per-period interrupt distribution and affinity control
//! as JSON. Core calls may block (a period request sleeps for the whole
//! period), so every handler runs its call on tokio's blocking pool.

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{
        Path, Query, State,
        rejection::{FormRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use irqstat_core::api::{
    CpuAffinityResponse, ErrorResponse, IrqInfoResponse, SetAffinityRequest,
};
use irqstat_core::{
    InterruptTotalsForPeriod, InterruptTotalsForPeriodForCpu, IrqError, IrqOperations,
};

#[derive(Deserialize)]
struct PeriodParams {
    /// Sampling window in seconds; the service default when absent.
    period_seconds: Option<u64>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_cpus: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Handler failure: a malformed request, an engine error, or the blocking
/// task itself died.
enum ApiError {
    BadRequest(String),
    Core(IrqError),
    Internal(String),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// HTTP status for each engine error kind.
pub fn status_for(err: &IrqError) -> StatusCode {
    match err {
        IrqError::NotFound(_) => StatusCode::NOT_FOUND,
        IrqError::InvalidMask(_) | IrqError::OutOfRange { .. } | IrqError::InvalidPeriod { .. } => {
            StatusCode::BAD_REQUEST
        }
        IrqError::WriteRejected { .. } => StatusCode::CONFLICT,
        IrqError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "bad_request".to_string(),
                    message,
                }),
            )
                .into_response(),
            Self::Core(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    log::warn!("request failed: {err}");
                }
                (status, Json(ErrorResponse::from_error(&err))).into_response()
            }
            Self::Internal(message) => {
                log::error!("request task failed: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "internal".to_string(),
                        message,
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Run `f` against the service on the blocking pool.
async fn blocking<S, T, F>(service: &Arc<S>, f: F) -> Result<T, ApiError>
where
    S: IrqOperations + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> irqstat_core::Result<T> + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::Core)
}

async fn handle_list_irqs<S: IrqOperations + 'static>(
    State(service): State<Arc<S>>,
) -> Result<Json<IrqInfoResponse>, ApiError> {
    let info = blocking(&service, |s| s.list_irqs()).await?;
    Ok(Json(IrqInfoResponse::from_info(&info)))
}

async fn handle_get_affinity<S: IrqOperations + 'static>(
    State(service): State<Arc<S>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<CpuAffinityResponse>, ApiError> {
    let Path(irq) = path?;
    let lookup = irq.clone();
    let mask = blocking(&service, move |s| s.get_affinity(&lookup)).await?;
    Ok(Json(CpuAffinityResponse::from_mask(&irq, &mask)))
}

async fn handle_set_affinity<S: IrqOperations + 'static>(
    State(service): State<Arc<S>>,
    path: Result<Path<String>, PathRejection>,
    form: Result<Form<SetAffinityRequest>, FormRejection>,
) -> Result<Json<CpuAffinityResponse>, ApiError> {
    let Path(irq) = path?;
    let Form(body) = form?;
    let target = irq.clone();
    let mask = blocking(&service, move |s| {
        s.set_affinity(&target, &body.cpu_affinity_mask)
    })
    .await?;
    Ok(Json(CpuAffinityResponse::from_mask(&irq, &mask)))
}

async fn handle_interrupts<S: IrqOperations + 'static>(
    State(service): State<Arc<S>>,
    query: Result<Query<PeriodParams>, QueryRejection>,
) -> Result<Json<InterruptTotalsForPeriod>, ApiError> {
    let Query(params) = query?;
    let period = params
        .period_seconds
        .unwrap_or(service.config().default_period_seconds);
    let totals = blocking(&service, move |s| s.period_totals(period)).await?;
    Ok(Json(totals))
}

async fn handle_interrupts_for_cpu<S: IrqOperations + 'static>(
    State(service): State<Arc<S>>,
    path: Result<Path<usize>, PathRejection>,
    query: Result<Query<PeriodParams>, QueryRejection>,
) -> Result<Json<InterruptTotalsForPeriodForCpu>, ApiError> {
    let Path(cpu) = path?;
    let Query(params) = query?;
    let period = params
        .period_seconds
        .unwrap_or(service.config().default_period_seconds);
    let totals = blocking(&service, move |s| s.period_totals_for_cpu(cpu, period)).await?;
    Ok(Json(totals))
}

async fn handle_health<S: IrqOperations + 'static>(
    State(service): State<Arc<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    match blocking(&service, |s| s.num_cpus()).await {
        Ok(n) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                num_cpus: Some(n),
                error: None,
            }),
        ),
        Err(ApiError::Core(err)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
                num_cpus: None,
                error: Some(err.to_string()),
            }),
        ),
        Err(ApiError::Internal(message) | ApiError::BadRequest(message)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse {
                status: "unavailable".to_string(),
                num_cpus: None,
                error: Some(message),
            }),
        ),
    }
}

async fn handle_index<S: IrqOperations + 'static>(
    State(service): State<Arc<S>>,
) -> Json<serde_json::Value> {
    let config = service.config();
    Json(serde_json::json!({
        "name": "irqstat server",
        "version": irqstat_core::VERSION,
        "endpoints": {
            "/": "This API index",
            "/health": "Health check",
            "/irqs": "All IRQs with type, device, CPU affinity and lifetime per-CPU counts",
            "/irqs/{irq}/cpu_affinity": {
                "GET": "Current CPU affinity of one IRQ",
                "PUT": "Set CPU affinity; form field cpu_affinity_mask=<hex bitmap>",
            },
            "/interrupts": {
                "method": "GET",
                "description": "Per-CPU interrupt counts and distribution over a sampling period",
                "params": {
                    "period_seconds": format!(
                        "Sampling window (1-{}, default: {})",
                        config.max_period_seconds, config.default_period_seconds
                    ),
                }
            },
            "/interrupts/cpu/{cpu}": "Same as /interrupts, for a single CPU",
        },
        "examples": {
            "period": "/interrupts?period_seconds=5",
            "single_cpu": "/interrupts/cpu/0?period_seconds=5",
            "affinity": "/irqs/16/cpu_affinity",
        }
    }))
}

/// Build the axum router.
pub fn build_router<S: IrqOperations + 'static>(service: Arc<S>) -> Router {
    Router::new()
        .route("/", get(handle_index::<S>))
        .route("/health", get(handle_health::<S>))
        .route("/irqs", get(handle_list_irqs::<S>))
        .route(
            "/irqs/{irq}/cpu_affinity",
            get(handle_get_affinity::<S>).put(handle_set_affinity::<S>),
        )
        .route("/interrupts", get(handle_interrupts::<S>))
        .route("/interrupts/cpu/{cpu}", get(handle_interrupts_for_cpu::<S>))
        .with_state(service)
}

/// Serve the API on an already bound listener.
pub async fn serve<S: IrqOperations + 'static>(
    listener: TcpListener,
    service: Arc<S>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("irqstat server listening on http://{addr}");
    }
    axum::serve(listener, build_router(service)).await
}

/// Bind `host:port` and run the HTTP API.
pub async fn run_server<S: IrqOperations + 'static>(
    service: S,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    serve(listener, Arc::new(service)).await
}
