//! Axum-based HTTP API with OpenAPI (utoipa) and Swagger UI
//!
//! Thin adapter over [`MonitorRegistry`]: register and remove monitors, read
//! their snapshots, evaluate status conditions and stream change events.

use crate::config::Config;
use crate::error::{GridwatchError, Result};
use crate::grid::GridState;
use crate::monitor::{BroadcastSink, MonitorRegistry, Offset, TriggerFilter};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<MonitorRegistry>,
    pub events: BroadcastSink,
    pub config: Arc<Config>,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterBody {
    /// Five digit postal code
    pub zip: String,
    pub name: Option<String>,
    /// Subset of now, 6h, 24h, 48h
    #[schema(value_type = Option<Vec<String>>)]
    pub offsets: Option<Vec<Offset>>,
}

#[derive(Deserialize)]
pub struct ConditionParams {
    pub quantity: Offset,
    pub status: GridState,
}

#[derive(Deserialize, Default)]
pub struct EventParams {
    pub zip: Option<String>,
    pub quantity: Option<Offset>,
    pub status: Option<GridState>,
}

impl From<EventParams> for TriggerFilter {
    fn from(params: EventParams) -> Self {
        Self {
            zip: params.zip,
            quantity: params.quantity,
            only_for_status: params.status,
        }
    }
}

fn error_response(err: &GridwatchError) -> Response {
    let status = match err {
        GridwatchError::Validation { .. } => StatusCode::BAD_REQUEST,
        GridwatchError::NotFound { .. } => StatusCode::NOT_FOUND,
        e if e.is_remote() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}

#[utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
))]
pub(crate) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "version": env!("APP_VERSION")}))
}

#[utoipa::path(get, path = "/api/monitors", responses(
    (status = 200, description = "Snapshots of all monitors")
))]
async fn list_monitors(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.list().await)
}

#[utoipa::path(post, path = "/api/monitors", request_body = RegisterBody, responses(
    (status = 201, description = "Monitor registered"),
    (status = 400, description = "Invalid or duplicate postal code"),
    (status = 502, description = "Remote validation failed")
))]
async fn register_monitor(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Response {
    // Own task: a client hanging up must not abandon the reservation
    let registry = state.registry.clone();
    let registration = tokio::spawn(async move {
        registry
            .register(&body.zip, body.name, body.offsets.as_deref())
            .await
    });
    match registration.await {
        Ok(Ok(snapshot)) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(e) => error_response(&GridwatchError::web(format!("Registration task failed: {}", e))),
    }
}

#[utoipa::path(get, path = "/api/monitors/{zip}",
    params(("zip" = String, Path, description = "Postal code")),
    responses((status = 200, description = "Monitor snapshot"), (status = 404, description = "Unknown postal code"))
)]
async fn get_monitor(State(state): State<AppState>, Path(zip): Path<String>) -> Response {
    match state.registry.get(&zip).await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => error_response(&GridwatchError::not_found(format!("No monitor for {}", zip))),
    }
}

#[utoipa::path(delete, path = "/api/monitors/{zip}",
    params(("zip" = String, Path, description = "Postal code")),
    responses((status = 204, description = "Monitor removed"), (status = 404, description = "Unknown postal code"))
)]
async fn remove_monitor(State(state): State<AppState>, Path(zip): Path<String>) -> Response {
    match state.registry.remove(&zip).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

#[utoipa::path(get, path = "/api/monitors/{zip}/condition",
    params(
        ("zip" = String, Path, description = "Postal code"),
        ("quantity" = String, Query, description = "now, 6h, 24h or 48h"),
        ("status" = String, Query, description = "superGreen, green, yellow or red")
    ),
    responses(
        (status = 200, description = "Whether the quantity currently has the status"),
        (status = 404, description = "Unknown postal code")
    )
)]
async fn condition(
    State(state): State<AppState>,
    Path(zip): Path<String>,
    Query(params): Query<ConditionParams>,
) -> Response {
    match state.registry.get(&zip).await {
        Some(snapshot) => Json(serde_json::json!({
            "result": snapshot.is_status(params.quantity, params.status)
        }))
        .into_response(),
        None => error_response(&GridwatchError::not_found(format!("No monitor for {}", zip))),
    }
}

#[utoipa::path(get, path = "/api/events",
    params(
        ("zip" = Option<String>, Query, description = "Only events of this postal code"),
        ("quantity" = Option<String>, Query, description = "Only events of this quantity"),
        ("status" = Option<String>, Query, description = "Only events with this new status")
    ),
    responses((status = 200, description = "Server-sent change events"))
)]
async fn events(State(state): State<AppState>, Query(params): Query<EventParams>) -> impl IntoResponse {
    let filter = TriggerFilter::from(params);
    let rx = state.events.subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(move |msg| {
        let event = msg.ok().filter(|ev| filter.accepts(ev))?;
        let payload = serde_json::to_string(&event).ok()?;
        Some(Ok::<Event, std::convert::Infallible>(
            Event::default().event(event.trigger.clone()).data(payload),
        ))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[utoipa::path(get, path = "/api/config", responses(
    (status = 200, description = "Effective configuration")
))]
async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(
        serde_json::to_value(state.config.as_ref())
            .unwrap_or_else(|_| serde_json::json!({"error": "serialization"})),
    )
}

#[utoipa::path(get, path = "/api/config/schema", responses(
    (status = 200, description = "JSON schema of the configuration file")
))]
async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(Config);
    Json(serde_json::to_value(&schema).unwrap_or_else(|_| serde_json::json!({"error": "schema"})))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health, list_monitors, register_monitor, get_monitor, remove_monitor,
        condition, events, get_config, get_config_schema,
    ),
    components(schemas(RegisterBody)),
    tags((name = "gridwatch", description = "Gridwatch grid status API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/api/health", get(health))
        .route("/api/monitors", get(list_monitors).post(register_monitor))
        .route("/api/monitors/{zip}", get(get_monitor).delete(remove_monitor))
        .route("/api/monitors/{zip}/condition", get(condition))
        .route("/api/events", get(events))
        .route("/api/config", get(get_config))
        .route("/api/config/schema", get(get_config_schema))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", openapi))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let router = build_router(state);
    let logger = crate::logging::get_logger("web");

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GridwatchError::web(format!("Failed to bind {}: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api, docs /docs)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router)
        .await
        .map_err(|e| GridwatchError::web(e.to_string()))
}
