//! HTTP routes for panel reads and actions

use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::WalletBackend;
use crate::error::PanelError;
use crate::namespaces::PanelNamespace;

pub struct AppState<B: WalletBackend> { pub namespace: Arc<PanelNamespace<B>>, pub app_name: String }

impl<B: WalletBackend> Clone for AppState<B> {
    fn clone(&self) -> Self { Self { namespace: self.namespace.clone(), app_name: self.app_name.clone() } }
}

impl<B: WalletBackend> AppState<B> {
    pub fn new(namespace: Arc<PanelNamespace<B>>, app_name: impl Into<String>) -> Self {
        Self { namespace, app_name: app_name.into() }
    }
}

type ApiError = (StatusCode, Json<Value>);

pub fn create_router<B: WalletBackend + 'static>(namespace: Arc<PanelNamespace<B>>) -> Router {
    create_router_with_name(namespace, "arkpanel")
}

pub fn create_router_with_name<B: WalletBackend + 'static>(namespace: Arc<PanelNamespace<B>>, app_name: &str) -> Router {
    Router::new()
        .route("/health", get(health::<B>))
        .route("/paths", get(list_paths::<B>))
        .route("/panel/*path", get(read_path::<B>).post(write_path::<B>))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(namespace, app_name))
}

/// HTTP status for a panel error.
pub fn status_for(err: &PanelError) -> StatusCode {
    match err {
        PanelError::Busy(_) => StatusCode::CONFLICT,
        PanelError::UnknownExitTransaction(_) => StatusCode::NOT_FOUND,
        PanelError::Dispatch(_) => StatusCode::BAD_GATEWAY,
        PanelError::InvalidRequest(_) | PanelError::UnknownPath(_) => StatusCode::BAD_REQUEST,
        PanelError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn api_error(err: PanelError) -> ApiError {
    (status_for(&err), Json(json!({"error": err.to_string(), "field": err.field()})))
}

async fn health<B: WalletBackend + 'static>(State(s): State<AppState<B>>) -> impl IntoResponse {
    Json(json!({"status": "ok", "service": s.app_name}))
}

async fn list_paths<B: WalletBackend + 'static>(State(s): State<AppState<B>>) -> Json<Value> {
    let paths = s.namespace.list();
    Json(json!({"count": paths.len(), "paths": paths}))
}

async fn read_path<B: WalletBackend + 'static>(State(s): State<AppState<B>>, Path(path): Path<String>) -> Result<Json<Value>, ApiError> {
    match s.namespace.read(&path).await {
        Ok(Some(value)) => Ok(Json(value)),
        Ok(None) => Err((StatusCode::NOT_FOUND, Json(json!({"error": format!("not found: {}", path)})))),
        Err(e) => Err(api_error(e)),
    }
}

async fn write_path<B: WalletBackend + 'static>(
    State(s): State<AppState<B>>,
    Path(path): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let data = body.map(|Json(v)| v).unwrap_or_else(|| json!({}));
    s.namespace.write(&path, data).await.map(Json).map_err(api_error)
}
