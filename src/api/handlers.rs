use axum::{body::Bytes, extract::State, http::StatusCode, response::Json};
use log::warn;
use serde::Serialize;
use std::sync::Arc;

use crate::config::SyncConfig;
use crate::logic::{sync_bom, SyncError};
use crate::model::{SyncRequest, SyncResponse};
use crate::store::traits::Store;

/// Shared handler state: the store plus sync defaults
pub struct AppState<S> {
    pub store: Arc<S>,
    pub sync: Arc<SyncConfig>,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, sync: SyncConfig) -> Self {
        Self {
            store,
            sync: Arc::new(sync),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sync: Arc::clone(&self.sync),
        }
    }
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub kind: String,
}

impl ErrorResponse {
    pub fn new(message: &str, kind: &str) -> Self {
        Self {
            success: false,
            error: message.to_string(),
            kind: kind.to_string(),
        }
    }
}

impl From<&SyncError> for ErrorResponse {
    fn from(err: &SyncError) -> Self {
        Self::new(&err.to_string(), err.kind())
    }
}

/// Every failed sync, rejected payloads included, is a 500 carrying the error
fn error_response(err: &SyncError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::from(err)),
    )
}

/// POST /sync
/// Apply a CAD bill of materials to a make method and its sub-assemblies
pub async fn sync<S: Store>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<Json<SyncResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = match SyncRequest::parse(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected sync payload: {}", e);
            return Err(error_response(&SyncError::from(e)));
        }
    };

    match sync_bom(&*state.store, request, &state.sync).await {
        Ok(outcome) => Ok(Json(SyncResponse {
            success: true,
            make_method_id: outcome.make_method_id,
        })),
        Err(e) => Err(error_response(&e)),
    }
}
