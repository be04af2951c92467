use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use trustdesk::workflows::rating::{
    rating_router, CompanyId, DocumentDirectory, DocumentId, DocumentMeta, DocumentRecord,
    DocumentStatus, RatingEventSink, RatingService, RatingStore,
};

use crate::infra::{AppState, InMemoryDocumentDirectory};

/// Document registration payload mirroring the external store's row shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterDocumentRequest {
    pub(crate) id: String,
    pub(crate) company_id: String,
    pub(crate) status: DocumentStatus,
    #[serde(default)]
    pub(crate) file_name: Option<String>,
    #[serde(default)]
    pub(crate) mime_type: Option<String>,
    #[serde(default)]
    pub(crate) size_bytes: Option<u64>,
    #[serde(default)]
    pub(crate) classify_confidence: Option<f64>,
    #[serde(default)]
    pub(crate) uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) classified_at: Option<DateTime<Utc>>,
}

impl RegisterDocumentRequest {
    pub(crate) fn into_record(self, now: DateTime<Utc>) -> DocumentRecord {
        DocumentRecord {
            id: DocumentId(self.id),
            company_id: CompanyId(self.company_id),
            status: self.status,
            meta: DocumentMeta {
                file_name: self.file_name,
                mime_type: self.mime_type,
                size_bytes: self.size_bytes,
            },
            classify_confidence: self.classify_confidence,
            uploaded_at: self.uploaded_at,
            classified_at: self.classified_at,
            created_at: now,
            updated_at: now,
        }
    }
}

pub(crate) fn with_rating_routes<D, S, E>(service: Arc<RatingService<D, S, E>>) -> axum::Router
where
    D: DocumentDirectory + 'static,
    S: RatingStore + 'static,
    E: RatingEventSink + 'static,
{
    rating_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/documents",
            axum::routing::post(register_document_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn register_document_endpoint(
    Extension(directory): Extension<Arc<InMemoryDocumentDirectory>>,
    Json(request): Json<RegisterDocumentRequest>,
) -> impl IntoResponse {
    let record = request.into_record(Utc::now());
    let payload = json!({
        "id": record.id.0,
        "companyId": record.company_id.0,
        "status": record.status.label(),
    });
    directory.register(record);
    (StatusCode::CREATED, Json(payload))
}
