use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use crate::error::AppError;

use super::repository::{DocumentDirectory, RatingEventSink};
use super::service::{ComputeRequest, ComputeRequestBody, RatingService};
use super::store::RatingStore;
use super::trigger::{RecomputeRequest, RecomputeTrigger};

/// Router builder exposing the synchronous compute endpoint and the
/// fire-and-forget recompute endpoint.
pub fn rating_router<D, S, E>(service: Arc<RatingService<D, S, E>>) -> Router
where
    D: DocumentDirectory + 'static,
    S: RatingStore + 'static,
    E: RatingEventSink + 'static,
{
    Router::new()
        .route("/api/v1/ratings/compute", post(compute_handler::<D, S, E>))
        .route(
            "/api/v1/ratings/recompute",
            post(recompute_handler::<D, S, E>),
        )
        .with_state(service)
}

static CORRELATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_correlation_id() -> String {
    let id = CORRELATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("recompute-{id:06}")
}

pub(crate) async fn compute_handler<D, S, E>(
    State(service): State<Arc<RatingService<D, S, E>>>,
    axum::Json(body): axum::Json<ComputeRequestBody>,
) -> Response
where
    D: DocumentDirectory + 'static,
    S: RatingStore + 'static,
    E: RatingEventSink + 'static,
{
    let request = match ComputeRequest::try_from(body) {
        Ok(request) => request,
        Err(err) => return AppError::from(err).into_response(),
    };

    match service.compute(request).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn recompute_handler<D, S, E>(
    State(service): State<Arc<RatingService<D, S, E>>>,
    axum::Json(request): axum::Json<RecomputeRequest>,
) -> Response
where
    D: DocumentDirectory + 'static,
    S: RatingStore + 'static,
    E: RatingEventSink + 'static,
{
    let correlation_id = next_correlation_id();
    let document_id = request.document_id.clone();

    RecomputeTrigger::new(service).request_recompute(request, correlation_id.clone());

    let payload = json!({
        "status": "accepted",
        "documentId": document_id,
        "correlationId": correlation_id,
    });
    (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
}
