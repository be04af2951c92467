use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::domain::DocumentId;
use super::repository::{DocumentDirectory, RatingEventSink};
use super::service::{ComputeOutcome, ComputeRequest, ComputeScope, RatingService};
use super::store::RatingStore;

/// Fire-and-forget recompute request issued by collaborating workflows, e.g.
/// a reviewer confirming a classification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeRequest {
    pub document_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Detached entrypoint for best-effort document recomputes.
///
/// Each request spawns a background task running the document-scope compute.
/// The outcome is logged and deliberately discarded; the triggering action
/// succeeds regardless of the downstream result. At-most-effort delivery is
/// the contract, not a gap.
pub struct RecomputeTrigger<D, S, E> {
    service: Arc<RatingService<D, S, E>>,
}

impl<D, S, E> RecomputeTrigger<D, S, E>
where
    D: DocumentDirectory + 'static,
    S: RatingStore + 'static,
    E: RatingEventSink + 'static,
{
    pub fn new(service: Arc<RatingService<D, S, E>>) -> Self {
        Self { service }
    }

    pub fn request_recompute(&self, request: RecomputeRequest, correlation_id: String) {
        let service = Arc::clone(&self.service);

        tokio::spawn(async move {
            let document_id = DocumentId(request.document_id);
            let compute = ComputeRequest {
                scope: ComputeScope::Document(document_id.clone()),
                dry_run: false,
                reason: request.reason,
            };

            match service.compute(compute).await {
                Ok(ComputeOutcome::Document(rating)) => {
                    debug!(
                        %correlation_id,
                        document_id = %rating.document_id,
                        score = rating.score,
                        level = rating.level.label(),
                        "recompute finished"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        %correlation_id,
                        %document_id,
                        error = %err,
                        "recompute request failed"
                    );
                }
            }
        });
    }
}
