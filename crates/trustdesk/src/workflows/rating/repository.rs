use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    CompanyId, DocumentId, DocumentMeta, DocumentSignal, DocumentStatus, RatingLevel, RatingScope,
};

/// Document row as held by the external tabular backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub company_id: CompanyId,
    pub status: DocumentStatus,
    #[serde(default)]
    pub meta: DocumentMeta,
    pub classify_confidence: Option<f64>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub classified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Collapse the stored row into the signal consumed by scoring.
    pub fn signal(&self) -> DocumentSignal {
        DocumentSignal {
            document_id: self.id.clone(),
            company_id: self.company_id.clone(),
            status: self.status,
            classify_confidence: self.classify_confidence,
            meta: self.meta.clone(),
            uploaded_at: self.uploaded_at,
            classified_at: self.classified_at,
        }
    }
}

/// One page of a cursor-based document listing.
///
/// Cursors are opaque to the engine and must be followed in the order the
/// store returns them; `next_cursor` of `None` marks exhaustion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPage {
    pub records: Vec<DocumentRecord>,
    pub next_cursor: Option<String>,
}

/// Read-side abstraction over the external document store so the
/// orchestrator can be exercised with in-memory fakes.
#[async_trait]
pub trait DocumentDirectory: Send + Sync {
    async fn fetch_document(
        &self,
        id: &DocumentId,
    ) -> Result<Option<DocumentRecord>, DirectoryError>;

    async fn list_company_documents(
        &self,
        company_id: &CompanyId,
        cursor: Option<&str>,
    ) -> Result<DocumentPage, DirectoryError>;

    async fn list_documents(&self, cursor: Option<&str>) -> Result<DocumentPage, DirectoryError>;
}

/// Error enumeration for document-store reads.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Analytics event emitted after each rating computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingComputed {
    pub scope: RatingScope,
    pub company_id: CompanyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
    pub score: f64,
    pub level: RatingLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Outbound hook for `rating.computed` analytics events.
///
/// Emission is best effort; callers log failures and move on.
#[async_trait]
pub trait RatingEventSink: Send + Sync {
    async fn publish(&self, event: RatingComputed) -> Result<(), EventError>;
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}
