use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{CompanyId, CompanyRating, DocumentId, DocumentRating, RatingLevel, RatingScope};

/// Logical identity of a persisted rating row: scope plus the rated entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingKey {
    pub scope: RatingScope,
    pub company_id: CompanyId,
    pub document_id: Option<DocumentId>,
}

/// Flattened rating row as written to the external table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRow {
    pub scope: RatingScope,
    pub company_id: CompanyId,
    pub document_id: Option<DocumentId>,
    pub score: f64,
    pub level: RatingLevel,
    pub computed_at: DateTime<Utc>,
}

impl RatingRow {
    pub fn key(&self) -> RatingKey {
        RatingKey {
            scope: self.scope,
            company_id: self.company_id.clone(),
            document_id: self.document_id.clone(),
        }
    }
}

/// Either rating shape accepted by the upsert path.
#[derive(Debug, Clone, PartialEq)]
pub enum RatingRecord {
    Document(DocumentRating),
    Company(CompanyRating),
}

impl RatingRecord {
    pub fn row(&self) -> RatingRow {
        match self {
            RatingRecord::Document(rating) => RatingRow {
                scope: RatingScope::Document,
                company_id: rating.company_id.clone(),
                document_id: Some(rating.document_id.clone()),
                score: rating.score,
                level: rating.level,
                computed_at: rating.computed_at,
            },
            RatingRecord::Company(rating) => RatingRow {
                scope: RatingScope::Company,
                company_id: rating.company_id.clone(),
                document_id: None,
                score: rating.score,
                level: rating.level,
                computed_at: rating.computed_at,
            },
        }
    }
}

/// Write-side abstraction consumed by the compute orchestrator.
#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn upsert(&self, record: RatingRecord) -> Result<(), StoreError>;
}

/// Row handle assigned by the external table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(pub String);

/// Low-level client for the external tabular store.
#[async_trait]
pub trait RatingTable: Send + Sync {
    /// First row matching the key, if any. Should the table hold duplicates,
    /// rows beyond the first are ignored.
    async fn find_first(&self, key: &RatingKey) -> Result<Option<RowId>, StoreError>;

    async fn insert(&self, row: RatingRow) -> Result<RowId, StoreError>;

    async fn update(&self, id: &RowId, row: RatingRow) -> Result<(), StoreError>;
}

/// Lookup-then-write upsert over any tabular backend.
///
/// Idempotent for sequential callers: recomputing the same entity updates the
/// existing row in place. The lookup and the write are two round trips, so
/// concurrent upserts for one key can still race into duplicate rows; the
/// external table is not assumed to enforce uniqueness and the engine does
/// not lock around the window. Last write wins, no version check.
pub struct TableRatingStore<T> {
    table: Arc<T>,
}

impl<T> TableRatingStore<T> {
    pub fn new(table: Arc<T>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl<T> RatingStore for TableRatingStore<T>
where
    T: RatingTable,
{
    async fn upsert(&self, record: RatingRecord) -> Result<(), StoreError> {
        let row = record.row();
        match self.table.find_first(&row.key()).await? {
            Some(id) => self.table.update(&id, row).await,
            None => self.table.insert(row).await.map(|_| ()),
        }
    }
}

/// Error enumeration for rating-store writes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("rating store unavailable: {0}")]
    Unavailable(String),
}
