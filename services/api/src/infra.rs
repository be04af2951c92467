use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use trustdesk::workflows::rating::{
    CompanyId, DirectoryError, DocumentDirectory, DocumentId, DocumentPage, DocumentRecord,
    EventError, RatingComputed, RatingEventSink, RatingKey, RatingRow, RatingTable, RowId,
    StoreError,
};

const DIRECTORY_PAGE_SIZE: usize = 50;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory stand-in for the external document store, fed through the
/// document registration endpoint.
#[derive(Default)]
pub(crate) struct InMemoryDocumentDirectory {
    documents: Mutex<Vec<DocumentRecord>>,
}

impl InMemoryDocumentDirectory {
    pub(crate) fn register(&self, record: DocumentRecord) {
        let mut documents = self.documents.lock().expect("directory mutex poisoned");
        match documents
            .iter_mut()
            .find(|existing| existing.id == record.id)
        {
            Some(existing) => *existing = record,
            None => documents.push(record),
        }
    }

    fn page_of(records: Vec<DocumentRecord>, cursor: Option<&str>) -> DocumentPage {
        let start = cursor
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(0);
        let end = (start + DIRECTORY_PAGE_SIZE).min(records.len());
        let next_cursor = (end < records.len()).then(|| end.to_string());
        DocumentPage {
            records: records[start.min(end)..end].to_vec(),
            next_cursor,
        }
    }
}

#[async_trait]
impl DocumentDirectory for InMemoryDocumentDirectory {
    async fn fetch_document(
        &self,
        id: &DocumentId,
    ) -> Result<Option<DocumentRecord>, DirectoryError> {
        let documents = self.documents.lock().expect("directory mutex poisoned");
        Ok(documents.iter().find(|record| &record.id == id).cloned())
    }

    async fn list_company_documents(
        &self,
        company_id: &CompanyId,
        cursor: Option<&str>,
    ) -> Result<DocumentPage, DirectoryError> {
        let matching: Vec<_> = self
            .documents
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .filter(|record| &record.company_id == company_id)
            .cloned()
            .collect();
        Ok(Self::page_of(matching, cursor))
    }

    async fn list_documents(&self, cursor: Option<&str>) -> Result<DocumentPage, DirectoryError> {
        let all = self
            .documents
            .lock()
            .expect("directory mutex poisoned")
            .clone();
        Ok(Self::page_of(all, cursor))
    }
}

/// In-memory rating table keeping upserted rows addressable by row id.
#[derive(Default)]
pub(crate) struct InMemoryRatingTable {
    rows: Mutex<HashMap<RowId, RatingRow>>,
    order: Mutex<Vec<RowId>>,
    sequence: AtomicU64,
}

#[async_trait]
impl RatingTable for InMemoryRatingTable {
    async fn find_first(&self, key: &RatingKey) -> Result<Option<RowId>, StoreError> {
        let rows = self.rows.lock().expect("table mutex poisoned");
        let order = self.order.lock().expect("table mutex poisoned");
        Ok(order
            .iter()
            .find(|id| rows.get(*id).map(|row| row.key() == *key).unwrap_or(false))
            .cloned())
    }

    async fn insert(&self, row: RatingRow) -> Result<RowId, StoreError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let id = RowId(format!("row-{id:06}"));
        self.rows
            .lock()
            .expect("table mutex poisoned")
            .insert(id.clone(), row);
        self.order
            .lock()
            .expect("table mutex poisoned")
            .push(id.clone());
        Ok(id)
    }

    async fn update(&self, id: &RowId, row: RatingRow) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("table mutex poisoned");
        match rows.get_mut(id) {
            Some(slot) => {
                *slot = row;
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!("row {} vanished", id.0))),
        }
    }
}

/// Analytics sink that mirrors events into the log stream. Nothing is
/// retained; the log line is the delivery.
#[derive(Default)]
pub(crate) struct LoggingEventSink;

#[async_trait]
impl RatingEventSink for LoggingEventSink {
    async fn publish(&self, event: RatingComputed) -> Result<(), EventError> {
        info!(
            scope = event.scope.label(),
            company_id = %event.company_id,
            document_id = event.document_id.as_ref().map(|id| id.0.as_str()),
            score = event.score,
            level = event.level.label(),
            "rating.computed"
        );
        Ok(())
    }
}
