use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::rating::domain::{
    CompanyId, DocumentId, DocumentMeta, DocumentRating, DocumentSignal, DocumentStatus,
    ScoreBreakdown,
};
use crate::workflows::rating::repository::{
    DirectoryError, DocumentDirectory, DocumentPage, DocumentRecord, EventError, RatingComputed,
    RatingEventSink,
};
use crate::workflows::rating::scoring::grade;
use crate::workflows::rating::service::RatingService;
use crate::workflows::rating::store::{
    RatingKey, RatingRow, RatingTable, RowId, StoreError, TableRatingStore,
};

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn full_meta() -> DocumentMeta {
    DocumentMeta {
        file_name: Some("invoice-0042.pdf".to_string()),
        mime_type: Some("application/pdf".to_string()),
        size_bytes: Some(182_044),
    }
}

/// Signal with only identifiers and a status; every optional input absent.
pub(super) fn bare_signal(status: DocumentStatus) -> DocumentSignal {
    DocumentSignal {
        document_id: DocumentId("doc-1".to_string()),
        company_id: CompanyId("acme".to_string()),
        status,
        classify_confidence: None,
        meta: DocumentMeta::default(),
        uploaded_at: None,
        classified_at: None,
    }
}

/// Signal with both timestamps, classified `delay_seconds` after upload.
pub(super) fn timed_signal(delay_seconds: i64) -> DocumentSignal {
    let uploaded = base_time();
    DocumentSignal {
        uploaded_at: Some(uploaded),
        classified_at: Some(uploaded + Duration::seconds(delay_seconds)),
        ..bare_signal(DocumentStatus::Classified)
    }
}

pub(super) fn rated(id: &str, company: &str, score: f64) -> DocumentRating {
    DocumentRating {
        document_id: DocumentId(id.to_string()),
        company_id: CompanyId(company.to_string()),
        score,
        level: grade(score),
        breakdown: ScoreBreakdown {
            confidence: 0.0,
            status_bonus: 0.0,
            meta_completeness: 0.0,
            speed_bonus: 0.0,
        },
        computed_at: base_time(),
    }
}

pub(super) fn document_record(
    id: &str,
    company: &str,
    status: DocumentStatus,
    classify_confidence: Option<f64>,
    classify_delay_seconds: Option<i64>,
) -> DocumentRecord {
    let uploaded = base_time();
    DocumentRecord {
        id: DocumentId(id.to_string()),
        company_id: CompanyId(company.to_string()),
        status,
        meta: full_meta(),
        classify_confidence,
        uploaded_at: Some(uploaded),
        classified_at: classify_delay_seconds.map(|seconds| uploaded + Duration::seconds(seconds)),
        created_at: uploaded,
        updated_at: uploaded,
    }
}

fn page_of(records: Vec<DocumentRecord>, cursor: Option<&str>, page_size: usize) -> DocumentPage {
    let start = cursor
        .map(|raw| raw.parse::<usize>().expect("numeric cursor"))
        .unwrap_or(0);
    let end = (start + page_size).min(records.len());
    let next_cursor = (end < records.len()).then(|| end.to_string());
    DocumentPage {
        records: records[start..end].to_vec(),
        next_cursor,
    }
}

pub(super) struct MemoryDirectory {
    documents: Mutex<Vec<DocumentRecord>>,
    page_size: usize,
}

impl MemoryDirectory {
    pub(super) fn new(page_size: usize) -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            page_size,
        }
    }

    pub(super) fn seed(&self, record: DocumentRecord) {
        self.documents
            .lock()
            .expect("directory mutex poisoned")
            .push(record);
    }
}

#[async_trait]
impl DocumentDirectory for MemoryDirectory {
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
        Ok(page_of(matching, cursor, self.page_size))
    }

    async fn list_documents(&self, cursor: Option<&str>) -> Result<DocumentPage, DirectoryError> {
        let all = self
            .documents
            .lock()
            .expect("directory mutex poisoned")
            .clone();
        Ok(page_of(all, cursor, self.page_size))
    }
}

#[derive(Default)]
pub(super) struct MemoryTable {
    rows: Mutex<Vec<(RowId, RatingRow)>>,
    sequence: AtomicU64,
}

impl MemoryTable {
    pub(super) fn rows(&self) -> Vec<RatingRow> {
        self.rows
            .lock()
            .expect("table mutex poisoned")
            .iter()
            .map(|(_, row)| row.clone())
            .collect()
    }

    pub(super) fn seed_row(&self, row: RatingRow) -> RowId {
        let id = self.next_id();
        self.rows
            .lock()
            .expect("table mutex poisoned")
            .push((id.clone(), row));
        id
    }

    fn next_id(&self) -> RowId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        RowId(format!("row-{id:04}"))
    }
}

#[async_trait]
impl RatingTable for MemoryTable {
    async fn find_first(&self, key: &RatingKey) -> Result<Option<RowId>, StoreError> {
        let rows = self.rows.lock().expect("table mutex poisoned");
        Ok(rows
            .iter()
            .find(|(_, row)| row.key() == *key)
            .map(|(id, _)| id.clone()))
    }

    async fn insert(&self, row: RatingRow) -> Result<RowId, StoreError> {
        let id = self.next_id();
        self.rows
            .lock()
            .expect("table mutex poisoned")
            .push((id.clone(), row));
        Ok(id)
    }

    async fn update(&self, id: &RowId, row: RatingRow) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("table mutex poisoned");
        match rows.iter_mut().find(|(existing, _)| existing == id) {
            Some(slot) => {
                slot.1 = row;
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!("row {} vanished", id.0))),
        }
    }
}

/// Table that accepts a fixed number of writes and then goes offline. Reads
/// keep working.
pub(super) struct QuotaTable {
    inner: MemoryTable,
    writes_left: AtomicU64,
}

impl QuotaTable {
    pub(super) fn new(write_budget: u64) -> Self {
        Self {
            inner: MemoryTable::default(),
            writes_left: AtomicU64::new(write_budget),
        }
    }

    pub(super) fn rows(&self) -> Vec<RatingRow> {
        self.inner.rows()
    }

    fn take_write(&self) -> Result<(), StoreError> {
        self.writes_left
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| {
                left.checked_sub(1)
            })
            .map(|_| ())
            .map_err(|_| StoreError::Unavailable("write quota exhausted".to_string()))
    }
}

#[async_trait]
impl RatingTable for QuotaTable {
    async fn find_first(&self, key: &RatingKey) -> Result<Option<RowId>, StoreError> {
        self.inner.find_first(key).await
    }

    async fn insert(&self, row: RatingRow) -> Result<RowId, StoreError> {
        self.take_write()?;
        self.inner.insert(row).await
    }

    async fn update(&self, id: &RowId, row: RatingRow) -> Result<(), StoreError> {
        self.take_write()?;
        self.inner.update(id, row).await
    }
}

pub(super) struct UnavailableTable;

#[async_trait]
impl RatingTable for UnavailableTable {
    async fn find_first(&self, _key: &RatingKey) -> Result<Option<RowId>, StoreError> {
        Err(StoreError::Unavailable("table offline".to_string()))
    }

    async fn insert(&self, _row: RatingRow) -> Result<RowId, StoreError> {
        Err(StoreError::Unavailable("table offline".to_string()))
    }

    async fn update(&self, _id: &RowId, _row: RatingRow) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("table offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryEvents {
    events: Mutex<Vec<RatingComputed>>,
}

impl MemoryEvents {
    pub(super) fn events(&self) -> Vec<RatingComputed> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

#[async_trait]
impl RatingEventSink for MemoryEvents {
    async fn publish(&self, event: RatingComputed) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) struct FailingEvents;

#[async_trait]
impl RatingEventSink for FailingEvents {
    async fn publish(&self, _event: RatingComputed) -> Result<(), EventError> {
        Err(EventError::Transport("sink offline".to_string()))
    }
}

pub(super) type MemoryService =
    RatingService<MemoryDirectory, TableRatingStore<MemoryTable>, MemoryEvents>;

pub(super) fn build_service(
    page_size: usize,
) -> (
    Arc<MemoryService>,
    Arc<MemoryDirectory>,
    Arc<MemoryTable>,
    Arc<MemoryEvents>,
) {
    let directory = Arc::new(MemoryDirectory::new(page_size));
    let table = Arc::new(MemoryTable::default());
    let events = Arc::new(MemoryEvents::default());
    let store = Arc::new(TableRatingStore::new(table.clone()));
    let service = Arc::new(RatingService::new(directory.clone(), store, events.clone()));
    (service, directory, table, events)
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
