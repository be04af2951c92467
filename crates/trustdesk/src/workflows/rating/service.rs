use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{CompanyId, CompanyRating, DocumentId, DocumentRating, RatingScope};
use super::repository::{
    DirectoryError, DocumentDirectory, DocumentRecord, RatingComputed, RatingEventSink,
};
use super::scoring;
use super::store::{RatingRecord, RatingStore, StoreError};

/// Granularity of a compute request.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeScope {
    Document(DocumentId),
    Company(CompanyId),
    All { cursor: Option<String> },
}

/// Validated request accepted by [`RatingService::compute`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRequest {
    pub scope: ComputeScope,
    pub dry_run: bool,
    pub reason: Option<String>,
}

/// Wire-shaped compute body as posted by collaborators. Validation into a
/// [`ComputeRequest`] happens before any I/O is attempted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequestBody {
    pub scope: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TryFrom<ComputeRequestBody> for ComputeRequest {
    type Error = ComputeError;

    fn try_from(body: ComputeRequestBody) -> Result<Self, Self::Error> {
        let scope = match body.scope.as_str() {
            "document" => ComputeScope::Document(DocumentId(
                body.document_id.ok_or(ComputeError::MissingDocumentId)?,
            )),
            "company" => ComputeScope::Company(CompanyId(
                body.company_id.ok_or(ComputeError::MissingCompanyId)?,
            )),
            "all" => ComputeScope::All { cursor: body.cursor },
            other => return Err(ComputeError::UnknownScope(other.to_string())),
        };

        Ok(Self {
            scope,
            dry_run: body.dry_run,
            reason: body.reason,
        })
    }
}

/// Company rating plus the per-document ratings it was folded from.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyComputeOutcome {
    pub company: CompanyRating,
    pub documents: Vec<DocumentRating>,
}

/// One page of all-scope results. Callers follow `next_cursor` to continue;
/// a single call scans exactly one page of documents.
#[derive(Debug, Clone, Serialize)]
pub struct AllComputeOutcome {
    pub companies: Vec<CompanyRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Result of a compute pass, shaped per requested scope.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ComputeOutcome {
    Document(DocumentRating),
    Company(CompanyComputeOutcome),
    All(AllComputeOutcome),
}

/// Compute orchestrator: loads document records, applies the scoring rules,
/// aggregates per company, persists via the injected store, and emits
/// `rating.computed` events.
///
/// All collaborators are injected so tests can substitute in-memory fakes;
/// the service itself holds no mutable state.
pub struct RatingService<D, S, E> {
    directory: Arc<D>,
    store: Arc<S>,
    events: Arc<E>,
}

impl<D, S, E> RatingService<D, S, E>
where
    D: DocumentDirectory,
    S: RatingStore,
    E: RatingEventSink,
{
    pub fn new(directory: Arc<D>, store: Arc<S>, events: Arc<E>) -> Self {
        Self {
            directory,
            store,
            events,
        }
    }

    /// Run one compute pass for the requested scope.
    ///
    /// Persistence is not transactional: a failure partway through a company
    /// or all-scope pass leaves earlier document ratings persisted.
    pub async fn compute(&self, request: ComputeRequest) -> Result<ComputeOutcome, ComputeError> {
        let reason = request.reason.as_deref();
        match &request.scope {
            ComputeScope::Document(document_id) => {
                let rating = self
                    .compute_document(document_id, request.dry_run, reason)
                    .await?;
                Ok(ComputeOutcome::Document(rating))
            }
            ComputeScope::Company(company_id) => {
                let outcome = self
                    .compute_company(company_id, request.dry_run, reason)
                    .await?;
                Ok(ComputeOutcome::Company(outcome))
            }
            ComputeScope::All { cursor } => {
                let outcome = self
                    .compute_all(cursor.as_deref(), request.dry_run, reason)
                    .await?;
                Ok(ComputeOutcome::All(outcome))
            }
        }
    }

    async fn compute_document(
        &self,
        document_id: &DocumentId,
        dry_run: bool,
        reason: Option<&str>,
    ) -> Result<DocumentRating, ComputeError> {
        let record = self
            .directory
            .fetch_document(document_id)
            .await?
            .ok_or_else(|| ComputeError::DocumentNotFound(document_id.clone()))?;

        self.rate_record(&record, dry_run, reason).await
    }

    /// Score one document record and, unless dry running, persist it and emit
    /// the document-scope event. Shared by every scope.
    async fn rate_record(
        &self,
        record: &DocumentRecord,
        dry_run: bool,
        reason: Option<&str>,
    ) -> Result<DocumentRating, ComputeError> {
        let rating = scoring::score_document(&record.signal(), Utc::now());

        if !dry_run {
            self.store
                .upsert(RatingRecord::Document(rating.clone()))
                .await?;
            self.emit(RatingComputed {
                scope: RatingScope::Document,
                company_id: rating.company_id.clone(),
                document_id: Some(rating.document_id.clone()),
                score: rating.score,
                level: rating.level,
                reason: reason.map(str::to_string),
            })
            .await;
        }

        Ok(rating)
    }

    async fn compute_company(
        &self,
        company_id: &CompanyId,
        dry_run: bool,
        reason: Option<&str>,
    ) -> Result<CompanyComputeOutcome, ComputeError> {
        let mut documents = Vec::new();
        let mut cursor: Option<String> = None;

        // Continuation cursors are followed in store order until exhausted so
        // no document of the company is skipped.
        loop {
            let page = self
                .directory
                .list_company_documents(company_id, cursor.as_deref())
                .await?;
            for record in &page.records {
                documents.push(self.rate_record(record, dry_run, reason).await?);
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        // All document persists completed above; the aggregate sees exactly
        // the ratings from this pass.
        let company = scoring::aggregate_company(company_id.clone(), &documents, Utc::now());

        if !dry_run {
            self.store
                .upsert(RatingRecord::Company(company.clone()))
                .await?;
            self.emit(RatingComputed {
                scope: RatingScope::Company,
                company_id: company.company_id.clone(),
                document_id: None,
                score: company.score,
                level: company.level,
                reason: reason.map(str::to_string),
            })
            .await;
        }

        Ok(CompanyComputeOutcome { company, documents })
    }

    async fn compute_all(
        &self,
        cursor: Option<&str>,
        dry_run: bool,
        reason: Option<&str>,
    ) -> Result<AllComputeOutcome, ComputeError> {
        // One page of documents per invocation; companies whose documents sit
        // beyond this page surface through the returned cursor.
        let page = self.directory.list_documents(cursor).await?;

        let mut seen: Vec<CompanyId> = Vec::new();
        for record in &page.records {
            if !seen.contains(&record.company_id) {
                seen.push(record.company_id.clone());
            }
        }

        let mut companies = Vec::with_capacity(seen.len());
        for company_id in &seen {
            let outcome = self.compute_company(company_id, dry_run, reason).await?;
            companies.push(outcome.company.with_docs(outcome.documents));
        }

        Ok(AllComputeOutcome {
            companies,
            next_cursor: page.next_cursor,
        })
    }

    async fn emit(&self, event: RatingComputed) {
        if let Err(err) = self.events.publish(event).await {
            warn!(error = %err, "failed to publish rating.computed event");
        }
    }
}

/// Error raised by the compute orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("document scope requires a documentId")]
    MissingDocumentId,
    #[error("company scope requires a companyId")]
    MissingCompanyId,
    #[error("unknown compute scope '{0}'")]
    UnknownScope(String),
    #[error("document '{0}' not found")]
    DocumentNotFound(DocumentId),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
