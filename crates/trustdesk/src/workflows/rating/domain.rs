use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for documents tracked in the external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for the tenant company owning a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle states reported by the document intake pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Uploading,
    Classified,
    NeedsReview,
    Confirmed,
    Rejected,
}

impl DocumentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Uploading => "uploading",
            DocumentStatus::Classified => "classified",
            DocumentStatus::NeedsReview => "needs_review",
            DocumentStatus::Confirmed => "confirmed",
            DocumentStatus::Rejected => "rejected",
        }
    }
}

/// File metadata attached to a document record; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
}

impl DocumentMeta {
    /// Fraction of the three metadata fields that are populated.
    pub fn completeness(&self) -> f64 {
        let present = [
            self.file_name.is_some(),
            self.mime_type.is_some(),
            self.size_bytes.is_some(),
        ]
        .iter()
        .filter(|field| **field)
        .count();
        present as f64 / 3.0
    }
}

/// Per-document inputs consumed by one scoring pass.
///
/// Identifiers are fixed for the life of the signal; everything else degrades
/// to a zero contribution when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSignal {
    pub document_id: DocumentId,
    pub company_id: CompanyId,
    pub status: DocumentStatus,
    pub classify_confidence: Option<f64>,
    pub meta: DocumentMeta,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub classified_at: Option<DateTime<Utc>>,
}

/// Ordinal letter grade derived from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingLevel {
    A,
    B,
    C,
    D,
}

impl RatingLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RatingLevel::A => "A",
            RatingLevel::B => "B",
            RatingLevel::C => "C",
            RatingLevel::D => "D",
        }
    }
}

/// Granularity of a persisted or reported rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingScope {
    Document,
    Company,
}

impl RatingScope {
    pub const fn label(self) -> &'static str {
        match self {
            RatingScope::Document => "document",
            RatingScope::Company => "company",
        }
    }
}

/// Component terms whose clamped sum produces a document score.
///
/// Each term is non-negative and rounded to two decimals for reporting; the
/// score itself is rounded from the unrounded sum, so the two can drift by a
/// cent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub confidence: f64,
    pub status_bonus: f64,
    pub meta_completeness: f64,
    pub speed_bonus: f64,
}

/// Rating computed for a single document. Built fresh on every compute pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRating {
    pub document_id: DocumentId,
    pub company_id: CompanyId,
    pub score: f64,
    pub level: RatingLevel,
    pub breakdown: ScoreBreakdown,
    pub computed_at: DateTime<Utc>,
}

/// Aggregate rating across a company's documents.
///
/// `docs` is a response-only snapshot of the contributing document ratings;
/// it is never part of the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRating {
    pub company_id: CompanyId,
    pub score: f64,
    pub level: RatingLevel,
    pub computed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<Vec<DocumentRating>>,
}

impl CompanyRating {
    pub fn with_docs(mut self, docs: Vec<DocumentRating>) -> Self {
        self.docs = Some(docs);
        self
    }
}
