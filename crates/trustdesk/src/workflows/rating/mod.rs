//! Company trustworthiness ratings derived from per-document intake signals.
//!
//! Scoring and aggregation are pure functions; the surrounding orchestration
//! loads document records from the external tabular store, persists rating
//! rows idempotently, and emits `rating.computed` analytics events. Review
//! workflows feed back into the engine through a detached recompute trigger.

pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;
pub mod trigger;

#[cfg(test)]
mod tests;

pub use domain::{
    CompanyId, CompanyRating, DocumentId, DocumentMeta, DocumentRating, DocumentSignal,
    DocumentStatus, RatingLevel, RatingScope, ScoreBreakdown,
};
pub use repository::{
    DirectoryError, DocumentDirectory, DocumentPage, DocumentRecord, EventError, RatingComputed,
    RatingEventSink,
};
pub use router::rating_router;
pub use service::{
    AllComputeOutcome, CompanyComputeOutcome, ComputeError, ComputeOutcome, ComputeRequest,
    ComputeRequestBody, ComputeScope, RatingService,
};
pub use store::{
    RatingKey, RatingRecord, RatingRow, RatingStore, RatingTable, RowId, StoreError,
    TableRatingStore,
};
pub use trigger::{RecomputeRequest, RecomputeTrigger};
