//! Domain library for the Trustdesk back-office service.
//!
//! The `workflows::rating` module tree implements the company trustworthiness
//! rating engine: pure scoring and aggregation rules, the compute
//! orchestrator, idempotent persistence into the external tabular store, and
//! the fire-and-forget recompute trigger used by review workflows.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
