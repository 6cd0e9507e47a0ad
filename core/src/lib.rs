//! ltv-core: retail customer lifetime-value analytics engine.
//!
//! Computes windowed per-customer LTV, monthly cohort curves, segment
//! comparisons and hypothesis tests (chi-square independence, two-sample
//! t-test) over an immutable in-memory dataset snapshot. Ingestion and
//! presentation are external collaborators: rows come in via
//! [`record_store::RecordStore::build`], results go out as
//! [`result::ResultSet`] values.

pub mod cohort;
pub mod config;
pub mod engine;
pub mod error;
pub mod ltv;
pub mod record_store;
pub mod result;
pub mod segment;
pub mod stats;
pub mod types;

pub use config::{AnalysisConfig, TTestVariant};
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, AnalyticsResult};
pub use record_store::{CustomerRecord, RecordStore, TransactionRecord};
pub use result::ResultSet;
