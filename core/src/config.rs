//! Analysis configuration — the only tunables the core accepts.
//!
//! Everything else (column mapping, rendering, file paths) belongs to the
//! ingestion and presentation collaborators. No global state: the config
//! is passed into each engine call.

use serde::{Deserialize, Serialize};

/// LTV observation window, in days. 183 ≈ six calendar months.
pub const DEFAULT_WINDOW_DAYS: i64 = 183;

/// Number of elapsed-month buckets tracked per customer (offsets 0..5).
pub const MONTH_BUCKETS: usize = 6;

/// Days per elapsed-month bucket. Fixed 30-day buckets, not calendar
/// months — see DESIGN.md.
pub const DAYS_PER_BUCKET: i64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// LTV window length in days from each customer's first purchase.
    pub window_days: i64,
    /// Significance threshold for hypothesis tests.
    pub alpha: f64,
    /// Cohorts smaller than this are flagged low-confidence (never dropped).
    pub min_cohort_size: usize,
    /// Which two-sample t-test to run.
    pub t_test_variant: TTestVariant,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            alpha: 0.05,
            min_cohort_size: 1,
            t_test_variant: TTestVariant::Welch,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TTestVariant {
    /// Unequal-variance form (Welch–Satterthwaite degrees of freedom).
    Welch,
    /// Classic pooled-variance form, df = n1 + n2 - 2.
    Pooled,
}
