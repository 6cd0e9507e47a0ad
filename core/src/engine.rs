//! AnalyticsEngine — the facade the orchestration layer calls.
//!
//! Owns one immutable RecordStore snapshot plus the analysis config and
//! exposes one method per analysis request. Every request is a pure
//! function of the snapshot: LTV records are recomputed per call and
//! nothing is cached or mutated, so independent requests may run
//! concurrently against a shared engine reference.

use crate::{
    cohort::{Cohort, CohortBuilder},
    config::AnalysisConfig,
    error::{AnalyticsError, AnalyticsResult},
    ltv::{LtvAggregator, LtvRecord},
    record_store::RecordStore,
    result::ResultSet,
    segment::{LtvFactors, RevenueStructureRow, SegmentAnalyzer, SegmentSummary},
    stats::{ContingencyTable, StatisticalTestEngine, TestResult},
};

pub struct AnalyticsEngine {
    store: RecordStore,
    config: AnalysisConfig,
}

impl AnalyticsEngine {
    pub fn new(store: RecordStore, config: AnalysisConfig) -> Self {
        log::info!(
            "analytics engine: {} customers, {} transactions, window {} days",
            store.customer_count(),
            store.transaction_count(),
            config.window_days
        );
        Self { store, config }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Windowed LTV per customer with >= 1 transaction.
    pub fn ltv_records(&self) -> AnalyticsResult<Vec<LtvRecord>> {
        LtvAggregator::aggregate(&self.store, self.config.window_days)
    }

    /// Monthly cohorts with cumulative LTV and retention curves.
    pub fn cohorts(&self) -> AnalyticsResult<Vec<Cohort>> {
        let records = self.ltv_records()?;
        CohortBuilder::build(&records, &self.config)
    }

    /// Per-segment LTV summary for one dimension, ranked by mean LTV.
    pub fn segments(&self, dimension: &str) -> AnalyticsResult<Vec<SegmentSummary>> {
        let records = self.ltv_records()?;
        SegmentAnalyzer::analyze(&self.store, &records, dimension)
    }

    /// LTV factor table for one dimension (with Total row).
    pub fn ltv_factors(&self, dimension: &str) -> AnalyticsResult<LtvFactors> {
        let records = self.ltv_records()?;
        SegmentAnalyzer::ltv_factors(&self.store, &records, dimension)
    }

    /// Revenue share vs customer share for one dimension.
    pub fn revenue_structure(&self, dimension: &str) -> AnalyticsResult<Vec<RevenueStructureRow>> {
        let records = self.ltv_records()?;
        SegmentAnalyzer::revenue_structure(&self.store, &records, dimension)
    }

    /// Customer-count contingency table over two dimensions.
    pub fn contingency_table(
        &self,
        dim_rows: &str,
        dim_cols: &str,
    ) -> AnalyticsResult<ContingencyTable> {
        StatisticalTestEngine::contingency_table(&self.store, dim_rows, dim_cols)
    }

    /// Chi-square independence test between two dimensions.
    pub fn chi_square(&self, dim_rows: &str, dim_cols: &str) -> AnalyticsResult<TestResult> {
        StatisticalTestEngine::chi_square(&self.store, dim_rows, dim_cols, self.config.alpha)
    }

    /// Two-sample t-test on LTV between two segments of one dimension.
    pub fn t_test_by_dimension(
        &self,
        dimension: &str,
        label_a: &str,
        label_b: &str,
    ) -> AnalyticsResult<TestResult> {
        let records = self.ltv_records()?;
        let sample_a = self.segment_sample(&records, dimension, label_a)?;
        let sample_b = self.segment_sample(&records, dimension, label_b)?;
        StatisticalTestEngine::t_test(
            &sample_a,
            &sample_b,
            self.config.t_test_variant,
            self.config.alpha,
            &format!("LTV of '{dimension}': {label_a} vs {label_b}"),
        )
    }

    /// Per-customer LTV values for one segment of a dimension.
    fn segment_sample(
        &self,
        records: &[LtvRecord],
        dimension: &str,
        label: &str,
    ) -> AnalyticsResult<Vec<f64>> {
        self.store.require_dimension(dimension)?;
        let sample: Vec<f64> = records
            .iter()
            .filter(|r| self.store.segment_of(&r.customer_id, dimension) == label)
            .map(|r| r.cumulative_revenue)
            .collect();
        if sample.is_empty() {
            return Err(AnalyticsError::EmptyInput {
                context: format!("no customers in segment '{label}' of '{dimension}'"),
            });
        }
        Ok(sample)
    }

    // ── ResultSet convenience wrappers ───────────────────────────────────

    pub fn segments_result(&self, dimension: &str) -> AnalyticsResult<ResultSet> {
        Ok(ResultSet::from_segments(dimension, &self.segments(dimension)?))
    }

    pub fn ltv_factors_result(&self, dimension: &str) -> AnalyticsResult<ResultSet> {
        Ok(ResultSet::from_ltv_factors(
            dimension,
            &self.ltv_factors(dimension)?,
        ))
    }

    pub fn revenue_structure_result(&self, dimension: &str) -> AnalyticsResult<ResultSet> {
        Ok(ResultSet::from_revenue_structure(
            dimension,
            &self.revenue_structure(dimension)?,
        ))
    }

    pub fn cohort_ltv_result(&self) -> AnalyticsResult<ResultSet> {
        Ok(ResultSet::from_cohort_ltv(&self.cohorts()?))
    }

    pub fn cohort_retention_result(&self) -> AnalyticsResult<ResultSet> {
        Ok(ResultSet::from_cohort_retention(&self.cohorts()?))
    }
}
