//! StatisticalTestEngine — hypothesis tests over customer segments.
//!
//! Two tests, both pure and reproducible:
//!   1. Chi-square test of independence between two categorical customer
//!      dimensions, over a customer-count contingency table.
//!   2. Two-sample t-test comparing LTV between two segments (Welch by
//!      default, pooled optional).
//!
//! Tests that would be statistically invalid are refused with
//! `InsufficientData` instead of returning a misleading statistic.

use crate::{
    config::TTestVariant,
    error::{AnalyticsError, AnalyticsResult},
    record_store::RecordStore,
    types::SegmentLabel,
};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};
use std::collections::BTreeMap;

/// Minimum expected count per contingency cell for a valid chi-square
/// approximation (Cochran's rule of thumb).
pub const MIN_EXPECTED_CELL: f64 = 5.0;

/// Mean difference below this is treated as equal for the zero-variance
/// sentinel case.
const MEAN_EQUALITY_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    ChiSquare,
    TTest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub kind: TestKind,
    /// Human-readable summary of what was compared.
    pub description: String,
    pub statistic: f64,
    /// (rows-1)*(cols-1) for chi-square; Welch–Satterthwaite or pooled
    /// for the t-test (fractional under Welch).
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub alpha: f64,
    /// p_value < alpha.
    pub significant: bool,
}

/// Customer counts cross-tabulated over two dimensions. Exposed so the
/// presentation layer can render the observed counts next to the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContingencyTable {
    pub dimension_rows: String,
    pub dimension_cols: String,
    pub row_labels: Vec<SegmentLabel>,
    pub col_labels: Vec<SegmentLabel>,
    /// counts[r][c] = customers with row label r and column label c.
    pub counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn col_totals(&self) -> Vec<u64> {
        (0..self.col_labels.len())
            .map(|c| self.counts.iter().map(|row| row[c]).sum())
            .collect()
    }

    pub fn grand_total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

pub struct StatisticalTestEngine;

impl StatisticalTestEngine {
    /// Cross-tabulate customer counts over two dimensions. Labels are
    /// sorted; customers missing a value land in the "unknown" bucket.
    pub fn contingency_table(
        store: &RecordStore,
        dim_rows: &str,
        dim_cols: &str,
    ) -> AnalyticsResult<ContingencyTable> {
        store.require_dimension(dim_rows)?;
        store.require_dimension(dim_cols)?;

        let mut cells: BTreeMap<(SegmentLabel, SegmentLabel), u64> = BTreeMap::new();
        for customer in store.customers() {
            let r = store.segment_of(&customer.customer_id, dim_rows);
            let c = store.segment_of(&customer.customer_id, dim_cols);
            *cells.entry((r, c)).or_insert(0) += 1;
        }

        let mut row_labels: Vec<SegmentLabel> =
            cells.keys().map(|(r, _)| r.clone()).collect();
        row_labels.dedup();
        let mut col_labels: Vec<SegmentLabel> =
            cells.keys().map(|(_, c)| c.clone()).collect();
        col_labels.sort();
        col_labels.dedup();

        let counts = row_labels
            .iter()
            .map(|r| {
                col_labels
                    .iter()
                    .map(|c| cells.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Ok(ContingencyTable {
            dimension_rows: dim_rows.into(),
            dimension_cols: dim_cols.into(),
            row_labels,
            col_labels,
            counts,
        })
    }

    /// Chi-square test of independence between two customer dimensions.
    ///
    /// Refused with `InsufficientData` when either dimension has fewer
    /// than 2 distinct values or any expected cell count falls below
    /// `MIN_EXPECTED_CELL`.
    pub fn chi_square(
        store: &RecordStore,
        dim_rows: &str,
        dim_cols: &str,
        alpha: f64,
    ) -> AnalyticsResult<TestResult> {
        let table = Self::contingency_table(store, dim_rows, dim_cols)?;
        Self::chi_square_from_table(&table, alpha)
    }

    /// Chi-square over an already-built contingency table.
    pub fn chi_square_from_table(
        table: &ContingencyTable,
        alpha: f64,
    ) -> AnalyticsResult<TestResult> {
        let rows = table.row_labels.len();
        let cols = table.col_labels.len();
        if rows < 2 || cols < 2 {
            return Err(AnalyticsError::InsufficientData {
                test: "chi-square".into(),
                detail: format!(
                    "need >= 2 distinct values per dimension, got {rows}x{cols}"
                ),
            });
        }

        let row_totals = table.row_totals();
        let col_totals = table.col_totals();
        let grand = table.grand_total() as f64;

        let mut statistic = 0.0;
        for (r, row) in table.counts.iter().enumerate() {
            for (c, &observed) in row.iter().enumerate() {
                let expected = row_totals[r] as f64 * col_totals[c] as f64 / grand;
                if expected < MIN_EXPECTED_CELL {
                    return Err(AnalyticsError::InsufficientData {
                        test: "chi-square".into(),
                        detail: format!(
                            "expected count {expected:.2} in cell ({}, {}) below {MIN_EXPECTED_CELL}",
                            table.row_labels[r], table.col_labels[c]
                        ),
                    });
                }
                statistic += (observed as f64 - expected).powi(2) / expected;
            }
        }

        let df = ((rows - 1) * (cols - 1)) as f64;
        let dist = ChiSquared::new(df)
            .map_err(|e| AnalyticsError::Other(anyhow!("chi-squared distribution: {e}")))?;
        let p_value = 1.0 - dist.cdf(statistic);

        let result = TestResult {
            kind: TestKind::ChiSquare,
            description: format!(
                "independence of '{}' and '{}'",
                table.dimension_rows, table.dimension_cols
            ),
            statistic,
            degrees_of_freedom: df,
            p_value,
            alpha,
            significant: p_value < alpha,
        };
        log::info!(
            "chi-square {}: stat={:.4} df={} p={:.4} significant={}",
            result.description,
            result.statistic,
            df,
            result.p_value,
            result.significant
        );
        Ok(result)
    }

    /// Two-sample t-test on per-customer LTV values.
    ///
    /// Welch by default; pooled when requested. Both samples need >= 2
    /// observations. When both samples have zero variance:
    ///   - equal means → sentinel result (statistic 0, p = 1.0), so that
    ///     identical samples compare as "no difference";
    ///   - different means → `DegenerateVariance` (the standard error is
    ///     zero; no finite statistic exists).
    pub fn t_test(
        sample_a: &[f64],
        sample_b: &[f64],
        variant: TTestVariant,
        alpha: f64,
        description: &str,
    ) -> AnalyticsResult<TestResult> {
        let n1 = sample_a.len();
        let n2 = sample_b.len();
        if n1 < 2 || n2 < 2 {
            return Err(AnalyticsError::InsufficientData {
                test: "t-test".into(),
                detail: format!("need >= 2 observations per sample, got {n1} and {n2}"),
            });
        }

        let mean1 = mean(sample_a);
        let mean2 = mean(sample_b);
        let var1 = sample_variance(sample_a, mean1);
        let var2 = sample_variance(sample_b, mean2);

        if var1 == 0.0 && var2 == 0.0 {
            if (mean1 - mean2).abs() < MEAN_EQUALITY_EPS {
                return Ok(TestResult {
                    kind: TestKind::TTest,
                    description: description.into(),
                    statistic: 0.0,
                    degrees_of_freedom: (n1 + n2 - 2) as f64,
                    p_value: 1.0,
                    alpha,
                    significant: false,
                });
            }
            return Err(AnalyticsError::DegenerateVariance);
        }

        let (statistic, df) = match variant {
            TTestVariant::Welch => {
                let se1 = var1 / n1 as f64;
                let se2 = var2 / n2 as f64;
                let t = (mean1 - mean2) / (se1 + se2).sqrt();
                let df = (se1 + se2).powi(2)
                    / (se1.powi(2) / (n1 as f64 - 1.0) + se2.powi(2) / (n2 as f64 - 1.0));
                (t, df)
            }
            TTestVariant::Pooled => {
                let df = (n1 + n2 - 2) as f64;
                let pooled = ((n1 as f64 - 1.0) * var1 + (n2 as f64 - 1.0) * var2) / df;
                let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
                ((mean1 - mean2) / se, df)
            }
        };

        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| AnalyticsError::Other(anyhow!("t distribution: {e}")))?;
        let p_value = 2.0 * (1.0 - dist.cdf(statistic.abs()));

        let result = TestResult {
            kind: TestKind::TTest,
            description: description.into(),
            statistic,
            degrees_of_freedom: df,
            p_value,
            alpha,
            significant: p_value < alpha,
        };
        log::info!(
            "t-test {}: stat={:.4} df={:.2} p={:.4} significant={}",
            result.description,
            result.statistic,
            result.degrees_of_freedom,
            result.p_value,
            result.significant
        );
        Ok(result)
    }
}

fn mean(sample: &[f64]) -> f64 {
    sample.iter().sum::<f64>() / sample.len() as f64
}

fn sample_variance(sample: &[f64], mean: f64) -> f64 {
    sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (sample.len() as f64 - 1.0)
}
