//! ResultSet — the boundary contract consumed by the presentation layer.
//!
//! Every analysis collapses to one of three shapes: a labeled table, a set
//! of labeled numeric series (chart input), or a test outcome. The
//! presentation layer renders these read-only; it never recomputes.

use crate::{
    cohort::Cohort,
    config::MONTH_BUCKETS,
    segment::{LtvFactors, RevenueStructureRow, SegmentSummary},
    stats::{ContingencyTable, TestResult},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ResultSet {
    Table(Table),
    Series(SeriesChart),
    Test(TestResult),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    /// Ordered rows; ordering is part of the contract (already ranked).
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub label: String,
    /// One cell per column; None renders as blank (e.g. undefined std dev).
    pub cells: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesChart {
    pub title: String,
    /// Shared x axis labels for every series.
    pub x_labels: Vec<String>,
    pub series: Vec<LabeledSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledSeries {
    pub label: String,
    pub points: Vec<f64>,
}

fn elapsed_month_labels() -> Vec<String> {
    (0..MONTH_BUCKETS).map(|m| format!("M{m}")).collect()
}

impl ResultSet {
    pub fn from_segments(dimension: &str, summaries: &[SegmentSummary]) -> Self {
        let rows = summaries
            .iter()
            .map(|s| Row {
                label: s.label.clone(),
                cells: vec![
                    Some(s.mean_ltv),
                    Some(s.count as f64),
                    s.std_dev,
                    Some(s.total_revenue),
                    Some(s.revenue_share),
                ],
            })
            .collect();
        ResultSet::Table(Table {
            title: format!("Segment LTV by {dimension}"),
            columns: vec![
                "mean_ltv".into(),
                "count".into(),
                "std_dev".into(),
                "total_revenue".into(),
                "revenue_share".into(),
            ],
            rows,
        })
    }

    pub fn from_ltv_factors(dimension: &str, factors: &LtvFactors) -> Self {
        let to_row = |r: &crate::segment::LtvFactorRow| Row {
            label: r.label.clone(),
            cells: vec![
                Some(r.ltv),
                Some(r.customer_count as f64),
                Some(r.customer_share),
                Some(r.repeat_buyer_share),
                r.avg_repeat_purchases,
                Some(r.avg_first_purchase),
                r.avg_repeat_revenue,
            ],
        };
        let mut rows: Vec<Row> = factors.rows.iter().map(to_row).collect();
        rows.push(to_row(&factors.total));
        ResultSet::Table(Table {
            title: format!("LTV factors by {dimension}"),
            columns: vec![
                "ltv".into(),
                "customers".into(),
                "customer_share".into(),
                "repeat_buyer_share".into(),
                "avg_repeat_purchases".into(),
                "avg_first_purchase".into(),
                "avg_repeat_revenue".into(),
            ],
            rows,
        })
    }

    pub fn from_revenue_structure(dimension: &str, rows: &[RevenueStructureRow]) -> Self {
        ResultSet::Table(Table {
            title: format!("Revenue structure by {dimension}"),
            columns: vec!["revenue_share".into(), "customer_share".into()],
            rows: rows
                .iter()
                .map(|r| Row {
                    label: r.label.clone(),
                    cells: vec![Some(r.revenue_share), Some(r.customer_share)],
                })
                .collect(),
        })
    }

    /// Cohort LTV curves: one series per cohort month, x = elapsed month.
    pub fn from_cohort_ltv(cohorts: &[Cohort]) -> Self {
        ResultSet::Series(SeriesChart {
            title: "Average cumulative LTV by cohort".into(),
            x_labels: elapsed_month_labels(),
            series: cohorts
                .iter()
                .map(|c| LabeledSeries {
                    label: c.month.to_string(),
                    points: c.avg_cumulative_ltv.to_vec(),
                })
                .collect(),
        })
    }

    /// Cohort retention curves, same axes as the LTV chart.
    pub fn from_cohort_retention(cohorts: &[Cohort]) -> Self {
        ResultSet::Series(SeriesChart {
            title: "Repeat-purchase retention by cohort".into(),
            x_labels: elapsed_month_labels(),
            series: cohorts
                .iter()
                .map(|c| LabeledSeries {
                    label: c.month.to_string(),
                    points: c.retention.to_vec(),
                })
                .collect(),
        })
    }

    /// Observed customer counts behind a chi-square test.
    pub fn from_contingency(table: &ContingencyTable) -> Self {
        ResultSet::Table(Table {
            title: format!(
                "Customers by {} x {}",
                table.dimension_rows, table.dimension_cols
            ),
            columns: table.col_labels.clone(),
            rows: table
                .row_labels
                .iter()
                .zip(&table.counts)
                .map(|(label, counts)| Row {
                    label: label.clone(),
                    cells: counts.iter().map(|&c| Some(c as f64)).collect(),
                })
                .collect(),
        })
    }

    pub fn from_test(result: TestResult) -> Self {
        ResultSet::Test(result)
    }
}
