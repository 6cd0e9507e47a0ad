//! SegmentAnalyzer — per-dimension customer partitions and their LTV.
//!
//! One dimension (country, channel, …) partitions the customer set into
//! segments: every customer lands in exactly one segment, with an explicit
//! "unknown" bucket for missing attribute values. Three views:
//!   1. `analyze`   — summary stats per segment (mean, count, std dev,
//!      revenue share), ranked by descending mean LTV.
//!   2. `ltv_factors` — the factor table behind the ranking: repeat-buyer
//!      share, average first vs repeat purchase values, plus a Total row.
//!   3. `revenue_structure` — revenue share vs customer share, the input
//!      for pie-style comparison.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    ltv::LtvRecord,
    record_store::RecordStore,
    types::SegmentLabel,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub label: SegmentLabel,
    pub count: usize,
    pub mean_ltv: f64,
    /// Sample standard deviation (Bessel). None when count < 2.
    pub std_dev: Option<f64>,
    pub total_revenue: f64,
    /// Segment revenue / grand total revenue. 0.0 when the grand total
    /// is zero (see DESIGN.md).
    pub revenue_share: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtvFactorRow {
    pub label: SegmentLabel,
    /// Total revenue / customer count.
    pub ltv: f64,
    pub customer_count: usize,
    pub customer_share: f64,
    /// Share of customers who purchased again after day 0.
    pub repeat_buyer_share: f64,
    /// Repeat transactions per repeat buyer. None when nobody returned.
    pub avg_repeat_purchases: Option<f64>,
    /// First-order revenue per customer.
    pub avg_first_purchase: f64,
    /// Repeat revenue per repeat buyer. None when nobody returned.
    pub avg_repeat_revenue: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtvFactors {
    /// Per-segment rows, ascending by label.
    pub rows: Vec<LtvFactorRow>,
    /// Aggregate over all segments of the dimension.
    pub total: LtvFactorRow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueStructureRow {
    pub label: SegmentLabel,
    pub revenue_share: f64,
    pub customer_share: f64,
}

pub struct SegmentAnalyzer;

impl SegmentAnalyzer {
    /// Summary stats per segment, sorted by descending mean LTV with the
    /// label as deterministic tie-break. Revenue shares sum to 1.0 (± fp
    /// tolerance) whenever the grand total is positive.
    pub fn analyze(
        store: &RecordStore,
        records: &[LtvRecord],
        dimension: &str,
    ) -> AnalyticsResult<Vec<SegmentSummary>> {
        let groups = Self::partition(store, records, dimension)?;
        let grand_total: f64 = records.iter().map(|r| r.cumulative_revenue).sum();

        let mut summaries: Vec<SegmentSummary> = groups
            .into_iter()
            .map(|(label, members)| {
                let n = members.len();
                let total: f64 = members.iter().map(|r| r.cumulative_revenue).sum();
                let mean = total / n as f64;
                let std_dev = if n >= 2 {
                    let ss: f64 = members
                        .iter()
                        .map(|r| (r.cumulative_revenue - mean).powi(2))
                        .sum();
                    Some((ss / (n - 1) as f64).sqrt())
                } else {
                    None
                };
                let revenue_share = if grand_total > 0.0 {
                    total / grand_total
                } else {
                    0.0
                };
                SegmentSummary {
                    label,
                    count: n,
                    mean_ltv: mean,
                    std_dev,
                    total_revenue: total,
                    revenue_share,
                }
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.mean_ltv
                .partial_cmp(&a.mean_ltv)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });

        log::debug!(
            "segment analysis '{dimension}': {} segments",
            summaries.len()
        );
        Ok(summaries)
    }

    /// The factor table behind segment LTV differences, ascending by
    /// label, plus a Total row over the whole dimension.
    pub fn ltv_factors(
        store: &RecordStore,
        records: &[LtvRecord],
        dimension: &str,
    ) -> AnalyticsResult<LtvFactors> {
        let groups = Self::partition(store, records, dimension)?;
        let all: Vec<&LtvRecord> = records.iter().collect();
        let grand_count = records.len();

        let rows = groups
            .into_iter()
            .map(|(label, members)| Self::factor_row(label, &members, grand_count))
            .collect();
        let total = Self::factor_row("Total".into(), &all, grand_count);

        Ok(LtvFactors { rows, total })
    }

    /// Revenue share vs customer share per segment, ascending by label.
    /// Both share columns sum to 1.0 when their totals are positive.
    pub fn revenue_structure(
        store: &RecordStore,
        records: &[LtvRecord],
        dimension: &str,
    ) -> AnalyticsResult<Vec<RevenueStructureRow>> {
        let groups = Self::partition(store, records, dimension)?;
        let grand_total: f64 = records.iter().map(|r| r.cumulative_revenue).sum();
        let grand_count = records.len() as f64;

        Ok(groups
            .into_iter()
            .map(|(label, members)| {
                let total: f64 = members.iter().map(|r| r.cumulative_revenue).sum();
                RevenueStructureRow {
                    label,
                    revenue_share: if grand_total > 0.0 {
                        total / grand_total
                    } else {
                        0.0
                    },
                    customer_share: members.len() as f64 / grand_count,
                }
            })
            .collect())
    }

    /// Group LTV records by the customer's value of `dimension`.
    /// BTreeMap keeps labels sorted for deterministic iteration.
    fn partition<'a>(
        store: &RecordStore,
        records: &'a [LtvRecord],
        dimension: &str,
    ) -> AnalyticsResult<BTreeMap<SegmentLabel, Vec<&'a LtvRecord>>> {
        store.require_dimension(dimension)?;
        if records.is_empty() {
            return Err(AnalyticsError::EmptyInput {
                context: format!("no LTV records to segment by '{dimension}'"),
            });
        }

        let mut groups: BTreeMap<SegmentLabel, Vec<&LtvRecord>> = BTreeMap::new();
        for record in records {
            let label = store.segment_of(&record.customer_id, dimension);
            groups.entry(label).or_default().push(record);
        }
        Ok(groups)
    }

    fn factor_row(label: SegmentLabel, members: &[&LtvRecord], grand_count: usize) -> LtvFactorRow {
        let n = members.len();
        let total: f64 = members.iter().map(|r| r.cumulative_revenue).sum();
        let first_total: f64 = members.iter().map(|r| r.first_purchase_revenue).sum();
        let repeat_total: f64 = members.iter().map(|r| r.repeat_revenue).sum();
        let repeat_txns: u32 = members.iter().map(|r| r.repeat_txn_count).sum();
        let repeat_buyers = members.iter().filter(|r| r.is_repeat_buyer()).count();

        LtvFactorRow {
            label,
            ltv: total / n as f64,
            customer_count: n,
            customer_share: n as f64 / grand_count as f64,
            repeat_buyer_share: repeat_buyers as f64 / n as f64,
            avg_repeat_purchases: (repeat_buyers > 0)
                .then(|| f64::from(repeat_txns) / repeat_buyers as f64),
            avg_first_purchase: first_total / n as f64,
            avg_repeat_revenue: (repeat_buyers > 0).then(|| repeat_total / repeat_buyers as f64),
        }
    }
}
