//! CohortBuilder — monthly acquisition cohorts and their LTV curves.
//!
//! A customer belongs to exactly one cohort: the calendar month of their
//! first purchase. For each cohort the builder reports:
//!   1. The average *cumulative* LTV across members at each elapsed-month
//!      offset 0..5 — a monotone non-decreasing curve for non-negative
//!      amounts.
//!   2. The retention curve: share of members who made a repeat purchase
//!      on or before each offset.
//!
//! Small cohorts are reported with a low-confidence flag, never dropped.

use crate::{
    config::{AnalysisConfig, MONTH_BUCKETS},
    error::{AnalyticsError, AnalyticsResult},
    ltv::LtvRecord,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month of first purchase. Orders chronologically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CohortMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for CohortMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cohort {
    pub month: CohortMonth,
    pub member_count: usize,
    /// Average cumulative LTV per member at elapsed-month offsets 0..5.
    pub avg_cumulative_ltv: [f64; MONTH_BUCKETS],
    /// Share of members with a repeat purchase through each offset.
    pub retention: [f64; MONTH_BUCKETS],
    /// Set when member_count < config.min_cohort_size.
    pub low_confidence: bool,
}

pub struct CohortBuilder;

impl CohortBuilder {
    /// One Cohort per distinct first-purchase month, ascending by month.
    pub fn build(records: &[LtvRecord], config: &AnalysisConfig) -> AnalyticsResult<Vec<Cohort>> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyInput {
                context: "no LTV records to build cohorts from".into(),
            });
        }

        let mut by_month: BTreeMap<CohortMonth, Vec<&LtvRecord>> = BTreeMap::new();
        for record in records {
            let month = CohortMonth {
                year: record.first_purchase.year(),
                month: record.first_purchase.month(),
            };
            by_month.entry(month).or_default().push(record);
        }

        let cohorts = by_month
            .into_iter()
            .map(|(month, members)| {
                let n = members.len() as f64;
                let mut avg_cumulative_ltv = [0.0; MONTH_BUCKETS];
                let mut retention = [0.0; MONTH_BUCKETS];

                for (m, slot) in avg_cumulative_ltv.iter_mut().enumerate() {
                    let total: f64 = members.iter().map(|r| r.cumulative_through(m)).sum();
                    *slot = total / n;

                    let returned = members
                        .iter()
                        .filter(|r| r.first_repeat_bucket.is_some_and(|b| b <= m))
                        .count();
                    retention[m] = returned as f64 / n;
                }

                Cohort {
                    month,
                    member_count: members.len(),
                    avg_cumulative_ltv,
                    retention,
                    low_confidence: members.len() < config.min_cohort_size,
                }
            })
            .collect::<Vec<_>>();

        log::debug!("cohort build: {} cohorts", cohorts.len());
        Ok(cohorts)
    }
}
