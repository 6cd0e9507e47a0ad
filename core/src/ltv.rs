//! LtvAggregator — windowed lifetime value per customer.
//!
//! For each customer with at least one transaction:
//!   1. First purchase = minimum (timestamp, txn_id) transaction.
//!   2. A transaction contributes iff 0 <= elapsed_days < window_days.
//!   3. Contributions land in 30-day elapsed-month buckets 0..5
//!      (floor(elapsed_days / 30), clamped).
//!
//! Customers with zero transactions are absent from the output — their
//! LTV is undefined, not zero. Summation is order-independent; the store
//! already sorts per-customer transactions by (timestamp, txn_id).

use crate::{
    config::{DAYS_PER_BUCKET, MONTH_BUCKETS},
    error::{AnalyticsError, AnalyticsResult},
    record_store::RecordStore,
    types::CustomerId,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtvRecord {
    pub customer_id: CustomerId,
    pub first_purchase: NaiveDateTime,
    /// Sum of in-window transaction amounts.
    pub cumulative_revenue: f64,
    /// In-window revenue per elapsed-month bucket.
    pub bucket_revenue: [f64; MONTH_BUCKETS],
    /// Revenue at elapsed day 0 (the first order, incl. same-day items).
    pub first_purchase_revenue: f64,
    /// In-window revenue after day 0.
    pub repeat_revenue: f64,
    /// In-window transactions after day 0.
    pub repeat_txn_count: u32,
    /// All in-window transactions.
    pub txn_count: u32,
    /// Earliest bucket containing a repeat transaction, if any.
    pub first_repeat_bucket: Option<usize>,
}

impl LtvRecord {
    /// True when the customer came back after the first purchase day.
    pub fn is_repeat_buyer(&self) -> bool {
        self.first_repeat_bucket.is_some()
    }

    /// Cumulative revenue through elapsed-month offset `m` (inclusive).
    pub fn cumulative_through(&self, m: usize) -> f64 {
        self.bucket_revenue[..=m.min(MONTH_BUCKETS - 1)].iter().sum()
    }
}

pub struct LtvAggregator;

impl LtvAggregator {
    /// One LtvRecord per customer with >= 1 transaction, ascending by id.
    pub fn aggregate(store: &RecordStore, window_days: i64) -> AnalyticsResult<Vec<LtvRecord>> {
        let mut records = Vec::new();

        for customer_id in store.active_customer_ids() {
            let txns = store.transactions_for(customer_id);
            // Sorted by (timestamp, txn_id): the first entry is the
            // first purchase, ties already broken by the stable key.
            let first_purchase = txns[0].timestamp;

            let mut record = LtvRecord {
                customer_id: customer_id.clone(),
                first_purchase,
                cumulative_revenue: 0.0,
                bucket_revenue: [0.0; MONTH_BUCKETS],
                first_purchase_revenue: 0.0,
                repeat_revenue: 0.0,
                repeat_txn_count: 0,
                txn_count: 0,
                first_repeat_bucket: None,
            };

            for txn in &txns {
                let elapsed_days = (txn.timestamp - first_purchase).num_days();
                if !(0..window_days).contains(&elapsed_days) {
                    continue;
                }
                let bucket =
                    ((elapsed_days / DAYS_PER_BUCKET) as usize).min(MONTH_BUCKETS - 1);

                record.cumulative_revenue += txn.amount;
                record.bucket_revenue[bucket] += txn.amount;
                record.txn_count += 1;

                if elapsed_days == 0 {
                    record.first_purchase_revenue += txn.amount;
                } else {
                    record.repeat_revenue += txn.amount;
                    record.repeat_txn_count += 1;
                    record.first_repeat_bucket = Some(
                        record
                            .first_repeat_bucket
                            .map_or(bucket, |b| b.min(bucket)),
                    );
                }
            }

            records.push(record);
        }

        if records.is_empty() {
            return Err(AnalyticsError::EmptyInput {
                context: "no customers with transactions in the snapshot".into(),
            });
        }

        log::debug!(
            "ltv aggregation: {} customers, window {} days",
            records.len(),
            window_days
        );
        Ok(records)
    }
}
