//! RecordStore — immutable in-memory view of one dataset snapshot.
//!
//! The ingestion collaborator builds one RecordStore per analysis session
//! from validated, typed rows. The store never changes after `build`;
//! every engine stage reads it, none writes it. Transactions are indexed
//! per customer and kept sorted by (timestamp, txn_id) so downstream
//! aggregation is independent of ingestion order.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::{CustomerId, DimensionName, SegmentLabel, TxnId, UNKNOWN_SEGMENT},
};
use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    /// Open set of categorical attributes: country, channel, age group…
    /// Keys are dimension names; a missing key means "unknown".
    pub attributes: BTreeMap<DimensionName, SegmentLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txn_id: TxnId,
    pub customer_id: CustomerId,
    pub timestamp: NaiveDateTime,
    /// Net revenue after discounts. Ingestion guarantees non-null.
    pub amount: f64,
    pub store_id: Option<String>,
    pub product_id: Option<String>,
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    customers: BTreeMap<CustomerId, CustomerRecord>,
    transactions: Vec<TransactionRecord>,
    /// Indexes into `transactions`, per customer, sorted by
    /// (timestamp, txn_id). Customers with no transactions have no entry.
    by_customer: BTreeMap<CustomerId, Vec<usize>>,
}

impl RecordStore {
    /// Build a session snapshot. Referential integrity (every transaction
    /// references a known customer) is part of the ingestion contract;
    /// a violation here is a contract breach, not an analytics outcome.
    pub fn build(
        customers: Vec<CustomerRecord>,
        transactions: Vec<TransactionRecord>,
    ) -> AnalyticsResult<Self> {
        let customers: BTreeMap<CustomerId, CustomerRecord> = customers
            .into_iter()
            .map(|c| (c.customer_id.clone(), c))
            .collect();

        let mut by_customer: BTreeMap<CustomerId, Vec<usize>> = BTreeMap::new();
        for (idx, txn) in transactions.iter().enumerate() {
            if !customers.contains_key(&txn.customer_id) {
                return Err(AnalyticsError::Other(anyhow!(
                    "transaction {} references unknown customer {}",
                    txn.txn_id,
                    txn.customer_id
                )));
            }
            by_customer
                .entry(txn.customer_id.clone())
                .or_default()
                .push(idx);
        }
        for indexes in by_customer.values_mut() {
            indexes.sort_by(|&a, &b| {
                let ta = &transactions[a];
                let tb = &transactions[b];
                (ta.timestamp, &ta.txn_id).cmp(&(tb.timestamp, &tb.txn_id))
            });
        }

        log::debug!(
            "record store built: {} customers, {} transactions",
            customers.len(),
            transactions.len()
        );

        Ok(Self {
            customers,
            transactions,
            by_customer,
        })
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// All customers, ascending by id.
    pub fn customers(&self) -> impl Iterator<Item = &CustomerRecord> {
        self.customers.values()
    }

    pub fn customer(&self, id: &str) -> Option<&CustomerRecord> {
        self.customers.get(id)
    }

    /// A customer's transactions sorted by (timestamp, txn_id).
    /// Empty slice for customers with no transactions.
    pub fn transactions_for(&self, customer_id: &str) -> Vec<&TransactionRecord> {
        self.by_customer
            .get(customer_id)
            .map(|idxs| idxs.iter().map(|&i| &self.transactions[i]).collect())
            .unwrap_or_default()
    }

    /// Customer ids that have at least one transaction, ascending.
    pub fn active_customer_ids(&self) -> impl Iterator<Item = &CustomerId> {
        self.by_customer.keys()
    }

    /// Every dimension name carried by at least one customer, sorted.
    pub fn dimensions(&self) -> BTreeSet<DimensionName> {
        self.customers
            .values()
            .flat_map(|c| c.attributes.keys().cloned())
            .collect()
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.customers
            .values()
            .any(|c| c.attributes.contains_key(name))
    }

    /// Resolve a dimension name, erroring if no customer carries it.
    pub fn require_dimension(&self, name: &str) -> AnalyticsResult<()> {
        if self.has_dimension(name) {
            Ok(())
        } else {
            Err(AnalyticsError::UnknownDimension { name: name.into() })
        }
    }

    /// A customer's value for a dimension, with the explicit unknown bucket
    /// for missing values. Partition invariant: every customer maps to
    /// exactly one label per dimension.
    pub fn segment_of(&self, customer_id: &str, dimension: &str) -> SegmentLabel {
        self.customers
            .get(customer_id)
            .and_then(|c| c.attributes.get(dimension))
            .cloned()
            .unwrap_or_else(|| UNKNOWN_SEGMENT.to_string())
    }
}
