//! Shared primitive types used across the analytics engine.

/// A stable, unique customer identifier supplied by the ingestion layer.
pub type CustomerId = String;

/// A stable, unique transaction identifier supplied by the ingestion layer.
pub type TxnId = String;

/// The name of a categorical customer dimension (e.g. "customer_country").
pub type DimensionName = String;

/// One categorical value of a dimension (e.g. "DE").
pub type SegmentLabel = String;

/// Label assigned to customers missing a value for a requested dimension.
/// Such customers are bucketed explicitly, never dropped.
pub const UNKNOWN_SEGMENT: &str = "unknown";
