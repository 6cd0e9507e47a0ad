use chrono::{NaiveDate, NaiveDateTime};
use ltv_core::{
    error::AnalyticsError, AnalysisConfig, AnalyticsEngine, CustomerRecord, RecordStore,
    TransactionRecord,
};
use std::collections::BTreeMap;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn ts(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(15, 0, 0)
        .unwrap()
}

fn customer(id: &str, attrs: &[(&str, &str)]) -> CustomerRecord {
    CustomerRecord {
        customer_id: id.into(),
        attributes: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn txn(id: &str, customer_id: &str, timestamp: NaiveDateTime, amount: f64) -> TransactionRecord {
    TransactionRecord {
        txn_id: id.into(),
        customer_id: customer_id.into(),
        timestamp,
        amount,
        store_id: None,
        product_id: None,
        employee_id: None,
    }
}

/// Four customers across two countries, one with no country at all.
fn country_engine() -> AnalyticsEngine {
    let customers = vec![
        customer("c1", &[("country", "DE")]),
        customer("c2", &[("country", "DE")]),
        customer("c3", &[("country", "FR")]),
        customer("c4", &[]),
    ];
    let txns = vec![
        txn("t1", "c1", ts(2024, 1, 5), 100.0),
        txn("t2", "c2", ts(2024, 1, 8), 200.0),
        txn("t3", "c3", ts(2024, 1, 9), 400.0),
        txn("t4", "c4", ts(2024, 2, 1), 50.0),
    ];
    AnalyticsEngine::new(
        RecordStore::build(customers, txns).unwrap(),
        AnalysisConfig::default(),
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Revenue shares across all segments of one dimension sum to 1.0.
#[test]
fn revenue_shares_sum_to_one() {
    let segments = country_engine().segments("country").unwrap();
    let share_sum: f64 = segments.iter().map(|s| s.revenue_share).sum();
    assert!(
        (share_sum - 1.0).abs() < 1e-9,
        "shares sum to {share_sum}, expected 1.0"
    );
}

/// Segments come out ranked by descending mean LTV; customers missing the
/// attribute land in the explicit "unknown" bucket.
#[test]
fn segments_ranked_with_unknown_bucket() {
    let segments = country_engine().segments("country").unwrap();
    let labels: Vec<&str> = segments.iter().map(|s| s.label.as_str()).collect();
    // FR mean 400, DE mean 150, unknown mean 50.
    assert_eq!(labels, vec!["FR", "DE", "unknown"]);
    assert_eq!(segments[1].count, 2);
    assert_eq!(segments[2].count, 1);
}

/// Equal-mean segments tie-break on the label for deterministic output.
#[test]
fn equal_means_tie_break_on_label() {
    let customers = vec![
        customer("c1", &[("channel", "web")]),
        customer("c2", &[("channel", "app")]),
    ];
    let txns = vec![
        txn("t1", "c1", ts(2024, 1, 1), 75.0),
        txn("t2", "c2", ts(2024, 1, 2), 75.0),
    ];
    let e = AnalyticsEngine::new(
        RecordStore::build(customers, txns).unwrap(),
        AnalysisConfig::default(),
    );

    let labels: Vec<String> = e
        .segments("channel")
        .unwrap()
        .into_iter()
        .map(|s| s.label)
        .collect();
    assert_eq!(labels, vec!["app", "web"]);
}

/// Sample standard deviation uses Bessel's correction and is undefined
/// (None) for single-member segments.
#[test]
fn std_dev_bessel_and_undefined_below_two() {
    let segments = country_engine().segments("country").unwrap();

    let de = segments.iter().find(|s| s.label == "DE").unwrap();
    // Values 100 and 200: sd = sqrt(((100-150)^2 + (200-150)^2) / 1).
    let expected = (5000.0f64).sqrt();
    assert!((de.std_dev.unwrap() - expected).abs() < 1e-9);

    let fr = segments.iter().find(|s| s.label == "FR").unwrap();
    assert!(fr.std_dev.is_none());
}

/// A dimension no customer carries is an UnknownDimension error.
#[test]
fn unknown_dimension_is_rejected() {
    let err = country_engine().segments("planet").unwrap_err();
    assert!(matches!(err, AnalyticsError::UnknownDimension { .. }));
}

/// The LTV factors Total row aggregates over the whole dimension.
#[test]
fn ltv_factors_total_row() {
    let factors = country_engine().ltv_factors("country").unwrap();

    assert_eq!(factors.total.customer_count, 4);
    // Grand total revenue 750 over 4 customers.
    assert!((factors.total.ltv - 187.5).abs() < 1e-9);
    assert!((factors.total.customer_share - 1.0).abs() < 1e-9);
    // Nobody made a repeat purchase in this fixture.
    assert!((factors.total.repeat_buyer_share - 0.0).abs() < 1e-9);
    assert!(factors.total.avg_repeat_purchases.is_none());

    // Per-segment rows are ascending by label.
    let labels: Vec<&str> = factors.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["DE", "FR", "unknown"]);
}

/// Revenue structure: both share columns sum to 1.0.
#[test]
fn revenue_structure_shares_sum_to_one() {
    let rows = country_engine().revenue_structure("country").unwrap();

    let revenue_sum: f64 = rows.iter().map(|r| r.revenue_share).sum();
    let customer_sum: f64 = rows.iter().map(|r| r.customer_share).sum();
    assert!((revenue_sum - 1.0).abs() < 1e-9);
    assert!((customer_sum - 1.0).abs() < 1e-9);
}

/// A snapshot whose in-window revenue is all zero (e.g. fully discounted
/// orders) reports revenue shares as 0.0, never NaN.
#[test]
fn zero_grand_total_reports_zero_shares() {
    let customers = vec![
        customer("c1", &[("country", "DE")]),
        customer("c2", &[("country", "FR")]),
    ];
    let txns = vec![
        txn("t1", "c1", ts(2024, 1, 5), 0.0),
        txn("t2", "c2", ts(2024, 1, 9), 0.0),
    ];
    let e = AnalyticsEngine::new(
        RecordStore::build(customers, txns).unwrap(),
        AnalysisConfig::default(),
    );

    for s in e.segments("country").unwrap() {
        assert!(!s.revenue_share.is_nan());
        assert_eq!(s.revenue_share, 0.0);
    }
    for r in e.revenue_structure("country").unwrap() {
        assert!(!r.revenue_share.is_nan());
        assert_eq!(r.revenue_share, 0.0);
        // Customer shares are count-based and still partition to 1.0.
        assert!((r.customer_share - 0.5).abs() < 1e-9);
    }
}

/// Zero qualifying customers is an explicit EmptyInput, not a zero table.
#[test]
fn segmentation_with_no_transactions_is_reported() {
    let e = AnalyticsEngine::new(
        RecordStore::build(vec![customer("c1", &[("country", "DE")])], vec![]).unwrap(),
        AnalysisConfig::default(),
    );
    let err = e.segments("country").unwrap_err();
    assert!(matches!(err, AnalyticsError::EmptyInput { .. }));
}
