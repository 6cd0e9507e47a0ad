use chrono::{NaiveDate, NaiveDateTime};
use ltv_core::{
    result::ResultSet, AnalysisConfig, AnalyticsEngine, CustomerRecord, RecordStore,
    TransactionRecord,
};
use std::collections::BTreeMap;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn ts(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(11, 0, 0)
        .unwrap()
}

fn engine() -> AnalyticsEngine {
    let customers = vec![
        CustomerRecord {
            customer_id: "c1".into(),
            attributes: BTreeMap::from([("country".to_string(), "DE".to_string())]),
        },
        CustomerRecord {
            customer_id: "c2".into(),
            attributes: BTreeMap::from([("country".to_string(), "FR".to_string())]),
        },
    ];
    let txns = vec![
        TransactionRecord {
            txn_id: "t1".into(),
            customer_id: "c1".into(),
            timestamp: ts(2024, 1, 2),
            amount: 120.0,
            store_id: None,
            product_id: None,
            employee_id: None,
        },
        TransactionRecord {
            txn_id: "t2".into(),
            customer_id: "c2".into(),
            timestamp: ts(2024, 2, 3),
            amount: 80.0,
            store_id: None,
            product_id: None,
            employee_id: None,
        },
    ];
    AnalyticsEngine::new(
        RecordStore::build(customers, txns).unwrap(),
        AnalysisConfig::default(),
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Segment tables carry one row per segment in ranked order, with the
/// undefined std dev rendered as a null cell.
#[test]
fn segment_table_shape() {
    let rs = engine().segments_result("country").unwrap();
    let ResultSet::Table(table) = rs else {
        panic!("expected a table");
    };

    assert_eq!(table.columns.len(), 5);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].label, "DE"); // mean 120 > 80
    // std_dev column (index 2) is None for single-member segments.
    assert!(table.rows[0].cells[2].is_none());
}

/// Cohort charts share one x axis (M0..M5) and carry one series per
/// cohort month.
#[test]
fn cohort_series_shape() {
    let rs = engine().cohort_ltv_result().unwrap();
    let ResultSet::Series(chart) = rs else {
        panic!("expected series");
    };

    assert_eq!(chart.x_labels, vec!["M0", "M1", "M2", "M3", "M4", "M5"]);
    assert_eq!(chart.series.len(), 2);
    assert_eq!(chart.series[0].label, "2024-01");
    assert_eq!(chart.series[0].points.len(), 6);
}

/// ResultSet values serialize to tagged JSON the presentation layer can
/// dispatch on, and deserialize back unchanged.
#[test]
fn result_set_json_round_trip() {
    let e = engine();
    let results = vec![
        e.segments_result("country").unwrap(),
        e.cohort_ltv_result().unwrap(),
        e.revenue_structure_result("country").unwrap(),
    ];

    let json = serde_json::to_string(&results).unwrap();
    assert!(json.contains("\"shape\":\"table\""));
    assert!(json.contains("\"shape\":\"series\""));

    let back: Vec<ResultSet> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 3);
}

/// The contingency table renders as a counts table: one column per
/// column label, one row per row label, counts as numeric cells.
#[test]
fn contingency_table_shape() {
    let e = engine();
    let table = e.contingency_table("country", "country").unwrap();
    let rs = ResultSet::from_contingency(&table);
    let ResultSet::Table(table) = rs else {
        panic!("expected a table");
    };

    assert_eq!(table.columns, vec!["DE", "FR"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].label, "DE");
    // The diagonal holds one customer each; off-diagonal cells are zero.
    assert_eq!(table.rows[0].cells, vec![Some(1.0), Some(0.0)]);
    assert_eq!(table.rows[1].cells, vec![Some(0.0), Some(1.0)]);
}

/// The LTV factors table appends the Total row last.
#[test]
fn ltv_factors_table_has_total_row() {
    let rs = engine().ltv_factors_result("country").unwrap();
    let ResultSet::Table(table) = rs else {
        panic!("expected a table");
    };
    assert_eq!(table.rows.last().unwrap().label, "Total");
    assert_eq!(table.rows.len(), 3); // DE, FR, Total
}
