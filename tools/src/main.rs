//! ltv-runner: headless demo harness for the LTV analytics engine.
//!
//! Generates a seed-deterministic synthetic retail dataset, runs every
//! analysis the engine offers, and prints a textual report.
//!
//! Usage:
//!   ltv-runner --seed 12345 --customers 500 --months 9
//!   ltv-runner --seed 12345 --json

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use ltv_core::{
    AnalysisConfig, AnalyticsEngine, CustomerRecord, RecordStore, TransactionRecord,
};
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::env;

const COUNTRIES: &[&str] = &["DE", "FR", "NL", "PL", "UK"];
const CHANNELS: &[&str] = &["web", "mobile_app", "store"];
const AGE_GROUPS: &[&str] = &["18-25", "26-35", "36-50", "51+"];

/// Deterministic RNG for dataset generation. All randomness flows from
/// the single --seed value; no platform RNG anywhere.
struct DataRng {
    inner: rand_pcg::Pcg64Mcg,
}

impl DataRng {
    fn new(seed: u64) -> Self {
        Self {
            inner: rand_pcg::Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    fn below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[self.below(options.len() as u64) as usize]
    }

    /// Simplified Pareto draw for purchase amounts.
    fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }
}

fn generate_dataset(
    seed: u64,
    customer_count: usize,
    acquisition_months: u32,
) -> (Vec<CustomerRecord>, Vec<TransactionRecord>) {
    let mut rng = DataRng::new(seed);
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");

    let mut customers = Vec::with_capacity(customer_count);
    let mut transactions = Vec::new();
    let mut txn_counter = 0u64;

    for i in 0..customer_count {
        let customer_id = format!("C{i:05}");
        let country = rng.pick(COUNTRIES);

        let mut attributes = BTreeMap::new();
        attributes.insert("customer_country".to_string(), country.to_string());
        attributes.insert("channel".to_string(), rng.pick(CHANNELS).to_string());
        // A slice of customers has no recorded age group, exercising the
        // explicit "unknown" bucket downstream.
        if !rng.chance(0.05) {
            attributes.insert("age_group".to_string(), rng.pick(AGE_GROUPS).to_string());
        }
        customers.push(CustomerRecord {
            customer_id: customer_id.clone(),
            attributes,
        });

        // A small share of customers never purchase; they must be absent
        // from LTV output entirely.
        if rng.chance(0.03) {
            continue;
        }

        let first_day = rng.below(u64::from(acquisition_months) * 30) as i64;
        let first = base.and_hms_opt(12, 0, 0).expect("valid time") + Duration::days(first_day);

        // Richer markets spend more and return more often.
        let spend_scale = match country {
            "DE" | "UK" => 1.4,
            "FR" | "NL" => 1.1,
            _ => 0.8,
        };

        let mut push_txn =
            |counter: &mut u64, ts, amount| {
                *counter += 1;
                transactions.push(TransactionRecord {
                    txn_id: format!("T{counter:07}"),
                    customer_id: customer_id.clone(),
                    timestamp: ts,
                    amount,
                    store_id: Some(format!("S{:02}", *counter % 7)),
                    product_id: Some(format!("P{:03}", *counter % 40)),
                    employee_id: None,
                });
            };

        push_txn(
            &mut txn_counter,
            first,
            rng.pareto(15.0, 2.2) * spend_scale,
        );

        let mut repeat_p = 0.55 * spend_scale.min(1.2);
        let mut day = first_day;
        while rng.chance(repeat_p) {
            day += 5 + rng.below(60) as i64;
            if day - first_day >= 200 {
                break;
            }
            let ts = base.and_hms_opt(12, 0, 0).expect("valid time") + Duration::days(day);
            push_txn(&mut txn_counter, ts, rng.pareto(12.0, 2.5) * spend_scale);
            repeat_p *= 0.85;
        }
    }

    (customers, transactions)
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let customer_count = parse_arg(&args, "--customers", 500usize);
    let months = parse_arg(&args, "--months", 9u32);
    let json = args.iter().any(|a| a == "--json");

    if !json {
        println!("ltv-runner");
        println!("  seed:      {seed}");
        println!("  customers: {customer_count}");
        println!("  months:    {months}");
        println!();
    }

    let (customers, transactions) = generate_dataset(seed, customer_count, months);
    log::info!(
        "generated {} customers, {} transactions",
        customers.len(),
        transactions.len()
    );
    let store = RecordStore::build(customers, transactions)?;
    let engine = AnalyticsEngine::new(store, AnalysisConfig::default());

    if json {
        print_json_report(&engine)?;
    } else {
        print_report(&engine)?;
    }
    Ok(())
}

fn print_report(engine: &AnalyticsEngine) -> Result<()> {
    println!("=== COHORT LTV (avg cumulative, M0..M5) ===");
    for cohort in engine.cohorts()? {
        let curve: Vec<String> = cohort
            .avg_cumulative_ltv
            .iter()
            .map(|v| format!("{v:>8.2}"))
            .collect();
        let flag = if cohort.low_confidence { " (low confidence)" } else { "" };
        println!(
            "  {} | n={:<4} | {}{flag}",
            cohort.month,
            cohort.member_count,
            curve.join(" ")
        );
    }

    println!();
    println!("=== SEGMENT LTV by customer_country ===");
    for s in engine.segments("customer_country")? {
        let sd = s
            .std_dev
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<10} | n={:<4} | mean={:>8.2} | sd={:>8} | share={:>5.1}%",
            s.label,
            s.count,
            s.mean_ltv,
            sd,
            s.revenue_share * 100.0
        );
    }

    println!();
    println!("=== REVENUE STRUCTURE by channel ===");
    for r in engine.revenue_structure("channel")? {
        println!(
            "  {:<12} | revenue {:>5.1}% | customers {:>5.1}%",
            r.label,
            r.revenue_share * 100.0,
            r.customer_share * 100.0
        );
    }

    println!();
    println!("=== STATISTICAL TESTS ===");
    match engine.chi_square("customer_country", "channel") {
        Ok(t) => print_test(&t),
        Err(e) => println!("  chi-square: {e}"),
    }
    match engine.t_test_by_dimension("customer_country", "DE", "PL") {
        Ok(t) => print_test(&t),
        Err(e) => println!("  t-test: {e}"),
    }
    Ok(())
}

fn print_test(t: &ltv_core::stats::TestResult) {
    let verdict = if t.significant {
        "SIGNIFICANT"
    } else {
        "not significant"
    };
    println!(
        "  {} | stat={:.4} df={:.2} p={:.4} alpha={} -> {verdict}",
        t.description, t.statistic, t.degrees_of_freedom, t.p_value, t.alpha
    );
}

fn print_json_report(engine: &AnalyticsEngine) -> Result<()> {
    let mut results = vec![
        engine.cohort_ltv_result()?,
        engine.cohort_retention_result()?,
        engine.segments_result("customer_country")?,
        engine.ltv_factors_result("channel")?,
        engine.revenue_structure_result("channel")?,
    ];
    if let Ok(t) = engine.chi_square("customer_country", "channel") {
        // Observed counts next to the verdict, like the statistical panel.
        let table = engine.contingency_table("customer_country", "channel")?;
        results.push(ltv_core::ResultSet::from_contingency(&table));
        results.push(ltv_core::ResultSet::from_test(t));
    }
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
