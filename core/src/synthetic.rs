//! Synthetic customer population for demos and tests.
//!
//! Rows look like a retail card portfolio: most values sit in their
//! conventional ranges, a small share carry NULLs or out-of-range values
//! so the scorer's failure and warning paths get exercised.

use crate::{
    error::{AnalysisError, AnalysisResult},
    record::CustomerRecord,
    rng::PopulationRng,
    store::DelinquencyStore,
    types::PAYMENT_MONTHS,
};
use log::info;

const EMPLOYMENT: [(&str, f64); 4] = [
    ("Employed", 0.62),
    ("Self-employed", 0.18),
    ("Unemployed", 0.10),
    ("Retired", 0.10),
];
const CARD_TYPES: [&str; 5] = ["Standard", "Gold", "Platinum", "Business", "Student"];
const LOCATIONS: [&str; 5] = ["Chicago", "Houston", "Los Angeles", "New York", "Phoenix"];

const NULL_RATE: f64 = 0.02;
const OUT_OF_RANGE_RATE: f64 = 0.01;

/// Generate `n` customers deterministically from `seed`.
pub fn generate(n: usize, seed: u64) -> Vec<CustomerRecord> {
    let mut rng = PopulationRng::new(seed);
    (0..n).map(|i| generate_one(i, &mut rng)).collect()
}

fn generate_one(i: usize, rng: &mut PopulationRng) -> CustomerRecord {
    let employment_idx = rng.weighted_index(&EMPLOYMENT.map(|e| e.1));
    let employment = EMPLOYMENT[employment_idx].0;

    let age = rng.range_i64(21, 75);
    let income = match employment {
        "Unemployed" => rng.pareto(8_000.0, 2.8),
        "Retired" => rng.pareto(18_000.0, 2.6),
        _ => rng.pareto(28_000.0, 2.2),
    }
    .min(400_000.0)
    .round();

    let mut missed = [0, 0, 0, 1, 1, 2, 3, 4, 5, 6][rng.next_u64_below(10) as usize];
    // Payment history drags the other drivers along with it.
    let strain = missed as f64;
    let mut credit_score = rng
        .normal(720.0 - strain * 40.0, 60.0)
        .round()
        .clamp(300.0, 850.0) as i64;
    let mut utilization = (rng.next_f64().powf(1.4 - strain * 0.15) * 100.0).round() / 100.0;
    let dti = ((0.05 + rng.next_f64() * 0.65 + strain * 0.03) * 100.0).round() / 100.0;

    if rng.chance(OUT_OF_RANGE_RATE) {
        match rng.next_u64_below(3) {
            0 => missed = rng.range_i64(7, 10),
            1 => credit_score = rng.range_i64(851, 900),
            _ => utilization = 1.01 + (rng.next_f64() * 29.0).round() / 100.0,
        }
    }

    // Delinquency loosely follows the same drivers the score uses.
    let pressure = missed as f64 / 6.0 * 0.4
        + utilization.min(1.0) * 0.25
        + (850.0 - credit_score as f64) / 850.0 * 0.2
        + dti * 0.15;
    let delinquent = rng.chance((0.02 + pressure * 0.45).min(0.95));

    let mut months: [Option<String>; PAYMENT_MONTHS] = Default::default();
    let late_p = 0.05 + missed as f64 * 0.06;
    for slot in months.iter_mut() {
        let status = if rng.chance(late_p * 0.5) {
            "Missed"
        } else if rng.chance(late_p) {
            "Late"
        } else {
            "On-time"
        };
        *slot = Some(status.to_string());
    }

    let mut record = CustomerRecord {
        customer_id: format!("c-{i:06}"),
        age: Some(age),
        income: Some(income),
        credit_score: Some(credit_score),
        credit_utilization: Some(utilization),
        missed_payments: Some(missed),
        delinquent_account: Some(delinquent),
        debt_to_income_ratio: Some(dti),
        employment_status: Some(employment.to_string()),
        credit_card_type: Some(CARD_TYPES[rng.next_u64_below(5) as usize].to_string()),
        location: Some(LOCATIONS[rng.next_u64_below(5) as usize].to_string()),
        months,
    };

    if rng.chance(NULL_RATE) {
        match rng.next_u64_below(3) {
            0 => record.credit_utilization = None,
            1 => record.credit_score = None,
            _ => record.income = None,
        }
    }
    record
}

/// Generate and insert `n` customers. Returns the number inserted.
///
/// Ids restart at `c-000000` for every seed, so the target table must be empty.
pub fn populate(store: &mut DelinquencyStore, n: usize, seed: u64) -> AnalysisResult<usize> {
    let existing = store.customer_count()?;
    if existing > 0 {
        return Err(AnalysisError::TableNotEmpty {
            table: store.table().to_string(),
            rows: existing,
        });
    }
    let customers = generate(n, seed);
    store.insert_customers(&customers)?;
    info!("Inserted {n} synthetic customers (seed {seed}) into {}", store.table());
    Ok(customers.len())
}
