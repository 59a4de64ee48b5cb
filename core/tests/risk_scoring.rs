//! Batch scoring: row identity, partial failures, warnings, idempotence.

use delinquency_core::{
    error::RecordError,
    record::CustomerRecord,
    risk_scorer::{
        assign_risk_tier, compute_risk_score, score_and_tier_batch, RecordFailure, RiskTier,
    },
};

fn customer(id: &str, missed: i64, util: f64, credit: i64, dti: f64) -> CustomerRecord {
    CustomerRecord::new(id).with_scoring_inputs(missed, util, credit, dti)
}

/// Conventional inputs always land in [0, 1].
#[test]
fn conventional_inputs_score_within_unit_interval() {
    for missed in 0..=6 {
        for credit in (300..=850).step_by(50) {
            for util in [0.0, 0.25, 0.5, 0.75, 1.0] {
                for dti in [0.0, 0.3, 0.6, 1.0] {
                    let score = compute_risk_score(&customer("c", missed, util, credit, dti)).unwrap();
                    assert!(
                        (0.0..=1.0 + 1e-12).contains(&score),
                        "score {score} out of range for missed={missed} credit={credit} util={util} dti={dti}"
                    );
                }
            }
        }
    }
}

#[test]
fn zero_score_row_is_unclassified_but_keeps_its_score() {
    let outcome = score_and_tier_batch(vec![customer("c-zero", 0, 0.0, 850, 0.0)]);

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].risk_score, Some(0.0));
    assert_eq!(outcome.records[0].risk_tier, None);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].customer_id, "c-zero");
    assert_eq!(
        outcome.failures[0].error,
        RecordError::UnclassifiedTier { score: 0.0 }
    );
}

#[test]
fn worst_conventional_row_is_high() {
    let outcome = score_and_tier_batch(vec![customer("c-worst", 6, 1.0, 300, 1.0)]);
    let row = &outcome.records[0];

    let score = row.risk_score.unwrap();
    assert!((score - 0.9118).abs() < 1e-4, "got {score}");
    assert_eq!(row.risk_tier, Some(RiskTier::High));
    assert!(outcome.failures.is_empty());
    assert!(outcome.warnings.is_empty());
}

#[test]
fn excess_missed_payments_score_unclamped_and_warn() {
    let outcome = score_and_tier_batch(vec![customer("c-ten", 10, 0.0, 850, 0.0)]);
    let row = &outcome.records[0];

    assert!((row.risk_score.unwrap() - 0.50).abs() < 1e-12);
    assert_eq!(row.risk_tier, Some(RiskTier::Medium));
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].field, "missed_payments");
    assert_eq!(outcome.warnings[0].value, 10.0);
}

#[test]
fn score_above_one_is_unclassified() {
    let outcome = score_and_tier_batch(vec![customer("c-over", 12, 1.0, 300, 1.0)]);
    let row = &outcome.records[0];

    assert!(row.risk_score.unwrap() > 1.0);
    assert_eq!(row.risk_tier, None);
    assert!(matches!(
        outcome.failures[0].error,
        RecordError::UnclassifiedTier { .. }
    ));
}

/// Failures keep their position; other rows are unaffected.
#[test]
fn batch_preserves_order_and_isolates_failures() {
    let mut missing = customer("c-1", 2, 0.4, 700, 0.3);
    missing.debt_to_income_ratio = None;

    let input = vec![
        customer("c-0", 1, 0.2, 760, 0.1),
        missing,
        customer("c-2", 5, 0.9, 520, 0.6),
    ];
    let outcome = score_and_tier_batch(input.clone());

    let ids: Vec<_> = outcome
        .records
        .iter()
        .map(|r| r.record.customer_id.as_str())
        .collect();
    assert_eq!(ids, vec!["c-0", "c-1", "c-2"]);

    for (scored, original) in outcome.records.iter().zip(&input) {
        assert_eq!(&scored.record, original, "raw columns must pass through untouched");
    }

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, 1);
    assert_eq!(
        outcome.failures[0].error,
        RecordError::MissingField { field: "debt_to_income_ratio" }
    );
    assert_eq!(outcome.records[1].risk_score, None);
    assert_eq!(outcome.records[1].risk_tier, None);

    assert!(outcome.records[0].risk_tier.is_some());
    assert!(outcome.records[2].risk_tier.is_some());
    assert_eq!(outcome.fully_scored(), 2);
}

#[test]
fn rescoring_is_idempotent() {
    let input = vec![
        customer("c-0", 0, 0.1, 810, 0.05),
        customer("c-1", 3, 0.5, 640, 0.35),
        customer("c-2", 6, 0.95, 410, 0.7),
        customer("c-3", 0, 0.0, 850, 0.0),
        CustomerRecord::new("c-4"),
    ];

    let first = score_and_tier_batch(input);
    let snapshot = first.records.clone();
    let second = first.rescore();

    assert_eq!(second.records, snapshot);
    assert_eq!(second.failures.len(), 2);
}

#[test]
fn tier_agrees_with_score_for_every_scored_row() {
    let input: Vec<_> = (0..=6)
        .flat_map(|m| {
            (300..=850)
                .step_by(110)
                .map(move |c| customer(&format!("c-{m}-{c}"), m, 0.4, c, 0.25))
        })
        .collect();
    let outcome = score_and_tier_batch(input);

    for row in &outcome.records {
        let score = row.risk_score.unwrap();
        assert_eq!(row.risk_tier, assign_risk_tier(score).ok());
    }
}

#[test]
fn empty_batch_is_empty_outcome() {
    let outcome = score_and_tier_batch(Vec::<CustomerRecord>::new());
    assert!(outcome.records.is_empty());
    assert!(outcome.failures.is_empty());
    assert!(outcome.warnings.is_empty());
}

#[test]
fn load_failures_merge_in_row_order() {
    let mut blanked = customer("c-1", 1, 0.3, 700, 0.2);
    blanked.credit_utilization = None;
    let outcome = score_and_tier_batch(vec![
        customer("c-0", 0, 0.0, 850, 0.0),
        blanked,
        customer("c-2", 2, 0.5, 640, 0.3),
    ]);

    let unreadable = |index, customer_id: &str, field| RecordFailure {
        index,
        customer_id: customer_id.into(),
        error: RecordError::InvalidField { field, value: "N/A".into() },
    };
    let merged = outcome.with_load_failures(vec![
        unreadable(1, "c-1", "credit_utilization"),
        unreadable(2, "c-2", "employment_status"),
    ]);

    let order: Vec<_> = merged
        .failures
        .iter()
        .map(|f| (f.index, matches!(f.error, RecordError::InvalidField { .. })))
        .collect();
    assert_eq!(order, vec![(0, false), (1, true), (1, false), (2, true)]);
    assert_eq!(merged.records[2].risk_tier, Some(RiskTier::Medium));
}
