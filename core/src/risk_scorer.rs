//! Risk scorer: weighted delinquency score and tier cut.
//!
//! score = (missed_payments / 6)          * 0.30
//!       + credit_utilization             * 0.25
//!       + ((850 - credit_score) / 850)   * 0.25
//!       + debt_to_income_ratio           * 0.20
//!
//! RULES:
//!   - Weights are constants. They are not configuration.
//!   - Raw inputs are never clamped. Out-of-range values score as-is and
//!     are reported as warnings.
//!   - A missing input never defaults to 0. The row is rejected instead.
//!   - Rows are independent. Batch order and identity are preserved.

use crate::{
    error::RecordError,
    record::CustomerRecord,
    types::{CustomerId, RowIndex},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Constants ────────────────────────────────────────────────────────────────

pub const MISSED_PAYMENTS_WEIGHT: f64 = 0.30;
pub const UTILIZATION_WEIGHT: f64 = 0.25;
pub const CREDIT_SCORE_WEIGHT: f64 = 0.25;
pub const DTI_WEIGHT: f64 = 0.20;

/// Missed payments are scaled against a six-month window.
pub const MISSED_PAYMENTS_SCALE: f64 = 6.0;
pub const CREDIT_SCORE_MAX: f64 = 850.0;
pub const CREDIT_SCORE_MIN: f64 = 300.0;

/// Tier upper edges (inclusive). The lower edge of LOW is exclusive at 0.
pub const LOW_UPPER: f64 = 0.30;
pub const MEDIUM_UPPER: f64 = 0.70;
pub const HIGH_UPPER: f64 = 1.0;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Riskiest first, the order reports list them in.
    pub const REPORT_ORDER: [RiskTier; 3] = [RiskTier::High, RiskTier::Medium, RiskTier::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A raw input outside its conventional range. Scored anyway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutOfRangeWarning {
    pub index: RowIndex,
    pub customer_id: CustomerId,
    pub field: &'static str,
    pub value: f64,
}

impl fmt::Display for OutOfRangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} ({}): {} = {} is outside its conventional range",
            self.index, self.customer_id, self.field, self.value
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFailure {
    pub index: RowIndex,
    pub customer_id: CustomerId,
    pub error: RecordError,
}

/// A customer row with its two derived columns.
/// `None` means the derivation failed for this row; see `BatchOutcome::failures`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: CustomerRecord,
    pub risk_score: Option<f64>,
    pub risk_tier: Option<RiskTier>,
}

impl ScoredRecord {
    /// Drop the derived columns so the row can be scored again.
    pub fn into_record(self) -> CustomerRecord {
        self.record
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub records: Vec<ScoredRecord>,
    pub failures: Vec<RecordFailure>,
    pub warnings: Vec<OutOfRangeWarning>,
}

impl BatchOutcome {
    /// Rows that received both a score and a tier.
    pub fn fully_scored(&self) -> usize {
        self.records.iter().filter(|r| r.risk_tier.is_some()).count()
    }

    /// Fold failures found while loading into the failure list. Rows stay in
    /// order and, within a row, load failures come before scoring failures.
    pub fn with_load_failures(mut self, mut failures: Vec<RecordFailure>) -> BatchOutcome {
        if failures.is_empty() {
            return self;
        }
        failures.append(&mut self.failures);
        failures.sort_by_key(|f| f.index);
        self.failures = failures;
        self
    }

    /// Recompute the derived columns from scratch, overwriting the old ones.
    pub fn rescore(self) -> BatchOutcome {
        score_and_tier_batch(self.records.into_iter().map(ScoredRecord::into_record))
    }
}

// ── Operations ───────────────────────────────────────────────────────────────

fn required_real(value: Option<f64>, field: &'static str) -> Result<f64, RecordError> {
    value
        .filter(|v| !v.is_nan())
        .ok_or(RecordError::MissingField { field })
}

fn required_int(value: Option<i64>, field: &'static str) -> Result<f64, RecordError> {
    value
        .map(|v| v as f64)
        .ok_or(RecordError::MissingField { field })
}

/// Weighted risk score for one row.
///
/// Fields are checked in formula order, so the error names the first
/// missing one.
pub fn compute_risk_score(record: &CustomerRecord) -> Result<f64, RecordError> {
    let missed = required_int(record.missed_payments, "missed_payments")?;
    let utilization = required_real(record.credit_utilization, "credit_utilization")?;
    let credit = required_int(record.credit_score, "credit_score")?;
    let dti = required_real(record.debt_to_income_ratio, "debt_to_income_ratio")?;

    Ok((missed / MISSED_PAYMENTS_SCALE) * MISSED_PAYMENTS_WEIGHT
        + utilization * UTILIZATION_WEIGHT
        + ((CREDIT_SCORE_MAX - credit) / CREDIT_SCORE_MAX) * CREDIT_SCORE_WEIGHT
        + dti * DTI_WEIGHT)
}

/// Bin a score into (0, 0.30] LOW, (0.30, 0.70] MEDIUM, (0.70, 1.0] HIGH.
///
/// Zero, negatives, anything above 1.0 and NaN fall in no bin and are
/// returned as `UnclassifiedTier`.
pub fn assign_risk_tier(score: f64) -> Result<RiskTier, RecordError> {
    if score > 0.0 && score <= LOW_UPPER {
        Ok(RiskTier::Low)
    } else if score > LOW_UPPER && score <= MEDIUM_UPPER {
        Ok(RiskTier::Medium)
    } else if score > MEDIUM_UPPER && score <= HIGH_UPPER {
        Ok(RiskTier::High)
    } else {
        Err(RecordError::UnclassifiedTier { score })
    }
}

/// Raw inputs outside their conventional ranges. Missing fields are skipped.
pub fn check_ranges(index: RowIndex, record: &CustomerRecord) -> Vec<OutOfRangeWarning> {
    let mut out = Vec::new();
    let mut flag = |field: &'static str, value: f64| {
        out.push(OutOfRangeWarning {
            index,
            customer_id: record.customer_id.clone(),
            field,
            value,
        });
    };

    if let Some(m) = record.missed_payments {
        if m < 0 || m as f64 > MISSED_PAYMENTS_SCALE {
            flag("missed_payments", m as f64);
        }
    }
    if let Some(u) = record.credit_utilization.filter(|v| !v.is_nan()) {
        if !(0.0..=1.0).contains(&u) {
            flag("credit_utilization", u);
        }
    }
    if let Some(c) = record.credit_score {
        if !(CREDIT_SCORE_MIN..=CREDIT_SCORE_MAX).contains(&(c as f64)) {
            flag("credit_score", c as f64);
        }
    }
    if let Some(d) = record.debt_to_income_ratio.filter(|v| !v.is_nan()) {
        if !(0.0..=1.0).contains(&d) {
            flag("debt_to_income_ratio", d);
        }
    }
    out
}

/// Score and tier every row independently.
///
/// The outcome holds exactly one `ScoredRecord` per input row, in input
/// order. Row-level problems land in `failures`; the batch never aborts.
pub fn score_and_tier_batch<I>(records: I) -> BatchOutcome
where
    I: IntoIterator<Item = CustomerRecord>,
{
    let mut outcome = BatchOutcome::default();

    for (index, record) in records.into_iter().enumerate() {
        for w in check_ranges(index, &record) {
            debug!("{w}");
            outcome.warnings.push(w);
        }

        let (risk_score, risk_tier) = match compute_risk_score(&record) {
            Ok(score) => match assign_risk_tier(score) {
                Ok(tier) => (Some(score), Some(tier)),
                Err(error) => {
                    outcome.failures.push(RecordFailure {
                        index,
                        customer_id: record.customer_id.clone(),
                        error,
                    });
                    (Some(score), None)
                }
            },
            Err(error) => {
                outcome.failures.push(RecordFailure {
                    index,
                    customer_id: record.customer_id.clone(),
                    error,
                });
                (None, None)
            }
        };

        outcome.records.push(ScoredRecord {
            record,
            risk_score,
            risk_tier,
        });
    }

    if !outcome.warnings.is_empty() {
        warn!(
            "{} raw values outside conventional ranges (scored unclamped)",
            outcome.warnings.len()
        );
    }
    info!(
        "Risk score calculated for {} rows ({} fully scored, {} failures)",
        outcome.records.len(),
        outcome.fully_scored(),
        outcome.failures.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(missed: i64, util: f64, credit: i64, dti: f64) -> CustomerRecord {
        CustomerRecord::new("c-test").with_scoring_inputs(missed, util, credit, dti)
    }

    #[test]
    fn best_case_scores_zero() {
        let score = compute_risk_score(&record(0, 0.0, 850, 0.0)).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn worst_conventional_case_scores_high() {
        let score = compute_risk_score(&record(6, 1.0, 300, 1.0)).unwrap();
        let expected = 0.30 + 0.25 + (550.0 / 850.0) * 0.25 + 0.20;
        assert!((score - expected).abs() < 1e-12, "got {score}");
        assert!((score - 0.9118).abs() < 1e-4);
        assert_eq!(assign_risk_tier(score), Ok(RiskTier::High));
    }

    #[test]
    fn missed_payments_above_window_are_not_clamped() {
        let score = compute_risk_score(&record(10, 0.0, 850, 0.0)).unwrap();
        assert!((score - 0.50).abs() < 1e-12, "got {score}");
        assert_eq!(assign_risk_tier(score), Ok(RiskTier::Medium));
    }

    #[test]
    fn credit_score_above_ceiling_pulls_term_negative() {
        let score = compute_risk_score(&record(0, 0.0, 935, 0.0)).unwrap();
        assert!(score < 0.0);
        assert!(matches!(
            assign_risk_tier(score),
            Err(RecordError::UnclassifiedTier { .. })
        ));
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut r = record(1, 0.5, 700, 0.3);
        r.credit_score = None;
        r.debt_to_income_ratio = None;
        assert_eq!(
            compute_risk_score(&r),
            Err(RecordError::MissingField { field: "credit_score" })
        );
    }

    #[test]
    fn nan_utilization_counts_as_missing() {
        let mut r = record(1, 0.5, 700, 0.3);
        r.credit_utilization = Some(f64::NAN);
        assert_eq!(
            compute_risk_score(&r),
            Err(RecordError::MissingField { field: "credit_utilization" })
        );
    }

    #[test]
    fn tier_boundaries_are_right_inclusive() {
        assert_eq!(assign_risk_tier(0.30), Ok(RiskTier::Low));
        assert_eq!(assign_risk_tier(0.300001), Ok(RiskTier::Medium));
        assert_eq!(assign_risk_tier(0.70), Ok(RiskTier::Medium));
        assert_eq!(assign_risk_tier(0.700001), Ok(RiskTier::High));
        assert_eq!(assign_risk_tier(1.0), Ok(RiskTier::High));
        assert_eq!(assign_risk_tier(1e-9), Ok(RiskTier::Low));
    }

    #[test]
    fn scores_outside_bins_are_unclassified() {
        for score in [0.0, -0.1, 1.000001, 2.0, f64::NAN] {
            assert!(
                matches!(
                    assign_risk_tier(score),
                    Err(RecordError::UnclassifiedTier { .. })
                ),
                "score {score} should be unclassified"
            );
        }
    }

    #[test]
    fn tiers_are_monotonic_over_classified_scores() {
        let mut prev: Option<RiskTier> = None;
        for i in 1..=1000 {
            let score = i as f64 / 1000.0;
            let tier = assign_risk_tier(score).unwrap();
            if let Some(p) = prev {
                assert!(p <= tier, "tier dropped from {p} to {tier} at {score}");
            }
            prev = Some(tier);
        }
    }

    #[test]
    fn range_check_flags_each_offending_field() {
        let warnings = check_ranges(3, &record(7, 1.2, 250, -0.1));
        let fields: Vec<_> = warnings.iter().map(|w| w.field).collect();
        assert_eq!(
            fields,
            vec![
                "missed_payments",
                "credit_utilization",
                "credit_score",
                "debt_to_income_ratio"
            ]
        );
        assert!(warnings.iter().all(|w| w.index == 3));
    }

    #[test]
    fn range_check_is_quiet_for_conventional_values() {
        assert!(check_ranges(0, &record(6, 1.0, 300, 0.0)).is_empty());
        assert!(check_ranges(0, &record(0, 0.0, 850, 1.0)).is_empty());
    }
}
