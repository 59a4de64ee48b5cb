//! Portfolio analytics, the consumer of scored rows.
//!
//! This module:
//!   1. Summarizes the raw table (shape, declared types, missing values, describe)
//!   2. Reports portfolio health and the tier distribution
//!   3. Profiles HIGH-tier customers
//!   4. Groups risk and delinquency by employment, card type, location, income
//!   5. Correlates the raw features, the label and the score
//!   6. Counts payment statuses per month and bins the score distribution
//!
//! Reads `risk_score` and `risk_tier` only. It never recomputes either.

use crate::{
    config::AnalysisConfig,
    error::{AnalysisError, AnalysisResult},
    record::{CustomerRecord, GroupKey, NumericColumn},
    risk_scorer::{RiskTier, ScoredRecord},
    stats::{mean, pct, pearson, quantile_sorted, sample_std},
    types::PAYMENT_MONTHS,
};
use log::debug;
use serde::Serialize;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

/// Group label for rows whose group-by key is NULL.
pub const UNKNOWN_GROUP: &str = "Unknown";

const SCORE_COLUMN: &str = "risk_score";

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingSummary {
    pub column: String,
    pub missing: usize,
    pub missing_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataOverview {
    pub rows: usize,
    pub columns: usize,
    pub column_types: Vec<(String, String)>,
    pub missing: Vec<MissingSummary>,
    pub numeric: Vec<NumericSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioHealth {
    pub total_customers: usize,
    pub delinquent_count: usize,
    pub delinquency_rate_pct: f64,
    pub mean_risk_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierShare {
    pub tier: RiskTier,
    pub count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierDistribution {
    /// HIGH, MEDIUM, LOW in that order.
    pub tiers: Vec<TierShare>,
    pub unclassified: usize,
}

impl TierDistribution {
    pub fn count(&self, tier: RiskTier) -> usize {
        self.tiers
            .iter()
            .find(|t| t.tier == tier)
            .map(|t| t.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighRiskProfile {
    pub customers: usize,
    pub mean_income: Option<f64>,
    pub mean_credit_score: Option<f64>,
    pub mean_credit_utilization: Option<f64>,
    pub mean_missed_payments: Option<f64>,
    pub mean_debt_to_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: String,
    pub mean_risk_score: Option<f64>,
    pub delinquent_count: usize,
    pub total_customers: usize,
    pub delinquency_rate_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupImpact {
    pub key: GroupKey,
    /// Sorted by mean risk score, riskiest first.
    pub groups: Vec<GroupStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeBin {
    pub lower: f64,
    pub upper: f64,
    pub customers: usize,
    pub mean_risk_score: Option<f64>,
}

impl IncomeBin {
    pub fn label(&self) -> String {
        format!("({:.1}, {:.1}]", self.lower, self.upper)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDriver {
    pub feature: String,
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPatterns {
    pub months: Vec<String>,
    pub statuses: Vec<String>,
    /// `counts[month][status]`, zero where a status never occurs that month.
    pub counts: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsReport {
    pub portfolio: PortfolioHealth,
    pub tiers: TierDistribution,
    pub high_risk: Option<HighRiskProfile>,
    pub group_impact: Vec<GroupImpact>,
    pub income_brackets: Vec<GroupStats>,
    pub income_bins: Vec<IncomeBin>,
    pub correlations: CorrelationMatrix,
    pub risk_drivers: Vec<RiskDriver>,
    pub payment_patterns: PaymentPatterns,
    pub score_histogram: Histogram,
}

// ── Overview ─────────────────────────────────────────────────────────────────

/// Shape, types, missing values and describe-style summaries of the raw table.
pub fn overview(records: &[CustomerRecord], column_types: Vec<(String, String)>) -> DataOverview {
    let rows = records.len();
    let mut missing = Vec::new();
    let mut push_missing = |column: &str, n: usize| {
        if n > 0 {
            missing.push(MissingSummary {
                column: column.to_string(),
                missing: n,
                missing_pct: pct(n, rows).unwrap_or(0.0),
            });
        }
    };

    for col in NumericColumn::ALL {
        let n = records.iter().filter(|r| r.numeric(col).is_none()).count();
        push_missing(col.name(), n);
    }
    for key in GroupKey::ALL {
        let n = records.iter().filter(|r| r.category(key).is_none()).count();
        push_missing(key.name(), n);
    }
    for m in 0..PAYMENT_MONTHS {
        let n = records.iter().filter(|r| r.months[m].is_none()).count();
        push_missing(&format!("month_{}", m + 1), n);
    }

    let numeric = NumericColumn::ALL
        .iter()
        .map(|&col| {
            let values: Vec<f64> = records.iter().filter_map(|r| r.numeric(col)).collect();
            describe(col.name(), values)
        })
        .collect();

    let columns = if column_types.is_empty() {
        1 + NumericColumn::ALL.len() + GroupKey::ALL.len() + PAYMENT_MONTHS
    } else {
        column_types.len()
    };

    DataOverview {
        rows,
        columns,
        column_types,
        missing,
        numeric,
    }
}

fn describe(column: &str, mut values: Vec<f64>) -> NumericSummary {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    NumericSummary {
        column: column.to_string(),
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        p25: quantile_sorted(&values, 0.25),
        p50: quantile_sorted(&values, 0.50),
        p75: quantile_sorted(&values, 0.75),
        max: values.last().copied(),
    }
}

// ── Insights ─────────────────────────────────────────────────────────────────

/// Build every aggregate the report and charts need.
pub fn analyze(records: &[ScoredRecord], config: &AnalysisConfig) -> AnalysisResult<InsightsReport> {
    if records.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }
    debug!("Analyzing {} scored rows", records.len());

    let rows: Vec<&ScoredRecord> = records.iter().collect();

    Ok(InsightsReport {
        portfolio: portfolio_health(&rows),
        tiers: tier_distribution(&rows),
        high_risk: high_risk_profile(&rows),
        group_impact: GroupKey::ALL
            .iter()
            .map(|&key| group_impact(&rows, key))
            .collect(),
        income_brackets: income_brackets(&rows, config),
        income_bins: income_bins(&rows, config.income_bins),
        correlations: correlation_matrix(&rows),
        risk_drivers: risk_drivers(&rows),
        payment_patterns: payment_patterns(&rows, config),
        score_histogram: score_histogram(&rows, config.histogram_bins),
    })
}

fn score_of(r: &ScoredRecord) -> Option<f64> {
    r.risk_score.filter(|s| s.is_finite())
}

fn is_delinquent(r: &ScoredRecord) -> bool {
    r.record.delinquent_account == Some(true)
}

fn mean_score(rows: &[&ScoredRecord]) -> Option<f64> {
    let scores: Vec<f64> = rows.iter().filter_map(|r| score_of(r)).collect();
    mean(&scores)
}

fn mean_of(rows: &[&ScoredRecord], col: NumericColumn) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.record.numeric(col)).collect();
    mean(&values)
}

fn portfolio_health(rows: &[&ScoredRecord]) -> PortfolioHealth {
    let total_customers = rows.len();
    let delinquent_count = rows.iter().filter(|r| is_delinquent(r)).count();
    PortfolioHealth {
        total_customers,
        delinquent_count,
        delinquency_rate_pct: pct(delinquent_count, total_customers).unwrap_or(0.0),
        mean_risk_score: mean_score(rows),
    }
}

fn tier_distribution(rows: &[&ScoredRecord]) -> TierDistribution {
    let total = rows.len();
    let tiers = RiskTier::REPORT_ORDER
        .iter()
        .map(|&tier| {
            let count = rows.iter().filter(|r| r.risk_tier == Some(tier)).count();
            TierShare {
                tier,
                count,
                pct: pct(count, total).unwrap_or(0.0),
            }
        })
        .collect();
    TierDistribution {
        tiers,
        unclassified: rows.iter().filter(|r| r.risk_tier.is_none()).count(),
    }
}

fn high_risk_profile(rows: &[&ScoredRecord]) -> Option<HighRiskProfile> {
    let high: Vec<&ScoredRecord> = rows
        .iter()
        .copied()
        .filter(|r| r.risk_tier == Some(RiskTier::High))
        .collect();
    if high.is_empty() {
        return None;
    }
    Some(HighRiskProfile {
        customers: high.len(),
        mean_income: mean_of(&high, NumericColumn::Income),
        mean_credit_score: mean_of(&high, NumericColumn::CreditScore),
        mean_credit_utilization: mean_of(&high, NumericColumn::CreditUtilization),
        mean_missed_payments: mean_of(&high, NumericColumn::MissedPayments),
        mean_debt_to_income: mean_of(&high, NumericColumn::DebtToIncomeRatio),
    })
}

fn group_stats(group: String, rows: &[&ScoredRecord]) -> GroupStats {
    let delinquent_count = rows.iter().filter(|r| is_delinquent(r)).count();
    GroupStats {
        group,
        mean_risk_score: mean_score(rows),
        delinquent_count,
        total_customers: rows.len(),
        delinquency_rate_pct: pct(delinquent_count, rows.len()),
    }
}

/// Riskiest first; groups without any score go last.
fn by_mean_risk_desc(a: &GroupStats, b: &GroupStats) -> Ordering {
    b.mean_risk_score
        .partial_cmp(&a.mean_risk_score)
        .unwrap_or(Ordering::Equal)
}

fn group_impact(rows: &[&ScoredRecord], key: GroupKey) -> GroupImpact {
    let mut buckets: BTreeMap<String, Vec<&ScoredRecord>> = BTreeMap::new();
    for &r in rows {
        let label = r.record.category(key).unwrap_or(UNKNOWN_GROUP).to_string();
        buckets.entry(label).or_default().push(r);
    }

    let mut groups: Vec<GroupStats> = buckets
        .into_iter()
        .map(|(label, members)| group_stats(label, &members))
        .collect();
    groups.sort_by(by_mean_risk_desc);

    GroupImpact { key, groups }
}

/// Right-inclusive brackets; the first lower edge (0) is exclusive.
fn income_brackets(rows: &[&ScoredRecord], config: &AnalysisConfig) -> Vec<GroupStats> {
    let mut members: Vec<Vec<&ScoredRecord>> = vec![Vec::new(); config.income_brackets.len()];
    for &r in rows {
        let Some(income) = r.record.numeric(NumericColumn::Income) else {
            continue;
        };
        if income <= 0.0 {
            continue;
        }
        let slot = config
            .income_brackets
            .iter()
            .position(|b| b.upper.map_or(true, |upper| income <= upper));
        if let Some(i) = slot {
            members[i].push(r);
        }
    }

    config
        .income_brackets
        .iter()
        .zip(members)
        .map(|(b, m)| group_stats(b.label.clone(), &m))
        .collect()
}

/// `n` equal-width right-inclusive bins over observed income, first edge
/// widened by 0.1 % of the range so the minimum lands in bin 0.
fn income_bins(rows: &[&ScoredRecord], n: usize) -> Vec<IncomeBin> {
    let incomes: Vec<(f64, &ScoredRecord)> = rows
        .iter()
        .filter_map(|r| r.record.numeric(NumericColumn::Income).map(|i| (i, *r)))
        .filter(|(i, _)| i.is_finite())
        .collect();
    if incomes.is_empty() || n == 0 {
        return Vec::new();
    }

    let mut lo = incomes.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let mut hi = incomes.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        let pad = if lo == 0.0 { 0.001 } else { lo.abs() * 0.001 };
        lo -= pad;
        hi += pad;
    }
    let width = (hi - lo) / n as f64;
    let mut edges: Vec<f64> = (0..=n).map(|i| lo + width * i as f64).collect();
    edges[n] = hi;
    edges[0] -= (hi - lo) * 0.001;

    let mut members: Vec<Vec<&ScoredRecord>> = vec![Vec::new(); n];
    for (income, r) in incomes {
        let slot = (0..n)
            .find(|&i| income <= edges[i + 1])
            .unwrap_or(n - 1);
        members[slot].push(r);
    }

    members
        .into_iter()
        .enumerate()
        .filter(|(_, m)| !m.is_empty())
        .map(|(i, m)| IncomeBin {
            lower: edges[i],
            upper: edges[i + 1],
            customers: m.len(),
            mean_risk_score: mean_score(&m),
        })
        .collect()
}

/// Column value for correlation purposes, `risk_score` included.
fn correlation_value(r: &ScoredRecord, column: Option<NumericColumn>) -> Option<f64> {
    match column {
        Some(col) => r.record.numeric(col),
        None => score_of(r),
    }
}

fn correlate(rows: &[&ScoredRecord], a: Option<NumericColumn>, b: Option<NumericColumn>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((correlation_value(r, a)?, correlation_value(r, b)?)))
        .collect();
    pearson(&pairs)
}

fn correlation_matrix(rows: &[&ScoredRecord]) -> CorrelationMatrix {
    let cols: Vec<Option<NumericColumn>> = NumericColumn::ALL
        .iter()
        .copied()
        .map(Some)
        .chain(std::iter::once(None))
        .collect();

    let values = cols
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            cols.iter()
                .enumerate()
                .map(|(j, &b)| {
                    let c = correlate(rows, a, b);
                    if i == j {
                        c.map(|_| 1.0)
                    } else {
                        c
                    }
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        columns: cols
            .iter()
            .map(|c| c.map_or(SCORE_COLUMN, |c| c.name()).to_string())
            .collect(),
        values,
    }
}

fn risk_drivers(rows: &[&ScoredRecord]) -> Vec<RiskDriver> {
    let mut drivers: Vec<RiskDriver> = [
        NumericColumn::MissedPayments,
        NumericColumn::CreditUtilization,
        NumericColumn::CreditScore,
        NumericColumn::DebtToIncomeRatio,
    ]
    .iter()
    .map(|&col| RiskDriver {
        feature: col.name().to_string(),
        correlation: correlate(rows, Some(col), Some(NumericColumn::DelinquentAccount)),
    })
    .collect();
    drivers.sort_by(|a, b| b.correlation.partial_cmp(&a.correlation).unwrap_or(Ordering::Equal));
    drivers
}

fn payment_patterns(rows: &[&ScoredRecord], config: &AnalysisConfig) -> PaymentPatterns {
    let statuses: Vec<String> = rows
        .iter()
        .flat_map(|r| r.record.months.iter().flatten().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let counts = (0..PAYMENT_MONTHS)
        .map(|m| {
            statuses
                .iter()
                .map(|s| {
                    rows.iter()
                        .filter(|r| r.record.months[m].as_deref() == Some(s.as_str()))
                        .count()
                })
                .collect()
        })
        .collect();

    PaymentPatterns {
        months: config.payment_months.clone(),
        statuses,
        counts,
    }
}

/// Equal-width bins over the observed score range, last bin closed.
fn score_histogram(rows: &[&ScoredRecord], bins: usize) -> Histogram {
    let scores: Vec<f64> = rows.iter().filter_map(|r| score_of(r)).collect();
    let bins = bins.max(1);

    let (mut lo, mut hi) = if scores.is_empty() {
        (0.0, 1.0)
    } else {
        (
            scores.iter().copied().fold(f64::INFINITY, f64::min),
            scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    edges[bins] = hi;

    let mut counts = vec![0usize; bins];
    for s in scores {
        let slot = (((s - lo) / width).floor() as usize).min(bins - 1);
        counts[slot] += 1;
    }

    Histogram { edges, counts }
}
