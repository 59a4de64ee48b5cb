//! Chart data series derived from an insights report.
//!
//! Each chart is written as a standalone JSON document so any plotting
//! front end can render it. Nothing here draws pixels.

use crate::{
    analytics::{CorrelationMatrix, GroupStats, Histogram, InsightsReport},
    error::AnalysisResult,
    record::GroupKey,
    risk_scorer::{LOW_UPPER, MEDIUM_UPPER},
};
use log::info;
use serde::Serialize;
use std::{cmp::Ordering, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Threshold {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDistributionChart {
    pub tier_counts: Vec<Bar>,
    pub score_histogram: Histogram,
    pub thresholds: Vec<Threshold>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPanel {
    pub title: String,
    /// Ascending by value.
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicsChart {
    pub panels: Vec<BarPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedSeries {
    pub status: String,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPatternChart {
    pub months: Vec<String>,
    pub series: Vec<StackedSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub risk_distribution: RiskDistributionChart,
    pub feature_correlation: CorrelationMatrix,
    pub risk_by_demographics: DemographicsChart,
    pub payment_patterns: PaymentPatternChart,
}

fn ascending(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
    bars
}

fn group_bars(groups: &[GroupStats]) -> Vec<Bar> {
    ascending(
        groups
            .iter()
            .filter_map(|g| {
                g.mean_risk_score.map(|value| Bar {
                    label: g.group.clone(),
                    value,
                })
            })
            .collect(),
    )
}

fn panel_title(key: GroupKey) -> &'static str {
    match key {
        GroupKey::EmploymentStatus => "Average Risk Score by Employment Status",
        GroupKey::CreditCardType => "Average Risk Score by Credit Card Type",
        GroupKey::Location => "Average Risk Score by Location",
    }
}

impl ChartSet {
    pub fn from_report(report: &InsightsReport) -> Self {
        let tier_counts = report
            .tiers
            .tiers
            .iter()
            .map(|t| Bar {
                label: t.tier.label().to_string(),
                value: t.count as f64,
            })
            .collect();

        let mut panels = vec![BarPanel {
            title: "Average Risk Score by Income Level".into(),
            bars: ascending(
                report
                    .income_bins
                    .iter()
                    .filter_map(|b| {
                        b.mean_risk_score.map(|value| Bar {
                            label: b.label(),
                            value,
                        })
                    })
                    .collect(),
            ),
        }];
        panels.extend(report.group_impact.iter().map(|g| BarPanel {
            title: panel_title(g.key).into(),
            bars: group_bars(&g.groups),
        }));

        let patterns = &report.payment_patterns;
        let series = patterns
            .statuses
            .iter()
            .enumerate()
            .map(|(s, status)| StackedSeries {
                status: status.clone(),
                counts: patterns.counts.iter().map(|month| month[s]).collect(),
            })
            .collect();

        Self {
            risk_distribution: RiskDistributionChart {
                tier_counts,
                score_histogram: report.score_histogram.clone(),
                thresholds: vec![
                    Threshold { label: "Low/Medium Threshold".into(), value: LOW_UPPER },
                    Threshold { label: "Medium/High Threshold".into(), value: MEDIUM_UPPER },
                ],
            },
            feature_correlation: report.correlations.clone(),
            risk_by_demographics: DemographicsChart { panels },
            payment_patterns: PaymentPatternChart {
                months: patterns.months.clone(),
                series,
            },
        }
    }

    /// Write one pretty JSON file per chart into `dir`, creating it if needed.
    pub fn write_json(&self, dir: &Path) -> AnalysisResult<()> {
        std::fs::create_dir_all(dir)?;
        write_chart(dir, "risk_distribution", &self.risk_distribution)?;
        write_chart(dir, "feature_correlation", &self.feature_correlation)?;
        write_chart(dir, "risk_by_demographics", &self.risk_by_demographics)?;
        write_chart(dir, "payment_patterns", &self.payment_patterns)?;
        info!("Chart data written to {}", dir.display());
        Ok(())
    }
}

fn write_chart<T: Serialize>(dir: &Path, name: &str, chart: &T) -> AnalysisResult<()> {
    let path = dir.join(format!("{name}.json"));
    std::fs::write(&path, serde_json::to_string_pretty(chart)?)?;
    Ok(())
}
