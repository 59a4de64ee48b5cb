//! Plain-text rendering of the overview and the insights report.

use crate::{
    analytics::{DataOverview, GroupStats, InsightsReport},
    record::GroupKey,
};
use std::fmt::Write;

const BANNER_WIDTH: usize = 60;
const RULE_WIDTH: usize = 40;

fn banner(out: &mut String, title: &str) {
    let line = "=".repeat(BANNER_WIDTH);
    let _ = writeln!(out, "\n{line}\n{title}\n{line}");
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}\n{}", "-".repeat(RULE_WIDTH));
}

/// 1234567 -> "1,234,567".
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Whole-currency amount with separators, e.g. "$52,340".
pub fn money(v: f64) -> String {
    let rounded = v.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", thousands(rounded.abs() as u64))
}

fn opt(v: Option<f64>, f: impl Fn(f64) -> String) -> String {
    v.map(f).unwrap_or_else(|| "n/a".to_string())
}

pub fn render_overview(o: &DataOverview) -> String {
    let mut out = String::new();
    banner(&mut out, "DATA OVERVIEW");

    let _ = writeln!(out, "\nDataset Shape: ({}, {})", o.rows, o.columns);

    if !o.column_types.is_empty() {
        let _ = writeln!(out, "\nColumn Data Types:");
        for (name, ty) in &o.column_types {
            let _ = writeln!(out, "  {name:<24} {ty}");
        }
    }

    let _ = writeln!(out, "\nMissing Values:");
    if o.missing.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for m in &o.missing {
        let _ = writeln!(
            out,
            "  {:<24} {:>8} {:>8.2}%",
            m.column, m.missing, m.missing_pct
        );
    }

    let _ = writeln!(out, "\nBasic Statistics:");
    let _ = writeln!(
        out,
        "  {:<22} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    let cell = |v: Option<f64>| opt(v, |x| format!("{x:.3}"));
    for s in &o.numeric {
        let _ = writeln!(
            out,
            "  {:<22} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            s.column,
            s.count,
            cell(s.mean),
            cell(s.std),
            cell(s.min),
            cell(s.p25),
            cell(s.p50),
            cell(s.p75),
            cell(s.max),
        );
    }
    out
}

fn group_table(out: &mut String, groups: &[GroupStats]) {
    let _ = writeln!(
        out,
        "  {:<20} {:>15} {:>17} {:>16} {:>19}",
        "", "Avg Risk Score", "Delinquent Count", "Total Customers", "Delinquency Rate %"
    );
    for g in groups {
        let _ = writeln!(
            out,
            "  {:<20} {:>15} {:>17} {:>16} {:>19}",
            g.group,
            opt(g.mean_risk_score, |x| format!("{x:.3}")),
            g.delinquent_count,
            g.total_customers,
            opt(g.delinquency_rate_pct, |x| format!("{x:.2}")),
        );
    }
}

pub fn render_insights(r: &InsightsReport) -> String {
    let mut out = String::new();
    banner(&mut out, "KEY INSIGHTS REPORT");

    section(&mut out, "1. OVERALL PORTFOLIO HEALTH");
    let p = &r.portfolio;
    let _ = writeln!(out, "Total Customers: {}", thousands(p.total_customers as u64));
    let _ = writeln!(out, "Delinquent Accounts: {}", thousands(p.delinquent_count as u64));
    let _ = writeln!(out, "Delinquency Rate: {:.2}%", p.delinquency_rate_pct);
    let _ = writeln!(
        out,
        "Average Risk Score: {}",
        opt(p.mean_risk_score, |x| format!("{x:.3}"))
    );

    section(&mut out, "2. RISK TIER DISTRIBUTION");
    for t in &r.tiers.tiers {
        let _ = writeln!(
            out,
            "{}: {} customers ({:.1}%)",
            t.tier,
            thousands(t.count as u64),
            t.pct
        );
    }
    if r.tiers.unclassified > 0 {
        let _ = writeln!(
            out,
            "UNCLASSIFIED: {} customers",
            thousands(r.tiers.unclassified as u64)
        );
    }

    section(&mut out, "3. HIGH-RISK CUSTOMER PROFILE");
    match &r.high_risk {
        Some(h) => {
            let _ = writeln!(out, "Average Income: {}", opt(h.mean_income, money));
            let _ = writeln!(
                out,
                "Average Credit Score: {}",
                opt(h.mean_credit_score, |x| format!("{x:.0}"))
            );
            let _ = writeln!(
                out,
                "Average Credit Utilization: {}",
                opt(h.mean_credit_utilization, |x| format!("{:.2}%", x * 100.0))
            );
            let _ = writeln!(
                out,
                "Average Missed Payments: {}",
                opt(h.mean_missed_payments, |x| format!("{x:.1}"))
            );
            let _ = writeln!(
                out,
                "Average DTI Ratio: {}",
                opt(h.mean_debt_to_income, |x| format!("{:.2}%", x * 100.0))
            );
        }
        None => {
            let _ = writeln!(out, "(no HIGH-tier customers)");
        }
    }

    section(&mut out, "4. EMPLOYMENT STATUS IMPACT");
    if let Some(emp) = r
        .group_impact
        .iter()
        .find(|g| g.key == GroupKey::EmploymentStatus)
    {
        group_table(&mut out, &emp.groups);
    }

    section(&mut out, "5. INCOME LEVEL IMPACT");
    group_table(&mut out, &r.income_brackets);

    section(&mut out, "6. TOP RISK DRIVERS (Correlation with Delinquency)");
    for d in &r.risk_drivers {
        let _ = writeln!(
            out,
            "  {:<24} {:>9}",
            d.feature,
            opt(d.correlation, |x| format!("{x:.6}"))
        );
    }

    let _ = writeln!(out, "\n{}", "=".repeat(BANNER_WIDTH));
    out
}
