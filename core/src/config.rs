use crate::types::{DEFAULT_TABLE, PAYMENT_MONTHS};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// One right-inclusive income bracket. `upper: None` is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeBracket {
    pub label: String,
    pub upper: Option<f64>,
}

/// Analysis settings. Passed explicitly to every consumer; nothing global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Source table holding one row per customer.
    pub table: String,
    /// Equal-width bins for the risk score histogram.
    pub histogram_bins: usize,
    /// Equal-width bins for the income vs. risk chart.
    pub income_bins: usize,
    /// Brackets for the income impact table. Lower edge of the first is 0 (exclusive).
    pub income_brackets: Vec<IncomeBracket>,
    /// Axis labels for month_1..month_6.
    pub payment_months: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.into(),
            histogram_bins: 30,
            income_bins: 5,
            income_brackets: vec![
                IncomeBracket { label: "<30K".into(),     upper: Some(30_000.0) },
                IncomeBracket { label: "30K-80K".into(),  upper: Some(80_000.0) },
                IncomeBracket { label: "80K-150K".into(), upper: Some(150_000.0) },
                IncomeBracket { label: ">150K".into(),    upper: None },
            ],
            payment_months: (1..=PAYMENT_MONTHS).map(|i| format!("Month {i}")).collect(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing keys fall back to the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {path}"))?;
        let config: AnalysisConfig = serde_json::from_str(&content)
            .with_context(|| format!("Cannot parse {path}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.histogram_bins == 0 {
            bail!("histogram_bins must be at least 1");
        }
        if self.income_bins == 0 {
            bail!("income_bins must be at least 1");
        }
        if self.income_brackets.is_empty() {
            bail!("income_brackets must not be empty");
        }
        if self.payment_months.len() != PAYMENT_MONTHS {
            bail!(
                "payment_months needs {PAYMENT_MONTHS} labels, got {}",
                self.payment_months.len()
            );
        }

        let mut prev = 0.0;
        let last = self.income_brackets.len() - 1;
        for (i, b) in self.income_brackets.iter().enumerate() {
            match b.upper {
                Some(upper) if upper > prev => prev = upper,
                Some(upper) => bail!(
                    "income bracket '{}' upper edge {upper} must exceed {prev}",
                    b.label
                ),
                None if i == last => {}
                None => bail!("only the last income bracket may be open-ended"),
            }
        }
        Ok(())
    }
}
