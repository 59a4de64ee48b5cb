//! Customer rows as loaded from the source table.
//!
//! Every raw column except the id is nullable in the source, so each one is an
//! `Option`. Nothing here validates ranges; that is the scorer's concern.

use crate::types::{CustomerId, PAYMENT_MONTHS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub age: Option<i64>,
    pub income: Option<f64>,
    pub credit_score: Option<i64>,
    pub credit_utilization: Option<f64>,
    pub missed_payments: Option<i64>,
    pub delinquent_account: Option<bool>,
    pub debt_to_income_ratio: Option<f64>,
    pub employment_status: Option<String>,
    pub credit_card_type: Option<String>,
    pub location: Option<String>,
    /// Payment status per month, index 0 is `month_1` (most recent).
    pub months: [Option<String>; PAYMENT_MONTHS],
}

impl CustomerRecord {
    pub fn new(customer_id: impl Into<CustomerId>) -> Self {
        Self {
            customer_id: customer_id.into(),
            ..Self::default()
        }
    }

    /// Set the four raw inputs of the risk formula.
    pub fn with_scoring_inputs(
        mut self,
        missed_payments: i64,
        credit_utilization: f64,
        credit_score: i64,
        debt_to_income_ratio: f64,
    ) -> Self {
        self.missed_payments = Some(missed_payments);
        self.credit_utilization = Some(credit_utilization);
        self.credit_score = Some(credit_score);
        self.debt_to_income_ratio = Some(debt_to_income_ratio);
        self
    }

    pub fn delinquent_flag(&self) -> Option<f64> {
        self.delinquent_account.map(|d| if d { 1.0 } else { 0.0 })
    }

    /// Value of a numeric column by its table name, NaN treated as missing.
    pub fn numeric(&self, column: NumericColumn) -> Option<f64> {
        let v = match column {
            NumericColumn::Age => self.age.map(|v| v as f64),
            NumericColumn::Income => self.income,
            NumericColumn::CreditScore => self.credit_score.map(|v| v as f64),
            NumericColumn::CreditUtilization => self.credit_utilization,
            NumericColumn::MissedPayments => self.missed_payments.map(|v| v as f64),
            NumericColumn::DebtToIncomeRatio => self.debt_to_income_ratio,
            NumericColumn::DelinquentAccount => self.delinquent_flag(),
        };
        v.filter(|x| !x.is_nan())
    }

    pub fn category(&self, key: GroupKey) -> Option<&str> {
        match key {
            GroupKey::EmploymentStatus => self.employment_status.as_deref(),
            GroupKey::CreditCardType => self.credit_card_type.as_deref(),
            GroupKey::Location => self.location.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumn {
    Age,
    Income,
    CreditScore,
    CreditUtilization,
    MissedPayments,
    DebtToIncomeRatio,
    DelinquentAccount,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 7] = [
        NumericColumn::Age,
        NumericColumn::Income,
        NumericColumn::CreditScore,
        NumericColumn::CreditUtilization,
        NumericColumn::MissedPayments,
        NumericColumn::DebtToIncomeRatio,
        NumericColumn::DelinquentAccount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Income => "income",
            Self::CreditScore => "credit_score",
            Self::CreditUtilization => "credit_utilization",
            Self::MissedPayments => "missed_payments",
            Self::DebtToIncomeRatio => "debt_to_income_ratio",
            Self::DelinquentAccount => "delinquent_account",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    EmploymentStatus,
    CreditCardType,
    Location,
}

impl GroupKey {
    pub const ALL: [GroupKey; 3] = [
        GroupKey::EmploymentStatus,
        GroupKey::CreditCardType,
        GroupKey::Location,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::EmploymentStatus => "employment_status",
            Self::CreditCardType => "credit_card_type",
            Self::Location => "location",
        }
    }
}
