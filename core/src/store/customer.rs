use super::DelinquencyStore;
use crate::{
    error::{AnalysisResult, RecordError},
    record::CustomerRecord,
    risk_scorer::RecordFailure,
    types::PAYMENT_MONTHS,
};
use log::{debug, info};
use rusqlite::{params, types::Value, Row, Statement};

/// Table columns in load and insert order.
const FIELDS: [&str; 17] = [
    "customer_id",
    "age",
    "income",
    "credit_score",
    "credit_utilization",
    "missed_payments",
    "delinquent_account",
    "debt_to_income_ratio",
    "employment_status",
    "credit_card_type",
    "location",
    "month_1",
    "month_2",
    "month_3",
    "month_4",
    "month_5",
    "month_6",
];

const FIRST_MONTH: usize = 11;

/// Loaded rows plus the cells that could not be read.
/// An unreadable cell loads as `None`; its row is still returned.
#[derive(Debug, Clone, Default)]
pub struct LoadedRows {
    pub customers: Vec<CustomerRecord>,
    pub failures: Vec<RecordFailure>,
}

impl DelinquencyStore {
    // ── Customer rows ─────────────────────────────────────────────

    fn insert_sql(&self) -> String {
        let placeholders: Vec<String> = (1..=FIELDS.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            FIELDS.join(", "),
            placeholders.join(", ")
        )
    }

    pub fn insert_customer(&self, c: &CustomerRecord) -> AnalysisResult<()> {
        let mut stmt = self.conn.prepare(&self.insert_sql())?;
        insert_row(&mut stmt, c)?;
        Ok(())
    }

    /// Insert many rows in one transaction.
    pub fn insert_customers(&mut self, customers: &[CustomerRecord]) -> AnalysisResult<()> {
        let sql = self.insert_sql();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for c in customers {
                insert_row(&mut stmt, c)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load every row in insertion (rowid) order.
    ///
    /// A cell that does not convert to its column's type is a failure for
    /// that row only: the cell loads as `None` and the row keeps its place.
    pub fn load_rows(&self) -> AnalysisResult<LoadedRows> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid ASC",
            FIELDS.join(", "),
            self.table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let mut cells = CellReader::new(row);
            let mut months: [Option<String>; PAYMENT_MONTHS] = Default::default();
            for (i, slot) in months.iter_mut().enumerate() {
                *slot = cells.text(FIRST_MONTH + i)?;
            }
            let record = CustomerRecord {
                customer_id: cells.id(0)?,
                age: cells.int(1)?,
                income: cells.real(2)?,
                credit_score: cells.int(3)?,
                credit_utilization: cells.real(4)?,
                missed_payments: cells.int(5)?,
                delinquent_account: cells.int(6)?.map(|v| v != 0),
                debt_to_income_ratio: cells.real(7)?,
                employment_status: cells.text(8)?,
                credit_card_type: cells.text(9)?,
                location: cells.text(10)?,
                months,
            };
            Ok((record, cells.invalid))
        })?;

        let mut loaded = LoadedRows::default();
        for (index, row) in rows.enumerate() {
            let (record, invalid) = row?;
            for (field, value) in invalid {
                let failure = RecordFailure {
                    index,
                    customer_id: record.customer_id.clone(),
                    error: RecordError::InvalidField { field, value },
                };
                debug!("row {index} ({}): {}", failure.customer_id, failure.error);
                loaded.failures.push(failure);
            }
            loaded.customers.push(record);
        }
        info!(
            "Data loaded: {} rows from {} ({} unreadable cells)",
            loaded.customers.len(),
            self.table,
            loaded.failures.len()
        );
        Ok(loaded)
    }

    /// Load every row, dropping the unreadable-cell report after logging it.
    pub fn load_customers(&self) -> AnalysisResult<Vec<CustomerRecord>> {
        Ok(self.load_rows()?.customers)
    }

    pub fn customer_count(&self) -> AnalysisResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

fn insert_row(stmt: &mut Statement<'_>, c: &CustomerRecord) -> rusqlite::Result<usize> {
    stmt.execute(params![
        &c.customer_id,
        c.age,
        c.income,
        c.credit_score,
        c.credit_utilization,
        c.missed_payments,
        c.delinquent_account.map(i64::from),
        c.debt_to_income_ratio,
        &c.employment_status,
        &c.credit_card_type,
        &c.location,
        &c.months[0],
        &c.months[1],
        &c.months[2],
        &c.months[3],
        &c.months[4],
        &c.months[5],
    ])
}

// Source tables are not always typed the way our migration types them,
// so the reader accepts any storage class that converts losslessly and
// records everything else against the row.

struct CellReader<'a, 'stmt> {
    row: &'a Row<'stmt>,
    invalid: Vec<(&'static str, String)>,
}

impl<'a, 'stmt> CellReader<'a, 'stmt> {
    fn new(row: &'a Row<'stmt>) -> Self {
        Self {
            row,
            invalid: Vec::new(),
        }
    }

    fn reject<T>(&mut self, idx: usize, value: &Value) -> Option<T> {
        self.invalid.push((FIELDS[idx], raw(value)));
        None
    }

    fn id(&mut self, idx: usize) -> rusqlite::Result<String> {
        let value = self.row.get::<_, Value>(idx)?;
        Ok(match value {
            Value::Text(s) => s,
            Value::Integer(i) => i.to_string(),
            other => {
                self.reject::<()>(idx, &other);
                String::new()
            }
        })
    }

    fn text(&mut self, idx: usize) -> rusqlite::Result<Option<String>> {
        let value = self.row.get::<_, Value>(idx)?;
        Ok(match value {
            Value::Text(s) => Some(s),
            Value::Integer(i) => Some(i.to_string()),
            Value::Null => None,
            other => self.reject(idx, &other),
        })
    }

    fn real(&mut self, idx: usize) -> rusqlite::Result<Option<f64>> {
        let value = self.row.get::<_, Value>(idx)?;
        let parsed = match &value {
            Value::Null => return Ok(None),
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Blob(_) => None,
        };
        Ok(match parsed.filter(|f| f.is_finite()) {
            Some(f) => Some(f),
            None => self.reject(idx, &value),
        })
    }

    fn int(&mut self, idx: usize) -> rusqlite::Result<Option<i64>> {
        let value = self.row.get::<_, Value>(idx)?;
        let parsed = match &value {
            Value::Null => return Ok(None),
            Value::Integer(i) => Some(*i),
            Value::Real(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            Value::Real(_) | Value::Blob(_) => None,
        };
        Ok(match parsed {
            Some(i) => Some(i),
            None => self.reject(idx, &value),
        })
    }
}

fn raw(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} byte blob>", b.len()),
    }
}
