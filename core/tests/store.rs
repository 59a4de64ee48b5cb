//! Row source: migration, insert/load round trip, loosely typed tables.

use delinquency_core::{
    error::{AnalysisError, RecordError},
    record::CustomerRecord,
    risk_scorer::score_and_tier_batch,
    store::DelinquencyStore,
};
use rusqlite::{params, Connection};

fn temp_db(name: &str) -> String {
    let path = std::env::temp_dir().join(format!("delinquency_store_{name}_{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path.to_string_lossy().into_owned()
}

fn full_record(id: &str) -> CustomerRecord {
    let mut r = CustomerRecord::new(id).with_scoring_inputs(2, 0.45, 690, 0.32);
    r.age = Some(41);
    r.income = Some(58_000.0);
    r.delinquent_account = Some(true);
    r.employment_status = Some("Employed".into());
    r.credit_card_type = Some("Gold".into());
    r.location = Some("Houston".into());
    r.months = [
        Some("On-time".into()),
        Some("Late".into()),
        Some("On-time".into()),
        Some("Missed".into()),
        Some("On-time".into()),
        Some("On-time".into()),
    ];
    r
}

#[test]
fn rows_round_trip_in_insertion_order() {
    let store = DelinquencyStore::in_memory().unwrap();
    store.migrate().unwrap();

    let rows = vec![full_record("c-b"), full_record("c-a"), full_record("c-c")];
    for r in &rows {
        store.insert_customer(r).unwrap();
    }

    let loaded = store.load_customers().unwrap();
    assert_eq!(loaded, rows);
    assert_eq!(store.customer_count().unwrap(), 3);
}

#[test]
fn nulls_load_as_none() {
    let store = DelinquencyStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_customer(&CustomerRecord::new("c-empty")).unwrap();

    let loaded = store.load_customers().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], CustomerRecord::new("c-empty"));
}

#[test]
fn bulk_insert_into_custom_table() {
    let mut store = DelinquencyStore::in_memory()
        .unwrap()
        .with_table("staging_customers")
        .unwrap();
    store.migrate().unwrap();

    let rows: Vec<_> = (0..25).map(|i| full_record(&format!("c-{i:03}"))).collect();
    store.insert_customers(&rows).unwrap();

    assert_eq!(store.table(), "staging_customers");
    assert_eq!(store.customer_count().unwrap(), 25);
    assert_eq!(store.load_customers().unwrap(), rows);
}

#[test]
fn duplicate_customer_id_is_rejected() {
    let store = DelinquencyStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_customer(&full_record("c-dup")).unwrap();

    let err = store.insert_customer(&full_record("c-dup")).unwrap_err();
    assert!(matches!(err, AnalysisError::Database(_)), "got {err:?}");
}

#[test]
fn hostile_table_name_is_rejected() {
    let result = DelinquencyStore::in_memory()
        .unwrap()
        .with_table("customers; DROP TABLE customers");
    assert!(matches!(result, Err(AnalysisError::InvalidTableName { .. })));
}

#[test]
fn column_types_follow_table_order() {
    let store = DelinquencyStore::in_memory().unwrap();
    store.migrate().unwrap();

    let types = store.column_types().unwrap();
    assert_eq!(types.len(), 17);
    assert_eq!(types[0], ("customer_id".to_string(), "TEXT".to_string()));
    assert_eq!(types[2], ("income".to_string(), "REAL".to_string()));
    assert_eq!(types[16].0, "month_6");
}

/// Tables built by other tools often store ids as integers and
/// whole-number columns as REAL. Both load cleanly.
#[test]
fn loosely_typed_table_loads() {
    let path = temp_db("loose");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE delinquency_prediction (
                customer_id INTEGER, age REAL, income INTEGER, credit_score REAL,
                credit_utilization REAL, missed_payments REAL, delinquent_account REAL,
                debt_to_income_ratio REAL, employment_status TEXT, credit_card_type TEXT,
                location TEXT, month_1 TEXT, month_2 TEXT, month_3 TEXT,
                month_4 TEXT, month_5 TEXT, month_6 TEXT
            );",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO delinquency_prediction VALUES
                (?1, 35.0, 42000, 712.0, 0.3, 1.0, 0.0, 0.25, 'Employed', 'Standard',
                 'Phoenix', 'On-time', 'On-time', 'Late', NULL, 'On-time', 'On-time')",
            params![1001],
        )
        .unwrap();
    }

    let store = DelinquencyStore::open(&path).unwrap();
    let loaded = store.load_customers().unwrap();
    assert_eq!(loaded.len(), 1);

    let r = &loaded[0];
    assert_eq!(r.customer_id, "1001");
    assert_eq!(r.age, Some(35));
    assert_eq!(r.income, Some(42_000.0));
    assert_eq!(r.credit_score, Some(712));
    assert_eq!(r.missed_payments, Some(1));
    assert_eq!(r.delinquent_account, Some(false));
    assert_eq!(r.months[3], None);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn unreadable_cells_fail_their_row_only() {
    let path = temp_db("unreadable");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(include_str!("../../migrations/001_delinquency.sql"))
            .unwrap();
        conn.execute_batch(
            "INSERT INTO delinquency_prediction
                (customer_id, credit_score, credit_utilization, missed_payments, debt_to_income_ratio)
             VALUES
                ('c-good', 720, 0.30, 1, 0.20),
                ('c-na', 690, 'N/A', 2, 0.35),
                ('c-frac', 700.5, 0.40, 0, 0.10);",
        )
        .unwrap();
    }

    let store = DelinquencyStore::open(&path).unwrap();
    let loaded = store.load_rows().unwrap();

    let ids: Vec<_> = loaded.customers.iter().map(|c| c.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["c-good", "c-na", "c-frac"]);
    assert_eq!(loaded.customers[1].credit_utilization, None);
    assert_eq!(loaded.customers[1].credit_score, Some(690));
    assert_eq!(loaded.customers[2].credit_score, None);

    assert_eq!(loaded.failures.len(), 2);
    assert_eq!(loaded.failures[0].index, 1);
    assert_eq!(
        loaded.failures[0].error,
        RecordError::InvalidField { field: "credit_utilization", value: "N/A".into() }
    );
    assert_eq!(loaded.failures[1].customer_id, "c-frac");
    assert_eq!(
        loaded.failures[1].error,
        RecordError::InvalidField { field: "credit_score", value: "700.5".into() }
    );

    let outcome = score_and_tier_batch(loaded.customers).with_load_failures(loaded.failures);
    assert!(outcome.records[0].risk_tier.is_some(), "good row still scores");
    assert_eq!(outcome.records[1].risk_score, None);
    assert_eq!(outcome.records[2].risk_score, None);

    let per_row: Vec<_> = outcome.failures.iter().map(|f| (f.index, &f.error)).collect();
    assert_eq!(
        per_row,
        vec![
            (1, &RecordError::InvalidField { field: "credit_utilization", value: "N/A".into() }),
            (1, &RecordError::MissingField { field: "credit_utilization" }),
            (2, &RecordError::InvalidField { field: "credit_score", value: "700.5".into() }),
            (2, &RecordError::MissingField { field: "credit_score" }),
        ]
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn numeric_text_cells_parse() {
    let path = temp_db("numeric_text");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE delinquency_prediction (
                customer_id TEXT, age TEXT, income TEXT, credit_score TEXT,
                credit_utilization TEXT, missed_payments TEXT, delinquent_account TEXT,
                debt_to_income_ratio TEXT, employment_status TEXT, credit_card_type TEXT,
                location TEXT, month_1 TEXT, month_2 TEXT, month_3 TEXT,
                month_4 TEXT, month_5 TEXT, month_6 TEXT
            );
            INSERT INTO delinquency_prediction (customer_id, age, income, credit_score,
                credit_utilization, missed_payments, delinquent_account, debt_to_income_ratio)
            VALUES ('c-t', ' 44 ', '51000.5', '705', '0.25', '3', '1', 'NaN');",
        )
        .unwrap();
    }

    let loaded = DelinquencyStore::open(&path).unwrap().load_rows().unwrap();
    let r = &loaded.customers[0];
    assert_eq!(r.age, Some(44));
    assert_eq!(r.income, Some(51_000.5));
    assert_eq!(r.credit_score, Some(705));
    assert_eq!(r.credit_utilization, Some(0.25));
    assert_eq!(r.missed_payments, Some(3));
    assert_eq!(r.delinquent_account, Some(true));
    assert_eq!(r.debt_to_income_ratio, None, "NaN is not a usable ratio");
    assert_eq!(loaded.failures.len(), 1);

    let _ = std::fs::remove_file(&path);
}
