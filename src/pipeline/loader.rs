//! Source table loader: read-only SQLite queries into DataFrames
//!
//! The connection is opened read-only, so the loader can never mutate
//! the source and a missing database file is an immediate error rather
//! than a silently created empty one. Person-key fields are normalized
//! at ingest; everything downstream matches on the normalized form.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use rusqlite::{Connection, OpenFlags};

/// Accepted source date formats: ISO first, then the legacy M-D-YY(YY)
/// export forms.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m-%d-%Y", "%m-%d-%y"];

/// The four funnel tables as loaded from the source database
#[derive(Debug)]
pub struct SourceTables {
    pub visits: DataFrame,
    pub fitness_tests: DataFrame,
    pub applications: DataFrame,
    pub purchases: DataFrame,
}

impl SourceTables {
    /// Row counts in source order, for the load report
    pub fn row_counts(&self) -> [(&'static str, usize); 4] {
        [
            ("visits", self.visits.height()),
            ("fitness_tests", self.fitness_tests.height()),
            ("applications", self.applications.height()),
            ("purchases", self.purchases.height()),
        ]
    }
}

/// Open the database read-only and load all four tables.
pub fn load_source_tables(path: &Path) -> Result<SourceTables> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database: {}", path.display()))?;

    Ok(SourceTables {
        visits: read_visits(&conn)?,
        fitness_tests: read_person_dates(&conn, "fitness_tests", "fitness_test_date")?,
        applications: read_person_dates(&conn, "applications", "application_date")?,
        purchases: read_person_dates(&conn, "purchases", "purchase_date")?,
    })
}

/// Parse a source date string, trying each known format in order.
pub fn parse_source_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn read_visits(conn: &Connection) -> Result<DataFrame> {
    let mut stmt = conn
        .prepare("SELECT first_name, last_name, gender, email, visit_date FROM visits")
        .context("Failed to query visits")?;

    let mut first_names: Vec<Option<String>> = Vec::new();
    let mut last_names: Vec<Option<String>> = Vec::new();
    let mut genders: Vec<Option<String>> = Vec::new();
    let mut emails: Vec<Option<String>> = Vec::new();
    let mut visit_dates: Vec<Option<String>> = Vec::new();

    let mut rows = stmt.query([]).context("Failed to query visits")?;
    while let Some(row) = rows.next()? {
        first_names.push(normalize_name(row.get(0)?));
        last_names.push(normalize_name(row.get(1)?));
        genders.push(row.get(2)?);
        emails.push(normalize_email(row.get(3)?));
        visit_dates.push(row.get(4)?);
    }

    Ok(DataFrame::new(vec![
        Column::new("first_name".into(), first_names),
        Column::new("last_name".into(), last_names),
        Column::new("gender".into(), genders),
        Column::new("email".into(), emails),
        Column::new("visit_date".into(), visit_dates),
    ])?)
}

fn read_person_dates(conn: &Connection, table: &str, date_column: &str) -> Result<DataFrame> {
    let sql = format!(
        "SELECT first_name, last_name, email, {} FROM {}",
        date_column, table
    );
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("Failed to query {}", table))?;

    let mut first_names: Vec<Option<String>> = Vec::new();
    let mut last_names: Vec<Option<String>> = Vec::new();
    let mut emails: Vec<Option<String>> = Vec::new();
    let mut dates: Vec<Option<String>> = Vec::new();

    let mut rows = stmt
        .query([])
        .with_context(|| format!("Failed to query {}", table))?;
    while let Some(row) = rows.next()? {
        first_names.push(normalize_name(row.get(0)?));
        last_names.push(normalize_name(row.get(1)?));
        emails.push(normalize_email(row.get(2)?));
        dates.push(row.get(3)?);
    }

    Ok(DataFrame::new(vec![
        Column::new("first_name".into(), first_names),
        Column::new("last_name".into(), last_names),
        Column::new("email".into(), emails),
        Column::new(date_column.into(), dates),
    ])?)
}

/// Trim surrounding whitespace from a name key field.
fn normalize_name(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Emails are matched case-insensitively: trim and casefold.
fn normalize_email(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_lowercase())
}
