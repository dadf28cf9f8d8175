//! Composite-key left joins across the four source tables
//!
//! Person identity is the normalized (first_name, last_name, email)
//! triple; the source tables carry no surrogate key. Dependent tables
//! are deduplicated on that key before matching (first record wins), so
//! the joins can never fan out and every window visit maps to exactly
//! one merged row.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;

use super::loader::{parse_source_date, SourceTables};

/// Join key columns shared by all four tables
pub const KEY_COLUMNS: [&str; 3] = ["first_name", "last_name", "email"];

/// Counters describing what the merge kept and discarded
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// Visits on or after the window start
    pub visits_in_window: usize,
    /// Visits excluded by the window filter
    pub visits_before_window: usize,
    /// Visits whose date failed to parse (excluded from the window)
    pub visits_unparseable_date: usize,
    /// Duplicate person keys discarded per dependent table
    pub duplicate_fitness_tests: usize,
    pub duplicate_applications: usize,
    pub duplicate_purchases: usize,
}

impl MergeReport {
    pub fn duplicates_total(&self) -> usize {
        self.duplicate_fitness_tests + self.duplicate_applications + self.duplicate_purchases
    }
}

type PersonKey = (String, String, String);

/// Index a dependent table by person key, first record wins.
///
/// Rows with a null key field are skipped: a null can never match a
/// visit. Returns the index and the number of discarded duplicates.
fn index_by_person(
    df: &DataFrame,
    date_column: &str,
) -> Result<(HashMap<PersonKey, String>, usize)> {
    let first_names = df.column(KEY_COLUMNS[0])?.str()?;
    let last_names = df.column(KEY_COLUMNS[1])?.str()?;
    let emails = df.column(KEY_COLUMNS[2])?.str()?;
    let dates = df.column(date_column)?.str()?;

    let mut index: HashMap<PersonKey, String> = HashMap::with_capacity(df.height());
    let mut duplicates = 0usize;
    for i in 0..df.height() {
        let (Some(first), Some(last), Some(email)) =
            (first_names.get(i), last_names.get(i), emails.get(i))
        else {
            continue;
        };
        let Some(date) = dates.get(i) else { continue };

        let key = (first.to_string(), last.to_string(), email.to_string());
        if index.contains_key(&key) {
            duplicates += 1;
        } else {
            index.insert(key, date.to_string());
        }
    }

    Ok((index, duplicates))
}

/// Left-join visits restricted to the analysis window against the three
/// dependent tables.
///
/// Every window visit is preserved; a visit without a match in a
/// dependent table gets a null in that table's date column. The output
/// row count always equals the number of window visits.
pub fn merge_funnel_tables(
    tables: &SourceTables,
    since: NaiveDate,
) -> Result<(DataFrame, MergeReport)> {
    let mut report = MergeReport::default();

    let (fitness_tests, duplicates) =
        index_by_person(&tables.fitness_tests, "fitness_test_date")?;
    report.duplicate_fitness_tests = duplicates;
    let (applications, duplicates) =
        index_by_person(&tables.applications, "application_date")?;
    report.duplicate_applications = duplicates;
    let (purchases, duplicates) = index_by_person(&tables.purchases, "purchase_date")?;
    report.duplicate_purchases = duplicates;

    let visits = &tables.visits;
    let first_names = visits.column(KEY_COLUMNS[0])?.str()?;
    let last_names = visits.column(KEY_COLUMNS[1])?.str()?;
    let genders = visits.column("gender")?.str()?;
    let emails = visits.column(KEY_COLUMNS[2])?.str()?;
    let visit_dates = visits.column("visit_date")?.str()?;

    let mut out_first: Vec<Option<String>> = Vec::new();
    let mut out_last: Vec<Option<String>> = Vec::new();
    let mut out_gender: Vec<Option<String>> = Vec::new();
    let mut out_email: Vec<Option<String>> = Vec::new();
    let mut out_visit: Vec<Option<String>> = Vec::new();
    let mut out_fitness: Vec<Option<String>> = Vec::new();
    let mut out_application: Vec<Option<String>> = Vec::new();
    let mut out_purchase: Vec<Option<String>> = Vec::new();

    for i in 0..visits.height() {
        match visit_dates.get(i).and_then(parse_source_date) {
            None => {
                report.visits_unparseable_date += 1;
                continue;
            }
            Some(date) if date < since => {
                report.visits_before_window += 1;
                continue;
            }
            Some(_) => {}
        }
        report.visits_in_window += 1;

        let key = match (first_names.get(i), last_names.get(i), emails.get(i)) {
            (Some(first), Some(last), Some(email)) => {
                Some((first.to_string(), last.to_string(), email.to_string()))
            }
            // A visit with a null key field matches nothing but is kept.
            _ => None,
        };

        out_first.push(first_names.get(i).map(str::to_string));
        out_last.push(last_names.get(i).map(str::to_string));
        out_gender.push(genders.get(i).map(str::to_string));
        out_email.push(emails.get(i).map(str::to_string));
        out_visit.push(visit_dates.get(i).map(str::to_string));
        out_fitness.push(key.as_ref().and_then(|k| fitness_tests.get(k).cloned()));
        out_application.push(key.as_ref().and_then(|k| applications.get(k).cloned()));
        out_purchase.push(key.as_ref().and_then(|k| purchases.get(k).cloned()));
    }

    let merged = DataFrame::new(vec![
        Column::new("first_name".into(), out_first),
        Column::new("last_name".into(), out_last),
        Column::new("gender".into(), out_gender),
        Column::new("email".into(), out_email),
        Column::new("visit_date".into(), out_visit),
        Column::new("fitness_test_date".into(), out_fitness),
        Column::new("application_date".into(), out_application),
        Column::new("purchase_date".into(), out_purchase),
    ])?;

    Ok((merged, report))
}
