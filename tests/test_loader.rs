//! Integration tests for the source table loader

use abfunnel::pipeline::load_source_tables;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_loads_all_four_tables() {
    let (_temp_dir, db_path) = create_test_database(&sample_people());

    let tables = load_source_tables(&db_path).unwrap();

    assert_eq!(tables.visits.height(), 10);
    assert_eq!(tables.fitness_tests.height(), 5);
    assert_eq!(tables.applications.height(), 7);
    assert_eq!(tables.purchases.height(), 4);
}

#[test]
fn test_row_counts_report_source_order() {
    let (_temp_dir, db_path) = create_test_database(&sample_people());

    let tables = load_source_tables(&db_path).unwrap();
    let counts = tables.row_counts();

    assert_eq!(counts[0], ("visits", 10));
    assert_eq!(counts[1], ("fitness_tests", 5));
    assert_eq!(counts[2], ("applications", 7));
    assert_eq!(counts[3], ("purchases", 4));
}

#[test]
fn test_missing_database_is_an_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.db");

    let result = load_source_tables(&missing);

    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("Failed to open database"));
}

#[test]
fn test_missing_table_is_an_error() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir.path().join("partial.db");
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE visits (first_name TEXT, last_name TEXT, gender TEXT, email TEXT, visit_date TEXT);",
    )
    .unwrap();
    drop(conn);

    let result = load_source_tables(&db_path);

    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("fitness_tests"));
}

#[test]
fn test_key_fields_are_normalized_at_ingest() {
    let mut person = visitor("Ann", "Ash", "ann@x.com");
    person.email = " Ann@X.COM ";
    person.first_name = " Ann ";
    let (_temp_dir, db_path) = create_test_database(&[person]);

    let tables = load_source_tables(&db_path).unwrap();

    let emails = tables.visits.column("email").unwrap().str().unwrap();
    assert_eq!(emails.get(0), Some("ann@x.com"));
    let first_names = tables.visits.column("first_name").unwrap().str().unwrap();
    assert_eq!(first_names.get(0), Some("Ann"));
}

#[test]
fn test_dates_are_kept_as_source_text() {
    let mut person = visitor("Ann", "Ash", "ann@x.com");
    person.visit_date = "7-5-17";
    person.fitness_test_date = Some("2017-07-05");
    let (_temp_dir, db_path) = create_test_database(&[person]);

    let tables = load_source_tables(&db_path).unwrap();

    let visit_dates = tables.visits.column("visit_date").unwrap().str().unwrap();
    assert_eq!(visit_dates.get(0), Some("7-5-17"));
    let fitness_dates = tables
        .fitness_tests
        .column("fitness_test_date")
        .unwrap()
        .str()
        .unwrap();
    assert_eq!(fitness_dates.get(0), Some("2017-07-05"));
}
