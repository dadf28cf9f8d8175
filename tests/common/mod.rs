//! Shared test utilities and fixture builders

use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

/// A visitor for seeding fixtures: key fields plus which funnel stages
/// the person reached.
pub struct Person {
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub email: &'static str,
    pub gender: &'static str,
    pub visit_date: &'static str,
    pub fitness_test_date: Option<&'static str>,
    pub application_date: Option<&'static str>,
    pub purchase_date: Option<&'static str>,
}

/// A visitor in the window who reached no funnel stage
pub fn visitor(
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
) -> Person {
    Person {
        first_name,
        last_name,
        email,
        gender: "female",
        visit_date: "2017-07-05",
        fitness_test_date: None,
        application_date: None,
        purchase_date: None,
    }
}

/// Create a temporary SQLite database seeded with the four funnel tables.
pub fn create_test_database(people: &[Person]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("funnel.db");

    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE visits (first_name TEXT, last_name TEXT, gender TEXT, email TEXT, visit_date TEXT);
         CREATE TABLE fitness_tests (first_name TEXT, last_name TEXT, email TEXT, fitness_test_date TEXT);
         CREATE TABLE applications (first_name TEXT, last_name TEXT, email TEXT, application_date TEXT);
         CREATE TABLE purchases (first_name TEXT, last_name TEXT, email TEXT, purchase_date TEXT);",
    )
    .unwrap();

    for person in people {
        conn.execute(
            "INSERT INTO visits (first_name, last_name, gender, email, visit_date) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                person.first_name,
                person.last_name,
                person.gender,
                person.email,
                person.visit_date,
            ),
        )
        .unwrap();

        let stages = [
            ("fitness_tests", "fitness_test_date", person.fitness_test_date),
            ("applications", "application_date", person.application_date),
            ("purchases", "purchase_date", person.purchase_date),
        ];
        for (table, date_column, date) in stages {
            if let Some(date) = date {
                let sql = format!(
                    "INSERT INTO {} (first_name, last_name, email, {}) VALUES (?1, ?2, ?3, ?4)",
                    table, date_column
                );
                conn.execute(
                    &sql,
                    (person.first_name, person.last_name, person.email, date),
                )
                .unwrap();
            }
        }
    }

    (temp_dir, db_path)
}

/// Ten visitors in the window, five per cohort.
///
/// Cohort A: 3 applicants, 1 of whom purchased.
/// Cohort B: 4 applicants, 3 of whom purchased.
pub fn sample_people() -> Vec<Person> {
    let mut people = Vec::new();

    for (i, (first, last, email)) in [
        ("Ann", "Ash", "ann@x.com"),
        ("Ben", "Bell", "ben@x.com"),
        ("Cleo", "Cole", "cleo@x.com"),
        ("Dan", "Dale", "dan@x.com"),
        ("Eve", "Earl", "eve@x.com"),
    ]
    .into_iter()
    .enumerate()
    {
        let mut person = visitor(first, last, email);
        person.fitness_test_date = Some("2017-07-05");
        if i < 3 {
            person.application_date = Some("2017-07-06");
        }
        if i < 1 {
            person.purchase_date = Some("2017-07-08");
        }
        people.push(person);
    }

    for (i, (first, last, email)) in [
        ("Fay", "Finn", "fay@x.com"),
        ("Gus", "Gray", "gus@x.com"),
        ("Hal", "Hart", "hal@x.com"),
        ("Ida", "Ives", "ida@x.com"),
        ("Joy", "Jude", "joy@x.com"),
    ]
    .into_iter()
    .enumerate()
    {
        let mut person = visitor(first, last, email);
        if i < 4 {
            person.application_date = Some("2017-07-06");
        }
        if i < 3 {
            person.purchase_date = Some("2017-07-08");
        }
        people.push(person);
    }

    people
}
