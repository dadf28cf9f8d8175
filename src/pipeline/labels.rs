//! Presence-derived categorical labels
//!
//! Every derived column in the funnel follows the same rule: a date field
//! is present for the positive branch and null for the negative one. The
//! mapping itself is one reusable pure function, applied three times.

use anyhow::{Context, Result};
use polars::prelude::*;

/// Column holding the A/B cohort assignment
pub const AB_GROUP: &str = "ab_test_group";
/// Cohort that was given a fitness test on their first visit
pub const GROUP_A: &str = "A";
/// Cohort that was not given a fitness test
pub const GROUP_B: &str = "B";

/// Column marking visitors who filled out an application
pub const IS_APPLICATION: &str = "is_application";
pub const APPLICATION: &str = "Application";
pub const NO_APPLICATION: &str = "No Application";

/// Column marking visitors who purchased a membership
pub const IS_MEMBER: &str = "is_member";
pub const MEMBER: &str = "Member";
pub const NOT_MEMBER: &str = "Not Member";

/// Map presence of a value to one of two labels.
///
/// Total on any input: a null is simply the absent branch, never an
/// error.
pub fn presence_label(
    value: Option<&str>,
    present: &'static str,
    absent: &'static str,
) -> &'static str {
    if value.is_some() {
        present
    } else {
        absent
    }
}

/// Build a categorical column from the nulls of a source column.
fn label_column(
    df: &DataFrame,
    source: &str,
    name: &str,
    present: &'static str,
    absent: &'static str,
) -> Result<Column> {
    let values: Vec<&str> = df
        .column(source)
        .with_context(|| format!("Source column '{}' not found", source))?
        .str()?
        .into_iter()
        .map(|value| presence_label(value, present, absent))
        .collect();

    Ok(Column::new(name.into(), values))
}

/// Append the three derived funnel columns to the merged frame.
///
/// Returns a new frame; the input frame is left untouched. Every row is
/// assigned exactly one of `A`/`B`, one of `Application`/`No Application`
/// and one of `Member`/`Not Member`.
pub fn label_visits(df: &DataFrame) -> Result<DataFrame> {
    let labels = [
        label_column(df, "fitness_test_date", AB_GROUP, GROUP_A, GROUP_B)?,
        label_column(df, "application_date", IS_APPLICATION, APPLICATION, NO_APPLICATION)?,
        label_column(df, "purchase_date", IS_MEMBER, MEMBER, NOT_MEMBER)?,
    ];

    Ok(df.hstack(&labels)?)
}
