//! Funnel aggregation: cohort/stage counts pivoted into rates
//!
//! Each aggregation pass groups the labeled frame by (cohort, stage
//! label), counts the rows, and pivots the label into columns so the
//! per-cohort conversion rate falls out as `positive / total`. A cohort
//! with no rows at a stage has an undefined rate, never a silent zero.

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::labels::{AB_GROUP, APPLICATION, GROUP_A, GROUP_B, IS_APPLICATION};

/// Cohorts in display order
pub const COHORTS: [&str; 2] = [GROUP_A, GROUP_B];

/// Visitor counts per cohort
#[derive(Debug, Clone, Serialize)]
pub struct CohortSplit {
    pub group_a: u64,
    pub group_b: u64,
}

impl CohortSplit {
    pub fn total(&self) -> u64 {
        self.group_a + self.group_b
    }

    /// Share of all visitors in cohort A, if any visitors exist
    pub fn share_a(&self) -> Option<f64> {
        self.share_of(self.group_a)
    }

    /// Share of all visitors in cohort B, if any visitors exist
    pub fn share_b(&self) -> Option<f64> {
        self.share_of(self.group_b)
    }

    fn share_of(&self, count: u64) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            None
        } else {
            Some(count as f64 / total as f64)
        }
    }
}

/// One cohort's row of a pivoted funnel stage
#[derive(Debug, Clone, Serialize)]
pub struct PivotRow {
    pub cohort: String,
    pub positive: u64,
    pub negative: u64,
}

impl PivotRow {
    pub fn total(&self) -> u64 {
        self.positive + self.negative
    }

    /// Positive share of the cohort, or `None` when the cohort is empty
    /// at this stage (an undefined rate).
    pub fn rate(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            None
        } else {
            Some(self.positive as f64 / total as f64)
        }
    }
}

/// A pivoted funnel stage: one row per cohort with counts of the
/// stage's positive and negative labels
#[derive(Debug, Clone, Serialize)]
pub struct FunnelPivot {
    /// Header of the derived percentage column
    pub title: String,
    pub label_column: String,
    pub positive_label: String,
    pub negative_label: String,
    /// Rows in [`COHORTS`] order; both cohorts are always present
    pub rows: Vec<PivotRow>,
}

impl FunnelPivot {
    /// The pivot row for a cohort
    pub fn row(&self, cohort: &str) -> Option<&PivotRow> {
        self.rows.iter().find(|row| row.cohort == cohort)
    }

    /// Observed counts as a 2x2 contingency table (cohort x outcome),
    /// ready for the independence test.
    pub fn contingency(&self) -> [[u64; 2]; 2] {
        let mut table = [[0u64; 2]; 2];
        for (i, cohort) in COHORTS.iter().enumerate() {
            if let Some(row) = self.row(cohort) {
                table[i] = [row.positive, row.negative];
            }
        }
        table
    }
}

/// Count visitors per cohort.
pub fn cohort_split(df: &DataFrame) -> Result<CohortSplit> {
    let groups = df
        .column(AB_GROUP)
        .with_context(|| format!("Column '{}' not found; run labeling first", AB_GROUP))?
        .str()?;

    let mut group_a = 0u64;
    let mut group_b = 0u64;
    for value in groups.into_iter() {
        match value {
            Some(GROUP_A) => group_a += 1,
            Some(GROUP_B) => group_b += 1,
            other => bail!("unexpected cohort label: {:?}", other),
        }
    }

    Ok(CohortSplit { group_a, group_b })
}

/// Group by (cohort, label), count, and pivot the label into columns.
///
/// Both cohorts appear in the output even when empty, so downstream
/// reporting can state an undefined rate explicitly.
pub fn funnel_pivot(
    df: &DataFrame,
    title: &str,
    label_column: &str,
    positive_label: &str,
    negative_label: &str,
) -> Result<FunnelPivot> {
    let groups = df
        .column(AB_GROUP)
        .with_context(|| format!("Column '{}' not found; run labeling first", AB_GROUP))?
        .str()?;
    let labels = df
        .column(label_column)
        .with_context(|| format!("Label column '{}' not found", label_column))?
        .str()?;

    // counts[cohort][0] = positive, counts[cohort][1] = negative
    let mut counts = [[0u64; 2]; 2];
    for (group, label) in groups.into_iter().zip(labels.into_iter()) {
        let cohort = match group {
            Some(GROUP_A) => 0,
            Some(GROUP_B) => 1,
            other => bail!("unexpected cohort label: {:?}", other),
        };
        match label {
            Some(value) if value == positive_label => counts[cohort][0] += 1,
            Some(value) if value == negative_label => counts[cohort][1] += 1,
            other => bail!("unexpected '{}' label: {:?}", label_column, other),
        }
    }

    let rows = COHORTS
        .iter()
        .enumerate()
        .map(|(i, cohort)| PivotRow {
            cohort: cohort.to_string(),
            positive: counts[i][0],
            negative: counts[i][1],
        })
        .collect();

    Ok(FunnelPivot {
        title: title.to_string(),
        label_column: label_column.to_string(),
        positive_label: positive_label.to_string(),
        negative_label: negative_label.to_string(),
        rows,
    })
}

/// Restrict the labeled frame to visitors who filled out an application.
///
/// Returns a new frame containing exactly the rows labeled
/// `Application`.
pub fn applicants_only(df: &DataFrame) -> Result<DataFrame> {
    let flags: Vec<bool> = df
        .column(IS_APPLICATION)
        .with_context(|| format!("Column '{}' not found; run labeling first", IS_APPLICATION))?
        .str()?
        .into_iter()
        .map(|value| value == Some(APPLICATION))
        .collect();

    let mask = BooleanChunked::from_slice("applicants".into(), &flags);
    Ok(df.filter(&mask)?)
}
