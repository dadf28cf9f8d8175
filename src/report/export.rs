//! JSON export of the complete analysis

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::pipeline::{ChiSquareTest, CohortSplit, FunnelPivot, MergeReport, PivotRow};

/// Metadata about the analysis run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the analysis (ISO 8601 format)
    pub timestamp: String,
    /// Abfunnel version
    pub version: String,
    /// Source database path
    pub database: String,
    /// Analysis window start
    pub window_start: String,
    /// Significance level used for verdicts
    pub alpha: f64,
}

/// One cohort row of a stage pivot with its derived columns
#[derive(Serialize)]
pub struct PivotRowExport {
    pub cohort: String,
    pub positive: u64,
    pub negative: u64,
    pub total: u64,
    /// `null` when the cohort was empty at this stage (undefined rate)
    pub rate: Option<f64>,
}

impl From<&PivotRow> for PivotRowExport {
    fn from(row: &PivotRow) -> Self {
        Self {
            cohort: row.cohort.clone(),
            positive: row.positive,
            negative: row.negative,
            total: row.total(),
            rate: row.rate(),
        }
    }
}

/// One funnel stage: pivot rows plus the significance outcome
#[derive(Serialize)]
pub struct StageExport {
    pub title: String,
    pub positive_label: String,
    pub negative_label: String,
    pub rows: Vec<PivotRowExport>,
    /// Absent when the contingency table was degenerate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<ChiSquareTest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significant: Option<bool>,
}

/// Complete analysis export
#[derive(Serialize)]
pub struct AnalysisExport {
    pub metadata: RunMetadata,
    pub merge: MergeReport,
    pub cohorts: CohortSplit,
    pub stages: Vec<StageExport>,
}

/// Parameters for the export metadata
pub struct ExportParams<'a> {
    pub database: &'a Path,
    pub window_start: NaiveDate,
    pub alpha: f64,
}

/// Export the analysis to a JSON file.
pub fn export_analysis(
    output_path: &Path,
    params: &ExportParams,
    merge: &MergeReport,
    split: &CohortSplit,
    stages: &[(&FunnelPivot, Option<&ChiSquareTest>)],
) -> Result<()> {
    let stages = stages
        .iter()
        .map(|&(pivot, test)| StageExport {
            title: pivot.title.clone(),
            positive_label: pivot.positive_label.clone(),
            negative_label: pivot.negative_label.clone(),
            rows: pivot.rows.iter().map(PivotRowExport::from).collect(),
            test: test.cloned(),
            significant: test.map(|test| test.is_significant(params.alpha)),
        })
        .collect();

    let export = AnalysisExport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: params.database.display().to_string(),
            window_start: params.window_start.to_string(),
            alpha: params.alpha,
        },
        merge: merge.clone(),
        cohorts: split.clone(),
        stages,
    };

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize analysis to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write analysis to {}", output_path.display()))?;

    Ok(())
}
