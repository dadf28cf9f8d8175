//! Console rendering of pivots, test results, and the closing summary

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{ChiSquareTest, CohortSplit, FunnelPivot, GROUP_A, GROUP_B};

/// Format an optional rate as a percentage, or the explicit undefined
/// marker when the cohort was empty at this stage.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.2}%", rate * 100.0),
        None => "undefined".to_string(),
    }
}

/// Print the visitors-per-cohort split table.
pub fn print_cohort_split(split: &CohortSplit) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("ab_test_group").add_attribute(Attribute::Bold),
        Cell::new("Visitors").add_attribute(Attribute::Bold),
        Cell::new("Share").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec![
        Cell::new(GROUP_A),
        Cell::new(split.group_a),
        Cell::new(format_rate(split.share_a())),
    ]);
    table.add_row(vec![
        Cell::new(GROUP_B),
        Cell::new(split.group_b),
        Cell::new(format_rate(split.share_b())),
    ]);

    print_indented(&table);
}

/// Print one pivoted funnel stage.
pub fn print_pivot(pivot: &FunnelPivot) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("ab_test_group").add_attribute(Attribute::Bold),
        Cell::new(&pivot.positive_label).add_attribute(Attribute::Bold),
        Cell::new(&pivot.negative_label).add_attribute(Attribute::Bold),
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(&pivot.title).add_attribute(Attribute::Bold),
    ]);

    for row in &pivot.rows {
        let rate_cell = match row.rate() {
            Some(rate) => Cell::new(format!("{:.2}%", rate * 100.0)).fg(Color::Green),
            None => Cell::new("undefined").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&row.cohort),
            Cell::new(row.positive),
            Cell::new(row.negative),
            Cell::new(row.total()),
            rate_cell,
        ]);
    }

    print_indented(&table);
}

/// Print a chi-squared test result with its verdict.
pub fn print_chi_square(test: &ChiSquareTest, alpha: f64) {
    println!(
        "      {} chi² = {:.4}, df = {}, p = {:.6}",
        style("→").dim(),
        test.statistic,
        test.dof,
        test.p_value
    );
    println!(
        "      {} expected: [[{:.2}, {:.2}], [{:.2}, {:.2}]]",
        style("→").dim(),
        test.expected[0][0],
        test.expected[0][1],
        test.expected[1][0],
        test.expected[1][1]
    );

    if test.is_significant(alpha) {
        println!(
            "      {} {}",
            style("✓").green().bold(),
            style(format!("significant at α = {}", alpha)).green()
        );
    } else {
        println!(
            "      {} {}",
            style("•").dim(),
            style(format!("not significant at α = {}", alpha)).dim()
        );
    }
}

/// Note that a stage's significance test could not be run.
pub fn print_test_unavailable(reason: &str) {
    println!(
        "      {} {}",
        style("•").dim(),
        style(format!("significance test skipped: {}", reason)).dim()
    );
}

/// Per-stage outcome captured for the closing summary
#[derive(Debug)]
pub struct StageOutcome {
    pub title: String,
    pub rate_a: Option<f64>,
    pub rate_b: Option<f64>,
    /// None when the test was degenerate for this stage
    pub significant: Option<bool>,
}

/// Summary of the whole funnel analysis
#[derive(Debug)]
pub struct FunnelSummary {
    pub visits_analyzed: usize,
    pub split: CohortSplit,
    pub stages: Vec<StageOutcome>,
}

impl FunnelSummary {
    pub fn new(visits_analyzed: usize, split: CohortSplit) -> Self {
        Self {
            visits_analyzed,
            split,
            stages: Vec::new(),
        }
    }

    pub fn add_stage(
        &mut self,
        title: &str,
        pivot: &FunnelPivot,
        test: Option<&ChiSquareTest>,
        alpha: f64,
    ) {
        self.stages.push(StageOutcome {
            title: title.to_string(),
            rate_a: pivot.row(GROUP_A).and_then(|row| row.rate()),
            rate_b: pivot.row(GROUP_B).and_then(|row| row.rate()),
            significant: test.map(|test| test.is_significant(alpha)),
        });
    }

    pub fn display(&self, alpha: f64) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("FUNNEL SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();
        println!(
            "      Analyzed {} visit(s): {} in cohort A, {} in cohort B",
            style(self.visits_analyzed).yellow().bold(),
            style(self.split.group_a).yellow(),
            style(self.split.group_b).yellow()
        );
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Funnel stage").add_attribute(Attribute::Bold),
            Cell::new("Fitness Test (A)").add_attribute(Attribute::Bold),
            Cell::new("No Fitness Test (B)").add_attribute(Attribute::Bold),
            Cell::new(format!("Significant (α = {})", alpha)).add_attribute(Attribute::Bold),
        ]);

        for stage in &self.stages {
            let verdict = match stage.significant {
                Some(true) => Cell::new("yes").fg(Color::Green).add_attribute(Attribute::Bold),
                Some(false) => Cell::new("no"),
                None => Cell::new("—").fg(Color::Yellow),
            };
            table.add_row(vec![
                Cell::new(&stage.title),
                Cell::new(format_rate(stage.rate_a)),
                Cell::new(format_rate(stage.rate_b)),
                verdict,
            ]);
        }

        print_indented(&table);
    }
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}
