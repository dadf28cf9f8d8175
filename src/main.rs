//! Abfunnel: A/B Funnel Analysis CLI
//!
//! Merges the four funnel tables of an A/B test on the composite person
//! key, computes conversion rates per cohort at each funnel stage, and
//! tests the cohort differences for significance.

mod cli;
mod pipeline;
mod report;
mod utils;

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use cli::Cli;
use pipeline::{
    applicants_only, chi_square_2x2, cohort_split, funnel_pivot, label_visits,
    load_source_tables, merge_funnel_tables, APPLICATION, IS_APPLICATION, IS_MEMBER, MEMBER,
    NOT_MEMBER, NO_APPLICATION,
};
use report::{
    export_analysis, print_chi_square, print_cohort_split, print_pivot, print_test_unavailable,
    render_all, ExportParams, FunnelSummary,
};
use utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success, print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&cli.database, cli.since, &cli.output_dir, cli.alpha);

    // Step 1: Load the four source tables (read-only)
    print_step_header(1, "Load Source Tables");
    let step_start = Instant::now();
    let spinner = create_spinner("Querying source tables...");
    let tables = load_source_tables(&cli.database)?;
    finish_with_success(&spinner, "Source tables loaded");

    for (table, rows) in tables.row_counts() {
        print_count(&format!("row(s) in {}", table), rows, None);
    }
    print_step_time(step_start.elapsed());

    // Step 2: Merge on the person key
    print_step_header(2, "Merge Funnel Tables");
    let step_start = Instant::now();
    let (merged, merge_report) = merge_funnel_tables(&tables, cli.since)?;
    print_success(&format!(
        "Merged {} visit(s) on or after {}",
        merged.height(),
        cli.since
    ));
    if merge_report.visits_before_window > 0 {
        print_info(&format!(
            "{} visit(s) before the window were excluded",
            merge_report.visits_before_window
        ));
    }
    if merge_report.visits_unparseable_date > 0 {
        print_warning(&format!(
            "{} visit(s) had unparseable dates and were excluded",
            merge_report.visits_unparseable_date
        ));
    }
    if merge_report.duplicates_total() > 0 {
        print_warning(&format!(
            "{} duplicate person record(s) ignored (first record wins)",
            merge_report.duplicates_total()
        ));
    }
    print_step_time(step_start.elapsed());

    // Step 3: Label cohorts and funnel stages
    print_step_header(3, "Label Cohorts");
    let step_start = Instant::now();
    let labeled = label_visits(&merged)?;
    let split = cohort_split(&labeled)?;
    print_success("Derived ab_test_group, is_application, is_member");
    println!();
    print_cohort_split(&split);
    print_step_time(step_start.elapsed());

    // Step 4: Funnel rates and significance, in funnel order
    print_step_header(4, "Funnel Rates");
    let step_start = Instant::now();

    let application_pivot = funnel_pivot(
        &labeled,
        "Percent with Application",
        IS_APPLICATION,
        APPLICATION,
        NO_APPLICATION,
    )?;
    let applicants = applicants_only(&labeled)?;
    let member_pivot = funnel_pivot(
        &applicants,
        "Percent Purchase",
        IS_MEMBER,
        MEMBER,
        NOT_MEMBER,
    )?;
    let purchase_pivot = funnel_pivot(
        &labeled,
        "Percent Purchase",
        IS_MEMBER,
        MEMBER,
        NOT_MEMBER,
    )?;

    let mut summary = FunnelSummary::new(merged.height(), split.clone());
    let mut stage_results = Vec::new();
    let stage_headings = [
        ("Percent of visitors who apply", &application_pivot),
        ("Percent of applicants who purchase", &member_pivot),
        ("Percent of visitors who purchase", &purchase_pivot),
    ];
    for (heading, pivot) in stage_headings {
        println!();
        println!("      {}", style(heading).white().bold());
        print_pivot(pivot);
        let test = match chi_square_2x2(pivot.contingency()) {
            Ok(test) => {
                print_chi_square(&test, cli.alpha);
                Some(test)
            }
            Err(err) => {
                print_test_unavailable(&err.to_string());
                None
            }
        };
        summary.add_stage(heading, pivot, test.as_ref(), cli.alpha);
        stage_results.push((pivot, test));
    }
    print_step_time(step_start.elapsed());

    // Step 5: Chart artifacts (failures here never invalidate the
    // statistics above)
    print_step_header(5, "Render Charts");
    let step_start = Instant::now();
    if cli.skip_charts {
        print_info("Chart rendering skipped");
    } else {
        match render_all(
            &cli.output_dir,
            &split,
            &application_pivot,
            &member_pivot,
            &purchase_pivot,
        ) {
            Ok(written) => {
                print_success(&format!("Wrote {} chart(s)", written.len()));
                for path in &written {
                    print_info(&format!("{}", path.display()));
                }
            }
            Err(err) => print_warning(&format!("Chart rendering failed: {:#}", err)),
        }
    }
    print_step_time(step_start.elapsed());

    if let Some(json_path) = &cli.json {
        let params = ExportParams {
            database: &cli.database,
            window_start: cli.since,
            alpha: cli.alpha,
        };
        let stage_refs: Vec<_> = stage_results
            .iter()
            .map(|(pivot, test)| (*pivot, test.as_ref()))
            .collect();
        export_analysis(json_path, &params, &merge_report, &split, &stage_refs)?;
        print_success(&format!("Analysis exported to {}", json_path.display()));
    }

    summary.display(cli.alpha);
    print_completion();

    Ok(())
}
