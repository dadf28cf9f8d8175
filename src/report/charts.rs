//! Chart artifacts: cohort share pie and per-stage rate bars
//!
//! Rendering is pure presentation. Callers treat any failure here as a
//! warning, so an unwritable directory or a missing font can never
//! invalidate the statistics already printed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::prelude::*;

use crate::pipeline::{CohortSplit, FunnelPivot};

/// Fixed artifact names, one per pivoted percentage table
pub const PIE_CHART_FILE: &str = "ab_test_pie_chart.png";
pub const APPLICATION_CHART_FILE: &str = "percent_visitors_apply.png";
pub const MEMBER_CHART_FILE: &str = "percent_apply_purchase.png";
pub const PURCHASE_CHART_FILE: &str = "percent_visitors_purchase.png";

/// Cohort axis labels on the bar charts
const COHORT_LABELS: [&str; 2] = ["Fitness Test", "No Fitness Test"];

const CHART_SIZE: (u32, u32) = (640, 480);

const BAR_COLOR: RGBColor = RGBColor(66, 133, 244);
const PIE_COLORS: [RGBColor; 2] = [RGBColor(66, 133, 244), RGBColor(219, 68, 55)];

/// Render all chart artifacts into `output_dir`, returning the paths
/// written.
pub fn render_all(
    output_dir: &Path,
    split: &CohortSplit,
    application: &FunnelPivot,
    member: &FunnelPivot,
    purchase: &FunnelPivot,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let mut written = Vec::new();

    // A pie of an empty population has no shares to draw.
    if split.total() > 0 {
        let path = output_dir.join(PIE_CHART_FILE);
        render_cohort_pie(&path, split)
            .with_context(|| format!("Failed to render {}", path.display()))?;
        written.push(path);
    }

    let bar_charts = [
        (APPLICATION_CHART_FILE, application, "Percent of Visitors who Apply"),
        (MEMBER_CHART_FILE, member, "Percent of Applicants who Purchase Membership"),
        (PURCHASE_CHART_FILE, purchase, "Percent of Visitors who Purchase Membership"),
    ];
    for (file, pivot, title) in bar_charts {
        let path = output_dir.join(file);
        render_rate_bars(&path, pivot, title)
            .with_context(|| format!("Failed to render {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}

/// Cohort share pie chart with percentage labels.
fn render_cohort_pie(path: &Path, split: &CohortSplit) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("A/B Test Cohorts", ("sans-serif", 24))?;

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;
    let sizes = [split.group_a as f64, split.group_b as f64];
    let labels = ["A".to_string(), "B".to_string()];

    let mut pie = Pie::new(&center, &radius, &sizes, &PIE_COLORS, &labels);
    pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 15).into_font().color(&BLACK));
    root.draw(&pie)?;

    root.present()?;
    Ok(())
}

/// One bar per cohort; a cohort with an undefined rate gets no bar.
fn render_rate_bars(path: &Path, pivot: &FunnelPivot, title: &str) -> Result<()> {
    let bars: Vec<(u32, f64)> = pivot
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row.rate().map(|rate| (i as u32, rate)))
        .collect();
    let y_max = bars.iter().fold(0.05f64, |max, (_, rate)| max.max(*rate)) * 1.25;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(24)
        .x_label_area_size(36)
        .y_label_area_size(48)
        .build_cartesian_2d((0u32..2u32).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => COHORT_LABELS
                .get(*i as usize)
                .copied()
                .unwrap_or_default()
                .to_string(),
            SegmentValue::Last => String::new(),
        })
        .y_label_formatter(&|rate| format!("{:.0}%", rate * 100.0))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.mix(0.85).filled())
            .margin(36)
            .data(bars.iter().copied()),
    )?;

    root.present()?;
    Ok(())
}
