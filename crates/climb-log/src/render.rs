//! Plain-text rendering of a [`StatsReport`] for the terminal.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use chrono::NaiveDate;
use climb_core::formatting::{format_count, format_days, percentage, render_bar, render_heatmap_row};
use climb_data::analysis::{PeriodCount, StatsReport};

const BAR_WIDTH: usize = 30;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Render the sections belonging to `view`.
///
/// `view` is one of the `--view` values; `"all"` renders every section.
pub fn render_view(report: &StatsReport, view: &str) -> Result<String, fmt::Error> {
    let mut out = String::new();
    match view {
        "summary" => {
            render_summary(&mut out, report)?;
            render_route_totals(&mut out, report)?;
            render_highest_grades(&mut out, report)?;
        }
        "monthly" => render_periods(&mut out, "Sessions per month", &report.monthly)?,
        "quarterly" => render_periods(&mut out, "Sessions per quarter", &report.quarterly)?,
        "yearly" => render_periods(&mut out, "Sessions per year", &report.yearly)?,
        "heatmap" => render_heatmap(&mut out, report)?,
        "grades" => {
            render_highest_grades(&mut out, report)?;
            render_grade_distribution(&mut out, report)?;
        }
        "locations" => render_locations(&mut out, report)?,
        _ => {
            render_summary(&mut out, report)?;
            render_route_totals(&mut out, report)?;
            render_locations(&mut out, report)?;
            render_periods(&mut out, "Sessions per month", &report.monthly)?;
            render_periods(&mut out, "Sessions per quarter", &report.quarterly)?;
            render_periods(&mut out, "Sessions per year", &report.yearly)?;
            render_heatmap(&mut out, report)?;
            render_highest_grades(&mut out, report)?;
            render_grade_distribution(&mut out, report)?;
        }
    }
    Ok(out)
}

// ── Sections ──────────────────────────────────────────────────────────────────

fn render_summary(out: &mut String, report: &StatsReport) -> fmt::Result {
    let s = &report.summary;
    heading(out, "Summary")?;
    match (s.first_date, s.last_date) {
        (Some(first), Some(last)) => writeln!(out, "  Range          {} to {}", first, last)?,
        _ => writeln!(out, "  No sessions recorded in this range.")?,
    }
    writeln!(out, "  Sessions       {}", format_count(s.sessions as u64))?;
    writeln!(out, "  Climbing days  {}", format_count(s.climbing_days as u64))?;
    writeln!(out, "  Gyms           {}", s.gyms)?;
    writeln!(out, "  Cities         {}", s.cities)?;
    writeln!(out, "  Countries      {}", s.countries)?;
    writeln!(
        out,
        "  Streak         {} current, {} longest (as of {})",
        format_days(report.streaks.current),
        format_days(report.streaks.longest),
        report.metadata.reference_date
    )
}

fn render_route_totals(out: &mut String, report: &StatsReport) -> fmt::Result {
    heading(out, "Routes completed")?;
    if report.route_totals.is_empty() {
        return writeln!(out, "  (none)");
    }
    let total: u64 = report.route_totals.iter().map(|t| t.routes).sum();
    let max = report.route_totals.iter().map(|t| t.routes).max().unwrap_or(0);
    for t in &report.route_totals {
        writeln!(
            out,
            "  {:<18} {:>6}  {:>5.1}%  {}",
            t.discipline.to_string(),
            format_count(t.routes),
            percentage(t.routes as f64, total as f64, 1),
            render_bar(t.routes, max, BAR_WIDTH)
        )?;
    }
    Ok(())
}

fn render_locations(out: &mut String, report: &StatsReport) -> fmt::Result {
    heading(out, "Sessions per location")?;
    if report.locations.is_empty() {
        return writeln!(out, "  (none)");
    }
    let max = report.locations.first().map(|l| l.sessions).unwrap_or(0);
    let width = report
        .locations
        .iter()
        .map(|l| l.location.chars().count())
        .max()
        .unwrap_or(0);
    for l in &report.locations {
        writeln!(
            out,
            "  {:<width$} {:>5}  {}",
            l.location,
            l.sessions,
            render_bar(l.sessions, max, BAR_WIDTH),
            width = width
        )?;
    }
    Ok(())
}

fn render_periods(out: &mut String, title: &str, periods: &[PeriodCount]) -> fmt::Result {
    heading(out, title)?;
    if periods.is_empty() {
        return writeln!(out, "  (none)");
    }
    let max = periods.iter().map(|p| p.sessions).max().unwrap_or(0);
    for p in periods {
        writeln!(
            out,
            "  {:<8} {:>5}  {}",
            p.period,
            p.sessions,
            render_bar(p.sessions, max, BAR_WIDTH)
        )?;
    }
    Ok(())
}

fn render_heatmap(out: &mut String, report: &StatsReport) -> fmt::Result {
    let year = report.metadata.year;
    heading(out, &format!("Attendance {}", year))?;
    let days: BTreeSet<NaiveDate> = report.attendance.iter().copied().collect();
    for (i, name) in MONTH_NAMES.iter().enumerate() {
        let month = i as u32 + 1;
        writeln!(out, "  {} {}", name, render_heatmap_row(year, month, &days))?;
    }
    writeln!(out, "  {} climbing days", days.len())
}

fn render_highest_grades(out: &mut String, report: &StatsReport) -> fmt::Result {
    heading(out, "Highest grade")?;
    if report.highest_grades.is_empty() {
        return writeln!(out, "  (no graded sessions)");
    }
    for g in &report.highest_grades {
        writeln!(out, "  {:<18} {}", g.discipline.to_string(), g.grade)?;
    }
    Ok(())
}

fn render_grade_distribution(out: &mut String, report: &StatsReport) -> fmt::Result {
    heading(out, "Grade distribution")?;
    if report.grade_distribution.is_empty() {
        return writeln!(out, "  (no graded sessions)");
    }
    let max = report
        .grade_distribution
        .iter()
        .map(|g| g.count)
        .max()
        .unwrap_or(0);
    for g in &report.grade_distribution {
        writeln!(
            out,
            "  {:<18} {:<8} {:>4}  {}",
            g.discipline.to_string(),
            g.grade,
            g.count,
            render_bar(g.count, max, BAR_WIDTH)
        )?;
    }
    Ok(())
}

fn heading(out: &mut String, title: &str) -> fmt::Result {
    if !out.is_empty() {
        out.push('\n');
    }
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "─".repeat(title.chars().count()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
