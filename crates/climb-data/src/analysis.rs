//! Statistics report pipeline.
//!
//! Scopes a loaded session snapshot, runs every aggregate over it and
//! returns a [`StatsReport`] ready for the presentation layer.

use chrono::{NaiveDate, Utc};
use climb_core::error::Result;
use climb_core::grades::Scale;
use climb_core::models::{Discipline, Session};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{GradeCount, LocationKey, SessionAggregator, Streaks};
use crate::filters::{summarize_range, RangeSummary, SessionFilter};

// ── Options ───────────────────────────────────────────────────────────────────

/// Inputs that scope and parameterise a report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub filter: SessionFilter,
    /// Heatmap year.
    pub year: i32,
    /// Day the current streak counts back from (normally today).
    pub reference_date: NaiveDate,
    pub location_key: LocationKey,
}

// ── Report types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// RFC 3339 timestamp when this report was generated.
    pub generated_at: String,
    /// Sessions handed to the pipeline before filtering.
    pub sessions_loaded: usize,
    /// Sessions left after the filter.
    pub sessions_in_scope: usize,
    pub reference_date: NaiveDate,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineTotal {
    pub discipline: Discipline,
    pub routes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCount {
    pub location: String,
    pub sessions: u64,
}

/// Session count for one period label (`2024-01`, `2024-Q1`, `2024`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCount {
    pub period: String,
    pub sessions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighestGrade {
    pub discipline: Discipline,
    pub scale: Scale,
    /// Canonical notation, e.g. `V7` or `5.11c`.
    pub grade: String,
    pub rank: f64,
}

/// Everything the stats views display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub metadata: ReportMetadata,
    pub summary: RangeSummary,
    pub route_totals: Vec<DisciplineTotal>,
    pub locations: Vec<LocationCount>,
    pub monthly: Vec<PeriodCount>,
    pub quarterly: Vec<PeriodCount>,
    pub yearly: Vec<PeriodCount>,
    /// Attendance days within `metadata.year`, ascending.
    pub attendance: Vec<NaiveDate>,
    /// Computed over all attendance days in scope, not just `metadata.year`.
    pub streaks: Streaks,
    pub highest_grades: Vec<HighestGrade>,
    pub grade_distribution: Vec<GradeCount>,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full report pipeline over `sessions`.
///
/// 1. Apply the filter.
/// 2. Summarise the range.
/// 3. Route totals, location ranking, period frequencies.
/// 4. Attendance for the heatmap year and streaks.
/// 5. Highest grade per discipline and grade distribution.
///
/// Fails only if a grade comparison across scales is attempted, which
/// signals a bug in the per-discipline filtering.
pub fn build_report(sessions: &[Session], options: &ReportOptions) -> Result<StatsReport> {
    // ── Step 1: Scope ─────────────────────────────────────────────────────────
    let scoped = options.filter.apply(sessions);
    debug!(
        "Report scope: {} of {} sessions (user={:?}, from={:?}, to={:?})",
        scoped.len(),
        sessions.len(),
        options.filter.user,
        options.filter.from,
        options.filter.to
    );

    // ── Step 2: Summary ───────────────────────────────────────────────────────
    let summary = summarize_range(&scoped);

    // ── Step 3: Totals and frequencies ────────────────────────────────────────
    let route_totals = SessionAggregator::totals_by_discipline(&scoped)
        .into_iter()
        .map(|(discipline, routes)| DisciplineTotal { discipline, routes })
        .collect();

    let locations = SessionAggregator::counts_by_location(&scoped, options.location_key.key_fn())
        .into_iter()
        .map(|(location, sessions)| LocationCount { location, sessions })
        .collect();

    let monthly = to_period_counts(SessionAggregator::monthly_frequency(&scoped));
    let quarterly = to_period_counts(SessionAggregator::quarterly_frequency(&scoped));
    let yearly = to_period_counts(SessionAggregator::yearly_frequency(&scoped));

    // ── Step 4: Attendance and streaks ────────────────────────────────────────
    let attendance = SessionAggregator::attendance_set(&scoped, options.year);
    let streaks = SessionAggregator::streaks(
        &SessionAggregator::attendance_days(&scoped),
        options.reference_date,
    );

    // ── Step 5: Grades ────────────────────────────────────────────────────────
    let mut highest_grades = Vec::new();
    for discipline in Discipline::ALL {
        if let Some(grade) = SessionAggregator::highest_grade(&scoped, discipline)? {
            highest_grades.push(HighestGrade {
                discipline,
                scale: grade.scale,
                grade: grade.to_string(),
                rank: grade.rank,
            });
        }
    }
    let grade_distribution = SessionAggregator::grade_distribution(&scoped);

    let metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339(),
        sessions_loaded: sessions.len(),
        sessions_in_scope: scoped.len(),
        reference_date: options.reference_date,
        year: options.year,
    };

    Ok(StatsReport {
        metadata,
        summary,
        route_totals,
        locations,
        monthly,
        quarterly,
        yearly,
        attendance: attendance.into_iter().collect(),
        streaks,
        highest_grades,
        grade_distribution,
    })
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn to_period_counts<K: ToString>(series: Vec<(K, u64)>) -> Vec<PeriodCount> {
    series
        .into_iter()
        .map(|(period, sessions)| PeriodCount {
            period: period.to_string(),
            sessions,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
