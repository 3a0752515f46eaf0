//! Session aggregation: route totals, location counts, period frequencies,
//! attendance days, streaks and grade rankings.
//!
//! Every function here is a pure transformation over a session snapshot
//! that the caller has already loaded and scoped.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use climb_core::error::{ClimbError, Result};
use climb_core::grades::{Grade, GradeScale};
use climb_core::models::{Discipline, Session, YearMonth, YearQuarter};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ── Streaks ───────────────────────────────────────────────────────────────────

/// Consecutive-day training streaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    /// Days in a row ending at the reference date (0 if it was a rest day).
    pub current: u32,
    /// Longest run of consecutive attendance days.
    pub longest: u32,
}

// ── GradeCount ────────────────────────────────────────────────────────────────

/// Number of sessions that recorded a given max grade in a discipline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCount {
    pub discipline: Discipline,
    /// Normalised grade text.
    pub grade: String,
    pub count: u64,
}

// ── LocationKey ───────────────────────────────────────────────────────────────

/// How sessions are grouped when counting visits per location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationKey {
    /// The gym name alone.
    #[default]
    Gym,
    /// `"gym (country)"`.
    GymCountry,
}

impl LocationKey {
    /// The key function for this grouping.
    pub fn key_fn(self) -> fn(&Session) -> String {
        match self {
            LocationKey::Gym => location_key_gym,
            LocationKey::GymCountry => location_key_gym_country,
        }
    }
}

impl FromStr for LocationKey {
    type Err = ClimbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gym" => Ok(LocationKey::Gym),
            "gym-country" => Ok(LocationKey::GymCountry),
            other => Err(ClimbError::Config(format!("unknown location key: {other}"))),
        }
    }
}

/// Label used when a session has no gym recorded.
pub const UNKNOWN_LOCATION: &str = "(unknown)";

/// Group by gym name.
pub fn location_key_gym(session: &Session) -> String {
    let gym = session.gym.trim();
    if gym.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        gym.to_string()
    }
}

/// Group by `"gym (country)"`; the country part is dropped when blank.
pub fn location_key_gym_country(session: &Session) -> String {
    let gym = location_key_gym(session);
    let country = session.country.trim();
    if country.is_empty() {
        gym
    } else {
        format!("{} ({})", gym, country)
    }
}

// ── SessionAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that derives statistics from a session snapshot.
pub struct SessionAggregator;

impl SessionAggregator {
    /// Sum of `route_count` per discipline.
    ///
    /// Disciplines with no sessions are absent from the result.
    pub fn totals_by_discipline(sessions: &[Session]) -> BTreeMap<Discipline, u64> {
        let mut totals: BTreeMap<Discipline, u64> = BTreeMap::new();
        for session in sessions {
            *totals.entry(session.discipline).or_default() += u64::from(session.route_count);
        }
        totals
    }

    /// Session count per location key, ranked by count descending.
    ///
    /// Ties keep the order in which the location first appears in `sessions`.
    pub fn counts_by_location<F>(sessions: &[Session], key_fn: F) -> Vec<(String, u64)>
    where
        F: Fn(&Session) -> String,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut ranked: Vec<(String, u64)> = Vec::new();

        for session in sessions {
            let key = key_fn(session);
            match index.get(&key) {
                Some(&i) => ranked[i].1 += 1,
                None => {
                    index.insert(key.clone(), ranked.len());
                    ranked.push((key, 1));
                }
            }
        }

        // Stable sort preserves first-encountered order among equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Sessions per calendar month, ascending. Empty months are omitted.
    pub fn monthly_frequency(sessions: &[Session]) -> Vec<(YearMonth, u64)> {
        Self::count_by(sessions, Session::year_month)
    }

    /// Sessions per calendar quarter, ascending. Empty quarters are omitted.
    pub fn quarterly_frequency(sessions: &[Session]) -> Vec<(YearQuarter, u64)> {
        Self::count_by(sessions, |s| YearQuarter::from_date(s.date))
    }

    /// Sessions per calendar year, ascending.
    pub fn yearly_frequency(sessions: &[Session]) -> Vec<(i32, u64)> {
        Self::count_by(sessions, |s| s.date.year())
    }

    /// Distinct dates in `year` with at least one session.
    pub fn attendance_set(sessions: &[Session], year: i32) -> BTreeSet<NaiveDate> {
        sessions
            .iter()
            .map(|s| s.date)
            .filter(|d| d.year() == year)
            .collect()
    }

    /// Distinct dates with at least one session, across all years.
    pub fn attendance_days(sessions: &[Session]) -> BTreeSet<NaiveDate> {
        sessions.iter().map(|s| s.date).collect()
    }

    /// Current and longest consecutive-day streaks.
    ///
    /// `current` counts back from `reference_date` inclusive and is zero when
    /// that day has no session.
    pub fn streaks(attendance: &BTreeSet<NaiveDate>, reference_date: NaiveDate) -> Streaks {
        let mut longest = 0u32;
        let mut run = 0u32;
        let mut prev: Option<NaiveDate> = None;

        // BTreeSet iterates in ascending order.
        for &day in attendance {
            run = match prev {
                Some(p) if p.succ_opt() == Some(day) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            prev = Some(day);
        }

        let mut current = 0u32;
        let mut cursor = Some(reference_date);
        while let Some(day) = cursor {
            if !attendance.contains(&day) {
                break;
            }
            current += 1;
            cursor = day.pred_opt();
        }

        Streaks { current, longest }
    }

    /// Highest grade recorded for `discipline`.
    ///
    /// Empty and unrecognised grades are skipped. Grades on the other scale
    /// and `V`-prefixed values that fail to parse are skipped with a warning.
    /// Returns `None` when no session yields a usable grade.
    pub fn highest_grade(sessions: &[Session], discipline: Discipline) -> Result<Option<Grade>> {
        let scale = discipline.scale();
        let mut grades: Vec<Grade> = Vec::new();

        for session in sessions.iter().filter(|s| s.discipline == discipline) {
            let Some(raw) = session.grade_str() else {
                continue;
            };
            let normalized = GradeScale::normalize(raw);
            match GradeScale::parse(&normalized) {
                Ok(Some(grade)) if grade.scale == scale => grades.push(grade),
                Ok(Some(grade)) => {
                    warn!(
                        "Skipping {} grade \"{}\" recorded for {} on {}",
                        grade.scale, raw, discipline, session.date
                    );
                }
                Ok(None) => {
                    debug!("Unrecognised grade \"{}\" on {}", raw, session.date);
                }
                Err(e) => {
                    warn!("Skipping grade on {}: {}", session.date, e);
                }
            }
        }

        GradeScale::max_of(&grades)
    }

    /// Session counts per (discipline, normalised grade).
    ///
    /// Sessions without a grade are not counted. Rows are ordered by
    /// discipline, then by rank for parseable grades, then by text.
    pub fn grade_distribution(sessions: &[Session]) -> Vec<GradeCount> {
        let mut counts: HashMap<(Discipline, String), u64> = HashMap::new();
        for session in sessions {
            if let Some(raw) = session.grade_str() {
                let key = (session.discipline, GradeScale::normalize(raw));
                *counts.entry(key).or_default() += 1;
            }
        }

        let mut rows: Vec<GradeCount> = counts
            .into_iter()
            .map(|((discipline, grade), count)| GradeCount {
                discipline,
                grade,
                count,
            })
            .collect();

        rows.sort_by(|a, b| {
            a.discipline.cmp(&b.discipline).then_with(|| {
                let ra = sort_rank(&a.grade);
                let rb = sort_rank(&b.grade);
                ra.total_cmp(&rb).then_with(|| a.grade.cmp(&b.grade))
            })
        });
        rows
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Generic counting driver; `BTreeMap` keeps buckets in ascending order.
    fn count_by<K: Ord>(sessions: &[Session], key_fn: impl Fn(&Session) -> K) -> Vec<(K, u64)> {
        let mut map: BTreeMap<K, u64> = BTreeMap::new();
        for session in sessions {
            *map.entry(key_fn(session)).or_default() += 1;
        }
        map.into_iter().collect()
    }
}

/// Rank for ordering distribution rows; unparseable grades sort last.
fn sort_rank(normalized: &str) -> f64 {
    match GradeScale::parse(normalized) {
        Ok(Some(grade)) => grade.rank,
        _ => f64::INFINITY,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use climb_core::grades::Scale;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session(d: NaiveDate, discipline: Discipline, routes: u32) -> Session {
        Session::new("ana", d, discipline, routes)
    }

    fn days(list: &[NaiveDate]) -> BTreeSet<NaiveDate> {
        list.iter().copied().collect()
    }

    // ── totals_by_discipline ──────────────────────────────────────────────────

    #[test]
    fn test_totals_by_discipline_sums_routes() {
        let sessions = vec![
            session(date(2024, 1, 1), Discipline::BoulderIndoor, 8),
            session(date(2024, 1, 2), Discipline::Lead, 4),
            session(date(2024, 1, 3), Discipline::BoulderIndoor, 5),
        ];
        let totals = SessionAggregator::totals_by_discipline(&sessions);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&Discipline::BoulderIndoor], 13);
        assert_eq!(totals[&Discipline::Lead], 4);
        assert!(!totals.contains_key(&Discipline::TopRope));
    }

    #[test]
    fn test_totals_by_discipline_keeps_zero_route_sessions() {
        let sessions = vec![session(date(2024, 1, 1), Discipline::Outdoor, 0)];
        let totals = SessionAggregator::totals_by_discipline(&sessions);
        assert_eq!(totals.get(&Discipline::Outdoor), Some(&0));
    }

    #[test]
    fn test_totals_by_discipline_empty() {
        assert!(SessionAggregator::totals_by_discipline(&[]).is_empty());
    }

    // ── counts_by_location ────────────────────────────────────────────────────

    #[test]
    fn test_counts_by_location_ranked() {
        let at = |gym: &str| {
            session(date(2024, 1, 1), Discipline::BoulderIndoor, 1).with_location("NZ", "", gym)
        };
        let sessions = vec![at("Alpha"), at("Beta"), at("Beta"), at("Gamma")];
        let counts = SessionAggregator::counts_by_location(&sessions, location_key_gym);

        assert_eq!(
            counts,
            vec![
                ("Beta".to_string(), 2),
                ("Alpha".to_string(), 1),
                ("Gamma".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_counts_by_location_ties_keep_first_seen_order() {
        let at = |gym: &str| session(date(2024, 1, 1), Discipline::Lead, 1).with_location("", "", gym);
        let sessions = vec![at("Zeta"), at("Alpha"), at("Alpha"), at("Zeta")];
        let counts = SessionAggregator::counts_by_location(&sessions, location_key_gym);
        assert_eq!(counts[0].0, "Zeta");
        assert_eq!(counts[1].0, "Alpha");
    }

    #[test]
    fn test_counts_by_location_gym_country_key() {
        let sessions = vec![
            session(date(2024, 1, 1), Discipline::Lead, 1).with_location("Japan", "Tokyo", "B-Pump"),
            session(date(2024, 1, 2), Discipline::Lead, 1).with_location("", "", "B-Pump"),
            session(date(2024, 1, 3), Discipline::Lead, 1),
        ];
        let counts = SessionAggregator::counts_by_location(&sessions, location_key_gym_country);
        let keys: Vec<&str> = counts.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["B-Pump (Japan)", "B-Pump", UNKNOWN_LOCATION]);
    }

    #[test]
    fn test_location_key_from_str() {
        assert_eq!("gym".parse::<LocationKey>().unwrap(), LocationKey::Gym);
        assert_eq!(
            "gym-country".parse::<LocationKey>().unwrap(),
            LocationKey::GymCountry
        );
        assert!("city".parse::<LocationKey>().is_err());
    }

    // ── period frequencies ────────────────────────────────────────────────────

    #[test]
    fn test_monthly_frequency_omits_empty_months() {
        let sessions = vec![
            session(date(2024, 3, 9), Discipline::Lead, 1),
            session(date(2024, 1, 2), Discipline::Lead, 1),
            session(date(2024, 1, 15), Discipline::TopRope, 1),
            session(date(2024, 1, 31), Discipline::BoulderIndoor, 1),
        ];
        let monthly = SessionAggregator::monthly_frequency(&sessions);
        assert_eq!(
            monthly,
            vec![(YearMonth::new(2024, 1), 3), (YearMonth::new(2024, 3), 1)]
        );
    }

    #[test]
    fn test_monthly_frequency_orders_across_years() {
        let sessions = vec![
            session(date(2024, 1, 2), Discipline::Lead, 1),
            session(date(2023, 12, 30), Discipline::Lead, 1),
        ];
        let keys: Vec<String> = SessionAggregator::monthly_frequency(&sessions)
            .iter()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, vec!["2023-12", "2024-01"]);
    }

    #[test]
    fn test_quarterly_and_yearly_frequency() {
        let sessions = vec![
            session(date(2023, 11, 1), Discipline::Lead, 1),
            session(date(2024, 2, 1), Discipline::Lead, 1),
            session(date(2024, 3, 1), Discipline::Lead, 1),
            session(date(2024, 7, 1), Discipline::Lead, 1),
        ];
        let quarterly = SessionAggregator::quarterly_frequency(&sessions);
        let labels: Vec<(String, u64)> =
            quarterly.iter().map(|(q, c)| (q.to_string(), *c)).collect();
        assert_eq!(
            labels,
            vec![
                ("2023-Q4".to_string(), 1),
                ("2024-Q1".to_string(), 2),
                ("2024-Q3".to_string(), 1),
            ]
        );

        let yearly = SessionAggregator::yearly_frequency(&sessions);
        assert_eq!(yearly, vec![(2023, 1), (2024, 3)]);
    }

    // ── attendance_set ────────────────────────────────────────────────────────

    #[test]
    fn test_attendance_set_collapses_duplicates() {
        let sessions = vec![
            session(date(2024, 1, 1), Discipline::BoulderIndoor, 3),
            session(date(2024, 1, 1), Discipline::Lead, 2),
            session(date(2024, 1, 3), Discipline::BoulderIndoor, 1),
        ];
        let set = SessionAggregator::attendance_set(&sessions, 2024);
        assert_eq!(set, days(&[date(2024, 1, 1), date(2024, 1, 3)]));
    }

    #[test]
    fn test_attendance_set_filters_year() {
        let sessions = vec![
            session(date(2023, 12, 31), Discipline::Lead, 1),
            session(date(2024, 1, 1), Discipline::Lead, 1),
        ];
        assert_eq!(SessionAggregator::attendance_set(&sessions, 2024).len(), 1);
        assert_eq!(SessionAggregator::attendance_set(&sessions, 2022).len(), 0);
        assert_eq!(SessionAggregator::attendance_days(&sessions).len(), 2);
    }

    // ── streaks ───────────────────────────────────────────────────────────────

    #[test]
    fn test_streaks_current_one_longest_three() {
        let set = days(&[
            date(2024, 1, 1),
            date(2024, 1, 2),
            date(2024, 1, 3),
            date(2024, 1, 5),
        ]);
        let s = SessionAggregator::streaks(&set, date(2024, 1, 5));
        assert_eq!(s, Streaks { current: 1, longest: 3 });
    }

    #[test]
    fn test_streaks_current_zero_when_reference_absent() {
        let set = days(&[date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
        let s = SessionAggregator::streaks(&set, date(2024, 1, 10));
        assert_eq!(s, Streaks { current: 0, longest: 3 });
    }

    #[test]
    fn test_streaks_empty() {
        let s = SessionAggregator::streaks(&BTreeSet::new(), date(2024, 1, 10));
        assert_eq!(s, Streaks::default());
    }

    #[test]
    fn test_streaks_current_counts_back_from_reference() {
        let set = days(&[date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
        let s = SessionAggregator::streaks(&set, date(2024, 1, 2));
        assert_eq!(s, Streaks { current: 2, longest: 3 });
    }

    #[test]
    fn test_streaks_span_month_and_year_boundaries() {
        let set = days(&[
            date(2023, 12, 30),
            date(2023, 12, 31),
            date(2024, 1, 1),
            date(2024, 2, 28),
            date(2024, 2, 29),
            date(2024, 3, 1),
            date(2024, 3, 2),
        ]);
        let s = SessionAggregator::streaks(&set, date(2024, 3, 2));
        assert_eq!(s, Streaks { current: 4, longest: 4 });
    }

    // ── highest_grade ─────────────────────────────────────────────────────────

    #[test]
    fn test_highest_grade_boulder_skips_unparseable() {
        let d = date(2024, 1, 1);
        let sessions = vec![
            session(d, Discipline::BoulderIndoor, 1).with_grade("V5"),
            session(d, Discipline::BoulderIndoor, 1).with_grade("v10"),
            session(d, Discipline::BoulderIndoor, 1).with_grade("hard"),
            session(d, Discipline::BoulderIndoor, 1).with_grade(""),
            session(d, Discipline::BoulderIndoor, 1),
        ];
        let best = SessionAggregator::highest_grade(&sessions, Discipline::BoulderIndoor)
            .unwrap()
            .unwrap();
        assert_eq!(best.scale, Scale::Boulder);
        assert!((best.rank - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_highest_grade_roped_letters() {
        let d = date(2024, 1, 1);
        let sessions = vec![
            session(d, Discipline::Lead, 1).with_grade("5.11c"),
            session(d, Discipline::Lead, 1).with_grade("5.12A"),
            session(d, Discipline::Lead, 1).with_grade("5.10d"),
            session(d, Discipline::TopRope, 1).with_grade("5.13a"),
        ];
        let best = SessionAggregator::highest_grade(&sessions, Discipline::Lead)
            .unwrap()
            .unwrap();
        assert_eq!(best.to_string(), "5.12a");
    }

    #[test]
    fn test_highest_grade_none_when_no_grades() {
        let d = date(2024, 1, 1);
        let sessions = vec![
            session(d, Discipline::Lead, 1).with_grade("hard"),
            session(d, Discipline::BoulderIndoor, 1).with_grade("V4"),
        ];
        assert!(SessionAggregator::highest_grade(&sessions, Discipline::Lead)
            .unwrap()
            .is_none());
        assert!(SessionAggregator::highest_grade(&[], Discipline::Outdoor)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_highest_grade_skips_other_scale_and_bad_boulder_values() {
        let d = date(2024, 1, 1);
        let sessions = vec![
            session(d, Discipline::BoulderIndoor, 1).with_grade("5.11a"),
            session(d, Discipline::BoulderIndoor, 1).with_grade("Vhard"),
            session(d, Discipline::BoulderIndoor, 1).with_grade("V3"),
        ];
        let best = SessionAggregator::highest_grade(&sessions, Discipline::BoulderIndoor)
            .unwrap()
            .unwrap();
        assert_eq!(best, Grade::boulder(3));
    }

    // ── grade_distribution ────────────────────────────────────────────────────

    #[test]
    fn test_grade_distribution_counts_and_orders() {
        let d = date(2024, 1, 1);
        let sessions = vec![
            session(d, Discipline::Lead, 1).with_grade("5.11a"),
            session(d, Discipline::BoulderIndoor, 1).with_grade("V10"),
            session(d, Discipline::BoulderIndoor, 1).with_grade("v4"),
            session(d, Discipline::BoulderIndoor, 1).with_grade("V4"),
            session(d, Discipline::Lead, 1).with_grade("5.9"),
            session(d, Discipline::Lead, 1).with_grade("mystery"),
            session(d, Discipline::Lead, 1),
        ];
        let rows = SessionAggregator::grade_distribution(&sessions);
        let flat: Vec<(Discipline, &str, u64)> = rows
            .iter()
            .map(|r| (r.discipline, r.grade.as_str(), r.count))
            .collect();

        assert_eq!(
            flat,
            vec![
                (Discipline::BoulderIndoor, "V4", 2),
                (Discipline::BoulderIndoor, "V10", 1),
                (Discipline::Lead, "5.9", 1),
                (Discipline::Lead, "5.11a", 1),
                (Discipline::Lead, "mystery", 1),
            ]
        );
    }
}
