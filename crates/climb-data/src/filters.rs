//! Scoping a session snapshot by climber and date window, and summarising
//! the scoped range.

use std::collections::HashSet;

use chrono::NaiveDate;
use climb_core::models::Session;
use serde::{Deserialize, Serialize};

/// Criteria applied before aggregation. All bounds are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    /// Exact (trimmed) climber name.
    pub user: Option<String>,
    /// First date included.
    pub from: Option<NaiveDate>,
    /// Last date included.
    pub to: Option<NaiveDate>,
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        if let Some(user) = &self.user {
            if session.user_name.trim() != user.trim() {
                return false;
            }
        }
        if self.from.is_some_and(|from| session.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| session.date > to) {
            return false;
        }
        true
    }

    /// Sessions matching every criterion, in input order.
    pub fn apply(&self, sessions: &[Session]) -> Vec<Session> {
        sessions
            .iter()
            .filter(|s| self.matches(s))
            .cloned()
            .collect()
    }
}

/// Sessions within `[from, to]`; `None` leaves that side open.
pub fn filter_by_range(
    sessions: &[Session],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<Session> {
    SessionFilter {
        user: None,
        from,
        to,
    }
    .apply(sessions)
}

/// Sessions recorded by `user`.
pub fn filter_by_user(sessions: &[Session], user: &str) -> Vec<Session> {
    SessionFilter {
        user: Some(user.to_string()),
        ..Default::default()
    }
    .apply(sessions)
}

// ── RangeSummary ──────────────────────────────────────────────────────────────

/// Headline numbers for a scoped set of sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSummary {
    /// Distinct non-blank countries.
    pub countries: usize,
    /// Distinct non-blank cities.
    pub cities: usize,
    /// Distinct non-blank gyms.
    pub gyms: usize,
    /// Number of session records.
    pub sessions: usize,
    /// Distinct dates with at least one session.
    pub climbing_days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Summarise `sessions`.
pub fn summarize_range(sessions: &[Session]) -> RangeSummary {
    fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
        values
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect::<HashSet<_>>()
            .len()
    }

    RangeSummary {
        countries: distinct(sessions.iter().map(|s| s.country.as_str())),
        cities: distinct(sessions.iter().map(|s| s.city.as_str())),
        gyms: distinct(sessions.iter().map(|s| s.gym.as_str())),
        sessions: sessions.len(),
        climbing_days: sessions
            .iter()
            .map(|s| s.date)
            .collect::<HashSet<_>>()
            .len(),
        first_date: sessions.iter().map(|s| s.date).min(),
        last_date: sessions.iter().map(|s| s.date).max(),
    }
}
