use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClimbError;
use crate::grades::Scale;

/// The climbing style of a session.
///
/// Variant order is the display order used by per-discipline reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    /// Indoor bouldering on the V-scale.
    BoulderIndoor,
    /// Roped climbing with the rope anchored above.
    TopRope,
    /// Roped climbing clipping protection on the way up.
    Lead,
    /// Outdoor crag climbing, graded on the roped scale.
    Outdoor,
}

impl Discipline {
    /// Every discipline, in display order.
    pub const ALL: [Discipline; 4] = [
        Discipline::BoulderIndoor,
        Discipline::TopRope,
        Discipline::Lead,
        Discipline::Outdoor,
    ];

    /// The grade scale this discipline is recorded on.
    pub fn scale(self) -> Scale {
        match self {
            Discipline::BoulderIndoor => Scale::Boulder,
            Discipline::TopRope | Discipline::Lead | Discipline::Outdoor => Scale::Roped,
        }
    }

    /// Stable machine-readable name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Discipline::BoulderIndoor => "boulder_indoor",
            Discipline::TopRope => "top_rope",
            Discipline::Lead => "lead",
            Discipline::Outdoor => "outdoor",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Discipline::BoulderIndoor => "indoor bouldering",
            Discipline::TopRope => "top rope",
            Discipline::Lead => "lead",
            Discipline::Outdoor => "outdoor",
        };
        f.write_str(label)
    }
}

impl FromStr for Discipline {
    type Err = ClimbError;

    /// Accepts the machine name, a few spoken aliases, and the labels used by
    /// older Chinese-language logs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase().replace(['-', ' '], "_");
        match lower.as_str() {
            "boulder_indoor" | "boulder" | "bouldering" | "indoor_bouldering" => {
                Ok(Discipline::BoulderIndoor)
            }
            "top_rope" | "toprope" => Ok(Discipline::TopRope),
            "lead" => Ok(Discipline::Lead),
            "outdoor" => Ok(Discipline::Outdoor),
            _ => match trimmed {
                "室内抱石" => Ok(Discipline::BoulderIndoor),
                "高墙-顶绳" => Ok(Discipline::TopRope),
                "高墙-先锋" => Ok(Discipline::Lead),
                "野外攀岩" => Ok(Discipline::Outdoor),
                _ => Err(ClimbError::InvalidDiscipline(s.to_string())),
            },
        }
    }
}

/// One recorded climbing session.
///
/// Sessions are created by the entry path and are read-only to the
/// aggregation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Calendar date of the session.
    pub date: NaiveDate,
    /// Identifier of the climber.
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub gym: String,
    pub discipline: Discipline,
    /// Routes or problems completed.
    #[serde(default)]
    pub route_count: u32,
    /// Hardest grade sent, as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_grade: Option<String>,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Session {
    /// Create a session with empty location fields and no grade.
    pub fn new(
        user_name: impl Into<String>,
        date: NaiveDate,
        discipline: Discipline,
        route_count: u32,
    ) -> Self {
        Self {
            date,
            user_name: user_name.into(),
            country: String::new(),
            city: String::new(),
            gym: String::new(),
            discipline,
            route_count,
            max_grade: None,
            note: None,
        }
    }

    pub fn with_location(
        mut self,
        country: impl Into<String>,
        city: impl Into<String>,
        gym: impl Into<String>,
    ) -> Self {
        self.country = country.into();
        self.city = city.into();
        self.gym = gym.into();
        self
    }

    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.max_grade = Some(grade.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// The recorded grade, treating an empty or blank string as absent.
    pub fn grade_str(&self) -> Option<&str> {
        self.max_grade
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }

    /// Month bucket of the session date.
    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-12.
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A calendar quarter, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearQuarter {
    pub year: i32,
    /// 1-4.
    pub quarter: u32,
}

impl YearQuarter {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
        }
    }
}

impl fmt::Display for YearQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter)
    }
}
