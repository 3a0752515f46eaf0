//! Climbing grade normalisation, validation and ranking.
//!
//! Two notations exist: the bouldering V-scale (`V5`) and the roped
//! decimal scale with letter modifiers (`5.11c`). Each maps onto a numeric
//! rank that orders grades within the same scale.
//!
//! [`GradeScale::validate`] is strict and guards the entry path.
//! [`GradeScale::parse`] is lenient so that statistics keep working over
//! older free-text values already in storage.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{ClimbError, Result};
use crate::models::Discipline;

/// Human-readable notation hint for each scale, used in validation messages.
pub const BOULDER_NOTATION: &str = "V<number>, e.g. V5";
pub const ROPED_NOTATION: &str = "5.<number>[a-d], e.g. 5.10a or 5.9";

fn boulder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^V[0-9]+$").expect("regex is valid"))
}

fn roped_strict_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^5\.[0-9]{1,2}[a-d]?$").expect("regex is valid"))
}

fn roped_parse_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^5\.([0-9]+)([abcd]?)$").expect("regex is valid"))
}

// ── Scale ─────────────────────────────────────────────────────────────────────

/// The grading system a grade belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Boulder,
    Roped,
}

impl Scale {
    /// Notation hint shown to the user when validation fails.
    pub fn notation(self) -> &'static str {
        match self {
            Scale::Boulder => BOULDER_NOTATION,
            Scale::Roped => ROPED_NOTATION,
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Boulder => f.write_str("boulder"),
            Scale::Roped => f.write_str("roped"),
        }
    }
}

// ── Grade ─────────────────────────────────────────────────────────────────────

/// A parsed grade: a scale plus a rank comparable within that scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub scale: Scale,
    /// `V10` → 10.0, `5.11c` → 11.3.
    pub rank: f64,
}

impl Grade {
    pub fn boulder(rank: u32) -> Self {
        Self {
            scale: Scale::Boulder,
            rank: f64::from(rank),
        }
    }

    /// Roped grade from the number after `5.` and an optional `a`-`d` letter.
    ///
    /// Letters outside `a`-`d` count as no letter.
    pub fn roped(base: u32, letter: Option<char>) -> Self {
        Self {
            scale: Scale::Roped,
            rank: f64::from(base) + letter_offset(letter),
        }
    }
}

impl fmt::Display for Grade {
    /// Renders the canonical notation (`V10`, `5.11c`, `5.9`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scale {
            Scale::Boulder => write!(f, "V{}", self.rank.round() as u64),
            Scale::Roped => {
                let tenths = (self.rank * 10.0).round() as u64;
                let base = tenths / 10;
                match tenths % 10 {
                    1 => write!(f, "5.{}a", base),
                    2 => write!(f, "5.{}b", base),
                    3 => write!(f, "5.{}c", base),
                    4 => write!(f, "5.{}d", base),
                    _ => write!(f, "5.{}", base),
                }
            }
        }
    }
}

fn letter_offset(letter: Option<char>) -> f64 {
    match letter {
        Some('a') => 0.1,
        Some('b') => 0.2,
        Some('c') => 0.3,
        Some('d') => 0.4,
        _ => 0.0,
    }
}

// ── GradeScale ────────────────────────────────────────────────────────────────

/// Stateless grade conversions.
pub struct GradeScale;

impl GradeScale {
    /// Canonicalise a raw grade string.
    ///
    /// Trims whitespace. A leading `v`/`V` becomes `V` with the rest kept as
    /// typed; anything else is lower-cased.
    ///
    /// # Examples
    ///
    /// ```
    /// use climb_core::grades::GradeScale;
    ///
    /// assert_eq!(GradeScale::normalize("  v7 "), "V7");
    /// assert_eq!(GradeScale::normalize("5.11C"), "5.11c");
    /// assert_eq!(GradeScale::normalize(""), "");
    /// ```
    pub fn normalize(raw: &str) -> String {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        match chars.next() {
            Some('v') | Some('V') => format!("V{}", chars.as_str()),
            _ => trimmed.to_lowercase(),
        }
    }

    /// Strict syntax check of an already-normalised grade for `discipline`.
    ///
    /// The empty string is always valid since the grade is optional.
    pub fn validate(normalized: &str, discipline: Discipline) -> bool {
        if normalized.is_empty() {
            return true;
        }
        match discipline.scale() {
            Scale::Boulder => boulder_pattern().is_match(normalized),
            Scale::Roped => roped_strict_pattern().is_match(normalized),
        }
    }

    /// Entry-time check: normalise `raw` and validate it for `discipline`.
    ///
    /// Returns the normalised grade to store, or
    /// [`ClimbError::InvalidGradeFormat`] naming the expected notation.
    pub fn check(raw: &str, discipline: Discipline) -> Result<String> {
        let normalized = Self::normalize(raw);
        if Self::validate(&normalized, discipline) {
            Ok(normalized)
        } else {
            Err(ClimbError::InvalidGradeFormat {
                grade: raw.trim().to_string(),
                discipline,
                expected: discipline.scale().notation(),
            })
        }
    }

    /// Lenient parse of a normalised grade.
    ///
    /// * `""` → `Ok(None)`.
    /// * `V<n>` → boulder grade; a non-numeric suffix is
    ///   [`ClimbError::GradeParse`].
    /// * `5.<n>[a-d]` → roped grade.
    /// * anything else → `Ok(None)`.
    pub fn parse(normalized: &str) -> Result<Option<Grade>> {
        if normalized.is_empty() {
            return Ok(None);
        }

        if let Some(rest) = normalized
            .strip_prefix('V')
            .or_else(|| normalized.strip_prefix('v'))
        {
            // `u32::from_str` would accept a leading `+`.
            if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ClimbError::GradeParse(normalized.to_string()));
            }
            let rank: u32 = rest
                .parse()
                .map_err(|_| ClimbError::GradeParse(normalized.to_string()))?;
            return Ok(Some(Grade::boulder(rank)));
        }

        let Some(caps) = roped_parse_pattern().captures(normalized) else {
            return Ok(None);
        };
        let Ok(base) = caps[1].parse::<u32>() else {
            // Digits too long for u32: not a grade anyone climbs.
            return Ok(None);
        };
        let letter = caps.get(2).and_then(|m| m.as_str().chars().next());
        Ok(Some(Grade::roped(base, letter)))
    }

    /// Order two grades of the same scale by rank.
    pub fn compare(a: &Grade, b: &Grade) -> Result<Ordering> {
        if a.scale != b.scale {
            return Err(ClimbError::ScaleMismatch {
                left: a.scale,
                right: b.scale,
            });
        }
        Ok(a.rank.total_cmp(&b.rank))
    }

    /// Highest grade in `grades`, or `None` when empty.
    ///
    /// All grades must share the first grade's scale; callers filter by
    /// discipline first.
    pub fn max_of(grades: &[Grade]) -> Result<Option<Grade>> {
        let mut iter = grades.iter();
        let Some(first) = iter.next() else {
            return Ok(None);
        };

        let mut best = *first;
        for grade in iter {
            if Self::compare(grade, &best)? == Ordering::Greater {
                best = *grade;
            }
        }
        Ok(Some(best))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
