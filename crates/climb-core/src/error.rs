use std::path::PathBuf;
use thiserror::Error;

use crate::grades::Scale;
use crate::models::Discipline;

/// All errors produced by the climbing-log crates.
#[derive(Error, Debug)]
pub enum ClimbError {
    /// A non-empty grade does not match the notation of its discipline.
    ///
    /// Always user-correctable: the write is rejected and the form kept.
    #[error("Invalid grade \"{grade}\" for {discipline}: expected {expected}")]
    InvalidGradeFormat {
        grade: String,
        discipline: Discipline,
        expected: &'static str,
    },

    /// Two grades from different scales were ordered against each other.
    ///
    /// Indicates a missing discipline pre-filter in the caller.
    #[error("Cannot compare grades across scales: {left} vs {right}")]
    ScaleMismatch { left: Scale, right: Scale },

    /// A `V`-prefixed grade whose suffix is not a number.
    #[error("Invalid bouldering grade: {0}")]
    GradeParse(String),

    /// A discipline name is not one of the recognised disciplines.
    #[error("Unknown discipline: {0}")]
    InvalidDiscipline(String),

    /// A date string did not match `%Y-%m-%d`.
    #[error("Invalid date format: {0}")]
    DateParse(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The session store path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClimbError {
    /// `true` for errors the user can fix by editing their input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            ClimbError::InvalidGradeFormat { .. }
                | ClimbError::InvalidDiscipline(_)
                | ClimbError::DateParse(_)
        )
    }
}

/// Convenience alias used throughout the climbing-log crates.
pub type Result<T> = std::result::Result<T, ClimbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_grade_format() {
        let err = ClimbError::InvalidGradeFormat {
            grade: "5.11".to_string(),
            discipline: Discipline::BoulderIndoor,
            expected: "V<number>, e.g. V5",
        };
        let msg = err.to_string();
        assert!(msg.contains("\"5.11\""));
        assert!(msg.contains("indoor bouldering"));
        assert!(msg.contains("V<number>"));
    }

    #[test]
    fn test_error_display_scale_mismatch() {
        let err = ClimbError::ScaleMismatch {
            left: Scale::Boulder,
            right: Scale::Roped,
        };
        assert_eq!(
            err.to_string(),
            "Cannot compare grades across scales: boulder vs roped"
        );
    }

    #[test]
    fn test_error_display_grade_parse() {
        let err = ClimbError::GradeParse("Vhard".to_string());
        assert_eq!(err.to_string(), "Invalid bouldering grade: Vhard");
    }

    #[test]
    fn test_error_display_data_path_not_found() {
        let err = ClimbError::DataPathNotFound(PathBuf::from("/missing/sessions.jsonl"));
        assert_eq!(
            err.to_string(),
            "Data path not found: /missing/sessions.jsonl"
        );
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ClimbError::FileRead {
            path: PathBuf::from("/some/sessions.jsonl"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/sessions.jsonl"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: ClimbError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_user_correctable_classification() {
        assert!(ClimbError::DateParse("2024-13-01".to_string()).is_user_correctable());
        assert!(ClimbError::InvalidDiscipline("ice".to_string()).is_user_correctable());
        assert!(!ClimbError::ScaleMismatch {
            left: Scale::Roped,
            right: Scale::Boulder,
        }
        .is_user_correctable());
    }
}
