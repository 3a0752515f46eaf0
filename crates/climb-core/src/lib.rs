//! Core types for the climbing log.
//!
//! Session and discipline models, grade normalisation and ranking, the
//! shared error type, CLI settings, date helpers and text formatting.

pub mod error;
pub mod formatting;
pub mod grades;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{ClimbError, Result};
pub use grades::{Grade, GradeScale, Scale};
pub use models::{Discipline, Session, YearMonth, YearQuarter};
