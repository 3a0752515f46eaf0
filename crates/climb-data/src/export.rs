//! Record export: writes a scoped session snapshot for use outside the log.

use std::io::Write;
use std::str::FromStr;

use climb_core::error::{ClimbError, Result};
use climb_core::models::Session;
use tracing::debug;

use crate::filters::SessionFilter;

/// Output encoding of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// One session object per line, the same layout as the store.
    #[default]
    Jsonl,
    /// A single pretty-printed JSON array.
    Json,
}

impl FromStr for ExportFormat {
    type Err = ClimbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jsonl" => Ok(ExportFormat::Jsonl),
            "json" => Ok(ExportFormat::Json),
            other => Err(ClimbError::Config(format!("unknown export format: {other}"))),
        }
    }
}

/// Write the sessions matching `filter` to `writer`, in input order.
///
/// Returns the number of sessions written. An empty scope produces an empty
/// file for JSONL and `[]` for JSON.
pub fn export_sessions<W: Write>(
    sessions: &[Session],
    filter: &SessionFilter,
    format: ExportFormat,
    writer: &mut W,
) -> Result<usize> {
    let scoped = filter.apply(sessions);

    match format {
        ExportFormat::Jsonl => {
            for session in &scoped {
                serde_json::to_writer(&mut *writer, session)?;
                writeln!(writer)?;
            }
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, &scoped)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;

    debug!(
        "Exported {} of {} sessions as {:?}",
        scoped.len(),
        sessions.len(),
        format
    );
    Ok(scoped.len())
}
