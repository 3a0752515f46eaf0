//! JSONL session store.
//!
//! Sessions live one JSON object per line, either in a single `.jsonl` file
//! or in several files under a directory. Reading tolerates blank and
//! malformed lines; writing validates the grade before anything touches
//! disk.

use std::io::{BufRead, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use climb_core::error::{ClimbError, Result};
use climb_core::grades::GradeScale;
use climb_core::models::Session;
use tracing::{debug, warn};

/// File name used when the store path is a directory.
pub const DEFAULT_FILE_NAME: &str = "sessions.jsonl";

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.jsonl` files recursively under `data_path`, sorted by path.
pub fn find_jsonl_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every session stored at `data_path`, sorted by date.
///
/// `data_path` may be a single file or a directory scanned for `.jsonl`
/// files. Unreadable files and malformed lines are skipped with a warning.
///
/// Returns [`ClimbError::DataPathNotFound`] when nothing exists at the path.
pub fn load_sessions(data_path: &Path) -> Result<Vec<Session>> {
    if !data_path.exists() {
        return Err(ClimbError::DataPathNotFound(data_path.to_path_buf()));
    }

    let files = if data_path.is_dir() {
        find_jsonl_files(data_path)
    } else {
        vec![data_path.to_path_buf()]
    };

    let mut sessions: Vec<Session> = Vec::new();
    for file_path in &files {
        match read_sessions_file(file_path) {
            Ok(batch) => sessions.extend(batch),
            Err(e) => warn!("{}", e),
        }
    }

    // Stable: same-day sessions keep their file order.
    sessions.sort_by_key(|s| s.date);

    debug!(
        "Loaded {} sessions from {} files",
        sessions.len(),
        files.len()
    );

    Ok(sessions)
}

/// Parse one JSONL file. Malformed lines are logged and skipped.
pub fn read_sessions_file(file_path: &Path) -> Result<Vec<Session>> {
    let file = std::fs::File::open(file_path).map_err(|source| ClimbError::FileRead {
        path: file_path.to_path_buf(),
        source,
    })?;

    let reader = std::io::BufReader::new(file);
    let mut sessions = Vec::new();
    let mut skipped = 0u64;

    for (line_no, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|source| ClimbError::FileRead {
            path: file_path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<Session>(trimmed) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                skipped += 1;
                warn!(
                    "Skipping malformed session at {}:{}: {}",
                    file_path.display(),
                    line_no + 1,
                    e
                );
            }
        }
    }

    debug!(
        "File {}: {} sessions, {} skipped",
        file_path.display(),
        sessions.len(),
        skipped
    );

    Ok(sessions)
}

/// Validate `session` and append it to the store at `data_path`.
///
/// The grade is normalised and checked against the session's discipline;
/// an invalid grade returns [`ClimbError::InvalidGradeFormat`] and nothing
/// is written. A blank grade is stored as absent. Returns the session as
/// stored.
pub fn append_session(data_path: &Path, session: &Session) -> Result<Session> {
    let mut stored = session.clone();
    stored.max_grade = match session.max_grade.as_deref() {
        Some(raw) => {
            let normalized = GradeScale::check(raw, session.discipline)?;
            Some(normalized).filter(|g| !g.is_empty())
        }
        None => None,
    };

    let target = store_file(data_path);
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let line = serde_json::to_string(&stored)?;
    let needs_separator = missing_trailing_newline(&target).map_err(|source| {
        ClimbError::FileRead {
            path: target.clone(),
            source,
        }
    })?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&target)
        .map_err(|source| ClimbError::FileRead {
            path: target.clone(),
            source,
        })?;
    if needs_separator {
        debug!("{} lacks a trailing newline; adding one", target.display());
        writeln!(file)?;
    }
    writeln!(file, "{}", line)?;

    debug!("Appended session for {} to {}", stored.date, target.display());
    Ok(stored)
}

/// The file new sessions are appended to.
pub fn store_file(data_path: &Path) -> PathBuf {
    if data_path.is_dir() {
        data_path.join(DEFAULT_FILE_NAME)
    } else {
        data_path.to_path_buf()
    }
}

/// `true` when `path` is a non-empty file whose last byte is not `\n`.
fn missing_trailing_newline(path: &Path) -> std::io::Result<bool> {
    let mut file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
