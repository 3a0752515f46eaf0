use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// The application directory, `~/.climb-log/`.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".climb-log")
}

/// Ensure `~/.climb-log/` exists.
pub fn ensure_directories() -> anyhow::Result<()> {
    std::fs::create_dir_all(app_dir())?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI log-level name onto an `EnvFilter` directive.
///
/// Unrecognised names are passed through so that full directives such as
/// `climb_data=debug` also work.
pub fn log_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" | "CRITICAL" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr, and additionally to `log_file` when given.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(log_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Session store used when `--data-file` is not given.
pub fn default_data_path() -> PathBuf {
    app_dir().join("sessions.jsonl")
}

/// Resolve the store path, preferring an explicit one.
pub fn resolve_data_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(default_data_path)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_directive_mapping() {
        assert_eq!(log_directive("DEBUG"), "debug");
        assert_eq!(log_directive("critical"), "debug");
        assert_eq!(log_directive("INFO"), "info");
        assert_eq!(log_directive("WARNING"), "warn");
        assert_eq!(log_directive("ERROR"), "error");
        assert_eq!(log_directive("climb_data=trace"), "climb_data=trace");
    }

    #[test]
    fn test_resolve_data_path_prefers_explicit() {
        let explicit = PathBuf::from("/data/mine.jsonl");
        assert_eq!(resolve_data_path(Some(&explicit)), explicit);
    }

    #[test]
    fn test_ensure_directories_and_default_path() {
        let tmp = TempDir::new().expect("tempdir");

        // Override HOME so that dirs::home_dir() resolves to our temp dir.
        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", tmp.path());

        let result = ensure_directories();
        let default_path = resolve_data_path(None);

        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }

        result.expect("ensure_directories should succeed");
        assert!(tmp.path().join(".climb-log").is_dir());
        assert_eq!(
            default_path,
            tmp.path().join(".climb-log").join("sessions.jsonl")
        );
    }
}
