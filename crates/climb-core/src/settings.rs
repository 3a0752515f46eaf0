use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::Discipline;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Climbing session log and training statistics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "climb-log",
    about = "Climbing session log and training statistics",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Session store: a .jsonl file, or a directory of .jsonl files
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Only include sessions of this climber
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// First date of the statistics window (YYYY-MM-DD, inclusive)
    #[arg(long, global = true, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Last date of the statistics window (YYYY-MM-DD, inclusive)
    #[arg(long, global = true, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Heatmap year (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Timezone used to determine "today" (auto-detected if not specified)
    #[arg(long, default_value = "auto", global = true)]
    pub timezone: String,

    /// Statistics view
    #[arg(long, default_value = "summary", value_parser = ["summary", "monthly", "quarterly", "yearly", "heatmap", "grades", "locations", "all"])]
    pub view: String,

    /// How sessions are grouped by location
    #[arg(long, default_value = "gym", value_parser = ["gym", "gym-country"])]
    pub location_key: String,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", global = true, value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

/// Subcommands; `stats` runs when none is given.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print statistics over the recorded sessions
    Stats,
    /// Validate and append a new session to the store
    Record(RecordArgs),
    /// Write the stored sessions (after --user/--from/--to) to a file or stdout
    Export(ExportArgs),
}

/// Destination and encoding of an export.
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Output file (stdout if omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Export encoding
    #[arg(long, default_value = "jsonl", value_parser = ["jsonl", "json"])]
    pub export_format: String,
}

/// Fields of a new session entered on the command line.
#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    /// Session date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Discipline: boulder_indoor, top_rope, lead, outdoor
    #[arg(long, value_parser = parse_discipline_arg)]
    pub discipline: Discipline,

    /// Routes or problems completed
    #[arg(long, default_value = "0")]
    pub routes: u32,

    /// Hardest grade sent (V-scale for bouldering, 5.x for roped)
    #[arg(long)]
    pub grade: Option<String>,

    #[arg(long, default_value = "")]
    pub country: String,

    #[arg(long, default_value = "")]
    pub city: String,

    #[arg(long, default_value = "")]
    pub gym: String,

    /// Free-text note
    #[arg(long)]
    pub note: Option<String>,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    crate::time_utils::parse_date(s).map_err(|e| e.to_string())
}

fn parse_discipline_arg(s: &str) -> Result<Discipline, String> {
    s.parse::<Discipline>().map_err(|e| e.to_string())
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.climb-log/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".climb-log").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. The statistics window (--from/--to/--year) is
        // per-invocation and never persisted.
        if !is_arg_explicitly_set(&matches, "data_file") && settings.data_file.is_none() {
            settings.data_file = last.data_file;
        }
        if !is_arg_explicitly_set(&matches, "user") && settings.user.is_none() {
            settings.user = last.user;
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        // NOTE: clap stores the arg id using the field name (underscores).
        if !is_arg_explicitly_set(&matches, "location_key") {
            if let Some(v) = last.location_key {
                settings.location_key = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        // Unknown zones are not persisted.
        if !crate::time_utils::validate_timezone(&settings.timezone) {
            settings.timezone = "UTC".to_string();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// The command to run, defaulting to `stats`.
    pub fn effective_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Stats)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_file: s.data_file.clone(),
            user: s.user.clone(),
            timezone: Some(s.timezone.clone()),
            view: Some(s.view.clone()),
            location_key: Some(s.location_key.clone()),
            format: Some(s.format.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
