mod bootstrap;
mod render;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Datelike;
use climb_core::error::ClimbError;
use climb_core::models::Session;
use climb_core::settings::{Command, ExportArgs, RecordArgs, Settings};
use climb_core::time_utils::today_in;
use climb_data::aggregator::LocationKey;
use climb_data::analysis::{build_report, ReportOptions};
use climb_data::export::{export_sessions, ExportFormat};
use climb_data::filters::SessionFilter;
use climb_data::reader::{append_session, load_sessions};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Climb Log v{} starting", env!("CARGO_PKG_VERSION"));

    let data_path = bootstrap::resolve_data_path(settings.data_file.as_deref());
    tracing::debug!("Session store: {}", data_path.display());

    match settings.effective_command() {
        Command::Stats => run_stats(&settings, &data_path),
        Command::Record(args) => run_record(&settings, &args, &data_path),
        Command::Export(args) => run_export(&settings, &args, &data_path),
    }
}

fn run_record(settings: &Settings, args: &RecordArgs, data_path: &Path) -> Result<()> {
    let date = args.date.unwrap_or_else(|| today_in(&settings.timezone));
    let user = settings.user.clone().unwrap_or_default();

    let mut session = Session::new(user, date, args.discipline, args.routes).with_location(
        args.country.trim(),
        args.city.trim(),
        args.gym.trim(),
    );
    if let Some(grade) = &args.grade {
        session = session.with_grade(grade.as_str());
    }
    if let Some(note) = args.note.as_deref().filter(|n| !n.trim().is_empty()) {
        session = session.with_note(note.trim());
    }

    match append_session(data_path, &session) {
        Ok(stored) => {
            let grade = stored.max_grade.as_deref().unwrap_or("-");
            println!(
                "Recorded {} {} session: {} routes, max grade {}",
                stored.date, stored.discipline, stored.route_count, grade
            );
            Ok(())
        }
        Err(e) if e.is_user_correctable() => {
            tracing::warn!("Session rejected: {}", e);
            eprintln!("{}", e);
            std::process::exit(2);
        }
        Err(e) => Err(e).with_context(|| format!("appending to {}", data_path.display())),
    }
}

fn run_stats(settings: &Settings, data_path: &Path) -> Result<()> {
    let sessions = load_store(data_path)?;

    let reference_date = today_in(&settings.timezone);
    let location_key: LocationKey = settings.location_key.parse()?;

    let options = ReportOptions {
        filter: session_filter(settings),
        year: settings.year.unwrap_or_else(|| reference_date.year()),
        reference_date,
        location_key,
    };
    tracing::info!(
        "View: {}, year: {}, location key: {}",
        settings.view,
        options.year,
        settings.location_key
    );

    let report = build_report(&sessions, &options)?;

    if settings.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_view(&report, &settings.view)?);
    }

    Ok(())
}

fn run_export(settings: &Settings, args: &ExportArgs, data_path: &Path) -> Result<()> {
    let sessions = load_store(data_path)?;
    let format: ExportFormat = args.export_format.parse()?;
    let filter = session_filter(settings);

    let written = match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let mut writer = std::io::BufWriter::new(file);
            let written = export_sessions(&sessions, &filter, format, &mut writer)?;
            eprintln!("Exported {} sessions to {}", written, path.display());
            written
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            export_sessions(&sessions, &filter, format, &mut writer)?
        }
    };

    tracing::info!("Export finished: {} sessions", written);
    Ok(())
}

/// Load the store, treating a missing store as empty.
fn load_store(data_path: &Path) -> Result<Vec<Session>> {
    match load_sessions(data_path) {
        Ok(sessions) => Ok(sessions),
        Err(ClimbError::DataPathNotFound(path)) => {
            tracing::warn!("No sessions recorded yet at {}", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

fn session_filter(settings: &Settings) -> SessionFilter {
    SessionFilter {
        user: settings.user.clone().filter(|u| !u.trim().is_empty()),
        from: settings.from,
        to: settings.to,
    }
}
