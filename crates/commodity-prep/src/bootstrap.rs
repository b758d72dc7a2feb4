use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use prep_core::formatting::FMT_MAX_COLS_VAR;
use prep_core::settings::PathsConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the directories every job may write into exist.
///
/// Creates (including any missing parents):
/// - `~/.commodity-prep/` for the persisted last-used parameters
/// - the processed-data directory of `paths`
pub fn ensure_directories(paths: &PathsConfig) -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(home.join(".commodity-prep"))?;
    std::fs::create_dir_all(&paths.processed_dir)?;
    Ok(())
}

// ── Preview bootstrap ──────────────────────────────────────────────────────────

/// Show every column in logged frame previews unless the user already chose
/// a limit through the environment.
pub fn configure_previews() {
    if std::env::var_os(FMT_MAX_COLS_VAR).is_none() {
        std::env::set_var(FMT_MAX_COLS_VAR, "-1");
    }
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a level name (`DEBUG`, `INFO`, `WARNING`, `ERROR`, `CRITICAL`) to an
/// [`EnvFilter`] directive. Unknown names are passed through as-is.
fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Falls back to `"info"` if the level string is not recognised. With a
/// `log_file` the output is appended to that file (without ANSI colours)
/// instead of going to stderr.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init();
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init();
        }
    }

    Ok(())
}

fn open_log_file(path: &Path) -> anyhow::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── test_ensure_directories ───────────────────────────────────────────────

    #[test]
    fn test_ensure_directories() {
        let tmp = TempDir::new().expect("tempdir");
        let paths = PathsConfig::from_base(&tmp.path().join("project"));

        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", tmp.path());

        let result = ensure_directories(&paths);

        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }

        result.expect("ensure_directories should succeed");

        assert!(tmp.path().join(".commodity-prep").is_dir());
        assert!(paths.processed_dir.is_dir(), "processed dir must exist");
        assert!(
            !paths.reports_dir.exists(),
            "input dirs are never created"
        );
    }

    // ── configure_previews ────────────────────────────────────────────────────

    #[test]
    fn test_configure_previews_keeps_user_choice() {
        std::env::set_var(FMT_MAX_COLS_VAR, "4");
        configure_previews();
        assert_eq!(std::env::var(FMT_MAX_COLS_VAR).unwrap(), "4");

        std::env::remove_var(FMT_MAX_COLS_VAR);
        configure_previews();
        assert_eq!(std::env::var(FMT_MAX_COLS_VAR).unwrap(), "-1");
    }

    // ── filter_directive ──────────────────────────────────────────────────────

    #[test]
    fn test_filter_directive_maps_level_names() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("info"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("ERROR"), "error");
        assert_eq!(filter_directive("CRITICAL"), "error");
        assert_eq!(filter_directive("prep_data=trace"), "prep_data=trace");
    }

    // ── open_log_file ─────────────────────────────────────────────────────────

    #[test]
    fn test_open_log_file_appends_and_creates_parent() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("logs").join("prep.log");

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "first\n").unwrap();

        {
            use std::io::Write;
            let mut file = open_log_file(&path).expect("open log file");
            file.write_all(b"second\n").unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");

        let nested = tmp.path().join("a").join("b").join("prep.log");
        open_log_file(&nested).expect("creates parents");
        assert!(nested.exists());
    }
}
