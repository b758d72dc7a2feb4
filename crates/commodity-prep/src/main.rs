mod bootstrap;

use anyhow::Result;
use prep_core::settings::{PathsConfig, Settings};
use prep_data::pipeline::{run_join, run_prices, run_rename};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    let paths = PathsConfig::from_settings(&settings);

    bootstrap::ensure_directories(&paths)?;
    bootstrap::configure_previews();
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Commodity Prep v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Job: {}, Reports: {}, Prices: {}, Processed: {}",
        settings.job,
        paths.reports_dir.display(),
        paths.prices_dir.display(),
        paths.processed_dir.display()
    );

    // Validate before any job touches the filesystem.
    let start = settings.start_date()?;

    match settings.job.as_str() {
        "rename" => {
            run_rename(&paths, &settings.prefix)?;
        }
        "prices" => {
            run_prices(&paths, start, settings.preview_rows)?;
        }
        "join" => {
            run_join(&paths, settings.preview_rows)?;
        }
        "all" => {
            run_rename(&paths, &settings.prefix)?;
            run_prices(&paths, start, settings.preview_rows)?;
            run_join(&paths, settings.preview_rows)?;
        }
        unknown => {
            anyhow::bail!("Unknown job: {}", unknown);
        }
    }

    tracing::info!("Done.");
    Ok(())
}
