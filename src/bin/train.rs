use anyhow::Context;
use tracing_subscriber::EnvFilter;

use race_predictor::{config::Config, dataset::RaceHistory, trainer};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env().context("failed to read configuration")?;

    let (history, report) = RaceHistory::load(&cfg.data_path, cfg.row_policy)
        .with_context(|| format!("failed to load history {}", cfg.data_path.display()))?;
    if report.skipped > 0 {
        tracing::warn!("{} of {} history rows skipped", report.skipped, report.rows_read);
    }

    let (artifact, fit) = trainer::train(&history).context("training failed")?;
    tracing::info!(
        "fitted {} features on {} rows; in-sample r2={:.4} rmse={:.4}",
        fit.n_features,
        fit.n_samples,
        fit.r_squared,
        fit.rmse
    );
    tracing::info!("model uses features: {:?}", artifact.feature_names);

    artifact
        .save(&cfg.model_path)
        .with_context(|| format!("failed to write {}", cfg.model_path.display()))?;
    tracing::info!("model saved to {}", cfg.model_path.display());
    Ok(())
}
