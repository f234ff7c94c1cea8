use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use race_predictor::{config::Config, predictor::PredictorContext, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ---------- Logging ----------

    // RUST_LOG=debug shows per-request feature diagnostics
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ---------- Startup state ----------

    let cfg = Config::from_env().context("failed to read configuration")?;

    // Nothing is served unless both the model and the history load.
    let (ctx, report) = PredictorContext::load(&cfg).with_context(|| {
        format!(
            "failed to load model {} / history {}",
            cfg.model_path.display(),
            cfg.data_path.display()
        )
    })?;
    if report.skipped > 0 {
        tracing::warn!("{} of {} history rows skipped", report.skipped, report.rows_read);
    }
    tracing::info!(
        "loaded model; feature_names[{}]: {:?}",
        ctx.artifact().feature_names.len(),
        &ctx.artifact().feature_names
    );

    // ---------- Serve ----------

    let app = server::router(Arc::new(ctx));

    let addr = cfg.bind_addr;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
