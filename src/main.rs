use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use lectern::{AssessmentController, Database, RemoteSink, RunConfig, TieredSink};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config_path = match args.next() {
        Some(path) => PathBuf::from(path),
        None => bail!("usage: lectern <config.json> [report-output.json]"),
    };
    let report_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assessment-report.json"));

    let config = RunConfig::load(&config_path)?;

    let db_path = config
        .database_path
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assessments.db"));
    let db = Database::new(db_path)?;

    let remote = config.remote.as_ref().map(RemoteSink::from_settings);
    if remote.is_none() {
        info!("no remote endpoint configured, snapshots persist locally only");
    }
    let sink = Arc::new(TieredSink::new(db.clone(), remote));

    let controller = AssessmentController::new(db, sink);

    // No capture device wiring in the CLI; the voice producer runs in its
    // simulated fallback mode and says so.
    let session = controller.start(config.request.clone(), None).await?;
    info!(
        "assessment {} running for {} minutes, Ctrl-C stops early",
        session.id, config.request.duration_minutes
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping assessment early");
        }
        _ = wait_for_completion(&controller) => {}
    }

    let report = match controller.last_report().await {
        Some(report) => report,
        None => controller.stop().await.context("failed to stop assessment")?,
    };

    println!("{}", report.render_text());
    report.write_json(&report_path)?;
    info!("report written to {}", report_path.display());

    Ok(())
}

async fn wait_for_completion(controller: &AssessmentController) {
    loop {
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        if controller.last_report().await.is_some() {
            return;
        }
    }
}
