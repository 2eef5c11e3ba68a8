use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use afreeca_rec::cli::Args;
use afreeca_rec::config::AppConfig;
use afreeca_rec::logging::{self, LOG_RETENTION_DAYS};
use afreeca_rec::recorder::StreamlinkRecorder;
use afreeca_rec::session::AfreecaSessionManager;
use afreeca_rec::status::AfreecaStatusResolver;
use afreeca_rec::supervisor::Supervisor;
use afreeca_rec::utils::http_client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }

    let config = AppConfig::from_env(args.config.as_deref());
    let log_dir = config.as_ref().ok().and_then(|c| c.log_dir.clone());
    let _guard = logging::init_logging(args.verbose, args.quiet, log_dir.as_deref())?;

    info!("Program started");

    if let Some(dir) = &log_dir {
        if let Err(e) = logging::cleanup_old_logs(dir, LOG_RETENTION_DAYS).await {
            warn!(error = %e, "Failed to clean up old log files");
        }
    }

    // Startup errors are reported once, by the exit error from `main`.
    let mut config =
        config.map_err(|e| anyhow::Error::new(e).context("failed to load configuration"))?;
    if let Some(output_dir) = args.output_dir.clone() {
        config.output_dir = output_dir;
    }

    let channel = match args.resolve_channel() {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            info!("No streamer nickname given, exiting");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        channel = %channel,
        user = %config.credentials.username(),
        retry_interval_secs = config.retry_interval.as_secs(),
        output_dir = %config.output_dir.display(),
        streamlink = %config.streamlink.binary_path,
        quality = %config.streamlink.quality,
        "Configuration loaded"
    );

    let client = http_client::build_platform_client(config.http_timeout);
    let sessions = Arc::new(AfreecaSessionManager::new(
        client.clone(),
        config.endpoints.login_url.clone(),
    ));
    let resolver = Arc::new(AfreecaStatusResolver::new(
        client,
        config.endpoints.live_api_url.clone(),
        config.endpoints.playlist_url.clone(),
    ));
    let recorder = Arc::new(StreamlinkRecorder::new(
        config.streamlink.clone(),
        config.credentials.clone(),
        config.output_dir.clone(),
    ));

    let mut supervisor = Supervisor::new(
        channel,
        config.credentials.clone(),
        config.retry_interval,
        resolver,
        sessions,
        recorder,
    );

    tokio::select! {
        _ = supervisor.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Program stopped");
        }
    }

    Ok(())
}
