use std::path::Path;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use fitgoal::config::IntakeConfig;
use fitgoal::onboarding::{IntakeRouteState, onboarding_routes};
use fitgoal::store::LibSqlBackend;

/// Install the stderr subscriber, plus a daily log file when `log_dir` is set.
/// The returned guard must live as long as the process.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer().with_target(false);

    match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "fitgoal.log"));
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = IntakeConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let _log_guard = init_tracing(config.log_dir.as_deref());

    eprintln!("🏋️ FitGoal v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Intake API: http://0.0.0.0:{}/api/onboarding", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let backend = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Intake ───────────────────────────────────────────────────────────
    let state = IntakeRouteState::load(backend.clone(), backend, &config.user_id).await?;
    {
        let wizard = state.wizard.read().await;
        eprintln!(
            "   Resuming at step {} of {}\n",
            wizard.current_step().ordinal(),
            fitgoal::onboarding::state::TOTAL_STEPS
        );
    }

    let app = onboarding_routes(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, user_id = %config.user_id, "Intake server started");
    axum::serve(listener, app).await?;

    Ok(())
}
