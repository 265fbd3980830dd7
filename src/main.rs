//! Countdown Timer - a countdown state machine with an HTTP control surface
//!
//! This is the main entry point for the countdown-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use countdown_timer::{
    api::create_router,
    config::Config,
    state::{AppState, TimerController},
    tasks::{finished_notifier_task, TokioScheduler},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, duration={}s, tick={}ms",
          config.host, config.port, config.duration, config.tick_ms);

    // Create the countdown session
    let scheduler = Arc::new(TokioScheduler::try_current()?);
    let controller = TimerController::with_options(scheduler, config.duration_ms(), config.tick_period());
    let state = Arc::new(AppState::new(controller, config.port, config.host.clone()));

    // Announce finished countdowns in the background
    tokio::spawn(finished_notifier_task(Arc::clone(&state)));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /countdown        - Set duration in ms ({{\"ms\": 5000}})");
    info!("  POST /preset/:seconds  - Set a preset duration (5, 30, 60, 100)");
    info!("  POST /start            - Start or resume the countdown");
    info!("  POST /pause            - Pause the countdown");
    info!("  POST /stop             - Stop the countdown silently");
    info!("  POST /toggle           - Start/pause button");
    info!("  POST /edit/enter       - Enter edit mode");
    info!("  POST /edit/exit        - Exit edit mode");
    info!("  POST /edit/toggle      - Edit button");
    info!("  GET  /status           - Current timer state");
    info!("  GET  /presets          - Preset durations");
    info!("  GET  /events           - Finished events (SSE)");
    info!("  GET  /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to listen for shutdown signals: {}", e),
            }
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
