//! Interval Coach - a headless interval-workout timer server
//! 
//! This is the main entry point for the interval-coach application.

use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;

use interval_coach::{
    api::create_router,
    clock::IntervalTicker,
    config::Config,
    services::{voice_provider, LogOutput, SoundPlayer},
    state::AppState,
    tasks::{cue_dispatch_task, tick_driver_task, voice_prefetch_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("interval_coach={},tower_http=info", config.log_level()))
        .init();

    info!("Starting interval-coach server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, interval={}s",
          config.host, config.port, config.interval);

    let timer_config = config.timer_configuration()?;

    // A broken voice setup only costs the voice; cues still play as tones
    let provider = voice_provider(config.voice_config());

    // Create application state
    let (state, cues) = AppState::new(config.port, config.host.clone(), timer_config);
    let state = Arc::new(state);

    // Start the background tasks
    let ticker = IntervalTicker::new(Duration::from_secs(1));
    let player = SoundPlayer::new(Arc::new(LogOutput));
    tokio::spawn(tick_driver_task(Arc::clone(&state), ticker));
    tokio::spawn(cue_dispatch_task(Arc::clone(&state), cues, player));
    tokio::spawn(voice_prefetch_task(Arc::clone(&state), provider));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start      - Start a session or resume a paused one");
    info!("  POST /pause      - Pause the running session");
    info!("  POST /resume     - Resume the paused session");
    info!("  POST /toggle     - Start, pause or resume");
    info!("  POST /reset      - Reset to idle");
    info!("  POST /configure  - Set the interval duration");
    info!("  GET  /status     - Current timer and cue status");
    info!("  GET  /health     - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
