//! Tick driver background task

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{clock::TickSource, state::AppState};

/// Background task that feeds ticks to the timer while it is running
///
/// Each run is tagged with the epoch from the run signal. Ticks from `source`
/// are applied under that epoch, so anything arriving after a pause, reset or
/// restart is rejected by [`AppState::apply_tick`].
pub async fn tick_driver_task<S: TickSource>(state: Arc<AppState>, mut source: S) {
    info!("Starting tick driver task");

    let mut run_rx = state.subscribe_run();

    loop {
        let signal = *run_rx.borrow_and_update();

        if !signal.running {
            debug!("Timer not running (epoch {}), waiting", signal.epoch);
            if run_rx.changed().await.is_err() {
                break;
            }
            continue;
        }

        debug!("Timer running, ticking under epoch {}", signal.epoch);
        source.restart();

        loop {
            tokio::select! {
                _ = source.tick() => {
                    match state.apply_tick(signal.epoch) {
                        Ok(Some(outcome)) => {
                            debug!(
                                "Tick: elapsed={} cycle={} remaining={} cue={:?}",
                                outcome.snapshot.total_elapsed_seconds,
                                outcome.snapshot.cycle_count,
                                outcome.snapshot.time_remaining_in_interval,
                                outcome.cue
                            );
                        }
                        Ok(None) => {
                            debug!("Tick suppressed for epoch {}", signal.epoch);
                        }
                        Err(e) => {
                            error!("Failed to apply tick: {}", e);
                        }
                    }
                }

                // Run signal changed - stop this run and re-evaluate
                changed = run_rx.changed() => {
                    if changed.is_err() {
                        info!("Run signal closed, stopping tick driver");
                        return;
                    }
                    break;
                }
            }
        }
    }

    info!("Tick driver task finished");
}
