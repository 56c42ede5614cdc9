//! Voice prefetch background task

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    services::{prefetch_cues, VoiceCueProvider},
    state::{AppState, Cue},
};

/// Background task that fetches all voice cues once, when the first session starts
///
/// Until the bank is installed every cue plays as a tone.
pub async fn voice_prefetch_task(state: Arc<AppState>, provider: Arc<dyn VoiceCueProvider>) {
    let mut run_rx = state.subscribe_run();

    while !run_rx.borrow_and_update().running {
        if run_rx.changed().await.is_err() {
            debug!("Run signal closed before first start, skipping voice prefetch");
            return;
        }
    }

    info!("First session started, fetching voice cues");
    let bank = prefetch_cues(provider.as_ref(), &Cue::ALL).await;
    if state.install_cue_bank(bank) {
        info!(
            "Voice cues installed: mode={:?} failed={:?}",
            state.voice_mode(),
            state.failed_voice_labels()
        );
    } else {
        warn!("Cue bank already installed, discarding second prefetch");
    }
}
