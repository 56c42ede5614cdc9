//! Cue dispatch background task

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    services::SoundPlayer,
    state::{AppState, CueReceiver},
};

/// Background task that plays every cue emitted by the timer
///
/// Runs apart from the tick path so slow playback never delays a tick. Each
/// cue is played on the blocking pool, since audio outputs may block until
/// the sound finishes; cues are still played one at a time, in order. Cues
/// without a prefetched voice asset are played as tones by the player.
pub async fn cue_dispatch_task(state: Arc<AppState>, mut cues: CueReceiver, player: SoundPlayer) {
    info!("Starting cue dispatch task");

    let player = Arc::new(player);

    while let Some(cue) = cues.recv().await {
        let bank = state.cue_bank();
        let player = Arc::clone(&player);

        let playback = tokio::task::spawn_blocking(move || {
            let asset = bank.as_deref().and_then(|bank| bank.asset(cue));
            debug!("Dispatching cue {:?} (voiced={})", cue.label(), asset.is_some());
            player.play(cue, asset);
        });

        if let Err(e) = playback.await {
            warn!("Playback of cue {:?} did not complete: {}", cue.label(), e);
        }
    }

    info!("Cue channel closed, cue dispatch task finished");
}
