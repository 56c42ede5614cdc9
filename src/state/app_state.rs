//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, OnceCell};
use tracing::{debug, info, warn};

use super::{Cue, Phase, TickOutcome, TimerConfiguration, TimerSnapshot, TimerState};
use crate::{error::TimerError, services::CueBank, services::VoiceMode};

/// What the tick driver should be doing
///
/// `epoch` changes on every successful operation, so a tick captured under an
/// older epoch can be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSignal {
    pub epoch: u64,
    pub running: bool,
}

/// Receiving half of the cue channel, consumed by the cue dispatcher
pub type CueReceiver = mpsc::UnboundedReceiver<Cue>;

#[derive(Debug)]
struct TimerCore {
    timer: TimerState,
    epoch: u64,
}

/// Shared application state: the timer, its notification channels and server metadata
#[derive(Debug)]
pub struct AppState {
    core: Mutex<TimerCore>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Run/stop instructions for the tick driver
    run_tx: watch::Sender<RunSignal>,
    cue_tx: mpsc::UnboundedSender<Cue>,
    /// Voice assets, filled once by the prefetch task and read-only afterwards
    cue_bank: OnceCell<Arc<CueBank>>,
}

impl AppState {
    /// Create an idle AppState and the receiver for the cues it will emit
    pub fn new(port: u16, host: String, config: TimerConfiguration) -> (Self, CueReceiver) {
        let timer = TimerState::new(config);
        let (run_tx, _) = watch::channel(RunSignal { epoch: 0, running: false });
        let (cue_tx, cue_rx) = mpsc::unbounded_channel();

        let state = Self {
            core: Mutex::new(TimerCore { timer, epoch: 0 }),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            run_tx,
            cue_tx,
            cue_bank: OnceCell::new(),
        };
        (state, cue_rx)
    }

    fn lock_core(&self) -> Result<MutexGuard<'_, TimerCore>, TimerError> {
        self.core
            .lock()
            .map_err(|e| TimerError::StatePoisoned(format!("Failed to lock timer state: {}", e)))
    }

    /// Apply an operation to the timer and notify the driver and observers
    ///
    /// Runs under the same lock as [`AppState::apply_tick`], so a tick either
    /// lands before the operation or is rejected by the new epoch.
    pub fn update_timer<F>(&self, action: &str, op: F) -> Result<TimerSnapshot, TimerError>
    where
        F: FnOnce(&mut TimerState) -> Result<TimerSnapshot, TimerError>,
    {
        let mut core = self.lock_core()?;
        let snapshot = op(&mut core.timer)?;
        core.epoch += 1;
        let signal = RunSignal {
            epoch: core.epoch,
            running: core.timer.phase() == Phase::Running,
        };
        self.run_tx.send_replace(signal);
        drop(core);

        debug!(
            "Timer action {} applied, epoch={} running={}",
            action, signal.epoch, signal.running
        );

        // Update last action tracking
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        Ok(snapshot)
    }

    /// Start a session with `config`, or resume a paused one
    pub fn start(&self, config: TimerConfiguration) -> Result<TimerSnapshot, TimerError> {
        info!("Starting timer with {}s interval", config.interval_seconds());
        self.update_timer("start", |timer| timer.start(config))
    }

    /// Start with whatever interval is configured at the moment the lock is taken
    pub fn start_configured(&self) -> Result<TimerSnapshot, TimerError> {
        info!("Starting timer with configured interval");
        self.update_timer("start", |timer| {
            let config = timer.config();
            timer.start(config)
        })
    }

    pub fn pause(&self) -> Result<TimerSnapshot, TimerError> {
        info!("Pausing timer");
        self.update_timer("pause", |timer| timer.pause())
    }

    pub fn resume(&self) -> Result<TimerSnapshot, TimerError> {
        info!("Resuming timer");
        self.update_timer("resume", |timer| timer.resume())
    }

    pub fn toggle(&self) -> Result<TimerSnapshot, TimerError> {
        info!("Toggling timer");
        self.update_timer("toggle", |timer| timer.toggle())
    }

    pub fn reset(&self) -> Result<TimerSnapshot, TimerError> {
        info!("Resetting timer");
        self.update_timer("reset", |timer| Ok(timer.reset()))
    }

    pub fn configure(&self, config: TimerConfiguration) -> Result<TimerSnapshot, TimerError> {
        info!("Configuring timer with {}s interval", config.interval_seconds());
        self.update_timer("configure", |timer| Ok(timer.configure(config)))
    }

    /// Apply one tick captured under `epoch`
    ///
    /// Returns `None` when the tick is stale or the timer is not running.
    pub fn apply_tick(&self, epoch: u64) -> Result<Option<TickOutcome>, TimerError> {
        let mut core = self.lock_core()?;
        if core.epoch != epoch {
            debug!("Dropping stale tick from epoch {} (current {})", epoch, core.epoch);
            return Ok(None);
        }
        if core.timer.phase() != Phase::Running {
            return Ok(None);
        }

        let outcome = core.timer.tick();
        if let Some(cue) = outcome.cue {
            if let Err(e) = self.cue_tx.send(cue) {
                warn!("Failed to forward cue {:?}: {}", cue, e);
            }
        }
        Ok(Some(outcome))
    }

    /// Get current timer snapshot
    pub fn get_snapshot(&self) -> Result<TimerSnapshot, TimerError> {
        Ok(self.lock_core()?.timer.snapshot())
    }

    /// Current run instruction for the tick driver
    pub fn run_signal(&self) -> RunSignal {
        *self.run_tx.borrow()
    }

    /// Subscribe to run/stop instructions
    pub fn subscribe_run(&self) -> watch::Receiver<RunSignal> {
        self.run_tx.subscribe()
    }

    /// Store the prefetched voice assets; only the first call has any effect
    ///
    /// Returns whether `bank` was installed.
    pub fn install_cue_bank(&self, bank: CueBank) -> bool {
        self.cue_bank.set(Arc::new(bank)).is_ok()
    }

    pub fn cue_bank(&self) -> Option<Arc<CueBank>> {
        self.cue_bank.get().cloned()
    }

    /// Whether cues are voiced, partially voiced or tone-only
    pub fn voice_mode(&self) -> VoiceMode {
        self.cue_bank
            .get()
            .map(|bank| bank.voice_mode())
            .unwrap_or(VoiceMode::Pending)
    }

    /// Labels whose voice asset could not be generated
    pub fn failed_voice_labels(&self) -> Vec<String> {
        self.cue_bank
            .get()
            .map(|bank| bank.failed_labels())
            .unwrap_or_default()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(interval: i64) -> (AppState, CueReceiver) {
        AppState::new(0, "127.0.0.1".to_string(), TimerConfiguration::new(interval).unwrap())
    }

    #[test]
    fn ticks_apply_only_under_current_epoch() {
        let (state, _cues) = app(10);
        state.start_configured().unwrap();
        let epoch = state.run_signal().epoch;

        assert!(state.apply_tick(epoch).unwrap().is_some());
        state.pause().unwrap();
        assert!(state.apply_tick(epoch).unwrap().is_none());

        state.resume().unwrap();
        assert!(state.apply_tick(epoch).unwrap().is_none());
        assert_eq!(state.get_snapshot().unwrap().total_elapsed_seconds, 1);
    }

    #[test]
    fn tick_before_reset_never_lands_in_next_session() {
        let (state, _cues) = app(10);
        state.start_configured().unwrap();
        let old_epoch = state.run_signal().epoch;

        state.reset().unwrap();
        state.start_configured().unwrap();
        assert!(state.apply_tick(old_epoch).unwrap().is_none());
        assert_eq!(state.get_snapshot().unwrap().total_elapsed_seconds, 0);
    }

    #[test]
    fn cues_are_forwarded_to_the_dispatcher() {
        let (state, mut cues) = app(3);
        state.start_configured().unwrap();
        let epoch = state.run_signal().epoch;
        for _ in 0..3 {
            state.apply_tick(epoch).unwrap();
        }

        let received: Vec<Cue> = std::iter::from_fn(|| cues.try_recv().ok()).collect();
        assert_eq!(received, vec![Cue::Two, Cue::One, Cue::Next]);
    }

    #[test]
    fn run_signal_follows_phase() {
        let (state, _cues) = app(10);
        assert!(!state.run_signal().running);
        state.start_configured().unwrap();
        assert!(state.run_signal().running);
        state.pause().unwrap();
        assert!(!state.run_signal().running);
    }

    #[test]
    fn rejected_operation_keeps_epoch_and_state() {
        let (state, _cues) = app(10);
        let before = state.run_signal();
        assert!(state.pause().is_err());
        assert_eq!(state.run_signal(), before);
        assert_eq!(state.get_snapshot().unwrap().phase, Phase::Idle);
        assert_eq!(state.get_last_action().0, None);
    }

    #[test]
    fn start_configured_picks_up_interval_set_while_paused() {
        let (state, _cues) = app(10);
        state.start_configured().unwrap();
        state.apply_tick(state.run_signal().epoch).unwrap();
        state.pause().unwrap();

        state.configure(TimerConfiguration::new(45).unwrap()).unwrap();
        let snap = state.start_configured().unwrap();
        assert_eq!(snap.phase, Phase::Running);
        assert_eq!(snap.interval_seconds, 45);
        assert_eq!(snap.total_elapsed_seconds, 0);
        assert_eq!(state.get_last_action().0.as_deref(), Some("start"));
    }

    #[test]
    fn concurrent_configure_and_start_never_mix_intervals() {
        let (state, _cues) = app(10);
        let state = Arc::new(state);
        state.start_configured().unwrap();
        state.pause().unwrap();

        let configure = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || state.configure(TimerConfiguration::new(45).unwrap()))
        };
        let start = {
            let state = Arc::clone(&state);
            std::thread::spawn(move || state.start_configured())
        };
        configure.join().unwrap().unwrap();
        let started = start.join().unwrap();

        // Either start resumed the 10s session before configure reset it, or
        // it ran afterwards and picked up 45s. It never restarts on 10s.
        let snap = state.get_snapshot().unwrap();
        match started {
            Ok(s) if s.interval_seconds == 10 => {
                assert_eq!(snap.phase, Phase::Idle);
                assert_eq!(snap.interval_seconds, 45);
            }
            Ok(s) => {
                assert_eq!(s.interval_seconds, 45);
                assert_eq!(snap.phase, Phase::Running);
                assert_eq!(snap.interval_seconds, 45);
            }
            Err(e) => panic!("start failed: {}", e),
        }
    }

    #[test]
    fn cue_bank_installs_only_once() {
        let (state, _cues) = app(10);
        assert!(state.install_cue_bank(CueBank::default()));
        assert!(!state.install_cue_bank(CueBank::default()));
        assert_eq!(state.voice_mode(), VoiceMode::Tones);
    }

    #[test]
    fn voice_mode_is_pending_until_bank_installed() {
        let (state, _cues) = app(10);
        assert_eq!(state.voice_mode(), VoiceMode::Pending);
        assert!(state.failed_voice_labels().is_empty());
    }
}
