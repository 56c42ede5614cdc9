//! Interval timer state machine
//!
//! Owns the elapsed counters and cycle count. Each call to [`TimerState::tick`]
//! advances one second, recomputes the position within the current interval and
//! reports the countdown cue for that second, if any.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::cue::Cue;
use crate::error::TimerError;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Paused => "paused",
        })
    }
}

/// Duration of one work/rest interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerConfiguration {
    interval_seconds: u64,
}

impl TimerConfiguration {
    /// Validate an interval; anything below one second is rejected
    pub fn new(interval_seconds: i64) -> Result<Self, TimerError> {
        if interval_seconds < 1 {
            return Err(TimerError::InvalidInterval(interval_seconds));
        }
        Ok(Self {
            interval_seconds: interval_seconds as u64,
        })
    }

    pub fn interval_seconds(&self) -> u64 {
        self.interval_seconds
    }
}

/// Values surfaced to the presentation layer after every operation and tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub interval_seconds: u64,
    pub total_elapsed_seconds: u64,
    pub current_interval_elapsed: u64,
    pub cycle_count: u64,
    pub time_remaining_in_interval: u64,
    pub percentage_complete: f64,
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub snapshot: TimerSnapshot,
    pub cue: Option<Cue>,
}

/// Position within the interval, with a zero remainder after at least one
/// full interval normalized to `interval` ("just completed").
pub fn effective_time_in_cycle(total_elapsed_seconds: u64, interval_seconds: u64) -> u64 {
    let time_in_cycle = total_elapsed_seconds % interval_seconds;
    if time_in_cycle == 0 && total_elapsed_seconds > 0 {
        interval_seconds
    } else {
        time_in_cycle
    }
}

/// Interval timer state
#[derive(Debug, Clone)]
pub struct TimerState {
    config: TimerConfiguration,
    total_elapsed_seconds: u64,
    cycle_count: u64,
    phase: Phase,
    current_interval_elapsed: u64,
}

impl TimerState {
    /// Create an idle timer with the given configuration
    pub fn new(config: TimerConfiguration) -> Self {
        Self {
            config,
            total_elapsed_seconds: 0,
            cycle_count: 1,
            phase: Phase::Idle,
            current_interval_elapsed: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> TimerConfiguration {
        self.config
    }

    pub fn total_elapsed_seconds(&self) -> u64 {
        self.total_elapsed_seconds
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Start a session, or resume one that is paused
    pub fn start(&mut self, config: TimerConfiguration) -> Result<TimerSnapshot, TimerError> {
        match self.phase {
            Phase::Idle => {
                self.config = config;
                self.clear_counters();
                self.phase = Phase::Running;
                Ok(self.snapshot())
            }
            Phase::Paused => {
                if config != self.config {
                    return Err(TimerError::IntervalMismatch {
                        current: self.config.interval_seconds,
                        requested: config.interval_seconds,
                    });
                }
                self.resume()
            }
            Phase::Running => Err(TimerError::InvalidTransition {
                action: "start",
                phase: self.phase,
            }),
        }
    }

    pub fn pause(&mut self) -> Result<TimerSnapshot, TimerError> {
        if self.phase != Phase::Running {
            return Err(TimerError::InvalidTransition {
                action: "pause",
                phase: self.phase,
            });
        }
        self.phase = Phase::Paused;
        Ok(self.snapshot())
    }

    pub fn resume(&mut self) -> Result<TimerSnapshot, TimerError> {
        if self.phase != Phase::Paused {
            return Err(TimerError::InvalidTransition {
                action: "resume",
                phase: self.phase,
            });
        }
        self.phase = Phase::Running;
        Ok(self.snapshot())
    }

    /// Single start/pause button: pause when running, resume when paused,
    /// start with the stored configuration when idle
    pub fn toggle(&mut self) -> Result<TimerSnapshot, TimerError> {
        match self.phase {
            Phase::Running => self.pause(),
            Phase::Paused => self.resume(),
            Phase::Idle => self.start(self.config),
        }
    }

    /// Return to idle with counters cleared; the configuration is kept
    pub fn reset(&mut self) -> TimerSnapshot {
        self.phase = Phase::Idle;
        self.clear_counters();
        self.snapshot()
    }

    /// Replace the interval; any session in progress is reset
    pub fn configure(&mut self, config: TimerConfiguration) -> TimerSnapshot {
        self.config = config;
        self.reset()
    }

    /// Advance one second. Does nothing unless the timer is running.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Running {
            return TickOutcome {
                snapshot: self.snapshot(),
                cue: None,
            };
        }

        let interval = self.config.interval_seconds;
        self.total_elapsed_seconds += 1;
        let effective = effective_time_in_cycle(self.total_elapsed_seconds, interval);
        let time_remaining = interval - effective;

        let cue = Cue::from_remaining(time_remaining);
        if time_remaining == 0 {
            self.cycle_count += 1;
        }
        self.current_interval_elapsed = if effective == interval { 0 } else { effective };

        TickOutcome {
            snapshot: self.snapshot(),
            cue,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let interval = self.config.interval_seconds;
        let effective = effective_time_in_cycle(self.total_elapsed_seconds, interval);
        let remaining_in_interval = interval - self.current_interval_elapsed;

        TimerSnapshot {
            phase: self.phase,
            interval_seconds: interval,
            total_elapsed_seconds: self.total_elapsed_seconds,
            current_interval_elapsed: self.current_interval_elapsed,
            cycle_count: self.cycle_count,
            time_remaining_in_interval: interval - effective,
            percentage_complete: remaining_in_interval as f64 / interval as f64 * 100.0,
        }
    }

    fn clear_counters(&mut self) {
        self.total_elapsed_seconds = 0;
        self.cycle_count = 1;
        self.current_interval_elapsed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seconds: i64) -> TimerConfiguration {
        TimerConfiguration::new(seconds).unwrap()
    }

    fn running(seconds: i64) -> TimerState {
        let mut timer = TimerState::new(config(seconds));
        timer.start(config(seconds)).unwrap();
        timer
    }

    fn advance(timer: &mut TimerState, ticks: usize) -> Vec<Option<Cue>> {
        (0..ticks).map(|_| timer.tick().cue).collect()
    }

    #[test]
    fn effective_time_stays_within_interval() {
        for interval in 1..=12u64 {
            for total in 0..=interval * 4 {
                let effective = effective_time_in_cycle(total, interval);
                assert!(effective <= interval, "interval={} total={}", interval, total);
            }
        }
    }

    #[test]
    fn boundary_remainder_means_just_completed() {
        assert_eq!(effective_time_in_cycle(0, 10), 0);
        assert_eq!(effective_time_in_cycle(10, 10), 10);
        assert_eq!(effective_time_in_cycle(20, 10), 10);
        assert_eq!(effective_time_in_cycle(21, 10), 1);
    }

    #[test]
    fn zero_or_negative_interval_is_rejected() {
        assert_eq!(TimerConfiguration::new(0), Err(TimerError::InvalidInterval(0)));
        assert_eq!(TimerConfiguration::new(-3), Err(TimerError::InvalidInterval(-3)));
    }

    #[test]
    fn start_initializes_a_running_session() {
        let timer = running(30);
        let snap = timer.snapshot();
        assert_eq!(snap.phase, Phase::Running);
        assert_eq!(snap.total_elapsed_seconds, 0);
        assert_eq!(snap.cycle_count, 1);
        assert_eq!(snap.time_remaining_in_interval, 30);
        assert_eq!(snap.percentage_complete, 100.0);
    }

    #[test]
    fn five_cue_fires_once_after_five_ticks() {
        let mut timer = running(10);
        let cues = advance(&mut timer, 5);
        assert_eq!(cues, vec![None, None, None, None, Some(Cue::Five)]);
        assert_eq!(timer.snapshot().time_remaining_in_interval, 5);
    }

    #[test]
    fn boundary_advances_cycle_and_resets_display() {
        let mut timer = running(10);
        let cues = advance(&mut timer, 10);
        assert_eq!(
            cues[4..].to_vec(),
            Cue::ALL.iter().copied().map(Some).collect::<Vec<_>>()
        );

        let snap = timer.snapshot();
        assert_eq!(snap.time_remaining_in_interval, 0);
        assert_eq!(snap.cycle_count, 2);
        assert_eq!(snap.current_interval_elapsed, 0);
        assert_eq!(snap.percentage_complete, 100.0);
    }

    #[test]
    fn short_interval_advances_every_third_tick() {
        let mut timer = running(3);
        let mut cycles = Vec::new();
        for _ in 0..9 {
            cycles.push(timer.tick().snapshot.cycle_count);
        }
        assert_eq!(cycles, vec![1, 1, 2, 2, 2, 3, 3, 3, 4]);
    }

    #[test]
    fn cycle_count_only_moves_on_multiples_of_interval() {
        for interval in 1..=7u64 {
            let mut timer = running(interval as i64);
            let mut previous = 1;
            for tick in 1..=interval * 5 {
                let count = timer.tick().snapshot.cycle_count;
                let expected = if tick % interval == 0 { previous + 1 } else { previous };
                assert_eq!(count, expected, "interval={} tick={}", interval, tick);
                previous = count;
            }
        }
    }

    #[test]
    fn each_threshold_fires_once_per_interval() {
        let mut timer = running(8);
        let cues: Vec<Cue> = advance(&mut timer, 8 * 3).into_iter().flatten().collect();
        for cue in Cue::ALL {
            assert_eq!(cues.iter().filter(|c| **c == cue).count(), 3, "{:?}", cue);
        }
    }

    #[test]
    fn one_second_interval_fires_next_every_tick() {
        let mut timer = running(1);
        assert_eq!(advance(&mut timer, 3), vec![Some(Cue::Next); 3]);
        assert_eq!(timer.cycle_count(), 4);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut timer = running(10);
        advance(&mut timer, 4);
        timer.pause().unwrap();

        let frozen = timer.tick();
        assert_eq!(frozen.cue, None);
        assert_eq!(frozen.snapshot.total_elapsed_seconds, 4);

        timer.resume().unwrap();
        assert_eq!(timer.total_elapsed_seconds(), 4);
        assert_eq!(timer.tick().snapshot.total_elapsed_seconds, 5);
    }

    #[test]
    fn start_while_paused_resumes_without_clearing() {
        let mut timer = running(10);
        advance(&mut timer, 4);
        timer.pause().unwrap();

        let snap = timer.start(config(10)).unwrap();
        assert_eq!(snap.phase, Phase::Running);
        assert_eq!(snap.total_elapsed_seconds, 4);
    }

    #[test]
    fn start_while_paused_with_other_interval_is_rejected() {
        let mut timer = running(10);
        timer.pause().unwrap();
        assert_eq!(
            timer.start(config(20)),
            Err(TimerError::IntervalMismatch { current: 10, requested: 20 })
        );
        assert_eq!(timer.phase(), Phase::Paused);
    }

    #[test]
    fn invalid_transitions_leave_state_untouched() {
        let mut timer = TimerState::new(config(10));
        assert!(matches!(
            timer.pause(),
            Err(TimerError::InvalidTransition { action: "pause", .. })
        ));
        assert!(matches!(
            timer.resume(),
            Err(TimerError::InvalidTransition { action: "resume", .. })
        ));

        timer.start(config(10)).unwrap();
        advance(&mut timer, 2);
        assert!(matches!(timer.start(config(10)), Err(TimerError::InvalidTransition { .. })));
        assert_eq!(timer.total_elapsed_seconds(), 2);
    }

    #[test]
    fn toggle_cycles_through_phases() {
        let mut timer = TimerState::new(config(10));
        assert_eq!(timer.toggle().unwrap().phase, Phase::Running);
        assert_eq!(timer.toggle().unwrap().phase, Phase::Paused);
        assert_eq!(timer.toggle().unwrap().phase, Phase::Running);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut timer = running(10);
        advance(&mut timer, 13);

        let once = timer.reset();
        let twice = timer.reset();
        assert_eq!(once, twice);
        assert_eq!(twice.phase, Phase::Idle);
        assert_eq!(twice.total_elapsed_seconds, 0);
        assert_eq!(twice.cycle_count, 1);
        assert_eq!(twice.interval_seconds, 10);
    }

    #[test]
    fn configure_resets_session_with_new_interval() {
        let mut timer = running(10);
        advance(&mut timer, 7);
        let snap = timer.configure(config(45));
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.interval_seconds, 45);
        assert_eq!(snap.total_elapsed_seconds, 0);
    }

    #[test]
    fn percentage_tracks_remaining_share_of_interval() {
        let mut timer = running(4);
        let percentages: Vec<f64> = (0..4)
            .map(|_| timer.tick().snapshot.percentage_complete)
            .collect();
        assert_eq!(percentages, vec![75.0, 50.0, 25.0, 100.0]);
    }
}
