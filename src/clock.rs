//! Tick sources for the timer driver
//!
//! The driver never sleeps on its own; it pulls ticks from a [`TickSource`].
//! Production uses [`IntervalTicker`], tests use [`ManualTicker`] and advance it by hand.

use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    sync::mpsc,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};

/// Something that produces one-second ticks
#[async_trait]
pub trait TickSource: Send {
    /// Wait for the next tick
    async fn tick(&mut self);

    /// Re-arm the source for a new run; ticks from before the call are discarded
    fn restart(&mut self);
}

/// Wall-clock ticks backed by `tokio::time::interval`
pub struct IntervalTicker {
    period: Duration,
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: Self::arm(period),
        }
    }

    /// First tick lands one full period from now
    fn arm(period: Duration) -> Interval {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }

    fn restart(&mut self) {
        self.interval = Self::arm(self.period);
    }
}

/// Handle used to push ticks into a [`ManualTicker`]
#[derive(Debug, Clone)]
pub struct ManualClock {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualClock {
    /// Queue `ticks` ticks
    pub fn advance(&self, ticks: usize) {
        for _ in 0..ticks {
            if self.tx.send(()).is_err() {
                break;
            }
        }
    }
}

/// Tick source driven by a [`ManualClock`]
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ManualTicker {
    pub fn new() -> (ManualClock, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ManualClock { tx }, Self { rx })
    }
}

#[async_trait]
impl TickSource for ManualTicker {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            // Clock handle dropped, no more ticks will come
            std::future::pending::<()>().await;
        }
    }

    fn restart(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn interval_ticker_waits_a_full_period_before_first_tick() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(1));
        let started = Instant::now();
        ticker.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        ticker.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticker_restart_rearms_the_period() {
        let mut ticker = IntervalTicker::new(Duration::from_secs(1));
        tokio::time::advance(Duration::from_millis(700)).await;
        ticker.restart();
        let restarted = Instant::now();
        ticker.tick().await;
        assert_eq!(restarted.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn manual_ticker_restart_drops_queued_ticks() {
        let (clock, mut ticker) = ManualTicker::new();
        clock.advance(3);
        ticker.restart();
        clock.advance(1);
        ticker.tick().await;
        assert!(ticker.rx.try_recv().is_err());
    }
}
