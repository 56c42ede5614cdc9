//! Sound player with synthesized tone fallback

use std::f32::consts::PI;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::voice::AudioAsset;
use crate::{
    error::SoundError,
    state::{Cue, ToneKind},
};

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Output device handle owned by a [`SoundPlayer`]
pub trait AudioOutput: Send + Sync {
    /// Play an encoded asset as returned by the voice provider
    fn play_asset(&self, asset: &AudioAsset) -> Result<(), SoundError>;

    /// Play mono PCM samples in `[-1.0, 1.0]`
    fn play_samples(&self, samples: &[f32], sample_rate: u32) -> Result<(), SoundError>;
}

/// Headless output that reports playback through tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOutput;

impl AudioOutput for LogOutput {
    fn play_asset(&self, asset: &AudioAsset) -> Result<(), SoundError> {
        info!(
            "Playing voice cue {:?} ({}, {} bytes)",
            asset.label,
            asset.content_type,
            asset.bytes.len()
        );
        Ok(())
    }

    fn play_samples(&self, samples: &[f32], sample_rate: u32) -> Result<(), SoundError> {
        info!(
            "Playing tone ({} samples, {}ms)",
            samples.len(),
            samples.len() as u64 * 1000 / sample_rate.max(1) as u64
        );
        Ok(())
    }
}

/// Frequency and length of a fallback tone
fn tone_shape(kind: ToneKind) -> (f32, u32) {
    match kind {
        ToneKind::Countdown => (880.0, 120),
        ToneKind::IntervalComplete => (1320.0, 400),
    }
}

/// Sine burst with a short linear fade in and out to avoid clicks
pub fn synthesize_tone(kind: ToneKind, sample_rate: u32) -> Vec<f32> {
    let (frequency, duration_ms) = tone_shape(kind);
    let total = (sample_rate as u64 * duration_ms as u64 / 1000) as usize;
    let fade = (sample_rate as usize / 200).min(total / 2).max(1);

    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let edge = i.min(total - 1 - i);
            let envelope = (edge as f32 / fade as f32).min(1.0);
            (2.0 * PI * frequency * t).sin() * 0.5 * envelope
        })
        .collect()
}

/// Plays cues, substituting a tone whenever the voice asset is missing or fails
pub struct SoundPlayer {
    output: Arc<dyn AudioOutput>,
    sample_rate: u32,
}

impl SoundPlayer {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Play `cue`; errors are logged and never returned
    pub fn play(&self, cue: Cue, asset: Option<&AudioAsset>) {
        if let Some(asset) = asset {
            match self.output.play_asset(asset) {
                Ok(()) => return,
                Err(e) => warn!("Voice cue {:?} failed, falling back to tone: {}", cue.label(), e),
            }
        }

        debug!("Synthesizing {:?} tone for {:?}", cue.tone(), cue.label());
        let samples = synthesize_tone(cue.tone(), self.sample_rate);
        if let Err(e) = self.output.play_samples(&samples, self.sample_rate) {
            warn!("Tone for {:?} could not be played: {}", cue.label(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// What a [`RecordingOutput`] was asked to play
    #[derive(Debug, Clone, PartialEq)]
    enum Played {
        Asset(String),
        Tone(usize),
    }

    /// Output that records every request and can be told to fail
    #[derive(Default)]
    struct RecordingOutput {
        played: Mutex<Vec<Played>>,
        fail_assets: bool,
        fail_tones: bool,
    }

    impl AudioOutput for RecordingOutput {
        fn play_asset(&self, asset: &AudioAsset) -> Result<(), SoundError> {
            if self.fail_assets {
                return Err(SoundError::PlaybackFailed("unsupported codec".to_string()));
            }
            self.played.lock().unwrap().push(Played::Asset(asset.label.clone()));
            Ok(())
        }

        fn play_samples(&self, samples: &[f32], _sample_rate: u32) -> Result<(), SoundError> {
            if self.fail_tones {
                return Err(SoundError::DeviceNotAvailable("no sink".to_string()));
            }
            self.played.lock().unwrap().push(Played::Tone(samples.len()));
            Ok(())
        }
    }

    fn asset(label: &str) -> AudioAsset {
        AudioAsset {
            label: label.to_string(),
            content_type: "audio/mpeg".to_string(),
            bytes: vec![0xff, 0xf3],
        }
    }

    #[test]
    fn tones_differ_between_countdown_and_completion() {
        let countdown = synthesize_tone(ToneKind::Countdown, 8_000);
        let complete = synthesize_tone(ToneKind::IntervalComplete, 8_000);
        assert_eq!(countdown.len(), 960);
        assert_eq!(complete.len(), 3_200);
        assert!(countdown.iter().chain(complete.iter()).all(|s| s.abs() <= 0.5));
        assert_eq!(countdown[0], 0.0);
    }

    #[test]
    fn plays_asset_when_available() {
        let output = Arc::new(RecordingOutput::default());
        let player = SoundPlayer::new(output.clone());
        player.play(Cue::Three, Some(&asset("Three")));
        assert_eq!(*output.played.lock().unwrap(), vec![Played::Asset("Three".to_string())]);
    }

    #[test]
    fn missing_asset_falls_back_to_tone() {
        let output = Arc::new(RecordingOutput::default());
        let player = SoundPlayer::new(output.clone()).with_sample_rate(1_000);
        player.play(Cue::Next, None);
        assert_eq!(*output.played.lock().unwrap(), vec![Played::Tone(400)]);
    }

    #[test]
    fn failing_asset_falls_back_to_tone() {
        let output = Arc::new(RecordingOutput {
            fail_assets: true,
            ..Default::default()
        });
        let player = SoundPlayer::new(output.clone()).with_sample_rate(1_000);
        player.play(Cue::Five, Some(&asset("Five")));
        assert_eq!(*output.played.lock().unwrap(), vec![Played::Tone(120)]);
    }

    #[test]
    fn total_playback_failure_is_absorbed() {
        let output = Arc::new(RecordingOutput {
            fail_assets: true,
            fail_tones: true,
            ..Default::default()
        });
        let player = SoundPlayer::new(output.clone());
        player.play(Cue::One, Some(&asset("One")));
        assert!(output.played.lock().unwrap().is_empty());
    }
}
