//! Cue collaborator services
//! 
//! This module contains the voice cue provider that turns labels into audio
//! assets and the sound player that plays them, falling back to tones.

pub mod sound;
pub mod voice;

// Re-export main types
pub use sound::{synthesize_tone, AudioOutput, LogOutput, SoundPlayer};
pub use voice::{
    prefetch_cues, AudioAsset, CueBank, HttpVoiceConfig, HttpVoiceProvider,
    voice_provider, UnavailableVoiceProvider, VoiceCueProvider, VoiceMode,
};
