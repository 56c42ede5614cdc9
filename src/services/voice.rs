//! Voice cue provider and the prefetched cue bank

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{error::VoiceError, state::Cue};

/// Encoded audio returned by a voice provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub label: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Produces a spoken audio asset for a short text label
#[async_trait]
pub trait VoiceCueProvider: Send + Sync {
    async fn generate_cue(&self, label: &str) -> Result<AudioAsset, VoiceError>;
}

/// Provider used when no voice endpoint is configured; every cue falls back to tones
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableVoiceProvider;

#[async_trait]
impl VoiceCueProvider for UnavailableVoiceProvider {
    async fn generate_cue(&self, _label: &str) -> Result<AudioAsset, VoiceError> {
        Err(VoiceError::Unavailable)
    }
}

/// Settings for [`HttpVoiceProvider`]
#[derive(Debug, Clone)]
pub struct HttpVoiceConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub voice_id: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

/// Text-to-speech over HTTP: POSTs the label as JSON and takes the body as audio
#[derive(Debug, Clone)]
pub struct HttpVoiceProvider {
    client: reqwest::Client,
    config: HttpVoiceConfig,
}

impl HttpVoiceProvider {
    pub fn new(config: HttpVoiceConfig) -> Result<Self, VoiceError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl VoiceCueProvider for HttpVoiceProvider {
    async fn generate_cue(&self, label: &str) -> Result<AudioAsset, VoiceError> {
        debug!("Requesting voice cue {:?} from {}", label, self.config.endpoint);

        let mut request = self.client.post(&self.config.endpoint).json(&SpeechRequest {
            text: label,
            voice: &self.config.voice_id,
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VoiceError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(VoiceError::EmptyAsset(label.to_string()));
        }

        Ok(AudioAsset {
            label: label.to_string(),
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

/// Pick the provider for `config`, falling back to tones when none is usable
///
/// A provider that cannot be built is logged and replaced; the timer runs either way.
pub fn voice_provider(config: Option<HttpVoiceConfig>) -> Arc<dyn VoiceCueProvider> {
    let Some(config) = config else {
        warn!("No voice endpoint configured, cues will play as tones");
        return Arc::new(UnavailableVoiceProvider);
    };

    let endpoint = config.endpoint.clone();
    match HttpVoiceProvider::new(config) {
        Ok(provider) => {
            info!("Voice cues from {}", endpoint);
            Arc::new(provider)
        }
        Err(e) => {
            warn!("Voice provider for {} unusable, cues will play as tones: {}", endpoint, e);
            Arc::new(UnavailableVoiceProvider)
        }
    }
}

/// How cues will sound for this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceMode {
    /// Prefetch has not finished yet; tones are used meanwhile
    Pending,
    Voice,
    /// Some labels failed and use tones
    Partial,
    Tones,
}

/// Per-cue prefetch results
#[derive(Debug, Clone, Default)]
pub struct CueBank {
    entries: BTreeMap<Cue, Result<AudioAsset, VoiceError>>,
}

impl CueBank {
    pub fn asset(&self, cue: Cue) -> Option<&AudioAsset> {
        self.entries.get(&cue).and_then(|entry| entry.as_ref().ok())
    }

    /// Labels with no usable asset, in firing order
    pub fn failed_labels(&self) -> Vec<String> {
        Cue::ALL
            .iter()
            .filter(|cue| self.asset(**cue).is_none())
            .map(|cue| cue.label().to_string())
            .collect()
    }

    pub fn voice_mode(&self) -> VoiceMode {
        let voiced = Cue::ALL.iter().filter(|cue| self.asset(**cue).is_some()).count();
        match voiced {
            0 => VoiceMode::Tones,
            n if n == Cue::ALL.len() => VoiceMode::Voice,
            _ => VoiceMode::Partial,
        }
    }
}

impl FromIterator<(Cue, Result<AudioAsset, VoiceError>)> for CueBank {
    fn from_iter<I: IntoIterator<Item = (Cue, Result<AudioAsset, VoiceError>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Request every cue concurrently and keep each result, successful or not
pub async fn prefetch_cues(provider: &dyn VoiceCueProvider, cues: &[Cue]) -> CueBank {
    info!("Prefetching {} voice cues", cues.len());

    let results = join_all(cues.iter().map(|&cue| async move {
        let result = provider.generate_cue(cue.label()).await;
        if let Err(e) = &result {
            warn!("Voice cue {:?} unavailable, using tone: {}", cue.label(), e);
        }
        (cue, result)
    }))
    .await;

    let bank: CueBank = results.into_iter().collect();
    info!("Voice prefetch finished: mode={:?}", bank.voice_mode());
    bank
}
