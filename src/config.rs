//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

use crate::{
    error::TimerError,
    services::HttpVoiceConfig,
    state::TimerConfiguration,
};

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "interval-coach")]
#[command(about = "A headless interval-workout timer server with spoken countdown cues")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Default interval duration in seconds
    #[arg(short, long, default_value = "60", allow_negative_numbers = true)]
    pub interval: i64,

    /// Text-to-speech endpoint used to generate the countdown voice cues
    #[arg(long)]
    pub voice_endpoint: Option<String>,

    /// Bearer token for the voice endpoint
    #[arg(long, env = "VOICE_API_KEY", hide_env_values = true)]
    pub voice_api_key: Option<String>,

    /// Voice identifier passed to the voice endpoint
    #[arg(long, default_value = "default")]
    pub voice_id: String,

    /// Timeout for each voice request in seconds
    #[arg(long, default_value = "10")]
    pub voice_timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Validated default interval
    pub fn timer_configuration(&self) -> Result<TimerConfiguration, TimerError> {
        TimerConfiguration::new(self.interval)
    }

    /// Voice provider settings, if an endpoint was given
    pub fn voice_config(&self) -> Option<HttpVoiceConfig> {
        self.voice_endpoint.as_ref().map(|endpoint| HttpVoiceConfig {
            endpoint: endpoint.clone(),
            api_key: self.voice_api_key.clone(),
            voice_id: self.voice_id.clone(),
            timeout: Duration::from_secs(self.voice_timeout_secs),
        })
    }
}
