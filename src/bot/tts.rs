//! Text-to-speech over an HTTP endpoint.
//!
//! The endpoint serves /v1/tts and returns WAV audio, which is converted to
//! OGG Opus for Telegram voice messages.

use tracing::{debug, info};

use crate::bot::audio;

/// Bound on the synthesis call, matching the other outbound services.
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct Synthesizer {
    endpoint: String,
    http: reqwest::Client,
}

impl Synthesizer {
    /// `endpoint` is the base URL of the TTS server, e.g.
    /// "http://localhost:8880".
    pub fn new(endpoint: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self { endpoint, http }
    }

    /// Generate speech from text. Returns OGG Opus bytes ready for
    /// Telegram.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, String> {
        let preview: String = text.chars().take(50).collect();
        info!("TTS: \"{preview}\"");

        let response = self
            .http
            .post(format!("{}/v1/tts", self.endpoint))
            .json(&serde_json::json!({
                "text": text,
                "format": "wav",
            }))
            .send()
            .await
            .map_err(|e| format!("TTS request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("TTS error {status}: {body}"));
        }

        let wav_data = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read TTS response: {e}"))?;

        debug!("Got {} bytes of WAV audio", wav_data.len());

        let ogg_data = audio::wav_to_ogg(&wav_data)?;
        info!("Generated {} bytes of voice audio", ogg_data.len());
        Ok(ogg_data)
    }
}
