//! Clinical whisper narration.
//!
//! When a new suggestion surfaces, its localized explanation is read out
//! at reduced volume by a speech-synthesis service running next to the
//! app. Narration is a best-effort enrichment: the suggestion is valid
//! and actionable whether or not playback happens, so every failure here
//! is logged and swallowed — nothing propagates to the detection path.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::detector::types::Language;

/// Whisper mode: low volume so the read-out stays under the conversation.
pub const WHISPER_VOLUME: f32 = 0.3;

/// Slightly slower than normal speech, for clinical terminology.
pub const WHISPER_RATE: f32 = 0.85;

/// One utterance for the speech service.
#[derive(Debug, Clone, Serialize)]
pub struct NarrationRequest {
    pub text: String,
    pub language: Language,
    pub rate: f32,
    pub volume: f32,
}

impl NarrationRequest {
    /// A whisper-mode utterance with the standard clinical settings.
    pub fn whisper(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
            rate: WHISPER_RATE,
            volume: WHISPER_VOLUME,
        }
    }
}

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("Speech service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Speech service returned status {0}")]
    Status(u16),
}

/// Speech-synthesis collaborator.
///
/// `Http` talks to a local TTS service; `Disabled` accepts everything and
/// plays nothing (tests, and `narration_enabled = false`).
pub enum Narrator {
    Http(HttpNarrator),
    Disabled,
}

impl Narrator {
    pub async fn speak(&self, request: &NarrationRequest) -> Result<(), NarrationError> {
        match self {
            Self::Http(http) => http.speak(request).await,
            Self::Disabled => Ok(()),
        }
    }
}

/// HTTP client for the local speech service.
///
/// The service owns audio output; this client only submits utterances.
/// Short timeouts: if the service is down we want to find out fast and
/// move on, not stall the narration task.
pub struct HttpNarrator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNarrator {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn speak(&self, request: &NarrationRequest) -> Result<(), NarrationError> {
        let url = format!("{}/api/speak", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(NarrationError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
