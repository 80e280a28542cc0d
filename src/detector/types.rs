use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PulseId
// ---------------------------------------------------------------------------

/// Closed set of pulse qualities the detector can surface.
///
/// The wire code (`P-HUA-03` etc.) is the stable identifier used in the
/// bundled lexicon resource and on the API; an unknown code fails
/// deserialization instead of flowing through as a stringly-typed id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PulseId {
    #[serde(rename = "P-SHU-01")]
    Rapid,
    #[serde(rename = "P-CHI-02")]
    Slow,
    #[serde(rename = "P-HUA-03")]
    Slippery,
    #[serde(rename = "P-XIAN-01")]
    Wiry,
    #[serde(rename = "P-SE-04")]
    Choppy,
    #[serde(rename = "P-FU-05")]
    Floating,
    #[serde(rename = "P-CHEN-06")]
    Deep,
    #[serde(rename = "P-XI-07")]
    Thin,
    #[serde(rename = "P-RUO-08")]
    Weak,
    #[serde(rename = "P-JIN-09")]
    Tight,
}

impl PulseId {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rapid => "P-SHU-01",
            Self::Slow => "P-CHI-02",
            Self::Slippery => "P-HUA-03",
            Self::Wiry => "P-XIAN-01",
            Self::Choppy => "P-SE-04",
            Self::Floating => "P-FU-05",
            Self::Deep => "P-CHEN-06",
            Self::Thin => "P-XI-07",
            Self::Weak => "P-RUO-08",
            Self::Tight => "P-JIN-09",
        }
    }
}

impl std::fmt::Display for PulseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Script a trigger phrase or explanation is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    He,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::He => "he",
        }
    }
}

/// Which trigger phrases the scanner considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageFilter {
    /// Scan phrases in every language (default — a mixed-language clinic).
    #[default]
    All,
    Only(Language),
}

impl LanguageFilter {
    pub fn includes(&self, language: Language) -> bool {
        match self {
            Self::All => true,
            Self::Only(l) => *l == language,
        }
    }
}

impl std::str::FromStr for LanguageFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "en" => Ok(Self::Only(Language::En)),
            "he" => Ok(Self::Only(Language::He)),
            other => Err(format!("unknown lexicon language: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// A named pulse quality with the guidance attached to it.
///
/// Findings are static data loaded once at startup; suggestions carry a
/// copy so the presentation layer never needs a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: PulseId,
    pub name: String,
    pub chinese_name: String,
    /// Acupoints queued as follow-up when the therapist accepts.
    pub points: Vec<String>,
    pub explanation_he: String,
    pub explanation_en: String,
}

impl Finding {
    /// Explanation text in the requested narration language.
    pub fn explanation(&self, language: Language) -> &str {
        match language {
            Language::He => &self.explanation_he,
            Language::En => &self.explanation_en,
        }
    }
}

// ---------------------------------------------------------------------------
// Suggestion
// ---------------------------------------------------------------------------

/// State machine per suggestion. Both non-pending states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionState {
    Pending,
    Accepted,
    Dismissed,
}

impl SuggestionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A queued, user-actionable detection event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub finding: Finding,
    pub confidence: f32,
    /// The phrase that triggered the detection, for the therapist's context.
    pub justification: String,
    pub created_at: NaiveDateTime,
    pub state: SuggestionState,
}

// ---------------------------------------------------------------------------
// Engine events
// ---------------------------------------------------------------------------

/// Typed events emitted by a session engine, consumed by the API layer
/// (and pushed verbatim to WebSocket subscribers).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    SuggestionEnqueued { suggestion: Suggestion },
    SuggestionAccepted { id: Uuid },
    SuggestionDismissed { id: Uuid },
    QueueCleared,
    AttentionChanged { active: bool },
    NarrationRequested { text: String },
    SessionEnded,
}

// ---------------------------------------------------------------------------
// DetectorError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Internal lock failed")]
    LockFailed,

    #[error("Session engine is no longer running")]
    SessionClosed,
}
