//! Runtime configuration.
//!
//! Everything is read once at startup from `MAISENSE_*` environment
//! variables; invalid values fall back to defaults with a warning rather
//! than aborting; the engine is an enrichment layer and should come up
//! even with a mangled environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::detector::types::{Language, LanguageFilter};

pub const APP_NAME: &str = "MaiSense";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn default_log_filter() -> &'static str {
    "maisense=info"
}

// ═══════════════════════════════════════════════════════════
// DetectorConfig — per-session tuning
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Master switch; a disabled detector ignores transcript updates.
    pub enabled: bool,
    /// Quiet period after the last transcript change before a scan runs.
    pub quiet_period: Duration,
    /// How long the visual-attention flag stays up without re-triggering.
    pub attention_window: Duration,
    /// Suggestion queue bound (oldest entries evicted beyond it).
    pub max_queue_size: usize,
    /// Which trigger phrases are scanned.
    pub lexicon_language: LanguageFilter,
    /// Whether new suggestions are narrated at all.
    pub narration_enabled: bool,
    /// Language of the narrated explanation.
    pub narration_language: Language,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quiet_period: Duration::from_millis(1500),
            attention_window: Duration::from_secs(8),
            max_queue_size: 10,
            lexicon_language: LanguageFilter::All,
            narration_enabled: true,
            narration_language: Language::He,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Config — process-wide
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Config {
    pub detector: DetectorConfig,
    /// Loopback port for the HTTP/WebSocket surface. 0 = ephemeral.
    pub listen_port: u16,
    /// Base URL of the local speech-synthesis service.
    pub speech_url: String,
    /// Override for the bundled lexicon resource.
    pub lexicon_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            listen_port: 7878,
            speech_url: "http://127.0.0.1:5002".to_string(),
            lexicon_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let detector_defaults = defaults.detector.clone();

        let detector = DetectorConfig {
            enabled: parse_bool(env("MAISENSE_ENABLED"), detector_defaults.enabled),
            quiet_period: Duration::from_millis(parse_u64(
                env("MAISENSE_QUIET_MS"),
                detector_defaults.quiet_period.as_millis() as u64,
            )),
            attention_window: Duration::from_secs(parse_u64(
                env("MAISENSE_ATTENTION_SECS"),
                detector_defaults.attention_window.as_secs(),
            )),
            max_queue_size: parse_u64(
                env("MAISENSE_MAX_QUEUE"),
                detector_defaults.max_queue_size as u64,
            ) as usize,
            lexicon_language: parse_language_filter(
                env("MAISENSE_LEXICON_LANG"),
                detector_defaults.lexicon_language,
            ),
            narration_enabled: parse_bool(
                env("MAISENSE_NARRATION"),
                detector_defaults.narration_enabled,
            ),
            narration_language: match env("MAISENSE_NARRATION_LANG").as_deref() {
                Some("en") => Language::En,
                Some("he") | None => Language::He,
                Some(other) => {
                    tracing::warn!(value = other, "Unknown narration language, using Hebrew");
                    Language::He
                }
            },
        };

        Self {
            detector,
            listen_port: parse_u64(env("MAISENSE_PORT"), defaults.listen_port as u64) as u16,
            speech_url: env("MAISENSE_SPEECH_URL").unwrap_or(defaults.speech_url),
            lexicon_path: env("MAISENSE_LEXICON_PATH").map(PathBuf::from),
        }
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_u64(value: Option<String>, default: u64) -> u64 {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "Invalid numeric config value, using default");
            default
        }),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value.as_deref() {
        None => default,
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        Some(other) => {
            tracing::warn!(value = other, "Invalid boolean config value, using default");
            default
        }
    }
}

fn parse_language_filter(value: Option<String>, default: LanguageFilter) -> LanguageFilter {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid lexicon language, using default");
            default
        }),
    }
}
