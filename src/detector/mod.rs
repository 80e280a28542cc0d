//! Live-session pulse detection.
//!
//! The transcript of a treatment session flows in, debounced scan passes
//! match trigger phrases from a multi-language lexicon, and matches are
//! queued as therapist-actionable suggestions. Detection is an
//! enrichment layer: nothing in here has a fatal failure mode. No match,
//! duplicate suggestions, and acknowledgments of stale ids are all
//! ordinary outcomes.

pub mod lexicon;
pub mod queue;
pub mod scanner;
pub mod session;
pub mod types;

pub use lexicon::{Lexicon, LexiconError};
pub use queue::{AckOutcome, EnqueueOutcome, SuggestionQueue};
pub use session::{spawn, SessionHandle, KEYWORD_CONFIDENCE};
pub use types::{
    DetectorError, EngineEvent, Finding, Language, LanguageFilter, PulseId, Suggestion,
    SuggestionState,
};
