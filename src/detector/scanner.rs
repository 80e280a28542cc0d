use std::collections::HashSet;

use super::lexicon::Lexicon;
use super::types::{Finding, LanguageFilter, PulseId};

// ---------------------------------------------------------------------------
// ScanState
// ---------------------------------------------------------------------------

/// Per-session scan bookkeeping.
///
/// Owned by the session engine and reset when the transcript source is
/// cleared. Nothing here is shared; the scanner runs on the session's
/// single event loop.
#[derive(Debug, Default)]
pub struct ScanState {
    /// Last text a pass ran against; unchanged input short-circuits.
    last_text: String,
    /// Phrases already matched this session. A triggered phrase never
    /// re-fires until the state is reset.
    triggered: HashSet<String>,
    /// The finding surfaced by the previous pass, to avoid immediate
    /// repetition of the same suggestion.
    last_surfaced: Option<PulseId>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything: triggered phrases may fire again.
    pub fn reset(&mut self) {
        self.last_text.clear();
        self.triggered.clear();
        self.last_surfaced = None;
    }

    pub fn last_surfaced(&self) -> Option<PulseId> {
        self.last_surfaced
    }

    pub fn triggered_count(&self) -> usize {
        self.triggered.len()
    }
}

// ---------------------------------------------------------------------------
// Scan pass
// ---------------------------------------------------------------------------

/// Result of one scan pass.
#[derive(Debug)]
pub enum ScanOutcome {
    MatchFound(Detection),
    NoMatch,
}

/// A selected match: the finding to surface and the phrase that hit.
#[derive(Debug)]
pub struct Detection {
    pub finding: Finding,
    pub phrase: String,
}

/// Run one pass over a transcript snapshot.
///
/// Every not-yet-triggered phrase is containment-tested against the
/// lowercased snapshot; all hits are marked triggered, then the first hit
/// (lexicon order) whose finding differs from the last surfaced one is
/// selected. If every hit repeats the last surfaced finding, the pass
/// surfaces nothing.
///
/// The snapshot is treated as replacement text, not a delta: the
/// transcript source usually appends, but nothing here depends on it.
pub fn scan_transcript(
    state: &mut ScanState,
    lexicon: &Lexicon,
    filter: LanguageFilter,
    text: &str,
) -> ScanOutcome {
    if text.is_empty() || text == state.last_text {
        return ScanOutcome::NoMatch;
    }
    state.last_text = text.to_string();

    let lower = text.to_lowercase();
    let mut candidates: Vec<(String, &Finding)> = Vec::new();

    for (phrase, finding) in lexicon.phrases(filter) {
        if state.triggered.contains(phrase) {
            continue;
        }
        if lower.contains(phrase) {
            state.triggered.insert(phrase.to_string());
            candidates.push((phrase.to_string(), finding));
        }
    }

    if candidates.is_empty() {
        return ScanOutcome::NoMatch;
    }

    let selected = candidates
        .into_iter()
        .find(|(_, finding)| Some(finding.id) != state.last_surfaced);

    match selected {
        Some((phrase, finding)) => {
            state.last_surfaced = Some(finding.id);
            tracing::debug!(pulse = %finding.id, phrase = %phrase, "Scan pass matched");
            ScanOutcome::MatchFound(Detection {
                finding: finding.clone(),
                phrase,
            })
        }
        None => {
            tracing::debug!("Scan pass matched only the last-surfaced finding, suppressed");
            ScanOutcome::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::types::Language;

    fn scan(state: &mut ScanState, lexicon: &Lexicon, text: &str) -> ScanOutcome {
        scan_transcript(state, lexicon, LanguageFilter::All, text)
    }

    /// Scenario A: an English phrase yields one suggestion for the
    /// slippery pulse finding.
    #[test]
    fn english_phrase_matches() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();

        match scan(&mut state, &lexicon, "the pulse feels slippery today") {
            ScanOutcome::MatchFound(d) => {
                assert_eq!(d.finding.id, PulseId::Slippery);
                assert_eq!(d.phrase, "slippery");
            }
            ScanOutcome::NoMatch => panic!("expected a match"),
        }
        assert_eq!(state.last_surfaced(), Some(PulseId::Slippery));
    }

    /// Scenario B: the Hebrew alias resolves to the same finding id.
    #[test]
    fn hebrew_alias_consolidates() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();

        match scan(&mut state, &lexicon, "מרגיש דופק חלקלק בצד ימין") {
            ScanOutcome::MatchFound(d) => assert_eq!(d.finding.id, PulseId::Slippery),
            ScanOutcome::NoMatch => panic!("expected a match"),
        }
    }

    /// A triggered phrase never fires twice for the same state.
    #[test]
    fn triggered_phrase_does_not_refire() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();

        assert!(matches!(
            scan(&mut state, &lexicon, "pulse is wiry"),
            ScanOutcome::MatchFound(_)
        ));
        assert!(matches!(
            scan(&mut state, &lexicon, "pulse is wiry, still wiry"),
            ScanOutcome::NoMatch
        ));
    }

    /// Unchanged text short-circuits without touching the triggered set.
    #[test]
    fn unchanged_text_short_circuits() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();

        assert!(matches!(
            scan(&mut state, &lexicon, "no clinical terms here"),
            ScanOutcome::NoMatch
        ));
        let before = state.triggered_count();
        assert!(matches!(
            scan(&mut state, &lexicon, "no clinical terms here"),
            ScanOutcome::NoMatch
        ));
        assert_eq!(state.triggered_count(), before);
    }

    /// Scenario C: when one candidate repeats the immediately prior
    /// finding and another does not, only the non-repeating one surfaces.
    #[test]
    fn tie_break_prefers_non_repeating_finding() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();

        // Surface the rapid pulse first.
        assert!(matches!(
            scan(&mut state, &lexicon, "the pulse is rapid"),
            ScanOutcome::MatchFound(_)
        ));

        // "fast" aliases the rapid pulse again; "deep" is new. The pass
        // must pick the deep pulse even though "fast" comes first in
        // lexicon order.
        match scan(&mut state, &lexicon, "the pulse is rapid, fast and deep") {
            ScanOutcome::MatchFound(d) => assert_eq!(d.finding.id, PulseId::Deep),
            ScanOutcome::NoMatch => panic!("expected the non-repeating finding"),
        }
    }

    /// All candidates repeating the prior finding surfaces nothing.
    #[test]
    fn all_repeating_candidates_surface_nothing() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();

        assert!(matches!(
            scan(&mut state, &lexicon, "the pulse is rapid"),
            ScanOutcome::MatchFound(_)
        ));
        // "fast" is the only new hit, and it repeats the rapid pulse.
        assert!(matches!(
            scan(&mut state, &lexicon, "the pulse is rapid and fast"),
            ScanOutcome::NoMatch
        ));
        // The phrase was still consumed (source behavior): it cannot
        // re-fire later.
        assert!(matches!(
            scan(&mut state, &lexicon, "fast again, and still fast"),
            ScanOutcome::NoMatch
        ));
    }

    /// Scenario D: reset lets a previously triggered phrase fire again.
    #[test]
    fn reset_allows_refire() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();

        assert!(matches!(
            scan(&mut state, &lexicon, "slippery quality"),
            ScanOutcome::MatchFound(_)
        ));
        state.reset();
        assert!(matches!(
            scan(&mut state, &lexicon, "slippery quality"),
            ScanOutcome::MatchFound(_)
        ));
    }

    #[test]
    fn empty_lexicon_yields_no_match() {
        let lexicon = Lexicon::empty();
        let mut state = ScanState::new();
        assert!(matches!(
            scan(&mut state, &lexicon, "slippery and wiry and deep"),
            ScanOutcome::NoMatch
        ));
    }

    #[test]
    fn empty_text_yields_no_match() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();
        assert!(matches!(scan(&mut state, &lexicon, ""), ScanOutcome::NoMatch));
    }

    /// Language filter: with English-only scanning, Hebrew aliases are
    /// invisible.
    #[test]
    fn language_filter_excludes_other_script() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();
        let outcome = scan_transcript(
            &mut state,
            &lexicon,
            LanguageFilter::Only(Language::En),
            "דופק חלקלק",
        );
        assert!(matches!(outcome, ScanOutcome::NoMatch));
    }

    /// Matching is containment, not tokenization: a phrase inside a
    /// longer word still hits.
    #[test]
    fn containment_not_tokenized() {
        let lexicon = Lexicon::builtin();
        let mut state = ScanState::new();
        match scan(&mut state, &lexicon, "a fasting patient") {
            ScanOutcome::MatchFound(d) => assert_eq!(d.finding.id, PulseId::Rapid),
            ScanOutcome::NoMatch => panic!("containment should match inside words"),
        }
    }
}
