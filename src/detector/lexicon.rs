use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Finding, Language, LanguageFilter, PulseId};

/// A trigger phrase bound to the finding it suggests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phrase {
    pub text: String,
    pub language: Language,
}

/// One row of the lexicon resource: a finding plus its trigger phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LexiconRow {
    #[serde(flatten)]
    finding: Finding,
    phrases: Vec<Phrase>,
}

/// Flattened phrase entry, lowercased once at load time.
#[derive(Debug, Clone)]
struct PhraseEntry {
    text: String,
    language: Language,
    finding: usize,
}

/// Trigger-phrase dictionary: many phrases, across scripts, resolving to
/// a smaller set of findings.
///
/// Validated at load time: duplicate or empty phrases are rejected so a
/// bad resource file is caught at startup, not mid-session. Lookup is
/// case-insensitive substring containment against the scanned text (the
/// transcript is free speech; tokenized matching would miss inflections).
#[derive(Debug)]
pub struct Lexicon {
    findings: Vec<Finding>,
    /// Resource order is preserved: it decides which finding wins when
    /// several phrases match in one scan pass.
    phrases: Vec<PhraseEntry>,
}

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Lexicon load failed ({0}): {1}")]
    Load(String, String),

    #[error("Lexicon parse failed: {0}")]
    Parse(String),

    #[error("Duplicate trigger phrase {0:?}")]
    DuplicatePhrase(String),

    #[error("Empty trigger phrase for finding {0}")]
    EmptyPhrase(PulseId),
}

impl Lexicon {
    /// Load a lexicon from a JSON resource file.
    pub fn load(path: &std::path::Path) -> Result<Self, LexiconError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| LexiconError::Load(path.display().to_string(), e.to_string()))?;
        Self::from_json(&json)
    }

    /// The lexicon bundled with the binary (resources/pulse_findings.json).
    pub fn builtin() -> Self {
        Self::from_json(include_str!("../../resources/pulse_findings.json"))
            .expect("bundled pulse lexicon is valid")
    }

    /// A lexicon with no entries. Every scan yields zero matches.
    pub fn empty() -> Self {
        Self {
            findings: Vec::new(),
            phrases: Vec::new(),
        }
    }

    fn from_json(json: &str) -> Result<Self, LexiconError> {
        let rows: Vec<LexiconRow> =
            serde_json::from_str(json).map_err(|e| LexiconError::Parse(e.to_string()))?;

        let mut findings = Vec::with_capacity(rows.len());
        let mut phrases = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for row in rows {
            let finding_idx = findings.len();
            for phrase in &row.phrases {
                let text = phrase.text.trim().to_lowercase();
                if text.is_empty() {
                    return Err(LexiconError::EmptyPhrase(row.finding.id));
                }
                if !seen.insert(text.clone()) {
                    return Err(LexiconError::DuplicatePhrase(phrase.text.clone()));
                }
                phrases.push(PhraseEntry {
                    text,
                    language: phrase.language,
                    finding: finding_idx,
                });
            }
            findings.push(row.finding);
        }

        Ok(Self { findings, phrases })
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn finding_count(&self) -> usize {
        self.findings.len()
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    /// Iterate phrases in resource order, restricted to the given filter.
    /// Yields `(lowercased phrase, finding)`.
    pub fn phrases(
        &self,
        filter: LanguageFilter,
    ) -> impl Iterator<Item = (&str, &Finding)> + '_ {
        self.phrases
            .iter()
            .filter(move |p| filter.includes(p.language))
            .map(|p| (p.text.as_str(), &self.findings[p.finding]))
    }

    /// Resolve a single phrase against the lexicon (case-insensitive
    /// containment, same policy as a scan pass). `None` means no match.
    pub fn lookup(&self, text: &str) -> Option<&Finding> {
        let lower = text.to_lowercase();
        self.phrases
            .iter()
            .find(|p| lower.contains(&p.text))
            .map(|p| &self.findings[p.finding])
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_lexicon_loads_ten_findings() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.finding_count(), 10);
        assert!(lexicon.phrase_count() > 40);
    }

    #[test]
    fn aliases_across_scripts_resolve_to_same_finding() {
        let lexicon = Lexicon::builtin();
        let en = lexicon.lookup("the pulse feels slippery today").unwrap();
        let he = lexicon.lookup("דופק חלקלק").unwrap();
        assert_eq!(en.id, PulseId::Slippery);
        assert_eq!(he.id, PulseId::Slippery);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.lookup("WIRY quality").unwrap().id, PulseId::Wiry);
    }

    #[test]
    fn lookup_no_match() {
        let lexicon = Lexicon::builtin();
        assert!(lexicon.lookup("patient reports good sleep").is_none());
    }

    #[test]
    fn empty_lexicon_never_matches() {
        let lexicon = Lexicon::empty();
        assert!(lexicon.is_empty());
        assert!(lexicon.lookup("slippery").is_none());
    }

    #[test]
    fn language_filter_restricts_phrases() {
        let lexicon = Lexicon::builtin();
        let all = lexicon.phrases(LanguageFilter::All).count();
        let he = lexicon.phrases(LanguageFilter::Only(Language::He)).count();
        let en = lexicon.phrases(LanguageFilter::Only(Language::En)).count();
        assert_eq!(he + en, all);
        assert!(he > 0 && en > 0);
    }

    #[test]
    fn duplicate_phrase_rejected() {
        let json = r#"[
            {"id": "P-SHU-01", "name": "Rapid", "chinese_name": "数脉",
             "points": ["LI11"], "explanation_he": "a", "explanation_en": "b",
             "phrases": [{"text": "rapid", "language": "en"}]},
            {"id": "P-CHI-02", "name": "Slow", "chinese_name": "迟脉",
             "points": ["ST36"], "explanation_he": "a", "explanation_en": "b",
             "phrases": [{"text": "Rapid", "language": "en"}]}
        ]"#;
        match Lexicon::from_json(json) {
            Err(LexiconError::DuplicatePhrase(p)) => assert_eq!(p, "Rapid"),
            other => panic!("expected DuplicatePhrase, got {other:?}"),
        }
    }

    #[test]
    fn empty_phrase_rejected() {
        let json = r#"[
            {"id": "P-SHU-01", "name": "Rapid", "chinese_name": "数脉",
             "points": ["LI11"], "explanation_he": "a", "explanation_en": "b",
             "phrases": [{"text": "   ", "language": "en"}]}
        ]"#;
        match Lexicon::from_json(json) {
            Err(LexiconError::EmptyPhrase(id)) => assert_eq!(id, PulseId::Rapid),
            other => panic!("expected EmptyPhrase, got {other:?}"),
        }
    }

    #[test]
    fn unknown_finding_id_rejected() {
        let json = r#"[
            {"id": "P-FAKE-99", "name": "X", "chinese_name": "x",
             "points": [], "explanation_he": "a", "explanation_en": "b",
             "phrases": [{"text": "x", "language": "en"}]}
        ]"#;
        assert!(matches!(
            Lexicon::from_json(json),
            Err(LexiconError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(include_str!("../../resources/pulse_findings.json").as_bytes())
            .unwrap();
        let lexicon = Lexicon::load(file.path()).unwrap();
        assert_eq!(lexicon.finding_count(), 10);

        let missing = Lexicon::load(std::path::Path::new("/nonexistent/lexicon.json"));
        assert!(matches!(missing, Err(LexiconError::Load(_, _))));
    }

    #[test]
    fn empty_resource_is_valid() {
        let lexicon = Lexicon::from_json("[]").unwrap();
        assert!(lexicon.is_empty());
    }
}
