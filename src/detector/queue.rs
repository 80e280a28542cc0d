use std::collections::VecDeque;

use uuid::Uuid;

use super::types::{DetectorError, Finding, Suggestion, SuggestionState};

/// In-memory suggestion queue backed by RwLock, bounded to the N
/// most-recent entries so long sessions cannot grow it without limit.
///
/// Nothing here is persisted: a suggestion lives exactly as long as the
/// session that produced it.
pub struct SuggestionQueue {
    entries: std::sync::RwLock<VecDeque<Suggestion>>,
    capacity: usize,
}

/// Result of an enqueue attempt.
#[derive(Debug)]
pub enum EnqueueOutcome {
    /// A new pending suggestion was appended.
    Enqueued(Suggestion),
    /// A pending suggestion for this finding already exists; nothing added.
    DuplicatePending,
}

/// Result of an accept/dismiss attempt. Terminal and unknown ids are
/// reported, not raised; they are expected steady-state outcomes.
#[derive(Debug)]
pub enum AckOutcome {
    /// The suggestion was accepted; the finding payload is returned for
    /// downstream use (attaching follow-up points to the session record).
    Accepted(Finding),
    Dismissed,
    AlreadyTerminal,
    NotFound,
}

impl SuggestionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: std::sync::RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Append a pending suggestion for `finding`, unless one is already
    /// pending for the same finding id (idempotent against duplicates).
    /// Evicts the oldest entry first when the queue is at capacity.
    pub fn enqueue(
        &self,
        finding: Finding,
        justification: String,
        confidence: f32,
    ) -> Result<EnqueueOutcome, DetectorError> {
        let mut entries = self.entries.write().map_err(|_| DetectorError::LockFailed)?;

        let already_pending = entries.iter().any(|s| {
            s.state == SuggestionState::Pending && s.finding.id == finding.id
        });
        if already_pending {
            return Ok(EnqueueOutcome::DuplicatePending);
        }

        if entries.len() >= self.capacity {
            if let Some(evicted) = entries.pop_front() {
                tracing::debug!(
                    suggestion = %evicted.id,
                    pulse = %evicted.finding.id,
                    "Queue at capacity, evicted oldest entry"
                );
            }
        }

        let suggestion = Suggestion {
            id: Uuid::new_v4(),
            finding,
            confidence,
            justification,
            created_at: chrono::Local::now().naive_local(),
            state: SuggestionState::Pending,
        };
        entries.push_back(suggestion.clone());
        Ok(EnqueueOutcome::Enqueued(suggestion))
    }

    /// Accept a pending suggestion. No-op (reported) on terminal/unknown.
    pub fn accept(&self, id: &Uuid) -> Result<AckOutcome, DetectorError> {
        self.transition(id, SuggestionState::Accepted)
    }

    /// Dismiss a pending suggestion. No-op (reported) on terminal/unknown.
    pub fn dismiss(&self, id: &Uuid) -> Result<AckOutcome, DetectorError> {
        self.transition(id, SuggestionState::Dismissed)
    }

    fn transition(
        &self,
        id: &Uuid,
        target: SuggestionState,
    ) -> Result<AckOutcome, DetectorError> {
        let mut entries = self.entries.write().map_err(|_| DetectorError::LockFailed)?;

        let Some(suggestion) = entries.iter_mut().find(|s| s.id == *id) else {
            return Ok(AckOutcome::NotFound);
        };
        if suggestion.state.is_terminal() {
            return Ok(AckOutcome::AlreadyTerminal);
        }

        suggestion.state = target;
        Ok(match target {
            SuggestionState::Accepted => AckOutcome::Accepted(suggestion.finding.clone()),
            _ => AckOutcome::Dismissed,
        })
    }

    /// Discard all suggestions regardless of state.
    pub fn clear(&self) -> Result<(), DetectorError> {
        let mut entries = self.entries.write().map_err(|_| DetectorError::LockFailed)?;
        entries.clear();
        Ok(())
    }

    /// Pending suggestions in arrival order.
    pub fn pending(&self) -> Result<Vec<Suggestion>, DetectorError> {
        let entries = self.entries.read().map_err(|_| DetectorError::LockFailed)?;
        Ok(entries
            .iter()
            .filter(|s| s.state == SuggestionState::Pending)
            .cloned()
            .collect())
    }

    pub fn pending_is_empty(&self) -> Result<bool, DetectorError> {
        let entries = self.entries.read().map_err(|_| DetectorError::LockFailed)?;
        Ok(!entries.iter().any(|s| s.state == SuggestionState::Pending))
    }

    /// Total entries held, terminal included (bounded by capacity).
    pub fn len(&self) -> Result<usize, DetectorError> {
        let entries = self.entries.read().map_err(|_| DetectorError::LockFailed)?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::lexicon::Lexicon;
    use crate::detector::types::PulseId;

    fn finding(id: PulseId) -> Finding {
        let lexicon = Lexicon::builtin();
        let found = lexicon
            .phrases(Default::default())
            .map(|(_, f)| f)
            .find(|f| f.id == id)
            .unwrap()
            .clone();
        found
    }

    fn enqueue(queue: &SuggestionQueue, id: PulseId) -> Suggestion {
        match queue
            .enqueue(finding(id), format!("Detected keyword: \"{id}\""), 0.85)
            .unwrap()
        {
            EnqueueOutcome::Enqueued(s) => s,
            EnqueueOutcome::DuplicatePending => panic!("unexpected duplicate"),
        }
    }

    #[test]
    fn enqueue_and_list_pending() {
        let queue = SuggestionQueue::new(10);
        let s = enqueue(&queue, PulseId::Slippery);

        let pending = queue.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, s.id);
        assert_eq!(pending[0].state, SuggestionState::Pending);
    }

    #[test]
    fn duplicate_pending_finding_not_enqueued() {
        let queue = SuggestionQueue::new(10);
        enqueue(&queue, PulseId::Slippery);

        let outcome = queue
            .enqueue(finding(PulseId::Slippery), "again".into(), 0.85)
            .unwrap();
        assert!(matches!(outcome, EnqueueOutcome::DuplicatePending));
        assert_eq!(queue.pending().unwrap().len(), 1);
    }

    #[test]
    fn accepted_finding_can_be_enqueued_again() {
        let queue = SuggestionQueue::new(10);
        let s = enqueue(&queue, PulseId::Slippery);
        queue.accept(&s.id).unwrap();

        // The pending-uniqueness invariant only covers pending entries.
        let outcome = queue
            .enqueue(finding(PulseId::Slippery), "again".into(), 0.85)
            .unwrap();
        assert!(matches!(outcome, EnqueueOutcome::Enqueued(_)));
    }

    #[test]
    fn accept_returns_finding_payload() {
        let queue = SuggestionQueue::new(10);
        let s = enqueue(&queue, PulseId::Wiry);

        match queue.accept(&s.id).unwrap() {
            AckOutcome::Accepted(f) => {
                assert_eq!(f.id, PulseId::Wiry);
                assert!(!f.points.is_empty());
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
        assert!(queue.pending().unwrap().is_empty());
    }

    #[test]
    fn accept_is_idempotent() {
        let queue = SuggestionQueue::new(10);
        let s = enqueue(&queue, PulseId::Wiry);

        assert!(matches!(queue.accept(&s.id).unwrap(), AckOutcome::Accepted(_)));
        assert!(matches!(
            queue.accept(&s.id).unwrap(),
            AckOutcome::AlreadyTerminal
        ));
    }

    #[test]
    fn dismiss_is_idempotent_and_terminal() {
        let queue = SuggestionQueue::new(10);
        let s = enqueue(&queue, PulseId::Deep);

        assert!(matches!(queue.dismiss(&s.id).unwrap(), AckOutcome::Dismissed));
        assert!(matches!(
            queue.dismiss(&s.id).unwrap(),
            AckOutcome::AlreadyTerminal
        ));
        // No transition out of a terminal state, accept included.
        assert!(matches!(
            queue.accept(&s.id).unwrap(),
            AckOutcome::AlreadyTerminal
        ));
    }

    #[test]
    fn unknown_id_reported_not_fatal() {
        let queue = SuggestionQueue::new(10);
        assert!(matches!(
            queue.accept(&Uuid::new_v4()).unwrap(),
            AckOutcome::NotFound
        ));
        assert!(matches!(
            queue.dismiss(&Uuid::new_v4()).unwrap(),
            AckOutcome::NotFound
        ));
    }

    #[test]
    fn clear_discards_everything() {
        let queue = SuggestionQueue::new(10);
        let s = enqueue(&queue, PulseId::Rapid);
        enqueue(&queue, PulseId::Slow);
        queue.accept(&s.id).unwrap();

        queue.clear().unwrap();
        assert_eq!(queue.len().unwrap(), 0);
        assert!(queue.pending().unwrap().is_empty());
    }

    #[test]
    fn bounded_queue_evicts_oldest() {
        let queue = SuggestionQueue::new(3);
        let first = enqueue(&queue, PulseId::Rapid);
        enqueue(&queue, PulseId::Slow);
        enqueue(&queue, PulseId::Slippery);
        assert_eq!(queue.len().unwrap(), 3);

        enqueue(&queue, PulseId::Wiry);
        assert_eq!(queue.len().unwrap(), 3, "capacity is a hard bound");
        assert!(
            matches!(queue.accept(&first.id).unwrap(), AckOutcome::NotFound),
            "oldest entry was evicted"
        );
    }

    #[test]
    fn eviction_takes_terminal_entries_first_when_oldest() {
        let queue = SuggestionQueue::new(2);
        let first = enqueue(&queue, PulseId::Rapid);
        queue.dismiss(&first.id).unwrap();
        let second = enqueue(&queue, PulseId::Slow);

        enqueue(&queue, PulseId::Deep);
        assert_eq!(queue.len().unwrap(), 2);
        // The dismissed (oldest) entry is gone; the pending one survives.
        assert!(matches!(queue.accept(&first.id).unwrap(), AckOutcome::NotFound));
        assert!(matches!(
            queue.accept(&second.id).unwrap(),
            AckOutcome::Accepted(_)
        ));
    }
}
