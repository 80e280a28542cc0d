//! Session engine: one per live treatment session.
//!
//! Owns everything session-scoped: the scan state, the suggestion queue,
//! the attention flag, both timers (debounce + attention), and the
//! in-flight narration task. A single tokio task drives all of it, so
//! queue writes, scan passes and timer expiry never race.
//!
//! Lifecycle:
//! 1. `spawn` starts the engine task and returns a `SessionHandle`
//! 2. Transcript updates restart the quiet-period countdown
//! 3. Countdown elapses uninterrupted → one scan pass over the snapshot
//! 4. A selected match enqueues a suggestion, raises the attention flag
//!    (auto-clears after the attention window), and narrates the finding
//! 5. `shutdown` stops the task, cancelling pending timers and aborting
//!    any in-flight narration

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::DetectorConfig;
use crate::narration::{NarrationRequest, Narrator};

use super::lexicon::Lexicon;
use super::queue::{AckOutcome, EnqueueOutcome, SuggestionQueue};
use super::scanner::{scan_transcript, ScanOutcome, ScanState};
use super::types::{DetectorError, EngineEvent, Finding, Suggestion};

/// Confidence attached to keyword-triggered suggestions.
pub const KEYWORD_CONFIDENCE: f32 = 0.85;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const COMMAND_CHANNEL_CAPACITY: usize = 64;

enum SessionCommand {
    Transcript(String),
    Clear,
    Shutdown,
}

// ═══════════════════════════════════════════════════════════
// SessionHandle — the caller-facing side
// ═══════════════════════════════════════════════════════════

/// Handle to a running session engine.
///
/// Transcript updates and clears are fire-and-forget sends to the engine
/// task; accept/dismiss act on the shared queue directly and return
/// synchronously.
pub struct SessionHandle {
    id: Uuid,
    cmd_tx: mpsc::Sender<SessionCommand>,
    queue: Arc<SuggestionQueue>,
    attention: Arc<AtomicBool>,
    events: broadcast::Sender<EngineEvent>,
    task: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to engine events (suggestions, attention, narration).
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Feed the current full transcript text. Restarts the debounce
    /// countdown; the scan runs only after a quiet period.
    pub async fn update_transcript(&self, text: String) -> Result<(), DetectorError> {
        self.cmd_tx
            .send(SessionCommand::Transcript(text))
            .await
            .map_err(|_| DetectorError::SessionClosed)
    }

    /// Reset the session: queue, triggered phrases, attention flag.
    pub async fn clear(&self) -> Result<(), DetectorError> {
        self.cmd_tx
            .send(SessionCommand::Clear)
            .await
            .map_err(|_| DetectorError::SessionClosed)
    }

    /// Pending suggestions in arrival order.
    pub fn pending(&self) -> Result<Vec<Suggestion>, DetectorError> {
        self.queue.pending()
    }

    /// Is the visual-attention flag currently raised?
    pub fn attention(&self) -> bool {
        self.attention.load(Ordering::Relaxed)
    }

    /// Accept a suggestion; returns the finding payload on success.
    /// Accepting stands the attention flag down; the therapist saw it.
    pub fn accept(&self, id: &Uuid) -> Result<AckOutcome, DetectorError> {
        let outcome = self.queue.accept(id)?;
        if matches!(outcome, AckOutcome::Accepted(_)) {
            let _ = self.events.send(EngineEvent::SuggestionAccepted { id: *id });
            self.stand_down_attention();
        }
        Ok(outcome)
    }

    /// Dismiss a suggestion. The attention flag drops once nothing is
    /// left pending.
    pub fn dismiss(&self, id: &Uuid) -> Result<AckOutcome, DetectorError> {
        let outcome = self.queue.dismiss(id)?;
        if matches!(outcome, AckOutcome::Dismissed) {
            let _ = self.events.send(EngineEvent::SuggestionDismissed { id: *id });
            if self.queue.pending_is_empty()? {
                self.stand_down_attention();
            }
        }
        Ok(outcome)
    }

    /// Stop the engine task. Cancels pending timers and aborts any
    /// in-flight narration; safe to call more than once.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
        let task = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    fn stand_down_attention(&self) {
        if self.attention.swap(false, Ordering::Relaxed) {
            let _ = self
                .events
                .send(EngineEvent::AttentionChanged { active: false });
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Engine task
// ═══════════════════════════════════════════════════════════

/// Start a new session engine and return its handle.
pub fn spawn(
    config: DetectorConfig,
    lexicon: Arc<Lexicon>,
    narrator: Arc<Narrator>,
) -> SessionHandle {
    let id = Uuid::new_v4();
    let queue = Arc::new(SuggestionQueue::new(config.max_queue_size));
    let attention = Arc::new(AtomicBool::new(false));
    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

    let engine = SessionEngine {
        id,
        config,
        lexicon,
        narrator,
        queue: Arc::clone(&queue),
        attention: Arc::clone(&attention),
        events: events.clone(),
        scan_state: ScanState::new(),
        transcript: String::new(),
        scan_deadline: None,
        attention_deadline: None,
        narration_task: None,
    };
    let task = tokio::spawn(engine.run(cmd_rx));

    SessionHandle {
        id,
        cmd_tx,
        queue,
        attention,
        events,
        task: std::sync::Mutex::new(Some(task)),
    }
}

struct SessionEngine {
    id: Uuid,
    config: DetectorConfig,
    lexicon: Arc<Lexicon>,
    narrator: Arc<Narrator>,
    queue: Arc<SuggestionQueue>,
    attention: Arc<AtomicBool>,
    events: broadcast::Sender<EngineEvent>,
    scan_state: ScanState,
    transcript: String,
    scan_deadline: Option<Instant>,
    attention_deadline: Option<Instant>,
    narration_task: Option<tokio::task::JoinHandle<()>>,
}

/// Sleep until the deadline, or forever when none is armed.
async fn deadline_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl SessionEngine {
    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        tracing::info!(session = %self.id, "Session engine started");

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(SessionCommand::Transcript(text)) => self.on_transcript(text),
                    Some(SessionCommand::Clear) => self.on_clear(),
                    Some(SessionCommand::Shutdown) | None => break,
                },
                _ = deadline_sleep(self.scan_deadline) => {
                    self.scan_deadline = None;
                    self.run_scan_pass();
                }
                _ = deadline_sleep(self.attention_deadline) => {
                    self.attention_deadline = None;
                    self.set_attention(false);
                }
            }
        }

        self.teardown();
    }

    fn on_transcript(&mut self, text: String) {
        if !self.config.enabled {
            return;
        }
        self.transcript = text;
        self.scan_deadline = Some(Instant::now() + self.config.quiet_period);
    }

    fn on_clear(&mut self) {
        self.scan_state.reset();
        self.transcript.clear();
        self.scan_deadline = None;
        self.attention_deadline = None;
        if let Err(e) = self.queue.clear() {
            tracing::warn!(session = %self.id, error = %e, "Queue clear failed");
        }
        let _ = self.events.send(EngineEvent::QueueCleared);
        self.set_attention(false);
        tracing::debug!(session = %self.id, "Session state cleared");
    }

    fn run_scan_pass(&mut self) {
        let outcome = scan_transcript(
            &mut self.scan_state,
            &self.lexicon,
            self.config.lexicon_language,
            &self.transcript,
        );
        let detection = match outcome {
            ScanOutcome::MatchFound(detection) => detection,
            ScanOutcome::NoMatch => return,
        };

        let justification = format!("Detected keyword: \"{}\"", detection.phrase);
        match self
            .queue
            .enqueue(detection.finding, justification, KEYWORD_CONFIDENCE)
        {
            Ok(EnqueueOutcome::Enqueued(suggestion)) => {
                tracing::info!(
                    session = %self.id,
                    pulse = %suggestion.finding.id,
                    phrase = %detection.phrase,
                    "Suggestion enqueued"
                );
                let finding = suggestion.finding.clone();
                let _ = self
                    .events
                    .send(EngineEvent::SuggestionEnqueued { suggestion });
                self.set_attention(true);
                self.attention_deadline =
                    Some(Instant::now() + self.config.attention_window);
                self.start_narration(&finding);
            }
            Ok(EnqueueOutcome::DuplicatePending) => {
                tracing::debug!(session = %self.id, "Duplicate pending suggestion suppressed");
            }
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Enqueue failed");
            }
        }
    }

    /// Fire-and-forget whisper. A newer suggestion supersedes any
    /// in-flight utterance; failures are logged and swallowed, and narration
    /// never blocks suggestion delivery.
    fn start_narration(&mut self, finding: &Finding) {
        if !self.config.narration_enabled {
            return;
        }
        let text = finding.explanation(self.config.narration_language).to_string();
        if text.is_empty() {
            return;
        }

        let _ = self
            .events
            .send(EngineEvent::NarrationRequested { text: text.clone() });

        if let Some(previous) = self.narration_task.take() {
            previous.abort();
        }
        let narrator = Arc::clone(&self.narrator);
        let request = NarrationRequest::whisper(text, self.config.narration_language);
        self.narration_task = Some(tokio::spawn(async move {
            if let Err(e) = narrator.speak(&request).await {
                tracing::warn!(error = %e, "Narration failed; suggestion delivery unaffected");
            }
        }));
    }

    fn set_attention(&self, active: bool) {
        if self.attention.swap(active, Ordering::Relaxed) != active {
            let _ = self.events.send(EngineEvent::AttentionChanged { active });
        }
    }

    fn teardown(&mut self) {
        if let Some(task) = self.narration_task.take() {
            task.abort();
        }
        self.scan_deadline = None;
        self.attention_deadline = None;
        self.set_attention(false);
        let _ = self.events.send(EngineEvent::SessionEnded);
        tracing::info!(session = %self.id, "Session engine stopped");
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
