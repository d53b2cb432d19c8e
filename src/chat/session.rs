//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the
//! conversation, enforces the single-outstanding-exchange rule, and turns
//! gateway results into conversation turns. Every exchange ends in exactly
//! one of three ways: resolved with a reply, cancelled by the user, or
//! failed with a diagnostic turn.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::chat::config::ChatConfig;
use crate::client::{EngineGateway, OpenOutcome};
use crate::error::{Error, Result};
use crate::observability::{
    OPEN_ERRORS, OPEN_REQUESTS, REFRESH_ERRORS, SESSION_CANCELLATIONS, SESSION_EXCHANGE_DURATION,
    SESSION_FAILURES, SESSION_SUBMISSIONS, UPLOAD_ERRORS, UPLOADS,
};
use crate::types::{ChatRequest, Conversation, RecordSummary, Turn, UploadResponse};

/// The notice appended to the conversation when the user interrupts an
/// exchange. Rendered in italics, like a stage direction.
pub const INTERRUPTED_NOTICE: &str =
    "_Process interrupted. Your command has been restored to the input box for correction._";

/// How one exchange concluded.
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// The engine replied and the reply was appended.
    Resolved {
        /// Seconds the exchange took, to one decimal.
        elapsed_seconds: f64,
    },

    /// The user interrupted the exchange. The query is waiting in
    /// [`ChatSession::take_restored_input`].
    Cancelled,

    /// The exchange failed and a diagnostic turn was appended.
    Failed {
        /// The error that ended the exchange.
        error: Error,
    },
}

/// A shared handle that can cancel the in-flight exchange.
///
/// The session arms the handle for the duration of each exchange. Another
/// task (typically a Ctrl-C handler) calls [`cancel`](CancelHandle::cancel)
/// to interrupt it; cancelling while nothing is armed is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<Mutex<Option<CancellationToken>>>,
}

impl CancelHandle {
    /// Creates a new, unarmed handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the in-flight exchange, if any. Returns true if an
    /// exchange was armed.
    pub fn cancel(&self) -> bool {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Returns true if an exchange is currently armed.
    pub fn is_armed(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn arm(&self, token: CancellationToken) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    fn disarm(&self) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Counts elapsed tenths of a second while an exchange is in flight.
///
/// The display granularity is one decimal place, so the ticker counts
/// whole tenths rather than rounding a float each tick. The background
/// task is aborted on drop.
struct ElapsedTicker {
    tenths: Arc<AtomicU64>,
    task: tokio::task::JoinHandle<()>,
}

impl ElapsedTicker {
    fn start() -> Self {
        let tenths = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&tenths);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(100));
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });
        Self { tenths, task }
    }

    fn elapsed_seconds(&self) -> f64 {
        self.tenths.load(Ordering::Relaxed) as f64 / 10.0
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The engine URL the session talks to.
    pub engine_url: String,
    /// The number of turns in the conversation.
    pub turn_count: usize,
    /// Exchanges submitted.
    pub exchange_count: u64,
    /// Exchanges the user cancelled.
    pub cancelled_count: u64,
    /// Exchanges that failed.
    pub failed_count: u64,
    /// Records cached from the last refresh.
    pub cached_records: usize,
    /// Learned facts cached from the last refresh.
    pub cached_facts: usize,
    /// The auto-save transcript path, if set.
    pub transcript_path: Option<PathBuf>,
}

/// A chat session that manages conversation state and engine interactions.
pub struct ChatSession<G: EngineGateway> {
    gateway: G,
    config: ChatConfig,
    conversation: Conversation,
    cancel: CancelHandle,
    restored_input: Option<String>,
    records: Vec<RecordSummary>,
    facts: Vec<String>,
    exchange_count: u64,
    cancelled_count: u64,
    failed_count: u64,
}

impl<G: EngineGateway> ChatSession<G> {
    /// Creates a new chat session with the given gateway and configuration.
    pub fn new(gateway: G, config: ChatConfig) -> Self {
        Self {
            gateway,
            config,
            conversation: Conversation::new(),
            cancel: CancelHandle::new(),
            restored_input: None,
            records: Vec::new(),
            facts: Vec::new(),
            exchange_count: 0,
            cancelled_count: 0,
            failed_count: 0,
        }
    }

    /// Returns a handle that can cancel the in-flight exchange from
    /// another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Submits a query and waits for the exchange to conclude.
    ///
    /// This method:
    /// 1. Rejects empty queries and concurrent submissions
    /// 2. Snapshots the history, then appends the user turn
    /// 3. Runs the exchange, ticking elapsed time every 100ms
    /// 4. Appends the reply, interruption notice, or failure diagnostic
    ///
    /// A reply that arrives after cancellation was requested is discarded;
    /// the cancel wins.
    ///
    /// # Errors
    ///
    /// Returns an error only when the submission is rejected up front.
    /// Exchange failures conclude with [`ExchangeOutcome::Failed`].
    pub async fn submit(&mut self, input: &str) -> Result<ExchangeOutcome> {
        let query = input.trim();
        if query.is_empty() {
            return Err(Error::validation(
                "query must not be empty",
                Some("query".to_string()),
            ));
        }
        if self.cancel.is_armed() {
            return Err(Error::validation(
                "an exchange is already in flight",
                None,
            ));
        }

        SESSION_SUBMISSIONS.click();
        self.exchange_count += 1;

        // Snapshot before appending so the query is not duplicated into
        // its own history.
        let history = self.conversation.snapshot_for_history();
        self.conversation.append(Turn::user(query));
        let request = ChatRequest::new(query, history);

        let token = CancellationToken::new();
        self.cancel.arm(token.clone());
        let ticker = ElapsedTicker::start();
        let result = self.gateway.chat(request, &token).await;
        let local_elapsed = ticker.elapsed_seconds();
        drop(ticker);
        self.cancel.disarm();

        match result {
            Ok(_) if token.is_cancelled() => {
                // The reply lost the race with the cancel.
                self.conclude_cancelled(input);
                Ok(ExchangeOutcome::Cancelled)
            }
            Ok(response) => {
                let elapsed_seconds = if response.duration > 0.0 {
                    response.duration
                } else {
                    local_elapsed
                };
                SESSION_EXCHANGE_DURATION.add(elapsed_seconds);
                self.conversation
                    .append(Turn::assistant_timed(response.reply, elapsed_seconds));
                let _ = self.auto_save_transcript();
                // The exchange may have taught the engine something or
                // extracted records; refresh the caches best-effort.
                let _ = self.refresh_records().await;
                let _ = self.refresh_facts().await;
                Ok(ExchangeOutcome::Resolved { elapsed_seconds })
            }
            Err(error) if error.is_cancellation() => {
                self.conclude_cancelled(input);
                Ok(ExchangeOutcome::Cancelled)
            }
            Err(error) => {
                SESSION_FAILURES.click();
                self.failed_count += 1;
                let notice = self.failure_notice(&error);
                self.conversation.append(Turn::assistant(notice));
                let _ = self.auto_save_transcript();
                Ok(ExchangeOutcome::Failed { error })
            }
        }
    }

    fn conclude_cancelled(&mut self, input: &str) {
        SESSION_CANCELLATIONS.click();
        self.cancelled_count += 1;
        self.restored_input = Some(input.to_string());
        self.conversation.append(Turn::assistant(INTERRUPTED_NOTICE));
        let _ = self.auto_save_transcript();
    }

    fn failure_notice(&self, error: &Error) -> String {
        let headline = match error {
            Error::Connection { .. } | Error::Timeout { .. } => format!(
                "I could not reach the engine at `{}`.",
                self.config.engine_url
            ),
            _ => "The engine could not complete this request.".to_string(),
        };
        format!(
            "**Engine Error**\n\n{headline}\n\nDetails: {error}\n\n\
             Check that the engine is running at `{url}`. \
             Use `/engine <url>` to point this session at a different address.",
            url = self.config.engine_url,
        )
    }

    /// Takes the query restored by the last cancellation, if any.
    ///
    /// The presentation layer pre-fills the input line with it so the
    /// user can correct and resubmit.
    pub fn take_restored_input(&mut self) -> Option<String> {
        self.restored_input.take()
    }

    /// Uploads a document and records the outcome as conversation turns.
    ///
    /// Uploads are independent of the chat exchange guard: they may run
    /// while no chat is possible, and they never block one.
    pub async fn upload(&mut self, path: &Path) -> Result<UploadResponse> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document")
            .to_string();
        self.conversation
            .append(Turn::user(format!("Processing **{name}**...")));
        UPLOADS.click();

        match self.gateway.upload(path).await {
            Ok(response) => {
                let notice = upload_notice(&name, &response);
                self.conversation.append(Turn::assistant(notice));
                let _ = self.auto_save_transcript();
                // Extraction may have produced new records; refresh the
                // caches opportunistically.
                let _ = self.refresh_records().await;
                Ok(response)
            }
            Err(error) => {
                UPLOAD_ERRORS.click();
                self.conversation.append(Turn::assistant(format!(
                    "**Processing Failed**\n\nCould not handle `{name}`. Error: {error}"
                )));
                let _ = self.auto_save_transcript();
                Err(error)
            }
        }
    }

    /// Asks the engine to open a path on its machine.
    pub async fn open_path(&self, path: &str) -> Result<OpenOutcome> {
        OPEN_REQUESTS.click();
        let outcome = self.gateway.open(path).await.inspect_err(|_| {
            OPEN_ERRORS.click();
        })?;
        if !outcome.opened {
            OPEN_ERRORS.click();
        }
        Ok(outcome)
    }

    /// Refreshes the cached records from the engine.
    pub async fn refresh_records(&mut self) -> Result<&[RecordSummary]> {
        match self.gateway.records().await {
            Ok(records) => {
                self.records = records;
                Ok(&self.records)
            }
            Err(error) => {
                REFRESH_ERRORS.click();
                Err(error)
            }
        }
    }

    /// Refreshes the cached learned facts from the engine.
    pub async fn refresh_facts(&mut self) -> Result<&[String]> {
        match self.gateway.knowledge().await {
            Ok(response) => {
                self.facts = response.facts;
                Ok(&self.facts)
            }
            Err(error) => {
                REFRESH_ERRORS.click();
                Err(error)
            }
        }
    }

    /// Probes whether the engine is reachable.
    pub async fn check_connection(&self) -> Result<()> {
        self.gateway.health().await
    }

    /// Returns the cached records from the last refresh.
    pub fn records(&self) -> &[RecordSummary] {
        &self.records
    }

    /// Returns the cached learned facts from the last refresh.
    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    /// Returns all turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        self.conversation.all()
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Returns the engine URL this session talks to.
    pub fn engine_url(&self) -> &str {
        &self.config.engine_url
    }

    /// Replaces the gateway and the engine URL it points at.
    pub fn set_engine(&mut self, url: impl Into<String>, gateway: G) {
        self.config.engine_url = url.into();
        self.gateway = gateway;
    }

    /// Sets the auto-save transcript path.
    pub fn set_transcript_path(&mut self, path: Option<PathBuf>) {
        self.config.transcript_path = path;
    }

    /// Returns the configured transcript path, if any.
    pub fn transcript_path(&self) -> Option<&Path> {
        self.config.transcript_path.as_deref()
    }

    /// Saves the transcript to the specified path.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.conversation.save_to(path)
    }

    /// Loads a transcript from disk, replacing the current conversation.
    pub fn load_transcript_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.conversation.load_from(path)
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            engine_url: self.config.engine_url.clone(),
            turn_count: self.conversation.len(),
            exchange_count: self.exchange_count,
            cancelled_count: self.cancelled_count,
            failed_count: self.failed_count,
            cached_records: self.records.len(),
            cached_facts: self.facts.len(),
            transcript_path: self.config.transcript_path.clone(),
        }
    }

    fn auto_save_transcript(&self) -> Result<()> {
        if let Some(path) = &self.config.transcript_path {
            self.conversation.save_to(path)
        } else {
            Ok(())
        }
    }
}

fn upload_notice(name: &str, response: &UploadResponse) -> String {
    let (kind, summary) = match &response.analysis {
        Some(analysis) => (analysis.kind.as_deref(), analysis.summary.as_deref()),
        None => (None, None),
    };
    format!(
        "## File Processed: {name}\n\n**Type:** {kind}\n\n{summary}",
        kind = kind.unwrap_or("General Knowledge"),
        summary =
            summary.unwrap_or("Document has been analyzed and indexed in your local memory."),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::types::{Analysis, ChatResponse, KnowledgeResponse, TurnRole};

    /// What the scripted gateway should do before answering a chat.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum ChatBehavior {
        Answer,
        CancelFirst,
    }

    struct ScriptedGateway {
        behavior: ChatBehavior,
        replies: Mutex<VecDeque<Result<ChatResponse>>>,
        seen: Mutex<Vec<ChatRequest>>,
        upload_result: Option<Result<UploadResponse>>,
        records: Vec<RecordSummary>,
        facts: Vec<String>,
    }

    impl ScriptedGateway {
        fn answering(replies: Vec<Result<ChatResponse>>) -> Self {
            Self {
                behavior: ChatBehavior::Answer,
                replies: Mutex::new(replies.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
                upload_result: None,
                records: Vec::new(),
                facts: Vec::new(),
            }
        }

        fn cancelling(reply: Result<ChatResponse>) -> Self {
            let mut gateway = Self::answering(vec![reply]);
            gateway.behavior = ChatBehavior::CancelFirst;
            gateway
        }
    }

    #[async_trait]
    impl EngineGateway for ScriptedGateway {
        async fn chat(
            &self,
            request: ChatRequest,
            cancel: &CancellationToken,
        ) -> Result<ChatResponse> {
            self.seen.lock().unwrap().push(request);
            if self.behavior == ChatBehavior::CancelFirst {
                cancel.cancel();
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::connection("script exhausted", None)))
        }

        async fn upload(&self, _path: &Path) -> Result<UploadResponse> {
            self.upload_result
                .clone()
                .unwrap_or_else(|| Err(Error::upload("document", "no script")))
        }

        async fn open(&self, path: &str) -> Result<OpenOutcome> {
            Ok(OpenOutcome {
                opened: true,
                message: format!("Opened {path}"),
            })
        }

        async fn knowledge(&self) -> Result<KnowledgeResponse> {
            Ok(KnowledgeResponse {
                facts: self.facts.clone(),
            })
        }

        async fn records(&self) -> Result<Vec<RecordSummary>> {
            Ok(self.records.clone())
        }

        async fn health(&self) -> Result<()> {
            Ok(())
        }
    }

    fn reply(text: &str, duration: f64) -> Result<ChatResponse> {
        Ok(ChatResponse {
            reply: text.to_string(),
            duration,
        })
    }

    fn session(gateway: ScriptedGateway) -> ChatSession<ScriptedGateway> {
        ChatSession::new(gateway, ChatConfig::new())
    }

    #[tokio::test]
    async fn resolved_exchange_appends_both_turns() {
        let mut session = session(ScriptedGateway::answering(vec![reply("the answer", 1.2)]));
        let outcome = session.submit("what is 2+2?").await.unwrap();

        assert!(matches!(
            outcome,
            ExchangeOutcome::Resolved { elapsed_seconds } if elapsed_seconds == 1.2
        ));
        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[0].content, "what is 2+2?");
        assert_eq!(turns[1].role, TurnRole::Assistant);
        assert_eq!(turns[1].content, "the answer");
        assert_eq!(turns[1].elapsed_seconds, Some(1.2));
    }

    #[tokio::test]
    async fn resolved_exchange_survives_transcript_save_failure() {
        let gateway = ScriptedGateway::answering(vec![reply("the answer", 1.2)]);
        let config = ChatConfig::new().with_transcript_path(Some(PathBuf::from(
            "/nonexistent-root-dir/omnimind/transcript.json",
        )));
        let mut session = ChatSession::new(gateway, config);

        let outcome = session.submit("what is 2+2?").await.unwrap();
        assert!(matches!(outcome, ExchangeOutcome::Resolved { .. }));
        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "the answer");
    }

    #[tokio::test]
    async fn empty_query_rejected_without_turns() {
        let mut session = session(ScriptedGateway::answering(vec![]));
        let err = session.submit("   ").await.unwrap_err();
        assert!(err.is_validation());
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn history_excludes_the_current_query() {
        let gateway = ScriptedGateway::answering(vec![reply("four", 0.5), reply("six", 0.5)]);
        let mut session = session(gateway);

        session.submit("what is 2+2?").await.unwrap();
        session.submit("and 2+4?").await.unwrap();

        let seen = session.gateway.seen.lock().unwrap();
        assert!(seen[0].history.is_empty());
        assert_eq!(seen[1].query, "and 2+4?");
        assert_eq!(seen[1].history.len(), 2);
        assert_eq!(seen[1].history[0].content, "what is 2+2?");
        assert_eq!(seen[1].history[1].content, "four");
    }

    #[tokio::test]
    async fn failure_appends_diagnostic_naming_the_engine() {
        let gateway =
            ScriptedGateway::answering(vec![Err(Error::connection("connection refused", None))]);
        let mut session = session(gateway);

        let outcome = session.submit("hello?").await.unwrap();
        assert!(matches!(
            outcome,
            ExchangeOutcome::Failed { error } if error.is_transport()
        ));

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "hello?");
        assert!(turns[1].content.contains("http://localhost:8000"));
        assert!(turns[1].content.contains("connection refused"));
        assert!(session.take_restored_input().is_none());
    }

    #[tokio::test]
    async fn cancellation_restores_input_and_appends_notice() {
        let gateway = ScriptedGateway::cancelling(Err(Error::cancelled("aborted")));
        let mut session = session(gateway);

        let outcome = session.submit("slow question").await.unwrap();
        assert!(matches!(outcome, ExchangeOutcome::Cancelled));

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, INTERRUPTED_NOTICE);
        assert_eq!(
            session.take_restored_input().as_deref(),
            Some("slow question")
        );
        // The restored input is consumed.
        assert!(session.take_restored_input().is_none());
    }

    #[tokio::test]
    async fn late_reply_loses_to_the_cancel() {
        // The gateway cancels the token but still produces a reply; the
        // session must discard it.
        let gateway = ScriptedGateway::cancelling(reply("too late", 9.9));
        let mut session = session(gateway);

        let outcome = session.submit("never mind").await.unwrap();
        assert!(matches!(outcome, ExchangeOutcome::Cancelled));
        assert!(session.turns().iter().all(|t| t.content != "too late"));
        assert_eq!(session.turns()[1].content, INTERRUPTED_NOTICE);
    }

    #[tokio::test]
    async fn session_is_usable_after_cancellation() {
        let gateway = ScriptedGateway::cancelling(Err(Error::cancelled("aborted")));
        let mut session = session(gateway);
        session.submit("first try").await.unwrap();

        session.gateway.behavior = ChatBehavior::Answer;
        session
            .gateway
            .replies
            .lock()
            .unwrap()
            .push_back(reply("second answer", 0.3));

        let outcome = session.submit("first try, corrected").await.unwrap();
        assert!(matches!(outcome, ExchangeOutcome::Resolved { .. }));
        assert_eq!(session.turns().len(), 4);
    }

    #[tokio::test]
    async fn upload_success_appends_processing_turns() {
        let mut gateway = ScriptedGateway::answering(vec![]);
        gateway.upload_result = Some(Ok(UploadResponse {
            status: Some("success".to_string()),
            file: Some("quote.pdf".to_string()),
            analysis: Some(Analysis {
                kind: Some("Vendor Quote".to_string()),
                summary: Some("Steel, 4 weeks.".to_string()),
            }),
        }));
        gateway.records = vec![RecordSummary {
            id: Some(1),
            vendor_name: Some("Acme".to_string()),
            material: None,
            total: None,
            currency: None,
            delivery_weeks: None,
            payment_terms: None,
            date: None,
        }];
        let mut session = session(gateway);

        session.upload(Path::new("/tmp/quote.pdf")).await.unwrap();

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "Processing **quote.pdf**...");
        assert!(turns[1].content.contains("File Processed: quote.pdf"));
        assert!(turns[1].content.contains("Vendor Quote"));
        // Upload triggers a records refresh.
        assert_eq!(session.records().len(), 1);
    }

    #[tokio::test]
    async fn upload_failure_appends_failure_turn() {
        let mut gateway = ScriptedGateway::answering(vec![]);
        gateway.upload_result = Some(Err(Error::upload("quote.pdf", "unsupported format")));
        let mut session = session(gateway);

        let err = session.upload(Path::new("/tmp/quote.pdf")).await.unwrap_err();
        assert!(err.is_upload());

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert!(turns[1].content.contains("Processing Failed"));
        assert!(turns[1].content.contains("quote.pdf"));
    }

    #[tokio::test]
    async fn clear_resets_the_conversation() {
        let mut session = session(ScriptedGateway::answering(vec![reply("hi", 0.1)]));
        session.submit("hello").await.unwrap();
        assert_eq!(session.turns().len(), 2);

        session.clear();
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn stats_count_outcomes() {
        let gateway = ScriptedGateway::answering(vec![
            reply("ok", 0.1),
            Err(Error::connection("refused", None)),
        ]);
        let mut session = session(gateway);
        session.submit("one").await.unwrap();
        session.submit("two").await.unwrap();

        let stats = session.stats();
        assert_eq!(stats.exchange_count, 2);
        assert_eq!(stats.failed_count, 1);
        assert_eq!(stats.cancelled_count, 0);
        assert_eq!(stats.turn_count, 4);
        assert_eq!(stats.engine_url, "http://localhost:8000");
    }

    #[tokio::test]
    async fn concurrent_submission_is_refused_without_turns() {
        let mut session = session(ScriptedGateway::answering(vec![]));
        // Simulate an outstanding exchange.
        session.cancel.arm(CancellationToken::new());

        let err = session.submit("second query").await.unwrap_err();
        assert!(err.is_validation());
        assert!(session.turns().is_empty());
        session.cancel.disarm();
    }

    #[tokio::test]
    async fn unarmed_cancel_is_a_no_op() {
        let session = session(ScriptedGateway::answering(vec![]));
        let handle = session.cancel_handle();
        assert!(!handle.is_armed());
        assert!(!handle.cancel());
    }
}
