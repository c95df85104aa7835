//! Tutor service.
//!
//! The entry point for front ends. Looks up the caller's session, answers
//! through the [`Responder`], stores the updated session and keeps usage
//! counters and feedback.

use crate::error::ServiceError;
use crate::exchange::{Exchange, Intent};
use crate::feedback::{Feedback, FeedbackRating};
use crate::responder::{ReplySource, Responder};
use crate::session::{InMemorySessionStore, Session, SessionStore};
use crate::snapshot::ConversationSnapshot;
use crate::stats::UsageStats;
use chrono::{DateTime, Utc};
use pidgin_tutor_core::{CallerId, SessionId};
use rootcause::prelude::{Report, ResultExt};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, instrument, warn};

/// A session asks for feedback every this many answered inputs.
pub const FEEDBACK_PROMPT_INTERVAL: u64 = 5;

/// The service's answer to one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    /// Text to show the user.
    pub text: String,
    /// Intent detected for the input.
    pub intent: Intent,
    /// Where the text came from.
    pub source: ReplySource,
    /// Inputs answered in this session so far, including this one.
    pub message_count: u64,
    /// Whether the front end should ask for feedback now.
    pub ask_feedback: bool,
}

/// Overview of one caller's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,
    /// Name to address the caller by.
    pub name: String,
    /// Preferred topic, if chosen.
    pub topic: Option<Intent>,
    /// Inputs answered since the session started.
    pub message_count: u64,
    /// Exchanges currently held in history.
    pub history_len: usize,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// Whether the session was created by the call that returned this.
    pub is_new: bool,
}

impl SessionSummary {
    fn of(session: &Session, is_new: bool) -> Self {
        Self {
            session_id: session.id,
            name: session.greeting_name().to_string(),
            topic: session.topic,
            message_count: session.message_count,
            history_len: session.history.len(),
            started_at: session.started_at,
            is_new,
        }
    }
}

/// Tutoring front door shared by every caller.
///
/// Calls that change a session run one at a time per caller, so overlapping
/// inputs from the same caller are answered in turn and none is lost.
/// Feedback records are kept for the life of the service.
pub struct TutorService<S = InMemorySessionStore> {
    responder: Responder,
    store: S,
    stats: RwLock<UsageStats>,
    feedback: RwLock<Vec<Feedback>>,
    turns: Mutex<HashMap<CallerId, Arc<Mutex<()>>>>,
}

impl TutorService<InMemorySessionStore> {
    /// Creates a service backed by an in-memory session store.
    #[must_use]
    pub fn in_memory(responder: Responder) -> Self {
        Self::new(responder, InMemorySessionStore::new())
    }
}

impl<S: SessionStore> TutorService<S> {
    /// Creates a service over the given session store.
    #[must_use]
    pub fn new(responder: Responder, store: S) -> Self {
        Self {
            responder,
            store,
            stats: RwLock::new(UsageStats::new()),
            feedback: RwLock::new(Vec::new()),
            turns: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the responder.
    #[must_use]
    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Returns the session store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens (or reopens) the caller's session, updating the display name
    /// when one is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self))]
    pub async fn start(
        &self,
        caller: &CallerId,
        display_name: Option<&str>,
    ) -> Result<SessionSummary, Report<ServiceError>> {
        let (session, created) = self.session_for(caller, display_name).await?;
        Ok(SessionSummary::of(&session, created))
    }

    /// Answers one input from the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call or the session store fails. A
    /// failed answer leaves the session unchanged.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn respond(
        &self,
        caller: &CallerId,
        text: &str,
    ) -> Result<ServiceReply, Report<ServiceError>> {
        let _turn = self.turn(caller).await;
        let (mut session, _) = self.session_for(caller, None).await?;

        let reply = match self.responder.respond(&mut session.history, text).await {
            Ok(reply) => reply,
            Err(report) => {
                warn!(%caller, "could not answer input");
                return Err(report).context(ServiceError::Respond {
                    caller: caller.clone(),
                });
            }
        };

        let message_count = session.record_message();
        self.save(session).await?;
        self.stats.write().await.record_message(reply.intent);

        let ask_feedback = message_count % FEEDBACK_PROMPT_INTERVAL == 0;
        debug!(message_count, ask_feedback, source = ?reply.source, "answered input");

        Ok(ServiceReply {
            text: reply.text,
            intent: reply.intent,
            source: reply.source,
            message_count,
            ask_feedback,
        })
    }

    /// Returns the caller's held exchanges, oldest first. Empty when the
    /// caller has no session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn history(&self, caller: &CallerId) -> Result<Vec<Exchange>, Report<ServiceError>> {
        Ok(self
            .find(caller)
            .await?
            .map(|session| session.history.all().to_vec())
            .unwrap_or_default())
    }

    /// Drops the caller's history. Returns false when there was no session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self))]
    pub async fn clear(&self, caller: &CallerId) -> Result<bool, Report<ServiceError>> {
        let _turn = self.turn(caller).await;
        let Some(mut session) = self.find(caller).await? else {
            return Ok(false);
        };
        session.clear_history();
        self.save(session).await?;
        info!(%caller, "history cleared");
        Ok(true)
    }

    /// Records the caller's preferred topic.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self))]
    pub async fn set_topic(
        &self,
        caller: &CallerId,
        topic: Intent,
    ) -> Result<(), Report<ServiceError>> {
        let _turn = self.turn(caller).await;
        let (mut session, _) = self.session_for(caller, None).await?;
        session.set_topic(topic);
        self.save(session).await
    }

    /// Stores feedback from the caller, tied to their latest exchange when
    /// there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self))]
    pub async fn record_feedback(
        &self,
        caller: &CallerId,
        rating: FeedbackRating,
    ) -> Result<Feedback, Report<ServiceError>> {
        let latest = self
            .find(caller)
            .await?
            .and_then(|session| session.history.last().cloned());

        let feedback = match latest {
            Some(exchange) => {
                Feedback::for_exchange(caller.clone(), rating, exchange.input(), exchange.output())
            }
            None => Feedback::new(caller.clone(), rating),
        };

        self.stats.write().await.record_feedback();
        self.feedback.write().await.push(feedback.clone());
        info!(%caller, %rating, feedback_id = %feedback.id, "feedback recorded");
        Ok(feedback)
    }

    /// Returns every feedback record, oldest first.
    pub async fn feedback(&self) -> Vec<Feedback> {
        self.feedback.read().await.clone()
    }

    /// Returns a copy of the usage counters.
    pub async fn stats(&self) -> UsageStats {
        self.stats.read().await.clone()
    }

    /// Summarizes the caller's session.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller has no session or the store fails.
    pub async fn session_summary(
        &self,
        caller: &CallerId,
    ) -> Result<SessionSummary, Report<ServiceError>> {
        let session = self.store.get(caller).await.context(ServiceError::Session {
            caller: caller.clone(),
        })?;
        Ok(SessionSummary::of(&session, false))
    }

    /// Writes the caller's history to `path` as JSON and returns what was
    /// written. A caller without a session gets an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or the file cannot be
    /// written.
    #[instrument(skip(self))]
    pub async fn save_snapshot(
        &self,
        caller: &CallerId,
        path: &Path,
    ) -> Result<ConversationSnapshot, Report<ServiceError>> {
        let snapshot = match self.find(caller).await? {
            Some(session) => ConversationSnapshot::from_history(caller.clone(), &session.history),
            None => ConversationSnapshot {
                caller: caller.clone(),
                saved_at: Utc::now(),
                exchanges: Vec::new(),
            },
        };

        snapshot.save(path).await.context(ServiceError::Snapshot {
            caller: caller.clone(),
        })?;
        info!(%caller, path = %path.display(), "conversation saved");
        Ok(snapshot)
    }

    /// Ends the caller's session. Returns false when there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    #[instrument(skip(self))]
    pub async fn end(&self, caller: &CallerId) -> Result<bool, Report<ServiceError>> {
        let turn = self.turn(caller).await;
        let removed = self.store.remove(caller).await.context(ServiceError::Session {
            caller: caller.clone(),
        });
        drop(turn);

        // Clones are only taken under the map lock, so a count of one means
        // nobody holds or waits on this caller's turn.
        let mut turns = self.turns.lock().await;
        if turns.get(caller).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            turns.remove(caller);
        }
        removed
    }

    /// Waits for the caller's turn to change their session.
    async fn turn(&self, caller: &CallerId) -> OwnedMutexGuard<()> {
        let lock = self
            .turns
            .lock()
            .await
            .entry(caller.clone())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    async fn session_for(
        &self,
        caller: &CallerId,
        display_name: Option<&str>,
    ) -> Result<(Session, bool), Report<ServiceError>> {
        let (session, created) = self
            .store
            .get_or_create(caller, display_name)
            .await
            .context(ServiceError::Session {
                caller: caller.clone(),
            })?;
        if created {
            self.stats.write().await.record_session();
        }
        Ok((session, created))
    }

    async fn find(&self, caller: &CallerId) -> Result<Option<Session>, Report<ServiceError>> {
        self.store.find(caller).await.context(ServiceError::Session {
            caller: caller.clone(),
        })
    }

    async fn save(&self, session: Session) -> Result<(), Report<ServiceError>> {
        let caller = session.caller.clone();
        self.store
            .save(session)
            .await
            .context(ServiceError::Session { caller })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::DEFAULT_REPLY;
    use async_trait::async_trait;
    use pidgin_tutor_ai::{GenerationError, GenerationParams, GenerativeBackend, ModelHandle};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Answers like a chat model, or fails while `broken` is set.
    #[derive(Default)]
    struct FlakyModel {
        broken: AtomicBool,
    }

    #[async_trait]
    impl GenerativeBackend for FlakyModel {
        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<String, Report<GenerationError>> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(GenerationError::RequestFailed {
                    reason: "status 503".to_string(),
                }
                .into());
            }
            Ok(format!("{prompt} Na so e be. Make we continue.<|endoftext|>"))
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    /// Gives way to other tasks before answering, so overlapping calls
    /// interleave.
    struct SlowModel;

    #[async_trait]
    impl GenerativeBackend for SlowModel {
        async fn generate(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
        ) -> Result<String, Report<GenerationError>> {
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            Ok("Na so e be.".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn rule_service() -> TutorService {
        TutorService::in_memory(Responder::new(ModelHandle::Absent))
    }

    #[tokio::test]
    async fn add_question_end_to_end() {
        let service = rule_service();
        let caller = CallerId::from("ada");

        let reply = service
            .respond(&caller, "How I go add 15 and 27?")
            .await
            .expect("respond");

        assert_eq!(reply.intent, Intent::Math);
        let add_reply = service.responder().rules().lookup("add").expect("add rule");
        assert!(reply.text == add_reply || reply.text == DEFAULT_REPLY);
        assert_eq!(reply.message_count, 1);
        assert!(!reply.ask_feedback);
        assert_eq!(service.history(&caller).await.expect("history").len(), 1);
    }

    #[tokio::test]
    async fn feedback_is_requested_every_fifth_message() {
        let service = rule_service();
        let caller = CallerId::from("ada");

        let mut asked = Vec::new();
        for _ in 0..10 {
            let reply = service.respond(&caller, "hello").await.expect("respond");
            asked.push(reply.ask_feedback);
        }

        let expected: Vec<bool> = (1..=10).map(|n| n % 5 == 0).collect();
        assert_eq!(asked, expected);
    }

    #[tokio::test]
    async fn history_is_bounded_and_per_caller() {
        let service = rule_service();
        let ada = CallerId::from("ada");
        let bola = CallerId::from("bola");

        for n in 0..7 {
            service
                .respond(&ada, &format!("question {n}"))
                .await
                .expect("respond");
        }
        service.respond(&bola, "hello").await.expect("respond");

        let history = service.history(&ada).await.expect("history");
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].input(), "question 2");
        assert_eq!(service.history(&bola).await.expect("history").len(), 1);

        let stats = service.stats().await;
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_messages, 8);
    }

    #[tokio::test]
    async fn clear_empties_history_but_keeps_count() {
        let service = rule_service();
        let caller = CallerId::from("ada");

        assert!(!service.clear(&caller).await.expect("clear"));

        service.respond(&caller, "hello").await.expect("respond");
        assert!(service.clear(&caller).await.expect("clear"));

        assert!(service.history(&caller).await.expect("history").is_empty());
        let summary = service.session_summary(&caller).await.expect("summary");
        assert_eq!(summary.message_count, 1);
        assert_eq!(summary.history_len, 0);
    }

    #[tokio::test]
    async fn start_reports_new_sessions_once() {
        let service = rule_service();
        let caller = CallerId::from(1234_i64);

        let first = service.start(&caller, Some("Chidi")).await.expect("start");
        assert!(first.is_new);
        assert_eq!(first.name, "Chidi");

        let again = service.start(&caller, None).await.expect("start");
        assert!(!again.is_new);
        assert_eq!(again.session_id, first.session_id);
        assert_eq!(service.stats().await.total_sessions, 1);
    }

    #[tokio::test]
    async fn topic_is_remembered() {
        let service = rule_service();
        let caller = CallerId::from("ada");

        service.set_topic(&caller, Intent::Coding).await.expect("topic");

        let summary = service.session_summary(&caller).await.expect("summary");
        assert_eq!(summary.topic, Some(Intent::Coding));
    }

    #[tokio::test]
    async fn summary_of_unknown_caller_fails() {
        let service = rule_service();
        assert!(service.session_summary(&CallerId::from("nobody")).await.is_err());
    }

    #[tokio::test]
    async fn feedback_is_tied_to_latest_exchange() {
        let service = rule_service();
        let caller = CallerId::from("ada");

        let loose = service
            .record_feedback(&caller, FeedbackRating::Good)
            .await
            .expect("feedback");
        assert!(loose.input.is_none());

        service.respond(&caller, "wetin be loop?").await.expect("respond");
        let tied = service
            .record_feedback(&caller, FeedbackRating::Stars(5))
            .await
            .expect("feedback");
        assert_eq!(tied.input.as_deref(), Some("wetin be loop?"));

        assert_eq!(service.feedback().await.len(), 2);
        assert_eq!(service.stats().await.total_feedback, 2);
    }

    #[tokio::test]
    async fn model_failure_leaves_session_unchanged() {
        let model = Arc::new(FlakyModel::default());
        let service = TutorService::in_memory(Responder::new(ModelHandle::Present(model.clone())));
        let caller = CallerId::from("ada");

        let reply = service.respond(&caller, "hello").await.expect("respond");
        assert_eq!(reply.source, ReplySource::Model);
        assert_eq!(reply.text, "Na so e be. Make we continue.");

        model.broken.store(true, Ordering::SeqCst);
        assert!(service.respond(&caller, "wetin be loop?").await.is_err());

        let summary = service.session_summary(&caller).await.expect("summary");
        assert_eq!(summary.message_count, 1);
        assert_eq!(summary.history_len, 1);
        assert_eq!(service.stats().await.total_messages, 1);
    }

    #[tokio::test]
    async fn overlapping_inputs_from_one_caller_are_all_kept() {
        let service = TutorService::in_memory(Responder::new(ModelHandle::present(SlowModel)));
        let caller = CallerId::from("ada");

        let (first, second) = tokio::join!(
            service.respond(&caller, "one"),
            service.respond(&caller, "two")
        );
        let mut counts = vec![
            first.expect("respond").message_count,
            second.expect("respond").message_count,
        ];
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2]);

        let history = service.history(&caller).await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(service.stats().await.total_messages, 2);
        assert_eq!(
            service.session_summary(&caller).await.expect("summary").message_count,
            2
        );
    }

    #[tokio::test]
    async fn end_releases_the_callers_turn() {
        let service = rule_service();
        let caller = CallerId::from("ada");
        service.respond(&caller, "hello").await.expect("respond");
        assert_eq!(service.turns.lock().await.len(), 1);

        assert!(service.end(&caller).await.expect("end"));
        assert!(service.turns.lock().await.is_empty());
    }

    #[tokio::test]
    async fn snapshot_is_written() {
        let service = rule_service();
        let caller = CallerId::from("ada");
        service.respond(&caller, "hello").await.expect("respond");
        service.respond(&caller, "bye").await.expect("respond");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("log.json");
        let written = service.save_snapshot(&caller, &path).await.expect("save");

        assert_eq!(written.exchanges.len(), 2);
        let loaded = ConversationSnapshot::load(&path).await.expect("load");
        assert_eq!(loaded.exchanges[1].input(), "bye");
    }

    #[tokio::test]
    async fn end_removes_session() {
        let service = rule_service();
        let caller = CallerId::from("ada");
        service.respond(&caller, "hello").await.expect("respond");

        assert!(service.end(&caller).await.expect("end"));
        assert!(service.history(&caller).await.expect("history").is_empty());
    }
}
