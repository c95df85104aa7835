//! Tutoring session management.
//!
//! A session belongs to one caller and owns that caller's conversation
//! history. Sessions live in a [`SessionStore`] handed to the service.

use crate::error::SessionError;
use crate::exchange::Intent;
use crate::history::{ConversationHistory, DEFAULT_HISTORY_CAPACITY};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pidgin_tutor_core::{CallerId, SessionId};
use rootcause::prelude::Report;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// A caller's tutoring session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// The caller who owns this session.
    pub caller: CallerId,
    /// Name to greet the caller by.
    pub display_name: Option<String>,
    /// Topic the caller chose to focus on.
    pub topic: Option<Intent>,
    /// Recent exchanges.
    pub history: ConversationHistory,
    /// Inputs answered since the session started. Not reset by clearing
    /// the history.
    pub message_count: u64,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
    /// When the session last answered an input.
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session with a default-sized history.
    #[must_use]
    pub fn new(caller: CallerId) -> Self {
        Self::with_history_capacity(caller, DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a session whose history holds at most `capacity` exchanges.
    #[must_use]
    pub fn with_history_capacity(caller: CallerId, capacity: usize) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            caller,
            display_name: None,
            topic: None,
            history: ConversationHistory::with_capacity(capacity),
            message_count: 0,
            started_at: now,
            last_active_at: now,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Counts an answered input and returns the new count.
    pub fn record_message(&mut self) -> u64 {
        self.message_count += 1;
        self.last_active_at = Utc::now();
        self.message_count
    }

    /// Sets the preferred topic.
    pub fn set_topic(&mut self, topic: Intent) {
        self.topic = Some(topic);
        self.last_active_at = Utc::now();
    }

    /// Drops every exchange from the history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Returns the name to address the caller by.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.caller.as_str())
    }
}

/// Storage for sessions, keyed by caller.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the caller's session, creating one if none exists. The flag
    /// is true when the session was created by this call.
    async fn get_or_create(
        &self,
        caller: &CallerId,
        display_name: Option<&str>,
    ) -> Result<(Session, bool), Report<SessionError>>;

    /// Returns the caller's session, if there is one.
    async fn find(&self, caller: &CallerId) -> Result<Option<Session>, Report<SessionError>>;

    /// Returns the caller's session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the caller has no session.
    async fn get(&self, caller: &CallerId) -> Result<Session, Report<SessionError>> {
        match self.find(caller).await? {
            Some(session) => Ok(session),
            None => Err(SessionError::NotFound {
                caller: caller.clone(),
            }
            .into()),
        }
    }

    /// Stores a session, replacing any previous one for the same caller.
    async fn save(&self, session: Session) -> Result<(), Report<SessionError>>;

    /// Removes the caller's session. Returns whether one existed.
    async fn remove(&self, caller: &CallerId) -> Result<bool, Report<SessionError>>;

    /// Returns the number of stored sessions.
    async fn len(&self) -> Result<usize, Report<SessionError>>;
}

/// Session store kept in process memory.
#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<CallerId, Session>>,
    history_capacity: usize,
}

impl InMemorySessionStore {
    /// Creates an empty store whose new sessions use the default history size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates an empty store whose new sessions hold `capacity` exchanges.
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            history_capacity: capacity,
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(
        &self,
        caller: &CallerId,
        display_name: Option<&str>,
    ) -> Result<(Session, bool), Report<SessionError>> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(caller) {
            if let Some(name) = display_name {
                session.display_name = Some(name.to_string());
            }
            return Ok((session.clone(), false));
        }

        let mut session = Session::with_history_capacity(caller.clone(), self.history_capacity);
        session.display_name = display_name.map(str::to_string);
        info!(%caller, session_id = %session.id, "session started");
        sessions.insert(caller.clone(), session.clone());
        Ok((session, true))
    }

    async fn find(&self, caller: &CallerId) -> Result<Option<Session>, Report<SessionError>> {
        Ok(self.sessions.read().await.get(caller).cloned())
    }

    async fn save(&self, session: Session) -> Result<(), Report<SessionError>> {
        self.sessions
            .write()
            .await
            .insert(session.caller.clone(), session);
        Ok(())
    }

    async fn remove(&self, caller: &CallerId) -> Result<bool, Report<SessionError>> {
        let removed = self.sessions.write().await.remove(caller).is_some();
        if removed {
            info!(%caller, "session removed");
        }
        Ok(removed)
    }

    async fn len(&self) -> Result<usize, Report<SessionError>> {
        Ok(self.sessions.read().await.len())
    }
}
