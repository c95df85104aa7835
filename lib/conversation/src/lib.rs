//! Conversation core for pidgin-tutor.
//!
//! This crate provides:
//!
//! - **Intent**: keyword classification of inputs into math, coding or general
//! - **Rules**: ordered canned replies used when no model is loaded
//! - **History**: the bounded window of recent exchanges
//! - **Responder**: model-or-rules answering of a single input
//! - **Sessions**: per-caller state behind an injectable store
//! - **Service**: the front-end entry point, with feedback, usage stats and
//!   conversation snapshots

pub mod error;
pub mod exchange;
pub mod feedback;
pub mod history;
pub mod intent;
pub mod responder;
pub mod rules;
pub mod service;
pub mod session;
pub mod snapshot;
pub mod stats;

pub use error::{FeedbackError, ResponderError, ServiceError, SessionError, SnapshotError};
pub use exchange::{Exchange, Intent, ParseIntentError};
pub use feedback::{Feedback, FeedbackRating};
pub use history::{ConversationHistory, DEFAULT_HISTORY_CAPACITY, HistoryState};
pub use intent::{IntentScores, classify};
pub use responder::{Reply, ReplySource, Responder};
pub use rules::{DEFAULT_REPLY, RuleEntry, RuleTable};
pub use service::{FEEDBACK_PROMPT_INTERVAL, ServiceReply, SessionSummary, TutorService};
pub use session::{InMemorySessionStore, Session, SessionStore};
pub use snapshot::{ConversationSnapshot, DEFAULT_SNAPSHOT_FILE};
pub use stats::{TopicBreakdown, UsageStats};
