//! Response generation.
//!
//! Classifies the input, then answers from the generative model when one
//! is loaded or from the rule table otherwise, and records the exchange in
//! the caller's history. The responder holds no conversation state of its
//! own; the history is passed in on every call.

use crate::error::ResponderError;
use crate::exchange::{Exchange, Intent};
use crate::history::ConversationHistory;
use crate::intent;
use crate::rules::{DEFAULT_REPLY, RuleTable};
use pidgin_tutor_ai::prompt::PROMPT_WINDOW;
use pidgin_tutor_ai::{GenerationParams, ModelHandle, PromptBuilder, PromptTokens, ResponseCleaner};
use rootcause::prelude::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// Generated by the model.
    Model,
    /// Canned reply from the rule table.
    Rule,
    /// No model and no matching rule.
    Default,
}

/// The answer to one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text to show the user.
    pub text: String,
    /// Intent detected for the input.
    pub intent: Intent,
    /// Where the text came from.
    pub source: ReplySource,
}

/// Answers user inputs.
#[derive(Debug, Clone)]
pub struct Responder {
    model: ModelHandle,
    rules: RuleTable,
    prompt: PromptBuilder,
    cleaner: ResponseCleaner,
    params: GenerationParams,
}

impl Responder {
    /// Creates a responder with the built-in rule table, default markers
    /// and default sampling parameters.
    #[must_use]
    pub fn new(model: ModelHandle) -> Self {
        Self {
            model,
            rules: RuleTable::builtin(),
            prompt: PromptBuilder::default(),
            cleaner: ResponseCleaner::default(),
            params: GenerationParams::default(),
        }
    }

    /// Uses a different rule table.
    #[must_use]
    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    /// Uses different sampling parameters.
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Uses different turn markers for prompts and cleanup.
    #[must_use]
    pub fn with_tokens(mut self, tokens: PromptTokens) -> Self {
        self.prompt = PromptBuilder::new(tokens.clone());
        self.cleaner = ResponseCleaner::new(tokens);
        self
    }

    /// Returns the model handle.
    #[must_use]
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Returns the rule table.
    #[must_use]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Answers `text` and appends the exchange to `history`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails. The history is not
    /// touched in that case and nothing is retried.
    #[instrument(skip_all, fields(history_len = history.len()))]
    pub async fn respond(
        &self,
        history: &mut ConversationHistory,
        text: &str,
    ) -> Result<Reply, Report<ResponderError>> {
        let scores = intent::score(text);
        let intent = scores.intent();
        debug!(math = scores.math, coding = scores.coding, %intent, "classified input");

        let (reply_text, source) = match self.model.backend() {
            Some(backend) => {
                let prompt = self.prompt.build(history.window(PROMPT_WINDOW), text);
                let raw = backend
                    .generate(&prompt, &self.params)
                    .await
                    .context(ResponderError::Generation {
                        backend: backend.name().to_string(),
                    })?;
                (self.cleaner.clean(&raw), ReplySource::Model)
            }
            None => self.fallback(text),
        };

        history.append(Exchange::new(text, reply_text.clone(), intent));

        Ok(Reply {
            text: reply_text,
            intent,
            source,
        })
    }

    /// Answers from the rule table, substituting [`DEFAULT_REPLY`] when
    /// nothing matches. Does not touch any history.
    #[must_use]
    pub fn fallback(&self, text: &str) -> (String, ReplySource) {
        match self.rules.lookup_entry(text) {
            Some(entry) => {
                debug!(trigger = entry.trigger(), "rule matched");
                (entry.response().to_string(), ReplySource::Rule)
            }
            None => {
                debug!("no rule matched");
                (DEFAULT_REPLY.to_string(), ReplySource::Default)
            }
        }
    }
}
