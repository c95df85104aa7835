//! Prompt rendering for the generative model.
//!
//! The fine-tuned model sees conversations as flat text: each past turn is
//! `{user} input {bot} output {eot}` on its own line, followed by an open
//! `{user} input {bot}` turn for the model to continue.

use serde::{Deserialize, Serialize};

/// Number of past exchanges rendered into a prompt.
pub const PROMPT_WINDOW: usize = 3;

/// Marker tokens delimiting turns in prompts and generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTokens {
    /// Opens a user turn.
    pub user: String,
    /// Opens a bot turn.
    pub bot: String,
    /// Ends a completed turn.
    pub end_of_text: String,
}

impl PromptTokens {
    /// Plain markers: `<user>`, `<bot>`, `<|endoftext|>`.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            user: "<user>".to_string(),
            bot: "<bot>".to_string(),
            end_of_text: "<|endoftext|>".to_string(),
        }
    }

    /// GPT-2 chat markers: `<|user|>`, `<|bot|>`, `<|endoftext|>`.
    #[must_use]
    pub fn gpt2_chat() -> Self {
        Self {
            user: "<|user|>".to_string(),
            bot: "<|bot|>".to_string(),
            end_of_text: "<|endoftext|>".to_string(),
        }
    }
}

impl Default for PromptTokens {
    fn default() -> Self {
        Self::plain()
    }
}

/// A completed turn that can be rendered into a prompt.
pub trait PromptTurn {
    /// What the user said.
    fn user_text(&self) -> &str;
    /// What the bot answered.
    fn bot_text(&self) -> &str;
}

impl PromptTurn for (&str, &str) {
    fn user_text(&self) -> &str {
        self.0
    }

    fn bot_text(&self) -> &str {
        self.1
    }
}

/// Renders history plus a new input into a single prompt string.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    tokens: PromptTokens,
}

impl PromptBuilder {
    /// Creates a builder using the given markers.
    #[must_use]
    pub fn new(tokens: PromptTokens) -> Self {
        Self { tokens }
    }

    /// Returns the markers this builder renders with.
    #[must_use]
    pub fn tokens(&self) -> &PromptTokens {
        &self.tokens
    }

    /// Builds the prompt from the last [`PROMPT_WINDOW`] turns of `history`
    /// (oldest first) and the new user input.
    #[must_use]
    pub fn build<T: PromptTurn>(&self, history: &[T], new_input: &str) -> String {
        let PromptTokens {
            user,
            bot,
            end_of_text,
        } = &self.tokens;

        let start = history.len().saturating_sub(PROMPT_WINDOW);
        let mut prompt = String::new();
        for turn in &history[start..] {
            prompt.push_str(&format!(
                "{user} {} {bot} {} {end_of_text}\n",
                turn.user_text(),
                turn.bot_text()
            ));
        }
        prompt.push_str(&format!("{user} {new_input} {bot}"));
        prompt
    }
}
