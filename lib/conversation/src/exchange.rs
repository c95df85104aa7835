//! Exchange and intent types.

use chrono::{DateTime, Utc};
use pidgin_tutor_ai::PromptTurn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse topic of a user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Mathematics questions.
    Math,
    /// Programming questions.
    Coding,
    /// Anything else, including ties.
    #[default]
    General,
}

impl Intent {
    /// All intents, in display order.
    pub const ALL: [Intent; 3] = [Intent::Math, Intent::Coding, Intent::General];

    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Coding => "coding",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not an intent label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIntentError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for ParseIntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown topic '{}', expected math, coding or general",
            self.input
        )
    }
}

impl std::error::Error for ParseIntentError {}

impl FromStr for Intent {
    type Err = ParseIntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "math" | "maths" | "mathematics" => Ok(Self::Math),
            "coding" | "code" | "programming" => Ok(Self::Coding),
            "general" => Ok(Self::General),
            _ => Err(ParseIntentError {
                input: s.to_string(),
            }),
        }
    }
}

/// One turn of a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    input: String,
    output: String,
    intent: Intent,
    timestamp: DateTime<Utc>,
}

impl Exchange {
    /// Creates an exchange stamped with the current time.
    #[must_use]
    pub fn new(input: impl Into<String>, output: impl Into<String>, intent: Intent) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            intent,
            timestamp: Utc::now(),
        }
    }

    /// What the user said.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// What the tutor answered.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The intent detected for the input.
    #[must_use]
    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// When the exchange was created.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl PromptTurn for Exchange {
    fn user_text(&self) -> &str {
        &self.input
    }

    fn bot_text(&self) -> &str {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_parsing() {
        assert_eq!("Math".parse::<Intent>(), Ok(Intent::Math));
        assert_eq!(" coding ".parse::<Intent>(), Ok(Intent::Coding));
        assert_eq!("general".parse::<Intent>(), Ok(Intent::General));
        assert!("history".parse::<Intent>().is_err());
    }

    #[test]
    fn exchange_keeps_collaborator_field_names() {
        let exchange = Exchange::new("Wetin be Python?", "Python na language", Intent::Coding);

        let json = serde_json::to_value(&exchange).expect("serialize");

        assert_eq!(json["input"], "Wetin be Python?");
        assert_eq!(json["output"], "Python na language");
        assert_eq!(json["intent"], "coding");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn exchange_as_prompt_turn() {
        let exchange = Exchange::new("hi", "hello", Intent::General);
        assert_eq!(exchange.user_text(), "hi");
        assert_eq!(exchange.bot_text(), "hello");
    }
}
