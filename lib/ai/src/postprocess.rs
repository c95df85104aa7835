//! Cleanup of raw model output.
//!
//! Decoded generations echo the prompt and carry leftover marker tokens.
//! Cleanup keeps the continuation after the last bot marker, strips the
//! remaining markers and cuts long answers down to two sentences.

use crate::prompt::PromptTokens;

/// Answers longer than this many characters are truncated.
pub const MAX_RESPONSE_CHARS: usize = 300;

/// Number of sentence fragments kept when truncating.
pub const KEPT_SENTENCES: usize = 2;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Turns raw generated text into display text.
#[derive(Debug, Clone, Default)]
pub struct ResponseCleaner {
    tokens: PromptTokens,
}

impl ResponseCleaner {
    /// Creates a cleaner that strips the given markers.
    #[must_use]
    pub fn new(tokens: PromptTokens) -> Self {
        Self { tokens }
    }

    /// Cleans raw model output. Never fails; text without markers passes
    /// through with only whitespace trimming and truncation applied.
    #[must_use]
    pub fn clean(&self, raw: &str) -> String {
        let continuation = match raw.rfind(&self.tokens.bot) {
            Some(pos) => &raw[pos + self.tokens.bot.len()..],
            None => raw,
        };

        let stripped = continuation
            .replace(&self.tokens.end_of_text, "")
            .replace(&self.tokens.user, "");
        let mut response = stripped.trim().to_string();

        if response.chars().count() > MAX_RESPONSE_CHARS {
            let kept: Vec<&str> = response
                .split(SENTENCE_TERMINATORS)
                .take(KEPT_SENTENCES)
                .collect();
            response = format!("{}.", kept.join(". "));
        }

        response.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_four_sentences() -> String {
        let sentence = "Addition na when you dey put numbers together, like when you carry mangoes from two baskets";
        format!("{sentence} first. {sentence} second! {sentence} third? {sentence} fourth.")
    }

    #[test]
    fn keeps_text_after_last_bot_marker() {
        let cleaner = ResponseCleaner::default();
        assert_eq!(
            cleaner.clean("blah <bot> real answer<|endoftext|>"),
            "real answer"
        );
    }

    #[test]
    fn echoed_prompt_is_discarded() {
        let cleaner = ResponseCleaner::default();
        let raw = "<user> hi <bot> Hello! <|endoftext|>\n<user> wetin be loop? <bot> Loop na repeat.<|endoftext|><user>";
        assert_eq!(cleaner.clean(raw), "Loop na repeat.");
    }

    #[test]
    fn missing_markers_pass_through() {
        let cleaner = ResponseCleaner::default();
        assert_eq!(cleaner.clean("  just text  "), "just text");
        assert_eq!(cleaner.clean(""), "");
    }

    #[test]
    fn long_output_is_cut_to_two_sentences() {
        let cleaner = ResponseCleaner::default();
        let raw = long_four_sentences();
        assert!(raw.chars().count() > MAX_RESPONSE_CHARS);

        let cleaned = cleaner.clean(&raw);

        assert!(cleaned.contains("first"));
        assert!(cleaned.contains("second"));
        assert!(!cleaned.contains("third"));
        assert!(!cleaned.contains("fourth"));
        assert!(cleaned.ends_with('.'));
        assert!(cleaned.chars().count() <= MAX_RESPONSE_CHARS + 3);
    }

    #[test]
    fn short_output_is_not_truncated() {
        let cleaner = ResponseCleaner::default();
        let raw = "One. Two. Three. Four.";
        assert_eq!(cleaner.clean(raw), raw);
    }

    #[test]
    fn gpt2_markers_are_stripped() {
        let cleaner = ResponseCleaner::new(PromptTokens::gpt2_chat());
        assert_eq!(
            cleaner.clean("<|user|> hi <|bot|> How you dey?<|endoftext|><|user|>"),
            "How you dey?"
        );
    }
}
