//! Keyword intent classifier.
//!
//! Counts how many math and coding keywords occur anywhere in the
//! lower-cased input. Matching is plain substring containment, so `if`
//! also hits inside `gift` and `-` hits any hyphen.

use crate::exchange::Intent;

/// Keywords that point at a mathematics question.
pub const MATH_KEYWORDS: &[&str] = &[
    "add", "subtract", "multiply", "divide", "calculate", "solve", "algebra", "fraction",
    "equation", "math", "number", "count", "plus", "minus", "times", "divided", "+", "-", "×",
    "÷", "*", "/",
];

/// Keywords that point at a programming question.
pub const CODING_KEYWORDS: &[&str] = &[
    "code", "programming", "python", "variable", "function", "loop", "if", "else", "for",
    "while", "print", "input", "class", "coding", "program", "script", "debug", "list", "string",
];

/// Keyword hit counts for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntentScores {
    /// Number of math keywords found.
    pub math: usize,
    /// Number of coding keywords found.
    pub coding: usize,
}

impl IntentScores {
    /// Picks the intent with strictly more hits; ties are general.
    #[must_use]
    pub fn intent(&self) -> Intent {
        use std::cmp::Ordering;

        match self.math.cmp(&self.coding) {
            Ordering::Greater => Intent::Math,
            Ordering::Less => Intent::Coding,
            Ordering::Equal => Intent::General,
        }
    }
}

/// Counts keyword hits in `text`.
#[must_use]
pub fn score(text: &str) -> IntentScores {
    let lowered = text.to_lowercase();
    let hits = |keywords: &[&str]| keywords.iter().filter(|kw| lowered.contains(**kw)).count();

    IntentScores {
        math: hits(MATH_KEYWORDS),
        coding: hits(CODING_KEYWORDS),
    }
}

/// Classifies `text` into an intent.
#[must_use]
pub fn classify(text: &str) -> Intent {
    score(text).intent()
}
