//! Rule-based response table.
//!
//! An ordered list of trigger substrings and canned replies. Lookup
//! returns the first entry whose trigger occurs in the lower-cased input,
//! so declaration order decides overlaps: `hi` answers "this" and
//! `addition` must stay ahead of `add`.

/// Reply used when no rule matches and no model is loaded.
pub const DEFAULT_REPLY: &str =
    "I dey learn to answer that question. For now, try ask me about basic Math or Python coding!";

const BUILTIN_RULES: &[(&str, &str)] = &[
    // Greetings
    (
        "hello",
        "Hello! How you dey? I be AI wey dey teach Mathematics and Coding for Pidgin. Wetin you wan learn today?",
    ),
    (
        "hi",
        "Hi! I dey here to help you learn Math and Coding. You fit ask me anything!",
    ),
    (
        "good morning",
        "Good morning! Hope you dey ready to learn something new today?",
    ),
    (
        "good afternoon",
        "Good afternoon! Wetin you wan learn this afternoon?",
    ),
    (
        "good evening",
        "Good evening! How your day been? Make we learn something!",
    ),
    // Math
    (
        "addition",
        "Addition na when you dey put numbers together. Like 2 + 3 = 5. You wan practice?",
    ),
    (
        "add",
        "Addition na when you dey put numbers together. Like 5 + 7 = 12. You wan try?",
    ),
    (
        "subtraction",
        "Subtraction na when you dey remove number from another number. Like 10 - 3 = 7. Make I give you example?",
    ),
    (
        "subtract",
        "To subtract mean say you dey minus. Like 15 - 6 = 9. You understand?",
    ),
    (
        "multiplication",
        "Multiplication na when you dey add same number many times. Like 4 × 3 = 12 (4 + 4 + 4). You wan learn more?",
    ),
    (
        "multiply",
        "To multiply mean say you dey times. Like 6 × 5 = 30. E easy!",
    ),
    (
        "division",
        "Division na when you dey share something equally. Like 12 ÷ 3 = 4. Make I explain more?",
    ),
    (
        "divide",
        "To divide mean say you dey share. Like 20 ÷ 5 = 4. You fit try?",
    ),
    (
        "algebra",
        "Algebra na mathematics wey dey use letters like x and y. E dey help us solve problems wey we never know some numbers.",
    ),
    (
        "fraction",
        "Fraction na part of whole thing. Like 1/2 na half. 1/4 na quarter. E dey show how you cut something into pieces.",
    ),
    // Coding
    (
        "python",
        "Python na very good programming language! E easy to learn and e dey powerful. You wan start learn Python?",
    ),
    (
        "programming",
        "Programming na when you dey write instructions for computer. E be like you dey teach computer how to do something.",
    ),
    (
        "coding",
        "Coding na same thing as programming. You dey write code make computer understand wetin to do.",
    ),
    (
        "variable",
        "Variable na like box wey you fit keep information inside for your code. For Python, you write am like: name = 'Chidi'",
    ),
    (
        "function",
        "Function na block of code wey you fit use many times. E be like shortcut wey dey do specific work.",
    ),
    (
        "loop",
        "Loop na when you wan make computer repeat something many times. E dey save time!",
    ),
    (
        "if statement",
        "If statement dey help computer make decision. Like 'if age >= 18, print You fit vote'.",
    ),
    (
        "list",
        "List na like basket wey you fit put many things inside. For Python: fruits = ['apple', 'banana', 'orange']",
    ),
    // General
    (
        "help",
        "I fit help you with:\n1. Mathematics (Addition, Subtraction, Algebra, etc.)\n2. Coding (Python basics, Variables, Loops, etc.)\n\nJust ask me anything!",
    ),
    (
        "thank",
        "You dey welcome! I happy say I fit help you. You get another question?",
    ),
    (
        "thanks",
        "No problem at all! If you need more help, just ask me!",
    ),
    (
        "bye",
        "Bye bye! Come back anytime you wan learn something new. I go dey here!",
    ),
    (
        "goodbye",
        "Goodbye! Hope you don learn something new. See you next time!",
    ),
];

/// A trigger substring and the reply it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    trigger: String,
    response: String,
}

impl RuleEntry {
    /// Creates an entry. The trigger is lower-cased so it can match the
    /// lower-cased input.
    #[must_use]
    pub fn new(trigger: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into().to_lowercase(),
            response: response.into(),
        }
    }

    /// The trigger substring.
    #[must_use]
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// The canned reply.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }
}

/// Ordered table of canned replies. Read-only once built.
#[derive(Debug, Clone)]
pub struct RuleTable {
    entries: Vec<RuleEntry>,
}

impl RuleTable {
    /// Builds a table from entries, keeping their order.
    #[must_use]
    pub fn new(entries: Vec<RuleEntry>) -> Self {
        Self { entries }
    }

    /// The built-in tutoring table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_RULES
                .iter()
                .map(|(trigger, response)| RuleEntry::new(*trigger, *response))
                .collect(),
        )
    }

    /// Appends an entry after all existing ones.
    #[must_use]
    pub fn with_rule(mut self, trigger: impl Into<String>, response: impl Into<String>) -> Self {
        self.entries.push(RuleEntry::new(trigger, response));
        self
    }

    /// Returns the first entry whose trigger occurs in `text`.
    #[must_use]
    pub fn lookup_entry(&self, text: &str) -> Option<&RuleEntry> {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| lowered.contains(entry.trigger.as_str()))
    }

    /// Returns the reply of the first matching entry, or `None` for no match.
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<&str> {
        self.lookup_entry(text).map(RuleEntry::response)
    }

    /// Returns the entries in match order.
    #[must_use]
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_matches() {
        let table = RuleTable::builtin();
        let reply = table.lookup("hello there").expect("greeting");
        assert!(reply.starts_with("Hello! How you dey?"));
    }

    #[test]
    fn unknown_input_has_no_match() {
        assert!(RuleTable::builtin().lookup("xyzzy").is_none());
    }

    #[test]
    fn matching_ignores_case() {
        let table = RuleTable::builtin();
        let entry = table.lookup_entry("Teach me PYTHON").expect("match");
        assert_eq!(entry.trigger(), "python");
    }

    #[test]
    fn first_declared_trigger_wins() {
        let table = RuleTable::builtin();
        assert_eq!(
            table.lookup_entry("what is addition").map(RuleEntry::trigger),
            Some("addition")
        );
        assert_eq!(
            table.lookup_entry("how I go add 15 and 27?").map(RuleEntry::trigger),
            Some("add")
        );
        // "thanks" contains "thank", which is declared first
        assert_eq!(
            table.lookup_entry("thanks a lot").map(RuleEntry::trigger),
            Some("thank")
        );
    }

    #[test]
    fn triggers_match_inside_other_words() {
        // "this" contains "hi"
        assert_eq!(
            RuleTable::builtin().lookup_entry("explain this").map(RuleEntry::trigger),
            Some("hi")
        );
    }

    #[test]
    fn custom_table_order_is_declaration_order() {
        let specific_last = RuleTable::new(Vec::new())
            .with_rule("add", "short")
            .with_rule("addition", "long");
        assert_eq!(specific_last.lookup("addition please"), Some("short"));

        let specific_first = RuleTable::new(Vec::new())
            .with_rule("Addition", "long")
            .with_rule("add", "short");
        assert_eq!(specific_first.lookup("addition please"), Some("long"));
    }

    #[test]
    fn builtin_table_size() {
        let table = RuleTable::builtin();
        assert_eq!(table.len(), 28);
        assert_eq!(table.entries()[0].trigger(), "hello");
    }
}
