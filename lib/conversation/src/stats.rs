//! Usage statistics.

use crate::exchange::Intent;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message counts per intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicBreakdown {
    /// Math messages.
    pub math: u64,
    /// Coding messages.
    pub coding: u64,
    /// General messages.
    pub general: u64,
}

impl TopicBreakdown {
    /// Returns the count for one intent.
    #[must_use]
    pub fn get(&self, intent: Intent) -> u64 {
        match intent {
            Intent::Math => self.math,
            Intent::Coding => self.coding,
            Intent::General => self.general,
        }
    }

    fn bump(&mut self, intent: Intent) {
        match intent {
            Intent::Math => self.math += 1,
            Intent::Coding => self.coding += 1,
            Intent::General => self.general += 1,
        }
    }
}

/// Aggregate usage counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Sessions started.
    pub total_sessions: u64,
    /// Inputs answered.
    pub total_messages: u64,
    /// Feedback records received.
    pub total_feedback: u64,
    /// Answered inputs by intent.
    pub topics: TopicBreakdown,
    /// Sessions started per day.
    pub daily_sessions: BTreeMap<NaiveDate, u64>,
    /// When counting began.
    pub started_at: DateTime<Utc>,
}

impl UsageStats {
    /// Creates zeroed counters starting now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_sessions: 0,
            total_messages: 0,
            total_feedback: 0,
            topics: TopicBreakdown::default(),
            daily_sessions: BTreeMap::new(),
            started_at: Utc::now(),
        }
    }

    /// Counts a started session.
    pub fn record_session(&mut self) {
        self.record_session_on(Utc::now().date_naive());
    }

    /// Counts a session started on `day`.
    pub fn record_session_on(&mut self, day: NaiveDate) {
        self.total_sessions += 1;
        *self.daily_sessions.entry(day).or_default() += 1;
    }

    /// Counts an answered input.
    pub fn record_message(&mut self, intent: Intent) {
        self.total_messages += 1;
        self.topics.bump(intent);
    }

    /// Counts a feedback record.
    pub fn record_feedback(&mut self) {
        self.total_feedback += 1;
    }

    /// Returns the intent with the most messages, or `None` before any
    /// message was counted. Ties go to the earlier intent in [`Intent::ALL`].
    #[must_use]
    pub fn top_topic(&self) -> Option<Intent> {
        Intent::ALL
            .into_iter()
            .filter(|intent| self.topics.get(*intent) > 0)
            .fold(None, |best: Option<Intent>, intent| match best {
                Some(b) if self.topics.get(b) >= self.topics.get(intent) => Some(b),
                _ => Some(intent),
            })
    }
}

impl Default for UsageStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = UsageStats::new();
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.total_messages, 0);
        assert!(stats.top_topic().is_none());
    }

    #[test]
    fn messages_are_counted_per_topic() {
        let mut stats = UsageStats::new();
        stats.record_message(Intent::Math);
        stats.record_message(Intent::Coding);
        stats.record_message(Intent::Coding);

        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.topics.get(Intent::Coding), 2);
        assert_eq!(stats.top_topic(), Some(Intent::Coding));
    }

    #[test]
    fn top_topic_tie_goes_to_first_intent() {
        let mut stats = UsageStats::new();
        stats.record_message(Intent::General);
        stats.record_message(Intent::Math);
        assert_eq!(stats.top_topic(), Some(Intent::Math));
    }

    #[test]
    fn sessions_are_counted_per_day() {
        let mut stats = UsageStats::new();
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).expect("date");
        let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).expect("date");

        stats.record_session_on(monday);
        stats.record_session_on(monday);
        stats.record_session_on(tuesday);

        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.daily_sessions.get(&monday), Some(&2));
        assert_eq!(stats.daily_sessions.get(&tuesday), Some(&1));
    }

    #[test]
    fn stats_serialize_with_dates_as_keys() {
        let mut stats = UsageStats::new();
        stats.record_session_on(NaiveDate::from_ymd_opt(2024, 3, 4).expect("date"));
        stats.record_feedback();

        let json = serde_json::to_value(&stats).expect("serialize");
        assert_eq!(json["daily_sessions"]["2024-03-04"], 1);
        assert_eq!(json["total_feedback"], 1);
    }
}
