//! Learner feedback on tutor replies.
//!
//! Feedback is optional. A learner may rate a reply with stars or a word,
//! and may add a comment.

use crate::error::FeedbackError;
use chrono::{DateTime, Utc};
use pidgin_tutor_core::{CallerId, FeedbackId};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A learner's rating of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    content = "value",
    rename_all = "snake_case",
    try_from = "StoredRating"
)]
pub enum FeedbackRating {
    /// One to five stars.
    Stars(u8),
    /// The reply helped.
    Helpful,
    /// The reply did not help.
    NotHelpful,
    /// Excellent explanation.
    Excellent,
    /// Good explanation.
    Good,
    /// Passable explanation.
    Okay,
    /// Poor explanation.
    Poor,
    /// The learner wants more detail.
    Detailed,
}

impl FeedbackRating {
    /// Creates a star rating, rejecting values outside 1 to 5.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError::StarsOutOfRange`] for 0 or more than 5.
    pub fn stars(stars: u8) -> Result<Self, Report<FeedbackError>> {
        if (1..=5).contains(&stars) {
            Ok(Self::Stars(stars))
        } else {
            Err(FeedbackError::StarsOutOfRange { stars }.into())
        }
    }

    /// Returns true for ratings that count as positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Stars(n) => *n >= 4,
            Self::Helpful | Self::Excellent | Self::Good => true,
            Self::NotHelpful | Self::Okay | Self::Poor | Self::Detailed => false,
        }
    }
}

/// Wire form of [`FeedbackRating`], checked on the way in.
#[derive(Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
enum StoredRating {
    Stars(u8),
    Helpful,
    NotHelpful,
    Excellent,
    Good,
    Okay,
    Poor,
    Detailed,
}

impl TryFrom<StoredRating> for FeedbackRating {
    type Error = FeedbackError;

    fn try_from(stored: StoredRating) -> Result<Self, Self::Error> {
        Ok(match stored {
            StoredRating::Stars(stars) if (1..=5).contains(&stars) => Self::Stars(stars),
            StoredRating::Stars(stars) => return Err(FeedbackError::StarsOutOfRange { stars }),
            StoredRating::Helpful => Self::Helpful,
            StoredRating::NotHelpful => Self::NotHelpful,
            StoredRating::Excellent => Self::Excellent,
            StoredRating::Good => Self::Good,
            StoredRating::Okay => Self::Okay,
            StoredRating::Poor => Self::Poor,
            StoredRating::Detailed => Self::Detailed,
        })
    }
}

impl fmt::Display for FeedbackRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stars(n) => write!(f, "{n} stars"),
            Self::Helpful => f.write_str("helpful"),
            Self::NotHelpful => f.write_str("not helpful"),
            Self::Excellent => f.write_str("excellent"),
            Self::Good => f.write_str("good"),
            Self::Okay => f.write_str("okay"),
            Self::Poor => f.write_str("poor"),
            Self::Detailed => f.write_str("needs more detail"),
        }
    }
}

impl FromStr for FeedbackRating {
    type Err = Report<FeedbackError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if let Ok(stars) = normalized.parse::<u8>() {
            return Self::stars(stars);
        }
        match normalized.as_str() {
            "helpful" | "yes" | "👍" => Ok(Self::Helpful),
            "not helpful" | "not_helpful" | "bad" | "no" | "👎" => Ok(Self::NotHelpful),
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "okay" | "ok" => Ok(Self::Okay),
            "poor" => Ok(Self::Poor),
            "detailed" | "more" => Ok(Self::Detailed),
            _ => Err(FeedbackError::UnknownRating {
                input: s.to_string(),
            }
            .into()),
        }
    }
}

/// A feedback record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    /// Unique identifier.
    pub id: FeedbackId,
    /// The caller who gave the feedback.
    pub caller: CallerId,
    /// The rating.
    pub rating: FeedbackRating,
    /// Input of the rated exchange, if one was rated.
    pub input: Option<String>,
    /// Reply of the rated exchange, if one was rated.
    pub output: Option<String>,
    /// Optional comment from the learner.
    pub comment: Option<String>,
    /// When the feedback was given.
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Creates feedback that is not tied to a specific reply.
    #[must_use]
    pub fn new(caller: CallerId, rating: FeedbackRating) -> Self {
        Self {
            id: FeedbackId::new(),
            caller,
            rating,
            input: None,
            output: None,
            comment: None,
            created_at: Utc::now(),
        }
    }

    /// Creates feedback on one exchange.
    #[must_use]
    pub fn for_exchange(
        caller: CallerId,
        rating: FeedbackRating,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            input: Some(input.into()),
            output: Some(output.into()),
            ..Self::new(caller, rating)
        }
    }

    /// Adds a comment to the feedback.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_range_is_validated() {
        assert_eq!(FeedbackRating::stars(5).ok(), Some(FeedbackRating::Stars(5)));
        assert!(FeedbackRating::stars(0).is_err());
        assert!(FeedbackRating::stars(6).is_err());
    }

    #[test]
    fn rating_parsing() {
        assert_eq!("4".parse::<FeedbackRating>().ok(), Some(FeedbackRating::Stars(4)));
        assert_eq!("Good".parse::<FeedbackRating>().ok(), Some(FeedbackRating::Good));
        assert_eq!(
            "bad".parse::<FeedbackRating>().ok(),
            Some(FeedbackRating::NotHelpful)
        );
        assert!("9".parse::<FeedbackRating>().is_err());
        assert!("meh".parse::<FeedbackRating>().is_err());
    }

    #[test]
    fn positive_ratings() {
        assert!(FeedbackRating::Stars(4).is_positive());
        assert!(!FeedbackRating::Stars(2).is_positive());
        assert!(FeedbackRating::Helpful.is_positive());
        assert!(!FeedbackRating::Detailed.is_positive());
    }

    #[test]
    fn feedback_for_exchange_with_comment() {
        let feedback = Feedback::for_exchange(
            CallerId::from("ada"),
            FeedbackRating::Excellent,
            "wetin be loop?",
            "Loop na when...",
        )
        .with_comment("E clear well well");

        assert_eq!(feedback.input.as_deref(), Some("wetin be loop?"));
        assert_eq!(feedback.comment.as_deref(), Some("E clear well well"));
        assert!(feedback.id.to_string().starts_with("fb_"));
    }

    #[test]
    fn feedback_serializes_rating_tag() {
        let feedback = Feedback::new(CallerId::from("ada"), FeedbackRating::Stars(3));
        let json = serde_json::to_value(&feedback).expect("serialize");

        assert_eq!(json["rating"]["kind"], "stars");
        assert_eq!(json["rating"]["value"], 3);
        assert_eq!(json["caller"], "ada");
    }

    #[test]
    fn stored_ratings_are_validated() {
        let good: FeedbackRating =
            serde_json::from_str(r#"{"kind":"stars","value":5}"#).expect("deserialize");
        assert_eq!(good, FeedbackRating::Stars(5));

        let word: FeedbackRating =
            serde_json::from_str(r#"{"kind":"not_helpful"}"#).expect("deserialize");
        assert_eq!(word, FeedbackRating::NotHelpful);

        let err = serde_json::from_str::<FeedbackRating>(r#"{"kind":"stars","value":9}"#)
            .expect_err("out of range");
        assert!(err.to_string().contains('9'));
        assert!(serde_json::from_str::<FeedbackRating>(r#"{"kind":"stars","value":0}"#).is_err());
    }
}
