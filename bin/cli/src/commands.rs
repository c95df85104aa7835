//! Parsing of terminal input lines.

use pidgin_tutor_conversation::{FeedbackRating, Intent};
use std::fmt;
use std::path::PathBuf;

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the command list.
    Help,
    /// Show the held exchanges.
    History,
    /// Drop the held exchanges.
    Clear,
    /// Show the current topic, or set a new one.
    Topic(Option<Intent>),
    /// Show usage statistics.
    Stats,
    /// Rate the latest reply.
    Feedback(FeedbackRating),
    /// Save the conversation, optionally to a specific file.
    Save(Option<PathBuf>),
    /// Leave the tutor.
    Quit,
    /// A question for the tutor.
    Chat(String),
    /// A blank line.
    Empty,
}

/// Errors from parsing an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The line starts with `/` but names no known command.
    Unknown { name: String },
    /// A required argument is missing.
    MissingArgument { usage: &'static str },
    /// The topic is not math, coding or general.
    InvalidTopic { input: String },
    /// The rating is not 1 to 5 or a known word.
    InvalidRating { input: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { name } => {
                write!(f, "I no know the command '/{name}'. Type /help to see wetin I fit do.")
            }
            Self::MissingArgument { usage } => write!(f, "Usage: {usage}"),
            Self::InvalidTopic { input } => {
                write!(f, "'{input}' no be topic. Choose math, coding or general.")
            }
            Self::InvalidRating { input } => {
                write!(f, "'{input}' no be rating. Use 1 to 5, good or bad.")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Command list shown by `/help`.
pub const HELP_TEXT: &str = "\
Commands:
  /help                      show this list
  /history                   show our recent conversation
  /clear                     forget our recent conversation
  /topic [math|coding|general]  show or choose your topic
  /stats                     show usage statistics
  /feedback <1-5|good|bad>   rate my last answer
  /save [path]               save our conversation as JSON
  /quit                      leave

Anything else na question for me.";

impl Command {
    /// Parses one input line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown commands or invalid arguments.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Chat(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };

        match name.to_lowercase().as_str() {
            "help" | "start" => Ok(Self::Help),
            "history" => Ok(Self::History),
            "clear" => Ok(Self::Clear),
            "stats" => Ok(Self::Stats),
            "quit" | "exit" | "bye" => Ok(Self::Quit),
            "topic" => match arg {
                None => Ok(Self::Topic(None)),
                Some(arg) => arg
                    .parse::<Intent>()
                    .map(|topic| Self::Topic(Some(topic)))
                    .map_err(|_| CommandError::InvalidTopic {
                        input: arg.to_string(),
                    }),
            },
            "feedback" => {
                let arg = arg.ok_or(CommandError::MissingArgument {
                    usage: "/feedback <1-5|good|bad>",
                })?;
                arg.parse::<FeedbackRating>()
                    .map(Self::Feedback)
                    .map_err(|_| CommandError::InvalidRating {
                        input: arg.to_string(),
                    })
            }
            "save" => Ok(Self::Save(arg.map(PathBuf::from))),
            _ => Err(CommandError::Unknown {
                name: name.to_string(),
            }),
        }
    }
}
