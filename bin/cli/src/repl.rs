//! Terminal chat loop.

use crate::commands::{Command, HELP_TEXT};
use crate::error::CliError;
use pidgin_tutor_conversation::{
    DEFAULT_SNAPSHOT_FILE, InMemorySessionStore, SessionStore, TutorService,
};
use pidgin_tutor_core::CallerId;
use rootcause::prelude::{Report, ResultExt};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Shown when an answer could not be produced.
pub const ERROR_REPLY: &str = "Sorry, I get small problem. Try again!";

/// Whether the loop keeps reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop reading.
    Quit,
}

/// A chat session between the terminal user and the tutor.
pub struct Repl<S = InMemorySessionStore> {
    service: TutorService<S>,
    caller: CallerId,
    snapshot_dir: PathBuf,
}

impl<S: SessionStore> Repl<S> {
    /// Creates a loop for `caller`. `/save` without a path writes into
    /// `snapshot_dir`.
    #[must_use]
    pub fn new(service: TutorService<S>, caller: CallerId, snapshot_dir: PathBuf) -> Self {
        Self {
            service,
            caller,
            snapshot_dir,
        }
    }

    /// Returns the underlying service.
    #[must_use]
    pub fn service(&self) -> &TutorService<S> {
        &self.service
    }

    /// Opens the caller's session and prints the welcome message.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened or output fails.
    pub async fn greet<W: AsyncWrite + Unpin>(
        &self,
        out: &mut W,
        display_name: Option<&str>,
    ) -> Result<(), Report<CliError>> {
        let summary = self
            .service
            .start(&self.caller, display_name)
            .await
            .context(CliError::Startup)?;

        write_line(
            out,
            &format!(
                "Hello {}! I be your Pidgin tutor for Mathematics and Python coding.\n\
                 Ask me anything, or type /help to see wetin I fit do.",
                summary.name
            ),
        )
        .await?;
        if !self.service.responder().model().is_present() {
            write_line(out, "(No model dey loaded, so I go answer from my rule book.)").await?;
        }
        Ok(())
    }

    /// Reads lines from `input` until it ends or the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the terminal fails.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> Result<(), Report<CliError>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        loop {
            write(out, "You: ").await?;
            let Some(line) = lines.next_line().await.map_err(CliError::from)? else {
                write_line(out, "").await?;
                return Ok(());
            };
            if self.handle_line(&line, out).await? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Handles one input line.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing the output fails. Tutor failures
    /// are reported to the user and logged.
    pub async fn handle_line<W: AsyncWrite + Unpin>(
        &self,
        line: &str,
        out: &mut W,
    ) -> Result<Flow, Report<CliError>> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                write_line(out, &e.to_string()).await?;
                return Ok(Flow::Continue);
            }
        };
        debug!(?command, "parsed input");

        match command {
            Command::Empty => {}
            Command::Help => write_line(out, HELP_TEXT).await?,
            Command::Quit => {
                write_line(
                    out,
                    "Bye bye! Come back anytime you wan learn something new. I go dey here!",
                )
                .await?;
                return Ok(Flow::Quit);
            }
            Command::Chat(text) => self.chat(&text, out).await?,
            Command::History => self.show_history(out).await?,
            Command::Clear => match self.service.clear(&self.caller).await {
                Ok(_) => write_line(out, "I don clear our conversation. Make we start fresh!").await?,
                Err(report) => self.report_failure(&report, out).await?,
            },
            Command::Topic(None) => self.show_topic(out).await?,
            Command::Topic(Some(topic)) => match self.service.set_topic(&self.caller, topic).await {
                Ok(()) => write_line(out, &format!("Okay! We go focus on {topic}.")).await?,
                Err(report) => self.report_failure(&report, out).await?,
            },
            Command::Stats => self.show_stats(out).await?,
            Command::Feedback(rating) => {
                match self.service.record_feedback(&self.caller, rating).await {
                    Ok(_) => {
                        write_line(out, &format!("Thank you for your feedback ({rating})!")).await?;
                    }
                    Err(report) => self.report_failure(&report, out).await?,
                }
            }
            Command::Save(path) => {
                let path = path.unwrap_or_else(|| self.snapshot_dir.join(DEFAULT_SNAPSHOT_FILE));
                match self.service.save_snapshot(&self.caller, &path).await {
                    Ok(snapshot) => {
                        write_line(
                            out,
                            &format!(
                                "Saved {} exchanges to {}.",
                                snapshot.exchanges.len(),
                                path.display()
                            ),
                        )
                        .await?;
                    }
                    Err(report) => {
                        warn!(error = %report, "could not save conversation");
                        write_line(out, "Sorry, I no fit save the conversation.").await?;
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    async fn chat<W: AsyncWrite + Unpin>(
        &self,
        text: &str,
        out: &mut W,
    ) -> Result<(), Report<CliError>> {
        match self.service.respond(&self.caller, text).await {
            Ok(reply) => {
                write_line(out, &format!("Tutor: {}", reply.text)).await?;
                if reply.ask_feedback {
                    write_line(
                        out,
                        "How I dey do so far? Rate my answers with /feedback <1-5|good|bad>.",
                    )
                    .await?;
                }
                Ok(())
            }
            Err(report) => self.report_failure(&report, out).await,
        }
    }

    async fn show_history<W: AsyncWrite + Unpin>(&self, out: &mut W) -> Result<(), Report<CliError>> {
        let exchanges = match self.service.history(&self.caller).await {
            Ok(exchanges) => exchanges,
            Err(report) => return self.report_failure(&report, out).await,
        };
        if exchanges.is_empty() {
            return write_line(out, "We never talk anything yet.").await;
        }
        for exchange in exchanges {
            write_line(
                out,
                &format!(
                    "[{}]\n  You: {}\n  Tutor: {}",
                    exchange.intent(),
                    exchange.input(),
                    exchange.output()
                ),
            )
            .await?;
        }
        Ok(())
    }

    async fn show_topic<W: AsyncWrite + Unpin>(&self, out: &mut W) -> Result<(), Report<CliError>> {
        let topic = self
            .service
            .session_summary(&self.caller)
            .await
            .ok()
            .and_then(|summary| summary.topic);
        let current = match topic {
            Some(topic) => format!("Your topic na {topic}."),
            None => "You never choose topic.".to_string(),
        };
        write_line(
            out,
            &format!("{current}\nChoose with /topic math, /topic coding or /topic general."),
        )
        .await
    }

    async fn show_stats<W: AsyncWrite + Unpin>(&self, out: &mut W) -> Result<(), Report<CliError>> {
        let stats = self.service.stats().await;
        let top = stats
            .top_topic()
            .map_or_else(|| "none yet".to_string(), |topic| topic.to_string());
        write_line(
            out,
            &format!(
                "Sessions: {}\nMessages: {} (math {}, coding {}, general {})\nFeedback: {}\nTop topic: {}\nCounting since: {}",
                stats.total_sessions,
                stats.total_messages,
                stats.topics.math,
                stats.topics.coding,
                stats.topics.general,
                stats.total_feedback,
                top,
                stats.started_at.format("%Y-%m-%d %H:%M UTC"),
            ),
        )
        .await
    }

    async fn report_failure<E, W>(&self, report: &Report<E>, out: &mut W) -> Result<(), Report<CliError>>
    where
        Report<E>: std::fmt::Display,
        W: AsyncWrite + Unpin,
    {
        warn!(caller = %self.caller, error = %report, "tutor request failed");
        write_line(out, ERROR_REPLY).await
    }
}

async fn write<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), Report<CliError>> {
    out.write_all(text.as_bytes()).await.map_err(CliError::from)?;
    out.flush().await.map_err(CliError::from)?;
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<(), Report<CliError>> {
    write(out, &format!("{text}\n")).await
}
