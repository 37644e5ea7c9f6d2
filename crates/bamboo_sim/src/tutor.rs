//! Conversational tutor glue.
//!
//! The completion backend is opaque: anything implementing
//! [`TextCompletionService`] can answer. This module only assembles the
//! simulation context into a prompt and keeps the conversation history.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::{debug, warn};

/// Reply used when the service fails.
pub const ERROR_REPLY: &str =
    "I encountered an error while thinking. Please check your internet connection or API key.";

/// Reply used when the service answers with nothing.
pub const EMPTY_REPLY: &str = "I'm having trouble analyzing the simulation right now.";

/// Word budget the tutor is asked to stay under.
pub const ANSWER_WORD_LIMIT: usize = 150;

/// Snapshot of a running simulation, as shown to the tutor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimContext {
    pub name: String,
    pub description: String,
    /// Current parameter values keyed by display name.
    pub parameters: BTreeMap<String, Value>,
}

impl SimContext {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Adds or replaces one parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Adds a float rounded to `decimals` places, the way the widgets
    /// display them.
    pub fn with_rounded(self, key: impl Into<String>, value: f64, decimals: i32) -> Self {
        let scale = 10f64.powi(decimals);
        let rounded = (value * scale).round() / scale;
        self.with(key, rounded)
    }

    pub fn parameters_json(&self) -> String {
        serde_json::to_string_pretty(&self.parameters).unwrap_or_else(|_| "{}".to_owned())
    }
}

/// Who said a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Everything a completion service receives for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptContext {
    pub simulation: SimContext,
    /// Conversation so far, ending with the question being asked.
    pub history: Vec<Message>,
}

impl PromptContext {
    /// The priming text sent ahead of the conversation.
    pub fn priming(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "You are an intelligent and helpful science tutor built into an interactive simulation app called BambooLab."
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Current Simulation Context:");
        let _ = writeln!(out, "- Simulation: {}", self.simulation.name);
        let _ = writeln!(out, "- Description: {}", self.simulation.description);
        let _ = writeln!(out, "- Current Parameters: {}", self.simulation.parameters_json());
        let _ = writeln!(out);
        let _ = write!(
            out,
            "Goal: Answer the user's question. If they ask about specific physics/math behavior, \
             reference the current parameters to explain why the simulation is behaving that way. \
             Keep answers concise (under {ANSWER_WORD_LIMIT} words) but educational, and encourage \
             the user to experiment with the parameters."
        );
        out
    }

    /// Priming as the first user turn, followed by the history.
    pub fn turns(&self) -> Vec<Message> {
        std::iter::once(Message::user(self.priming()))
            .chain(self.history.iter().cloned())
            .collect()
    }
}

/// Failures a completion backend can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TutorError {
    /// The backend could not be reached.
    #[error("completion service unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request (bad key, quota).
    #[error("completion service rejected the request: {0}")]
    Rejected(String),
}

/// An opaque text completion backend.
pub trait TextCompletionService {
    /// Answers the last user message of `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError`] when the backend cannot produce an answer.
    fn respond(&self, prompt: &PromptContext) -> Result<String, TutorError>;
}

impl<F> TextCompletionService for F
where
    F: Fn(&PromptContext) -> Result<String, TutorError>,
{
    fn respond(&self, prompt: &PromptContext) -> Result<String, TutorError> {
        self(prompt)
    }
}

/// A conversation with a completion service about one simulation.
///
/// # Example
///
/// ```rust
/// use bamboo_sim::tutor::{PromptContext, SimContext, Tutor, TutorError};
///
/// let echo = |prompt: &PromptContext| -> Result<String, TutorError> {
///     Ok(format!("You are looking at {}.", prompt.simulation.name))
/// };
/// let mut tutor = Tutor::new(echo);
/// let context = SimContext::new("Pendulum Lab", "A swinging bob").with("length", 1.5);
/// assert_eq!(tutor.ask(&context, "What is this?"), "You are looking at Pendulum Lab.");
/// assert_eq!(tutor.history().len(), 2);
/// ```
#[derive(Debug)]
pub struct Tutor<S> {
    service: S,
    history: Vec<Message>,
}

impl<S: TextCompletionService> Tutor<S> {
    pub const fn new(service: S) -> Self {
        Self {
            service,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Asks `question` about the simulation described by `context`.
    ///
    /// Never fails: service errors and empty answers become a fixed reply,
    /// which is recorded in the history like any other answer.
    pub fn ask(&mut self, context: &SimContext, question: &str) -> String {
        self.history.push(Message::user(question));
        let prompt = PromptContext {
            simulation: context.clone(),
            history: self.history.clone(),
        };
        let reply = match self.service.respond(&prompt) {
            Ok(text) if text.trim().is_empty() => {
                debug!(simulation = %context.name, "tutor returned an empty answer");
                EMPTY_REPLY.to_owned()
            }
            Ok(text) => text,
            Err(err) => {
                warn!(simulation = %context.name, error = %err, "tutor request failed");
                ERROR_REPLY.to_owned()
            }
        };
        self.history.push(Message::model(reply.clone()));
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn context() -> SimContext {
        SimContext::new("Hooke's Law", "Mass on a spring")
            .with("stiffness", 50)
            .with_rounded("displacement", 0.123_456, 2)
    }

    #[test]
    fn test_priming_mentions_context() {
        let prompt = PromptContext {
            simulation: context(),
            history: vec![Message::user("why?")],
        };
        let priming = prompt.priming();
        assert!(priming.contains("- Simulation: Hooke's Law"));
        assert!(priming.contains("- Description: Mass on a spring"));
        assert!(priming.contains("\"stiffness\": 50"));
        assert!(priming.contains("\"displacement\": 0.12"));
        assert!(priming.contains("under 150 words"));
    }

    #[test]
    fn test_turns_start_with_priming() {
        let prompt = PromptContext {
            simulation: context(),
            history: vec![Message::user("a"), Message::model("b"), Message::user("c")],
        };
        let turns = prompt.turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[3], Message::user("c"));
    }

    #[test]
    fn test_error_falls_back() {
        let failing = |_: &PromptContext| -> Result<String, TutorError> {
            Err(TutorError::Unavailable("offline".into()))
        };
        let mut tutor = Tutor::new(failing);
        assert_eq!(tutor.ask(&context(), "hello"), ERROR_REPLY);
        assert_eq!(tutor.history()[1], Message::model(ERROR_REPLY));
    }

    #[test]
    fn test_empty_answer_falls_back() {
        let mut tutor = Tutor::new(|_: &PromptContext| -> Result<String, TutorError> { Ok("  ".into()) });
        assert_eq!(tutor.ask(&context(), "hello"), EMPTY_REPLY);
    }

    #[test]
    fn test_history_is_sent() {
        let seen = RefCell::new(Vec::new());
        let service = |prompt: &PromptContext| -> Result<String, TutorError> {
            seen.borrow_mut().push(prompt.history.len());
            Ok("ok".into())
        };
        let mut tutor = Tutor::new(service);
        tutor.ask(&context(), "one");
        tutor.ask(&context(), "two");
        assert_eq!(*seen.borrow(), vec![1, 3]);
        tutor.clear();
        assert!(tutor.history().is_empty());
    }
}
