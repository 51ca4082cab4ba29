//! Prompter that routes questions through the console task.
//!
//! The routing sequence runs on a blocking worker. Each question is sent to
//! the console as a [`PromptRequest`] carrying a oneshot reply channel, and
//! the worker blocks until the console answers it with the next input line.

use tokio::sync::{mpsc, oneshot};

use crate::dispatch::Prompter;

/// Typed at any prompt to cancel it.
pub const CANCEL: &str = ":q";

/// A question (or notice) for the console.
#[derive(Debug)]
pub enum PromptRequest {
    Choose {
        label: String,
        options: Vec<String>,
        default: Option<String>,
        reply: oneshot::Sender<Option<String>>,
    },
    Text {
        label: String,
        default: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Confirm {
        message: String,
        reply: oneshot::Sender<bool>,
    },
    Notice(String),
}

impl PromptRequest {
    /// Text shown to the user.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Choose {
                label,
                options,
                default,
                ..
            } => {
                let mut text = format!("{label}:\n");
                for (i, option) in options.iter().enumerate() {
                    let marker = if default.as_deref() == Some(option.as_str()) {
                        " (default)"
                    } else {
                        ""
                    };
                    text.push_str(&format!("  {}) {option}{marker}\n", i + 1));
                }
                text.push_str(&format!("choice ({CANCEL} to skip)> "));
                text
            }
            Self::Text { label, default, .. } => {
                format!("{label} [{default}] ({CANCEL} to skip)> ")
            }
            Self::Confirm { message, .. } => format!("{message} [y/N]> "),
            Self::Notice(message) => format!("{message}\n"),
        }
    }

    /// Answer with one line of input.
    ///
    /// Returns the request back if the line is not a valid answer and the
    /// question must be asked again.
    #[must_use]
    pub fn answer(self, line: &str) -> Option<Self> {
        let line = line.trim();
        match self {
            Self::Choose {
                label,
                options,
                default,
                reply,
            } => match parse_choice(line, &options, default.as_deref()) {
                Choice::Selected(choice) => {
                    let _ = reply.send(Some(choice));
                    None
                }
                Choice::Cancelled => {
                    let _ = reply.send(None);
                    None
                }
                Choice::Invalid => Some(Self::Choose {
                    label,
                    options,
                    default,
                    reply,
                }),
            },
            Self::Text { default, reply, .. } => {
                let answer = match line {
                    CANCEL => None,
                    "" => Some(default),
                    text => Some(text.to_string()),
                };
                let _ = reply.send(answer);
                None
            }
            Self::Confirm { reply, .. } => {
                let yes = matches!(line.to_lowercase().as_str(), "y" | "yes");
                let _ = reply.send(yes);
                None
            }
            Self::Notice(_) => None,
        }
    }

    /// Answer as if the user cancelled.
    pub fn cancel(self) {
        match self {
            Self::Choose { reply, .. } | Self::Text { reply, .. } => {
                let _ = reply.send(None);
            }
            Self::Confirm { reply, .. } => {
                let _ = reply.send(false);
            }
            Self::Notice(_) => {}
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Selected(String),
    Cancelled,
    Invalid,
}

/// Accepts an option number, the option text, or an empty line for the
/// default.
fn parse_choice(line: &str, options: &[String], default: Option<&str>) -> Choice {
    if line == CANCEL {
        return Choice::Cancelled;
    }
    if line.is_empty() {
        return default.map_or(Choice::Invalid, |d| Choice::Selected(d.to_string()));
    }
    if let Ok(n) = line.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .map_or(Choice::Invalid, |o| Choice::Selected(o.clone()));
    }
    options
        .iter()
        .find(|o| o.as_str() == line)
        .map_or(Choice::Invalid, |o| Choice::Selected(o.clone()))
}

/// [`Prompter`] backed by the console task.
#[derive(Debug, Clone)]
pub struct ConsolePrompter {
    requests: mpsc::UnboundedSender<PromptRequest>,
}

impl ConsolePrompter {
    /// Create a prompter and the receiver the console task reads from.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PromptRequest>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (Self { requests }, rx)
    }

    /// Send a question and block until it is answered. `None` if the console
    /// is gone.
    fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> PromptRequest) -> Option<T> {
        let (reply, answer) = oneshot::channel();
        self.requests.send(build(reply)).ok()?;
        answer.blocking_recv().ok()
    }
}

impl Prompter for ConsolePrompter {
    fn choose(&self, label: &str, options: &[String], default: Option<&str>) -> Option<String> {
        self.ask(|reply| PromptRequest::Choose {
            label: label.to_string(),
            options: options.to_vec(),
            default: default.map(String::from),
            reply,
        })
        .flatten()
    }

    fn prompt_text(&self, label: &str, default: &str) -> Option<String> {
        self.ask(|reply| PromptRequest::Text {
            label: label.to_string(),
            default: default.to_string(),
            reply,
        })
        .flatten()
    }

    fn confirm(&self, message: &str) -> bool {
        self.ask(|reply| PromptRequest::Confirm {
            message: message.to_string(),
            reply,
        })
        .unwrap_or(false)
    }

    fn notify(&self, message: &str) {
        let _ = self.requests.send(PromptRequest::Notice(message.to_string()));
    }
}
