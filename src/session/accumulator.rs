//! Turn accumulation
//!
//! One accumulator exists per in-flight turn. It inserts the streaming
//! placeholder, applies decoded events in arrival order, and finalizes the
//! assistant message exactly once.

use super::model::Message;
use crate::stream::StreamEvent;

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A `done` event finalized the turn.
    Completed,
    /// The transport ended before a terminal event; whatever text had
    /// accumulated stands. A short read, not an error.
    ShortRead,
    /// An `error` event or transport failure ended the turn.
    Failed { message: String },
}

impl TurnOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TurnOutcome::Failed { .. })
    }
}

/// Builds the assistant message for one turn, in place in the session's
/// message list.
#[derive(Debug)]
pub struct TurnAccumulator {
    index: usize,
    outcome: Option<TurnOutcome>,
}

impl TurnAccumulator {
    /// Insert the streaming placeholder and begin the turn.
    pub fn begin(messages: &mut Vec<Message>) -> Self {
        messages.push(Message::streaming_assistant());
        Self {
            index: messages.len() - 1,
            outcome: None,
        }
    }

    /// Apply one decoded event. Tokens append in receipt order; `error`
    /// and `done` finalize. Anything arriving after finalization is
    /// ignored.
    pub fn apply(&mut self, messages: &mut [Message], event: StreamEvent) {
        if self.outcome.is_some() {
            return;
        }
        match event {
            StreamEvent::Token { text } => {
                if let Some(message) = messages.get_mut(self.index) {
                    message.content.push_str(&text);
                }
            }
            StreamEvent::Error { message } => {
                let outcome = TurnOutcome::Failed {
                    message: message.clone(),
                };
                self.finalize(messages, outcome, Some(message), vec![]);
            }
            StreamEvent::Done { citations } => {
                self.finalize(messages, TurnOutcome::Completed, None, citations);
            }
        }
    }

    /// The transport closed. Finalizes with the accumulated text when no
    /// terminal event arrived, and reports how the turn ended.
    pub fn finish(&mut self, messages: &mut [Message]) -> TurnOutcome {
        if self.outcome.is_none() {
            self.finalize(messages, TurnOutcome::ShortRead, None, vec![]);
        }
        self.outcome.clone().unwrap_or(TurnOutcome::ShortRead)
    }

    /// Transport failure: finalize with the error text in place of any
    /// accumulated content.
    pub fn fail(&mut self, messages: &mut [Message], error: String) {
        if self.outcome.is_none() {
            let outcome = TurnOutcome::Failed {
                message: error.clone(),
            };
            self.finalize(messages, outcome, Some(error), vec![]);
        }
    }

    fn finalize(
        &mut self,
        messages: &mut [Message],
        outcome: TurnOutcome,
        error_text: Option<String>,
        citations: Vec<crate::stream::Citation>,
    ) {
        if let Some(message) = messages.get_mut(self.index) {
            if let Some(text) = error_text {
                message.content = text;
            }
            message.citations = citations;
            message.streaming = false;
        }
        self.outcome = Some(outcome);
    }
}
