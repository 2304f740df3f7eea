//! What part of a session history is sent with a completion call

use forge_core::session::{Message, Role};
use std::borrow::Cow;

/// Chooses the messages sent to the provider for one turn.
///
/// Strategies only shape the outgoing request; the stored history is always
/// written back in full.
pub trait HistoryStrategy: Send + Sync {
    fn project<'a>(&self, history: &'a [Message]) -> Cow<'a, [Message]>;
}

/// Send the entire history on every call
#[derive(Debug, Default, Clone, Copy)]
pub struct FullHistory;

impl HistoryStrategy for FullHistory {
    fn project<'a>(&self, history: &'a [Message]) -> Cow<'a, [Message]> {
        Cow::Borrowed(history)
    }
}

/// Send the system directive plus the most recent `max_messages` turns' messages
#[derive(Debug, Clone, Copy)]
pub struct RecentWindow {
    max_messages: usize,
}

impl RecentWindow {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(1),
        }
    }
}

impl HistoryStrategy for RecentWindow {
    fn project<'a>(&self, history: &'a [Message]) -> Cow<'a, [Message]> {
        let directive_len = history
            .iter()
            .take_while(|m| m.role() == Role::System)
            .count();
        let body = &history[directive_len..];
        if body.len() <= self.max_messages {
            return Cow::Borrowed(history);
        }

        let start = body.len() - self.max_messages;
        let mut projected = Vec::with_capacity(directive_len + self.max_messages);
        projected.extend_from_slice(&history[..directive_len]);
        projected.extend_from_slice(&body[start..]);
        Cow::Owned(projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_history(turns: usize) -> Vec<Message> {
        let mut history = vec![Message::system("gm"), Message::assistant("opening")];
        for i in 0..turns {
            history.push(Message::user(format!("move {}", i)));
            history.push(Message::assistant(format!("result {}", i)));
        }
        history
    }

    #[test]
    fn test_full_history_borrows_everything() {
        let history = long_history(30);
        let projected = FullHistory.project(&history);
        assert!(matches!(projected, Cow::Borrowed(_)));
        assert_eq!(projected.len(), history.len());
    }

    #[test]
    fn test_recent_window_keeps_directive() {
        let history = long_history(30);
        let projected = RecentWindow::new(4).project(&history);

        assert_eq!(projected.len(), 5);
        assert_eq!(projected[0].role(), Role::System);
        assert_eq!(projected[1].content(), "move 28");
        assert_eq!(projected[4].content(), "result 29");
    }

    #[test]
    fn test_recent_window_short_history_untouched() {
        let history = long_history(1);
        let projected = RecentWindow::new(10).project(&history);
        assert!(matches!(projected, Cow::Borrowed(_)));
        assert_eq!(projected.as_ref(), history.as_slice());
    }
}
