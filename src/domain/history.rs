use serde::{Deserialize, Serialize};

/// Hard cap on retained conversation turns; oldest-first eviction.
pub const HISTORY_CAP: usize = 12;

/// Number of trailing turns handed to the translation model.
pub const CONTEXT_WINDOW: usize = 6;

/// Chat role. Serializes straight into the chat-completion wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Bounded conversation history for one session.
///
/// Append-only with oldest-first eviction past [`HISTORY_CAP`]; the
/// translation window is always a suffix of the retained turns.
#[derive(Debug, Default, Clone)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    /// Append a turn, evicting the oldest one past the cap.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
        if self.turns.len() > HISTORY_CAP {
            self.turns.remove(0);
        }
    }

    /// The last [`CONTEXT_WINDOW`] turns, for the translation request.
    pub fn window(&self) -> &[Turn] {
        let start = self.turns.len().saturating_sub(CONTEXT_WINDOW);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_window() {
        let mut history = ConversationHistory::default();
        history.push(Role::User, "hello");
        history.push(Role::Assistant, "こんにちは");
        assert_eq!(history.len(), 2);
        assert_eq!(history.window().len(), 2);
        assert_eq!(history.window()[0].content, "hello");
    }

    #[test]
    fn test_cap_evicts_oldest_first() {
        let mut history = ConversationHistory::default();
        for i in 0..20 {
            history.push(Role::User, format!("turn {}", i));
        }
        assert_eq!(history.len(), HISTORY_CAP);
        assert_eq!(history.turns()[0].content, "turn 8");
        assert_eq!(history.turns()[HISTORY_CAP - 1].content, "turn 19");
    }

    #[test]
    fn test_window_is_a_suffix() {
        let mut history = ConversationHistory::default();
        for i in 0..10 {
            history.push(Role::User, format!("turn {}", i));
        }
        let window = history.window();
        assert_eq!(window.len(), CONTEXT_WINDOW);
        assert_eq!(window, &history.turns()[10 - CONTEXT_WINDOW..]);
        assert_eq!(window[CONTEXT_WINDOW - 1].content, "turn 9");
    }

    #[test]
    fn test_window_shorter_than_limit() {
        let mut history = ConversationHistory::default();
        history.push(Role::User, "only");
        assert_eq!(history.window().len(), 1);
    }

    #[test]
    fn test_never_exceeds_cap() {
        let mut history = ConversationHistory::default();
        for i in 0..100 {
            history.push(Role::User, format!("{}", i));
            assert!(history.len() <= HISTORY_CAP);
            assert!(history.window().len() <= CONTEXT_WINDOW);
        }
    }
}
