//! Conversation session state for the chat loop

/// Greeting shown (and recorded) when a session starts, before any user turn
pub const GREETING: &str =
    "Hello! Connect me to your Database and ask me anything about your database in Natural Language.";

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    Human,
    Assistant,
}

impl TurnRole {
    /// Label used when rendering transcripts into prompts
    pub fn label(&self) -> &'static str {
        match self {
            TurnRole::Human => "Human",
            TurnRole::Assistant => "Assistant",
        }
    }
}

/// A single immutable entry in the conversation log
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, in-memory conversation log.
///
/// A session always starts with one synthetic assistant greeting. After that
/// it only grows through [`record_exchange`](Self::record_exchange), which
/// appends a human/assistant pair atomically, so a lone human turn without
/// its response cannot exist.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    turns: Vec<ConversationTurn>,
}

impl ConversationSession {
    /// Create a session seeded with the default greeting
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    /// Create a session seeded with a custom greeting
    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            turns: vec![ConversationTurn::assistant(greeting)],
        }
    }

    /// All turns in insertion order, greeting first
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of turns recorded so far (greeting included)
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Most recent turn
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// Record a completed interaction: the user's question and the response
    /// it produced, in that order.
    pub fn record_exchange(&mut self, question: &str, response: &str) {
        self.turns.push(ConversationTurn::human(question));
        self.turns.push(ConversationTurn::assistant(response));
    }

    /// Render the most recent `window` turns as labelled lines for prompt
    /// context. The stored log is never truncated; only this view is
    /// windowed, oldest turns dropping out first.
    pub fn transcript(&self, window: usize) -> String {
        let skip = self.turns.len().saturating_sub(window);
        self.turns[skip..]
            .iter()
            .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}
