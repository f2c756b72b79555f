//! Per-user conversation transcript.

use uuid::Uuid;
use wikichat_core::ConversationTurn;

/// Transcript of turns plus the raw queries that produced them.
///
/// Both sequences grow together, one element per resolution attempt, so
/// their lengths are always equal. Only [`Session::append_turn`] and
/// [`Session::clear`] mutate it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    turns: Vec<ConversationTurn>,
    query_history: Vec<String>,
}

/// Read-only view of a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot<'a> {
    pub turns: &'a [ConversationTurn],
    pub query_history: &'a [String],
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved turn and the query that produced it.
    pub fn append_turn(&mut self, turn: ConversationTurn, raw_query: impl Into<String>) {
        self.turns.push(turn);
        self.query_history.push(raw_query.into());
    }

    /// Drop every turn and history entry.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.query_history.clear();
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            turns: &self.turns,
            query_history: &self.query_history,
        }
    }

    /// Past queries, most recent first.
    pub fn history_newest_first(&self) -> Vec<&str> {
        self.query_history.iter().rev().map(String::as_str).collect()
    }

    pub fn turn(&self, id: Uuid) -> Option<&ConversationTurn> {
        self.turns.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
