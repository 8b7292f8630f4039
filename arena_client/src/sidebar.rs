//! Lobby roster and chat log.

use std::collections::VecDeque;

use arena_shared::world::{ChatLine, LobbyEntry};

/// Lines kept in the chat log.
pub const CHAT_HISTORY: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    roster: Vec<LobbyEntry>,
    chat: VecDeque<String>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster wholesale.
    pub fn set_roster(&mut self, roster: Vec<LobbyEntry>) {
        self.roster = roster;
    }

    /// Appends a formatted line, evicting the oldest past [`CHAT_HISTORY`].
    pub fn push_chat(&mut self, line: &ChatLine) {
        if self.chat.len() == CHAT_HISTORY {
            self.chat.pop_front();
        }
        self.chat.push_back(line.display());
    }

    pub fn roster(&self) -> &[LobbyEntry] {
        &self.roster
    }

    pub fn chat(&self) -> impl Iterator<Item = &str> {
        self.chat.iter().map(String::as_str)
    }

    pub fn chat_len(&self) -> usize {
        self.chat.len()
    }
}
