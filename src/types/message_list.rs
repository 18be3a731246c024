//! The ordered, append-only list of conversation entries.

use crate::types::Message;

/// One row of the rendered conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// The one-time greeting shown before anything is sent.
    Welcome(String),

    /// A user or assistant message.
    Message(Message),
}

/// Conversation entries in display order.
///
/// If a welcome placeholder is present it stays the first entry: the first
/// message is inserted directly after it, and later messages follow in
/// insertion order.  Nothing is ever reordered, deduplicated or removed.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    entries: Vec<Entry>,
    message_count: usize,
}

impl MessageList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list that starts with a welcome placeholder.
    pub fn with_welcome(text: impl Into<String>) -> Self {
        Self {
            entries: vec![Entry::Welcome(text.into())],
            message_count: 0,
        }
    }

    /// Appends a message and returns its position among all entries.
    pub fn push(&mut self, message: Message) -> usize {
        let index = match self.welcome_index() {
            Some(welcome) if self.message_count == 0 => welcome + 1,
            _ => self.entries.len(),
        };
        self.entries.insert(index, Entry::Message(message));
        self.message_count += 1;
        index
    }

    /// The welcome text, if the list has one.
    pub fn welcome(&self) -> Option<&str> {
        self.entries.iter().find_map(|entry| match entry {
            Entry::Welcome(text) => Some(text.as_str()),
            Entry::Message(_) => None,
        })
    }

    /// All entries, welcome included, in display order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Messages only, in insertion order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Message(message) => Some(message),
            Entry::Welcome(_) => None,
        })
    }

    /// The most recently added message.
    pub fn last(&self) -> Option<&Message> {
        self.messages().last()
    }

    /// Number of messages, not counting the welcome placeholder.
    pub fn len(&self) -> usize {
        self.message_count
    }

    /// Returns true if no message has been added.
    pub fn is_empty(&self) -> bool {
        self.message_count == 0
    }

    fn welcome_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| matches!(entry, Entry::Welcome(_)))
    }
}
