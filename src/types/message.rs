use time::OffsetDateTime;

use crate::types::Sender;

/// Visual treatment of a message.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum MessageStyle {
    /// Regular conversation text.
    #[default]
    Normal,

    /// An assistant message reporting a failed exchange.
    Error,
}

/// One entry of the conversation.
///
/// Messages are immutable once created: the session appends them to its
/// [`MessageList`](crate::types::MessageList) and never edits or removes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    text: String,
    sender: Sender,
    timestamp: OffsetDateTime,
    style: MessageStyle,
}

impl Message {
    /// Creates a message stamped with the current time.
    pub fn new(text: impl Into<String>, sender: Sender, style: MessageStyle) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: OffsetDateTime::now_utc(),
            style,
        }
    }

    /// Creates a message typed by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User, MessageStyle::Normal)
    }

    /// Creates a reply from the backend.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Assistant, MessageStyle::Normal)
    }

    /// Creates an error-styled assistant message.
    pub fn assistant_error(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Assistant, MessageStyle::Error)
    }

    /// The message body.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Who wrote the message.
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// When the message was created.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// How the message should be displayed.
    pub fn style(&self) -> MessageStyle {
        self.style
    }

    /// Returns true for error-styled messages.
    pub fn is_error(&self) -> bool {
        self.style == MessageStyle::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_sender_and_style() {
        let user = Message::user("hi");
        assert_eq!(user.sender(), Sender::User);
        assert_eq!(user.style(), MessageStyle::Normal);

        let reply = Message::assistant("hello");
        assert_eq!(reply.sender(), Sender::Assistant);
        assert!(!reply.is_error());

        let failure = Message::assistant_error("The request timed out.");
        assert_eq!(failure.sender(), Sender::Assistant);
        assert!(failure.is_error());
        assert_eq!(failure.text(), "The request timed out.");
    }

    #[test]
    fn stamped_at_creation() {
        let before = OffsetDateTime::now_utc();
        let message = Message::user("hi");
        let after = OffsetDateTime::now_utc();
        assert!(before <= message.timestamp() && message.timestamp() <= after);
    }
}
