use std::fmt;
use std::str::FromStr;

/// Who authored a chat message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sender {
    /// The person typing at the prompt.
    User,

    /// The remote chat backend.
    Assistant,
}

impl Sender {
    /// Short label used when rendering a message.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// Error returned when parsing an invalid sender string.
#[derive(Debug)]
pub struct SenderParseError {
    /// The invalid string value that could not be parsed.
    pub invalid_value: String,
}

impl fmt::Display for SenderParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown sender: {}", self.invalid_value)
    }
}

impl std::error::Error for SenderParseError {}

impl FromStr for Sender {
    type Err = SenderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "assistant" | "ai" => Ok(Sender::Assistant),
            _ => Err(SenderParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse() {
        assert_eq!(Sender::User.to_string(), "user");
        assert_eq!(Sender::Assistant.to_string(), "assistant");
        assert_eq!("user".parse::<Sender>().unwrap(), Sender::User);
        assert_eq!("ai".parse::<Sender>().unwrap(), Sender::Assistant);
        assert!("robot".parse::<Sender>().is_err());
    }
}
