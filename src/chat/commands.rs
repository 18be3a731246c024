//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the backend.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Probe backend liveness.
    Health,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// List the conversation with timestamps.
    History,

    /// Toggle markdown rendering of replies.
    Markdown(bool),

    /// Toggle syntax highlighting of code blocks.
    Highlight(bool),

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input names a known command,
/// or `None` if it should be treated as a regular message. Text such as
/// `/etc/hosts is empty?` starts with a slash but is not a command.
///
/// # Examples
///
/// ```
/// # use chatbox::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/markdown off").is_some());
/// assert!(parse_command("What is Rust?").is_none());
/// assert!(parse_command("/etc/hosts looks wrong, why?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "health" => ChatCommand::Health,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "history" => ChatCommand::History,
        "markdown" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Markdown(value),
            None => ChatCommand::Invalid("/markdown expects 'on' or 'off'".to_string()),
        },
        "highlight" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Highlight(value),
            None => ChatCommand::Invalid("/highlight expects 'on' or 'off'".to_string()),
        },
        _ => return None,
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /health                Check whether the backend is reachable
  /history               List the conversation with timestamps
  /markdown on|off       Render replies as markdown or plain text
  /highlight on|off      Highlight code blocks in replies
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat

Any other line, including one starting with an unknown /word, is sent as a message."#
}
