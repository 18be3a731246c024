//! Chat application module for conversations with the chat backend.
//!
//! This module provides the session and front-end plumbing built on top of
//! the [`client`](crate::client) and [`render`](crate::render) modules:
//!
//! - Input validation before anything is sent
//! - A single in-flight request with a live elapsed-time indicator
//! - Error replies instead of propagated failures
//! - Slash commands for session control
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and layered configuration
//! - [`validate`]: Input validation
//! - [`session`]: Core chat session management and backend interaction
//! - [`commands`]: Slash command parsing
//! - [`build_renderer`]: Renderer selection from configuration

mod commands;
mod config;
mod session;
mod validate;

pub use crate::render::{HtmlRenderer, PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{BASE_URL_ENV, ChatArgs, ChatConfig, ConfigFile, DEFAULT_WELCOME};
pub use session::{ChatSession, LOADING_TICK, SessionStats, Submission};
pub use validate::{DEFAULT_MAX_MESSAGE_CHARS, validate_input};

use crate::markdown::{
    Highlighter, HtmlMarkdown, HtmlText, MarkdownTransform, TerminalMarkdown, TerminalText,
};

/// Builds the markdown transform selected by `config`.
pub fn build_markdown(config: &ChatConfig) -> Box<dyn MarkdownTransform> {
    if !config.markdown {
        return if config.html {
            Box::new(HtmlText)
        } else {
            Box::new(TerminalText)
        };
    }
    let highlighter = config.highlight.then(|| Highlighter::new(&config.theme));
    if config.html {
        Box::new(HtmlMarkdown::new(highlighter))
    } else {
        Box::new(TerminalMarkdown::new(highlighter, config.use_color))
    }
}

/// Builds the stdout renderer selected by `config`.
///
/// `interactive` suppresses echoing user messages a line editor already shows.
pub fn build_renderer(config: &ChatConfig, interactive: bool) -> Box<dyn Renderer> {
    let markdown = build_markdown(config);
    if config.html {
        Box::new(HtmlRenderer::new(markdown))
    } else {
        Box::new(PlainTextRenderer::new(markdown, config.use_color).with_user_echo(!interactive))
    }
}
