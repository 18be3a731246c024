//! Configuration types for the chat application.
//!
//! Settings resolve in layers: built-in defaults, then an optional YAML file,
//! then the `CHATBOX_BASE_URL` environment variable, then command-line flags
//! parsed via `arrrg`.

use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::chat::validate::DEFAULT_MAX_MESSAGE_CHARS;
use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};
use crate::markdown::DEFAULT_THEME;

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "CHATBOX_BASE_URL";

/// Greeting shown before the first message.
pub const DEFAULT_WELCOME: &str = "Hello! I'm your AI assistant. Ask me anything.";

/// Command-line arguments for the chatbox tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat backend.
    #[arrrg(optional, "Backend base URL (default: http://localhost:8080)", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 30)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "FILE")]
    pub config: Option<String>,

    /// Render replies without markdown.
    #[arrrg(flag, "Show assistant replies as plain text")]
    pub no_markdown: bool,

    /// Disable code-block highlighting.
    #[arrrg(flag, "Disable syntax highlighting of code blocks")]
    pub no_highlight: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Write HTML fragments instead of terminal text.
    #[arrrg(flag, "Emit HTML fragments instead of terminal text")]
    pub html: bool,

    /// Probe the backend before the first prompt.
    #[arrrg(flag, "Check backend health at startup")]
    pub check: bool,
}

/// Keys accepted in the YAML configuration file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Backend base URL.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Maximum message length in characters.
    pub max_message_chars: Option<usize>,
    /// Whether assistant replies are markdown-rendered.
    pub markdown: Option<bool>,
    /// Whether code blocks are highlighted.
    pub highlight: Option<bool>,
    /// Syntect theme name.
    pub theme: Option<String>,
    /// Whether ANSI styling is used.
    pub color: Option<bool>,
    /// Welcome text; an empty string disables it.
    pub welcome: Option<String>,
}

impl ConfigFile {
    /// Parses YAML configuration text.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read config {}", path.display()), err)
        })?;
        Self::parse(&content)
    }

    /// Overlays the keys present in this file onto `config`.
    pub fn apply(self, mut config: ChatConfig) -> ChatConfig {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = timeout_from_secs(secs);
        }
        if let Some(max) = self.max_message_chars {
            config.max_message_chars = max;
        }
        if let Some(markdown) = self.markdown {
            config.markdown = markdown;
        }
        if let Some(highlight) = self.highlight {
            config.highlight = highlight;
        }
        if let Some(theme) = self.theme {
            config.theme = theme;
        }
        if let Some(color) = self.color {
            config.use_color = color;
        }
        if let Some(welcome) = self.welcome {
            config.welcome = Some(welcome).filter(|w| !w.trim().is_empty());
        }
        config
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// the file, environment and command-line layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the chat backend.
    pub base_url: String,

    /// Client-side deadline for one exchange.
    pub timeout: Duration,

    /// Longest accepted message, in characters.
    pub max_message_chars: usize,

    /// Whether assistant replies are markdown-rendered.
    pub markdown: bool,

    /// Whether fenced code blocks are syntax highlighted.
    pub highlight: bool,

    /// Syntect theme used for highlighting.
    pub theme: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to emit HTML fragments instead of terminal text.
    pub html: bool,

    /// Welcome placeholder shown before the first message.
    pub welcome: Option<String>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: http://localhost:8080
    /// - Timeout: 30 seconds
    /// - Max message length: 500 characters
    /// - Markdown, highlighting and color: enabled
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            markdown: true,
            highlight: true,
            theme: DEFAULT_THEME.to_string(),
            use_color: true,
            html: false,
            welcome: Some(DEFAULT_WELCOME.to_string()),
        }
    }

    /// Resolves the layered configuration.
    ///
    /// `env_base_url` is the value of [`BASE_URL_ENV`], if set.
    pub fn resolve(args: ChatArgs, env_base_url: Option<String>) -> Result<Self> {
        let mut config = ChatConfig::new();
        if let Some(path) = &args.config {
            config = ConfigFile::from_path(path)?.apply(config);
        }
        if let Some(base_url) = env_base_url.filter(|url| !url.trim().is_empty()) {
            config.base_url = base_url;
        }
        Ok(config.apply_args(args))
    }

    /// Overlays explicitly given command-line arguments.
    pub fn apply_args(mut self, args: ChatArgs) -> Self {
        if let Some(base_url) = args.base_url {
            self.base_url = base_url;
        }
        if let Some(secs) = args.timeout_secs {
            self.timeout = timeout_from_secs(secs);
        }
        if args.no_markdown {
            self.markdown = false;
        }
        if args.no_highlight {
            self.highlight = false;
        }
        if args.no_color {
            self.use_color = false;
        }
        if args.html {
            self.html = true;
        }
        self
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum message length.
    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    /// Sets whether replies are markdown-rendered.
    pub fn with_markdown(mut self, enabled: bool) -> Self {
        self.markdown = enabled;
        self
    }

    /// Sets whether code blocks are highlighted.
    pub fn with_highlight(mut self, enabled: bool) -> Self {
        self.highlight = enabled;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets or clears the welcome placeholder.
    pub fn with_welcome(mut self, welcome: Option<String>) -> Self {
        self.welcome = welcome;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        ChatConfig::new().apply_args(args)
    }
}

fn timeout_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}
