//! Output rendering for the chat session.
//!
//! The session never writes output itself; it feeds structured
//! [`Message`] values and loading-state changes to a [`Renderer`].
//! [`PlainTextRenderer`] targets a terminal with optional ANSI styling,
//! [`HtmlRenderer`] emits HTML fragments.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crate::markdown::{MarkdownTransform, TerminalText, escape_html, sanitize_terminal};
use time::macros::format_description;

use crate::types::{Entry, Message, MessageList, MessageStyle, Sender};

/// ANSI escape code for bold text (used for sender labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the loading line and welcome).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the user label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for notices).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for error replies).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI sequence returning to column 0 and erasing the line.
const CLEAR_LINE: &str = "\r\x1b[2K";

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - HTML fragments
pub trait Renderer: Send {
    /// Render the welcome placeholder shown before any message.
    fn render_welcome(&mut self, text: &str);

    /// Render one conversation message.
    ///
    /// User text is always shown literally; assistant text may be passed
    /// through a markdown transform.
    fn render_message(&mut self, message: &Message);

    /// Show a transient notification, e.g. for rejected input.
    fn print_notice(&mut self, notice: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a request is issued.
    fn start_loading(&mut self) {}

    /// Called periodically while the request is in flight.
    fn update_loading(&mut self, elapsed: Duration) {
        _ = elapsed;
    }

    /// Called when the request resolved, failed or timed out, with the total wait.
    fn finish_loading(&mut self, elapsed: Duration) {
        _ = elapsed;
    }
}

/// Formats an elapsed duration with 0.1 s resolution.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    markdown: Box<dyn MarkdownTransform>,
    use_color: bool,
    echo_user: bool,
    loading: bool,
}

impl PlainTextRenderer {
    /// Creates a renderer writing to stdout.
    pub fn new(markdown: Box<dyn MarkdownTransform>, use_color: bool) -> Self {
        Self::with_writer(io::stdout(), markdown, use_color)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new(Box::new(TerminalText), true)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, markdown: Box<dyn MarkdownTransform>, use_color: bool) -> Self {
        Self {
            out,
            markdown,
            use_color,
            echo_user: true,
            loading: false,
        }
    }

    /// Controls whether user messages are echoed.
    ///
    /// An interactive line editor already shows what was typed.
    pub fn with_user_echo(mut self, echo_user: bool) -> Self {
        self.echo_user = echo_user;
        self
    }

    /// Consumes the renderer and returns its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Flushes the writer to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn clear_loading(&mut self) {
        if self.loading {
            if self.use_color {
                let _ = write!(self.out, "{CLEAR_LINE}");
            }
            self.loading = false;
        }
    }

    /// Redraws the spinner line in place; only meaningful with ANSI support.
    fn draw_loading(&mut self, elapsed: Duration) {
        let frame = SPINNER[(elapsed.as_millis() / 100) as usize % SPINNER.len()];
        let line = format!("{frame} Waiting for a reply... {}", format_elapsed(elapsed));
        let _ = write!(self.out, "{CLEAR_LINE}{ANSI_DIM}{line}{ANSI_RESET}");
        self.flush();
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn render_welcome(&mut self, text: &str) {
        let text = self.styled(ANSI_DIM, &sanitize_terminal(text));
        let _ = writeln!(self.out, "{text}\n");
        self.flush();
    }

    fn render_message(&mut self, message: &Message) {
        self.clear_loading();
        match (message.sender(), message.style()) {
            (Sender::User, _) => {
                if !self.echo_user {
                    return;
                }
                let label = self.styled(
                    &format!("{ANSI_BOLD}{ANSI_GREEN}"),
                    &format!("{}:", Sender::User.label()),
                );
                let _ = writeln!(self.out, "{label} {}", sanitize_terminal(message.text()));
            }
            (Sender::Assistant, MessageStyle::Normal) => {
                let label = self.styled(
                    &format!("{ANSI_BOLD}{ANSI_CYAN}"),
                    &format!("{}:", Sender::Assistant.label()),
                );
                let body = self.markdown.transform(message.text());
                let _ = writeln!(self.out, "{label}\n{}\n", sanitize_styled(&body));
            }
            (Sender::Assistant, MessageStyle::Error) => {
                let line = format!(
                    "{}: {}",
                    Sender::Assistant.label(),
                    sanitize_terminal(message.text())
                );
                let line = self.styled(ANSI_RED, &line);
                let _ = writeln!(self.out, "{line}\n");
            }
        }
        self.flush();
    }

    fn print_notice(&mut self, notice: &str) {
        self.clear_loading();
        let line = self.styled(ANSI_YELLOW, &format!("! {}", sanitize_terminal(notice)));
        let _ = writeln!(self.out, "{line}");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_loading();
        let _ = writeln!(self.out, "Error: {error}");
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.clear_loading();
        let _ = writeln!(self.out, "{info}");
        self.flush();
    }

    fn start_loading(&mut self) {
        self.loading = true;
        if self.use_color {
            self.draw_loading(Duration::ZERO);
        } else {
            let _ = writeln!(self.out, "Waiting for a reply...");
            self.flush();
        }
    }

    fn update_loading(&mut self, elapsed: Duration) {
        if self.loading && self.use_color {
            self.draw_loading(elapsed);
        }
    }

    fn finish_loading(&mut self, elapsed: Duration) {
        if self.use_color {
            self.clear_loading();
        } else if self.loading {
            let _ = writeln!(self.out, "Waited {}", format_elapsed(elapsed));
            self.loading = false;
        }
        self.flush();
    }
}

/// Markdown output already carries the transform's own escape sequences;
/// only strip what the transform could not have produced.
fn sanitize_styled(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\x1b'))
        .collect()
}

/// Renders messages as HTML fragments, one element per line of output.
///
/// Class names follow the chat page layout: `message-container`, `message`,
/// `user`/`ai`, `error-message` and `welcome-message`.
pub struct HtmlRenderer<W: Write + Send = Stdout> {
    out: W,
    markdown: Box<dyn MarkdownTransform>,
}

impl HtmlRenderer {
    /// Creates a renderer writing to stdout.
    pub fn new(markdown: Box<dyn MarkdownTransform>) -> Self {
        Self::with_writer(io::stdout(), markdown)
    }
}

impl<W: Write + Send> HtmlRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, markdown: Box<dyn MarkdownTransform>) -> Self {
        Self { out, markdown }
    }

    /// Consumes the renderer and returns its writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for HtmlRenderer<W> {
    fn render_welcome(&mut self, text: &str) {
        let _ = writeln!(
            self.out,
            "<div class=\"welcome-message\">{}</div>",
            escape_html(text)
        );
        let _ = self.out.flush();
    }

    fn render_message(&mut self, message: &Message) {
        let class = match message.sender() {
            Sender::User => "user",
            Sender::Assistant => "ai",
        };
        let (extra, body) = match (message.sender(), message.style()) {
            (Sender::User, _) => ("", format!("<span>{}</span>", escape_html(message.text()))),
            (Sender::Assistant, MessageStyle::Normal) => {
                ("", self.markdown.transform(message.text()))
            }
            (Sender::Assistant, MessageStyle::Error) => {
                (" error-message", escape_html(message.text()))
            }
        };
        let _ = writeln!(
            self.out,
            "<div class=\"message-container {class}\"><div class=\"message {class}{extra}\">{}</div></div>",
            body.trim_end()
        );
        let _ = self.out.flush();
    }

    fn print_notice(&mut self, notice: &str) {
        let _ = writeln!(
            self.out,
            "<div class=\"error-message\">{}</div>",
            escape_html(notice)
        );
        let _ = self.out.flush();
    }

    fn print_error(&mut self, error: &str) {
        let _ = writeln!(self.out, "<!-- error: {} -->", escape_html(error));
        let _ = self.out.flush();
    }

    fn print_info(&mut self, info: &str) {
        let _ = writeln!(self.out, "<!-- {} -->", escape_html(info));
        let _ = self.out.flush();
    }

    fn start_loading(&mut self) {
        let _ = writeln!(
            self.out,
            "<div class=\"loading-indicator\">Waiting for a reply...</div>"
        );
        let _ = self.out.flush();
    }

    fn finish_loading(&mut self, elapsed: Duration) {
        let _ = writeln!(
            self.out,
            "<div class=\"loading-indicator done\">Waited {}</div>",
            format_elapsed(elapsed)
        );
        let _ = self.out.flush();
    }
}

/// Lists the conversation one line per entry, as `[hh:mm:ss] Label: first line`.
///
/// Text is made safe for a terminal; only the first line of each message is kept.
pub fn history_lines(messages: &MessageList) -> Vec<String> {
    let format = format_description!("[hour]:[minute]:[second]");
    messages
        .entries()
        .iter()
        .map(|entry| match entry {
            Entry::Welcome(text) => sanitize_terminal(text),
            Entry::Message(message) => {
                let at = message
                    .timestamp()
                    .format(format)
                    .unwrap_or_else(|_| "--:--:--".to_string());
                let marker = if message.is_error() { " (error)" } else { "" };
                let first_line = message.text().lines().next().unwrap_or_default();
                format!(
                    "[{at}] {}{marker}: {}",
                    message.sender().label(),
                    sanitize_terminal(first_line)
                )
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{DEFAULT_THEME, Highlighter, HtmlMarkdown, TerminalMarkdown};

    fn plain(use_color: bool) -> PlainTextRenderer<Vec<u8>> {
        PlainTextRenderer::with_writer(
            Vec::new(),
            Box::new(TerminalMarkdown::new(None, use_color)),
            use_color,
        )
    }

    fn output(renderer: PlainTextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn elapsed_has_tenths() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0.0s");
        assert_eq!(format_elapsed(Duration::from_millis(1234)), "1.2s");
    }

    #[test]
    fn user_text_is_literal() {
        let mut renderer = plain(false);
        renderer.render_message(&Message::user("**not bold** \x1b[31m"));
        let out = output(renderer);
        assert!(out.starts_with("You: **not bold** "));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn user_echo_can_be_disabled() {
        let mut renderer = plain(false).with_user_echo(false);
        renderer.render_message(&Message::user("typed already"));
        assert_eq!(output(renderer), "");
    }

    #[test]
    fn assistant_text_is_markdown_rendered() {
        let mut renderer = plain(false);
        renderer.render_message(&Message::assistant("# Answer\n\n- one\n- two"));
        let out = output(renderer);
        assert_eq!(out, "Assistant:\nAnswer\n\n- one\n- two\n\n");
    }

    #[test]
    fn error_reply_is_red() {
        let mut renderer = plain(true);
        renderer.render_message(&Message::assistant_error("The request timed out."));
        let out = output(renderer);
        assert!(out.contains(ANSI_RED));
        assert!(out.contains("Assistant: The request timed out."));
    }

    #[test]
    fn loading_line_is_cleared() {
        let mut renderer = plain(true);
        renderer.start_loading();
        renderer.update_loading(Duration::from_millis(1500));
        renderer.finish_loading(Duration::from_millis(1600));
        let out = output(renderer);
        assert!(out.contains("Waiting for a reply... 1.5s"));
        assert!(out.ends_with(CLEAR_LINE));
    }

    #[test]
    fn loading_without_color_prints_start_and_wait() {
        let mut renderer = plain(false);
        renderer.start_loading();
        renderer.update_loading(Duration::from_secs(3));
        renderer.finish_loading(Duration::from_millis(3250));
        assert_eq!(output(renderer), "Waiting for a reply...\nWaited 3.2s\n");
    }

    #[test]
    fn html_loading_fragments() {
        let mut renderer = HtmlRenderer::with_writer(Vec::new(), Box::new(HtmlMarkdown::new(None)));
        renderer.start_loading();
        renderer.update_loading(Duration::from_secs(1));
        renderer.finish_loading(Duration::from_millis(1500));
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            out,
            "<div class=\"loading-indicator\">Waiting for a reply...</div>\n\
             <div class=\"loading-indicator done\">Waited 1.5s</div>\n"
        );
    }

    #[test]
    fn highlighted_code_cannot_smuggle_escapes() {
        let mut renderer = PlainTextRenderer::with_writer(
            Vec::new(),
            Box::new(TerminalMarkdown::new(
                Some(Highlighter::new(DEFAULT_THEME)),
                true,
            )),
            true,
        );
        renderer.render_message(&Message::assistant(
            "```rust\nlet s = \"\x1b]0;pwned\x07\x1b[2J\";\n```",
        ));
        let out = output(renderer);
        assert!(out.contains('\u{FFFD}'));
        assert!(!out.contains("\x1b[2J"));
        assert!(!out.contains("\x1b]0;"));
        assert!(!out.contains('\x07'));
    }

    #[test]
    fn history_is_sanitized() {
        let mut messages = MessageList::with_welcome("Hi\x1b[2J");
        messages.push(Message::user("first line\nsecond line"));
        messages.push(Message::assistant("hi\x1b[2J"));
        messages.push(Message::assistant_error("The request timed out."));
        let lines = history_lines(&messages);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Hi\u{FFFD}[2J");
        assert!(lines[1].starts_with('['));
        assert!(lines[1].ends_with("] You: first line"));
        assert!(lines[2].ends_with("] Assistant: hi\u{FFFD}[2J"));
        assert!(lines[3].ends_with("] Assistant (error): The request timed out."));
        assert!(lines.iter().all(|line| !line.contains('\x1b')));
    }

    #[test]
    fn notice_is_prefixed() {
        let mut renderer = plain(false);
        renderer.print_notice("Message is too long.");
        assert_eq!(output(renderer), "! Message is too long.\n");
    }

    #[test]
    fn html_user_message_is_escaped() {
        let mut renderer = HtmlRenderer::with_writer(Vec::new(), Box::new(HtmlMarkdown::new(None)));
        renderer.render_message(&Message::user("<b>hi</b> & bye"));
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            out,
            "<div class=\"message-container user\"><div class=\"message user\"><span>&lt;b&gt;hi&lt;/b&gt; &amp; bye</span></div></div>\n"
        );
    }

    #[test]
    fn html_assistant_message_is_markup() {
        let mut renderer = HtmlRenderer::with_writer(Vec::new(), Box::new(HtmlMarkdown::new(None)));
        renderer.render_welcome("Hi <there>");
        renderer.render_message(&Message::assistant("**bold**"));
        renderer.render_message(&Message::assistant_error("HTTP 403: Forbidden"));
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "<div class=\"welcome-message\">Hi &lt;there&gt;</div>");
        assert!(lines[1].contains("<div class=\"message ai\"><p><strong>bold</strong></p>"));
        assert!(lines[2].contains("message ai error-message"));
        assert!(lines[2].contains("HTTP 403: Forbidden"));
    }
}
