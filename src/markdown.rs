//! Markdown transforms for assistant replies.
//!
//! A [`MarkdownTransform`] turns the raw text of an assistant message into
//! display output. Markdown is a capability, not a requirement: renderers hold
//! a `Box<dyn MarkdownTransform>` and fall back to [`TerminalText`] or
//! [`HtmlText`] when markdown is disabled.
//!
//! Parsing follows GitHub-flavored conventions (tables, strikethrough, task
//! lists) and treats every single newline as a line break. Fenced code blocks
//! are syntax highlighted with syntect when a [`Highlighter`] is supplied and
//! the block's language is known; otherwise the code is emitted as-is.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

/// Theme used when the configured one is unknown.
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_ITALIC: &str = "\x1b[3m";
const ANSI_UNDERLINE: &str = "\x1b[4m";
const ANSI_STRIKE: &str = "\x1b[9m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RESET: &str = "\x1b[0m";

/// Converts assistant text into display output.
pub trait MarkdownTransform: Send {
    /// Transforms `text` for display.
    fn transform(&self, text: &str) -> String;
}

/// Plain text made safe for a terminal; markdown is not interpreted.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalText;

impl MarkdownTransform for TerminalText {
    fn transform(&self, text: &str) -> String {
        sanitize_terminal(text)
    }
}

/// Plain text made safe for HTML; newlines become line breaks.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlText;

impl MarkdownTransform for HtmlText {
    fn transform(&self, text: &str) -> String {
        escape_html(text).replace('\n', "<br />\n")
    }
}

/// Syntax highlighting for fenced code blocks.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Loads the bundled syntaxes and the named theme, falling back to
    /// [`DEFAULT_THEME`] when `theme_name` is not bundled.
    pub fn new(theme_name: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        if !themes.contains_key(theme_name) {
            log::warn!("unknown highlight theme {theme_name:?}; using {DEFAULT_THEME}");
        }
        let theme = themes
            .remove(theme_name)
            .or_else(|| themes.remove(DEFAULT_THEME))
            .unwrap_or_default();
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    fn syntax(&self, lang: &str) -> Option<&SyntaxReference> {
        if lang.is_empty() {
            return None;
        }
        self.syntaxes.find_syntax_by_token(lang)
    }

    /// Highlights `code` with 24-bit ANSI colors, or `None` for an unknown language.
    pub fn ansi(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = self.syntax(lang)?;
        let mut lines = HighlightLines::new(syntax, &self.theme);
        let mut out = String::new();
        for line in LinesWithEndings::from(code) {
            let ranges = lines.highlight_line(line, &self.syntaxes).ok()?;
            out.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
        }
        out.push_str(ANSI_RESET);
        Some(out)
    }

    /// Highlights `code` as inline-styled HTML, or `None` for an unknown language.
    pub fn html(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = self.syntax(lang)?;
        syntect::html::highlighted_html_for_string(code, &self.syntaxes, syntax, &self.theme).ok()
    }
}

/// Renders markdown as styled terminal text.
pub struct TerminalMarkdown {
    highlighter: Option<Highlighter>,
    use_color: bool,
}

impl TerminalMarkdown {
    /// Creates a transform; without color only the layout is kept.
    pub fn new(highlighter: Option<Highlighter>, use_color: bool) -> Self {
        Self {
            highlighter,
            use_color,
        }
    }
}

impl MarkdownTransform for TerminalMarkdown {
    fn transform(&self, text: &str) -> String {
        let mut writer = TerminalWriter::new(self.use_color);
        let mut code_block: Option<(String, String)> = None;

        for event in Parser::new_ext(text, parser_options()) {
            if let Some((_, body)) = code_block.as_mut() {
                match event {
                    Event::Text(text) => body.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((lang, body)) = code_block.take() {
                            writer.code_block(&body, &lang, self.highlighter.as_ref());
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some((code_language(&kind), String::new()));
                }
                Event::Start(Tag::Heading { .. }) => {
                    writer.start_block();
                    writer.push_style(ANSI_BOLD);
                    writer.push_style(ANSI_CYAN);
                }
                Event::End(TagEnd::Heading(_)) => {
                    writer.pop_style();
                    writer.pop_style();
                    writer.push_str("\n\n");
                }
                Event::Start(Tag::Paragraph) => writer.start_block(),
                Event::End(TagEnd::Paragraph) => {
                    if writer.in_list() {
                        writer.push_str("\n");
                    } else {
                        writer.push_str("\n\n");
                    }
                }
                Event::Start(Tag::Strong) => writer.push_style(ANSI_BOLD),
                Event::Start(Tag::Emphasis) => writer.push_style(ANSI_ITALIC),
                Event::Start(Tag::Strikethrough) => writer.push_style(ANSI_STRIKE),
                Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough) => {
                    writer.pop_style()
                }
                Event::Start(Tag::Link { dest_url, .. }) => {
                    writer.links.push(dest_url.to_string());
                    writer.push_style(ANSI_UNDERLINE);
                }
                Event::End(TagEnd::Link) => {
                    writer.pop_style();
                    if let Some(url) = writer.links.pop() {
                        writer.push_text(&format!(" ({url})"));
                    }
                }
                Event::Start(Tag::List(start)) => {
                    writer.start_block();
                    writer.lists.push(start);
                }
                Event::End(TagEnd::List(_)) => {
                    writer.lists.pop();
                    if !writer.in_list() {
                        writer.push_str("\n");
                    }
                }
                Event::Start(Tag::Item) => writer.start_item(),
                Event::End(TagEnd::Item) => writer.start_block(),
                Event::Start(Tag::TableCell) => writer.push_str("| "),
                Event::End(TagEnd::TableCell) => writer.push_str(" "),
                Event::End(TagEnd::TableHead | TagEnd::TableRow) => writer.push_str("|\n"),
                Event::End(TagEnd::Table) => writer.push_str("\n"),
                Event::TaskListMarker(done) => {
                    writer.push_str(if done { "[x] " } else { "[ ] " });
                }
                Event::Code(code) => {
                    writer.push_style(ANSI_YELLOW);
                    writer.push_text(&code);
                    writer.pop_style();
                }
                Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                    writer.push_text(&text)
                }
                Event::SoftBreak | Event::HardBreak => writer.push_str("\n"),
                Event::Rule => {
                    writer.start_block();
                    writer.push_str("────────────────────\n\n");
                }
                _ => {}
            }
        }

        writer.finish()
    }
}

/// Accumulates terminal output with a stack of active ANSI styles.
struct TerminalWriter {
    out: String,
    use_color: bool,
    styles: Vec<&'static str>,
    lists: Vec<Option<u64>>,
    links: Vec<String>,
}

impl TerminalWriter {
    fn new(use_color: bool) -> Self {
        Self {
            out: String::new(),
            use_color,
            styles: Vec::new(),
            lists: Vec::new(),
            links: Vec::new(),
        }
    }

    fn in_list(&self) -> bool {
        !self.lists.is_empty()
    }

    fn push_str(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn push_text(&mut self, text: &str) {
        self.out.push_str(&sanitize_terminal(text));
    }

    fn start_block(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn start_item(&mut self) {
        self.start_block();
        let depth = self.lists.len().saturating_sub(1);
        self.out.push_str(&"  ".repeat(depth));
        let bullet = if self.use_color { "• " } else { "- " };
        let marker = match self.lists.last_mut() {
            Some(Some(n)) => {
                let marker = format!("{n}. ");
                *n += 1;
                marker
            }
            _ => bullet.to_string(),
        };
        self.out.push_str(&marker);
    }

    fn push_style(&mut self, style: &'static str) {
        self.styles.push(style);
        if self.use_color {
            self.out.push_str(style);
        }
    }

    fn pop_style(&mut self) {
        self.styles.pop();
        if self.use_color {
            self.out.push_str(ANSI_RESET);
            for style in &self.styles {
                self.out.push_str(style);
            }
        }
    }

    fn code_block(&mut self, body: &str, lang: &str, highlighter: Option<&Highlighter>) {
        self.start_block();
        // Highlighting emits escapes of its own, so the body is cleaned first.
        let body = sanitize_terminal(body);
        let highlighted = if self.use_color {
            highlighter.and_then(|h| h.ansi(&body, lang))
        } else {
            None
        };
        match highlighted {
            Some(code) => self.out.push_str(&code),
            None => {
                if self.use_color {
                    self.out.push_str(ANSI_DIM);
                }
                self.out.push_str(&body);
                if self.use_color {
                    self.out.push_str(ANSI_RESET);
                }
            }
        }
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out.push('\n');
    }

    fn finish(mut self) -> String {
        if self.use_color && !self.styles.is_empty() {
            self.out.push_str(ANSI_RESET);
        }
        let trimmed = self.out.trim_end().len();
        self.out.truncate(trimmed);
        self.out
    }
}

/// Renders markdown as an HTML fragment.
///
/// Raw HTML inside the reply is escaped rather than passed through.
pub struct HtmlMarkdown {
    highlighter: Option<Highlighter>,
}

impl HtmlMarkdown {
    /// Creates a transform, optionally highlighting code blocks.
    pub fn new(highlighter: Option<Highlighter>) -> Self {
        Self { highlighter }
    }
}

impl MarkdownTransform for HtmlMarkdown {
    fn transform(&self, text: &str) -> String {
        let mut events = Vec::new();
        let mut code_block: Option<(String, String)> = None;

        for event in Parser::new_ext(text, parser_options()) {
            if let Some((_, body)) = code_block.as_mut() {
                match event {
                    Event::Text(text) => body.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((lang, body)) = code_block.take() {
                            let highlighted = self
                                .highlighter
                                .as_ref()
                                .and_then(|h| h.html(&body, &lang))
                                .unwrap_or_else(|| plain_code_html(&body, &lang));
                            events.push(Event::Html(highlighted.into()));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some((code_language(&kind), String::new()));
                }
                Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => events.push(Event::Start(Tag::Link {
                    link_type,
                    dest_url: safe_destination(dest_url),
                    title,
                    id,
                })),
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => events.push(Event::Start(Tag::Image {
                    link_type,
                    dest_url: safe_destination(dest_url),
                    title,
                    id,
                })),
                Event::SoftBreak => events.push(Event::HardBreak),
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

/// Keeps relative and `http`, `https` or `mailto` destinations; anything
/// else (`javascript:`, `data:`, ...) becomes `#`.
fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    let normalized: String = dest
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let scheme = normalized
        .split_once(':')
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.contains(['/', '?', '#']));
    match scheme {
        None | Some("http" | "https" | "mailto") => dest,
        Some(_) => CowStr::Borrowed("#"),
    }
}

fn plain_code_html(body: &str, lang: &str) -> String {
    if lang.is_empty() {
        format!("<pre><code>{}</code></pre>\n", escape_html(body))
    } else {
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            escape_html(lang),
            escape_html(body)
        )
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// First word of a fenced block's info string, e.g. `rust` for "rust,ignore".
fn code_language(kind: &CodeBlockKind<'_>) -> String {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split(|c: char| c == ',' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_string(),
        CodeBlockKind::Indented => String::new(),
    }
}

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replaces control characters other than newline and tab so that text from
/// the user or the backend cannot drive the terminal.
pub fn sanitize_terminal(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                char::REPLACEMENT_CHARACTER
            } else {
                c
            }
        })
        .collect()
}
