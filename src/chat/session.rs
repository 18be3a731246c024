//! Core chat session management.
//!
//! `ChatSession` owns everything that lives for the duration of a chat: the
//! transport, the resolved configuration, the message list and the request
//! state. It is created at startup and consumed by [`ChatSession::finish`].

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::chat::config::ChatConfig;
use crate::chat::validate::validate_input;
use crate::client::{ChatBackend, ChatTransport};
use crate::error::{Error, Result};
use crate::observability::{SESSION_IGNORED, SESSION_REJECTED, SESSION_SUBMISSIONS};
use crate::render::Renderer;
use crate::types::{Message, MessageList, RequestState, Sender};

/// How often the loading indicator is refreshed.
pub const LOADING_TICK: Duration = Duration::from_millis(100);

/// Outcome of [`ChatSession::submit`].
#[derive(Debug, Clone)]
pub enum Submission {
    /// The input was empty; nothing happened.
    Ignored,

    /// The input failed validation and was not sent.
    Rejected(Error),

    /// The backend answered and the reply was appended.
    Answered,

    /// The exchange failed; an error-styled reply was appended.
    Failed(Error),
}

impl Submission {
    /// Returns true if a request was sent.
    pub fn was_sent(&self) -> bool {
        matches!(self, Submission::Answered | Submission::Failed(_))
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The backend base URL.
    pub base_url: String,
    /// The client-side request timeout.
    pub timeout: Duration,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// Messages typed by the user.
    pub user_messages: usize,
    /// Replies, including error replies.
    pub assistant_messages: usize,
    /// Replies that report a failed exchange.
    pub error_replies: usize,
    /// Total number of requests sent.
    pub total_requests: u64,
    /// Inputs rejected for length.
    pub rejected_inputs: u64,
    /// Round-trip time of the last request, if any.
    pub last_latency: Option<Duration>,
    /// Whether replies are markdown-rendered.
    pub markdown: bool,
    /// Whether code blocks are highlighted.
    pub highlight: bool,
}

/// A chat session that manages conversation state and backend interactions.
pub struct ChatSession<T: ChatTransport = ChatBackend> {
    transport: T,
    config: ChatConfig,
    messages: MessageList,
    state: RequestState,
    request_count: u64,
    rejected_count: u64,
    last_latency: Option<Duration>,
}

impl ChatSession<ChatBackend> {
    /// Creates a session talking to the backend named in `config`.
    pub fn connect(config: ChatConfig) -> Result<Self> {
        let backend = ChatBackend::with_options(&config.base_url, Some(config.timeout), None)?;
        Ok(Self::with_transport(backend, config))
    }
}

impl<T: ChatTransport> ChatSession<T> {
    /// Creates a new chat session with a custom transport.
    pub fn with_transport(transport: T, config: ChatConfig) -> Self {
        let messages = match &config.welcome {
            Some(welcome) => MessageList::with_welcome(welcome.clone()),
            None => MessageList::new(),
        };
        log::info!("chat session started against {}", config.base_url);
        Self {
            transport,
            config,
            messages,
            state: RequestState::Idle,
            request_count: 0,
            rejected_count: 0,
            last_latency: None,
        }
    }

    /// Renders the welcome placeholder, if the session has one.
    pub fn render_welcome(&self, renderer: &mut dyn Renderer) {
        if let Some(welcome) = self.messages.welcome() {
            renderer.render_welcome(welcome);
        }
    }

    /// Submits raw user input.
    ///
    /// This method:
    /// 1. Validates the input, ignoring empty input and rejecting overlong input
    /// 2. Appends and renders the user message
    /// 3. Sends exactly one request, refreshing the loading indicator meanwhile
    /// 4. Appends and renders the reply, or an error-styled reply on failure
    ///
    /// Remote failures never escape: the session is idle again on return.
    pub async fn submit(&mut self, raw: &str, renderer: &mut dyn Renderer) -> Submission {
        let text = match validate_input(raw, self.config.max_message_chars) {
            Ok(text) => text,
            Err(Error::EmptyInput) => {
                SESSION_IGNORED.click();
                return Submission::Ignored;
            }
            Err(err) => {
                SESSION_REJECTED.click();
                self.rejected_count += 1;
                log::debug!("rejected input: {err}");
                renderer.print_notice(&err.user_message());
                return Submission::Rejected(err);
            }
        };
        SESSION_SUBMISSIONS.click();

        let user_message = Message::user(text.as_str());
        renderer.render_message(&user_message);
        self.messages.push(user_message);

        self.state = RequestState::sending();
        self.request_count += 1;
        renderer.start_loading();

        let result = {
            let mut exchange = self.transport.ask(&text);
            let mut ticker = tokio::time::interval(LOADING_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    result = &mut exchange => break result,
                    _ = ticker.tick() => {
                        renderer.update_loading(self.state.elapsed().unwrap_or_default())
                    }
                }
            }
        };

        let elapsed = self.state.elapsed().unwrap_or_default();
        self.state = RequestState::Idle;
        self.last_latency = Some(elapsed);
        renderer.finish_loading(elapsed);

        match result {
            Ok(reply) => {
                let reply = Message::assistant(reply);
                renderer.render_message(&reply);
                self.messages.push(reply);
                Submission::Answered
            }
            Err(err) => {
                log::warn!("request failed after {elapsed:?}: {err}");
                let reply = Message::assistant_error(err.user_message());
                renderer.render_message(&reply);
                self.messages.push(reply);
                Submission::Failed(err)
            }
        }
    }

    /// Probes backend liveness.
    pub async fn check_health(&self) -> bool {
        self.transport.health().await
    }

    /// The conversation so far.
    pub fn messages(&self) -> &MessageList {
        &self.messages
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// The current request state.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Returns true while a request is in flight.
    pub fn is_sending(&self) -> bool {
        self.state.is_sending()
    }

    /// The resolved configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Sets whether replies are markdown-rendered.
    ///
    /// Renderers built from [`ChatSession::config`] pick this up when rebuilt.
    pub fn set_markdown(&mut self, enabled: bool) {
        self.config.markdown = enabled;
    }

    /// Sets whether code blocks are highlighted.
    pub fn set_highlight(&mut self, enabled: bool) {
        self.config.highlight = enabled;
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let mut user_messages = 0;
        let mut assistant_messages = 0;
        let mut error_replies = 0;
        for message in self.messages.messages() {
            match message.sender() {
                Sender::User => user_messages += 1,
                Sender::Assistant => {
                    assistant_messages += 1;
                    if message.is_error() {
                        error_replies += 1;
                    }
                }
            }
        }
        SessionStats {
            base_url: self.config.base_url.clone(),
            timeout: self.config.timeout,
            message_count: self.messages.len(),
            user_messages,
            assistant_messages,
            error_replies,
            total_requests: self.request_count,
            rejected_inputs: self.rejected_count,
            last_latency: self.last_latency,
            markdown: self.config.markdown,
            highlight: self.config.highlight,
        }
    }

    /// Ends the session and returns its final statistics.
    pub fn finish(self) -> SessionStats {
        let stats = self.stats();
        log::info!(
            "chat session closed: {} messages, {} requests",
            stats.message_count,
            stats.total_requests
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::{Entry, MessageStyle};

    /// Transport answering from a script and counting calls.
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<String>>>,
        delay: Duration,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait::async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn ask(&self, message: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(message.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default".to_string()))
        }

        async fn health(&self) -> bool {
            true
        }
    }

    /// Records renderer calls as strings.
    #[derive(Default)]
    struct RecordingRenderer {
        events: Vec<String>,
        loading_updates: usize,
        finished_after: Option<Duration>,
    }

    impl Renderer for RecordingRenderer {
        fn render_welcome(&mut self, text: &str) {
            self.events.push(format!("welcome:{text}"));
        }

        fn render_message(&mut self, message: &Message) {
            let style = match message.style() {
                MessageStyle::Normal => "",
                MessageStyle::Error => "!",
            };
            self.events
                .push(format!("{}{style}:{}", message.sender(), message.text()));
        }

        fn print_notice(&mut self, notice: &str) {
            self.events.push(format!("notice:{notice}"));
        }

        fn print_error(&mut self, error: &str) {
            self.events.push(format!("error:{error}"));
        }

        fn print_info(&mut self, info: &str) {
            self.events.push(format!("info:{info}"));
        }

        fn start_loading(&mut self) {
            self.events.push("loading".to_string());
        }

        fn update_loading(&mut self, _: Duration) {
            self.loading_updates += 1;
        }

        fn finish_loading(&mut self, elapsed: Duration) {
            self.finished_after = Some(elapsed);
            self.events.push("loaded".to_string());
        }
    }

    fn session(replies: Vec<Result<String>>) -> ChatSession<ScriptedTransport> {
        ChatSession::with_transport(ScriptedTransport::new(replies), ChatConfig::new())
    }

    #[tokio::test]
    async fn new_session_empty() {
        let session = session(vec![]);
        assert_eq!(session.message_count(), 0);
        assert!(!session.is_sending());
        assert_eq!(session.messages().welcome(), Some(crate::chat::DEFAULT_WELCOME));
    }

    #[tokio::test]
    async fn answered_submission() {
        let mut session = session(vec![Ok("Hi! How can I help?".to_string())]);
        let mut renderer = RecordingRenderer::default();

        let outcome = session.submit("  hello  ", &mut renderer).await;
        assert!(matches!(outcome, Submission::Answered));
        assert_eq!(session.transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*session.transport.seen.lock().unwrap(), vec!["hello"]);
        assert_eq!(
            renderer.events,
            vec![
                "user:hello",
                "loading",
                "loaded",
                "assistant:Hi! How can I help?"
            ]
        );
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.state(), RequestState::Idle);
        assert!(session.stats().last_latency.is_some());
    }

    #[tokio::test]
    async fn empty_input_is_ignored() {
        let mut session = session(vec![]);
        let mut renderer = RecordingRenderer::default();
        for raw in ["", "   ", "\n\t"] {
            let outcome = session.submit(raw, &mut renderer).await;
            assert!(matches!(outcome, Submission::Ignored));
        }
        assert_eq!(session.transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.message_count(), 0);
        assert!(renderer.events.is_empty());
    }

    #[tokio::test]
    async fn overlong_input_is_rejected_with_notice() {
        let mut session = session(vec![]);
        let mut renderer = RecordingRenderer::default();
        let outcome = session.submit(&"x".repeat(501), &mut renderer).await;
        assert!(matches!(
            outcome,
            Submission::Rejected(Error::InputTooLong { length: 501, max: 500 })
        ));
        assert!(!outcome.was_sent());
        assert_eq!(session.transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.message_count(), 0);
        assert_eq!(renderer.events.len(), 1);
        assert!(renderer.events[0].starts_with("notice:Message is too long"));
        assert_eq!(session.stats().rejected_inputs, 1);
    }

    #[tokio::test]
    async fn failures_become_error_replies() {
        let mut session = session(vec![
            Err(Error::not_found("no route")),
            Err(Error::internal_server("boom")),
            Err(Error::timeout("request timed out", Some(30.0))),
            Err(Error::connection("refused", None)),
            Err(Error::api(418, "I'm a teapot")),
        ]);
        let mut renderer = RecordingRenderer::default();
        for n in 0..5 {
            let outcome = session.submit(&format!("question {n}"), &mut renderer).await;
            assert!(matches!(outcome, Submission::Failed(_)));
            assert!(!session.is_sending());
        }
        let replies: Vec<&str> = session
            .messages()
            .messages()
            .filter(|m| m.sender() == Sender::Assistant)
            .map(Message::text)
            .collect();
        assert_eq!(
            replies,
            vec![
                "The chat endpoint could not be found.",
                "The server encountered an internal error.",
                "The request timed out.",
                "Please check your network connection.",
                "HTTP 418: I'm a teapot",
            ]
        );
        let stats = session.stats();
        assert_eq!(stats.error_replies, 5);
        assert_eq!(stats.total_requests, 5);
        assert!(renderer.events.iter().any(|e| e.starts_with("assistant!:")));
    }

    #[tokio::test]
    async fn order_is_insertion_order() {
        let mut session = session(vec![
            Ok("one".to_string()),
            Ok("one".to_string()),
            Ok("two".to_string()),
        ]);
        let mut renderer = RecordingRenderer::default();
        for raw in ["a", "a", "b"] {
            session.submit(raw, &mut renderer).await;
        }
        let texts: Vec<&str> = session.messages().messages().map(Message::text).collect();
        assert_eq!(texts, vec!["a", "one", "a", "one", "b", "two"]);
        assert!(matches!(session.messages().entries()[0], Entry::Welcome(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn loading_ticks_while_waiting() {
        let transport =
            ScriptedTransport::new(vec![Ok("done".to_string())]).with_delay(Duration::from_millis(450));
        let mut session = ChatSession::with_transport(transport, ChatConfig::new());
        let mut renderer = RecordingRenderer::default();
        let outcome = session.submit("slow question", &mut renderer).await;
        assert!(matches!(outcome, Submission::Answered));
        assert!(renderer.loading_updates >= 4, "got {}", renderer.loading_updates);
        assert!(renderer.finished_after.is_some());
        assert_eq!(renderer.finished_after, session.stats().last_latency);
    }

    #[tokio::test]
    async fn welcome_rendering() {
        let config = ChatConfig::new().with_welcome(Some("Welcome!".to_string()));
        let session = ChatSession::with_transport(ScriptedTransport::new(vec![]), config);
        let mut renderer = RecordingRenderer::default();
        session.render_welcome(&mut renderer);
        assert_eq!(renderer.events, vec!["welcome:Welcome!"]);

        let config = ChatConfig::new().with_welcome(None);
        let session = ChatSession::with_transport(ScriptedTransport::new(vec![]), config);
        let mut renderer = RecordingRenderer::default();
        session.render_welcome(&mut renderer);
        assert!(renderer.events.is_empty());
    }

    #[tokio::test]
    async fn finish_returns_stats() {
        let mut session = session(vec![Ok("reply".to_string())]);
        let mut renderer = RecordingRenderer::default();
        session.submit("hi", &mut renderer).await;
        session.set_markdown(false);
        let stats = session.finish();
        assert_eq!(stats.message_count, 2);
        assert_eq!(stats.user_messages, 1);
        assert_eq!(stats.assistant_messages, 1);
        assert_eq!(stats.error_replies, 0);
        assert!(!stats.markdown);
    }
}
