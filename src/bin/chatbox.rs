//! Interactive chat client for a plain-text chat backend.
//!
//! This binary provides a REPL that sends each line to the backend and
//! renders the reply, with a live elapsed-time indicator while waiting.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on localhost:8080
//! chatbox
//!
//! # Point at another backend and fail faster
//! chatbox --base-url https://chat.example.com --timeout-secs 10
//!
//! # Check that the backend is up before chatting
//! chatbox --check
//!
//! # Emit HTML fragments instead of terminal text
//! chatbox --html --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/health` - Check whether the backend is reachable
//! - `/history` - List the conversation with timestamps
//! - `/markdown on|off` - Toggle markdown rendering
//! - `/highlight on|off` - Toggle code highlighting
//! - `/stats` - Show session statistics
//! - `/config` - Show the current configuration
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use chatbox::chat::{
    BASE_URL_ENV, ChatArgs, ChatCommand, ChatConfig, ChatSession, Renderer, SessionStats,
    build_renderer, help_text, parse_command,
};
use chatbox::ChatTransport;
use chatbox::render::history_lines;

/// Main entry point for the chatbox application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (args, _) = ChatArgs::from_command_line_relaxed("chatbox [OPTIONS]");
    let check = args.check;
    let config = ChatConfig::resolve(args, std::env::var(BASE_URL_ENV).ok())?;

    let mut session = ChatSession::connect(config)?;
    let mut renderer = build_renderer(session.config(), true);
    let mut rl = DefaultEditor::new()?;

    println!("Chatbox (backend: {})", session.config().base_url);
    println!("Type /help for commands, /quit to exit\n");

    session.render_welcome(renderer.as_mut());

    if check {
        report_health(&session, renderer.as_mut()).await;
    }

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Health => {
                            report_health(&session, renderer.as_mut()).await;
                        }
                        ChatCommand::Markdown(enabled) => {
                            session.set_markdown(enabled);
                            renderer = build_renderer(session.config(), true);
                            renderer.print_info(&format!(
                                "Markdown rendering {}.",
                                if enabled { "enabled" } else { "disabled" }
                            ));
                        }
                        ChatCommand::Highlight(enabled) => {
                            session.set_highlight(enabled);
                            renderer = build_renderer(session.config(), true);
                            renderer.print_info(&format!(
                                "Code highlighting {}.",
                                if enabled { "enabled" } else { "disabled" }
                            ));
                        }
                        ChatCommand::Stats => {
                            print_stats(&session.stats());
                        }
                        ChatCommand::ShowConfig => {
                            print_config(session.config());
                        }
                        ChatCommand::History => {
                            print_history(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message; failures are rendered as replies
                session.submit(line, renderer.as_mut()).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    session.finish();
    Ok(())
}

async fn report_health<T: ChatTransport>(
    session: &ChatSession<T>,
    renderer: &mut dyn Renderer,
) {
    if session.check_health().await {
        renderer.print_info(&format!("Backend {} is up.", session.config().base_url));
    } else {
        renderer.print_error(&format!(
            "Backend {} is not reachable.",
            session.config().base_url
        ));
    }
}

fn print_stats(stats: &SessionStats) {
    println!("    Session Statistics:");
    println!("      Backend: {}", stats.base_url);
    println!(
        "      Messages: {} ({} from you, {} replies, {} failed)",
        stats.message_count, stats.user_messages, stats.assistant_messages, stats.error_replies
    );
    println!("      Requests: {}", stats.total_requests);
    println!("      Rejected inputs: {}", stats.rejected_inputs);
    match stats.last_latency {
        Some(latency) => println!("      Last round trip: {:.1}s", latency.as_secs_f64()),
        None => println!("      Last round trip: (none)"),
    }
}

fn print_config(config: &ChatConfig) {
    println!("    Current Configuration:");
    println!("      Backend: {}", config.base_url);
    println!("      Timeout: {}s", config.timeout.as_secs());
    println!("      Max message length: {}", config.max_message_chars);
    println!("      Markdown: {}", on_off(config.markdown));
    println!("      Highlighting: {}", on_off(config.highlight));
    println!("      Theme: {}", config.theme);
    println!("      Color: {}", on_off(config.use_color));
    println!("      Output: {}", if config.html { "html" } else { "text" });
}

fn print_history<T: ChatTransport>(session: &ChatSession<T>) {
    println!("    Conversation:");
    for line in history_lines(session.messages()) {
        println!("      {}", line);
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
