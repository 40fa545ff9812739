// Interactive terminal chat on top of a ConversationController.

use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::controller::{ConversationController, SendOutcome};
use crate::message::Message;

pub const WELCOME: &str =
    "Welcome to AI Assistant. Ask me anything! Commands: /clear, /theme, /help, /quit";
const HELP: &str = "/clear  clear the conversation\n/theme  toggle light/dark theme\n/quit   leave the chat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Send(String),
    Clear,
    ToggleTheme,
    Help,
    Quit,
    Unknown(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with('/') {
            return ChatCommand::Send(line.to_string());
        }
        // "//text" sends "/text" verbatim.
        if let Some(escaped) = trimmed.strip_prefix("//") {
            return ChatCommand::Send(format!("/{}", escaped));
        }
        // Commands are a single word; "/usr/bin is missing" is a question.
        if trimmed.contains(char::is_whitespace) {
            return ChatCommand::Send(line.to_string());
        }
        match trimmed {
            "/clear" => ChatCommand::Clear,
            "/theme" => ChatCommand::ToggleTheme,
            "/help" => ChatCommand::Help,
            "/quit" | "/exit" => ChatCommand::Quit,
            other => ChatCommand::Unknown(other.to_string()),
        }
    }
}

pub fn render_message(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.time_label(),
        message.role().label(),
        message.content()
    )
}

/// Reads one line per submission from `input` until EOF or `/quit`.
pub async fn run_chat<R, W>(controller: &ConversationController, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let history = controller.messages();
    if history.is_empty() {
        writeln!(output, "{}", WELCOME)?;
    } else {
        for message in &history {
            writeln!(output, "{}", render_message(message))?;
        }
    }
    output.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match ChatCommand::parse(&line) {
            ChatCommand::Send(text) => {
                let seen = controller.messages().len();
                let outcome = controller.send(&text).await;
                debug!(?outcome, "Send finished");
                if !matches!(outcome, SendOutcome::Rejected(_)) {
                    // The user's own line is already on screen.
                    for message in controller.messages().iter().skip(seen + 1) {
                        writeln!(output, "{}", render_message(message))?;
                    }
                }
            }
            ChatCommand::Clear => {
                if controller.clear() {
                    writeln!(output, "Conversation cleared.")?;
                }
            }
            ChatCommand::ToggleTheme => {
                let theme = controller.toggle_theme();
                writeln!(output, "Theme: {}", theme)?;
            }
            ChatCommand::Help => writeln!(output, "{}", HELP)?,
            ChatCommand::Quit => break,
            ChatCommand::Unknown(command) => {
                writeln!(output, "Unknown command {}. Type /help for commands.", command)?;
            }
        }
        output.flush()?;
    }

    info!("Chat input closed");
    Ok(())
}
