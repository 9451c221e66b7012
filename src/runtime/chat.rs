use anyhow::Result;
use colored::Colorize;
use futures::{Stream, StreamExt};
use std::io;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tracing::warn;

use super::render::Renderer;
use crate::session::SessionController;

/// Slash commands understood by the interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Usage,
    Reset,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    /// `None` means the line is a chat message
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let name = line.strip_prefix('/')?;
        Some(match name.split_whitespace().next().unwrap_or("") {
            "help" | "?" => Self::Help,
            "usage" => Self::Usage,
            "reset" | "clear" => Self::Reset,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// Line-oriented chat over stdin/stdout
pub struct ChatRepl {
    controller: SessionController,
    renderer: Renderer,
    show_usage: bool,
}

impl ChatRepl {
    pub fn new(controller: SessionController, renderer: Renderer, show_usage: bool) -> Self {
        Self {
            controller,
            renderer,
            show_usage,
        }
    }

    /// Read messages until EOF or `/quit`
    pub async fn run(&self) -> Result<()> {
        println!("{}", "Meal Planning Assistant".bold());
        println!(
            "{}",
            "Tell me what ingredients you have, and I'll suggest healthy recipes! (/help for commands)"
                .dimmed()
        );

        let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
        self.read_lines(lines).await
    }

    /// Drive the chat from a stream of input lines
    async fn read_lines<S>(&self, lines: S) -> Result<()>
    where
        S: Stream<Item = io::Result<String>> + Unpin,
    {
        let mut lines = lines;
        print_prompt();

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!(error = %e, "skipping input line that is not valid UTF-8");
                    println!("{}", "Could not read that line; try again.".yellow());
                    print_prompt();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match ReplCommand::parse(&line) {
                Some(ReplCommand::Quit) => break,
                Some(command) => self.run_command(command),
                None => self.exchange(&line).await,
            }
            print_prompt();
        }

        Ok(())
    }

    fn run_command(&self, command: ReplCommand) {
        match command {
            ReplCommand::Help => {
                println!("  /usage   show remaining requests");
                println!("  /reset   start a fresh conversation");
                println!("  /quit    leave the chat");
            }
            ReplCommand::Usage => match self.controller.state().usage {
                Some(usage) => println!("{}", self.renderer.usage(&usage)),
                None => println!("{}", "No usage reported yet.".dimmed()),
            },
            ReplCommand::Reset => {
                if self.controller.reset() {
                    println!("{}", "Conversation cleared.".dimmed());
                } else {
                    println!("{}", "Still waiting for a reply; try again shortly.".yellow());
                }
            }
            ReplCommand::Unknown(name) => {
                println!("{} /{}", "Unknown command:".yellow(), name);
            }
            ReplCommand::Quit => {}
        }
    }

    async fn exchange(&self, line: &str) {
        let before = self.controller.state().transcript.len();
        let Some(submission) = self.controller.submit(line) else {
            if !line.trim().is_empty() {
                println!("{}", "Still waiting for a reply; message not sent.".yellow());
            }
            return;
        };

        println!("{}", "thinking...".dimmed());
        submission.settled().await;

        let state = self.controller.state();
        for line in self.renderer.settled(&state, before + 1, self.show_usage) {
            println!("{}", line);
        }
    }
}

fn print_prompt() {
    use std::io::Write;
    print!("{} ", ">".blue().bold());
    let _ = std::io::stdout().flush();
}
