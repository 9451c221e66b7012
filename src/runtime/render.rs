use colored::Colorize;

use crate::app::UIConfig;
use crate::backend::UsageSnapshot;
use crate::session::{Role, SessionState, Turn};

/// Turns session state into terminal lines
pub struct Renderer {
    ui: UIConfig,
}

impl Renderer {
    pub fn new(ui: UIConfig) -> Self {
        Self { ui }
    }

    pub fn turn(&self, turn: &Turn) -> String {
        match turn.role {
            Role::User => format!(
                "{} {}",
                format!("[{}]", self.ui.user_label).blue().bold(),
                turn.content
            ),
            Role::Assistant => format!(
                "{}\n{}",
                format!("[{}]", self.ui.assistant_label).green().bold(),
                turn.content
            ),
        }
    }

    pub fn error(&self, message: &str) -> String {
        format!("{} {}", "error:".red().bold(), message)
    }

    pub fn usage(&self, usage: &UsageSnapshot) -> String {
        format!("{} {}", "Usage:".dimmed(), usage)
    }

    /// Lines to print once an exchange has settled
    ///
    /// `echoed` is the transcript length right after the user turn was
    /// appended; the user already saw their own turn as they typed it.
    pub fn settled(&self, state: &SessionState, echoed: usize, show_usage: bool) -> Vec<String> {
        let mut lines: Vec<String> = state
            .transcript
            .iter()
            .skip(echoed)
            .map(|turn| self.turn(turn))
            .collect();

        if let Some(error) = &state.last_error {
            lines.push(self.error(error));
        } else if show_usage {
            if let Some(usage) = &state.usage {
                lines.push(self.usage(usage));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain_renderer() -> Renderer {
        colored::control::set_override(false);
        Renderer::new(UIConfig::default())
    }

    #[test]
    fn test_settled_success_shows_reply_and_usage() {
        let renderer = plain_renderer();
        let state = SessionState {
            transcript: vec![Turn::user("eggs"), Turn::assistant("Make an omelette")],
            pending: false,
            last_error: None,
            usage: Some(UsageSnapshot { used: 4, remaining: 6, limit: 10 }),
        };

        assert_eq!(
            renderer.settled(&state, 1, true),
            vec![
                "[Assistant]\nMake an omelette".to_string(),
                "Usage: 4/10 (6 remaining)".to_string(),
            ]
        );
        assert_eq!(renderer.settled(&state, 1, false).len(), 1);
    }

    #[test]
    fn test_settled_failure_shows_error_only() {
        let renderer = plain_renderer();
        let state = SessionState {
            transcript: vec![Turn::user("eggs")],
            pending: false,
            last_error: Some("quota exceeded".to_string()),
            usage: Some(UsageSnapshot { used: 10, remaining: 0, limit: 10 }),
        };

        assert_eq!(
            renderer.settled(&state, 1, true),
            vec!["error: quota exceeded".to_string()]
        );
    }

    #[test]
    fn test_user_turn_uses_configured_label() {
        colored::control::set_override(false);
        let renderer = Renderer::new(UIConfig {
            user_label: "Me".to_string(),
            ..UIConfig::default()
        });
        assert_eq!(renderer.turn(&Turn::user("hi")), "[Me] hi");
    }
}
