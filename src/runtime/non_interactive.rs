use serde::Serialize;
use std::time::Instant;

use crate::{
    backend::UsageSnapshot,
    cli::OutputFormat,
    session::{SessionController, Turn},
};

/// Result of a one-shot prompt
#[derive(Debug, Serialize)]
pub struct PromptResult {
    /// The message that was sent, trimmed
    pub prompt: String,
    /// The assistant's reply, if one arrived
    pub response: Option<String>,
    /// Failure text, if the exchange failed or was rejected
    pub error: Option<String>,
    /// Quota counters after the exchange
    pub usage: Option<UsageSnapshot>,
    /// Full transcript of the session
    pub transcript: Vec<Turn>,
    /// Wall-clock time spent waiting
    pub duration_ms: u128,
}

impl PromptResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.response.is_some()
    }
}

/// Send one message through a fresh session and collect the outcome
pub async fn run_prompt(controller: &SessionController, prompt: &str) -> PromptResult {
    let start_time = Instant::now();

    if controller.submit_and_wait(prompt).await.is_none() {
        let state = controller.state();
        let reason = if prompt.trim().is_empty() {
            "Nothing to send: the prompt is empty"
        } else {
            "Another exchange is already in flight"
        };
        return PromptResult {
            prompt: prompt.trim().to_string(),
            response: None,
            error: Some(reason.to_string()),
            usage: state.usage,
            transcript: state.transcript,
            duration_ms: start_time.elapsed().as_millis(),
        };
    }

    let state = controller.state();
    PromptResult {
        prompt: prompt.trim().to_string(),
        response: state.last_reply().map(str::to_string),
        error: state.last_error.clone(),
        usage: state.usage,
        transcript: state.transcript,
        duration_ms: start_time.elapsed().as_millis(),
    }
}

/// Render a prompt result for stdout
pub fn format_result(result: &PromptResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            if let Some(response) = &result.response {
                out.push_str(response);
            }
            if let Some(error) = &result.error {
                out.push_str(&format!("Error: {}", error));
            }
            if let Some(usage) = &result.usage {
                out.push_str(&format!("\n\nUsage: {}", usage));
            }
            out
        }
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e)),
        OutputFormat::Markdown => {
            let mut out = format!("## Request\n\n{}\n\n", result.prompt);
            if let Some(response) = &result.response {
                out.push_str(&format!("## Suggestion\n\n{}\n\n", response));
            }
            if let Some(error) = &result.error {
                out.push_str(&format!("## Error\n\n{}\n\n", error));
            }
            if let Some(usage) = &result.usage {
                out.push_str(&format!("---\n*Usage: {}*\n", usage));
            }
            out
        }
    }
}
