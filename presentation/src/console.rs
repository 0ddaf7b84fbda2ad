//! Console presenter
//!
//! Consumes the council event stream and renders it: per-participant
//! spinners while batch rounds are in flight, live token output in
//! streaming mode, section panels for rounds, and the highlighted final
//! synthesis. Total over the event vocabulary — unknown situations never
//! panic the renderer.

use std::collections::HashMap;
use std::io::Write;

use colored::Colorize;
use council_application::EventStream;
use council_domain::{CouncilEvent, ParticipantId, RoundKind};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Renders council events to the terminal
pub struct ConsolePresenter {
    /// Token-level output (sequential-streaming runs)
    streaming: bool,
}

impl ConsolePresenter {
    pub fn new(streaming: bool) -> Self {
        Self { streaming }
    }

    /// Drain the stream to completion, rendering as events arrive
    pub async fn present(&self, mut stream: EventStream) {
        let multi = MultiProgress::new();
        let mut spinners: HashMap<ParticipantId, ProgressBar> = HashMap::new();
        // Which participant's tokens are currently printing
        let mut token_owner: Option<ParticipantId> = None;

        while let Some(event) = stream.next().await {
            match event {
                CouncilEvent::RoundStart {
                    round_number,
                    round_type,
                } => {
                    println!(
                        "\n{}",
                        format!("=== Round {round_number}: {} ===", round_label(round_type))
                            .cyan()
                            .bold()
                    );
                }
                CouncilEvent::ModelStart { model } => {
                    if self.streaming {
                        println!("{}", format!("── {model} ──").yellow().bold());
                    } else {
                        let bar = multi.add(ProgressBar::new_spinner());
                        bar.set_style(spinner_style());
                        bar.set_prefix(model.to_string());
                        bar.set_message("thinking...");
                        bar.enable_steady_tick(std::time::Duration::from_millis(120));
                        spinners.insert(model, bar);
                    }
                }
                CouncilEvent::ModelComplete { model, response } => {
                    if let Some(bar) = spinners.remove(&model) {
                        bar.finish_and_clear();
                    }
                    if self.streaming {
                        finish_token_line(&mut token_owner);
                    } else {
                        println!("\n{}", format!("── {model} ──").yellow().bold());
                        println!("{}", response.answer());
                    }
                    if !response.tool_calls_made.is_empty() {
                        println!(
                            "{}",
                            format!("  ({} web searches)", response.tool_calls_made.len()).dimmed()
                        );
                    }
                }
                CouncilEvent::ModelError { model, reason } => {
                    if let Some(bar) = spinners.remove(&model) {
                        bar.finish_and_clear();
                    }
                    finish_token_line(&mut token_owner);
                    println!("{}", format!("── {model}: {reason} ──").red());
                }
                CouncilEvent::Token { model, content } => {
                    if self.streaming {
                        if token_owner != model {
                            finish_token_line(&mut token_owner);
                            token_owner = model;
                        }
                        print!("{content}");
                        let _ = std::io::stdout().flush();
                    }
                }
                CouncilEvent::ToolCall { model, name, args } => {
                    finish_token_line(&mut token_owner);
                    let who = model.map(|m| m.to_string()).unwrap_or_default();
                    let query = args
                        .get("query")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    println!("{}", format!("  [{who}] {name}({query:?})").dimmed());
                }
                CouncilEvent::ToolResult { .. } => {}
                CouncilEvent::Thought { model, text } => {
                    finish_token_line(&mut token_owner);
                    println!("{}", format!("  [{model}] thought: {text}").dimmed());
                }
                CouncilEvent::Action { model, name, arg } => {
                    finish_token_line(&mut token_owner);
                    let arg = arg.unwrap_or_default();
                    println!("{}", format!("  [{model}] action: {name}({arg})").dimmed());
                }
                CouncilEvent::Observation { model, .. } => {
                    println!("{}", format!("  [{model}] observation received").dimmed());
                }
                CouncilEvent::RoundComplete { responses, .. } => {
                    finish_token_line(&mut token_owner);
                    println!(
                        "{}",
                        format!("--- round complete ({} responses) ---", responses.len()).dimmed()
                    );
                }
                CouncilEvent::Reflection { text } => {
                    finish_token_line(&mut token_owner);
                    if !text.is_empty() {
                        println!("\n{}", "=== Chairman's Analysis ===".cyan().bold());
                        println!("{}", text.dimmed());
                    }
                }
                CouncilEvent::Synthesis { model, text } => {
                    finish_token_line(&mut token_owner);
                    println!("\n{}", "=== Final Synthesis ===".green().bold());
                    println!("{}", format!("(chairman: {model})").dimmed());
                    println!("{text}");
                }
                CouncilEvent::DebateComplete { rounds } => {
                    finish_token_line(&mut token_owner);
                    println!(
                        "\n{}",
                        format!("Debate finished after {} rounds.", rounds.len()).bold()
                    );
                }
                CouncilEvent::Error { message } => {
                    finish_token_line(&mut token_owner);
                    println!("\n{}", format!("Error: {message}").red().bold());
                }
            }
        }
    }
}

fn round_label(kind: RoundKind) -> &'static str {
    match kind {
        RoundKind::Initial => "Initial Responses",
        RoundKind::Critique => "Critiques",
        RoundKind::Defense => "Defense & Revision",
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {prefix:.bold} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Close an open token line so section output starts on its own line
fn finish_token_line(owner: &mut Option<ParticipantId>) {
    if owner.take().is_some() {
        println!();
    }
}
