//! Response parsers
//!
//! Extraction of rankings, revised answers, per-model critiques, ReAct
//! steps, and the reflection/synthesis split from free-form model output.
//!
//! Every parser here is total: malformed input never produces an error,
//! it produces the documented fallback.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::participant::ParticipantId;
use crate::council::ranking::Label;
use crate::council::round::ModelResponse;

static FINAL_RANKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*FINAL RANKING:[ \t]*$").expect("valid regex"));
static NUMBERED_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.\s*Response ([A-Z])").expect("valid regex"));
static ANY_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Response ([A-Z])").expect("valid regex"));

/// Parse the `FINAL RANKING:` section of a peer evaluation
///
/// Primary path: locate the `FINAL RANKING:` line (case-insensitive), read
/// the `N. Response X` entries after it and return the labels in `N` order.
/// Fallback: scan the whole text for `Response X` mentions, deduplicated
/// preserving first occurrence.
pub fn parse_ranking(text: &str) -> Vec<Label> {
    if let Some(marker) = FINAL_RANKING.find(text) {
        let section = &text[marker.end()..];

        let mut numbered: Vec<(u32, Label)> = NUMBERED_ENTRY
            .captures_iter(section)
            .filter_map(|caps| {
                let n = caps[1].parse::<u32>().ok()?;
                let label = caps[2].chars().next()?;
                Some((n, Label(label)))
            })
            .collect();
        if !numbered.is_empty() {
            numbered.sort_by_key(|(n, _)| *n);
            return numbered.into_iter().map(|(_, label)| label).collect();
        }

        let plain: Vec<Label> = scan_labels(section);
        if !plain.is_empty() {
            return plain;
        }
    }

    dedup_first(scan_labels(text))
}

fn scan_labels(text: &str) -> Vec<Label> {
    ANY_LABEL
        .captures_iter(text)
        .filter_map(|caps| caps[1].chars().next().map(Label))
        .collect()
}

fn dedup_first(labels: Vec<Label>) -> Vec<Label> {
    let mut seen = Vec::new();
    for label in labels {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen
}

static REVISED_RESPONSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)##\s*Revised Response\s*\n(.*)").expect("valid regex"));

/// Extract the `## Revised Response` section from a defense
///
/// Fallback: the full defense content, so the revised answer is never empty
/// for a non-empty defense.
pub fn parse_revised_answer(defense: &str) -> String {
    if let Some(caps) = REVISED_RESPONSE.captures(defense) {
        let tail = caps[1].trim();
        if !tail.is_empty() {
            return tail.to_string();
        }
    }
    defense.to_string()
}

/// Collect all critiques directed at one participant
///
/// Looks for `## Critique of <participant>` sections in each critic's
/// response (case-insensitive, tolerant of decoration around the name),
/// falling back to any section whose heading mentions the participant.
/// Returns the concatenation with source-attribution headers, or a sentinel
/// line when nothing was extracted.
pub fn critiques_for_model(
    target: &ParticipantId,
    critique_responses: &[ModelResponse],
) -> String {
    let target_name = target.short_name().to_lowercase();
    let mut critiques = Vec::new();

    for response in critique_responses {
        // Self-critiques should not exist, skip them regardless
        if &response.model == target {
            continue;
        }
        if let Some(section) = critique_section(&response.content, &target_name) {
            critiques.push(format!("**From {}:**\n{}", response.model, section));
        }
    }

    if critiques.is_empty() {
        return "(No specific critiques were extracted for this model)".to_string();
    }
    critiques.join("\n\n")
}

fn critique_section(content: &str, target_name: &str) -> Option<String> {
    let sections = heading_sections(content);

    let matching = |require_critique_of: bool| {
        sections.iter().find_map(|(heading, body)| {
            let heading = heading.to_lowercase();
            let hit = heading.contains(target_name)
                && (!require_critique_of || heading.contains("critique of"));
            let body = body.trim();
            (hit && !body.is_empty()).then(|| body.to_string())
        })
    };

    matching(true).or_else(|| matching(false))
}

/// Split markdown content into `(heading, body)` pairs at `##` headings
fn heading_sections(content: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim_start();
        if let Some(heading) = trimmed.strip_prefix("##") {
            sections.push((heading.trim_start_matches('#').trim().to_string(), String::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }
    sections
}

/// An action recognized in ReAct output
#[derive(Debug, Clone, PartialEq)]
pub enum ReactAction {
    /// `search_web("query")` — the one tool action
    SearchWeb(String),
    /// `respond()` — terminal for council members
    Respond,
    /// `synthesize()` — terminal alias accepted from chairman-flavored output
    Synthesize,
}

impl ReactAction {
    pub fn name(&self) -> &'static str {
        match self {
            ReactAction::SearchWeb(_) => "search_web",
            ReactAction::Respond => "respond",
            ReactAction::Synthesize => "synthesize",
        }
    }

    pub fn arg(&self) -> Option<&str> {
        match self {
            ReactAction::SearchWeb(query) => Some(query),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReactAction::Respond | ReactAction::Synthesize)
    }
}

/// One parsed ReAct step; either part may be absent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReactStep {
    pub thought: Option<String>,
    pub action: Option<ReactAction>,
}

static THOUGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)Thought:\s*(.+?)(?:\n\s*Action:|$)").expect("valid regex"));
static ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Action:\s*(\w+)\s*\(([^)]*)\)").expect("valid regex"));
static AFTER_RESPOND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)Action:\s*respond\s*\(\s*\)\s*\n*(.*)").expect("valid regex")
});
static AFTER_SYNTHESIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)Action:\s*synthesize\s*\(\s*\)\s*\n*(.*)").expect("valid regex")
});

/// Extract the first `Thought:` and first `Action:` from ReAct output
///
/// Unrecognized action names yield no action at all; the agent loop decides
/// how to proceed.
pub fn parse_react(text: &str) -> ReactStep {
    let thought = THOUGHT
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|t| !t.is_empty());

    let action = ACTION.captures(text).and_then(|caps| {
        let raw_arg = caps[2].trim();
        match caps[1].to_lowercase().as_str() {
            "search_web" => {
                // Accept single or double quotes around the query
                let query = raw_arg.trim_matches(|c| c == '"' || c == '\'').to_string();
                Some(ReactAction::SearchWeb(query))
            }
            "respond" => Some(ReactAction::Respond),
            "synthesize" => Some(ReactAction::Synthesize),
            _ => None,
        }
    });

    ReactStep { thought, action }
}

/// The content a model wrote after its terminal action line
pub fn content_after_terminal(text: &str, action: &ReactAction) -> Option<String> {
    let re = match action {
        ReactAction::Respond => &*AFTER_RESPOND,
        ReactAction::Synthesize => &*AFTER_SYNTHESIZE,
        ReactAction::SearchWeb(_) => return None,
    };
    re.captures(text).map(|caps| caps[1].trim().to_string())
}

static SYNTHESIS_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)##\s*Synthesis\s*\n").expect("valid regex"));

/// Split chairman output at the `## Synthesis` boundary
///
/// Returns `(reflection, synthesis)`. When the boundary is missing the whole
/// content is the synthesis and the reflection is empty.
pub fn split_reflection(text: &str) -> (String, String) {
    match SYNTHESIS_BOUNDARY.find(text) {
        Some(boundary) => (
            text[..boundary.start()].trim().to_string(),
            text[boundary.end()..].trim().to_string(),
        ),
        None => (String::new(), text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranking_numbered() {
        let text = "Response A is detailed.\nResponse B is terse.\n\nFINAL RANKING:\n1. Response B\n2. Response A\n3. Response C";
        assert_eq!(
            parse_ranking(text),
            vec![Label('B'), Label('A'), Label('C')]
        );
    }

    #[test]
    fn test_parse_ranking_respects_numbering_order() {
        let text = "FINAL RANKING:\n2. Response A\n1. Response C\n3. Response B";
        assert_eq!(
            parse_ranking(text),
            vec![Label('C'), Label('A'), Label('B')]
        );
    }

    #[test]
    fn test_parse_ranking_case_insensitive_marker() {
        let text = "final ranking:\n1. Response A\n2. Response B";
        assert_eq!(parse_ranking(text), vec![Label('A'), Label('B')]);
    }

    #[test]
    fn test_parse_ranking_unnumbered_section() {
        let text = "FINAL RANKING:\nResponse C, Response A, Response B";
        assert_eq!(
            parse_ranking(text),
            vec![Label('C'), Label('A'), Label('B')]
        );
    }

    #[test]
    fn test_parse_ranking_global_fallback() {
        let text = "Response C beats Response A which beats Response B";
        assert_eq!(
            parse_ranking(text),
            vec![Label('C'), Label('A'), Label('B')]
        );
    }

    #[test]
    fn test_parse_ranking_fallback_dedups_first_occurrence() {
        let text = "I like Response B. Response A is close to Response B in quality.";
        assert_eq!(parse_ranking(text), vec![Label('B'), Label('A')]);
    }

    #[test]
    fn test_parse_ranking_empty_input() {
        assert!(parse_ranking("no labels here").is_empty());
    }

    #[test]
    fn test_revised_answer_extraction() {
        let defense = "## Addressing Critiques\nI concede the point.\n\n## Revised Response\nThe corrected answer.";
        assert_eq!(parse_revised_answer(defense), "The corrected answer.");
    }

    #[test]
    fn test_revised_answer_case_insensitive() {
        let defense = "## revised response\nLowercase header answer.";
        assert_eq!(parse_revised_answer(defense), "Lowercase header answer.");
    }

    #[test]
    fn test_revised_answer_fallback_full_content() {
        let defense = "I stand by everything I said.";
        assert_eq!(parse_revised_answer(defense), defense);
    }

    #[test]
    fn test_revised_answer_empty_section_falls_back() {
        let defense = "## Addressing Critiques\nFine.\n\n## Revised Response\n   ";
        assert_eq!(parse_revised_answer(defense), defense);
    }

    fn critique(model: &str, content: &str) -> ModelResponse {
        ModelResponse::new(model.into(), content)
    }

    #[test]
    fn test_critiques_for_model_extracts_section() {
        let critics = vec![
            critique(
                "x-ai/grok-3",
                "## Critique of gpt-4o-mini\nToo shallow.\n\n## Critique of deepseek-chat\nSolid.",
            ),
            critique(
                "deepseek/deepseek-chat",
                "## Critique of gpt-4o-mini\nMissed the key fact.",
            ),
        ];

        let result = critiques_for_model(&"openai/gpt-4o-mini".into(), &critics);
        assert!(result.contains("**From x-ai/grok-3:**\nToo shallow."));
        assert!(result.contains("**From deepseek/deepseek-chat:**\nMissed the key fact."));
        assert!(!result.contains("Solid."));
    }

    #[test]
    fn test_critiques_skip_self() {
        let critics = vec![critique(
            "openai/gpt-4o-mini",
            "## Critique of gpt-4o-mini\nSelf-criticism.",
        )];
        let result = critiques_for_model(&"openai/gpt-4o-mini".into(), &critics);
        assert_eq!(result, "(No specific critiques were extracted for this model)");
    }

    #[test]
    fn test_critiques_tolerate_header_decoration() {
        let critics = vec![critique(
            "x-ai/grok-3",
            "## Critique of **gpt-4o-mini** (OpenAI)\nVerbose but sound.",
        )];
        let result = critiques_for_model(&"openai/gpt-4o-mini".into(), &critics);
        assert!(result.contains("Verbose but sound."));
    }

    #[test]
    fn test_critiques_loose_header_fallback() {
        let critics = vec![critique(
            "x-ai/grok-3",
            "## Thoughts on gpt-4o-mini\nInteresting approach.",
        )];
        let result = critiques_for_model(&"openai/gpt-4o-mini".into(), &critics);
        assert!(result.contains("Interesting approach."));
    }

    #[test]
    fn test_parse_react_search_action() {
        let text = "Thought: need latest rate.\nAction: search_web(\"usd to eur today\")";
        let step = parse_react(text);
        assert_eq!(step.thought.as_deref(), Some("need latest rate."));
        assert_eq!(
            step.action,
            Some(ReactAction::SearchWeb("usd to eur today".to_string()))
        );
    }

    #[test]
    fn test_parse_react_single_quotes() {
        let step = parse_react("Action: search_web('rust 1.80 release date')");
        assert_eq!(
            step.action,
            Some(ReactAction::SearchWeb("rust 1.80 release date".to_string()))
        );
        assert!(step.thought.is_none());
    }

    #[test]
    fn test_parse_react_terminal_actions() {
        assert_eq!(
            parse_react("Thought: done.\nAction: respond()").action,
            Some(ReactAction::Respond)
        );
        assert_eq!(
            parse_react("Action: synthesize( )").action,
            Some(ReactAction::Synthesize)
        );
    }

    #[test]
    fn test_parse_react_unknown_action_ignored() {
        let step = parse_react("Thought: hmm.\nAction: fly_to_moon()");
        assert_eq!(step.thought.as_deref(), Some("hmm."));
        assert!(step.action.is_none());
    }

    #[test]
    fn test_parse_react_nothing_recognized() {
        let step = parse_react("Just a plain answer without the protocol.");
        assert_eq!(step, ReactStep::default());
    }

    #[test]
    fn test_content_after_terminal() {
        let text = "Thought: ready.\nAction: respond()\nParis is the capital of France.";
        let content = content_after_terminal(text, &ReactAction::Respond);
        assert_eq!(content.as_deref(), Some("Paris is the capital of France."));
    }

    #[test]
    fn test_split_reflection_at_boundary() {
        let text = "The models agree on the main facts.\n\n## Synthesis\nFinal answer here.";
        let (reflection, synthesis) = split_reflection(text);
        assert_eq!(reflection, "The models agree on the main facts.");
        assert_eq!(synthesis, "Final answer here.");
    }

    #[test]
    fn test_split_reflection_missing_boundary() {
        let text = "The answers agree on everything.";
        let (reflection, synthesis) = split_reflection(text);
        assert_eq!(reflection, "");
        assert_eq!(synthesis, text);
    }
}
