//! Prompt templates for council deliberation
//!
//! All prompt construction lives here. Every builder is a pure function of
//! its inputs — the calendar date is an explicit parameter so repeated calls
//! with identical inputs produce identical prompts.

use chrono::NaiveDate;

use crate::council::ranking::Label;
use crate::council::round::{ModelResponse, RoundRecord};
use crate::core::participant::ParticipantId;

/// Templates for generating prompts at each phase
pub struct PromptTemplate;

impl PromptTemplate {
    /// Date line prepended to time-sensitive prompts
    pub fn date_context(today: NaiveDate) -> String {
        format!("Today's date is {}.\n\n", today.format("%B %d, %Y"))
    }

    /// Initial round prompt: the bare question, oriented in time, with the
    /// search tool declared
    pub fn initial(question: &str, today: NaiveDate) -> String {
        format!(
            "{}{}\n\n(You can call the search_web tool when you need current information.)",
            Self::date_context(today),
            question
        )
    }

    /// Format attributed initial responses for the critique round
    pub fn responses_for_critique(initial_responses: &[ModelResponse]) -> String {
        initial_responses
            .iter()
            .map(|r| format!("**{}:**\n{}", r.model, r.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Critique round prompt
    pub fn critique(
        question: &str,
        responses_text: &str,
        participant: &ParticipantId,
        today: NaiveDate,
    ) -> String {
        format!(
            r#"{date}You are participating in a multi-model debate on the following question:

**Question:** {question}

Here are the initial responses from all participating models:

{responses_text}

Your task is to critically evaluate the OTHER models' responses (not your own). For each model except yourself, provide a thorough critique that:
- Identifies strengths and what they got right
- Points out weaknesses, errors, or gaps in reasoning
- Challenges any questionable assumptions
- Notes missing information or perspectives

Your own response is from **{participant}** - do NOT critique yourself.

Format your response as follows:

## Critique of [Model Name]
[Your critique]

## Critique of [Model Name]
[Your critique]

(Continue for each model except yourself)"#,
            date = Self::date_context(today),
            question = question,
            responses_text = responses_text,
            participant = participant,
        )
    }

    /// Defense round prompt
    pub fn defense(
        question: &str,
        original_response: &str,
        critiques_for_me: &str,
        today: NaiveDate,
    ) -> String {
        format!(
            r#"{date}You are participating in a multi-model debate on the following question:

**Question:** {question}

**Your original response:**
{original_response}

**Critiques of your response from other models:**
{critiques_for_me}

Your task is to:
1. Address the specific criticisms raised against your response
2. Defend points where you believe you were correct
3. Acknowledge valid criticisms and incorporate them
4. Provide a REVISED response that improves upon your original

Format your response as follows:

## Addressing Critiques
[Address each major criticism, explaining where you stand firm and where you concede]

## Revised Response
[Your updated, improved answer to the original question]"#,
            date = Self::date_context(today),
            question = question,
            original_response = original_response,
            critiques_for_me = critiques_for_me,
        )
    }

    /// Peer-ranking prompt over anonymized responses
    pub fn peer_rank(question: &str, labeled_responses: &[(Label, &str)]) -> String {
        let responses_text = labeled_responses
            .iter()
            .map(|(label, content)| format!("{}:\n{}", label.display_name(), content))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"You are evaluating different responses to the following question:

Question: {question}

Here are the responses from different models (anonymized):

{responses_text}

Your task:
1. First, evaluate each response individually. For each response, explain what it does well and what it does poorly.
2. Then, at the very end of your response, provide a final ranking.

IMPORTANT: Your final ranking MUST be formatted EXACTLY as follows:
- Start with the line "FINAL RANKING:" (all caps, with colon)
- Then list the responses from best to worst as a numbered list
- Each line should be: number, period, space, then ONLY the response label (e.g., "1. Response A")
- Do not add any other text or explanations in the ranking section

Example of the correct format for your ENTIRE response:

Response A provides good detail on X but misses Y...
Response B is accurate but lacks depth on Z...
Response C offers the most comprehensive answer...

FINAL RANKING:
1. Response C
2. Response A
3. Response B

Now provide your evaluation and ranking:"#,
            question = question,
            responses_text = responses_text,
        )
    }

    /// Render a well-formed `FINAL RANKING:` block for the given order
    pub fn render_final_ranking(order: &[Label]) -> String {
        let mut block = String::from("FINAL RANKING:\n");
        for (i, label) in order.iter().enumerate() {
            block.push_str(&format!("{}. {}\n", i + 1, label.display_name()));
        }
        block
    }

    /// Format a full debate transcript for the synthesizer
    pub fn debate_transcript(rounds: &[RoundRecord]) -> String {
        let mut parts: Vec<String> = Vec::new();

        for round in rounds {
            parts.push(format!("\n{}", "=".repeat(60)));
            parts.push(format!(
                "ROUND {}: {}",
                round.round_number,
                round.round_type.label().to_uppercase()
            ));
            parts.push("=".repeat(60));
            for response in &round.responses {
                parts.push(format!("\n**{}:**\n{}", response.model, response.content));
            }
        }

        parts.join("\n")
    }

    /// Reflection context for debate mode: the question plus the transcript
    pub fn debate_context(question: &str, rounds: &[RoundRecord]) -> String {
        format!(
            r#"Original Question: {question}

The debate consisted of {num_rounds} rounds:
1. **Initial Responses**: Each model provided their initial answer
2. **Critiques**: Each model critically evaluated the other models' responses
3. **Defense/Revision**: Each model addressed critiques and revised their answer

DEBATE TRANSCRIPT:
{transcript}"#,
            question = question,
            num_rounds = rounds.len(),
            transcript = Self::debate_transcript(rounds),
        )
    }

    /// Reflection context for ranking mode: stage-1 responses and stage-2
    /// evaluations
    pub fn ranking_context(
        question: &str,
        stage1: &[ModelResponse],
        stage2: &[(ParticipantId, String)],
    ) -> String {
        let stage1_text = stage1
            .iter()
            .map(|r| format!("Model: {}\nResponse: {}", r.model, r.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let stage2_text = stage2
            .iter()
            .map(|(model, ranking)| format!("Model: {model}\nRanking: {ranking}"))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"Original Question: {question}

STAGE 1 - Individual Responses:
{stage1_text}

STAGE 2 - Peer Rankings:
{stage2_text}"#,
            question = question,
            stage1_text = stage1_text,
            stage2_text = stage2_text,
        )
    }

    /// Reflection prompt for the chairman
    ///
    /// The chairman analyses the council output deeply, then writes the final
    /// answer under a `## Synthesis` header. No tools are offered — the focus
    /// is reasoning about existing content, not fetching new information.
    pub fn reflection(context: &str, today: NaiveDate) -> String {
        format!(
            r#"{date}You are the Chairman of an LLM Council. Your role is to deeply analyse the responses provided by the council models and produce a single, comprehensive, accurate final answer.

Before writing your final answer, reflect on the following:
1. **Areas of agreement** — Where do the models converge? Shared conclusions are likely reliable.
2. **Areas of disagreement** — Where do they diverge? Evaluate which side presents stronger evidence or reasoning.
3. **Factual claims that warrant scrutiny** — Note any claims that seem uncertain, contradictory, or surprising.
4. **Quality differences** — Which responses are most thorough, well-reasoned, and supported?

After your analysis, provide your final answer under a `## Synthesis` header.

{context}

Begin your analysis:"#,
            date = Self::date_context(today),
            context = context,
        )
    }

    /// Wrap a phase prompt in the ReAct protocol for a council member
    pub fn react_wrap(prompt: &str, today: NaiveDate) -> String {
        format!(
            r#"{date}You are a council member using ReAct (Reasoning + Acting) to answer a question.

You have access to the following tool:
- search_web(query): Search the web to verify facts or get current information

When you have enough information, call respond() and write your final answer.

IMPORTANT FORMAT - You MUST respond in this exact format:

Thought: <your reasoning about what you know and what you need>
Action: <either search_web("query") or respond()>

If you call search_web, you will receive an Observation with the results, then continue reasoning.
If you call respond(), write your final comprehensive answer after it.

Maximum 3 reasoning steps allowed. If unsure, respond with available information.

{prompt}

Begin your reasoning:"#,
            date = Self::date_context(today),
            prompt = prompt,
        )
    }
}
