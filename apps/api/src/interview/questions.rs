//! Question generation — builds the generation prompt, calls the model, and
//! validates the response into exactly six typed questions.
//!
//! This component never errors at its boundary: ANY failure (retry
//! exhaustion, HTTP error, missing credential, missing content, parse or
//! length validation failure) resolves to the fixed fallback set. Callers
//! treat fallback output identically to generated output except for a
//! user-visible notice, signalled by `used_fallback`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::interview::prompts::QUESTION_PROMPT_TEMPLATE;
use crate::llm_client::{strip_json_fences, GeminiClient, LlmError, RetryPolicy};

/// Every session has exactly this many questions. Completion in the state
/// machine is hardcoded against this constant, so the exactly-6 contract is
/// enforced here at the boundary rather than trusted from variable-length
/// model output.
pub const QUESTION_COUNT: usize = 6;

const GENERATION_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 10,
    base_delay_ms: 1000,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A single interview question. Immutable once generated for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub difficulty: Difficulty,
    /// Countdown seconds for this question, fixed per difficulty tier.
    pub time_limit: u32,
}

/// Positional difficulty/time-limit table. The model contributes question
/// texts only; tiers and timing always come from here.
const DIFFICULTY_PLAN: [(Difficulty, u32); QUESTION_COUNT] = [
    (Difficulty::Easy, 20),
    (Difficulty::Easy, 20),
    (Difficulty::Medium, 60),
    (Difficulty::Medium, 60),
    (Difficulty::Hard, 120),
    (Difficulty::Hard, 120),
];

const FALLBACK_TEXTS: [&str; QUESTION_COUNT] = [
    "(Fallback) What is the CSS Box Model?",
    "(Fallback) Explain `var`, `let`, and `const` in JavaScript.",
    "(Fallback) What are the main features of React Hooks?",
    "(Fallback) Describe the JavaScript Event Loop.",
    "(Fallback) What are the pros and cons of a microservices architecture?",
    "(Fallback) Explain how Server-Side Rendering (SSR) works in a web application.",
];

/// The fixed pre-authored question set used when generation fails.
pub fn fallback_questions() -> [Question; QUESTION_COUNT] {
    std::array::from_fn(|i| Question {
        text: FALLBACK_TEXTS[i].to_string(),
        difficulty: DIFFICULTY_PLAN[i].0,
        time_limit: DIFFICULTY_PLAN[i].1,
    })
}

/// Result of a generation attempt. `used_fallback` is a side channel for the
/// user-visible notice, not an error signal.
#[derive(Debug, Clone)]
pub struct GeneratedQuestions {
    pub questions: [Question; QUESTION_COUNT],
    pub used_fallback: bool,
}

#[derive(Debug, Error)]
enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("could not parse question payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected exactly {QUESTION_COUNT} questions, got {0}")]
    WrongCount(usize),
}

/// Extra fields in each item are ignored; only `text` is taken from the model.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    text: String,
}

/// Generates six role-tailored questions, falling back to the fixed set on
/// any failure. Always resolves.
pub async fn generate(llm: &GeminiClient, role: &str) -> GeneratedQuestions {
    match try_generate(llm, role).await {
        Ok(questions) => {
            info!("generated {QUESTION_COUNT} questions for role {role:?}");
            GeneratedQuestions {
                questions,
                used_fallback: false,
            }
        }
        Err(e) => {
            warn!("question generation failed ({e}); using fallback questions");
            GeneratedQuestions {
                questions: fallback_questions(),
                used_fallback: true,
            }
        }
    }
}

async fn try_generate(
    llm: &GeminiClient,
    role: &str,
) -> Result<[Question; QUESTION_COUNT], GenerationError> {
    let prompt = QUESTION_PROMPT_TEMPLATE.replace("{role}", role);
    let text = llm.call(&prompt, GENERATION_RETRY).await?;
    parse_questions(&text)
}

/// Parses the model payload into exactly six questions, pairing each text
/// positionally with the fixed difficulty/time-limit table.
fn parse_questions(text: &str) -> Result<[Question; QUESTION_COUNT], GenerationError> {
    let raw: Vec<RawQuestion> = serde_json::from_str(strip_json_fences(text))?;

    if raw.len() != QUESTION_COUNT {
        return Err(GenerationError::WrongCount(raw.len()));
    }

    let questions: Vec<Question> = raw
        .into_iter()
        .zip(DIFFICULTY_PLAN)
        .map(|(q, (difficulty, time_limit))| Question {
            text: q.text,
            difficulty,
            time_limit,
        })
        .collect();

    questions
        .try_into()
        .map_err(|v: Vec<Question>| GenerationError::WrongCount(v.len()))
}
