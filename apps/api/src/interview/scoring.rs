//! Transcript scoring — builds the scoring prompt from accumulated answers,
//! calls the model, and parses a score/summary/verdict.
//!
//! "Fallback-or-success, never fallback-or-error": the caller never observes
//! a failure from this component. A hard failure (retry exhaustion, missing
//! credential, empty transcript) waits a fixed simulated-processing delay and
//! resolves to the fixed dummy result; a soft failure (unparseable model
//! output) resolves to the same dummy result without the delay.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::interview::prompts::SCORING_PROMPT_TEMPLATE;
use crate::llm_client::{strip_json_fences, GeminiClient, RetryPolicy};

const SCORING_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    base_delay_ms: 1000,
};

/// Delay applied on the hard-failure path so the candidate-facing flow still
/// reads as "processing" rather than failing instantly.
const SIMULATED_PROCESSING_DELAY: Duration = Duration::from_millis(1500);

/// One question/answer pair of the transcript, in interview order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Hired,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// 0–100, validated on receipt.
    pub score: u8,
    pub summary: String,
    pub verdict: Verdict,
}

/// Scoring outcome with the fallback side channel.
#[derive(Debug, Clone)]
pub struct ScoringOutcome {
    pub result: ScoringResult,
    pub used_fallback: bool,
}

/// The fixed dummy result substituted on any scoring failure.
pub fn fallback_result() -> ScoringResult {
    ScoringResult {
        score: 82,
        summary: "(Fallback) The candidate demonstrated a solid understanding of fundamental \
                  concepts. Further probing on system design would be beneficial."
            .to_string(),
        verdict: Verdict::Hired,
    }
}

#[derive(Debug, Error)]
enum ScoringParseError {
    #[error("could not parse scoring payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("score {0} is outside 0-100")]
    ScoreOutOfRange(i64),
}

/// Wire shape requested from the model. `status` matches the candidate
/// status vocabulary, mapped to [`Verdict`] on receipt.
#[derive(Debug, Deserialize)]
struct RawScoring {
    score: i64,
    summary: String,
    status: Verdict,
}

/// Scores the transcript. Always resolves to a result.
pub async fn score(llm: &GeminiClient, role: &str, answers: &[AnswerRecord]) -> ScoringOutcome {
    if answers.is_empty() {
        warn!("scoring invoked with no recorded answers; using fallback result");
        tokio::time::sleep(SIMULATED_PROCESSING_DELAY).await;
        return ScoringOutcome {
            result: fallback_result(),
            used_fallback: true,
        };
    }

    let prompt = build_scoring_prompt(role, answers);

    match llm.call(&prompt, SCORING_RETRY).await {
        Ok(text) => match parse_scoring(&text) {
            Ok(result) => {
                info!(
                    "transcript scored: {}/100, verdict {:?}",
                    result.score, result.verdict
                );
                ScoringOutcome {
                    result,
                    used_fallback: false,
                }
            }
            Err(e) => {
                // Soft fallback: the call succeeded, only the payload is unusable
                warn!("scoring output unusable ({e}); using fallback result");
                ScoringOutcome {
                    result: fallback_result(),
                    used_fallback: true,
                }
            }
        },
        Err(e) => {
            warn!("scoring call failed ({e}); using fallback result");
            tokio::time::sleep(SIMULATED_PROCESSING_DELAY).await;
            ScoringOutcome {
                result: fallback_result(),
                used_fallback: true,
            }
        }
    }
}

fn build_scoring_prompt(role: &str, answers: &[AnswerRecord]) -> String {
    let transcript = answers
        .iter()
        .map(|a| format!("Q: {}\nA: {}", a.question, a.answer))
        .collect::<Vec<_>>()
        .join("\n\n");

    SCORING_PROMPT_TEMPLATE
        .replace("{role}", role)
        .replace("{transcript}", &transcript)
}

fn parse_scoring(text: &str) -> Result<ScoringResult, ScoringParseError> {
    let raw: RawScoring = serde_json::from_str(strip_json_fences(text))?;

    if !(0..=100).contains(&raw.score) {
        return Err(ScoringParseError::ScoreOutOfRange(raw.score));
    }

    Ok(ScoringResult {
        score: raw.score as u8,
        summary: raw.summary,
        verdict: raw.status,
    })
}
