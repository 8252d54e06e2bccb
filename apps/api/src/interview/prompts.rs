// All LLM prompt constants for the interview module.

/// Question generation prompt template. Replace `{role}` before sending.
///
/// Difficulty and timing are NEVER taken from the model output — only the
/// question texts. The 2/2/2 split here is informational for the model; the
/// caller pairs difficulties positionally from its own fixed table.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Generate exactly 6 unique interview questions for a "{role}" role.
- Questions 1-2: Easy
- Questions 3-4: Medium
- Questions 5-6: Hard
Return ONLY a valid JSON array with this exact format:
[
  {"text": "Question 1 here"},
  {"text": "Question 2 here"},
  {"text": "Question 3 here"},
  {"text": "Question 4 here"},
  {"text": "Question 5 here"},
  {"text": "Question 6 here"}
]"#;

/// Transcript scoring prompt template.
/// Replace `{role}` and `{transcript}` before sending.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"Evaluate this interview transcript for a "{role}" role. Transcript: --- {transcript} --- Respond with ONLY a valid JSON object: {"score": <0-100>, "summary": "<2-3 sentence summary>", "status": <"Hired" or "Rejected">}."#;
