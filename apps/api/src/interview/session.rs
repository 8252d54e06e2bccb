//! Interview session state machine.
//!
//! Owns the session's phase, candidate binding, question list, answer log,
//! and readiness gate, and exposes the transition operations the HTTP surface
//! and timer drive. Transitions mutate the engine and return
//! [`SessionCommand`] effect descriptions; the async runtime executes them.
//! Generation and scoring completions are tagged with the session `epoch`
//! they were issued under, so late resolutions of stale requests are
//! discarded after a reset or rebinding.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::interview::questions::{GeneratedQuestions, Question, QUESTION_COUNT};
use crate::interview::scoring::{AnswerRecord, ScoringOutcome, Verdict};
use crate::interview::timer::QuestionTimer;

/// Answer text synthesized when a question's countdown expires.
pub const TIMEOUT_ANSWER: &str = "No answer provided (time ran out).";

const NAME_PROMPT: &str =
    "Hello! I couldn't find a name on your resume. What is your full name?";
const PHONE_PROMPT: &str = "Great. And finally, what is your phone number?";
const BEGIN_MESSAGE: &str = "Perfect, thank you! Let's begin the interview.";
const GENERATION_PLACEHOLDER: &str = "Generating interview questions, please wait...";
const FALLBACK_NOTICE: &str =
    "Had some issues generating questions, using default ones. Let's start:";
const PROCESSING_MESSAGE: &str = "Thank you! I am now processing your results...";

/// Reveal delays after an answer is recorded: manual submissions reveal the
/// next question slightly faster than timer expiries.
const MANUAL_REVEAL_DELAY_MS: u64 = 100;
const EXPIRY_REVEAL_DELAY_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    NotStarted,
    CollectingInfo,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Bot,
    User,
}

/// One chat line. The history is append-only and insertion order is
/// significant; the sole exception is the documented replacement of the
/// generation placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    Interviewed,
    Hired,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Interviewed => "Interviewed",
            CandidateStatus::Hired => "Hired",
            CandidateStatus::Rejected => "Rejected",
        }
    }
}

impl From<Verdict> for CandidateStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Hired => CandidateStatus::Hired,
            Verdict::Rejected => CandidateStatus::Rejected,
        }
    }
}

/// Contact fields gathered from the resume (any may be missing) and then
/// completed conversationally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CandidateDetails {
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.email.is_some() && self.phone.is_some()
    }
}

/// The candidate bound to the live session. Durable storage happens only at
/// scoring completion, through the persistence command.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub score: Option<u8>,
    pub summary: Option<String>,
    pub status: CandidateStatus,
    pub chat_history: Vec<ChatMessage>,
}

impl Candidate {
    fn new(details: CandidateDetails) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: details.name,
            email: details.email,
            phone: details.phone,
            score: None,
            summary: None,
            status: CandidateStatus::Interviewed,
            chat_history: Vec::new(),
        }
    }
}

/// Ephemeral per-session state. References the bound candidate by id only.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewSession {
    pub phase: Phase,
    pub candidate_id: Option<Uuid>,
    /// Empty before generation resolves, exactly six afterwards.
    pub questions: Vec<Question>,
    /// 0–6; equal to `answers.len()` after every submission. 6 signals all
    /// questions answered.
    pub current_question_index: usize,
    pub answers: Vec<AnswerRecord>,
    pub questions_ready: bool,
    /// Monotone tag for in-flight async work; bumped on start and reset so
    /// stale completions can be recognized and dropped.
    #[serde(skip)]
    pub epoch: u64,
}

impl InterviewSession {
    fn initial(epoch: u64) -> Self {
        Self {
            phase: Phase::NotStarted,
            candidate_id: None,
            questions: Vec::new(),
            current_question_index: 0,
            answers: Vec::new(),
            questions_ready: false,
            epoch,
        }
    }
}

/// Snapshot handed to the persistence layer when an interview completes.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSnapshot {
    pub candidate: Candidate,
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerRecord>,
}

/// Side effects requested by a transition, executed by the runtime driver.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    GenerateQuestions { role: String, epoch: u64 },
    ScoreTranscript { answers: Vec<AnswerRecord>, epoch: u64 },
    RevealNextQuestion { delay_ms: u64 },
    PersistCandidate(Box<CandidateSnapshot>),
}

/// Read model for the session endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub role: String,
    pub candidate: Option<Candidate>,
    pub current_question_index: usize,
    pub question_count: usize,
    pub questions_ready: bool,
    /// `None` whenever the countdown is frozen (phase not in-progress or
    /// questions not ready).
    pub seconds_left: Option<u32>,
}

/// The one live interview session and its transition operations.
pub struct SessionEngine {
    session: InterviewSession,
    candidate: Option<Candidate>,
    timer: QuestionTimer,
    role: String,
}

impl SessionEngine {
    pub fn new(role: String) -> Self {
        Self {
            session: InterviewSession::initial(0),
            candidate: None,
            timer: QuestionTimer::new(),
            role,
        }
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn set_role(&mut self, role: String) {
        info!("interview role set to {role:?}");
        self.role = role;
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.session.phase,
            role: self.role.clone(),
            candidate: self.candidate.clone(),
            current_question_index: self.session.current_question_index,
            question_count: self.session.questions.len(),
            questions_ready: self.session.questions_ready,
            seconds_left: self.seconds_left(),
        }
    }

    pub fn seconds_left(&self) -> Option<u32> {
        if self.session.phase == Phase::InProgress && self.session.questions_ready {
            self.timer.seconds_left(self.session.current_question_index)
        } else {
            None
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Transitions
    // ────────────────────────────────────────────────────────────────────

    /// not-started → collecting-info. Creates and binds a fresh candidate,
    /// clears session fields, and runs the first collection step. Starting
    /// over an abandoned session discards its in-flight work via the epoch.
    pub fn start_session(&mut self, details: CandidateDetails) -> Vec<SessionCommand> {
        let epoch = self.session.epoch + 1;
        let candidate = Candidate::new(details);

        info!("starting interview session for candidate {}", candidate.id);
        self.session = InterviewSession {
            phase: Phase::CollectingInfo,
            candidate_id: Some(candidate.id),
            ..InterviewSession::initial(epoch)
        };
        self.candidate = Some(candidate);
        self.timer.disarm();

        self.advance_collection()
    }

    /// Routes a candidate chat message according to phase. Input outside an
    /// active interview is dropped (the UI disables it; this is the guard).
    pub fn handle_user_message(&mut self, text: &str) -> Vec<SessionCommand> {
        match self.session.phase {
            Phase::CollectingInfo => {
                self.push_user(text);
                let Some(candidate) = self.candidate.as_mut() else {
                    return Vec::new();
                };
                if candidate.name.is_none() {
                    candidate.name = Some(text.to_string());
                } else if candidate.email.is_none() {
                    candidate.email = Some(text.to_string());
                } else if candidate.phone.is_none() {
                    candidate.phone = Some(text.to_string());
                } else {
                    // All fields collected; generation is pending
                    return Vec::new();
                }
                self.advance_collection()
            }
            Phase::InProgress if self.session.questions_ready => {
                self.push_user(text);
                let index = self.session.current_question_index;
                let Some(question) = self.session.questions.get(index).cloned() else {
                    return Vec::new();
                };
                let mut commands = self.submit_answer(index, question.text, text.to_string());
                if self.session.phase == Phase::InProgress {
                    commands.push(SessionCommand::RevealNextQuestion {
                        delay_ms: MANUAL_REVEAL_DELAY_MS,
                    });
                }
                commands
            }
            _ => Vec::new(),
        }
    }

    /// Records the answer for question `index`. Idempotent with respect to
    /// index advancement: a submission for any index other than the current
    /// one is a no-op, which de-duplicates a manual answer racing timer
    /// expiry. At the sixth answer the session transitions to completed and
    /// scoring is requested.
    pub fn submit_answer(
        &mut self,
        index: usize,
        question: String,
        answer: String,
    ) -> Vec<SessionCommand> {
        if self.session.phase != Phase::InProgress || !self.session.questions_ready {
            return Vec::new();
        }
        if index != self.session.current_question_index {
            debug!("dropping duplicate submission for question {index}");
            return Vec::new();
        }

        self.session.answers.push(AnswerRecord { question, answer });
        self.session.current_question_index += 1;
        debug_assert_eq!(
            self.session.answers.len(),
            self.session.current_question_index
        );

        if self.session.current_question_index == QUESTION_COUNT {
            info!("all {QUESTION_COUNT} answers recorded; interview completed");
            self.session.phase = Phase::Completed;
            self.push_bot(PROCESSING_MESSAGE);
            return vec![SessionCommand::ScoreTranscript {
                answers: self.session.answers.clone(),
                epoch: self.session.epoch,
            }];
        }

        Vec::new()
    }

    /// Appends the current question's text to the chat log. Called after the
    /// post-answer reveal delay.
    pub fn advance_question(&mut self) {
        if self.session.phase != Phase::InProgress || !self.session.questions_ready {
            return;
        }
        let index = self.session.current_question_index;
        if let Some(question) = self.session.questions.get(index) {
            let text = question.text.clone();
            self.push_bot(text);
        }
    }

    /// Applies a resolved generation: replaces the loading placeholder with
    /// the first question (plus a notice when the fallback set was used),
    /// installs the questions, opens the readiness gate, and enters
    /// in-progress. Stale or out-of-phase resolutions are discarded.
    pub fn questions_resolved(&mut self, epoch: u64, generated: GeneratedQuestions) {
        if epoch != self.session.epoch {
            warn!("discarding stale question generation (epoch {epoch})");
            return;
        }
        if self.session.phase != Phase::CollectingInfo {
            return;
        }

        if let Some(candidate) = self.candidate.as_mut() {
            // The documented placeholder replacement. A user message may have
            // landed after the placeholder, so remove it by value rather than
            // popping the tail.
            if let Some(pos) = candidate
                .chat_history
                .iter()
                .rposition(|m| m.speaker == Speaker::Bot && m.text == GENERATION_PLACEHOLDER)
            {
                candidate.chat_history.remove(pos);
            }
        }
        if generated.used_fallback {
            self.push_bot(FALLBACK_NOTICE);
        }
        self.push_bot(generated.questions[0].text.clone());

        self.session.questions = generated.questions.to_vec();
        self.session.questions_ready = true;
        self.session.phase = Phase::InProgress;
    }

    /// Applies a resolved scoring: writes score/summary/verdict onto the
    /// bound candidate, requests persistence, and resets the session to
    /// initial. Stale resolutions are discarded.
    pub fn scoring_resolved(&mut self, epoch: u64, outcome: ScoringOutcome) -> Vec<SessionCommand> {
        if epoch != self.session.epoch {
            warn!("discarding stale scoring result (epoch {epoch})");
            return Vec::new();
        }
        if self.session.phase != Phase::Completed {
            return Vec::new();
        }
        let Some(candidate) = self.candidate.as_mut() else {
            return Vec::new();
        };

        candidate.score = Some(outcome.result.score);
        candidate.summary = Some(outcome.result.summary.clone());
        candidate.status = outcome.result.verdict.into();

        let snapshot = CandidateSnapshot {
            candidate: candidate.clone(),
            questions: self.session.questions.clone(),
            answers: self.session.answers.clone(),
        };

        self.reset_session();
        vec![SessionCommand::PersistCandidate(Box::new(snapshot))]
    }

    /// Explicit discard: tears down the timer and invalidates in-flight work.
    pub fn reset(&mut self) {
        info!("interview session reset");
        self.reset_session();
    }

    fn reset_session(&mut self) {
        self.session = InterviewSession::initial(self.session.epoch + 1);
        self.candidate = None;
        self.timer.disarm();
    }

    /// One-second tick from the runtime. Drives the countdown for the active
    /// question; on expiry, synthesizes a timeout answer and requests the
    /// next-question reveal.
    pub fn tick(&mut self) -> Vec<SessionCommand> {
        if self.session.phase != Phase::InProgress || !self.session.questions_ready {
            self.timer.disarm();
            return Vec::new();
        }

        let index = self.session.current_question_index;
        let Some(question) = self.session.questions.get(index).cloned() else {
            return Vec::new();
        };

        self.timer.sync(index, question.time_limit);
        if !self.timer.tick() {
            return Vec::new();
        }

        debug!("time expired for question {index}");
        let mut commands = self.submit_answer(index, question.text, TIMEOUT_ANSWER.to_string());
        if self.session.phase == Phase::InProgress {
            commands.push(SessionCommand::RevealNextQuestion {
                delay_ms: EXPIRY_REVEAL_DELAY_MS,
            });
        }
        commands
    }

    // ────────────────────────────────────────────────────────────────────
    // Collection dialogue
    // ────────────────────────────────────────────────────────────────────

    /// Prompts for the first missing contact field, or begins generation
    /// once all three are present.
    fn advance_collection(&mut self) -> Vec<SessionCommand> {
        let Some(candidate) = self.candidate.as_ref() else {
            return Vec::new();
        };

        if candidate.name.is_none() {
            self.push_bot(NAME_PROMPT);
            Vec::new()
        } else if candidate.email.is_none() {
            let name = candidate.name.clone().unwrap_or_default();
            self.push_bot(format!("Thanks, {name}. What is your email address?"));
            Vec::new()
        } else if candidate.phone.is_none() {
            self.push_bot(PHONE_PROMPT);
            Vec::new()
        } else {
            self.begin_generation()
        }
    }

    fn begin_generation(&mut self) -> Vec<SessionCommand> {
        self.push_bot(BEGIN_MESSAGE);
        self.push_bot(GENERATION_PLACEHOLDER);
        self.session.questions_ready = false;
        vec![SessionCommand::GenerateQuestions {
            role: self.role.clone(),
            epoch: self.session.epoch,
        }]
    }

    fn push_bot(&mut self, text: impl Into<String>) {
        if let Some(candidate) = self.candidate.as_mut() {
            candidate.chat_history.push(ChatMessage {
                speaker: Speaker::Bot,
                text: text.into(),
            });
        }
    }

    fn push_user(&mut self, text: &str) {
        if let Some(candidate) = self.candidate.as_mut() {
            candidate.chat_history.push(ChatMessage {
                speaker: Speaker::User,
                text: text.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::questions::fallback_questions;
    use crate::interview::scoring::{fallback_result, ScoringResult};

    const ROLE: &str = "Full Stack (React/Node) Developer";

    fn jane() -> CandidateDetails {
        CandidateDetails {
            name: Some("Jane Doe".to_string()),
            email: Some("jane@x.com".to_string()),
            phone: Some("555-1234".to_string()),
        }
    }

    fn fallback_generation() -> GeneratedQuestions {
        GeneratedQuestions {
            questions: fallback_questions(),
            used_fallback: true,
        }
    }

    fn chat(engine: &SessionEngine) -> Vec<String> {
        engine
            .candidate()
            .map(|c| c.chat_history.iter().map(|m| m.text.clone()).collect())
            .unwrap_or_default()
    }

    /// Drives a fresh engine to in-progress with the fallback question set.
    fn in_progress_engine() -> SessionEngine {
        let mut engine = SessionEngine::new(ROLE.to_string());
        let commands = engine.start_session(jane());
        let epoch = match &commands[0] {
            SessionCommand::GenerateQuestions { epoch, .. } => *epoch,
            other => panic!("expected GenerateQuestions, got {other:?}"),
        };
        engine.questions_resolved(epoch, fallback_generation());
        engine
    }

    #[test]
    fn test_start_with_complete_fields_requests_generation() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        let commands = engine.start_session(jane());

        assert_eq!(engine.session().phase, Phase::CollectingInfo);
        let candidate = engine.candidate().unwrap();
        assert_eq!(candidate.name.as_deref(), Some("Jane Doe"));
        assert_eq!(candidate.email.as_deref(), Some("jane@x.com"));
        assert_eq!(candidate.phone.as_deref(), Some("555-1234"));

        assert_eq!(commands.len(), 1);
        match &commands[0] {
            SessionCommand::GenerateQuestions { role, .. } => assert_eq!(role, ROLE),
            other => panic!("expected GenerateQuestions, got {other:?}"),
        }
        assert!(!engine.session().questions_ready);
        assert_eq!(
            chat(&engine),
            vec![BEGIN_MESSAGE.to_string(), GENERATION_PLACEHOLDER.to_string()]
        );
    }

    #[test]
    fn test_collection_dialogue_fills_fields_in_order() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        let commands = engine.start_session(CandidateDetails::default());
        assert!(commands.is_empty());
        assert_eq!(chat(&engine), vec![NAME_PROMPT.to_string()]);

        assert!(engine.handle_user_message("Jane Doe").is_empty());
        assert_eq!(
            engine.candidate().unwrap().name.as_deref(),
            Some("Jane Doe")
        );
        assert!(chat(&engine)
            .last()
            .unwrap()
            .contains("Thanks, Jane Doe. What is your email address?"));

        assert!(engine.handle_user_message("jane@x.com").is_empty());
        assert_eq!(chat(&engine).last().unwrap(), PHONE_PROMPT);

        let commands = engine.handle_user_message("555-1234");
        assert!(matches!(
            commands[0],
            SessionCommand::GenerateQuestions { .. }
        ));
    }

    #[test]
    fn test_fallback_resolution_replaces_placeholder_and_enters_in_progress() {
        let engine = in_progress_engine();

        assert_eq!(engine.session().phase, Phase::InProgress);
        assert!(engine.session().questions_ready);
        assert_eq!(engine.session().questions, fallback_questions().to_vec());
        let limits: Vec<u32> = engine
            .session()
            .questions
            .iter()
            .map(|q| q.time_limit)
            .collect();
        assert_eq!(limits, vec![20, 20, 60, 60, 120, 120]);

        // Placeholder replaced by notice + first question
        let history = chat(&engine);
        assert_eq!(
            history,
            vec![
                BEGIN_MESSAGE.to_string(),
                FALLBACK_NOTICE.to_string(),
                fallback_questions()[0].text.clone(),
            ]
        );
    }

    #[test]
    fn test_successful_resolution_has_no_fallback_notice() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        let commands = engine.start_session(jane());
        let epoch = match &commands[0] {
            SessionCommand::GenerateQuestions { epoch, .. } => *epoch,
            _ => unreachable!(),
        };
        engine.questions_resolved(
            epoch,
            GeneratedQuestions {
                questions: fallback_questions(),
                used_fallback: false,
            },
        );

        let history = chat(&engine);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], fallback_questions()[0].text);
    }

    #[test]
    fn test_message_racing_generation_resolution_keeps_user_text() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        let commands = engine.start_session(jane());
        let epoch = match &commands[0] {
            SessionCommand::GenerateQuestions { epoch, .. } => *epoch,
            _ => unreachable!(),
        };

        // A chat message lands while generation is still pending
        engine.handle_user_message("still there?");
        engine.questions_resolved(epoch, fallback_generation());

        let history = chat(&engine);
        assert_eq!(
            history,
            vec![
                BEGIN_MESSAGE.to_string(),
                "still there?".to_string(),
                FALLBACK_NOTICE.to_string(),
                fallback_questions()[0].text.clone(),
            ]
        );
        assert!(!history.iter().any(|m| m == GENERATION_PLACEHOLDER));
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        let commands = engine.start_session(jane());
        let stale_epoch = match &commands[0] {
            SessionCommand::GenerateQuestions { epoch, .. } => *epoch,
            _ => unreachable!(),
        };

        engine.reset();
        engine.questions_resolved(stale_epoch, fallback_generation());

        assert_eq!(engine.session().phase, Phase::NotStarted);
        assert!(!engine.session().questions_ready);
        assert!(engine.session().questions.is_empty());
    }

    #[test]
    fn test_answer_log_matches_index_after_every_submission() {
        let mut engine = in_progress_engine();

        for i in 0..QUESTION_COUNT {
            let question = engine.session().questions[i].text.clone();
            engine.submit_answer(i, question, format!("answer {i}"));
            assert_eq!(
                engine.session().answers.len(),
                engine.session().current_question_index
            );
        }
        assert_eq!(engine.session().phase, Phase::Completed);
        assert_eq!(engine.session().current_question_index, QUESTION_COUNT);
    }

    #[test]
    fn test_duplicate_submission_is_a_noop() {
        let mut engine = in_progress_engine();
        let question = engine.session().questions[0].text.clone();

        engine.submit_answer(0, question.clone(), "first".to_string());
        engine.submit_answer(0, question, "second".to_string());

        assert_eq!(engine.session().answers.len(), 1);
        assert_eq!(engine.session().current_question_index, 1);
        assert_eq!(engine.session().answers[0].answer, "first");
    }

    #[test]
    fn test_questions_len_is_zero_or_six() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        assert!(engine.session().questions.is_empty());

        let commands = engine.start_session(jane());
        assert!(engine.session().questions.is_empty());

        let epoch = match &commands[0] {
            SessionCommand::GenerateQuestions { epoch, .. } => *epoch,
            _ => unreachable!(),
        };
        engine.questions_resolved(epoch, fallback_generation());
        assert_eq!(engine.session().questions.len(), QUESTION_COUNT);
    }

    #[test]
    fn test_sixth_answer_completes_and_requests_scoring() {
        let mut engine = in_progress_engine();

        let mut commands = Vec::new();
        for i in 0..QUESTION_COUNT {
            let question = engine.session().questions[i].text.clone();
            commands = engine.submit_answer(i, question, "an answer".to_string());
        }

        assert_eq!(engine.session().phase, Phase::Completed);
        match &commands[0] {
            SessionCommand::ScoreTranscript { answers, .. } => {
                assert_eq!(answers.len(), QUESTION_COUNT)
            }
            other => panic!("expected ScoreTranscript, got {other:?}"),
        }
        assert_eq!(chat(&engine).last().unwrap(), PROCESSING_MESSAGE);
    }

    #[test]
    fn test_scoring_resolution_writes_candidate_and_resets() {
        let mut engine = in_progress_engine();
        for i in 0..QUESTION_COUNT {
            let question = engine.session().questions[i].text.clone();
            engine.submit_answer(i, question, "an answer".to_string());
        }
        let epoch = engine.session().epoch;

        let commands = engine.scoring_resolved(
            epoch,
            ScoringOutcome {
                result: fallback_result(),
                used_fallback: true,
            },
        );

        match &commands[0] {
            SessionCommand::PersistCandidate(snapshot) => {
                assert_eq!(snapshot.candidate.score, Some(82));
                assert_eq!(snapshot.candidate.status, CandidateStatus::Hired);
                assert_eq!(snapshot.answers.len(), QUESTION_COUNT);
                assert_eq!(snapshot.questions.len(), QUESTION_COUNT);
            }
            other => panic!("expected PersistCandidate, got {other:?}"),
        }

        // Session reset to initial
        assert_eq!(engine.session().phase, Phase::NotStarted);
        assert!(engine.session().answers.is_empty());
        assert!(engine.session().questions.is_empty());
        assert!(engine.candidate().is_none());
    }

    #[test]
    fn test_stale_scoring_is_discarded() {
        let mut engine = in_progress_engine();
        for i in 0..QUESTION_COUNT {
            let question = engine.session().questions[i].text.clone();
            engine.submit_answer(i, question, "an answer".to_string());
        }
        let stale_epoch = engine.session().epoch;
        engine.reset();

        let commands = engine.scoring_resolved(
            stale_epoch,
            ScoringOutcome {
                result: fallback_result(),
                used_fallback: true,
            },
        );
        assert!(commands.is_empty());
        assert_eq!(engine.session().phase, Phase::NotStarted);
    }

    #[test]
    fn test_timer_expiry_records_timeout_answer_exactly_once() {
        let mut engine = in_progress_engine();
        let first_question = engine.session().questions[0].text.clone();

        // time_limit of the first (Easy) question is 20
        for _ in 0..19 {
            assert!(engine.tick().is_empty());
        }
        let commands = engine.tick();

        assert_eq!(engine.session().answers.len(), 1);
        assert_eq!(engine.session().answers[0].question, first_question);
        assert_eq!(engine.session().answers[0].answer, TIMEOUT_ANSWER);
        assert_eq!(engine.session().current_question_index, 1);
        assert!(matches!(
            commands[0],
            SessionCommand::RevealNextQuestion { delay_ms: 200 }
        ));

        // The next tick arms question 1 afresh; no double submission
        assert!(engine.tick().is_empty());
        assert_eq!(engine.session().answers.len(), 1);
        assert_eq!(engine.seconds_left(), Some(19));
    }

    #[test]
    fn test_seconds_left_hidden_between_expiry_and_rearm() {
        let mut engine = in_progress_engine();

        // Expire question 0; the index advances but the timer stays armed
        // for question 0 until the next tick re-arms it
        for _ in 0..20 {
            engine.tick();
        }
        assert_eq!(engine.session().current_question_index, 1);
        assert_eq!(engine.seconds_left(), None);

        engine.tick();
        assert_eq!(engine.seconds_left(), Some(19));
    }

    #[test]
    fn test_manual_answer_racing_expiry_advances_once() {
        let mut engine = in_progress_engine();
        let question = engine.session().questions[0].text.clone();

        // Expire the timer for question 0
        for _ in 0..20 {
            engine.tick();
        }
        // Late manual submission for the same question must be a no-op
        engine.submit_answer(0, question, "late manual answer".to_string());

        assert_eq!(engine.session().answers.len(), 1);
        assert_eq!(engine.session().answers[0].answer, TIMEOUT_ANSWER);
        assert_eq!(engine.session().current_question_index, 1);
    }

    #[test]
    fn test_timer_frozen_outside_in_progress() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        assert!(engine.tick().is_empty());
        assert_eq!(engine.seconds_left(), None);

        engine.start_session(jane());
        // Generation pending: still frozen
        assert!(engine.tick().is_empty());
        assert_eq!(engine.seconds_left(), None);
    }

    #[test]
    fn test_user_answer_submits_and_schedules_reveal() {
        let mut engine = in_progress_engine();
        let commands = engine.handle_user_message("The box model wraps every element.");

        assert_eq!(engine.session().answers.len(), 1);
        assert_eq!(
            engine.session().answers[0].answer,
            "The box model wraps every element."
        );
        assert!(matches!(
            commands[0],
            SessionCommand::RevealNextQuestion { delay_ms: 100 }
        ));

        engine.advance_question();
        assert_eq!(
            chat(&engine).last().unwrap(),
            &engine.session().questions[1].text
        );
    }

    #[test]
    fn test_message_outside_active_interview_is_dropped() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        assert!(engine.handle_user_message("hello?").is_empty());
        assert!(engine.candidate().is_none());
    }

    #[test]
    fn test_message_during_pending_generation_only_logs_chat() {
        let mut engine = SessionEngine::new(ROLE.to_string());
        engine.start_session(jane());

        let commands = engine.handle_user_message("still there?");
        assert!(commands.is_empty());
        assert_eq!(chat(&engine).last().unwrap(), "still there?");
        assert!(engine.session().answers.is_empty());
    }

    #[test]
    fn test_chat_history_is_append_only_through_full_flow() {
        let mut engine = in_progress_engine();
        let before = chat(&engine);

        engine.handle_user_message("answer one");
        engine.advance_question();
        let after = chat(&engine);

        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after.len(), before.len() + 2);
    }
}
