//! Async driver for the session engine.
//!
//! The engine itself is synchronous; this module supplies its single tick
//! source (a one-second interval) and executes the [`SessionCommand`]s its
//! transitions return. Each command runs on its own task, so a slow
//! generation or scoring call only blocks the workflow stage awaiting it.
//! Stale completions are recognized and discarded inside the engine via the
//! epoch tag carried on each command.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::error;

use crate::candidates::repo;
use crate::interview::session::SessionCommand;
use crate::interview::{questions, scoring};
use crate::state::AppState;

/// Spawns the countdown loop driving `SessionEngine::tick` once per second.
pub fn spawn_tick_loop(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let commands = state.engine.write().await.tick();
            execute(&state, commands);
        }
    });
}

/// Executes transition side effects. Follow-up commands produced while
/// applying a completion (e.g. persistence after scoring) are fed back in.
pub fn execute(state: &AppState, commands: Vec<SessionCommand>) {
    for command in commands {
        let state = state.clone();
        tokio::spawn(async move {
            match command {
                SessionCommand::GenerateQuestions { role, epoch } => {
                    let generated = questions::generate(&state.llm, &role).await;
                    state
                        .engine
                        .write()
                        .await
                        .questions_resolved(epoch, generated);
                }
                SessionCommand::ScoreTranscript { answers, epoch } => {
                    let role = state.engine.read().await.role().to_string();
                    let outcome = scoring::score(&state.llm, &role, &answers).await;
                    let follow_up = state.engine.write().await.scoring_resolved(epoch, outcome);
                    execute(&state, follow_up);
                }
                SessionCommand::RevealNextQuestion { delay_ms } => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    state.engine.write().await.advance_question();
                }
                SessionCommand::PersistCandidate(snapshot) => {
                    match repo::save_interview(&state.db, &snapshot).await {
                        Ok(id) => tracing::info!("interview record saved as {id}"),
                        Err(e) => error!("failed to persist interview record: {e}"),
                    }
                }
            }
        });
    }
}
