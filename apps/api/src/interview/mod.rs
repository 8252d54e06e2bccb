//! The interview session core: state machine, countdown timer, question
//! generation, transcript scoring, and the async runtime driving them.

pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod timer;
