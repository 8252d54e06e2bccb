//! Completed-interview records and the admin-facing interviewer view.

pub mod handlers;
pub mod models;
pub mod repo;
