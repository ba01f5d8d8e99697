//! The worker set that drives the activity state machine. Each worker is an
//! independent `tokio` task with its own periodic tick; workers never talk
//! to each other directly, only through state transitions persisted in the
//! store (§5).

pub mod cleanup;
mod reply;
pub mod requeue;
pub mod retry_reply;
pub mod send;
