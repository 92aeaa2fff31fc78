// Pipelines: the moderation loop for single messages and concurrent batches.

pub mod batch;
pub mod message;

pub use message::{MessageOutcome, ModerationOutcome, Moderator, SkipReason};
