// Moderation: turning an analysis into actions.
//
// `policy` decides, `actions` carries the decision out through a
// `PlatformGateway`, `incident` builds the record the store persists, and
// `metrics` counts what happened.

pub mod actions;
pub mod incident;
pub mod metrics;
pub mod policy;

pub use actions::{ActionReport, ModeratorAlert, NoticeHandle, PlatformGateway};
pub use incident::{ChatMessage, IncidentRecord};
pub use metrics::{MetricsSnapshot, ModerationMetrics};
pub use policy::{decide, ModerationDecision, ModerationThresholds};
