// Moderation policy: maps severity and threat to actions.
//
// A pure function of the analysis outcome and the configured thresholds.
// Counters and side effects belong to the caller.

use serde::{Deserialize, Serialize};

use crate::scoring::Severity;

/// Configured action thresholds. Built once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationThresholds {
    pub min_severity_to_save: Severity,
    pub min_severity_to_delete: Severity,
    pub delete_enabled: bool,
    pub warn_enabled: bool,
    pub alert_enabled: bool,
}

impl Default for ModerationThresholds {
    fn default() -> Self {
        Self {
            min_severity_to_save: Severity::Medium,
            min_severity_to_delete: Severity::Critical,
            delete_enabled: true,
            warn_enabled: true,
            alert_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationDecision {
    pub should_save: bool,
    pub should_delete: bool,
    pub should_warn: bool,
    pub should_alert: bool,
}

impl ModerationDecision {
    /// True when any action at all was selected.
    pub fn is_actionable(&self) -> bool {
        self.should_save || self.should_delete || self.should_warn || self.should_alert
    }
}

/// Decide which actions to take. A threat is always saved, and always
/// deleted when deletion is enabled, whatever the thresholds say.
pub fn decide(
    severity: Severity,
    is_threat: bool,
    thresholds: &ModerationThresholds,
) -> ModerationDecision {
    let should_save =
        is_threat || severity.ordinal() >= thresholds.min_severity_to_save.ordinal();
    let should_delete = thresholds.delete_enabled
        && (is_threat || severity.ordinal() >= thresholds.min_severity_to_delete.ordinal());
    let should_warn = should_delete && thresholds.warn_enabled;
    let should_alert = should_save && thresholds.alert_enabled;

    ModerationDecision {
        should_save,
        should_delete,
        should_warn,
        should_alert,
    }
}
