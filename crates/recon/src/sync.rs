//! Push-back outcomes.
//!
//! Records stay immutable after comparison. Whether an A-only record made it
//! into the ledger is tracked here, keyed by record key.

use std::collections::BTreeMap;

use serde::Serialize;

/// Outcome of pushing one record to the opposite source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    /// Confirmed written.
    Synchronized,
    /// Never sent (failed local validation).
    Skipped { reason: String },
    /// Sent, but not confirmed.
    Failed { reason: String },
}

impl SyncStatus {
    pub fn is_synchronized(&self) -> bool {
        matches!(self, Self::Synchronized)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    pub synchronized: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Per-key results of one push-back call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    pub statuses: BTreeMap<String, SyncStatus>,
    /// Set when the batch as a whole failed (transport or protocol error).
    pub batch_error: Option<String>,
}

impl PushOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: impl Into<String>, status: SyncStatus) {
        self.statuses.insert(key.into(), status);
    }

    pub fn status(&self, key: &str) -> Option<&SyncStatus> {
        self.statuses.get(key)
    }

    /// False for unknown keys: nothing unconfirmed counts as synchronized.
    pub fn is_synchronized(&self, key: &str) -> bool {
        self.status(key).is_some_and(SyncStatus::is_synchronized)
    }

    pub fn counts(&self) -> SyncCounts {
        let mut counts = SyncCounts::default();
        for status in self.statuses.values() {
            match status {
                SyncStatus::Synchronized => counts.synchronized += 1,
                SyncStatus::Skipped { .. } => counts.skipped += 1,
                SyncStatus::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    pub fn has_failures(&self) -> bool {
        self.batch_error.is_some()
            || self.statuses.values().any(|s| matches!(s, SyncStatus::Failed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_not_synchronized() {
        let outcome = PushOutcome::new();
        assert!(!outcome.is_synchronized("P1"));
        assert!(!outcome.has_failures());
    }

    #[test]
    fn counts_by_state() {
        let mut outcome = PushOutcome::new();
        outcome.record("P1", SyncStatus::Synchronized);
        outcome.record("P2", SyncStatus::Skipped {
            reason: "missing counterparty".into(),
        });
        outcome.record("P3", SyncStatus::Failed {
            reason: "timeout".into(),
        });
        outcome.record("P4", SyncStatus::Synchronized);

        let counts = outcome.counts();
        assert_eq!(counts.synchronized, 2);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.failed, 1);
        assert!(outcome.is_synchronized("P4"));
        assert!(!outcome.is_synchronized("P2"));
        assert!(outcome.has_failures());
    }

    #[test]
    fn status_serializes_with_state_tag() {
        let skipped = SyncStatus::Skipped {
            reason: "bad amount".into(),
        };
        let json = serde_json::to_value(skipped).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "skipped", "reason": "bad amount" }));
        let json = serde_json::to_value(SyncStatus::Synchronized).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "synchronized" }));
    }
}
