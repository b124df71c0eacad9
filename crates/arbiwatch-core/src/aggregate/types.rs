use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::sources::{FetchError, NormalizedPayload, ServerStatus, SourceKind};

pub type SourceOutcome = Result<NormalizedPayload, FetchError>;

/// Outcome of one refresh cycle, keyed by the sources that were invoked.
///
/// Sources omitted from the cycle (for example, authenticated sources with
/// no credential) are absent, not failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleResult {
    outcomes: BTreeMap<SourceKind, SourceOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CycleResult {
    pub fn new(
        outcomes: BTreeMap<SourceKind, SourceOutcome>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            outcomes,
            started_at,
            finished_at,
        }
    }

    pub fn outcome(&self, kind: SourceKind) -> Option<&SourceOutcome> {
        self.outcomes.get(&kind)
    }

    pub fn outcomes(&self) -> &BTreeMap<SourceKind, SourceOutcome> {
        &self.outcomes
    }

    pub fn invoked(&self) -> impl Iterator<Item = SourceKind> + '_ {
        self.outcomes.keys().copied()
    }

    /// Every invoked source succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.values().all(Result::is_ok)
    }

    /// Some, but not all, invoked sources succeeded.
    pub fn is_partial(&self) -> bool {
        let ok = self.outcomes.values().filter(|o| o.is_ok()).count();
        ok > 0 && ok < self.outcomes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_err()).count()
    }

    /// Each failure as `"<source>: <reason>"`, in source order, joined by `"; "`.
    pub fn error_message(&self) -> Option<String> {
        let failures: Vec<String> = self
            .outcomes
            .iter()
            .filter_map(|(kind, outcome)| {
                outcome
                    .as_ref()
                    .err()
                    .map(|e| format!("{}: {}", kind.name(), e))
            })
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        }
    }

    /// Server-reported timing, when the status source ran and succeeded.
    pub fn server_status(&self) -> Option<ServerStatus> {
        match self.outcomes.get(&SourceKind::Status) {
            Some(Ok(NormalizedPayload::Status(status))) => Some(*status),
            _ => None,
        }
    }
}
