use std::time::Instant;

use crate::error::Stage;

/// Outcome of one action in the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActionStatus {
    /// Action is running or the run was interrupted before it returned.
    Started,
    /// Action returned successfully.
    Succeeded,
    /// Action returned an error.
    Failed,
    /// Action was never invoked because an earlier one failed.
    Skipped,
}

/// Record of one action's execution.
#[derive(Debug)]
pub struct ActionRecord {
    /// Position of the action within its group.
    pub index: usize,
    /// Action name, or `action #<index>` for unnamed actions.
    pub name: String,
    /// Outcome of the action.
    pub status: ActionStatus,
    /// When the action was invoked. `None` for skipped actions.
    pub started_at: Option<Instant>,
    /// When the action returned.
    pub completed_at: Option<Instant>,
}

/// Log of every action considered by one `do_commit` or `do_rollback` call.
#[derive(Debug)]
pub struct ExecutionLog {
    stage: Stage,
    records: Vec<ActionRecord>,
}

impl ExecutionLog {
    /// Create a new empty log for `stage`.
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            records: Vec::new(),
        }
    }

    pub(crate) fn record_start(&mut self, index: usize, name: String) {
        self.records.push(ActionRecord {
            index,
            name,
            status: ActionStatus::Started,
            started_at: Some(Instant::now()),
            completed_at: None,
        });
    }

    /// Mark the last action as succeeded.
    pub(crate) fn record_success(&mut self) {
        self.complete_last(ActionStatus::Succeeded);
    }

    /// Mark the last action as failed.
    pub(crate) fn record_failure(&mut self) {
        self.complete_last(ActionStatus::Failed);
    }

    pub(crate) fn record_skipped(&mut self, index: usize, name: String) {
        self.records.push(ActionRecord {
            index,
            name,
            status: ActionStatus::Skipped,
            started_at: None,
            completed_at: None,
        });
    }

    fn complete_last(&mut self, status: ActionStatus) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Group this log was recorded for.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Get all records, in action order.
    #[must_use]
    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    /// Number of actions that were actually invoked.
    #[must_use]
    pub fn invoked(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.status != ActionStatus::Skipped)
            .count()
    }

    /// Get a summary of the run for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                ActionStatus::Started => "…",
                ActionStatus::Succeeded => "✓",
                ActionStatus::Failed => "✗",
                ActionStatus::Skipped => "-",
            };
            lines.push(format!("{status} {} {}", self.stage, record.name));
        }
        lines.join("\n")
    }
}
