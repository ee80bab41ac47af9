//! Execution result types

use crate::diagnostics::Diagnostics;
use serde::{Deserialize, Serialize};

/// Result of running one planned instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Remote object was created
    Created,
    /// Remote object was updated in place
    Updated,
    /// Remote object was deleted
    Deleted,
    /// Remote object differs from stored state
    Drifted { changes: usize },
    /// Remote object no longer exists
    Gone,
    /// Operation failed; state was left untouched
    Failed { diagnostics: Diagnostics },
    /// Operation was not attempted
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a remote change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Deleted)
    }

    pub fn failed(diagnostics: impl Into<Diagnostics>) -> Self {
        Self::Failed {
            diagnostics: diagnostics.into(),
        }
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub drifted: usize,
    pub gone: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of remote changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of instances processed
    pub fn total(&self) -> usize {
        self.total_changes()
            + self.drifted
            + self.gone
            + self.skipped
            + self.failed
            + self.no_change
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.drifted += other.drifted;
        self.gone += other.gone;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.no_change += other.no_change;
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Updated => self.updated += 1,
            ApplyResult::Deleted => self.deleted += 1,
            ApplyResult::Drifted { .. } => self.drifted += 1,
            ApplyResult::Gone => self.gone += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
        }
    }
}
