//! Hooks the executor calls back into while reconciling
//!
//! The engine never touches a terminal; the CLI supplies a progress bar
//! and a prompt, tests supply the no-op versions below.

use crate::types::ApplyResult;
use anyhow::Result;

/// Observes a reconciliation run, one batch of instances at a time
///
/// Every hook defaults to doing nothing.
pub trait ProgressCallback: Send {
    fn on_batch_start(&mut self, _count: usize) {}

    /// Only called when instances run one after another
    fn on_resource_start(&mut self, _address: &str) {}

    fn on_resource_complete(&mut self, _address: &str, _result: &ApplyResult) {}

    fn on_batch_complete(&mut self) {}
}

/// Gate before any remote change is made
pub trait ConfirmCallback: Send {
    /// `Ok(false)` stops the run with every instance skipped
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Ignores progress
pub struct NoProgress;

impl ProgressCallback for NoProgress {}

/// Answers yes, as `apply --yes` does
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Answers no
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
