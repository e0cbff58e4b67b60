//! # Engine Statistics

use serde::Serialize;

/// Running counters since the engine was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Advance inputs accepted.
    pub advances_accepted: u64,
    /// Advance inputs rejected or failed.
    pub advances_rejected: u64,
    /// Inspect inputs accepted.
    pub inspects_accepted: u64,
    /// Inspect inputs rejected or failed.
    pub inspects_rejected: u64,
    /// Report frames sent.
    pub reports: u64,
    /// Notices sent.
    pub notices: u64,
    /// Vouchers sent.
    pub vouchers: u64,
    /// Outputs dropped because their module is disabled.
    pub dropped_outputs: u64,
    /// Calls that ended in a recoverable error.
    pub errors: u64,
}

impl EngineStats {
    /// Total outputs sent.
    #[must_use]
    pub fn outputs(&self) -> u64 {
        self.reports + self.notices + self.vouchers
    }
}
