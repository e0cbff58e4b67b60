//! # Recording Rollup
//!
//! Keeps every emitted output in memory, in emission order.

use crate::errors::RollupError;
use crate::ports::outbound::RollupChannel;
use shared_types::Voucher;

/// Rollup channel that records outputs instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct RecordingRollup {
    /// Report frames.
    pub reports: Vec<Vec<u8>>,
    /// Notices.
    pub notices: Vec<Vec<u8>>,
    /// Vouchers.
    pub vouchers: Vec<Voucher>,
}

impl RecordingRollup {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last report frame.
    #[must_use]
    pub fn last_report(&self) -> Option<&[u8]> {
        self.reports.last().map(Vec::as_slice)
    }

    /// Last report frame as UTF-8 text.
    #[must_use]
    pub fn last_report_text(&self) -> Option<String> {
        self.last_report()
            .map(|r| String::from_utf8_lossy(r).into_owned())
    }

    /// Forgets everything recorded so far.
    pub fn clear(&mut self) {
        self.reports.clear();
        self.notices.clear();
        self.vouchers.clear();
    }
}

impl RollupChannel for RecordingRollup {
    fn emit_report(&mut self, payload: &[u8]) -> Result<(), RollupError> {
        self.reports.push(payload.to_vec());
        Ok(())
    }

    fn emit_notice(&mut self, payload: &[u8]) -> Result<(), RollupError> {
        self.notices.push(payload.to_vec());
        Ok(())
    }

    fn emit_voucher(&mut self, voucher: &Voucher) -> Result<(), RollupError> {
        self.vouchers.push(voucher.clone());
        Ok(())
    }
}
