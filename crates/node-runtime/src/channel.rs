//! # JSON-Lines Rollup Channel
//!
//! Writes every output as one JSON object per line, payloads hex-encoded:
//!
//! ```text
//! {"type":"notice","payload":"0x48656c6c6f"}
//! {"type":"report","payload":"0x..."}
//! {"type":"voucher","destination":"0x...","value":"0x0","payload":"0xa9059cbb..."}
//! {"type":"finish","status":"accept"}
//! ```

use rd_04_dispatch::prelude::{RollupChannel, RollupError};
use serde::Serialize;
use shared_types::{bytes_to_hex, Voucher};
use std::io::Write;

/// One line of the output stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputLine {
    /// Report frame.
    Report {
        /// Hex payload.
        payload: String,
    },
    /// Notice.
    Notice {
        /// Hex payload.
        payload: String,
    },
    /// Voucher.
    Voucher(Voucher),
    /// End of one request.
    Finish {
        /// `accept`, `reject` or `exception`.
        status: &'static str,
        /// Failure description.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Writes `line` followed by a newline.
pub fn write_line<W: Write>(writer: &mut W, line: &OutputLine) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, line)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Rollup channel over any writer.
#[derive(Debug)]
pub struct JsonLinesRollup<W> {
    writer: W,
}

impl<W: Write> JsonLinesRollup<W> {
    /// Channel writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// The underlying writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn emit(&mut self, line: &OutputLine) -> Result<(), RollupError> {
        write_line(&mut self.writer, line).map_err(|e| RollupError(e.to_string()))
    }
}

impl<W: Write> RollupChannel for JsonLinesRollup<W> {
    fn emit_report(&mut self, payload: &[u8]) -> Result<(), RollupError> {
        self.emit(&OutputLine::Report {
            payload: bytes_to_hex(payload),
        })
    }

    fn emit_notice(&mut self, payload: &[u8]) -> Result<(), RollupError> {
        self.emit(&OutputLine::Notice {
            payload: bytes_to_hex(payload),
        })
    }

    fn emit_voucher(&mut self, voucher: &Voucher) -> Result<(), RollupError> {
        self.emit(&OutputLine::Voucher(voucher.clone()))
    }
}
