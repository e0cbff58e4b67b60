//! # JSON-Lines Driver
//!
//! Feeds requests read one per line into a [`RollupApp`] and closes each
//! with a `finish` line.
//!
//! ```text
//! {"request_type":"advance_state","data":{"metadata":{...},"payload":"0x..."}}
//! {"request_type":"inspect_state","data":{"payload":"0x..."}}
//! ```
//!
//! Malformed lines are logged and answered with `finish`/`exception`. The
//! loop stops at end of input, on an I/O error, or once the application
//! halts because committed state could not be made durable.

use crate::channel::{write_line, OutputLine};
use anyhow::{bail, Context, Result};
use rd_04_dispatch::prelude::{CallOutcome, RollupApp};
use serde::Deserialize;
use shared_types::{hex_to_bytes, BlockMetadata};
use std::io::{BufRead, Write};
use tracing::{debug, error, info, warn};

/// One request of the input stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "request_type", content = "data", rename_all = "snake_case")]
pub enum RollupRequest {
    /// State-changing input.
    AdvanceState {
        /// Block metadata.
        metadata: BlockMetadata,
        /// Hex payload.
        payload: String,
    },
    /// Read-only query.
    InspectState {
        /// Hex payload.
        payload: String,
    },
}

/// Totals of one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    /// Requests answered `accept`.
    pub accepted: u64,
    /// Requests answered `reject`.
    pub rejected: u64,
    /// Requests that failed or could not be parsed.
    pub failed: u64,
}

impl DriverSummary {
    /// Requests processed.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.accepted + self.rejected + self.failed
    }
}

/// Parses one input line.
pub fn parse_request(line: &str) -> Result<(RollupRequest, Vec<u8>)> {
    let request: RollupRequest = serde_json::from_str(line).context("malformed request")?;
    let payload = match &request {
        RollupRequest::AdvanceState { payload, .. } | RollupRequest::InspectState { payload } => {
            hex_to_bytes(payload).context("payload is not hex")?
        }
    };
    Ok((request, payload))
}

/// Runs every request from `input` through `app`, writing finish lines to
/// `output`.
pub fn run<A, B, W>(app: &mut A, input: B, output: &mut W) -> Result<DriverSummary>
where
    A: RollupApp,
    B: BufRead,
    W: Write,
{
    let mut summary = DriverSummary::default();
    for (n, line) in input.lines().enumerate() {
        let line = line.context("reading request")?;
        if line.trim().is_empty() {
            continue;
        }
        let outcome = match parse_request(&line) {
            Ok((RollupRequest::AdvanceState { metadata, .. }, payload)) => {
                debug!(line = n + 1, input_index = metadata.input_index, "[node] advance");
                Ok(app.advance(metadata, &payload))
            }
            Ok((RollupRequest::InspectState { .. }, payload)) => {
                debug!(line = n + 1, "[node] inspect");
                Ok(app.inspect(&payload))
            }
            Err(e) => {
                warn!(line = n + 1, error = %format!("{e:#}"), "[node] skipping request");
                Err(format!("{e:#}"))
            }
        };
        let halted = outcome.as_ref().is_ok_and(CallOutcome::is_halted);
        let finish = match outcome {
            Ok(outcome) => finish_line(outcome),
            Err(e) => OutputLine::Finish {
                status: "exception",
                error: Some(e),
            },
        };
        if let OutputLine::Finish { status, .. } = &finish {
            match *status {
                "accept" => summary.accepted += 1,
                "reject" => summary.rejected += 1,
                _ => summary.failed += 1,
            }
        }
        write_line(output, &finish).context("writing finish line")?;
        if halted {
            error!(line = n + 1, "[node] application halted, stopping");
            bail!("application halted at request line {}", n + 1);
        }
    }
    info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        failed = summary.failed,
        "[node] input exhausted"
    );
    Ok(summary)
}

fn finish_line(outcome: CallOutcome) -> OutputLine {
    match outcome {
        CallOutcome::Accepted => OutputLine::Finish {
            status: "accept",
            error: None,
        },
        CallOutcome::Rejected => OutputLine::Finish {
            status: "reject",
            error: None,
        },
        CallOutcome::Failed { kind, message } => OutputLine::Finish {
            status: "exception",
            error: Some(format!("{kind}: {message}")),
        },
        CallOutcome::Halted { message } => OutputLine::Finish {
            status: "exception",
            error: Some(format!("halted: {message}")),
        },
    }
}
