//! # Call Handle and Output Channel
//!
//! A [`Call`] is what a handler receives: read access to the active
//! [`CallContext`], the application store, and the output channel.
//!
//! ## Output Rules
//!
//! | Output | Advance | Inspect |
//! |--------|---------|---------|
//! | report | any number; each framed at `MAX_OUTPUT_SIZE`, logical size capped at `MAX_AGGREGATED_OUTPUT_SIZE` | at most one; truncated or split by `part` |
//! | notice | one frame, at most `MAX_OUTPUT_SIZE` | `ContextMisuse` |
//! | voucher | one frame, at most `MAX_OUTPUT_SIZE` | `ContextMisuse` |
//!
//! Outputs of a disabled module are dropped without error. Outputs of an
//! indexed module produce one index entry per frame (advance only).

use crate::domain::{
    build_voucher_payload, frames, split_part, truncate_aggregated, CallContext, EngineStats,
    OutputData,
};
use crate::errors::DispatchError;
use crate::ports::{KeyValueStore, RollupChannel};
use crate::registry::PART_FIELD;
use rd_01_abi_codec::prelude::{AbiPayload, Payload, PayloadDescriptor};
use rd_02_query_codec::prelude::RpcResponse;
use rd_03_output_index::prelude::{IndexEntry, IndexFilter, IndexPage, IndexStore};
use serde_json::Value;
use shared_types::{
    bytes_to_hex, Address, BlockMetadata, OutputFormat, OutputKind, Voucher, MAX_AGGREGATED_OUTPUT_SIZE,
    MAX_OUTPUT_SIZE, U256,
};
use tracing::{debug, warn};

/// Handle passed to handlers for the duration of one call.
pub struct Call<'a> {
    pub(crate) ctx: &'a mut CallContext,
    pub(crate) store: &'a mut dyn KeyValueStore,
    pub(crate) index: &'a mut dyn IndexStore,
    pub(crate) rollup: &'a mut dyn RollupChannel,
    pub(crate) stats: &'a mut EngineStats,
    pub(crate) app_contract: Option<Address>,
}

impl<'a> Call<'a> {
    // =========================================================================
    // CONTEXT
    // =========================================================================

    /// Block metadata of the advance input. Inspect calls have none.
    pub fn metadata(&self) -> Result<&BlockMetadata, DispatchError> {
        self.ctx.metadata.as_ref().ok_or_else(|| {
            DispatchError::ContextMisuse("block metadata is not available during inspect".into())
        })
    }

    /// Effective caller; `None` during inspect.
    #[must_use]
    pub fn sender(&self) -> Option<Address> {
        self.ctx.sender
    }

    /// Executing module.
    #[must_use]
    pub fn module(&self) -> &str {
        self.ctx.module()
    }

    /// Returns true for advance calls.
    #[must_use]
    pub fn is_advance(&self) -> bool {
        self.ctx.is_advance()
    }

    /// Decoded input payload.
    #[must_use]
    pub fn input_payload(&self) -> Option<&Payload> {
        self.ctx.input_payload.as_ref()
    }

    /// Extra query parameters bound from the extended descriptor.
    #[must_use]
    pub fn extended_params(&self) -> Option<&Payload> {
        self.ctx.extended_params.as_ref()
    }

    /// Requested part of a splittable query result.
    #[must_use]
    pub fn part(&self) -> Option<usize> {
        let params = self.ctx.extended_params.as_ref()?;
        params
            .get_opt_u64(PART_FIELD)
            .ok()
            .flatten()
            .and_then(|p| usize::try_from(p).ok())
    }

    /// Application state.
    pub fn storage(&mut self) -> &mut dyn KeyValueStore {
        &mut *self.store
    }

    /// Application contract address, once known (including one set in
    /// this call).
    #[must_use]
    pub fn app_contract(&self) -> Option<Address> {
        self.ctx.pending_app_contract.or(self.app_contract)
    }

    /// Records the application contract. Takes effect when the call commits.
    pub fn set_app_contract(&mut self, address: Address) {
        self.ctx.pending_app_contract = Some(address);
    }

    /// Reads the output index, including this call's own entries.
    pub fn query_index(&self, filter: &IndexFilter) -> Result<IndexPage, DispatchError> {
        Ok(self.index.query(filter)?)
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    /// Emits a report.
    pub fn report(&mut self, data: impl Into<OutputData>) -> Result<(), DispatchError> {
        self.report_with(data, &[], None)
    }

    /// Emits a report with index tags and an optional numeric value.
    pub fn report_with(
        &mut self,
        data: impl Into<OutputData>,
        tags: &[&str],
        value: Option<U256>,
    ) -> Result<(), DispatchError> {
        if self.drop_if_disabled(OutputKind::Report) {
            return Ok(());
        }
        let data = data.into();
        let payload = data.encode(self.ctx.settings.report_format)?;
        if self.ctx.is_advance() {
            self.advance_report(payload, &data.class_name(), tags, value)
        } else {
            self.inspect_report(payload)
        }
    }

    fn advance_report(
        &mut self,
        payload: Vec<u8>,
        class_name: &str,
        tags: &[&str],
        value: Option<U256>,
    ) -> Result<(), DispatchError> {
        if payload.len() > MAX_AGGREGATED_OUTPUT_SIZE {
            return Err(DispatchError::SizeLimit(format!(
                "report of {} bytes exceeds {MAX_AGGREGATED_OUTPUT_SIZE}",
                payload.len()
            )));
        }
        for frame in frames(&payload, MAX_OUTPUT_SIZE) {
            self.rollup.emit_report(frame)?;
            let output_index = self.ctx.n_reports;
            self.ctx.n_reports += 1;
            self.stats.reports += 1;
            self.log_frame(OutputKind::Report, output_index, frame.len());
            self.record(
                IndexEntry::new(OutputKind::Report, self.ctx.module(), class_name, self.meta()?)
                    .with_output_index(output_index)
                    .with_tags(tags.iter().copied())
                    .with_value(value),
            )?;
        }
        Ok(())
    }

    fn inspect_report(&mut self, mut payload: Vec<u8>) -> Result<(), DispatchError> {
        if self.ctx.n_reports > 0 {
            return Err(DispatchError::SizeLimit("can't add multiple reports".into()));
        }
        if let Some(id) = self.ctx.rpc_id.clone() {
            let result = serde_json::from_slice::<Value>(&payload)
                .unwrap_or_else(|_| Value::String(bytes_to_hex(&payload)));
            payload = RpcResponse::result(id, result).to_bytes();
        }
        match self.part() {
            Some(part) if self.ctx.splittable => payload = split_part(&payload, part),
            _ => {
                let original = payload.len();
                if truncate_aggregated(&mut payload) {
                    warn!(
                        module = %self.ctx.module(),
                        original,
                        kept = payload.len(),
                        "[rd-04] inspect report truncated"
                    );
                }
            }
        }
        for (i, frame) in frames(&payload, MAX_OUTPUT_SIZE).into_iter().enumerate() {
            self.rollup.emit_report(frame)?;
            self.stats.reports += 1;
            self.log_frame(OutputKind::Report, i as u64, frame.len());
        }
        self.ctx.n_reports += 1;
        Ok(())
    }

    // =========================================================================
    // NOTICES
    // =========================================================================

    /// Emits a notice.
    pub fn notice(&mut self, data: impl Into<OutputData>) -> Result<(), DispatchError> {
        self.notice_with(data, &[], None)
    }

    /// Emits a notice with index tags and an optional numeric value.
    pub fn notice_with(
        &mut self,
        data: impl Into<OutputData>,
        tags: &[&str],
        value: Option<U256>,
    ) -> Result<(), DispatchError> {
        self.require_advance("notices")?;
        if self.drop_if_disabled(OutputKind::Notice) {
            return Ok(());
        }
        let data = data.into();
        let settings = &self.ctx.settings;
        let mut payload = data.encode(settings.notice_format)?;
        if settings.notice_header && settings.notice_format == OutputFormat::Abi {
            if let Some(sel) = data.model_selector() {
                let mut headed = sel.to_vec();
                headed.append(&mut payload);
                payload = headed;
            }
        }
        if payload.len() > MAX_OUTPUT_SIZE {
            return Err(DispatchError::SizeLimit(format!(
                "notice of {} bytes exceeds {MAX_OUTPUT_SIZE}",
                payload.len()
            )));
        }

        self.rollup.emit_notice(&payload)?;
        let output_index = self.ctx.n_notices;
        self.ctx.n_notices += 1;
        self.stats.notices += 1;
        self.log_frame(OutputKind::Notice, output_index, payload.len());
        self.record(
            IndexEntry::new(OutputKind::Notice, self.ctx.module(), data.class_name(), self.meta()?)
                .with_output_index(output_index)
                .with_tags(tags.iter().copied())
                .with_value(value),
        )
    }

    // =========================================================================
    // VOUCHERS
    // =========================================================================

    /// Emits a voucher calling `function` (the payload type's name when
    /// `None`) on `destination` with `args`.
    pub fn voucher<P: AbiPayload>(
        &mut self,
        destination: Address,
        function: Option<&str>,
        args: &P,
        value: U256,
    ) -> Result<(), DispatchError> {
        self.voucher_with(destination, function, &P::descriptor(), &args.to_payload(), value, &[])
    }

    /// Emits a voucher from an explicit descriptor, with index tags.
    pub fn voucher_with(
        &mut self,
        destination: Address,
        function: Option<&str>,
        descriptor: &PayloadDescriptor,
        args: &Payload,
        value: U256,
        tags: &[&str],
    ) -> Result<(), DispatchError> {
        self.require_advance("vouchers")?;
        if self.drop_if_disabled(OutputKind::Voucher) {
            return Ok(());
        }
        let payload = build_voucher_payload(function, descriptor, args)
            .map_err(|e| DispatchError::handler(format!("voucher {}: {e}", descriptor.name())))?;
        if payload.len() > MAX_OUTPUT_SIZE {
            return Err(DispatchError::SizeLimit(format!(
                "voucher of {} bytes exceeds {MAX_OUTPUT_SIZE}",
                payload.len()
            )));
        }

        let voucher = Voucher {
            destination,
            value,
            payload,
        };
        self.rollup.emit_voucher(&voucher)?;
        let output_index = self.ctx.n_vouchers;
        self.ctx.n_vouchers += 1;
        self.stats.vouchers += 1;
        self.log_frame(OutputKind::Voucher, output_index, voucher.payload.len());
        self.record(
            IndexEntry::new(OutputKind::Voucher, self.ctx.module(), descriptor.name(), self.meta()?)
                .with_output_index(output_index)
                .with_tags(tags.iter().copied())
                .with_voucher_value(value),
        )
    }

    // =========================================================================
    // INPUT INDEXING
    // =========================================================================

    /// Records the current input in the index with `tags` and `value`.
    ///
    /// Allowed once per advance call. Skipped with a warning when the
    /// module does not index its outputs, and silently when it is disabled.
    pub fn index_input(&mut self, tags: &[&str], value: Option<U256>) -> Result<(), DispatchError> {
        self.require_advance("input indexing")?;
        if self.ctx.settings.disabled {
            debug!(module = %self.ctx.module(), "[rd-04] index_input ignored: module disabled");
            return Ok(());
        }
        if self.ctx.input_indexed {
            return Err(DispatchError::ContextMisuse("input already indexed".into()));
        }
        if !self.ctx.settings.index_outputs {
            warn!(module = %self.ctx.module(), "[rd-04] index_input ignored: indexing disabled");
            return Ok(());
        }
        self.ctx.input_indexed = true;
        let entry = IndexEntry::new(
            OutputKind::Input,
            self.ctx.module(),
            self.ctx.input_class.as_str(),
            self.meta()?,
        )
        .with_tags(tags.iter().copied())
        .with_value(value)
        .with_app_contract(self.app_contract());
        self.index.append(entry)?;
        Ok(())
    }

    /// Indexes the input of a call that indexed outputs but never called
    /// [`Call::index_input`].
    pub(crate) fn index_input_if_outputs(&mut self) -> Result<(), DispatchError> {
        if self.ctx.n_indexed > 0 && !self.ctx.input_indexed {
            self.index_input(&[], None)?;
        }
        Ok(())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn meta(&self) -> Result<&BlockMetadata, DispatchError> {
        self.metadata()
    }

    fn require_advance(&self, what: &str) -> Result<(), DispatchError> {
        if self.ctx.is_advance() {
            Ok(())
        } else {
            Err(DispatchError::ContextMisuse(format!(
                "{what}: only available during advance"
            )))
        }
    }

    fn drop_if_disabled(&mut self, kind: OutputKind) -> bool {
        if self.ctx.settings.disabled {
            debug!(module = %self.ctx.module(), kind = %kind, "[rd-04] output dropped: module disabled");
            self.stats.dropped_outputs += 1;
            true
        } else {
            false
        }
    }

    fn record(&mut self, entry: IndexEntry) -> Result<(), DispatchError> {
        if !self.ctx.settings.index_outputs || !self.ctx.is_advance() {
            return Ok(());
        }
        let entry = entry.with_app_contract(self.app_contract());
        self.index.append(entry)?;
        self.ctx.n_indexed += 1;
        Ok(())
    }

    fn log_frame(&self, kind: OutputKind, output_index: u64, bytes: usize) {
        let input_index = self.ctx.metadata.as_ref().map(|m| m.input_index);
        debug!(
            module = %self.ctx.module(),
            kind = %kind,
            ?input_index,
            output_index,
            bytes,
            "[rd-04] output emitted"
        );
    }
}
