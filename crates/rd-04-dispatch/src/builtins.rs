//! # Built-in Routes
//!
//! | Route | Kind | Registered when |
//! |-------|------|-----------------|
//! | `relay.dapp_relay` | header-less packed mutation from the relay address | `enable_relay` |
//! | `indexer.indexer_query` | query over the output index | any module sets `index_outputs` |

use crate::call::Call;
use crate::domain::{CallStatus, RouteConfig, RouteKind};
use crate::errors::{ConfigurationError, DispatchError};
use crate::registry::Registry;
use rd_01_abi_codec::prelude::{AbiType, Payload, PayloadDescriptor};
use rd_03_output_index::prelude::IndexFilter;
use shared_types::{Address, OutputKind};
use tracing::{info, warn};

/// Module of the relay route.
pub const RELAY_MODULE: &str = "relay";
/// Method of the relay route.
pub const RELAY_METHOD: &str = "dapp_relay";
/// Module of the indexer query.
pub const INDEXER_MODULE: &str = "indexer";
/// Method of the indexer query.
pub const INDEXER_METHOD: &str = "indexer_query";

// =============================================================================
// RELAY
// =============================================================================

/// `DappRelay { dapp_address: address }`, packed: exactly 20 bytes.
#[must_use]
pub fn relay_descriptor() -> PayloadDescriptor {
    PayloadDescriptor::new("DappRelay").with_field("dapp_address", AbiType::Address)
}

pub(crate) fn register_relay(
    registry: &mut Registry,
    relay_address: Address,
) -> Result<(), ConfigurationError> {
    registry.register(
        RouteKind::Mutation,
        RELAY_MODULE,
        RELAY_METHOD,
        Some(relay_descriptor()),
        RouteConfig::new().no_header().packed().msg_sender(relay_address),
        Box::new(dapp_relay),
    )
}

fn dapp_relay(call: &mut Call<'_>, payload: Option<Payload>) -> Result<CallStatus, DispatchError> {
    let payload = payload.ok_or_else(|| DispatchError::Decode("missing relay payload".into()))?;
    let address = payload.get_address("dapp_address")?;
    if let Some(known) = call.app_contract() {
        warn!(%known, relayed = %address, "[rd-04] application contract already set");
        return Ok(CallStatus::Reject);
    }
    info!(app_contract = %address, "[rd-04] application contract relayed");
    call.set_app_contract(address);
    Ok(CallStatus::Accept)
}

// =============================================================================
// INDEXER QUERY
// =============================================================================

/// Every criterion of [`IndexFilter`], all optional.
#[must_use]
pub fn indexer_descriptor() -> PayloadDescriptor {
    let text = AbiType::String;
    let number = AbiType::Uint(64);
    PayloadDescriptor::new("IndexerQuery")
        .with_optional("tags", AbiType::array_of(AbiType::String))
        .with_optional("tags_or", AbiType::Bool)
        .with_optional("type", text.clone())
        .with_optional("module", text.clone())
        .with_optional("msg_sender", AbiType::Address)
        .with_optional("timestamp_gte", number.clone())
        .with_optional("timestamp_lte", number.clone())
        .with_optional("input_index", number.clone())
        .with_optional("input_index_gte", number.clone())
        .with_optional("input_index_lte", number.clone())
        .with_optional("app_contract", AbiType::Address)
        .with_optional("order_by", text.clone())
        .with_optional("order_dir", text)
        .with_optional("page", number.clone())
        .with_optional("page_size", number)
}

pub(crate) fn register_indexer(registry: &mut Registry) -> Result<(), ConfigurationError> {
    registry.register(
        RouteKind::Query,
        INDEXER_MODULE,
        INDEXER_METHOD,
        Some(indexer_descriptor()),
        RouteConfig::new(),
        Box::new(indexer_query),
    )
}

fn indexer_query(call: &mut Call<'_>, payload: Option<Payload>) -> Result<CallStatus, DispatchError> {
    let filter = filter_from_payload(&payload.unwrap_or_default())?;
    let page = call.query_index(&filter)?;
    let body = serde_json::to_value(&page).map_err(|e| DispatchError::handler(e.to_string()))?;
    call.report(body)?;
    Ok(CallStatus::Accept)
}

fn opt_address(payload: &Payload, name: &str) -> Result<Option<Address>, DispatchError> {
    if payload.contains(name) {
        Ok(Some(payload.get_address(name)?))
    } else {
        Ok(None)
    }
}

/// Builds an index filter from bound query parameters.
pub fn filter_from_payload(payload: &Payload) -> Result<IndexFilter, DispatchError> {
    let kind = payload
        .get_opt_string("type")?
        .map(|s| s.parse::<OutputKind>())
        .transpose()
        .map_err(DispatchError::Decode)?;
    let tags = if payload.contains("tags") {
        payload.get_string_list("tags")?
    } else {
        Vec::new()
    };
    Ok(IndexFilter {
        tags,
        tags_or: payload.contains("tags_or") && payload.get_bool("tags_or")?,
        kind,
        module: payload.get_opt_string("module")?,
        msg_sender: opt_address(payload, "msg_sender")?,
        timestamp_gte: payload.get_opt_u64("timestamp_gte")?,
        timestamp_lte: payload.get_opt_u64("timestamp_lte")?,
        input_index: payload.get_opt_u64("input_index")?,
        input_index_gte: payload.get_opt_u64("input_index_gte")?,
        input_index_lte: payload.get_opt_u64("input_index_lte")?,
        app_contract: opt_address(payload, "app_contract")?,
        order_by: payload.get_opt_string("order_by")?,
        order_dir: payload.get_opt_string("order_dir")?,
        page: payload.get_opt_u64("page")?,
        page_size: payload.get_opt_u64("page_size")?,
    })
}
