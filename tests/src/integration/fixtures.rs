//! # Shared Fixtures
//!
//! A small wallet application plus helpers to build engines and craft
//! inputs, reused by every integration flow.

use primitive_types::U256;
use rd_01_abi_codec::prelude::{AbiError, AbiPayload, AbiType, Payload, PayloadDescriptor};
use rd_03_output_index::prelude::InMemoryIndexStore;
use rd_04_dispatch::prelude::{
    CallOutcome, ConfigurationError, DispatchEngine, DispatchEngineBuilder, EngineConfig,
    InMemoryKVStore, RecordingRollup,
};
use shared_types::{Address, BlockMetadata};

/// Engine over the in-memory adapters.
pub type TestEngine = DispatchEngine<InMemoryKVStore, InMemoryIndexStore, RecordingRollup>;

/// Default caller of advance inputs.
pub const USER: u64 = 0xa11ce;

/// Metadata for an advance sent by `sender`.
pub fn meta(sender: u64, input_index: u64) -> BlockMetadata {
    BlockMetadata::new(
        Address::from_low_u64(sender),
        input_index,
        100 + input_index,
        1_700_000_000 + input_index,
    )
}

/// Builds an engine with routes added by `wire`.
pub fn engine_with<F>(config: EngineConfig, wire: F) -> TestEngine
where
    F: FnOnce(DispatchEngineBuilder) -> Result<DispatchEngineBuilder, ConfigurationError>,
{
    wire(DispatchEngine::builder(config))
        .and_then(|b| {
            b.build(
                InMemoryKVStore::new(),
                InMemoryIndexStore::new(),
                RecordingRollup::new(),
            )
        })
        .unwrap()
}

/// Encodes and sends an advance for `module.method`.
pub fn send(
    engine: &mut TestEngine,
    module: &str,
    method: &str,
    payload: &Payload,
    metadata: BlockMetadata,
) -> CallOutcome {
    let input = engine
        .encode_mutation_input(module, method, None, payload)
        .unwrap();
    engine.advance(metadata, &input)
}

/// Encodes and sends an inspect for `module.method`.
pub fn query(engine: &mut TestEngine, module: &str, method: &str, payload: &Payload) -> CallOutcome {
    let input = engine.encode_query(module, method, payload, 1).unwrap();
    engine.inspect(&input)
}

/// `transfer(address,uint256)` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Recipient.
    pub to: Address,
    /// Token amount.
    pub amount: U256,
}

impl AbiPayload for Transfer {
    fn descriptor() -> PayloadDescriptor {
        PayloadDescriptor::new("Transfer")
            .with_field("to", AbiType::Address)
            .with_field("amount", AbiType::UINT256)
    }

    fn to_payload(&self) -> Payload {
        Payload::new().with("to", self.to).with("amount", self.amount)
    }

    fn from_payload(payload: &Payload) -> Result<Self, AbiError> {
        Ok(Self {
            to: payload.get_address("to")?,
            amount: payload.get_uint("amount")?,
        })
    }
}

/// Deposit of `amount` into the caller's balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposit {
    /// Amount credited.
    pub amount: u64,
    /// Free-form memo.
    pub memo: String,
}

impl AbiPayload for Deposit {
    fn descriptor() -> PayloadDescriptor {
        PayloadDescriptor::new("Deposit")
            .with_field("amount", AbiType::Uint(64))
            .with_optional("memo", AbiType::String)
    }

    fn to_payload(&self) -> Payload {
        Payload::new()
            .with("amount", self.amount)
            .with("memo", self.memo.as_str())
    }

    fn from_payload(payload: &Payload) -> Result<Self, AbiError> {
        Ok(Self {
            amount: payload.get_u64("amount")?,
            memo: payload.get_opt_string("memo")?.unwrap_or_default(),
        })
    }
}

/// Storage key of an account balance.
pub fn balance_key(owner: &Address) -> Vec<u8> {
    let mut key = b"balance/".to_vec();
    key.extend_from_slice(owner.as_bytes());
    key
}
