//! # Echo Application
//!
//! Demo application wired by the executable.
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `echo.echo_mutation(bytes)` | emits the message as a notice |
//! | `echo.echo_query(string)` | reports the message (hex text is decoded) |

use rd_01_abi_codec::prelude::{AbiError, AbiPayload, AbiType, Payload, PayloadDescriptor};
use rd_04_dispatch::prelude::{
    CallStatus, ConfigurationError, DispatchEngineBuilder, RouteConfig,
};
use shared_types::bytes_to_hex;
use tracing::info;

/// Module name of the echo routes.
pub const ECHO_MODULE: &str = "echo";

/// Advance payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoMessage {
    /// Bytes to echo.
    pub message: Vec<u8>,
}

impl AbiPayload for EchoMessage {
    fn descriptor() -> PayloadDescriptor {
        PayloadDescriptor::new("EchoMessage").with_field("message", AbiType::Bytes)
    }

    fn to_payload(&self) -> Payload {
        Payload::new().with("message", self.message.clone())
    }

    fn from_payload(payload: &Payload) -> Result<Self, AbiError> {
        Ok(Self {
            message: payload.get_bytes("message")?,
        })
    }
}

/// Inspect payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoQuery {
    /// Text to echo.
    pub message: String,
}

impl AbiPayload for EchoQuery {
    fn descriptor() -> PayloadDescriptor {
        PayloadDescriptor::new("EchoQuery").with_field("message", AbiType::String)
    }

    fn to_payload(&self) -> Payload {
        Payload::new().with("message", self.message.as_str())
    }

    fn from_payload(payload: &Payload) -> Result<Self, AbiError> {
        Ok(Self {
            message: payload.get_string("message")?,
        })
    }
}

/// Adds the echo routes to `builder`.
pub fn register(builder: DispatchEngineBuilder) -> Result<DispatchEngineBuilder, ConfigurationError> {
    builder
        .register_typed_mutation::<EchoMessage, _>(
            ECHO_MODULE,
            "echo_mutation",
            RouteConfig::new(),
            |call, input| {
                info!(payload = %bytes_to_hex(&input.message), "[echo] advance");
                call.notice(input.message)?;
                Ok(CallStatus::Accept)
            },
        )?
        .register_typed_query::<EchoQuery, _>(
            ECHO_MODULE,
            "echo_query",
            RouteConfig::new(),
            |call, query| {
                info!(message = %query.message, "[echo] inspect");
                call.report(query.message)?;
                Ok(CallStatus::Accept)
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rd_03_output_index::prelude::InMemoryIndexStore;
    use rd_04_dispatch::prelude::{
        DispatchEngine, EngineConfig, InMemoryKVStore, RecordingRollup,
    };
    use shared_types::{Address, BlockMetadata};

    fn engine() -> DispatchEngine<InMemoryKVStore, InMemoryIndexStore, RecordingRollup> {
        register(DispatchEngine::builder(EngineConfig::default()))
            .unwrap()
            .build(InMemoryKVStore::new(), InMemoryIndexStore::new(), RecordingRollup::new())
            .unwrap()
    }

    #[test]
    fn test_echo_notice() {
        let mut engine = engine();
        let input = engine
            .encode_mutation_input(
                ECHO_MODULE,
                "echo_mutation",
                None,
                &EchoMessage {
                    message: b"Hello World".to_vec(),
                }
                .to_payload(),
            )
            .unwrap();
        let meta = BlockMetadata::new(Address::from_low_u64(1), 0, 1, 1);
        assert!(engine.advance(meta, &input).is_accepted());
        assert_eq!(engine.rollup().notices, vec![b"Hello World".to_vec()]);
    }

    #[test]
    fn test_echo_report() {
        let mut engine = engine();
        let query = engine
            .encode_query(
                ECHO_MODULE,
                "echo_query",
                &EchoQuery {
                    message: "Hello World".into(),
                }
                .to_payload(),
                1,
            )
            .unwrap();
        assert!(engine.inspect(&query).is_accepted());
        assert_eq!(engine.rollup().last_report_text().as_deref(), Some("Hello World"));
    }
}
