//! # Query Flows
//!
//! Inspect inputs in each wire format:
//!
//! | Format | Example |
//! |--------|---------|
//! | URL | `wallet/balance/0xab..?token=0xcd..` |
//! | JSON | `{"method":"wallet_balance","params":{"owner":"0xab.."}}` |
//! | JSON-RPC | `{"jsonrpc":"2.0","method":"wallet_balance","params":["0xab.."],"id":1}` |

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use rd_01_abi_codec::prelude::{AbiType, Payload, PayloadDescriptor};
    use rd_02_query_codec::prelude::{codes, QueryFormat};
    use rd_04_dispatch::prelude::*;
    use serde_json::{json, Value};
    use shared_types::{Address, MAX_SPLITTABLE_OUTPUT_SIZE, CONTINUATION_MARKER};

    fn lookup() -> PayloadDescriptor {
        PayloadDescriptor::new("BalanceQuery")
            .with_field("owner", AbiType::Address)
            .with_optional("token", AbiType::Address)
            .with_optional("tags", AbiType::array_of(AbiType::String))
    }

    /// Reports `{"owner", "token", "tags"}` back as JSON.
    fn echo_params(call: &mut Call<'_>, payload: Option<Payload>) -> Result<CallStatus, DispatchError> {
        let payload = payload.unwrap_or_default();
        let tags = if payload.contains("tags") {
            payload.get_string_list("tags")?
        } else {
            Vec::new()
        };
        call.report(json!({
            "owner": payload.get_address("owner")?.to_hex(),
            "token": payload.contains("token"),
            "tags": tags,
        }))?;
        Ok(CallStatus::Accept)
    }

    fn engine(format: QueryFormat) -> TestEngine {
        let config = EngineConfig::default().with_module(ModuleSettings::new("wallet").query_format(format));
        engine_with(config, |b| {
            b.register_query(
                "wallet",
                "balance",
                Some(lookup()),
                RouteConfig::new().path_params(["owner"]),
                echo_params,
            )
        })
    }

    fn last_json(engine: &TestEngine) -> Value {
        serde_json::from_slice(engine.rollup().last_report().unwrap()).unwrap()
    }

    // =========================================================================
    // URL
    // =========================================================================

    #[test]
    fn test_url_query_with_path_and_repeated_params() {
        let mut engine = engine(QueryFormat::Url);
        let owner = Address::from_low_u64(0xab);
        let raw = format!(
            "wallet/balance/{}?token={}&tags=a&tags=b",
            owner.to_hex(),
            Address::from_low_u64(0xcd).to_hex()
        );
        assert!(engine.inspect(raw.as_bytes()).is_accepted());
        let body = last_json(&engine);
        assert_eq!(body["owner"], owner.to_hex());
        assert_eq!(body["token"], true);
        assert_eq!(body["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_url_query_built_by_encoder() {
        let mut engine = engine(QueryFormat::Url);
        let payload = Payload::new().with("owner", Address::from_low_u64(7));
        let raw = engine.encode_query("wallet", "balance", &payload, 0).unwrap();
        assert!(String::from_utf8_lossy(&raw).starts_with("wallet/balance/"));
        assert!(engine.inspect(&raw).is_accepted());
        assert_eq!(last_json(&engine)["token"], false);
    }

    #[test]
    fn test_url_query_unknown_path() {
        let mut engine = engine(QueryFormat::Url);
        let outcome = engine.inspect(b"wallet/nothing");
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Decode));
        assert!(engine.rollup().last_report_text().unwrap().contains("wallet.nothing"));
    }

    // =========================================================================
    // JSON
    // =========================================================================

    #[test]
    fn test_json_named_and_positional_params() {
        let mut engine = engine(QueryFormat::Json);
        let owner = Address::from_low_u64(0xab).to_hex();

        let named = json!({"method": "wallet_balance", "params": {"owner": owner, "tags": ["x"]}});
        assert!(engine.inspect(named.to_string().as_bytes()).is_accepted());
        assert_eq!(last_json(&engine)["tags"], json!(["x"]));

        let positional = json!({"method": "wallet_balance", "params": [owner]});
        assert!(engine.inspect(positional.to_string().as_bytes()).is_accepted());
        assert_eq!(last_json(&engine)["owner"], owner);
    }

    #[test]
    fn test_json_missing_required_param() {
        let mut engine = engine(QueryFormat::Json);
        let outcome = engine.inspect(br#"{"method":"wallet_balance","params":{}}"#);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Decode));
        assert!(engine.rollup().last_report_text().unwrap().contains("owner"));
    }

    #[test]
    fn test_format_mismatch_is_reported() {
        let mut engine = engine(QueryFormat::Url);
        let outcome = engine.inspect(br#"{"method":"wallet_balance","params":{}}"#);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Decode));
        assert!(engine.rollup().last_report_text().unwrap().contains("format mismatch"));
    }

    // =========================================================================
    // JSON-RPC
    // =========================================================================

    #[test]
    fn test_jsonrpc_result_envelope() {
        let mut engine = engine(QueryFormat::JsonRpc);
        let payload = Payload::new().with("owner", Address::from_low_u64(0xab));
        let raw = engine.encode_query("wallet", "balance", &payload, 42).unwrap();
        assert!(engine.inspect(&raw).is_accepted());

        let body = last_json(&engine);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 42);
        assert_eq!(body["result"]["owner"], Address::from_low_u64(0xab).to_hex());
    }

    #[test]
    fn test_jsonrpc_encoder_binds_out_of_order_payload() {
        let pair = PayloadDescriptor::new("Pair")
            .with_field("a", AbiType::String)
            .with_field("b", AbiType::String);
        let config =
            EngineConfig::default().with_module(ModuleSettings::new("kv").query_format(QueryFormat::JsonRpc));
        let mut engine = engine_with(config, |b| {
            b.register_query("kv", "pair", Some(pair), RouteConfig::new(), |call, payload| {
                let payload = payload.unwrap_or_default();
                call.report(json!({"a": payload.get_string("a")?, "b": payload.get_string("b")?}))?;
                Ok(CallStatus::Accept)
            })
        });

        let payload = Payload::new().with("b", "B").with("a", "A");
        let raw = engine.encode_query("kv", "pair", &payload, 3).unwrap();
        assert!(engine.inspect(&raw).is_accepted());
        assert_eq!(last_json(&engine)["result"], json!({"a": "A", "b": "B"}));
    }

    #[test]
    fn test_jsonrpc_error_codes() {
        let mut engine = engine(QueryFormat::JsonRpc);

        engine.inspect(br#"{"jsonrpc":"2.0","method":"wallet_missing","id":"a"}"#);
        let body = last_json(&engine);
        assert_eq!(body["id"], "a");
        assert_eq!(body["error"]["code"], codes::METHOD_NOT_FOUND);

        engine.inspect(br#"{"jsonrpc":"2.0","method":"wallet_balance","params":[],"id":2}"#);
        assert_eq!(last_json(&engine)["error"]["code"], codes::INVALID_PARAMS);

        engine.inspect(br#"{"jsonrpc":"2.0","method":"wallet_balance","params":["0x01","0x02","x","y"],"id":3}"#);
        assert_eq!(last_json(&engine)["error"]["code"], codes::INVALID_REQUEST);
    }

    #[test]
    fn test_jsonrpc_handler_failure_keeps_id() {
        let config =
            EngineConfig::default().with_module(ModuleSettings::new("calc").query_format(QueryFormat::JsonRpc));
        let mut engine = engine_with(config, |b| {
            b.register_query("calc", "fail", None, RouteConfig::new(), |_, _| {
                Err(DispatchError::handler("division by zero"))
            })
        });
        engine.inspect(br#"{"jsonrpc":"2.0","method":"calc_fail","id":9}"#);
        let body = last_json(&engine);
        assert_eq!(body["id"], 9);
        assert_eq!(body["error"]["code"], codes::INTERNAL_ERROR);
        assert!(body["error"]["message"].as_str().unwrap().contains("division by zero"));
    }

    // =========================================================================
    // SPLITTABLE RESULTS
    // =========================================================================

    #[test]
    fn test_splittable_result_parts() {
        let size = MAX_SPLITTABLE_OUTPUT_SIZE + 10;
        let mut engine = engine_with(EngineConfig::default(), move |b| {
            b.register_query(
                "dump",
                "all",
                None,
                RouteConfig::new().splittable_output(),
                move |call, _| {
                    let mut blob = vec![1u8; MAX_SPLITTABLE_OUTPUT_SIZE];
                    blob.extend_from_slice(&[2u8; 10]);
                    assert_eq!(blob.len(), size);
                    call.report(blob)?;
                    Ok(CallStatus::Accept)
                },
            )
        });

        let part = |n: u64| json!({"method": "dump_all", "params": {"part": n}}).to_string();

        assert!(engine.inspect(part(0).as_bytes()).is_accepted());
        let first: Vec<u8> = engine.rollup().reports.concat();
        assert_eq!(first.len(), MAX_SPLITTABLE_OUTPUT_SIZE + 1);
        assert_eq!(first.last(), Some(&CONTINUATION_MARKER));

        engine.rollup_mut().clear();
        assert!(engine.inspect(part(1).as_bytes()).is_accepted());
        assert_eq!(engine.rollup().reports.concat(), vec![2u8; 10]);
    }
}
