//! # Index Flows
//!
//! Output indexing across calls:
//!
//! 1. Indexed modules record inputs and outputs with tags and values
//! 2. The relay route learns the application contract once
//! 3. Entries recorded before that are back-filled
//! 4. The built-in indexer query answers `{data, total, page}`

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use primitive_types::U256;
    use rd_01_abi_codec::prelude::{AbiPayload, Payload};
    use rd_03_output_index::prelude::{FileBackedIndexStore, IndexFilter, IndexStore};
    use rd_04_dispatch::prelude::*;
    use serde_json::{json, Value};
    use shared_types::{Address, BlockMetadata, OutputKind};

    const APP: u64 = 0xa99;

    fn indexed_config() -> EngineConfig {
        EngineConfig::default()
            .with_relay()
            .with_module(ModuleSettings::new("wallet").indexed())
    }

    fn indexed_wallet() -> TestEngine {
        engine_with(indexed_config(), wallet_routes)
    }

    fn wallet_routes(b: DispatchEngineBuilder) -> Result<DispatchEngineBuilder, ConfigurationError> {
        b.register_typed_mutation::<Deposit, _>("wallet", "deposit", RouteConfig::new(), |call, d| {
            let amount = U256::from(d.amount);
            call.index_input(&["deposit"], Some(amount))?;
            call.notice_with(d.memo.clone(), &["deposit", "credit"], Some(amount))?;
            if d.memo == "twice" {
                call.index_input(&[], None)?;
            }
            Ok(CallStatus::Accept)
        })?
        .register_mutation("wallet", "ping", None, RouteConfig::new(), |call, _| {
            call.report_with("pong", &["ping"], None)?;
            Ok(CallStatus::Accept)
        })?
        .register_mutation("wallet", "fail", None, RouteConfig::new(), |_, _| {
            Err(DispatchError::handler("nope"))
        })
    }

    fn deposit(amount: u64, memo: &str) -> Payload {
        Deposit {
            amount,
            memo: memo.into(),
        }
        .to_payload()
    }

    fn relay(engine: &mut TestEngine, app: Address, input_index: u64) -> CallOutcome {
        let meta = BlockMetadata::new(DEFAULT_RELAY_ADDRESS, input_index, 100 + input_index, 1_700_000_000);
        engine.advance(meta, app.as_bytes())
    }

    fn all(engine: &TestEngine) -> Vec<rd_03_output_index::prelude::IndexEntry> {
        engine.index().query(&IndexFilter::default()).unwrap().entries
    }

    // =========================================================================
    // RECORDING
    // =========================================================================

    #[test]
    fn test_input_and_notice_are_recorded() {
        let mut engine = indexed_wallet();
        assert!(send(&mut engine, "wallet", "deposit", &deposit(5, "a"), meta(USER, 0)).is_accepted());

        let entries = all(&engine);
        assert_eq!(entries.len(), 2);
        let input = &entries[0];
        assert_eq!(input.kind, OutputKind::Input);
        assert_eq!(input.class_name, "Deposit");
        assert_eq!(input.value, Some(U256::from(5u64)));
        assert_eq!(input.output_index, None);

        let notice = &entries[1];
        assert_eq!(notice.kind, OutputKind::Notice);
        assert_eq!(notice.output_index, Some(0));
        assert!(notice.tags.contains("credit"));
        assert_eq!(notice.msg_sender, Address::from_low_u64(USER));
        assert_eq!(notice.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_outputs_without_explicit_input_still_index_the_input() {
        let mut engine = indexed_wallet();
        assert!(send(&mut engine, "wallet", "ping", &Payload::new(), meta(USER, 0)).is_accepted());
        let kinds: Vec<OutputKind> = all(&engine).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![OutputKind::Report, OutputKind::Input]);
    }

    #[test]
    fn test_second_input_index_fails_the_call() {
        let mut engine = indexed_wallet();
        let outcome = send(&mut engine, "wallet", "deposit", &deposit(5, "twice"), meta(USER, 0));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ContextMisuse));

        // Only the error report survives the rollback.
        let entries = all(&engine);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].class_name, "error");
        assert!(entries[0].tags.contains("error"));
    }

    #[test]
    fn test_handler_error_is_indexed_under_error_tag() {
        let mut engine = indexed_wallet();
        send(&mut engine, "wallet", "deposit", &deposit(1, "ok"), meta(USER, 0));
        send(&mut engine, "wallet", "fail", &Payload::new(), meta(USER, 1));

        let filter = IndexFilter {
            tags: vec!["error".into()],
            ..IndexFilter::default()
        };
        let page = engine.index().query(&filter).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].input_index, 1);
        assert_eq!(page.entries[0].kind, OutputKind::Report);
    }

    // =========================================================================
    // APPLICATION CONTRACT
    // =========================================================================

    #[test]
    fn test_relay_backfills_earlier_entries() {
        let mut engine = indexed_wallet();
        let app = Address::from_low_u64(APP);

        send(&mut engine, "wallet", "deposit", &deposit(5, "before"), meta(USER, 0));
        assert!(all(&engine).iter().all(|e| e.app_contract.is_none()));

        assert!(relay(&mut engine, app, 1).is_accepted());
        assert_eq!(engine.app_contract(), Some(app));
        assert!(all(&engine).iter().all(|e| e.app_contract == Some(app)));

        send(&mut engine, "wallet", "deposit", &deposit(6, "after"), meta(USER, 2));
        let filter = IndexFilter {
            app_contract: Some(app),
            ..IndexFilter::default()
        };
        assert_eq!(engine.index().query(&filter).unwrap().total, 4);
    }

    #[test]
    fn test_relay_accepts_only_once_and_only_from_relay() {
        let mut engine = indexed_wallet();
        let app = Address::from_low_u64(APP);

        // Wrong caller: no route for header-less bytes.
        let outcome = engine.advance(meta(USER, 0), app.as_bytes());
        assert_eq!(outcome, CallOutcome::Rejected);
        assert_eq!(engine.app_contract(), None);

        assert!(relay(&mut engine, app, 1).is_accepted());
        assert_eq!(relay(&mut engine, Address::from_low_u64(1), 2), CallOutcome::Rejected);
        assert_eq!(engine.app_contract(), Some(app));
    }

    #[test]
    fn test_metadata_supplies_app_contract() {
        let mut engine = indexed_wallet();
        let app = Address::from_low_u64(APP);
        send(
            &mut engine,
            "wallet",
            "deposit",
            &deposit(1, "m"),
            meta(USER, 0).with_app_contract(app),
        );
        assert_eq!(engine.app_contract(), Some(app));
        assert!(all(&engine).iter().all(|e| e.app_contract == Some(app)));
    }

    #[test]
    fn test_index_and_app_contract_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("app.db");
        let index = dir.path().join("app.index");
        let app = Address::from_low_u64(APP);

        let build = || {
            wallet_routes(DispatchEngine::builder(indexed_config()))
                .unwrap()
                .build(
                    FileBackedKVStore::open(&state).unwrap(),
                    FileBackedIndexStore::open(&index).unwrap(),
                    RecordingRollup::new(),
                )
                .unwrap()
        };

        {
            let mut engine = build();
            let input = engine
                .encode_mutation_input("wallet", "deposit", None, &deposit(5, "before"))
                .unwrap();
            assert!(engine.advance(meta(USER, 0), &input).is_accepted());
            let relay_meta = BlockMetadata::new(DEFAULT_RELAY_ADDRESS, 1, 101, 1_700_000_001);
            assert!(engine.advance(relay_meta, app.as_bytes()).is_accepted());
        }

        let mut engine = build();
        assert_eq!(engine.app_contract(), Some(app));
        let page = engine.index().query(&IndexFilter::default()).unwrap();
        assert_eq!(page.total, 2);
        assert!(page.entries.iter().all(|e| e.app_contract == Some(app)));

        let relay_meta = BlockMetadata::new(DEFAULT_RELAY_ADDRESS, 2, 102, 1_700_000_002);
        assert_eq!(
            engine.advance(relay_meta, Address::from_low_u64(1).as_bytes()),
            CallOutcome::Rejected
        );
        assert_eq!(engine.app_contract(), Some(app));
    }

    // =========================================================================
    // INDEXER QUERY
    // =========================================================================

    fn indexer(engine: &mut TestEngine, params: Value) -> Value {
        let request = json!({"method": "indexer_indexer_query", "params": params});
        assert!(engine.inspect(request.to_string().as_bytes()).is_accepted());
        serde_json::from_slice(engine.rollup().last_report().unwrap()).unwrap()
    }

    #[test]
    fn test_indexer_query_filters_and_pages() {
        let mut engine = indexed_wallet();
        for i in 0..4 {
            send(&mut engine, "wallet", "deposit", &deposit(i + 1, "d"), meta(USER, i));
        }
        send(&mut engine, "wallet", "ping", &Payload::new(), meta(0xbeef, 4));

        let body = indexer(&mut engine, json!({"type": "notice", "tags": ["deposit"]}));
        assert_eq!(body["total"], 4);
        assert_eq!(body["data"].as_array().unwrap().len(), 4);
        assert_eq!(body["data"][0]["type"], "notice");

        let body = indexer(
            &mut engine,
            json!({
                "type": "notice",
                "order_by": "input_index",
                "order_dir": "desc",
                "page": 2,
                "page_size": 3,
            }),
        );
        assert_eq!(body["total"], 4);
        assert_eq!(body["page"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["input_index"], 0);

        let body = indexer(
            &mut engine,
            json!({"msg_sender": Address::from_low_u64(0xbeef).to_hex()}),
        );
        assert_eq!(body["total"], 2);

        let body = indexer(&mut engine, json!({"input_index_gte": 1, "input_index_lte": 2, "type": "input"}));
        assert_eq!(body["total"], 2);
    }

    #[test]
    fn test_indexer_query_rejects_bad_order_field() {
        let mut engine = indexed_wallet();
        let request = json!({"method": "indexer_indexer_query", "params": {"order_by": "colour"}});
        let outcome = engine.inspect(request.to_string().as_bytes());
        assert!(!outcome.is_accepted());
        assert!(engine.rollup().last_report_text().unwrap().contains("colour"));
    }

    #[test]
    fn test_indexer_absent_without_indexed_modules() {
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_mutation("wallet", "ping", None, RouteConfig::new(), |_, _| Ok(CallStatus::Accept))
        });
        let outcome = engine.inspect(br#"{"method":"indexer_indexer_query"}"#);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Decode));
    }
}
