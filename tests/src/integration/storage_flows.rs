//! # Storage Flows
//!
//! Commit-or-rollback of the per-call transaction, through both storage
//! adapters.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use rd_01_abi_codec::prelude::{AbiPayload, Payload};
    use rd_03_output_index::prelude::InMemoryIndexStore;
    use rd_04_dispatch::prelude::*;
    use shared_types::{Address, Transactional};

    /// Credits `amount`; rejects the call when `amount` is zero, after writing.
    fn wallet(b: DispatchEngineBuilder) -> Result<DispatchEngineBuilder, ConfigurationError> {
        b.register_typed_mutation::<Deposit, _>("wallet", "deposit", RouteConfig::new(), |call, d| {
            let owner = call.sender().unwrap_or(Address::ZERO);
            let key = balance_key(&owner);
            let current = call
                .storage()
                .get(&key)?
                .map(|v| u64::from_be_bytes(v.try_into().unwrap_or([0; 8])))
                .unwrap_or(0);
            call.storage().put(&key, &(current + d.amount).to_be_bytes())?;
            call.storage().put(b"last_memo", d.memo.as_bytes())?;
            if d.memo == "explode" {
                return Err(DispatchError::handler("exploded after writing"));
            }
            Ok(CallStatus::from(d.amount > 0))
        })?
        .register_query("wallet", "balance", None, RouteConfig::new(), |call, _| {
            let owner = Address::from_low_u64(USER);
            // Writes during inspect are discarded.
            call.storage().put(b"inspected", b"yes")?;
            let balance = call.storage().get(&balance_key(&owner))?.unwrap_or_default();
            call.report(balance)?;
            Ok(CallStatus::Accept)
        })
    }

    fn deposit(amount: u64, memo: &str) -> Payload {
        Deposit {
            amount,
            memo: memo.into(),
        }
        .to_payload()
    }

    fn balance<S: KeyValueStore>(store: &S) -> Option<u64> {
        store
            .get(&balance_key(&Address::from_low_u64(USER)))
            .unwrap()
            .map(|v| u64::from_be_bytes(v.try_into().unwrap()))
    }

    #[test]
    fn test_accept_makes_writes_visible() {
        let mut engine = engine_with(EngineConfig::default(), wallet);
        assert!(send(&mut engine, "wallet", "deposit", &deposit(5, "a"), meta(USER, 0)).is_accepted());
        assert!(send(&mut engine, "wallet", "deposit", &deposit(3, "b"), meta(USER, 1)).is_accepted());
        assert_eq!(balance(engine.store()), Some(8));
        assert_eq!(engine.store().get(b"last_memo").unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn test_reject_discards_writes() {
        let mut engine = engine_with(EngineConfig::default(), wallet);
        send(&mut engine, "wallet", "deposit", &deposit(5, "kept"), meta(USER, 0));
        let outcome = send(&mut engine, "wallet", "deposit", &deposit(0, "lost"), meta(USER, 1));
        assert_eq!(outcome, CallOutcome::Rejected);
        assert_eq!(balance(engine.store()), Some(5));
        assert_eq!(engine.store().get(b"last_memo").unwrap(), Some(b"kept".to_vec()));
        assert!(!engine.store().in_transaction());
    }

    #[test]
    fn test_handler_error_discards_writes() {
        let mut engine = engine_with(EngineConfig::default(), wallet);
        let outcome = send(&mut engine, "wallet", "deposit", &deposit(5, "explode"), meta(USER, 0));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Handler));
        assert_eq!(balance(engine.store()), None);
        assert_eq!(
            engine.rollup().last_report_text().as_deref(),
            Some("handler error: exploded after writing")
        );
    }

    #[test]
    fn test_inspect_reads_committed_state_and_persists_nothing() {
        let mut engine = engine_with(EngineConfig::default(), wallet);
        send(&mut engine, "wallet", "deposit", &deposit(9, "a"), meta(USER, 0));
        assert!(query(&mut engine, "wallet", "balance", &Payload::new()).is_accepted());
        assert_eq!(engine.rollup().last_report(), Some(&9u64.to_be_bytes()[..]));
        assert_eq!(engine.store().get(b"inspected").unwrap(), None);
    }

    #[test]
    fn test_file_backed_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("app.db");

        let build = |store: FileBackedKVStore| {
            wallet(DispatchEngine::builder(EngineConfig::default()))
                .unwrap()
                .build(store, InMemoryIndexStore::new(), RecordingRollup::new())
                .unwrap()
        };

        {
            let mut engine = build(FileBackedKVStore::open(&path).unwrap());
            let input = engine
                .encode_mutation_input("wallet", "deposit", None, &deposit(4, "first"))
                .unwrap();
            assert!(engine.advance(meta(USER, 0), &input).is_accepted());
            let input = engine
                .encode_mutation_input("wallet", "deposit", None, &deposit(0, "rejected"))
                .unwrap();
            assert_eq!(engine.advance(meta(USER, 1), &input), CallOutcome::Rejected);
        }
        assert!(path.exists());

        let engine = build(FileBackedKVStore::open(&path).unwrap());
        assert_eq!(balance(engine.store()), Some(4));
        assert_eq!(engine.store().get(b"last_memo").unwrap(), Some(b"first".to_vec()));
    }
}
