//! # Routing Flows
//!
//! Registration rules and how advance inputs find their route:
//!
//! 1. Duplicate final route keys are rejected at wiring time
//! 2. Header routes are selected by `keccak256("module.method(types)")[0..4]`
//! 3. Header-less routes are selected by caller
//! 4. Proxy routes take the effective caller from the payload

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use rd_01_abi_codec::prelude::{selector, AbiPayload, AbiType, Payload, PayloadDescriptor};
    use rd_03_output_index::prelude::InMemoryIndexStore;
    use rd_04_dispatch::prelude::*;
    use shared_types::Address;

    fn accept(_: &mut Call<'_>, _: Option<Payload>) -> Result<CallStatus, DispatchError> {
        Ok(CallStatus::Accept)
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    #[test]
    fn test_duplicate_route_key_is_configuration_error() {
        let result = DispatchEngine::builder(EngineConfig::default())
            .register_mutation("wallet", "deposit", None, RouteConfig::new(), accept)
            .and_then(|b| b.register_mutation("wallet", "deposit", None, RouteConfig::new(), accept));
        assert!(matches!(result, Err(ConfigurationError::DuplicateRoute(r)) if r == "wallet.deposit"));
    }

    #[test]
    fn test_duplicate_after_module_override() {
        let result = DispatchEngine::builder(EngineConfig::default())
            .register_query("wallet", "balance", None, RouteConfig::new(), accept)
            .and_then(|b| {
                b.register_query(
                    "legacy",
                    "balance",
                    None,
                    RouteConfig::new().module_name("wallet"),
                    accept,
                )
            });
        assert!(matches!(result, Err(ConfigurationError::DuplicateRoute(_))));
    }

    #[test]
    fn test_disjoint_routes_register() {
        let engine = engine_with(EngineConfig::default(), |b| {
            b.register_mutation("wallet", "deposit", None, RouteConfig::new(), accept)?
                .register_mutation("wallet", "withdraw", None, RouteConfig::new(), accept)?
                .register_query("wallet", "balance", None, RouteConfig::new(), accept)
        });
        assert_eq!(engine.routes().len(), 3);
    }

    #[test]
    fn test_wiring_errors_surface_at_build() {
        let packed_string = PayloadDescriptor::new("Memo")
            .with_field("a", AbiType::String)
            .with_field("b", AbiType::String);
        let err = DispatchEngine::builder(EngineConfig::default())
            .register_mutation("m", "f", Some(packed_string), RouteConfig::new().packed(), accept)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NotPackable(_)));

        let err = DispatchEngine::builder(EngineConfig::default())
            .register_mutation("m", "f", None, RouteConfig::new().splittable_output(), accept)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::SplittableMutation(_)));

        let err = DispatchEngine::builder(EngineConfig::default())
            .register_query(
                "m",
                "q",
                Some(Deposit::descriptor()),
                RouteConfig::new().path_params(["owner"]),
                accept,
            )
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownPathParam { .. }));
    }

    #[test]
    fn test_routes_describe_wire_identity() {
        let engine = engine_with(EngineConfig::default(), |b| {
            b.register_typed_mutation::<Transfer, _>("wallet", "transfer", RouteConfig::new(), |_, _| {
                Ok(CallStatus::Accept)
            })?
            .register_query(
                "wallet",
                "balance",
                Some(PayloadDescriptor::new("Owner").with_field("owner", AbiType::Address)),
                RouteConfig::new().path_params(["owner"]),
                accept,
            )
        });
        let routes = engine.routes();
        assert_eq!(
            routes[0].identity,
            RouteIdentity::Selector(selector("wallet.transfer(address,uint256)"))
        );
        assert_eq!(
            routes[1].identity,
            RouteIdentity::Query {
                url: "wallet/balance/{owner}".into(),
                method: "wallet_balance".into(),
            }
        );
    }

    // =========================================================================
    // ADVANCE ROUTING
    // =========================================================================

    #[test]
    fn test_typed_mutation_receives_decoded_payload() {
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_typed_mutation::<Deposit, _>("wallet", "deposit", RouteConfig::new(), |call, d| {
                let owner = call.sender().unwrap_or(Address::ZERO);
                call.storage().put(&balance_key(&owner), &d.amount.to_be_bytes())?;
                call.notice(d.memo)?;
                Ok(CallStatus::Accept)
            })
        });
        let deposit = Deposit {
            amount: 42,
            memo: "salary".into(),
        };
        let outcome = send(&mut engine, "wallet", "deposit", &deposit.to_payload(), meta(USER, 0));
        assert_eq!(outcome, CallOutcome::Accepted);
        assert_eq!(engine.rollup().notices, vec![b"salary".to_vec()]);
        let stored = engine
            .store()
            .get(&balance_key(&Address::from_low_u64(USER)))
            .unwrap();
        assert_eq!(stored, Some(42u64.to_be_bytes().to_vec()));
    }

    #[test]
    fn test_headerless_route_selected_by_caller() {
        let portal = Address::from_low_u64(0xb0b);
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_mutation(
                "portal",
                "deposit_ether",
                Some(
                    PayloadDescriptor::new("EtherDeposit")
                        .with_field("sender", AbiType::Address)
                        .with_field("value", AbiType::UINT256),
                ),
                RouteConfig::new().no_header().packed().msg_sender(portal),
                |call, payload| {
                    let payload = payload.unwrap_or_default();
                    let sender = payload.get_address("sender")?;
                    call.notice(sender.to_hex())?;
                    Ok(CallStatus::Accept)
                },
            )
        });

        let depositor = Address::from_low_u64(0xd0d0);
        let mut input = depositor.as_bytes().to_vec();
        input.extend_from_slice(&[0u8; 31]);
        input.push(5);

        assert!(engine.advance(meta(0xb0b, 0), &input).is_accepted());
        // Same bytes from another caller match no route.
        assert_eq!(engine.advance(meta(USER, 1), &input), CallOutcome::Rejected);
        assert_eq!(engine.rollup().notices.len(), 1);
    }

    #[test]
    fn test_caller_filter_rejects_other_senders() {
        let admin = Address::from_low_u64(0xad);
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_mutation("admin", "pause", None, RouteConfig::new().msg_sender(admin), accept)
        });
        let input = engine
            .encode_mutation_input("admin", "pause", None, &Payload::new())
            .unwrap();
        assert_eq!(input.len(), 4);
        assert_eq!(engine.advance(meta(USER, 0), &input), CallOutcome::Rejected);
        assert_eq!(engine.advance(meta(0xad, 1), &input), CallOutcome::Accepted);
    }

    #[test]
    fn test_proxy_overrides_sender() {
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_typed_mutation::<Deposit, _>("wallet", "deposit_for", RouteConfig::new().proxy(), |call, d| {
                let owner = call.sender().unwrap_or(Address::ZERO);
                call.storage().put(&balance_key(&owner), &d.amount.to_be_bytes())?;
                Ok(CallStatus::Accept)
            })
        });
        let beneficiary = Address::from_low_u64(0xbe);
        let deposit = Deposit {
            amount: 7,
            memo: String::new(),
        };
        let input = engine
            .encode_mutation_input("wallet", "deposit_for", Some(beneficiary), &deposit.to_payload())
            .unwrap();
        assert!(engine.advance(meta(USER, 0), &input).is_accepted());
        assert!(engine.store().get(&balance_key(&beneficiary)).unwrap().is_some());
        assert!(engine
            .store()
            .get(&balance_key(&Address::from_low_u64(USER)))
            .unwrap()
            .is_none());

        // Too short to carry the proxy address.
        let outcome = engine.advance(meta(USER, 1), &input[..12]);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Decode));
    }

    #[test]
    fn test_unknown_module_settings_fail_build() {
        let result = DispatchEngine::builder(EngineConfig::default().with_module(ModuleSettings::new("ghost")))
            .register_mutation("wallet", "deposit", None, RouteConfig::new(), accept)
            .unwrap()
            .build(InMemoryKVStore::new(), InMemoryIndexStore::new(), RecordingRollup::new());
        assert!(matches!(result, Err(ConfigurationError::UnknownModuleSettings(_))));
    }
}
