//! # Output Flows
//!
//! Size rules and encodings of reports, notices and vouchers as they reach
//! the rollup channel.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use primitive_types::U256;
    use rd_01_abi_codec::prelude::{selector, AbiPayload, AbiType, Payload, PayloadDescriptor};
    use rd_04_dispatch::prelude::*;
    use shared_types::{Address, OutputFormat, MAX_OUTPUT_SIZE};

    /// Emits `size` bytes of `0x5a`, `count` times, as reports.
    fn reporter(size: usize, count: usize) -> impl Fn(&mut Call<'_>, Option<Payload>) -> Result<CallStatus, DispatchError> {
        move |call, _| {
            for _ in 0..count {
                call.report(vec![0x5a; size])?;
            }
            Ok(CallStatus::Accept)
        }
    }

    fn report_engine(size: usize, count: usize) -> TestEngine {
        engine_with(EngineConfig::default(), |b| {
            b.register_mutation("blob", "emit", None, RouteConfig::new(), reporter(size, count))?
                .register_query("blob", "read", None, RouteConfig::new(), reporter(size, count))
        })
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    #[test]
    fn test_advance_report_just_over_limit_makes_two_frames() {
        let mut engine = report_engine(MAX_OUTPUT_SIZE + 1, 1);
        assert!(send(&mut engine, "blob", "emit", &Payload::new(), meta(USER, 0)).is_accepted());
        let reports = &engine.rollup().reports;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].len(), MAX_OUTPUT_SIZE);
        assert_eq!(reports[1].len(), 1);
        assert_eq!(reports.concat(), vec![0x5a; MAX_OUTPUT_SIZE + 1]);
    }

    #[test]
    fn test_advance_report_of_three_frames() {
        let mut engine = report_engine(3 * MAX_OUTPUT_SIZE, 1);
        assert!(send(&mut engine, "blob", "emit", &Payload::new(), meta(USER, 0)).is_accepted());
        let reports = &engine.rollup().reports;
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.len() == MAX_OUTPUT_SIZE));
    }

    #[test]
    fn test_two_reports_in_advance_are_independent() {
        let mut engine = report_engine(10, 2);
        assert!(send(&mut engine, "blob", "emit", &Payload::new(), meta(USER, 0)).is_accepted());
        assert_eq!(engine.rollup().reports, vec![vec![0x5a; 10], vec![0x5a; 10]]);
        assert_eq!(engine.stats().reports, 2);
    }

    #[test]
    fn test_second_report_in_inspect_fails() {
        let mut engine = report_engine(10, 2);
        let outcome = query(&mut engine, "blob", "read", &Payload::new());
        assert_eq!(outcome.error_kind(), Some(ErrorKind::SizeLimit));
        // The first report went out; no diagnostic is added after it.
        assert_eq!(engine.rollup().reports, vec![vec![0x5a; 10]]);
    }

    #[test]
    fn test_oversized_inspect_report_is_truncated() {
        let mut engine = report_engine(5 * MAX_OUTPUT_SIZE, 1);
        assert!(query(&mut engine, "blob", "read", &Payload::new()).is_accepted());
        let total: usize = engine.rollup().reports.iter().map(Vec::len).sum();
        assert_eq!(total, shared_types::MAX_AGGREGATED_OUTPUT_SIZE);
        assert_eq!(engine.rollup().reports.len(), 4);
    }

    #[test]
    fn test_model_report_formats() {
        let config = EngineConfig::default()
            .with_module(ModuleSettings::new("abi").report_format(OutputFormat::Abi))
            .with_module(ModuleSettings::new("json").report_format(OutputFormat::Json));
        let transfer = Transfer {
            to: Address::from_low_u64(0x1234),
            amount: U256::from(1000u64),
        };
        let t1 = transfer.clone();
        let t2 = transfer.clone();
        let mut engine = engine_with(config, move |b| {
            b.register_mutation("abi", "emit", None, RouteConfig::new(), move |call, _| {
                call.report(OutputData::model(&t1))?;
                Ok(CallStatus::Accept)
            })?
            .register_mutation("json", "emit", None, RouteConfig::new(), move |call, _| {
                call.report(OutputData::model(&t2))?;
                Ok(CallStatus::Accept)
            })
        });
        send(&mut engine, "abi", "emit", &Payload::new(), meta(USER, 0));
        send(&mut engine, "json", "emit", &Payload::new(), meta(USER, 1));

        let reports = &engine.rollup().reports;
        assert_eq!(reports[0], transfer.abi_encode().unwrap());
        let json: serde_json::Value = serde_json::from_slice(&reports[1]).unwrap();
        assert_eq!(json["to"], Address::from_low_u64(0x1234).to_hex());
    }

    // =========================================================================
    // NOTICES
    // =========================================================================

    #[test]
    fn test_oversized_notice_is_never_sent() {
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_mutation("blob", "notify", None, RouteConfig::new(), |call, _| {
                call.notice(vec![1u8; MAX_OUTPUT_SIZE + 1])?;
                Ok(CallStatus::Accept)
            })
        });
        let outcome = send(&mut engine, "blob", "notify", &Payload::new(), meta(USER, 0));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::SizeLimit));
        assert!(engine.rollup().notices.is_empty());
        // One diagnostic report.
        assert_eq!(engine.rollup().reports.len(), 1);
    }

    #[test]
    fn test_notice_at_limit_is_sent() {
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_mutation("blob", "notify", None, RouteConfig::new(), |call, _| {
                call.notice(vec![1u8; MAX_OUTPUT_SIZE])?;
                Ok(CallStatus::Accept)
            })
        });
        assert!(send(&mut engine, "blob", "notify", &Payload::new(), meta(USER, 0)).is_accepted());
        assert_eq!(engine.rollup().notices[0].len(), MAX_OUTPUT_SIZE);
    }

    #[test]
    fn test_notice_during_inspect_is_context_misuse() {
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_query("blob", "peek", None, RouteConfig::new(), |call, _| {
                call.notice("nope")?;
                Ok(CallStatus::Accept)
            })
        });
        let outcome = query(&mut engine, "blob", "peek", &Payload::new());
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ContextMisuse));
        assert!(engine.rollup().notices.is_empty());
    }

    #[test]
    fn test_notice_header_prefixes_model_selector() {
        let config =
            EngineConfig::default().with_module(ModuleSettings::new("wallet").notice_header());
        let transfer = Transfer {
            to: Address::from_low_u64(1),
            amount: U256::from(2u64),
        };
        let emitted = transfer.clone();
        let mut engine = engine_with(config, move |b| {
            b.register_mutation("wallet", "settle", None, RouteConfig::new(), move |call, _| {
                call.notice(OutputData::model(&emitted))?;
                Ok(CallStatus::Accept)
            })
        });
        send(&mut engine, "wallet", "settle", &Payload::new(), meta(USER, 0));

        let notice = &engine.rollup().notices[0];
        assert_eq!(&notice[..4], &selector("Transfer(address,uint256)"));
        assert_eq!(&notice[4..], transfer.abi_encode().unwrap().as_slice());
    }

    // =========================================================================
    // VOUCHERS
    // =========================================================================

    #[test]
    fn test_voucher_call_data_is_bit_exact() {
        let token = Address::from_low_u64(0x70c3);
        let mut engine = engine_with(EngineConfig::default(), move |b| {
            b.register_mutation("wallet", "withdraw", None, RouteConfig::new(), move |call, _| {
                let args = Transfer {
                    to: Address::from_low_u64(0x1234),
                    amount: U256::from(1000u64),
                };
                call.voucher(token, Some("transfer"), &args, U256::zero())?;
                Ok(CallStatus::Accept)
            })
        });
        assert!(send(&mut engine, "wallet", "withdraw", &Payload::new(), meta(USER, 0)).is_accepted());

        let voucher = &engine.rollup().vouchers[0];
        assert_eq!(voucher.destination, token);
        let expected = concat!(
            "a9059cbb",
            "0000000000000000000000000000000000000000000000000000000000001234",
            "00000000000000000000000000000000000000000000000000000000000003e8",
        );
        assert_eq!(hex::encode(&voucher.payload), expected);
    }

    #[test]
    fn test_voucher_value_is_not_hashed() {
        let descriptor = PayloadDescriptor::new("withdrawEther")
            .with_field("receiver", AbiType::Address)
            .with_field("amount", AbiType::UINT256);
        let args = Payload::new()
            .with("receiver", Address::from_low_u64(9))
            .with("amount", 5u64);
        let mut engine = engine_with(EngineConfig::default(), move |b| {
            b.register_mutation("wallet", "eth", None, RouteConfig::new(), move |call, _| {
                call.voucher_with(Address::ZERO, None, &descriptor, &args, U256::from(5u64), &["eth"])?;
                Ok(CallStatus::Accept)
            })
        });
        send(&mut engine, "wallet", "eth", &Payload::new(), meta(USER, 0));
        let voucher = &engine.rollup().vouchers[0];
        assert_eq!(voucher.value, U256::from(5u64));
        assert_eq!(&voucher.payload[..4], &selector("withdrawEther(address,uint256)"));
        assert_eq!(voucher.payload.len(), 4 + 64);
    }

    #[test]
    fn test_voucher_during_inspect_is_rejected() {
        let mut engine = engine_with(EngineConfig::default(), |b| {
            b.register_query("wallet", "peek", None, RouteConfig::new(), |call, _| {
                let args = Transfer {
                    to: Address::ZERO,
                    amount: U256::one(),
                };
                call.voucher(Address::ZERO, Some("transfer"), &args, U256::zero())?;
                Ok(CallStatus::Accept)
            })
        });
        let outcome = query(&mut engine, "wallet", "peek", &Payload::new());
        assert_eq!(outcome.error_kind(), Some(ErrorKind::ContextMisuse));
        assert!(engine.rollup().vouchers.is_empty());
    }

    // =========================================================================
    // DISABLED MODULES
    // =========================================================================

    #[test]
    fn test_disabled_module_drops_outputs_but_commits() {
        let config = EngineConfig::default().with_module(ModuleSettings::new("quiet").disabled());
        let mut engine = engine_with(config, |b| {
            b.register_mutation("quiet", "work", None, RouteConfig::new(), |call, _| {
                call.storage().put(b"done", b"1")?;
                call.report("r")?;
                call.notice("n")?;
                Ok(CallStatus::Accept)
            })
        });
        assert!(send(&mut engine, "quiet", "work", &Payload::new(), meta(USER, 0)).is_accepted());
        assert!(engine.rollup().reports.is_empty());
        assert!(engine.rollup().notices.is_empty());
        assert_eq!(engine.stats().dropped_outputs, 2);
        assert_eq!(engine.store().get(b"done").unwrap(), Some(b"1".to_vec()));
    }
}
