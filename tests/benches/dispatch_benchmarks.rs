//! # Rollup Dispatch Benchmarks
//!
//! Throughput of the hot paths every input goes through:
//!
//! | Crate | Path | Target |
//! |-------|------|--------|
//! | rd-01 ABI Codec | tuple encode / decode | < 10μs per payload |
//! | rd-01 ABI Codec | selector derivation | < 2μs |
//! | rd-02 Query Codec | URL / JSON parse and bind | < 20μs |
//! | rd-04 Dispatch | advance with one notice | < 50μs |
//! | rd-04 Dispatch | 4 MiB report framing | < 5ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use primitive_types::U256;
use rd_01_abi_codec::prelude::{selector, AbiPayload, AbiType, AbiValue, Payload, PayloadDescriptor};
use rd_02_query_codec::prelude::{encode_json_query, UrlQuery};
use rd_04_dispatch::prelude::*;
use rd_tests::integration::fixtures::{engine_with, meta, Deposit, Transfer, USER};
use sha3::{Digest, Keccak256};
use shared_types::{Address, MAX_AGGREGATED_OUTPUT_SIZE};
use std::time::Duration;

// ============================================================================
// RD-01: ABI Codec
// ============================================================================

fn bench_abi_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("rd-01-abi-codec");
    group.measurement_time(Duration::from_secs(5));

    let transfer = Transfer {
        to: Address::from_low_u64(0x1234),
        amount: U256::from(1_000u64),
    };
    let encoded = transfer.abi_encode().unwrap_or_default();

    group.bench_function("encode_static_tuple", |b| {
        b.iter(|| black_box(transfer.abi_encode()))
    });
    group.bench_function("decode_static_tuple", |b| {
        b.iter(|| black_box(Transfer::abi_decode(&encoded)))
    });

    let descriptor = PayloadDescriptor::new("Batch")
        .with_field("owner", AbiType::Address)
        .with_field("memos", AbiType::array_of(AbiType::String));
    for size in [1usize, 16, 256] {
        let memos = (0..size)
            .map(|i| AbiValue::from(format!("memo-{i}").as_str()))
            .collect();
        let payload = Payload::new()
            .with("owner", Address::from_low_u64(1))
            .with("memos", AbiValue::Array(memos));
        let bytes = descriptor.encode(&payload).unwrap_or_default();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("encode_dynamic_array", size), &payload, |b, p| {
            b.iter(|| black_box(descriptor.encode(p)))
        });
        group.bench_with_input(BenchmarkId::new("decode_dynamic_array", size), &bytes, |b, raw| {
            b.iter(|| black_box(descriptor.decode(raw)))
        });
    }

    group.bench_function("selector", |b| {
        b.iter(|| black_box(selector(black_box("wallet.transfer(address,uint256)"))))
    });
    group.bench_function("keccak256_baseline", |b| {
        b.iter(|| black_box(Keccak256::digest(black_box(b"wallet.transfer(address,uint256)"))))
    });

    group.finish();
}

// ============================================================================
// RD-02: Query Codec
// ============================================================================

fn bench_query_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("rd-02-query-codec");

    let url = format!(
        "wallet/balance/{}?token={}&tags=a&tags=b&tags=c",
        Address::from_low_u64(0xab).to_hex(),
        Address::from_low_u64(0xcd).to_hex()
    );
    group.bench_function("url_parse", |b| {
        b.iter(|| black_box(UrlQuery::parse(black_box(url.as_bytes()))))
    });

    let deposit = Deposit {
        amount: 42,
        memo: "salary".into(),
    };
    group.bench_function("json_encode", |b| {
        b.iter(|| black_box(encode_json_query("wallet", "deposit", &deposit.to_payload())))
    });

    group.finish();
}

// ============================================================================
// RD-04: Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("rd-04-dispatch");
    group.measurement_time(Duration::from_secs(10));

    let mut engine = engine_with(EngineConfig::default(), |b| {
        b.register_typed_mutation::<Deposit, _>("wallet", "deposit", RouteConfig::new(), |call, d| {
            let key = d.memo.as_bytes().to_vec();
            call.storage().put(&key, &d.amount.to_be_bytes())?;
            call.notice(d.memo)?;
            Ok(CallStatus::Accept)
        })?
        .register_query("wallet", "dump", None, RouteConfig::new(), |call, _| {
            call.report(vec![0x5a; MAX_AGGREGATED_OUTPUT_SIZE])?;
            Ok(CallStatus::Accept)
        })
    });

    let input = engine
        .encode_mutation_input(
            "wallet",
            "deposit",
            None,
            &Deposit {
                amount: 7,
                memo: "bench".into(),
            }
            .to_payload(),
        )
        .unwrap_or_default();

    group.throughput(Throughput::Elements(1));
    group.bench_function("advance_with_notice", |b| {
        let mut index = 0u64;
        b.iter(|| {
            index += 1;
            let outcome = engine.advance(meta(USER, index), black_box(&input));
            engine.rollup_mut().clear();
            black_box(outcome)
        })
    });

    let query = br#"{"method":"wallet_dump"}"#;
    group.throughput(Throughput::Bytes(MAX_AGGREGATED_OUTPUT_SIZE as u64));
    group.bench_function("inspect_framed_report", |b| {
        b.iter(|| {
            let outcome = engine.inspect(black_box(query));
            engine.rollup_mut().clear();
            black_box(outcome)
        })
    });

    group.bench_function("unknown_selector", |b| {
        b.iter(|| black_box(engine.advance(meta(USER, 0), black_box(&[0xde, 0xad, 0xbe, 0xef]))))
    });

    group.finish();
}

criterion_group!(benches, bench_abi_codec, bench_query_codec, bench_dispatch);

criterion_main!(benches);
