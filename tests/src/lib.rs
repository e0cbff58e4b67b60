//! # Rollup Dispatch Test Suite
//!
//! Cross-crate integration flows and benchmarks.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── dispatch_benchmarks.rs   # codec and dispatch throughput
//! └── src/integration/
//!     ├── fixtures.rs              # wallet app, engine builders
//!     ├── routing_flows.rs         # registration and advance routing
//!     ├── query_flows.rs           # URL / JSON / JSON-RPC inspects
//!     ├── output_flows.rs          # report, notice, voucher rules
//!     ├── storage_flows.rs         # commit and rollback
//!     └── index_flows.rs           # indexing, relay, indexer query
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All flows
//! cargo test -p rd-tests
//!
//! # One flow
//! cargo test -p rd-tests integration::query_flows
//!
//! # Benchmarks
//! cargo bench -p rd-tests
//! ```

pub mod integration;
