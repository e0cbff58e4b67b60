//! # Cross-Crate Integration Flows
//!
//! Each flow drives a full [`rd_04_dispatch::prelude::DispatchEngine`] over the
//! in-memory adapters, from raw input bytes to what reaches the rollup
//! channel and the output index.

pub mod fixtures;

mod index_flows;
mod output_flows;
mod query_flows;
mod routing_flows;
mod storage_flows;
