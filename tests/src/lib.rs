//! # Portal History Test Suite
//!
//! Unified test crate for flows that cross component boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── epoch_flow.rs     # Header admission across a full 8192-header epoch
//!     ├── body_flow.rs      # Block bodies with local, fetched and missing headers
//!     ├── gossip_flow.rs    # Pulse-batched offers through the offer driver
//!     ├── proof_flow.rs     # Inclusion proofs served and verified between nodes
//!     ├── keys.rs           # Content key wire formats
//!     └── telemetry_flow.rs # Prometheus counters across a flow
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p history-tests
//!
//! # By flow
//! cargo test -p history-tests integration::gossip_flow::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
