//! # Knowledge-Base Test Suite
//!
//! Cross-crate scenarios that need more than one crate in scope.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── dispatch.rs          # catalog validation, snapshots, ordering, sync isolation
//! │   ├── delivery.rs          # worker pool: deadlines, backpressure, shutdown
//! │   ├── choreography.rs      # full runtime: modules reacting to each other's events
//! │   └── isolation_check.rs   # checker against fixtures and the runtime's own modules
//! └── benches/
//!     └── dispatch.rs          # dispatch overhead, handler bodies excluded
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p kb-tests
//!
//! # By area
//! cargo test -p kb-tests integration::delivery::
//!
//! # Benchmarks
//! cargo bench -p kb-tests
//! ```

#![allow(dead_code)]

pub mod integration;
