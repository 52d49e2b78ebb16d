//! # Conveyor Test Suite
//!
//! Unified test crate for cross-crate flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # End-to-end security + registry choreography
//!     ├── security_flows.rs
//!     └── trust_policy.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p conveyor-tests
//!
//! # By category
//! cargo test -p conveyor-tests integration::
//! ```

#![allow(dead_code)]

pub mod integration;
