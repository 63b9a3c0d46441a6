//! SQLCLR Deployment Testing Suite
//!
//! Runs the generated create/drop sequences against a simulated catalog, so
//! ordering and idempotence can be checked without a live SQL Server.
//!
//! # Architecture
//!
//! - **Fixtures**: sample modules, built in code or loaded from a manifest on disk
//! - **Simulated catalog**: tracks assemblies, CLR functions and the `clr enabled`
//!   option by interpreting the statement shapes `sqlclr-ddl` emits
//! - **Parameterized tests**: permission sets and guard variants run through rstest cases
//!
//! # Usage
//!
//! ```bash
//! cargo test -p sqlclr-tests
//!
//! # With statement logging
//! RUST_LOG=sqlclr_ddl=debug cargo test -p sqlclr-tests -- --nocapture
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core infrastructure
pub mod catalog;
pub mod fixtures;

#[cfg(test)]
pub mod catalog_tests;

#[cfg(test)]
pub mod lifecycle_tests;

#[cfg(test)]
pub mod guard_tests;

#[cfg(test)]
pub mod scenario_tests;
