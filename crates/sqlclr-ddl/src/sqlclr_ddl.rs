//! SQLCLR DDL - statement generation for externally hosted routines
//!
//! This crate turns a module description into the T-SQL needed to register
//! and unregister its routines:
//! - Mapping host value types to column types
//! - Projecting routine metadata onto SQL signatures
//! - Rendering CREATE/DROP ASSEMBLY and CREATE/DROP FUNCTION statements,
//!   existence guards and the `clr enabled` switch
//! - Assembling whole create/drop sequences and scripts

pub mod batch;
pub mod config;
pub mod signature;
pub mod statement;
pub mod type_map;

#[cfg(test)]
mod config_tests;

pub use batch::*;
pub use config::*;
pub use signature::*;
pub use statement::*;
pub use type_map::*;
