//! Signature projection
//!
//! Projects routine metadata onto the parameter list and return shape that
//! SQL Server sees.

mod projector;

#[cfg(test)]
mod tests;

pub use projector::*;
