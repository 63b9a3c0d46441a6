//! Batch assembly
//!
//! Composes the statements of a whole module into create and drop
//! sequences, either as discrete statements or as one separated script.

mod assembler;


pub use assembler::*;
