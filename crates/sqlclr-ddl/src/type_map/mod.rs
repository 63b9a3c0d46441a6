//! Host type to column type mapping

mod table;


pub use table::*;
