//! Core definitions relied upon by all strata-* crates: the error taxonomy
//! shared by every buffer operation and the `Result` alias built on it.

pub mod error;
pub mod result;

pub use result::Result;
