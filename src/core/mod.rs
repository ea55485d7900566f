//! Core invoice types, builders and document arithmetic.
//!
//! The types follow the EN 16931 semantic model and are what the writers in
//! [`crate::xml`] read from. They are never mutated during serialization.

mod builder;
mod error;
mod totals;
mod types;

pub use builder::*;
pub use error::*;
pub use totals::*;
pub use types::*;
