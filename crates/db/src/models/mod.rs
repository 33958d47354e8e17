//! Row structs and row/aggregate mapping.
//!
//! Each submodule contains the `FromRow` structs matching database rows and
//! the pure functions converting between rows and `quire-core` types.

pub mod annotation;
pub mod campaign;
pub mod log_message;
