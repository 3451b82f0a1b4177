//! Provides input/output for structure container formats.
//!
//! Reading turns a whole encoded file into an immutable
//! [`Structure`](crate::core::models::structure::Structure); writing encodes
//! one back. Both sides go through the [`StructureFile`](traits::StructureFile)
//! trait so callers can work with paths or arbitrary readers and writers.

pub mod mmtf;
mod msgpack;
pub mod traits;
