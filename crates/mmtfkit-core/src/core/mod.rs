//! # Core Module
//!
//! Stateless foundation of MMTFKit: everything needed to turn an encoded MMTF
//! byte buffer into an immutable in-memory structure, and back again.
//!
//! ## Architecture
//!
//! - **Binary Arrays** ([`codec`]) - Run-length, delta and recursive-index
//!   schemes, and the 12-byte MMTF strategy header that selects between them
//! - **Metadata** ([`metadata`]) - Normalization of byte-keyed entity and group
//!   records into schema-typed records
//! - **Molecular Representation** ([`models`]) - Parallel-array structure model
//!   with index-based atom, group, chain and entity access
//! - **File I/O** ([`io`]) - MessagePack container reading and writing with
//!   optional gzip compression
//! - **Errors** ([`error`]) - Decode and validation error taxonomy shared by
//!   every layer
//!
//! Every function in this module is a pure function of its inputs. Nothing
//! holds shared mutable state, so decoding different structures on different
//! threads needs no synchronization.

pub mod codec;
pub mod error;
pub mod io;
pub mod metadata;
pub mod models;
