//! # MMTFKit Core Library
//!
//! Decoding of MMTF (Macromolecular Transmission Format) structures and
//! distance-based interaction search between a named chemical group and the
//! rest of a structure.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that each concern can be
//! tested on its own and called independently by an orchestration layer.
//!
//! - **[`core`]: The Foundation.** Stateless building blocks: the binary array
//!   codec (`run-length` and `recursive delta` schemes plus the MMTF strategy
//!   header), the metadata normalizer for entity and group records, the
//!   immutable parallel-array [`Structure`](core::models::structure::Structure),
//!   and MMTF container I/O.
//!
//! - **[`engine`]: The Logic Core.** Pure computations over a decoded
//!   structure. It holds the uniform `SpatialGrid` and the lazy
//!   `find_interactions` search, along with its configuration and progress
//!   reporting.
//!
//! - **[`workflows`]: The Public API.** Batch procedures that decode many
//!   structures, run the search on each, and materialize the interaction rows
//!   as a tabular dataset.

pub mod core;
pub mod engine;
pub mod workflows;
