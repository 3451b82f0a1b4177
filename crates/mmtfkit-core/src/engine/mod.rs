//! # Engine Module
//!
//! Distance-based interaction search over a decoded
//! [`Structure`](crate::core::models::structure::Structure).
//!
//! ## Overview
//!
//! Given a target chemical component identifier (for example `"ZN"` or
//! `"ATP"`) and a cutoff distance, the engine reports every pair of atoms from
//! different group instances that lie within the cutoff, where at least one
//! atom belongs to a target group. The search is a pure function of the
//! immutable structure, so it can run on many structures at once without
//! coordination.
//!
//! ## Architecture
//!
//! - **Spatial Indexing** ([`spatial`]) - Uniform cubic grid bounding each
//!   query to its 27 neighbouring cells
//! - **Interaction Search** ([`interactions`]) - The lazy
//!   [`find_interactions`](interactions::find_interactions) iterator and the
//!   flat [`InteractionRecord`](interactions::InteractionRecord) row
//! - **Configuration** ([`config`]) - Validated search parameters and their builder
//! - **Progress Monitoring** ([`progress`]) - Batch progress events for front ends
//! - **Error Handling** ([`error`]) - Engine-level error type

pub mod config;
pub mod error;
pub mod interactions;
pub mod progress;
pub mod spatial;
