//! # Workflows Module
//!
//! High-level entry points that run the interaction search over many
//! structures and materialize the results as a tabular dataset.
//!
//! ## Overview
//!
//! A workflow decodes each input, applies the structure-level filters from its
//! configuration, runs the engine, and collects both the interaction rows and
//! a per-structure outcome. A malformed input never aborts the batch: it is
//! logged and recorded as failed, and the remaining structures are processed.
//!
//! - **Group Interactions** ([`interactions`]) - Interactions of a named
//!   chemical group within a cutoff distance, written as CSV
//! - **Secondary Structure Segments** ([`secondary_structure`]) - Per-chain
//!   DSSP annotation and fixed-length sequence windows labelled by their
//!   centre residue

pub mod interactions;
mod outcome;
pub mod secondary_structure;
