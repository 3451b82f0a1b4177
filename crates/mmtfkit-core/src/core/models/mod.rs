//! # Core Models Module
//!
//! The decoded in-memory structure and the pieces used to build it.
//!
//! ## Overview
//!
//! A [`Structure`](structure::Structure) stores atoms, groups, chains and
//! models as parallel arrays addressed by integer index, mirroring the layout
//! of the MMTF encoding. Atoms reference their group by index, groups
//! reference their chain by index, and chains reference their model by index.
//! There is no object graph and no back-reference into the source buffer.
//!
//! A structure is immutable once built. Read access goes through lightweight
//! borrowed views:
//!
//! - [`atom`] - [`Atom`](atom::Atom) view and the [`AtomSite`](atom::AtomSite) input type
//! - [`group`] - [`Group`](group::Group) view of one residue instance
//! - [`chain`] - [`Chain`](chain::Chain) view of one molecular strand
//! - [`structure`] - The [`Structure`](structure::Structure) itself
//! - [`builder`] - Assembly from decoded arrays, and incremental construction
//!
//! ## Usage
//!
//! ```ignore
//! use mmtfkit::core::models::builder::StructureBuilder;
//! use mmtfkit::core::models::atom::AtomSite;
//! use mmtfkit::core::metadata::GroupRecord;
//!
//! let mut builder = StructureBuilder::new();
//! builder.start_chain("A", "A");
//! builder.start_group(GroupRecord::new("ZN", "NON-POLYMER", '?', &[("ZN", "Zn")]), 401, '\0');
//! builder.add_atom(AtomSite::at(0.0, 0.0, 0.0));
//! let structure = builder.build("1ABC")?;
//! ```

pub mod atom;
pub mod builder;
pub mod chain;
pub mod group;
pub mod structure;
