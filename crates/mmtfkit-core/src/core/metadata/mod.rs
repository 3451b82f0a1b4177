//! Normalization of byte-keyed metadata records.
//!
//! MMTF stores per-entity and per-group metadata as MessagePack maps whose keys
//! (and some values) may arrive as raw byte strings. This module turns such a
//! map into a schema-typed [`EntityRecord`] or [`GroupRecord`].
//!
//! Which fields are decoded, and how, is fixed by the static [`ENTITY_FIELDS`]
//! and [`GROUP_FIELDS`] tables. Keys not listed there are passed through with
//! only the key itself decoded to text.

pub mod entity;
pub mod group;
pub mod value;

use crate::core::error::ValidationError;
use phf::phf_map;
use std::collections::BTreeMap;

pub use entity::{EntityRecord, normalize_entity};
pub use group::{GroupRecord, normalize_group};
pub use value::{RawRecord, RawValue};

/// How a designated metadata field is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// A single byte string decoded to text.
    Text,
    /// A list of byte strings decoded element-wise, order preserved.
    TextList,
    /// Kept as-is.
    PassThrough,
}

pub static ENTITY_FIELDS: phf::Map<&'static str, FieldRule> = phf_map! {
    "description" => FieldRule::Text,
    "type" => FieldRule::Text,
    "sequence" => FieldRule::Text,
};

pub static GROUP_FIELDS: phf::Map<&'static str, FieldRule> = phf_map! {
    "elementList" => FieldRule::TextList,
    "atomNameList" => FieldRule::TextList,
    "chemCompType" => FieldRule::Text,
    "groupName" => FieldRule::Text,
    "singleLetterCode" => FieldRule::Text,
};

/// A record after key decoding and per-field rule application.
#[derive(Debug, Default)]
pub(crate) struct NormalizedFields {
    pub(crate) text: BTreeMap<String, String>,
    pub(crate) text_lists: BTreeMap<String, Vec<String>>,
    pub(crate) extra: BTreeMap<String, RawValue>,
}

pub(crate) fn normalize_fields(
    raw: &RawRecord,
    table: &phf::Map<&'static str, FieldRule>,
) -> Result<NormalizedFields, ValidationError> {
    let mut fields = NormalizedFields::default();
    for (key_bytes, value) in raw {
        let key = String::from_utf8(key_bytes.clone()).map_err(|_| ValidationError::InvalidText {
            field: String::from_utf8_lossy(key_bytes).into_owned(),
        })?;
        match table.get(key.as_str()).copied().unwrap_or(FieldRule::PassThrough) {
            FieldRule::Text => {
                let text = value.to_text(&key)?;
                fields.text.insert(key, text);
            }
            FieldRule::TextList => {
                let list = value.to_text_list(&key)?;
                fields.text_lists.insert(key, list);
            }
            FieldRule::PassThrough => {
                fields.extra.insert(key, value.clone());
            }
        }
    }
    Ok(fields)
}
