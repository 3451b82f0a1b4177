use super::value::{RawRecord, RawValue};
use super::{ENTITY_FIELDS, normalize_fields};
use crate::core::error::ValidationError;
use std::collections::BTreeMap;

/// A normalized entity record.
///
/// Designated text fields are decoded; everything else is kept in `extra`
/// under its decoded key. Absent designated fields are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRecord {
    pub description: Option<String>,
    pub entity_type: Option<String>,
    pub sequence: Option<String>,
    pub extra: BTreeMap<String, RawValue>,
}

impl EntityRecord {
    pub fn new(description: &str, entity_type: &str, sequence: &str, chains: &[usize]) -> Self {
        let mut extra = BTreeMap::new();
        extra.insert(
            "chainIndexList".to_string(),
            RawValue::Array(chains.iter().map(|&c| RawValue::Int(c as i64)).collect()),
        );
        Self {
            description: Some(description.to_string()),
            entity_type: Some(entity_type.to_string()),
            sequence: Some(sequence.to_string()),
            extra,
        }
    }

    pub fn description(&self) -> Result<&str, ValidationError> {
        self.description
            .as_deref()
            .ok_or(ValidationError::MissingField {
                record: "entity",
                field: "description",
            })
    }

    pub fn entity_type(&self) -> Result<&str, ValidationError> {
        self.entity_type
            .as_deref()
            .ok_or(ValidationError::MissingField {
                record: "entity",
                field: "type",
            })
    }

    pub fn sequence(&self) -> Result<&str, ValidationError> {
        self.sequence.as_deref().ok_or(ValidationError::MissingField {
            record: "entity",
            field: "sequence",
        })
    }

    /// Indices of the chains belonging to this entity.
    pub fn chain_indices(&self) -> Result<Vec<usize>, ValidationError> {
        let list = self
            .extra
            .get("chainIndexList")
            .ok_or(ValidationError::MissingField {
                record: "entity",
                field: "chainIndexList",
            })?
            .to_int_list("chainIndexList")?;
        list.into_iter()
            .map(|i| {
                usize::try_from(i).map_err(|_| ValidationError::UnexpectedType {
                    field: "chainIndexList".to_string(),
                    expected: "non-negative integers",
                })
            })
            .collect()
    }

    /// Re-encodes the record as a text-keyed map.
    pub fn to_raw(&self) -> RawValue {
        let designated = [
            ("description", &self.description),
            ("type", &self.entity_type),
            ("sequence", &self.sequence),
        ];
        let mut entries: Vec<(RawValue, RawValue)> = designated
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_ref()
                    .map(|v| (RawValue::Text(key.to_string()), RawValue::Text(v.clone())))
            })
            .collect();
        entries.extend(
            self.extra
                .iter()
                .map(|(k, v)| (RawValue::Text(k.clone()), v.clone())),
        );
        RawValue::Map(entries)
    }
}

/// Normalizes a raw entity map.
///
/// `description`, `type` and `sequence` are decoded to text; all other keys
/// pass through unchanged. Absent fields are simply omitted.
///
/// # Errors
///
/// Returns a [`ValidationError`] if a key or designated value is not valid
/// text.
pub fn normalize_entity(raw: &RawRecord) -> Result<EntityRecord, ValidationError> {
    let mut fields = normalize_fields(raw, &ENTITY_FIELDS)?;
    Ok(EntityRecord {
        description: fields.text.remove("description"),
        entity_type: fields.text.remove("type"),
        sequence: fields.text.remove("sequence"),
        extra: fields.extra,
    })
}
