use super::value::{RawRecord, RawValue};
use super::{GROUP_FIELDS, normalize_fields};
use crate::core::error::ValidationError;
use std::collections::BTreeMap;

/// A normalized group (chemical component) record, shared by every group
/// instance of the same type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupRecord {
    pub group_name: Option<String>,
    pub chem_comp_type: Option<String>,
    pub single_letter_code: Option<String>,
    /// Empty when the raw record has no `atomNameList`.
    pub atom_name_list: Vec<String>,
    /// Empty when the raw record has no `elementList`.
    pub element_list: Vec<String>,
    pub extra: BTreeMap<String, RawValue>,
}

impl GroupRecord {
    /// Builds a record from `(atom name, element)` pairs.
    pub fn new(
        group_name: &str,
        chem_comp_type: &str,
        single_letter_code: char,
        atoms: &[(&str, &str)],
    ) -> Self {
        Self {
            group_name: Some(group_name.to_string()),
            chem_comp_type: Some(chem_comp_type.to_string()),
            single_letter_code: Some(single_letter_code.to_string()),
            atom_name_list: atoms.iter().map(|(name, _)| name.to_string()).collect(),
            element_list: atoms.iter().map(|(_, el)| el.to_string()).collect(),
            extra: BTreeMap::new(),
        }
    }

    pub fn group_name(&self) -> Result<&str, ValidationError> {
        self.group_name
            .as_deref()
            .ok_or(ValidationError::MissingField {
                record: "group",
                field: "groupName",
            })
    }

    /// The one-letter code, or `'?'` when absent or empty.
    pub fn single_letter(&self) -> char {
        self.single_letter_code
            .as_deref()
            .and_then(|s| s.chars().next())
            .unwrap_or('?')
    }

    pub fn atom_count(&self) -> usize {
        self.atom_name_list.len()
    }

    /// Re-encodes the record as a text-keyed map.
    pub fn to_raw(&self) -> RawValue {
        let text_list = |items: &[String]| {
            RawValue::Array(items.iter().map(|s| RawValue::Text(s.clone())).collect())
        };
        let mut entries = vec![
            (
                RawValue::Text("atomNameList".into()),
                text_list(&self.atom_name_list),
            ),
            (
                RawValue::Text("elementList".into()),
                text_list(&self.element_list),
            ),
        ];
        for (key, value) in [
            ("groupName", &self.group_name),
            ("chemCompType", &self.chem_comp_type),
            ("singleLetterCode", &self.single_letter_code),
        ] {
            if let Some(v) = value {
                entries.push((RawValue::Text(key.into()), RawValue::Text(v.clone())));
            }
        }
        entries.extend(
            self.extra
                .iter()
                .map(|(k, v)| (RawValue::Text(k.clone()), v.clone())),
        );
        RawValue::Map(entries)
    }
}

/// Normalizes a raw group map.
///
/// `elementList` and `atomNameList` are decoded element-wise in order;
/// `chemCompType`, `groupName` and `singleLetterCode` are decoded as single
/// text values. All other keys pass through unchanged.
///
/// # Errors
///
/// Returns a [`ValidationError`] if a key or designated value is not valid
/// text.
pub fn normalize_group(raw: &RawRecord) -> Result<GroupRecord, ValidationError> {
    let mut fields = normalize_fields(raw, &GROUP_FIELDS)?;
    Ok(GroupRecord {
        group_name: fields.text.remove("groupName"),
        chem_comp_type: fields.text.remove("chemCompType"),
        single_letter_code: fields.text.remove("singleLetterCode"),
        atom_name_list: fields.text_lists.remove("atomNameList").unwrap_or_default(),
        element_list: fields.text_lists.remove("elementList").unwrap_or_default(),
        extra: fields.extra,
    })
}
