use crate::core::error::ValidationError;

/// A dynamically typed value as read from a MessagePack map.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<RawValue>),
    Map(Vec<(RawValue, RawValue)>),
}

/// A byte-keyed record, in wire order.
pub type RawRecord = Vec<(Vec<u8>, RawValue)>;

impl RawValue {
    /// Decodes a byte string (or passes through a text value).
    pub fn to_text(&self, field: &str) -> Result<String, ValidationError> {
        match self {
            RawValue::Text(s) => Ok(s.clone()),
            RawValue::Bytes(b) => {
                String::from_utf8(b.clone()).map_err(|_| ValidationError::InvalidText {
                    field: field.to_string(),
                })
            }
            _ => Err(ValidationError::UnexpectedType {
                field: field.to_string(),
                expected: "text",
            }),
        }
    }

    pub fn to_text_list(&self, field: &str) -> Result<Vec<String>, ValidationError> {
        match self {
            RawValue::Array(items) => items.iter().map(|item| item.to_text(field)).collect(),
            _ => Err(ValidationError::UnexpectedType {
                field: field.to_string(),
                expected: "list of text",
            }),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_int_list(&self, field: &str) -> Result<Vec<i64>, ValidationError> {
        let mismatch = || ValidationError::UnexpectedType {
            field: field.to_string(),
            expected: "list of integers",
        };
        match self {
            RawValue::Array(items) => items.iter().map(|i| i.as_i64().ok_or_else(mismatch)).collect(),
            _ => Err(mismatch()),
        }
    }

    /// Looks up `key` in a map value, matching text or byte-string keys.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        let RawValue::Map(entries) = self else {
            return None;
        };
        entries.iter().find_map(|(k, v)| match k {
            RawValue::Text(s) if s == key => Some(v),
            RawValue::Bytes(b) if b.as_slice() == key.as_bytes() => Some(v),
            _ => None,
        })
    }

    /// Converts a map value into a byte-keyed record, skipping non-string keys.
    pub fn to_record(&self, field: &str) -> Result<RawRecord, ValidationError> {
        let RawValue::Map(entries) = self else {
            return Err(ValidationError::UnexpectedType {
                field: field.to_string(),
                expected: "map",
            });
        };
        Ok(entries
            .iter()
            .filter_map(|(k, v)| match k {
                RawValue::Text(s) => Some((s.as_bytes().to_vec(), v.clone())),
                RawValue::Bytes(b) => Some((b.clone(), v.clone())),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_strings_and_text_both_decode_to_text() {
        assert_eq!(RawValue::Bytes(b"ZN".to_vec()).to_text("f").unwrap(), "ZN");
        assert_eq!(RawValue::Text("ZN".into()).to_text("f").unwrap(), "ZN");
    }

    #[test]
    fn non_text_value_is_a_type_error() {
        assert_eq!(
            RawValue::Int(3).to_text("groupName"),
            Err(ValidationError::UnexpectedType {
                field: "groupName".into(),
                expected: "text"
            })
        );
    }

    #[test]
    fn map_lookup_accepts_either_key_encoding() {
        let map = RawValue::Map(vec![
            (RawValue::Bytes(b"a".to_vec()), RawValue::Int(1)),
            (RawValue::Text("b".into()), RawValue::Int(2)),
        ]);
        assert_eq!(map.get("a"), Some(&RawValue::Int(1)));
        assert_eq!(map.get("b"), Some(&RawValue::Int(2)));
        assert_eq!(map.get("c"), None);
    }

    #[test]
    fn int_list_rejects_mixed_content() {
        let list = RawValue::Array(vec![RawValue::Int(1), RawValue::Text("x".into())]);
        assert!(list.to_int_list("chainIndexList").is_err());
    }
}
