use super::mmtf::MmtfError;
use crate::core::metadata::RawValue;
use rmp::Marker;
use std::io::{Cursor, Read};

/// Deepest container nesting accepted; MMTF itself needs only a few levels.
const MAX_DEPTH: usize = 64;

fn malformed(what: impl std::fmt::Display) -> MmtfError {
    MmtfError::MsgPack(what.to_string())
}

/// Parses one MessagePack value from the start of `data`.
pub(crate) fn decode(data: &[u8]) -> Result<RawValue, MmtfError> {
    let mut cursor = Cursor::new(data);
    read_value(&mut cursor, 0)
}

fn read_bytes<const N: usize>(rd: &mut Cursor<&[u8]>) -> Result<[u8; N], MmtfError> {
    let mut buf = [0u8; N];
    rd.read_exact(&mut buf)
        .map_err(|e| malformed(format!("read {N} bytes: {e}")))?;
    Ok(buf)
}

fn read_len8(rd: &mut Cursor<&[u8]>) -> Result<usize, MmtfError> {
    Ok(read_bytes::<1>(rd)?[0] as usize)
}

fn read_len16(rd: &mut Cursor<&[u8]>) -> Result<usize, MmtfError> {
    Ok(u16::from_be_bytes(read_bytes(rd)?) as usize)
}

fn read_len32(rd: &mut Cursor<&[u8]>) -> Result<usize, MmtfError> {
    Ok(u32::from_be_bytes(read_bytes(rd)?) as usize)
}

fn unsigned(value: u64) -> Result<RawValue, MmtfError> {
    i64::try_from(value)
        .map(RawValue::Int)
        .map_err(|_| malformed(format!("unsigned integer {value} exceeds i64")))
}

fn read_value(rd: &mut Cursor<&[u8]>, depth: usize) -> Result<RawValue, MmtfError> {
    if depth > MAX_DEPTH {
        return Err(malformed(format!("nesting too deep (over {MAX_DEPTH} levels)")));
    }
    let marker = rmp::decode::read_marker(rd).map_err(|e| malformed(format!("marker: {e:?}")))?;

    match marker {
        Marker::Null => Ok(RawValue::Nil),
        Marker::True => Ok(RawValue::Bool(true)),
        Marker::False => Ok(RawValue::Bool(false)),

        Marker::FixPos(v) => Ok(RawValue::Int(i64::from(v))),
        Marker::FixNeg(v) => Ok(RawValue::Int(i64::from(v))),

        Marker::U8 => Ok(RawValue::Int(i64::from(read_bytes::<1>(rd)?[0]))),
        Marker::U16 => Ok(RawValue::Int(i64::from(u16::from_be_bytes(read_bytes(rd)?)))),
        Marker::U32 => Ok(RawValue::Int(i64::from(u32::from_be_bytes(read_bytes(rd)?)))),
        Marker::U64 => unsigned(u64::from_be_bytes(read_bytes(rd)?)),
        Marker::I8 => Ok(RawValue::Int(i64::from(i8::from_be_bytes(read_bytes(rd)?)))),
        Marker::I16 => Ok(RawValue::Int(i64::from(i16::from_be_bytes(read_bytes(rd)?)))),
        Marker::I32 => Ok(RawValue::Int(i64::from(i32::from_be_bytes(read_bytes(rd)?)))),
        Marker::I64 => Ok(RawValue::Int(i64::from_be_bytes(read_bytes(rd)?))),
        Marker::F32 => Ok(RawValue::Float(f64::from(f32::from_be_bytes(read_bytes(rd)?)))),
        Marker::F64 => Ok(RawValue::Float(f64::from_be_bytes(read_bytes(rd)?))),

        Marker::FixStr(len) => read_string(rd, len as usize),
        Marker::Str8 => {
            let len = read_len8(rd)?;
            read_string(rd, len)
        }
        Marker::Str16 => {
            let len = read_len16(rd)?;
            read_string(rd, len)
        }
        Marker::Str32 => {
            let len = read_len32(rd)?;
            read_string(rd, len)
        }

        Marker::Bin8 => {
            let len = read_len8(rd)?;
            read_bin(rd, len)
        }
        Marker::Bin16 => {
            let len = read_len16(rd)?;
            read_bin(rd, len)
        }
        Marker::Bin32 => {
            let len = read_len32(rd)?;
            read_bin(rd, len)
        }

        Marker::FixArray(len) => read_array(rd, len as usize, depth),
        Marker::Array16 => {
            let len = read_len16(rd)?;
            read_array(rd, len, depth)
        }
        Marker::Array32 => {
            let len = read_len32(rd)?;
            read_array(rd, len, depth)
        }

        Marker::FixMap(len) => read_map(rd, len as usize, depth),
        Marker::Map16 => {
            let len = read_len16(rd)?;
            read_map(rd, len, depth)
        }
        Marker::Map32 => {
            let len = read_len32(rd)?;
            read_map(rd, len, depth)
        }

        other => Err(malformed(format!("unsupported marker {other:?}"))),
    }
}

fn read_raw(rd: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>, MmtfError> {
    let remaining = rd.get_ref().len().saturating_sub(rd.position() as usize);
    if len > remaining {
        return Err(malformed(format!(
            "payload of {len} bytes exceeds the {remaining} remaining"
        )));
    }
    let mut buf = vec![0u8; len];
    rd.read_exact(&mut buf)
        .map_err(|e| malformed(format!("payload read: {e}")))?;
    Ok(buf)
}

// Strings that are not UTF-8 are kept as bytes for the normalizer to judge.
fn read_string(rd: &mut Cursor<&[u8]>, len: usize) -> Result<RawValue, MmtfError> {
    let buf = read_raw(rd, len)?;
    Ok(match String::from_utf8(buf) {
        Ok(s) => RawValue::Text(s),
        Err(e) => RawValue::Bytes(e.into_bytes()),
    })
}

fn read_bin(rd: &mut Cursor<&[u8]>, len: usize) -> Result<RawValue, MmtfError> {
    Ok(RawValue::Bytes(read_raw(rd, len)?))
}

fn read_array(rd: &mut Cursor<&[u8]>, len: usize, depth: usize) -> Result<RawValue, MmtfError> {
    let mut items = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        items.push(read_value(rd, depth + 1)?);
    }
    Ok(RawValue::Array(items))
}

fn read_map(rd: &mut Cursor<&[u8]>, len: usize, depth: usize) -> Result<RawValue, MmtfError> {
    let mut pairs = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        let key = read_value(rd, depth + 1)?;
        let value = read_value(rd, depth + 1)?;
        pairs.push((key, value));
    }
    Ok(RawValue::Map(pairs))
}

/// Serializes `value` as MessagePack.
pub(crate) fn encode(value: &RawValue) -> Result<Vec<u8>, MmtfError> {
    let mut out = Vec::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn container_len(len: usize) -> Result<u32, MmtfError> {
    u32::try_from(len).map_err(|_| malformed(format!("container of {len} entries is too large")))
}

fn write_value(out: &mut Vec<u8>, value: &RawValue) -> Result<(), MmtfError> {
    use rmp::encode;

    let failed = |e: &dyn std::fmt::Debug| malformed(format!("write: {e:?}"));
    match value {
        RawValue::Nil => encode::write_nil(out).map_err(|e| failed(&e))?,
        RawValue::Bool(b) => encode::write_bool(out, *b).map_err(|e| failed(&e))?,
        RawValue::Int(v) => {
            encode::write_sint(out, *v).map_err(|e| failed(&e))?;
        }
        RawValue::Float(v) => encode::write_f64(out, *v).map_err(|e| failed(&e))?,
        RawValue::Bytes(b) => encode::write_bin(out, b).map_err(|e| failed(&e))?,
        RawValue::Text(s) => encode::write_str(out, s).map_err(|e| failed(&e))?,
        RawValue::Array(items) => {
            encode::write_array_len(out, container_len(items.len())?).map_err(|e| failed(&e))?;
            for item in items {
                write_value(out, item)?;
            }
        }
        RawValue::Map(pairs) => {
            encode::write_map_len(out, container_len(pairs.len())?).map_err(|e| failed(&e))?;
            for (key, value) in pairs {
                write_value(out, key)?;
                write_value(out, value)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_values_survive_encoding() {
        let value = RawValue::Map(vec![
            (RawValue::Text("numAtoms".into()), RawValue::Int(70_000)),
            (RawValue::Text("blob".into()), RawValue::Bytes(vec![0, 1, 2])),
            (
                RawValue::Text("list".into()),
                RawValue::Array(vec![RawValue::Int(-3), RawValue::Float(0.5), RawValue::Nil]),
            ),
            (RawValue::Text("flag".into()), RawValue::Bool(true)),
        ]);
        assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn reads_hand_written_fixmap() {
        // {"a": 1, "b": [true]}
        let bytes = [0x82, 0xa1, b'a', 0x01, 0xa1, b'b', 0x91, 0xc3];
        let value = decode(&bytes).unwrap();
        assert_eq!(value.get("a"), Some(&RawValue::Int(1)));
        assert_eq!(value.get("b"), Some(&RawValue::Array(vec![RawValue::Bool(true)])));
    }

    #[test]
    fn declared_length_past_end_is_rejected() {
        // bin8 claiming 200 bytes with only 2 present.
        let bytes = [0xc4, 200, 1, 2];
        assert!(matches!(decode(&bytes), Err(MmtfError::MsgPack(_))));
    }

    #[test]
    fn runaway_nesting_is_rejected() {
        let mut bytes = vec![0x91; 500_000];
        bytes.push(0xc0);
        match decode(&bytes) {
            Err(MmtfError::MsgPack(msg)) => assert!(msg.contains("nesting too deep")),
            other => panic!("expected a nesting error, got {other:?}"),
        }
    }

    #[test]
    fn moderate_nesting_is_accepted() {
        let mut bytes = vec![0x91; 8];
        bytes.push(0xc0);
        let mut value = decode(&bytes).unwrap();
        for _ in 0..8 {
            let RawValue::Array(mut items) = value else {
                panic!("expected an array");
            };
            value = items.remove(0);
        }
        assert_eq!(value, RawValue::Nil);
    }

    #[test]
    fn invalid_utf8_string_is_kept_as_bytes() {
        let bytes = [0xa2, 0xff, 0xfe];
        assert_eq!(decode(&bytes).unwrap(), RawValue::Bytes(vec![0xff, 0xfe]));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(decode(&[]).is_err());
    }
}
