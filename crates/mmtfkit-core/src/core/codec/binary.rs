use super::delta::{decode_delta, encode_delta};
use super::recursive_index::{
    PackedInt, decode_recursive_delta, encode_recursive_delta, pack_recursive_index, quantize,
    unpack_recursive_index,
};
use super::run_length::{decode_run_length_bounded, encode_run_length};
use crate::core::error::DecodeError;

const HEADER_LEN: usize = 12;

/// The strategy code stored in the first four bytes of an MMTF binary array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Big-endian 32-bit floats.
    Float32 = 1,
    /// Signed bytes.
    Int8 = 2,
    /// Big-endian 16-bit integers.
    Int16 = 3,
    /// Big-endian 32-bit integers.
    Int32 = 4,
    /// Fixed-width, NUL-padded strings; the parameter is the width.
    FixedString = 5,
    /// Run-length encoded code points.
    RunLengthChar = 6,
    /// Run-length encoded integers.
    RunLengthInt = 7,
    /// Run-length encoded deltas.
    RunLengthDelta = 8,
    /// Run-length encoded integers divided by the parameter.
    RunLengthFloat = 9,
    /// Recursive-index packed 16-bit deltas divided by the parameter.
    RecursiveDeltaFloat = 10,
    /// 16-bit integers divided by the parameter.
    Int16Float = 11,
    /// Recursive-index packed 16-bit integers divided by the parameter.
    RecursiveIndex16Float = 12,
    /// Recursive-index packed 8-bit integers divided by the parameter.
    RecursiveIndex8Float = 13,
    /// Recursive-index packed 16-bit integers.
    RecursiveIndex16 = 14,
    /// Recursive-index packed 8-bit integers.
    RecursiveIndex8 = 15,
}

impl Strategy {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for Strategy {
    type Error = DecodeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Strategy::Float32,
            2 => Strategy::Int8,
            3 => Strategy::Int16,
            4 => Strategy::Int32,
            5 => Strategy::FixedString,
            6 => Strategy::RunLengthChar,
            7 => Strategy::RunLengthInt,
            8 => Strategy::RunLengthDelta,
            9 => Strategy::RunLengthFloat,
            10 => Strategy::RecursiveDeltaFloat,
            11 => Strategy::Int16Float,
            12 => Strategy::RecursiveIndex16Float,
            13 => Strategy::RecursiveIndex8Float,
            14 => Strategy::RecursiveIndex16,
            15 => Strategy::RecursiveIndex8,
            other => return Err(DecodeError::UnsupportedStrategy(other)),
        })
    }
}

/// A decoded binary array, typed by what its strategy produces.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedArray {
    Float(Vec<f64>),
    Int(Vec<i32>),
    Char(Vec<char>),
    Text(Vec<String>),
}

impl DecodedArray {
    pub fn len(&self) -> usize {
        match self {
            DecodedArray::Float(v) => v.len(),
            DecodedArray::Int(v) => v.len(),
            DecodedArray::Char(v) => v.len(),
            DecodedArray::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            DecodedArray::Float(_) => "float",
            DecodedArray::Int(_) => "integer",
            DecodedArray::Char(_) => "char",
            DecodedArray::Text(_) => "text",
        }
    }

    pub fn into_floats(self) -> Result<Vec<f64>, DecodeError> {
        match self {
            DecodedArray::Float(v) => Ok(v),
            DecodedArray::Int(v) => Ok(v.into_iter().map(f64::from).collect()),
            other => Err(other.mismatch("float")),
        }
    }

    pub fn into_ints(self) -> Result<Vec<i32>, DecodeError> {
        match self {
            DecodedArray::Int(v) => Ok(v),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn into_chars(self) -> Result<Vec<char>, DecodeError> {
        match self {
            DecodedArray::Char(v) => Ok(v),
            other => Err(other.mismatch("char")),
        }
    }

    pub fn into_text(self) -> Result<Vec<String>, DecodeError> {
        match self {
            DecodedArray::Text(v) => Ok(v),
            other => Err(other.mismatch("text")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> DecodeError {
        DecodeError::UnexpectedArrayKind {
            expected,
            found: self.kind(),
        }
    }
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn payload_chunks<const N: usize>(payload: &[u8]) -> Result<Vec<[u8; N]>, DecodeError> {
    if payload.len() % N != 0 {
        return Err(DecodeError::Truncated {
            expected: payload.len().div_ceil(N) * N,
            actual: payload.len(),
        });
    }
    Ok(payload
        .chunks_exact(N)
        .map(|c| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(c);
            buf
        })
        .collect())
}

fn read_i8s(payload: &[u8]) -> Vec<i8> {
    payload.iter().map(|&b| b as i8).collect()
}

fn read_i16s(payload: &[u8]) -> Result<Vec<i16>, DecodeError> {
    Ok(payload_chunks::<2>(payload)?
        .into_iter()
        .map(i16::from_be_bytes)
        .collect())
}

fn read_i32s(payload: &[u8]) -> Result<Vec<i32>, DecodeError> {
    Ok(payload_chunks::<4>(payload)?
        .into_iter()
        .map(i32::from_be_bytes)
        .collect())
}

fn positive_param(param: i32) -> Result<f64, DecodeError> {
    if param <= 0 {
        return Err(DecodeError::InvalidScale(param));
    }
    Ok(f64::from(param))
}

fn code_point_to_char(value: i32) -> Result<char, DecodeError> {
    u32::try_from(value)
        .ok()
        .and_then(char::from_u32)
        .ok_or(DecodeError::ValueOutOfRange {
            value: i64::from(value),
            target: "char",
        })
}

/// Decodes an MMTF binary array: a 12-byte big-endian header
/// (`strategy`, `length`, `parameter`) followed by the payload.
///
/// # Errors
///
/// Fails if the buffer is shorter than the header, the strategy code is
/// unknown, the payload is malformed for its strategy, or the decoded element
/// count disagrees with the header's declared length.
pub fn decode_binary(bytes: &[u8]) -> Result<DecodedArray, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated {
            expected: HEADER_LEN,
            actual: bytes.len(),
        });
    }
    let strategy = Strategy::try_from(read_i32(bytes, 0))?;
    let declared = read_i32(bytes, 4);
    let param = read_i32(bytes, 8);
    let declared = usize::try_from(declared).map_err(|_| DecodeError::ValueOutOfRange {
        value: i64::from(declared),
        target: "array length",
    })?;
    let payload = &bytes[HEADER_LEN..];

    let decoded = match strategy {
        Strategy::Float32 => DecodedArray::Float(
            payload_chunks::<4>(payload)?
                .into_iter()
                .map(|b| f64::from(f32::from_be_bytes(b)))
                .collect(),
        ),
        Strategy::Int8 => {
            DecodedArray::Int(read_i8s(payload).into_iter().map(i32::from).collect())
        }
        Strategy::Int16 => {
            DecodedArray::Int(read_i16s(payload)?.into_iter().map(i32::from).collect())
        }
        Strategy::Int32 => DecodedArray::Int(read_i32s(payload)?),
        Strategy::FixedString => {
            let width = usize::try_from(param)
                .ok()
                .filter(|&w| w > 0)
                .ok_or(DecodeError::InvalidScale(param))?;
            let expected =
                declared
                    .checked_mul(width)
                    .ok_or(DecodeError::ValueOutOfRange {
                        value: i64::from(param),
                        target: "fixed string width",
                    })?;
            if payload.len() < expected {
                return Err(DecodeError::Truncated {
                    expected,
                    actual: payload.len(),
                });
            }
            let strings = payload[..expected]
                .chunks_exact(width)
                .map(|chunk| {
                    let end = chunk.iter().position(|&b| b == 0).unwrap_or(width);
                    String::from_utf8(chunk[..end].to_vec()).map_err(|_| DecodeError::InvalidUtf8)
                })
                .collect::<Result<Vec<_>, _>>()?;
            DecodedArray::Text(strings)
        }
        Strategy::RunLengthChar => DecodedArray::Char(
            decode_run_length_bounded(&read_i32s(payload)?, declared)?
                .into_iter()
                .map(code_point_to_char)
                .collect::<Result<_, _>>()?,
        ),
        Strategy::RunLengthInt => {
            DecodedArray::Int(decode_run_length_bounded(&read_i32s(payload)?, declared)?)
        }
        Strategy::RunLengthDelta => DecodedArray::Int(decode_delta(
            &decode_run_length_bounded(&read_i32s(payload)?, declared)?,
        )),
        Strategy::RunLengthFloat => {
            let divisor = positive_param(param)?;
            DecodedArray::Float(
                decode_run_length_bounded(&read_i32s(payload)?, declared)?
                    .into_iter()
                    .map(|v| f64::from(v) / divisor)
                    .collect(),
            )
        }
        Strategy::RecursiveDeltaFloat => {
            DecodedArray::Float(decode_recursive_delta(&read_i16s(payload)?, param)?)
        }
        Strategy::Int16Float => {
            let divisor = positive_param(param)?;
            DecodedArray::Float(
                read_i16s(payload)?
                    .into_iter()
                    .map(|v| f64::from(v) / divisor)
                    .collect(),
            )
        }
        Strategy::RecursiveIndex16Float => {
            let divisor = positive_param(param)?;
            DecodedArray::Float(scale_down(
                unpack_recursive_index(&read_i16s(payload)?)?,
                divisor,
            ))
        }
        Strategy::RecursiveIndex8Float => {
            let divisor = positive_param(param)?;
            DecodedArray::Float(scale_down(
                unpack_recursive_index(&read_i8s(payload))?,
                divisor,
            ))
        }
        Strategy::RecursiveIndex16 => {
            DecodedArray::Int(unpack_recursive_index(&read_i16s(payload)?)?)
        }
        Strategy::RecursiveIndex8 => DecodedArray::Int(unpack_recursive_index(&read_i8s(payload))?),
    };

    if decoded.len() != declared {
        return Err(DecodeError::DeclaredLengthMismatch {
            declared,
            actual: decoded.len(),
        });
    }
    Ok(decoded)
}

fn scale_down(values: Vec<i32>, divisor: f64) -> Vec<f64> {
    values.into_iter().map(|v| f64::from(v) / divisor).collect()
}

fn narrow_all<T: PackedInt>(values: &[i32]) -> Result<Vec<T>, DecodeError> {
    let (min, max) = (T::MIN.widen(), T::MAX.widen());
    values
        .iter()
        .map(|&v| {
            let wide = i64::from(v);
            if (min..=max).contains(&wide) {
                Ok(T::narrow(wide))
            } else {
                Err(DecodeError::ValueOutOfRange {
                    value: wide,
                    target: T::NAME,
                })
            }
        })
        .collect()
}

fn write_i16s(out: &mut Vec<u8>, values: &[i16]) {
    for v in values {
        out.extend_from_slice(&v.to_be_bytes());
    }
}

fn write_i32s(out: &mut Vec<u8>, values: &[i32]) {
    for v in values {
        out.extend_from_slice(&v.to_be_bytes());
    }
}

fn write_i8s(out: &mut Vec<u8>, values: &[i8]) {
    out.extend(values.iter().map(|&v| v as u8));
}

/// Encodes `array` with `strategy`, prefixing the 12-byte header.
///
/// `param` is the divisor for float strategies and the string width for
/// [`Strategy::FixedString`]; it is ignored otherwise but still written.
///
/// # Errors
///
/// Fails if `array` is not the kind the strategy expects, a value does not
/// fit the strategy's wire type, or a divisor/width is not positive.
pub fn encode_binary(
    array: &DecodedArray,
    strategy: Strategy,
    param: i32,
) -> Result<Vec<u8>, DecodeError> {
    let length = i32::try_from(array.len()).map_err(|_| DecodeError::ValueOutOfRange {
        value: array.len() as i64,
        target: "array length",
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + array.len() * 4);
    write_i32s(&mut out, &[strategy.code(), length, param]);

    match strategy {
        Strategy::Float32 => {
            for v in array.clone().into_floats()? {
                out.extend_from_slice(&(v as f32).to_be_bytes());
            }
        }
        Strategy::Int8 => write_i8s(&mut out, &narrow_all::<i8>(&ints_of(array)?)?),
        Strategy::Int16 => write_i16s(&mut out, &narrow_all::<i16>(&ints_of(array)?)?),
        Strategy::Int32 => write_i32s(&mut out, &ints_of(array)?),
        Strategy::FixedString => {
            let width = usize::try_from(param)
                .ok()
                .filter(|&w| w > 0)
                .ok_or(DecodeError::InvalidScale(param))?;
            let DecodedArray::Text(strings) = array else {
                return Err(array.mismatch("text"));
            };
            for s in strings {
                let bytes = s.as_bytes();
                if bytes.len() > width {
                    return Err(DecodeError::ValueOutOfRange {
                        value: bytes.len() as i64,
                        target: "fixed string width",
                    });
                }
                out.extend_from_slice(bytes);
                out.extend(std::iter::repeat_n(0u8, width - bytes.len()));
            }
        }
        Strategy::RunLengthChar => {
            let DecodedArray::Char(chars) = array else {
                return Err(array.mismatch("char"));
            };
            let codes: Vec<i32> = chars.iter().map(|&c| c as i32).collect();
            write_i32s(&mut out, &encode_run_length(&codes));
        }
        Strategy::RunLengthInt => write_i32s(&mut out, &encode_run_length(&ints_of(array)?)),
        Strategy::RunLengthDelta => write_i32s(
            &mut out,
            &encode_run_length(&encode_delta(&ints_of(array)?)),
        ),
        Strategy::RunLengthFloat => {
            positive_param(param)?;
            let quantized = quantize(&floats_of(array)?, param)?;
            write_i32s(&mut out, &encode_run_length(&quantized));
        }
        Strategy::RecursiveDeltaFloat => {
            write_i16s(&mut out, &encode_recursive_delta(&floats_of(array)?, param)?)
        }
        Strategy::Int16Float => {
            positive_param(param)?;
            let quantized = quantize(&floats_of(array)?, param)?;
            write_i16s(&mut out, &narrow_all::<i16>(&quantized)?);
        }
        Strategy::RecursiveIndex16Float => {
            positive_param(param)?;
            let quantized = quantize(&floats_of(array)?, param)?;
            write_i16s(&mut out, &pack_recursive_index::<i16>(&quantized));
        }
        Strategy::RecursiveIndex8Float => {
            positive_param(param)?;
            let quantized = quantize(&floats_of(array)?, param)?;
            write_i8s(&mut out, &pack_recursive_index::<i8>(&quantized));
        }
        Strategy::RecursiveIndex16 => {
            write_i16s(&mut out, &pack_recursive_index::<i16>(&ints_of(array)?))
        }
        Strategy::RecursiveIndex8 => {
            write_i8s(&mut out, &pack_recursive_index::<i8>(&ints_of(array)?))
        }
    }
    Ok(out)
}

fn ints_of(array: &DecodedArray) -> Result<Vec<i32>, DecodeError> {
    match array {
        DecodedArray::Int(v) => Ok(v.clone()),
        other => Err(other.mismatch("integer")),
    }
}

fn floats_of(array: &DecodedArray) -> Result<Vec<f64>, DecodeError> {
    match array {
        DecodedArray::Float(v) => Ok(v.clone()),
        DecodedArray::Int(v) => Ok(v.iter().map(|&i| f64::from(i)).collect()),
        other => Err(other.mismatch("float")),
    }
}
