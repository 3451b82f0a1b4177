//! Binary array codec for the MMTF wire format.
//!
//! Two integer schemes carry almost every array in a structure file:
//!
//! - [`run_length`] expands alternating `value, count` pairs.
//! - [`recursive_index`] packs wide integers into narrow `i8`/`i16` steps,
//!   using the type's boundary values as continuation markers. Combined with
//!   a running sum and a scale factor it yields the recursive delta scheme
//!   used for coordinates.
//!
//! [`binary`] reads and writes the 12-byte strategy header that selects a
//! combination of these schemes for each array stored in a file, and
//! [`EncodedArray`] is the scheme-tagged integer payload the rest of the
//! library passes around before decoding.

pub mod binary;
pub mod delta;
pub mod recursive_index;
pub mod run_length;

use crate::core::error::DecodeError;

pub use binary::{DecodedArray, Strategy, decode_binary, encode_binary};
pub use recursive_index::{decode_recursive_delta, encode_recursive_delta};
pub use run_length::{decode_run_length, encode_run_length};

/// The integer encoding applied to an [`EncodedArray`] payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Values are stored as-is.
    Raw,
    /// Alternating `value, run length` pairs.
    RunLength,
    /// Recursive-index packed `i16` deltas, divided by `scale` on decode.
    RecursiveDelta { scale: i32 },
}

/// A scheme-tagged integer payload, immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedArray {
    scheme: Scheme,
    data: Vec<i32>,
}

impl EncodedArray {
    pub fn new(scheme: Scheme, data: Vec<i32>) -> Self {
        Self { scheme, data }
    }

    /// Run-length encodes `values`.
    pub fn run_length(values: &[i32]) -> Self {
        Self::new(Scheme::RunLength, encode_run_length(values))
    }

    /// Quantizes `values` by `scale` and packs them as recursive-index deltas.
    pub fn recursive_delta(values: &[f64], scale: i32) -> Result<Self, DecodeError> {
        let packed = encode_recursive_delta(values, scale)?;
        Ok(Self::new(
            Scheme::RecursiveDelta { scale },
            packed.into_iter().map(i32::from).collect(),
        ))
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn data(&self) -> &[i32] {
        &self.data
    }

    /// Decodes the payload into floating-point values.
    ///
    /// # Errors
    ///
    /// Propagates the scheme's own failures (non-positive run length,
    /// non-positive scale) and rejects recursive-delta payloads containing
    /// values outside the `i16` range.
    pub fn decode(&self) -> Result<Vec<f64>, DecodeError> {
        match self.scheme {
            Scheme::Raw => Ok(self.data.iter().map(|&v| f64::from(v)).collect()),
            Scheme::RunLength => Ok(decode_run_length(&self.data)?
                .into_iter()
                .map(f64::from)
                .collect()),
            Scheme::RecursiveDelta { scale } => {
                let narrow = self
                    .data
                    .iter()
                    .map(|&v| {
                        i16::try_from(v).map_err(|_| DecodeError::ValueOutOfRange {
                            value: i64::from(v),
                            target: "i16",
                        })
                    })
                    .collect::<Result<Vec<i16>, _>>()?;
                decode_recursive_delta(&narrow, scale)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_scheme_converts_values_unchanged() {
        let array = EncodedArray::new(Scheme::Raw, vec![3, -1, 0]);
        assert_eq!(array.decode().unwrap(), vec![3.0, -1.0, 0.0]);
    }

    #[test]
    fn run_length_scheme_expands_pairs() {
        let array = EncodedArray::new(Scheme::RunLength, vec![7, 3, 2, 1]);
        assert_eq!(array.decode().unwrap(), vec![7.0, 7.0, 7.0, 2.0]);
    }

    #[test]
    fn run_length_constructor_round_trips() {
        let array = EncodedArray::run_length(&[1, 1, 1, 4, 4, 9]);
        assert_eq!(array.scheme(), Scheme::RunLength);
        assert_eq!(array.data(), &[1, 3, 4, 2, 9, 1]);
        assert_eq!(array.decode().unwrap(), vec![1.0, 1.0, 1.0, 4.0, 4.0, 9.0]);
    }

    #[test]
    fn recursive_delta_scheme_divides_by_scale() {
        let array = EncodedArray::new(Scheme::RecursiveDelta { scale: 1000 }, vec![0, 1000, -500]);
        assert_eq!(array.decode().unwrap(), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn recursive_delta_scheme_rejects_values_wider_than_i16() {
        let array = EncodedArray::new(Scheme::RecursiveDelta { scale: 10 }, vec![40_000]);
        assert_eq!(
            array.decode(),
            Err(DecodeError::ValueOutOfRange {
                value: 40_000,
                target: "i16"
            })
        );
    }

    #[test]
    fn recursive_delta_constructor_round_trips_large_steps() {
        let values = [0.0, 45.123, -12.5, 3.0];
        let array = EncodedArray::recursive_delta(&values, 1000).unwrap();
        let decoded = array.decode().unwrap();
        assert_eq!(decoded.len(), values.len());
        for (a, b) in decoded.iter().zip(values.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
