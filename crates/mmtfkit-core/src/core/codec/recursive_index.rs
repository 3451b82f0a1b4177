use super::delta::encode_delta;
use crate::core::error::DecodeError;

/// A narrow integer type whose boundary values mark a continuing run.
pub trait PackedInt: Copy + PartialEq {
    const MIN: Self;
    const MAX: Self;
    const NAME: &'static str;

    fn widen(self) -> i64;

    /// Caller guarantees `value` lies within `MIN..=MAX`.
    fn narrow(value: i64) -> Self;

    fn is_boundary(self) -> bool {
        self == Self::MIN || self == Self::MAX
    }
}

macro_rules! impl_packed_int {
    ($ty:ty) => {
        impl PackedInt for $ty {
            const MIN: Self = <$ty>::MIN;
            const MAX: Self = <$ty>::MAX;
            const NAME: &'static str = stringify!($ty);

            fn widen(self) -> i64 {
                self as i64
            }

            fn narrow(value: i64) -> Self {
                value as $ty
            }
        }
    };
}

impl_packed_int!(i8);
impl_packed_int!(i16);

/// Decodes recursive-delta packed `i16` values into scaled floats.
///
/// A running sum is taken over the whole input. Positions holding `i16::MIN`
/// or `i16::MAX` contribute to that sum but are dropped from the output, so
/// the result has one entry per non-boundary input value. The result is then
/// divided by `scale`.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidScale`] if `scale <= 0`.
pub fn decode_recursive_delta(ints: &[i16], scale: i32) -> Result<Vec<f64>, DecodeError> {
    if scale <= 0 {
        return Err(DecodeError::InvalidScale(scale));
    }
    let divisor = f64::from(scale);

    let mut sum = 0i64;
    let mut out = Vec::with_capacity(ints.len());
    for &v in ints {
        sum += i64::from(v);
        if !v.is_boundary() {
            out.push(sum as f64 / divisor);
        }
    }
    Ok(out)
}

/// Quantizes `values` by `scale`, delta encodes them, and packs every delta
/// into `i16` steps.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidScale`] if `scale <= 0`, or
/// [`DecodeError::ValueOutOfRange`] if a quantized value overflows `i32`.
pub fn encode_recursive_delta(values: &[f64], scale: i32) -> Result<Vec<i16>, DecodeError> {
    if scale <= 0 {
        return Err(DecodeError::InvalidScale(scale));
    }
    let quantized = quantize(values, scale)?;
    Ok(pack_recursive_index::<i16>(&encode_delta(&quantized)))
}

/// Rounds `value * scale` to the nearest `i32`.
pub(crate) fn quantize(values: &[f64], scale: i32) -> Result<Vec<i32>, DecodeError> {
    values
        .iter()
        .map(|&v| {
            let scaled = (v * f64::from(scale)).round();
            if scaled.is_finite() && scaled >= f64::from(i32::MIN) && scaled <= f64::from(i32::MAX)
            {
                Ok(scaled as i32)
            } else {
                Err(DecodeError::ValueOutOfRange {
                    value: scaled as i64,
                    target: "i32",
                })
            }
        })
        .collect()
}

/// Unpacks recursive-index encoded values.
///
/// Consecutive boundary values are summed together with the first
/// non-boundary value that follows them, which closes the run and emits the
/// total. A trailing run with no closing value is discarded.
///
/// # Errors
///
/// Returns [`DecodeError::ValueOutOfRange`] if a run sums past `i32`.
pub fn unpack_recursive_index<T: PackedInt>(ints: &[T]) -> Result<Vec<i32>, DecodeError> {
    let mut out = Vec::with_capacity(ints.len());
    let mut acc = 0i64;
    for &v in ints {
        acc += v.widen();
        if !v.is_boundary() {
            let value = i32::try_from(acc).map_err(|_| DecodeError::ValueOutOfRange {
                value: acc,
                target: "i32",
            })?;
            out.push(value);
            acc = 0;
        }
    }
    Ok(out)
}

/// Packs `values` into `T` steps, splitting any value outside `T`'s open
/// range into a run of boundary values plus a remainder.
pub fn pack_recursive_index<T: PackedInt>(values: &[i32]) -> Vec<T> {
    let max = T::MAX.widen();
    let min = T::MIN.widen();
    let mut out = Vec::with_capacity(values.len());
    for &v in values {
        let mut rest = i64::from(v);
        if rest >= 0 {
            while rest >= max {
                out.push(T::MAX);
                rest -= max;
            }
        } else {
            while rest <= min {
                out.push(T::MIN);
                rest -= min;
            }
        }
        out.push(T::narrow(rest));
    }
    out
}
