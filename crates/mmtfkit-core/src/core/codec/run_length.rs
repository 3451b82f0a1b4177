use crate::core::error::DecodeError;
use itertools::Itertools;

/// Expands a flat `value, run length` sequence.
///
/// The output is exactly `sum(run lengths)` long. Every run length must be
/// strictly positive; there is no implicit filling of uncovered positions.
///
/// # Errors
///
/// Returns [`DecodeError::LengthMismatch`] for a pair whose count is zero or
/// negative, and [`DecodeError::UnpairedRunLength`] when the input has an odd
/// number of entries.
pub fn decode_run_length(flat: &[i32]) -> Result<Vec<i32>, DecodeError> {
    decode_run_length_bounded(flat, usize::MAX)
}

/// Like [`decode_run_length`], but rejects the input as soon as the expanded
/// length would exceed `limit`, before anything is allocated.
///
/// # Errors
///
/// In addition to the errors of [`decode_run_length`], returns
/// [`DecodeError::DeclaredLengthMismatch`] when the run lengths sum past
/// `limit`.
pub fn decode_run_length_bounded(flat: &[i32], limit: usize) -> Result<Vec<i32>, DecodeError> {
    if flat.len() % 2 != 0 {
        return Err(DecodeError::UnpairedRunLength(flat.len()));
    }

    let mut total = 0usize;
    for (pair, chunk) in flat.chunks_exact(2).enumerate() {
        let run_length = chunk[1];
        if run_length <= 0 {
            return Err(DecodeError::LengthMismatch { pair, run_length });
        }
        total = total.saturating_add(run_length as usize);
        if total > limit {
            return Err(DecodeError::DeclaredLengthMismatch {
                declared: limit,
                actual: total,
            });
        }
    }

    let mut out = Vec::with_capacity(total);
    for chunk in flat.chunks_exact(2) {
        out.extend(std::iter::repeat_n(chunk[0], chunk[1] as usize));
    }
    Ok(out)
}

/// Collapses consecutive equal values into `value, run length` pairs.
pub fn encode_run_length(values: &[i32]) -> Vec<i32> {
    values
        .iter()
        .dedup_with_count()
        .flat_map(|(count, &value)| [value, count as i32])
        .collect()
}
