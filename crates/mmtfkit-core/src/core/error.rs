use thiserror::Error;

/// Failures while decoding binary arrays or assembling a structure from them.
///
/// These indicate malformed input rather than transient failure. The caller
/// decides whether to skip the structure; nothing here is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Run-length pair {pair} has non-positive repeat count {run_length}")]
    LengthMismatch { pair: usize, run_length: i32 },

    #[error("Run-length input must alternate value and count, got {0} entries")]
    UnpairedRunLength(usize),

    #[error("Header declares {declared} elements but payload decodes to {actual}")]
    DeclaredLengthMismatch { declared: usize, actual: usize },

    #[error("Scale factor must be positive (got {0})")]
    InvalidScale(i32),

    #[error("Inconsistent {what}: expected {expected}, found {actual}")]
    ArityMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Buffer truncated: needed {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Unsupported binary strategy code {0}")]
    UnsupportedStrategy(i32),

    #[error("Value {value} does not fit in {target}")]
    ValueOutOfRange { value: i64, target: &'static str },

    #[error("Expected a {expected} array, found a {found} array")]
    UnexpectedArrayKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Failures caused by values that are well-formed on the wire but unusable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Cutoff distance must be a positive finite number (got {0})")]
    InvalidCutoff(f64),

    #[error("Segment length must be an odd number (got {0})")]
    EvenSegmentLength(usize),

    #[error("Required field '{field}' is missing from {record} record")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("Field '{field}' is not valid text")]
    InvalidText { field: String },

    #[error("Field '{field}' has unexpected type (expected {expected})")]
    UnexpectedType {
        field: String,
        expected: &'static str,
    },
}
