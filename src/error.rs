use std::fmt;

pub type AsmResult<T> = Result<T, AsmError>;

/// Represents any failure raised while deriving a codec, assembling an
/// instance, or interpreting a bit pattern.
#[derive(Debug)]
pub enum AsmError {
    /// Construction-time defect in the type description itself: empty enum,
    /// negative or duplicate explicit codes, zero-variant sum, duplicate
    /// tagged-union names, or an encoding wider than the 64-bit word.
    MalformedType { detail: String },
    /// A path segment or variant key does not exist at that nesting level.
    UnknownField { segment: String, ty: String },
    /// An instance lacks a field its type declares.
    MissingField { field: String },
    /// A sum instance populates more than one alternative.
    AmbiguousSumValue { populated: usize },
    /// A sum instance populates no alternative.
    EmptySumValue,
    /// An instance has the wrong shape for its declared type.
    ValueShape { expected: String, found: String },
    /// A scalar payload does not fit its declared width.
    ValueOutOfRange { value: u64, width: usize },
    /// A bit pattern is not recognized by the codec.
    InvalidOpcode { bits: u64, width: usize },
    /// A tag-family operation was invoked on a non-sum codec.
    NotASumType { ty: String },
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmError::MalformedType { detail } => {
                write!(f, "malformed type description: {detail}")
            }
            AsmError::UnknownField { segment, ty } => {
                write!(f, "unknown field '{segment}' in {ty}")
            }
            AsmError::MissingField { field } => {
                write!(f, "instance is missing declared field '{field}'")
            }
            AsmError::AmbiguousSumValue { populated } => {
                write!(f, "sum value populates {populated} alternatives")
            }
            AsmError::EmptySumValue => write!(f, "sum value populates no alternative"),
            AsmError::ValueShape { expected, found } => {
                write!(f, "expected {expected} value, found {found}")
            }
            AsmError::ValueOutOfRange { value, width } => {
                write!(f, "value 0x{value:X} does not fit in {width} bits")
            }
            AsmError::InvalidOpcode { bits, width } => {
                let digits = width.div_ceil(4).max(1);
                write!(
                    f,
                    "bit pattern 0x{bits:0digits$X} is not a valid {width}-bit encoding"
                )
            }
            AsmError::NotASumType { ty } => {
                write!(f, "tag operation invoked on non-sum codec ({ty})")
            }
        }
    }
}

impl std::error::Error for AsmError {}
