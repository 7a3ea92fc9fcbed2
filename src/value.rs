//! Instance values fed to `assemble` and produced by `disassemble`.

use smallvec::SmallVec;
use smallvec::smallvec;

use crate::types::{StringId, TypeId};

/// Identifies which alternative of a sum an entry populates: by declared
/// variant name for tagged unions, by payload type for bare sums.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SumKey {
    Name(StringId),
    Payload(TypeId),
}

/// A typed instance. The shape must mirror the type description it is
/// assembled against; mismatches surface as instance errors, never as
/// silent coercions.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Scalar leaf payload.
    Word(u64),
    /// Enumeration member, by interned label.
    Member(StringId),
    /// Product instance: field name/value pairs.
    Record(Vec<(StringId, Value)>),
    /// Tuple instance: values in positional order.
    Seq(Vec<Value>),
    /// Sum instance: the populated alternatives. A well-formed instance
    /// carries exactly one entry; the representation keeps the empty and
    /// doubly-populated cases expressible so assembly can reject them.
    Union(SmallVec<[(SumKey, Box<Value>); 1]>),
}

impl Value {
    /// Single-alternative tagged-union instance.
    pub fn variant(name: StringId, value: Value) -> Self {
        Value::Union(smallvec![(SumKey::Name(name), Box::new(value))])
    }

    /// Single-alternative bare-sum instance keyed by payload type.
    pub fn payload(ty: TypeId, value: Value) -> Self {
        Value::Union(smallvec![(SumKey::Payload(ty), Box::new(value))])
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Word(_) => "word",
            Value::Member(_) => "enum member",
            Value::Record(_) => "record",
            Value::Seq(_) => "sequence",
            Value::Union(_) => "union",
        }
    }

    /// Looks up a record field by name.
    pub fn field(&self, name: StringId) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}
