//! Canonical record structures for every supported instruction shape.

use super::arena::{ArenaSpan, StringId, TypeArena, TypeId};
use super::enumeration::EnumType;

/// Fixed-width scalar leaf: a single bit when `bit_size == 1`, otherwise an
/// N-bit vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScalarType {
    pub name: Option<StringId>,
    pub bit_size: u16,
}

impl ScalarType {
    pub fn new(name: Option<StringId>, bit_size: u16) -> Self {
        Self { name, bit_size }
    }
}

/// Ordered named fields; declaration order is the bit layout order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductType {
    pub name: Option<StringId>,
    pub members: ArenaSpan,
}

/// Ordered positional fields with the same packing rule as a product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TupleType {
    pub name: Option<StringId>,
    pub members: ArenaSpan,
}

/// Tagged choice among payload types. `tagged == false` keys variants by
/// payload type (structural duplicates collapse onto one tag); `tagged ==
/// true` keys variants by declared name, so distinct names may share one
/// payload type and layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SumType {
    pub name: Option<StringId>,
    pub variants: ArenaSpan,
    pub tagged: bool,
}

/// All supported type shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRecord {
    Scalar(ScalarType),
    Enum(EnumType),
    Product(ProductType),
    Tuple(TupleType),
    Sum(SumType),
}

impl TypeRecord {
    pub fn name(&self) -> Option<StringId> {
        match self {
            TypeRecord::Scalar(scalar) => scalar.name,
            TypeRecord::Enum(enumeration) => enumeration.name,
            TypeRecord::Product(product) => product.name,
            TypeRecord::Tuple(tuple) => tuple.name,
            TypeRecord::Sum(sum) => sum.name,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeRecord::Scalar(_) => "scalar",
            TypeRecord::Enum(_) => "enum",
            TypeRecord::Product(_) => "product",
            TypeRecord::Tuple(_) => "tuple",
            TypeRecord::Sum(sum) => {
                if sum.tagged {
                    "tagged union"
                } else {
                    "sum"
                }
            }
        }
    }
}

/// Renders "kind 'name'" for diagnostics, falling back to the kind alone for
/// anonymous types.
pub fn describe(arena: &TypeArena, ty: TypeId) -> String {
    let record = arena.get(ty);
    match record.name() {
        Some(id) => format!("{} '{}'", record.kind_name(), arena.resolve_string(id)),
        None => record.kind_name().to_string(),
    }
}
