//! Codec derivation: one memoized codec per type description, with packing,
//! unpacking, validity, tag, and path operations dispatched over the closed
//! set of shapes.

pub mod bits;
pub mod composite;
pub mod enumeration;
pub mod path;
pub mod scalar;
pub mod sum;
pub mod walk;

pub use bits::BitRange;
pub use composite::{CompositeCodec, FieldSlot};
pub use enumeration::EnumCodec;
pub use path::PathSeg;
pub use scalar::ScalarCodec;
pub use sum::{PayloadGroup, SumCodec, VariantSel, VariantSlot};
pub use walk::{FieldPath, LayoutEntry, LayoutWalker, SlotKind, render_layout};

use std::sync::{Arc, RwLock};

use ahash::AHashMap;

use crate::error::{AsmError, AsmResult};
use crate::types::{TypeArena, TypeId, TypeRecord, describe};
use crate::value::{SumKey, Value};

/// Derived codec for one type description. Construction happens through
/// [`CodecCache::codec`]; the variants mirror the closed shape set, so the
/// builder's dispatch is exhaustive by construction.
#[derive(Debug)]
pub enum Codec {
    Scalar(ScalarCodec),
    Enum(EnumCodec),
    Composite(CompositeCodec),
    Sum(SumCodec),
}

impl Codec {
    /// Total bit width of the encoding.
    pub fn width(&self) -> usize {
        match self {
            Codec::Scalar(scalar) => scalar.width(),
            Codec::Enum(enumeration) => enumeration.width(),
            Codec::Composite(composite) => composite.width(),
            Codec::Sum(sum) => sum.width(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Codec::Scalar(_) => "scalar",
            Codec::Enum(_) => "enum",
            Codec::Composite(composite) => {
                if composite.is_positional() {
                    "tuple"
                } else {
                    "product"
                }
            }
            Codec::Sum(_) => "sum",
        }
    }

    pub(crate) fn describe(&self, arena: &TypeArena) -> String {
        match self {
            Codec::Composite(composite) => describe(arena, composite.owner()),
            Codec::Sum(sum) => describe(arena, sum.owner()),
            other => other.kind_name().into(),
        }
    }

    /// Packs a typed instance into its bit pattern.
    pub fn assemble(&self, arena: &TypeArena, value: &Value) -> AsmResult<u64> {
        match self {
            Codec::Scalar(scalar) => scalar.assemble(value),
            Codec::Enum(enumeration) => enumeration.assemble(arena, value),
            Codec::Composite(composite) => composite.assemble(arena, value),
            Codec::Sum(sum) => sum.assemble(arena, value),
        }
    }

    /// Unpacks a bit pattern back into a typed instance, rejecting patterns
    /// that `is_valid` would refuse.
    pub fn disassemble(&self, arena: &TypeArena, bits: u64) -> AsmResult<Value> {
        match self {
            Codec::Scalar(scalar) => Ok(scalar.disassemble(bits)),
            Codec::Enum(enumeration) => enumeration.disassemble(bits),
            Codec::Composite(composite) => composite.disassemble(arena, bits),
            Codec::Sum(sum) => sum.disassemble(arena, bits),
        }
    }

    /// Total predicate over bit patterns; never fails.
    pub fn is_valid(&self, bits: u64) -> bool {
        match self {
            Codec::Scalar(scalar) => scalar.is_valid(bits),
            Codec::Enum(enumeration) => enumeration.is_valid(bits),
            Codec::Composite(composite) => composite.is_valid(bits),
            Codec::Sum(sum) => sum.is_valid(bits),
        }
    }

    pub fn as_sum(&self) -> AsmResult<&SumCodec> {
        match self {
            Codec::Sum(sum) => Ok(sum),
            other => Err(AsmError::NotASumType {
                ty: other.kind_name().into(),
            }),
        }
    }

    pub fn tag_width(&self) -> AsmResult<usize> {
        Ok(self.as_sum()?.tag_width())
    }

    pub fn tag_layout(&self) -> AsmResult<BitRange> {
        Ok(self.as_sum()?.tag_layout())
    }

    pub fn assemble_tag(&self, arena: &TypeArena, sel: VariantSel<'_>) -> AsmResult<u64> {
        self.as_sum()?.assemble_tag(arena, sel)
    }

    pub fn disassemble_tag(&self, bits: u64) -> AsmResult<SumKey> {
        self.as_sum()?.disassemble_tag(bits)
    }

    pub fn is_valid_tag(&self, bits: u64) -> AsmResult<bool> {
        Ok(self.as_sum()?.is_valid_tag(bits))
    }

    /// Discriminant probe on a full encoding; see [`SumCodec::matches`].
    pub fn matches(&self, arena: &TypeArena, bits: u64, sel: VariantSel<'_>) -> AsmResult<bool> {
        self.as_sum()?.matches(arena, bits, sel)
    }
}

/// Process-wide memoization of derived codecs, keyed by type identifier.
///
/// Construction is a pure function of the description, so concurrent callers
/// may race to build the same codec; the first insert wins and a losing
/// duplicate is discarded without harm. Readers never observe a
/// partially-built codec because insertion happens only after construction
/// completes.
#[derive(Default)]
pub struct CodecCache {
    codecs: RwLock<AHashMap<TypeId, Arc<Codec>>>,
}

impl CodecCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the codec for `ty`, deriving and caching it on first use.
    pub fn codec(&self, arena: &TypeArena, ty: TypeId) -> AsmResult<Arc<Codec>> {
        {
            let cached = self.codecs.read().unwrap_or_else(|err| err.into_inner());
            if let Some(hit) = cached.get(&ty) {
                return Ok(hit.clone());
            }
        }
        let built = Arc::new(self.build(arena, ty)?);
        if built.width() > 64 {
            return Err(AsmError::MalformedType {
                detail: format!(
                    "{} is {} bits wide; encodings are limited to 64-bit words",
                    describe(arena, ty),
                    built.width()
                ),
            });
        }
        let mut cached = self.codecs.write().unwrap_or_else(|err| err.into_inner());
        Ok(cached.entry(ty).or_insert(built).clone())
    }

    fn build(&self, arena: &TypeArena, ty: TypeId) -> AsmResult<Codec> {
        match arena.get(ty) {
            TypeRecord::Scalar(scalar) => ScalarCodec::build(arena, scalar).map(Codec::Scalar),
            TypeRecord::Enum(enumeration) => {
                EnumCodec::build(arena, enumeration).map(Codec::Enum)
            }
            TypeRecord::Product(product) => {
                CompositeCodec::build(self, arena, ty, product.members, false)
                    .map(Codec::Composite)
            }
            TypeRecord::Tuple(tuple) => {
                CompositeCodec::build(self, arena, ty, tuple.members, true).map(Codec::Composite)
            }
            TypeRecord::Sum(sum) => SumCodec::build(self, arena, ty, sum).map(Codec::Sum),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeBuilder;

    #[test]
    fn cache_hands_out_one_shared_codec_per_type() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let word = builder.scalar(None, 8);
        let pair = builder.tuple(None).element(word).element(word).finish();
        let cache = CodecCache::new();
        let first = cache.codec(&arena, pair).expect("codec");
        let second = cache.codec(&arena, pair).expect("codec");
        assert!(Arc::ptr_eq(&first, &second), "repeat lookups must hit the cache");

        // the element codec is shared between both slots through the cache
        let Codec::Composite(composite) = &*first else {
            panic!("expected composite codec");
        };
        assert!(Arc::ptr_eq(
            &composite.fields()[0].codec,
            &composite.fields()[1].codec
        ));
    }

    #[test]
    fn encodings_wider_than_a_word_fail_construction() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let wide = builder.scalar(None, 40);
        let too_wide = builder.tuple(None).element(wide).element(wide).finish();
        let cache = CodecCache::new();
        let err = cache.codec(&arena, too_wide).unwrap_err();
        assert!(matches!(err, AsmError::MalformedType { .. }), "unexpected error: {err}");
    }

    #[test]
    fn tag_operations_reject_non_sum_codecs() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let word = builder.scalar(None, 8);
        let cache = CodecCache::new();
        let codec = cache.codec(&arena, word).expect("codec");
        let err = codec.tag_width().unwrap_err();
        assert!(
            matches!(&err, AsmError::NotASumType { ty } if ty == "scalar"),
            "unexpected error: {err}"
        );
        let err = codec.disassemble_tag(0).unwrap_err();
        assert!(matches!(err, AsmError::NotASumType { .. }), "unexpected error: {err}");
    }

    #[test]
    fn exact_64_bit_encodings_are_accepted() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let half = builder.scalar(None, 32);
        let full = builder.tuple(None).element(half).element(half).finish();
        let cache = CodecCache::new();
        let codec = cache.codec(&arena, full).expect("codec");
        assert_eq!(codec.width(), 64);
        let value = Value::Seq(vec![Value::Word(u32::MAX as u64), Value::Word(1)]);
        let bits = codec.assemble(&arena, &value).expect("assemble");
        assert_eq!(bits, (1u64 << 32) | u32::MAX as u64);
    }
}
