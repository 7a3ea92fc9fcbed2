//! Sub-field addressing: resolve a path of field keys to an absolute bit
//! range and the codec that interprets it.

use crate::error::{AsmError, AsmResult};
use crate::types::TypeArena;
use crate::value::Value;

use super::bits::{BitRange, slice};
use super::Codec;

/// One step of a field path: a name for products (and sum variants), a
/// position for tuples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathSeg<'a> {
    Field(&'a str),
    Index(usize),
}

impl std::fmt::Display for PathSeg<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSeg::Field(name) => write!(f, "{name}"),
            PathSeg::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl Codec {
    /// Walks `path` and returns the addressed sub-field's absolute bit range
    /// together with the codec that interprets it. An empty path addresses
    /// the whole encoding.
    pub fn resolve<'c>(
        &'c self,
        arena: &TypeArena,
        path: &[PathSeg<'_>],
    ) -> AsmResult<(BitRange, &'c Codec)> {
        let mut codec = self;
        let mut base = 0usize;
        for segment in path {
            let (range, child) = codec.step(arena, segment)?;
            base += range.lo;
            codec = child;
        }
        Ok((BitRange::new(base, base + codec.width()), codec))
    }

    /// Slices the addressed sub-field out of `bits` without a full decode.
    pub fn extract(&self, arena: &TypeArena, bits: u64, path: &[PathSeg<'_>]) -> AsmResult<u64> {
        let (range, _) = self.resolve(arena, path)?;
        Ok(slice(bits, range))
    }

    /// Decodes just the addressed sub-field.
    pub fn extract_value(
        &self,
        arena: &TypeArena,
        bits: u64,
        path: &[PathSeg<'_>],
    ) -> AsmResult<Value> {
        let (range, codec) = self.resolve(arena, path)?;
        codec.disassemble(arena, slice(bits, range))
    }

    /// Resolves one immediate child, returning its range relative to self.
    fn step<'c>(&'c self, arena: &TypeArena, segment: &PathSeg<'_>) -> AsmResult<(BitRange, &'c Codec)> {
        match self {
            Codec::Composite(composite) => {
                let slot = match segment {
                    PathSeg::Field(name) if !composite.is_positional() => {
                        composite.fields().iter().find(|slot| {
                            slot.name_id
                                .is_some_and(|id| arena.resolve_string(id) == *name)
                        })
                    }
                    PathSeg::Index(index) if composite.is_positional() => {
                        composite.fields().get(*index)
                    }
                    _ => None,
                };
                let slot = slot.ok_or_else(|| self.unknown_segment(arena, segment))?;
                Ok((slot.range, &*slot.codec))
            }
            Codec::Sum(sum) => {
                let PathSeg::Field(name) = segment else {
                    return Err(self.unknown_segment(arena, segment));
                };
                let (range, codec) = sum
                    .payload_slot(arena, name)
                    .ok_or_else(|| self.unknown_segment(arena, segment))?;
                Ok((range, &**codec))
            }
            Codec::Scalar(_) | Codec::Enum(_) => Err(self.unknown_segment(arena, segment)),
        }
    }

    fn unknown_segment(&self, arena: &TypeArena, segment: &PathSeg<'_>) -> AsmError {
        AsmError::UnknownField {
            segment: segment.to_string(),
            ty: self.describe(arena),
        }
    }
}
