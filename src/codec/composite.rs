//! Shared codec for products and tuples: contiguous field layout from bit 0.

use std::sync::Arc;

use crate::error::{AsmError, AsmResult};
use crate::types::{ArenaSpan, StringId, TypeArena, TypeId, describe};
use crate::value::Value;

use super::bits::{BitRange, deposit, slice};
use super::{Codec, CodecCache};

#[derive(Debug)]
pub struct FieldSlot {
    pub name_id: Option<StringId>,
    pub ty: TypeId,
    pub range: BitRange,
    pub codec: Arc<Codec>,
}

#[derive(Debug)]
pub struct CompositeCodec {
    owner: TypeId,
    width: usize,
    positional: bool,
    fields: Vec<FieldSlot>,
}

impl CompositeCodec {
    pub(super) fn build(
        cache: &CodecCache,
        arena: &TypeArena,
        owner: TypeId,
        members: ArenaSpan,
        positional: bool,
    ) -> AsmResult<Self> {
        let mut fields = Vec::with_capacity(members.len());
        let mut offset = 0usize;
        for (index, member) in arena.members(members).iter().enumerate() {
            if !positional && member.name_id.is_none() {
                return Err(AsmError::MalformedType {
                    detail: format!(
                        "{} field #{index} has no name",
                        describe(arena, owner)
                    ),
                });
            }
            if let Some(name) = member.name_id {
                let duplicate = fields
                    .iter()
                    .any(|slot: &FieldSlot| slot.name_id == Some(name));
                if duplicate {
                    return Err(AsmError::MalformedType {
                        detail: format!(
                            "{} declares field '{}' twice",
                            describe(arena, owner),
                            arena.resolve_string(name)
                        ),
                    });
                }
            }
            let codec = cache.codec(arena, member.ty)?;
            let width = codec.width();
            fields.push(FieldSlot {
                name_id: member.name_id,
                ty: member.ty,
                range: BitRange::new(offset, offset + width),
                codec,
            });
            offset += width;
        }
        Ok(Self {
            owner,
            width: offset,
            positional,
            fields,
        })
    }

    pub fn owner(&self) -> TypeId {
        self.owner
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    pub fn fields(&self) -> &[FieldSlot] {
        &self.fields
    }

    pub fn assemble(&self, arena: &TypeArena, value: &Value) -> AsmResult<u64> {
        let mut acc = 0u64;
        if self.positional {
            let Value::Seq(items) = value else {
                return Err(AsmError::ValueShape {
                    expected: "sequence".into(),
                    found: value.kind_name().into(),
                });
            };
            if items.len() != self.fields.len() {
                return Err(AsmError::MissingField {
                    field: format!(
                        "tuple arity {} (instance carries {})",
                        self.fields.len(),
                        items.len()
                    ),
                });
            }
            for (slot, item) in self.fields.iter().zip(items) {
                acc = deposit(acc, slot.range, slot.codec.assemble(arena, item)?);
            }
        } else {
            let Value::Record(_) = value else {
                return Err(AsmError::ValueShape {
                    expected: "record".into(),
                    found: value.kind_name().into(),
                });
            };
            for slot in &self.fields {
                let name = slot.name_id.expect("product fields are named at build");
                let field = value.field(name).ok_or_else(|| AsmError::MissingField {
                    field: arena.resolve_string(name).into(),
                })?;
                acc = deposit(acc, slot.range, slot.codec.assemble(arena, field)?);
            }
        }
        Ok(acc)
    }

    pub fn disassemble(&self, arena: &TypeArena, bits: u64) -> AsmResult<Value> {
        if self.positional {
            let mut items = Vec::with_capacity(self.fields.len());
            for slot in &self.fields {
                items.push(slot.codec.disassemble(arena, slice(bits, slot.range))?);
            }
            Ok(Value::Seq(items))
        } else {
            let mut fields = Vec::with_capacity(self.fields.len());
            for slot in &self.fields {
                let name = slot.name_id.expect("product fields are named at build");
                fields.push((name, slot.codec.disassemble(arena, slice(bits, slot.range))?));
            }
            Ok(Value::Record(fields))
        }
    }

    pub fn is_valid(&self, bits: u64) -> bool {
        self.fields
            .iter()
            .all(|slot| slot.codec.is_valid(slice(bits, slot.range)))
    }
}
