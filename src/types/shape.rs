//! Canonical structural signatures.
//!
//! A signature is a stable text rendering of a type's structure. Two
//! descriptions are structurally equal exactly when their signatures match,
//! independent of which arena holds them or in what order records were
//! pushed. Sum codecs sort and deduplicate variants by payload signature, so
//! signature stability is what makes tag assignment deterministic.

use super::arena::{TypeArena, TypeId};
use super::record::TypeRecord;

pub fn signature(arena: &TypeArena, ty: TypeId) -> String {
    let mut out = String::new();
    write_signature(arena, ty, &mut out);
    out
}

fn write_signature(arena: &TypeArena, ty: TypeId, out: &mut String) {
    match arena.get(ty) {
        TypeRecord::Scalar(scalar) => {
            out.push_str("bits[");
            out.push_str(&scalar.bit_size.to_string());
            out.push(']');
        }
        TypeRecord::Enum(enumeration) => {
            out.push_str("enum{");
            for (index, member) in enumeration.members.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(arena.resolve_string(member.label));
                match member.code {
                    Some(code) => {
                        out.push('=');
                        out.push_str(&code.to_string());
                    }
                    None => out.push_str("=?"),
                }
            }
            out.push('}');
        }
        TypeRecord::Product(product) => {
            out.push_str("product{");
            for (index, member) in arena.members(product.members).iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                if let Some(name) = member.name_id {
                    out.push_str(arena.resolve_string(name));
                    out.push(':');
                }
                write_signature(arena, member.ty, out);
            }
            out.push('}');
        }
        TypeRecord::Tuple(tuple) => {
            out.push_str("tuple(");
            for (index, member) in arena.members(tuple.members).iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_signature(arena, member.ty, out);
            }
            out.push(')');
        }
        TypeRecord::Sum(sum) => {
            out.push_str(if sum.tagged { "union{" } else { "sum[" });
            for (index, variant) in arena.members(sum.variants).iter().enumerate() {
                if index > 0 {
                    out.push('|');
                }
                if let Some(name) = variant.name_id {
                    out.push_str(arena.resolve_string(name));
                    out.push(':');
                }
                write_signature(arena, variant.ty, out);
            }
            out.push(if sum.tagged { '}' } else { ']' });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builder::TypeBuilder;

    #[test]
    fn signatures_render_nested_structure() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let op = builder
            .enumeration(None)
            .variant("Add", 0)
            .auto("Sub")
            .finish();
        let imm = builder.scalar(None, 8);
        let instr = builder.product(Some("instr")).field("op", op).field("imm", imm).finish();
        assert_eq!(
            signature(&arena, instr),
            "product{op:enum{Add=0,Sub=?},imm:bits[8]}"
        );
    }

    #[test]
    fn structurally_equal_types_share_a_signature_across_arenas() {
        // signatures anchor determinism, so they must not depend on arena state
        let build = |extra: bool| {
            let mut arena = TypeArena::new();
            let mut builder = TypeBuilder::new(&mut arena);
            if extra {
                // unrelated records shift raw ids without changing structure
                builder.scalar(Some("noise"), 7);
            }
            let bit = builder.bit();
            let pair = builder.tuple(None).element(bit).element(bit).finish();
            signature(&arena, pair)
        };
        assert_eq!(build(false), build(true));
    }

    #[test]
    fn sum_flavours_render_distinct_signatures() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let word = builder.scalar(None, 4);
        let sum = builder.sum(None).variant(word).finish();
        let union = builder.tagged_union(None).named_variant("w", word).finish();
        assert_eq!(signature(&arena, sum), "sum[bits[4]]");
        assert_eq!(signature(&arena, union), "union{w:bits[4]}");
    }
}
