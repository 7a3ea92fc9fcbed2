//! Enumeration codec: compact code assignment plus opcode-set validity.

use ahash::{AHashMap, AHashSet};
use smallvec::SmallVec;

use crate::error::{AsmError, AsmResult};
use crate::types::{EnumType, StringId, TypeArena};
use crate::value::Value;

use super::bits::bit_length;

/// Membership test over the assigned code set. Contiguous sets collapse to a
/// range compare; gappy sets fall back to table lookup. Both must agree with
/// exhaustive membership.
#[derive(Debug)]
enum CodeCheck {
    Range { lo: u64, hi: u64 },
    Table,
}

#[derive(Debug)]
pub struct EnumCodec {
    width: usize,
    codes: SmallVec<[(StringId, u64); 4]>,
    by_label: AHashMap<StringId, u64>,
    by_code: AHashMap<u64, StringId>,
    validity: CodeCheck,
}

impl EnumCodec {
    pub(super) fn build(arena: &TypeArena, enumeration: &EnumType) -> AsmResult<Self> {
        let describe = || {
            enumeration
                .name
                .map(|id| format!("enum '{}'", arena.resolve_string(id)))
                .unwrap_or_else(|| "anonymous enum".into())
        };
        if enumeration.members.is_empty() {
            return Err(AsmError::MalformedType {
                detail: format!("{} has no members", describe()),
            });
        }

        // Explicit codes claim their values first.
        let mut used: AHashSet<u64> = AHashSet::new();
        for member in &enumeration.members {
            let Some(code) = member.code else {
                continue;
            };
            if code < 0 {
                return Err(AsmError::MalformedType {
                    detail: format!(
                        "{} member '{}' declares negative code {}",
                        describe(),
                        arena.resolve_string(member.label),
                        code
                    ),
                });
            }
            if !used.insert(code as u64) {
                return Err(AsmError::MalformedType {
                    detail: format!(
                        "{} member '{}' duplicates code {}",
                        describe(),
                        arena.resolve_string(member.label),
                        code
                    ),
                });
            }
        }

        // Auto members take the lowest unused code, in declaration order.
        // The counter never revisits a value below the last assignment, which
        // is equivalent to restarting from zero because every skipped value
        // is already in the used set.
        let mut codes: SmallVec<[(StringId, u64); 4]> = SmallVec::new();
        let mut next_free = 0u64;
        for member in &enumeration.members {
            let code = match member.code {
                Some(code) => code as u64,
                None => {
                    while used.contains(&next_free) {
                        next_free += 1;
                    }
                    used.insert(next_free);
                    next_free
                }
            };
            codes.push((member.label, code));
        }

        let mut by_label = AHashMap::with_capacity(codes.len());
        let mut by_code = AHashMap::with_capacity(codes.len());
        for (label, code) in &codes {
            if by_label.insert(*label, *code).is_some() {
                return Err(AsmError::MalformedType {
                    detail: format!(
                        "{} declares member '{}' twice",
                        describe(),
                        arena.resolve_string(*label)
                    ),
                });
            }
            by_code.insert(*code, *label);
        }

        let max_code = codes.iter().map(|(_, code)| *code).max().unwrap_or(0);
        let width = bit_length(max_code).max(1);
        let validity = contiguous_check(&codes);

        Ok(Self {
            width,
            codes,
            by_label,
            by_code,
            validity,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Declaration-order view of the assigned codes.
    pub fn codes(&self) -> &[(StringId, u64)] {
        &self.codes
    }

    pub fn assemble(&self, arena: &TypeArena, value: &Value) -> AsmResult<u64> {
        let Value::Member(label) = value else {
            return Err(AsmError::ValueShape {
                expected: "enum member".into(),
                found: value.kind_name().into(),
            });
        };
        self.by_label.get(label).copied().ok_or_else(|| AsmError::UnknownField {
            segment: arena.resolve_string(*label).into(),
            ty: "enum".into(),
        })
    }

    pub fn disassemble(&self, bits: u64) -> AsmResult<Value> {
        self.by_code
            .get(&bits)
            .map(|label| Value::Member(*label))
            .ok_or(AsmError::InvalidOpcode {
                bits,
                width: self.width,
            })
    }

    pub fn is_valid(&self, bits: u64) -> bool {
        match &self.validity {
            CodeCheck::Range { lo, hi } => (*lo..=*hi).contains(&bits),
            CodeCheck::Table => self.by_code.contains_key(&bits),
        }
    }
}

fn contiguous_check(codes: &[(StringId, u64)]) -> CodeCheck {
    let mut sorted: SmallVec<[u64; 8]> = codes.iter().map(|(_, code)| *code).collect();
    sorted.sort_unstable();
    let lo = sorted[0];
    let contiguous = sorted
        .iter()
        .enumerate()
        .all(|(index, code)| *code == lo + index as u64);
    if contiguous {
        CodeCheck::Range {
            lo,
            hi: lo + (sorted.len() as u64 - 1),
        }
    } else {
        CodeCheck::Table
    }
}
