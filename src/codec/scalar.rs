//! Identity codec for fixed-width scalar leaves.

use crate::error::{AsmError, AsmResult};
use crate::types::{ScalarType, TypeArena};
use crate::value::Value;

use super::bits::mask_bits;

#[derive(Debug)]
pub struct ScalarCodec {
    width: usize,
}

impl ScalarCodec {
    pub(super) fn build(arena: &TypeArena, scalar: &ScalarType) -> AsmResult<Self> {
        let width = scalar.bit_size as usize;
        if width == 0 {
            let name = scalar
                .name
                .map(|id| arena.resolve_string(id).to_string())
                .unwrap_or_else(|| "<anonymous>".into());
            return Err(AsmError::MalformedType {
                detail: format!("scalar '{name}' declares zero width"),
            });
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn assemble(&self, value: &Value) -> AsmResult<u64> {
        let Value::Word(word) = value else {
            return Err(AsmError::ValueShape {
                expected: "word".into(),
                found: value.kind_name().into(),
            });
        };
        if *word & !mask_bits(self.width) != 0 {
            return Err(AsmError::ValueOutOfRange {
                value: *word,
                width: self.width,
            });
        }
        Ok(*word)
    }

    pub fn disassemble(&self, bits: u64) -> Value {
        Value::Word(bits & mask_bits(self.width))
    }

    /// Every pattern of the declared width is a legal scalar.
    pub fn is_valid(&self, _bits: u64) -> bool {
        true
    }
}
