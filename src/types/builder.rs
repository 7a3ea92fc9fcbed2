//! Root construction helper exposing a fluent API over the arena.

use super::arena::{StringId, TypeArena, TypeId};
use super::record::{ScalarType, TypeRecord};

pub struct TypeBuilder<'arena> {
    pub(super) arena: &'arena mut TypeArena,
}

impl<'arena> TypeBuilder<'arena> {
    pub fn new(arena: &'arena mut TypeArena) -> Self {
        Self { arena }
    }

    pub fn intern<S: AsRef<str>>(&mut self, name: S) -> StringId {
        self.arena.intern_string(name)
    }

    pub fn scalar(&mut self, name: Option<&str>, bit_size: u16) -> TypeId {
        let name_id = name.map(|value| self.intern(value));
        self.arena
            .push_record(TypeRecord::Scalar(ScalarType::new(name_id, bit_size)))
    }

    /// Single-bit scalar, the most common leaf.
    pub fn bit(&mut self) -> TypeId {
        self.scalar(None, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_declarations_land_in_the_arena() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let id = builder.scalar(Some("imm16"), 16);
        let TypeRecord::Scalar(scalar) = arena.get(id) else {
            panic!("expected scalar record");
        };
        assert_eq!(scalar.bit_size, 16, "scalar should honor requested width");
        assert_eq!(
            scalar.name.map(|name| arena.resolve_string(name)),
            Some("imm16")
        );
    }

    #[test]
    fn bit_is_a_one_bit_scalar() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let id = builder.bit();
        let TypeRecord::Scalar(scalar) = arena.get(id) else {
            panic!("expected scalar record");
        };
        assert_eq!(scalar.bit_size, 1);
    }
}
