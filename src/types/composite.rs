//! Builders for product (named) and tuple (positional) descriptions.

use super::arena::{ArenaSpan, MemberRecord, StringId, TypeId};
use super::builder::TypeBuilder;
use super::record::{ProductType, TupleType, TypeRecord};

pub struct ProductBuilder<'builder, 'arena> {
    builder: &'builder mut TypeBuilder<'arena>,
    name: Option<StringId>,
    members: Vec<MemberRecord>,
}

impl<'builder, 'arena> ProductBuilder<'builder, 'arena> {
    pub(super) fn new(builder: &'builder mut TypeBuilder<'arena>, name: Option<&str>) -> Self {
        let name_id = name.map(|value| builder.intern(value));
        Self {
            builder,
            name: name_id,
            members: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl AsRef<str>, ty: TypeId) -> Self {
        let name_id = self.builder.intern(name);
        self.members.push(MemberRecord::new(Some(name_id), ty));
        self
    }

    pub fn finish(self) -> TypeId {
        let span = if self.members.is_empty() {
            ArenaSpan::empty()
        } else {
            self.builder.arena.alloc_members(self.members)
        };
        self.builder.arena.push_record(TypeRecord::Product(ProductType {
            name: self.name,
            members: span,
        }))
    }
}

pub struct TupleBuilder<'builder, 'arena> {
    builder: &'builder mut TypeBuilder<'arena>,
    name: Option<StringId>,
    members: Vec<MemberRecord>,
}

impl<'builder, 'arena> TupleBuilder<'builder, 'arena> {
    pub(super) fn new(builder: &'builder mut TypeBuilder<'arena>, name: Option<&str>) -> Self {
        let name_id = name.map(|value| builder.intern(value));
        Self {
            builder,
            name: name_id,
            members: Vec::new(),
        }
    }

    pub fn element(mut self, ty: TypeId) -> Self {
        self.members.push(MemberRecord::new(None, ty));
        self
    }

    pub fn finish(self) -> TypeId {
        let span = if self.members.is_empty() {
            ArenaSpan::empty()
        } else {
            self.builder.arena.alloc_members(self.members)
        };
        self.builder.arena.push_record(TypeRecord::Tuple(TupleType {
            name: self.name,
            members: span,
        }))
    }
}

impl<'arena> TypeBuilder<'arena> {
    pub fn product(&mut self, name: Option<&str>) -> ProductBuilder<'_, 'arena> {
        ProductBuilder::new(self, name)
    }

    pub fn tuple(&mut self, name: Option<&str>) -> TupleBuilder<'_, 'arena> {
        TupleBuilder::new(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::arena::TypeArena;

    #[test]
    fn product_builder_chains_named_fields() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let word = builder.scalar(None, 4);
        let product_id = builder
            .product(Some("pair"))
            .field("x", word)
            .field("y", word)
            .finish();

        let TypeRecord::Product(product) = arena.get(product_id) else {
            panic!("expected product record");
        };
        let members = arena.members(product.members);
        assert_eq!(members.len(), 2, "builder should create both fields");
        assert!(members.iter().all(|member| member.name_id.is_some()));
    }

    #[test]
    fn tuple_builder_keeps_elements_anonymous() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let word = builder.scalar(None, 3);
        let tuple_id = builder.tuple(None).element(word).element(word).finish();

        let TypeRecord::Tuple(tuple) = arena.get(tuple_id) else {
            panic!("expected tuple record");
        };
        let members = arena.members(tuple.members);
        assert_eq!(members.len(), 2);
        assert!(
            members.iter().all(|member| member.name_id.is_none()),
            "tuple elements are addressed by position"
        );
    }
}
