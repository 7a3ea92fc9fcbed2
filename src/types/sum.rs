//! Builders for sum and tagged-union descriptions.

use super::arena::{ArenaSpan, MemberRecord, StringId, TypeId};
use super::builder::TypeBuilder;
use super::record::{SumType, TypeRecord};

pub struct SumBuilder<'builder, 'arena> {
    builder: &'builder mut TypeBuilder<'arena>,
    name: Option<StringId>,
    tagged: bool,
    variants: Vec<MemberRecord>,
}

impl<'builder, 'arena> SumBuilder<'builder, 'arena> {
    pub(super) fn new(
        builder: &'builder mut TypeBuilder<'arena>,
        name: Option<&str>,
        tagged: bool,
    ) -> Self {
        let name_id = name.map(|value| builder.intern(value));
        Self {
            builder,
            name: name_id,
            tagged,
            variants: Vec::new(),
        }
    }

    /// Declares a bare variant keyed by its payload type.
    pub fn variant(mut self, ty: TypeId) -> Self {
        self.variants.push(MemberRecord::new(None, ty));
        self
    }

    /// Declares a named variant. Only meaningful on a tagged union; codec
    /// construction rejects named variants elsewhere and unnamed ones here.
    pub fn named_variant(mut self, name: impl AsRef<str>, ty: TypeId) -> Self {
        let name_id = self.builder.intern(name);
        self.variants.push(MemberRecord::new(Some(name_id), ty));
        self
    }

    pub fn finish(self) -> TypeId {
        let span = if self.variants.is_empty() {
            ArenaSpan::empty()
        } else {
            self.builder.arena.alloc_members(self.variants)
        };
        self.builder.arena.push_record(TypeRecord::Sum(SumType {
            name: self.name,
            variants: span,
            tagged: self.tagged,
        }))
    }
}

impl<'arena> TypeBuilder<'arena> {
    pub fn sum(&mut self, name: Option<&str>) -> SumBuilder<'_, 'arena> {
        SumBuilder::new(self, name, false)
    }

    pub fn tagged_union(&mut self, name: Option<&str>) -> SumBuilder<'_, 'arena> {
        SumBuilder::new(self, name, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::arena::TypeArena;

    #[test]
    fn sum_builder_records_bare_variants() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let short = builder.scalar(None, 2);
        let wide = builder.scalar(None, 6);
        let sum_id = builder.sum(Some("payload")).variant(short).variant(wide).finish();

        let TypeRecord::Sum(sum) = arena.get(sum_id) else {
            panic!("expected sum record");
        };
        assert!(!sum.tagged);
        assert_eq!(arena.members(sum.variants).len(), 2);
    }

    #[test]
    fn tagged_union_builder_records_names() {
        let mut arena = TypeArena::new();
        let mut builder = TypeBuilder::new(&mut arena);
        let word = builder.scalar(None, 4);
        let union_id = builder
            .tagged_union(None)
            .named_variant("load", word)
            .named_variant("store", word)
            .finish();

        let TypeRecord::Sum(sum) = arena.get(union_id) else {
            panic!("expected sum record");
        };
        assert!(sum.tagged, "tagged_union should mark the record");
        let variants = arena.members(sum.variants);
        assert_eq!(variants.len(), 2, "shared payload types stay distinct variants");
        assert!(variants.iter().all(|variant| variant.name_id.is_some()));
    }
}
