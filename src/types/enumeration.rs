//! Enumeration descriptions with explicit or packer-assigned codes.

use smallvec::SmallVec;

use super::arena::{StringId, TypeId};
use super::builder::TypeBuilder;
use super::record::TypeRecord;

/// One symbolic member. `code` is `None` for auto members whose encoding is
/// chosen at codec construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumMember {
    pub label: StringId,
    pub code: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumType {
    pub name: Option<StringId>,
    pub members: SmallVec<[EnumMember; 4]>,
}

impl EnumType {
    pub fn new(name: Option<StringId>) -> Self {
        Self {
            name,
            members: SmallVec::new(),
        }
    }

    pub fn push_member(&mut self, member: EnumMember) {
        self.members.push(member);
    }
}

pub struct EnumBuilder<'builder, 'arena> {
    builder: &'builder mut TypeBuilder<'arena>,
    ty: EnumType,
}

impl<'builder, 'arena> EnumBuilder<'builder, 'arena> {
    pub(super) fn new(builder: &'builder mut TypeBuilder<'arena>, name: Option<&str>) -> Self {
        let name_id = name.map(|value| builder.intern(value));
        Self {
            builder,
            ty: EnumType::new(name_id),
        }
    }

    /// Declares a member with an explicit code. Negative codes are rejected
    /// when the codec is built, not here.
    pub fn variant(mut self, label: impl AsRef<str>, code: i64) -> Self {
        let label_id = self.builder.intern(label);
        self.ty.push_member(EnumMember {
            label: label_id,
            code: Some(code),
        });
        self
    }

    /// Declares a member whose code the packer assigns.
    pub fn auto(mut self, label: impl AsRef<str>) -> Self {
        let label_id = self.builder.intern(label);
        self.ty.push_member(EnumMember {
            label: label_id,
            code: None,
        });
        self
    }

    pub fn finish(self) -> TypeId {
        self.builder.arena.push_record(TypeRecord::Enum(self.ty))
    }
}

impl<'arena> TypeBuilder<'arena> {
    pub fn enumeration(&mut self, name: Option<&str>) -> EnumBuilder<'_, 'arena> {
        EnumBuilder::new(self, name)
    }
}
