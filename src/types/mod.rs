//! Entry point for the instruction type description subsystem.

pub mod arena;
pub mod builder;
pub mod composite;
pub mod enumeration;
pub mod record;
pub mod shape;
pub mod sum;

pub use arena::{ArenaSpan, MemberRecord, StringId, TypeArena, TypeId};
pub use builder::TypeBuilder;
pub use composite::{ProductBuilder, TupleBuilder};
pub use enumeration::{EnumBuilder, EnumMember, EnumType};
pub use record::{ProductType, ScalarType, SumType, TupleType, TypeRecord, describe};
pub use shape::signature;
pub use sum::SumBuilder;
