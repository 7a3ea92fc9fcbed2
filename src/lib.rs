//! Bit-level instruction assembler over structurally-typed descriptions.
//!
//! A [`types::TypeArena`] holds immutable descriptions of instruction
//! shapes (scalars, enumerations, products, tuples, sums); a
//! [`codec::CodecCache`] derives one memoized [`codec::Codec`] per
//! description, which packs instances to machine words and back, checks
//! bit patterns for validity, and addresses nested sub-fields by path.

pub mod codec;
pub mod error;
pub mod types;
pub mod value;

pub use codec::{BitRange, Codec, CodecCache, LayoutWalker, PathSeg, VariantSel, render_layout};
pub use error::{AsmError, AsmResult};
pub use types::{MemberRecord, StringId, TypeArena, TypeBuilder, TypeId, TypeRecord};
pub use value::{SumKey, Value};
