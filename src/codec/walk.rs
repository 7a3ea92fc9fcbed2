//! Depth-first traversal of a codec's layout, emitting every leaf slot with
//! its absolute bit range and a dotted path.

use smallvec::SmallVec;

use crate::types::{StringId, TypeArena};

use super::bits::BitRange;
use super::Codec;

#[derive(Clone, Debug, PartialEq, Eq)]
enum PathPiece {
    Field(StringId),
    Index(usize),
    Variant(Option<StringId>),
    Tag,
}

/// Accumulated path of one layout slot, rendered as `mode.alu[0].<tag>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath {
    pieces: SmallVec<[PathPiece; 8]>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self {
            pieces: SmallVec::new(),
        }
    }

    fn push_field(&self, name: StringId) -> Self {
        let mut next = self.clone();
        next.pieces.push(PathPiece::Field(name));
        next
    }

    fn push_index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.pieces.push(PathPiece::Index(index));
        next
    }

    fn push_variant(&self, name: Option<StringId>) -> Self {
        let mut next = self.clone();
        next.pieces.push(PathPiece::Variant(name));
        next
    }

    fn push_tag(&self) -> Self {
        let mut next = self.clone();
        next.pieces.push(PathPiece::Tag);
        next
    }

    pub fn to_string(&self, arena: &TypeArena) -> String {
        let mut text = String::new();
        for piece in &self.pieces {
            match piece {
                PathPiece::Field(id) | PathPiece::Variant(Some(id)) => {
                    if !text.is_empty() {
                        text.push('.');
                    }
                    text.push_str(arena.resolve_string(*id));
                }
                PathPiece::Variant(None) => {
                    if !text.is_empty() {
                        text.push('.');
                    }
                    text.push_str("<unnamed>");
                }
                PathPiece::Index(index) => {
                    text.push('[');
                    text.push_str(&index.to_string());
                    text.push(']');
                }
                PathPiece::Tag => {
                    if !text.is_empty() {
                        text.push('.');
                    }
                    text.push_str("<tag>");
                }
            }
        }
        if text.is_empty() { "<root>".into() } else { text }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    Bits,
    Opcode,
    Tag,
}

impl SlotKind {
    pub fn label(self) -> &'static str {
        match self {
            SlotKind::Bits => "bits",
            SlotKind::Opcode => "opcode",
            SlotKind::Tag => "tag",
        }
    }
}

#[derive(Clone, Debug)]
pub struct LayoutEntry {
    pub path: FieldPath,
    pub range: BitRange,
    pub kind: SlotKind,
}

struct Frame<'a> {
    codec: &'a Codec,
    base: usize,
    path: FieldPath,
}

/// Emits leaf slots in layout order. Sum variants all descend from the same
/// payload offset, so overlapping entries from sibling variants are expected.
pub struct LayoutWalker<'a> {
    arena: &'a TypeArena,
    stack: SmallVec<[WalkItem<'a>; 8]>,
}

enum WalkItem<'a> {
    Descend(Frame<'a>),
    Emit(LayoutEntry),
}

impl<'a> LayoutWalker<'a> {
    pub fn new(arena: &'a TypeArena, codec: &'a Codec) -> Self {
        let mut stack = SmallVec::new();
        stack.push(WalkItem::Descend(Frame {
            codec,
            base: 0,
            path: FieldPath::root(),
        }));
        Self { arena, stack }
    }

    fn expand(&mut self, frame: Frame<'a>) -> Option<LayoutEntry> {
        match frame.codec {
            Codec::Scalar(scalar) => Some(LayoutEntry {
                path: frame.path,
                range: BitRange::new(frame.base, frame.base + scalar.width()),
                kind: SlotKind::Bits,
            }),
            Codec::Enum(enumeration) => Some(LayoutEntry {
                path: frame.path,
                range: BitRange::new(frame.base, frame.base + enumeration.width()),
                kind: SlotKind::Opcode,
            }),
            Codec::Composite(composite) => {
                for (index, slot) in composite.fields().iter().enumerate().rev() {
                    let path = match slot.name_id {
                        Some(name) => frame.path.push_field(name),
                        None => frame.path.push_index(index),
                    };
                    self.stack.push(WalkItem::Descend(Frame {
                        codec: &*slot.codec,
                        base: frame.base + slot.range.lo,
                        path,
                    }));
                }
                None
            }
            Codec::Sum(sum) => {
                for slot in sum.variants().iter().rev() {
                    let group = &sum.groups()[slot.group];
                    let label = slot.name_id.or_else(|| self.arena.get(slot.ty).name());
                    self.stack.push(WalkItem::Descend(Frame {
                        codec: &*group.codec,
                        base: frame.base + group.range.lo,
                        path: frame.path.push_variant(label),
                    }));
                }
                if sum.tag_width() > 0 {
                    self.stack.push(WalkItem::Emit(LayoutEntry {
                        path: frame.path.push_tag(),
                        range: sum.tag_layout().shifted(frame.base),
                        kind: SlotKind::Tag,
                    }));
                }
                None
            }
        }
    }
}

impl<'a> Iterator for LayoutWalker<'a> {
    type Item = LayoutEntry;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(item) = self.stack.pop() {
            match item {
                WalkItem::Emit(entry) => return Some(entry),
                WalkItem::Descend(frame) => {
                    if let Some(entry) = self.expand(frame) {
                        return Some(entry);
                    }
                }
            }
        }
        None
    }
}

/// Human-readable field map: one line per leaf slot.
pub fn render_layout(arena: &TypeArena, codec: &Codec) -> String {
    let mut out = String::new();
    for entry in LayoutWalker::new(arena, codec) {
        out.push_str(&format!(
            "[{:>3}..{:>3})  {:<7} {}\n",
            entry.range.lo,
            entry.range.hi,
            entry.kind.label(),
            entry.path.to_string(arena),
        ));
    }
    out
}
