//! Interning arena that owns every type description and its member side table.

use ahash::AHashMap;

use super::record::TypeRecord;

/// Index of an interned string inside the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StringId(u32);

/// Index of a type record inside the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Describes a contiguous slice of member records stored in the arena side table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaSpan {
    start: u32,
    len: u32,
}

impl ArenaSpan {
    pub fn empty() -> Self {
        Self { start: 0, len: 0 }
    }

    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start: start as u32,
            len: len as u32,
        }
    }

    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One field of a product, element of a tuple, or variant of a sum.
/// Product fields and tagged-union variants carry a name; tuple elements
/// and bare sum variants do not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRecord {
    pub name_id: Option<StringId>,
    pub ty: TypeId,
}

impl MemberRecord {
    pub fn new(name_id: Option<StringId>, ty: TypeId) -> Self {
        Self { name_id, ty }
    }
}

/// Owns type records, member pools, and interned strings. Descriptions are
/// immutable once pushed; identifiers stay valid for the arena's lifetime.
#[derive(Default)]
pub struct TypeArena {
    records: Vec<TypeRecord>,
    members: Vec<MemberRecord>,
    strings: Vec<Box<str>>,
    lookup: AHashMap<Box<str>, StringId>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_string<S: AsRef<str>>(&mut self, value: S) -> StringId {
        let value = value.as_ref();
        if let Some(id) = self.lookup.get(value) {
            return *id;
        }
        let id = StringId(self.strings.len() as u32);
        self.strings.push(value.into());
        self.lookup.insert(value.into(), id);
        id
    }

    pub fn resolve_string(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    pub fn lookup_string(&self, value: &str) -> Option<StringId> {
        self.lookup.get(value).copied()
    }

    pub fn push_record(&mut self, record: TypeRecord) -> TypeId {
        let id = TypeId(self.records.len() as u32);
        self.records.push(record);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeRecord {
        &self.records[id.0 as usize]
    }

    pub fn alloc_members<I>(&mut self, records: I) -> ArenaSpan
    where
        I: IntoIterator<Item = MemberRecord>,
    {
        let start = self.members.len();
        self.members.extend(records);
        ArenaSpan::new(start, self.members.len() - start)
    }

    pub fn members(&self, span: ArenaSpan) -> &[MemberRecord] {
        &self.members[span.start()..span.start() + span.len()]
    }
}
