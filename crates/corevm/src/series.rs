//! The heap series node (SPEC_FULL.md §3 "Series node").
//!
//! Grounded on `ouros::heap::{Heap, HeapData, HeapId}`'s arena-of-variants
//! shape, generalized per the spec's §9 design note: rather than overlay
//! link/misc slots inside a single struct, each series subclass gets its own
//! variant of [`Link`]/[`Misc`], and "only touch the subclass-appropriate
//! slot" is a match arm, not a raw-pointer cast.

use smallvec::SmallVec;

use crate::cell::Cell;

/// Index of a series node inside `crate::pool::Pool` (mirrors
/// `ouros::heap::HeapId`: a plain `u32` newtype, no embedded generation
/// counter — the GC's mark/sweep cycle is the reuse boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(pub u32);

impl SeriesId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Series-class header bits layered on top of the shared NODE/FREE/CELL/
/// MANAGED/ROOT/MARKED bits (SPEC_FULL.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeriesFlags {
    bits: u32,
}

impl SeriesFlags {
    pub const MANAGED: u32 = 1 << 0;
    pub const ROOT: u32 = 1 << 1;
    pub const MARKED: u32 = 1 << 2;
    pub const ARRAY: u32 = 1 << 3;
    pub const PARAMLIST: u32 = 1 << 4;
    pub const VARLIST: u32 = 1 << 5;
    pub const PAIRLIST: u32 = 1 << 6;
    pub const FILE_LINE: u32 = 1 << 7;
    pub const FIXED_SIZE: u32 = 1 << 8;
    pub const POWER_OF_2: u32 = 1 << 9;
    pub const UTF8: u32 = 1 << 10;
    pub const INACCESSIBLE: u32 = 1 << 11;
    pub const CANON: u32 = 1 << 12;
    pub const SINGULAR: u32 = 1 << 13;

    #[must_use]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub fn has(self, flag: u32) -> bool {
        self.bits & flag != 0
    }

    pub fn set(&mut self, flag: u32) {
        self.bits |= flag;
    }

    pub fn clear(&mut self, flag: u32) {
        self.bits &= !flag;
    }
}

/// The polymorphic `link` slot (SPEC_FULL.md §3, §9).
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    None,
    /// Source array: name of the originating file.
    FileName(Option<crate::symbol::Symbol>),
    /// Paramlist: the facade (defaults to self-reference, installed after
    /// construction since the node doesn't exist until allocated).
    Facade(Option<SeriesId>),
    /// Varlist: the keysource (its originating paramlist).
    Keysource(SeriesId),
    /// Interned string: next member of the synonym ring.
    Synonym(SeriesId),
    /// Map: the auxiliary hash index.
    Hashlist(SeriesId),
    /// API handle: the owning frame context.
    Owner(SeriesId),
    /// Keylist copy: the paramlist it was copied from (for facade chains).
    Ancestor(SeriesId),
}

/// The polymorphic `misc` slot (SPEC_FULL.md §3, §9).
#[derive(Debug, Clone, PartialEq)]
pub enum Misc {
    None,
    /// Paramlist/varlist: optional meta-context (description, etc).
    MetaContext(Option<SeriesId>),
    /// Source array: originating line number.
    LineNumber(u32),
    /// Action body holder: dispatcher identity (see `crate::dispatch`).
    Dispatcher(crate::dispatch::Dispatcher),
    /// Canon symbol: transient bind-index, asserted zero outside binding.
    BindIndex(i32),
}

/// Inline storage discriminant: a *singular* series holds exactly one cell
/// in-line; a *dynamic* series owns an out-of-line `Vec<Cell>` (arrays) or
/// byte buffer (strings/binaries).
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Singular(Cell),
    Dynamic(SmallVec<[Cell; 0]>),
    Bytes(Vec<u8>),
}

/// A heap series node: header bits, polymorphic link/misc slots, and the
/// cell/byte storage (SPEC_FULL.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub flags: SeriesFlags,
    pub link: Link,
    pub misc: Misc,
    pub storage: Storage,
}

impl Series {
    #[must_use]
    pub fn singular(cell: Cell) -> Self {
        Self { flags: SeriesFlags::empty(), link: Link::None, misc: Misc::None, storage: Storage::Singular(cell) }
    }

    #[must_use]
    pub fn array(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut flags = SeriesFlags::empty();
        flags.set(SeriesFlags::ARRAY);
        Self {
            flags,
            link: Link::None,
            misc: Misc::None,
            storage: Storage::Dynamic(cells.into_iter().collect()),
        }
    }

    #[must_use]
    pub fn utf8(bytes: Vec<u8>) -> Self {
        let mut flags = SeriesFlags::empty();
        flags.set(SeriesFlags::UTF8);
        Self { flags, link: Link::None, misc: Misc::None, storage: Storage::Bytes(bytes) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Singular(_) => 1,
            Storage::Dynamic(v) => v.len(),
            Storage::Bytes(b) => b.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        match &self.storage {
            Storage::Singular(c) => std::slice::from_ref(c),
            Storage::Dynamic(v) => v.as_slice(),
            Storage::Bytes(_) => &[],
        }
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        match &mut self.storage {
            Storage::Singular(c) => std::slice::from_mut(c),
            Storage::Dynamic(v) => v.as_mut_slice(),
            Storage::Bytes(_) => &mut [],
        }
    }

    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.flags.has(SeriesFlags::MANAGED)
    }

    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.flags.has(SeriesFlags::MARKED)
    }

    /// Every cell/node this series directly references, for GC propagation
    /// (SPEC_FULL.md §9: "propagate subclass-specific references... inside
    /// the propagation loop, never inside the enqueue routine" — this just
    /// enumerates candidates; `crate::gc` decides what to do with them).
    pub fn referenced_series(&self) -> impl Iterator<Item = SeriesId> + '_ {
        let from_link = match &self.link {
            Link::Facade(Some(id)) | Link::Keysource(id) | Link::Synonym(id) | Link::Hashlist(id) | Link::Owner(id) | Link::Ancestor(id) => {
                Some(*id)
            }
            _ => None,
        };
        let from_misc = match &self.misc {
            Misc::MetaContext(Some(id)) => Some(*id),
            _ => None,
        };
        from_link.into_iter().chain(from_misc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_series_reports_length_one() {
        let s = Series::singular(Cell::integer(1));
        assert_eq!(s.len(), 1);
        assert!(!s.is_empty());
    }

    #[test]
    fn array_series_tracks_cells() {
        let s = Series::array([Cell::integer(1), Cell::integer(2), Cell::integer(3)]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.cells()[1], Cell::integer(2));
    }

    #[test]
    fn referenced_series_surfaces_link_and_misc() {
        let mut s = Series::array([]);
        s.link = Link::Facade(Some(SeriesId(7)));
        s.misc = Misc::MetaContext(Some(SeriesId(9)));
        let refs: Vec<_> = s.referenced_series().collect();
        assert_eq!(refs, vec![SeriesId(7), SeriesId(9)]);
    }
}
