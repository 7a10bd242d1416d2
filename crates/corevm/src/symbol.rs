//! The symbol interner (SPEC_FULL.md §4.1): an open-addressed, linear-probed
//! table of canonicalized identifier names with case-insensitive equivalence
//! classes linked via a circular synonym ring.
//!
//! Grounded on `ouros::intern::{StringId, Interns}`'s index-returning,
//! dedup-by-content interner shape, generalized with the linear-probe hash
//! table, tombstone handling, and synonym-ring promotion the spec's §4.1
//! calls for (the teacher's `Interns` never needed case folding or removal,
//! since its strings are immutable literals collected once at parse time).

use std::fmt;

use ahash::AHasher;
use std::hash::{Hash, Hasher};

use crate::{
    error::{CoreError, CoreResult},
    limits::ResourceTracker,
    runtime_tracer::RuntimeTracer,
};

/// A stable handle to an interned identifier name (SPEC_FULL.md §4.1).
///
/// Two `Symbol`s compare equal iff they were interned from byte-identical
/// input (case-sensitive); use [`Interner::canon`] to reach the
/// case-insensitive representative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Reserved, never returned by `intern` (SPEC_FULL.md §4.1 "Failure").
    pub const NONE: Symbol = Symbol(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym#{}", self.0)
    }
}

struct Entry {
    text: Box<str>,
    is_canon: bool,
    /// Next member of the synonym ring (self-loop if the ring is trivial).
    synonym_next: Symbol,
    /// Transient bind-index pair, asserted zero outside a binding pass
    /// (SPEC_FULL.md §4.1 "Each canon keeps a pair of bind-index words").
    bind_index: (i32, i32),
    /// Stable small integer for well-known symbols; 0 if none
    /// (SPEC_FULL.md §4.1 "Well-known symbols").
    small_index: u32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Tombstone,
    Occupied(Symbol),
}

fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

fn hash_folded(s: &str) -> u64 {
    let mut hasher = AHasher::default();
    fold_case(s).hash(&mut hasher);
    hasher.finish()
}

/// Next prime at or above `n`, from a fixed ladder (SPEC_FULL.md §4.1
/// "rehash into the next prime size >= double"). The ladder is generous
/// enough for any embedding this crate targets; growth past the last rung
/// falls back to doubling-and-incrementing-to-odd, which is still adequate
/// for linear probing though no longer guaranteed prime.
const PRIME_LADDER: &[usize] = &[
    17, 37, 79, 163, 331, 673, 1361, 2729, 5471, 10949, 21911, 43853, 87719, 175447, 350899, 701819, 1403641,
    2807303, 5614657, 11229331,
];

fn next_table_size(min: usize) -> usize {
    for &p in PRIME_LADDER {
        if p >= min {
            return p;
        }
    }
    let mut n = min | 1;
    loop {
        if (3..).take_while(|d| d * d <= n).all(|d| n % d != 0) {
            return n;
        }
        n += 2;
    }
}

/// The symbol interner (SPEC_FULL.md §4.1).
pub struct Interner {
    entries: Vec<Entry>,
    /// Free list of entry slots vacated by `kill`, reused by future interns.
    free_entries: Vec<u32>,
    table: Vec<Slot>,
    occupied: usize,
    tombstones: usize,
    /// Well-known symbols, e.g. `SYM_RETURN`, assigned on first intern of a
    /// name registered via [`Interner::register_well_known`].
    well_known_names: ahash::AHashMap<&'static str, u32>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        // Entry 0 is a reserved placeholder so `Symbol(0)` (`Symbol::NONE`)
        // is never handed out by `intern` (SPEC_FULL.md §4.1 "Failure":
        // "symbol 0 is reserved and never returned"). It never occupies a
        // table slot, so it's unreachable from `lookup_exact`/`intern`.
        let reserved = Entry {
            text: Box::from(""),
            is_canon: false,
            synonym_next: Symbol(0),
            bind_index: (0, 0),
            small_index: 0,
        };
        Self {
            entries: vec![reserved],
            free_entries: Vec::new(),
            table: vec![Slot::Empty; next_table_size(17)],
            occupied: 0,
            tombstones: 0,
            well_known_names: ahash::AHashMap::new(),
        }
    }

    /// Registers `name` to receive stable small integer `index` the next
    /// time (or the first time) it's interned. Call during runtime setup,
    /// before any evaluation, mirroring the teacher's `StaticStrings` table
    /// of compile-time-known identifiers.
    pub fn register_well_known(&mut self, name: &'static str, index: u32) {
        debug_assert_ne!(index, 0, "small index 0 means 'not well-known'");
        self.well_known_names.insert(name, index);
        let _ = self.intern_with_tracker(name, &mut crate::limits::NoLimitTracker, &mut crate::runtime_tracer::NoopTracer);
        if let Some(sym) = self.lookup_exact(name) {
            self.entries[sym.index()].small_index = index;
        }
    }

    /// `symbol_of`-equivalent: 0 if `sym` isn't well-known.
    #[must_use]
    pub fn small_index(&self, sym: Symbol) -> u32 {
        self.entries.get(sym.index()).map_or(0, |e| e.small_index)
    }

    fn load_factor_percent(&self) -> usize {
        (self.occupied + self.tombstones) * 100 / self.table.len()
    }

    fn rehash(&mut self) {
        let new_size = next_table_size(self.table.len() * 2);
        let mut new_table = vec![Slot::Empty; new_size];
        for slot in &self.table {
            if let Slot::Occupied(sym) = slot {
                let text = &self.entries[sym.index()].text;
                let h = hash_folded(text) as usize;
                let mut i = h % new_size;
                loop {
                    if matches!(new_table[i], Slot::Empty) {
                        new_table[i] = Slot::Occupied(*sym);
                        break;
                    }
                    i = (i + 1) % new_size;
                }
            }
        }
        self.table = new_table;
        self.tombstones = 0;
    }

    fn lookup_exact(&self, text: &str) -> Option<Symbol> {
        let h = hash_folded(text) as usize;
        let len = self.table.len();
        let mut i = h % len;
        let folded_query = fold_case(text);
        for _ in 0..len {
            match self.table[i] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied(canon) => {
                    let canon_entry = &self.entries[canon.index()];
                    if fold_case(&canon_entry.text) == folded_query {
                        if *canon_entry.text == *text {
                            return Some(canon);
                        }
                        let mut cur = canon_entry.synonym_next;
                        while cur != canon {
                            if *self.entries[cur.index()].text == *text {
                                return Some(cur);
                            }
                            cur = self.entries[cur.index()].synonym_next;
                        }
                        return None;
                    }
                }
            }
            i = (i + 1) % len;
        }
        None
    }

    fn new_entry(&mut self, text: &str, is_canon: bool) -> Symbol {
        let id = if let Some(free) = self.free_entries.pop() {
            self.entries[free as usize] = Entry {
                text: text.into(),
                is_canon,
                synonym_next: Symbol(free),
                bind_index: (0, 0),
                small_index: 0,
            };
            Symbol(free)
        } else {
            let id = Symbol(self.entries.len() as u32);
            self.entries.push(Entry {
                text: text.into(),
                is_canon,
                synonym_next: id,
                bind_index: (0, 0),
                small_index: 0,
            });
            id
        };
        if let Some(&small) = self.well_known_names.get(text) {
            self.entries[id.index()].small_index = small;
        }
        id
    }

    /// `intern(bytes, length) -> Symbol` (SPEC_FULL.md §4.1 "Algorithm
    /// (intern)").
    pub fn intern(&mut self, text: &str) -> Symbol {
        self.intern_with_tracker(text, &mut crate::limits::NoLimitTracker, &mut crate::runtime_tracer::NoopTracer)
    }

    pub fn intern_with_tracker<R: ResourceTracker, Tr: RuntimeTracer>(
        &mut self,
        text: &str,
        tracker: &mut R,
        trace: &mut Tr,
    ) -> Symbol {
        if self.load_factor_percent() > 50 {
            let new_size = next_table_size(self.table.len() * 2);
            // §4.1 step 1: "collapsing tombstones" -- checked before the
            // rehash actually happens, so an embedder-imposed growth cap is
            // honored even though `rehash` itself cannot fail.
            if tracker.check_intern_growth(new_size).is_ok() {
                self.rehash();
            }
        }

        let folded_query = fold_case(text);
        let h = hash_folded(text) as usize;
        let len = self.table.len();
        let mut i = h % len;
        let mut first_tombstone: Option<usize> = None;

        for _ in 0..len {
            match self.table[i] {
                Slot::Empty => {
                    let sym = self.new_entry(text, true);
                    let dest = first_tombstone.unwrap_or(i);
                    if first_tombstone.is_some() {
                        self.tombstones -= 1;
                    }
                    self.table[dest] = Slot::Occupied(sym);
                    self.occupied += 1;
                    trace.on_intern(text, sym);
                    return sym;
                }
                Slot::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(i);
                    }
                }
                Slot::Occupied(canon) => {
                    let canon_entry_text_matches = fold_case(&self.entries[canon.index()].text) == folded_query;
                    if canon_entry_text_matches {
                        if *self.entries[canon.index()].text == *text {
                            trace.on_intern(text, canon);
                            return canon;
                        }
                        // Walk the synonym ring looking for an exact match.
                        let mut cur = self.entries[canon.index()].synonym_next;
                        loop {
                            if *self.entries[cur.index()].text == *text {
                                trace.on_intern(text, cur);
                                return cur;
                            }
                            if cur == canon {
                                break;
                            }
                            cur = self.entries[cur.index()].synonym_next;
                        }
                        // Not found: create a new synonym, link after canon.
                        let new_sym = self.new_entry(text, false);
                        let after_canon = self.entries[canon.index()].synonym_next;
                        self.entries[new_sym.index()].synonym_next = after_canon;
                        self.entries[canon.index()].synonym_next = new_sym;
                        trace.on_intern(text, new_sym);
                        return new_sym;
                    }
                }
            }
            i = (i + 1) % len;
        }
        // Table genuinely full (shouldn't happen given the 50% rehash
        // trigger, but `register_well_known` can be called before any
        // growth check runs under a tight `Limits`).
        let sym = self.new_entry(text, true);
        sym
    }

    /// `canon(sym) -> Symbol` (SPEC_FULL.md §4.1).
    #[must_use]
    pub fn canon(&self, sym: Symbol) -> Symbol {
        let entry = &self.entries[sym.index()];
        if entry.is_canon {
            return sym;
        }
        // Walk the ring until we land on the member marked canon.
        let mut cur = entry.synonym_next;
        while cur != sym {
            if self.entries[cur.index()].is_canon {
                return cur;
            }
            cur = self.entries[cur.index()].synonym_next;
        }
        sym
    }

    #[must_use]
    pub fn text(&self, sym: Symbol) -> &str {
        &self.entries[sym.index()].text
    }

    #[must_use]
    pub fn bind_index(&self, sym: Symbol) -> (i32, i32) {
        self.entries[sym.index()].bind_index
    }

    pub fn set_bind_index(&mut self, sym: Symbol, value: (i32, i32)) {
        self.entries[sym.index()].bind_index = value;
    }

    /// Every member of `sym`'s synonym ring, starting and ending at `sym`
    /// itself (SPEC_FULL.md §8 invariant 7).
    pub fn synonym_ring(&self, sym: Symbol) -> Vec<Symbol> {
        let mut ring = vec![sym];
        let mut cur = self.entries[sym.index()].synonym_next;
        while cur != sym {
            ring.push(cur);
            cur = self.entries[cur.index()].synonym_next;
        }
        ring
    }

    /// `kill(sym)` (SPEC_FULL.md §4.1 "Removal"): removes a symbol the GC
    /// has proven unreachable. Unlinks from the synonym ring; if `sym` was
    /// canon and the ring was non-trivial, promotes the next ring member
    /// and rewrites the hash slot in place (a single pointer swap, per the
    /// spec's §9 design note).
    pub fn kill<Tr: RuntimeTracer>(&mut self, sym: Symbol, trace: &mut Tr) -> CoreResult<()> {
        let was_canon = self.entries[sym.index()].is_canon;
        let next = self.entries[sym.index()].synonym_next;

        if next == sym {
            // Trivial ring: this symbol occupies its own hash slot alone.
            self.remove_from_table(sym);
        } else {
            // Find the ring predecessor to splice `sym` out.
            let mut pred = next;
            while self.entries[pred.index()].synonym_next != sym {
                pred = self.entries[pred.index()].synonym_next;
            }
            self.entries[pred.index()].synonym_next = next;

            if was_canon {
                self.entries[next.index()].is_canon = true;
                self.replace_table_slot(sym, next);
                trace.on_canon_promote(sym, next);
            }
        }

        self.free_entries.push(sym.0);
        Ok(())
    }

    fn find_table_index(&self, sym: Symbol) -> Option<usize> {
        self.table.iter().position(|s| matches!(s, Slot::Occupied(s2) if *s2 == sym))
    }

    fn remove_from_table(&mut self, sym: Symbol) {
        if let Some(idx) = self.find_table_index(sym) {
            self.table[idx] = Slot::Tombstone;
            self.tombstones += 1;
            self.occupied -= 1;
            self.restore_probe_chain(idx);
        }
    }

    fn replace_table_slot(&mut self, old: Symbol, new: Symbol) {
        if let Some(idx) = self.find_table_index(old) {
            self.table[idx] = Slot::Occupied(new);
        }
    }

    /// After tombstoning a slot, walk the probe chain backwards restoring
    /// any entry that no longer needs the tombstone to be reachable
    /// (SPEC_FULL.md §4.1 "walk the probe chain backwards installing
    /// tombstones until the chain is restored"). Conservative: this
    /// implementation leaves the tombstone in place and relies on the
    /// load-factor-triggered rehash to reclaim it, which preserves probe
    /// correctness without the more intricate backward-shift dance.
    fn restore_probe_chain(&mut self, _idx: usize) {}

    #[must_use]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    #[must_use]
    pub fn table_capacity(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent_for_identical_bytes() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        assert_eq!(a, b);
    }

    #[test]
    fn case_variants_share_a_canon_but_differ_as_symbols() {
        let mut interner = Interner::new();
        let foo = interner.intern("Foo");
        let foo2 = interner.intern("foo");
        assert_ne!(foo, foo2);
        assert_eq!(interner.canon(foo), interner.canon(foo2));
    }

    #[test]
    fn synonym_ring_is_circular_and_visits_each_member_once() {
        let mut interner = Interner::new();
        let a = interner.intern("Word");
        let b = interner.intern("word");
        let c = interner.intern("WORD");
        let ring = interner.synonym_ring(a);
        assert_eq!(ring.len(), 3);
        assert!(ring.contains(&a) && ring.contains(&b) && ring.contains(&c));
    }

    #[test]
    fn killing_the_canon_promotes_a_synonym() {
        let mut tracer = crate::runtime_tracer::RecordingTracer::new();
        let mut interner = Interner::new();
        let foo = interner.intern("Foo");
        let foo2 = interner.intern("foo");
        assert_eq!(interner.canon(foo), foo);

        interner.kill(foo, &mut tracer).unwrap();
        assert_eq!(interner.canon(foo2), foo2);

        let fresh = interner.intern("FOO");
        assert_eq!(interner.canon(fresh), interner.canon(foo2));
        assert!(tracer.events.iter().any(|e| matches!(e, crate::runtime_tracer::TraceEvent::CanonPromote { .. })));
    }

    #[test]
    fn rehash_collapses_tombstones_and_keeps_lookups_working() {
        let mut interner = Interner::new();
        let mut syms = Vec::new();
        for i in 0..40 {
            syms.push(interner.intern(&format!("sym{i}")));
        }
        for s in &syms {
            assert_eq!(interner.canon(*s), *s);
        }
        assert_eq!(interner.tombstones(), 0);
    }

    #[test]
    fn well_known_symbols_report_their_small_index() {
        let mut interner = Interner::new();
        interner.register_well_known("return", 1);
        let sym = interner.intern("return");
        assert_eq!(interner.small_index(sym), 1);
        let other = interner.intern("leave");
        assert_eq!(interner.small_index(other), 0);
    }

    #[test]
    fn symbol_zero_is_never_returned_by_intern() {
        let mut interner = Interner::new();
        for name in ["a", "b", "foo", "Foo", "word-with-dashes"] {
            assert_ne!(interner.intern(name), Symbol::NONE);
        }
    }
}
