//! Non-recursive mark-and-sweep garbage collector (SPEC_FULL.md §4, §9).
//!
//! Grounded on `ouros::heap::Heap`'s arena-of-`Option<T>` sweep shape
//! (iterate every slot, free the dead ones), generalized with the explicit
//! mark work-stack the spec's §9 design note requires ("Recursion-free GC
//! is mandatory... propagate subclass-specific references... inside the
//! propagation loop, never inside the enqueue routine").

use crate::{
    cell::{Cell, Payload},
    pool::Pool,
    runtime_tracer::RuntimeTracer,
    series::{SeriesFlags, SeriesId},
};

/// Outcome of one `recycle` cycle (SPEC_FULL.md §4 "Garbage collector").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcStats {
    pub live_before: usize,
    pub live_after: usize,
    pub collected: usize,
}

/// A transient C-varargs-style iterator whose state is not heap-resident
/// and so is invisible to the mark phase until reified (SPEC_FULL.md §5
/// "Suspension points", §9 "Reification of C variadic argument sources").
pub trait VariadicSource {
    /// Materializes the remaining elements into a heap array in `pool` and
    /// returns its id, so the GC can mark through it like any other series.
    /// Must be called — and the source repointed at the array — before
    /// `recycle`'s mark phase starts, never during marking itself
    /// (SPEC_FULL.md §9: "mutated in place during GC setup, not during
    /// marking").
    fn reify(&mut self, pool: &mut Pool) -> SeriesId;
}

/// Every `SeriesId` a cell's payload directly references, recursing through
/// inline `Quoted` wrapping (SPEC_FULL.md §3 "all bindable inner cells
/// share their binding with the wrapping quoted cell" means marking must
/// see through the wrapper, not stop at it).
fn payload_refs(payload: &Payload, out: &mut Vec<SeriesId>) {
    match payload {
        Payload::Series { series, .. } => out.push(*series),
        Payload::Word { binding: Some(b), .. } => out.push(*b),
        Payload::Action { paramlist } => out.push(*paramlist),
        Payload::Context { varlist } => out.push(*varlist),
        Payload::QuotedIndirect { inner, .. } => out.push(*inner),
        Payload::Quoted { inner, .. } => payload_refs(inner, out),
        _ => {}
    }
}

pub(crate) fn cell_series_refs(cell: &Cell, out: &mut Vec<SeriesId>) {
    payload_refs(cell.payload(), out);
}

/// Runs one mark-and-sweep cycle (SPEC_FULL.md §4, §8 invariants 3-4).
///
/// `roots` seeds the mark work-stack: API handles, the guarded-node stack,
/// the data stack, native tables, and the call-frame stack (SPEC_FULL.md
/// §1) are all the caller's responsibility to enumerate into `roots` (and,
/// for variadic sources, to reify via [`VariadicSource::reify`] first) —
/// this function only walks the graph from whatever roots it's given.
pub fn recycle<Tr: RuntimeTracer>(pool: &mut Pool, roots: impl IntoIterator<Item = SeriesId>, trace: &mut Tr) -> GcStats {
    let live_before = pool.live_count();
    trace.on_gc_start(live_before);

    let mut work: Vec<SeriesId> = roots.into_iter().collect();
    let mut scratch: Vec<SeriesId> = Vec::new();

    while let Some(id) = work.pop() {
        let Some(series) = pool.get_mut(id) else { continue };
        if series.is_marked() {
            continue;
        }
        series.flags.set(SeriesFlags::MARKED);

        scratch.clear();
        scratch.extend(series.referenced_series());
        for cell in series.cells() {
            cell_series_refs(cell, &mut scratch);
        }
        work.extend(scratch.drain(..));
    }

    let mut collected = 0usize;
    let ids: Vec<SeriesId> = pool.iter_ids().collect();
    for id in ids {
        let Some(series) = pool.get(id) else { continue };
        let managed = series.is_managed();
        let marked = series.is_marked();
        if managed && !marked {
            pool.free(id);
            collected += 1;
        } else if marked {
            // Survivor: clear MARKED so the next cycle starts clean
            // (SPEC_FULL.md §3 invariant: "sweep... clears MARKED on
            // survivors").
            pool.get_mut(id).expect("id came from iter_ids").flags.clear(SeriesFlags::MARKED);
        }
    }

    let stats = GcStats { live_before, live_after: pool.live_count(), collected };
    trace.on_gc_end(&stats);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::Kind,
        runtime_tracer::NoopTracer,
        series::Series,
    };

    fn manage(pool: &mut Pool, mut series: Series) -> SeriesId {
        series.flags.set(SeriesFlags::MANAGED);
        pool.alloc(series)
    }

    #[test]
    fn invariant_3_every_reachable_node_survives_one_cycle() {
        let mut pool = Pool::new();
        let leaf = manage(&mut pool, Series::singular(Cell::integer(1)));
        let mut root_series = Series::array([]);
        root_series.link = crate::series::Link::Facade(Some(leaf));
        let root = manage(&mut pool, root_series);

        let mut tracer = NoopTracer;
        let stats = recycle(&mut pool, [root], &mut tracer);
        assert_eq!(stats.collected, 0);
        assert!(pool.get(leaf).is_some());
        assert!(pool.get(root).is_some());
    }

    #[test]
    fn unreachable_managed_node_is_swept() {
        let mut pool = Pool::new();
        let garbage = manage(&mut pool, Series::singular(Cell::integer(1)));
        let mut tracer = NoopTracer;
        let stats = recycle(&mut pool, [], &mut tracer);
        assert_eq!(stats.collected, 1);
        assert!(pool.get(garbage).is_none());
    }

    #[test]
    fn invariant_4_idempotent_double_recycle() {
        let mut pool = Pool::new();
        let leaf = manage(&mut pool, Series::singular(Cell::integer(1)));
        let mut tracer = NoopTracer;
        recycle(&mut pool, [], &mut tracer);
        let after_first = pool.live_count();
        assert_eq!(after_first, 0);
        assert!(pool.get(leaf).is_none());

        let live_before_second = pool.live_count();
        recycle(&mut pool, [], &mut tracer);
        assert_eq!(pool.live_count(), live_before_second);
    }

    #[test]
    fn unmanaged_nodes_are_never_swept() {
        let mut pool = Pool::new();
        let unmanaged = pool.alloc(Series::singular(Cell::integer(1)));
        let mut tracer = NoopTracer;
        let stats = recycle(&mut pool, [], &mut tracer);
        assert_eq!(stats.collected, 0);
        assert!(pool.get(unmanaged).is_some());
    }

    /// S6: a self-referential chain 100,000 levels deep does not overflow
    /// the Rust call stack, because marking uses an explicit work-stack
    /// rather than recursion (SPEC_FULL.md §8 scenario S6, §9).
    #[test]
    fn s6_deep_self_referential_chain_does_not_overflow() {
        let mut pool = Pool::new();
        const DEPTH: usize = 100_000;

        let mut prev: Option<SeriesId> = None;
        let head = {
            let mut id = None;
            for _ in 0..DEPTH {
                let mut s = Series::array([]);
                if let Some(p) = prev {
                    s.link = crate::series::Link::Facade(Some(p));
                }
                let new_id = manage(&mut pool, s);
                prev = Some(new_id);
                id = Some(new_id);
            }
            id.unwrap()
        };
        let _ = head;

        // Close the cycle: the deepest node points back at the head.
        let deepest = prev.unwrap();
        pool.get_mut(deepest).unwrap().link = crate::series::Link::Facade(Some(head));

        let mut tracer = NoopTracer;
        let stats = recycle(&mut pool, [head], &mut tracer);
        assert_eq!(stats.collected, 0);
    }

    #[test]
    fn marks_through_inline_quote_wrapping() {
        let mut pool = Pool::new();
        let target = manage(&mut pool, Series::singular(Cell::integer(1)));
        let word = Cell::new(
            Kind::Word,
            Payload::Word { spelling: crate::symbol::Symbol::NONE, binding: Some(target) },
        );
        let quoted = word.quote_inline();
        let holder = manage(&mut pool, Series::singular(quoted));

        let mut tracer = NoopTracer;
        let stats = recycle(&mut pool, [holder], &mut tracer);
        assert_eq!(stats.collected, 0);
        assert!(pool.get(target).is_some());
    }
}
