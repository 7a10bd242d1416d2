//! The explicit runtime context (SPEC_FULL.md §4.8, resolving Open Question
//! B): interner, pool, data stack, and resource tracker threaded through as
//! an ownable value rather than held in process-globals.
//!
//! Grounded on `ouros::heap::Heap<T: ResourceTracker>` (an owned container
//! threaded through the executor, generic over the tracker) and
//! `ouros::resource` (tracker chosen by the embedder at construction).

use crate::{
    cell::Cell,
    error::CoreResult,
    gc::{self, GcStats},
    limits::{NoLimitTracker, ResourceTracker},
    pool::Pool,
    runtime_tracer::{NoopTracer, RuntimeTracer},
    series::{Series, SeriesFlags, SeriesId},
    stack::DataStack,
    symbol::{Interner, Symbol},
};

/// The runtime context (SPEC_FULL.md §4.8): every mutable subsystem an
/// evaluator needs, owned by one value so an embedder can construct more
/// than one independent `Runtime` per process.
///
/// Mixing `Symbol`/`SeriesId` handles from two different `Runtime`s is a
/// programmer error; debug builds assert against it is left to the
/// embedder's evaluator (this crate has no evaluator of its own to
/// intercept the mixing at).
pub struct Runtime<R: ResourceTracker = NoLimitTracker, Tr: RuntimeTracer = NoopTracer> {
    pub interner: Interner,
    pub pool: Pool,
    pub stack: DataStack,
    /// API-handle roots: singular, ROOT-flagged series owned by a frame
    /// context (SPEC_FULL.md §3 "Lifecycle", §6 "API handle contract").
    pub api_handles: Vec<SeriesId>,
    /// The guarded-node stack: series temporarily protected from sweep
    /// while under construction (SPEC_FULL.md §4 "Garbage collector" root
    /// sources).
    pub guarded: Vec<SeriesId>,
    pub tracker: R,
    pub tracer: Tr,
}

impl Runtime<NoLimitTracker, NoopTracer> {
    #[must_use]
    pub fn new() -> Self {
        Self::with(NoLimitTracker, NoopTracer)
    }
}

impl Default for Runtime<NoLimitTracker, NoopTracer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ResourceTracker, Tr: RuntimeTracer> Runtime<R, Tr> {
    #[must_use]
    pub fn with(tracker: R, tracer: Tr) -> Self {
        Self {
            interner: Interner::new(),
            pool: Pool::new(),
            stack: DataStack::new(),
            api_handles: Vec::new(),
            guarded: Vec::new(),
            tracker,
            tracer,
        }
    }

    /// `intern` threaded through this runtime's tracker/tracer
    /// (SPEC_FULL.md §4.1).
    pub fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern_with_tracker(text, &mut self.tracker, &mut self.tracer)
    }

    #[must_use]
    pub fn canon(&self, sym: Symbol) -> Symbol {
        self.interner.canon(sym)
    }

    /// Allocates an unmanaged series: the caller must either free it
    /// manually or call [`Runtime::manage`] before any evaluation step
    /// (SPEC_FULL.md §3 "Lifecycle").
    pub fn alloc(&mut self, series: Series) -> CoreResult<SeriesId> {
        self.tracker.on_allocate()?;
        Ok(self.pool.alloc(series))
    }

    /// Transfers a series to GC custody.
    pub fn manage(&mut self, id: SeriesId) {
        if let Some(series) = self.pool.get_mut(id) {
            series.flags.set(SeriesFlags::MANAGED);
        }
    }

    /// Pushes `id` onto the guarded-node stack, protecting it from the next
    /// sweep regardless of other reachability.
    pub fn guard(&mut self, id: SeriesId) {
        self.guarded.push(id);
    }

    pub fn unguard_to(&mut self, depth: usize) {
        self.guarded.truncate(depth);
    }

    /// Registers `id` as an API-handle root (SPEC_FULL.md §6 "API handle
    /// contract").
    pub fn register_api_handle(&mut self, id: SeriesId) {
        self.api_handles.push(id);
    }

    /// Root discovery (SPEC_FULL.md §4 "Garbage collector"): API handles,
    /// the guarded-node stack, and the data stack's own series references.
    /// Native tables and the call-frame stack are the embedding
    /// evaluator's roots to add on top (this crate has none of its own).
    fn roots(&self) -> Vec<SeriesId> {
        let mut roots = Vec::new();
        roots.extend(self.api_handles.iter().copied());
        roots.extend(self.guarded.iter().copied());
        for cell in self.stack.iter() {
            let mut found = Vec::new();
            gc::cell_series_refs(cell, &mut found);
            roots.extend(found);
        }
        roots
    }

    /// Runs a `recycle` cycle if the tracker says to, or unconditionally
    /// when forced (SPEC_FULL.md §5 "Suspension points": "Any allocation
    /// may trigger a GC cycle when the ballast counter falls to zero").
    pub fn maybe_recycle(&mut self) -> Option<GcStats> {
        if !self.tracker.should_gc() {
            return None;
        }
        Some(self.recycle())
    }

    pub fn recycle(&mut self) -> GcStats {
        let roots = self.roots();
        let stats = gc::recycle(&mut self.pool, roots, &mut self.tracer);
        self.tracker.on_gc_complete();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Series;

    #[test]
    fn guarded_node_survives_recycle_even_unreferenced_elsewhere() {
        let mut rt = Runtime::new();
        let id = rt.alloc(Series::singular(Cell::integer(1))).unwrap();
        rt.manage(id);
        rt.guard(id);
        rt.recycle();
        assert!(rt.pool.get(id).is_some());
    }

    #[test]
    fn unguarded_unreferenced_node_is_collected() {
        let mut rt = Runtime::new();
        let id = rt.alloc(Series::singular(Cell::integer(1))).unwrap();
        rt.manage(id);
        rt.recycle();
        assert!(rt.pool.get(id).is_none());
    }

    #[test]
    fn data_stack_cells_root_their_referenced_series() {
        let mut rt = Runtime::new();
        let target = rt.alloc(Series::singular(Cell::integer(1))).unwrap();
        rt.manage(target);
        rt.stack.push(Cell::new(
            crate::cell::Kind::Word,
            crate::cell::Payload::Word { spelling: Symbol::NONE, binding: Some(target) },
        ));
        rt.recycle();
        assert!(rt.pool.get(target).is_some());
    }
}
