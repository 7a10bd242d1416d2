//! Zero-cost instrumentation hooks, standing in for a logging dependency.
//!
//! Grounded on the host crate's `tracer::VmTracer`: a trait with one method
//! per subsystem event, a [`NoopTracer`] whose methods are empty `#[inline]`
//! bodies (monomorphizes away entirely, no vtable, no branch), and a handful
//! of concrete tracers for different observation needs. `gc` and `symbol`
//! are generic over `Tr: RuntimeTracer` and call these hooks at the relevant
//! points; `on_action_dispatch`/`on_duplicate_variable` are here for an
//! embedding evaluator that threads a tracer through its own dispatch loop
//! and spec-parsing pass, since this crate's `dispatch`/`paramlist` modules
//! are plain functions with no `Runtime` of their own to carry one. This is
//! the crate's only "logging" story, matching the host crate's own
//! abstinence from an external tracing/logging crate.

use crate::{dispatch::Dispatcher, gc::GcStats, symbol::Symbol};

/// A single recorded event, used by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Intern { text: String, symbol: Symbol },
    CanonPromote { old: Symbol, new: Symbol },
    GcStart { live_before: usize },
    GcEnd { stats: GcStats },
    ActionDispatch { dispatcher: Dispatcher },
    DuplicateVariable { symbol: Symbol },
}

/// Hook points an embedder can observe without forcing any work on the
/// default (no-op) path.
pub trait RuntimeTracer {
    #[inline]
    fn on_intern(&mut self, _text: &str, _symbol: Symbol) {}
    #[inline]
    fn on_canon_promote(&mut self, _old: Symbol, _new: Symbol) {}
    #[inline]
    fn on_gc_start(&mut self, _live_before: usize) {}
    #[inline]
    fn on_gc_end(&mut self, _stats: &GcStats) {}
    #[inline]
    fn on_action_dispatch(&mut self, _dispatcher: Dispatcher) {}
    #[inline]
    fn on_duplicate_variable(&mut self, _symbol: Symbol) {}
}

/// The production default: every hook compiles away to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl RuntimeTracer for NoopTracer {}

/// Prints each event to stderr as it happens. Useful for interactive
/// debugging of a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrTracer;

impl RuntimeTracer for StderrTracer {
    fn on_intern(&mut self, text: &str, symbol: Symbol) {
        eprintln!("intern {text:?} -> {symbol}");
    }

    fn on_canon_promote(&mut self, old: Symbol, new: Symbol) {
        eprintln!("canon promote {old} -> {new}");
    }

    fn on_gc_start(&mut self, live_before: usize) {
        eprintln!("gc start, {live_before} live");
    }

    fn on_gc_end(&mut self, stats: &GcStats) {
        eprintln!("gc end: {stats:?}");
    }

    fn on_action_dispatch(&mut self, dispatcher: Dispatcher) {
        eprintln!("dispatch {dispatcher:?}");
    }

    fn on_duplicate_variable(&mut self, symbol: Symbol) {
        eprintln!("duplicate variable {symbol}");
    }
}

/// Appends every event to a `Vec`, for deterministic post-mortem inspection
/// in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    pub events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuntimeTracer for RecordingTracer {
    fn on_intern(&mut self, text: &str, symbol: Symbol) {
        self.events.push(TraceEvent::Intern { text: text.to_owned(), symbol });
    }

    fn on_canon_promote(&mut self, old: Symbol, new: Symbol) {
        self.events.push(TraceEvent::CanonPromote { old, new });
    }

    fn on_gc_start(&mut self, live_before: usize) {
        self.events.push(TraceEvent::GcStart { live_before });
    }

    fn on_gc_end(&mut self, stats: &GcStats) {
        self.events.push(TraceEvent::GcEnd { stats: stats.clone() });
    }

    fn on_action_dispatch(&mut self, dispatcher: Dispatcher) {
        self.events.push(TraceEvent::ActionDispatch { dispatcher });
    }

    fn on_duplicate_variable(&mut self, symbol: Symbol) {
        self.events.push(TraceEvent::DuplicateVariable { symbol });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_tracer_is_inert() {
        let mut t = NoopTracer;
        t.on_gc_start(0);
        t.on_gc_end(&GcStats::default());
    }

    #[test]
    fn recording_tracer_accumulates_events() {
        let mut t = RecordingTracer::new();
        t.on_gc_start(3);
        t.on_gc_end(&GcStats::default());
        assert_eq!(t.events.len(), 2);
        assert!(matches!(t.events[0], TraceEvent::GcStart { live_before: 3 }));
    }
}
