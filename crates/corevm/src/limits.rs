//! Resource limits / configuration.
//!
//! Grounded on the host crate's `resource::{ResourceTracker, NoLimitTracker,
//! LimitedTracker, ResourceLimits}`: configuration is a plain constructor
//! argument and a pluggable trait, not a `toml`/`serde`-backed file — the
//! spec's Persisted State is explicitly none, so there is nothing for a
//! config-file crate to load.

use crate::error::CoreError;

/// Tunable thresholds for the pool allocator, GC, and symbol interner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Number of allocations permitted between GC cycles before
    /// [`ResourceTracker::should_gc`] starts returning `true`.
    pub gc_ballast: u32,
    /// Maximum number of slots the symbol interner's hash table may grow to
    /// (see the prime ladder in `symbol.rs`).
    pub max_intern_slots: usize,
    /// Maximum number of parameters (including a synthesized return/leave)
    /// a single paramlist may carry.
    pub max_params: usize,
    /// Maximum quote depth before [`CoreError::Overflow`] replaces further
    /// quoting (the spec allows up to 255; embedders may want much less).
    pub max_quote_depth: u8,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            gc_ballast: 4096,
            max_intern_slots: 2_147_483_647,
            max_params: 255,
            max_quote_depth: 255,
        }
    }
}

/// A pluggable resource limiter, chosen by the embedder at
/// [`crate::runtime::Runtime`] construction time.
///
/// [`NoLimitTracker`] is the default: every check compiles away via
/// monomorphization. [`LimitedTracker`] enforces a [`Limits`] and reports
/// violations as [`CoreError`].
pub trait ResourceTracker {
    /// Called once per allocation; returns an error if the allocation would
    /// exceed a configured limit.
    fn on_allocate(&mut self) -> Result<(), CoreError>;
    /// Whether the GC should run before the next allocation.
    fn should_gc(&self) -> bool;
    /// Resets any ballast/counter state after a GC cycle completes.
    fn on_gc_complete(&mut self);
    /// Checks a prospective growth of the interner table against the
    /// configured cap.
    fn check_intern_growth(&mut self, new_slot_count: usize) -> Result<(), CoreError>;
}

/// The default tracker: every operation is unconditionally permitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    #[inline]
    fn on_allocate(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    #[inline]
    fn should_gc(&self) -> bool {
        false
    }

    #[inline]
    fn on_gc_complete(&mut self) {}

    #[inline]
    fn check_intern_growth(&mut self, _new_slot_count: usize) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Enforces a concrete [`Limits`], suitable for sandboxed embedding.
#[derive(Debug, Clone)]
pub struct LimitedTracker {
    limits: Limits,
    allocations_since_gc: u32,
}

impl LimitedTracker {
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self { limits, allocations_since_gc: 0 }
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_allocate(&mut self) -> Result<(), CoreError> {
        self.allocations_since_gc = self.allocations_since_gc.saturating_add(1);
        Ok(())
    }

    fn should_gc(&self) -> bool {
        self.allocations_since_gc >= self.limits.gc_ballast
    }

    fn on_gc_complete(&mut self) {
        self.allocations_since_gc = 0;
    }

    fn check_intern_growth(&mut self, new_slot_count: usize) -> Result<(), CoreError> {
        if new_slot_count > self.limits.max_intern_slots {
            return Err(CoreError::SizeLimit { what: "symbol interner", limit: self.limits.max_intern_slots });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_limit_tracker_never_requests_gc() {
        let mut t = NoLimitTracker;
        for _ in 0..10_000 {
            t.on_allocate().unwrap();
        }
        assert!(!t.should_gc());
    }

    #[test]
    fn limited_tracker_requests_gc_after_ballast_exhausted() {
        let mut t = LimitedTracker::new(Limits { gc_ballast: 3, ..Limits::default() });
        assert!(!t.should_gc());
        for _ in 0..3 {
            t.on_allocate().unwrap();
        }
        assert!(t.should_gc());
        t.on_gc_complete();
        assert!(!t.should_gc());
    }

    #[test]
    fn limited_tracker_rejects_intern_growth_past_cap() {
        let mut t = LimitedTracker::new(Limits { max_intern_slots: 100, ..Limits::default() });
        assert!(t.check_intern_growth(50).is_ok());
        assert!(t.check_intern_growth(101).is_err());
    }
}
