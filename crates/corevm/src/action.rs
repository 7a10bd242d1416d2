//! Action values: a paramlist plus a dispatcher and body, the unit of
//! first-class callability (SPEC_FULL.md §4.5).
//!
//! Grounded on `ouros::function::Function`'s {parameters, body, flags}
//! shape, generalized with the facade/exemplar indirection and the cached
//! dispatch-contract flags (`DEFERS_LOOKBACK`, `QUOTES_FIRST_ARG`,
//! `INVISIBLE`) the spec's §4.5 calls for.

use crate::{
    cell::Cell,
    dispatch::Dispatcher,
    paramlist::Paramlist,
    typeset::{ParamClass, Typeset},
};

/// Header flags cached at construction by scanning parameters in order
/// (SPEC_FULL.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionFlags {
    bits: u8,
}

impl ActionFlags {
    pub const DEFERS_LOOKBACK: u8 = 1 << 0;
    pub const QUOTES_FIRST_ARG: u8 = 1 << 1;
    pub const INVISIBLE: u8 = 1 << 2;
    pub const RETURN: u8 = 1 << 3;
    pub const LEAVE: u8 = 1 << 4;

    #[must_use]
    pub fn has(self, flag: u8) -> bool {
        self.bits & flag != 0
    }

    fn set(&mut self, flag: u8) {
        self.bits |= flag;
    }
}

/// An action value: paramlist, dispatcher, body, and the facade/exemplar
/// indirection used by specialization (SPEC_FULL.md §3, §4.5).
///
/// The "body holder" from the spec's series-level description collapses
/// here into `body`/`dispatcher` fields directly on `Action` — this crate
/// models an action as a first-class Rust value rather than wiring it
/// through `crate::series::Series`'s `Misc::Dispatcher` slot, since no
/// evaluator exists yet to read a body holder back out polymorphically.
/// `crate::series::Misc::Dispatcher` documents where that wiring attaches
/// once an external evaluator is plugged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub paramlist: Paramlist,
    pub dispatcher: Dispatcher,
    pub body: Cell,
    /// Defaults to `None`, meaning "equals `paramlist`" (SPEC_FULL.md §3
    /// "facade"). Set to `Some` only when hijacking/adapting installs a
    /// differently-shaped facade naming a different underlying action.
    pub facade: Option<Paramlist>,
    /// Optional prefilled argument values for specialization (SPEC_FULL.md
    /// §3 "exemplar"); length must equal `facade().parameter_count() - 1`
    /// once the return/leave slot is excluded (SPEC_FULL.md §8 invariant 6
    /// talks about facade length, not raw parameter count, but this crate
    /// keeps the return slot present per the "always-present" decision in
    /// DESIGN.md, so the arithmetic is `facade_len() - 1`).
    pub exemplar: Option<Vec<Cell>>,
    pub flags: ActionFlags,
}

impl Action {
    /// Builds an action, computing the cached flags described in
    /// SPEC_FULL.md §4.5.
    #[must_use]
    pub fn new(paramlist: Paramlist, dispatcher: Dispatcher, body: Cell, builder_return: bool, builder_leave: bool) -> Self {
        let mut flags = ActionFlags::default();
        if builder_return {
            flags.set(ActionFlags::RETURN);
        }
        if builder_leave {
            flags.set(ActionFlags::LEAVE);
        }

        // "first non-hidden, non-local parameter": local/return/leave slots
        // are skipped since they're not argument-fulfilled from the call
        // site.
        let first_fulfilled = paramlist
            .params
            .iter()
            .find(|p| !matches!(p.class, ParamClass::Local | ParamClass::Return | ParamClass::Leave));

        if let Some(p) = first_fulfilled {
            if p.class == ParamClass::Normal {
                flags.set(ActionFlags::DEFERS_LOOKBACK);
            }
            if matches!(p.class, ParamClass::HardQuote | ParamClass::SoftQuote) {
                flags.set(ActionFlags::QUOTES_FIRST_ARG);
            }
        }

        if let Some(idx) = paramlist.return_index {
            if paramlist.params[idx].class == ParamClass::Return && paramlist.params[idx].typeset.is_empty() {
                flags.set(ActionFlags::INVISIBLE);
            }
        }

        Self { paramlist, dispatcher, body, facade: None, exemplar: None, flags }
    }

    /// The effective facade (SPEC_FULL.md §3: "defaults to the action's own
    /// paramlist").
    #[must_use]
    pub fn facade(&self) -> &Paramlist {
        self.facade.as_ref().unwrap_or(&self.paramlist)
    }

    #[must_use]
    pub fn facade_len(&self) -> usize {
        self.facade().parameter_count()
    }

    /// The declared return typeset, if this action carries a `return:`
    /// slot (used by the Returner dispatcher's type check, SPEC_FULL.md
    /// §4.6).
    #[must_use]
    pub fn return_typeset(&self) -> Option<Typeset> {
        let idx = self.paramlist.return_index?;
        let p = &self.paramlist.params[idx];
        (p.class == ParamClass::Return).then_some(p.typeset)
    }
}
