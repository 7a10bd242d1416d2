//! Frame construction for `APPLY`/`DO FRAME!` and the evaluator↔dispatcher
//! contract (SPEC_FULL.md §4.7, §6).
//!
//! Grounded on `ouros::bytecode::vm::call`'s call-frame-construction shape
//! (argument slots filled left-to-right from a call site, pushed/popped
//! around a dispatch), generalized with the exemplar-prefill and pickups
//! rules the spec's §4.7 describes. The frame itself owns only what the
//! dispatcher family in `crate::dispatch` needs; pushing/popping it onto a
//! call stack is the external evaluator's job (SPEC_FULL.md §1 "Out of
//! scope: `Do_Core`").

use crate::{
    action::Action,
    cell::Cell,
    error::{CoreError, CoreResult},
    series::SeriesId,
    typeset::ParamClass,
};

/// Per-slot fill source during argument fulfilment (SPEC_FULL.md §4.7
/// "apply"): tracks, for each facade parameter, where its value should come
/// from.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgSpecial {
    /// No specialization: the caller must supply this argument directly.
    Unspecialized,
    /// Prefilled value from the exemplar.
    Exemplar(Cell),
    /// A refinement explicitly marked used/unused by the exemplar.
    RefinementUsed(bool),
}

/// What `apply` was asked to fill a frame from (SPEC_FULL.md §4.7
/// "synthesise a frame, point the evaluator's per-slot `special` cursor at
/// the fill source").
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyDef {
    /// A context-shaped prefill, one cell per facade parameter.
    Exemplar(Vec<Cell>),
    /// A definition block: set-words bound into the frame's context,
    /// evaluated for side effect, and discarded (SPEC_FULL.md §4.7).
    /// Represented here as pre-resolved (symbol-index, value) pairs — the
    /// set-word binding and block evaluation are the external evaluator's
    /// job; this crate only applies the resulting bindings.
    Block(Vec<(usize, Cell)>),
}

/// A call frame: the evaluator↔dispatcher contract (SPEC_FULL.md §6).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Result cell the dispatcher writes its outcome into.
    pub out: Cell,
    /// The currently executing action; dispatchers like Hijacker/Adapter/
    /// Chainer rewrite this mid-call to redo with a different action
    /// (SPEC_FULL.md §4.6).
    pub phase: Action,
    /// The frame's binding context, if it has been reified into one
    /// (inaccessible once that context's frame has ended, SPEC_FULL.md §3
    /// "Inaccessible varlists").
    pub binding: Option<SeriesId>,
    /// Argument values, one per facade parameter, in paramlist order.
    pub args: Vec<Cell>,
    /// Per-slot fill source, parallel to `args` (SPEC_FULL.md §4.7).
    pub special: Vec<ArgSpecial>,
    /// Scratch cell for dispatcher-internal use (SPEC_FULL.md §6 "cell").
    pub cell: Cell,
    /// The evaluator's post-processing stack (SPEC_FULL.md §4.6 Chainer,
    /// §5 "stack-pushed post-processing runs LIFO"): actions a Chainer
    /// dispatch still owes a call to after `phase` returns. An external
    /// evaluator pops from the back and runs each one, feeding it the
    /// previous result, before yielding the frame's final `out`.
    pub post_process: Vec<Action>,
}

impl Frame {
    /// `make_frame_for(action)` (SPEC_FULL.md §4.7): allocates argument
    /// slots sized to the facade length and fills them from the exemplar
    /// (if any) per the stated per-parameter rule.
    #[must_use]
    pub fn make_frame_for(action: Action) -> Self {
        let facade_len = action.facade_len();
        let mut args = vec![Cell::nulled(); facade_len];
        let mut special = vec![ArgSpecial::Unspecialized; facade_len];

        if let Some(exemplar) = action.exemplar.clone() {
            for (i, p) in action.facade().params.iter().enumerate() {
                let Some(slot) = exemplar.get(i) else { continue };
                args[i] = fill_from_exemplar_rule(p.class, slot);
                special[i] = ArgSpecial::Exemplar(slot.clone());
            }
        }

        Self { out: Cell::nulled(), phase: action, binding: None, args, special, cell: Cell::nulled(), post_process: Vec::new() }
    }

    /// `apply(action, def_or_exemplar)` (SPEC_FULL.md §4.7): builds a frame
    /// and replicates the exemplar-slot fill rule for each (parameter, arg,
    /// special) triple, with a "pickups" pass for refinements supplied out
    /// of order. Argument cells beyond the pickups cursor are left
    /// `Cell::nulled()` (standing in for "initialized to trash", §5
    /// "Ordering guarantees": "safe for GC walk").
    pub fn apply(action: Action, def: ApplyDef) -> CoreResult<Self> {
        let mut frame = Self::make_frame_for(action);

        match def {
            ApplyDef::Exemplar(values) => {
                if values.len() != frame.args.len() {
                    return Err(CoreError::BadMake { kind: "frame!" });
                }
                for (i, p) in frame.phase.facade().params.clone().iter().enumerate() {
                    frame.args[i] = fill_from_exemplar_rule(p.class, &values[i]);
                    frame.special[i] = ArgSpecial::Exemplar(values[i].clone());
                }
            }
            ApplyDef::Block(bindings) => {
                // Pickups pass: apply bindings out of declaration order,
                // leaving any slot never named by the def block at its
                // frame-construction default.
                for (idx, value) in bindings {
                    if idx >= frame.args.len() {
                        return Err(CoreError::BadSpec { reason: "DO FRAME! binding names a slot past the facade length", detail: None });
                    }
                    frame.args[idx] = value.clone();
                    frame.special[idx] = ArgSpecial::Exemplar(value);
                }
            }
        }

        Ok(frame)
    }

    /// Rewrites `phase` to a different action mid-call (SPEC_FULL.md §4.6:
    /// Hijacker/Adapter/Chainer all do this to "redo").
    pub fn swap_phase(&mut self, next: Action) {
        self.phase = next;
    }
}

/// The per-parameter exemplar-slot fill rule shared by
/// `make_frame_for`/`apply` (SPEC_FULL.md §4.7, bulleted list).
fn fill_from_exemplar_rule(class: ParamClass, slot: &Cell) -> Cell {
    if class != ParamClass::Refinement {
        return slot.clone();
    }
    match slot.payload() {
        crate::cell::Payload::Logic(_) => slot.clone(),
        _ if slot.is_nulled() => Cell::nulled(),
        _ => Cell::logic(true),
    }
}
