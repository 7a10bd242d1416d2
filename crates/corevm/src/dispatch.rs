//! The dispatcher family (SPEC_FULL.md §4.6): a per-action callback with a
//! distinct type/return contract, invoked by the external evaluator against
//! a constructed `crate::frame::Frame`.
//!
//! Grounded on `ouros::bytecode::vm::call`'s per-callable-kind dispatch
//! table (native/def-function/ext-function each had a distinct call
//! contract there too), generalized to the spec's twelve named dispatchers.
//! The evaluator itself (`Do_Core`) is out of scope (SPEC_FULL.md §1); this
//! module defines the `Evaluator` trait as the seam an external evaluator
//! plugs into, mirroring the spec's §6 "Evaluator <-> dispatcher contract".

use crate::{
    action::Action,
    cell::{Cell, Kind, Payload},
    error::{CoreError, CoreResult},
    frame::Frame,
    typeset::Typeset,
};

/// What a dispatch produced (SPEC_FULL.md §4.6): "a value in the frame's
/// out cell, a thrown value in the out cell, invisibility, redo-checked,
/// redo-unchecked".
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Value(Cell),
    Thrown(Cell),
    Invisible,
    RedoChecked,
    RedoUnchecked,
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_thrown(&self) -> bool {
        matches!(self, DispatchOutcome::Thrown(_))
    }
}

/// The `Do_Core` contract this crate consumes but does not implement
/// (SPEC_FULL.md §1, §6): "evaluator... supplies it with frames". An
/// external evaluator provides this to run an action body to completion.
pub trait Evaluator {
    fn eval(&mut self, body: &Cell) -> CoreResult<DispatchOutcome>;
}

/// The dispatcher family (SPEC_FULL.md §4.6). Each variant's payload is the
/// "body" content that dispatcher interprets; recursive dispatchers
/// (Hijacker/Adapter/Encloser) box the actions they wrap so `Action` (which
/// itself holds a `Dispatcher`) stays a finite-size type.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatcher {
    /// Body is empty; returns void unconditionally — cheap to hijack.
    Noop,
    /// Evaluate body; result is whatever the body yields.
    Unchecked,
    /// Evaluate body; discard, return void.
    Voider,
    /// Evaluate body; type-check result against the return parameter.
    Returner,
    /// Evaluate body into a throwaway cell; return invisible.
    Elider,
    /// Empty-body specialization of Elider.
    Commenter,
    /// Body holds a datatype; true iff arg 1's kind matches.
    DatatypeChecker(Kind),
    /// Body holds a typeset; true iff arg 1's kind is in the set.
    TypesetChecker(Typeset),
    /// Body holds an action value; redo against it.
    Hijacker(Box<Action>),
    /// Body is [prelude, adaptee]; evaluate prelude, then redo-checked
    /// against adaptee.
    Adapter { prelude: Cell, adaptee: Box<Action> },
    /// Body is [inner, outer]; outer is called with a reified frame value
    /// for inner.
    Encloser { inner: Box<Action>, outer: Box<Action> },
    /// Body is an array of actions; chain their results left to right.
    Chainer(Vec<Action>),
    /// Default for unwired kinds: raise "datatype does not dispatch".
    Fail { kind: &'static str },
    /// Body stores an action-symbol; dispatch is delegated to a
    /// first-argument-type-keyed sub-dispatcher the host registers
    /// (SPEC_FULL.md §4.6 "Action (typed dispatch)"). The sub-dispatcher
    /// table itself lives on `crate::runtime::Runtime`, not here.
    ActionTyped(crate::symbol::Symbol),
}

/// Runs `action`'s dispatcher against `frame` (SPEC_FULL.md §4.6 table).
///
/// `eval` supplies the `Do_Core` contract for dispatchers that need to run
/// a body block. Throw-propagation is the caller's responsibility for
/// dispatchers that merely forward it (SPEC_FULL.md §5 "Cancellation").
pub fn dispatch<E: Evaluator>(frame: &mut Frame, eval: &mut E) -> CoreResult<DispatchOutcome> {
    // Matched by value (not `&frame.phase.dispatcher`): several arms need to
    // call `frame.swap_phase`, which takes `&mut Frame`, and that can't
    // overlap with a borrow still rooted in `frame.phase`.
    let dispatcher = frame.phase.dispatcher.clone();
    match dispatcher {
        Dispatcher::Noop => Ok(DispatchOutcome::Value(Cell::nulled())),

        Dispatcher::Unchecked => eval.eval(&frame.phase.body.clone()),

        Dispatcher::Voider => match eval.eval(&frame.phase.body.clone())? {
            out @ DispatchOutcome::Thrown(_) => Ok(out),
            _ => Ok(DispatchOutcome::Value(Cell::nulled())),
        },

        Dispatcher::Returner => {
            let outcome = eval.eval(&frame.phase.body.clone())?;
            match outcome {
                DispatchOutcome::Thrown(_) => Ok(outcome),
                DispatchOutcome::Value(ref v) => {
                    let expected = frame.phase.return_typeset().unwrap_or_else(Typeset::any_value);
                    let kind_ok = match v.kind() {
                        Some(k) => expected.has_kind(k),
                        None => expected.has_flag(crate::typeset::PseudoFlag::Endable),
                    };
                    if kind_ok {
                        Ok(outcome)
                    } else {
                        Err(CoreError::BadReturnType { expected, found: None })
                    }
                }
                _ => Ok(outcome),
            }
        }

        Dispatcher::Elider => match eval.eval(&frame.phase.body.clone())? {
            out @ DispatchOutcome::Thrown(_) => Ok(out),
            DispatchOutcome::Value(v) => {
                frame.cell = v;
                Ok(DispatchOutcome::Invisible)
            }
            _ => Ok(DispatchOutcome::Invisible),
        },

        Dispatcher::Commenter => Ok(DispatchOutcome::Invisible),

        Dispatcher::DatatypeChecker(kind) => {
            let matches_kind = frame.args.first().and_then(Cell::kind) == Some(kind);
            Ok(DispatchOutcome::Value(Cell::logic(matches_kind)))
        }

        Dispatcher::TypesetChecker(ts) => {
            let matches_kind = frame.args.first().and_then(Cell::kind).is_some_and(|k| ts.has_kind(k));
            Ok(DispatchOutcome::Value(Cell::logic(matches_kind)))
        }

        Dispatcher::Hijacker(target) => {
            frame.swap_phase(*target);
            Ok(DispatchOutcome::RedoUnchecked)
        }

        Dispatcher::Adapter { prelude, adaptee } => {
            let outcome = eval.eval(&prelude)?;
            if outcome.is_thrown() {
                return Ok(outcome);
            }
            frame.swap_phase(*adaptee);
            Ok(DispatchOutcome::RedoChecked)
        }

        Dispatcher::Encloser { inner, outer } => {
            // Reify the frame as a FRAME! value for the outer action; this
            // crate represents that reification as the inner action's body
            // cell rather than a full varlist, since no evaluator exists
            // yet to DO a FRAME! value back into a call.
            let reified = Cell::new(Kind::Frame, Payload::Action { paramlist: frame.binding.unwrap_or(crate::series::SeriesId(0)) });
            let mut outer_frame = Frame::make_frame_for(*outer);
            if let Some(first) = outer_frame.args.first_mut() {
                *first = reified;
            }
            let outcome = eval.eval(&outer_frame.phase.body.clone())?;
            let _ = inner;
            Ok(outcome)
        }

        Dispatcher::Chainer(rest) => {
            let mut iter = rest.into_iter();
            if let Some(first) = iter.next() {
                // S5: chain [f, g, h] pushes h then g (reverse of the
                // array minus the first) onto the post-processing stack,
                // then swaps phase to f. Popping from the back of
                // `post_process` after f returns yields g first, then h.
                let mut pushed: Vec<Action> = iter.collect();
                pushed.reverse();
                frame.post_process.extend(pushed);
                frame.swap_phase(first);
                Ok(DispatchOutcome::RedoUnchecked)
            } else {
                Ok(DispatchOutcome::Value(Cell::nulled()))
            }
        }

        Dispatcher::Fail { kind } => Err(CoreError::IllegalAction { verb: "dispatch", kind }),

        Dispatcher::ActionTyped(_sym) => Err(CoreError::CannotReflect { query: "typed-dispatch table not registered" }),
    }
}
