//! Evaluation runtime core for a homoiconic, dynamically-typed language in
//! the Rebol/Ren-C tradition.
//!
//! This crate owns four interlocking subsystems: the uniform [`cell::Cell`]
//! value representation and its [`series`] backing store, the [`symbol`]
//! interner, the [`gc`] mark-and-sweep collector, and the
//! [`action`]/[`dispatch`]/[`frame`] machinery that builds and calls
//! first-class functions. An external bytecode/AST evaluator is expected to
//! drive all of this through a [`Runtime`](runtime::Runtime) and the
//! `Dispatcher(Frame) -> Result` contract in [`dispatch`]; this crate does
//! not contain an evaluator of its own.

mod action;
mod cell;
mod dispatch;
mod error;
mod frame;
mod gc;
mod limits;
mod paramlist;
mod pool;
mod runtime;
mod runtime_tracer;
mod series;
mod stack;
mod symbol;
mod typeset;

pub use crate::{
    action::{Action, ActionFlags},
    cell::{Cell, CellFlags, ImmediateValue, Kind, Payload},
    dispatch::{dispatch, DispatchOutcome, Dispatcher, Evaluator},
    error::{CoreError, CoreErrorKind},
    frame::{ApplyDef, ArgSpecial, Frame},
    gc::{GcStats, VariadicSource},
    limits::{LimitedTracker, Limits, NoLimitTracker, ResourceTracker},
    paramlist::{BuilderFlags, Meta, Paramlist},
    runtime::Runtime,
    runtime_tracer::{NoopTracer, RecordingTracer, RuntimeTracer, StderrTracer, TraceEvent},
    series::{Link, Misc, Series, SeriesFlags, SeriesId},
    symbol::Symbol,
    typeset::{ParamClass, Typeset},
};
