//! Error kinds surfaced by the evaluation runtime core.
//!
//! Mirrors the host crate's own error handling idiom
//! (`exception_private::{ExcType, RunError}`, `resource::ResourceError`):
//! a hand-rolled enum with a manually written `Display` impl and no
//! `thiserror`/`anyhow` dependency, plus a `strum`-derived bare-tag
//! companion enum for stable string round-tripping.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

use crate::{symbol::Symbol, typeset::Typeset};

/// Result alias used pervasively through the crate's fallible operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The bare tag of a [`CoreError`], with no payload.
///
/// Lets an embedder match on error *kind* (for telemetry, retry policy, etc.)
/// without destructuring the full variant, the same role `ExcType` plays
/// relative to `RunError` in the host crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum CoreErrorKind {
    BadSpec,
    DuplicateVariable,
    BadMake,
    BadReturnType,
    CannotReflect,
    IllegalAction,
    Overflow,
    ZeroDivide,
    MathArgs,
    NoValue,
    SizeLimit,
}

/// A failure raised by the core runtime.
///
/// Modelled as a `Result<T, CoreError>` propagated with `?` rather than the
/// host language's non-local `fail`/longjmp transfer (see SPEC_FULL.md §7);
/// [`crate::dispatch::DispatchOutcome::Thrown`] is the separate, non-error
/// channel for RETURN/LEAVE/UNWIND-style throws.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Malformed spec dialect: block-after-block, `<local>` on a typed slot,
    /// a refinement typed `<opt>`, an unrecognized tag, etc.
    BadSpec { reason: &'static str, detail: Option<String> },
    /// Two parameters in the same paramlist share a canonical spelling.
    DuplicateVariable { name: Symbol },
    /// `TO`/`MAKE` of a datatype was given an incompatible input.
    BadMake { kind: &'static str },
    /// A [`crate::dispatch::Dispatcher::Returner`] result failed the
    /// declared return typeset.
    BadReturnType { expected: Typeset, found: Option<&'static str> },
    /// A reflection query is not supported on the given kind.
    CannotReflect { query: &'static str },
    /// The generic dispatch for a kind rejected a verb.
    IllegalAction { verb: &'static str, kind: &'static str },
    /// Arithmetic overflowed its representable range.
    Overflow,
    /// Division (or remainder) by zero.
    ZeroDivide,
    /// Wrong number, or wrong kind, of arguments to a math operation.
    MathArgs { op: &'static str },
    /// A word dereferenced to an unbound or void target.
    NoValue { name: Option<Symbol> },
    /// The interner (or another fixed-capacity table) cannot grow further.
    SizeLimit { what: &'static str, limit: usize },
}

impl CoreError {
    #[must_use]
    pub fn kind(&self) -> CoreErrorKind {
        match self {
            Self::BadSpec { .. } => CoreErrorKind::BadSpec,
            Self::DuplicateVariable { .. } => CoreErrorKind::DuplicateVariable,
            Self::BadMake { .. } => CoreErrorKind::BadMake,
            Self::BadReturnType { .. } => CoreErrorKind::BadReturnType,
            Self::CannotReflect { .. } => CoreErrorKind::CannotReflect,
            Self::IllegalAction { .. } => CoreErrorKind::IllegalAction,
            Self::Overflow => CoreErrorKind::Overflow,
            Self::ZeroDivide => CoreErrorKind::ZeroDivide,
            Self::MathArgs { .. } => CoreErrorKind::MathArgs,
            Self::NoValue { .. } => CoreErrorKind::NoValue,
            Self::SizeLimit { .. } => CoreErrorKind::SizeLimit,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadSpec { reason, detail: Some(detail) } => write!(f, "bad function spec: {reason} ({detail})"),
            Self::BadSpec { reason, detail: None } => write!(f, "bad function spec: {reason}"),
            Self::DuplicateVariable { name } => write!(f, "duplicate variable: {name}"),
            Self::BadMake { kind } => write!(f, "cannot MAKE {kind} from the given input"),
            Self::BadReturnType { expected, found } => {
                write!(f, "return type mismatch: expected {expected:?}, found {found:?}")
            }
            Self::CannotReflect { query } => write!(f, "cannot reflect {query} on this kind"),
            Self::IllegalAction { verb, kind } => write!(f, "{kind} does not support {verb}"),
            Self::Overflow => write!(f, "arithmetic overflow"),
            Self::ZeroDivide => write!(f, "attempt to divide by zero"),
            Self::MathArgs { op } => write!(f, "invalid arguments to {op}"),
            Self::NoValue { name: Some(name) } => write!(f, "{name} has no value"),
            Self::NoValue { name: None } => write!(f, "no value"),
            Self::SizeLimit { what, limit } => write!(f, "{what} cannot grow past {limit}"),
        }
    }
}

impl std::error::Error for CoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [
            CoreErrorKind::BadSpec,
            CoreErrorKind::DuplicateVariable,
            CoreErrorKind::SizeLimit,
        ] {
            let s: &'static str = kind.into();
            assert_eq!(s.parse::<CoreErrorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn display_does_not_panic_on_every_variant() {
        let errs = vec![
            CoreError::Overflow,
            CoreError::ZeroDivide,
            CoreError::MathArgs { op: "add" },
            CoreError::NoValue { name: None },
            CoreError::SizeLimit { what: "interner", limit: 1024 },
        ];
        for e in errs {
            let _ = e.to_string();
            assert_eq!(e.clone(), e);
        }
    }
}
