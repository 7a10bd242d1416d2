//! The paramlist builder (SPEC_FULL.md §4.4): parses a Rebol-style spec
//! dialect into a paramlist, handling `return:`/`leave:`, `<local>`/`<with>`
//! tags, and refinements.
//!
//! Grounded on `ouros::signature`'s two-pass spec-to-parameter-list shape
//! (collect tokens, then resolve into a fixed parameter table with a
//! duplicate-name check) generalized to the historical dialect's
//! description/type-block/note accumulator and definitional-return
//! synthesis the spec calls for.

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    cell::Kind,
    error::{CoreError, CoreResult},
    symbol::{Interner, Symbol},
    typeset::{ParamClass, Typeset},
};

/// The default return typeset when a spec synthesizes `return:` without an
/// explicit type block (SPEC_FULL.md §8 scenario S1: "any-value-except-
/// void-and-action").
fn default_return_typeset() -> Typeset {
    let mut ts = Typeset::any_value();
    ts.clear_kind(Kind::Action);
    ts
}

/// One token of the spec dialect grammar (SPEC_FULL.md §6): an external
/// scanner would emit a stream of these from a spec block. This crate
/// receives them as data — scanning itself is out of scope (SPEC_FULL.md
/// §1).
#[derive(Debug, Clone, PartialEq)]
pub enum SpecItem {
    /// A description or parameter-notes string.
    Str(String),
    /// `<local>`, `<with>`, or any other bare tag at the top level.
    Tag(&'static str),
    /// A type-block, e.g. `[integer! decimal!]`, already resolved to a
    /// typeset by the caller (scanning/typeset-parsing is
    /// `crate::typeset::parse_type_block`'s job, invoked before this stream
    /// is built).
    TypeBlock(Typeset),
    /// Bare word: normal or local parameter, depending on current mode.
    Word(String),
    /// `name:` get-word: hard-quote parameter.
    GetWord(String),
    /// `'name` lit-word: soft-quote parameter.
    LitWord(String),
    /// `#name` issue: tight parameter.
    Issue(String),
    /// `/name` refinement.
    Refinement(String),
    /// `name:` set-word: pure-local, or `return:`/`leave:`.
    SetWord(String),
}

/// Flags controlling `build_paramlist` (SPEC_FULL.md §4.4 "Input").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuilderFlags {
    bits: u8,
}

impl BuilderFlags {
    pub const RETURN: u8 = 1 << 0;
    pub const LEAVE: u8 = 1 << 1;
    pub const FAKE_RETURN: u8 = 1 << 2;
    pub const ANY_VALUE: u8 = 1 << 3;
    pub const KEYWORDS: u8 = 1 << 4;

    #[must_use]
    pub const fn new(bits: u8) -> Self {
        Self { bits }
    }

    #[must_use]
    pub fn has(self, flag: u8) -> bool {
        self.bits & flag != 0
    }
}

/// A single paramlist slot (SPEC_FULL.md §3 "parameter cells").
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub class: ParamClass,
    pub typeset: Typeset,
}

/// Optional description/type/note metadata, built only if any of the three
/// was encountered while parsing the spec (SPEC_FULL.md §4.4 "Meta
/// object").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub description: Option<String>,
    /// Keyed by parameter symbol, in declaration order (an `IndexMap`
    /// rather than a plain hash map so a meta-context built from this can
    /// share the paramlist's own ordering, per SPEC_FULL.md §4.4 "Meta
    /// object": "holds description, parameter-types... as a frame-shaped
    /// context sharing the paramlist as keylist").
    pub param_notes: IndexMap<Symbol, String>,
    pub return_type: Option<Typeset>,
    pub return_note: Option<String>,
}

impl Meta {
    fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.param_notes.is_empty()
            && self.return_type.is_none()
            && self.return_note.is_none()
    }
}

/// The parsed paramlist (SPEC_FULL.md §3 "Paramlist"): `params[0]` is not an
/// archetype cell here (that's `crate::action::Action`'s job once wired to
/// a series) but the ordered parameter table itself, in paramlist order —
/// including a synthesized `return`/`leave` slot as the *last* entry, per
/// §4.4's "Definitional return/leave".
#[derive(Debug, Clone, PartialEq)]
pub struct Paramlist {
    pub params: Vec<Param>,
    /// Index of the synthesized (or reclassified) return/leave slot, if
    /// any. `FAKE_RETURN` sets this but the slot is still present here —
    /// the *release layout* omission described in §4.4 is the action
    /// layer's concern (see `crate::action::Action::facade_len`).
    pub return_index: Option<usize>,
    pub fake_return: bool,
    /// Words named after a top-level `<with>` tag: recorded for binding
    /// only, never a paramlist slot (SPEC_FULL.md §4.4 "`<with>` words
    /// produce no paramlist slot").
    pub externs: Vec<Symbol>,
}

impl Paramlist {
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn find(&self, name: Symbol) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Locals,
    Externs,
}

/// Parses `spec` into a `Paramlist` plus optional `Meta` (SPEC_FULL.md
/// §4.4). `interner` resolves word text to `Symbol`s as they're
/// encountered.
pub fn build_paramlist(spec: &[SpecItem], flags: BuilderFlags, interner: &mut Interner) -> CoreResult<(Paramlist, Option<Meta>)> {
    let mut params: Vec<Param> = Vec::new();
    let mut meta = Meta::default();
    let mut mode = Mode::Normal;
    let mut pending_note_target: Option<usize> = None;
    let mut seen_any_param = false;
    let mut explicit_return_idx: Option<usize> = None;
    let mut explicit_leave_idx: Option<usize> = None;
    let mut externs: Vec<Symbol> = Vec::new();

    if flags.has(BuilderFlags::RETURN) && flags.has(BuilderFlags::LEAVE) {
        return Err(CoreError::BadSpec { reason: "RETURN and LEAVE flags are mutually exclusive", detail: None });
    }

    for item in spec {
        match item {
            SpecItem::Str(s) => {
                if !seen_any_param && meta.description.is_none() {
                    meta.description = Some(s.clone());
                } else if let Some(idx) = pending_note_target {
                    let name = params[idx].name;
                    meta.param_notes.insert(name, s.clone());
                } else {
                    // A note with nothing to attach to still describes the
                    // function if no description has been recorded yet.
                    meta.description.get_or_insert_with(|| s.clone());
                }
            }
            SpecItem::Tag("local") => mode = Mode::Locals,
            SpecItem::Tag("with") => mode = Mode::Externs,
            SpecItem::Tag(other) => {
                return Err(CoreError::BadSpec { reason: "unrecognized top-level tag", detail: Some((*other).to_string()) });
            }
            SpecItem::TypeBlock(ts) => {
                let Some(idx) = params.len().checked_sub(1) else {
                    return Err(CoreError::BadSpec { reason: "type block with no preceding parameter", detail: None });
                };
                if mode != Mode::Normal {
                    return Err(CoreError::BadSpec { reason: "<local>/<with> parameters may not carry a type block", detail: None });
                }
                if params[idx].class == ParamClass::Refinement && ts.has_flag(crate::typeset::PseudoFlag::Endable) {
                    return Err(CoreError::BadSpec { reason: "a refinement's type block may not be <opt>-typed", detail: None });
                }
                params[idx].typeset = *ts;
            }
            SpecItem::Word(name) => {
                if mode == Mode::Externs {
                    // `<with>` words are recorded for binding only, never a
                    // paramlist slot (SPEC_FULL.md §4.4).
                    externs.push(interner.intern(name));
                    pending_note_target = None;
                } else {
                    let class = if mode == Mode::Normal { ParamClass::Normal } else { ParamClass::Local };
                    push_param(&mut params, interner, name, class, &mut pending_note_target);
                }
                seen_any_param = true;
            }
            SpecItem::GetWord(name) => {
                push_param(&mut params, interner, name, ParamClass::HardQuote, &mut pending_note_target);
                seen_any_param = true;
            }
            SpecItem::LitWord(name) => {
                push_param(&mut params, interner, name, ParamClass::SoftQuote, &mut pending_note_target);
                seen_any_param = true;
            }
            SpecItem::Issue(name) => {
                push_param(&mut params, interner, name, ParamClass::Tight, &mut pending_note_target);
                seen_any_param = true;
            }
            SpecItem::Refinement(name) => {
                push_param(&mut params, interner, name, ParamClass::Refinement, &mut pending_note_target);
                seen_any_param = true;
                mode = Mode::Normal;
            }
            SpecItem::SetWord(name) => {
                if name == "with" {
                    return Err(CoreError::BadSpec { reason: "`with:` is not a valid parameter name", detail: None });
                }
                if name == "return" && flags.has(BuilderFlags::RETURN) {
                    let sym = interner.intern(name);
                    params.push(Param { name: sym, class: ParamClass::Return, typeset: default_return_typeset() });
                    explicit_return_idx = Some(params.len() - 1);
                    pending_note_target = Some(params.len() - 1);
                } else if name == "leave" && flags.has(BuilderFlags::LEAVE) {
                    let sym = interner.intern(name);
                    params.push(Param { name: sym, class: ParamClass::Leave, typeset: Typeset::empty() });
                    explicit_leave_idx = Some(params.len() - 1);
                    pending_note_target = Some(params.len() - 1);
                } else {
                    push_param(&mut params, interner, name, ParamClass::Local, &mut pending_note_target);
                }
                seen_any_param = true;
            }
        }
    }

    // Duplicate detection: a transient binder populated during a full
    // second pass (SPEC_FULL.md §4.4 "Duplicate detection"). The binder is
    // fully built (and torn down, being a local here) before any error is
    // raised, so an error path never leaves partial binder state behind
    // (SPEC_FULL.md §5 "Ordering guarantees").
    {
        let mut binder: AHashMap<Symbol, usize> = AHashMap::new();
        let mut duplicate: Option<Symbol> = None;
        for p in &params {
            if binder.insert(p.name, 0).is_some() && duplicate.is_none() {
                duplicate = Some(p.name);
            }
        }
        drop(binder);
        if let Some(name) = duplicate {
            return Err(CoreError::DuplicateVariable { name });
        }
    }

    // Definitional return/leave synthesis (SPEC_FULL.md §4.4).
    let mut return_index = explicit_return_idx.or(explicit_leave_idx);
    let mut fake_return = false;
    if let Some(idx) = return_index {
        // An explicit `return:`/`leave:` slot must end up *last*, even when
        // declared earlier in the spec than other parameters (SPEC_FULL.md
        // §4.4, §8 scenario S2: "last parameter is `return`").
        if idx != params.len() - 1 {
            let slot = params.remove(idx);
            params.push(slot);
        }
        return_index = Some(params.len() - 1);
    } else if flags.has(BuilderFlags::RETURN) {
        let sym = interner.intern("return");
        params.push(Param {
            name: sym,
            class: ParamClass::Return,
            typeset: if flags.has(BuilderFlags::ANY_VALUE) { Typeset::any_value() } else { default_return_typeset() },
        });
        return_index = Some(params.len() - 1);
        fake_return = flags.has(BuilderFlags::FAKE_RETURN);
    } else if flags.has(BuilderFlags::LEAVE) {
        let sym = interner.intern("leave");
        params.push(Param { name: sym, class: ParamClass::Leave, typeset: Typeset::empty() });
        return_index = Some(params.len() - 1);
        fake_return = flags.has(BuilderFlags::FAKE_RETURN);
    }

    let paramlist = Paramlist { params, return_index, fake_return, externs };
    let meta = if meta.is_empty() { None } else { Some(meta) };
    Ok((paramlist, meta))
}

fn push_param(
    params: &mut Vec<Param>,
    interner: &mut Interner,
    name: &str,
    class: ParamClass,
    pending_note_target: &mut Option<usize>,
) {
    let sym = interner.intern(name);
    let typeset = if matches!(class, ParamClass::Local) { Typeset::empty() } else { Typeset::any_value() };
    params.push(Param { name: sym, class, typeset });
    *pending_note_target = Some(params.len() - 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Kind;

    fn int_type() -> Typeset {
        Typeset::single(Kind::Integer)
    }

    #[test]
    fn s1_spec_with_description_and_mixed_forms() {
        let mut interner = Interner::new();
        let spec = vec![
            SpecItem::Str("adds".into()),
            SpecItem::Word("a".into()),
            SpecItem::TypeBlock(int_type()),
            SpecItem::Str("first".into()),
            SpecItem::Word("b".into()),
            SpecItem::TypeBlock(int_type()),
        ];
        let (paramlist, meta) = build_paramlist(&spec, BuilderFlags::new(BuilderFlags::RETURN), &mut interner).unwrap();
        assert_eq!(paramlist.parameter_count(), 3);
        assert_eq!(paramlist.params[0].class, ParamClass::Normal);
        assert_eq!(paramlist.params[1].class, ParamClass::Normal);
        assert_eq!(paramlist.params[2].class, ParamClass::Return);
        assert_eq!(paramlist.return_index, Some(2));

        let meta = meta.unwrap();
        assert_eq!(meta.description.as_deref(), Some("adds"));
        let a_sym = interner.intern("a");
        assert_eq!(meta.param_notes.get(&a_sym).map(String::as_str), Some("first"));
        let b_sym = interner.intern("b");
        assert!(!meta.param_notes.contains_key(&b_sym));
    }

    #[test]
    fn s2_definitional_return_synthesis_with_typed_return() {
        let mut interner = Interner::new();
        let spec = vec![SpecItem::SetWord("return".into()), SpecItem::TypeBlock(int_type()), SpecItem::Word("x".into())];
        let (paramlist, _meta) = build_paramlist(&spec, BuilderFlags::new(BuilderFlags::RETURN), &mut interner).unwrap();
        let return_idx = paramlist.return_index.unwrap();
        assert_eq!(return_idx, paramlist.parameter_count() - 1);
        assert_eq!(paramlist.params[return_idx].class, ParamClass::Return);
        assert!(paramlist.params[return_idx].typeset.has_kind(Kind::Integer));
        assert_eq!(paramlist.params.last().unwrap().name, paramlist.params[return_idx].name);
        let x_sym = interner.intern("x");
        assert_eq!(paramlist.params[0].name, x_sym);
    }

    #[test]
    fn s3_duplicate_detection_after_full_parse() {
        let mut interner = Interner::new();
        let spec = vec![SpecItem::Word("a".into()), SpecItem::Word("b".into()), SpecItem::Word("a".into())];
        let err = build_paramlist(&spec, BuilderFlags::default(), &mut interner).unwrap_err();
        assert_eq!(err.kind(), crate::error::CoreErrorKind::DuplicateVariable);
    }

    #[test]
    fn refinement_rejects_opt_typed_block() {
        let mut interner = Interner::new();
        let mut opt_type = Typeset::single(Kind::Integer);
        opt_type.set_flag(crate::typeset::PseudoFlag::Endable);
        let spec = vec![SpecItem::Refinement("only".into()), SpecItem::TypeBlock(opt_type)];
        let err = build_paramlist(&spec, BuilderFlags::default(), &mut interner).unwrap_err();
        assert_eq!(err.kind(), crate::error::CoreErrorKind::BadSpec);
    }

    #[test]
    fn local_tag_switches_mode_and_excludes_type_blocks() {
        let mut interner = Interner::new();
        let spec = vec![SpecItem::Word("a".into()), SpecItem::Tag("local"), SpecItem::Word("tmp".into())];
        let (paramlist, _) = build_paramlist(&spec, BuilderFlags::default(), &mut interner).unwrap();
        assert_eq!(paramlist.params[1].class, ParamClass::Local);
    }

    #[test]
    fn with_tag_words_produce_no_paramlist_slot() {
        let mut interner = Interner::new();
        let spec = vec![SpecItem::Word("a".into()), SpecItem::Tag("with"), SpecItem::Word("helper".into())];
        let (paramlist, _) = build_paramlist(&spec, BuilderFlags::default(), &mut interner).unwrap();
        assert_eq!(paramlist.parameter_count(), 1);
        assert_eq!(paramlist.params[0].name, interner.intern("a"));
        assert_eq!(paramlist.externs, vec![interner.intern("helper")]);
    }

    #[test]
    fn mutually_exclusive_return_and_leave_flags_rejected() {
        let mut interner = Interner::new();
        let err = build_paramlist(&[], BuilderFlags::new(BuilderFlags::RETURN | BuilderFlags::LEAVE), &mut interner).unwrap_err();
        assert_eq!(err.kind(), crate::error::CoreErrorKind::BadSpec);
    }
}
