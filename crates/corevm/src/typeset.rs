//! Typesets: a 64-bit bitset over built-in kinds plus pseudotype flag bits
//! (SPEC_FULL.md §4.3).
//!
//! Grounded on `ouros::py_hash`/`ouros::value`'s bit-flag idioms generalized
//! to the spec's description: kind bits occupy the low end of the word (one
//! bit per `crate::cell::Kind`, see `Kind::bit`), pseudotype flags occupy
//! the high end.

use std::fmt;

use crate::cell::Kind;

/// Bits above the kind range, carrying parameter-fulfilment policy rather
/// than a real datatype (SPEC_FULL.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum PseudoFlag {
    Endable = 1 << 60,
    Variadic = 1 << 61,
    Skippable = 1 << 62,
    Hidden = 1 << 59,
    Unbindable = 1 << 58,
    NoopIfBlank = 1 << 57,
    QuotedWord = 1 << 56,
    QuotedPath = 1 << 55,
}

/// The parameter class a paramlist slot is fulfilled under (SPEC_FULL.md
/// §4.3 "parameter class"). Distinct from `Kind`: a parameter cell's "kind
/// byte" in the original holds one of these instead of a real datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamClass {
    Normal,
    Tight,
    HardQuote,
    SoftQuote,
    Refinement,
    Local,
    Return,
    Leave,
}

/// A 64-bit bitset over `Kind` plus the pseudotype flags of
/// [`PseudoFlag`] (SPEC_FULL.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Typeset(u64);

impl Typeset {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn single(kind: Kind) -> Self {
        Self(1 << kind.bit())
    }

    #[must_use]
    pub fn any_value() -> Self {
        Kind::ALL.iter().fold(Self::empty(), |acc, k| acc.union(Self::single(*k)))
    }

    pub fn set_kind(&mut self, kind: Kind) {
        self.0 |= 1 << kind.bit();
    }

    pub fn clear_kind(&mut self, kind: Kind) {
        self.0 &= !(1 << kind.bit());
    }

    #[must_use]
    pub fn has_kind(self, kind: Kind) -> bool {
        self.0 & (1 << kind.bit()) != 0
    }

    pub fn set_flag(&mut self, flag: PseudoFlag) {
        self.0 |= flag as u64;
    }

    #[must_use]
    pub fn has_flag(self, flag: PseudoFlag) -> bool {
        self.0 & (flag as u64) != 0
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[must_use]
    pub fn complement(self) -> Self {
        Self(!self.0)
    }

    #[must_use]
    pub fn bits(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Typeset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = Kind::ALL.iter().filter(|k| self.has_kind(**k)).map(ToString::to_string).collect();
        write!(f, "[{}]", names.join(" "))
    }
}

/// A token of the informal type-block grammar (SPEC_FULL.md §6 "Spec
/// dialect"): `'[' (kind-name | quoted-word | quoted-path | tag)* ']'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeBlockToken {
    KindName(Kind),
    QuotedWord,
    QuotedPath,
    Tag(&'static str),
}

/// Parses a type-block's tokens into a `Typeset` (SPEC_FULL.md §4.3
/// "Construction from a block"). `is_hard_quoted` gates `<skip>`, which is
/// "only legal on hard-quoted parameters".
pub fn parse_type_block(tokens: &[TypeBlockToken], is_hard_quoted: bool) -> Result<Typeset, &'static str> {
    let mut ts = Typeset::empty();
    for tok in tokens {
        match tok {
            TypeBlockToken::KindName(k) => ts.set_kind(*k),
            TypeBlockToken::QuotedWord => ts.set_flag(PseudoFlag::QuotedWord),
            TypeBlockToken::QuotedPath => ts.set_flag(PseudoFlag::QuotedPath),
            TypeBlockToken::Tag("end") => ts.set_flag(PseudoFlag::Endable),
            TypeBlockToken::Tag("opt") => ts.set_flag(PseudoFlag::Endable),
            TypeBlockToken::Tag("...") => ts.set_flag(PseudoFlag::Variadic),
            TypeBlockToken::Tag("skip") => {
                if !is_hard_quoted {
                    return Err("<skip> is only legal on hard-quoted parameters");
                }
                ts.set_flag(PseudoFlag::Skippable);
            }
            TypeBlockToken::Tag("blank") => ts.set_flag(PseudoFlag::NoopIfBlank),
            TypeBlockToken::Tag(other) => {
                let _ = other;
                return Err("unknown tag in type block");
            }
        }
    }
    Ok(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_intersect_difference_behave_like_set_ops() {
        let a = Typeset::single(Kind::Integer).union(Typeset::single(Kind::Decimal));
        let b = Typeset::single(Kind::Decimal).union(Typeset::single(Kind::Text));
        assert!(a.intersect(b).has_kind(Kind::Decimal));
        assert!(!a.intersect(b).has_kind(Kind::Integer));
        assert!(a.difference(b).has_kind(Kind::Integer));
        assert!(!a.difference(b).has_kind(Kind::Decimal));
    }

    #[test]
    fn complement_flips_every_bit() {
        let a = Typeset::single(Kind::Integer);
        assert!(!a.complement().has_kind(Kind::Integer));
        assert!(a.complement().has_kind(Kind::Text));
    }

    #[test]
    fn skip_tag_rejected_outside_hard_quote() {
        let tokens = vec![TypeBlockToken::Tag("skip")];
        assert!(parse_type_block(&tokens, false).is_err());
        assert!(parse_type_block(&tokens, true).is_ok());
    }

    #[test]
    fn any_value_covers_every_kind() {
        let any = Typeset::any_value();
        for k in Kind::ALL {
            assert!(any.has_kind(*k));
        }
    }
}
