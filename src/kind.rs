//! Opaque kind identifiers.
//!
//! The core never inspects what a [`Kind`] *means* — only its equality,
//! hash, and ordering. Languages assign stable integers per token/node
//! class; the mapping lives entirely on their side of [`LanguageSpec`]
//! (`crate::language`).

use std::fmt;

/// An opaque integer identifying a token or node class.
///
/// Two kinds are equal iff their raw values are equal. The core treats
/// this purely as an interned tag — ordering exists only so `Kind` can be
/// used as a `BTreeMap`/`HashMap` key or sorted in diagnostics, not
/// because kinds have an inherent order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kind(pub u16);

impl Kind {
    /// The raw integer this kind wraps.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Fold this kind's raw value into a running structural hash.
    #[inline]
    pub(crate) fn hash_u64(self) -> u64 {
        self.0 as u64
    }
}

impl From<u16> for Kind {
    fn from(raw: u16) -> Self {
        Kind(raw)
    }
}

impl From<Kind> for u16 {
    fn from(kind: Kind) -> Self {
        kind.0
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.0)
    }
}
