//! Token interning: deduplicate `(kind, text)` leaves.
//!
//! Most tokens in real source repeat a handful of shapes (`,`, `(`,
//! keywords, single-character identifiers). Interning means two equal
//! leaves share one `Rc<CstToken>` allocation, which both saves memory
//! and makes the reuse cursor's leading/trailing context checks a cheap
//! `Rc::ptr_eq` fast path on top of the value comparison it must still
//! perform.

use std::collections::HashMap;
use std::rc::Rc;

use crate::cst::CstToken;
use crate::kind::Kind;

/// Caches `(kind, text) -> Rc<CstToken>` so repeated lookups return the
/// same token reference.
#[derive(Default)]
pub struct Interner {
    map: HashMap<(Kind, Rc<str>), Rc<CstToken>>,
}

impl Interner {
    pub fn new() -> Self {
        Interner { map: HashMap::new() }
    }

    /// Return the cached token for `(kind, text)`, constructing and
    /// caching one on a miss.
    pub fn intern(&mut self, kind: Kind, text: &str) -> Rc<CstToken> {
        let key_text: Rc<str> = Rc::from(text);
        if let Some(hit) = self.map.get(&(kind, key_text.clone())) {
            return hit.clone();
        }
        let token = CstToken::new(kind, key_text.clone());
        self.map.insert((kind, key_text), token.clone());
        token
    }

    pub fn size(&self) -> usize {
        self.map.len()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
