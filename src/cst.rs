//! The immutable, content-addressed concrete syntax tree.
//!
//! `CstToken` and `CstNode` are built once (by the tree builder in
//! `crate::event`) and never mutated afterwards; every cached scalar
//! (`hash`, `text_len`, `token_count`) is frozen at construction. Because
//! nodes are reference-counted and immutable, a subtree can be aliased
//! from multiple parents — the reuse cursor in `crate::parser::reuse`
//! relies on exactly this to splice old subtrees into a new tree for
//! free.

use std::fmt;
use std::rc::Rc;

use crate::hash::mix;
use crate::kind::Kind;

/// Discriminants mixed into the hash so a token and a node can never
/// collide purely because their inner hashes happened to match.
const TOKEN_DISCRIMINANT: u64 = 0x9E3779B97F4A7C15;
const NODE_DISCRIMINANT: u64 = 0xC2B2AE3D27D4EB4F;

/// An immutable leaf: a single lexed token with its exact source text.
#[derive(Clone)]
pub struct CstToken {
    kind: Kind,
    text: Rc<str>,
    hash: u64,
}

impl CstToken {
    /// Build a token, freezing its hash.
    ///
    /// `hash = mix(mix(TOKEN_DISCRIMINANT, hash(kind)), fnv(text))`, per
    /// the invariant in the data model: frozen once and never
    /// recomputed.
    pub fn new(kind: Kind, text: impl Into<Rc<str>>) -> Rc<CstToken> {
        let text = text.into();
        let hash = mix(mix(TOKEN_DISCRIMINANT, kind.hash_u64()), crate::hash::fnv(&text));
        Rc::new(CstToken { kind, text, hash })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_len(&self) -> u32 {
        self.text.len() as u32
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for CstToken {
    fn eq(&self, other: &Self) -> bool {
        // Hash short-circuit first: hashing is non-cryptographic, so a
        // match still requires the structural recheck below.
        self.hash == other.hash && self.kind == other.kind && self.text == other.text
    }
}
impl Eq for CstToken {}

impl fmt::Debug for CstToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?} {:?})", self.kind, self.text)
    }
}

/// An immutable interior node: a kind plus an ordered sequence of
/// children (each a token or a nested node).
pub struct CstNode {
    kind: Kind,
    children: Vec<CstElement>,
    text_len: u32,
    hash: u64,
    token_count: u32,
}

impl CstNode {
    /// Build a node from its already-built children, folding caches as
    /// it goes: `text_len` sums children's lengths, `hash` folds the
    /// node's own discriminant and kind with each child's hash in order,
    /// and `token_count` counts leaf tokens (a child node's own
    /// `token_count` is added transparently, so this is a whole-subtree
    /// leaf count, not just direct children).
    ///
    /// `trivia_kind`, when given, excludes tokens of that kind from the
    /// count — this is what lets `CstNode::token_count` back the reuse
    /// cursor's "advance past N non-trivia tokens" bookkeeping without
    /// re-walking the subtree.
    pub fn new(kind: Kind, children: Vec<CstElement>, trivia_kind: Option<Kind>) -> Rc<CstNode> {
        let mut text_len: u32 = 0;
        let mut hash = mix(NODE_DISCRIMINANT, kind.hash_u64());
        let mut token_count: u32 = 0;
        for child in &children {
            text_len += child.text_len();
            hash = mix(hash, child.hash());
            token_count += match child {
                CstElement::Token(t) => {
                    if Some(t.kind()) == trivia_kind {
                        0
                    } else {
                        1
                    }
                }
                CstElement::Node(n) => n.token_count,
            };
        }
        Rc::new(CstNode { kind, children, text_len, hash, token_count })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn children(&self) -> &[CstElement] {
        &self.children
    }

    pub fn text_len(&self) -> u32 {
        self.text_len
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn token_count(&self) -> u32 {
        self.token_count
    }

    /// True iff the subtree rooted here contains at least one node of
    /// `error_node_kind` or one token of `error_token_kind`.
    pub fn has_errors(&self, error_node_kind: Kind, error_token_kind: Kind) -> bool {
        if self.kind == error_node_kind {
            return true;
        }
        self.children.iter().any(|child| match child {
            CstElement::Token(t) => t.kind() == error_token_kind,
            CstElement::Node(n) => n.has_errors(error_node_kind, error_token_kind),
        })
    }

    /// Left-to-right leaf token enumeration of the whole subtree.
    pub fn tokens(&self) -> Vec<Rc<CstToken>> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens(&self, out: &mut Vec<Rc<CstToken>>) {
        for child in &self.children {
            match child {
                CstElement::Token(t) => out.push(t.clone()),
                CstElement::Node(n) => n.collect_tokens(out),
            }
        }
    }
}

impl PartialEq for CstNode {
    fn eq(&self, other: &Self) -> bool {
        // Fast reject on hash, then a full structural recheck — hash
        // collisions must never produce a false "equal".
        if self.hash != other.hash || self.kind != other.kind || self.children.len() != other.children.len() {
            return false;
        }
        self.children.iter().zip(other.children.iter()).all(|(a, b)| a == b)
    }
}
impl Eq for CstNode {}

impl fmt::Debug for CstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}", self.kind)?;
        for child in &self.children {
            write!(f, " {:?}", child)?;
        }
        write!(f, ")")
    }
}

/// A token or a node, handled uniformly as a CST child.
#[derive(Clone)]
pub enum CstElement {
    Token(Rc<CstToken>),
    Node(Rc<CstNode>),
}

impl CstElement {
    pub fn text_len(&self) -> u32 {
        match self {
            CstElement::Token(t) => t.text_len(),
            CstElement::Node(n) => n.text_len(),
        }
    }

    pub fn hash(&self) -> u64 {
        match self {
            CstElement::Token(t) => t.hash(),
            CstElement::Node(n) => n.hash(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            CstElement::Token(t) => t.kind(),
            CstElement::Node(n) => n.kind(),
        }
    }

    pub fn as_node(&self) -> Option<&Rc<CstNode>> {
        match self {
            CstElement::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&Rc<CstToken>> {
        match self {
            CstElement::Token(t) => Some(t),
            _ => None,
        }
    }
}

impl PartialEq for CstElement {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CstElement::Token(a), CstElement::Token(b)) => a == b,
            (CstElement::Node(a), CstElement::Node(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for CstElement {}

impl fmt::Debug for CstElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CstElement::Token(t) => write!(f, "{:?}", t),
            CstElement::Node(n) => write!(f, "{:?}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(raw: u16) -> Kind {
        Kind(raw)
    }

    #[test]
    fn width_law_holds() {
        let a = CstToken::new(k(1), "foo");
        let b = CstToken::new(k(2), "bar");
        let node = CstNode::new(k(10), vec![CstElement::Token(a), CstElement::Token(b)], None);
        assert_eq!(node.text_len(), 6);
    }

    #[test]
    fn equal_structure_hashes_equal() {
        let n1 = CstNode::new(k(10), vec![CstElement::Token(CstToken::new(k(1), "x"))], None);
        let n2 = CstNode::new(k(10), vec![CstElement::Token(CstToken::new(k(1), "x"))], None);
        assert_eq!(n1, n2);
        assert_eq!(n1.hash(), n2.hash());
    }

    #[test]
    fn different_kind_not_equal_even_with_same_hash_input() {
        let n1 = CstNode::new(k(10), vec![], None);
        let n2 = CstNode::new(k(11), vec![], None);
        assert_ne!(n1, n2);
    }

    #[test]
    fn token_and_node_never_collide_via_discriminant() {
        // A leaf-only node and a bare token built from the "same" kind/text
        // must never compare equal even if their folded hashes happened
        // to coincide, because CstElement variants never cross-compare.
        let tok = CstElement::Token(CstToken::new(k(5), "z"));
        let node = CstElement::Node(CstNode::new(k(5), vec![], None));
        assert_ne!(tok, node);
    }

    #[test]
    fn token_count_excludes_configured_trivia() {
        let ws = CstElement::Token(CstToken::new(k(99), " "));
        let id = CstElement::Token(CstToken::new(k(1), "x"));
        let node = CstNode::new(k(10), vec![ws, id], Some(k(99)));
        assert_eq!(node.token_count(), 1);
    }

    #[test]
    fn token_count_propagates_through_nested_nodes() {
        let inner = CstNode::new(k(10), vec![CstElement::Token(CstToken::new(k(1), "a"))], None);
        let outer = CstNode::new(
            k(20),
            vec![CstElement::Node(inner), CstElement::Token(CstToken::new(k(1), "b"))],
            None,
        );
        assert_eq!(outer.token_count(), 2);
    }

    #[test]
    fn has_errors_detects_nested_error_node() {
        let err_node_kind = k(200);
        let err_tok_kind = k(201);
        let err = CstNode::new(err_node_kind, vec![CstElement::Token(CstToken::new(err_tok_kind, "!"))], None);
        let root = CstNode::new(k(1), vec![CstElement::Node(err)], None);
        assert!(root.has_errors(err_node_kind, err_tok_kind));

        let clean = CstNode::new(k(1), vec![CstElement::Token(CstToken::new(k(1), "x"))], None);
        assert!(!clean.has_errors(err_node_kind, err_tok_kind));
    }

    #[test]
    fn debug_format_is_a_readable_s_expression() {
        use expect_test::expect;

        let a = CstToken::new(k(1), "foo");
        let ws = CstToken::new(k(2), " ");
        let b = CstToken::new(k(1), "bar");
        let node = CstNode::new(k(10), vec![CstElement::Token(a), CstElement::Token(ws), CstElement::Token(b)], None);
        expect![[r#"(Kind(10) (Kind(1) "foo") (Kind(2) " ") (Kind(1) "bar"))"#]].assert_eq(&format!("{node:?}"));
    }

    #[test]
    fn losslessness_concatenation_reproduces_source() {
        let a = CstToken::new(k(1), "foo");
        let b = CstToken::new(k(2), " ");
        let c = CstToken::new(k(1), "bar");
        let node =
            CstNode::new(k(10), vec![CstElement::Token(a), CstElement::Token(b), CstElement::Token(c)], None);
        let reconstructed: String = node.tokens().iter().map(|t| t.text()).collect();
        assert_eq!(reconstructed, "foo bar");
    }
}
