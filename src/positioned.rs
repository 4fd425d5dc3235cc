//! Positioned view over a CST subtree.
//!
//! `PositionedNode`/`PositionedToken` are ephemeral wrappers: they never
//! get stored anywhere, and every offset on them is computed on demand by
//! walking from the root with a running byte counter. This keeps the CST
//! itself free of absolute positions, which is what makes subtrees
//! shareable across edits (a shared subtree's *content* never changes
//! just because its position in the document did).

use std::rc::Rc;

use crate::cst::{CstElement, CstNode, CstToken};
use crate::kind::Kind;

/// A positioned view of a node, with an optional parent back-pointer.
///
/// The back-pointer is the one place in this crate where an "upward"
/// reference is allowed: the underlying CST is a strict downward tree,
/// but ephemeral views may reference their parent view for navigation.
#[derive(Clone)]
pub struct PositionedNode {
    node: Rc<CstNode>,
    parent: Option<Rc<PositionedNode>>,
    offset: u32,
}

impl PositionedNode {
    /// Build the root positioned view over `node`, anchored at byte 0.
    pub fn new_root(node: Rc<CstNode>) -> PositionedNode {
        PositionedNode { node, parent: None, offset: 0 }
    }

    fn child_at(parent: &Rc<PositionedNode>, node: Rc<CstNode>, offset: u32) -> PositionedNode {
        PositionedNode { node, parent: Some(parent.clone()), offset }
    }

    pub fn kind(&self) -> Kind {
        self.node.kind()
    }

    pub fn start(&self) -> u32 {
        self.offset
    }

    pub fn end(&self) -> u32 {
        self.offset + self.node.text_len()
    }

    pub fn node(&self) -> &Rc<CstNode> {
        &self.node
    }

    pub fn parent(&self) -> Option<&Rc<PositionedNode>> {
        self.parent.as_ref()
    }

    /// Enumerate direct children (nodes only), each positioned relative
    /// to this view.
    pub fn children(self: &Rc<Self>) -> Vec<PositionedNode> {
        self.all_children().into_iter().filter_map(|e| e.into_node()).collect()
    }

    /// Enumerate *all* direct children (tokens and nodes alike),
    /// positioned relative to this view, left to right.
    ///
    /// This is the one place offsets are actually computed: a running
    /// counter starts at `self.offset` and advances by each child's
    /// `text_len` in turn, which is exactly the position law from the
    /// testable properties (`start(c1) = start(P)`,
    /// `start(c_{i+1}) = start(c_i) + text_len(c_i)`).
    pub fn all_children(self: &Rc<Self>) -> Vec<PositionedElement> {
        let mut running = self.offset;
        let mut out = Vec::with_capacity(self.node.children().len());
        for child in self.node.children() {
            match child {
                CstElement::Token(t) => {
                    out.push(PositionedElement::Token(PositionedToken {
                        token: t.clone(),
                        offset: running,
                    }));
                }
                CstElement::Node(n) => {
                    out.push(PositionedElement::Node(Self::child_at(self, n.clone(), running)));
                }
            }
            running += child.text_len();
        }
        out
    }

    /// Total function (Layer 1): find the positioned node whose span
    /// contains `offset`, recursing into children; if no child's span
    /// contains it, return `self` (never fails, per the totality
    /// invariant for positioned-view queries).
    pub fn find_at(self: &Rc<Self>, offset: u32) -> PositionedNode {
        for child in self.children() {
            if child.start() <= offset && offset < child.end() {
                let child = Rc::new(child);
                return child.find_at(offset);
            }
        }
        (**self).clone()
    }

    /// Layer 2 variant of [`find_at`](Self::find_at): `None` when
    /// `offset` falls outside this subtree's span entirely.
    pub fn find_at_checked(self: &Rc<Self>, offset: u32) -> Option<PositionedNode> {
        let in_range = offset >= self.start() && offset < self.end();
        let empty_at_edge = self.start() == self.end() && offset == self.start();
        if in_range || empty_at_edge { Some(self.find_at(offset)) } else { None }
    }

    /// The subtree span after stripping leading and trailing leaf tokens
    /// of `trivia_kind`.
    pub fn tight_span(self: &Rc<Self>, trivia_kind: Option<Kind>) -> (u32, u32) {
        let Some(trivia) = trivia_kind else {
            return (self.start(), self.end());
        };
        let toks = self.tokens();
        let mut start = self.start();
        let mut end = self.end();
        for t in &toks {
            if t.kind() == trivia {
                start = t.end();
            } else {
                break;
            }
        }
        for t in toks.iter().rev() {
            if t.kind() == trivia {
                end = t.start();
            } else {
                break;
            }
        }
        if start > end {
            (self.start(), self.start())
        } else {
            (start, end)
        }
    }

    /// Left-to-right leaf enumeration, positioned.
    pub fn tokens(self: &Rc<Self>) -> Vec<PositionedToken> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens(self: &Rc<Self>, out: &mut Vec<PositionedToken>) {
        for child in self.all_children() {
            match child {
                PositionedElement::Token(t) => out.push(t),
                PositionedElement::Node(n) => Rc::new(n).collect_tokens(out),
            }
        }
    }

    /// First leaf of the given kind, left to right.
    pub fn find_token(self: &Rc<Self>, kind: Kind) -> Option<PositionedToken> {
        self.tokens().into_iter().find(|t| t.kind() == kind)
    }

    /// All leaves of the given kind, left to right.
    pub fn tokens_of_kind(self: &Rc<Self>, kind: Kind) -> Vec<PositionedToken> {
        self.tokens().into_iter().filter(|t| t.kind() == kind).collect()
    }
}

/// A positioned view of a single leaf token.
#[derive(Clone)]
pub struct PositionedToken {
    token: Rc<CstToken>,
    offset: u32,
}

impl PositionedToken {
    pub fn start(&self) -> u32 {
        self.offset
    }

    pub fn end(&self) -> u32 {
        self.offset + self.token.text_len()
    }

    pub fn kind(&self) -> Kind {
        self.token.kind()
    }

    pub fn text(&self) -> &str {
        self.token.text()
    }

    pub fn token(&self) -> &Rc<CstToken> {
        &self.token
    }
}

/// Either a positioned node or a positioned token.
pub enum PositionedElement {
    Node(PositionedNode),
    Token(PositionedToken),
}

impl PositionedElement {
    pub fn start(&self) -> u32 {
        match self {
            PositionedElement::Node(n) => n.start(),
            PositionedElement::Token(t) => t.start(),
        }
    }

    pub fn end(&self) -> u32 {
        match self {
            PositionedElement::Node(n) => n.end(),
            PositionedElement::Token(t) => t.end(),
        }
    }

    pub fn into_node(self) -> Option<PositionedNode> {
        match self {
            PositionedElement::Node(n) => Some(n),
            PositionedElement::Token(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::CstToken;

    fn k(raw: u16) -> Kind {
        Kind(raw)
    }

    fn sample_tree() -> Rc<CstNode> {
        let a = CstElement::Token(CstToken::new(k(1), "foo"));
        let ws = CstElement::Token(CstToken::new(k(2), " "));
        let b = CstElement::Token(CstToken::new(k(1), "bar"));
        CstNode::new(k(10), vec![a, ws, b], None)
    }

    #[test]
    fn position_law_over_children() {
        let root = Rc::new(PositionedNode::new_root(sample_tree()));
        let children = root.all_children();
        assert_eq!(children[0].start(), 0);
        assert_eq!(children[0].end(), 3);
        assert_eq!(children[1].start(), 3);
        assert_eq!(children[2].start(), 4);
        assert_eq!(children[2].end(), 7);
        assert_eq!(root.end(), 7);
    }

    #[test]
    fn find_at_is_total() {
        let root = Rc::new(PositionedNode::new_root(sample_tree()));
        // In range, out of range (clamped to self), and at a boundary.
        for offset in [0u32, 3, 6, 7, 100] {
            let found = root.find_at(offset);
            assert!(found.start() <= found.end());
        }
    }

    #[test]
    fn find_at_checked_rejects_out_of_range() {
        let root = Rc::new(PositionedNode::new_root(sample_tree()));
        assert!(root.find_at_checked(3).is_some());
        assert!(root.find_at_checked(100).is_none());
    }

    #[test]
    fn tight_span_strips_leading_trailing_trivia() {
        let ws1 = CstElement::Token(CstToken::new(k(2), " "));
        let id = CstElement::Token(CstToken::new(k(1), "x"));
        let ws2 = CstElement::Token(CstToken::new(k(2), "  "));
        let node = CstNode::new(k(10), vec![ws1, id, ws2], None);
        let root = Rc::new(PositionedNode::new_root(node));
        let (start, end) = root.tight_span(Some(k(2)));
        assert_eq!((start, end), (1, 2));
    }

    #[test]
    fn tokens_enumerate_left_to_right() {
        let root = Rc::new(PositionedNode::new_root(sample_tree()));
        let texts: Vec<&str> = root.tokens().iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["foo", " ", "bar"]);
    }

    #[test]
    fn find_token_returns_first_match() {
        let root = Rc::new(PositionedNode::new_root(sample_tree()));
        let found = root.find_token(k(1)).unwrap();
        assert_eq!(found.text(), "foo");
    }
}
