//! The flat event stream and the tree builder that replays it.
//!
//! The parser context never builds [`CstNode`]s directly — it only ever
//! appends [`ParseEvent`]s to an [`EventBuffer`]. This indirection is
//! what makes retroactive wrapping possible: a left-associative operator
//! parse can reserve a [`ParseEvent::Tombstone`] *before* it knows the
//! node kind it will need, parse the first operand into the flat stream,
//! and only decide the wrapping kind once it sees the operator — at
//! which point `start_at` fills in the reserved slot.

use std::rc::Rc;

use crate::cst::{CstElement, CstNode};
use crate::error::BuilderError;
use crate::kind::Kind;

/// One entry in the flat parse event stream.
#[derive(Clone)]
pub enum ParseEvent {
    /// Opens a new node frame of the given kind.
    StartNode(Kind),
    /// Closes the innermost open node frame.
    FinishNode,
    /// A leaf token, with its exact source text.
    Token(Kind, Rc<str>),
    /// A subtree reused verbatim from a prior parse (see
    /// `crate::parser::reuse`). Spliced into the current frame's
    /// children as a single unit on replay, in O(1) regardless of the
    /// subtree's size.
    Reused(Rc<CstNode>),
    /// A reserved slot, to be filled by a later `start_at` call, or
    /// silently skipped on replay if it is never filled.
    Tombstone,
}

/// An append-only, balanced (once fully emitted) sequence of
/// [`ParseEvent`]s.
#[derive(Default)]
pub struct EventBuffer {
    events: Vec<ParseEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        EventBuffer { events: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn push_start_node(&mut self, kind: Kind) {
        self.events.push(ParseEvent::StartNode(kind));
    }

    pub fn push_finish_node(&mut self) {
        self.events.push(ParseEvent::FinishNode);
    }

    pub fn push_token(&mut self, kind: Kind, text: impl Into<Rc<str>>) {
        self.events.push(ParseEvent::Token(kind, text.into()));
    }

    pub fn push_reused(&mut self, subtree: Rc<CstNode>) {
        self.events.push(ParseEvent::Reused(subtree));
    }

    /// Reserve a tombstone slot at the current position, returning its
    /// index for a later `start_at` call.
    pub fn mark(&mut self) -> usize {
        let idx = self.events.len();
        self.events.push(ParseEvent::Tombstone);
        idx
    }

    /// Retroactively turn the tombstone at `idx` into a `StartNode(kind)`.
    ///
    /// Fails loudly (this indicates a parser bug, not bad input) if
    /// `idx` is out of range or the slot isn't a pending tombstone —
    /// e.g. it was already filled, or it was never a mark in the first
    /// place.
    pub fn start_at(&mut self, idx: usize, kind: Kind) -> Result<(), BuilderError> {
        let len = self.events.len();
        let slot = self.events.get_mut(idx).ok_or(BuilderError::MarkOutOfRange { index: idx, len })?;
        match slot {
            ParseEvent::Tombstone => {
                *slot = ParseEvent::StartNode(kind);
                Ok(())
            }
            _ => Err(BuilderError::InvalidMark { index: idx }),
        }
    }

    /// Reserve a fresh tombstone slot immediately before the event at
    /// `idx`, shifting `idx` and everything after it one slot later.
    ///
    /// This is how a completed node gets re-wrapped: the node's own
    /// `StartNode` (already resolved, at `idx`) stays exactly where it is,
    /// and a new tombstone is inserted just ahead of it so that a second
    /// `start_at` can open an *outer* frame around it without disturbing
    /// the first. Repeating this lets a chain of retroactive wraps nest
    /// correctly, each one enclosing everything from the previous wrap's
    /// start onward.
    pub fn insert_tombstone_before(&mut self, idx: usize) -> Result<usize, BuilderError> {
        let len = self.events.len();
        if idx > len {
            return Err(BuilderError::MarkOutOfRange { index: idx, len });
        }
        self.events.insert(idx, ParseEvent::Tombstone);
        Ok(idx)
    }

    pub fn events(&self) -> &[ParseEvent] {
        &self.events
    }
}

/// A frame under construction during replay: a node kind plus the
/// children accumulated for it so far.
struct Frame {
    kind: Kind,
    children: Vec<CstElement>,
}

/// Replay a balanced event stream into an immutable [`CstNode`] tree.
///
/// If the stream's own outermost frame is already a single node, that
/// node is returned as-is (this is "the event stream's outermost frame"
/// from the open question in the design notes — we prefer the explicit
/// frame over synthesizing a second one). Otherwise the top-level
/// elements are wrapped in a synthetic node of `root_kind`.
///
/// `trivia_kind` is forwarded to every [`CstNode::new`] call so that
/// `token_count` excludes trivia uniformly through the whole tree.
pub fn build_tree(
    events: &[ParseEvent],
    root_kind: Kind,
    trivia_kind: Option<Kind>,
) -> Result<Rc<CstNode>, BuilderError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut top_level: Vec<CstElement> = Vec::new();

    for event in events {
        match event {
            ParseEvent::Tombstone => {
                // Never filled in: a reserved slot that nothing claimed.
                // Per the event model, this is silently skipped.
            }
            ParseEvent::StartNode(kind) => {
                stack.push(Frame { kind: *kind, children: Vec::new() });
            }
            ParseEvent::FinishNode => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| BuilderError::Unbalanced("FinishNode with no matching StartNode".to_string()))?;
                let node = CstNode::new(frame.kind, frame.children, trivia_kind);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(CstElement::Node(node)),
                    None => top_level.push(CstElement::Node(node)),
                }
            }
            ParseEvent::Token(kind, text) => {
                let token = crate::cst::CstToken::new(*kind, text.clone());
                let element = CstElement::Token(token);
                match stack.last_mut() {
                    Some(frame) => frame.children.push(element),
                    None => top_level.push(element),
                }
            }
            ParseEvent::Reused(subtree) => {
                let element = CstElement::Node(subtree.clone());
                match stack.last_mut() {
                    Some(frame) => frame.children.push(element),
                    None => top_level.push(element),
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(BuilderError::Unbalanced(format!("{} node(s) never closed with FinishNode", stack.len())));
    }

    if let [CstElement::Node(only)] = top_level.as_slice() {
        return Ok(only.clone());
    }

    Ok(CstNode::new(root_kind, top_level, trivia_kind))
}
