//! The subtree-reuse cursor.
//!
//! Rather than keep a separately-advancing pointer into the old tree (which
//! could drift out of sync with the parser context's own position), this
//! cursor derives old/new coordinate correspondence on demand from the
//! `Edit`: any offset before the damage is unchanged, any offset at or past
//! the damage's new end is shifted back by the edit's displacement, and any
//! offset inside the damage has no old-side counterpart at all. The parser
//! context's `byte_offset` already is the position pointer in new
//! coordinates; this module just needs to map it.

use std::rc::Rc;

use crate::cst::CstNode;
use crate::edit::Edit;
use crate::kind::Kind;
use crate::positioned::PositionedNode;
use crate::stage::Diagnostic;

/// A subtree accepted for reuse, plus the diagnostics that travelled with
/// it (shifted into new coordinates).
pub struct ReuseHit {
    pub subtree: Rc<CstNode>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One lexed token in a flat, position-annotated form — used for both the
/// new token stream here and by `ParserContext` to drive `emit_token`.
pub type FlatToken = (Kind, Rc<str>, u32);

pub struct ReuseCursor<'a> {
    old_root: Rc<PositionedNode>,
    old_diagnostics: &'a [Diagnostic],
    edit: Edit,
    // Owned (reference-counted) rather than borrowed: the flat new-token
    // list is usually computed fresh by the same `ParserContext` that owns
    // this cursor, so borrowing it would make the cursor self-referential.
    new_tokens: Rc<[FlatToken]>,
    hits: u32,
}

impl<'a> ReuseCursor<'a> {
    pub fn new(old_root: Rc<CstNode>, old_diagnostics: &'a [Diagnostic], edit: Edit, new_tokens: Rc<[FlatToken]>) -> Self {
        ReuseCursor {
            old_root: Rc::new(PositionedNode::new_root(old_root)),
            old_diagnostics,
            edit,
            new_tokens,
            hits: 0,
        }
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    fn old_offset_for_new(&self, new_pos: u32) -> Option<u32> {
        if new_pos <= self.edit.start {
            Some(new_pos)
        } else if new_pos >= self.edit.new_end() {
            Some((new_pos as i64 - self.edit.displacement()).max(0) as u32)
        } else {
            None
        }
    }

    fn new_offset_for_old(&self, old_pos: u32) -> u32 {
        if old_pos <= self.edit.start {
            old_pos
        } else {
            (old_pos as i64 + self.edit.displacement()).max(0) as u32
        }
    }

    /// Walk from the innermost node at `old_offset` up through ancestors that
    /// share the same start offset, looking for one of `expected_kind`.
    fn candidate_at(&self, old_offset: u32, expected_kind: Kind) -> Option<PositionedNode> {
        let mut node = self.old_root.find_at(old_offset);
        loop {
            if node.start() != old_offset {
                return None;
            }
            if node.kind() == expected_kind {
                return Some(node);
            }
            match node.parent() {
                Some(p) if p.start() == old_offset => node = (**p).clone(),
                _ => return None,
            }
        }
    }

    fn lies_outside_old_damage(&self, node: &PositionedNode) -> bool {
        let (damage_start, damage_end) = self.edit.old_damage_range();
        node.end() <= damage_start || node.start() >= damage_end
    }

    fn new_token_ending_at(&self, offset: u32) -> Option<(Kind, &str)> {
        if offset == 0 {
            return None;
        }
        self.new_tokens.iter().find(|(_, text, start)| start + text.len() as u32 == offset).map(|(k, t, _)| (*k, &**t))
    }

    fn new_token_starting_at(&self, offset: u32) -> Option<(Kind, &str)> {
        self.new_tokens.iter().find(|(_, _, start)| *start == offset).map(|(k, t, _)| (*k, &**t))
    }

    fn old_token_ending_at(&self, offset: u32) -> Option<(Kind, String)> {
        if offset == 0 {
            return None;
        }
        self.old_root.tokens().into_iter().find(|t| t.end() == offset).map(|t| (t.kind(), t.text().to_string()))
    }

    fn old_token_starting_at(&self, offset: u32) -> Option<(Kind, String)> {
        self.old_root.tokens().into_iter().find(|t| t.start() == offset).map(|t| (t.kind(), t.text().to_string()))
    }

    /// Collect the diagnostics from the old parse whose byte range falls
    /// entirely within `[old_start, old_end)`, shifted into new coordinates.
    fn carried_diagnostics(&self, old_start: u32, old_end: u32) -> Vec<Diagnostic> {
        self.old_diagnostics
            .iter()
            .filter(|d| d.start >= old_start && d.end <= old_end)
            .map(|d| {
                Diagnostic::new(d.message.clone(), self.new_offset_for_old(d.start), self.new_offset_for_old(d.end))
            })
            .collect()
    }

    /// Attempt to reuse a subtree of `expected_kind` whose new-coordinate
    /// start is `new_pos`. Implements the four-condition protocol from the
    /// design notes: damage-disjoint span, kind match, leading context,
    /// trailing context.
    pub fn try_reuse(&mut self, expected_kind: Kind, new_pos: u32) -> Option<ReuseHit> {
        let old_offset = self.old_offset_for_new(new_pos)?;
        let node = self.candidate_at(old_offset, expected_kind)?;
        if !self.lies_outside_old_damage(&node) {
            tracing::trace!(kind = ?expected_kind, "reuse rejected: candidate straddles damage");
            return None;
        }

        let old_leading = self.old_token_ending_at(node.start());
        let new_leading = self.new_token_ending_at(new_pos);
        let leading_matches = match (&old_leading, &new_leading) {
            (None, None) => true,
            (Some((ok, ot)), Some((nk, nt))) => ok == nk && ot == nt,
            _ => false,
        };
        if !leading_matches {
            tracing::trace!(kind = ?expected_kind, "reuse rejected: leading context mismatch");
            return None;
        }

        let new_end = self.new_offset_for_old(node.end());
        let old_trailing = self.old_token_starting_at(node.end());
        let new_trailing = self.new_token_starting_at(new_end);
        let trailing_matches = match (&old_trailing, &new_trailing) {
            (None, None) => true,
            (Some((ok, ot)), Some((nk, nt))) => ok == nk && ot == nt,
            _ => false,
        };
        if !trailing_matches {
            tracing::trace!(kind = ?expected_kind, "reuse rejected: trailing context mismatch");
            return None;
        }

        self.hits += 1;
        let diagnostics = self.carried_diagnostics(node.start(), node.end());
        tracing::debug!(kind = ?expected_kind, old_start = node.start(), "reuse accepted");
        Some(ReuseHit { subtree: node.node().clone(), diagnostics })
    }
}
