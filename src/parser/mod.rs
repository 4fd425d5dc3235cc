//! Parser infrastructure: the recursive-descent framework's core state.
//!
//! `ParserContext` never builds [`CstNode`](crate::cst::CstNode)s
//! directly — it only ever appends events to an `EventBuffer`
//! (`crate::event`), consulting the reuse cursor (`reuse`) before opening
//! a node so that an unedited subtree can be spliced in for free. This
//! module is grammar-agnostic: a language's own grammar module is built
//! entirely out of these primitives, the same way the teacher's recursive
//! descent parser is built out of its own `Parser`/`Marker`/`CompletedMarker`.

pub mod reuse;

use std::rc::Rc;

use crate::config::ParserConfig;
use crate::cst::CstNode;
use crate::edit::Edit;
use crate::error::BuilderError;
use crate::event::{EventBuffer, ParseEvent, build_tree};
use crate::kind::Kind;
use crate::language::LanguageSpec;
use crate::stage::Diagnostic;
use reuse::{FlatToken, ReuseCursor};

/// A reserved tombstone slot, returned by [`ParserContext::mark`].
///
/// Unlike the teacher's `Marker`, this one carries no debug-assertion drop
/// bomb: the tombstone protocol in `EventBuffer` already fails loudly
/// (`BuilderError::InvalidMark`) if a mark is filled twice or never
/// filled, so a forgotten mark surfaces as a build error rather than a
/// panic at drop time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark(usize);

/// A completed node, letting the grammar retroactively wrap it — the
/// mechanism left-associative binary operators need.
#[derive(Clone, Copy, Debug)]
pub struct CompletedMark {
    mark: Mark,
}

impl CompletedMark {
    /// Reopen this completed node's start position for retroactive
    /// wrapping: the grammar calls `wrap_at(completed.precede(ctx), kind, ...)`
    /// once it discovers, e.g., a trailing binary operator.
    ///
    /// Unlike a fresh [`ParserContext::mark`], this inserts a new tombstone
    /// immediately *before* the completed node's own start event rather
    /// than appending one at the end of the stream — so the node this
    /// mark wraps becomes the first child of whatever `wrap_at` builds at
    /// it, with the completed node's own content undisturbed. Calling
    /// `precede` again on the `CompletedMark` a later `wrap_at` returns
    /// re-wraps that result in turn, which is how a run of left-associative
    /// binary operators builds a properly nested tree, one layer per
    /// operator, instead of a single flattened n-ary node.
    pub fn precede<L: LanguageSpec>(self, ctx: &mut ParserContext<'_, L>) -> Mark {
        Mark(
            ctx.events
                .insert_tombstone_before(self.mark.0)
                .expect("a completed node's own start index is always in range for re-wrapping"),
        )
    }
}

/// State threaded through one grammar invocation: a token cursor, an event
/// buffer, a diagnostics collector, a language spec, an optional reuse
/// cursor, and an error budget.
pub struct ParserContext<'a, L: LanguageSpec> {
    lang: &'a L,
    tokens: &'a [L::Token],
    flat: Rc<[FlatToken]>,
    pos: usize,
    byte_offset: u32,
    events: EventBuffer,
    diagnostics: Vec<Diagnostic>,
    reuse: Option<ReuseCursor<'a>>,
    reuse_hits: u32,
    error_budget: u32,
    errors_recorded: u32,
}

impl<'a, L: LanguageSpec> ParserContext<'a, L> {
    pub fn new(lang: &'a L, tokens: &'a [L::Token], config: &ParserConfig) -> Self {
        let flat = flatten(lang, tokens);
        ParserContext {
            lang,
            tokens,
            flat,
            pos: 0,
            byte_offset: 0,
            events: EventBuffer::new(),
            diagnostics: Vec::new(),
            reuse: None,
            reuse_hits: 0,
            error_budget: config.error_budget,
            errors_recorded: 0,
        }
    }

    /// Enable subtree reuse against a prior parse for the given edit.
    pub fn with_reuse(mut self, old_root: Rc<CstNode>, old_diagnostics: &'a [Diagnostic], edit: Edit) -> Self {
        self.reuse = Some(ReuseCursor::new(old_root, old_diagnostics, edit, self.flat.clone()));
        self
    }

    pub fn reuse_hits(&self) -> u32 {
        self.reuse_hits
    }

    pub fn byte_offset(&self) -> u32 {
        self.byte_offset
    }

    // -- Token inspection -----------------------------------------------

    fn skip_trivia_index(&self, mut i: usize) -> usize {
        while i < self.tokens.len() && self.lang.token_is_trivia(&self.tokens[i]) {
            i += 1;
        }
        i
    }

    /// The current non-trivia token, without advancing or flushing
    /// anything to the event stream.
    pub fn peek(&self) -> L::Token {
        let i = self.skip_trivia_index(self.pos);
        self.tokens.get(i).cloned().unwrap_or_else(|| self.lang.eof_token())
    }

    pub fn at(&self, kind: L::Kind) -> bool {
        self.lang.token_kind(&self.peek()) == kind
    }

    pub fn at_any(&self, kinds: &[L::Kind]) -> bool {
        let current = self.lang.token_kind(&self.peek());
        kinds.iter().any(|k| *k == current)
    }

    pub fn at_eof(&self) -> bool {
        self.lang.token_is_eof(&self.peek())
    }

    // -- Trivia flushing --------------------------------------------------

    /// Emit any buffered trivia tokens as leaves under the language's
    /// `whitespace_kind`, advancing past them, so the next real emission
    /// starts from a non-trivia token.
    pub fn flush_trivia(&mut self) {
        while self.pos < self.tokens.len() && self.lang.token_is_trivia(&self.tokens[self.pos]) {
            let text = self.lang.print_token(&self.tokens[self.pos]);
            self.events.push_token(self.lang.kind_to_raw(self.lang.whitespace_kind()), text.as_str());
            self.advance_raw(text.len() as u32);
        }
    }

    fn advance_raw(&mut self, text_len: u32) {
        self.pos += 1;
        self.byte_offset += text_len;
    }

    // -- Token consumption -------------------------------------------------

    /// Flush trivia, then emit the current token tagged as `kind` and
    /// advance the cursor.
    pub fn emit_token(&mut self, kind: L::Kind) {
        self.flush_trivia();
        let tok = self.tokens.get(self.pos).cloned().unwrap_or_else(|| self.lang.eof_token());
        let text = self.lang.print_token(&tok);
        self.events.push_token(self.lang.kind_to_raw(kind), text.as_str());
        self.advance_raw(text.len() as u32);
    }

    // -- Direct frame building ---------------------------------------------

    pub fn start_node(&mut self, kind: L::Kind) {
        self.events.push_start_node(self.lang.kind_to_raw(kind));
    }

    pub fn finish_node(&mut self) {
        self.events.push_finish_node();
    }

    /// Reserve a tombstone slot for later retroactive wrapping.
    pub fn mark(&mut self) -> Mark {
        Mark(self.events.mark())
    }

    /// Fill a previously reserved mark with `StartNode(kind)`.
    pub fn start_at(&mut self, mark: Mark, kind: L::Kind) -> Result<(), BuilderError> {
        self.events.start_at(mark.0, self.lang.kind_to_raw(kind))
    }

    // -- Error handling ------------------------------------------------------

    fn record_diagnostic(&mut self, message: impl Into<String>, start: u32, end: u32) {
        self.diagnostics.push(Diagnostic::new(message, start, end));
        self.errors_recorded += 1;
    }

    /// Append a diagnostic at the current token's span, without advancing.
    pub fn error(&mut self, message: impl Into<String>) {
        self.flush_trivia();
        let tok = self.peek();
        let start = self.byte_offset;
        let end = start + self.lang.print_token(&tok).len() as u32;
        self.record_diagnostic(message, start, end);
    }

    /// Emit the current token under `error_kind` and advance — "unexpected
    /// token, consumed as an error".
    pub fn bump_error(&mut self) {
        self.flush_trivia();
        let start = self.byte_offset;
        let error_kind = self.lang.error_kind();
        self.emit_token(error_kind);
        let end = self.byte_offset;
        self.record_diagnostic("unexpected token", start, end);
    }

    /// Emit a zero-width `error_kind` token without advancing — "missing
    /// X" diagnostics.
    pub fn emit_error_placeholder(&mut self, message: impl Into<String>) {
        self.flush_trivia();
        let pos = self.byte_offset;
        self.events.push_token(self.lang.kind_to_raw(self.lang.error_kind()), "");
        self.record_diagnostic(message, pos, pos);
    }

    /// Whether the error budget has been exceeded; grammars consult this
    /// to force termination by consuming the remainder as errors.
    pub fn error_budget_exceeded(&self) -> bool {
        self.errors_recorded >= self.error_budget
    }

    /// Consume every remaining token as an error, guaranteeing the parse
    /// terminates once the error budget is blown.
    pub fn consume_remainder_as_errors(&mut self) {
        while !self.at_eof() {
            self.bump_error();
        }
    }

    // -- Grammar combinators -------------------------------------------------

    /// Run `body` to build a node of `kind`, first consulting the reuse
    /// cursor: a hit splices the prior subtree in as a single `Reused`
    /// event and skips `body` entirely.
    pub fn node<T>(&mut self, kind: L::Kind, body: impl FnOnce(&mut Self) -> T) -> (CompletedMark, Option<T>) {
        let raw_kind = self.lang.kind_to_raw(kind);
        if let Some(cursor) = self.reuse.as_mut() {
            if let Some(hit) = cursor.try_reuse(raw_kind, self.byte_offset) {
                let span = hit.subtree.text_len();
                let end_offset = self.byte_offset + span;
                // `hit.subtree.token_count()` excludes trivia, but `self.pos`
                // indexes the raw token array trivia and all, so advancing by
                // it would desync the two. Count raw tokens by offset instead.
                let mut raw_count = 0usize;
                while self.pos + raw_count < self.flat.len() && self.flat[self.pos + raw_count].2 < end_offset {
                    raw_count += 1;
                }
                let mark = Mark(self.events.mark());
                self.events.push_reused(hit.subtree);
                self.diagnostics.extend(hit.diagnostics);
                self.byte_offset = end_offset;
                self.pos += raw_count;
                self.reuse_hits += 1;
                tracing::debug!(reuse_hits = self.reuse_hits, "subtree reused");
                return (CompletedMark { mark }, None);
            }
        }
        let mark = self.mark();
        self.start_at(mark, kind).expect("a freshly reserved mark is always a pending tombstone");
        let result = body(self);
        self.finish_node();
        (CompletedMark { mark }, Some(result))
    }

    /// Run `body`, then retroactively wrap everything emitted since `mark`
    /// (inclusive) in a node of `kind`. Inner `node` calls inside `body`
    /// still participate in reuse.
    pub fn wrap_at<T>(&mut self, mark: Mark, kind: L::Kind, body: impl FnOnce(&mut Self) -> T) -> (CompletedMark, T) {
        let result = body(self);
        self.start_at(mark, kind).expect("wrap_at's mark must still be a pending tombstone");
        self.finish_node();
        (CompletedMark { mark }, result)
    }

    // -- Completion -----------------------------------------------------------

    /// Replay the event stream into an immutable CST, and return the
    /// collected diagnostics alongside it.
    pub fn finish(self) -> Result<(Rc<CstNode>, Vec<Diagnostic>), BuilderError> {
        let root_kind = self.lang.kind_to_raw(self.lang.root_kind());
        let whitespace_kind = self.lang.kind_to_raw(self.lang.whitespace_kind());
        let cst = build_tree(self.events.events(), root_kind, Some(whitespace_kind))?;
        Ok((cst, self.diagnostics))
    }

    /// The raw event stream built so far, for tests that assert on event
    /// shape directly rather than the replayed tree.
    pub fn events(&self) -> &[ParseEvent] {
        self.events.events()
    }
}

fn flatten<L: LanguageSpec>(lang: &L, tokens: &[L::Token]) -> Rc<[FlatToken]> {
    let mut offset = 0u32;
    let vec: Vec<FlatToken> = tokens
        .iter()
        .map(|tok| {
            let text = lang.print_token(tok);
            let entry: FlatToken = (lang.kind_to_raw(lang.token_kind(tok)), Rc::from(text.as_str()), offset);
            offset += text.len() as u32;
            entry
        })
        .collect();
    vec.into()
}
