//! The `LanguageSpec` dictionary, and the type-erased `Language<Ast>`
//! wrapper that lets `ParserDb` (`crate::pipeline`) stay generic only
//! over the AST type.
//!
//! A language is a collaborator the core never compiles against
//! directly: it supplies its own token type, its own kind enum, its own
//! lexer, and its own grammar built on top of `ParserContext`
//! (`crate::parser`). `LanguageSpec` is the narrow vtable the parser
//! context needs; `Language<Ast>` is the wider one `ParserDb` needs, per
//! the token-type-erasure pattern in the design notes — `Tok` and the
//! language's own `Kind` are captured inside boxed closures at
//! construction time so they never leak into `ParserDb`'s storage.

use std::rc::Rc;

use crate::kind::Kind;
use crate::positioned::PositionedNode;
use crate::stage::CstStage;

/// Per-language vtable consumed by `ParserContext`.
///
/// The core only ever calls these methods and compares `Kind` values by
/// equality — it never inspects what a language's own kind enum looks
/// like.
pub trait LanguageSpec {
    /// The lexer's positioned token type (kind + text + span).
    type Token: Clone;
    /// The language's own token/node kind enum.
    type Kind: Copy + Eq;

    /// Map the language's own kind enum to the core's opaque `Kind`.
    fn kind_to_raw(&self, kind: Self::Kind) -> Kind;

    /// The kind of a token.
    fn token_kind(&self, token: &Self::Token) -> Self::Kind;

    /// Whether a token is the synthetic end-of-file marker.
    fn token_is_eof(&self, token: &Self::Token) -> bool;

    /// Whether a token is trivia (whitespace/comments) rather than
    /// syntactically significant.
    fn token_is_trivia(&self, token: &Self::Token) -> bool;

    /// Value equality between two tokens (kind and text).
    fn tokens_equal(&self, a: &Self::Token, b: &Self::Token) -> bool;

    /// Render a token's text, for error messages and leaf construction.
    fn print_token(&self, token: &Self::Token) -> String;

    /// The kind trivia tokens are wrapped under in the CST.
    fn whitespace_kind(&self) -> Self::Kind;

    /// The kind used for error-recovery nodes/tokens.
    fn error_kind(&self) -> Self::Kind;

    /// The kind synthesized as the tree's root when no explicit root
    /// frame is present.
    fn root_kind(&self) -> Self::Kind;

    /// A synthetic end-of-file token, for cursors that have run off the
    /// end of the real token stream.
    fn eof_token(&self) -> Self::Token;
}

/// A language, exposed to `ParserDb` purely in terms of `Ast`.
///
/// Built once per language (not per parse) by capturing a
/// `LanguageSpec`-driven parser and AST converter behind boxed closures.
/// This is "selective type erasure without generic leakage into
/// storage" — implementations are free to use a vtable of function
/// pointers, virtual dispatch, or boxed closures; this crate uses boxed
/// closures because that's the idiom the rest of the crate's combinator
/// style (`node`, `wrap_at`) already leans on.
pub struct Language<Ast> {
    parse_source: Box<dyn Fn(&str) -> CstStage>,
    to_ast: Box<dyn Fn(Rc<PositionedNode>) -> Ast>,
    on_lex_error: Box<dyn Fn(&str) -> Ast>,
}

impl<Ast> Language<Ast> {
    pub fn new(
        parse_source: impl Fn(&str) -> CstStage + 'static,
        to_ast: impl Fn(Rc<PositionedNode>) -> Ast + 'static,
        on_lex_error: impl Fn(&str) -> Ast + 'static,
    ) -> Self {
        Language { parse_source: Box::new(parse_source), to_ast: Box::new(to_ast), on_lex_error: Box::new(on_lex_error) }
    }

    /// Lex and parse `source`, per the `parse_source` contract in the
    /// external interfaces: never aborts, and sets `is_lex_error`
    /// explicitly rather than leaving it to be inferred downstream.
    pub fn parse_source(&self, source: &str) -> CstStage {
        (self.parse_source)(source)
    }

    /// Convert a positioned CST root into this language's AST.
    pub fn to_ast(&self, root: Rc<PositionedNode>) -> Ast {
        (self.to_ast)(root)
    }

    /// Synthesize an AST for a lexical failure, given the first
    /// diagnostic's message.
    pub fn on_lex_error(&self, first_diagnostic: &str) -> Ast {
        (self.on_lex_error)(first_diagnostic)
    }
}
