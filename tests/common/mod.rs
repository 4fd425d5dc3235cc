//! A tiny lambda-calculus-like expression language, used only to
//! exercise `LanguageSpec`, `ParserContext`, and `ParserDb` end to end in
//! the integration tests. Not part of the published library surface.
//!
//! Grammar:
//!
//! ```text
//! expr  := atom (PLUS atom)*
//! atom  := INT | IDENT | LAMBDA IDENT DOT expr | LPAREN expr RPAREN
//! ```
//!
//! matching the vocabulary the spec's own testable-property scenarios
//! use (`"x"`, `"1+2"`, `"λx.x + λy.y + λz.z"`).

#![allow(dead_code)]

use std::rc::Rc;

use cstlab_parse::{
    CompletedMark, CstStage, Diagnostic, Edit, Kind, Language, LanguageSpec, ParserConfig, ParserContext,
    PositionedNode, build_tree,
};
use logos::Logos;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DemoKind {
    // Tokens.
    Int,
    Ident,
    Lambda,
    Dot,
    Plus,
    LParen,
    RParen,
    Whitespace,
    Error,
    Eof,
    // Nodes.
    Root,
    IntLit,
    VarRef,
    LambdaExpr,
    Binary,
    Paren,
    ErrorNode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: DemoKind,
    pub text: Rc<str>,
}

#[derive(Logos, Clone, Copy, PartialEq, Eq, Debug)]
enum Lexeme {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r"[0-9]+")]
    Int,
    #[token("\u{03BB}")]
    Lambda,
    #[token(".")]
    Dot,
    #[token("+")]
    Plus,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}

/// Lex `source`, returning the token list and, if lexing failed, the
/// byte offset of the first illegal character.
pub fn lex(source: &str) -> (Vec<Token>, Option<u32>) {
    let mut out = Vec::new();
    let mut lexer = Lexeme::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(lexeme) => {
                let kind = match lexeme {
                    Lexeme::Whitespace => DemoKind::Whitespace,
                    Lexeme::Int => DemoKind::Int,
                    Lexeme::Lambda => DemoKind::Lambda,
                    Lexeme::Dot => DemoKind::Dot,
                    Lexeme::Plus => DemoKind::Plus,
                    Lexeme::LParen => DemoKind::LParen,
                    Lexeme::RParen => DemoKind::RParen,
                    Lexeme::Ident => DemoKind::Ident,
                };
                out.push(Token { kind, text: Rc::from(&source[span]) });
            }
            Err(()) => return (out, Some(span.start as u32)),
        }
    }
    (out, None)
}

pub struct DemoLanguage;

impl LanguageSpec for DemoLanguage {
    type Token = Token;
    type Kind = DemoKind;

    fn kind_to_raw(&self, kind: DemoKind) -> Kind {
        Kind(kind as u16)
    }

    fn token_kind(&self, token: &Token) -> DemoKind {
        token.kind
    }

    fn token_is_eof(&self, token: &Token) -> bool {
        token.kind == DemoKind::Eof
    }

    fn token_is_trivia(&self, token: &Token) -> bool {
        token.kind == DemoKind::Whitespace
    }

    fn tokens_equal(&self, a: &Token, b: &Token) -> bool {
        a.kind == b.kind && a.text == b.text
    }

    fn print_token(&self, token: &Token) -> String {
        token.text.to_string()
    }

    fn whitespace_kind(&self) -> DemoKind {
        DemoKind::Whitespace
    }

    fn error_kind(&self) -> DemoKind {
        DemoKind::Error
    }

    fn root_kind(&self) -> DemoKind {
        DemoKind::Root
    }

    fn eof_token(&self) -> Token {
        Token { kind: DemoKind::Eof, text: Rc::from("") }
    }
}

fn raw(kind: DemoKind) -> Kind {
    Kind(kind as u16)
}

fn parse_atom(ctx: &mut ParserContext<DemoLanguage>) -> CompletedMark {
    if ctx.at(DemoKind::Int) {
        ctx.node(DemoKind::IntLit, |c| c.emit_token(DemoKind::Int)).0
    } else if ctx.at(DemoKind::Ident) {
        ctx.node(DemoKind::VarRef, |c| c.emit_token(DemoKind::Ident)).0
    } else if ctx.at(DemoKind::Lambda) {
        ctx.node(DemoKind::LambdaExpr, |c| {
            c.emit_token(DemoKind::Lambda);
            if c.at(DemoKind::Ident) {
                c.emit_token(DemoKind::Ident);
            } else {
                c.emit_error_placeholder("expected a parameter name");
            }
            if c.at(DemoKind::Dot) {
                c.emit_token(DemoKind::Dot);
            } else {
                c.emit_error_placeholder("expected '.'");
            }
            parse_expr(c);
        })
        .0
    } else if ctx.at(DemoKind::LParen) {
        ctx.node(DemoKind::Paren, |c| {
            c.emit_token(DemoKind::LParen);
            parse_expr(c);
            if c.at(DemoKind::RParen) {
                c.emit_token(DemoKind::RParen);
            } else {
                c.emit_error_placeholder("expected ')'");
            }
        })
        .0
    } else if ctx.error_budget_exceeded() {
        ctx.node(DemoKind::ErrorNode, |c| c.consume_remainder_as_errors()).0
    } else {
        ctx.node(DemoKind::ErrorNode, |c| {
            c.error("expected an expression");
            c.bump_error();
        })
        .0
    }
}

/// `expr := atom (PLUS atom)*`, left-associative: each further `PLUS`
/// retroactively wraps the `Binary` node built so far, via
/// `CompletedMark::precede`/`ParserContext::wrap_at`, rather than
/// flattening every operand into one node.
pub fn parse_expr(ctx: &mut ParserContext<DemoLanguage>) {
    let mut completed = parse_atom(ctx);
    while ctx.at(DemoKind::Plus) {
        let mark = completed.precede(ctx);
        let (wrapped, _right) = ctx.wrap_at(mark, DemoKind::Binary, |c| {
            c.emit_token(DemoKind::Plus);
            parse_atom(c)
        });
        completed = wrapped;
    }
}

fn minimal_lex_error_stage(message: impl Into<String>, offset: u32) -> CstStage {
    let cst = build_tree(&[], raw(DemoKind::Root), Some(raw(DemoKind::Whitespace)))
        .expect("an empty event stream is always balanced");
    CstStage::new(cst, vec![Diagnostic::new(message, offset, offset + 1)], true)
}

/// `LanguageSpec::parse_source` entry point: lex, then parse `expr` to
/// EOF, forcing progress on any trailing garbage.
pub fn parse_source(source: &str) -> CstStage {
    let (tokens, illegal) = lex(source);
    if let Some(offset) = illegal {
        return minimal_lex_error_stage(format!("illegal character at byte {offset}"), offset);
    }

    let lang = DemoLanguage;
    let config = ParserConfig::default();
    let mut ctx = ParserContext::new(&lang, &tokens, &config);
    parse_expr(&mut ctx);
    while !ctx.at_eof() {
        ctx.bump_error();
    }
    let (cst, diagnostics) = ctx.finish().expect("the demo grammar never leaves an unbalanced event stream");
    CstStage::new(cst, diagnostics, false)
}

/// Parse `source` against `old_cst`/`old_diagnostics` under `edit`,
/// enabling subtree reuse. Returns the resulting `CstStage` plus the
/// number of subtrees accepted for reuse.
pub fn parse_source_with_reuse(
    source: &str,
    old_cst: Rc<cstlab_parse::CstNode>,
    old_diagnostics: &[Diagnostic],
    edit: Edit,
) -> (CstStage, u32) {
    let (tokens, illegal) = lex(source);
    if let Some(offset) = illegal {
        return (minimal_lex_error_stage(format!("illegal character at byte {offset}"), offset), 0);
    }

    let lang = DemoLanguage;
    let config = ParserConfig::default();
    let mut ctx = ParserContext::new(&lang, &tokens, &config).with_reuse(old_cst, old_diagnostics, edit);
    parse_expr(&mut ctx);
    while !ctx.at_eof() {
        ctx.bump_error();
    }
    let hits = ctx.reuse_hits();
    let (cst, diagnostics) = ctx.finish().expect("the demo grammar never leaves an unbalanced event stream");
    (CstStage::new(cst, diagnostics, false), hits)
}

/// The demo language's abstract syntax tree. Structural equality ignores
/// positions (there are none stored here), matching the "AST equality is
/// structure-only" design requirement the backdating pipeline depends on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ast {
    Int(i64),
    Var(String),
    Lambda { param: String, body: Box<Ast> },
    Binary { left: Box<Ast>, right: Box<Ast> },
    Error(String),
}

fn convert(node: &Rc<PositionedNode>) -> Ast {
    let kind = node.kind();
    if kind == raw(DemoKind::IntLit) {
        let text = node.find_token(raw(DemoKind::Int)).map(|t| t.text().to_string()).unwrap_or_default();
        Ast::Int(text.parse().unwrap_or(0))
    } else if kind == raw(DemoKind::VarRef) {
        let text = node.find_token(raw(DemoKind::Ident)).map(|t| t.text().to_string()).unwrap_or_default();
        Ast::Var(text)
    } else if kind == raw(DemoKind::LambdaExpr) {
        let param = node.find_token(raw(DemoKind::Ident)).map(|t| t.text().to_string()).unwrap_or_default();
        let body = node.children().into_iter().next_back().expect("a lambda body is always parsed");
        Ast::Lambda { param, body: Box::new(convert(&Rc::new(body))) }
    } else if kind == raw(DemoKind::Paren) {
        let inner = node.children().into_iter().next().expect("a parenthesized expression always has an inner node");
        convert(&Rc::new(inner))
    } else if kind == raw(DemoKind::Binary) {
        let mut operands = node.children().into_iter();
        let left = operands.next().expect("a binary node always has a left operand");
        let right = operands.next().expect("a binary node always has a right operand");
        Ast::Binary { left: Box::new(convert(&Rc::new(left))), right: Box::new(convert(&Rc::new(right))) }
    } else if kind == raw(DemoKind::ErrorNode) {
        let text = node.tokens().into_iter().map(|t| t.text().to_string()).collect::<String>();
        Ast::Error(text)
    } else if kind == raw(DemoKind::Root) {
        match node.children().into_iter().next() {
            Some(first) => convert(&Rc::new(first)),
            None => Ast::Error(String::new()),
        }
    } else {
        unreachable!("demo grammar never produces node kind {:?}", kind)
    }
}

pub fn to_ast(root: Rc<PositionedNode>) -> Ast {
    convert(&root)
}

pub fn on_lex_error(first_diagnostic: &str) -> Ast {
    Ast::Error(first_diagnostic.to_string())
}

/// Build the type-erased `Language<Ast>` this crate's pipeline runs
/// against.
pub fn demo_language() -> Language<Ast> {
    Language::new(parse_source, to_ast, on_lex_error)
}
