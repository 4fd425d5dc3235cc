//! `CstStage` and `Diagnostic` — the value a language's `parse_source`
//! produces, and what the incremental pipeline memoizes in its first
//! stage.

use std::rc::Rc;

use crate::cst::CstNode;

/// A recorded parse problem, reduced to a string message and byte range
/// by the time it reaches a `CstStage` — the pipeline's equality check
/// on `CstStage` must stay free of anything but plain values, so no
/// token handles or language-specific payloads survive past this point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub start: u32,
    pub end: u32,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, start: u32, end: u32) -> Self {
        Diagnostic { message: message.into(), start, end }
    }
}

/// The output of a language's `parse_source`: a CST plus whatever
/// diagnostics were recorded while building it, plus whether the
/// failure (if any) happened at the lexical level.
///
/// `is_lex_error = true` implies `diagnostics` is non-empty and `cst` is
/// a minimal valid tree of the language's root kind — no partial parse
/// is attempted once lexing itself has failed.
#[derive(Clone)]
pub struct CstStage {
    pub cst: Rc<CstNode>,
    pub diagnostics: Vec<Diagnostic>,
    pub is_lex_error: bool,
}

impl CstStage {
    pub fn new(cst: Rc<CstNode>, diagnostics: Vec<Diagnostic>, is_lex_error: bool) -> Self {
        CstStage { cst, diagnostics, is_lex_error }
    }
}

impl PartialEq for CstStage {
    fn eq(&self, other: &Self) -> bool {
        // Delegates to CST hash-gated structural equality plus the
        // diagnostic sequence and the lex-error flag, per the data
        // model's equality contract for CstStage. This is exactly what
        // backdates `cst_memo`: two different source strings that
        // happen to produce an equal CstStage don't re-run downstream.
        self.cst == other.cst && self.diagnostics == other.diagnostics && self.is_lex_error == other.is_lex_error
    }
}
impl Eq for CstStage {}
