//! Ambient tunables for a parse.
//!
//! Neither value is dictated by the core (the design notes leave
//! `context_expand` to the lexer, and the error budget to the grammar),
//! so a language picks both and threads the same `ParserConfig` into
//! `ParserContext::new` and `Edit::lex_damage_range`.

/// Per-parse tunables: the error budget `ParserContext` enforces, and
/// the lookback/lookahead window a language's incremental lexer expands
/// an edit's damage range by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Recorded-diagnostic cap before the grammar must force forward
    /// progress by consuming the remainder as errors.
    pub error_budget: u32,
    /// Bytes of extra context re-tokenized on each side of an edit's
    /// damage range, to cover the lexer's maximum lookback (e.g.
    /// multi-byte characters, keyword boundaries).
    pub context_expand: u32,
}

impl ParserConfig {
    pub fn new(error_budget: u32, context_expand: u32) -> Self {
        ParserConfig { error_budget, context_expand }
    }
}

impl Default for ParserConfig {
    /// 50 recorded errors, matching the cap named in the error-recovery
    /// design notes; 8 bytes of lookback/lookahead, enough for a short
    /// keyword or a multi-byte UTF-8 sequence either side of an edit.
    fn default() -> Self {
        ParserConfig { error_budget: 50, context_expand: 8 }
    }
}
