//! An incremental parsing substrate: a lossless, content-addressed
//! concrete syntax tree with structural sharing, a positioned view layer,
//! an event-driven tree builder, a language-agnostic recursive-descent
//! framework with error recovery and subtree reuse, and a reactive
//! two-stage memoization pipeline that re-parses only when input changes
//! and suppresses downstream work when the CST is structurally
//! unchanged.
//!
//! This crate ships no lexer, grammar, or AST of its own — those are
//! external collaborators a language supplies through [`LanguageSpec`]
//! and [`Language`]. See `tests/common` for a minimal demonstration
//! language exercising the whole stack end to end.

pub mod config;
pub mod cst;
pub mod edit;
pub mod error;
pub mod event;
pub mod hash;
pub mod interner;
pub mod kind;
pub mod language;
pub mod parser;
pub mod pipeline;
pub mod positioned;
pub mod reactive;
pub mod stage;

pub use config::ParserConfig;
pub use cst::{CstElement, CstNode, CstToken};
pub use edit::Edit;
pub use error::BuilderError;
pub use event::{EventBuffer, ParseEvent, build_tree};
pub use interner::Interner;
pub use kind::Kind;
pub use language::{Language, LanguageSpec};
pub use parser::{CompletedMark, Mark, ParserContext};
pub use pipeline::ParserDb;
pub use positioned::{PositionedElement, PositionedNode, PositionedToken};
pub use reactive::{Memo, Runtime, Signal};
pub use stage::{CstStage, Diagnostic};
