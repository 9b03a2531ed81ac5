#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::upper_case_acronyms)]
#![forbid(unsafe_code)]

//! `lrgen` turns an already analysed grammar and its LR automaton into Rust source: a
//! table-driven shift-reduce parser, a lexer which only tries the terminals valid in the current
//! parser state, and a builder which assembles typed AST nodes by calling user-written semantic
//! actions.
//!
//! Generation is a fixed pipeline:
//!
//!   1. [SymbolIndex] assigns dense indices to terminals, nonterminals, and productions.
//!   2. [NameTable] derives an identifier for every generated item.
//!   3. [Recognizers] compiles each terminal's recognizer into a [Matcher].
//!   4. [StateTable] encodes the automaton into action, goto, and expected-terminal tables.
//!   5. [AstBuilder] describes the shift and reduce handlers.
//!   6. The emitter renders all of the above into two source artifacts.
//!
//! Most users need only [CTParserGenerator]:
//!
//! ```text
//! let gp = CTParserGenerator::new()
//!     .parser_name("Calc")
//!     .generate(&grammar, &automaton)?;
//! gp.write_to(&out_dir)?;
//! ```
//!
//! which writes `calc.rs` (the parser, lexer, and builder) and `calc_types.rs` (the kind and value
//! enums). Both files expect to sit next to a hand-written `calc_actions` module which defines one
//! payload type per nonterminal and one semantic action function per production.

use std::{error::Error, fmt};

use lrmodel::{ModelError, StIdx};

pub mod astbuilder;
pub mod ctbuilder;
mod emitter;
pub mod index;
pub mod names;
pub mod recognizer;
pub mod statetable;
#[cfg(test)]
mod test_utils;

pub use crate::{
    astbuilder::{AstBuilder, ChildShape, ReduceArm, ShiftArm},
    ctbuilder::{Artifact, CTParserGenerator, GeneratedParser, Visibility},
    index::SymbolIndex,
    names::NameTable,
    recognizer::{Matcher, Recognizers},
    statetable::{Action, Conflicts, StateTable},
};

/// The various different possible code generation errors.
#[derive(Debug)]
pub enum CodegenErrorKind {
    /// A terminal or nonterminal name is declared more than once.
    DuplicateSymbol(String),
    /// A production, action, or goto refers to a symbol the grammar does not declare.
    UnknownSymbol(String),
    /// The augmenting start symbol is not one of the grammar's nonterminals.
    UnknownAugmentingSymbol(String),
    /// A symbol's name derives an empty identifier.
    EmptyIdentifier(String),
    /// A symbol's name (first) derives something which is not a valid identifier (second).
    InvalidIdentifier(String, String),
    /// Two symbols (second and third) derive the same identifier (first).
    DuplicateIdentifier(String, String, String),
    /// A terminal's pattern (first) is not a valid regular expression (second).
    InvalidPattern(String, String),
    /// A terminal's literal recognizer is the empty string.
    EmptyLiteral(String),
    /// The automaton has no states, so there is no start state.
    NoStates,
    /// State `from` refers to state `to`, which does not exist.
    InvalidStateRef { from: StIdx, to: StIdx },
    /// State `from` moves on `symbol` to `to`, but `to` records a different accessing symbol.
    InconsistentTransition {
        from: StIdx,
        symbol: String,
        to: StIdx,
    },
    /// A reduce names a nonterminal (first) which has no production with this ordinal (second).
    UnknownProduction(String, usize),
    /// A state reduces the augmenting start symbol rather than accepting.
    AugmentingReduce(StIdx),
    /// A state has two different gotos on the same nonterminal.
    DuplicateGoto(StIdx, String),
    /// Some (state, terminal) pairs have more than one candidate action.
    Conflicts(Conflicts),
    /// Emitted code failed to parse as Rust.
    Render(String),
    /// The grammar model itself could not be built.
    Model(ModelError),
}

/// Any error from code generation returns an instance of this struct.
#[derive(Debug)]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
}

impl CodegenError {
    pub(crate) fn new(kind: CodegenErrorKind) -> Self {
        CodegenError { kind }
    }
}

impl Error for CodegenError {}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for CodegenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CodegenErrorKind::DuplicateSymbol(n) => write!(f, "Symbol '{}' declared twice", n),
            CodegenErrorKind::UnknownSymbol(n) => write!(f, "Unknown symbol '{}'", n),
            CodegenErrorKind::UnknownAugmentingSymbol(n) => {
                write!(f, "Augmenting start symbol '{}' is not a nonterminal", n)
            }
            CodegenErrorKind::EmptyIdentifier(n) => {
                write!(f, "Symbol '{}' derives an empty identifier", n)
            }
            CodegenErrorKind::InvalidIdentifier(n, id) => {
                write!(f, "Symbol '{}' derives invalid identifier '{}'", n, id)
            }
            CodegenErrorKind::DuplicateIdentifier(id, n1, n2) => write!(
                f,
                "Symbols '{}' and '{}' both derive identifier '{}'",
                n1, n2, id
            ),
            CodegenErrorKind::InvalidPattern(n, e) => {
                write!(f, "Invalid pattern for terminal '{}': {}", n, e)
            }
            CodegenErrorKind::EmptyLiteral(n) => {
                write!(f, "Terminal '{}' has an empty literal recognizer", n)
            }
            CodegenErrorKind::NoStates => write!(f, "Automaton has no states"),
            CodegenErrorKind::InvalidStateRef { from, to } => {
                write!(f, "State {} refers to non-existent state {}", from, to)
            }
            CodegenErrorKind::InconsistentTransition { from, symbol, to } => write!(
                f,
                "State {} moves on '{}' to state {}, which is not entered on '{}'",
                from, symbol, to, symbol
            ),
            CodegenErrorKind::UnknownProduction(n, o) => {
                write!(f, "Nonterminal '{}' has no production {}", n, o)
            }
            CodegenErrorKind::AugmentingReduce(stidx) => {
                write!(f, "State {} reduces the augmenting start symbol", stidx)
            }
            CodegenErrorKind::DuplicateGoto(stidx, n) => {
                write!(f, "State {} has more than one goto on '{}'", stidx, n)
            }
            CodegenErrorKind::Conflicts(c) => write!(
                f,
                "Conflicts ({} Shift/Reduce, {} Reduce/Reduce, {} other)",
                c.sr_len(),
                c.rr_len(),
                c.other_len()
            ),
            CodegenErrorKind::Render(e) => write!(f, "Generated code is not valid Rust: {}", e),
            CodegenErrorKind::Model(e) => write!(f, "{}", e),
        }
    }
}

impl From<ModelError> for CodegenError {
    fn from(err: ModelError) -> Self {
        CodegenError::new(CodegenErrorKind::Model(err))
    }
}
