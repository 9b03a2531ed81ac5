#![allow(clippy::new_without_default)]

//! The model handed to the code generator by a grammar-analysis engine. Nothing in this crate
//! computes anything: it describes a grammar which has already been read, and the LR automaton
//! which has already been built for it.
//!
//! We use the following terminology:
//!
//!   * A *terminal* is a lexical element with a *recognizer* describing how input matches it.
//!   * A *nonterminal* maps a name to one or more *productions*.
//!   * A *production* is an ordered sequence of symbol references.
//!   * A *state* of the automaton maps terminals to candidate actions, and nonterminals to goto
//!     targets.
//!
//! All references between model objects are by name: resolving names into dense indices is the
//! job of the consumer. The order in which terminals, nonterminals, and productions appear is
//! significant, since consumers derive their indices from it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod automaton;
pub mod grammar;
mod idxnewtype;

pub use crate::{
    automaton::{Automaton, LRAction, ProdRef, StateDef},
    grammar::{
        GrammarModel, ModelError, ModelErrorKind, NonTerminalDef, ProductionDef, Recognizer,
        SymbolRef, TerminalDef,
    },
    idxnewtype::{NTIdx, PIdx, StIdx, TIdx},
};

/// A resolved symbol in a production: either a nonterminal or a terminal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Symbol {
    NonTerm(NTIdx),
    Term(TIdx),
}
