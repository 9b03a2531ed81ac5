//! Dense indices for every symbol and production the generator emits.

use std::collections::HashMap;

use indexmap::IndexSet;
use log::debug;
use lrmodel::{GrammarModel, NTIdx, PIdx, Recognizer, Symbol, SymbolRef, TIdx};

use crate::{CodegenError, CodegenErrorKind};

struct ProdInfo {
    nonterm: NTIdx,
    ordinal: usize,
    rhs: Vec<Symbol>,
}

/// The indices assigned to one grammar. Indices follow the grammar's enumeration order, so
/// indexing the same grammar twice always gives the same result.
///
/// The augmenting start nonterminal (and its productions) are not indexed.
pub struct SymbolIndex {
    terms: IndexSet<String>,
    recognizers: Vec<Recognizer>,
    nonterms: IndexSet<String>,
    prods: Vec<ProdInfo>,
    nonterm_prods: Vec<Vec<PIdx>>,
    augmented_start: Option<String>,
}

impl SymbolIndex {
    /// Index `grm`. Names must be unique within their class, and every right-hand side reference
    /// must name a declared, non-augmenting, symbol of the stated class.
    pub fn new(grm: &GrammarModel) -> Result<Self, CodegenError> {
        if let Some(start) = &grm.augmented_start {
            if !grm.nonterminals.iter().any(|nt| &nt.name == start) {
                return Err(CodegenError::new(
                    CodegenErrorKind::UnknownAugmentingSymbol(start.clone()),
                ));
            }
        }

        let mut terms = IndexSet::with_capacity(grm.terminals.len());
        let mut recognizers = Vec::with_capacity(grm.terminals.len());
        for t in &grm.terminals {
            if !terms.insert(t.name.clone()) {
                return Err(CodegenError::new(CodegenErrorKind::DuplicateSymbol(
                    t.name.clone(),
                )));
            }
            recognizers.push(t.recognizer.clone());
        }

        let mut nonterms = IndexSet::with_capacity(grm.nonterminals.len());
        let mut augmenting_seen = false;
        for nt in &grm.nonterminals {
            if grm.is_augmented_start(&nt.name) {
                if augmenting_seen {
                    return Err(CodegenError::new(CodegenErrorKind::DuplicateSymbol(
                        nt.name.clone(),
                    )));
                }
                augmenting_seen = true;
                continue;
            }
            if !nonterms.insert(nt.name.clone()) {
                return Err(CodegenError::new(CodegenErrorKind::DuplicateSymbol(
                    nt.name.clone(),
                )));
            }
        }

        let mut prods = Vec::new();
        let mut nonterm_prods = Vec::with_capacity(nonterms.len());
        for nt in grm
            .nonterminals
            .iter()
            .filter(|nt| !grm.is_augmented_start(&nt.name))
        {
            let ntidx = NTIdx(nonterm_prods.len());
            let mut pidxs = Vec::with_capacity(nt.productions.len());
            for (ordinal, prod) in nt.productions.iter().enumerate() {
                let mut rhs = Vec::with_capacity(prod.rhs.len());
                for sym in &prod.rhs {
                    let resolved = match sym {
                        SymbolRef::Terminal(n) => {
                            terms.get_index_of(n).map(|i| Symbol::Term(TIdx(i)))
                        }
                        SymbolRef::NonTerminal(n) => nonterms
                            .get_index_of(n)
                            .map(|i| Symbol::NonTerm(NTIdx(i))),
                    };
                    match resolved {
                        Some(s) => rhs.push(s),
                        None => {
                            return Err(CodegenError::new(CodegenErrorKind::UnknownSymbol(
                                sym.name().to_owned(),
                            )));
                        }
                    }
                }
                pidxs.push(PIdx(prods.len()));
                prods.push(ProdInfo {
                    nonterm: ntidx,
                    ordinal,
                    rhs,
                });
            }
            nonterm_prods.push(pidxs);
        }

        debug!(
            "Indexed {} terminals, {} nonterminals, {} productions",
            terms.len(),
            nonterms.len(),
            prods.len()
        );

        Ok(SymbolIndex {
            terms,
            recognizers,
            nonterms,
            prods,
            nonterm_prods,
            augmented_start: grm.augmented_start.clone(),
        })
    }

    /// How many terminals does this grammar have?
    pub fn terms_len(&self) -> usize {
        self.terms.len()
    }

    /// How many (non-augmenting) nonterminals does this grammar have?
    pub fn nonterms_len(&self) -> usize {
        self.nonterms.len()
    }

    /// How many (non-augmenting) productions does this grammar have?
    pub fn prods_len(&self) -> usize {
        self.prods.len()
    }

    /// Return an iterator which produces (in order from `0..self.terms_len()`) all this
    /// grammar's valid `TIdx`s.
    pub fn iter_tidxs(&self) -> impl Iterator<Item = TIdx> {
        (0..self.terms.len()).map(TIdx)
    }

    /// Return an iterator which produces (in order from `0..self.nonterms_len()`) all this
    /// grammar's valid `NTIdx`s.
    pub fn iter_ntidxs(&self) -> impl Iterator<Item = NTIdx> {
        (0..self.nonterms.len()).map(NTIdx)
    }

    /// Return an iterator which produces (in order from `0..self.prods_len()`) all this
    /// grammar's valid `PIdx`s.
    pub fn iter_pidxs(&self) -> impl Iterator<Item = PIdx> {
        (0..self.prods.len()).map(PIdx)
    }

    pub fn term_idx(&self, name: &str) -> Option<TIdx> {
        self.terms.get_index_of(name).map(TIdx)
    }

    pub fn nonterm_idx(&self, name: &str) -> Option<NTIdx> {
        self.nonterms.get_index_of(name).map(NTIdx)
    }

    /// Return the grammar name of terminal `tidx`. Panics if `tidx` doesn't exist.
    pub fn term_name(&self, tidx: TIdx) -> &str {
        &self.terms[usize::from(tidx)]
    }

    /// Return the grammar name of nonterminal `ntidx`. Panics if `ntidx` doesn't exist.
    pub fn nonterm_name(&self, ntidx: NTIdx) -> &str {
        &self.nonterms[usize::from(ntidx)]
    }

    pub fn recognizer(&self, tidx: TIdx) -> &Recognizer {
        &self.recognizers[usize::from(tidx)]
    }

    /// Get the sequence of symbols for production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod(&self, pidx: PIdx) -> &[Symbol] {
        &self.prods[usize::from(pidx)].rhs
    }

    /// How many symbols does production `pidx` have? Panics if `pidx` doesn't exist.
    pub fn prod_len(&self, pidx: PIdx) -> usize {
        self.prods[usize::from(pidx)].rhs.len()
    }

    /// Return the nonterminal index of the production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod_to_nonterm(&self, pidx: PIdx) -> NTIdx {
        self.prods[usize::from(pidx)].nonterm
    }

    /// Return the position of `pidx` amongst its nonterminal's productions.
    pub fn prod_ordinal(&self, pidx: PIdx) -> usize {
        self.prods[usize::from(pidx)].ordinal
    }

    /// Return the productions for nonterminal `ntidx`. Panics if `ntidx` doesn't exist.
    pub fn nonterm_prods(&self, ntidx: NTIdx) -> &[PIdx] {
        &self.nonterm_prods[usize::from(ntidx)]
    }

    /// Resolve the `ordinal`th production of the nonterminal `name`.
    pub fn prod_ref(&self, name: &str, ordinal: usize) -> Option<PIdx> {
        self.nonterm_idx(name)
            .and_then(|ntidx| self.nonterm_prods(ntidx).get(ordinal).copied())
    }

    /// The qualified name of `pidx`: its nonterminal's grammar name, `P`, and its ordinal (e.g.
    /// `StmtsP1`).
    pub fn qualified_name(&self, pidx: PIdx) -> String {
        format!(
            "{}P{}",
            self.nonterm_name(self.prod_to_nonterm(pidx)),
            self.prod_ordinal(pidx)
        )
    }

    /// Returns a string representation of the production `pidx` (e.g. `Stmt: Num ;`).
    pub fn pp_prod(&self, pidx: PIdx) -> String {
        let mut s = String::new();
        s.push_str(self.nonterm_name(self.prod_to_nonterm(pidx)));
        s.push(':');
        for sym in self.prod(pidx) {
            s.push(' ');
            match *sym {
                Symbol::Term(tidx) => s.push_str(self.term_name(tidx)),
                Symbol::NonTerm(ntidx) => s.push_str(self.nonterm_name(ntidx)),
            }
        }
        s
    }

    pub fn augmented_start(&self) -> Option<&str> {
        self.augmented_start.as_deref()
    }

    pub fn is_augmented_start(&self, name: &str) -> bool {
        self.augmented_start.as_deref() == Some(name)
    }

    /// Return a map from terminal names to their indices.
    pub fn token_map(&self) -> HashMap<String, TIdx> {
        self.terms
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), TIdx(i)))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::stmts_grammar;
    use lrmodel::{ProductionDef, SymbolRef};

    #[test]
    fn test_dense_indices() {
        let idx = SymbolIndex::new(&stmts_grammar()).unwrap();
        assert_eq!(idx.terms_len(), 3);
        assert_eq!(idx.nonterms_len(), 2);
        assert_eq!(idx.prods_len(), 3);
        assert_eq!(idx.term_idx("EOF"), Some(TIdx(0)));
        assert_eq!(idx.term_idx(";"), Some(TIdx(1)));
        assert_eq!(idx.term_idx("Num"), Some(TIdx(2)));
        assert_eq!(idx.nonterm_idx("Stmts"), Some(NTIdx(0)));
        assert_eq!(idx.nonterm_idx("Stmt"), Some(NTIdx(1)));
        // The augmenting symbol is not indexed.
        assert_eq!(idx.nonterm_idx("S'"), None);
        assert_eq!(idx.iter_pidxs().count(), 3);
        assert_eq!(idx.nonterm_prods(NTIdx(0)), &[PIdx(0), PIdx(1)]);
        assert_eq!(idx.nonterm_prods(NTIdx(1)), &[PIdx(2)]);
        assert_eq!(idx.prod_ref("Stmts", 1), Some(PIdx(1)));
        assert_eq!(idx.prod_ref("Stmts", 2), None);
        assert_eq!(idx.prod_ref("S'", 0), None);
    }

    #[test]
    fn test_productions() {
        let idx = SymbolIndex::new(&stmts_grammar()).unwrap();
        assert_eq!(
            idx.prod(PIdx(0)),
            &[Symbol::NonTerm(NTIdx(0)), Symbol::NonTerm(NTIdx(1))]
        );
        assert_eq!(idx.prod_len(PIdx(1)), 0);
        assert_eq!(idx.prod(PIdx(2)), &[Symbol::Term(TIdx(2)), Symbol::Term(TIdx(1))]);
        assert_eq!(idx.prod_to_nonterm(PIdx(2)), NTIdx(1));
        assert_eq!(idx.prod_ordinal(PIdx(1)), 1);
        assert_eq!(idx.qualified_name(PIdx(1)), "StmtsP1");
        assert_eq!(idx.qualified_name(PIdx(2)), "StmtP0");
        assert_eq!(idx.pp_prod(PIdx(2)), "Stmt: Num ;");
        assert_eq!(idx.pp_prod(PIdx(1)), "Stmts:");
    }

    #[test]
    fn test_deterministic() {
        let i1 = SymbolIndex::new(&stmts_grammar()).unwrap();
        let i2 = SymbolIndex::new(&stmts_grammar()).unwrap();
        assert_eq!(i1.token_map(), i2.token_map());
        for pidx in i1.iter_pidxs() {
            assert_eq!(i1.qualified_name(pidx), i2.qualified_name(pidx));
        }
    }

    #[test]
    fn test_unknown_symbol() {
        let mut grm = stmts_grammar();
        grm.nonterminals[1].productions[0]
            .rhs
            .push(SymbolRef::Terminal("Missing".to_owned()));
        match SymbolIndex::new(&grm) {
            Err(CodegenError {
                kind: CodegenErrorKind::UnknownSymbol(n),
            }) => assert_eq!(n, "Missing"),
            _ => panic!(),
        }

        // A terminal name used as a nonterminal reference is not resolved.
        let mut grm = stmts_grammar();
        grm.nonterminals[1].productions[0] =
            ProductionDef::new(vec![SymbolRef::NonTerminal("Num".to_owned())]);
        assert!(matches!(
            SymbolIndex::new(&grm),
            Err(CodegenError {
                kind: CodegenErrorKind::UnknownSymbol(_)
            })
        ));

        // Nor may productions refer to the augmenting symbol.
        let mut grm = stmts_grammar();
        grm.nonterminals[1].productions[0] =
            ProductionDef::new(vec![SymbolRef::NonTerminal("S'".to_owned())]);
        assert!(matches!(
            SymbolIndex::new(&grm),
            Err(CodegenError {
                kind: CodegenErrorKind::UnknownSymbol(_)
            })
        ));
    }

    #[test]
    fn test_duplicates() {
        let grm = stmts_grammar().terminal("Num", Recognizer::Empty);
        match SymbolIndex::new(&grm) {
            Err(CodegenError {
                kind: CodegenErrorKind::DuplicateSymbol(n),
            }) => assert_eq!(n, "Num"),
            _ => panic!(),
        }

        let grm = stmts_grammar().nonterminal("Stmt", vec![]);
        assert!(matches!(
            SymbolIndex::new(&grm),
            Err(CodegenError {
                kind: CodegenErrorKind::DuplicateSymbol(_)
            })
        ));

        let grm = stmts_grammar().augmented_start("Start");
        match SymbolIndex::new(&grm) {
            Err(CodegenError {
                kind: CodegenErrorKind::UnknownAugmentingSymbol(n),
            }) => assert_eq!(n, "Start"),
            _ => panic!(),
        }
    }
}
