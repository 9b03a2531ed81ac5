//! Encoding an automaton into dense tables.

use log::{debug, trace, warn};
use lrmodel::{Automaton, LRAction, NTIdx, PIdx, StIdx, StateDef, TIdx};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use vob::{IterSetBits, Vob};

use crate::{CodegenError, CodegenErrorKind, index::SymbolIndex};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action {
    /// Shift terminal Y and go to state X.
    Shift(StIdx, TIdx),
    /// Reduce production X, which has Y symbols, to nonterminal Z.
    Reduce(PIdx, usize, NTIdx),
    /// Accept this input.
    Accept,
    Error,
}

/// The conflicts found while encoding an automaton. A (state, terminal) pair with more than one
/// distinct candidate action records one conflict for each pair of candidates.
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Conflicts {
    shift_reduce: Vec<(TIdx, PIdx, StIdx)>,
    reduce_reduce: Vec<(PIdx, PIdx, StIdx)>,
    /// Conflicts involving accept, or shifts to two different states.
    other: Vec<(TIdx, StIdx)>,
}

impl Conflicts {
    fn is_empty(&self) -> bool {
        self.shift_reduce.is_empty() && self.reduce_reduce.is_empty() && self.other.is_empty()
    }

    /// Return an iterator over all shift/reduce conflicts.
    pub fn sr_conflicts(&self) -> impl Iterator<Item = &(TIdx, PIdx, StIdx)> {
        self.shift_reduce.iter()
    }

    /// Return an iterator over all reduce/reduce conflicts.
    pub fn rr_conflicts(&self) -> impl Iterator<Item = &(PIdx, PIdx, StIdx)> {
        self.reduce_reduce.iter()
    }

    /// How many shift/reduce conflicts are there?
    pub fn sr_len(&self) -> usize {
        self.shift_reduce.len()
    }

    /// How many reduce/reduce conflicts are there?
    pub fn rr_len(&self) -> usize {
        self.reduce_reduce.len()
    }

    /// How many other conflicts are there?
    pub fn other_len(&self) -> usize {
        self.other.len()
    }

    /// Returns a pretty-printed version of the conflicts.
    pub fn pp(&self, idx: &SymbolIndex) -> String {
        let mut s = String::new();
        if !self.shift_reduce.is_empty() {
            s.push_str("Shift/Reduce conflicts:\n");
            for (tidx, pidx, stidx) in self.sr_conflicts() {
                s.push_str(&format!(
                    "   State {:?}: Shift(\"{}\") / Reduce({})\n",
                    usize::from(*stidx),
                    idx.term_name(*tidx),
                    idx.pp_prod(*pidx)
                ));
            }
        }
        if !self.reduce_reduce.is_empty() {
            s.push_str("Reduce/Reduce conflicts:\n");
            for (pidx, r_pidx, stidx) in self.rr_conflicts() {
                s.push_str(&format!(
                    "   State {:?}: Reduce({}) / Reduce({})\n",
                    usize::from(*stidx),
                    idx.pp_prod(*pidx),
                    idx.pp_prod(*r_pidx)
                ));
            }
        }
        if !self.other.is_empty() {
            s.push_str("Other conflicts:\n");
            for (tidx, stidx) in &self.other {
                s.push_str(&format!(
                    "   State {:?}: \"{}\"\n",
                    usize::from(*stidx),
                    idx.term_name(*tidx)
                ));
            }
        }
        s
    }
}

/// Dense action and goto tables for an automaton. Rows represent states; the columns of
/// `actions` represent terminals and the columns of `gotos` nonterminals.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateTable {
    actions: Vec<Action>,
    state_actions: Vob,
    gotos: Vec<Option<StIdx>>,
    state_symbols: Vec<Option<String>>,
    states_len: usize,
    terms_len: usize,
    nonterms_len: usize,
    max_actions: usize,
    conflicts: Option<Conflicts>,
}

impl StateTable {
    /// Encode `aut`, whose symbols must all be indexed by `idx`. Every (state, terminal) pair
    /// should have at most one candidate action: if not, and `error_on_conflicts` is true, an
    /// error is returned; otherwise the first recorded candidate is used.
    pub fn new(
        idx: &SymbolIndex,
        aut: &Automaton,
        error_on_conflicts: bool,
    ) -> Result<Self, CodegenError> {
        let states_len = aut.states_len();
        if states_len == 0 {
            return Err(CodegenError::new(CodegenErrorKind::NoStates));
        }
        let terms_len = idx.terms_len();
        let nonterms_len = idx.nonterms_len();
        let mut actions = vec![Action::Error; states_len * terms_len];
        let mut state_actions = Vob::new();
        state_actions.resize(states_len * terms_len, false);
        let mut gotos = vec![None; states_len * nonterms_len];
        let mut conflicts = Conflicts::default();

        for (stidx, state) in aut.iter_stidxs().zip(aut.states.iter()) {
            // The candidates for each terminal of this state, in recording order.
            let mut cands: Vec<Vec<Action>> = vec![Vec::new(); terms_len];
            for (term, lracts) in &state.actions {
                let tidx = idx.term_idx(term).ok_or_else(|| {
                    CodegenError::new(CodegenErrorKind::UnknownSymbol(term.clone()))
                })?;
                for lract in lracts {
                    let act = encode(idx, aut, stidx, term, tidx, lract)?;
                    let tcands = &mut cands[usize::from(tidx)];
                    if !tcands.contains(&act) {
                        tcands.push(act);
                    }
                }
            }

            for (tidx, tcands) in idx.iter_tidxs().zip(cands) {
                let first = match tcands.first() {
                    Some(a) => *a,
                    None => continue,
                };
                // Every pair of distinct candidates is a conflict.
                for (i, a) in tcands.iter().enumerate() {
                    for b in &tcands[i + 1..] {
                        match (*a, *b) {
                            (Action::Shift(..), Action::Reduce(pidx, _, _))
                            | (Action::Reduce(pidx, _, _), Action::Shift(..)) => {
                                conflicts.shift_reduce.push((tidx, pidx, stidx))
                            }
                            (Action::Reduce(pidx, _, _), Action::Reduce(r_pidx, _, _)) => {
                                conflicts.reduce_reduce.push((pidx, r_pidx, stidx))
                            }
                            _ => conflicts.other.push((tidx, stidx)),
                        }
                    }
                }
                let off = actions_offset(terms_len, stidx, tidx);
                actions[off] = first;
                state_actions.set(off, true);
            }

            for (nonterm, target) in &state.gotos {
                let ntidx = idx.nonterm_idx(nonterm).ok_or_else(|| {
                    CodegenError::new(CodegenErrorKind::UnknownSymbol(nonterm.clone()))
                })?;
                check_transition(aut, stidx, nonterm, *target)?;
                let off = gotos_offset(nonterms_len, stidx, ntidx);
                match gotos[off] {
                    Some(t) if t != *target => {
                        return Err(CodegenError::new(CodegenErrorKind::DuplicateGoto(
                            stidx,
                            nonterm.clone(),
                        )));
                    }
                    _ => gotos[off] = Some(*target),
                }
            }
            trace!(
                "State {}: {} actions, {} gotos",
                stidx,
                state.actions.len(),
                state.gotos.len()
            );
        }

        let conflicts = if conflicts.is_empty() {
            None
        } else if error_on_conflicts {
            return Err(CodegenError::new(CodegenErrorKind::Conflicts(conflicts)));
        } else {
            warn!(
                "{} Shift/Reduce, {} Reduce/Reduce, and {} other conflicts: using the first \
                 recorded action\n{}",
                conflicts.sr_len(),
                conflicts.rr_len(),
                conflicts.other_len(),
                conflicts.pp(idx)
            );
            Some(conflicts)
        };

        let max_actions = (0..states_len)
            .map(|i| {
                let start = i * terms_len;
                state_actions.iter_set_bits(start..start + terms_len).count()
            })
            .max()
            .unwrap_or(0);
        debug!(
            "Encoded {} states ({} terminals, {} nonterminals, at most {} actions per state)",
            states_len, terms_len, nonterms_len, max_actions
        );

        Ok(StateTable {
            actions,
            state_actions,
            gotos,
            state_symbols: aut.states.iter().map(|s| s.symbol.clone()).collect(),
            states_len,
            terms_len,
            nonterms_len,
            max_actions,
            conflicts,
        })
    }

    /// Return the action for `stidx` and `tidx`.
    pub fn action(&self, stidx: StIdx, tidx: TIdx) -> Action {
        self.actions[actions_offset(self.terms_len, stidx, tidx)]
    }

    /// Return an iterator over the indexes of all non-error actions of `stidx`, in terminal
    /// declaration order.
    pub fn state_actions(&self, stidx: StIdx) -> StateActionsIterator<'_> {
        let start = usize::from(stidx) * self.terms_len;
        let end = start + self.terms_len;
        StateActionsIterator {
            iter: self.state_actions.iter_set_bits(start..end),
            start,
        }
    }

    /// The terminals with a non-error action in `stidx`, padded with `None` to
    /// [max_actions](#method.max_actions) entries.
    pub fn expected_terms(&self, stidx: StIdx) -> Vec<Option<TIdx>> {
        let mut v = self.state_actions(stidx).map(Some).collect::<Vec<_>>();
        v.resize(self.max_actions, None);
        v
    }

    /// Return the goto state for `stidx` and `ntidx` if it exists.
    pub fn goto(&self, stidx: StIdx, ntidx: NTIdx) -> Option<StIdx> {
        self.gotos[gotos_offset(self.nonterms_len, stidx, ntidx)]
    }

    /// The symbol on which `stidx` is entered, if known.
    pub fn state_symbol(&self, stidx: StIdx) -> Option<&str> {
        self.state_symbols[usize::from(stidx)].as_deref()
    }

    pub fn states_len(&self) -> usize {
        self.states_len
    }

    /// Return an iterator over all state indices.
    pub fn iter_stidxs(&self) -> impl Iterator<Item = StIdx> {
        (0..self.states_len).map(StIdx)
    }

    /// The largest number of non-error actions in any one state.
    pub fn max_actions(&self) -> usize {
        self.max_actions
    }

    /// The conflicts which were tolerated while encoding, if any.
    pub fn conflicts(&self) -> Option<&Conflicts> {
        self.conflicts.as_ref()
    }
}

fn encode(
    idx: &SymbolIndex,
    aut: &Automaton,
    stidx: StIdx,
    term: &str,
    tidx: TIdx,
    lract: &LRAction,
) -> Result<Action, CodegenError> {
    match lract {
        LRAction::Shift(target) => {
            check_transition(aut, stidx, term, *target)?;
            Ok(Action::Shift(*target, tidx))
        }
        LRAction::Reduce(pref) => {
            if idx.is_augmented_start(&pref.nonterminal) {
                return Err(CodegenError::new(CodegenErrorKind::AugmentingReduce(stidx)));
            }
            match idx.prod_ref(&pref.nonterminal, pref.ordinal) {
                Some(pidx) => Ok(Action::Reduce(
                    pidx,
                    idx.prod_len(pidx),
                    idx.prod_to_nonterm(pidx),
                )),
                None => Err(CodegenError::new(CodegenErrorKind::UnknownProduction(
                    pref.nonterminal.clone(),
                    pref.ordinal,
                ))),
            }
        }
        LRAction::Accept => Ok(Action::Accept),
    }
}

/// Check that `to` exists and, if its accessing symbol is known, that it is entered on `symbol`.
fn check_transition(
    aut: &Automaton,
    from: StIdx,
    symbol: &str,
    to: StIdx,
) -> Result<(), CodegenError> {
    match aut.state(to) {
        None => Err(CodegenError::new(CodegenErrorKind::InvalidStateRef {
            from,
            to,
        })),
        // States without a recorded accessing symbol can't be checked.
        Some(StateDef {
            symbol: Some(s), ..
        }) if s != symbol => Err(CodegenError::new(
            CodegenErrorKind::InconsistentTransition {
                from,
                symbol: symbol.to_owned(),
                to,
            },
        )),
        Some(_) => Ok(()),
    }
}

fn actions_offset(terms_len: usize, stidx: StIdx, tidx: TIdx) -> usize {
    usize::from(stidx) * terms_len + usize::from(tidx)
}

fn gotos_offset(nonterms_len: usize, stidx: StIdx, ntidx: NTIdx) -> usize {
    usize::from(stidx) * nonterms_len + usize::from(ntidx)
}

pub struct StateActionsIterator<'a> {
    iter: IterSetBits<'a, usize>,
    start: usize,
}

impl Iterator for StateActionsIterator<'_> {
    type Item = TIdx;

    fn next(&mut self) -> Option<TIdx> {
        self.iter.next().map(|i| TIdx(i - self.start))
    }
}
