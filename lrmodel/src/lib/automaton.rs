#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::StIdx;

/// A by-name reference to a production: the `ordinal`th production of `nonterminal`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProdRef {
    pub nonterminal: String,
    pub ordinal: usize,
}

impl ProdRef {
    pub fn new(nonterminal: &str, ordinal: usize) -> Self {
        ProdRef {
            nonterminal: nonterminal.to_owned(),
            ordinal,
        }
    }
}

/// An action recorded by the automaton. Errors are never recorded: they are the absence of an
/// action.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LRAction {
    Shift(StIdx),
    Reduce(ProdRef),
    Accept,
}

/// One automaton state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateDef {
    /// The symbol on which this state is entered (`None` for the start state).
    pub symbol: Option<String>,
    /// For each terminal with at least one action, the candidate actions in the order the
    /// engine recorded them. A conflict-free automaton has exactly one candidate per terminal.
    pub actions: Vec<(String, Vec<LRAction>)>,
    pub gotos: Vec<(String, StIdx)>,
}

impl StateDef {
    pub fn new(symbol: Option<&str>) -> Self {
        StateDef {
            symbol: symbol.map(|s| s.to_owned()),
            ..Default::default()
        }
    }

    /// Record `action` as a candidate on terminal `term`.
    pub fn action(mut self, term: &str, action: LRAction) -> Self {
        match self.actions.iter_mut().find(|(n, _)| n == term) {
            Some((_, acts)) => acts.push(action),
            None => self.actions.push((term.to_owned(), vec![action])),
        }
        self
    }

    /// Record a goto on nonterminal `nonterm` to `target`.
    pub fn goto(mut self, nonterm: &str, target: StIdx) -> Self {
        self.gotos.push((nonterm.to_owned(), target));
        self
    }
}

/// An LR automaton. A state's index is its position in `states`; state `0` is the start state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Automaton {
    pub states: Vec<StateDef>,
}

impl Automaton {
    pub fn new(states: Vec<StateDef>) -> Self {
        Automaton { states }
    }

    pub fn states_len(&self) -> usize {
        self.states.len()
    }

    /// Return an iterator over each state's index.
    pub fn iter_stidxs(&self) -> impl Iterator<Item = StIdx> {
        (0..self.states.len()).map(StIdx)
    }

    /// Return the state at `stidx`, if there is one.
    pub fn state(&self, stidx: StIdx) -> Option<&StateDef> {
        self.states.get(usize::from(stidx))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_candidates_accumulate() {
        let st = StateDef::new(None)
            .action("a", LRAction::Shift(StIdx(1)))
            .action("b", LRAction::Accept)
            .action("a", LRAction::Reduce(ProdRef::new("S", 0)));
        assert_eq!(st.actions.len(), 2);
        assert_eq!(
            st.actions[0].1,
            vec![
                LRAction::Shift(StIdx(1)),
                LRAction::Reduce(ProdRef::new("S", 0))
            ]
        );
        let aut = Automaton::new(vec![st, StateDef::new(Some("a"))]);
        assert_eq!(aut.states_len(), 2);
        assert_eq!(aut.iter_stidxs().collect::<Vec<_>>(), vec![StIdx(0), StIdx(1)]);
        assert_eq!(
            aut.state(StIdx(1)).and_then(|s| s.symbol.as_deref()),
            Some("a")
        );
        assert!(aut.state(StIdx(2)).is_none());
    }
}
