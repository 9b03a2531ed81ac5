//! A description of the shift and reduce handlers of a generated builder.
//!
//! The generated builder keeps a stack of values. Shifting a terminal pushes a terminal value;
//! reducing a production pops one value per right-hand side symbol, passes the payload-carrying
//! ones to the production's semantic action, and pushes the resulting nonterminal value. The
//! types here say, for every terminal and production, what those handlers must do.

use lrmodel::{NTIdx, PIdx, Symbol, TIdx};

use crate::index::SymbolIndex;

/// How a shifted terminal becomes a value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShiftArm {
    pub tidx: TIdx,
    /// Does the value carry the matched text?
    pub payload: bool,
}

/// The expected shape of one popped value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChildShape {
    /// A payload-less terminal. Its position in the production implies its identity, so it is
    /// matched and dropped.
    Discard(TIdx),
    /// A payload-carrying terminal, passed to the semantic action.
    Terminal(TIdx),
    /// A nonterminal, passed to the semantic action.
    NonTerminal(NTIdx),
}

impl ChildShape {
    /// Is this value passed to the semantic action?
    pub fn is_arg(&self) -> bool {
        !matches!(self, ChildShape::Discard(_))
    }
}

/// How reducing a production turns popped values into a new value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReduceArm {
    pub pidx: PIdx,
    pub ntidx: NTIdx,
    /// One shape per right-hand side symbol, in push order.
    pub children: Vec<ChildShape>,
}

impl ReduceArm {
    /// How many values does this reduction pop?
    pub fn arity(&self) -> usize {
        self.children.len()
    }

    /// How many arguments does the semantic action take?
    pub fn args_len(&self) -> usize {
        self.children.iter().filter(|c| c.is_arg()).count()
    }
}

pub struct AstBuilder {
    shifts: Vec<ShiftArm>,
    reduces: Vec<ReduceArm>,
}

impl AstBuilder {
    pub fn new(idx: &SymbolIndex) -> Self {
        let shifts = idx
            .iter_tidxs()
            .map(|tidx| ShiftArm {
                tidx,
                payload: idx.recognizer(tidx).has_payload(),
            })
            .collect();
        let reduces = idx
            .iter_pidxs()
            .map(|pidx| ReduceArm {
                pidx,
                ntidx: idx.prod_to_nonterm(pidx),
                children: idx
                    .prod(pidx)
                    .iter()
                    .map(|sym| match *sym {
                        Symbol::Term(tidx) if idx.recognizer(tidx).has_payload() => {
                            ChildShape::Terminal(tidx)
                        }
                        Symbol::Term(tidx) => ChildShape::Discard(tidx),
                        Symbol::NonTerm(ntidx) => ChildShape::NonTerminal(ntidx),
                    })
                    .collect(),
            })
            .collect();
        AstBuilder { shifts, reduces }
    }

    /// The shift handler arms, indexed by `TIdx`.
    pub fn shifts(&self) -> &[ShiftArm] {
        &self.shifts
    }

    /// The reduce handler arms, indexed by `PIdx`.
    pub fn reduces(&self) -> &[ReduceArm] {
        &self.reduces
    }

    pub fn shift(&self, tidx: TIdx) -> &ShiftArm {
        &self.shifts[usize::from(tidx)]
    }

    pub fn reduce(&self, pidx: PIdx) -> &ReduceArm {
        &self.reduces[usize::from(pidx)]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::stmts_grammar;

    #[test]
    fn test_arms() {
        let idx = SymbolIndex::new(&stmts_grammar()).unwrap();
        let ab = AstBuilder::new(&idx);
        assert_eq!(ab.shifts().len(), 3);
        assert!(!ab.shift(TIdx(0)).payload);
        assert!(!ab.shift(TIdx(1)).payload);
        assert!(ab.shift(TIdx(2)).payload);

        let r = ab.reduce(PIdx(0));
        assert_eq!(r.ntidx, NTIdx(0));
        assert_eq!(
            r.children,
            vec![ChildShape::NonTerminal(NTIdx(0)), ChildShape::NonTerminal(NTIdx(1))]
        );

        // Zero arity: nothing is popped and the action takes no arguments.
        let r = ab.reduce(PIdx(1));
        assert_eq!(r.arity(), 0);
        assert_eq!(r.args_len(), 0);

        // The literal ';' is matched but not passed on.
        let r = ab.reduce(PIdx(2));
        assert_eq!(r.arity(), 2);
        assert_eq!(r.args_len(), 1);
        assert_eq!(
            r.children,
            vec![ChildShape::Terminal(TIdx(2)), ChildShape::Discard(TIdx(1))]
        );
    }
}
