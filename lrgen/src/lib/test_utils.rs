//! Shared fixtures, and an LR driver which interprets encoded tables directly so that the
//! generator's output can be checked by parsing real input.

use lrmodel::{
    Automaton, GrammarModel, LRAction, NTIdx, PIdx, ProdRef, ProductionDef, Recognizer,
    StIdx, StateDef, SymbolRef, TIdx,
};

use crate::{
    astbuilder::{AstBuilder, ChildShape},
    recognizer::Recognizers,
    statetable::{Action, StateTable},
};

fn t(n: &str) -> SymbolRef {
    SymbolRef::Terminal(n.to_owned())
}

fn nt(n: &str) -> SymbolRef {
    SymbolRef::NonTerminal(n.to_owned())
}

/// ```text
/// S': Stmts;
/// Stmts: Stmts Stmt | ;
/// Stmt: Num ';';
/// ```
pub(crate) fn stmts_grammar() -> GrammarModel {
    GrammarModel::new()
        .terminal("EOF", Recognizer::Empty)
        .terminal(";", Recognizer::Literal(";".to_owned()))
        .terminal("Num", Recognizer::Pattern("[0-9]+".to_owned()))
        .nonterminal("S'", vec![ProductionDef::new(vec![nt("Stmts")])])
        .nonterminal(
            "Stmts",
            vec![
                ProductionDef::new(vec![nt("Stmts"), nt("Stmt")]),
                ProductionDef::new(vec![]),
            ],
        )
        .nonterminal("Stmt", vec![ProductionDef::new(vec![t("Num"), t(";")])])
        .augmented_start("S'")
}

/// The LALR(1) automaton of [stmts_grammar].
pub(crate) fn stmts_automaton() -> Automaton {
    let stmts_empty = || LRAction::Reduce(ProdRef::new("Stmts", 1));
    let stmts_list = || LRAction::Reduce(ProdRef::new("Stmts", 0));
    let stmt = || LRAction::Reduce(ProdRef::new("Stmt", 0));
    Automaton::new(vec![
        StateDef::new(None)
            .action("EOF", stmts_empty())
            .action("Num", stmts_empty())
            .goto("Stmts", StIdx(1)),
        StateDef::new(Some("Stmts"))
            .action("EOF", LRAction::Accept)
            .action("Num", LRAction::Shift(StIdx(2)))
            .goto("Stmt", StIdx(3)),
        StateDef::new(Some("Num")).action(";", LRAction::Shift(StIdx(4))),
        StateDef::new(Some("Stmt"))
            .action("EOF", stmts_list())
            .action("Num", stmts_list()),
        StateDef::new(Some(";"))
            .action("EOF", stmt())
            .action("Num", stmt()),
    ])
}

/// A value on the builder's stack.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Value {
    Term {
        tidx: TIdx,
        lexeme: Option<String>,
    },
    NonTerm {
        ntidx: NTIdx,
        pidx: PIdx,
        args: Vec<Value>,
    },
}

/// Parse `input`, returning the position of the first error if parsing fails. Whitespace before
/// each token is skipped. Tokens are recognized by trying, in order, only those terminals valid
/// in the current state.
pub(crate) fn parse(
    st: &StateTable,
    rs: &Recognizers,
    ab: &AstBuilder,
    input: &str,
) -> Result<Value, usize> {
    let lex = |stidx: StIdx, pos: usize| -> Option<(TIdx, usize, usize)> {
        let start = pos + input[pos..].len() - input[pos..].trim_start().len();
        st.expected_terms(stidx)
            .into_iter()
            .flatten()
            .find_map(|tidx| {
                rs.matcher(tidx)
                    .recognize(&input[start..])
                    .map(|m| (tidx, start, m.len()))
            })
    };

    let mut pstack = vec![StIdx(0)];
    let mut res_stack: Vec<Value> = Vec::new();
    let mut pos = 0;
    let mut la = lex(StIdx(0), pos).ok_or(pos)?;
    loop {
        let stidx = *pstack.last().unwrap();
        let (tidx, start, len) = la;
        match st.action(stidx, tidx) {
            Action::Shift(target, s_tidx) => {
                pstack.push(target);
                let lexeme = &input[start..start + len];
                res_stack.push(Value::Term {
                    tidx: s_tidx,
                    lexeme: ab.shift(s_tidx).payload.then(|| lexeme.to_owned()),
                });
                pos = start + len;
                la = lex(target, pos).ok_or(pos)?;
            }
            Action::Reduce(pidx, plen, ntidx) => {
                pstack.truncate(pstack.len() - plen);
                let from = *pstack.last().unwrap();
                match st.goto(from, ntidx) {
                    Some(to) => pstack.push(to),
                    None => panic!("No goto from state {} on nonterminal {}", from, ntidx),
                }
                let arm = ab.reduce(pidx);
                assert_eq!(arm.arity(), plen);
                let popped = res_stack.split_off(res_stack.len() - plen);
                let mut args = Vec::new();
                for (shape, v) in arm.children.iter().zip(popped) {
                    let conforms = match (shape, &v) {
                        (ChildShape::Discard(e), Value::Term { tidx, lexeme: None }) => e == tidx,
                        (ChildShape::Terminal(e), Value::Term { tidx, lexeme: Some(_) }) => {
                            e == tidx
                        }
                        (ChildShape::NonTerminal(e), Value::NonTerm { ntidx, .. }) => e == ntidx,
                        _ => false,
                    };
                    if !conforms {
                        panic!("Invalid symbol parse stack data.");
                    }
                    if shape.is_arg() {
                        args.push(v);
                    }
                }
                assert_eq!(args.len(), arm.args_len());
                res_stack.push(Value::NonTerm {
                    ntidx: arm.ntidx,
                    pidx,
                    args,
                });
            }
            Action::Accept => {
                let v = res_stack.pop().unwrap();
                assert!(res_stack.is_empty());
                return Ok(v);
            }
            Action::Error => return Err(start),
        }
    }
}
