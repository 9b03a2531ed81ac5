//! Deriving Rust identifiers from grammar symbol names.
//!
//! Terminal names which are punctuation are looked up in [PUNCTUATION]; all other names are
//! CamelCased. Function names are the snake_case form of the CamelCase kind names.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;
use lrmodel::{NTIdx, PIdx, TIdx};
use regex::Regex;

use crate::{CodegenError, CodegenErrorKind, index::SymbolIndex};

lazy_static! {
    static ref RE_IDENT: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z_0-9]*$").unwrap();
}

/// Identifiers which cannot be written even as raw identifiers.
const UNRAWABLE: [&str; 4] = ["Self", "self", "super", "crate"];

/// Identifiers for punctuation terminal names.
pub const PUNCTUATION: [(&str, &str); 20] = [
    (";", "SemiColon"),
    (":", "Colon"),
    ("{", "OBrace"),
    ("}", "CBrace"),
    ("|", "Bar"),
    (",", "Comma"),
    ("=", "Equals"),
    ("?=", "QEquals"),
    ("(", "OBracket"),
    (")", "CBracket"),
    ("*", "Asterisk"),
    ("*!", "AsteriskGready"),
    ("+", "Plus"),
    ("+!", "PlusGready"),
    ("?", "Question"),
    ("?!", "QuestionGready"),
    ("[", "OSquare"),
    ("]", "CSquare"),
    ("/*", "OComment"),
    ("*/", "CComment"),
];

/// Capitalise each `_`-delimited segment of `name` and concatenate them. Names which contain no
/// `_` and already start with an uppercase letter are returned unchanged.
pub fn camel_case(name: &str) -> String {
    let mut s = String::with_capacity(name.len());
    for seg in name.split('_').filter(|seg| !seg.is_empty()) {
        let mut cs = seg.chars();
        if let Some(c) = cs.next() {
            s.extend(c.to_uppercase());
            s.push_str(cs.as_str());
        }
    }
    s
}

/// Convert a CamelCase name to snake_case: an `_` is inserted before every uppercase letter which
/// follows a lowercase letter, and all letters are lowercased.
pub fn snake_case(name: &str) -> String {
    let mut s = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() && prev_lower {
            s.push('_');
        }
        s.extend(c.to_lowercase());
        prev_lower = c.is_lowercase();
    }
    s
}

/// The kind name for terminal `name`.
pub fn terminal_name(name: &str) -> String {
    match PUNCTUATION.iter().find(|(p, _)| *p == name) {
        Some((_, n)) => (*n).to_owned(),
        None => camel_case(name),
    }
}

/// The kind name for nonterminal `name`.
pub fn nonterminal_name(name: &str) -> String {
    camel_case(name)
}

/// The kind name for the `ordinal`th production of nonterminal `name`.
pub fn production_name(name: &str, ordinal: usize) -> String {
    format!("{}P{}", camel_case(name), ordinal)
}

/// The name of the semantic action called when reducing a production with kind `prod_kind`.
pub fn action_name(prod_kind: &str) -> String {
    snake_case(prod_kind)
}

/// The name of the generated recognizer function for the terminal with kind `term_kind`.
pub fn recognizer_name(term_kind: &str) -> String {
    format!("recognize_{}", snake_case(term_kind))
}

fn check_ident(source: &str, ident: String) -> Result<String, CodegenError> {
    if ident.is_empty() {
        Err(CodegenError::new(CodegenErrorKind::EmptyIdentifier(
            source.to_owned(),
        )))
    } else if !RE_IDENT.is_match(&ident) || UNRAWABLE.contains(&ident.as_str()) {
        Err(CodegenError::new(CodegenErrorKind::InvalidIdentifier(
            source.to_owned(),
            ident,
        )))
    } else {
        Ok(ident)
    }
}

/// Check that no two sources in `names` derive the same identifier.
fn check_unique(names: &[String], sources: &[String]) -> Result<(), CodegenError> {
    let mut seen = HashMap::with_capacity(names.len());
    for (n, src) in names.iter().zip(sources) {
        if let Some(prev) = seen.insert(n.as_str(), src.as_str()) {
            return Err(CodegenError::new(CodegenErrorKind::DuplicateIdentifier(
                n.clone(),
                prev.to_owned(),
                src.clone(),
            )));
        }
    }
    Ok(())
}

/// Every identifier derived for a grammar, indexed by the indices of a [SymbolIndex].
pub struct NameTable {
    term_kinds: Vec<String>,
    recognizer_fns: Vec<String>,
    nonterm_kinds: Vec<String>,
    prod_kinds: Vec<String>,
    action_fns: Vec<String>,
}

impl NameTable {
    /// Derive all the names for `idx`, failing if any name is empty, is not a valid identifier,
    /// or clashes with another name of the same class.
    pub fn new(idx: &SymbolIndex) -> Result<Self, CodegenError> {
        let term_srcs = idx
            .iter_tidxs()
            .map(|tidx| idx.term_name(tidx).to_owned())
            .collect::<Vec<_>>();
        let term_kinds = term_srcs
            .iter()
            .map(|n| check_ident(n, terminal_name(n)))
            .collect::<Result<Vec<_>, _>>()?;
        check_unique(&term_kinds, &term_srcs)?;
        let recognizer_fns = term_kinds.iter().map(|k| recognizer_name(k)).collect::<Vec<_>>();
        check_unique(&recognizer_fns, &term_srcs)?;

        let nonterm_srcs = idx
            .iter_ntidxs()
            .map(|ntidx| idx.nonterm_name(ntidx).to_owned())
            .collect::<Vec<_>>();
        let nonterm_kinds = nonterm_srcs
            .iter()
            .map(|n| check_ident(n, nonterminal_name(n)))
            .collect::<Result<Vec<_>, _>>()?;
        check_unique(&nonterm_kinds, &nonterm_srcs)?;

        let prod_srcs = idx
            .iter_pidxs()
            .map(|pidx| idx.qualified_name(pidx))
            .collect::<Vec<_>>();
        let prod_kinds = idx
            .iter_pidxs()
            .map(|pidx| {
                let nt = idx.nonterm_name(idx.prod_to_nonterm(pidx));
                check_ident(
                    &prod_srcs[usize::from(pidx)],
                    production_name(nt, idx.prod_ordinal(pidx)),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        check_unique(&prod_kinds, &prod_srcs)?;
        let action_fns = prod_kinds.iter().map(|k| action_name(k)).collect::<Vec<_>>();
        check_unique(&action_fns, &prod_srcs)?;

        debug!("Derived names for {} productions", prod_kinds.len());
        Ok(NameTable {
            term_kinds,
            recognizer_fns,
            nonterm_kinds,
            prod_kinds,
            action_fns,
        })
    }

    pub fn term_kind(&self, tidx: TIdx) -> &str {
        &self.term_kinds[usize::from(tidx)]
    }

    pub fn recognizer_fn(&self, tidx: TIdx) -> &str {
        &self.recognizer_fns[usize::from(tidx)]
    }

    pub fn nonterm_kind(&self, ntidx: NTIdx) -> &str {
        &self.nonterm_kinds[usize::from(ntidx)]
    }

    pub fn prod_kind(&self, pidx: PIdx) -> &str {
        &self.prod_kinds[usize::from(pidx)]
    }

    pub fn action_fn(&self, pidx: PIdx) -> &str {
        &self.action_fns[usize::from(pidx)]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::stmts_grammar;
    use lrmodel::{GrammarModel, Recognizer};

    #[test]
    fn test_punctuation() {
        assert_eq!(terminal_name(";"), "SemiColon");
        assert_eq!(terminal_name("{"), "OBrace");
        assert_eq!(terminal_name("*!"), "AsteriskGready");
        assert_eq!(terminal_name("/*"), "OComment");
        assert_eq!(terminal_name("num_lit"), "NumLit");
        for (p, n) in PUNCTUATION {
            assert_eq!(terminal_name(p), n);
            assert!(RE_IDENT.is_match(n));
        }
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("grammar_rule"), "GrammarRule");
        assert_eq!(camel_case("a__b_"), "AB");
        assert_eq!(camel_case("GrammarRule"), "GrammarRule");
        assert_eq!(camel_case(camel_case("term_list").as_str()), "TermList");
        assert_eq!(camel_case("___"), "");
        for n in ["x", "foo_bar", "Stmts", "a_b_c"] {
            let once = camel_case(n);
            assert_eq!(camel_case(&once), once);
        }
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("StmtsP0"), "stmts_p0");
        assert_eq!(snake_case("GrammarRuleP12"), "grammar_rule_p12");
        assert_eq!(snake_case("EOF"), "eof");
        assert_eq!(snake_case("SemiColon"), "semi_colon");
        assert_eq!(recognizer_name("SemiColon"), "recognize_semi_colon");
        assert_eq!(action_name(&production_name("term_list", 3)), "term_list_p3");
    }

    #[test]
    fn test_name_table() {
        let idx = SymbolIndex::new(&stmts_grammar()).unwrap();
        let nt = NameTable::new(&idx).unwrap();
        assert_eq!(nt.term_kind(TIdx(0)), "EOF");
        assert_eq!(nt.term_kind(TIdx(1)), "SemiColon");
        assert_eq!(nt.recognizer_fn(TIdx(1)), "recognize_semi_colon");
        assert_eq!(nt.nonterm_kind(NTIdx(1)), "Stmt");
        assert_eq!(nt.prod_kind(PIdx(1)), "StmtsP1");
        assert_eq!(nt.action_fn(PIdx(1)), "stmts_p1");
        assert_eq!(nt.action_fn(PIdx(2)), "stmt_p0");
    }

    #[test]
    fn test_bad_names() {
        let grm = GrammarModel::new().terminal("__", Recognizer::Empty);
        let idx = SymbolIndex::new(&grm).unwrap();
        match NameTable::new(&idx) {
            Err(CodegenError {
                kind: CodegenErrorKind::EmptyIdentifier(n),
            }) => assert_eq!(n, "__"),
            _ => panic!(),
        }

        let grm = GrammarModel::new().terminal("->", Recognizer::Literal("->".to_owned()));
        let idx = SymbolIndex::new(&grm).unwrap();
        match NameTable::new(&idx) {
            Err(CodegenError {
                kind: CodegenErrorKind::InvalidIdentifier(n, id),
            }) => {
                assert_eq!(n, "->");
                assert_eq!(id, "->");
            }
            _ => panic!(),
        }

        let grm = GrammarModel::new().nonterminal("self", vec![]);
        let idx = SymbolIndex::new(&grm).unwrap();
        assert!(matches!(
            NameTable::new(&idx),
            Err(CodegenError {
                kind: CodegenErrorKind::InvalidIdentifier(_, _)
            })
        ));

        let grm = GrammarModel::new()
            .terminal("num_lit", Recognizer::Pattern("[0-9]+".to_owned()))
            .terminal("NumLit", Recognizer::Pattern("[0-9]+".to_owned()));
        let idx = SymbolIndex::new(&grm).unwrap();
        match NameTable::new(&idx) {
            Err(CodegenError {
                kind: CodegenErrorKind::DuplicateIdentifier(id, n1, n2),
            }) => {
                assert_eq!(id, "NumLit");
                assert_eq!(n1, "num_lit");
                assert_eq!(n2, "NumLit");
            }
            _ => panic!(),
        }
    }
}
