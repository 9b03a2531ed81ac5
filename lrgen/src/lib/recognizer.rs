//! Compiling terminal recognizers into matchers.

use log::debug;
use lrmodel::{Recognizer, TIdx};
use regex::Regex;

use crate::{CodegenError, CodegenErrorKind, index::SymbolIndex};

/// Anchor `pattern` so that it can only match at the start of the input.
pub fn anchored(pattern: &str) -> String {
    format!(r"\A(?:{})", pattern)
}

/// An executable recognizer. Every variant matches a prefix of its input.
#[derive(Clone, Debug)]
pub enum Matcher {
    Literal(String),
    Pattern { source: String, re: Regex },
    Empty,
}

impl Matcher {
    /// Compile the recognizer of the terminal `name`.
    pub fn new(name: &str, recognizer: &Recognizer) -> Result<Self, CodegenError> {
        match recognizer {
            Recognizer::Literal(s) if s.is_empty() => Err(CodegenError::new(
                CodegenErrorKind::EmptyLiteral(name.to_owned()),
            )),
            Recognizer::Literal(s) => Ok(Matcher::Literal(s.clone())),
            Recognizer::Pattern(p) => match Regex::new(&anchored(p)) {
                Ok(re) => Ok(Matcher::Pattern {
                    source: p.clone(),
                    re,
                }),
                Err(e) => Err(CodegenError::new(CodegenErrorKind::InvalidPattern(
                    name.to_owned(),
                    e.to_string(),
                ))),
            },
            Recognizer::Empty => Ok(Matcher::Empty),
        }
    }

    /// If this matcher matches a prefix of `input`, return that prefix.
    pub fn recognize<'i>(&self, input: &'i str) -> Option<&'i str> {
        match self {
            Matcher::Literal(s) => {
                if input.starts_with(s.as_str()) {
                    Some(&input[..s.len()])
                } else {
                    None
                }
            }
            Matcher::Pattern { re, .. } => re.find(input).map(|m| m.as_str()),
            Matcher::Empty => {
                if input.is_empty() {
                    Some(input)
                } else {
                    None
                }
            }
        }
    }

    /// Does a successful match carry the matched text as a payload?
    pub fn has_payload(&self) -> bool {
        matches!(self, Matcher::Pattern { .. })
    }
}

/// The matchers for every terminal of a grammar, indexed by `TIdx`.
pub struct Recognizers {
    matchers: Vec<Matcher>,
}

impl Recognizers {
    pub fn new(idx: &SymbolIndex) -> Result<Self, CodegenError> {
        let matchers = idx
            .iter_tidxs()
            .map(|tidx| Matcher::new(idx.term_name(tidx), idx.recognizer(tidx)))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Compiled {} recognizers", matchers.len());
        Ok(Recognizers { matchers })
    }

    pub fn matcher(&self, tidx: TIdx) -> &Matcher {
        &self.matchers[usize::from(tidx)]
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::stmts_grammar;

    fn m(r: Recognizer) -> Matcher {
        Matcher::new("t", &r).unwrap()
    }

    #[test]
    fn test_literal() {
        let l = m(Recognizer::Literal("{".to_owned()));
        assert_eq!(l.recognize("{...}"), Some("{"));
        assert_eq!(l.recognize("x{...}"), None);
        assert_eq!(l.recognize(""), None);
        assert!(!l.has_payload());
    }

    #[test]
    fn test_pattern() {
        let p = m(Recognizer::Pattern("[0-9]+".to_owned()));
        assert_eq!(p.recognize("123;"), Some("123"));
        assert_eq!(p.recognize("a123"), None);
        assert!(p.has_payload());
        // Alternations stay anchored as a whole.
        let p = m(Recognizer::Pattern("a|b".to_owned()));
        assert_eq!(p.recognize("xb"), None);
        assert_eq!(p.recognize("bx"), Some("b"));
        // A pattern which allows the empty string matches an empty prefix.
        let p = m(Recognizer::Pattern("[0-9]*".to_owned()));
        assert_eq!(p.recognize("abc"), Some(""));
    }

    #[test]
    fn test_empty() {
        let e = m(Recognizer::Empty);
        assert_eq!(e.recognize(""), Some(""));
        assert_eq!(e.recognize(" "), None);
    }

    #[test]
    fn test_errors() {
        match Matcher::new("Num", &Recognizer::Pattern("[0-9".to_owned())) {
            Err(CodegenError {
                kind: CodegenErrorKind::InvalidPattern(n, _),
            }) => assert_eq!(n, "Num"),
            _ => panic!(),
        }
        assert!(matches!(
            Matcher::new("Nothing", &Recognizer::Literal(String::new())),
            Err(CodegenError {
                kind: CodegenErrorKind::EmptyLiteral(_)
            })
        ));
    }

    #[test]
    fn test_recognizers() {
        let idx = SymbolIndex::new(&stmts_grammar()).unwrap();
        let rs = Recognizers::new(&idx).unwrap();
        assert_eq!(rs.len(), 3);
        assert_eq!(rs.matcher(TIdx(0)).recognize(""), Some(""));
        assert_eq!(rs.matcher(TIdx(1)).recognize(";1"), Some(";"));
        assert_eq!(rs.matcher(TIdx(2)).recognize("42;"), Some("42"));
    }
}
