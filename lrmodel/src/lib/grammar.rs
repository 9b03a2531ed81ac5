use std::{error::Error, fmt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a terminal matches input.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Recognizer {
    /// Matches exactly this string at the start of the remaining input.
    Literal(String),
    /// Matches this regular expression, anchored at the start of the remaining input.
    Pattern(String),
    /// Matches only when no input remains.
    Empty,
}

impl Recognizer {
    /// Build a recognizer from the loosely typed `(kind, value)` pair used by analysis engines
    /// which describe recognizers as strings. `kind` is one of `literal`/`string`,
    /// `pattern`/`regex`, or `empty`/`eof`.
    pub fn from_kind(kind: &str, value: Option<&str>) -> Result<Self, ModelError> {
        match kind {
            "literal" | "string" => match value {
                Some(v) => Ok(Recognizer::Literal(v.to_owned())),
                None => Err(ModelError {
                    kind: ModelErrorKind::MissingRecognizerValue(kind.to_owned()),
                }),
            },
            "pattern" | "regex" => match value {
                Some(v) => Ok(Recognizer::Pattern(v.to_owned())),
                None => Err(ModelError {
                    kind: ModelErrorKind::MissingRecognizerValue(kind.to_owned()),
                }),
            },
            "empty" | "eof" => Ok(Recognizer::Empty),
            _ => Err(ModelError {
                kind: ModelErrorKind::UnknownRecognizerKind(kind.to_owned()),
            }),
        }
    }

    /// Does this recognizer capture the text it matches?
    pub fn has_payload(&self) -> bool {
        matches!(self, Recognizer::Pattern(_))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerminalDef {
    pub name: String,
    pub recognizer: Recognizer,
}

/// A by-name reference to a symbol from a production's right-hand side.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SymbolRef {
    Terminal(String),
    NonTerminal(String),
}

impl SymbolRef {
    pub fn name(&self) -> &str {
        match self {
            SymbolRef::Terminal(n) | SymbolRef::NonTerminal(n) => n,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProductionDef {
    pub rhs: Vec<SymbolRef>,
}

impl ProductionDef {
    pub fn new(rhs: Vec<SymbolRef>) -> Self {
        ProductionDef { rhs }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NonTerminalDef {
    pub name: String,
    pub productions: Vec<ProductionDef>,
}

/// A grammar as enumerated by the analysis engine. Terminals and nonterminals are kept in the
/// engine's order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrammarModel {
    pub terminals: Vec<TerminalDef>,
    pub nonterminals: Vec<NonTerminalDef>,
    /// The synthetic start nonterminal added by augmentation (if any). It takes part in the
    /// automaton but has no generated counterpart.
    pub augmented_start: Option<String>,
}

impl GrammarModel {
    pub fn new() -> Self {
        GrammarModel::default()
    }

    /// Append a terminal.
    pub fn terminal(mut self, name: &str, recognizer: Recognizer) -> Self {
        self.terminals.push(TerminalDef {
            name: name.to_owned(),
            recognizer,
        });
        self
    }

    /// Append a nonterminal with productions `prods`.
    pub fn nonterminal(mut self, name: &str, prods: Vec<ProductionDef>) -> Self {
        self.nonterminals.push(NonTerminalDef {
            name: name.to_owned(),
            productions: prods,
        });
        self
    }

    /// Mark the nonterminal `name` as the augmenting start symbol.
    pub fn augmented_start(mut self, name: &str) -> Self {
        self.augmented_start = Some(name.to_owned());
        self
    }

    /// Is `name` the augmenting start symbol?
    pub fn is_augmented_start(&self, name: &str) -> bool {
        self.augmented_start.as_deref() == Some(name)
    }
}

/// The various different possible model errors.
#[derive(Debug, PartialEq, Eq)]
pub enum ModelErrorKind {
    UnknownRecognizerKind(String),
    MissingRecognizerValue(String),
}

/// Any error from building a model returns an instance of this struct.
#[derive(Debug, PartialEq, Eq)]
pub struct ModelError {
    pub kind: ModelErrorKind,
}

impl Error for ModelError {}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelErrorKind::UnknownRecognizerKind(k) => {
                write!(f, "Unknown recognizer kind '{}'", k)
            }
            ModelErrorKind::MissingRecognizerValue(k) => {
                write!(f, "Recognizer of kind '{}' needs a value", k)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_recognizer_from_kind() {
        assert_eq!(
            Recognizer::from_kind("string", Some(";")).unwrap(),
            Recognizer::Literal(";".to_owned())
        );
        assert_eq!(
            Recognizer::from_kind("regex", Some("[0-9]+")).unwrap(),
            Recognizer::Pattern("[0-9]+".to_owned())
        );
        assert_eq!(Recognizer::from_kind("eof", None).unwrap(), Recognizer::Empty);
        match Recognizer::from_kind("fuzzy", Some("x")) {
            Err(ModelError {
                kind: ModelErrorKind::UnknownRecognizerKind(k),
            }) => assert_eq!(k, "fuzzy"),
            _ => panic!(),
        }
        let e = Recognizer::from_kind("literal", None).unwrap_err();
        assert_eq!(e.to_string(), "Recognizer of kind 'literal' needs a value");
    }

    #[test]
    fn test_builder() {
        let grm = GrammarModel::new()
            .terminal("EOF", Recognizer::Empty)
            .nonterminal(
                "S",
                vec![ProductionDef::new(vec![SymbolRef::Terminal("EOF".to_owned())])],
            )
            .augmented_start("S'");
        assert_eq!(grm.terminals.len(), 1);
        assert_eq!(grm.nonterminals[0].productions[0].rhs[0].name(), "EOF");
        assert!(grm.is_augmented_start("S'"));
        assert!(!grm.is_augmented_start("S"));
        assert!(!Recognizer::Literal("a".to_owned()).has_payload());
        assert!(Recognizer::Pattern("a".to_owned()).has_payload());
    }
}
