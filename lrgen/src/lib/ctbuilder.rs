//! Build-time generation of parser source.

use std::{
    collections::HashMap,
    error::Error,
    fs::{self, read_to_string},
    path::{Path, PathBuf},
};

use log::{debug, info};
use lrmodel::{Automaton, GrammarModel, TIdx};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};

use crate::{
    CodegenError, CodegenErrorKind,
    astbuilder::AstBuilder,
    emitter::Emitter,
    index::SymbolIndex,
    names::{NameTable, camel_case, snake_case},
    recognizer::Recognizers,
    statetable::StateTable,
};

const DEFAULT_RUNTIME: &str = "lrgen_rt";

/// The visibility of the generated static tables.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Visibility {
    /// Module-level visibility only.
    Private,
    /// `pub`
    Public,
    /// `pub(super)`
    PublicSuper,
    /// `pub(self)`
    PublicSelf,
    /// `pub(crate)`
    PublicCrate,
}

impl ToTokens for Visibility {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(match self {
            Visibility::Private => quote!(),
            Visibility::Public => quote!(pub),
            Visibility::PublicSuper => quote!(pub(super)),
            Visibility::PublicSelf => quote!(pub(self)),
            Visibility::PublicCrate => quote!(pub(crate)),
        })
    }
}

/// A `CTParserGenerator` turns a grammar and its automaton into source files. It is intended to
/// be used from a build script or a bootstrapping tool, with the generated files then included
/// as sibling modules of a hand-written semantic actions module.
///
/// # Examples
///
/// ```text
/// let gp = CTParserGenerator::new()
///     .parser_name("calc")
///     .runtime_crate("::lrgen_rt")
///     .generate(&grammar, &automaton)?;
/// gp.write_to(Path::new("src"))?;
/// ```
pub struct CTParserGenerator {
    parser_name: String,
    runtime_crate: String,
    types_module: Option<String>,
    actions_module: Option<String>,
    error_on_conflicts: bool,
    visibility: Visibility,
}

impl CTParserGenerator {
    /// Create a new `CTParserGenerator` with default settings.
    pub fn new() -> Self {
        CTParserGenerator {
            parser_name: "Grammar".to_owned(),
            runtime_crate: DEFAULT_RUNTIME.to_owned(),
            types_module: None,
            actions_module: None,
            error_on_conflicts: true,
            visibility: Visibility::PublicCrate,
        }
    }

    /// Set the name of the parser. Generated types are prefixed with the CamelCase form of
    /// `name` (e.g. `calc` gives `CalcParser`, `CalcLexer`, and `CalcBuilder`) and the generated
    /// files are named after its snake_case form (e.g. `calc.rs` and `calc_types.rs`). Defaults
    /// to `Grammar`.
    pub fn parser_name(mut self, name: &str) -> Self {
        self.parser_name = name.to_owned();
        self
    }

    /// Set the path of the runtime crate the generated code uses. Defaults to `lrgen_rt`.
    pub fn runtime_crate(mut self, path: &str) -> Self {
        self.runtime_crate = path.to_owned();
        self
    }

    /// Set the path, relative to the generated parser module, of the generated types module.
    /// Defaults to `super::<name>_types`.
    pub fn types_module(mut self, path: &str) -> Self {
        self.types_module = Some(path.to_owned());
        self
    }

    /// Set the path, relative to the generated modules, of the semantic actions module.
    /// Defaults to `super::<name>_actions`.
    pub fn actions_module(mut self, path: &str) -> Self {
        self.actions_module = Some(path.to_owned());
        self
    }

    /// If set to true, [generate](#method.generate) will return an error if the automaton has
    /// more than one action for any state and terminal. If set to false, the first recorded
    /// action is used. Defaults to `true`.
    pub fn error_on_conflicts(mut self, b: bool) -> Self {
        self.error_on_conflicts = b;
        self
    }

    /// Set the visibility of the generated `PARSER_DEFINITION` and `LEXER_DEFINITION` statics.
    /// Defaults to `Visibility::PublicCrate`.
    pub fn visibility(mut self, vis: Visibility) -> Self {
        self.visibility = vis;
        self
    }

    /// Generate the parser for `grm` and its automaton `aut`. Nothing is written: see
    /// [GeneratedParser::write_to].
    pub fn generate(
        &self,
        grm: &GrammarModel,
        aut: &Automaton,
    ) -> Result<GeneratedParser, CodegenError> {
        let prefix = camel_case(&self.parser_name);
        if prefix.is_empty() {
            return Err(CodegenError::new(CodegenErrorKind::EmptyIdentifier(
                self.parser_name.clone(),
            )));
        }
        if syn::parse_str::<syn::Ident>(&prefix).is_err() {
            return Err(CodegenError::new(CodegenErrorKind::InvalidIdentifier(
                self.parser_name.clone(),
                prefix,
            )));
        }
        let stem = snake_case(&prefix);
        let runtime = parse_path(&self.runtime_crate)?;
        let types_mod = parse_path(
            self.types_module
                .as_deref()
                .unwrap_or(&format!("super::{}_types", stem)),
        )?;
        let actions_mod = parse_path(
            self.actions_module
                .as_deref()
                .unwrap_or(&format!("super::{}_actions", stem)),
        )?;

        let idx = SymbolIndex::new(grm)?;
        let names = NameTable::new(&idx)?;
        let rs = Recognizers::new(&idx)?;
        let st = StateTable::new(&idx, aut, self.error_on_conflicts)?;
        let ab = AstBuilder::new(&idx);
        debug!("Emitting {}", stem);

        let em = Emitter {
            idx: &idx,
            names: &names,
            rs: &rs,
            st: &st,
            ab: &ab,
            prefix: &prefix,
            runtime: &runtime,
            types_mod: &types_mod,
            actions_mod: &actions_mod,
            visibility: &self.visibility,
        };
        let parser = Artifact {
            file_name: format!("{}.rs", stem),
            contents: em.parser_file()?,
        };
        let types = Artifact {
            file_name: format!("{}_types.rs", stem),
            contents: em.types_file()?,
        };

        Ok(GeneratedParser {
            idx,
            st,
            parser,
            types,
        })
    }
}

fn parse_path(s: &str) -> Result<syn::Path, CodegenError> {
    syn::parse_str::<syn::Path>(s).map_err(|e| {
        CodegenError::new(CodegenErrorKind::Render(format!(
            "invalid module path '{}': {}",
            s, e
        )))
    })
}

/// One generated source file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    file_name: String,
    contents: String,
}

impl Artifact {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}

/// The result of a successful generation run.
pub struct GeneratedParser {
    idx: SymbolIndex,
    st: StateTable,
    parser: Artifact,
    types: Artifact,
}

impl GeneratedParser {
    pub fn symbol_index(&self) -> &SymbolIndex {
        &self.idx
    }

    pub fn state_table(&self) -> &StateTable {
        &self.st
    }

    /// The parser file: tables, parser, lexer, and builder.
    pub fn parser(&self) -> &Artifact {
        &self.parser
    }

    /// The types file: kind and value enums.
    pub fn types(&self) -> &Artifact {
        &self.types
    }

    pub fn artifacts(&self) -> [&Artifact; 2] {
        [&self.parser, &self.types]
    }

    /// Return a map from terminal names to the indices used in the generated code.
    pub fn token_map(&self) -> HashMap<String, TIdx> {
        self.idx.token_map()
    }

    /// Write the generated files into `outd`, creating it if necessary. Files whose contents are
    /// unchanged are not rewritten. Returns the paths of all generated files.
    pub fn write_to(&self, outd: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
        fs::create_dir_all(outd)?;
        let mut paths = Vec::with_capacity(2);
        for a in self.artifacts() {
            let outp = outd.join(&a.file_name);
            // If the file we're about to write out already exists with the same contents, then
            // we don't overwrite it (since that will force a recompile of the file, and relinking
            // of the binary etc).
            match read_to_string(&outp) {
                Ok(curs) if curs == a.contents => debug!("{} is unchanged", outp.display()),
                _ => {
                    fs::write(&outp, &a.contents)?;
                    info!("Wrote {}", outp.display());
                }
            }
            paths.push(outp);
        }
        Ok(paths)
    }
}
