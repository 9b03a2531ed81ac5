//! Rendering a generation run's tables and handler descriptions as Rust source.

use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::{format_ident, quote};

use crate::{
    CodegenError, CodegenErrorKind,
    astbuilder::{AstBuilder, ChildShape},
    ctbuilder::Visibility,
    index::SymbolIndex,
    names::NameTable,
    recognizer::{Matcher, Recognizers, anchored},
    statetable::{Action, StateTable},
};

const HEADER: &str = "// Generated by lrgen. Do not edit!\n\n";

/// Make an identifier, falling back to a raw identifier for keywords.
pub(crate) fn ident(s: &str) -> Ident {
    match syn::parse_str::<Ident>(s) {
        Ok(i) => i,
        Err(_) => Ident::new_raw(s, Span::call_site()),
    }
}

fn lit(n: usize) -> Literal {
    Literal::usize_unsuffixed(n)
}

fn render(ts: TokenStream) -> Result<String, CodegenError> {
    let f = syn::parse2::<syn::File>(ts)
        .map_err(|e| CodegenError::new(CodegenErrorKind::Render(e.to_string())))?;
    Ok(format!("{}{}", HEADER, prettyplease::unparse(&f)))
}

pub(crate) struct Emitter<'a> {
    pub(crate) idx: &'a SymbolIndex,
    pub(crate) names: &'a NameTable,
    pub(crate) rs: &'a Recognizers,
    pub(crate) st: &'a StateTable,
    pub(crate) ab: &'a AstBuilder,
    /// The CamelCase prefix of the generated type names.
    pub(crate) prefix: &'a str,
    pub(crate) runtime: &'a syn::Path,
    pub(crate) types_mod: &'a syn::Path,
    pub(crate) actions_mod: &'a syn::Path,
    pub(crate) visibility: &'a Visibility,
}

impl Emitter<'_> {
    fn type_ident(&self, suffix: &str) -> Ident {
        format_ident!("{}{}", self.prefix, suffix)
    }

    /// The parser artifact: tables, the parser, the lexer, and the builder.
    pub(crate) fn parser_file(&self) -> Result<String, CodegenError> {
        let rt = self.runtime;
        let types = self.types_mod;
        let has_patterns = self
            .idx
            .iter_tidxs()
            .any(|tidx| self.rs.matcher(tidx).has_payload());
        let regex_uses = if has_patterns {
            quote! {
                use regex::Regex;
                use std::sync::LazyLock;
            }
        } else {
            quote!()
        };
        let terminal_no = lit(self.idx.terms_len());
        let nonterminal_no = lit(self.idx.nonterms_len());
        let state_no = lit(self.st.states_len());
        let max_actions = lit(self.st.max_actions());

        let parser_defn = self.parser_definition();
        let lexer_defn = self.lexer_definition();
        let builder = self.builder();

        render(quote! {
            use std::marker::PhantomData;
            #regex_uses
            use #rt::builder::Builder;
            use #rt::grammar::{TerminalInfo, TerminalInfos, TerminalsState};
            use #rt::index::{NonTermIndex, ProdIndex, StateIndex, TermIndex};
            use #rt::lexer::{DefaultLexer, Lexer, LexerDefinition, RecognizerIterator, Token};
            use #rt::lr::{Action, LRParser, ParserDefinition};
            use #rt::parser::{Context, Parser};
            use #types::{NonTerminal, ProdKind, Symbol, TermKind, Terminal};

            pub const TERMINAL_NO: usize = #terminal_no;
            pub const NONTERMINAL_NO: usize = #nonterminal_no;
            pub const STATE_NO: usize = #state_no;
            pub const MAX_ACTIONS: usize = #max_actions;

            #parser_defn
            #lexer_defn
            #builder
        })
    }

    fn parser_definition(&self) -> TokenStream {
        let vis = self.visibility;
        let defn = self.type_ident("ParserDefinition");
        let parser = self.type_ident("Parser");
        let lexer = self.type_ident("Lexer");
        let builder = self.type_ident("Builder");

        let action_rows = self.st.iter_stidxs().map(|stidx| {
            let cells = self.idx.iter_tidxs().map(|tidx| match self.st.action(stidx, tidx) {
                Action::Shift(target, s_tidx) => {
                    let (target, s_tidx) = (lit(usize::from(target)), lit(usize::from(s_tidx)));
                    quote!(Action::Shift(StateIndex(#target), TermIndex(#s_tidx)))
                }
                Action::Reduce(pidx, len, ntidx) => {
                    let pp = self.idx.pp_prod(pidx);
                    let (pidx, len, ntidx) = (
                        lit(usize::from(pidx)),
                        lit(len),
                        lit(usize::from(ntidx)),
                    );
                    quote!(Action::Reduce(ProdIndex(#pidx), #len, NonTermIndex(#ntidx), #pp))
                }
                Action::Accept => quote!(Action::Accept),
                Action::Error => quote!(Action::Error),
            });
            quote!([#(#cells),*])
        });
        let goto_rows = self.st.iter_stidxs().map(|stidx| {
            let cells = self.idx.iter_ntidxs().map(|ntidx| match self.st.goto(stidx, ntidx) {
                Some(target) => {
                    let target = lit(usize::from(target));
                    quote!(Some(StateIndex(#target)))
                }
                None => quote!(None),
            });
            quote!([#(#cells),*])
        });

        quote! {
            pub struct #defn {
                actions: [[Action; TERMINAL_NO]; STATE_NO],
                gotos: [[Option<StateIndex>; NONTERMINAL_NO]; STATE_NO],
            }

            #vis static PARSER_DEFINITION: #defn = #defn {
                actions: [#(#action_rows),*],
                gotos: [#(#goto_rows),*],
            };

            impl ParserDefinition for #defn {
                fn action(&self, state_index: StateIndex, term_index: TermIndex) -> Action {
                    self.actions[state_index.0][term_index.0]
                }

                fn goto(&self, state_index: StateIndex, nonterm_index: NonTermIndex) -> StateIndex {
                    match self.gotos[state_index.0][nonterm_index.0] {
                        Some(s) => s,
                        None => panic!(
                            "No goto from state {} on nonterminal {}",
                            state_index.0,
                            nonterm_index.0
                        ),
                    }
                }
            }

            pub struct #parser<'i>(LRParser<&'i str, #defn>);

            impl<'i> Default for #parser<'i> {
                fn default() -> Self {
                    Self(LRParser::new(&PARSER_DEFINITION))
                }
            }

            impl<'i> #parser<'i> {
                pub fn parse(&mut self, input: &'i str) -> Symbol {
                    self.0.parse(#lexer::from(input), <#builder<'i> as Builder>::new())
                }
            }
        }
    }

    fn lexer_definition(&self) -> TokenStream {
        let vis = self.visibility;
        let defn = self.type_ident("LexerDefinition");
        let lexer = self.type_ident("Lexer");

        let infos = self.idx.iter_tidxs().map(|tidx| {
            let name = self.idx.term_name(tidx);
            let id = lit(usize::from(tidx));
            quote!(TerminalInfo { id: TermIndex(#id), name: #name, location: None })
        });
        let for_state = self.st.iter_stidxs().map(|stidx| {
            let cells = self.st.expected_terms(stidx).into_iter().map(|t| match t {
                Some(tidx) => {
                    let tidx = lit(usize::from(tidx));
                    quote!(Some(#tidx))
                }
                None => quote!(None),
            });
            quote!([#(#cells),*])
        });
        let rec_names = self
            .idx
            .iter_tidxs()
            .map(|tidx| ident(self.names.recognizer_fn(tidx)))
            .collect::<Vec<_>>();
        let rec_fns = self.idx.iter_tidxs().zip(&rec_names).map(|(tidx, name)| {
            let body = match self.rs.matcher(tidx) {
                Matcher::Literal(s) => {
                    let len = lit(s.len());
                    quote! {
                        if input.starts_with(#s) {
                            Some(&input[..#len])
                        } else {
                            None
                        }
                    }
                }
                Matcher::Pattern { source, .. } => {
                    let re = anchored(source);
                    quote! {
                        static REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(#re).unwrap());
                        REGEX.find(input).map(|m| m.as_str())
                    }
                }
                Matcher::Empty => quote! {
                    if input.is_empty() {
                        Some(input)
                    } else {
                        None
                    }
                },
            };
            quote! {
                fn #name(input: &str) -> Option<&str> {
                    #body
                }
            }
        });

        quote! {
            pub struct #defn {
                terminals: TerminalInfos<TERMINAL_NO>,
                terminals_for_state: TerminalsState<MAX_ACTIONS, STATE_NO>,
                recognizers: [fn(&str) -> Option<&str>; TERMINAL_NO],
            }

            #vis static LEXER_DEFINITION: #defn = #defn {
                terminals: [#(#infos),*],
                terminals_for_state: [#(#for_state),*],
                recognizers: [#(#rec_names),*],
            };

            #(#rec_fns)*

            impl LexerDefinition for #defn {
                type Recognizer = for<'i> fn(&'i str) -> Option<&'i str>;

                fn recognizers(
                    &self,
                    state_index: StateIndex,
                ) -> RecognizerIterator<Self::Recognizer> {
                    RecognizerIterator {
                        terminals: &LEXER_DEFINITION.terminals,
                        terminals_for_state:
                            &LEXER_DEFINITION.terminals_for_state[state_index.0][..],
                        recognizers: &LEXER_DEFINITION.recognizers,
                        index: 0,
                    }
                }
            }

            pub struct #lexer<'i>(DefaultLexer<'i, #defn>);

            impl<'i> Lexer for #lexer<'i> {
                type Input = &'i str;

                fn next_token(
                    &self,
                    context: &mut impl Context<Self::Input>,
                ) -> Option<Token<Self::Input>> {
                    self.0.next_token(context)
                }
            }

            impl<'i, T> From<&'i T> for #lexer<'i>
            where
                T: AsRef<str> + ?Sized,
            {
                fn from(input: &'i T) -> Self {
                    Self(DefaultLexer::new(input.as_ref(), &LEXER_DEFINITION))
                }
            }
        }
    }

    fn builder(&self) -> TokenStream {
        let builder = self.type_ident("Builder");
        let lexer = self.type_ident("Lexer");
        let actions = self.actions_mod;

        let shift_arms = self.ab.shifts().iter().map(|arm| {
            let kind = ident(self.names.term_kind(arm.tidx));
            if arm.payload {
                quote!(Ok(TermKind::#kind) => Terminal::#kind(token.value.to_string()))
            } else {
                quote!(Ok(TermKind::#kind) => Terminal::#kind)
            }
        });

        let reduce_arms = self.ab.reduces().iter().map(|arm| {
            let prod_kind = ident(self.names.prod_kind(arm.pidx));
            let nt_kind = ident(self.names.nonterm_kind(arm.ntidx));
            let action = ident(self.names.action_fn(arm.pidx));
            if arm.arity() == 0 {
                return quote! {
                    Ok(ProdKind::#prod_kind) => NonTerminal::#nt_kind(#actions::#action())
                };
            }
            let arity = lit(arm.arity());
            let mut pats = Vec::with_capacity(arm.arity());
            let mut args = Vec::with_capacity(arm.args_len());
            for shape in &arm.children {
                match *shape {
                    ChildShape::Discard(tidx) => {
                        let kind = ident(self.names.term_kind(tidx));
                        pats.push(quote!(Some(Symbol::Terminal(Terminal::#kind))));
                    }
                    ChildShape::Terminal(tidx) => {
                        let kind = ident(self.names.term_kind(tidx));
                        let p = format_ident!("p{}", args.len());
                        pats.push(quote!(Some(Symbol::Terminal(Terminal::#kind(#p)))));
                        args.push(p);
                    }
                    ChildShape::NonTerminal(ntidx) => {
                        let kind = ident(self.names.nonterm_kind(ntidx));
                        let p = format_ident!("p{}", args.len());
                        pats.push(quote!(Some(Symbol::NonTerminal(NonTerminal::#kind(#p)))));
                        args.push(p);
                    }
                }
            }
            let nexts = (0..arm.arity()).map(|_| quote!(i.next()));
            quote! {
                Ok(ProdKind::#prod_kind) => {
                    let mut i = match self.res_stack.len().checked_sub(#arity) {
                        Some(n) => self.res_stack.split_off(n).into_iter(),
                        None => panic!("Invalid symbol parse stack data."),
                    };
                    match (#(#nexts,)*) {
                        (#(#pats,)*) => NonTerminal::#nt_kind(#actions::#action(#(#args),*)),
                        _ => panic!("Invalid symbol parse stack data."),
                    }
                }
            }
        });

        quote! {
            pub struct #builder<'i> {
                res_stack: Vec<Symbol>,
                phantom: PhantomData<&'i str>,
            }

            impl<'i> Builder for #builder<'i> {
                type Output = Symbol;
                type Lexer = #lexer<'i>;

                fn new() -> Self {
                    Self {
                        res_stack: vec![],
                        phantom: PhantomData,
                    }
                }

                fn shift_action(
                    &mut self,
                    term_index: TermIndex,
                    token: Token<<Self::Lexer as Lexer>::Input>,
                ) {
                    let term = match TermKind::try_from(term_index.0) {
                        #(#shift_arms,)*
                        Err(i) => panic!("Unknown terminal index {}", i),
                    };
                    self.res_stack.push(Symbol::Terminal(term));
                }

                fn reduce_action(
                    &mut self,
                    prod_index: ProdIndex,
                    _prod_len: usize,
                    _prod_str: &'static str,
                ) {
                    let prod = match ProdKind::try_from(prod_index.0) {
                        #(#reduce_arms,)*
                        Err(i) => panic!("Unknown production index {}", i),
                    };
                    self.res_stack.push(Symbol::NonTerminal(prod));
                }

                fn get_result(&mut self) -> Self::Output {
                    match (self.res_stack.pop(), self.res_stack.is_empty()) {
                        (Some(r), true) => r,
                        (_, _) => panic!("Parse stack must hold exactly one result."),
                    }
                }
            }
        }
    }

    /// The types artifact: kind enums with their discriminants, and the value enums.
    pub(crate) fn types_file(&self) -> Result<String, CodegenError> {
        let actions = self.actions_mod;

        let term_kinds = self
            .idx
            .iter_tidxs()
            .map(|tidx| (ident(self.names.term_kind(tidx)), usize::from(tidx)))
            .collect::<Vec<_>>();
        let nonterm_kinds = self
            .idx
            .iter_ntidxs()
            .map(|ntidx| (ident(self.names.nonterm_kind(ntidx)), usize::from(ntidx)))
            .collect::<Vec<_>>();
        let prod_kinds = self
            .idx
            .iter_pidxs()
            .map(|pidx| (ident(self.names.prod_kind(pidx)), usize::from(pidx)))
            .collect::<Vec<_>>();

        let term_kind = kind_enum(&format_ident!("TermKind"), &term_kinds);
        let nonterm_kind = kind_enum(&format_ident!("NonTermKind"), &nonterm_kinds);
        let prod_kind = kind_enum(&format_ident!("ProdKind"), &prod_kinds);

        let term_variants = self.ab.shifts().iter().map(|arm| {
            let kind = ident(self.names.term_kind(arm.tidx));
            if arm.payload {
                quote!(#kind(String))
            } else {
                quote!(#kind)
            }
        });
        let nonterm_variants = nonterm_kinds
            .iter()
            .map(|(kind, _)| quote!(#kind(#actions::#kind)));

        render(quote! {
            #term_kind
            #nonterm_kind
            #prod_kind

            #[derive(Debug)]
            pub enum Symbol {
                Terminal(Terminal),
                NonTerminal(NonTerminal),
            }

            #[derive(Debug)]
            pub enum Terminal {
                #(#term_variants),*
            }

            #[derive(Debug)]
            pub enum NonTerminal {
                #(#nonterm_variants),*
            }
        })
    }
}

/// A fieldless enum whose discriminants are `kinds`' indices, and a `TryFrom<usize>` impl which
/// maps a discriminant back to its variant.
fn kind_enum(name: &Ident, kinds: &[(Ident, usize)]) -> TokenStream {
    let variants = kinds.iter().map(|(k, i)| {
        let i = lit(*i);
        quote!(#k = #i)
    });
    let arms = kinds.iter().map(|(k, i)| {
        let i = lit(*i);
        quote!(#i => Ok(#name::#k))
    });
    quote! {
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum #name {
            #(#variants),*
        }

        impl TryFrom<usize> for #name {
            type Error = usize;

            fn try_from(value: usize) -> Result<Self, usize> {
                match value {
                    #(#arms,)*
                    _ => Err(value),
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ident() {
        assert_eq!(ident("Num").to_string(), "Num");
        assert_eq!(ident("type").to_string(), "r#type");
        assert_eq!(ident("recognize_num").to_string(), "recognize_num");
    }

    #[test]
    fn test_kind_enum() {
        let ks = vec![(ident("EOF"), 0), (ident("Num"), 1)];
        let s = render(kind_enum(&format_ident!("TermKind"), &ks)).unwrap();
        assert!(s.starts_with(HEADER));
        assert!(s.contains("EOF = 0,"));
        assert!(s.contains("Num = 1,"));
        assert!(s.contains("1 => Ok(TermKind::Num),"));
        assert!(s.contains("_ => Err(value),"));
        syn::parse_file(&s).unwrap();
    }

    #[test]
    fn test_render_error() {
        match render(quote!(fn {})) {
            Err(CodegenError {
                kind: CodegenErrorKind::Render(_),
            }) => (),
            _ => panic!(),
        }
    }
}
