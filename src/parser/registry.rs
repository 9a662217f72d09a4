use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use tree_sitter::{Parser, Tree};

use super::Language;
use crate::error::{LintError, Result};

/// Thunk that produces a grammar. Only called the first time a language is
/// requested from a registry.
pub type GrammarLoader = fn() -> tree_sitter::Language;

struct GrammarSlot {
    load: GrammarLoader,
    cached: OnceCell<tree_sitter::Language>,
}

/// Lazily-populated, memoizing grammar cache.
///
/// Construct one per run and pass it by reference to everything that parses.
/// Each slot is written at most once, so a shared `&ParserRegistry` is safe
/// to use from several threads.
pub struct ParserRegistry {
    slots: BTreeMap<Language, GrammarSlot>,
}

impl ParserRegistry {
    /// Registry with every grammar compiled into this build.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (language, load) in builtin_grammars() {
            registry.register(language, load);
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Register (or replace) the loader for a language.
    pub fn register(&mut self, language: Language, load: GrammarLoader) {
        self.slots.insert(
            language,
            GrammarSlot {
                load,
                cached: OnceCell::new(),
            },
        );
    }

    pub fn supported(&self) -> Vec<Language> {
        self.slots.keys().copied().collect()
    }

    pub fn is_loaded(&self, language: Language) -> bool {
        self.slots
            .get(&language)
            .is_some_and(|slot| slot.cached.get().is_some())
    }

    /// Resolve a grammar by the name used in rule-set documents.
    pub fn get_language(&self, name: &str) -> Result<tree_sitter::Language> {
        match Language::from_name(name) {
            Some(language) => self.grammar(language),
            None => Err(self.unsupported(name)),
        }
    }

    pub fn grammar(&self, language: Language) -> Result<tree_sitter::Language> {
        let slot = self
            .slots
            .get(&language)
            .ok_or_else(|| self.unsupported(language.name()))?;
        Ok(slot
            .cached
            .get_or_init(|| {
                tracing::debug!(%language, "loading grammar");
                (slot.load)()
            })
            .clone())
    }

    /// Parse `source` with a fresh parser. Trees are never cached.
    pub fn parse(&self, source: &str, language: Language) -> Result<Tree> {
        let grammar = self.grammar(language)?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| LintError::Parse {
                file: format!("<{language} source>"),
                message: format!("Failed to load {language} grammar: {e}"),
            })?;
        parser.parse(source, None).ok_or_else(|| LintError::Parse {
            file: format!("<{language} source>"),
            message: format!("tree-sitter failed to parse {language}"),
        })
    }

    fn unsupported(&self, requested: &str) -> LintError {
        let supported: Vec<&str> = self.slots.keys().map(|l| l.name()).collect();
        LintError::UnsupportedLanguage {
            requested: requested.to_string(),
            supported: supported.join(", "),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(unused_mut)]
fn builtin_grammars() -> Vec<(Language, GrammarLoader)> {
    let mut grammars: Vec<(Language, GrammarLoader)> = Vec::new();

    // tree-sitter-javascript parses JSX natively
    #[cfg(feature = "javascript")]
    {
        grammars.push((Language::JavaScript, || {
            tree_sitter_javascript::LANGUAGE.into()
        }));
        grammars.push((Language::Jsx, || tree_sitter_javascript::LANGUAGE.into()));
    }
    #[cfg(feature = "typescript")]
    {
        grammars.push((Language::TypeScript, || {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        }));
        grammars.push((Language::Tsx, || {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        }));
    }
    #[cfg(feature = "python")]
    grammars.push((Language::Python, || tree_sitter_python::LANGUAGE.into()));
    #[cfg(feature = "go")]
    grammars.push((Language::Go, || tree_sitter_go::LANGUAGE.into()));
    #[cfg(feature = "rust")]
    grammars.push((Language::Rust, || tree_sitter_rust::LANGUAGE.into()));
    #[cfg(feature = "c")]
    grammars.push((Language::C, || tree_sitter_c::LANGUAGE.into()));

    grammars
}
