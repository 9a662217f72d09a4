//! Parser Registry: language identification and grammar-backed parsing.
//!
//! Grammars are resolved by name through [`ParserRegistry`], which memoizes
//! each one on first use. File languages come from [`detect_language`].

pub mod registry;

use std::path::Path;

pub use registry::ParserRegistry;

/// A language the registry knows how to parse.
///
/// `Jsx` and `Tsx` are distinct from their base languages because they are
/// detected from distinct extensions; see [`Language::accepts`] for how rules
/// declared for the base language still apply to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
    Python,
    Go,
    Rust,
    C,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Self::JavaScript,
        Self::Jsx,
        Self::TypeScript,
        Self::Tsx,
        Self::Python,
        Self::Go,
        Self::Rust,
        Self::C,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Python => "python",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::C => "c",
        }
    }

    /// Exact, case-sensitive lookup by the name used in rule-set documents.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.name() == name)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "py" | "pyi" => Some(Self::Python),
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            "c" | "h" => Some(Self::C),
            _ => None,
        }
    }

    /// Whether a rule declared for `self` may run on a file detected as `file`.
    ///
    /// Exact match, plus the two superset grammars: `javascript` rules run on
    /// `jsx` files and `typescript` rules run on `tsx` files.
    pub fn accepts(self, file: Language) -> bool {
        self == file
            || matches!(
                (self, file),
                (Self::JavaScript, Self::Jsx) | (Self::TypeScript, Self::Tsx)
            )
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a file path to its language by extension. `None` means "unknown":
/// callers skip the file for AST rules rather than failing.
pub fn detect_language(path: &Path) -> Option<Language> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Language::from_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        let cases = [
            ("a.js", Some(Language::JavaScript)),
            ("a.mjs", Some(Language::JavaScript)),
            ("a.cjs", Some(Language::JavaScript)),
            ("a.jsx", Some(Language::Jsx)),
            ("a.ts", Some(Language::TypeScript)),
            ("a.mts", Some(Language::TypeScript)),
            ("a.cts", Some(Language::TypeScript)),
            ("a.tsx", Some(Language::Tsx)),
            ("a.py", Some(Language::Python)),
            ("a.pyi", Some(Language::Python)),
            ("main.go", Some(Language::Go)),
            ("lib.rs", Some(Language::Rust)),
            ("x.c", Some(Language::C)),
            ("x.h", Some(Language::C)),
            ("README.md", None),
            ("Makefile", None),
        ];
        for (path, expected) in cases {
            assert_eq!(detect_language(Path::new(path)), expected, "{path}");
        }
    }

    #[test]
    fn names_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_name(lang.name()), Some(lang));
        }
        assert_eq!(Language::from_name("cobol"), None);
        assert_eq!(Language::from_name("JavaScript"), None);
    }

    #[test]
    fn superset_compatibility() {
        assert!(Language::JavaScript.accepts(Language::JavaScript));
        assert!(Language::JavaScript.accepts(Language::Jsx));
        assert!(Language::TypeScript.accepts(Language::Tsx));
        assert!(!Language::TypeScript.accepts(Language::JavaScript));
        assert!(!Language::JavaScript.accepts(Language::TypeScript));
        assert!(!Language::JavaScript.accepts(Language::Tsx));
        assert!(!Language::Jsx.accepts(Language::JavaScript));
        assert!(!Language::Python.accepts(Language::Go));
    }
}
