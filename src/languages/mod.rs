//! Language pattern definitions and the catalog they are loaded from
//!
//! A [`LanguagePatternDefinition`] is read-only reference data describing the
//! lexical fingerprint of one language. The pattern-scoring detector consumes
//! an already-built list of them; [`LanguageCatalog`] is the loader used by
//! callers that keep definitions in YAML or JSON.

mod catalog;

pub use catalog::{CatalogError, LanguageCatalog};

use serde::{Deserialize, Serialize};

/// Lexical fingerprint of one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePatternDefinition {
    /// Canonical language identifier (e.g. "rust", "python")
    pub name: String,
    pub keywords: Vec<String>,
    /// Regular expressions; only the first few are evaluated
    pub patterns: Vec<String>,
    /// Import or declaration keywords (e.g. "import", "use", "require")
    pub imports: Vec<String>,
    /// Builtin identifiers (e.g. "println", "len", "console")
    pub builtins: Vec<String>,
    pub comments: CommentStyle,
}

impl LanguagePatternDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_builtins<I, S>(mut self, builtins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtins = builtins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_comments(mut self, comments: CommentStyle) -> Self {
        self.comments = comments;
        self
    }
}

/// Comment syntax of a language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentStyle {
    /// Line comment tokens (e.g. "//", "#")
    pub line: Vec<String>,
    pub block: Vec<BlockComment>,
}

impl CommentStyle {
    pub fn line<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line: tokens.into_iter().map(Into::into).collect(),
            block: Vec::new(),
        }
    }

    pub fn with_block(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.block.push(BlockComment {
            start: start.into(),
            end: end.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty() && self.block.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockComment {
    pub start: String,
    pub end: String,
}
