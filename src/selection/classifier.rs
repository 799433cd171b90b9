//! Classification of user-supplied include/exclude tokens.
//!
//! A token either names a package (it sits under the module path) or a
//! directory relative to the project root. When the module path is unknown
//! every token is treated as a directory.

use serde::Serialize;
use tracing::debug;

/// What a user token refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// A package identifier under the module path
    Package,
    /// A directory relative to the project root
    Directory,
}

/// Classify a token against the module name.
pub fn classify(token: &str, module: &str) -> TokenKind {
    if module.is_empty() {
        return TokenKind::Directory;
    }
    match token.strip_prefix(module) {
        Some("") => TokenKind::Package,
        Some(rest) if rest.starts_with('/') => TokenKind::Package,
        _ => TokenKind::Directory,
    }
}

/// Tokens split by kind, each list in the order the user gave them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedTokens {
    /// Tokens naming packages
    pub packages: Vec<String>,
    /// Tokens naming directories
    pub directories: Vec<String>,
}

impl ClassifiedTokens {
    /// Classify every token, dropping exact duplicates.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S], module: &str) -> Self {
        let mut classified = Self::default();
        for token in tokens {
            let token = token.as_ref();
            let bucket = match classify(token, module) {
                TokenKind::Package => &mut classified.packages,
                TokenKind::Directory => &mut classified.directories,
            };
            if !bucket.iter().any(|existing| existing == token) {
                bucket.push(token.to_string());
            }
        }
        classified
    }

    /// True when neither packages nor directories were given.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.directories.is_empty()
    }

    /// Number of tokens across both kinds.
    pub fn len(&self) -> usize {
        self.packages.len() + self.directories.len()
    }

    fn contains(&self, token: &str) -> bool {
        self.packages.iter().any(|t| t == token) || self.directories.iter().any(|t| t == token)
    }

    fn remove_all_in(&mut self, other: &Self) {
        self.packages.retain(|t| !other.contains(t));
        self.directories.retain(|t| !other.contains(t));
    }
}

/// Include and exclude tokens for one run.
///
/// The two sides are disjoint: a token given on both sides is kept only as an
/// exclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    /// Packages and directories whose sources are linked
    pub include: ClassifiedTokens,
    /// Packages and directories left out of the snapshot
    pub exclude: ClassifiedTokens,
}

impl FilterSpec {
    /// Classify raw include and exclude tokens against the module name.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S], module: &str) -> Self {
        let exclude = ClassifiedTokens::from_tokens(exclude, module);
        let mut include = ClassifiedTokens::from_tokens(include, module);

        let before = include.len();
        include.remove_all_in(&exclude);
        if include.len() != before {
            debug!(
                dropped = before - include.len(),
                "Tokens listed as both include and exclude are treated as excluded"
            );
        }

        Self { include, exclude }
    }

    /// True when the user supplied neither includes nor excludes.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}
