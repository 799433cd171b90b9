//! Flat file names for the sync directory.
//!
//! Every artifact lands in a single directory, so its source path is folded
//! into the file name: a category prefix, then the path segments joined with
//! `_`. A literal `_` inside a segment is written `~_` and a literal `~` is
//! written `~~`, which keeps the mapping injective and lets [`decode`] recover
//! the original path.

use std::fmt;
use std::path::{Component, Path};

use serde::Serialize;

const SEPARATOR: char = '_';
const ESCAPE: char = '~';
const DOC_SUFFIX: &str = ".txt";

/// Kind of artifact stored in the sync directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputCategory {
    /// Extracted package documentation
    Doc,
    /// Linked README file
    Readme,
    /// Linked source file
    Source,
}

impl OutputCategory {
    /// File name prefix for this category.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Doc => "doc_",
            Self::Readme => "readme_",
            Self::Source => "src_",
        }
    }

    const ALL: [Self; 3] = [Self::Doc, Self::Readme, Self::Source];
}

impl fmt::Display for OutputCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Doc => "doc",
            Self::Readme => "readme",
            Self::Source => "source",
        };
        f.write_str(label)
    }
}

/// Join path segments into a flat, escaped name body.
pub fn encode_segments<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for (idx, segment) in segments.into_iter().enumerate() {
        if idx > 0 {
            out.push(SEPARATOR);
        }
        for ch in segment.chars() {
            if ch == SEPARATOR || ch == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(ch);
        }
    }
    out
}

/// Doc file name for a package: `doc_<package id>.txt`.
pub fn doc_file_name(package: &str) -> String {
    format!(
        "{}{}{}",
        OutputCategory::Doc.prefix(),
        encode_segments(package.split('/')),
        DOC_SUFFIX
    )
}

/// Link name for a README, from its project-relative path.
pub fn readme_file_name(relative: &Path) -> String {
    path_file_name(OutputCategory::Readme, relative)
}

/// Link name for a source file, from its project-relative path.
pub fn source_file_name(relative: &Path) -> String {
    path_file_name(OutputCategory::Source, relative)
}

fn path_file_name(category: OutputCategory, relative: &Path) -> String {
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!(
        "{}{}",
        category.prefix(),
        encode_segments(segments.iter().map(String::as_str))
    )
}

/// Recover the category and slash-separated source path from a file name.
///
/// Returns `None` for names this module did not produce.
pub fn decode(file_name: &str) -> Option<(OutputCategory, String)> {
    let category = OutputCategory::ALL
        .into_iter()
        .find(|category| file_name.starts_with(category.prefix()))?;
    let mut body = &file_name[category.prefix().len()..];
    if category == OutputCategory::Doc {
        body = body.strip_suffix(DOC_SUFFIX)?;
    }

    let mut decoded = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => decoded.push(chars.next()?),
            SEPARATOR => decoded.push('/'),
            other => decoded.push(other),
        }
    }
    Some((category, decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn doc_names_use_full_package_id() {
        assert_eq!(
            doc_file_name("example.com/app/internal"),
            "doc_example.com_app_internal.txt"
        );
        assert_eq!(doc_file_name("example.com/app"), "doc_example.com_app.txt");
    }

    #[test]
    fn readme_and_source_names_use_relative_path() {
        assert_eq!(readme_file_name(Path::new("README.md")), "readme_README.md");
        assert_eq!(
            readme_file_name(Path::new("docs/api/README.md")),
            "readme_docs_api_README.md"
        );
        assert_eq!(
            source_file_name(Path::new("cmd/server/main.go")),
            "src_cmd_server_main.go"
        );
        assert_eq!(source_file_name(Path::new("./main.go")), "src_main.go");
    }

    #[test]
    fn underscores_are_escaped() {
        assert_eq!(
            source_file_name(Path::new("a_b/c.go")),
            "src_a~_b_c.go"
        );
        assert_eq!(
            source_file_name(Path::new("a/b_c.go")),
            "src_a_b~_c.go"
        );
        assert_ne!(
            source_file_name(Path::new("a_b/c.go")),
            source_file_name(Path::new("a/b_c.go"))
        );
    }

    #[test]
    fn decode_reverses_encoding() {
        let rel = PathBuf::from("pkg/my_file~v2.go");
        let name = source_file_name(&rel);
        assert_eq!(
            decode(&name),
            Some((OutputCategory::Source, "pkg/my_file~v2.go".to_string()))
        );

        let doc = doc_file_name("example.com/app/foo_bar");
        assert_eq!(
            decode(&doc),
            Some((OutputCategory::Doc, "example.com/app/foo_bar".to_string()))
        );
    }

    #[test]
    fn decode_rejects_foreign_names() {
        assert_eq!(decode("directory_structure.txt"), None);
        assert_eq!(decode("doc_missing_suffix"), None);
        assert_eq!(decode("src_dangling~"), None);
    }
}
