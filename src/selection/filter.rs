//! Package filtering from include/exclude specs.
//!
//! Excluded directories are rewritten into package identifiers under the
//! module path, then every discovered package whose identifier starts with
//! an excluded identifier is dropped. Include tokens never widen or narrow the
//! documentation set; they only select source files (see `crate::collect`).

use serde::Serialize;

use crate::selection::classifier::FilterSpec;

/// Join a slash path under the module path and clean it the way Go's
/// `path.Join` does (`.` and empty segments dropped, `..` folded).
pub fn join_module_path(module: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in module.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}

/// Identifier prefixes that remove a package and all its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionSet {
    module: String,
    prefixes: Vec<String>,
}

impl ExclusionSet {
    /// Build the set from the exclude side of a spec.
    pub fn from_spec(spec: &FilterSpec, module: &str) -> Self {
        let mut prefixes: Vec<String> = Vec::new();
        let synthetic = spec
            .exclude
            .directories
            .iter()
            .map(|dir| join_module_path(module, dir));
        for prefix in spec.exclude.packages.iter().cloned().chain(synthetic) {
            if !prefixes.contains(&prefix) {
                prefixes.push(prefix);
            }
        }
        Self {
            module: module.to_string(),
            prefixes,
        }
    }

    /// True when nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Excluded identifier prefixes, in the order given.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether `package` starts with any excluded prefix.
    ///
    /// This is a plain string prefix, so excluding `cmd/tool` also drops
    /// `cmd/toolkit`.
    pub fn excludes(&self, package: &str) -> bool {
        self.prefixes
            .iter()
            .any(|prefix| is_path_prefix(prefix, package))
    }

    /// Excluded prefixes expressed as directories relative to the project root.
    ///
    /// Prefixes outside the module path have no directory and are left out.
    pub fn relative_directories(&self) -> Vec<String> {
        self.prefixes
            .iter()
            .filter_map(|prefix| {
                if self.module.is_empty() {
                    return Some(prefix.clone());
                }
                if *prefix == self.module {
                    return Some(".".to_string());
                }
                prefix
                    .strip_prefix(&self.module)
                    .and_then(|rest| rest.strip_prefix('/'))
                    .map(str::to_string)
            })
            .collect()
    }
}

fn is_path_prefix(prefix: &str, package: &str) -> bool {
    prefix == "." || package.starts_with(prefix)
}

/// Packages that receive documentation, in discovery order.
pub fn filter_packages(all: &[String], spec: &FilterSpec, module: &str) -> Vec<String> {
    if spec.is_empty() {
        return all.to_vec();
    }
    let exclusions = ExclusionSet::from_spec(spec, module);
    all.iter()
        .filter(|package| !exclusions.excludes(package))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = "example.com/app";

    fn packages(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn join_cleans_like_go() {
        assert_eq!(join_module_path(MODULE, "internal"), "example.com/app/internal");
        assert_eq!(join_module_path(MODULE, "./internal/"), "example.com/app/internal");
        assert_eq!(join_module_path(MODULE, "a//b/../c"), "example.com/app/a/c");
        assert_eq!(join_module_path(MODULE, "../other"), "example.com/other");
        assert_eq!(join_module_path(MODULE, "."), MODULE);
        assert_eq!(join_module_path("", "internal"), "internal");
        assert_eq!(join_module_path("", "."), ".");
        assert_eq!(join_module_path("", "../x"), "../x");
    }

    #[test]
    fn excluding_directory_drops_subtree() {
        let all = packages(&["example.com/app", "example.com/app/internal"]);
        let spec = FilterSpec::new(&[] as &[&str], &["internal"], MODULE);
        assert_eq!(filter_packages(&all, &spec, MODULE), packages(&["example.com/app"]));
    }

    #[test]
    fn exclusion_is_a_string_prefix() {
        let all = packages(&[
            "example.com/app",
            "example.com/app/cmd/tool",
            "example.com/app/cmd/toolkit",
            "example.com/app/cmd/other",
        ]);
        let spec = FilterSpec::new(&[] as &[&str], &["cmd/tool"], MODULE);
        assert_eq!(
            filter_packages(&all, &spec, MODULE),
            packages(&["example.com/app", "example.com/app/cmd/other"])
        );
    }

    #[test]
    fn excluding_the_root_drops_everything() {
        let all = packages(&["internal/db", "api"]);
        let spec = FilterSpec::new(&[] as &[&str], &["."], "");
        assert!(filter_packages(&all, &spec, "").is_empty());
    }

    #[test]
    fn no_spec_returns_everything_in_order() {
        let all = packages(&["example.com/app/b", "example.com/app", "example.com/app/a"]);
        let spec = FilterSpec::default();
        assert_eq!(filter_packages(&all, &spec, MODULE), all);
    }

    #[test]
    fn includes_do_not_narrow_the_documentation_set() {
        let all = packages(&["example.com/app", "example.com/app/api", "example.com/app/db"]);
        let spec = FilterSpec::new(&["example.com/app/api"], &[] as &[&str], MODULE);
        assert_eq!(filter_packages(&all, &spec, MODULE), all);
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let all = packages(&["example.com/app", "example.com/app/api", "example.com/app/api/v1"]);
        let spec = FilterSpec::new(&["example.com/app/api/v1"], &["api"], MODULE);
        assert_eq!(filter_packages(&all, &spec, MODULE), packages(&["example.com/app"]));
    }

    #[test]
    fn relative_directories_strip_module() {
        let spec = FilterSpec::new(
            &[] as &[&str],
            &["internal", "example.com/app/cmd/tool", "example.com/app"],
            MODULE,
        );
        let set = ExclusionSet::from_spec(&spec, MODULE);
        let mut dirs = set.relative_directories();
        dirs.sort();
        assert_eq!(dirs, vec![".".to_string(), "cmd/tool".to_string(), "internal".to_string()]);
    }

    #[test]
    fn unknown_module_matches_raw_directories() {
        let all = packages(&["internal/db", "api"]);
        let spec = FilterSpec::new(&[] as &[&str], &["internal"], "");
        assert_eq!(filter_packages(&all, &spec, ""), packages(&["api"]));
    }
}
