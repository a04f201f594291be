// src/utils/paths.rs
//! Lexical path helpers
//!
//! Module identity is decided on normalized paths, never on the filesystem,
//! so these helpers only ever look at path components.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without touching the filesystem
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` above the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }

    out.iter().map(|c| c.as_os_str()).collect()
}

/// Directory containing `file`
pub fn dirname(file: impl AsRef<Path>) -> PathBuf {
    match file.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Join a specifier onto a directory and normalize the result
pub fn join(dir: impl AsRef<Path>, specifier: &str) -> PathBuf {
    normalize(dir.as_ref().join(specifier))
}

/// Whether a specifier addresses a file relative to the requiring module
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Whether two paths name the same module after normalization
pub fn same_module(a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
    normalize(a) == normalize(b)
}

/// Extension including the leading dot, e.g. `".js"`
pub fn extension_of(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/a/b/../c/./d.js"), PathBuf::from("/a/c/d.js"));
        assert_eq!(normalize("/../a"), PathBuf::from("/a"));
        assert_eq!(normalize("a/../../b"), PathBuf::from("../b"));
        assert_eq!(normalize("./"), PathBuf::from("."));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/plugin/lib", "./util.js"), PathBuf::from("/plugin/lib/util.js"));
        assert_eq!(join("/plugin/lib", "../main.js"), PathBuf::from("/plugin/main.js"));
    }

    #[test]
    fn test_relative_specifier() {
        assert!(is_relative_specifier("./a"));
        assert!(is_relative_specifier("../a"));
        assert!(is_relative_specifier(".."));
        assert!(!is_relative_specifier("lodash"));
        assert!(!is_relative_specifier("/abs/a.js"));
        assert!(!is_relative_specifier(".hidden"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("/a/b.json").as_deref(), Some(".json"));
        assert_eq!(extension_of("/a/b"), None);
    }

    #[test]
    fn test_same_module() {
        assert!(same_module("/plugin/./main.js", "/plugin/lib/../main.js"));
        assert!(!same_module("/plugin/main.js", "/plugin/Main.js"));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(parts in proptest::collection::vec("[a-z]{1,4}|\\.|\\.\\.", 0..8)) {
            let path = format!("/{}", parts.join("/"));
            let once = normalize(&path);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
