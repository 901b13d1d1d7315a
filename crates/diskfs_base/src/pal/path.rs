//! Path utilities used when resolving caller paths.

use std::path::{Path, PathBuf, is_separator};

/// Whether the path is absolute in the platform's syntax.
///
/// On Unix a leading `/` suffices. On Windows a drive or UNC prefix is required as well.
pub fn is_absolute(path: &str) -> bool {
    Path::new(path).is_absolute()
}

/// Joins `path` onto `prefix`, inserting the platform separator between segments.
///
/// `path` is split on the platform's separators (`/` everywhere, `\` as well on Windows) and
/// each non-empty segment is appended. `.` and `..` segments are kept as they are.
/// An empty prefix yields `path` relative to the working directory.
pub fn join(prefix: &Path, path: &str) -> PathBuf {
    let mut joined = prefix.to_path_buf();
    for segment in path.split(is_separator).filter(|segment| !segment.is_empty()) {
        joined.push(segment);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_with_prefix() {
        let joined = join(Path::new("/data/game"), "levels/intro.bin");
        assert_eq!(joined, Path::new("/data/game").join("levels").join("intro.bin"));
    }

    #[test]
    fn test_join_with_empty_prefix() {
        let joined = join(Path::new(""), "levels/intro.bin");
        assert_eq!(joined, Path::new("levels").join("intro.bin"));
    }

    #[test]
    fn test_join_prefix_with_trailing_separator() {
        let with_slash = join(Path::new("/data/game/"), "intro.bin");
        let without_slash = join(Path::new("/data/game"), "intro.bin");
        assert_eq!(with_slash, without_slash);
    }

    #[test]
    fn test_join_keeps_dot_segments() {
        let joined = join(Path::new("root"), "./a/../b");
        let expected = Path::new("root").join(".").join("a").join("..").join("b");
        assert_eq!(joined.as_os_str(), expected.as_os_str());
    }

    #[test]
    fn test_join_collapses_repeated_separators() {
        let joined = join(Path::new("root"), "a//b/");
        assert_eq!(joined, Path::new("root").join("a").join("b"));
    }

    #[test]
    fn test_join_empty_path_is_prefix() {
        assert_eq!(join(Path::new("root"), ""), PathBuf::from("root"));
    }

    #[test]
    fn test_is_absolute_relative_paths() {
        assert!(!is_absolute("levels/intro.bin"));
        assert!(!is_absolute("./intro.bin"));
        assert!(!is_absolute(""));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_absolute_unix() {
        assert!(is_absolute("/abs/override.bin"));
    }

    #[cfg(windows)]
    #[test]
    fn test_is_absolute_windows() {
        assert!(is_absolute(r"C:\abs\override.bin"));
        assert!(!is_absolute(r"\abs\override.bin"));
    }
}
