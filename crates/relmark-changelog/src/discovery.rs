//! Locating the changelog file of a package

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use relmark_core::error::ChangelogError;

/// Find the changelog matching `pattern` inside `root/dir`.
///
/// Matches are sorted; when there is more than one the first is taken and a
/// warning is emitted.
pub fn find_changelog(root: &Path, dir: &Path, pattern: &str) -> Result<PathBuf, ChangelogError> {
    let search_dir = root.join(dir);
    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&search_dir.to_string_lossy()),
        pattern
    );
    debug!(pattern = %full_pattern, "searching for changelog");

    let paths = glob::glob(&full_pattern).map_err(|e| ChangelogError::Format {
        path: search_dir.clone(),
        reason: format!("invalid changelog pattern '{}': {}", pattern, e),
    })?;

    let mut matches: Vec<PathBuf> = paths
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    matches.sort();

    let mut matches = matches.into_iter();
    let first = matches.next().ok_or_else(|| ChangelogError::NoChangelogFile {
        dir: search_dir.clone(),
        pattern: pattern.to_string(),
    })?;

    let others: Vec<String> = matches.map(|p| p.display().to_string()).collect();
    if !others.is_empty() {
        warn!(
            using = %first.display(),
            ignored = ?others,
            "multiple changelog files found, using the first"
        );
    }

    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn packaging(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("packaging");
        std::fs::create_dir_all(&dir).unwrap();
        for file in files {
            std::fs::write(dir.join(file), "").unwrap();
        }
        temp
    }

    #[test]
    fn test_single_changelog() {
        let temp = packaging(&["pkg.changes", "pkg.spec"]);
        let found = find_changelog(temp.path(), Path::new("packaging"), "*.changes").unwrap();
        assert_eq!(found, temp.path().join("packaging").join("pkg.changes"));
    }

    #[test]
    fn test_multiple_changelogs_takes_first() {
        let temp = packaging(&["zeta.changes", "alpha.changes"]);
        let found = find_changelog(temp.path(), Path::new("packaging"), "*.changes").unwrap();
        assert_eq!(found.file_name().unwrap(), "alpha.changes");
    }

    #[test]
    fn test_no_changelog() {
        let temp = packaging(&["pkg.spec"]);
        let result = find_changelog(temp.path(), Path::new("packaging"), "*.changes");
        assert!(matches!(result, Err(ChangelogError::NoChangelogFile { .. })));
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let result = find_changelog(temp.path(), Path::new("packaging"), "*.changes");
        assert!(matches!(result, Err(ChangelogError::NoChangelogFile { .. })));
    }
}
