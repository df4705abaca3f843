//! Recursive discovery of survey exports under a root directory.

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Every file under `root` whose extension matches, sorted by the bytes of
/// the full path so repeated runs visit files in the same order. Unreadable directory entries are skipped and
/// a missing root yields an empty list.
pub fn find_tabular_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping unreadable entry under {root:?}: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_extension(entry.path(), extension))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    files.sort_by(|a, b| {
        a.as_os_str()
            .as_encoded_bytes()
            .cmp(b.as_os_str().as_encoded_bytes())
    });
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_nested_files_in_sorted_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("ssrn/east")).unwrap();
        fs::write(root.join("b.csv"), "").unwrap();
        fs::write(root.join("a.CSV"), "").unwrap();
        fs::write(root.join("ssrn/east/c.csv"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::create_dir_all(root.join("folder.csv")).unwrap();
        fs::create_dir_all(root.join("order/a")).unwrap();
        fs::create_dir_all(root.join("order/a-b")).unwrap();
        fs::write(root.join("order/a/x.csv"), "").unwrap();
        fs::write(root.join("order/a-b/x.csv"), "").unwrap();
        fs::write(root.join("order/a.csv"), "").unwrap();

        let found = find_tabular_files(root, "csv");
        assert_eq!(
            found,
            vec![
                root.join("a.CSV"),
                root.join("b.csv"),
                root.join("order/a-b/x.csv"),
                root.join("order/a.csv"),
                root.join("order/a/x.csv"),
                root.join("ssrn/east/c.csv"),
            ]
        );
        assert_eq!(found, find_tabular_files(root, "csv"));
    }

    #[test]
    fn empty_or_missing_root_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(find_tabular_files(dir.path(), "csv").is_empty());
        assert!(find_tabular_files(&dir.path().join("missing"), "csv").is_empty());
    }
}
