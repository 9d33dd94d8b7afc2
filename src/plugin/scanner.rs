use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Finds every directory under `root` that directly holds a `descriptor` file.
///
/// Hidden entries and ignore files are not special here: a plugin checked in
/// under `.gitignore`d paths is still a plugin. Symlinks are not followed.
/// Units are returned as absolute paths.
pub fn find_units(root: &Path, descriptor: &str) -> Vec<PathBuf> {
    let mut units: Vec<PathBuf> = Vec::new();
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

    let walker = WalkBuilder::new(&root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };

        let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
        if !is_file || entry.file_name() != OsStr::new(descriptor) {
            continue;
        }

        if let Some(dir) = entry.path().parent() {
            if !dir.as_os_str().is_empty() && !units.iter().any(|u| u == dir) {
                units.push(dir.to_path_buf());
            }
        }
    }

    tracing::debug!("found {} plugin unit(s) under {}", units.len(), root.display());
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<plugin/>").unwrap();
    }

    #[test]
    fn finds_descriptors_at_any_depth() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("plugin.xml"));
        touch(&root.join("a/plugin.xml"));
        touch(&root.join("b/c/d/plugin.xml"));
        touch(&root.join("b/c/readme.md"));

        let units = find_units(root, "plugin.xml");
        assert_eq!(units.len(), 3);
        for expected in [root.to_path_buf(), root.join("a"), root.join("b/c/d")] {
            assert!(units.contains(&expected), "missing {}", expected.display());
        }
    }

    #[test]
    fn empty_tree_yields_no_units() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("src/main.js"));
        assert!(find_units(tmp.path(), "plugin.xml").is_empty());
    }

    #[test]
    fn name_must_match_exactly() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("x/plugin.xml.bak"));
        touch(&tmp.path().join("y/Plugin.xml"));
        fs::create_dir_all(tmp.path().join("z/plugin.xml")).unwrap();

        assert!(find_units(tmp.path(), "plugin.xml").is_empty());
    }

    #[test]
    fn relative_root_yields_absolute_units() {
        let tmp = TempDir::new_in(".").unwrap();
        let cwd = std::env::current_dir().unwrap();
        let root = Path::new(".").join(tmp.path().strip_prefix(&cwd).unwrap());
        touch(&root.join("plugin.xml"));
        touch(&root.join("inner/plugin.xml"));

        let units = find_units(&root, "plugin.xml");
        assert_eq!(units.len(), 2);
        for unit in &units {
            assert!(unit.is_absolute(), "{} is relative", unit.display());
            assert!(!unit.as_os_str().is_empty());
        }
        assert!(units.contains(&std::path::absolute(&root).unwrap()));
    }

    #[test]
    fn hidden_and_ignored_dirs_are_scanned() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join(".gitignore"), "vendor/\n").unwrap();
        touch(&root.join("vendor/plugin.xml"));
        touch(&root.join(".cache/plugin.xml"));

        let units = find_units(root, "plugin.xml");
        assert_eq!(units, vec![root.join(".cache"), root.join("vendor")]);
    }
}
