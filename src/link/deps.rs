//! Dependency-file emission: `libNAME.la.slibtool.deps`
//! is a line-oriented list of `-lFOO`, `-LDIR`, and `::path/to/archive.a`
//! entries derived transitively from input `.la` wrappers, followed by a
//! normalization pass (absolute -> directory-relative) and a compaction
//! pass (drop duplicate `-L` lines, keep first occurrence).

use std::path::{Path, PathBuf};

/// One dependency entry, in the order it should appear in the sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepEntry {
    Lib(String),
    LibDir(PathBuf),
    Archive(PathBuf),
}

impl DepEntry {
    pub fn render(&self) -> String {
        match self {
            DepEntry::Lib(name) => format!("-l{name}"),
            DepEntry::LibDir(dir) => format!("-L{}", dir.display()),
            DepEntry::Archive(path) => format!("::{}", path.display()),
        }
    }
}

/// Rewrite an absolute dependency path to be relative to `target_dir` when
/// the two share a common ancestor; otherwise leave it untouched.
fn normalize_path(path: &Path, target_dir: &Path) -> PathBuf {
    if !path.is_absolute() || !target_dir.is_absolute() {
        return path.to_path_buf();
    }
    let mut target_components: Vec<_> = target_dir.components().collect();
    let path_components: Vec<_> = path.components().collect();

    let mut common = 0;
    while common < target_components.len()
        && common < path_components.len()
        && target_components[common] == path_components[common]
    {
        common += 1;
    }
    if common == 0 {
        return path.to_path_buf();
    }

    let ups = target_components.split_off(common).len();
    let mut out = PathBuf::new();
    for _ in 0..ups {
        out.push("..");
    }
    for component in &path_components[common..] {
        out.push(component);
    }
    out
}

pub fn normalize(entries: Vec<DepEntry>, target_dir: &Path) -> Vec<DepEntry> {
    entries
        .into_iter()
        .map(|e| match e {
            DepEntry::LibDir(dir) => DepEntry::LibDir(normalize_path(&dir, target_dir)),
            DepEntry::Archive(path) => DepEntry::Archive(normalize_path(&path, target_dir)),
            other => other,
        })
        .collect()
}

/// Drop duplicate `-L` lines, keeping the first occurrence; `-l` and
/// archive entries are left as-is since repeats there are meaningful link
/// order, not redundancy.
pub fn compact(entries: Vec<DepEntry>) -> Vec<DepEntry> {
    let mut seen_dirs = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|e| match e {
            DepEntry::LibDir(dir) => seen_dirs.insert(dir.clone()),
            _ => true,
        })
        .collect()
}

pub fn render_sidecar(entries: &[DepEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.render());
        out.push('\n');
    }
    out
}
