use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{expand_path, IndexConfig};

/// Source of candidate project directories.
pub trait DirectoryIndexer {
    /// Sorted, deduplicated directory paths, each ending in `/`.
    fn index(&self) -> Vec<String>;
}

/// Matches path components against the exclusion denylist.
#[derive(Debug, Clone)]
pub struct ExcludeMatcher {
    re: Option<Regex>,
}

impl ExcludeMatcher {
    /// Build a matcher where a component is excluded if it contains any of `patterns`.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let alternatives: Vec<String> = patterns
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Self { re: None };
        }
        let re = Regex::new(&alternatives.join("|")).ok();
        Self { re }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(re) = &self.re else {
            return false;
        };
        path.components().any(|c| match c {
            Component::Normal(name) => re.is_match(&name.to_string_lossy()),
            _ => false,
        })
    }
}

/// Walks configured roots on the local filesystem.
pub struct FsIndexer {
    roots: Vec<(usize, PathBuf)>,
    exclude: ExcludeMatcher,
}

impl FsIndexer {
    pub fn new(config: &IndexConfig) -> Self {
        let roots = config
            .roots
            .iter()
            .flat_map(|entry| entry.paths.iter().map(move |p| (entry.depth, expand_path(p))))
            .collect();
        Self {
            roots,
            exclude: ExcludeMatcher::new(&config.exclude),
        }
    }

    fn scan_root(&self, root: &Path, depth: usize, out: &mut BTreeSet<String>) {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "Skipping missing index root");
            return;
        }

        // Depth 0 is the root itself; otherwise the root is a container, not a project.
        let min_depth = if depth == 0 { 0 } else { 1 };
        let walker = WalkDir::new(root)
            .min_depth(min_depth)
            .max_depth(depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.exclude.is_excluded(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            out.insert(with_trailing_separator(entry.path()));
        }
    }
}

impl DirectoryIndexer for FsIndexer {
    fn index(&self) -> Vec<String> {
        let mut found = BTreeSet::new();
        for (depth, root) in &self.roots {
            self.scan_root(root, *depth, &mut found);
        }
        tracing::debug!(count = found.len(), "Indexed directories");
        found.into_iter().collect()
    }
}

fn with_trailing_separator(path: &Path) -> String {
    let mut s = path.to_string_lossy().into_owned();
    if !s.ends_with(std::path::MAIN_SEPARATOR) {
        s.push(std::path::MAIN_SEPARATOR);
    }
    s
}
