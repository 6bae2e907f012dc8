//! The logical index a picker session searches.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dongle_fuzzy::FuzzyMatch;
use dongle_index::DirectoryIndex;

/// Whether a session searches one root or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One root, entries shown relative to it.
    Single,

    /// Several roots, entries prefixed with their root's label.
    Workspace,
}

/// One selectable directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Index into the catalog's roots.
    root: usize,

    /// Path segments relative to the root. Empty for the root itself.
    segments: Vec<String>,

    /// Text that is matched and rendered.
    display: String,
}

impl CatalogItem {
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl AsRef<str> for CatalogItem {
    fn as_ref(&self) -> &str {
        &self.display
    }
}

/// A read-only snapshot of one or more directory indexes.
#[derive(Debug, Clone)]
pub struct Catalog {
    mode: Mode,
    roots: Vec<PathBuf>,
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Catalog of a single root: the root itself, shown as `.`, followed
    /// by its entries in scan order.
    pub fn single(index: &DirectoryIndex) -> Self {
        let mut items = Vec::with_capacity(index.len() + 1);
        items.push(CatalogItem {
            root: 0,
            segments: Vec::new(),
            display: ".".to_string(),
        });
        items.extend(index.entries().iter().map(|entry| CatalogItem {
            root: 0,
            segments: entry.segments().to_vec(),
            display: entry.display(),
        }));

        Self {
            mode: Mode::Single,
            roots: vec![index.root().to_path_buf()],
            items,
        }
    }

    /// Catalog aggregating several roots in the given order.
    ///
    /// Each root contributes itself (shown as its label) followed by its
    /// entries shown as `label/relative/path`. Labels are the roots' final
    /// path components, suffixed `#2`, `#3`, ... when they collide.
    pub fn workspace(indexes: &[DirectoryIndex]) -> Self {
        let labels = unique_labels(indexes.iter().map(DirectoryIndex::root));
        let mut roots = Vec::with_capacity(indexes.len());
        let mut items = Vec::new();

        for (root, (index, label)) in indexes.iter().zip(labels).enumerate() {
            // "/" has no final component and is its own label.
            let prefix = label.trim_end_matches('/').to_string();
            items.push(CatalogItem {
                root,
                segments: Vec::new(),
                display: label,
            });
            items.extend(index.entries().iter().map(|entry| CatalogItem {
                root,
                segments: entry.segments().to_vec(),
                display: format!("{prefix}/{}", entry.display()),
            }));
            roots.push(index.root().to_path_buf());
        }

        Self {
            mode: Mode::Workspace,
            roots,
            items,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&CatalogItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rank every item against `query`.
    pub fn rank(&self, query: &str, limit: usize) -> Vec<FuzzyMatch> {
        dongle_fuzzy::rank(&self.items, query, limit)
    }

    /// Absolute path of the item at `index`.
    pub fn resolve(&self, index: usize) -> Option<PathBuf> {
        let item = self.items.get(index)?;
        let mut path = self.roots.get(item.root)?.clone();
        path.extend(&item.segments);
        Some(path)
    }
}

fn unique_labels<'a>(roots: impl Iterator<Item = &'a Path>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    roots
        .map(|root| {
            let base = root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.to_string_lossy().into_owned());
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{base}#{count}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dongle_index::{IndexEntry, ScanParams};
    use pretty_assertions::assert_eq;

    fn index(root: &str, entries: &[&[&str]]) -> DirectoryIndex {
        DirectoryIndex::new(
            root,
            ScanParams::default(),
            entries.iter().map(|segments| IndexEntry::new(segments.iter().copied())).collect(),
        )
    }

    fn displays(catalog: &Catalog) -> Vec<&str> {
        catalog.items().iter().map(CatalogItem::display).collect()
    }

    #[test]
    fn test_single_lists_root_then_scan_order() {
        let catalog = Catalog::single(&index("/work/app", &[&["src"], &["src", "ui"], &["docs"]]));

        assert_eq!(catalog.mode(), Mode::Single);
        assert_eq!(displays(&catalog), vec![".", "src", "src/ui", "docs"]);
        assert_eq!(catalog.resolve(0), Some(PathBuf::from("/work/app")));
        assert_eq!(catalog.resolve(2), Some(PathBuf::from("/work/app/src/ui")));
        assert_eq!(catalog.resolve(4), None);
    }

    #[test]
    fn test_single_root_without_subdirectories_is_selectable() {
        let catalog = Catalog::single(&index("/work/empty", &[]));

        assert_eq!(displays(&catalog), vec!["."]);
        assert_eq!(catalog.resolve(0), Some(PathBuf::from("/work/empty")));
    }

    #[test]
    fn test_workspace_prefixes_labels() {
        let catalog = Catalog::workspace(&[
            index("/work/api", &[&["src"]]),
            index("/home/me/web", &[&["pages", "home"]]),
        ]);

        assert_eq!(catalog.mode(), Mode::Workspace);
        assert_eq!(displays(&catalog), vec!["api", "api/src", "web", "web/pages/home"]);
        assert_eq!(catalog.resolve(0), Some(PathBuf::from("/work/api")));
        assert_eq!(
            catalog.resolve(3),
            Some(PathBuf::from("/home/me/web/pages/home"))
        );
    }

    #[test]
    fn test_workspace_disambiguates_duplicate_labels() {
        let catalog = Catalog::workspace(&[
            index("/a/app", &[&["src"]]),
            index("/b/app", &[&["src"]]),
        ]);

        assert_eq!(displays(&catalog), vec!["app", "app/src", "app#2", "app#2/src"]);
        assert_eq!(catalog.resolve(3), Some(PathBuf::from("/b/app/src")));
    }

    #[test]
    fn test_workspace_filesystem_root_has_single_slash() {
        let catalog = Catalog::workspace(&[
            index("/", &[&["srv", "data"]]),
            index("/work/api", &[&["src"]]),
        ]);

        assert_eq!(displays(&catalog), vec!["/", "/srv/data", "api", "api/src"]);
        assert_eq!(catalog.resolve(0), Some(PathBuf::from("/")));
        assert_eq!(catalog.resolve(1), Some(PathBuf::from("/srv/data")));
    }

    #[test]
    fn test_workspace_matches_on_labels() {
        let catalog = Catalog::workspace(&[
            index("/work/api", &[&["src"]]),
            index("/work/web", &[&["src"]]),
        ]);

        let ranked = catalog.rank("web/src", 10);

        assert_eq!(ranked.len(), 1);
        assert_eq!(catalog.resolve(ranked[0].index), Some(PathBuf::from("/work/web/src")));
    }
}
