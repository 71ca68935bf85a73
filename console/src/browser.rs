use common::{BrowseListing, EntryKind};

use crate::state::Load;

pub const ROOT_LABEL: &str = "~";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEntry {
    Parent { path: String },
    Dir { name: String, path: String },
    File { name: String, path: String },
}

impl BrowserEntry {
    pub fn label(&self) -> &str {
        match self {
            BrowserEntry::Parent { .. } => "..",
            BrowserEntry::Dir { name, .. } | BrowserEntry::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserView {
    pub crumbs: Vec<Crumb>,
    pub entries: Vec<BrowserEntry>,
    /// The directory has no listable items.
    pub empty: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct FileBrowser {
    open: bool,
    path: String,
    listing: Load<BrowseListing>,
}

impl FileBrowser {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current path relative to the browse root; empty at the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn open(&mut self) {
        self.open = true;
        self.navigate("");
    }

    pub(crate) fn navigate(&mut self, path: &str) {
        self.path = path.to_string();
        self.listing = Load::Loading;
    }

    pub(crate) fn close(&mut self) {
        self.open = false;
    }

    /// Stores a listing if it answers the path currently shown.
    pub(crate) fn apply(&mut self, path: &str, result: Result<BrowseListing, String>) -> bool {
        if !self.open || path != self.path {
            return false;
        }
        self.listing = match result {
            Ok(listing) => Load::Ready(listing),
            Err(e) => Load::Failed(e),
        };
        true
    }

    /// Shows an already fetched listing for `path`.
    pub fn show(&mut self, path: &str, listing: BrowseListing) {
        self.open = true;
        self.path = path.to_string();
        self.listing = Load::Ready(listing);
    }

    pub fn view(&self) -> BrowserView {
        let parent = (!self.path.is_empty()).then(|| BrowserEntry::Parent {
            path: parent_path(&self.path),
        });
        match &self.listing {
            Load::Ready(listing) => {
                let mut entries: Vec<BrowserEntry> = parent.into_iter().collect();
                entries.extend(item_entries(&self.path, listing));
                BrowserView {
                    crumbs: breadcrumbs(&listing.path),
                    entries,
                    empty: listing.items.is_empty(),
                    loading: false,
                    error: None,
                }
            }
            other => BrowserView {
                crumbs: breadcrumbs(&self.path),
                entries: parent.into_iter().collect(),
                empty: false,
                loading: matches!(other, Load::Loading | Load::Idle),
                error: match other {
                    Load::Failed(e) => Some(e.clone()),
                    _ => None,
                },
            },
        }
    }
}

/// Root crumb followed by one crumb per path segment, each pointing at its
/// accumulated prefix. `""` and `"."` both denote the root.
pub fn breadcrumbs(path: &str) -> Vec<Crumb> {
    let mut crumbs = vec![Crumb { label: ROOT_LABEL.to_string(), path: String::new() }];
    if path.is_empty() || path == "." {
        return crumbs;
    }
    let mut acc = String::new();
    for part in path.split('/') {
        if !acc.is_empty() {
            acc.push('/');
        }
        acc.push_str(part);
        crumbs.push(Crumb { label: part.to_string(), path: acc.clone() });
    }
    crumbs
}

/// Path without its last segment; a single segment yields the root.
pub fn parent_path(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

fn item_entries(current: &str, listing: &BrowseListing) -> Vec<BrowserEntry> {
    listing
        .items
        .iter()
        .map(|item| match item.kind {
            EntryKind::Dir => BrowserEntry::Dir {
                name: item.name.clone(),
                path: if current.is_empty() {
                    item.name.clone()
                } else {
                    format!("{}/{}", current, item.name)
                },
            },
            EntryKind::File => BrowserEntry::File {
                name: item.name.clone(),
                path: item.path.clone().unwrap_or_else(|| item.name.clone()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BrowseItem;

    fn listing(path: &str, items: Vec<BrowseItem>) -> BrowseListing {
        BrowseListing { path: path.to_string(), items }
    }

    fn dir(name: &str) -> BrowseItem {
        BrowseItem { name: name.to_string(), kind: EntryKind::Dir, path: None }
    }

    fn file(name: &str, path: &str) -> BrowseItem {
        BrowseItem { name: name.to_string(), kind: EntryKind::File, path: Some(path.to_string()) }
    }

    #[test]
    fn test_breadcrumbs_accumulate_prefixes() {
        let crumbs = breadcrumbs("work/etl/daily");
        let paths: Vec<&str> = crumbs.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["", "work", "work/etl", "work/etl/daily"]);
        assert_eq!(crumbs[0].label, ROOT_LABEL);
        assert_eq!(crumbs[2].label, "etl");
    }

    #[test]
    fn test_root_dot_has_only_root_crumb() {
        assert_eq!(breadcrumbs(".").len(), 1);
        assert_eq!(breadcrumbs("").len(), 1);
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("work/etl"), "work");
        assert_eq!(parent_path("work"), "");
    }

    #[test]
    fn test_root_listing_has_no_parent_entry() {
        let mut browser = FileBrowser::default();
        browser.open();
        assert!(browser.apply("", Ok(listing(".", vec![dir("work"), file("a.sh", "/home/op/a.sh")]))));

        let view = browser.view();
        assert_eq!(
            view.entries,
            vec![
                BrowserEntry::Dir { name: "work".into(), path: "work".into() },
                BrowserEntry::File { name: "a.sh".into(), path: "/home/op/a.sh".into() },
            ]
        );
        assert!(!view.empty);
    }

    #[test]
    fn test_nested_listing_has_parent_and_joined_dirs() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.navigate("work/etl");
        browser.apply("work/etl", Ok(listing("work/etl", vec![dir("jobs")])));

        let view = browser.view();
        assert_eq!(view.entries[0], BrowserEntry::Parent { path: "work".into() });
        assert_eq!(view.entries[1], BrowserEntry::Dir { name: "jobs".into(), path: "work/etl/jobs".into() });
        assert_eq!(view.crumbs.len(), 3);
    }

    #[test]
    fn test_empty_directory_is_explicit() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.navigate("empty");
        browser.apply("empty", Ok(listing("empty", vec![])));
        let view = browser.view();
        assert!(view.empty);
        assert_eq!(view.entries, vec![BrowserEntry::Parent { path: String::new() }]);
    }

    #[test]
    fn test_stale_listing_is_dropped() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.navigate("b");
        assert!(!browser.apply("a", Ok(listing("a", vec![dir("x")]))));
        assert!(browser.view().loading);
    }
}
