//! Holding area for deleted subtrees.

use std::fmt;
use std::rc::Rc;

use platform_host::NodePath;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file_system::{FileTree, FsError, FsNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BinEntryId(pub u64);

impl fmt::Display for BinEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bin-{}", self.0)
    }
}

/// A removed subtree and where it used to live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinEntry {
    pub id: BinEntryId,
    pub node: Rc<FsNode>,
    pub original_path: NodePath,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecycleBinError {
    #[error("recycle bin entry {0} does not exist")]
    EntryNotFound(BinEntryId),
    #[error("cannot restore to `{0}`: the name is already taken")]
    NameCollision(String),
    #[error(transparent)]
    FileSystem(#[from] FsError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecycleBin {
    entries: Vec<BinEntry>,
    next_entry_id: u64,
}

impl Default for RecycleBin {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_entry_id: 1,
        }
    }
}

impl RecycleBin {
    /// Entries oldest first.
    pub fn entries(&self) -> &[BinEntry] {
        &self.entries
    }

    pub fn entry(&self, id: BinEntryId) -> Option<&BinEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Detaches the node at `path` from `tree` and records it.
    ///
    /// When more than `capacity` entries are held afterwards, the oldest are purged.
    pub fn move_to_bin(
        &mut self,
        tree: &mut FileTree,
        path: &NodePath,
        capacity: usize,
    ) -> Result<BinEntryId, RecycleBinError> {
        let node = tree.remove(path)?;
        let id = BinEntryId(self.next_entry_id);
        self.next_entry_id = self.next_entry_id.saturating_add(1);
        self.entries.push(BinEntry {
            id,
            node,
            original_path: path.clone(),
        });
        self.trim_to(capacity.max(1));
        Ok(id)
    }

    /// Reattaches an entry at its original location and removes it from the bin.
    ///
    /// If the original name is taken, or the original parent no longer exists, neither the tree
    /// nor the bin changes.
    pub fn restore(
        &mut self,
        tree: &mut FileTree,
        id: BinEntryId,
    ) -> Result<NodePath, RecycleBinError> {
        let index = self.index_of(id)?;
        let entry = &self.entries[index];
        let parent = entry
            .original_path
            .parent()
            .ok_or_else(|| FsError::IsRoot(entry.original_path.to_string()))?;
        let restored = tree
            .reattach_child(&parent, Rc::clone(&entry.node))
            .map_err(|err| match err {
                FsError::AlreadyExists(path) => RecycleBinError::NameCollision(path),
                other => RecycleBinError::FileSystem(other),
            })?;
        self.entries.remove(index);
        Ok(restored)
    }

    /// Drops an entry for good.
    pub fn purge(&mut self, id: BinEntryId) -> Result<BinEntry, RecycleBinError> {
        let index = self.index_of(id)?;
        Ok(self.entries.remove(index))
    }

    /// Drops the listed entries that are still present and returns how many were removed.
    pub fn purge_all(&mut self, ids: &[BinEntryId]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !ids.contains(&entry.id));
        before - self.entries.len()
    }

    /// Drops every entry and returns how many were removed.
    pub fn empty(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Re-establishes unique ids and a counter ahead of them after decoding.
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::BTreeSet::new();
        self.entries.retain(|entry| seen.insert(entry.id));
        let max_id = self.entries.iter().map(|entry| entry.id.0).max().unwrap_or(0);
        self.next_entry_id = self.next_entry_id.max(max_id.saturating_add(1)).max(1);
        self
    }

    fn trim_to(&mut self, capacity: usize) {
        if self.entries.len() > capacity {
            let overflow = self.entries.len() - capacity;
            let purged = self.entries.drain(0..overflow).count();
            tracing::info!(purged, capacity, "recycle bin over capacity; purged oldest entries");
        }
    }

    fn index_of(&self, id: BinEntryId) -> Result<usize, RecycleBinError> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(RecycleBinError::EntryNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use platform_host::FileContent;
    use pretty_assertions::assert_eq;

    use super::*;

    fn path(raw: &str) -> NodePath {
        NodePath::parse(raw).expect("valid path")
    }

    #[test]
    fn move_then_restore_round_trips_tree() {
        let mut tree = FileTree::seeded();
        let mut bin = RecycleBin::default();
        let original = tree.clone();

        let id = bin
            .move_to_bin(&mut tree, &path("C:/Documents/hello.txt"), 100)
            .expect("move");
        assert!(tree.resolve(&path("C:/Documents/hello.txt")).is_err());
        assert_eq!(bin.len(), 1);
        assert_eq!(
            bin.entry(id).expect("entry").original_path,
            path("C:/Documents/hello.txt")
        );

        let restored = bin.restore(&mut tree, id).expect("restore");
        assert_eq!(restored, path("C:/Documents/hello.txt"));
        assert!(bin.is_empty());
        assert_eq!(tree, original);
    }

    #[test]
    fn restore_collision_keeps_tree_and_entry() {
        let mut tree = FileTree::seeded();
        let mut bin = RecycleBin::default();
        let id = bin
            .move_to_bin(&mut tree, &path("C:/Documents/hello.txt"), 100)
            .expect("move");
        tree.create_file(&path("C:/Documents"), "hello.txt", FileContent::text("new"))
            .expect("recreate");
        let tree_before = tree.clone();
        let bin_before = bin.clone();

        assert_eq!(
            bin.restore(&mut tree, id),
            Err(RecycleBinError::NameCollision(
                "C:/Documents/hello.txt".to_string()
            ))
        );
        assert_eq!(tree, tree_before);
        assert_eq!(bin, bin_before);
    }

    #[test]
    fn restore_into_missing_parent_fails_without_mutation() {
        let mut tree = FileTree::seeded();
        let mut bin = RecycleBin::default();
        let file = bin
            .move_to_bin(&mut tree, &path("C:/Documents/hello.txt"), 100)
            .expect("move file");
        bin.move_to_bin(&mut tree, &path("C:/Documents"), 100)
            .expect("move folder");

        assert_eq!(
            bin.restore(&mut tree, file),
            Err(RecycleBinError::FileSystem(FsError::NotFound(
                "C:/Documents".to_string()
            )))
        );
        assert_eq!(bin.len(), 2);
    }

    #[test]
    fn drive_roots_and_missing_nodes_cannot_be_binned() {
        let mut tree = FileTree::seeded();
        let mut bin = RecycleBin::default();
        assert_eq!(
            bin.move_to_bin(&mut tree, &path("C:"), 100),
            Err(RecycleBinError::FileSystem(FsError::IsRoot("C:".to_string())))
        );
        assert!(matches!(
            bin.move_to_bin(&mut tree, &path("C:/nope"), 100),
            Err(RecycleBinError::FileSystem(FsError::NotFound(_)))
        ));
        assert!(bin.is_empty());
    }

    #[test]
    fn capacity_purges_oldest_entries() {
        let mut tree = FileTree::empty();
        let mut bin = RecycleBin::default();
        for name in ["a", "b", "c"] {
            tree.create_folder(&path("C:"), name).expect("create");
            bin.move_to_bin(&mut tree, &path(&format!("C:/{name}")), 2)
                .expect("move");
        }
        let names = bin
            .entries()
            .iter()
            .map(|entry| entry.node.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn purge_and_empty_remove_entries() {
        let mut tree = FileTree::seeded();
        let mut bin = RecycleBin::default();
        let first = bin
            .move_to_bin(&mut tree, &path("C:/Documents"), 100)
            .expect("move");
        bin.move_to_bin(&mut tree, &path("C:/Projects"), 100)
            .expect("move");

        assert_eq!(bin.purge(first).expect("purge").id, first);
        assert_eq!(bin.purge(first), Err(RecycleBinError::EntryNotFound(first)));
        assert_eq!(bin.empty(), 1);
        assert_eq!(bin.empty(), 0);
    }

    #[test]
    fn purge_all_only_touches_listed_entries() {
        let mut tree = FileTree::seeded();
        let mut bin = RecycleBin::default();
        let documents = bin
            .move_to_bin(&mut tree, &path("C:/Documents"), 100)
            .expect("move");
        let projects = bin
            .move_to_bin(&mut tree, &path("C:/Projects"), 100)
            .expect("move");

        assert_eq!(bin.purge_all(&[documents, BinEntryId(99)]), 1);
        assert_eq!(bin.len(), 1);
        assert_eq!(bin.entries()[0].id, projects);
    }

    #[test]
    fn normalized_advances_counter_past_existing_ids() {
        let mut tree = FileTree::seeded();
        let mut bin = RecycleBin::default();
        bin.move_to_bin(&mut tree, &path("C:/Documents"), 100)
            .expect("move");
        let mut value = serde_json::to_value(&bin).expect("serialize");
        value["next_entry_id"] = serde_json::json!(0);
        let decoded: RecycleBin = serde_json::from_value(value).expect("decode");

        let mut normalized = decoded.normalized();
        let next = normalized
            .move_to_bin(&mut tree, &path("C:/Projects"), 100)
            .expect("move");
        assert_eq!(next, BinEntryId(2));
    }
}
