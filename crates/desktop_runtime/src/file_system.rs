//! Immutable-by-sharing virtual file tree rooted at drive labels.
//!
//! Nodes are held behind [`Rc`] and every mutation goes through [`Rc::make_mut`] along the edited
//! path, so a cloned [`FileTree`] shares all untouched subtrees with the tree it was cloned from.
//! Every operation validates its inputs before the first write; a failed call leaves the tree
//! exactly as it was.

use std::collections::BTreeMap;
use std::rc::Rc;

use platform_host::{
    is_drive_label, is_valid_node_name, resolve_relative, FileContent, FsNodeKind, NodePath,
    SYSTEM_DRIVE,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const WELCOME_TEXT: &str = "Hello, world! Welcome to React OS.";
const README_TEXT: &str = "# React OS\n\n\
A small desktop environment that runs in a single page.\n\n\
## Apps\n\n\
- File Explorer for browsing the `C:` drive\n\
- Text Editor for notes and uploaded text files\n\
- Terminal with `ls`, `cd`, `cat` and `pwd`\n\
- Recycle Bin for restoring deleted items\n";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("`{0}` was not found")]
    NotFound(String),
    #[error("`{0}` already exists")]
    AlreadyExists(String),
    #[error("`{0}` is not a folder that can hold children")]
    InvalidParent(String),
    #[error("`{0}` is not a file")]
    NotAFile(String),
    #[error("`{0}` is not a folder")]
    NotAFolder(String),
    #[error("drive root `{0}` cannot be modified this way")]
    IsRoot(String),
    #[error("`{0}` is not a valid file or folder name")]
    InvalidName(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsNode {
    pub name: String,
    pub path: NodePath,
    #[serde(flatten)]
    pub body: NodeBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeBody {
    File {
        #[serde(default)]
        content: FileContent,
    },
    Folder {
        #[serde(default)]
        children: BTreeMap<String, Rc<FsNode>>,
    },
}

impl FsNode {
    pub fn folder(path: NodePath) -> Self {
        Self {
            name: path.leaf().to_string(),
            path,
            body: NodeBody::Folder {
                children: BTreeMap::new(),
            },
        }
    }

    pub fn file(path: NodePath, content: FileContent) -> Self {
        Self {
            name: path.leaf().to_string(),
            path,
            body: NodeBody::File { content },
        }
    }

    /// Nodes are identified by their canonical path.
    pub fn id(&self) -> &NodePath {
        &self.path
    }

    pub fn kind(&self) -> FsNodeKind {
        match self.body {
            NodeBody::File { .. } => FsNodeKind::File,
            NodeBody::Folder { .. } => FsNodeKind::Folder,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.body, NodeBody::Folder { .. })
    }

    pub fn content(&self) -> Option<&FileContent> {
        match &self.body {
            NodeBody::File { content } => Some(content),
            NodeBody::Folder { .. } => None,
        }
    }

    /// Children in name order; empty for files.
    pub fn children(&self) -> impl Iterator<Item = &FsNode> {
        let children = match &self.body {
            NodeBody::Folder { children } => Some(children.values().map(|node| &**node)),
            NodeBody::File { .. } => None,
        };
        children.into_iter().flatten()
    }

    pub fn child(&self, name: &str) -> Option<&FsNode> {
        match &self.body {
            NodeBody::Folder { children } => children.get(name).map(|node| &**node),
            NodeBody::File { .. } => None,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children().map(FsNode::subtree_len).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTree {
    roots: BTreeMap<String, Rc<FsNode>>,
}

impl FileTree {
    /// Tree with a single empty system drive.
    pub fn empty() -> Self {
        let mut tree = Self::default();
        tree.ensure_system_drive();
        tree
    }

    /// Initial contents for a fresh session.
    pub fn seeded() -> Self {
        let mut tree = Self::empty();
        let root = NodePath::default();
        let seed = [
            ("Documents", "hello.txt", WELCOME_TEXT),
            ("Projects", "react-os-README.md", README_TEXT),
        ];
        for (folder, file, text) in seed {
            let seeded = tree.create_folder(&root, folder).and_then(|created| {
                tree.create_file(&created.path, file, FileContent::text(text))
            });
            if let Err(err) = seeded {
                tracing::warn!(%err, "failed to seed default file system");
            }
        }
        tree
    }

    /// Drive roots in label order.
    pub fn drives(&self) -> impl Iterator<Item = &FsNode> {
        self.roots.values().map(|node| &**node)
    }

    /// Resolves a canonical path to its node.
    pub fn resolve(&self, path: &NodePath) -> Result<&FsNode, FsError> {
        let not_found = || FsError::NotFound(path.to_string());
        let mut node: &FsNode = self.roots.get(path.drive()).ok_or_else(not_found)?;
        for segment in path.segments() {
            node = node.child(segment).ok_or_else(not_found)?;
        }
        Ok(node)
    }

    /// Parses `raw` as an absolute path and resolves it.
    pub fn resolve_str(&self, raw: &str) -> Result<&FsNode, FsError> {
        let path = NodePath::parse(raw).map_err(FsError::InvalidPath)?;
        self.resolve(&path)
    }

    /// Resolves terminal-style input (`..`, `.`, relative or drive-absolute) against `cwd`.
    pub fn resolve_from(&self, cwd: &NodePath, input: &str) -> Result<&FsNode, FsError> {
        self.resolve(&resolve_relative(cwd, input))
    }

    /// Lists the children of a folder in name order.
    pub fn list_children(&self, path: &NodePath) -> Result<Vec<&FsNode>, FsError> {
        let node = self.resolve(path)?;
        if !node.is_folder() {
            return Err(FsError::NotAFolder(path.to_string()));
        }
        Ok(node.children().collect())
    }

    pub fn create_folder(&mut self, parent: &NodePath, name: &str) -> Result<Rc<FsNode>, FsError> {
        let path = self.check_new_child(parent, name)?;
        self.insert_child(parent, Rc::new(FsNode::folder(path)))
    }

    pub fn create_file(
        &mut self,
        parent: &NodePath,
        name: &str,
        content: FileContent,
    ) -> Result<Rc<FsNode>, FsError> {
        let path = self.check_new_child(parent, name)?;
        self.insert_child(parent, Rc::new(FsNode::file(path, content)))
    }

    /// Replaces the content of an existing file.
    pub fn update_file_content(
        &mut self,
        path: &NodePath,
        content: FileContent,
    ) -> Result<(), FsError> {
        if self.resolve(path)?.is_folder() {
            return Err(FsError::NotAFile(path.to_string()));
        }
        match self.node_mut(path).map(|node| &mut node.body) {
            Some(NodeBody::File { content: current }) => {
                *current = content;
                Ok(())
            }
            _ => Err(FsError::NotFound(path.to_string())),
        }
    }

    /// Detaches `parent/name` and returns the detached subtree.
    pub fn remove_child(&mut self, parent: &NodePath, name: &str) -> Result<Rc<FsNode>, FsError> {
        let folder = self.resolve(parent)?;
        if !folder.is_folder() {
            return Err(FsError::InvalidParent(parent.to_string()));
        }
        if folder.child(name).is_none() {
            return Err(FsError::NotFound(format!("{parent}/{name}")));
        }
        self.children_mut(parent)
            .and_then(|children| children.remove(name))
            .ok_or_else(|| FsError::NotFound(format!("{parent}/{name}")))
    }

    /// Detaches the node at `path`. Drive roots cannot be removed.
    pub fn remove(&mut self, path: &NodePath) -> Result<Rc<FsNode>, FsError> {
        let parent = path
            .parent()
            .ok_or_else(|| FsError::IsRoot(path.to_string()))?;
        self.remove_child(&parent, path.leaf())
    }

    /// Attaches a previously detached subtree under `parent`, keeping the node's name.
    ///
    /// Paths inside the subtree are rewritten to match the new location.
    pub fn reattach_child(
        &mut self,
        parent: &NodePath,
        node: Rc<FsNode>,
    ) -> Result<NodePath, FsError> {
        let path = self.check_new_child(parent, &node.name)?;
        let mut node = node;
        repair_node(&mut node, path.clone());
        self.insert_child(parent, node)?;
        Ok(path)
    }

    /// Case-insensitive substring search over every node name below the drive roots.
    ///
    /// Results are in pre-order, siblings in name order. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&FsNode> {
        let needle = query.trim().to_lowercase();
        let mut hits = Vec::new();
        if needle.is_empty() {
            return hits;
        }
        for root in self.drives() {
            for child in root.children() {
                collect_matches(child, &needle, &mut hits);
            }
        }
        hits
    }

    /// Recomputes names and paths from tree position, drops entries whose keys cannot be
    /// addressed, and guarantees the system drive exists.
    pub fn repair(&mut self) {
        self.roots.retain(|label, root| {
            let keep = is_drive_label(label) && root.is_folder();
            if !keep {
                tracing::warn!(label = %label, "dropping unusable drive root");
            }
            keep
        });
        for (label, root) in self.roots.iter_mut() {
            if let Ok(path) = NodePath::drive_root(label) {
                repair_node(root, path);
            }
        }
        self.ensure_system_drive();
    }

    fn ensure_system_drive(&mut self) {
        if !self.roots.contains_key(SYSTEM_DRIVE) {
            self.roots.insert(
                SYSTEM_DRIVE.to_string(),
                Rc::new(FsNode::folder(NodePath::default())),
            );
        }
    }

    fn check_new_child(&self, parent: &NodePath, name: &str) -> Result<NodePath, FsError> {
        let folder = self.resolve(parent)?;
        if !folder.is_folder() {
            return Err(FsError::InvalidParent(parent.to_string()));
        }
        if !is_valid_node_name(name) {
            return Err(FsError::InvalidName(name.to_string()));
        }
        let path = parent
            .join(name)
            .map_err(|_| FsError::InvalidName(name.to_string()))?;
        if folder.child(name).is_some() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        Ok(path)
    }

    fn insert_child(&mut self, parent: &NodePath, node: Rc<FsNode>) -> Result<Rc<FsNode>, FsError> {
        let children = self
            .children_mut(parent)
            .ok_or_else(|| FsError::NotFound(parent.to_string()))?;
        children.insert(node.name.clone(), Rc::clone(&node));
        Ok(node)
    }

    fn children_mut(&mut self, folder: &NodePath) -> Option<&mut BTreeMap<String, Rc<FsNode>>> {
        match &mut self.node_mut(folder)?.body {
            NodeBody::Folder { children } => Some(children),
            NodeBody::File { .. } => None,
        }
    }

    fn node_mut(&mut self, path: &NodePath) -> Option<&mut FsNode> {
        let mut node = Rc::make_mut(self.roots.get_mut(path.drive())?);
        for segment in path.segments() {
            node = match &mut node.body {
                NodeBody::Folder { children } => Rc::make_mut(children.get_mut(segment)?),
                NodeBody::File { .. } => return None,
            };
        }
        Some(node)
    }
}

fn collect_matches<'a>(node: &'a FsNode, needle: &str, hits: &mut Vec<&'a FsNode>) {
    if node.name.to_lowercase().contains(needle) {
        hits.push(node);
    }
    for child in node.children() {
        collect_matches(child, needle, hits);
    }
}

fn node_is_consistent(node: &FsNode, path: &NodePath) -> bool {
    node.path == *path
        && node.name == path.leaf()
        && match &node.body {
            NodeBody::File { .. } => true,
            NodeBody::Folder { children } => children.iter().all(|(name, child)| {
                path.join(name)
                    .map(|child_path| node_is_consistent(child, &child_path))
                    .unwrap_or(false)
            }),
        }
}

fn repair_node(node: &mut Rc<FsNode>, path: NodePath) {
    if node_is_consistent(node, &path) {
        return;
    }
    let node = Rc::make_mut(node);
    node.name = path.leaf().to_string();
    if let NodeBody::Folder { children } = &mut node.body {
        children.retain(|name, _| is_valid_node_name(name));
        for (name, child) in children.iter_mut() {
            if let Ok(child_path) = path.join(name) {
                repair_node(child, child_path);
            }
        }
    }
    node.path = path;
}
