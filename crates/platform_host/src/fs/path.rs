//! Drive-rooted virtual path algebra shared by the file tree and host adapters.
//!
//! Canonical paths look like `C:` or `C:/Documents/hello.txt`: a drive label followed by
//! `/`-separated segments, no trailing slash, and no `.`/`..` segments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';
/// Drive label of the system drive.
pub const SYSTEM_DRIVE: &str = "C:";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Canonical absolute path of a node in the virtual file system.
pub struct NodePath(String);

impl NodePath {
    /// Parses and canonicalizes `raw`.
    ///
    /// Whitespace is trimmed, `\` is accepted as a separator and empty segments are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the first segment is not a drive label or when a segment is `.`/`..`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized = raw.trim().replace('\\', "/");
        let mut segments = normalized.split(PATH_SEPARATOR).filter(|s| !s.is_empty());
        let drive = segments.next().ok_or_else(|| "empty path".to_string())?;
        if !is_drive_label(drive) {
            return Err(format!("path `{raw}` does not start with a drive label"));
        }

        let mut out = drive.to_string();
        for segment in segments {
            if !is_valid_node_name(segment) {
                return Err(format!("path `{raw}` contains invalid segment `{segment}`"));
            }
            out.push(PATH_SEPARATOR);
            out.push_str(segment);
        }
        Ok(Self(out))
    }

    /// Returns the root path for a drive label such as `C:`.
    ///
    /// # Errors
    ///
    /// Returns an error when `label` is not a drive label.
    pub fn drive_root(label: &str) -> Result<Self, String> {
        if is_drive_label(label) {
            Ok(Self(label.to_string()))
        } else {
            Err(format!("`{label}` is not a drive label"))
        }
    }

    /// Returns the string form of the path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the drive label (first segment).
    pub fn drive(&self) -> &str {
        self.0
            .split_once(PATH_SEPARATOR)
            .map(|(drive, _)| drive)
            .unwrap_or(&self.0)
    }

    /// Iterates the segments below the drive label.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR).skip(1)
    }

    /// Returns `true` for a drive root.
    pub fn is_root(&self) -> bool {
        !self.0.contains(PATH_SEPARATOR)
    }

    /// Returns the parent path, or `None` for a drive root.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rfind(PATH_SEPARATOR)
            .map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Returns the leaf name. For a drive root this is the drive label.
    pub fn leaf(&self) -> &str {
        self.0
            .rsplit_once(PATH_SEPARATOR)
            .map(|(_, leaf)| leaf)
            .unwrap_or(&self.0)
    }

    /// Appends a child name.
    ///
    /// # Errors
    ///
    /// Returns an error when `name` is not a valid node name.
    pub fn join(&self, name: &str) -> Result<Self, String> {
        if !is_valid_node_name(name) {
            return Err(format!("invalid node name `{name}`"));
        }
        Ok(Self(format!("{}{PATH_SEPARATOR}{name}", self.0)))
    }

}

impl Default for NodePath {
    /// The system drive root.
    fn default() -> Self {
        Self(SYSTEM_DRIVE.to_string())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodePath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NodePath> for String {
    fn from(value: NodePath) -> Self {
        value.0
    }
}

/// Returns `true` when `segment` is a drive label (`C:`, `D:` ...).
pub fn is_drive_label(segment: &str) -> bool {
    let Some(label) = segment.strip_suffix(':') else {
        return false;
    };
    !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Returns `true` when `name` may be used as a file or folder name.
///
/// `:` is reserved for drive labels, so a relative segment can never be mistaken for a drive.
pub fn is_valid_node_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(PATH_SEPARATOR)
        && !name.contains('\\')
        && !name.contains(':')
}

/// Resolves terminal-style input against a working directory.
///
/// Input whose first segment is a drive label is absolute; anything else is appended to `cwd`.
/// `.` segments are dropped and `..` pops one segment without ever popping the drive label.
pub fn resolve_relative(cwd: &NodePath, input: &str) -> NodePath {
    let normalized = input.trim().replace('\\', "/");
    let mut parts = normalized
        .split(PATH_SEPARATOR)
        .filter(|s| !s.trim().is_empty())
        .peekable();

    let mut stack: Vec<String> = match parts.peek() {
        Some(first) if is_drive_label(first) => {
            let drive = (*first).to_string();
            parts.next();
            vec![drive]
        }
        _ => cwd.0.split(PATH_SEPARATOR).map(str::to_string).collect(),
    };

    for part in parts {
        match part {
            "." => {}
            ".." => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            other => stack.push(other.to_string()),
        }
    }

    NodePath(stack.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> NodePath {
        NodePath::parse(raw).expect("valid path")
    }

    #[test]
    fn parse_canonicalizes_separators_and_whitespace() {
        let cases = [
            ("C:", "C:"),
            ("  C:/Docs  ", "C:/Docs"),
            ("C:/Docs/", "C:/Docs"),
            ("C://Docs//a.txt", "C:/Docs/a.txt"),
            ("C:\\Docs\\a.txt", "C:/Docs/a.txt"),
        ];

        for (input, expected) in cases {
            assert_eq!(path(input).as_str(), expected, "input={input:?}");
        }
    }

    #[test]
    fn parse_rejects_missing_drive_and_dot_segments() {
        assert!(NodePath::parse("").is_err());
        assert!(NodePath::parse("Docs/a.txt").is_err());
        assert!(NodePath::parse("C:/Docs/../a.txt").is_err());
        assert!(NodePath::parse("C:/./a.txt").is_err());
    }

    #[test]
    fn parent_leaf_and_root_queries() {
        let file = path("C:/Docs/a.txt");
        assert_eq!(file.leaf(), "a.txt");
        assert_eq!(file.parent(), Some(path("C:/Docs")));
        assert_eq!(file.drive(), "C:");
        assert_eq!(file.segments().collect::<Vec<_>>(), vec!["Docs", "a.txt"]);

        let root = path("C:");
        assert_eq!(root, NodePath::default());
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(root.leaf(), "C:");
        assert_eq!(root.segments().count(), 0);
    }

    #[test]
    fn join_validates_names() {
        let root = path("C:");
        assert_eq!(root.join("Docs").expect("join").as_str(), "C:/Docs");
        assert!(root.join("").is_err());
        assert!(root.join("a/b").is_err());
        assert!(root.join("..").is_err());
    }

    #[test]
    fn colons_are_reserved_for_drive_labels() {
        assert!(!is_valid_node_name("notes:"));
        assert!(!is_valid_node_name("C:"));
        assert!(is_valid_node_name("notes.txt"));
        assert!(path("C:").join("notes:").is_err());
        assert!(NodePath::parse("C:/notes:/a.txt").is_err());
        assert_eq!(
            resolve_relative(&path("C:/Documents"), "notes:").as_str(),
            "notes:"
        );
    }

    #[test]
    fn resolve_relative_matches_terminal_semantics() {
        let cwd = path("C:/Documents");
        let cases = [
            ("", "C:/Documents"),
            ("notes", "C:/Documents/notes"),
            ("./notes/../todo.txt", "C:/Documents/todo.txt"),
            ("..", "C:"),
            ("../../..", "C:"),
            ("C:/Projects", "C:/Projects"),
            ("D:\\Games", "D:/Games"),
        ];

        for (input, expected) in cases {
            assert_eq!(resolve_relative(&cwd, input).as_str(), expected, "input={input:?}");
        }
    }

    #[test]
    fn serde_round_trips_through_string_and_rejects_invalid() {
        let value = serde_json::to_value(path("C:/Docs")).expect("serialize");
        assert_eq!(value, serde_json::json!("C:/Docs"));
        let decoded: NodePath = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, path("C:/Docs"));
        assert!(serde_json::from_str::<NodePath>("\"Docs\"").is_err());
    }
}
