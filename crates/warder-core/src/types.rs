//! Data model shared by the classifier, assignment engine, and distributor
//! (spec §3).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classifier namespace a flavor label was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlavorNamespace {
    /// Supplied by the producer or by a scanner that extracted this file.
    External,
    Mime,
    Yara,
}

impl FlavorNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlavorNamespace::External => "external",
            FlavorNamespace::Mime => "mime",
            FlavorNamespace::Yara => "yara",
        }
    }
}

/// A file node's flavor labels, grouped by the classifier namespace that
/// produced them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Flavors {
    pub external: BTreeSet<String>,
    pub mime: BTreeSet<String>,
    pub yara: BTreeSet<String>,
}

impl Flavors {
    /// The union of every namespace — what the assignment engine matches
    /// against.
    pub fn union_all(&self) -> BTreeSet<String> {
        self.external
            .iter()
            .chain(self.mime.iter())
            .chain(self.yara.iter())
            .cloned()
            .collect()
    }
}

/// An in-memory file descriptor carried through traversal (spec §3).
#[derive(Debug, Clone)]
pub struct File {
    pub uid: String,
    /// Key suffix where the file's bytes live in the coordinator
    /// (`data:{pointer}`). Equals `root_id` for the root.
    pub pointer: String,
    pub parent: Option<String>,
    pub depth: u32,
    pub name: Option<String>,
    pub source: Option<String>,
    pub flavors: Flavors,
}

impl File {
    /// Construct the root file node of a request.
    pub fn root(root_id: &str) -> Self {
        Self {
            uid: root_id.to_string(),
            pointer: root_id.to_string(),
            parent: None,
            depth: 0,
            name: None,
            source: None,
            flavors: Flavors::default(),
        }
    }

    /// Construct a fresh child file node; `pointer` is set by the scanner
    /// that extracted it.
    pub fn child(pointer: String, name: Option<String>, source: Option<String>) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            pointer,
            parent: None,
            depth: 0,
            name,
            source,
            flavors: Flavors::default(),
        }
    }
}

/// A scanner's rule evaluated to a concrete assignment (spec §3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub priority: i32,
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Tree anchoring fields embedded in every event's `file.tree` (spec §4.5.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeAnchor {
    pub node: String,
    pub parent: Option<String>,
    pub root: String,
}

impl TreeAnchor {
    /// Anchors `file`'s node to `root_id`, special-casing the root (depth 0)
    /// and its direct children (depth 1) per spec §4.5 step 6: "this anchors
    /// the tree to the root id even when the root file was given a uid."
    pub fn for_file(root_id: &str, file: &File) -> Self {
        Self {
            node: if file.depth == 0 {
                root_id.to_string()
            } else {
                file.uid.clone()
            },
            parent: if file.depth == 1 {
                Some(root_id.to_string())
            } else {
                file.parent.clone()
            },
            root: root_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tree_anchor_tests {
    use super::*;

    #[test]
    fn root_node_anchors_to_root_id_with_no_parent() {
        let root = File::root("r1");
        let anchor = TreeAnchor::for_file("r1", &root);
        assert_eq!(anchor.node, "r1");
        assert_eq!(anchor.parent, None);
        assert_eq!(anchor.root, "r1");
    }

    #[test]
    fn depth_one_child_anchors_parent_to_root_id() {
        let mut child = File::child("ptr".to_string(), None, None);
        child.depth = 1;
        child.parent = Some("some-uid-not-root".to_string());
        let anchor = TreeAnchor::for_file("r1", &child);
        assert_eq!(anchor.node, child.uid);
        assert_eq!(anchor.parent, Some("r1".to_string()));
        assert_eq!(anchor.root, "r1");
    }

    #[test]
    fn depth_two_grandchild_anchors_parent_to_its_own_parent_uid() {
        let mut grandchild = File::child("ptr".to_string(), None, None);
        grandchild.depth = 2;
        grandchild.parent = Some("depth-one-uid".to_string());
        let anchor = TreeAnchor::for_file("r1", &grandchild);
        assert_eq!(anchor.node, grandchild.uid);
        assert_eq!(anchor.parent, Some("depth-one-uid".to_string()));
        assert_eq!(anchor.root, "r1");
    }
}

/// The `file` sub-record of an emitted event (spec §4.5.6, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub depth: u32,
    pub name: Option<String>,
    pub flavors: BTreeSet<String>,
    pub size: usize,
    pub source: Option<String>,
    pub scanners: Vec<String>,
    pub tree: TreeAnchor,
}

/// A complete event document pushed to `event:{root_id}` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub file: FileRecord,
    pub scan: BTreeMap<String, serde_json::Value>,
}

impl EventRecord {
    /// Serialize as a single JSON line, per spec §9 ("Commit to a single
    /// wire encoding: JSON text lines").
    pub fn to_json_line(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Output of a single scanner plugin invocation (spec §6).
pub type ScanOutput = serde_json::Value;

/// Opaque per-assignment config sub-map passed to a plugin (spec §6).
pub type ScannerOptions = serde_json::Map<String, serde_json::Value>;
