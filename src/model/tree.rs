//! Resource trees and the sources the walker fetches components from.
//!
//! Components are stored flat and referenced by [`NodeId`]; a node lists its
//! children as ids rather than embedding them. The walker asks a
//! [`NodeSource`] for each child only when it reaches it, so a host can back
//! the source with lazy loading.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::decode_text;

use super::record::RecordNode;
use super::resource::Resource;

/// Identifier of a component within a resource tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Supplies the resource and its components to the exporter.
pub trait NodeSource {
    /// The root resource.
    fn resource(&self) -> &Resource;

    /// Fetch one component by id.
    fn component(&self, id: NodeId) -> Result<Cow<'_, RecordNode>>;
}

/// A fully resolved resource snapshot held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTree {
    pub resource: Resource,
    /// Components keyed by id.
    #[serde(default)]
    pub components: HashMap<NodeId, RecordNode>,
    #[serde(skip)]
    next_id: u32,
}

impl ResourceTree {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            components: HashMap::new(),
            next_id: 0,
        }
    }

    /// Add a component under `parent` (or under the resource when `None`).
    ///
    /// Returns the new component's id, or [`Error::MissingComponent`] when
    /// `parent` is not in the tree.
    pub fn add_component(&mut self, parent: Option<NodeId>, node: RecordNode) -> Result<NodeId> {
        if let Some(p) = parent.filter(|p| !self.components.contains_key(p)) {
            return Err(Error::MissingComponent(p.0));
        }
        if self.next_id == 0 {
            self.next_id = self.components.keys().map(|k| k.0).max().unwrap_or(0) + 1;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.components.insert(id, node);
        let siblings = match parent.and_then(|p| self.components.get_mut(&p)) {
            Some(parent) => &mut parent.children,
            None => &mut self.resource.record.children,
        };
        siblings.push(id);
        Ok(id)
    }

    /// Parse a snapshot from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let text = decode_text(bytes);
        Ok(serde_json::from_str(&text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }

    /// Number of components reachable from the resource.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl NodeSource for ResourceTree {
    fn resource(&self) -> &Resource {
        &self.resource
    }

    fn component(&self, id: NodeId) -> Result<Cow<'_, RecordNode>> {
        self.components
            .get(&id)
            .map(Cow::Borrowed)
            .ok_or(Error::MissingComponent(id.0))
    }
}

/// Resource snapshots keyed by resource id.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    trees: HashMap<u64, ResourceTree>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tree: ResourceTree) {
        self.trees.insert(tree.resource.id, tree);
    }

    /// Look up a resource tree, failing with [`Error::NotFound`].
    pub fn get(&self, id: u64) -> Result<&ResourceTree> {
        self.trees.get(&id).ok_or(Error::NotFound(id))
    }

    /// Parse either a single tree or a JSON array of trees.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let text = decode_text(bytes);
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let trees: Vec<ResourceTree> = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)?,
            other => vec![serde_json::from_value(other)?],
        };
        let mut store = Self::new();
        for tree in trees {
            store.insert(tree);
        }
        Ok(store)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.trees.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_component_links_children() {
        let mut tree = ResourceTree::new(Resource::new("Smith Papers"));
        let series = tree.add_component(None, RecordNode::new("Series 1")).unwrap();
        let file = tree.add_component(Some(series), RecordNode::new("File A")).unwrap();

        assert_eq!(tree.resource.record.children, vec![series]);
        assert_eq!(tree.component(series).unwrap().children, vec![file]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_add_component_unknown_parent() {
        let mut tree = ResourceTree::new(Resource::new("Smith Papers"));
        tree.add_component(None, RecordNode::new("Series 1")).unwrap();
        assert!(matches!(
            tree.add_component(Some(NodeId(77)), RecordNode::new("Orphan")),
            Err(Error::MissingComponent(77))
        ));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.resource.record.children.len(), 1);
    }

    #[test]
    fn test_missing_component() {
        let tree = ResourceTree::new(Resource::new("Empty"));
        assert!(matches!(
            tree.component(NodeId(9)),
            Err(Error::MissingComponent(9))
        ));
    }

    #[test]
    fn test_store_not_found() {
        let mut store = ResourceStore::new();
        let mut resource = Resource::new("A");
        resource.id = 4;
        store.insert(ResourceTree::new(resource));
        assert!(store.get(4).is_ok());
        assert!(matches!(store.get(5), Err(Error::NotFound(5))));
    }

    #[test]
    fn test_tree_json_uses_string_keys() {
        let json = br#"{
            "resource": {"id": 1, "title": "Papers", "children": [1]},
            "components": {"1": {"title": "Folder 1"}}
        }"#;
        let tree = ResourceTree::from_json(json).unwrap();
        assert_eq!(
            tree.component(NodeId(1)).unwrap().title.as_deref(),
            Some("Folder 1")
        );
    }
}
