use std::collections::HashSet;

use indextree::{Arena, NodeId};

use crate::error::TreeError;
use crate::parser::types::{FieldValue, NodeData};

/// Arena-backed syntax tree.
///
/// Parent links in the arena mirror field ownership: a node placed in a
/// field of `owner` becomes a child of `owner`. That keeps the field graph
/// acyclic and every node reachable through a single slot.
pub struct SyntaxTree {
    arena: Arena<NodeData>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Add a detached node. The first node added becomes the root.
    pub fn add_node(&mut self, data: NodeData) -> NodeId {
        let node_id = self.arena.new_node(data);
        if self.root.is_none() {
            self.root = Some(node_id);
        }
        node_id
    }

    pub fn set_root(&mut self, node_id: NodeId) -> Result<(), TreeError> {
        self.check_exists(node_id)?;
        if let Some(parent) = self.parent_of(node_id) {
            return Err(TreeError::AlreadyAttached {
                child: node_id,
                parent,
            });
        }
        self.root = Some(node_id);
        Ok(())
    }

    /// Set `name` on `owner`, replacing an existing field of the same name in
    /// place. Nodes referenced by `value` are attached under `owner`.
    pub fn set_field(
        &mut self,
        owner: NodeId,
        name: impl Into<String>,
        value: FieldValue,
    ) -> Result<(), TreeError> {
        self.check_exists(owner)?;
        let name = name.into();

        // Nodes held by the field being replaced may be reused by the new value.
        let previous: HashSet<NodeId> = self
            .get_node(owner)
            .and_then(|data| data.field(&name))
            .map(|old| old.node_ids().into_iter().collect())
            .unwrap_or_default();

        let children = value.node_ids();
        let mut seen = HashSet::with_capacity(children.len());
        for &child in &children {
            if !seen.insert(child) {
                return Err(TreeError::AlreadyAttached {
                    child,
                    parent: owner,
                });
            }
            if !previous.contains(&child) {
                self.check_attachable(owner, child)?;
            }
        }

        for old in &previous {
            old.detach(&mut self.arena);
        }
        for child in children {
            owner.append(child, &mut self.arena);
        }

        let data = self
            .arena
            .get_mut(owner)
            .map(|n| n.get_mut())
            .ok_or(TreeError::UnknownNode(owner))?;
        match data.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => data.fields.push((name, value)),
        }
        Ok(())
    }

    fn check_exists(&self, node_id: NodeId) -> Result<(), TreeError> {
        match self.arena.get(node_id) {
            Some(node) if !node.is_removed() => Ok(()),
            _ => Err(TreeError::UnknownNode(node_id)),
        }
    }

    fn parent_of(&self, node_id: NodeId) -> Option<NodeId> {
        self.arena.get(node_id).and_then(|n| n.parent())
    }

    fn check_attachable(&self, owner: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_exists(child)?;
        if Some(child) == self.root {
            return Err(TreeError::RootAttach(child));
        }
        if let Some(parent) = self.parent_of(child) {
            return Err(TreeError::AlreadyAttached { child, parent });
        }
        // `ancestors` yields the owner itself first.
        if owner.ancestors(&self.arena).any(|ancestor| ancestor == child) {
            return Err(TreeError::Cycle { child, owner });
        }
        Ok(())
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&NodeData> {
        self.arena
            .get(node_id)
            .filter(|n| !n.is_removed())
            .map(|n| n.get())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Nodes reachable from the root, root included.
    pub fn reachable_count(&self) -> usize {
        self.root
            .map(|root| root.descendants(&self.arena).count())
            .unwrap_or(0)
    }
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}
