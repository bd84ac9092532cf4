//! Accessors and virtual editors
//!
//! Undo and redo may replace an editor by a reconstructed copy, which has a new
//! [`EditorId`]. Recorded edits therefore refer to editors by a
//! [`VirtualEditor`]: a root handle plus the path of accessors leading from it
//! to the editor. The path is resolved again every time the edit is replayed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::EditorError;
use crate::expander::ExpanderState;
use crate::tree::{EditorId, EditorTree, NodeKind, Value};

/// Position of an editor relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessor {
    /// Content of an expanded expander
    ExpanderContent,

    /// Component of a compound editor
    Component(usize),

    /// Item of a list editor
    Item(usize),
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::ExpanderContent => write!(f, "content"),
            Accessor::Component(index) => write!(f, "component[{}]", index),
            Accessor::Item(index) => write!(f, "item[{}]", index),
        }
    }
}

/// A resolvable reference to an editor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualEditor {
    pub root: EditorId,
    pub path: Vec<Accessor>,
}

impl<V: Value> EditorTree<V> {
    /// The editor reached from `id` through `accessor`
    pub fn sub_editor(&self, id: EditorId, accessor: Accessor) -> Result<EditorId, EditorError> {
        let child = match (&self.node(id)?.kind, accessor) {
            (NodeKind::Expander(expander), Accessor::ExpanderContent) => match expander.state {
                ExpanderState::Expanded(content) => Some(content),
                ExpanderState::Text { .. } => None,
            },
            (NodeKind::Compound { components, .. }, Accessor::Component(index)) => {
                components.get(index).copied()
            }
            (NodeKind::List { items, .. }, Accessor::Item(index)) => items.get(index).copied(),
            _ => None,
        };
        child.ok_or(EditorError::InvalidAccessor { id, accessor })
    }

    /// The parent of `id` and the accessor leading from it to `id`
    pub fn accessor_of(&self, id: EditorId) -> Result<Option<(EditorId, Accessor)>, EditorError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        let accessor = match &self.node(parent)?.kind {
            NodeKind::Expander(_) => Some(Accessor::ExpanderContent),
            NodeKind::Compound { components, .. } => components
                .iter()
                .position(|component| *component == id)
                .map(Accessor::Component),
            NodeKind::List { items, .. } => {
                items.iter().position(|item| *item == id).map(Accessor::Item)
            }
            NodeKind::Token(_) => None,
        };
        Ok(accessor.map(|accessor| (parent, accessor)))
    }

    /// A reference to `id` that survives reconstruction of `id` or its ancestors
    pub fn virtualize(&self, id: EditorId) -> Result<VirtualEditor, EditorError> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some((parent, accessor)) = self.accessor_of(current)? {
            path.push(accessor);
            current = parent;
        }
        path.reverse();
        Ok(VirtualEditor {
            root: current,
            path,
        })
    }

    pub fn resolve(&self, editor: &VirtualEditor) -> Result<EditorId, EditorError> {
        editor
            .path
            .iter()
            .try_fold(editor.root, |id, accessor| self.sub_editor(id, *accessor))
    }
}
