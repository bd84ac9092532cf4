//! # Tree Edits
//!
//! The undoable edits recorded by editor tree operations.
//!
//! ## Edit Semantics
//!
//! ### Text
//! - Replacement of a token's whole text and chosen completion
//! - Consecutive text edits of the same token merge into one
//!
//! ### StateTransition
//! - An expander moving between text and expanded states
//! - Carries detached snapshots of both states; undo and redo reconstruct them
//!
//! ### InsertItem / RemoveItem
//! - Structural list changes, carrying a snapshot of the affected item
//!
//! ### Replace
//! - Before/after snapshots of an editor around an arbitrary action
//!
//! Every edit refers to its editor through a [`VirtualEditor`], which is
//! resolved again on each replay, so edits stay valid after the editors they
//! touch have been reconstructed.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::accessor::VirtualEditor;
use crate::completion::CompletionItem;
use crate::errors::EditorError;
use crate::expander::ExpanderSnapshot;
use crate::snapshot::Snapshot;
use crate::tree::{EditorTree, Value};
use crate::undo_stack::Edit;

/// Undoable edits of an editor tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeEdit {
    /// The text of a token changed
    Text {
        editor: VirtualEditor,
        old: String,
        new: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_completion: Option<CompletionItem>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_completion: Option<CompletionItem>,
    },

    /// An expander changed its state
    StateTransition {
        expander: VirtualEditor,
        before: ExpanderSnapshot,
        after: ExpanderSnapshot,
        description: String,
    },

    /// An item was inserted into a list
    InsertItem {
        list: VirtualEditor,
        index: usize,
        item: Snapshot,
    },

    /// An item was removed from a list
    RemoveItem {
        list: VirtualEditor,
        index: usize,
        item: Snapshot,
    },

    /// An editor was changed by an arbitrary action
    Replace {
        editor: VirtualEditor,
        before: Snapshot,
        after: Snapshot,
        description: String,
    },
}

impl TreeEdit {
    fn insert<V: Value>(
        tree: &mut EditorTree<V>,
        list: &VirtualEditor,
        index: usize,
        item: &Snapshot,
    ) -> Result<(), EditorError> {
        let list = tree.resolve(list)?;
        let context = tree.context(list)?.clone();
        let item = tree.reconstruct(item, &context)?;
        tree.insert_item_raw(list, index, item)
    }

    fn remove<V: Value>(
        tree: &mut EditorTree<V>,
        list: &VirtualEditor,
        index: usize,
    ) -> Result<(), EditorError> {
        let list = tree.resolve(list)?;
        tree.remove_item_raw(list, index)
    }
}

impl<V: Value> Edit<EditorTree<V>> for TreeEdit {
    fn description(&self) -> &str {
        match self {
            TreeEdit::Text { .. } => "Editing",
            TreeEdit::StateTransition { description, .. } => description.as_str(),
            TreeEdit::InsertItem { .. } => "Add item",
            TreeEdit::RemoveItem { .. } => "Remove item",
            TreeEdit::Replace { description, .. } => description.as_str(),
        }
    }

    fn undo(&self, tree: &mut EditorTree<V>) -> Result<(), EditorError> {
        match self {
            TreeEdit::Text {
                editor,
                old,
                old_completion,
                ..
            } => {
                let id = tree.resolve(editor)?;
                tree.set_token_state(id, old, old_completion.clone(), false)
            }
            TreeEdit::StateTransition {
                expander, before, ..
            } => {
                let id = tree.resolve(expander)?;
                tree.reconstruct_state(id, before)
            }
            TreeEdit::InsertItem { list, index, .. } => Self::remove(tree, list, *index),
            TreeEdit::RemoveItem { list, index, item } => Self::insert(tree, list, *index, item),
            TreeEdit::Replace { editor, before, .. } => {
                let id = tree.resolve(editor)?;
                tree.reconstruct_into(id, before)
            }
        }
    }

    fn redo(&self, tree: &mut EditorTree<V>) -> Result<(), EditorError> {
        match self {
            TreeEdit::Text {
                editor,
                new,
                new_completion,
                ..
            } => {
                let id = tree.resolve(editor)?;
                tree.set_token_state(id, new, new_completion.clone(), false)
            }
            TreeEdit::StateTransition {
                expander, after, ..
            } => {
                let id = tree.resolve(expander)?;
                tree.reconstruct_state(id, after)
            }
            TreeEdit::InsertItem { list, index, item } => Self::insert(tree, list, *index, item),
            TreeEdit::RemoveItem { list, index, .. } => Self::remove(tree, list, *index),
            TreeEdit::Replace { editor, after, .. } => {
                let id = tree.resolve(editor)?;
                tree.reconstruct_into(id, after)
            }
        }
    }

    fn merge_with(&self, other: &dyn Edit<EditorTree<V>>) -> Option<Box<dyn Edit<EditorTree<V>>>> {
        match (self, other.as_any().downcast_ref::<TreeEdit>()?) {
            (
                TreeEdit::Text {
                    editor,
                    old,
                    old_completion,
                    ..
                },
                TreeEdit::Text {
                    editor: next,
                    new,
                    new_completion,
                    ..
                },
            ) if editor == next => Some(Box::new(TreeEdit::Text {
                editor: editor.clone(),
                old: old.clone(),
                new: new.clone(),
                old_completion: old_completion.clone(),
                new_completion: new_completion.clone(),
            })),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
