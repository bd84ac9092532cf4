//! List editors
//!
//! A list holds any number of items of one element class. Adding and removing
//! items is undoable; the recorded edits carry a snapshot of the item so it can
//! be reconstructed on redo (or undo of a removal).

use std::rc::Rc;

use hextant_common::CompileResult;
use tracing::debug;

use crate::context::Context;
use crate::edits::TreeEdit;
use crate::errors::EditorError;
use crate::registry::EditorClass;
use crate::tree::{EditorId, EditorTree, NodeKind, Value};

pub trait ListKind<V: Value> {
    /// Stable class name
    fn name(&self) -> &str;

    /// Class of new items
    fn element(&self) -> EditorClass<V>;

    /// Combine the values of all items; may report a local error
    fn compose(&self, values: Vec<V>) -> CompileResult<V>;

    /// Typing this character at the end of an item's expander opens a new item.
    ///
    /// `None` uses the separator of the [`Settings`](crate::Settings) in the context.
    fn separator(&self) -> Option<char> {
        None
    }
}

impl<V: Value> EditorTree<V> {
    pub fn new_list(&mut self, kind: Rc<dyn ListKind<V>>, context: &Context) -> EditorId {
        self.insert(
            context.clone(),
            NodeKind::List {
                kind,
                items: Vec::new(),
            },
        )
    }

    pub fn items(&self, list: EditorId) -> Result<&[EditorId], EditorError> {
        match &self.node(list)?.kind {
            NodeKind::List { items, .. } => Ok(items),
            _ => Err(self.wrong_kind(list, "list")),
        }
    }

    fn list_kind(&self, list: EditorId) -> Result<Rc<dyn ListKind<V>>, EditorError> {
        match &self.node(list)?.kind {
            NodeKind::List { kind, .. } => Ok(kind.clone()),
            _ => Err(self.wrong_kind(list, "list")),
        }
    }

    fn check_index(&self, list: EditorId, index: usize, inclusive: bool) -> Result<(), EditorError> {
        let len = self.items(list)?.len();
        let valid = if inclusive { index <= len } else { index < len };
        if !valid {
            return Err(EditorError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    /// Insert a fresh element at `index`
    pub fn add_item(&mut self, list: EditorId, index: usize) -> Result<EditorId, EditorError> {
        self.check_index(list, index, true)?;
        let element = self.list_kind(list)?.element();
        let context = self.node(list)?.context.clone();
        let item = self.create(&element, &context);
        self.insert_item(list, index, item)
    }

    /// Insert the root editor `editor` at `index`.
    ///
    /// The editor is moved into the list's context if needed; the inserted
    /// item is returned.
    pub fn insert_item(
        &mut self,
        list: EditorId,
        index: usize,
        editor: EditorId,
    ) -> Result<EditorId, EditorError> {
        self.check_index(list, index, true)?;
        if self.node(editor)?.parent.is_some() {
            return Err(EditorError::AlreadyAttached(editor));
        }
        let context = self.node(list)?.context.clone();
        let item = self.move_to(editor, &context)?;
        self.insert_item_raw(list, index, item)?;

        self.record_edit(list, |tree| {
            Ok(TreeEdit::InsertItem {
                list: tree.virtualize(list)?,
                index,
                item: tree.snapshot(item)?,
            })
        })?;
        Ok(item)
    }

    /// Remove and discard the item at `index`
    pub fn remove_item(&mut self, list: EditorId, index: usize) -> Result<(), EditorError> {
        self.check_index(list, index, false)?;
        let item = self.items(list)?[index];
        let recorded = match self.undo_manager(list)? {
            Some(undo) if undo.is_active() => Some((self.virtualize(list)?, self.snapshot(item)?)),
            _ => None,
        };

        self.remove_item_raw(list, index)?;

        if let Some((virtual_list, snapshot)) = recorded {
            self.record_edit(list, |_| {
                Ok(TreeEdit::RemoveItem {
                    list: virtual_list,
                    index,
                    item: snapshot,
                })
            })?;
        }
        Ok(())
    }

    pub(crate) fn insert_item_raw(
        &mut self,
        list: EditorId,
        index: usize,
        item: EditorId,
    ) -> Result<(), EditorError> {
        self.check_index(list, index, true)?;
        if let NodeKind::List { items, .. } = &mut self.node_mut(list)?.kind {
            items.insert(index, item);
        }
        self.set_parent(item, Some(list))?;
        debug!(list = %list, index, item = %item, "Item added");

        self.refresh(list)?;
        self.notify_views(list, |view| view.item_added(index, item));
        Ok(())
    }

    pub(crate) fn remove_item_raw(&mut self, list: EditorId, index: usize) -> Result<(), EditorError> {
        self.check_index(list, index, false)?;
        let item = self.items(list)?[index];
        if let NodeKind::List { items, .. } = &mut self.node_mut(list)?.kind {
            items.remove(index);
        }
        debug!(list = %list, index, item = %item, "Item removed");
        self.discard(item);

        self.refresh(list)?;
        self.notify_views(list, |view| view.item_removed(index));
        Ok(())
    }

    /// Remove all items without recording
    pub(crate) fn clear_items_raw(&mut self, list: EditorId) -> Result<(), EditorError> {
        while !self.items(list)?.is_empty() {
            let last = self.items(list)?.len() - 1;
            self.remove_item_raw(list, last)?;
        }
        Ok(())
    }
}
