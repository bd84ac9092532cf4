//! # Undo/Redo Manager
//!
//! Tracks edit history and enables undo/redo operations.
//!
//! ## Design
//!
//! - Each user action records an [`Edit`] that knows how to undo and redo itself
//! - Undo replays the edit backwards and moves it to the redo stack
//! - Redo replays it forwards and moves it back
//! - New edits clear the redo stack
//! - Consecutive edits may merge (e.g. keystrokes into one text edit)
//! - Compound edits group several edits into one undo step
//! - While inactive (e.g. during replay) recording is a no-op
//!
//! The manager lives in a [`Context`](crate::Context) and is shared by every
//! editor below it, so all methods take `&self`. It is single-threaded: all
//! edits are recorded on the editing thread.
//!
//! ## Example
//!
//! ```rust,ignore
//! let undo = context.require::<TreeUndo<Expr>>()?;
//!
//! tree.set_text(token, "4")?;
//! tree.set_text(token, "42")?;
//!
//! // Both keystrokes were merged into one edit
//! assert_eq!(undo.undo_text().as_deref(), Some("Undo Editing"));
//! undo.undo(&mut tree)?;
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;

use tracing::{debug, warn};

use crate::errors::EditorError;

/// An undoable action on a target of type `T`
pub trait Edit<T>: fmt::Debug {
    /// Human readable description, e.g. "Type"
    fn description(&self) -> &str;

    fn undo(&self, target: &mut T) -> Result<(), EditorError>;

    fn redo(&self, target: &mut T) -> Result<(), EditorError>;

    /// Merge `other`, which happened directly after this edit, into one edit
    fn merge_with(&self, _other: &dyn Edit<T>) -> Option<Box<dyn Edit<T>>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// A group of edits that are undone/redone together
pub struct CompoundEdit<T> {
    description: String,

    /// The edits in this group (in application order)
    edits: Vec<Box<dyn Edit<T>>>,
}

impl<T> CompoundEdit<T> {
    pub fn new(description: impl Into<String>, edits: Vec<Box<dyn Edit<T>>>) -> Self {
        Self {
            description: description.into(),
            edits,
        }
    }

    pub fn edits(&self) -> &[Box<dyn Edit<T>>] {
        &self.edits
    }
}

impl<T: 'static> Edit<T> for CompoundEdit<T> {
    fn description(&self) -> &str {
        &self.description
    }

    fn undo(&self, target: &mut T) -> Result<(), EditorError> {
        for edit in self.edits.iter().rev() {
            edit.undo(target)?;
        }
        Ok(())
    }

    fn redo(&self, target: &mut T) -> Result<(), EditorError> {
        for edit in &self.edits {
            edit.redo(target)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T> fmt::Debug for CompoundEdit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundEdit")
            .field("description", &self.description)
            .field("edits", &self.edits)
            .finish()
    }
}

/// Undo/redo history for edits on a target of type `T`
pub struct UndoManager<T> {
    /// Stack of applied edits (most recent last)
    undo_stack: RefCell<Vec<Box<dyn Edit<T>>>>,

    /// Stack of undone edits (most recent last)
    redo_stack: RefCell<Vec<Box<dyn Edit<T>>>>,

    /// Edits collected by the open compound edit
    compound: RefCell<Option<Vec<Box<dyn Edit<T>>>>>,

    active: Cell<bool>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl<T: 'static> UndoManager<T> {
    /// Create an undo manager with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo manager with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: RefCell::new(Vec::new()),
            redo_stack: RefCell::new(Vec::new()),
            compound: RefCell::new(None),
            active: Cell::new(true),
            max_levels,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Record an edit that has already been applied.
    ///
    /// No-op while the manager is inactive.
    pub fn record(&self, edit: Box<dyn Edit<T>>) {
        if !self.is_active() {
            return;
        }

        // New action invalidates future
        self.redo_stack.borrow_mut().clear();

        let mut compound = self.compound.borrow_mut();
        if let Some(buffer) = compound.as_mut() {
            push_merged(buffer, edit);
            return;
        }
        drop(compound);

        self.push_undo(edit);
    }

    /// Push to the undo stack, merging with the top and trimming old levels
    fn push_undo(&self, edit: Box<dyn Edit<T>>) {
        let mut stack = self.undo_stack.borrow_mut();
        push_merged(&mut stack, edit);

        if self.max_levels > 0 && stack.len() > self.max_levels {
            stack.remove(0);
        }
    }

    /// Undo the most recent edit.
    ///
    /// Returns `Ok(false)` if there is nothing to undo. If replaying fails the
    /// edit is dropped from the history and the error returned.
    ///
    /// # Panics
    ///
    /// Panics while a compound edit is open.
    pub fn undo(&self, target: &mut T) -> Result<bool, EditorError> {
        self.assert_no_compound("undo");
        let edit = self.undo_stack.borrow_mut().pop();
        let Some(edit) = edit else {
            return Ok(false); // Nothing to undo
        };

        debug!(description = edit.description(), "Undo");
        match self.without_undo(|| edit.undo(target)) {
            Ok(()) => {
                self.redo_stack.borrow_mut().push(edit);
                Ok(true)
            }
            Err(error) => {
                warn!(description = edit.description(), error = %error, "Undo failed - dropping edit");
                Err(error)
            }
        }
    }

    /// Redo the most recently undone edit.
    ///
    /// Returns `Ok(false)` if there is nothing to redo.
    ///
    /// # Panics
    ///
    /// Panics while a compound edit is open.
    pub fn redo(&self, target: &mut T) -> Result<bool, EditorError> {
        self.assert_no_compound("redo");
        let edit = self.redo_stack.borrow_mut().pop();
        let Some(edit) = edit else {
            return Ok(false); // Nothing to redo
        };

        debug!(description = edit.description(), "Redo");
        match self.without_undo(|| edit.redo(target)) {
            Ok(()) => {
                self.undo_stack.borrow_mut().push(edit);
                Ok(true)
            }
            Err(error) => {
                warn!(description = edit.description(), error = %error, "Redo failed - dropping edit");
                Err(error)
            }
        }
    }

    fn assert_no_compound(&self, operation: &str) {
        assert!(
            self.compound.borrow().is_none(),
            "cannot {} while a compound edit is open",
            operation
        );
    }

    /// Start collecting edits into one compound edit.
    ///
    /// # Panics
    ///
    /// Panics if a compound edit is already open.
    pub fn begin_compound_edit(&self) {
        let mut compound = self.compound.borrow_mut();
        assert!(compound.is_none(), "a compound edit is already open");
        *compound = Some(Vec::new());
    }

    /// Commit the open compound edit under `description`.
    ///
    /// No collected edit records nothing, a single one is recorded as if it had
    /// never been grouped.
    ///
    /// # Panics
    ///
    /// Panics without a matching [`UndoManager::begin_compound_edit`].
    pub fn finish_compound_edit(&self, description: impl Into<String>) {
        let edits = self.compound.borrow_mut().take();
        let Some(mut edits) = edits else {
            panic!("finish_compound_edit called without begin_compound_edit");
        };

        let description = description.into();
        match edits.len() {
            0 => {}
            1 => {
                if let Some(edit) = edits.pop() {
                    self.push_undo(edit);
                }
            }
            count => {
                debug!(description = %description, edits = count, "Committing compound edit");
                self.push_undo(Box::new(CompoundEdit::new(description, edits)));
            }
        }
    }

    pub fn is_compound_open(&self) -> bool {
        self.compound.borrow().is_some()
    }

    /// Run `action` as one compound edit, joining an already open one
    pub fn compound<R>(&self, description: impl Into<String>, action: impl FnOnce() -> R) -> R {
        if !self.is_active() || self.is_compound_open() {
            return action();
        }
        self.begin_compound_edit();
        let value = action();
        self.finish_compound_edit(description);
        value
    }

    /// Deactivate recording until the returned guard is dropped
    pub fn deactivate(&self) -> Deactivation<'_> {
        Deactivation {
            active: &self.active,
            previous: self.active.replace(false),
        }
    }

    /// Run `action` without recording any edits
    pub fn without_undo<R>(&self, action: impl FnOnce() -> R) -> R {
        let _guard = self.deactivate();
        action()
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.borrow().is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.borrow().is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.borrow().len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.borrow().len()
    }

    /// Label for the next undo, e.g. "Undo Type"
    pub fn undo_text(&self) -> Option<String> {
        self.undo_stack
            .borrow()
            .last()
            .map(|edit| format!("Undo {}", edit.description()))
    }

    /// Label for the next redo, e.g. "Redo Type"
    pub fn redo_text(&self) -> Option<String> {
        self.redo_stack
            .borrow()
            .last()
            .map(|edit| format!("Redo {}", edit.description()))
    }

    /// Clear all undo/redo history
    pub fn clear(&self) {
        self.undo_stack.borrow_mut().clear();
        self.redo_stack.borrow_mut().clear();
        *self.compound.borrow_mut() = None;
    }
}

impl<T: 'static> Default for UndoManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for UndoManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoManager")
            .field("undo_stack", &self.undo_stack.borrow())
            .field("redo_stack", &self.redo_stack.borrow())
            .field("compound_open", &self.compound.borrow().is_some())
            .field("active", &self.active.get())
            .field("max_levels", &self.max_levels)
            .finish()
    }
}

fn push_merged<T>(stack: &mut Vec<Box<dyn Edit<T>>>, edit: Box<dyn Edit<T>>) {
    let merged = stack.last().and_then(|top| top.merge_with(edit.as_ref()));
    match merged {
        Some(merged) => {
            stack.pop();
            stack.push(merged);
        }
        None => stack.push(edit),
    }
}

/// Restores the previous active flag of an [`UndoManager`] when dropped
#[must_use = "recording resumes as soon as the guard is dropped"]
pub struct Deactivation<'a> {
    active: &'a Cell<bool>,
    previous: bool,
}

impl Drop for Deactivation<'_> {
    fn drop(&mut self) {
        self.active.set(self.previous);
    }
}
