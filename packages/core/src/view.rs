//! View notification protocol
//!
//! Views are owned by the rendering layer; editors only keep weak handles.
//! Notifications are pushed synchronously after each state change and dead
//! views are skipped.

use std::rc::{Rc, Weak};

use hextant_common::CompileResult;

use crate::tree::{EditorId, Value};

/// Observer of one editor. All notifications default to no-ops.
pub trait EditorView<V: Value> {
    /// The displayed text of a token or unexpanded expander changed
    fn display_text(&self, _text: &str) {}

    /// An expander was expanded to `content`
    fn expanded(&self, _content: EditorId) {}

    /// An expander was reset to its initial text state
    fn reset(&self) {}

    fn result_changed(&self, _result: &CompileResult<V>) {}

    fn item_added(&self, _index: usize, _item: EditorId) {}

    fn item_removed(&self, _index: usize) {}
}

/// Weakly held views of one editor
pub struct ViewSet<V: Value> {
    views: Vec<Weak<dyn EditorView<V>>>,
}

impl<V: Value> ViewSet<V> {
    pub fn new() -> Self {
        Self { views: Vec::new() }
    }

    pub(crate) fn add(&mut self, view: &Rc<dyn EditorView<V>>) {
        self.prune();
        self.views.push(Rc::downgrade(view));
    }

    pub(crate) fn remove(&mut self, view: &Rc<dyn EditorView<V>>) -> bool {
        let target = Rc::downgrade(view);
        let before = self.views.len();
        self.views.retain(|held| !held.ptr_eq(&target));
        self.prune();
        self.views.len() < before
    }

    /// Currently alive views
    pub(crate) fn live(&self) -> Vec<Rc<dyn EditorView<V>>> {
        self.views.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.views.iter().filter(|view| view.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&mut self) {
        self.views.retain(|view| view.strong_count() > 0);
    }
}

impl<V: Value> Default for ViewSet<V> {
    fn default() -> Self {
        Self::new()
    }
}
