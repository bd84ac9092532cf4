//! # Editor Tree
//!
//! Arena owning every editor of a document.
//!
//! ## Design
//!
//! - Editors live in generation-checked slots; an [`EditorId`] is a `Copy`
//!   handle that is validated on every use
//! - Children are owned top-down: discarding an editor frees its whole subtree
//! - Parent links are plain handles and never keep a subtree alive
//! - Each editor caches its current [`CompileResult`]; after any local change
//!   the result is recomputed and, if it changed, views are notified and the
//!   parent recomputes its own result, up to the root
//!
//! The kind-specific operations live next to their kinds
//! ([`token`](crate::token), [`expander`](crate::expander),
//! [`compound`](crate::compound), [`list`](crate::list)).

use std::fmt;
use std::ops::Index;
use std::rc::Rc;

use hextant_common::CompileResult;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::compound::CompoundKind;
use crate::context::Context;
use crate::errors::EditorError;
use crate::expander::{ExpanderNode, ExpanderState};
use crate::list::ListKind;
use crate::registry::EditorClass;
use crate::token::TokenState;
use crate::undo_stack::UndoManager;
use crate::view::{EditorView, ViewSet};

/// The value family a tree of editors compiles to
pub trait Value: Clone + PartialEq + fmt::Debug + 'static {}

impl<T: Clone + PartialEq + fmt::Debug + 'static> Value for T {}

/// Undo manager for edits on an editor tree
pub type TreeUndo<V> = UndoManager<EditorTree<V>>;

/// Generation-checked handle of an editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EditorId {
    index: u32,
    generation: u32,
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Coarse kind of an editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    Token,
    Expander,
    Compound,
    List,
}

impl EditorKind {
    pub fn name(self) -> &'static str {
        match self {
            EditorKind::Token => "token",
            EditorKind::Expander => "expander",
            EditorKind::Compound => "compound",
            EditorKind::List => "list",
        }
    }
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific state of an editor
pub enum NodeKind<V: Value> {
    Token(TokenState<V>),
    Expander(ExpanderNode<V>),
    Compound {
        kind: Rc<dyn CompoundKind<V>>,
        components: Vec<EditorId>,
    },
    List {
        kind: Rc<dyn ListKind<V>>,
        items: Vec<EditorId>,
    },
}

impl<V: Value> NodeKind<V> {
    pub fn kind(&self) -> EditorKind {
        match self {
            NodeKind::Token(_) => EditorKind::Token,
            NodeKind::Expander(_) => EditorKind::Expander,
            NodeKind::Compound { .. } => EditorKind::Compound,
            NodeKind::List { .. } => EditorKind::List,
        }
    }

    /// Class name of the editor
    pub fn class_name(&self) -> &str {
        match self {
            NodeKind::Token(token) => token.ty.name(),
            NodeKind::Expander(expander) => expander.kind.name(),
            NodeKind::Compound { kind, .. } => kind.name(),
            NodeKind::List { kind, .. } => kind.name(),
        }
    }

    /// Directly owned children
    pub fn children(&self) -> Vec<EditorId> {
        match self {
            NodeKind::Token(_) => Vec::new(),
            NodeKind::Expander(expander) => match expander.state {
                ExpanderState::Expanded(content) => vec![content],
                ExpanderState::Text { .. } => Vec::new(),
            },
            NodeKind::Compound { components, .. } => components.clone(),
            NodeKind::List { items, .. } => items.clone(),
        }
    }
}

/// One editor of the tree
pub struct Node<V: Value> {
    pub(crate) context: Context,
    pub(crate) parent: Option<EditorId>,
    pub(crate) result: CompileResult<V>,
    pub(crate) views: ViewSet<V>,
    pub(crate) kind: NodeKind<V>,
}

impl<V: Value> Node<V> {
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn parent(&self) -> Option<EditorId> {
        self.parent
    }

    pub fn result(&self) -> &CompileResult<V> {
        &self.result
    }

    pub fn kind(&self) -> &NodeKind<V> {
        &self.kind
    }

    pub fn editor_kind(&self) -> EditorKind {
        self.kind.kind()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }
}

impl<V: Value> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind.kind())
            .field("class", &self.kind.class_name())
            .field("parent", &self.parent)
            .field("result", &self.result)
            .finish()
    }
}

struct Slot<V: Value> {
    generation: u32,
    node: Option<Node<V>>,
}

/// Arena of editors compiling to values of type `V`
pub struct EditorTree<V: Value> {
    slots: Vec<Slot<V>>,
    free: Vec<u32>,
}

impl<V: Value> EditorTree<V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live editors
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: EditorId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: EditorId) -> Option<&Node<V>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn node(&self, id: EditorId) -> Result<&Node<V>, EditorError> {
        self.get(id).ok_or(EditorError::StaleEditor(id))
    }

    pub(crate) fn node_mut(&mut self, id: EditorId) -> Result<&mut Node<V>, EditorError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(EditorError::StaleEditor(id))
    }

    /// Insert a new root editor and compute its initial result
    pub(crate) fn insert(&mut self, context: Context, kind: NodeKind<V>) -> EditorId {
        let children = kind.children();
        let node = Node {
            context,
            parent: None,
            result: CompileResult::ChildErr,
            views: ViewSet::new(),
            kind,
        };

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                EditorId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                EditorId {
                    index,
                    generation: 0,
                }
            }
        };

        for child in children {
            if let Some(node) = self.slots[child.index as usize].node.as_mut() {
                node.parent = Some(id);
            }
        }
        if let Ok(result) = self.compute_result(id) {
            if let Some(node) = self.slots[id.index as usize].node.as_mut() {
                node.result = result;
            }
        }
        id
    }

    /// Free `id` and its whole subtree
    pub(crate) fn discard(&mut self, id: EditorId) {
        let Ok(node) = self.node(id) else {
            return;
        };
        for child in node.kind.children() {
            self.discard(child);
        }

        let slot = &mut self.slots[id.index as usize];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Discard a root editor that is no longer needed
    pub fn remove_root(&mut self, id: EditorId) -> Result<(), EditorError> {
        if self.node(id)?.parent.is_some() {
            return Err(EditorError::AlreadyAttached(id));
        }
        self.discard(id);
        Ok(())
    }

    pub fn result(&self, id: EditorId) -> Result<&CompileResult<V>, EditorError> {
        Ok(&self.node(id)?.result)
    }

    pub fn parent(&self, id: EditorId) -> Result<Option<EditorId>, EditorError> {
        Ok(self.node(id)?.parent)
    }

    pub fn context(&self, id: EditorId) -> Result<&Context, EditorError> {
        Ok(&self.node(id)?.context)
    }

    pub fn kind_of(&self, id: EditorId) -> Result<EditorKind, EditorError> {
        Ok(self.node(id)?.editor_kind())
    }

    pub fn children(&self, id: EditorId) -> Result<Vec<EditorId>, EditorError> {
        Ok(self.node(id)?.kind.children())
    }

    /// The topmost ancestor of `id`
    pub fn root_of(&self, id: EditorId) -> Result<EditorId, EditorError> {
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    /// The class `id` was created from
    pub fn class_of(&self, id: EditorId) -> Result<EditorClass<V>, EditorError> {
        Ok(match &self.node(id)?.kind {
            NodeKind::Token(token) => EditorClass::Token(token.ty.clone()),
            NodeKind::Expander(expander) => EditorClass::Expander(expander.kind.clone()),
            NodeKind::Compound { kind, .. } => EditorClass::Compound(kind.clone()),
            NodeKind::List { kind, .. } => EditorClass::List(kind.clone()),
        })
    }

    /// Create a fresh editor of `class`
    pub fn create(&mut self, class: &EditorClass<V>, context: &Context) -> EditorId {
        match class {
            EditorClass::Token(ty) => self.new_token(ty.clone(), context),
            EditorClass::Expander(kind) => self.new_expander(kind.clone(), context),
            EditorClass::Compound(kind) => self.new_compound(kind.clone(), context),
            EditorClass::List(kind) => self.new_list(kind.clone(), context),
        }
    }

    pub(crate) fn wrong_kind(&self, id: EditorId, expected: &'static str) -> EditorError {
        match self.kind_of(id) {
            Ok(found) => EditorError::WrongKind {
                id,
                expected,
                found: found.name(),
            },
            Err(error) => error,
        }
    }

    /// Attach `child` below `parent` (or detach it with `None`)
    pub(crate) fn set_parent(
        &mut self,
        child: EditorId,
        parent: Option<EditorId>,
    ) -> Result<(), EditorError> {
        self.node_mut(child)?.parent = parent;
        Ok(())
    }

    // ---- results ------------------------------------------------------

    fn child_results(&self, children: &[EditorId]) -> Result<CompileResult<Vec<V>>, EditorError> {
        let results = children
            .iter()
            .map(|child| Ok(self.node(*child)?.result.clone()))
            .collect::<Result<Vec<_>, EditorError>>()?;
        Ok(CompileResult::sequence(results))
    }

    /// Compute the result of `id` from its local state and its children's results
    pub(crate) fn compute_result(&self, id: EditorId) -> Result<CompileResult<V>, EditorError> {
        Ok(match &self.node(id)?.kind {
            NodeKind::Token(token) => token.compile(),
            NodeKind::Expander(expander) => match &expander.state {
                ExpanderState::Text { .. } => expander.compile_text(),
                ExpanderState::Expanded(content) => self.node(*content)?.result.clone(),
            },
            NodeKind::Compound { kind, components } => self
                .child_results(components)?
                .flat_map(|values| kind.compose(&values)),
            NodeKind::List { kind, items } => self
                .child_results(items)?
                .flat_map(|values| kind.compose(values)),
        })
    }

    /// Recompute the result of `id` and propagate changes towards the root
    pub(crate) fn refresh(&mut self, id: EditorId) -> Result<(), EditorError> {
        let mut current = Some(id);
        while let Some(id) = current {
            let result = self.compute_result(id)?;
            let node = self.node_mut(id)?;
            if node.result == result {
                break;
            }
            trace!(editor = %id, result = ?result, "Result changed");
            node.result = result.clone();
            current = node.parent;
            self.notify_views(id, |view| view.result_changed(&result));
        }
        Ok(())
    }

    // ---- views --------------------------------------------------------

    /// Attach `view` to `id` and push the current state to it
    pub fn attach_view(
        &mut self,
        id: EditorId,
        view: &Rc<dyn EditorView<V>>,
    ) -> Result<(), EditorError> {
        let node = self.node_mut(id)?;
        node.views.add(view);

        view.result_changed(&node.result);
        match &node.kind {
            NodeKind::Token(token) => view.display_text(&token.text),
            NodeKind::Expander(expander) => match &expander.state {
                ExpanderState::Text { text, .. } => view.display_text(text),
                ExpanderState::Expanded(content) => view.expanded(*content),
            },
            NodeKind::Compound { .. } => {}
            NodeKind::List { items, .. } => {
                for (index, item) in items.iter().enumerate() {
                    view.item_added(index, *item);
                }
            }
        }
        Ok(())
    }

    /// Detach `view` from `id`, returning whether it was attached
    pub fn detach_view(
        &mut self,
        id: EditorId,
        view: &Rc<dyn EditorView<V>>,
    ) -> Result<bool, EditorError> {
        Ok(self.node_mut(id)?.views.remove(view))
    }

    /// Invoke `action` on every live view of `id`
    pub(crate) fn notify_views(&self, id: EditorId, action: impl Fn(&dyn EditorView<V>)) {
        if let Some(node) = self.get(id) {
            for view in node.views.live() {
                action(view.as_ref());
            }
        }
    }

    // ---- undo ---------------------------------------------------------

    /// The undo manager responsible for `id`, if its context provides one
    pub fn undo_manager(&self, id: EditorId) -> Result<Option<Rc<TreeUndo<V>>>, EditorError> {
        Ok(self.node(id)?.context.get::<TreeUndo<V>>())
    }

    /// Run `action` with recording suspended in the undo manager of `context`
    pub(crate) fn suspend_undo<R>(
        &mut self,
        context: &Context,
        action: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let undo = context.get::<TreeUndo<V>>();
        let _guard = undo.as_ref().map(|undo| undo.deactivate());
        action(self)
    }

    /// Run `action` as one compound edit of the undo manager responsible for `id`
    pub fn compound_edit<R>(
        &mut self,
        id: EditorId,
        description: &str,
        action: impl FnOnce(&mut Self) -> Result<R, EditorError>,
    ) -> Result<R, EditorError> {
        match self.undo_manager(id)? {
            Some(undo) => undo.compound(description, || action(self)),
            None => action(self),
        }
    }

    /// Record the edit built by `make` if the undo manager of `id` is active
    pub(crate) fn record_edit(
        &self,
        id: EditorId,
        make: impl FnOnce(&Self) -> Result<crate::edits::TreeEdit, EditorError>,
    ) -> Result<(), EditorError> {
        if let Some(undo) = self.undo_manager(id)? {
            if undo.is_active() {
                undo.record(Box::new(make(self)?));
            }
        }
        Ok(())
    }
}

impl<V: Value> Default for EditorTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> Index<EditorId> for EditorTree<V> {
    type Output = Node<V>;

    /// # Panics
    ///
    /// Panics if `id` is stale.
    fn index(&self, id: EditorId) -> &Node<V> {
        match self.get(id) {
            Some(node) => node,
            None => panic!("editor {} no longer exists", id),
        }
    }
}

impl<V: Value> fmt::Debug for EditorTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorTree")
            .field("editors", &self.len())
            .field("free", &self.free.len())
            .finish()
    }
}
