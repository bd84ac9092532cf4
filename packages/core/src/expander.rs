//! # Expanders
//!
//! An expander is a placeholder that is either in text mode or expanded to a
//! content editor.
//!
//! ## States
//!
//! ```text
//!            set_text / complete (no match)
//!              ┌──────────┐
//!              ▼          │
//!         ┌──────────────────┐   expand / complete / auto-expand   ┌────────────────────┐
//!  ──────▶│ Text(text, item) │ ──────────────────────────────────▶ │ Expanded(content)  │
//!         └──────────────────┘ ◀────────────────────────────────── └────────────────────┘
//!                                            reset
//! ```
//!
//! ## Design
//!
//! - Every user-visible transition runs through `execute_edit`, which records
//!   a state transition carrying snapshots of the state before and after
//! - Recorded states hold snapshots, never live editors; undo reconstructs the
//!   content on demand
//! - While in text mode the result is a one-shot compilation of the text (a
//!   chosen completion item takes priority), while expanded it is the result
//!   of the content
//! - Hooks of the [`ExpanderKind`] run without undo recording and through
//!   [`execute_safely`], so a failing hook means "no match"
//! - Inside a list, typing the list separator commits the current text and
//!   opens a new item directly after this one

use std::fmt;
use std::rc::Rc;

use hextant_common::CompileResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::completion::{Completion, CompletionItem};
use crate::context::Context;
use crate::edits::TreeEdit;
use crate::errors::{execute_safely, EditorError, HookResult};
use crate::expander_config::ExpanderConfig;
use crate::settings::Settings;
use crate::snapshot::Snapshot;
use crate::tree::{EditorId, EditorKind, EditorTree, NodeKind, Value};

/// Behaviour of a family of expanders.
///
/// Every hook has a default; a kind with a [`config`](ExpanderKind::config)
/// expands texts and completion items through it.
pub trait ExpanderKind<V: Value> {
    /// Stable class name
    fn name(&self) -> &str;

    fn config(&self) -> Option<&ExpanderConfig<V>> {
        None
    }

    /// Make an editor for `text`, `None` if the text is no valid trigger
    fn expand_text(
        &self,
        tree: &mut EditorTree<V>,
        text: &str,
        context: &Context,
    ) -> HookResult<Option<EditorId>> {
        Ok(self
            .config()
            .and_then(|config| config.expand_text(tree, text, context)))
    }

    /// Make an editor for a chosen completion item
    fn expand_item(
        &self,
        tree: &mut EditorTree<V>,
        item: &CompletionItem,
        context: &Context,
    ) -> HookResult<Option<EditorId>> {
        Ok(self
            .config()
            .and_then(|config| config.expand_item(tree, item, context)))
    }

    /// Expand immediately while typing, without an explicit `expand`
    fn auto_expand(
        &self,
        _tree: &mut EditorTree<V>,
        _text: &str,
        _context: &Context,
    ) -> HookResult<Option<EditorId>> {
        Ok(None)
    }

    /// Result while in text mode
    fn compile(&self, _text: &str) -> CompileResult<V> {
        self.default_result()
    }

    /// Result while in text mode with a chosen completion item
    fn compile_item(&self, _item: &CompletionItem) -> CompileResult<V> {
        CompileResult::err("completion items are not supported")
    }

    fn default_result(&self) -> CompileResult<V> {
        CompileResult::err("expander is not expanded")
    }

    /// Whether a pasted editor may become the content
    fn accepts(&self, _tree: &EditorTree<V>, _editor: EditorId) -> bool {
        true
    }

    /// Context for content editors
    fn expansion_context(&self, context: &Context) -> Context {
        context.clone()
    }

    fn on_expansion(&self, _tree: &mut EditorTree<V>, _expander: EditorId, _content: EditorId) {}

    /// Called before `old` content is discarded
    fn on_reset(&self, _tree: &mut EditorTree<V>, _expander: EditorId, _old: EditorId) {}
}

/// Expander kind driven by an [`ExpanderConfig`]
pub struct ConfiguredExpander<V: Value> {
    name: String,
    config: Rc<ExpanderConfig<V>>,
    default_result: CompileResult<V>,
    compiler: Option<Box<dyn Fn(&str) -> CompileResult<V>>>,
}

impl<V: Value> ConfiguredExpander<V> {
    pub fn new(name: impl Into<String>, config: impl Into<Rc<ExpanderConfig<V>>>) -> Self {
        Self {
            name: name.into(),
            config: config.into(),
            default_result: CompileResult::err("expander is not expanded"),
            compiler: None,
        }
    }

    /// Result of an unexpanded expander whose text does not compile
    pub fn with_default_result(mut self, result: CompileResult<V>) -> Self {
        self.default_result = result;
        self
    }

    /// Compile texts directly; failures fall back to the default result
    pub fn with_compiler(mut self, compiler: impl Fn(&str) -> CompileResult<V> + 'static) -> Self {
        self.compiler = Some(Box::new(compiler));
        self
    }
}

impl<V: Value> ExpanderKind<V> for ConfiguredExpander<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> Option<&ExpanderConfig<V>> {
        Some(self.config.as_ref())
    }

    fn compile(&self, text: &str) -> CompileResult<V> {
        match &self.compiler {
            Some(compiler) => compiler(text).or_else(|| self.default_result()),
            None => self.default_result(),
        }
    }

    fn default_result(&self) -> CompileResult<V> {
        self.default_result.clone()
    }
}

impl<V: Value> fmt::Debug for ConfiguredExpander<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredExpander")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

/// Live state of an expander
#[derive(Debug, Clone, PartialEq)]
pub enum ExpanderState {
    Text {
        text: String,
        completion: Option<CompletionItem>,
    },
    Expanded(EditorId),
}

impl ExpanderState {
    pub fn initial() -> Self {
        ExpanderState::Text {
            text: String::new(),
            completion: None,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, ExpanderState::Expanded(_))
    }
}

/// Detached state of an expander, as recorded by edits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpanderSnapshot {
    Text {
        text: String,
        completion: Option<CompletionItem>,
    },
    Expanded(Box<Snapshot>),
}

impl ExpanderSnapshot {
    pub fn initial() -> Self {
        ExpanderSnapshot::Text {
            text: String::new(),
            completion: None,
        }
    }
}

pub struct ExpanderNode<V: Value> {
    pub(crate) kind: Rc<dyn ExpanderKind<V>>,
    pub(crate) state: ExpanderState,
}

impl<V: Value> ExpanderNode<V> {
    pub fn state(&self) -> &ExpanderState {
        &self.state
    }

    /// Result while in text mode: the completion item first, then the text
    pub(crate) fn compile_text(&self) -> CompileResult<V> {
        match &self.state {
            ExpanderState::Text {
                text,
                completion: Some(item),
            } => self
                .kind
                .compile_item(item)
                .or_else(|| self.kind.compile(text)),
            ExpanderState::Text {
                text,
                completion: None,
            } => self.kind.compile(text),
            ExpanderState::Expanded(_) => self.kind.default_result(),
        }
    }
}

impl<V: Value> EditorTree<V> {
    pub fn new_expander(&mut self, kind: Rc<dyn ExpanderKind<V>>, context: &Context) -> EditorId {
        self.new_expander_with_text(kind, context, "")
    }

    /// Create an expander showing `text`. Nothing is expanded or recorded.
    pub fn new_expander_with_text(
        &mut self,
        kind: Rc<dyn ExpanderKind<V>>,
        context: &Context,
        text: &str,
    ) -> EditorId {
        self.insert(
            context.clone(),
            NodeKind::Expander(ExpanderNode {
                kind,
                state: ExpanderState::Text {
                    text: text.to_string(),
                    completion: None,
                },
            }),
        )
    }

    /// Create an expander already expanded to the root editor `editor`
    pub fn new_expander_with_editor(
        &mut self,
        kind: Rc<dyn ExpanderKind<V>>,
        context: &Context,
        editor: EditorId,
    ) -> Result<EditorId, EditorError> {
        let id = self.new_expander(kind, context);
        if let Err(error) = self.expand_to(id, editor) {
            self.discard(id);
            return Err(error);
        }
        Ok(id)
    }

    fn expander(&self, id: EditorId) -> Result<&ExpanderNode<V>, EditorError> {
        match &self.node(id)?.kind {
            NodeKind::Expander(expander) => Ok(expander),
            _ => Err(self.wrong_kind(id, "expander")),
        }
    }

    fn expander_mut(&mut self, id: EditorId) -> Result<&mut ExpanderNode<V>, EditorError> {
        if self.kind_of(id)? != EditorKind::Expander {
            return Err(self.wrong_kind(id, "expander"));
        }
        match &mut self.node_mut(id)?.kind {
            NodeKind::Expander(expander) => Ok(expander),
            _ => Err(EditorError::StaleEditor(id)),
        }
    }

    pub fn expander_state(&self, id: EditorId) -> Result<&ExpanderState, EditorError> {
        Ok(&self.expander(id)?.state)
    }

    pub fn is_expanded(&self, id: EditorId) -> Result<bool, EditorError> {
        Ok(self.expander(id)?.state.is_expanded())
    }

    /// Text of an unexpanded expander
    pub fn expander_text(&self, id: EditorId) -> Result<Option<&str>, EditorError> {
        Ok(match &self.expander(id)?.state {
            ExpanderState::Text { text, .. } => Some(text.as_str()),
            ExpanderState::Expanded(_) => None,
        })
    }

    /// Content of an expanded expander
    pub fn expander_content(&self, id: EditorId) -> Result<Option<EditorId>, EditorError> {
        Ok(match self.expander(id)?.state {
            ExpanderState::Expanded(content) => Some(content),
            ExpanderState::Text { .. } => None,
        })
    }

    /// Kind and expansion context of an expander
    pub(crate) fn expansion_scope(
        &self,
        id: EditorId,
    ) -> Result<(Rc<dyn ExpanderKind<V>>, Context), EditorError> {
        let kind = self.expander(id)?.kind.clone();
        let context = kind.expansion_context(&self.node(id)?.context);
        Ok((kind, context))
    }

    fn assert_text_mode(&self, id: EditorId, operation: &str) -> Result<(), EditorError> {
        assert!(
            !self.is_expanded(id)?,
            "cannot {} expander {}: already expanded",
            operation,
            id
        );
        Ok(())
    }

    /// Run a hook of `id` without recording, treating failures as `default`
    fn run_hook<T>(
        &mut self,
        id: EditorId,
        what: &str,
        default: T,
        hook: impl FnOnce(&mut Self) -> HookResult<T>,
    ) -> Result<T, EditorError> {
        let context = self.node(id)?.context.clone();
        Ok(self.suspend_undo(&context, |tree| execute_safely(what, default, || hook(tree))))
    }

    /// Run `action` and record the state transition it causes
    pub(crate) fn execute_edit<R>(
        &mut self,
        id: EditorId,
        description: &str,
        action: impl FnOnce(&mut Self) -> Result<R, EditorError>,
    ) -> Result<R, EditorError> {
        let undo = match self.undo_manager(id)? {
            Some(undo) if undo.is_active() => undo,
            _ => return action(self),
        };

        let expander = self.virtualize(id)?;
        let before = self.expander_snapshot(id)?;
        let value = action(self)?;
        let after = self.expander_snapshot(id)?;
        undo.record(Box::new(TreeEdit::StateTransition {
            expander,
            before,
            after,
            description: description.to_string(),
        }));
        Ok(value)
    }

    pub fn expander_snapshot(&self, id: EditorId) -> Result<ExpanderSnapshot, EditorError> {
        Ok(match &self.expander(id)?.state {
            ExpanderState::Text { text, completion } => ExpanderSnapshot::Text {
                text: text.clone(),
                completion: completion.clone(),
            },
            ExpanderState::Expanded(content) => {
                ExpanderSnapshot::Expanded(Box::new(self.snapshot(*content)?))
            }
        })
    }

    /// Set the text of an unexpanded expander.
    ///
    /// # Panics
    ///
    /// Panics if the expander is expanded.
    pub(crate) fn set_expander_text(&mut self, id: EditorId, text: &str) -> Result<(), EditorError> {
        self.assert_text_mode(id, "set the text of")?;
        if matches!(
            self.expander_state(id)?,
            ExpanderState::Text { text: current, completion: None } if current == text
        ) {
            return Ok(());
        }
        if self.insert_on_separator(id, text)? {
            return Ok(());
        }

        let (kind, context) = self.expansion_scope(id)?;
        let editor = self.run_hook(id, "auto-expanding", None, |tree| {
            kind.auto_expand(tree, text, &context)
        })?;
        match editor {
            Some(editor) => self
                .execute_edit(id, "AutoExpand", |tree| tree.expand_to(id, editor))
                .map(|_| ()),
            None => self.execute_edit(id, "Type", |tree| {
                tree.set_text_state(id, text.to_string(), None)
            }),
        }
    }

    /// Commit the text before a trailing list separator and open a new item
    fn insert_on_separator(&mut self, id: EditorId, text: &str) -> Result<bool, EditorError> {
        let Some(list) = self.node(id)?.parent else {
            return Ok(false);
        };
        let (separator, index) = match &self.node(list)?.kind {
            NodeKind::List { kind, items } => {
                let separator = kind.separator().or_else(|| {
                    self.node(id)
                        .ok()
                        .and_then(|node| node.context.get::<Settings>())
                        .and_then(|settings| settings.list_separator)
                });
                match (separator, items.iter().position(|item| *item == id)) {
                    (Some(separator), Some(index)) => (separator, index),
                    _ => return Ok(false),
                }
            }
            _ => return Ok(false),
        };
        let Some(committed) = text.strip_suffix(separator) else {
            return Ok(false);
        };

        debug!(expander = %id, list = %list, index, "Separator typed - adding item");
        let committed = committed.to_string();
        self.compound_edit(id, "Add item", |tree| {
            tree.execute_edit(id, "Type", |tree| tree.set_text_state(id, committed, None))?;
            tree.add_item(list, index + 1)
        })?;
        Ok(true)
    }

    fn set_text_state(
        &mut self,
        id: EditorId,
        text: String,
        completion: Option<CompletionItem>,
    ) -> Result<(), EditorError> {
        trace!(expander = %id, text = %text, "Expander text changed");
        self.expander_mut(id)?.state = ExpanderState::Text {
            text: text.clone(),
            completion,
        };
        self.notify_views(id, |view| view.display_text(&text));
        self.refresh(id)
    }

    /// Expand the current text.
    ///
    /// Returns `false` and stays in text mode if the text is no valid trigger.
    ///
    /// # Panics
    ///
    /// Panics if the expander is already expanded.
    pub fn expand(&mut self, id: EditorId) -> Result<bool, EditorError> {
        self.assert_text_mode(id, "expand")?;
        let text = self.expander_text(id)?.unwrap_or_default().to_string();
        let (kind, context) = self.expansion_scope(id)?;

        let editor = self.run_hook(id, "expanding", None, |tree| {
            kind.expand_text(tree, &text, &context)
        })?;
        match editor {
            Some(editor) => {
                self.execute_edit(id, "Expand", |tree| tree.expand_to(id, editor))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Expand a chosen completion, or keep its text and item if nothing matches.
    ///
    /// # Panics
    ///
    /// Panics if the expander is already expanded.
    pub(crate) fn complete_expander(
        &mut self,
        id: EditorId,
        completion: &Completion,
    ) -> Result<(), EditorError> {
        self.assert_text_mode(id, "complete")?;
        let (kind, context) = self.expansion_scope(id)?;

        self.execute_edit(id, "Complete", |tree| {
            let mut editor = tree.run_hook(id, "expanding", None, |tree| {
                kind.expand_item(tree, &completion.item, &context)
            })?;
            if editor.is_none() {
                editor = tree.run_hook(id, "expanding", None, |tree| {
                    kind.expand_text(tree, &completion.completion_text, &context)
                })?;
            }
            match editor {
                Some(editor) => tree.expand_to(id, editor).map(|_| ()),
                None => tree.set_text_state(
                    id,
                    completion.completion_text.clone(),
                    Some(completion.item.clone()),
                ),
            }
        })
    }

    /// Expand to the root editor `editor` without recording an edit.
    ///
    /// The editor is moved into the expansion context if needed, so the
    /// resulting content may have a different id; it is returned.
    ///
    /// # Panics
    ///
    /// Panics if the expander is already expanded.
    pub fn expand_to(&mut self, id: EditorId, editor: EditorId) -> Result<EditorId, EditorError> {
        self.assert_text_mode(id, "expand")?;
        if self.node(editor)?.parent.is_some() || editor == id {
            return Err(EditorError::AlreadyAttached(editor));
        }

        let (kind, context) = self.expansion_scope(id)?;
        let content = self.move_to(editor, &context)?;
        self.set_parent(content, Some(id))?;
        self.expander_mut(id)?.state = ExpanderState::Expanded(content);
        debug!(expander = %id, content = %content, "Expanded");

        self.refresh(id)?;
        self.notify_views(id, |view| view.expanded(content));
        kind.on_expansion(self, id, content);
        Ok(content)
    }

    /// Discard the content and return to the initial empty text.
    ///
    /// # Panics
    ///
    /// Panics if the expander is not expanded.
    pub fn reset(&mut self, id: EditorId) -> Result<(), EditorError> {
        assert!(self.is_expanded(id)?, "cannot reset expander {}: not expanded", id);
        self.execute_edit(id, "Reset", |tree| tree.reset_raw(id))
    }

    pub(crate) fn reset_raw(&mut self, id: EditorId) -> Result<(), EditorError> {
        let expander = self.expander_mut(id)?;
        let old = match expander.state {
            ExpanderState::Expanded(content) => content,
            ExpanderState::Text { .. } => panic!("cannot reset expander {}: not expanded", id),
        };
        let kind = expander.kind.clone();
        expander.state = ExpanderState::initial();
        debug!(expander = %id, content = %old, "Reset");

        kind.on_reset(self, id, old);
        self.discard(old);
        self.refresh(id)?;
        self.notify_views(id, |view| view.reset());
        Ok(())
    }

    /// Bring an expander into a recorded state without recording an edit
    pub fn reconstruct_state(
        &mut self,
        id: EditorId,
        state: &ExpanderSnapshot,
    ) -> Result<(), EditorError> {
        // New content is built detached so a failure leaves the expander untouched
        let content = match state {
            ExpanderSnapshot::Expanded(snapshot) => {
                let (_, context) = self.expansion_scope(id)?;
                Some(self.reconstruct(snapshot, &context)?)
            }
            ExpanderSnapshot::Text { .. } => None,
        };

        if self.is_expanded(id)? {
            self.reset_raw(id)?;
        }
        match (state, content) {
            (_, Some(content)) => self.expand_to(id, content).map(|_| ()),
            (ExpanderSnapshot::Text { text, completion }, None) => {
                self.set_text_state(id, text.clone(), completion.clone())
            }
            (ExpanderSnapshot::Expanded(_), None) => Ok(()),
        }
    }
}
