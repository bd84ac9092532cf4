//! # Snapshots
//!
//! Detached, serializable captures of an editor's reconstructable state, used
//! by undo, copy/paste and persistence.
//!
//! ## Wire format
//!
//! ```json
//! { "_class": "expr", "_type": "expander", "editor": { "_class": "int", "_type": "token", "text": "42" } }
//! { "_class": "expr", "_type": "expander", "text": "4", "completionClass": "constant", "completion": 4 }
//! { "_class": "int", "_type": "token", "text": "answer", "completionClass": "constant", "completion": 42 }
//! ```
//!
//! `_type` names the kind of snapshot, `_class` the editor class used to
//! create a fresh editor on reconstruction. Reconstructing into an existing
//! editor only needs `_type`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::completion::CompletionItem;
use crate::context::Context;
use crate::edits::TreeEdit;
use crate::errors::EditorError;
use crate::expander::{ExpanderSnapshot, ExpanderState};
use crate::registry::{EditorClass, EditorRegistry};
use crate::tree::{EditorId, EditorKind, EditorTree, NodeKind, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Class of the captured editor
    #[serde(rename = "_class", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(flatten)]
    pub state: SnapshotState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "snake_case")]
pub enum SnapshotState {
    Token {
        text: String,
        #[serde(
            rename = "completionClass",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        completion_class: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion: Option<serde_json::Value>,
    },
    Expander {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        editor: Option<Box<Snapshot>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(
            rename = "completionClass",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        completion_class: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completion: Option<serde_json::Value>,
    },
    Compound {
        components: Vec<Snapshot>,
    },
    List {
        items: Vec<Snapshot>,
    },
}

impl SnapshotState {
    /// Token state without a chosen completion
    pub fn token(text: impl Into<String>) -> Self {
        Self::token_completed(text, None)
    }

    pub fn token_completed(text: impl Into<String>, completion: Option<&CompletionItem>) -> Self {
        SnapshotState::Token {
            text: text.into(),
            completion_class: completion.map(|item| item.class.clone()),
            completion: completion.map(|item| item.value.clone()),
        }
    }

    pub fn kind(&self) -> EditorKind {
        match self {
            SnapshotState::Token { .. } => EditorKind::Token,
            SnapshotState::Expander { .. } => EditorKind::Expander,
            SnapshotState::Compound { .. } => EditorKind::Compound,
            SnapshotState::List { .. } => EditorKind::List,
        }
    }
}

impl Snapshot {
    pub fn new(class: Option<String>, state: SnapshotState) -> Self {
        Self { class, state }
    }

    /// Snapshot of an expander in the given state
    pub fn expander(class: Option<String>, state: &ExpanderSnapshot) -> Self {
        let state = match state {
            ExpanderSnapshot::Expanded(content) => SnapshotState::Expander {
                editor: Some(content.clone()),
                text: None,
                completion_class: None,
                completion: None,
            },
            ExpanderSnapshot::Text { text, completion } => SnapshotState::Expander {
                editor: None,
                text: Some(text.clone()),
                completion_class: completion.as_ref().map(|item| item.class.clone()),
                completion: completion.as_ref().map(|item| item.value.clone()),
            },
        };
        Self::new(class, state)
    }

    /// The expander state captured by this snapshot, `None` for other kinds
    pub fn expander_state(&self) -> Option<ExpanderSnapshot> {
        match &self.state {
            SnapshotState::Expander {
                editor: Some(content),
                ..
            } => Some(ExpanderSnapshot::Expanded(content.clone())),
            SnapshotState::Expander {
                editor: None,
                text,
                completion_class,
                completion,
            } => Some(ExpanderSnapshot::Text {
                text: text.clone().unwrap_or_default(),
                completion: completion_item(completion_class, completion),
            }),
            _ => None,
        }
    }

    /// Text and chosen completion captured by a token snapshot
    pub fn token_state(&self) -> Option<(&str, Option<CompletionItem>)> {
        match &self.state {
            SnapshotState::Token {
                text,
                completion_class,
                completion,
            } => Some((text.as_str(), completion_item(completion_class, completion))),
            _ => None,
        }
    }

    pub fn encode(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn encode_pretty(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn decode(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value, EditorError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, EditorError> {
        Ok(serde_json::from_value(value)?)
    }
}

fn completion_item(
    class: &Option<String>,
    value: &Option<serde_json::Value>,
) -> Option<CompletionItem> {
    class
        .as_ref()
        .map(|class| CompletionItem::raw(class.clone(), value.clone().unwrap_or_default()))
}

impl<V: Value> EditorTree<V> {
    /// Capture the state of `id`, recording its class
    pub fn snapshot(&self, id: EditorId) -> Result<Snapshot, EditorError> {
        let node = self.node(id)?;
        let class = Some(node.kind.class_name().to_string());
        Ok(match &node.kind {
            NodeKind::Token(token) => Snapshot::new(
                class,
                SnapshotState::token_completed(token.text.clone(), token.completion.as_ref()),
            ),
            NodeKind::Expander(expander) => match &expander.state {
                ExpanderState::Text { .. } => Snapshot::expander(class, &self.expander_snapshot(id)?),
                ExpanderState::Expanded(content) => Snapshot::new(
                    class,
                    SnapshotState::Expander {
                        editor: Some(Box::new(self.snapshot(*content)?)),
                        text: None,
                        completion_class: None,
                        completion: None,
                    },
                ),
            },
            NodeKind::Compound { components, .. } => Snapshot::new(
                class,
                SnapshotState::Compound {
                    components: components
                        .iter()
                        .map(|component| self.snapshot(*component))
                        .collect::<Result<_, _>>()?,
                },
            ),
            NodeKind::List { items, .. } => Snapshot::new(
                class,
                SnapshotState::List {
                    items: items
                        .iter()
                        .map(|item| self.snapshot(*item))
                        .collect::<Result<_, _>>()?,
                },
            ),
        })
    }

    /// Create a fresh root editor from `snapshot`.
    ///
    /// The class is looked up in the [`EditorRegistry`] of `context`.
    pub fn reconstruct(&mut self, snapshot: &Snapshot, context: &Context) -> Result<EditorId, EditorError> {
        let name = snapshot.class.as_deref().ok_or(EditorError::MissingClass)?;
        let class = context.require::<EditorRegistry<V>>()?.lookup(name)?;
        self.reconstruct_as(&class, snapshot, context)
    }

    /// Create a fresh root editor of `class` from `snapshot`
    pub fn reconstruct_as(
        &mut self,
        class: &EditorClass<V>,
        snapshot: &Snapshot,
        context: &Context,
    ) -> Result<EditorId, EditorError> {
        let id = self.create(class, context);
        let result = self.suspend_undo(context, |tree| tree.reconstruct_into(id, snapshot));
        if let Err(error) = result {
            self.discard(id);
            return Err(error);
        }
        Ok(id)
    }

    /// Bring the existing editor `id` into the state of `snapshot` without recording
    pub fn reconstruct_into(&mut self, id: EditorId, snapshot: &Snapshot) -> Result<(), EditorError> {
        let kind = self.kind_of(id)?;
        if kind != snapshot.state.kind() {
            return Err(EditorError::SnapshotMismatch {
                expected: kind.name().to_string(),
                found: snapshot.state.kind().name().to_string(),
            });
        }

        match &snapshot.state {
            SnapshotState::Token { .. } => match snapshot.token_state() {
                Some((text, completion)) => self.set_token_state(id, text, completion, false),
                None => Ok(()),
            },
            SnapshotState::Expander { .. } => match snapshot.expander_state() {
                Some(state) => self.reconstruct_state(id, &state),
                None => Ok(()),
            },
            SnapshotState::Compound { components } => {
                let ids = self.components(id)?.to_vec();
                if ids.len() != components.len() {
                    return Err(EditorError::SnapshotMismatch {
                        expected: format!("{} components", ids.len()),
                        found: format!("{} components", components.len()),
                    });
                }
                for (component, snapshot) in ids.into_iter().zip(components) {
                    self.reconstruct_into(component, snapshot)?;
                }
                Ok(())
            }
            SnapshotState::List { items } => {
                self.clear_items_raw(id)?;
                let (element, context) = match &self.node(id)?.kind {
                    NodeKind::List { kind, .. } => (kind.element(), self.node(id)?.context.clone()),
                    _ => return Err(self.wrong_kind(id, "list")),
                };
                for (index, snapshot) in items.iter().enumerate() {
                    let item = self.reconstruct_as(&element, snapshot, &context)?;
                    self.insert_item_raw(id, index, item)?;
                }
                Ok(())
            }
        }
    }

    /// Move the root editor `id` into `context`.
    ///
    /// Editors already using `context` are returned as they are; others are
    /// replaced by a reconstructed copy.
    pub fn move_to(&mut self, id: EditorId, context: &Context) -> Result<EditorId, EditorError> {
        let node = self.node(id)?;
        if node.context.ptr_eq(context) {
            return Ok(id);
        }
        if node.parent.is_some() {
            return Err(EditorError::AlreadyAttached(id));
        }

        let snapshot = self.snapshot(id)?;
        let class = self.class_of(id)?;
        let moved = self.reconstruct_as(&class, &snapshot, context)?;
        self.discard(id);
        debug!(from = %id, to = %moved, "Moved editor to new context");
        Ok(moved)
    }

    pub fn supports_copy_paste(&self, id: EditorId) -> Result<bool, EditorError> {
        Ok(matches!(
            self.kind_of(id)?,
            EditorKind::Token | EditorKind::Expander
        ))
    }

    pub fn copy(&self, id: EditorId) -> Result<Snapshot, EditorError> {
        if !self.supports_copy_paste(id)? {
            return Err(EditorError::CopyPasteUnsupported(id));
        }
        self.snapshot(id)
    }

    /// Graft a copied snapshot onto `id`.
    ///
    /// Returns `false` and leaves the editor unchanged if the snapshot does not
    /// fit.
    pub fn paste(&mut self, id: EditorId, snapshot: &Snapshot) -> Result<bool, EditorError> {
        match self.kind_of(id)? {
            EditorKind::Token => match snapshot.token_state() {
                Some((text, completion)) => {
                    self.set_token_state(id, text, completion, true)?;
                    Ok(true)
                }
                None => Ok(false),
            },
            EditorKind::Expander => self.paste_into_expander(id, snapshot),
            _ => Err(EditorError::CopyPasteUnsupported(id)),
        }
    }

    fn paste_into_expander(&mut self, id: EditorId, snapshot: &Snapshot) -> Result<bool, EditorError> {
        let content = match snapshot.expander_state() {
            Some(ExpanderSnapshot::Expanded(content)) => *content,
            Some(state) => {
                self.execute_edit(id, "Paste", |tree| tree.reconstruct_state(id, &state))?;
                return Ok(true);
            }
            None => snapshot.clone(),
        };

        // Built detached first so a failure leaves the current content alone
        let (kind, context) = self.expansion_scope(id)?;
        let editor = match self.reconstruct(&content, &context) {
            Ok(editor) => editor,
            Err(error) => {
                debug!(expander = %id, error = %error, "Pasted snapshot cannot be reconstructed");
                return Ok(false);
            }
        };
        if !kind.accepts(self, editor) {
            self.discard(editor);
            return Ok(false);
        }

        self.execute_edit(id, "Paste", |tree| {
            if tree.is_expanded(id)? {
                tree.reset_raw(id)?;
            }
            tree.expand_to(id, editor).map(|_| ())
        })?;
        Ok(true)
    }

    /// Run `action` on `id` and record one edit restoring the snapshots around it
    pub fn make_undoable_edit<R>(
        &mut self,
        id: EditorId,
        description: &str,
        action: impl FnOnce(&mut Self) -> Result<R, EditorError>,
    ) -> Result<R, EditorError> {
        let context = self.node(id)?.context.clone();
        let editor = self.virtualize(id)?;
        let before = self.snapshot(id)?;
        let value = self.suspend_undo(&context, action)?;
        let after = self.snapshot(id)?;

        self.record_edit(id, |_| {
            Ok(TreeEdit::Replace {
                editor,
                before,
                after,
                description: description.to_string(),
            })
        })?;
        Ok(value)
    }
}
