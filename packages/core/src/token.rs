//! # Tokens
//!
//! A token is a leaf editor holding a text which is compiled to a value after
//! every change. Text changes are recorded as [`TreeEdit::Text`] edits, and
//! consecutive changes of the same token merge into one undo step.

use std::fmt;
use std::rc::Rc;

use hextant_common::CompileResult;
use tracing::trace;

use crate::completion::{Completion, CompletionItem};
use crate::context::Context;
use crate::edits::TreeEdit;
use crate::errors::EditorError;
use crate::tree::{EditorId, EditorKind, EditorTree, NodeKind, Value};

/// Compiles token texts to values
pub trait TokenType<V: Value> {
    /// Stable class name
    fn name(&self) -> &str;

    /// Compile `text`. Invalid texts are local errors.
    fn compile(&self, text: &str) -> CompileResult<V>;

    /// Compile a structured completion candidate
    fn compile_item(&self, _item: &CompletionItem) -> CompileResult<V> {
        CompileResult::err("completion items are not supported")
    }
}

/// Token type backed by a compile function
pub struct SimpleToken<V> {
    name: String,
    compile: Box<dyn Fn(&str) -> CompileResult<V>>,
}

impl<V> SimpleToken<V> {
    pub fn new(name: impl Into<String>, compile: impl Fn(&str) -> CompileResult<V> + 'static) -> Self {
        Self {
            name: name.into(),
            compile: Box::new(compile),
        }
    }
}

impl<V: Value> TokenType<V> for SimpleToken<V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn compile(&self, text: &str) -> CompileResult<V> {
        (self.compile)(text)
    }
}

impl<V> fmt::Debug for SimpleToken<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleToken").field("name", &self.name).finish()
    }
}

/// State of a token editor
pub struct TokenState<V: Value> {
    pub(crate) ty: Rc<dyn TokenType<V>>,
    pub(crate) text: String,
    pub(crate) completion: Option<CompletionItem>,
}

impl<V: Value> TokenState<V> {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn completion(&self) -> Option<&CompletionItem> {
        self.completion.as_ref()
    }

    /// A chosen completion is compiled first, falling back to the text
    pub(crate) fn compile(&self) -> CompileResult<V> {
        match &self.completion {
            Some(item) => self
                .ty
                .compile_item(item)
                .or_else(|| self.ty.compile(&self.text)),
            None => self.ty.compile(&self.text),
        }
    }
}

impl<V: Value> EditorTree<V> {
    pub fn new_token(&mut self, ty: Rc<dyn TokenType<V>>, context: &Context) -> EditorId {
        self.new_token_with_text(ty, context, "")
    }

    pub fn new_token_with_text(
        &mut self,
        ty: Rc<dyn TokenType<V>>,
        context: &Context,
        text: &str,
    ) -> EditorId {
        self.insert(
            context.clone(),
            NodeKind::Token(TokenState {
                ty,
                text: text.to_string(),
                completion: None,
            }),
        )
    }

    fn token(&self, id: EditorId) -> Result<&TokenState<V>, EditorError> {
        match &self.node(id)?.kind {
            NodeKind::Token(token) => Ok(token),
            _ => Err(self.wrong_kind(id, "token")),
        }
    }

    fn token_mut(&mut self, id: EditorId) -> Result<&mut TokenState<V>, EditorError> {
        if self.kind_of(id)? != EditorKind::Token {
            return Err(self.wrong_kind(id, "token"));
        }
        match &mut self.node_mut(id)?.kind {
            NodeKind::Token(token) => Ok(token),
            _ => Err(EditorError::StaleEditor(id)),
        }
    }

    pub fn token_text(&self, id: EditorId) -> Result<&str, EditorError> {
        Ok(&self.token(id)?.text)
    }

    /// Set the text of a token or of an unexpanded expander
    pub fn set_text(&mut self, id: EditorId, text: &str) -> Result<(), EditorError> {
        match self.kind_of(id)? {
            EditorKind::Token => self.set_token_text(id, text, true),
            EditorKind::Expander => self.set_expander_text(id, text),
            _ => Err(self.wrong_kind(id, "token or expander")),
        }
    }

    /// Replace the text of a token, discarding a chosen completion.
    ///
    /// If `undoable` the change is recorded as a text edit.
    pub fn set_token_text(
        &mut self,
        id: EditorId,
        text: &str,
        undoable: bool,
    ) -> Result<(), EditorError> {
        self.set_token_state(id, text, None, undoable)
    }

    pub(crate) fn set_token_state(
        &mut self,
        id: EditorId,
        text: &str,
        completion: Option<CompletionItem>,
        undoable: bool,
    ) -> Result<(), EditorError> {
        let token = self.token_mut(id)?;
        let old = std::mem::replace(&mut token.text, text.to_string());
        let old_completion = std::mem::replace(&mut token.completion, completion.clone());
        trace!(editor = %id, text, "Token text changed");

        if undoable && (old != text || old_completion != completion) {
            self.record_edit(id, |tree| {
                Ok(TreeEdit::Text {
                    editor: tree.virtualize(id)?,
                    old,
                    new: text.to_string(),
                    old_completion,
                    new_completion: completion,
                })
            })?;
        }

        self.notify_views(id, |view| view.display_text(text));
        self.refresh(id)
    }

    /// Complete a token or an unexpanded expander with a chosen candidate
    pub fn complete(&mut self, id: EditorId, completion: &Completion) -> Result<(), EditorError> {
        match self.kind_of(id)? {
            EditorKind::Token => self.complete_token(id, completion),
            EditorKind::Expander => self.complete_expander(id, completion),
            _ => Err(self.wrong_kind(id, "token or expander")),
        }
    }

    fn complete_token(&mut self, id: EditorId, completion: &Completion) -> Result<(), EditorError> {
        self.set_token_state(
            id,
            &completion.completion_text,
            Some(completion.item.clone()),
            true,
        )
    }
}
