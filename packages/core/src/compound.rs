//! Compound editors
//!
//! A compound editor has a fixed list of components, one per class declared by
//! its [`CompoundKind`]. Its result is `ChildErr` as long as any component is
//! not ok, otherwise the composition of the component values.

use std::rc::Rc;

use hextant_common::CompileResult;

use crate::context::Context;
use crate::errors::EditorError;
use crate::registry::EditorClass;
use crate::tree::{EditorId, EditorTree, NodeKind, Value};

pub trait CompoundKind<V: Value> {
    /// Stable class name
    fn name(&self) -> &str;

    /// Classes of the components, in order
    fn components(&self) -> Vec<EditorClass<V>>;

    /// Combine the values of all components; may report a local error
    fn compose(&self, values: &[V]) -> CompileResult<V>;
}

impl<V: Value> EditorTree<V> {
    /// Create a compound editor with fresh components
    pub fn new_compound(&mut self, kind: Rc<dyn CompoundKind<V>>, context: &Context) -> EditorId {
        let components = kind
            .components()
            .iter()
            .map(|class| self.create(class, context))
            .collect();
        self.insert(context.clone(), NodeKind::Compound { kind, components })
    }

    /// Create a compound editor from existing root editors
    pub fn new_compound_with(
        &mut self,
        kind: Rc<dyn CompoundKind<V>>,
        context: &Context,
        components: Vec<EditorId>,
    ) -> Result<EditorId, EditorError> {
        let expected = kind.components().len();
        if components.len() != expected {
            return Err(EditorError::ComponentCount {
                kind: kind.name().to_string(),
                expected,
                found: components.len(),
            });
        }

        let mut moved = Vec::with_capacity(components.len());
        for component in components {
            if self.node(component)?.parent.is_some() {
                return Err(EditorError::AlreadyAttached(component));
            }
            moved.push(self.move_to(component, context)?);
        }
        Ok(self.insert(
            context.clone(),
            NodeKind::Compound {
                kind,
                components: moved,
            },
        ))
    }

    pub fn components(&self, id: EditorId) -> Result<&[EditorId], EditorError> {
        match &self.node(id)?.kind {
            NodeKind::Compound { components, .. } => Ok(components),
            _ => Err(self.wrong_kind(id, "compound")),
        }
    }

    pub fn component(&self, id: EditorId, index: usize) -> Result<EditorId, EditorError> {
        let components = self.components(id)?;
        components
            .get(index)
            .copied()
            .ok_or(EditorError::IndexOutOfBounds {
                index,
                len: components.len(),
            })
    }
}
