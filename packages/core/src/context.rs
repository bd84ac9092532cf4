//! # Context
//!
//! Hierarchical, type-keyed service lookup threaded through the editor tree.
//!
//! ## Design
//!
//! - Every editor holds a (shared) [`Context`]
//! - Services are keyed by their Rust type, one value per type and level
//! - Lookup walks from a context up through its parents
//! - `set` only ever installs at the level it is called on

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::errors::EditorError;

/// Shared handle to one level of the context hierarchy
#[derive(Clone)]
pub struct Context(Rc<ContextInner>);

struct ContextInner {
    parent: Option<Context>,
    services: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl Context {
    /// Create a context without parent
    pub fn root() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Context>) -> Self {
        Context(Rc::new(ContextInner {
            parent,
            services: RefCell::new(HashMap::new()),
        }))
    }

    /// Create a child context falling back to this one
    pub fn extend(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    pub fn parent(&self) -> Option<&Context> {
        self.0.parent.as_ref()
    }

    /// Install `value` at this level, replacing a previous value of the same type
    pub fn set<T: Any>(&self, value: T) {
        self.set_rc(Rc::new(value));
    }

    /// Install an already shared value at this level
    pub fn set_rc<T: Any>(&self, value: Rc<T>) {
        self.0
            .services
            .borrow_mut()
            .insert(TypeId::of::<T>(), value as Rc<dyn Any>);
    }

    /// Look up a service, walking up through the parents
    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        let local = self.0.services.borrow().get(&TypeId::of::<T>()).cloned();
        match local {
            Some(service) => service.downcast::<T>().ok(),
            None => self.0.parent.as_ref().and_then(|parent| parent.get::<T>()),
        }
    }

    /// Like [`Context::get`] but fails with [`EditorError::MissingService`]
    pub fn require<T: Any>(&self) -> Result<Rc<T>, EditorError> {
        self.get::<T>()
            .ok_or(EditorError::MissingService(type_name::<T>()))
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.get::<T>().is_some()
    }

    /// `true` if both handles refer to the same level
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn depth(&self) -> usize {
        self.parent().map_or(0, |parent| parent.depth() + 1)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("services", &self.0.services.borrow().len())
            .finish()
    }
}
