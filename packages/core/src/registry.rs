//! Editor classes and the registry used for polymorphic reconstruction

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::compound::CompoundKind;
use crate::errors::EditorError;
use crate::expander::ExpanderKind;
use crate::list::ListKind;
use crate::token::TokenType;
use crate::tree::Value;

/// Everything needed to create a fresh editor
pub enum EditorClass<V: Value> {
    Token(Rc<dyn TokenType<V>>),
    Expander(Rc<dyn ExpanderKind<V>>),
    Compound(Rc<dyn CompoundKind<V>>),
    List(Rc<dyn ListKind<V>>),
}

impl<V: Value> EditorClass<V> {
    /// Stable name, recorded as `_class` in snapshots
    pub fn name(&self) -> &str {
        match self {
            EditorClass::Token(ty) => ty.name(),
            EditorClass::Expander(kind) => kind.name(),
            EditorClass::Compound(kind) => kind.name(),
            EditorClass::List(kind) => kind.name(),
        }
    }
}

impl<V: Value> Clone for EditorClass<V> {
    fn clone(&self) -> Self {
        match self {
            EditorClass::Token(ty) => EditorClass::Token(ty.clone()),
            EditorClass::Expander(kind) => EditorClass::Expander(kind.clone()),
            EditorClass::Compound(kind) => EditorClass::Compound(kind.clone()),
            EditorClass::List(kind) => EditorClass::List(kind.clone()),
        }
    }
}

impl<V: Value> fmt::Debug for EditorClass<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            EditorClass::Token(_) => "Token",
            EditorClass::Expander(_) => "Expander",
            EditorClass::Compound(_) => "Compound",
            EditorClass::List(_) => "List",
        };
        f.debug_tuple(variant).field(&self.name()).finish()
    }
}

/// Editor classes by name
pub struct EditorRegistry<V: Value> {
    classes: HashMap<String, EditorClass<V>>,
}

impl<V: Value> EditorRegistry<V> {
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
        }
    }

    /// Register `class` under its name, replacing a previous registration
    pub fn register(&mut self, class: EditorClass<V>) {
        self.classes.insert(class.name().to_string(), class);
    }

    pub fn with(mut self, class: EditorClass<V>) -> Self {
        self.register(class);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EditorClass<V>> {
        self.classes.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<EditorClass<V>, EditorError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| EditorError::UnknownClass(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<V: Value> Default for EditorRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> fmt::Debug for EditorRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorRegistry")
            .field("classes", &self.names())
            .finish()
    }
}
