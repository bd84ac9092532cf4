//! # Expander Configuration
//!
//! An ordered set of factories an expander consults when its text (or a
//! chosen completion) should become an editor.
//!
//! ## Resolution order
//!
//! For a text:
//! 1. Constant factories registered for exactly that text
//! 2. Interceptors, the most recently registered first; each may decline
//! 3. The fallback configuration
//!
//! For a completion item, interceptors registered for the item's class are
//! tried (most recently registered first), then the fallback.
//!
//! A configuration only changes through explicit `register_*`/`unregister_key`
//! calls. Several languages compose by falling back to one another.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::completion::{CompletionItem, CompletionKind};
use crate::context::Context;
use crate::errors::EditorError;
use crate::token::TokenType;
use crate::tree::{EditorId, EditorTree, Value};

type Factory<V> = Rc<dyn Fn(&mut EditorTree<V>, &Context) -> EditorId>;
type Interceptor<V> = Rc<dyn Fn(&mut EditorTree<V>, &str, &Context) -> Option<EditorId>>;
type ItemInterceptor<V> =
    Rc<dyn Fn(&mut EditorTree<V>, &CompletionItem, &Context) -> Option<EditorId>>;

pub struct ExpanderConfig<V: Value> {
    fallback: Option<Rc<ExpanderConfig<V>>>,
    constant: HashMap<String, Factory<V>>,

    /// Highest priority first
    interceptors: Vec<Interceptor<V>>,

    /// By completion class, highest priority first
    item_interceptors: HashMap<String, Vec<ItemInterceptor<V>>>,
}

impl<V: Value> ExpanderConfig<V> {
    pub fn new() -> Self {
        Self {
            fallback: None,
            constant: HashMap::new(),
            interceptors: Vec::new(),
            item_interceptors: HashMap::new(),
        }
    }

    /// Use `fallback` when nothing in this configuration matches
    pub fn with_fallback(mut self, fallback: Rc<ExpanderConfig<V>>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// A new, empty configuration falling back to this one
    pub fn extend(self: &Rc<Self>) -> ExpanderConfig<V> {
        ExpanderConfig::new().with_fallback(self.clone())
    }

    /// `config` first, this configuration as its fallback
    pub fn extend_with(self: &Rc<Self>, config: ExpanderConfig<V>) -> ExpanderConfig<V> {
        config.with_fallback(self.clone())
    }

    /// Copy all factories of `config` into this one.
    ///
    /// Constants of `config` replace equal keys, its interceptors are tried after
    /// the ones already registered.
    pub fn also_use(&mut self, config: &ExpanderConfig<V>) {
        for (key, factory) in &config.constant {
            self.constant.insert(key.clone(), factory.clone());
        }
        self.interceptors.extend(config.interceptors.iter().cloned());
        for (class, interceptors) in &config.item_interceptors {
            self.item_interceptors
                .entry(class.clone())
                .or_default()
                .extend(interceptors.iter().cloned());
        }
    }

    /// Expanding exactly `key` creates an editor with `create`.
    ///
    /// A previous factory for the same key is replaced.
    pub fn register_key(
        &mut self,
        key: impl Into<String>,
        create: impl Fn(&mut EditorTree<V>, &Context) -> EditorId + 'static,
    ) {
        self.constant.insert(key.into(), Rc::new(create));
    }

    /// Register the same factory for several keys
    pub fn register_keys<K: Into<String>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        create: impl Fn(&mut EditorTree<V>, &Context) -> EditorId + 'static,
    ) {
        let create: Factory<V> = Rc::new(create);
        for key in keys {
            self.constant.insert(key.into(), create.clone());
        }
    }

    pub fn unregister_key(&mut self, key: &str) -> Result<(), EditorError> {
        self.constant
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| EditorError::UnknownKey(key.to_string()))
    }

    /// Interceptors registered last are tried first
    pub fn register_interceptor(
        &mut self,
        interceptor: impl Fn(&mut EditorTree<V>, &str, &Context) -> Option<EditorId> + 'static,
    ) {
        self.interceptors.insert(0, Rc::new(interceptor));
    }

    /// Texts that compile with `token` become editors made by `create`
    pub fn register_token_interceptor(
        &mut self,
        token: Rc<dyn TokenType<V>>,
        create: impl Fn(&mut EditorTree<V>, V, &Context) -> EditorId + 'static,
    ) {
        self.register_interceptor(move |tree, text, context| {
            let value = token.compile(text).into_option()?;
            Some(create(tree, value, context))
        });
    }

    /// Intercept completion items of class `T::CLASS`.
    ///
    /// Interceptors registered last are tried first.
    pub fn register_item_interceptor<T: CompletionKind + 'static>(
        &mut self,
        interceptor: impl Fn(&mut EditorTree<V>, T, &Context) -> Option<EditorId> + 'static,
    ) {
        let interceptor: ItemInterceptor<V> = Rc::new(
            move |tree: &mut EditorTree<V>, item: &CompletionItem, context: &Context| {
                let item = item.decode::<T>().ok()?;
                interceptor(tree, item, context)
            },
        );
        self.item_interceptors
            .entry(T::CLASS.to_string())
            .or_default()
            .insert(0, interceptor);
    }

    /// All constant keys, including the ones of fallbacks
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.constant.keys().cloned().collect();
        if let Some(fallback) = &self.fallback {
            keys.extend(fallback.keys());
        }
        keys
    }

    /// Make an editor from `text`, or `None` if nothing matches
    pub fn expand_text(
        &self,
        tree: &mut EditorTree<V>,
        text: &str,
        context: &Context,
    ) -> Option<EditorId> {
        if let Some(create) = self.constant.get(text) {
            return Some(create(tree, context));
        }
        for interceptor in &self.interceptors {
            if let Some(editor) = interceptor(tree, text, context) {
                return Some(editor);
            }
        }
        self.fallback
            .as_ref()
            .and_then(|fallback| fallback.expand_text(tree, text, context))
    }

    /// Make an editor from a completion item, or `None` if nothing matches
    pub fn expand_item(
        &self,
        tree: &mut EditorTree<V>,
        item: &CompletionItem,
        context: &Context,
    ) -> Option<EditorId> {
        if let Some(interceptors) = self.item_interceptors.get(&item.class) {
            for interceptor in interceptors {
                if let Some(editor) = interceptor(tree, item, context) {
                    return Some(editor);
                }
            }
        }
        self.fallback
            .as_ref()
            .and_then(|fallback| fallback.expand_item(tree, item, context))
    }
}

impl<V: Value> Default for ExpanderConfig<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> fmt::Debug for ExpanderConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.constant.keys().collect();
        keys.sort();
        f.debug_struct("ExpanderConfig")
            .field("keys", &keys)
            .field("interceptors", &self.interceptors.len())
            .field("item_classes", &self.item_interceptors.len())
            .field("fallback", &self.fallback)
            .finish()
    }
}
