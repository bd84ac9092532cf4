//! Completion candidates offered to tokens and expanders
//!
//! A completion UI hands structured candidates to the core. Their concrete type
//! is erased into a [`CompletionItem`]: the candidate's stable class name plus
//! its JSON encoding, so it can be stored in snapshots and decoded again by the
//! interceptors registered for that class.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::EditorError;

/// A serializable candidate type with a stable class name
pub trait CompletionKind: Serialize + DeserializeOwned {
    const CLASS: &'static str;
}

/// A type-erased completion candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub class: String,
    pub value: serde_json::Value,
}

impl CompletionItem {
    pub fn of<T: CompletionKind>(item: &T) -> Result<Self, EditorError> {
        Ok(Self {
            class: T::CLASS.to_string(),
            value: serde_json::to_value(item)?,
        })
    }

    pub fn raw(class: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            class: class.into(),
            value,
        }
    }

    pub fn is<T: CompletionKind>(&self) -> bool {
        self.class == T::CLASS
    }

    pub fn decode<T: CompletionKind>(&self) -> Result<T, EditorError> {
        if !self.is::<T>() {
            return Err(EditorError::SnapshotMismatch {
                expected: T::CLASS.to_string(),
                found: self.class.clone(),
            });
        }
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// A candidate chosen by the user together with its display text
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub item: CompletionItem,
    pub completion_text: String,
}

impl Completion {
    pub fn new(item: CompletionItem, completion_text: impl Into<String>) -> Self {
        Self {
            item,
            completion_text: completion_text.into(),
        }
    }

    /// Build a completion from a typed candidate
    pub fn of<T: CompletionKind>(
        item: &T,
        completion_text: impl Into<String>,
    ) -> Result<Self, EditorError> {
        Ok(Self::new(CompletionItem::of(item)?, completion_text))
    }
}
