//! Editor settings and the default context
//!
//! Settings are plain JSON with camelCase keys; missing keys keep their
//! defaults.
//!
//! ```json
//! { "undoLevels": 50, "listSeparator": ";" }
//! ```

use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::Context;
use crate::errors::EditorError;
use crate::registry::EditorRegistry;
use crate::tree::{TreeUndo, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Maximum number of undo levels kept
    pub undo_levels: usize,

    /// Typing this character at the end of a list item opens a new item
    pub list_separator: Option<char>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            undo_levels: 100,
            list_separator: Some(','),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        serde_json::from_str(json).map_err(|e| EditorError::Settings(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| EditorError::Settings(format!("{}: {}", path.display(), e)))?;
        let settings = Self::from_json(&json)?;
        debug!(path = %path.display(), ?settings, "Loaded settings");
        Ok(settings)
    }
}

/// Root context providing `settings`, an undo manager and `registry`
pub fn default_context<V: Value>(settings: Settings, registry: EditorRegistry<V>) -> Context {
    let context = Context::root();
    context.set_rc(Rc::new(TreeUndo::<V>::with_max_levels(settings.undo_levels)));
    context.set(settings);
    context.set(registry);
    context
}
