//! # Hextant Core
//!
//! Projectional editing engine: a live tree of typed editors mirroring an
//! abstract syntax tree, edited directly instead of through text and a parser.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ view layer (not part of this crate)         │
//! └─────────────────────────────────────────────┘
//!            ↓ operations        ↑ EditorView notifications
//! ┌─────────────────────────────────────────────┐
//! │ EditorTree: arena of editors                │
//! │  - Tokens, expanders, compounds, lists      │
//! │  - CompileResult propagation to the root    │
//! │  - Snapshots, copy/paste, move between      │
//! │    contexts                                 │
//! └─────────────────────────────────────────────┘
//!            ↓ TreeEdit                ↓ lookups
//! ┌──────────────────────┐  ┌────────────────────┐
//! │ UndoManager          │  │ Context            │
//! │  - merge, compounds  │  │  - Settings        │
//! │  - undo / redo       │  │  - EditorRegistry  │
//! └──────────────────────┘  └────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Results are derived**: every editor caches a [`CompileResult`] that is
//!    recomputed synchronously by the operation that changed it
//! 2. **Errors stay local**: a broken editor reports `Err`, its ancestors only
//!    report `ChildErr`
//! 3. **Edits hold snapshots**: recorded edits never keep discarded editors
//!    alive and find their editors again through [`VirtualEditor`] paths
//! 4. **Configuration is passed in**: expander configurations and services
//!    live in a [`Context`], never in globals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hextant_core::{default_context, EditorTree, Settings, TreeUndo};
//!
//! let context = default_context(Settings::default(), registry);
//! let mut tree = EditorTree::new();
//!
//! let expr = tree.new_expander(expr_expander, &context);
//! tree.set_text(expr, "42")?;
//! tree.expand(expr)?;
//! assert_eq!(tree.result(expr)?, &CompileResult::ok(Expr::Int(42)));
//!
//! let undo = context.require::<TreeUndo<Expr>>()?;
//! undo.undo(&mut tree)?;
//! ```

mod accessor;
mod completion;
mod compound;
mod context;
mod edits;
mod errors;
mod expander;
mod expander_config;
mod list;
mod registry;
mod settings;
mod snapshot;
mod token;
mod tree;
mod undo_stack;
mod view;

pub use accessor::{Accessor, VirtualEditor};
pub use completion::{Completion, CompletionItem, CompletionKind};
pub use compound::CompoundKind;
pub use context::Context;
pub use edits::TreeEdit;
pub use errors::{execute_safely, EditorError, HookResult};
pub use expander::{ConfiguredExpander, ExpanderKind, ExpanderNode, ExpanderSnapshot, ExpanderState};
pub use expander_config::ExpanderConfig;
pub use list::ListKind;
pub use registry::{EditorClass, EditorRegistry};
pub use settings::{default_context, Settings};
pub use snapshot::{Snapshot, SnapshotState};
pub use token::{SimpleToken, TokenState, TokenType};
pub use tree::{EditorId, EditorKind, EditorTree, Node, NodeKind, TreeUndo, Value};
pub use undo_stack::{CompoundEdit, Deactivation, Edit, UndoManager};
pub use view::{EditorView, ViewSet};

// Re-export common types for convenience
pub use hextant_common::{compile, CompileResult, Failure, OptionExt, Termination};
