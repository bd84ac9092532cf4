//! # Hextant Common
//!
//! Result types shared by every Hextant editor.

pub mod error;
pub mod result;

pub use error::*;
pub use result::*;
