//! # Compile results
//!
//! Every editor in a tree produces a [`CompileResult`]. It distinguishes an
//! editor that is broken itself ([`CompileResult::Err`]) from an editor that is
//! fine but contains a broken descendant ([`CompileResult::ChildErr`]).
//!
//! ## Early return
//!
//! Composing several sub-results is done inside a [`compile`] block, where
//! [`CompileResult::or_child_err`] and [`CompileResult::or_terminate`] turn a
//! failed sub-result into a [`Termination`] that `?` carries to the boundary:
//!
//! ```rust
//! use hextant_common::{compile, CompileResult};
//!
//! let lhs = CompileResult::ok(1);
//! let rhs: CompileResult<i32> = CompileResult::err("not a number");
//!
//! let sum = compile(|| Ok(lhs.clone().or_child_err()? + rhs.clone().or_child_err()?));
//! assert!(sum.is_child_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Failure, Termination};

/// Outcome of compiling the state of one editor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompileResult<T> {
    /// The editor compiled successfully
    Ok(T),

    /// The editor itself is invalid
    Err(String),

    /// The editor is valid but one of its descendants is not
    ChildErr,
}

impl<T> CompileResult<T> {
    pub fn ok(value: T) -> Self {
        CompileResult::Ok(value)
    }

    pub fn err(message: impl Into<String>) -> Self {
        CompileResult::Err(message.into())
    }

    pub fn child_err() -> Self {
        CompileResult::ChildErr
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CompileResult::Ok(_))
    }

    /// `true` for both [`CompileResult::Err`] and [`CompileResult::ChildErr`]
    pub fn is_error(&self) -> bool {
        !self.is_ok()
    }

    pub fn is_err(&self) -> bool {
        matches!(self, CompileResult::Err(_))
    }

    pub fn is_child_err(&self) -> bool {
        matches!(self, CompileResult::ChildErr)
    }

    /// Local error message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            CompileResult::Err(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> CompileResult<&T> {
        match self {
            CompileResult::Ok(value) => CompileResult::Ok(value),
            CompileResult::Err(message) => CompileResult::Err(message.clone()),
            CompileResult::ChildErr => CompileResult::ChildErr,
        }
    }

    pub fn map<R>(self, f: impl FnOnce(T) -> R) -> CompileResult<R> {
        match self {
            CompileResult::Ok(value) => CompileResult::Ok(f(value)),
            CompileResult::Err(message) => CompileResult::Err(message),
            CompileResult::ChildErr => CompileResult::ChildErr,
        }
    }

    pub fn flat_map<R>(self, f: impl FnOnce(T) -> CompileResult<R>) -> CompileResult<R> {
        match self {
            CompileResult::Ok(value) => f(value),
            CompileResult::Err(message) => CompileResult::Err(message),
            CompileResult::ChildErr => CompileResult::ChildErr,
        }
    }

    /// Keep an ok result, otherwise evaluate `alternative`
    pub fn or_else(self, alternative: impl FnOnce() -> CompileResult<T>) -> CompileResult<T> {
        match self {
            CompileResult::Ok(_) => self,
            _ => alternative(),
        }
    }

    pub fn or(self, alternative: CompileResult<T>) -> CompileResult<T> {
        self.or_else(|| alternative)
    }

    /// Return the value or hand the failure to `handler`
    pub fn if_err(self, handler: impl FnOnce(Failure) -> T) -> T {
        match self {
            CompileResult::Ok(value) => value,
            CompileResult::Err(message) => handler(Failure::Err(message)),
            CompileResult::ChildErr => handler(Failure::ChildErr),
        }
    }

    /// Return the value of an ok result.
    ///
    /// # Panics
    ///
    /// Panics if the result is not ok. Only call this where okness was checked before.
    pub fn force(self) -> T {
        self.if_err(|failure| panic!("attempt to force {failure}"))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            CompileResult::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// Unwrap inside a [`compile`] block, keeping the failure as it is
    pub fn or_terminate(self) -> Result<T, Termination> {
        match self {
            CompileResult::Ok(value) => Ok(value),
            CompileResult::Err(message) => Err(Termination(Failure::Err(message))),
            CompileResult::ChildErr => Err(Termination(Failure::ChildErr)),
        }
    }

    /// Unwrap inside a [`compile`] block, flattening any failure to a child error
    pub fn or_child_err(self) -> Result<T, Termination> {
        match self {
            CompileResult::Ok(value) => Ok(value),
            _ => Err(Termination(Failure::ChildErr)),
        }
    }

    /// Collect sub-results; any failure becomes a [`CompileResult::ChildErr`]
    pub fn sequence(results: impl IntoIterator<Item = CompileResult<T>>) -> CompileResult<Vec<T>> {
        let mut values = Vec::new();
        for result in results {
            match result {
                CompileResult::Ok(value) => values.push(value),
                _ => return CompileResult::ChildErr,
            }
        }
        CompileResult::Ok(values)
    }
}

impl<T> From<Failure> for CompileResult<T> {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Err(message) => CompileResult::Err(message),
            Failure::ChildErr => CompileResult::ChildErr,
        }
    }
}

/// Run `body`, converting an early [`Termination`] back into a result
pub fn compile<T>(body: impl FnOnce() -> Result<T, Termination>) -> CompileResult<T> {
    match body() {
        Ok(value) => CompileResult::Ok(value),
        Err(Termination(failure)) => failure.into(),
    }
}

/// Conversions from optional values
pub trait OptionExt<T> {
    fn ok_or_err(self, message: impl FnOnce() -> String) -> CompileResult<T>;

    fn ok_or_child_err(self) -> CompileResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_err(self, message: impl FnOnce() -> String) -> CompileResult<T> {
        match self {
            Some(value) => CompileResult::Ok(value),
            None => CompileResult::Err(message()),
        }
    }

    fn ok_or_child_err(self) -> CompileResult<T> {
        match self {
            Some(value) => CompileResult::Ok(value),
            None => CompileResult::ChildErr,
        }
    }
}
