use std::fmt;

use thiserror::Error;

/// The two ways a compilation can fail
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Failure {
    /// The editor itself is invalid
    Err(String),

    /// A descendant of the editor is invalid
    ChildErr,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Err(message) => write!(f, "Err({})", message),
            Failure::ChildErr => write!(f, "ChildErr"),
        }
    }
}

/// Signals that a [`compile`](crate::compile) block should stop with the carried failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("compilation terminated with {0}")]
pub struct Termination(pub Failure);

impl Termination {
    pub fn err(message: impl Into<String>) -> Self {
        Termination(Failure::Err(message.into()))
    }

    pub fn child_err() -> Self {
        Termination(Failure::ChildErr)
    }
}
