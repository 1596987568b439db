//! Source readers.
//!
//! Each reader reconstructs declaration [`Node`](crate::ir::Node)s from an
//! annotated source file. Readers fail fast: an unrecognized shape aborts
//! the whole file rather than producing a partial tree.

pub mod path;
#[cfg(feature = "read-ruby")]
pub mod ruby;

pub use path::{NodePath, PathError};
#[cfg(feature = "read-ruby")]
pub use ruby::parse_ruby;

/// Error that can occur when reading annotated source into the IR.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported syntax: {0}")]
    Unsupported(String),

    #[error("expected {expected}, got {got}")]
    UnexpectedNode { expected: String, got: String },

    #[error(transparent)]
    Path(#[from] PathError),
}
