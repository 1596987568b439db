//! Traits for dialect emitters.

use crate::ir::{Dialect, Namespace};
use crate::output::EmitOptions;

/// An emitter serializes a declaration tree into one dialect's syntax.
pub trait Emitter: Send + Sync {
    /// The dialect this emitter produces.
    fn dialect(&self) -> Dialect;

    /// File extension for output (e.g., "rbi").
    fn extension(&self) -> &'static str;

    /// Serialize the children of `root` as a source file.
    fn emit(&self, root: &Namespace, options: &EmitOptions) -> String;
}
