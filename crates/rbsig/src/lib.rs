//! Ruby inline type signatures: extraction, normalization, and re-emission.
//!
//! `rbsig` parses Ruby source carrying Sorbet-style `sig` annotations into
//! a dialect-neutral declaration IR, resolves same-named sibling
//! declarations after merging several parsed trees, and serializes the
//! result as RBI or RBS signature files.
//!
//! # Architecture
//!
//! ```text
//! Annotated Ruby          IR                   Output Dialects
//! ──────────────    ───────────────────    ───────────────────
//! sig { ... }   ─┐                       ┌─> RBI (output/rbi.rs)
//! def foo(...)  ─┼─> Node tree ─ resolve ┤
//! attr_* / prop ─┘    (ir/)     (merge)  └─> RbiToRbs ─> RBS
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rbsig::{parse_ruby, resolve, EmitOptions, Namespace, RbiEmitter};
//!
//! let mut root = Namespace::root();
//! for node in parse_ruby(source)? {
//!     root.append(node);
//! }
//! resolve::resolve_conflicts(&mut root, &mut resolve::keep_first)?;
//!
//! let rbi = RbiEmitter::emit(&root, EmitOptions::default());
//! ```

pub mod ir;
pub mod registry;
pub mod traits;

pub mod convert;
pub mod input;
pub mod output;
pub mod resolve;

// Re-exports: IR types
pub use ir::{
    ArbitraryNode, AttributeKind, AttributeNode, Block, ClassDetails, ConstantNode, ConstantValue, Dialect,
    EnumDetails, Enumerator, MergeEq, MethodNode, MethodSignature, MixinNode, Namespace,
    NamespaceKind, Node, Parameter, ParameterKind, Prop, StructDetails, TypeExpr,
};

// Re-exports: pipeline stages
pub use convert::{RbiToRbs, Warning};
pub use input::{NodePath, ParseError, PathError};
#[cfg(feature = "read-ruby")]
pub use input::parse_ruby;
pub use resolve::{ResolutionStrategy, ResolveError, resolve_conflicts};

// Re-exports: emission
pub use output::EmitOptions;
#[cfg(feature = "write-rbi")]
pub use output::RbiEmitter;
#[cfg(feature = "write-rbs")]
pub use output::RbsEmitter;
pub use traits::Emitter;
