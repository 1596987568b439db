//! The type-expression algebra.
//!
//! [`TypeExpr`] is a closed recursive value model for the type annotations
//! that appear in interface files. Construction never fails: any text that
//! isn't one of the structured forms is carried verbatim as [`TypeExpr::Raw`].
//! Rendering is pure and deterministic, one renderer per output dialect plus
//! a dialect-neutral description used in diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// An output dialect the algebra can render to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    /// Sorbet RBI syntax (`T.nilable(String)`, `T::Array[Integer]`, ...).
    Rbi,
    /// RBS syntax (`String?`, `Array[Integer]`, ...).
    Rbs,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Rbi => "rbi",
            Dialect::Rbs => "rbs",
        }
    }
}

/// A type expression.
///
/// Structural equality: two expressions are equal iff they are built from
/// the same variants with equal payloads, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// Verbatim type text from the source dialect.
    Raw(String),
    /// A type or nil.
    Nilable(Box<TypeExpr>),
    /// Any one of the member types.
    Union(Vec<TypeExpr>),
    /// All of the member types at once.
    Intersection(Vec<TypeExpr>),
    /// An array of the element type.
    Array(Box<TypeExpr>),
    /// A hash from key type to value type.
    Hash {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// A user generic applied to type parameters.
    Generic {
        base: String,
        params: Vec<TypeExpr>,
    },
    /// A callable with named parameters and an optional return type
    /// (`None` means the callable returns nothing useful).
    Proc {
        params: Vec<(String, TypeExpr)>,
        returns: Option<Box<TypeExpr>>,
    },
    /// True or false.
    Boolean,
    /// The source dialect's escape hatch.
    Untyped,
    /// An inline record with ordered named fields.
    Record(Vec<(String, TypeExpr)>),
}

impl TypeExpr {
    /// Render to the given dialect's textual syntax.
    pub fn render(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::Rbi => self.render_rbi(),
            Dialect::Rbs => self.render_rbs(),
        }
    }

    fn render_rbi(&self) -> String {
        match self {
            TypeExpr::Raw(text) => text.clone(),
            TypeExpr::Nilable(inner) => format!("T.nilable({})", inner.render_rbi()),
            TypeExpr::Union(members) => format!("T.any({})", join_rbi(members)),
            TypeExpr::Intersection(members) => format!("T.all({})", join_rbi(members)),
            TypeExpr::Array(element) => format!("T::Array[{}]", element.render_rbi()),
            TypeExpr::Hash { key, value } => {
                format!("T::Hash[{}, {}]", key.render_rbi(), value.render_rbi())
            }
            TypeExpr::Generic { base, params } => format!("{}[{}]", base, join_rbi(params)),
            TypeExpr::Proc { params, returns } => {
                let mut out = String::from("T.proc");
                if !params.is_empty() {
                    let rendered: Vec<String> = params
                        .iter()
                        .map(|(name, ty)| format!("{}: {}", name, ty.render_rbi()))
                        .collect();
                    write!(out, ".params({})", rendered.join(", ")).ok();
                }
                match returns {
                    Some(ty) => write!(out, ".returns({})", ty.render_rbi()).ok(),
                    None => write!(out, ".void").ok(),
                };
                out
            }
            TypeExpr::Boolean => "T::Boolean".into(),
            TypeExpr::Untyped => "T.untyped".into(),
            TypeExpr::Record(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{}: {}", name, ty.render_rbi()))
                    .collect();
                format!("{{ {} }}", rendered.join(", "))
            }
        }
    }

    fn render_rbs(&self) -> String {
        match self {
            TypeExpr::Raw(text) => text.clone(),
            TypeExpr::Nilable(inner) => {
                // Procs need the grouping parentheses; `^() -> X?` would
                // attach the marker to the return type instead.
                if matches!(inner.as_ref(), TypeExpr::Proc { .. }) {
                    format!("({})?", inner.render_rbs())
                } else {
                    format!("{}?", inner.render_rbs())
                }
            }
            TypeExpr::Union(members) => format!("({})", join_rbs(members, " | ")),
            TypeExpr::Intersection(members) => format!("({})", join_rbs(members, " & ")),
            TypeExpr::Array(element) => format!("Array[{}]", element.render_rbs()),
            TypeExpr::Hash { key, value } => {
                format!("Hash[{}, {}]", key.render_rbs(), value.render_rbs())
            }
            TypeExpr::Generic { base, params } => {
                format!("{}[{}]", base, join_rbs(params, ", "))
            }
            TypeExpr::Proc { params, returns } => {
                let rendered: Vec<String> = params
                    .iter()
                    .map(|(name, ty)| format!("{} {}", ty.render_rbs(), name))
                    .collect();
                let ret = match returns {
                    Some(ty) => ty.render_rbs(),
                    None => "void".into(),
                };
                format!("^({}) -> {}", rendered.join(", "), ret)
            }
            TypeExpr::Boolean => "bool".into(),
            TypeExpr::Untyped => "untyped".into(),
            TypeExpr::Record(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{}: {}", name, ty.render_rbs()))
                    .collect();
                format!("{{ {} }}", rendered.join(", "))
            }
        }
    }

    /// A dialect-neutral, human-readable description of the expression.
    pub fn describe(&self) -> String {
        match self {
            TypeExpr::Raw(text) => text.clone(),
            TypeExpr::Nilable(inner) => format!("Nilable<{}>", inner.describe()),
            TypeExpr::Union(members) => format!("Union<{}>", join_describe(members)),
            TypeExpr::Intersection(members) => {
                format!("Intersection<{}>", join_describe(members))
            }
            TypeExpr::Array(element) => format!("Array<{}>", element.describe()),
            TypeExpr::Hash { key, value } => {
                format!("Hash<{}, {}>", key.describe(), value.describe())
            }
            TypeExpr::Generic { base, params } => format!("{}<{}>", base, join_describe(params)),
            TypeExpr::Proc { params, returns } => {
                let rendered: Vec<String> = params
                    .iter()
                    .map(|(name, ty)| format!("{}: {}", name, ty.describe()))
                    .collect();
                let ret = match returns {
                    Some(ty) => ty.describe(),
                    None => "void".into(),
                };
                format!("Proc<({}) -> {}>", rendered.join(", "), ret)
            }
            TypeExpr::Boolean => "bool".into(),
            TypeExpr::Untyped => "untyped".into(),
            TypeExpr::Record(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{}: {}", name, ty.describe()))
                    .collect();
                format!("Record<{}>", rendered.join(", "))
            }
        }
    }

    /// Whether this expression means "no useful type information".
    ///
    /// Covers the structured [`TypeExpr::Untyped`] variant and the raw
    /// spelling the source dialect uses for the same thing.
    pub fn is_untyped(&self) -> bool {
        match self {
            TypeExpr::Untyped => true,
            TypeExpr::Raw(text) => text == "T.untyped",
            _ => false,
        }
    }

    // Convenience constructors for the boxed variants.

    pub fn nilable(inner: impl Into<TypeExpr>) -> TypeExpr {
        TypeExpr::Nilable(Box::new(inner.into()))
    }

    pub fn array(element: impl Into<TypeExpr>) -> TypeExpr {
        TypeExpr::Array(Box::new(element.into()))
    }

    pub fn hash(key: impl Into<TypeExpr>, value: impl Into<TypeExpr>) -> TypeExpr {
        TypeExpr::Hash {
            key: Box::new(key.into()),
            value: Box::new(value.into()),
        }
    }
}

/// Bare text becomes [`TypeExpr::Raw`]; composites pass through via the
/// blanket identity of `Into`.
impl From<&str> for TypeExpr {
    fn from(text: &str) -> Self {
        TypeExpr::Raw(text.to_string())
    }
}

impl From<String> for TypeExpr {
    fn from(text: String) -> Self {
        TypeExpr::Raw(text)
    }
}

fn join_rbi(members: &[TypeExpr]) -> String {
    members
        .iter()
        .map(TypeExpr::render_rbi)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_rbs(members: &[TypeExpr], separator: &str) -> String {
    members
        .iter()
        .map(TypeExpr::render_rbs)
        .collect::<Vec<_>>()
        .join(separator)
}

fn join_describe(members: &[TypeExpr]) -> String {
    members
        .iter()
        .map(TypeExpr::describe)
        .collect::<Vec<_>>()
        .join(", ")
}
