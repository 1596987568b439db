//! The declaration IR.
//!
//! A tagged, ordered tree of interface declarations: namespaces (classes,
//! modules, enums, structs) and their contents (methods, attributes,
//! constants, mixin directives). The tree is dialect-neutral; emitters and
//! the converter interpret it per dialect.
//!
//! Every dispatch over the tree matches exhaustively on [`Node`] so a new
//! variant is a compile-time checklist, not a runtime fallthrough.

pub mod builder;
pub mod merge_eq;
pub mod types;

pub use merge_eq::MergeEq;
pub use types::{Dialect, TypeExpr};

use serde::{Deserialize, Serialize};

/// A declaration node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Namespace(Namespace),
    Method(MethodNode),
    Attribute(AttributeNode),
    Constant(ConstantNode),
    Extend(MixinNode),
    Include(MixinNode),
    Arbitrary(ArbitraryNode),
}

impl Node {
    /// The name this node is addressed by among its siblings.
    pub fn name(&self) -> &str {
        match self {
            Node::Namespace(ns) => &ns.name,
            Node::Method(m) => &m.name,
            Node::Attribute(a) => &a.name,
            Node::Constant(c) => &c.name,
            Node::Extend(m) | Node::Include(m) => &m.target,
            Node::Arbitrary(a) => &a.code,
        }
    }

    pub fn comments(&self) -> &[String] {
        match self {
            Node::Namespace(ns) => &ns.comments,
            Node::Method(m) => &m.comments,
            Node::Attribute(a) => &a.comments,
            Node::Constant(c) => &c.comments,
            Node::Extend(m) | Node::Include(m) => &m.comments,
            Node::Arbitrary(a) => &a.comments,
        }
    }

    /// A short human label for diagnostics, e.g. `class Foo` or `method bar`.
    pub fn describe(&self) -> String {
        match self {
            Node::Namespace(ns) => format!("{} {}", ns.kind.label(), ns.name),
            Node::Method(m) => format!("method {}", m.name),
            Node::Attribute(a) => format!("attribute {}", a.name),
            Node::Constant(c) => format!("constant {}", c.name),
            Node::Extend(m) => format!("extend {}", m.target),
            Node::Include(m) => format!("include {}", m.target),
            Node::Arbitrary(_) => "arbitrary code".into(),
        }
    }
}

/// A container declaration: ordered children plus mixin directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub comments: Vec<String>,
    pub children: Vec<Node>,
    /// Mixin targets applied at the class level. First-seen order, deduplicated.
    pub extends: Vec<String>,
    /// Mixin targets applied at the instance level. First-seen order, deduplicated.
    pub includes: Vec<String>,
    pub kind: NamespaceKind,
}

impl Namespace {
    pub fn new(name: impl Into<String>, kind: NamespaceKind) -> Self {
        Namespace {
            name: name.into(),
            comments: Vec::new(),
            children: Vec::new(),
            extends: Vec::new(),
            includes: Vec::new(),
            kind,
        }
    }

    /// An unnamed root container for holding top-level declarations.
    pub fn root() -> Self {
        Namespace::new("", NamespaceKind::Plain)
    }
}

/// What kind of container a [`Namespace`] is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NamespaceKind {
    /// An untyped grouping, e.g. an outer segment of a dotted name that no
    /// declaration has filled in yet.
    Plain,
    Class(ClassDetails),
    Module {
        interface: bool,
    },
    /// A class of enumerated values.
    Enum(EnumDetails),
    /// A class of typed properties.
    Struct(StructDetails),
}

impl NamespaceKind {
    pub fn label(&self) -> &'static str {
        match self {
            NamespaceKind::Plain => "namespace",
            NamespaceKind::Class(_) => "class",
            NamespaceKind::Module { .. } => "module",
            NamespaceKind::Enum(_) => "enum",
            NamespaceKind::Struct(_) => "struct",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDetails {
    pub superclass: Option<String>,
    pub is_abstract: bool,
    pub is_final: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumDetails {
    pub class: ClassDetails,
    pub enumerators: Vec<Enumerator>,
}

/// One named value of an enum, optionally with a custom literal serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    pub serialized: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructDetails {
    pub class: ClassDetails,
    pub props: Vec<Prop>,
}

/// One named, typed field of a struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub name: String,
    pub ty: TypeExpr,
    pub optional: bool,
    pub immutable: bool,
    /// Verbatim source of the default or factory expression, if any.
    pub default: Option<String>,
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodNode {
    pub name: String,
    pub comments: Vec<String>,
    pub parameters: Vec<Parameter>,
    /// `None` means the method returns nothing useful (void).
    pub return_type: Option<TypeExpr>,
    pub is_abstract: bool,
    pub implementation: bool,
    pub is_override: bool,
    pub overridable: bool,
    pub is_final: bool,
    /// True for methods defined on the type itself rather than instances.
    pub class_level: bool,
    pub type_parameters: Vec<String>,
    /// Extra signatures for overload-capable dialects, beyond the primary
    /// parameters/return pair.
    pub overloads: Vec<MethodSignature>,
    /// Block descriptor for dialects that spell blocks outside the
    /// parameter list. Attached by the converter; ignored by emitters of
    /// dialects that keep the block in the parameter list.
    pub block: Option<Block>,
}

impl MethodNode {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        return_type: Option<TypeExpr>,
    ) -> Self {
        MethodNode {
            name: name.into(),
            comments: Vec::new(),
            parameters,
            return_type,
            is_abstract: false,
            implementation: false,
            is_override: false,
            overridable: false,
            is_final: false,
            class_level: false,
            type_parameters: Vec::new(),
            overloads: Vec::new(),
            block: None,
        }
    }
}

/// One overload signature of a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeExpr>,
    pub type_parameters: Vec<String>,
}

/// A block descriptor attached to a converted method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// The callable shape, either a [`TypeExpr::Proc`] or a raw
    /// callable-type source fragment.
    pub proc_type: TypeExpr,
    pub required: bool,
}

/// An attribute declaration, a shorthand for reader/writer methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeNode {
    pub name: String,
    pub comments: Vec<String>,
    pub kind: AttributeKind,
    pub ty: TypeExpr,
    pub class_level: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    Reader,
    Writer,
    Accessor,
}

/// A constant assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantNode {
    pub name: String,
    pub comments: Vec<String>,
    pub value: ConstantValue,
    /// True for constants defined in singleton scope.
    pub class_level: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstantValue {
    /// Verbatim source of the assigned expression.
    Source(String),
    /// A structured type expression.
    Type(TypeExpr),
}

/// An explicit `extend`/`include` child node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixinNode {
    pub target: String,
    pub comments: Vec<String>,
}

/// Opaque passthrough text. Never mergeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitraryNode {
    pub code: String,
    pub comments: Vec<String>,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// The declared name, including positional markers (`*`, `**`, `&`,
    /// trailing `:`).
    pub name: String,
    pub kind: ParameterKind,
    pub ty: Option<TypeExpr>,
    /// Verbatim source of the default value expression, if any.
    pub default: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    Normal,
    Splat,
    DoubleSplat,
    Block,
    Keyword,
}

impl ParameterKind {
    /// Derive the kind from a name's positional markers.
    pub fn from_name(name: &str) -> ParameterKind {
        if name.starts_with("**") {
            ParameterKind::DoubleSplat
        } else if name.starts_with('*') {
            ParameterKind::Splat
        } else if name.starts_with('&') {
            ParameterKind::Block
        } else if name.ends_with(':') {
            ParameterKind::Keyword
        } else {
            ParameterKind::Normal
        }
    }
}

impl Parameter {
    /// Build a parameter, deriving its kind from the name's markers.
    pub fn new(name: impl Into<String>, ty: Option<TypeExpr>) -> Self {
        let name = name.into();
        let kind = ParameterKind::from_name(&name);
        Parameter {
            name,
            kind,
            ty,
            default: None,
            required: true,
        }
    }

    pub fn with_default(mut self, source: impl Into<String>) -> Self {
        self.default = Some(source.into());
        self.required = false;
        self
    }

    /// The name with positional markers stripped.
    pub fn bare_name(&self) -> &str {
        self.name
            .trim_start_matches(['*', '&'])
            .trim_end_matches(':')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_kind_from_markers() {
        assert_eq!(Parameter::new("a", None).kind, ParameterKind::Normal);
        assert_eq!(Parameter::new("*args", None).kind, ParameterKind::Splat);
        assert_eq!(
            Parameter::new("**opts", None).kind,
            ParameterKind::DoubleSplat
        );
        assert_eq!(Parameter::new("&blk", None).kind, ParameterKind::Block);
        assert_eq!(Parameter::new("key:", None).kind, ParameterKind::Keyword);
    }

    #[test]
    fn test_parameter_bare_name() {
        assert_eq!(Parameter::new("**opts", None).bare_name(), "opts");
        assert_eq!(Parameter::new("&blk", None).bare_name(), "blk");
        assert_eq!(Parameter::new("key:", None).bare_name(), "key");
        assert_eq!(Parameter::new("plain", None).bare_name(), "plain");
    }

    #[test]
    fn test_default_clears_required() {
        let param = Parameter::new("a", Some(TypeExpr::Untyped)).with_default("1");
        assert!(!param.required);
        assert_eq!(param.default.as_deref(), Some("1"));
    }

    #[test]
    fn test_node_json_roundtrip() {
        let node = Node::Method(MethodNode::new(
            "greet",
            vec![Parameter::new("name", Some(TypeExpr::Raw("String".into())))],
            Some(TypeExpr::Raw("String".into())),
        ));
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn test_node_describe() {
        let class = Node::Namespace(Namespace::new(
            "Foo",
            NamespaceKind::Class(ClassDetails::default()),
        ));
        assert_eq!(class.describe(), "class Foo");
        let method = Node::Method(MethodNode::new("bar", vec![], None));
        assert_eq!(method.describe(), "method bar");
    }
}
