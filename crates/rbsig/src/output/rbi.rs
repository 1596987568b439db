//! RBI emitter.
//!
//! Serializes a declaration tree as a Sorbet RBI file: `sig { ... }`
//! annotations paired with `def ... ; end` stubs, modifier calls inside
//! namespace bodies, and eigenclass wrappers for class-level attributes
//! and constants. Signatures whose parameter count reaches
//! `EmitOptions::break_params` break onto multiple lines.

use crate::ir::{
    AttributeKind, AttributeNode, ConstantNode, ConstantValue, Dialect, MethodNode, Namespace,
    NamespaceKind, Node, ParameterKind, TypeExpr,
};
use crate::output::EmitOptions;
use crate::traits::Emitter;
use std::fmt::Write;

/// Static instance of the RBI emitter for the registry.
pub static RBI_EMITTER: RbiEmitterImpl = RbiEmitterImpl;

pub struct RbiEmitterImpl;

impl Emitter for RbiEmitterImpl {
    fn dialect(&self) -> Dialect {
        Dialect::Rbi
    }

    fn extension(&self) -> &'static str {
        "rbi"
    }

    fn emit(&self, root: &Namespace, options: &EmitOptions) -> String {
        RbiEmitter::emit(root, options.clone())
    }
}

/// Emits a declaration tree as RBI source.
pub struct RbiEmitter {
    output: String,
    indent: usize,
    options: EmitOptions,
}

impl RbiEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self {
            output: String::new(),
            indent: 0,
            options,
        }
    }

    /// Emit the children of `root` as a complete RBI file.
    pub fn emit(root: &Namespace, options: EmitOptions) -> String {
        let mut emitter = Self::new(options);
        emitter.write_children(&root.children);
        emitter.output
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent * self.options.tab_size {
            self.output.push(' ');
        }
    }

    fn line(&mut self, text: &str) {
        self.write_indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn write_children(&mut self, children: &[Node]) {
        let mut ordered: Vec<&Node> = children.iter().collect();
        if self.options.sort_namespaces {
            super::sort_namespace_siblings(&mut ordered);
        }
        let mut previous: Option<&Node> = None;
        for node in ordered {
            if let Some(previous) = previous
                && (block_like(previous) || block_like(node))
            {
                self.output.push('\n');
            }
            self.write_node(node);
            previous = Some(node);
        }
    }

    fn write_node(&mut self, node: &Node) {
        for comment in node.comments() {
            self.line(&format!("# {comment}"));
        }
        match node {
            Node::Namespace(ns) => self.write_namespace(ns),
            Node::Method(method) => self.write_method(method),
            Node::Attribute(attr) => self.write_attribute(attr),
            Node::Constant(constant) => self.write_constant(constant),
            Node::Extend(mixin) => self.line(&format!("extend {}", mixin.target)),
            Node::Include(mixin) => self.line(&format!("include {}", mixin.target)),
            Node::Arbitrary(arb) => {
                for code_line in arb.code.lines() {
                    self.line(code_line);
                }
            }
        }
    }

    fn write_namespace(&mut self, ns: &Namespace) {
        let header = match &ns.kind {
            NamespaceKind::Plain | NamespaceKind::Module { .. } => format!("module {}", ns.name),
            NamespaceKind::Class(details) => match &details.superclass {
                Some(superclass) => format!("class {} < {superclass}", ns.name),
                None => format!("class {}", ns.name),
            },
            NamespaceKind::Enum(_) => format!("class {} < T::Enum", ns.name),
            NamespaceKind::Struct(_) => format!("class {} < T::Struct", ns.name),
        };
        self.line(&header);
        self.indent += 1;

        let mut preamble = false;
        match &ns.kind {
            NamespaceKind::Class(details)
            | NamespaceKind::Enum(crate::ir::EnumDetails { class: details, .. })
            | NamespaceKind::Struct(crate::ir::StructDetails { class: details, .. }) => {
                if details.is_abstract {
                    self.line("abstract!");
                    preamble = true;
                }
                if details.is_final {
                    self.line("final!");
                    preamble = true;
                }
            }
            NamespaceKind::Module { interface: true } => {
                self.line("interface!");
                preamble = true;
            }
            NamespaceKind::Module { interface: false } | NamespaceKind::Plain => {}
        }
        for target in &ns.extends {
            self.line(&format!("extend {target}"));
            preamble = true;
        }
        for target in &ns.includes {
            self.line(&format!("include {target}"));
            preamble = true;
        }

        match &ns.kind {
            NamespaceKind::Enum(details) if !details.enumerators.is_empty() => {
                if preamble {
                    self.output.push('\n');
                }
                self.line("enums do");
                self.indent += 1;
                for enumerator in &details.enumerators {
                    match &enumerator.serialized {
                        Some(literal) => {
                            self.line(&format!("{} = new({literal})", enumerator.name));
                        }
                        None => self.line(&format!("{} = new", enumerator.name)),
                    }
                }
                self.indent -= 1;
                self.line("end");
                preamble = true;
            }
            NamespaceKind::Struct(details) => {
                for prop in &details.props {
                    let keyword = if prop.immutable { "const" } else { "prop" };
                    let mut text = format!(
                        "{keyword} :{}, {}",
                        prop.name,
                        prop.ty.render(Dialect::Rbi)
                    );
                    if prop.optional {
                        text.push_str(", optional: true");
                    }
                    if let Some(default) = &prop.default {
                        write!(text, ", default: {default}").unwrap();
                    }
                    self.line(&text);
                    preamble = true;
                }
            }
            _ => {}
        }

        if preamble && !ns.children.is_empty() {
            self.output.push('\n');
        }
        self.write_children(&ns.children);
        self.indent -= 1;
        self.line("end");
    }

    fn write_method(&mut self, method: &MethodNode) {
        self.write_sig(method);

        let prefix = if method.class_level {
            format!("def self.{}", method.name)
        } else {
            format!("def {}", method.name)
        };
        if method.parameters.is_empty() {
            self.line(&format!("{prefix}; end"));
            return;
        }

        let rendered: Vec<String> = method
            .parameters
            .iter()
            .map(|p| match (&p.kind, &p.default) {
                (ParameterKind::Keyword, Some(default)) => format!("{} {default}", p.name),
                (_, Some(default)) => format!("{} = {default}", p.name),
                (_, None) => p.name.clone(),
            })
            .collect();

        if method.parameters.len() < self.options.break_params {
            self.line(&format!("{prefix}({}); end", rendered.join(", ")));
        } else {
            self.line(&format!("{prefix}("));
            self.indent += 1;
            let last = rendered.len() - 1;
            for (i, parameter) in rendered.iter().enumerate() {
                if i < last {
                    self.line(&format!("{parameter},"));
                } else {
                    self.line(parameter);
                }
            }
            self.indent -= 1;
            self.line("); end");
        }
    }

    /// Write the `sig` annotation for a method.
    fn write_sig(&mut self, method: &MethodNode) {
        let keyword = if method.is_final { "sig(:final)" } else { "sig" };
        let broken = method.parameters.len() >= self.options.break_params;

        let mut parts: Vec<String> = Vec::new();
        if method.is_abstract {
            parts.push("abstract".into());
        }
        if method.implementation {
            parts.push("implementation".into());
        }
        if method.is_override {
            parts.push("override".into());
        }
        if method.overridable {
            parts.push("overridable".into());
        }
        if !method.type_parameters.is_empty() {
            let symbols: Vec<String> = method
                .type_parameters
                .iter()
                .map(|t| format!(":{t}"))
                .collect();
            parts.push(format!("type_parameters({})", symbols.join(", ")));
        }
        if !method.parameters.is_empty() {
            parts.push(self.params_part(method, broken));
        }
        match &method.return_type {
            Some(ty) => parts.push(format!("returns({})", ty.render(Dialect::Rbi))),
            None => parts.push("void".into()),
        }
        let chain = parts.join(".");

        if broken {
            self.line(&format!("{keyword} do"));
            self.indent += 1;
            self.line(&chain);
            self.indent -= 1;
            self.line("end");
        } else {
            self.line(&format!("{keyword} {{ {chain} }}"));
        }
    }

    /// The `params(...)` component, broken one entry per line when the
    /// signature is past the break threshold.
    fn params_part(&self, method: &MethodNode, broken: bool) -> String {
        let entries: Vec<String> = method
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.bare_name(), render_or_untyped(p.ty.as_ref())))
            .collect();
        if !broken {
            return format!("params({})", entries.join(", "));
        }
        // The chain is written one level inside the `sig do` body.
        let outer = " ".repeat((self.indent + 1) * self.options.tab_size);
        let inner = " ".repeat((self.indent + 2) * self.options.tab_size);
        format!(
            "params(\n{inner}{}\n{outer})",
            entries.join(&format!(",\n{inner}"))
        )
    }

    fn write_attribute(&mut self, attr: &AttributeNode) {
        if attr.class_level {
            self.line("class << self");
            self.indent += 1;
            self.write_attribute_lines(attr);
            self.indent -= 1;
            self.line("end");
        } else {
            self.write_attribute_lines(attr);
        }
    }

    fn write_attribute_lines(&mut self, attr: &AttributeNode) {
        let ty = attr.ty.render(Dialect::Rbi);
        let sig = match attr.kind {
            AttributeKind::Reader | AttributeKind::Accessor => {
                format!("sig {{ returns({ty}) }}")
            }
            // A writer's one parameter is named after the attribute.
            AttributeKind::Writer => {
                format!("sig {{ params({}: {ty}).returns({ty}) }}", attr.name)
            }
        };
        self.line(&sig);
        let call = match attr.kind {
            AttributeKind::Reader => "attr_reader",
            AttributeKind::Writer => "attr_writer",
            AttributeKind::Accessor => "attr_accessor",
        };
        self.line(&format!("{call} :{}", attr.name));
    }

    fn write_constant(&mut self, constant: &ConstantNode) {
        let assignment = match &constant.value {
            ConstantValue::Source(source) => format!("{} = {source}", constant.name),
            ConstantValue::Type(ty) => {
                format!("{} = T.type_alias {{ {} }}", constant.name, ty.render(Dialect::Rbi))
            }
        };
        if constant.class_level {
            self.line("class << self");
            self.indent += 1;
            self.line(&assignment);
            self.indent -= 1;
            self.line("end");
        } else {
            self.line(&assignment);
        }
    }
}

fn render_or_untyped(ty: Option<&TypeExpr>) -> String {
    match ty {
        Some(ty) => ty.render(Dialect::Rbi),
        None => TypeExpr::Untyped.render(Dialect::Rbi),
    }
}

/// Whether a node emits a multi-line body and wants blank-line spacing.
fn block_like(node: &Node) -> bool {
    matches!(
        node,
        Node::Namespace(_) | Node::Method(_) | Node::Attribute(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Parameter;

    fn emit(root: &Namespace) -> String {
        RbiEmitter::emit(root, EmitOptions::default())
    }

    #[test]
    fn test_class_with_method() {
        let mut root = Namespace::root();
        root.create_class("Person", |class| {
            class.create_method(
                "name",
                vec![],
                Some(TypeExpr::Raw("String".into())),
            );
        });

        assert_eq!(
            emit(&root),
            "class Person\n  sig { returns(String) }\n  def name; end\nend\n"
        );
    }

    #[test]
    fn test_method_with_parameters_and_defaults() {
        let mut root = Namespace::root();
        let method = root.create_method(
            "join",
            vec![
                Parameter::new("a", Some(TypeExpr::Raw("String".into()))),
                Parameter::new("b", Some(TypeExpr::Raw("Integer".into()))).with_default("1"),
                Parameter::new("key:", Some(TypeExpr::Boolean)).with_default("true"),
            ],
            Some(TypeExpr::Raw("String".into())),
        );
        method.is_override = true;

        assert_eq!(
            emit(&root),
            "sig { override.params(a: String, b: Integer, key: T::Boolean).returns(String) }\n\
             def join(a, b = 1, key: true); end\n"
        );
    }

    #[test]
    fn test_long_signature_breaks() {
        let mut root = Namespace::root();
        root.create_method(
            "many",
            vec![
                Parameter::new("a", Some(TypeExpr::Untyped)),
                Parameter::new("b", Some(TypeExpr::Untyped)),
                Parameter::new("c", Some(TypeExpr::Untyped)),
                Parameter::new("d", Some(TypeExpr::Untyped)),
            ],
            None,
        );

        let expected = "sig do\n  params(\n    a: T.untyped,\n    b: T.untyped,\n    \
                        c: T.untyped,\n    d: T.untyped\n  ).void\nend\ndef many(\n  a,\n  b,\n  \
                        c,\n  d\n); end\n";
        assert_eq!(emit(&root), expected);
    }

    #[test]
    fn test_abstract_class_modifiers_and_mixins() {
        let mut root = Namespace::root();
        let class = root.create_class("Base", |class| {
            class.add_extend("T::Sig");
            class.add_include("Comparable");
        });
        class.class_details_mut().unwrap().is_abstract = true;

        assert_eq!(
            emit(&root),
            "class Base\n  abstract!\n  extend T::Sig\n  include Comparable\nend\n"
        );
    }

    #[test]
    fn test_enum_body() {
        let mut root = Namespace::root();
        root.create_enum("Direction", |e| {
            let details = e.enum_details_mut().unwrap();
            details.enumerators = vec![
                crate::ir::Enumerator {
                    name: "North".into(),
                    serialized: None,
                },
                crate::ir::Enumerator {
                    name: "South".into(),
                    serialized: Some("\"s\"".into()),
                },
            ];
        });

        assert_eq!(
            emit(&root),
            "class Direction < T::Enum\n  enums do\n    North = new\n    \
             South = new(\"s\")\n  end\nend\n"
        );
    }

    #[test]
    fn test_struct_props() {
        let mut root = Namespace::root();
        root.create_struct("Point", |s| {
            let details = s.struct_details_mut().unwrap();
            details.props = vec![
                crate::ir::Prop {
                    name: "x".into(),
                    ty: TypeExpr::Raw("Integer".into()),
                    optional: false,
                    immutable: false,
                    default: None,
                },
                crate::ir::Prop {
                    name: "label".into(),
                    ty: TypeExpr::Raw("String".into()),
                    optional: false,
                    immutable: true,
                    default: Some("\"origin\"".into()),
                },
            ];
        });

        assert_eq!(
            emit(&root),
            "class Point < T::Struct\n  prop :x, Integer\n  \
             const :label, String, default: \"origin\"\nend\n"
        );
    }

    #[test]
    fn test_class_level_attribute_wrapped_in_eigenclass() {
        let mut root = Namespace::root();
        let attr = root.create_attr_reader("registry", TypeExpr::Raw("Registry".into()));
        attr.class_level = true;

        assert_eq!(
            emit(&root),
            "class << self\n  sig { returns(Registry) }\n  attr_reader :registry\nend\n"
        );
    }

    #[test]
    fn test_comments_precede_declarations() {
        let mut root = Namespace::root();
        let method = root.create_method("go", vec![], None);
        method.comments = vec!["Starts the run.".into()];

        assert_eq!(emit(&root), "# Starts the run.\nsig { void }\ndef go; end\n");
    }

    #[test]
    fn test_sorted_namespaces() {
        let mut root = Namespace::root();
        root.create_class("Zeta", |_| {});
        root.create_class("Alpha", |_| {});

        let sorted = RbiEmitter::emit(
            &root,
            EmitOptions {
                sort_namespaces: true,
                ..EmitOptions::default()
            },
        );
        assert_eq!(sorted, "class Alpha\nend\n\nclass Zeta\nend\n");
    }

    #[test]
    fn test_sorting_leaves_other_siblings_in_place() {
        let mut root = Namespace::root();
        root.create_constant("VERSION", ConstantValue::Source("\"1.0\"".into()));
        root.create_class("Zeta", |_| {});
        root.create_class("Alpha", |_| {});
        root.create_method("run", vec![], None);

        let sorted = RbiEmitter::emit(
            &root,
            EmitOptions {
                sort_namespaces: true,
                ..EmitOptions::default()
            },
        );
        assert_eq!(
            sorted,
            "VERSION = \"1.0\"\n\nclass Alpha\nend\n\nclass Zeta\nend\n\nsig { void }\ndef run; end\n"
        );
    }
}
