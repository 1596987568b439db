//! RBS emitter.
//!
//! Serializes a declaration tree as an RBS signature file: `def name:
//! (params) -> ret` lines, block descriptors in `{ ... }` / `?{ ... }`
//! form, and `attr_*` shorthands. Trees fed to this emitter are normally
//! produced by the converter, which has already reshaped RBI-only
//! constructs; markers the dialect cannot spell are simply not written.

use crate::ir::{
    AttributeKind, AttributeNode, Block, ConstantNode, ConstantValue, Dialect, MethodNode,
    MethodSignature, Namespace, NamespaceKind, Node, Parameter, ParameterKind, TypeExpr,
};
use crate::output::EmitOptions;
use crate::traits::Emitter;

/// Static instance of the RBS emitter for the registry.
pub static RBS_EMITTER: RbsEmitterImpl = RbsEmitterImpl;

pub struct RbsEmitterImpl;

impl Emitter for RbsEmitterImpl {
    fn dialect(&self) -> Dialect {
        Dialect::Rbs
    }

    fn extension(&self) -> &'static str {
        "rbs"
    }

    fn emit(&self, root: &Namespace, options: &EmitOptions) -> String {
        RbsEmitter::emit(root, options.clone())
    }
}

/// Emits a declaration tree as RBS source.
pub struct RbsEmitter {
    output: String,
    indent: usize,
    options: EmitOptions,
}

impl RbsEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self {
            output: String::new(),
            indent: 0,
            options,
        }
    }

    /// Emit the children of `root` as a complete RBS file.
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
                && (matches!(previous, Node::Namespace(_)) || matches!(node, Node::Namespace(_)))
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
        // Enum/struct specializations do not normally reach this emitter
        // (the converter drops them); fall back to a bare class header.
        let header = match &ns.kind {
            NamespaceKind::Plain | NamespaceKind::Module { .. } => format!("module {}", ns.name),
            NamespaceKind::Class(details) => match &details.superclass {
                Some(superclass) => format!("class {} < {superclass}", ns.name),
                None => format!("class {}", ns.name),
            },
            NamespaceKind::Enum(_) | NamespaceKind::Struct(_) => format!("class {}", ns.name),
        };
        self.line(&header);
        self.indent += 1;

        let mut preamble = false;
        for target in &ns.extends {
            self.line(&format!("extend {target}"));
            preamble = true;
        }
        for target in &ns.includes {
            self.line(&format!("include {target}"));
            preamble = true;
        }
        if preamble && !ns.children.is_empty() {
            self.output.push('\n');
        }
        self.write_children(&ns.children);
        self.indent -= 1;
        self.line("end");
    }

    fn write_method(&mut self, method: &MethodNode) {
        let prefix = if method.class_level {
            format!("def self.{}:", method.name)
        } else {
            format!("def {}:", method.name)
        };
        let type_params = if method.type_parameters.is_empty() {
            String::new()
        } else {
            format!("[{}] ", method.type_parameters.join(", "))
        };

        let entries: Vec<String> = method
            .parameters
            .iter()
            .filter(|p| p.kind != ParameterKind::Block)
            .map(render_parameter)
            .collect();

        let mut suffix = format!(" -> {}", render_return(method.return_type.as_ref()));
        if let Some(block) = &method.block {
            suffix.push_str(&block_part(block));
        }
        for overload in &method.overloads {
            suffix.push_str(&overload_part(overload));
        }

        if entries.len() < self.options.break_params {
            self.line(&format!(
                "{prefix} {type_params}({}){suffix}",
                entries.join(", ")
            ));
        } else {
            self.line(&format!("{prefix} {type_params}("));
            self.indent += 1;
            let last = entries.len() - 1;
            for (i, entry) in entries.iter().enumerate() {
                if i < last {
                    self.line(&format!("{entry},"));
                } else {
                    self.line(entry);
                }
            }
            self.indent -= 1;
            self.line(&format!("){suffix}"));
        }
    }

    fn write_attribute(&mut self, attr: &AttributeNode) {
        let call = match attr.kind {
            AttributeKind::Reader => "attr_reader",
            AttributeKind::Writer => "attr_writer",
            AttributeKind::Accessor => "attr_accessor",
        };
        let target = if attr.class_level {
            format!("self.{}", attr.name)
        } else {
            attr.name.clone()
        };
        self.line(&format!("{call} {target}: {}", attr.ty.render(Dialect::Rbs)));
    }

    fn write_constant(&mut self, constant: &ConstantNode) {
        // A verbatim value expression carries no type information.
        let ty = match &constant.value {
            ConstantValue::Source(_) => TypeExpr::Untyped.render(Dialect::Rbs),
            ConstantValue::Type(ty) => ty.render(Dialect::Rbs),
        };
        self.line(&format!("{}: {ty}", constant.name));
    }
}

fn render_parameter(parameter: &Parameter) -> String {
    let ty = parameter
        .ty
        .as_ref()
        .map(|t| t.render(Dialect::Rbs))
        .unwrap_or_else(|| TypeExpr::Untyped.render(Dialect::Rbs));
    let optional = if parameter.required { "" } else { "?" };
    match parameter.kind {
        ParameterKind::Normal => format!("{optional}{ty} {}", parameter.bare_name()),
        ParameterKind::Keyword => format!("{optional}{}: {ty}", parameter.bare_name()),
        ParameterKind::Splat => format!("*{ty} {}", parameter.bare_name()),
        ParameterKind::DoubleSplat => format!("**{ty} {}", parameter.bare_name()),
        // Blocks are spelled outside the parameter list; a stray one
        // renders as its bare callable type.
        ParameterKind::Block => format!("{ty} {}", parameter.bare_name()),
    }
}

fn render_return(ty: Option<&TypeExpr>) -> String {
    match ty {
        Some(ty) => ty.render(Dialect::Rbs),
        None => "void".into(),
    }
}

fn block_part(block: &Block) -> String {
    let inner = match &block.proc_type {
        TypeExpr::Proc { params, returns } => {
            let entries: Vec<String> = params
                .iter()
                .map(|(name, ty)| format!("{} {name}", ty.render(Dialect::Rbs)))
                .collect();
            let ret = returns
                .as_ref()
                .map(|t| t.render(Dialect::Rbs))
                .unwrap_or_else(|| "void".into());
            format!("({}) -> {ret}", entries.join(", "))
        }
        other => other.render(Dialect::Rbs),
    };
    if block.required {
        format!(" {{ {inner} }}")
    } else {
        format!(" ?{{ {inner} }}")
    }
}

fn overload_part(signature: &MethodSignature) -> String {
    let entries: Vec<String> = signature
        .parameters
        .iter()
        .filter(|p| p.kind != ParameterKind::Block)
        .map(render_parameter)
        .collect();
    format!(
        " | ({}) -> {}",
        entries.join(", "),
        render_return(signature.return_type.as_ref())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(root: &Namespace) -> String {
        RbsEmitter::emit(root, EmitOptions::default())
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

        assert_eq!(emit(&root), "class Person\n  def name: () -> String\nend\n");
    }

    #[test]
    fn test_sorting_reorders_only_namespaces() {
        let mut root = Namespace::root();
        root.create_method("run", vec![], None);
        root.create_class("Zeta", |_| {});
        root.create_class("Alpha", |_| {});

        let sorted = RbsEmitter::emit(
            &root,
            EmitOptions {
                sort_namespaces: true,
                ..EmitOptions::default()
            },
        );
        assert_eq!(
            sorted,
            "def run: () -> void\n\nclass Alpha\nend\n\nclass Zeta\nend\n"
        );
    }

    #[test]
    fn test_parameter_shapes() {
        let mut root = Namespace::root();
        root.create_method(
            "mix",
            vec![
                Parameter::new("a", Some(TypeExpr::Raw("String".into()))),
                Parameter::new("b", Some(TypeExpr::Raw("Integer".into()))).with_default("1"),
                Parameter::new("key:", Some(TypeExpr::Boolean)),
            ],
            None,
        );

        assert_eq!(
            emit(&root),
            "def mix: (String a, ?Integer b, key: bool) -> void\n"
        );
    }

    #[test]
    fn test_splat_and_class_level() {
        let mut root = Namespace::root();
        let method = root.create_method(
            "gather",
            vec![
                Parameter::new("*parts", Some(TypeExpr::Raw("String".into()))),
                Parameter::new("**opts", Some(TypeExpr::Untyped)),
            ],
            Some(TypeExpr::array(TypeExpr::Raw("String".into()))),
        );
        method.class_level = true;

        assert_eq!(
            emit(&root),
            "def self.gather: (*String parts, **untyped opts) -> Array[String]\n"
        );
    }

    #[test]
    fn test_block_descriptors() {
        let proc_ty = TypeExpr::Proc {
            params: vec![("x".into(), TypeExpr::Raw("Integer".into()))],
            returns: None,
        };

        let mut root = Namespace::root();
        let required = root.create_method("each", vec![], None);
        required.block = Some(Block {
            proc_type: proc_ty.clone(),
            required: true,
        });
        let optional = root.create_method("maybe", vec![], None);
        optional.block = Some(Block {
            proc_type: proc_ty,
            required: false,
        });

        assert_eq!(
            emit(&root),
            "def each: () -> void { (Integer x) -> void }\n\
             def maybe: () -> void ?{ (Integer x) -> void }\n"
        );
    }

    #[test]
    fn test_overloads_joined() {
        let mut root = Namespace::root();
        let method = root.create_method(
            "fetch",
            vec![Parameter::new("key", Some(TypeExpr::Raw("String".into())))],
            Some(TypeExpr::Untyped),
        );
        method.overloads.push(MethodSignature {
            parameters: vec![
                Parameter::new("key", Some(TypeExpr::Raw("String".into()))),
                Parameter::new("fallback", Some(TypeExpr::Untyped)),
            ],
            return_type: Some(TypeExpr::Untyped),
            type_parameters: vec![],
        });

        assert_eq!(
            emit(&root),
            "def fetch: (String key) -> untyped | (String key, untyped fallback) -> untyped\n"
        );
    }

    #[test]
    fn test_long_signature_breaks() {
        let mut root = Namespace::root();
        root.create_method(
            "many",
            vec![
                Parameter::new("a", None),
                Parameter::new("b", None),
                Parameter::new("c", None),
                Parameter::new("d", None),
            ],
            None,
        );

        assert_eq!(
            emit(&root),
            "def many: (\n  untyped a,\n  untyped b,\n  untyped c,\n  untyped d\n) -> void\n"
        );
    }

    #[test]
    fn test_attributes_and_constants() {
        let mut root = Namespace::root();
        root.create_attr_reader("name", TypeExpr::Raw("String".into()));
        root.create_constant("VERSION", ConstantValue::Source("\"1.2.3\"".into()));
        root.create_constant(
            "KEYS",
            ConstantValue::Type(TypeExpr::array(TypeExpr::Raw("Symbol".into()))),
        );

        assert_eq!(
            emit(&root),
            "attr_reader name: String\nVERSION: untyped\nKEYS: Array[Symbol]\n"
        );
    }

    #[test]
    fn test_module_with_mixins() {
        let mut root = Namespace::root();
        root.create_module("Helpers", |m| {
            m.add_include("Comparable");
            m.create_method("go", vec![], None);
        });

        assert_eq!(
            emit(&root),
            "module Helpers\n  include Comparable\n\n  def go: () -> void\nend\n"
        );
    }

    #[test]
    fn test_type_parameters() {
        let mut root = Namespace::root();
        let method = root.create_method(
            "wrap",
            vec![Parameter::new("value", Some(TypeExpr::Raw("U".into())))],
            Some(TypeExpr::Raw("U".into())),
        );
        method.type_parameters = vec!["U".into()];

        assert_eq!(emit(&root), "def wrap: [U] (U value) -> U\n");
    }
}
