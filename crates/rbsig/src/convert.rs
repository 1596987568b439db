//! RBI to RBS tree conversion.
//!
//! Walks a resolved tree and rebuilds it into a destination namespace,
//! reshaping constructs the target dialect spells differently and
//! recording a [`Warning`] for every construct it has to drop. Conversion
//! never fails; the traversal always completes and the warning list tells
//! the caller what was lost.

use crate::ir::{Block, MethodNode, Namespace, NamespaceKind, Node, ParameterKind, TypeExpr};
use tracing::warn;

/// One dropped or degraded construct.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub message: String,
    /// The node the warning is about, as it was at conversion time.
    pub node: Node,
}

/// Converter from the RBI-shaped tree to an RBS-shaped tree.
#[derive(Debug, Default)]
pub struct RbiToRbs {
    warnings: Vec<Warning>,
}

impl RbiToRbs {
    pub fn new() -> Self {
        RbiToRbs::default()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Convert a list of sibling nodes into `dest`'s children.
    pub fn convert_all(&mut self, nodes: &[Node], dest: &mut Namespace) {
        for node in nodes {
            self.convert_node(node, dest);
        }
    }

    /// Convert one node into a child of `dest`.
    pub fn convert_node(&mut self, node: &Node, dest: &mut Namespace) {
        match node {
            Node::Namespace(ns) => self.convert_namespace(node, ns, dest),
            Node::Method(method) => {
                let converted = self.convert_method(node, method);
                dest.append(Node::Method(converted));
            }
            Node::Attribute(attr) => {
                if attr.class_level {
                    self.record(
                        format!("class-level attribute `{}` has no equivalent; dropped", attr.name),
                        node,
                    );
                    return;
                }
                dest.append(node.clone());
            }
            Node::Constant(constant) => {
                if constant.class_level {
                    self.record(
                        format!(
                            "class-level constant `{}` has no equivalent; dropped",
                            constant.name
                        ),
                        node,
                    );
                    return;
                }
                dest.append(node.clone());
            }
            Node::Extend(_) | Node::Include(_) => dest.append(node.clone()),
            Node::Arbitrary(_) => {
                self.record("arbitrary code cannot be converted; dropped", node);
            }
        }
    }

    fn convert_namespace(&mut self, node: &Node, ns: &Namespace, dest: &mut Namespace) {
        let kind = match &ns.kind {
            NamespaceKind::Class(details) => {
                if details.is_abstract {
                    self.record(
                        format!("abstract marker on class `{}` dropped", ns.name),
                        node,
                    );
                }
                if details.is_final {
                    self.record(format!("final marker on class `{}` dropped", ns.name), node);
                }
                NamespaceKind::Class(crate::ir::ClassDetails {
                    superclass: details.superclass.clone(),
                    is_abstract: false,
                    is_final: false,
                })
            }
            NamespaceKind::Module { interface } => {
                if *interface {
                    self.record(
                        format!("interface marker on module `{}` dropped", ns.name),
                        node,
                    );
                }
                NamespaceKind::Module { interface: false }
            }
            NamespaceKind::Enum(_) => {
                self.record(
                    format!("enum class `{}` has no equivalent; dropped", ns.name),
                    node,
                );
                return;
            }
            NamespaceKind::Struct(_) => {
                self.record(
                    format!("struct class `{}` has no equivalent; dropped", ns.name),
                    node,
                );
                return;
            }
            NamespaceKind::Plain => {
                // Best effort: an unfilled namespace becomes a module.
                self.record(
                    format!("unresolved namespace `{}` converted as a module", ns.name),
                    node,
                );
                NamespaceKind::Module { interface: false }
            }
        };

        dest.append(Node::Namespace(Namespace::new(ns.name.clone(), kind)));
        let Some(Node::Namespace(child)) = dest.children.last_mut() else {
            unreachable!("just pushed a namespace")
        };
        child.comments = ns.comments.clone();
        for target in &ns.extends {
            child.add_extend(target.clone());
        }
        for target in &ns.includes {
            child.add_include(target.clone());
        }
        for grandchild in &ns.children {
            self.convert_node(grandchild, child);
        }
    }

    /// Convert one method: non-block parameters map 1:1, the block-kind
    /// parameter moves out of the list into a block descriptor. Checker
    /// pragmas (`abstract`, `override`, ...) are signature-irrelevant in
    /// the target and are not carried.
    fn convert_method(&mut self, node: &Node, method: &MethodNode) -> MethodNode {
        let mut converted = MethodNode::new(
            method.name.clone(),
            Vec::new(),
            method.return_type.clone(),
        );
        converted.comments = method.comments.clone();
        converted.class_level = method.class_level;
        converted.type_parameters = method.type_parameters.clone();
        converted.overloads = method.overloads.clone();

        for parameter in &method.parameters {
            if parameter.kind != ParameterKind::Block {
                converted.parameters.push(parameter.clone());
                continue;
            }
            match parameter.ty.as_ref().and_then(block_descriptor) {
                Some(block) => converted.block = Some(block),
                None => self.record(
                    format!(
                        "block parameter `{}` of `{}` has a non-callable type; dropped",
                        parameter.name, method.name
                    ),
                    node,
                ),
            }
        }
        converted
    }

    fn record(&mut self, message: impl Into<String>, node: &Node) {
        let message = message.into();
        warn!(node = %node.describe(), "{message}");
        self.warnings.push(Warning {
            message,
            node: node.clone(),
        });
    }
}

/// Recognize a block parameter's type as a callable shape.
///
/// A bare callable yields a required block, a nilable-wrapped callable an
/// optional one. Raw type fragments are recognized textually.
fn block_descriptor(ty: &TypeExpr) -> Option<Block> {
    match ty {
        TypeExpr::Proc { .. } => Some(Block {
            proc_type: ty.clone(),
            required: true,
        }),
        TypeExpr::Nilable(inner) if matches!(**inner, TypeExpr::Proc { .. }) => Some(Block {
            proc_type: (**inner).clone(),
            required: false,
        }),
        TypeExpr::Raw(src) => {
            let src = src.trim();
            if src.starts_with("T.proc") {
                return Some(Block {
                    proc_type: TypeExpr::Raw(src.to_string()),
                    required: true,
                });
            }
            let inner = src.strip_prefix("T.nilable(")?.strip_suffix(')')?.trim();
            if inner.starts_with("T.proc") {
                Some(Block {
                    proc_type: TypeExpr::Raw(inner.to_string()),
                    required: false,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        AttributeKind, AttributeNode, ClassDetails, ConstantNode, ConstantValue, EnumDetails,
        Parameter,
    };

    fn convert(nodes: &[Node]) -> (Namespace, Vec<Warning>) {
        let mut converter = RbiToRbs::new();
        let mut dest = Namespace::root();
        converter.convert_all(nodes, &mut dest);
        (dest, converter.take_warnings())
    }

    #[test]
    fn test_abstract_class_converts_with_one_warning() {
        let ns = Namespace::new(
            "Base",
            NamespaceKind::Class(ClassDetails {
                superclass: None,
                is_abstract: true,
                is_final: false,
            }),
        );
        let (dest, warnings) = convert(&[Node::Namespace(ns)]);

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("abstract"), "{warnings:?}");
        let [Node::Namespace(converted)] = dest.children.as_slice() else {
            panic!("expected one namespace");
        };
        let NamespaceKind::Class(details) = &converted.kind else {
            panic!("expected class");
        };
        assert!(!details.is_abstract);
    }

    #[test]
    fn test_enum_dropped_with_warning() {
        let ns = Namespace::new("Direction", NamespaceKind::Enum(EnumDetails::default()));
        let (dest, warnings) = convert(&[Node::Namespace(ns)]);
        assert!(dest.children.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_block_parameter_shapes() {
        let proc_ty = TypeExpr::Proc {
            params: vec![("x".into(), TypeExpr::Raw("Integer".into()))],
            returns: None,
        };

        let required = MethodNode::new(
            "each",
            vec![Parameter::new("&blk", Some(proc_ty.clone()))],
            None,
        );
        let optional = MethodNode::new(
            "maybe_each",
            vec![Parameter::new(
                "&blk",
                Some(TypeExpr::Nilable(Box::new(proc_ty.clone()))),
            )],
            None,
        );
        let bogus = MethodNode::new(
            "weird",
            vec![Parameter::new(
                "&blk",
                Some(TypeExpr::Raw("String".into())),
            )],
            None,
        );

        let (dest, warnings) = convert(&[
            Node::Method(required),
            Node::Method(optional),
            Node::Method(bogus),
        ]);

        let [Node::Method(first), Node::Method(second), Node::Method(third)] =
            dest.children.as_slice()
        else {
            panic!("expected three methods");
        };
        assert!(first.parameters.is_empty());
        assert_eq!(
            first.block,
            Some(Block {
                proc_type: proc_ty.clone(),
                required: true
            })
        );
        assert_eq!(
            second.block,
            Some(Block {
                proc_type: proc_ty,
                required: false
            })
        );
        assert_eq!(third.block, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("block parameter"), "{warnings:?}");
    }

    #[test]
    fn test_raw_callable_sources_recognized() {
        let required = block_descriptor(&TypeExpr::Raw("T.proc.returns(String)".into()));
        assert_eq!(required.map(|b| b.required), Some(true));

        let optional =
            block_descriptor(&TypeExpr::Raw("T.nilable(T.proc.void)".into())).expect("optional");
        assert!(!optional.required);
        assert_eq!(optional.proc_type, TypeExpr::Raw("T.proc.void".into()));

        assert_eq!(block_descriptor(&TypeExpr::Raw("String".into())), None);
    }

    #[test]
    fn test_checker_pragmas_not_carried() {
        let mut method = MethodNode::new("go", vec![], None);
        method.is_abstract = true;
        method.is_override = true;

        let (dest, warnings) = convert(&[Node::Method(method)]);
        let [Node::Method(converted)] = dest.children.as_slice() else {
            panic!("expected a method");
        };
        assert!(!converted.is_abstract);
        assert!(!converted.is_override);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_class_level_constant_and_attribute_dropped() {
        let constant = ConstantNode {
            name: "VERSION".into(),
            comments: vec![],
            value: ConstantValue::Source("\"1\"".into()),
            class_level: true,
        };
        let attribute = AttributeNode {
            name: "registry".into(),
            comments: vec![],
            kind: AttributeKind::Reader,
            ty: TypeExpr::Untyped,
            class_level: true,
        };

        let (dest, warnings) = convert(&[Node::Constant(constant), Node::Attribute(attribute)]);
        assert!(dest.children.is_empty());
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_plain_namespace_best_effort() {
        let mut plain = Namespace::new("Outer", NamespaceKind::Plain);
        plain.create_method("inner", vec![], None);

        let (dest, warnings) = convert(&[Node::Namespace(plain)]);
        assert_eq!(warnings.len(), 1);
        let [Node::Namespace(converted)] = dest.children.as_slice() else {
            panic!("expected one namespace");
        };
        assert!(matches!(
            converted.kind,
            NamespaceKind::Module { interface: false }
        ));
        assert_eq!(converted.children.len(), 1);
    }
}
