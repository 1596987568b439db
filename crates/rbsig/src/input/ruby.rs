//! Tree-sitter based Ruby declaration reader.
//!
//! Extracts interface declarations (classes, modules, annotated methods,
//! attributes, constants) from Ruby source carrying inline `sig`
//! annotations. Only declaration shapes are recognized; any other node at
//! declaration position fails the whole file.
//!
//! Navigation uses [`NodePath`] values instead of live tree cursors: a path
//! is re-resolved against the immutable tree whenever a neighbouring
//! position ("the node after this annotation", "this body's parent") is
//! needed.

use super::{NodePath, ParseError};
use crate::ir::{
    AttributeKind, AttributeNode, ClassDetails, ConstantNode, ConstantValue, EnumDetails,
    Enumerator, MethodNode, Namespace, NamespaceKind, Node, Parameter, ParameterKind, Prop,
    StructDetails, TypeExpr,
};
use std::collections::HashMap;
use tree_sitter::{Node as TsNode, Parser, Tree};

/// Superclass names that specialize a class declaration.
const ENUM_BASE: &str = "T::Enum";
const STRUCT_BASE: &str = "T::Struct";

/// Parse Ruby source and extract its declarations.
///
/// Returns the ordered list of top-level nodes. Fails fast on any
/// unrecognized declaration shape; there is no partial result.
pub fn parse_ruby(source: &str) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_ruby::language().into())
        .map_err(|err| ParseError::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Parse("failed to parse".into()))?;

    if tree.root_node().has_error() {
        return Err(ParseError::Parse("syntax error in source".into()));
    }

    let ctx = DeclParser::new(source, &tree);
    let scan = ctx.scan_body(&NodePath::root(), Scope::default(), BodyMode::TopLevel)?;
    Ok(scan.children)
}

/// Lexical context carried through recursion.
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    /// Inside a `class << self` body: definitions are implicitly class-level.
    singleton: bool,
}

/// What a statement sequence is the body of, which controls which
/// directive-style calls are intercepted before generic declaration parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    TopLevel,
    Class,
    Module,
    Enum,
    Struct,
}

impl BodyMode {
    fn allows_directives(self) -> bool {
        !matches!(self, BodyMode::TopLevel)
    }
}

/// Result of walking one statement sequence.
#[derive(Debug, Default)]
struct BodyScan {
    children: Vec<Node>,
    includes: Vec<String>,
    extends: Vec<String>,
    is_abstract: bool,
    is_final: bool,
    interface: bool,
    enumerators: Vec<Enumerator>,
    props: Vec<Prop>,
}

/// Parsed form of one annotation call-chain.
#[derive(Debug, Default)]
struct SigChain {
    /// Ordered (bare name, verbatim type source) pairs from `params`.
    params: Vec<(String, String)>,
    returns: ReturnSpec,
    is_abstract: bool,
    is_override: bool,
    overridable: bool,
    implementation: bool,
    is_final: bool,
    type_parameters: Vec<String>,
}

#[derive(Debug, Default, PartialEq)]
enum ReturnSpec {
    #[default]
    Unspecified,
    Void,
    Type(String),
}

struct DeclParser<'a> {
    source: &'a str,
    tree: &'a Tree,
}

impl<'a> DeclParser<'a> {
    fn new(source: &'a str, tree: &'a Tree) -> Self {
        Self { source, tree }
    }

    fn node_text(&self, node: TsNode) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn resolve(&self, path: &NodePath) -> Result<TsNode<'a>, ParseError> {
        path.resolve(self.tree)
            .ok_or_else(|| ParseError::Parse(format!("dangling path {:?}", path.indices())))
    }

    fn named_child<'t>(&self, node: TsNode<'t>, index: usize) -> Result<TsNode<'t>, ParseError> {
        node.named_child(index as u32).ok_or_else(|| {
            ParseError::Parse(format!("missing child {index} of {}", node.kind()))
        })
    }

    /// Index of the first named child with the given kind.
    fn named_index_of(&self, node: TsNode, kind: &str) -> Option<usize> {
        (0..node.named_child_count() as usize)
            .find(|&i| node.named_child(i as u32).is_some_and(|c| c.kind() == kind))
    }

    fn comment_text(&self, node: TsNode) -> String {
        let text = self.node_text(node);
        text.trim_start_matches('#').trim().to_string()
    }

    // ------------------------------------------------------------------
    // Statement sequences
    // ------------------------------------------------------------------

    fn scan_body(
        &self,
        path: &NodePath,
        scope: Scope,
        mode: BodyMode,
    ) -> Result<BodyScan, ParseError> {
        let node = self.resolve(path)?;
        let mut scan = BodyScan::default();
        let mut comments: Vec<String> = Vec::new();
        let mut skip_next = false;

        for i in 0..node.named_child_count() as usize {
            let child = self.named_child(node, i)?;
            if skip_next {
                skip_next = false;
                continue;
            }
            if child.kind() == "comment" {
                comments.push(self.comment_text(child));
                continue;
            }

            if mode.allows_directives() {
                if let Some(modifier) = self.as_modifier_call(child) {
                    self.apply_modifier(modifier, mode, &mut scan)?;
                    comments.clear();
                    continue;
                }
                if let Some((directive, target)) = self.as_mixin_call(child)? {
                    let list = match directive {
                        MixinDirective::Include => &mut scan.includes,
                        MixinDirective::Extend => &mut scan.extends,
                    };
                    if !list.contains(&target) {
                        list.push(target);
                    }
                    comments.clear();
                    continue;
                }
            }

            if mode == BodyMode::Enum
                && let Some(call) = self.as_bare_call(child, "enums")
            {
                scan.enumerators.extend(self.parse_enumerators(call)?);
                comments.clear();
                continue;
            }

            if mode == BodyMode::Struct
                && let Some((call, immutable)) = self.as_prop_call(child)
            {
                scan.props.push(self.parse_prop(call, immutable)?);
                comments.clear();
                continue;
            }

            if self.is_sig_call(child) {
                let nodes =
                    self.parse_annotated(&path.child(i), scope, std::mem::take(&mut comments))?;
                scan.children.extend(nodes);
                skip_next = true;
                continue;
            }

            let nodes = self.parse_decl(&path.child(i), scope, std::mem::take(&mut comments))?;
            scan.children.extend(nodes);
        }

        Ok(scan)
    }

    fn apply_modifier(
        &self,
        modifier: &str,
        mode: BodyMode,
        scan: &mut BodyScan,
    ) -> Result<(), ParseError> {
        match modifier {
            "abstract!" | "final!" => {
                if !matches!(mode, BodyMode::Class | BodyMode::Enum | BodyMode::Struct) {
                    return Err(ParseError::Unsupported(format!(
                        "`{modifier}` outside a class body"
                    )));
                }
                if modifier == "abstract!" {
                    scan.is_abstract = true;
                } else {
                    scan.is_final = true;
                }
            }
            "interface!" => {
                if mode != BodyMode::Module {
                    return Err(ParseError::Unsupported(
                        "`interface!` outside a module body".into(),
                    ));
                }
                scan.interface = true;
            }
            other => {
                return Err(ParseError::Unsupported(format!(
                    "unknown modifier `{other}`"
                )));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_decl(
        &self,
        path: &NodePath,
        scope: Scope,
        comments: Vec<String>,
    ) -> Result<Vec<Node>, ParseError> {
        let node = self.resolve(path)?;
        match node.kind() {
            "class" => self.parse_class(path, comments),
            "module" => self.parse_module(path, comments),
            "method" | "singleton_method" => Ok(vec![Node::Method(
                self.parse_method(node, None, scope, comments)?,
            )]),
            "singleton_class" => self.parse_singleton_class(path, scope),
            "assignment" => Ok(vec![self.parse_constant(node, scope, comments)?]),
            "call" => self.parse_attributes(node, None, scope, comments),
            other => Err(ParseError::UnexpectedNode {
                expected: "a declaration".into(),
                got: other.into(),
            }),
        }
    }

    fn parse_class(&self, path: &NodePath, comments: Vec<String>) -> Result<Vec<Node>, ParseError> {
        let node = self.resolve(path)?;
        let name_node = node
            .child_by_field_name("name")
            .ok_or_else(|| ParseError::Parse("class missing name".into()))?;
        let segments = self.constant_segments(name_node)?;

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|sc| sc.named_child(0))
            .map(|n| self.node_text(n).to_string());

        let mode = match superclass.as_deref() {
            Some(ENUM_BASE) => BodyMode::Enum,
            Some(STRUCT_BASE) => BodyMode::Struct,
            _ => BodyMode::Class,
        };

        let mut scan = match self.named_index_of(node, "body_statement") {
            Some(index) => self.scan_body(&path.child(index), Scope::default(), mode)?,
            None => BodyScan::default(),
        };

        let class_details = ClassDetails {
            superclass: if mode == BodyMode::Class {
                superclass
            } else {
                None
            },
            is_abstract: scan.is_abstract,
            is_final: scan.is_final,
        };
        let kind = match mode {
            BodyMode::Enum => NamespaceKind::Enum(EnumDetails {
                class: class_details,
                enumerators: std::mem::take(&mut scan.enumerators),
            }),
            BodyMode::Struct => NamespaceKind::Struct(StructDetails {
                class: class_details,
                props: std::mem::take(&mut scan.props),
            }),
            _ => NamespaceKind::Class(class_details),
        };

        Ok(vec![self.wrap_segments(segments, kind, comments, scan)])
    }

    fn parse_module(
        &self,
        path: &NodePath,
        comments: Vec<String>,
    ) -> Result<Vec<Node>, ParseError> {
        let node = self.resolve(path)?;
        let name_node = node
            .child_by_field_name("name")
            .ok_or_else(|| ParseError::Parse("module missing name".into()))?;
        let segments = self.constant_segments(name_node)?;

        let scan = match self.named_index_of(node, "body_statement") {
            Some(index) => self.scan_body(&path.child(index), Scope::default(), BodyMode::Module)?,
            None => BodyScan::default(),
        };

        let kind = NamespaceKind::Module {
            interface: scan.interface,
        };
        Ok(vec![self.wrap_segments(segments, kind, comments, scan)])
    }

    /// Build the namespace for a possibly dotted declaration name. The
    /// innermost namespace carries the declared kind and body; outer
    /// segments become plain namespaces.
    fn wrap_segments(
        &self,
        segments: Vec<String>,
        kind: NamespaceKind,
        comments: Vec<String>,
        scan: BodyScan,
    ) -> Node {
        let mut iter = segments.into_iter().rev();
        let innermost_name = iter.next().unwrap_or_default();
        let mut namespace = Namespace::new(innermost_name, kind);
        namespace.comments = comments;
        namespace.children = scan.children;
        for target in scan.extends {
            namespace.add_extend(target);
        }
        for target in scan.includes {
            namespace.add_include(target);
        }

        let mut node = Node::Namespace(namespace);
        for outer_name in iter {
            let mut outer = Namespace::new(outer_name, NamespaceKind::Plain);
            outer.children.push(node);
            node = Node::Namespace(outer);
        }
        node
    }

    fn constant_segments(&self, node: TsNode) -> Result<Vec<String>, ParseError> {
        match node.kind() {
            "constant" => Ok(vec![self.node_text(node).to_string()]),
            "scope_resolution" => {
                let mut segments = match node.child_by_field_name("scope") {
                    Some(scope) => self.constant_segments(scope)?,
                    None => Vec::new(),
                };
                let name = node
                    .child_by_field_name("name")
                    .ok_or_else(|| ParseError::Parse("scope resolution missing name".into()))?;
                segments.push(self.node_text(name).to_string());
                Ok(segments)
            }
            other => Err(ParseError::UnexpectedNode {
                expected: "a constant name".into(),
                got: other.into(),
            }),
        }
    }

    fn parse_singleton_class(
        &self,
        path: &NodePath,
        scope: Scope,
    ) -> Result<Vec<Node>, ParseError> {
        let node = self.resolve(path)?;
        let value = node
            .child_by_field_name("value")
            .map(|v| self.node_text(v).to_string())
            .unwrap_or_default();
        if value != "self" {
            return Err(ParseError::Unsupported(format!(
                "singleton class of `{value}`"
            )));
        }
        if scope.singleton {
            return Err(ParseError::Unsupported(
                "`class << self` nested inside a singleton-scope body".into(),
            ));
        }

        let singleton = Scope { singleton: true };
        match self.named_index_of(node, "body_statement") {
            Some(index) => {
                let scan = self.scan_body(&path.child(index), singleton, BodyMode::TopLevel)?;
                Ok(scan.children)
            }
            None => Ok(Vec::new()),
        }
    }

    fn parse_constant(
        &self,
        node: TsNode,
        scope: Scope,
        comments: Vec<String>,
    ) -> Result<Node, ParseError> {
        let left = node
            .child_by_field_name("left")
            .ok_or_else(|| ParseError::Parse("assignment missing target".into()))?;
        if left.kind() != "constant" {
            return Err(ParseError::UnexpectedNode {
                expected: "a constant assignment".into(),
                got: left.kind().into(),
            });
        }
        let right = node
            .child_by_field_name("right")
            .ok_or_else(|| ParseError::Parse("assignment missing value".into()))?;

        Ok(Node::Constant(ConstantNode {
            name: self.node_text(left).to_string(),
            comments,
            value: ConstantValue::Source(self.node_text(right).to_string()),
            class_level: scope.singleton,
        }))
    }

    // ------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------

    fn is_sig_call(&self, node: TsNode) -> bool {
        node.kind() == "call"
            && node
                .child_by_field_name("method")
                .is_some_and(|m| self.node_text(m) == "sig")
    }

    /// Parse an annotation at `sig_path` together with the definition at
    /// its next sibling position.
    fn parse_annotated(
        &self,
        sig_path: &NodePath,
        scope: Scope,
        comments: Vec<String>,
    ) -> Result<Vec<Node>, ParseError> {
        let sig_node = self.resolve(sig_path)?;
        let chain = self.parse_sig_call(sig_node)?;

        let target_path = sig_path.sibling(1)?;
        let Some(target) = target_path.resolve(self.tree) else {
            return Err(ParseError::Parse(
                "annotation is not followed by a definition".into(),
            ));
        };

        match target.kind() {
            "method" | "singleton_method" => Ok(vec![Node::Method(self.parse_method(
                target,
                Some(&chain),
                scope,
                comments,
            )?)]),
            "call" => self.parse_attributes(target, Some(&chain), scope, comments),
            other => Err(ParseError::UnexpectedNode {
                expected: "a definition after the annotation".into(),
                got: other.into(),
            }),
        }
    }

    fn parse_sig_call(&self, node: TsNode) -> Result<SigChain, ParseError> {
        let mut chain = SigChain::default();

        // `sig(:final) { ... }`
        if let Some(args) = node.child_by_field_name("arguments") {
            for i in 0..args.named_child_count() as usize {
                let arg = self.named_child(args, i)?;
                if arg.kind() == "simple_symbol" && self.node_text(arg) == ":final" {
                    chain.is_final = true;
                } else {
                    return Err(ParseError::Unsupported(format!(
                        "sig argument `{}`",
                        self.node_text(arg)
                    )));
                }
            }
        }

        let block = node
            .child_by_field_name("block")
            .ok_or_else(|| ParseError::Parse("sig without a block".into()))?;
        let body = block
            .child_by_field_name("body")
            .or_else(|| {
                self.named_index_of(block, "block_body")
                    .or_else(|| self.named_index_of(block, "body_statement"))
                    .and_then(|i| block.named_child(i as u32))
            })
            .ok_or_else(|| ParseError::Parse("empty sig block".into()))?;

        let mut expr = None;
        for i in 0..body.named_child_count() as usize {
            let child = self.named_child(body, i)?;
            if child.kind() == "comment" {
                continue;
            }
            if expr.is_some() {
                return Err(ParseError::Parse(
                    "sig block must contain a single expression".into(),
                ));
            }
            expr = Some(child);
        }
        let expr = expr.ok_or_else(|| ParseError::Parse("empty sig block".into()))?;

        for (name, arguments) in self.flatten_call_chain(expr)? {
            self.apply_sig_component(&name, arguments, &mut chain)?;
        }
        Ok(chain)
    }

    /// Flatten a call chain (`params(...).returns(...)`) into ordered
    /// (name, arguments) pairs by following the receiver chain.
    fn flatten_call_chain<'t>(
        &self,
        node: TsNode<'t>,
    ) -> Result<Vec<(String, Option<TsNode<'t>>)>, ParseError> {
        let mut elements = Vec::new();
        let mut current = node;
        loop {
            match current.kind() {
                "call" => {
                    let method = current
                        .child_by_field_name("method")
                        .ok_or_else(|| ParseError::Parse("call missing method".into()))?;
                    elements.push((
                        self.node_text(method).to_string(),
                        current.child_by_field_name("arguments"),
                    ));
                    match current.child_by_field_name("receiver") {
                        Some(receiver) => current = receiver,
                        None => break,
                    }
                }
                // A chain head with no arguments parses as a plain
                // identifier, e.g. the `abstract` in `abstract.void`.
                "identifier" => {
                    elements.push((self.node_text(current).to_string(), None));
                    break;
                }
                other => {
                    return Err(ParseError::UnexpectedNode {
                        expected: "an annotation call chain".into(),
                        got: other.into(),
                    });
                }
            }
        }
        elements.reverse();
        Ok(elements)
    }

    fn apply_sig_component(
        &self,
        name: &str,
        arguments: Option<TsNode>,
        chain: &mut SigChain,
    ) -> Result<(), ParseError> {
        match name {
            "params" => {
                let args = arguments.ok_or_else(|| {
                    ParseError::Parse("`params` expects keyword arguments".into())
                })?;
                let pairs = self.collect_pairs(args)?;
                if pairs.is_empty() {
                    return Err(ParseError::Parse(
                        "`params` expects keyword arguments".into(),
                    ));
                }
                chain.params.extend(pairs);
            }
            "returns" => {
                let args = arguments.ok_or_else(|| {
                    ParseError::Parse("`returns` expects exactly one argument".into())
                })?;
                let mut types = Vec::new();
                for i in 0..args.named_child_count() as usize {
                    types.push(self.node_text(self.named_child(args, i)?).to_string());
                }
                let [ty] = types.as_slice() else {
                    return Err(ParseError::Parse(
                        "`returns` expects exactly one argument".into(),
                    ));
                };
                chain.returns = ReturnSpec::Type(ty.clone());
            }
            "void" => chain.returns = ReturnSpec::Void,
            "abstract" => chain.is_abstract = true,
            "override" => chain.is_override = true,
            "overridable" => chain.overridable = true,
            "implementation" => chain.implementation = true,
            "type_parameters" => {
                let args = arguments.ok_or_else(|| {
                    ParseError::Parse("`type_parameters` expects symbol arguments".into())
                })?;
                for i in 0..args.named_child_count() as usize {
                    let arg = self.named_child(args, i)?;
                    if arg.kind() != "simple_symbol" {
                        return Err(ParseError::Parse(
                            "`type_parameters` expects symbol arguments".into(),
                        ));
                    }
                    chain
                        .type_parameters
                        .push(self.node_text(arg).trim_start_matches(':').to_string());
                }
            }
            // Runtime-checking configuration, not interface shape.
            "checked" | "on_failure" => {}
            other => {
                return Err(ParseError::Unsupported(format!(
                    "unknown sig component `{other}`"
                )));
            }
        }
        Ok(())
    }

    /// Collect `name: Type` pairs from an argument list, accepting both a
    /// bare keyword-argument list and a braced hash literal.
    fn collect_pairs(&self, args: TsNode) -> Result<Vec<(String, String)>, ParseError> {
        let mut pairs = Vec::new();
        for i in 0..args.named_child_count() as usize {
            let child = self.named_child(args, i)?;
            match child.kind() {
                "pair" => pairs.push(self.parse_pair(child)?),
                "hash" => {
                    for j in 0..child.named_child_count() as usize {
                        let entry = self.named_child(child, j)?;
                        if entry.kind() != "pair" {
                            return Err(ParseError::Parse(
                                "`params` expects keyword arguments".into(),
                            ));
                        }
                        pairs.push(self.parse_pair(entry)?);
                    }
                }
                _ => {
                    return Err(ParseError::Parse(
                        "`params` expects keyword arguments".into(),
                    ));
                }
            }
        }
        Ok(pairs)
    }

    fn parse_pair(&self, pair: TsNode) -> Result<(String, String), ParseError> {
        let key = pair
            .child_by_field_name("key")
            .ok_or_else(|| ParseError::Parse("malformed pair".into()))?;
        let value = pair
            .child_by_field_name("value")
            .ok_or_else(|| ParseError::Parse("malformed pair".into()))?;
        let name = self
            .node_text(key)
            .trim_start_matches(':')
            .trim_end_matches(':')
            .to_string();
        Ok((name, self.node_text(value).to_string()))
    }

    // ------------------------------------------------------------------
    // Methods and attributes
    // ------------------------------------------------------------------

    fn parse_method(
        &self,
        node: TsNode,
        sig: Option<&SigChain>,
        scope: Scope,
        comments: Vec<String>,
    ) -> Result<MethodNode, ParseError> {
        let class_level = match node.kind() {
            "singleton_method" => {
                let object = node
                    .child_by_field_name("object")
                    .map(|o| self.node_text(o).to_string())
                    .unwrap_or_default();
                if object != "self" {
                    return Err(ParseError::Unsupported(format!(
                        "method defined on `{object}`"
                    )));
                }
                if scope.singleton {
                    return Err(ParseError::Unsupported(
                        "self-qualified definition inside a singleton-scope body".into(),
                    ));
                }
                true
            }
            _ => scope.singleton,
        };

        let name = node
            .child_by_field_name("name")
            .map(|n| self.node_text(n).to_string())
            .ok_or_else(|| ParseError::Parse("method missing name".into()))?;

        let mut parameters = Vec::new();
        if let Some(list) = node.child_by_field_name("parameters") {
            for i in 0..list.named_child_count() as usize {
                parameters.push(self.parse_def_parameter(self.named_child(list, i)?)?);
            }
        }

        let mut method = match sig {
            Some(chain) => {
                let types: HashMap<&str, &str> = chain
                    .params
                    .iter()
                    .map(|(name, ty)| (name.as_str(), ty.as_str()))
                    .collect();
                if chain.params.len() != parameters.len() {
                    return Err(ParseError::Parse(format!(
                        "annotation for `{name}` declares {} parameters but the definition has {}",
                        chain.params.len(),
                        parameters.len()
                    )));
                }
                for parameter in &mut parameters {
                    let ty = types.get(parameter.bare_name()).ok_or_else(|| {
                        ParseError::Parse(format!(
                            "parameter `{}` of `{name}` is missing from the annotation",
                            parameter.bare_name()
                        ))
                    })?;
                    parameter.ty = Some(TypeExpr::Raw((*ty).to_string()));
                }

                let return_type = match &chain.returns {
                    ReturnSpec::Type(src) => Some(TypeExpr::Raw(src.clone())),
                    ReturnSpec::Void | ReturnSpec::Unspecified => None,
                };
                let mut method = MethodNode::new(name, parameters, return_type);
                method.is_abstract = chain.is_abstract;
                method.is_override = chain.is_override;
                method.overridable = chain.overridable;
                method.implementation = chain.implementation;
                method.is_final = chain.is_final;
                method.type_parameters = chain.type_parameters.clone();
                method
            }
            None => {
                for parameter in &mut parameters {
                    parameter.ty = Some(TypeExpr::Untyped);
                }
                MethodNode::new(name, parameters, Some(TypeExpr::Untyped))
            }
        };

        method.class_level = class_level;
        method.comments = comments;
        Ok(method)
    }

    fn parse_def_parameter(&self, node: TsNode) -> Result<Parameter, ParseError> {
        let (name, kind, default) = match node.kind() {
            "identifier" => (
                self.node_text(node).to_string(),
                ParameterKind::Normal,
                None,
            ),
            "optional_parameter" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.node_text(n).to_string())
                    .ok_or_else(|| ParseError::Parse("parameter missing name".into()))?;
                let default = node
                    .child_by_field_name("value")
                    .map(|v| self.node_text(v).to_string());
                (name, ParameterKind::Normal, default)
            }
            "keyword_parameter" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| format!("{}:", self.node_text(n)))
                    .ok_or_else(|| ParseError::Parse("parameter missing name".into()))?;
                let default = node
                    .child_by_field_name("value")
                    .map(|v| self.node_text(v).to_string());
                (name, ParameterKind::Keyword, default)
            }
            "splat_parameter" => (
                self.node_text(node).to_string(),
                ParameterKind::Splat,
                None,
            ),
            "hash_splat_parameter" => (
                self.node_text(node).to_string(),
                ParameterKind::DoubleSplat,
                None,
            ),
            "block_parameter" => (
                self.node_text(node).to_string(),
                ParameterKind::Block,
                None,
            ),
            other => {
                return Err(ParseError::UnexpectedNode {
                    expected: "a method parameter".into(),
                    got: other.into(),
                });
            }
        };

        let required = default.is_none();
        Ok(Parameter {
            name,
            kind,
            ty: None,
            default,
            required,
        })
    }

    fn parse_attributes(
        &self,
        node: TsNode,
        sig: Option<&SigChain>,
        scope: Scope,
        comments: Vec<String>,
    ) -> Result<Vec<Node>, ParseError> {
        let method = node
            .child_by_field_name("method")
            .map(|m| self.node_text(m).to_string())
            .unwrap_or_default();
        let kind = match method.as_str() {
            "attr_reader" => AttributeKind::Reader,
            "attr_writer" => AttributeKind::Writer,
            "attr_accessor" => AttributeKind::Accessor,
            other => {
                return Err(ParseError::UnexpectedNode {
                    expected: "an attribute declaration".into(),
                    got: format!("call to `{other}`"),
                });
            }
        };

        let ty = match sig.map(|chain| &chain.returns) {
            Some(ReturnSpec::Type(src)) => TypeExpr::Raw(src.clone()),
            _ => TypeExpr::Untyped,
        };

        let args = node
            .child_by_field_name("arguments")
            .ok_or_else(|| ParseError::Parse(format!("`{method}` without attribute names")))?;
        let mut attributes = Vec::new();
        for i in 0..args.named_child_count() as usize {
            let arg = self.named_child(args, i)?;
            if arg.kind() != "simple_symbol" {
                return Err(ParseError::UnexpectedNode {
                    expected: "a symbol attribute name".into(),
                    got: arg.kind().into(),
                });
            }
            attributes.push(Node::Attribute(AttributeNode {
                name: self.node_text(arg).trim_start_matches(':').to_string(),
                comments: comments.clone(),
                kind,
                ty: ty.clone(),
                class_level: scope.singleton,
            }));
        }
        Ok(attributes)
    }

    // ------------------------------------------------------------------
    // Enum and struct bodies
    // ------------------------------------------------------------------

    fn parse_enumerators(&self, call: TsNode) -> Result<Vec<Enumerator>, ParseError> {
        let Some(block) = call.child_by_field_name("block") else {
            return Err(ParseError::Parse("`enums` without a block".into()));
        };
        let Some(body) = block.child_by_field_name("body").or_else(|| {
            self.named_index_of(block, "body_statement")
                .or_else(|| self.named_index_of(block, "block_body"))
                .and_then(|i| block.named_child(i as u32))
        }) else {
            return Ok(Vec::new());
        };

        let mut enumerators = Vec::new();
        for i in 0..body.named_child_count() as usize {
            let child = self.named_child(body, i)?;
            match child.kind() {
                "comment" => {}
                "assignment" => {
                    let left = child
                        .child_by_field_name("left")
                        .ok_or_else(|| ParseError::Parse("malformed enumerator".into()))?;
                    if left.kind() != "constant" {
                        return Err(ParseError::UnexpectedNode {
                            expected: "an enumerator constant".into(),
                            got: left.kind().into(),
                        });
                    }
                    let right = child
                        .child_by_field_name("right")
                        .ok_or_else(|| ParseError::Parse("malformed enumerator".into()))?;
                    enumerators.push(Enumerator {
                        name: self.node_text(left).to_string(),
                        serialized: self.parse_enumerator_value(right)?,
                    });
                }
                other => {
                    return Err(ParseError::UnexpectedNode {
                        expected: "an enumerator assignment".into(),
                        got: other.into(),
                    });
                }
            }
        }
        Ok(enumerators)
    }

    fn parse_enumerator_value(&self, node: TsNode) -> Result<Option<String>, ParseError> {
        match node.kind() {
            // `X = new`
            "identifier" if self.node_text(node) == "new" => Ok(None),
            // `X = new("literal")`
            "call"
                if node
                    .child_by_field_name("method")
                    .is_some_and(|m| self.node_text(m) == "new") =>
            {
                match node.child_by_field_name("arguments") {
                    Some(args) if args.named_child_count() > 0 => {
                        Ok(Some(self.node_text(self.named_child(args, 0)?).to_string()))
                    }
                    _ => Ok(None),
                }
            }
            other => Err(ParseError::UnexpectedNode {
                expected: "an enumerator value".into(),
                got: other.into(),
            }),
        }
    }

    fn as_prop_call<'t>(&self, node: TsNode<'t>) -> Option<(TsNode<'t>, bool)> {
        if node.kind() != "call" || node.child_by_field_name("receiver").is_some() {
            return None;
        }
        let method = self.node_text(node.child_by_field_name("method")?);
        match method {
            "prop" => Some((node, false)),
            "const" => Some((node, true)),
            _ => None,
        }
    }

    fn parse_prop(&self, call: TsNode, immutable: bool) -> Result<Prop, ParseError> {
        let args = call
            .child_by_field_name("arguments")
            .ok_or_else(|| ParseError::Parse("property without arguments".into()))?;

        let mut name = None;
        let mut ty = None;
        let mut optional = false;
        let mut immutable = immutable;
        let mut default = None;

        for i in 0..args.named_child_count() as usize {
            let arg = self.named_child(args, i)?;
            match arg.kind() {
                "simple_symbol" if name.is_none() => {
                    name = Some(self.node_text(arg).trim_start_matches(':').to_string());
                }
                "pair" => {
                    let (key, value) = self.parse_pair(arg)?;
                    match key.as_str() {
                        "default" | "factory" => default = Some(value),
                        "optional" => optional = value == "true",
                        "immutable" => immutable = value == "true",
                        other => {
                            return Err(ParseError::Unsupported(format!(
                                "property option `{other}`"
                            )));
                        }
                    }
                }
                _ if name.is_some() && ty.is_none() => {
                    ty = Some(TypeExpr::Raw(self.node_text(arg).to_string()));
                }
                other => {
                    return Err(ParseError::UnexpectedNode {
                        expected: "a property declaration".into(),
                        got: other.into(),
                    });
                }
            }
        }

        Ok(Prop {
            name: name.ok_or_else(|| ParseError::Parse("property missing name".into()))?,
            ty: ty.ok_or_else(|| ParseError::Parse("property missing type".into()))?,
            optional,
            immutable,
            default,
        })
    }

    // ------------------------------------------------------------------
    // Call-shape helpers
    // ------------------------------------------------------------------

    /// A bare modifier call such as `abstract!`. Parses as a plain
    /// identifier when it has no receiver, arguments, or block.
    fn as_modifier_call<'t>(&self, node: TsNode<'t>) -> Option<&str> {
        let text = match node.kind() {
            "identifier" => self.node_text(node),
            "call"
                if node.child_by_field_name("receiver").is_none()
                    && node.child_by_field_name("arguments").is_none()
                    && node.child_by_field_name("block").is_none() =>
            {
                node.child_by_field_name("method")
                    .map(|m| self.node_text(m))?
            }
            _ => return None,
        };
        matches!(text, "abstract!" | "final!" | "interface!").then_some(text)
    }

    fn as_bare_call<'t>(&self, node: TsNode<'t>, name: &str) -> Option<TsNode<'t>> {
        (node.kind() == "call"
            && node.child_by_field_name("receiver").is_none()
            && node
                .child_by_field_name("method")
                .is_some_and(|m| self.node_text(m) == name))
        .then_some(node)
    }

    fn as_mixin_call(
        &self,
        node: TsNode,
    ) -> Result<Option<(MixinDirective, String)>, ParseError> {
        if node.kind() != "call" || node.child_by_field_name("receiver").is_some() {
            return Ok(None);
        }
        let Some(method) = node.child_by_field_name("method") else {
            return Ok(None);
        };
        let directive = match self.node_text(method) {
            "include" => MixinDirective::Include,
            "extend" => MixinDirective::Extend,
            _ => return Ok(None),
        };

        let Some(args) = node.child_by_field_name("arguments") else {
            return Err(ParseError::Parse(
                "mixin directive without a target".into(),
            ));
        };
        if args.named_child_count() != 1 {
            return Err(ParseError::Unsupported(
                "mixin directive with multiple targets".into(),
            ));
        }
        let target = self.node_text(self.named_child(args, 0)?).to_string();
        Ok(Some((directive, target)))
    }
}

#[derive(Debug, Clone, Copy)]
enum MixinDirective {
    Include,
    Extend,
}
