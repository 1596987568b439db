//! End-to-end pipeline tests: parse, merge, resolve, convert, emit.

use rbsig::{
    Dialect, EmitOptions, Namespace, NamespaceKind, Node, RbiToRbs, RbsEmitter, TypeExpr,
    parse_ruby, resolve,
};

/// Parse several source units and union them under one root.
fn merge_sources(sources: &[&str]) -> Namespace {
    let mut root = Namespace::root();
    for source in sources {
        for node in parse_ruby(source).expect("parse failed") {
            root.append(node);
        }
    }
    root
}

#[test]
fn test_duplicate_classes_across_files_collapse() {
    let mut root = merge_sources(&[
        "module M\n  class A\n  end\nend\n",
        "module M\n  class A\n  end\nend\n",
    ]);
    resolve::resolve_conflicts(&mut root, &mut resolve::reject_all).unwrap();

    let [Node::Namespace(m)] = root.children.as_slice() else {
        panic!("expected a single module");
    };
    assert_eq!(m.children.len(), 1);
    let Node::Namespace(a) = &m.children[0] else {
        panic!("expected a namespace");
    };
    assert!(matches!(a.kind, NamespaceKind::Class(_)));
}

#[test]
fn test_untyped_and_unannotated_methods_merge() {
    let mut root = merge_sources(&[
        "sig { params(a: T.untyped).returns(T.untyped) }\ndef foo(a)\nend\n",
        "def foo(a)\nend\n",
    ]);
    resolve::resolve_conflicts(&mut root, &mut resolve::reject_all).unwrap();
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].name(), "foo");
}

#[test]
fn test_void_and_unannotated_methods_escalate() {
    let mut root = merge_sources(&["sig { void }\ndef foo\nend\n", "def foo\nend\n"]);

    let mut calls = 0;
    let mut strategy =
        |_: &str, candidates: &[Node]| -> Result<Option<Node>, resolve::ResolveError> {
            calls += 1;
            assert_eq!(candidates.len(), 2);
            Ok(None)
        };
    resolve::resolve_conflicts(&mut root, &mut strategy).unwrap();
    assert_eq!(calls, 1);
    assert!(root.children.is_empty());
}

#[test]
fn test_conflicting_types_escalate_once() {
    let mut root = merge_sources(&[
        "sig { params(a: String).void }\ndef foo(a)\nend\n",
        "sig { params(a: Integer).void }\ndef foo(a)\nend\n",
    ]);

    let mut calls = 0;
    let mut strategy =
        |description: &str, candidates: &[Node]| -> Result<Option<Node>, resolve::ResolveError> {
            calls += 1;
            assert!(description.contains("foo"), "{description}");
            assert_eq!(candidates.len(), 2);
            Ok(None)
        };
    resolve::resolve_conflicts(&mut root, &mut strategy).unwrap();
    assert_eq!(calls, 1);
    assert!(root.children.is_empty());
}

#[test]
fn test_empty_enum_absorbs_populated_sibling() {
    let mut root = merge_sources(&[
        "class Direction < T::Enum\nend\n",
        "class Direction < T::Enum\n  enums do\n    North = new\n    South = new\n    \
         East = new\n    West = new\n  end\nend\n",
    ]);
    resolve::resolve_conflicts(&mut root, &mut resolve::reject_all).unwrap();

    let [Node::Namespace(survivor)] = root.children.as_slice() else {
        panic!("expected one namespace");
    };
    let NamespaceKind::Enum(details) = &survivor.kind else {
        panic!("expected an enum");
    };
    let names: Vec<&str> = details
        .enumerators
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, ["North", "South", "East", "West"]);
}

#[test]
fn test_abstract_class_conversion_warns_once() {
    let root = merge_sources(&["class Base\n  abstract!\nend\n"]);

    let mut converter = RbiToRbs::new();
    let mut dest = Namespace::root();
    converter.convert_all(&root.children, &mut dest);

    assert_eq!(converter.warnings().len(), 1);
    assert!(converter.warnings()[0].message.contains("abstract"));
    let [Node::Namespace(converted)] = dest.children.as_slice() else {
        panic!("expected one namespace");
    };
    let NamespaceKind::Class(details) = &converted.kind else {
        panic!("expected a class");
    };
    assert!(!details.is_abstract);
}

#[test]
fn test_block_parameter_conversion_outcomes() {
    let root = merge_sources(&[
        "sig { params(blk: T.proc.void).void }\ndef each(&blk)\nend\n",
        "sig { params(blk: T.nilable(T.proc.void)).void }\ndef maybe(&blk)\nend\n",
        "sig { params(blk: Integer).void }\ndef weird(&blk)\nend\n",
    ]);

    let mut converter = RbiToRbs::new();
    let mut dest = Namespace::root();
    converter.convert_all(&root.children, &mut dest);

    let methods: Vec<&rbsig::MethodNode> = dest
        .children
        .iter()
        .filter_map(|n| match n {
            Node::Method(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(methods.len(), 3);

    let required = methods[0].block.as_ref().expect("required block");
    assert!(required.required);
    assert_eq!(required.proc_type, TypeExpr::Raw("T.proc.void".into()));

    let optional = methods[1].block.as_ref().expect("optional block");
    assert!(!optional.required);

    assert!(methods[2].block.is_none());
    assert_eq!(converter.warnings().len(), 1);
    assert!(converter.warnings()[0].message.contains("weird"));
}

#[test]
fn test_full_pipeline_to_rbs() {
    let mut root = merge_sources(&[
        "class Greeter\n  sig { params(name: String).returns(String) }\n  \
         def greet(name)\n  end\nend\n",
        "class Greeter\n  include Enumerable\n\n  sig { returns(Integer) }\n  \
         def count\n  end\nend\n",
    ]);
    resolve::resolve_conflicts(&mut root, &mut resolve::keep_first).unwrap();

    let mut converter = RbiToRbs::new();
    let mut dest = Namespace::root();
    converter.convert_all(&root.children, &mut dest);
    assert!(converter.warnings().is_empty());

    let rbs = RbsEmitter::emit(&dest, EmitOptions::default());
    assert_eq!(
        rbs,
        "class Greeter\n  include Enumerable\n\n  def greet: (String name) -> String\n  \
         def count: () -> Integer\nend\n"
    );
}

#[test]
fn test_emission_via_registry_is_deterministic() {
    let root = merge_sources(&["sig { returns(Integer) }\ndef answer\nend\n"]);

    let emitter = rbsig::registry::emitter_for_dialect(Dialect::Rbi).expect("rbi emitter");
    let options = EmitOptions::default();
    let first = emitter.emit(&root, &options);
    let second = emitter.emit(&root, &options);
    assert_eq!(first, second);
    assert_eq!(first, "sig { returns(Integer) }\ndef answer; end\n");
}

#[test]
fn test_resolution_idempotent_after_merge() {
    let mut root = merge_sources(&[
        "module M\n  class A\n  end\nend\n",
        "module M\n  class A\n    sig { void }\n    def go\n    end\n  end\nend\n",
    ]);
    resolve::resolve_conflicts(&mut root, &mut resolve::reject_all).unwrap();
    let once = root.clone();
    resolve::resolve_conflicts(&mut root, &mut resolve::reject_all).unwrap();
    assert_eq!(root, once);
}
