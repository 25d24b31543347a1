//! Parser tests: both dialects produce the same tree.

use luma::lexer::{TokenKind, tokenize};
use luma::parser::{BinaryOp, ExprKind, Node, PathSegment};
use luma::{Dialect, Value};

// =============================================================================
// Lexing
// =============================================================================

#[test]
fn native_directive_tokens() {
    let stream = tokenize("@for x in xs\n$x\n@end\n").unwrap();
    assert_eq!(stream.dialect, Dialect::Native);
    let kinds: Vec<&TokenKind> = stream.tokens.iter().map(|t| &t.kind).collect();
    assert_eq!(kinds[0], &TokenKind::BlockStart);
    assert_eq!(stream.tokens[1].lexeme, "for");
    assert_eq!(kinds.last(), Some(&&TokenKind::Eof));
}

#[test]
fn token_positions_are_one_based() {
    let stream = tokenize("a\n  ${ b }").unwrap();
    let start = stream
        .tokens
        .iter()
        .find(|t| t.kind == TokenKind::InterpolationStart)
        .unwrap();
    assert_eq!((start.position.line, start.position.column), (2, 3));
    assert_eq!(start.position.offset, 4);
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn dialects_parse_to_the_same_tree() {
    let native = luma::parse("@if a\n${ b | upper }\n@else\nc\n@end\n").unwrap();
    let jinja = luma::parse("{% if a %}\n{{ b | upper }}\n{% else %}\nc\n{% endif %}\n").unwrap();
    let shape = |nodes: &[Node]| match &nodes[0] {
        Node::If {
            branches,
            else_body,
            ..
        } => (
            branches.len(),
            branches[0].body.len(),
            else_body.as_ref().map(Vec::len),
        ),
        other => panic!("expected if, got {other:?}"),
    };
    assert_eq!(shape(&native.nodes), (1, 2, Some(1)));
    assert_eq!(shape(&native.nodes), shape(&jinja.nodes));
}

#[test]
fn elif_adds_branches_at_the_same_level() {
    let template = luma::parse("{% if a %}1{% elif b %}2{% elif c %}3{% else %}4{% endif %}").unwrap();
    let Node::If {
        branches,
        else_body,
        position,
    } = &template.nodes[0]
    else {
        panic!("expected if");
    };
    let conditions: Vec<_> = branches
        .iter()
        .map(|branch| match &branch.condition.kind {
            ExprKind::Path { root, .. } => root.as_str(),
            other => panic!("expected a path, got {other:?}"),
        })
        .collect();
    assert_eq!(conditions, ["a", "b", "c"]);
    assert_eq!(branches[0].position, *position);
    assert_eq!(branches[1].position.offset, 11);
    assert_eq!(else_body.as_ref().map(Vec::len), Some(1));
}

#[test]
fn elif_chains_do_not_count_as_nesting() {
    let mut source = String::from("@if n == 0\n0\n");
    for i in 1..=300 {
        source.push_str(&format!("@elif n == {i}\n{i}\n"));
    }
    source.push_str("@end\n");
    let template = luma::parse(&source).unwrap();
    let Node::If { branches, .. } = &template.nodes[0] else {
        panic!("expected if");
    };
    assert_eq!(branches.len(), 301);
}

#[test]
fn pairs_loop_records_key_variable() {
    let template = luma::parse("@for k, v in pairs(env)\n@end").unwrap();
    let Node::For { item, key, iterable, .. } = &template.nodes[0] else {
        panic!("expected for");
    };
    assert_eq!(item, "v");
    assert_eq!(key.as_deref(), Some("k"));
    assert!(matches!(&iterable.kind, ExprKind::Path { root, .. } if root == "env"));
}

#[test]
fn interpolation_keeps_trailing_filters() {
    let template = luma::parse("${ a.b[0] | default('x') | upper }").unwrap();
    let Node::Interpolation { expr, filters, .. } = &template.nodes[0] else {
        panic!("expected interpolation");
    };
    let names: Vec<&str> = filters.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["default", "upper"]);
    assert_eq!(filters[0].args, vec![Value::from("x")]);
    let ExprKind::Path { segments, .. } = &expr.kind else {
        panic!("expected path");
    };
    assert_eq!(
        segments,
        &vec![PathSegment::Field("b".to_string()), PathSegment::Index(0)]
    );
}

#[test]
fn precedence_of_arithmetic_and_logic() {
    let template = luma::parse("${ a or b and c + 1 * 2 }").unwrap();
    let Node::Interpolation { expr, .. } = &template.nodes[0] else {
        panic!("expected interpolation");
    };
    let ExprKind::Binary { op, right, .. } = &expr.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Or);
    assert!(matches!(
        &right.kind,
        ExprKind::Binary { op: BinaryOp::And, .. }
    ));
}

#[test]
fn let_and_set_are_equivalent() {
    for source in ["@let x = 1\n", "{% set x = 1 %}"] {
        let template = luma::parse(source).unwrap();
        let Node::Let { name, value, .. } = &template.nodes[0] else {
            panic!("expected let in {source:?}");
        };
        assert_eq!(name, "x");
        assert_eq!(value.kind, ExprKind::Literal(Value::from(1)));
    }
}
