//! Error reporting: lex, parse and runtime errors with their positions.

use luma::parser::Node;
use luma::{Error, Value, context, render};

fn error_text(source: &str, ctx: &Value) -> String {
    render(source, ctx).unwrap_err().to_string()
}

// =============================================================================
// Lex errors
// =============================================================================

#[test]
fn unterminated_interpolation() {
    insta::assert_snapshot!(
        error_text("${ a", &context! {}),
        @"lex error: unterminated `${` at 1:1"
    );
    insta::assert_snapshot!(
        error_text("ok\n{{ a ", &context! {}),
        @"lex error: unterminated `{{` at 2:1"
    );
}

#[test]
fn mixed_dialects_are_rejected() {
    insta::assert_snapshot!(
        error_text("{{ a }} ${ b }", &context! {}),
        @"lex error: `${` cannot be used in a jinja template; dialects cannot be mixed at 1:9"
    );
    let error = render("{{ a }}\n@for x in y\n", &context! {}).unwrap_err();
    assert!(matches!(error, Error::Lex(_)));
    assert_eq!(error.position().map(|p| p.line), Some(2));
}

// =============================================================================
// Parse errors
// =============================================================================

#[test]
fn unterminated_block_names_the_opener() {
    insta::assert_snapshot!(
        error_text("@if x", &context! {}),
        @"parse error: expected `@end`, found end of input at 1:1"
    );
    insta::assert_snapshot!(
        error_text("a\n{% for x in y %}\n{{ x }}", &context! {}),
        @"parse error: expected `{% endfor %}`, found end of input at 2:1"
    );
}

#[test]
fn mismatched_closer() {
    insta::assert_snapshot!(
        error_text("{% if x %}a{% endfor %}", &context! {}),
        @"parse error: expected `{% endif %}`, found `{% endfor %}` at 1:12"
    );
}

#[test]
fn unmatched_closer() {
    insta::assert_snapshot!(
        error_text("@end", &context! {}),
        @"parse error: expected an open `@if` or `@for` block, found `@end` at 1:1"
    );
}

#[test]
fn two_loop_variables_need_pairs() {
    insta::assert_snapshot!(
        error_text("@for k, v in m\n@end", &context! {}),
        @"parse error: expected `pairs(...)` for two loop variables, found `m` at 1:14"
    );
    assert!(matches!(
        luma::parse("@for x in pairs(m)\n@end").unwrap_err(),
        Error::Parse(_)
    ));
}

#[test]
fn filter_arguments_must_be_literals() {
    let error = render("${ a | default(b) }", &context! {}).unwrap_err();
    assert!(matches!(error, Error::Parse(_)));
    assert_eq!(error.position().map(|p| p.column), Some(16));
}

#[test]
fn reserved_words_are_not_variables() {
    assert!(matches!(
        luma::parse("${ and }").unwrap_err(),
        Error::Parse(_)
    ));
}

#[test]
fn no_partial_ast_on_error() {
    assert!(luma::parse("before\n@if x\nmiddle\n").is_err());
    let template = luma::parse("before\n@if x\nmiddle\n@end\n").unwrap();
    assert_eq!(template.nodes.len(), 2);
    assert!(matches!(template.nodes[1], Node::If { .. }));
}

// =============================================================================
// Runtime errors
// =============================================================================

#[test]
fn iteration_over_non_iterable() {
    insta::assert_snapshot!(
        error_text("@for x in n\n@end", &context! { "n" => 5 }),
        @"runtime error: cannot iterate over number at 1:1"
    );
}

#[test]
fn loop_shape_mismatch() {
    insta::assert_snapshot!(
        error_text("@for k, v in pairs(xs)\n@end", &context! { "xs" => vec![1] }),
        @"runtime error: `for` with two variables expects a mapping, found sequence at 1:1"
    );
    let error = render("@for x in m\n@end", &context! { "m" => context! { "a" => 1 } }).unwrap_err();
    assert!(error.to_string().contains("`for` with one variable"));
}

#[test]
fn arithmetic_type_mismatch() {
    insta::assert_snapshot!(
        error_text("${ 'a' + 1 }", &context! {}),
        @"runtime error: operator `+` expects two numbers, found string and number at 1:4"
    );
    insta::assert_snapshot!(
        error_text("${ 1 / 0 }", &context! {}),
        @"runtime error: operator `/`: division by zero at 1:4"
    );
}

#[test]
fn output_is_all_or_nothing() {
    let source = "header\n@for x in xs\n${ 10 / x }\n@end\n";
    let result = render(source, &context! { "xs" => vec![1, 2, 0] });
    assert!(result.is_err());
}

#[test]
fn error_message_and_position_are_separable() {
    let error = render("line one\n${ x | nope }", &context! {}).unwrap_err();
    let position = error.position().unwrap();
    assert_eq!((position.line, position.column), (2, 8));
    assert_eq!(error.message(), "unknown filter 'nope'");
}
