//! Sandbox limits: every hostile template terminates with an error.

use std::time::{Duration, Instant};

use luma::{Engine, Limits, Resource, RuntimeErrorKind, Value, context};

fn limit_of(engine: &Engine, source: &str, ctx: &Value) -> (Resource, usize) {
    match engine.render(source, ctx).unwrap_err() {
        luma::Error::Runtime(error) => match error.kind {
            RuntimeErrorKind::ResourceLimitExceeded { resource, limit } => (resource, limit),
            other => panic!("expected a resource limit, got {other:?}"),
        },
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

fn numbers(count: usize) -> Value {
    Value::Sequence((0..count).map(Value::from).collect())
}

// =============================================================================
// Loops and steps
// =============================================================================

#[test]
fn huge_loop_is_rejected_before_iterating() {
    let engine = Engine::new();
    let ctx = context! { "items" => numbers(100_001) };
    let (resource, limit) = limit_of(&engine, "@for i in items\n$i\n@end", &ctx);
    assert_eq!(resource, Resource::LoopIterations);
    assert_eq!(limit, 10_000);
}

#[test]
fn loop_limit_is_configurable() {
    let engine = Engine::builder()
        .limits(Limits::builder().max_loop_iterations(3).build())
        .build();
    let source = "@for i in items\n$i\n@end";
    assert_eq!(engine.render(source, &context! { "items" => numbers(3) }).unwrap(), "0\n1\n2\n");
    let (resource, _) = limit_of(&engine, source, &context! { "items" => numbers(4) });
    assert_eq!(resource, Resource::LoopIterations);
}

#[test]
fn nested_loops_exhaust_steps() {
    let engine = Engine::new();
    let ctx = context! { "xs" => numbers(10_000) };
    let source = "@for a in xs\n@for b in xs\n${ a + b }\n@end\n@end\n";
    let (resource, limit) = limit_of(&engine, source, &ctx);
    assert_eq!(resource, Resource::Steps);
    assert_eq!(limit, 1_000_000);
}

#[test]
fn step_limit_error_has_position() {
    let engine = Engine::builder()
        .limits(Limits::builder().max_steps(10).build())
        .build();
    let error = engine
        .render("@for x in xs\n$x\n@end\n", &context! { "xs" => numbers(50) })
        .unwrap_err();
    assert!(error.position().is_some());
    insta::assert_snapshot!(
        error.to_string(),
        @"runtime error: evaluation step limit of 10 exceeded at 1:1"
    );
}

#[test]
fn large_values_cost_steps_in_proportion_to_size() {
    let engine = Engine::builder()
        .limits(Limits::builder().max_steps(100).build())
        .build();
    let small = context! { "s" => "x".repeat(10 * 1024) };
    assert_eq!(engine.render("${ s }", &small).unwrap().len(), 10 * 1024);

    let large = context! { "s" => "x".repeat(200 * 1024) };
    let (resource, limit) = limit_of(&engine, "${ s }", &large);
    assert_eq!((resource, limit), (Resource::Steps, 100));
}

#[test]
fn copying_a_large_string_in_loops_exhausts_steps_quickly() {
    let mut source = String::from("@let s = 'xxxxxxxxxxxxxxxx'\n");
    for _ in 0..19 {
        source.push_str("@let s = s ~ s\n");
    }
    source.push_str("@for a in xs\n@for b in xs\n@let t = s ~ ''\n@end\n@end\n");
    let ctx = context! { "xs" => numbers(100) };

    let started = Instant::now();
    let (resource, limit) = limit_of(&Engine::new(), &source, &ctx);
    assert_eq!((resource, limit), (Resource::Steps, 1_000_000));
    assert!(started.elapsed() < Duration::from_secs(30));
}

// =============================================================================
// Output size
// =============================================================================

#[test]
fn string_doubling_bomb_hits_output_limit() {
    let mut source = String::from("@let s = 'xxxxxxxxxxxxxxxx'\n");
    for _ in 0..40 {
        source.push_str("@let s = s ~ s\n");
    }
    source.push_str("$s\n");
    let (resource, limit) = limit_of(&Engine::new(), &source, &context! {});
    assert_eq!(resource, Resource::OutputBytes);
    assert_eq!(limit, 16 * 1024 * 1024);
}

#[test]
fn output_limit_covers_rendered_text() {
    let engine = Engine::builder()
        .limits(Limits::builder().max_output_bytes(8).build())
        .build();
    assert_eq!(engine.render("12345678", &context! {}).unwrap(), "12345678");
    let (resource, limit) = limit_of(&engine, "123456789", &context! {});
    assert_eq!((resource, limit), (Resource::OutputBytes, 8));
    let (resource, _) = limit_of(&engine, "${ 'abcd' | replace('a', 'aaaaaaaaa') }", &context! {});
    assert_eq!(resource, Resource::OutputBytes);
}

#[test]
fn join_bomb_is_bounded() {
    let engine = Engine::builder()
        .limits(Limits::builder().max_output_bytes(1024).build())
        .build();
    let ctx = context! { "xs" => numbers(5_000) };
    let (resource, _) = limit_of(&engine, "@let j = xs | join(',')\nok", &ctx);
    assert_eq!(resource, Resource::OutputBytes);
}

// =============================================================================
// Depth
// =============================================================================

#[test]
fn deep_nesting_hits_depth_limit() {
    let engine = Engine::builder()
        .limits(Limits::builder().max_depth(8).build())
        .build();
    let mut source = String::new();
    for _ in 0..10 {
        source.push_str("@if true\n");
    }
    source.push_str("deep\n");
    for _ in 0..10 {
        source.push_str("@end\n");
    }
    let (resource, limit) = limit_of(&engine, &source, &context! {});
    assert_eq!((resource, limit), (Resource::Depth, 8));
}

#[test]
fn nested_expressions_hit_depth_limit() {
    let engine = Engine::new();
    let nested = format!("${{ {}1{} }}", "1 + (".repeat(100), ")".repeat(100));
    let (resource, _) = limit_of(&engine, &nested, &context! {});
    assert_eq!(resource, Resource::Depth);

    let negations = format!("${{ {}x }}", "!".repeat(100));
    let (resource, _) = limit_of(&engine, &negations, &context! { "x" => true });
    assert_eq!(resource, Resource::Depth);
}

#[test]
fn operator_chains_do_not_consume_depth() {
    let engine = Engine::new();
    let sum = vec!["1"; 100].join(" + ");
    assert_eq!(engine.render(&format!("${{ {sum} }}"), &context! {}).unwrap(), "100");
    let product = vec!["2"; 100].join(" * ");
    assert!(engine.render(&format!("${{ {product} > 0 }}"), &context! {}).is_ok());
}

#[test]
fn long_elif_chains_stay_flat() {
    let engine = Engine::new();
    let mut native = String::from("@if n == 0\nzero\n");
    let mut jinja = String::from("{% if n == 0 %}zero");
    for i in 1..150 {
        native.push_str(&format!("@elif n == {i}\nbranch {i}\n"));
        jinja.push_str(&format!("{{% elif n == {i} %}}branch {i}"));
    }
    native.push_str("@else\nnone\n@end\n");
    jinja.push_str("{% else %}none{% endif %}");

    assert_eq!(engine.render(&native, &context! { "n" => 99 }).unwrap(), "branch 99\n");
    assert_eq!(engine.render(&native, &context! { "n" => 149 }).unwrap(), "branch 149\n");
    assert_eq!(engine.render(&native, &context! { "n" => 500 }).unwrap(), "none\n");
    assert_eq!(engine.render(&jinja, &context! { "n" => 120 }).unwrap(), "branch 120");

    let shallow = Engine::builder()
        .limits(Limits::builder().max_depth(4).build())
        .build();
    assert_eq!(shallow.render(&native, &context! { "n" => 70 }).unwrap(), "branch 70\n");
}

#[test]
fn unlimited_limits_allow_large_work() {
    let engine = Engine::builder().limits(Limits::unlimited()).build();
    let ctx = context! { "xs" => numbers(20_000) };
    let output = engine.render("@for x in xs\n.\n@end", &ctx).unwrap();
    assert_eq!(output.len(), 40_000);
}

// =============================================================================
// Hostile parse input
// =============================================================================

#[test]
fn pathological_nesting_is_a_parse_error() {
    let source = format!("${{ {}1{} }}", "(".repeat(10_000), ")".repeat(10_000));
    assert!(matches!(
        luma::compile(&source).unwrap_err(),
        luma::Error::Parse(_)
    ));

    let source = format!("${{ {}x }}", "!".repeat(10_000));
    assert!(matches!(
        luma::compile(&source).unwrap_err(),
        luma::Error::Parse(_)
    ));

    let source = "@if x\n".repeat(1_000);
    assert!(matches!(
        luma::compile(&source).unwrap_err(),
        luma::Error::Parse(_)
    ));
}

#[test]
fn operator_count_is_bounded() {
    let chain = vec!["1"; 600].join(" ~ ");
    assert!(matches!(
        luma::compile(&format!("${{ {chain} }}")).unwrap_err(),
        luma::Error::Parse(_)
    ));
    let chain = vec!["1"; 500].join(" ~ ");
    let output = luma::render(&format!("${{ {chain} }}"), &context! {}).unwrap();
    assert_eq!(output.len(), 500);
}
