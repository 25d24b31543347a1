//! Compiled templates are shared across threads without locking.

use std::thread;

use luma::{CompiledTemplate, Engine, Value, context};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn public_types_are_send_and_sync() {
    assert_send_sync::<CompiledTemplate>();
    assert_send_sync::<Engine>();
    assert_send_sync::<Value>();
    assert_send_sync::<luma::Error>();
}

#[test]
fn concurrent_execution_is_independent() {
    let engine = Engine::new();
    let template = engine
        .compile("@for i in items\n${ name | upper }-$i\n@end")
        .unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let template = &template;
                scope.spawn(move || {
                    let ctx = context! {
                        "name" => format!("worker{n}"),
                        "items" => vec![n, n + 1],
                    };
                    template.execute(&ctx).unwrap()
                })
            })
            .collect();
        for (n, handle) in handles.into_iter().enumerate() {
            let output = handle.join().unwrap();
            assert_eq!(output, format!("WORKER{n}-{n}\nWORKER{n}-{}\n", n + 1));
        }
    });
}

#[test]
fn cloned_templates_share_compiled_program() {
    let template = luma::compile("$x").unwrap();
    let copies: Vec<CompiledTemplate> = (0..4).map(|_| template.clone()).collect();
    let outputs: Vec<String> = thread::scope(|scope| {
        copies
            .into_iter()
            .enumerate()
            .map(|(i, copy)| scope.spawn(move || copy.execute(&context! { "x" => i }).unwrap()))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });
    assert_eq!(outputs, vec!["0", "1", "2", "3"]);
}
