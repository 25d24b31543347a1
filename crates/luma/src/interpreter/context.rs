//! Name resolution during execution.

use std::collections::HashMap;

use crate::types::{Mapping, Value};

/// Variable scopes for one execution.
///
/// Names resolve from the innermost scope outwards, then in the context's
/// root mapping, then in the engine's globals. The context and globals are
/// borrowed and never written; `let` bindings always go to the innermost
/// scope.
pub(crate) struct Scopes<'a> {
    root: &'a Value,
    globals: &'a Mapping,
    frames: Vec<HashMap<String, Value>>,
}

impl<'a> Scopes<'a> {
    pub fn new(root: &'a Value, globals: &'a Mapping) -> Self {
        Self {
            root,
            globals,
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self, frame: HashMap<String, Value>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind `name` in the innermost scope.
    pub fn bind(&mut self, name: String, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name, value);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.root.get(name))
            .or_else(|| self.globals.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scopes_shadow_context_and_globals() {
        let root = Value::Mapping([("a".to_string(), Value::from(1))].into_iter().collect());
        let globals: Mapping = [
            ("a".to_string(), Value::from(2)),
            ("g".to_string(), Value::from(3)),
        ]
        .into_iter()
        .collect();
        let mut scopes = Scopes::new(&root, &globals);
        assert_eq!(scopes.lookup("a"), Some(&Value::from(1)));
        assert_eq!(scopes.lookup("g"), Some(&Value::from(3)));

        scopes.push(HashMap::from([("a".to_string(), Value::from(4))]));
        assert_eq!(scopes.lookup("a"), Some(&Value::from(4)));
        scopes.pop();
        assert_eq!(scopes.lookup("a"), Some(&Value::from(1)));
        assert_eq!(scopes.lookup("missing"), None);
    }
}
