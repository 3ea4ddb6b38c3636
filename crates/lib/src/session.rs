//! Per-conversation mutable state.
//!
//! One instance per session: created empty when a session starts, mutated
//! only inside rule producers, and replaced (not merged) by a fresh
//! instance on the next session start. The only documented mutation is the
//! cart, an ordered list of item-name strings.

use serde_json::{Map, Value};

const CART_KEY: &str = "cart";

/// Session-scoped key/value store with helpers for the cart.
#[derive(Debug, Clone)]
pub struct SessionState {
    id: String,
    values: Map<String, Value>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Fresh, empty state with a generated id.
    pub fn new() -> Self {
        Self {
            id: format!("sess-{}", uuid::Uuid::new_v4()),
            values: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up an arbitrary value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Store an arbitrary value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Items currently in the cart, in insertion order.
    pub fn cart(&self) -> Vec<String> {
        match self.values.get(CART_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Append an item name to the cart.
    pub fn cart_add(&mut self, item: impl Into<String>) {
        let entry = self
            .values
            .entry(CART_KEY.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(items) = entry {
            items.push(Value::String(item.into()));
        }
    }

    /// Drop every item from the cart.
    pub fn cart_clear(&mut self) {
        self.values.insert(CART_KEY.to_string(), Value::Array(Vec::new()));
    }

    /// Deep, point-in-time copy of the whole store. Later mutations do not
    /// show through the returned value.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
