//! Options values for module words
//!
//! Forthic words accept optional keyword-style configuration through an
//! options value built by the `~>` word:
//!
//! ```forthic
//! [1 2 3] "2 *" [.with_key TRUE] ~> MAP
//! ```
//!
//! The flat `[.key value ...]` array must have even arity and string keys
//! (dot symbols push their name as a string); anything else is an
//! `InvalidOptions` error. Words that accept options peek the stack top: if
//! it is an Options value they pop and apply it, otherwise they treat the
//! options as absent.

use crate::errors::ForthicError;
use crate::values::Value;
use std::collections::HashMap;

/// Keyword-style options for a word invocation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WordOptions {
    options: HashMap<String, Value>,
}

impl WordOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from a flat `[key value key value ...]` array.
    ///
    /// Keys must be strings; the array length must be even.
    pub fn from_flat_array(flat: &[Value]) -> Result<Self, ForthicError> {
        if flat.len() % 2 != 0 {
            return Err(ForthicError::InvalidOptions {
                reason: format!(
                    "options must be key-value pairs, got {} elements",
                    flat.len()
                ),
                location: None,
            });
        }

        let mut options = HashMap::new();
        for pair in flat.chunks(2) {
            let key = match &pair[0] {
                Value::String(s) => s.clone(),
                Value::PositionedString(ps) => ps.text.clone(),
                other => {
                    return Err(ForthicError::InvalidOptions {
                        reason: format!("option key must be a string, got {:?}", other),
                        location: None,
                    })
                }
            };
            options.insert(key, pair[1].clone());
        }

        Ok(Self { options })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_int())
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_string())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
