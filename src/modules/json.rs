// JSON module for Forthic
//
// Serialization between Forthic values and JSON text.
//
// ## Categories
// - Conversion: >JSON, JSON>
// - Formatting: JSON-PRETTIFY

use crate::errors::ForthicError;
use crate::interpreter::Interpreter;
use crate::module::{Module, ModuleRef};
use crate::values::Value;
use crate::words::BuiltinWord;
use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};
use std::cell::RefCell;
use std::rc::Rc;

/// JSON word set
pub struct JsonModule {
    module: Module,
}

impl JsonModule {
    pub fn new() -> Self {
        let mut module = Module::new("json".to_string());

        module.add_exportable_word(Rc::new(BuiltinWord::new(">JSON", Self::word_to_json)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("JSON>", Self::word_from_json)));
        module.add_exportable_word(Rc::new(BuiltinWord::new(
            "JSON-PRETTIFY",
            Self::word_json_prettify,
        )));

        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self.module))
    }

    /// ( value -- json-string )
    fn word_to_json(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let json_value = Self::value_to_json(&value);
        let text = serde_json::to_string(&json_value).unwrap_or_else(|_| "null".to_string());
        interp.stack_push(Value::String(text));
        Ok(())
    }

    /// ( json-string -- value )
    fn word_from_json(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let result = match value.as_string() {
            Some(s) if !s.trim().is_empty() => match serde_json::from_str::<JsonValue>(s) {
                Ok(parsed) => Self::json_to_value(&parsed),
                Err(_) => Value::Null,
            },
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( json-string -- pretty-json-string )
    fn word_json_prettify(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let result = match value.as_string() {
            Some(s) if !s.trim().is_empty() => match serde_json::from_str::<JsonValue>(s) {
                Ok(parsed) => Value::String(
                    serde_json::to_string_pretty(&parsed).unwrap_or_default(),
                ),
                Err(_) => Value::String(String::new()),
            },
            _ => Value::String(String::new()),
        };
        interp.stack_push(result);
        Ok(())
    }

    fn value_to_json(value: &Value) -> JsonValue {
        match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::PositionedString(ps) => JsonValue::String(ps.text.clone()),
            Value::Array(items) => {
                JsonValue::Array(items.iter().map(Self::value_to_json).collect())
            }
            Value::Record(rec) => {
                let object: serde_json::Map<String, JsonValue> = rec
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::value_to_json(v)))
                    .collect();
                JsonValue::Object(object)
            }
            Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => JsonValue::String(t.format("%H:%M:%S").to_string()),
            Value::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            _ => JsonValue::Null,
        }
    }

    fn json_to_value(value: &JsonValue) -> Value {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => {
                Value::Array(items.iter().map(Self::json_to_value).collect())
            }
            JsonValue::Object(object) => {
                let record: IndexMap<String, Value> = object
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::json_to_value(v)))
                    .collect();
                Value::Record(record)
            }
        }
    }
}

impl Default for JsonModule {
    fn default() -> Self {
        Self::new()
    }
}
