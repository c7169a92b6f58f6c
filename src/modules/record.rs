// Record module for Forthic
//
// Ordered key/value records. Key insertion order is preserved, so KEYS and
// VALUES come back in the order the record was built.

use crate::errors::ForthicError;
use crate::interpreter::Interpreter;
use crate::module::{Module, ModuleRef};
use crate::values::Value;
use crate::words::BuiltinWord;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Record word set
pub struct RecordModule {
    module: Module,
}

impl RecordModule {
    pub fn new() -> Self {
        let mut module = Module::new("record".to_string());

        module.add_exportable_word(Rc::new(BuiltinWord::new("REC", Self::word_rec)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("REC@", Self::word_rec_at)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("<REC!", Self::word_rec_store)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("KEYS", Self::word_keys)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("VALUES", Self::word_values)));

        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self.module))
    }

    /// ( pairs -- record ) build a record from [[key value] ...]
    fn word_rec(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let pairs = interp.stack_pop()?;

        let mut record = IndexMap::new();
        if let Value::Array(pairs) = pairs {
            for pair in pairs {
                if let Value::Array(pair) = pair {
                    if pair.len() == 2 {
                        if let Some(key) = pair[0].as_string() {
                            record.insert(key.to_string(), pair[1].clone());
                        }
                    }
                }
            }
        }
        interp.stack_push(Value::Record(record));
        Ok(())
    }

    /// ( record key -- value ) key may be an array for nested access
    fn word_rec_at(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let key = interp.stack_pop()?;
        let record = interp.stack_pop()?;

        let result = match key {
            Value::Array(path) => {
                let mut cur = record;
                for step in path {
                    cur = Self::fetch_field(&cur, &step);
                }
                cur
            }
            single => Self::fetch_field(&record, &single),
        };
        interp.stack_push(result);
        Ok(())
    }

    fn fetch_field(container: &Value, key: &Value) -> Value {
        match (container, key.as_string()) {
            (Value::Record(rec), Some(key)) => rec.get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// ( record value key -- record )
    fn word_rec_store(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let key = interp.stack_pop()?;
        let value = interp.stack_pop()?;
        let record = interp.stack_pop()?;

        let result = match (record, key.as_string()) {
            (Value::Record(mut rec), Some(key)) => {
                rec.insert(key.to_string(), value);
                Value::Record(rec)
            }
            (other, _) => other,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( record -- keys ) in insertion order
    fn word_keys(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let record = interp.stack_pop()?;

        let result = match record {
            Value::Record(rec) => {
                Value::Array(rec.keys().map(|k| Value::String(k.clone())).collect())
            }
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( record -- values ) in insertion order
    fn word_values(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let record = interp.stack_pop()?;

        let result = match record {
            Value::Record(rec) => Value::Array(rec.into_iter().map(|(_, v)| v).collect()),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }
}

impl Default for RecordModule {
    fn default() -> Self {
        Self::new()
    }
}
