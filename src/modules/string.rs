// String module for Forthic
//
// Text processing operations.
//
// ## Categories
// - Combine: CONCAT, JOIN
// - Split: SPLIT
// - Case: LOWERCASE, UPPERCASE
// - Edit: STRIP, REPLACE
// - Convert: >STR, URL-ENCODE, URL-DECODE

use crate::errors::ForthicError;
use crate::interpreter::Interpreter;
use crate::module::{Module, ModuleRef};
use crate::values::Value;
use crate::words::BuiltinWord;
use std::cell::RefCell;
use std::rc::Rc;

/// Text word set
pub struct StringModule {
    module: Module,
}

impl StringModule {
    pub fn new() -> Self {
        let mut module = Module::new("string".to_string());

        module.add_exportable_word(Rc::new(BuiltinWord::new("CONCAT", Self::word_concat)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("SPLIT", Self::word_split)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("JOIN", Self::word_join)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("LOWERCASE", Self::word_lowercase)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("UPPERCASE", Self::word_uppercase)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("STRIP", Self::word_strip)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("REPLACE", Self::word_replace)));
        module.add_exportable_word(Rc::new(BuiltinWord::new(">STR", Self::word_to_str)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("URL-ENCODE", Self::word_url_encode)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("URL-DECODE", Self::word_url_decode)));

        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self.module))
    }

    /// ( a b -- ab ) or ( array -- joined )
    fn word_concat(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let top = interp.stack_pop()?;

        if let Value::Array(items) = top {
            let joined: String = items
                .iter()
                .filter_map(|v| v.as_string())
                .collect::<Vec<&str>>()
                .join("");
            interp.stack_push(Value::String(joined));
            return Ok(());
        }

        let a = interp.stack_pop()?;
        match (a.as_string(), top.as_string()) {
            (Some(a), Some(b)) => interp.stack_push(Value::String(format!("{}{}", a, b))),
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( string sep -- parts )
    fn word_split(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let sep = interp.stack_pop()?;
        let string = interp.stack_pop()?;

        let result = match (string.as_string(), sep.as_string()) {
            (Some(s), Some(sep)) if !sep.is_empty() => Value::Array(
                s.split(sep)
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( array sep -- string )
    fn word_join(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let sep = interp.stack_pop()?;
        let items = interp.stack_pop()?;

        let result = match (items, sep.as_string()) {
            (Value::Array(items), Some(sep)) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                Value::String(parts.join(sep))
            }
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    fn word_lowercase(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;
        let result = match value.as_string() {
            Some(s) => Value::String(s.to_lowercase()),
            None => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    fn word_uppercase(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;
        let result = match value.as_string() {
            Some(s) => Value::String(s.to_uppercase()),
            None => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    fn word_strip(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;
        let result = match value.as_string() {
            Some(s) => Value::String(s.trim().to_string()),
            None => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( string old new -- string )
    fn word_replace(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let new = interp.stack_pop()?;
        let old = interp.stack_pop()?;
        let string = interp.stack_pop()?;

        let result = match (string.as_string(), old.as_string(), new.as_string()) {
            (Some(s), Some(old), Some(new)) if !old.is_empty() => {
                Value::String(s.replace(old, new))
            }
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( value -- string )
    fn word_to_str(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;
        interp.stack_push(Value::String(value.to_string()));
        Ok(())
    }

    fn word_url_encode(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;
        let result = match value.as_string() {
            Some(s) => Value::String(urlencoding::encode(s).to_string()),
            None => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    fn word_url_decode(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;
        let result = match value.as_string() {
            Some(s) => Value::String(
                urlencoding::decode(s)
                    .map(|decoded| decoded.to_string())
                    .unwrap_or_default(),
            ),
            None => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }
}

impl Default for StringModule {
    fn default() -> Self {
        Self::new()
    }
}
