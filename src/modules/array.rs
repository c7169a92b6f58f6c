// Array module for Forthic
//
// Collection access and transformation.
//
// ## Categories
// - Access: LENGTH, NTH, LAST, SLICE, TAKE, DROP
// - Transform: REVERSE, FLATTEN, UNIQUE, MAP, FOREACH
// - Combine: APPEND, ZIP
// - Generate: RANGE
//
// MAP and FOREACH evaluate a Forthic string per item through nested
// interpretation. MAP accepts a `.with_key` option built by `~>`.

use crate::errors::ForthicError;
use crate::interpreter::Interpreter;
use crate::module::{Module, ModuleRef};
use crate::values::Value;
use crate::word_options::WordOptions;
use crate::words::BuiltinWord;
use std::cell::RefCell;
use std::rc::Rc;

/// Collection word set
pub struct ArrayModule {
    module: Module,
}

impl ArrayModule {
    pub fn new() -> Self {
        let mut module = Module::new("array".to_string());

        Self::register_access_words(&mut module);
        Self::register_transform_words(&mut module);
        Self::register_combine_words(&mut module);

        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self.module))
    }

    fn register_access_words(module: &mut Module) {
        module.add_exportable_word(Rc::new(BuiltinWord::new("LENGTH", Self::word_length)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("NTH", Self::word_nth)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("LAST", Self::word_last)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("SLICE", Self::word_slice)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("TAKE", Self::word_take)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("DROP", Self::word_drop)));
    }

    fn register_transform_words(module: &mut Module) {
        module.add_exportable_word(Rc::new(BuiltinWord::new("REVERSE", Self::word_reverse)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("FLATTEN", Self::word_flatten)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("UNIQUE", Self::word_unique)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("MAP", Self::word_map)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("FOREACH", Self::word_foreach)));
    }

    fn register_combine_words(module: &mut Module) {
        module.add_exportable_word(Rc::new(BuiltinWord::new("APPEND", Self::word_append)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("ZIP", Self::word_zip)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("RANGE", Self::word_range)));
    }

    /// Pop options if the stack top is an Options value
    fn pop_options(interp: &mut Interpreter) -> Result<WordOptions, ForthicError> {
        if matches!(interp.stack_peek(), Some(Value::Options(_))) {
            if let Value::Options(options) = interp.stack_pop()? {
                return Ok(options);
            }
        }
        Ok(WordOptions::new())
    }

    // ===== Access =====

    fn word_length(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let container = interp.stack_pop()?;

        let length = match container {
            Value::Array(ref items) => items.len() as i64,
            Value::Record(ref rec) => rec.len() as i64,
            Value::String(ref s) => s.chars().count() as i64,
            Value::Null => 0,
            _ => 0,
        };
        interp.stack_push(Value::Int(length));
        Ok(())
    }

    /// ( array n -- item )
    fn word_nth(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let n = interp.stack_pop()?;
        let container = interp.stack_pop()?;

        let result = match (container, n.as_int()) {
            (Value::Array(items), Some(n)) if n >= 0 && (n as usize) < items.len() => {
                items[n as usize].clone()
            }
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    fn word_last(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let container = interp.stack_pop()?;

        let result = match container {
            Value::Array(items) => items.last().cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( array start end -- subarray ) clamped, end exclusive
    fn word_slice(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let end = interp.stack_pop()?;
        let start = interp.stack_pop()?;
        let container = interp.stack_pop()?;

        let result = match (container, start.as_int(), end.as_int()) {
            (Value::Array(items), Some(start), Some(end)) => {
                let len = items.len() as i64;
                let start = start.clamp(0, len) as usize;
                let end = end.clamp(0, len) as usize;
                if start <= end {
                    Value::Array(items[start..end].to_vec())
                } else {
                    Value::Array(Vec::new())
                }
            }
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( array n -- first-n )
    fn word_take(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let n = interp.stack_pop()?;
        let container = interp.stack_pop()?;

        let result = match (container, n.as_int()) {
            (Value::Array(items), Some(n)) if n >= 0 => {
                Value::Array(items.into_iter().take(n as usize).collect())
            }
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( array n -- all-but-first-n )
    fn word_drop(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let n = interp.stack_pop()?;
        let container = interp.stack_pop()?;

        let result = match (container, n.as_int()) {
            (Value::Array(items), Some(n)) if n >= 0 => {
                Value::Array(items.into_iter().skip(n as usize).collect())
            }
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    // ===== Transform =====

    fn word_reverse(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let container = interp.stack_pop()?;

        let result = match container {
            Value::Array(mut items) => {
                items.reverse();
                Value::Array(items)
            }
            Value::String(s) => Value::String(s.chars().rev().collect()),
            other => other,
        };
        interp.stack_push(result);
        Ok(())
    }

    fn flatten_into(items: Vec<Value>, out: &mut Vec<Value>) {
        for item in items {
            match item {
                Value::Array(nested) => Self::flatten_into(nested, out),
                other => out.push(other),
            }
        }
    }

    fn word_flatten(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let container = interp.stack_pop()?;

        let result = match container {
            Value::Array(items) => {
                let mut out = Vec::new();
                Self::flatten_into(items, &mut out);
                Value::Array(out)
            }
            other => other,
        };
        interp.stack_push(result);
        Ok(())
    }

    fn word_unique(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let container = interp.stack_pop()?;

        let result = match container {
            Value::Array(items) => {
                let mut out: Vec<Value> = Vec::new();
                for item in items {
                    if !out.contains(&item) {
                        out.push(item);
                    }
                }
                Value::Array(out)
            }
            other => other,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( array forthic -- array ) apply a Forthic string to each item.
    /// With `[.with_key TRUE] ~>`, the item's index (or record key) is
    /// pushed before the item.
    fn word_map(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let options = Self::pop_options(interp)?;
        let with_key = options.get_bool("with_key").unwrap_or(false);

        let code = interp.stack_pop()?;
        let container = interp.stack_pop()?;

        let code = match code.as_string() {
            Some(code) => code.to_string(),
            None => {
                interp.stack_push(Value::Null);
                return Ok(());
            }
        };

        match container {
            Value::Array(items) => {
                let mut results = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    if with_key {
                        interp.stack_push(Value::Int(index as i64));
                    }
                    interp.stack_push(item);
                    interp.run(&code)?;
                    results.push(interp.stack_pop()?);
                }
                interp.stack_push(Value::Array(results));
            }
            Value::Record(rec) => {
                let mut results = indexmap::IndexMap::new();
                for (key, value) in rec {
                    if with_key {
                        interp.stack_push(Value::String(key.clone()));
                    }
                    interp.stack_push(value);
                    interp.run(&code)?;
                    results.insert(key, interp.stack_pop()?);
                }
                interp.stack_push(Value::Record(results));
            }
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( array forthic -- ? ) run a Forthic string for each item
    fn word_foreach(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let code = interp.stack_pop()?;
        let container = interp.stack_pop()?;

        let code = match code.as_string() {
            Some(code) => code.to_string(),
            None => return Ok(()),
        };

        if let Value::Array(items) = container {
            for item in items {
                interp.stack_push(item);
                interp.run(&code)?;
            }
        }
        Ok(())
    }

    // ===== Combine =====

    /// ( array item -- array )
    fn word_append(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let item = interp.stack_pop()?;
        let container = interp.stack_pop()?;

        let result = match container {
            Value::Array(mut items) => {
                items.push(item);
                Value::Array(items)
            }
            Value::Null => Value::Array(vec![item]),
            other => other,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( a b -- pairs )
    fn word_zip(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;

        let result = match (a, b) {
            (Value::Array(a), Value::Array(b)) => Value::Array(
                a.into_iter()
                    .zip(b)
                    .map(|(x, y)| Value::Array(vec![x, y]))
                    .collect(),
            ),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( start end -- array ) end exclusive
    fn word_range(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let end = interp.stack_pop()?;
        let start = interp.stack_pop()?;

        let result = match (start.as_int(), end.as_int()) {
            (Some(start), Some(end)) if start <= end => {
                Value::Array((start..end).map(Value::Int).collect())
            }
            (Some(_), Some(_)) => Value::Array(Vec::new()),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }
}

impl Default for ArrayModule {
    fn default() -> Self {
        Self::new()
    }
}
