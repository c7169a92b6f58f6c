// Boolean module for Forthic
//
// Comparison, logic, and membership operations. Comparisons coerce ints and
// floats; everything else compares by value equality.

use crate::errors::ForthicError;
use crate::interpreter::Interpreter;
use crate::module::{Module, ModuleRef};
use crate::values::Value;
use crate::words::BuiltinWord;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Comparison and logic word set
pub struct BooleanModule {
    module: Module,
}

impl BooleanModule {
    pub fn new() -> Self {
        let mut module = Module::new("boolean".to_string());

        module.add_exportable_word(Rc::new(BuiltinWord::new("==", Self::word_equal)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("!=", Self::word_not_equal)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("<", Self::word_less)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("<=", Self::word_less_equal)));
        module.add_exportable_word(Rc::new(BuiltinWord::new(">", Self::word_greater)));
        module.add_exportable_word(Rc::new(BuiltinWord::new(">=", Self::word_greater_equal)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("AND", Self::word_and)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("OR", Self::word_or)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("NOT", Self::word_not)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("IN", Self::word_in)));

        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self.module))
    }

    /// Loose truthiness: NULL, FALSE, 0, empty strings/arrays are false
    pub fn truthy(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::PositionedString(ps) => !ps.text.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Record(rec) => !rec.is_empty(),
            _ => true,
        }
    }

    fn values_equal(a: &Value, b: &Value) -> bool {
        if let (Some(x), Some(y)) = (a.as_float(), b.as_float()) {
            return x == y;
        }
        a == b
    }

    fn compare(a: &Value, b: &Value) -> Option<Ordering> {
        if let (Some(x), Some(y)) = (a.as_float(), b.as_float()) {
            return x.partial_cmp(&y);
        }
        match (a, b) {
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
            (Value::Time(x), Value::Time(y)) => Some(x.cmp(y)),
            (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }

    fn comparison(
        interp: &mut Interpreter,
        test: fn(Ordering) -> bool,
    ) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;

        let result = Self::compare(&a, &b).map(test).unwrap_or(false);
        interp.stack_push(Value::Bool(result));
        Ok(())
    }

    fn word_equal(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;
        interp.stack_push(Value::Bool(Self::values_equal(&a, &b)));
        Ok(())
    }

    fn word_not_equal(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;
        interp.stack_push(Value::Bool(!Self::values_equal(&a, &b)));
        Ok(())
    }

    fn word_less(interp: &mut Interpreter) -> Result<(), ForthicError> {
        Self::comparison(interp, |ord| ord == Ordering::Less)
    }

    fn word_less_equal(interp: &mut Interpreter) -> Result<(), ForthicError> {
        Self::comparison(interp, |ord| ord != Ordering::Greater)
    }

    fn word_greater(interp: &mut Interpreter) -> Result<(), ForthicError> {
        Self::comparison(interp, |ord| ord == Ordering::Greater)
    }

    fn word_greater_equal(interp: &mut Interpreter) -> Result<(), ForthicError> {
        Self::comparison(interp, |ord| ord != Ordering::Less)
    }

    /// ( a b -- bool ) or ( array -- bool )
    fn word_and(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let top = interp.stack_pop()?;

        if let Value::Array(items) = top {
            interp.stack_push(Value::Bool(items.iter().all(Self::truthy)));
            return Ok(());
        }

        let a = interp.stack_pop()?;
        interp.stack_push(Value::Bool(Self::truthy(&a) && Self::truthy(&top)));
        Ok(())
    }

    /// ( a b -- bool ) or ( array -- bool )
    fn word_or(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let top = interp.stack_pop()?;

        if let Value::Array(items) = top {
            interp.stack_push(Value::Bool(items.iter().any(Self::truthy)));
            return Ok(());
        }

        let a = interp.stack_pop()?;
        interp.stack_push(Value::Bool(Self::truthy(&a) || Self::truthy(&top)));
        Ok(())
    }

    fn word_not(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;
        interp.stack_push(Value::Bool(!Self::truthy(&value)));
        Ok(())
    }

    /// ( item array -- bool )
    fn word_in(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let container = interp.stack_pop()?;
        let item = interp.stack_pop()?;

        let result = match container {
            Value::Array(items) => items.iter().any(|v| Self::values_equal(v, &item)),
            Value::Record(rec) => rec.values().any(|v| Self::values_equal(v, &item)),
            Value::String(s) => item
                .as_string()
                .map(|needle| s.contains(needle))
                .unwrap_or(false),
            _ => false,
        };
        interp.stack_push(Value::Bool(result));
        Ok(())
    }
}

impl Default for BooleanModule {
    fn default() -> Self {
        Self::new()
    }
}
