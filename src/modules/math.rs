// Math module for Forthic
//
// Arithmetic operations. `+` and `*` also fold an array of numbers when
// given one instead of a pair.

use crate::errors::ForthicError;
use crate::interpreter::Interpreter;
use crate::module::{Module, ModuleRef};
use crate::values::Value;
use crate::words::BuiltinWord;
use std::cell::RefCell;
use std::rc::Rc;

/// Arithmetic word set
pub struct MathModule {
    module: Module,
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_value(value: &Value) -> Option<Number> {
        match value {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn as_float(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

impl MathModule {
    pub fn new() -> Self {
        let mut module = Module::new("math".to_string());

        module.add_exportable_word(Rc::new(BuiltinWord::new("+", Self::word_plus)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("-", Self::word_minus)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("*", Self::word_times)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("/", Self::word_divide)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("MOD", Self::word_mod)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("ROUND", Self::word_round)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("MAX", Self::word_max)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("MIN", Self::word_min)));

        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self.module))
    }

    fn binary_numeric(
        a: Number,
        b: Number,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Value {
        match (a, b) {
            (Number::Int(x), Number::Int(y)) => Value::Int(int_op(x, y)),
            _ => Value::Float(float_op(a.as_float(), b.as_float())),
        }
    }

    /// ( a b -- a+b ) or ( array -- sum )
    fn word_plus(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let top = interp.stack_pop()?;

        if let Value::Array(items) = top {
            let mut acc = Number::Int(0);
            for item in &items {
                if let Some(n) = Number::from_value(item) {
                    acc = match Self::binary_numeric(acc, n, |x, y| x + y, |x, y| x + y) {
                        Value::Int(i) => Number::Int(i),
                        Value::Float(f) => Number::Float(f),
                        _ => unreachable!(),
                    };
                }
            }
            interp.stack_push(acc.to_value());
            return Ok(());
        }

        let a = interp.stack_pop()?;
        match (Number::from_value(&a), Number::from_value(&top)) {
            (Some(a), Some(b)) => {
                interp.stack_push(Self::binary_numeric(a, b, |x, y| x + y, |x, y| x + y))
            }
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( a b -- a-b )
    fn word_minus(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;

        match (Number::from_value(&a), Number::from_value(&b)) {
            (Some(a), Some(b)) => {
                interp.stack_push(Self::binary_numeric(a, b, |x, y| x - y, |x, y| x - y))
            }
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( a b -- a*b ) or ( array -- product )
    fn word_times(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let top = interp.stack_pop()?;

        if let Value::Array(items) = top {
            let mut acc = Number::Int(1);
            for item in &items {
                if let Some(n) = Number::from_value(item) {
                    acc = match Self::binary_numeric(acc, n, |x, y| x * y, |x, y| x * y) {
                        Value::Int(i) => Number::Int(i),
                        Value::Float(f) => Number::Float(f),
                        _ => unreachable!(),
                    };
                }
            }
            interp.stack_push(acc.to_value());
            return Ok(());
        }

        let a = interp.stack_pop()?;
        match (Number::from_value(&a), Number::from_value(&top)) {
            (Some(a), Some(b)) => {
                interp.stack_push(Self::binary_numeric(a, b, |x, y| x * y, |x, y| x * y))
            }
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( a b -- a/b ) always a float
    fn word_divide(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;

        match (Number::from_value(&a), Number::from_value(&b)) {
            (Some(a), Some(b)) => interp.stack_push(Value::Float(a.as_float() / b.as_float())),
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( a b -- a%b ) sign follows the dividend
    fn word_mod(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;

        match (a.as_int(), b.as_int()) {
            (Some(a), Some(b)) if b != 0 => interp.stack_push(Value::Int(a % b)),
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( num -- int )
    fn word_round(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        match value {
            Value::Int(i) => interp.stack_push(Value::Int(i)),
            Value::Float(f) => interp.stack_push(Value::Int(f.round() as i64)),
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( a b -- max )
    fn word_max(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;

        match (Number::from_value(&a), Number::from_value(&b)) {
            (Some(x), Some(y)) => {
                if x.as_float() >= y.as_float() {
                    interp.stack_push(a)
                } else {
                    interp.stack_push(b)
                }
            }
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }

    /// ( a b -- min )
    fn word_min(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;

        match (Number::from_value(&a), Number::from_value(&b)) {
            (Some(x), Some(y)) => {
                if x.as_float() <= y.as_float() {
                    interp.stack_push(a)
                } else {
                    interp.stack_push(b)
                }
            }
            _ => interp.stack_push(Value::Null),
        }
        Ok(())
    }
}

impl Default for MathModule {
    fn default() -> Self {
        Self::new()
    }
}
