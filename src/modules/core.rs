// Core module for Forthic
//
// Essential interpreter operations.
//
// ## Categories
// - Stack: POP, DUP, SWAP
// - Variables: VARIABLES, !, @, !@
// - Modules: EXPORT
// - Execution: INTERPRET
// - Control: IDENTITY, NOP, NULL, DEFAULT
// - Options: ~>
// - Debug: PEEK!, STACK!

use crate::errors::ForthicError;
use crate::interpreter::Interpreter;
use crate::module::{Module, ModuleRef};
use crate::values::Value;
use crate::word_options::WordOptions;
use crate::words::BuiltinWord;
use std::cell::RefCell;
use std::rc::Rc;

/// Core interpreter operations
pub struct CoreModule {
    module: Module,
}

impl CoreModule {
    pub fn new() -> Self {
        let mut module = Module::new("core".to_string());

        Self::register_stack_words(&mut module);
        Self::register_variable_words(&mut module);
        Self::register_module_words(&mut module);
        Self::register_control_words(&mut module);
        Self::register_debug_words(&mut module);

        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self.module))
    }

    // ===== Stack =====

    fn register_stack_words(module: &mut Module) {
        module.add_exportable_word(Rc::new(BuiltinWord::new("POP", Self::word_pop)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("DUP", Self::word_dup)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("SWAP", Self::word_swap)));
    }

    fn word_pop(interp: &mut Interpreter) -> Result<(), ForthicError> {
        interp.stack_pop()?;
        Ok(())
    }

    fn word_dup(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;
        interp.stack_push(value.clone());
        interp.stack_push(value);
        Ok(())
    }

    fn word_swap(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let b = interp.stack_pop()?;
        let a = interp.stack_pop()?;
        interp.stack_push(b);
        interp.stack_push(a);
        Ok(())
    }

    // ===== Variables =====

    fn register_variable_words(module: &mut Module) {
        module.add_exportable_word(Rc::new(BuiltinWord::new("VARIABLES", Self::word_variables)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("!", Self::word_store)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("@", Self::word_fetch)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("!@", Self::word_store_fetch)));
    }

    /// ( names -- ) declare variables in the current module
    fn word_variables(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let names = interp.stack_pop()?;
        let cur_module = interp.cur_module();

        if let Value::Array(names) = names {
            for name in names {
                if let Some(name) = name.as_string() {
                    cur_module.borrow_mut().add_variable(name)?;
                }
            }
        }
        Ok(())
    }

    /// ( value variable -- ) store
    fn word_store(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let target = interp.stack_pop()?;
        let value = interp.stack_pop()?;

        if let Value::Variable(var) = target {
            var.borrow_mut().set_value(value);
        }
        Ok(())
    }

    /// ( variable -- value ) fetch
    fn word_fetch(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let target = interp.stack_pop()?;

        let value = match target {
            Value::Variable(var) => var.borrow().value(),
            _ => Value::Null,
        };
        interp.stack_push(value);
        Ok(())
    }

    /// ( value variable -- value ) store, then push the stored value
    fn word_store_fetch(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let target = interp.stack_pop()?;
        let value = interp.stack_pop()?;

        if let Value::Variable(var) = target {
            var.borrow_mut().set_value(value.clone());
        }
        interp.stack_push(value);
        Ok(())
    }

    // ===== Modules =====

    fn register_module_words(module: &mut Module) {
        module.add_exportable_word(Rc::new(BuiltinWord::new("EXPORT", Self::word_export)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("INTERPRET", Self::word_interpret)));
    }

    /// ( names -- ) mark word names exportable from the current module
    fn word_export(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let names = interp.stack_pop()?;
        let cur_module = interp.cur_module();

        if let Value::Array(names) = names {
            let names: Vec<String> = names
                .iter()
                .filter_map(|n| n.as_string().map(str::to_string))
                .collect();
            cur_module.borrow_mut().add_exportable(names);
        }
        Ok(())
    }

    /// ( forthic -- ? ) run a string as Forthic code
    fn word_interpret(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let code = interp.stack_pop()?;
        let reference = interp.get_string_location().cloned();

        if let Some(code) = code.as_string() {
            let code = code.to_string();
            interp.run_with_location(&code, reference)?;
        }
        Ok(())
    }

    // ===== Control =====

    fn register_control_words(module: &mut Module) {
        module.add_exportable_word(Rc::new(BuiltinWord::new("IDENTITY", Self::word_nop)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("NOP", Self::word_nop)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("NULL", Self::word_null)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("DEFAULT", Self::word_default)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("~>", Self::word_to_options)));
    }

    fn word_nop(_interp: &mut Interpreter) -> Result<(), ForthicError> {
        Ok(())
    }

    fn word_null(interp: &mut Interpreter) -> Result<(), ForthicError> {
        interp.stack_push(Value::Null);
        Ok(())
    }

    /// ( value default -- value|default ) replace null or empty string
    fn word_default(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let default_value = interp.stack_pop()?;
        let value = interp.stack_pop()?;

        match value {
            Value::Null => interp.stack_push(default_value),
            Value::String(ref s) if s.is_empty() => interp.stack_push(default_value),
            other => interp.stack_push(other),
        }
        Ok(())
    }

    /// ( array -- options ) build an options value from [.key value ...]
    fn word_to_options(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let flat = match value {
            Value::Array(items) => items,
            other => {
                return Err(ForthicError::InvalidOptions {
                    reason: format!("~> expects an array, got {:?}", other),
                    location: None,
                })
            }
        };

        let options = WordOptions::from_flat_array(&flat)?;
        interp.stack_push(Value::Options(options));
        Ok(())
    }

    // ===== Debug =====

    fn register_debug_words(module: &mut Module) {
        module.add_exportable_word(Rc::new(BuiltinWord::new("PEEK!", Self::word_peek_bang)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("STACK!", Self::word_stack_bang)));
    }

    /// Halt on purpose, reporting the top of stack
    fn word_peek_bang(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let top = match interp.stack_peek() {
            Some(value) => value.to_string(),
            None => "<empty>".to_string(),
        };
        Err(ForthicError::IntentionalStop {
            message: format!("PEEK! {}", top),
        })
    }

    /// Halt on purpose, reporting the whole stack
    fn word_stack_bang(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let rendered: Vec<String> = interp
            .get_stack()
            .items()
            .iter()
            .map(|v| v.to_string())
            .collect();
        Err(ForthicError::IntentionalStop {
            message: format!("STACK! [{}]", rendered.join(", ")),
        })
    }
}

impl Default for CoreModule {
    fn default() -> Self {
        Self::new()
    }
}
