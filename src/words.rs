//! Word types for the Forthic interpreter
//!
//! A word is the unit of execution: invoking its name in source runs its
//! `execute` against the interpreter. Words are plain data records behind a
//! trait object; builtins receive the interpreter by parameter rather than
//! holding a back-pointer.
//!
//! Word types:
//! - [`PushValueWord`]: pushes a fixed value
//! - [`BuiltinWord`]: invokes a host function
//! - [`DefinitionWord`]: sequence compiled from `: NAME ... ;`
//! - [`MemoWord`] / [`MemoBangWord`] / [`MemoBangAtWord`]: the `@:` triplet
//!   sharing one cache cell
//! - [`ImportedWord`]: a prefixed alias dispatching to another word
//! - [`StartModuleWord`] / [`EndModuleWord`]: immediate module brackets
//! - [`EndArrayWord`]: collects stack values down to the `[` sentinel

use crate::errors::{CodeLocation, ForthicError};
use crate::interpreter::Interpreter;
use crate::module::Module;
use crate::tokenizer::TokenType;
use crate::values::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Host function signature for builtin words
pub type BuiltinHandler = fn(&mut Interpreter) -> Result<(), ForthicError>;

/// Base abstraction for all executable words
pub trait Word {
    fn name(&self) -> &str;

    /// Where the word was defined, if it came from source
    fn location(&self) -> Option<&CodeLocation> {
        None
    }

    /// Immediate words execute even while a definition is being compiled
    fn is_immediate(&self) -> bool {
        false
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError>;
}

/// Pushes a fixed value onto the stack
pub struct PushValueWord {
    name: String,
    value: Value,
}

impl PushValueWord {
    pub fn new(name: String, value: Value) -> Self {
        Self { name, value }
    }
}

impl Word for PushValueWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        interp.stack_push(self.value.clone());
        Ok(())
    }
}

/// Invokes a host function with the interpreter
pub struct BuiltinWord {
    name: String,
    handler: BuiltinHandler,
}

impl BuiltinWord {
    pub fn new(name: &str, handler: BuiltinHandler) -> Self {
        Self {
            name: name.to_string(),
            handler,
        }
    }
}

impl Word for BuiltinWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        (self.handler)(interp)
    }
}

/// A word plus the location it was compiled at inside a definition
#[derive(Clone)]
pub struct CompiledWord {
    pub word: Rc<dyn Word>,
    pub location: Option<CodeLocation>,
}

/// User-defined word compiled from `: NAME ... ;`
pub struct DefinitionWord {
    name: String,
    words: Vec<CompiledWord>,
    location: Option<CodeLocation>,
}

impl DefinitionWord {
    pub fn new(name: String, location: Option<CodeLocation>) -> Self {
        Self {
            name,
            words: Vec::new(),
            location,
        }
    }

    pub fn add_word(&mut self, word: Rc<dyn Word>, location: Option<CodeLocation>) {
        self.words.push(CompiledWord { word, location });
    }

    pub fn words(&self) -> &[CompiledWord] {
        &self.words
    }
}

impl Word for DefinitionWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&CodeLocation> {
        self.location.as_ref()
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        for entry in &self.words {
            entry.word.execute(interp).map_err(|inner| {
                // The call site is filled in by the dispatcher, which knows
                // the token being executed
                ForthicError::WordExecution {
                    message: format!("Error executing word {}", self.name),
                    inner_error: Box::new(inner),
                    call_location: None,
                    definition_location: entry.location.clone().or_else(|| self.location.clone()),
                }
            })?;
        }
        Ok(())
    }
}

/// Memoized word: first call executes the inner word and caches its top of
/// stack; later calls push the cached value. The cache cell is shared with
/// the `!` and `!@` variants.
pub struct MemoWord {
    name: String,
    inner: Rc<dyn Word>,
    cache: RefCell<Option<Value>>,
}

impl MemoWord {
    pub fn new(inner: Rc<dyn Word>) -> Self {
        Self {
            name: inner.name().to_string(),
            inner,
            cache: RefCell::new(None),
        }
    }

    pub fn refresh(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        self.inner.execute(interp)?;
        let value = interp.stack_pop()?;
        *self.cache.borrow_mut() = Some(value);
        Ok(())
    }

    pub fn cached_value(&self) -> Option<Value> {
        self.cache.borrow().clone()
    }
}

impl Word for MemoWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        if self.cache.borrow().is_none() {
            self.refresh(interp)?;
        }
        if let Some(value) = self.cached_value() {
            interp.stack_push(value);
        }
        Ok(())
    }
}

/// `NAME!` - refresh the memo cache, push nothing
pub struct MemoBangWord {
    name: String,
    memo: Rc<MemoWord>,
}

impl MemoBangWord {
    pub fn new(memo: Rc<MemoWord>) -> Self {
        Self {
            name: format!("{}!", memo.name()),
            memo,
        }
    }
}

impl Word for MemoBangWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        self.memo.refresh(interp)
    }
}

/// `NAME!@` - refresh the memo cache and push the new value
pub struct MemoBangAtWord {
    name: String,
    memo: Rc<MemoWord>,
}

impl MemoBangAtWord {
    pub fn new(memo: Rc<MemoWord>) -> Self {
        Self {
            name: format!("{}!@", memo.name()),
            memo,
        }
    }
}

impl Word for MemoBangAtWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        self.memo.refresh(interp)?;
        if let Some(value) = self.memo.cached_value() {
            interp.stack_push(value);
        }
        Ok(())
    }
}

/// Alias created by prefixed imports: `prefix.NAME` dispatching to the
/// imported module's word
pub struct ImportedWord {
    name: String,
    target: Rc<dyn Word>,
}

impl ImportedWord {
    pub fn new(name: String, target: Rc<dyn Word>) -> Self {
        Self { name, target }
    }
}

impl Word for ImportedWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        self.target.execute(interp)
    }
}

/// `{name` - push a module onto the module stack, creating it on first use.
/// An empty name switches back to the app module.
pub struct StartModuleWord {
    name: String,
}

impl StartModuleWord {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

impl Word for StartModuleWord {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_immediate(&self) -> bool {
        true
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        if self.name.is_empty() {
            let app_module = interp.get_app_module();
            interp.module_stack_push(app_module);
            return Ok(());
        }

        let cur_module = interp.cur_module();
        let existing = cur_module.borrow().find_module(&self.name);
        let module = match existing {
            Some(module) => module,
            None => {
                let module = Module::new_ref(self.name.clone());
                cur_module
                    .borrow_mut()
                    .add_child(self.name.clone(), module.clone());
                if Rc::ptr_eq(&cur_module, &interp.get_app_module()) {
                    interp.add_registered_module(module.clone());
                }
                module
            }
        };
        interp.module_stack_push(module);
        Ok(())
    }
}

/// `}` - pop the module stack
pub struct EndModuleWord;

impl Word for EndModuleWord {
    fn name(&self) -> &str {
        "}"
    }

    fn is_immediate(&self) -> bool {
        true
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        interp.module_stack_pop();
        Ok(())
    }
}

/// `]` - pop values down to the `[` sentinel and push them as an array.
/// Not immediate: array construction inside a definition happens when the
/// definition runs, not while it compiles.
pub struct EndArrayWord;

impl Word for EndArrayWord {
    fn name(&self) -> &str {
        "]"
    }

    fn execute(&self, interp: &mut Interpreter) -> Result<(), ForthicError> {
        let mut items = Vec::new();
        loop {
            let value = interp.stack_pop()?;
            if let Value::Token(ref token) = value {
                if token.token_type == TokenType::StartArray {
                    break;
                }
            }
            items.push(value);
        }
        items.reverse();
        interp.stack_push(Value::Array(items));
        Ok(())
    }
}
