//! Forthic interpreter - Core execution engine
//!
//! The interpreter owns the data stack, the module stack (app module at the
//! bottom), the tokenizer stack for nested interpretation, the literal
//! pipeline, and the compilation state for `: ... ;` definitions. Tokens are
//! pulled from the innermost tokenizer and dispatched one at a time.
//!
//! # Example
//!
//! ```
//! use forthic::interpreter::Interpreter;
//! use forthic::values::Value;
//!
//! let mut interp = Interpreter::new("UTC");
//! interp.run(": DBL 2 * ; 5 DBL").unwrap();
//! assert_eq!(interp.stack_pop().unwrap(), Value::Int(10));
//! ```

use crate::errors::{CodeLocation, ForthicError};
use crate::literals::{self, LiteralHandler};
use crate::module::{Module, ModuleRef};
use crate::stack::Stack;
use crate::tokenizer::{Token, TokenType, Tokenizer};
use crate::values::{PositionedString, Value};
use crate::words::{
    DefinitionWord, EndArrayWord, EndModuleWord, PushValueWord, StartModuleWord, Word,
};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// How a module should be brought into the app module by [`Interpreter::use_modules`]
#[derive(Debug, Clone)]
pub enum ModuleImport {
    /// Words become invocable by their bare names
    Unprefixed(String),
    /// Words become invocable as `prefix.NAME`
    Prefixed { name: String, prefix: String },
}

impl ModuleImport {
    pub fn unprefixed(name: &str) -> Self {
        Self::Unprefixed(name.to_string())
    }

    pub fn prefixed(name: &str, prefix: &str) -> Self {
        Self::Prefixed {
            name: name.to_string(),
            prefix: prefix.to_string(),
        }
    }
}

/// Chunk yielded by [`Interpreter::streaming_run`]
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Text of a token that was executed
    Token(String),
    /// New input consumed since the previous call
    StringDelta(String),
}

/// Recovery callback installed via [`Interpreter::set_error_handler`].
/// May mutate interpreter state (e.g. drop the top of stack) before
/// execution resumes from the current tokenizer position.
pub type ErrorHandler = Rc<dyn Fn(&mut Interpreter, &ForthicError) -> Result<(), ForthicError>>;

#[derive(Default)]
struct Profiler {
    running: bool,
    start: Option<Instant>,
    counts: HashMap<String, u64>,
    timestamps: Vec<(String, Duration)>,
}

impl Profiler {
    fn count_word(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }
}

/// Main Forthic execution engine
pub struct Interpreter {
    timezone: String,
    stack: Stack,
    app_module: ModuleRef,
    module_stack: Vec<ModuleRef>,
    registered_modules: Rc<std::cell::RefCell<HashMap<String, ModuleRef>>>,
    tokenizer_stack: Vec<Tokenizer>,
    previous_token: Option<Token>,

    is_compiling: bool,
    is_memo_definition: bool,
    cur_definition: Option<DefinitionWord>,

    /// Location of the most recently popped string literal
    string_location: Option<CodeLocation>,

    max_attempts: usize,
    error_handler: Option<ErrorHandler>,
    literal_handlers: Vec<LiteralHandler>,
    profiler: Profiler,
    validation_mode: bool,

    stream_enabled: bool,
    streaming_cursor: usize,
    previous_delta_len: usize,
}

impl Interpreter {
    /// Create an interpreter with the standard modules imported unprefixed
    /// and the standard literal handlers installed.
    pub fn new(timezone: &str) -> Self {
        let mut interp = Self::bare(timezone);
        interp.install_standard_literals();
        for module in crate::modules::standard_modules() {
            interp.import_module(&module, "");
        }
        interp
    }

    /// Like [`new`](Self::new), additionally importing `initial_modules`
    /// unprefixed.
    pub fn with_modules(initial_modules: Vec<ModuleRef>, timezone: &str) -> Self {
        let mut interp = Self::new(timezone);
        for module in initial_modules {
            interp.import_module(&module, "");
        }
        interp
    }

    fn bare(timezone: &str) -> Self {
        let app_module = Module::new_ref(String::new());
        Self {
            timezone: timezone.to_string(),
            stack: Stack::new(),
            app_module: app_module.clone(),
            module_stack: vec![app_module],
            registered_modules: Rc::new(std::cell::RefCell::new(HashMap::new())),
            tokenizer_stack: Vec::new(),
            previous_token: None,
            is_compiling: false,
            is_memo_definition: false,
            cur_definition: None,
            string_location: None,
            max_attempts: 3,
            error_handler: None,
            literal_handlers: Vec::new(),
            profiler: Profiler::default(),
            validation_mode: false,
            stream_enabled: false,
            streaming_cursor: 0,
            previous_delta_len: 0,
        }
    }

    fn install_standard_literals(&mut self) {
        // Later registrations are tried first, so priority runs from the
        // bottom of this list upward
        self.register_literal_handler(Rc::new(literals::to_bool));
        self.register_literal_handler(Rc::new(literals::to_int));
        self.register_literal_handler(Rc::new(literals::to_float));
        self.register_literal_handler(Rc::new(literals::to_time));
        self.register_literal_handler(Rc::new(literals::literal_date(self.timezone.clone())));
        self.register_literal_handler(Rc::new(literals::zoned_datetime(self.timezone.clone())));
    }

    pub fn get_timezone(&self) -> &str {
        &self.timezone
    }

    // ========================================
    // Stack access
    // ========================================

    pub fn stack_push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop the top of stack. Positioned strings are unwrapped to plain
    /// strings and their location is latched as the current string location.
    pub fn stack_pop(&mut self) -> Result<Value, ForthicError> {
        let value = self
            .stack
            .pop()
            .ok_or_else(|| ForthicError::StackUnderflow {
                location: self.current_location(),
            })?;

        if let Value::PositionedString(ps) = value {
            self.string_location = Some(ps.location.clone());
            return Ok(Value::String(ps.text));
        }
        Ok(value)
    }

    pub fn stack_peek(&self) -> Option<&Value> {
        self.stack.peek()
    }

    pub fn get_stack(&self) -> &Stack {
        &self.stack
    }

    pub fn get_stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    pub fn set_stack(&mut self, stack: Stack) {
        self.stack = stack;
    }

    /// Location of the most recently popped string literal
    pub fn get_string_location(&self) -> Option<&CodeLocation> {
        self.string_location.as_ref()
    }

    // ========================================
    // Module stack
    // ========================================

    pub fn cur_module(&self) -> ModuleRef {
        self.module_stack
            .last()
            .expect("Module stack should never be empty")
            .clone()
    }

    pub fn get_app_module(&self) -> ModuleRef {
        self.app_module.clone()
    }

    pub fn module_stack_push(&mut self, module: ModuleRef) {
        self.module_stack.push(module);
    }

    /// Pop the module stack; popping the app module is a no-op
    pub fn module_stack_pop(&mut self) {
        if self.module_stack.len() > 1 {
            self.module_stack.pop();
        }
    }

    // ========================================
    // Module registration and import
    // ========================================

    /// Make a module available for import by name
    pub fn register_module(&mut self, module: ModuleRef) {
        self.add_registered_module(module);
    }

    pub fn add_registered_module(&mut self, module: ModuleRef) {
        let name = module.borrow().name().to_string();
        self.registered_modules.borrow_mut().insert(name, module);
    }

    pub fn find_module(&self, name: &str) -> Result<ModuleRef, ForthicError> {
        self.registered_modules
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ForthicError::UnknownModule {
                module_name: name.to_string(),
                location: self.current_location(),
            })
    }

    /// Register a module and import its exported words into the app module
    pub fn import_module(&mut self, module: &ModuleRef, prefix: &str) {
        self.add_registered_module(module.clone());
        self.app_module.borrow_mut().import_module(prefix, module);
    }

    /// Import previously registered modules, optionally under prefixes
    pub fn use_modules(&mut self, imports: &[ModuleImport]) -> Result<(), ForthicError> {
        for import in imports {
            let (name, prefix) = match import {
                ModuleImport::Unprefixed(name) => (name.as_str(), ""),
                ModuleImport::Prefixed { name, prefix } => (name.as_str(), prefix.as_str()),
            };
            let module = self.find_module(name)?;
            self.app_module.borrow_mut().import_module(prefix, &module);
        }
        Ok(())
    }

    /// Import previously registered modules unprefixed
    pub fn use_modules_unprefixed(&mut self, names: &[&str]) -> Result<(), ForthicError> {
        for name in names {
            let module = self.find_module(name)?;
            self.app_module.borrow_mut().import_module("", &module);
        }
        Ok(())
    }

    /// Run a module's source code inside that module's scope. Errors are
    /// wrapped so the failing module is named.
    pub fn run_module_code(&mut self, module: &ModuleRef) -> Result<(), ForthicError> {
        self.module_stack_push(module.clone());
        let code = module.borrow().source_code().to_string();
        let result = self.run(&code);
        self.module_stack_pop();

        result.map_err(|inner| ForthicError::Module {
            module_name: module.borrow().name().to_string(),
            inner_error: Box::new(inner),
            location: None,
        })
    }

    // ========================================
    // Word lookup and the literal pipeline
    // ========================================

    /// Find a word in the module stack, top to bottom
    pub fn find_word(&self, name: &str) -> Option<Rc<dyn Word>> {
        for module in self.module_stack.iter().rev() {
            if let Some(word) = module.borrow().find_word(name) {
                return Some(word);
            }
        }
        None
    }

    /// Register a literal handler. Handlers registered later are tried
    /// first, so user handlers override the standard ones.
    pub fn register_literal_handler(&mut self, handler: LiteralHandler) {
        self.literal_handlers.push(handler);
    }

    /// Remove a previously registered handler, compared by Rc identity
    pub fn unregister_literal_handler(&mut self, handler: &LiteralHandler) {
        self.literal_handlers
            .retain(|h| !Rc::ptr_eq(h, handler));
    }

    /// Interpret a bareword through the literal pipeline
    pub fn find_literal_word(&self, name: &str) -> Option<Rc<dyn Word>> {
        for handler in self.literal_handlers.iter().rev() {
            if let Some(value) = handler(name) {
                return Some(Rc::new(PushValueWord::new(name.to_string(), value)));
            }
        }
        None
    }

    // ========================================
    // Configuration
    // ========================================

    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = Some(handler);
    }

    pub fn clear_error_handler(&mut self) {
        self.error_handler = None;
    }

    pub fn set_max_attempts(&mut self, max_attempts: usize) {
        self.max_attempts = max_attempts;
    }

    /// In validation mode word dispatches are skipped; definitions are still
    /// compiled and immediate words still execute.
    pub fn set_validation_mode(&mut self, on: bool) {
        self.validation_mode = on;
    }

    pub fn is_compiling(&self) -> bool {
        self.is_compiling
    }

    /// Clear the stack and the app module's variables. Word definitions and
    /// module registrations survive.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.app_module.borrow_mut().clear_variables();
        self.module_stack = vec![self.app_module.clone()];
        self.is_compiling = false;
        self.is_memo_definition = false;
        self.cur_definition = None;
        self.string_location = None;
    }

    // ========================================
    // Profiling
    // ========================================

    pub fn start_profiling(&mut self) {
        self.profiler = Profiler {
            running: true,
            start: Some(Instant::now()),
            counts: HashMap::new(),
            timestamps: Vec::new(),
        };
    }

    pub fn stop_profiling(&mut self) {
        self.profiler.running = false;
    }

    /// Word execution counts, most frequent first
    pub fn word_histogram(&self) -> Vec<(String, u64)> {
        let mut histogram: Vec<(String, u64)> = self
            .profiler
            .counts
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        histogram.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        histogram
    }

    /// Record a labeled timestamp relative to the profiling start
    pub fn add_timestamp(&mut self, label: &str) {
        if let Some(start) = self.profiler.start {
            self.profiler
                .timestamps
                .push((label.to_string(), start.elapsed()));
        }
    }

    pub fn profile_timestamps(&self) -> &[(String, Duration)] {
        &self.profiler.timestamps
    }

    // ========================================
    // Execution
    // ========================================

    /// Tokenize and execute `code`
    pub fn run(&mut self, code: &str) -> Result<(), ForthicError> {
        self.run_with_location(code, None)
    }

    /// Run `code` with emitted locations translated into the frame of
    /// `reference_location` (used by INTERPRET for nested code)
    pub fn run_with_location(
        &mut self,
        code: &str,
        reference_location: Option<CodeLocation>,
    ) -> Result<(), ForthicError> {
        let tokenizer = Tokenizer::new(code, reference_location, false);
        self.tokenizer_stack.push(tokenizer);

        // The recovery loop runs only at the outermost boundary; nested
        // interpretation propagates so causes chain correctly
        let result = if self.tokenizer_stack.len() == 1 {
            self.execute_with_recovery()
        } else {
            self.execute_current_tokenizer()
        };

        self.tokenizer_stack.pop();
        result
    }

    fn execute_with_recovery(&mut self) -> Result<(), ForthicError> {
        let mut num_attempts = 0;
        loop {
            match self.execute_current_tokenizer() {
                Ok(()) => return Ok(()),
                Err(error @ ForthicError::IntentionalStop { .. }) => return Err(error),
                Err(error) => {
                    let handler = match &self.error_handler {
                        Some(handler) => Rc::clone(handler),
                        None => return Err(error),
                    };
                    num_attempts += 1;
                    if num_attempts > self.max_attempts {
                        return Err(ForthicError::TooManyAttempts {
                            num_attempts,
                            max_attempts: self.max_attempts,
                            location: error.get_location().cloned(),
                        });
                    }
                    handler(self, &error)?;
                    // Resume from the current tokenizer position
                }
            }
        }
    }

    fn execute_current_tokenizer(&mut self) -> Result<(), ForthicError> {
        loop {
            let token = self
                .tokenizer_stack
                .last_mut()
                .expect("Tokenizer stack should not be empty")
                .next_token()?;

            let is_eos = token.token_type == TokenType::Eos;
            self.handle_token(token)?;
            if is_eos {
                return Ok(());
            }
        }
    }

    fn current_location(&self) -> Option<CodeLocation> {
        self.previous_token.as_ref().map(|t| t.location.clone())
    }

    // ========================================
    // Token dispatch
    // ========================================

    fn handle_token(&mut self, token: Token) -> Result<(), ForthicError> {
        self.previous_token = Some(token.clone());

        match token.token_type {
            TokenType::String => self.handle_string_token(token, "<string>"),
            TokenType::DotSymbol => self.handle_string_token(token, "<dot-symbol>"),
            TokenType::Comment => Ok(()),
            TokenType::StartArray => self.handle_start_array_token(token),
            TokenType::EndArray => {
                let location = token.location.clone();
                self.handle_word(Rc::new(EndArrayWord), Some(location))
            }
            TokenType::StartModule => {
                let location = token.location.clone();
                self.handle_word(Rc::new(StartModuleWord::new(token.text)), Some(location))
            }
            TokenType::EndModule => {
                let location = token.location.clone();
                self.handle_word(Rc::new(EndModuleWord), Some(location))
            }
            TokenType::StartDef => self.handle_start_definition_token(token, false),
            TokenType::StartMemo => self.handle_start_definition_token(token, true),
            TokenType::EndDef => self.handle_end_definition_token(token),
            TokenType::Word => self.handle_word_token(token),
            TokenType::Eos => self.handle_eos_token(token),
        }
    }

    fn handle_string_token(&mut self, token: Token, tag: &str) -> Result<(), ForthicError> {
        let location = token.location.clone();
        let value = Value::PositionedString(PositionedString::new(token.text, location.clone()));
        let word = PushValueWord::new(tag.to_string(), value);
        self.handle_word(Rc::new(word), Some(location))
    }

    /// `[` pushes its own token as the sentinel the matching `]` reduces to
    fn handle_start_array_token(&mut self, token: Token) -> Result<(), ForthicError> {
        let location = token.location.clone();
        let word = PushValueWord::new("<start-array>".to_string(), Value::Token(token));
        self.handle_word(Rc::new(word), Some(location))
    }

    fn handle_start_definition_token(
        &mut self,
        token: Token,
        is_memo: bool,
    ) -> Result<(), ForthicError> {
        if self.is_compiling {
            return Err(ForthicError::MissingSemicolon {
                location: Some(token.location),
            });
        }

        self.cur_definition = Some(DefinitionWord::new(token.text, Some(token.location)));
        self.is_compiling = true;
        self.is_memo_definition = is_memo;
        Ok(())
    }

    fn handle_end_definition_token(&mut self, token: Token) -> Result<(), ForthicError> {
        if !self.is_compiling || self.cur_definition.is_none() {
            return Err(ForthicError::ExtraSemicolon {
                location: Some(token.location),
            });
        }

        let definition = self.cur_definition.take().unwrap();
        let cur_module = self.cur_module();
        if self.is_memo_definition {
            cur_module.borrow_mut().add_memo_words(Rc::new(definition));
        } else {
            cur_module.borrow_mut().add_word(Rc::new(definition));
        }

        self.is_compiling = false;
        self.is_memo_definition = false;
        Ok(())
    }

    fn handle_word_token(&mut self, token: Token) -> Result<(), ForthicError> {
        let location = token.location.clone();

        if let Some(word) = self.find_word(&token.text) {
            return self.handle_word(word, Some(location));
        }
        if let Some(word) = self.find_literal_word(&token.text) {
            return self.handle_word(word, Some(location));
        }

        Err(ForthicError::UnknownWord {
            word: token.text,
            location: Some(location),
        })
    }

    fn handle_eos_token(&mut self, token: Token) -> Result<(), ForthicError> {
        if self.is_compiling {
            return Err(ForthicError::MissingSemicolon {
                location: Some(token.location),
            });
        }
        Ok(())
    }

    /// Compile or execute a resolved word. Immediate words (module brackets)
    /// execute even while compiling, in addition to being appended into the
    /// open definition.
    fn handle_word(
        &mut self,
        word: Rc<dyn Word>,
        call_location: Option<CodeLocation>,
    ) -> Result<(), ForthicError> {
        if self.is_compiling {
            if let Some(definition) = self.cur_definition.as_mut() {
                definition.add_word(word.clone(), call_location.clone());
            }
            if word.is_immediate() {
                return self.execute_word(word, call_location);
            }
            return Ok(());
        }

        self.execute_word(word, call_location)
    }

    fn execute_word(
        &mut self,
        word: Rc<dyn Word>,
        call_location: Option<CodeLocation>,
    ) -> Result<(), ForthicError> {
        if self.validation_mode && !word.is_immediate() {
            return Ok(());
        }

        if self.profiler.running {
            self.profiler.count_word(word.name());
        }

        word.execute(self).map_err(|error| match error {
            ForthicError::WordExecution {
                message,
                inner_error,
                call_location: None,
                definition_location,
            } => ForthicError::WordExecution {
                message,
                inner_error,
                call_location,
                definition_location,
            },
            other => other,
        })
    }

    // ========================================
    // Streaming driver
    // ========================================

    pub fn start_stream(&mut self) {
        self.stream_enabled = true;
        self.streaming_cursor = 0;
        self.previous_delta_len = 0;
    }

    pub fn end_stream(&mut self) {
        self.stream_enabled = false;
        self.streaming_cursor = 0;
        self.previous_delta_len = 0;
    }

    /// Execute the accumulated source prefix `code`, running only tokens
    /// safely behind the streaming cursor. The final possibly-still-growing
    /// token is held back until `done`. Yields the executed token texts and,
    /// while not done, a delta of the newly consumed input.
    pub fn streaming_run(
        &mut self,
        code: &str,
        done: bool,
    ) -> Result<Vec<StreamEvent>, ForthicError> {
        if !self.stream_enabled {
            self.start_stream();
        }

        let mut tokenizer = Tokenizer::new(code, None, true);
        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.next_token()?;
            let is_eos = token.token_type == TokenType::Eos;
            tokens.push(token);
            if is_eos {
                break;
            }
        }

        let eos_index = tokens.len() - 1;
        let new_stop = if done {
            tokens.len()
        } else {
            // Hold back the last non-EOS token: more input could extend it
            eos_index.saturating_sub(1).max(self.streaming_cursor)
        };

        let mut events = Vec::new();
        let start = self.streaming_cursor.min(new_stop);
        for token in tokens[start..new_stop].to_vec() {
            let text = token.text.clone();
            let kind = token.token_type;
            self.handle_token(token)?;

            let reportable = !matches!(kind, TokenType::Comment | TokenType::Eos);
            if reportable && text != "START_LOG" {
                events.push(StreamEvent::Token(text));
            }
        }

        if done {
            self.end_stream();
        } else {
            let chars: Vec<char> = code.chars().collect();
            let from = self.previous_delta_len.min(chars.len());
            events.push(StreamEvent::StringDelta(chars[from..].iter().collect()));
            self.previous_delta_len = chars.len();
            self.streaming_cursor = new_stop;
        }

        Ok(events)
    }

    // ========================================
    // Duplication
    // ========================================

    /// Duplicate this interpreter for parallel work: independent stack,
    /// module stack, and mutable state; shared registered-module index.
    /// Import prefixes are reconstructed by [`Module::copy`].
    pub fn dup_interpreter(&self) -> Interpreter {
        let app_copy = Rc::new(std::cell::RefCell::new(self.app_module.borrow().copy()));
        Interpreter {
            timezone: self.timezone.clone(),
            stack: self.stack.dup(),
            app_module: app_copy.clone(),
            module_stack: vec![app_copy],
            registered_modules: Rc::clone(&self.registered_modules),
            tokenizer_stack: Vec::new(),
            previous_token: None,
            is_compiling: false,
            is_memo_definition: false,
            cur_definition: None,
            string_location: None,
            max_attempts: self.max_attempts,
            error_handler: self.error_handler.clone(),
            literal_handlers: self.literal_handlers.clone(),
            profiler: Profiler::default(),
            validation_mode: false,
            stream_enabled: false,
            streaming_cursor: 0,
            previous_delta_len: 0,
        }
    }
}
