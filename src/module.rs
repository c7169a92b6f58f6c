//! Module system for Forthic
//!
//! A module is a namespace owning words, variables, child modules, and the
//! set of word names it exports to importers. Modules are shared by
//! reference ([`ModuleRef`]): the module stack, the interpreter's
//! registered-module index, and parent child-maps can all point at the same
//! logical module, so definitions made inside `{mod ... }` blocks persist.

use crate::errors::ForthicError;
use crate::values::Value;
use crate::words::{ImportedWord, MemoBangAtWord, MemoBangWord, MemoWord, PushValueWord, Word};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a module
pub type ModuleRef = Rc<RefCell<Module>>;

/// Named mutable value cell owned by a module
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    value: Value,
}

impl Variable {
    pub fn new(name: String, value: Value) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Value {
        self.value.clone()
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }
}

/// Container for words, variables, and child modules
pub struct Module {
    name: String,
    words: Vec<Rc<dyn Word>>,
    exportable: Vec<String>,
    variables: HashMap<String, Rc<RefCell<Variable>>>,
    modules: HashMap<String, ModuleRef>,
    module_prefixes: HashMap<String, Vec<String>>,
    source_code: String,
}

impl Module {
    pub fn new(name: String) -> Self {
        Self {
            name,
            words: Vec::new(),
            exportable: Vec::new(),
            variables: HashMap::new(),
            modules: HashMap::new(),
            module_prefixes: HashMap::new(),
            source_code: String::new(),
        }
    }

    pub fn new_ref(name: String) -> ModuleRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    pub fn new_with_source(name: String, source_code: String) -> Self {
        let mut module = Self::new(name);
        module.source_code = source_code;
        module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    pub fn set_source_code(&mut self, code: String) {
        self.source_code = code;
    }

    // ---- words ----

    pub fn add_word(&mut self, word: Rc<dyn Word>) {
        self.words.push(word);
    }

    /// Mark word names as exportable
    pub fn add_exportable(&mut self, names: Vec<String>) {
        self.exportable.extend(names);
    }

    pub fn add_exportable_word(&mut self, word: Rc<dyn Word>) {
        self.exportable.push(word.name().to_string());
        self.words.push(word);
    }

    /// Add the memo triplet for `inner`: NAME, NAME!, NAME!@ sharing one
    /// cache cell
    pub fn add_memo_words(&mut self, inner: Rc<dyn Word>) -> Rc<MemoWord> {
        let memo = Rc::new(MemoWord::new(inner));
        self.words.push(memo.clone());
        self.words.push(Rc::new(MemoBangWord::new(memo.clone())));
        self.words.push(Rc::new(MemoBangAtWord::new(memo.clone())));
        memo
    }

    pub fn exportable_words(&self) -> Vec<Rc<dyn Word>> {
        self.words
            .iter()
            .filter(|w| self.exportable.iter().any(|name| name.as_str() == w.name()))
            .cloned()
            .collect()
    }

    /// Find a word: dictionary first (newest shadows oldest), then variables
    pub fn find_word(&self, name: &str) -> Option<Rc<dyn Word>> {
        self.find_dictionary_word(name)
            .or_else(|| self.find_variable(name))
    }

    pub fn find_dictionary_word(&self, name: &str) -> Option<Rc<dyn Word>> {
        self.words.iter().rev().find(|w| w.name() == name).cloned()
    }

    /// Materialize a variable as a word pushing its reference
    pub fn find_variable(&self, name: &str) -> Option<Rc<dyn Word>> {
        self.variables.get(name).map(|var| {
            Rc::new(PushValueWord::new(
                name.to_string(),
                Value::Variable(var.clone()),
            )) as Rc<dyn Word>
        })
    }

    // ---- variables ----

    /// Create a variable if it doesn't exist. Names starting with `__` are
    /// reserved.
    pub fn add_variable(&mut self, name: &str) -> Result<(), ForthicError> {
        if name.starts_with("__") {
            return Err(ForthicError::InvalidVariableName {
                varname: name.to_string(),
                location: None,
            });
        }
        self.variables.entry(name.to_string()).or_insert_with(|| {
            Rc::new(RefCell::new(Variable::new(name.to_string(), Value::Null)))
        });
        Ok(())
    }

    pub fn get_variable(&self, name: &str) -> Option<Rc<RefCell<Variable>>> {
        self.variables.get(name).cloned()
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    // ---- child modules ----

    pub fn find_module(&self, name: &str) -> Option<ModuleRef> {
        self.modules.get(name).cloned()
    }

    /// Record a child reference without a prefix registration (used by
    /// `{name` module creation)
    pub fn add_child(&mut self, name: String, module: ModuleRef) {
        self.modules.insert(name, module);
    }

    /// Record a child reference and a prefix under which it was imported.
    /// Multiple prefixes per child are allowed.
    pub fn register_module(&mut self, child_name: String, prefix: String, module: ModuleRef) {
        self.modules.insert(child_name.clone(), module);
        self.module_prefixes.entry(child_name).or_default().push(prefix);
    }

    /// Import `source`: duplicate it, then append each exported word either
    /// directly (empty prefix) or as a `prefix.NAME` alias, and register the
    /// duplicate as a child under the prefix.
    pub fn import_module(&mut self, prefix: &str, source: &ModuleRef) {
        let duplicate = Rc::new(RefCell::new(source.borrow().duplicate()));
        let words = duplicate.borrow().exportable_words();

        for word in words {
            if prefix.is_empty() {
                self.add_word(word);
            } else {
                let alias = format!("{}.{}", prefix, word.name());
                self.add_word(Rc::new(ImportedWord::new(alias, word)));
            }
        }

        let child_name = duplicate.borrow().name().to_string();
        self.register_module(child_name, prefix.to_string(), duplicate);
    }

    /// Shallow-copy words and exportable names, deep-copy variables, share
    /// children by reference
    pub fn duplicate(&self) -> Module {
        let mut result = Module::new(self.name.clone());
        result.words = self.words.clone();
        result.exportable = self.exportable.clone();

        for (name, var) in &self.variables {
            let fresh = Rc::new(RefCell::new(var.borrow().clone()));
            result.variables.insert(name.clone(), fresh);
        }

        result.modules = self.modules.clone();
        result.source_code = self.source_code.clone();
        result
    }

    /// Like [`duplicate`](Self::duplicate), but replays every recorded
    /// (child, prefix) registration so import prefixes survive interpreter
    /// duplication. The shallow word copy already contains the aliases the
    /// original imports appended, so those are dropped before the replay;
    /// otherwise each duplication generation would add another alias set.
    pub fn copy(&self) -> Module {
        let mut result = self.duplicate();
        for (child_name, prefixes) in &self.module_prefixes {
            if let Some(child) = self.modules.get(child_name) {
                result.remove_imported_words(prefixes, child);
                for prefix in prefixes {
                    result.import_module(prefix, child);
                }
            }
        }
        result
    }

    /// Drop the word entries a previous import of `child` left behind: the
    /// `prefix.NAME` aliases for prefixed imports, and the child's exported
    /// word entries themselves for unprefixed ones.
    fn remove_imported_words(&mut self, prefixes: &[String], child: &ModuleRef) {
        let exported = child.borrow().exportable_words();
        self.words.retain(|word| {
            for prefix in prefixes {
                if prefix.is_empty() {
                    if exported.iter().any(|e| Rc::ptr_eq(e, word)) {
                        return false;
                    }
                } else if word.name().starts_with(&format!("{}.", prefix)) {
                    return false;
                }
            }
            true
        });
    }

    /// Names of all words in this module, oldest first
    pub fn word_names(&self) -> Vec<String> {
        self.words.iter().map(|w| w.name().to_string()).collect()
    }
}
