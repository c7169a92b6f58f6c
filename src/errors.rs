//! Error types for the Forthic interpreter
//!
//! Every error that can escape the interpreter is a [`ForthicError`] variant.
//! Most variants carry an optional [`CodeLocation`] pointing back into the
//! source string and, where nesting applies, a typed inner error so failures
//! from nested interpretation keep their chain. Rendering against the
//! original source is done by [`get_error_description`].

use thiserror::Error;

/// Source position record used by tokens, compiled words, and errors.
///
/// `line` and `column` are 1-based; `start_pos`/`end_pos` are 0-based
/// character offsets into the originating string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLocation {
    /// Human-readable origin tag (module name, file path, ...)
    pub source: Option<String>,
    pub line: usize,
    pub column: usize,
    pub start_pos: usize,
    pub end_pos: Option<usize>,
}

impl Default for CodeLocation {
    fn default() -> Self {
        Self {
            source: None,
            line: 1,
            column: 1,
            start_pos: 0,
            end_pos: None,
        }
    }
}

impl CodeLocation {
    pub fn new(line: usize, column: usize, start_pos: usize) -> Self {
        Self {
            source: None,
            line,
            column,
            start_pos,
            end_pos: None,
        }
    }

    pub fn with_source(mut self, source: String) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_end_pos(mut self, end_pos: usize) -> Self {
        self.end_pos = Some(end_pos);
        self
    }
}

/// Main error type for the Forthic interpreter
#[derive(Error, Debug)]
pub enum ForthicError {
    /// Word lookup and the literal pipeline both failed
    #[error("Unknown word: {word}")]
    UnknownWord {
        word: String,
        location: Option<CodeLocation>,
    },

    /// A registered module name could not be resolved
    #[error("Unknown module: {module_name}")]
    UnknownModule {
        module_name: String,
        location: Option<CodeLocation>,
    },

    /// Defensive: the dispatcher was handed a token it has no rule for
    #[error("Unknown type of token: {token}")]
    UnknownToken {
        token: String,
        location: Option<CodeLocation>,
    },

    /// Pop on an empty stack
    #[error("Stack underflow")]
    StackUnderflow { location: Option<CodeLocation> },

    /// `:` or `@:` while a definition is already open
    #[error("Missing semicolon")]
    MissingSemicolon { location: Option<CodeLocation> },

    /// `;` with no open definition
    #[error("Extra semicolon")]
    ExtraSemicolon { location: Option<CodeLocation> },

    /// Variable names may not begin with `__`
    #[error("Invalid variable name: {varname}")]
    InvalidVariableName {
        varname: String,
        location: Option<CodeLocation>,
    },

    /// The tokenizer rejected a definition name
    #[error("Invalid word name")]
    InvalidWordName {
        note: Option<String>,
        location: Option<CodeLocation>,
    },

    /// EOF inside a string literal
    #[error("Unterminated string")]
    UnterminatedString { location: Option<CodeLocation> },

    /// `~>` was given something other than an even `[.key value ...]` array
    #[error("Invalid options: {reason}")]
    InvalidOptions {
        reason: String,
        location: Option<CodeLocation>,
    },

    /// Error escaping a module's top-level code evaluation
    #[error("Error in module {module_name}")]
    Module {
        module_name: String,
        #[source]
        inner_error: Box<ForthicError>,
        location: Option<CodeLocation>,
    },

    /// Error raised inside a compiled definition; carries both the
    /// definition site and the call site
    #[error("{message}")]
    WordExecution {
        message: String,
        #[source]
        inner_error: Box<ForthicError>,
        call_location: Option<CodeLocation>,
        definition_location: Option<CodeLocation>,
    },

    /// The recovery loop gave up
    #[error("Too many recovery attempts: {num_attempts} of {max_attempts}")]
    TooManyAttempts {
        num_attempts: usize,
        max_attempts: usize,
        location: Option<CodeLocation>,
    },

    /// Raised by debug words (PEEK!, STACK!) to halt execution on purpose.
    /// Never delivered to error handlers.
    #[error("Intentional stop: {message}")]
    IntentionalStop { message: String },
}

impl ForthicError {
    /// Location associated with this error, if any. For word-execution
    /// errors this is the call site.
    pub fn get_location(&self) -> Option<&CodeLocation> {
        match self {
            Self::UnknownWord { location, .. }
            | Self::UnknownModule { location, .. }
            | Self::UnknownToken { location, .. }
            | Self::StackUnderflow { location }
            | Self::MissingSemicolon { location }
            | Self::ExtraSemicolon { location }
            | Self::InvalidVariableName { location, .. }
            | Self::InvalidWordName { location, .. }
            | Self::UnterminatedString { location }
            | Self::InvalidOptions { location, .. }
            | Self::Module { location, .. }
            | Self::TooManyAttempts { location, .. } => location.as_ref(),
            Self::WordExecution { call_location, .. } => call_location.as_ref(),
            Self::IntentionalStop { .. } => None,
        }
    }

    /// Nested cause, if this error wraps another
    pub fn cause(&self) -> Option<&ForthicError> {
        match self {
            Self::Module { inner_error, .. } | Self::WordExecution { inner_error, .. } => {
                Some(inner_error)
            }
            _ => None,
        }
    }

    /// The innermost error in the cause chain
    pub fn root_cause(&self) -> &ForthicError {
        let mut cur = self;
        while let Some(inner) = cur.cause() {
            cur = inner;
        }
        cur
    }
}

/// Render an error against the source it was raised in.
///
/// Produces the error message, an `at line N` marker, the source up to and
/// including the error line, and a caret underline. Word-execution errors
/// show the definition site followed by the call site.
pub fn get_error_description(source: &str, error: &ForthicError) -> String {
    if let ForthicError::WordExecution {
        message,
        call_location,
        definition_location: Some(def_loc),
        ..
    } = error
    {
        return format_word_execution_error(message, source, call_location.as_ref(), def_loc);
    }

    match error.get_location() {
        Some(location) => format_standard_error(&error.to_string(), source, location),
        None => error.to_string(),
    }
}

fn excerpt_with_caret(source: &str, location: &CodeLocation) -> String {
    let context: Vec<&str> = source.split('\n').take(location.line).collect();

    let end_pos = location.end_pos.unwrap_or(location.start_pos + 1);
    let width = end_pos.saturating_sub(location.start_pos).max(1);
    let indicator = " ".repeat(location.column.saturating_sub(1)) + &"^".repeat(width);

    format!("```\n{}\n{}\n```", context.join("\n"), indicator)
}

fn location_info(location: &CodeLocation) -> String {
    let mut info = format!("at line {}", location.line);
    if let Some(ref source) = location.source {
        info.push_str(&format!(" in {}", source));
    }
    info
}

fn format_standard_error(message: &str, source: &str, location: &CodeLocation) -> String {
    format!(
        "{} {}:\n{}",
        message,
        location_info(location),
        excerpt_with_caret(source, location)
    )
}

fn format_word_execution_error(
    message: &str,
    source: &str,
    call_location: Option<&CodeLocation>,
    def_location: &CodeLocation,
) -> String {
    let mut report = format!(
        "{} {}:\n{}",
        message,
        location_info(def_location),
        excerpt_with_caret(source, def_location)
    );

    if let Some(call_loc) = call_location {
        let mut call_info = format!("line {}", call_loc.line);
        if let Some(ref src) = call_loc.source {
            call_info.push_str(&format!(" in {}", src));
        }
        report.push_str(&format!(
            "\nCalled from {}:\n{}",
            call_info,
            excerpt_with_caret(source, call_loc)
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_location_default() {
        let loc = CodeLocation::default();
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 1);
        assert_eq!(loc.start_pos, 0);
        assert_eq!(loc.end_pos, None);
        assert_eq!(loc.source, None);
    }

    #[test]
    fn test_code_location_builder() {
        let loc = CodeLocation::new(10, 5, 42)
            .with_source("main.forthic".to_string())
            .with_end_pos(50);

        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 5);
        assert_eq!(loc.start_pos, 42);
        assert_eq!(loc.end_pos, Some(50));
        assert_eq!(loc.source, Some("main.forthic".to_string()));
    }

    #[test]
    fn test_standard_error_rendering() {
        let source = "DUP GARBAGE SWAP";
        let error = ForthicError::UnknownWord {
            word: "GARBAGE".to_string(),
            location: Some(CodeLocation::new(1, 5, 4).with_end_pos(11)),
        };

        let report = get_error_description(source, &error);
        assert!(report.contains("Unknown word: GARBAGE"));
        assert!(report.contains("at line 1"));
        assert!(report.contains("DUP GARBAGE SWAP"));
        // Seven carets under GARBAGE, aligned to column 5
        assert!(report.contains("    ^^^^^^^"));
    }

    #[test]
    fn test_multiline_error_rendering() {
        let source = "DUP\nGARBAGE\nSWAP";
        let error = ForthicError::UnknownWord {
            word: "GARBAGE".to_string(),
            location: Some(CodeLocation::new(2, 1, 4).with_end_pos(11)),
        };

        let report = get_error_description(source, &error);
        assert!(report.contains("at line 2"));
        assert!(report.contains("GARBAGE"));
        // Excerpt stops at the error line
        assert!(!report.contains("SWAP"));
    }

    #[test]
    fn test_word_execution_rendering_shows_both_sites() {
        let source = ": BAD + ;\n1 BAD";
        let error = ForthicError::WordExecution {
            message: "Error executing word BAD".to_string(),
            inner_error: Box::new(ForthicError::StackUnderflow { location: None }),
            call_location: Some(CodeLocation::new(2, 3, 12).with_end_pos(15)),
            definition_location: Some(CodeLocation::new(1, 7, 6).with_end_pos(7)),
        };

        let report = get_error_description(source, &error);
        assert!(report.contains("at line 1"));
        assert!(report.contains("Called from line 2"));
    }

    #[test]
    fn test_error_without_location() {
        let error = ForthicError::UnknownWord {
            word: "DUP".to_string(),
            location: None,
        };

        assert_eq!(get_error_description("DUP", &error), "Unknown word: DUP");
    }

    #[test]
    fn test_root_cause() {
        let inner = ForthicError::StackUnderflow { location: None };
        let wrapped = ForthicError::WordExecution {
            message: "Error executing word OUTER".to_string(),
            inner_error: Box::new(inner),
            call_location: None,
            definition_location: None,
        };
        let module_err = ForthicError::Module {
            module_name: "m".to_string(),
            inner_error: Box::new(wrapped),
            location: None,
        };

        assert!(matches!(
            module_err.root_cause(),
            ForthicError::StackUnderflow { .. }
        ));
    }

    #[test]
    fn test_intentional_stop() {
        let error = ForthicError::IntentionalStop {
            message: "PEEK!".to_string(),
        };
        assert!(error.to_string().contains("Intentional stop"));
        assert!(error.get_location().is_none());
    }

    #[test]
    fn test_too_many_attempts_message() {
        let error = ForthicError::TooManyAttempts {
            num_attempts: 4,
            max_attempts: 3,
            location: None,
        };
        let msg = error.to_string();
        assert!(msg.contains('4'));
        assert!(msg.contains('3'));
    }
}
