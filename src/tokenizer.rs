//! Tokenizer for the Forthic interpreter
//!
//! Converts source text into a stream of located tokens. The tokenizer is a
//! single-pass lexer with a running cursor; once the input is exhausted it
//! yields `Eos` on every subsequent call. Seeding with a reference
//! [`CodeLocation`] translates emitted locations into the frame of an outer
//! logical source (used by nested interpretation).

use crate::errors::{CodeLocation, ForthicError};
use regex::Regex;
use std::sync::OnceLock;

/// Token types recognized by the Forthic tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    String,
    Comment,
    StartArray,
    EndArray,
    StartModule,
    EndModule,
    StartDef,
    EndDef,
    StartMemo,
    Word,
    DotSymbol,
    Eos,
}

/// A token with its type, text, and location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub text: String,
    pub location: CodeLocation,
}

impl Token {
    pub fn new(token_type: TokenType, text: String, location: CodeLocation) -> Self {
        Self {
            token_type,
            text,
            location,
        }
    }
}

const WHITESPACE: [char; 7] = [' ', '\t', '\n', '\r', '(', ')', ','];
const QUOTE_CHARS: [char; 2] = ['\'', '"'];
const WORD_TERMINATORS: [char; 6] = [';', '[', ']', '{', '}', '#'];

fn dot_symbol_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\.[A-Za-z_][A-Za-z0-9_-]*$").unwrap())
}

/// Tokenizer state machine for Forthic code
pub struct Tokenizer {
    reference_location: CodeLocation,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,

    // Start of the token currently being gathered
    token_start_pos: usize,
    token_line: usize,
    token_column: usize,

    streaming: bool,
}

impl Tokenizer {
    /// Create a new tokenizer over `input`.
    ///
    /// With `streaming` set, an unterminated string at end of input is
    /// returned as a partial String token instead of an error, so a
    /// streaming driver can re-tokenize once more input arrives.
    pub fn new(input: &str, reference_location: Option<CodeLocation>, streaming: bool) -> Self {
        let reference_location = reference_location.unwrap_or_default();
        let line = reference_location.line;
        let column = reference_location.column;

        Self {
            reference_location,
            chars: input.chars().collect(),
            pos: 0,
            line,
            column,
            token_start_pos: 0,
            token_line: line,
            token_column: column,
            streaming,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token, ForthicError> {
        self.skip_whitespace();
        self.note_token_start();

        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(self.make_token(TokenType::Eos, String::new())),
        };

        match ch {
            '#' => {
                self.advance();
                self.note_token_start();
                Ok(self.gather_comment())
            }
            ':' => {
                self.advance();
                self.gather_definition_name(TokenType::StartDef)
            }
            '@' if self.peek_at(1) == Some(':') => {
                self.advance();
                self.advance();
                self.gather_definition_name(TokenType::StartMemo)
            }
            ';' => {
                self.advance();
                Ok(self.make_token(TokenType::EndDef, ";".to_string()))
            }
            '[' => {
                self.advance();
                Ok(self.make_token(TokenType::StartArray, "[".to_string()))
            }
            ']' => {
                self.advance();
                Ok(self.make_token(TokenType::EndArray, "]".to_string()))
            }
            '{' => {
                self.advance();
                self.note_token_start();
                Ok(self.gather_module_name())
            }
            '}' => {
                self.advance();
                Ok(self.make_token(TokenType::EndModule, "}".to_string()))
            }
            _ if self.at_triple_quote() => {
                let delim = ch;
                self.advance();
                self.advance();
                self.advance();
                self.note_token_start();
                self.gather_triple_quote_string(delim)
            }
            _ if QUOTE_CHARS.contains(&ch) => {
                self.advance();
                self.note_token_start();
                self.gather_string(ch)
            }
            _ => Ok(self.gather_word()),
        }
    }

    /// The input consumed so far (streaming support)
    pub fn get_string_delta(&self) -> String {
        self.chars[..self.pos].iter().collect()
    }

    /// The full input string
    pub fn get_input_string(&self) -> String {
        self.chars.iter().collect()
    }

    // ---- cursor helpers ----

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if WHITESPACE.contains(&ch) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn note_token_start(&mut self) {
        self.token_start_pos = self.pos + self.reference_location.start_pos;
        self.token_line = self.line;
        self.token_column = self.column;
    }

    fn token_location(&self, text_len: usize) -> CodeLocation {
        CodeLocation {
            source: self.reference_location.source.clone(),
            line: self.token_line,
            column: self.token_column,
            start_pos: self.token_start_pos,
            end_pos: Some(self.token_start_pos + text_len),
        }
    }

    fn make_token(&self, token_type: TokenType, text: String) -> Token {
        let len = text.chars().count();
        Token::new(token_type, text, self.token_location(len))
    }

    fn at_triple_quote(&self) -> bool {
        match self.peek() {
            Some(ch) if QUOTE_CHARS.contains(&ch) => {
                self.peek_at(1) == Some(ch) && self.peek_at(2) == Some(ch)
            }
            _ => false,
        }
    }

    // ---- token gatherers ----

    fn gather_comment(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        self.make_token(TokenType::Comment, text)
    }

    fn gather_definition_name(
        &mut self,
        token_type: TokenType,
    ) -> Result<Token, ForthicError> {
        self.skip_whitespace();
        self.note_token_start();

        if self.peek().is_none() {
            return Err(ForthicError::InvalidWordName {
                note: Some("Missing definition name".to_string()),
                location: Some(self.token_location(1)),
            });
        }

        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if WHITESPACE.contains(&ch) {
                break;
            }
            if QUOTE_CHARS.contains(&ch) {
                return Err(ForthicError::InvalidWordName {
                    note: Some("Definition names can't have quotes in them".to_string()),
                    location: Some(self.token_location(name.chars().count().max(1))),
                });
            }
            if [';', '[', ']', '{', '}'].contains(&ch) {
                return Err(ForthicError::InvalidWordName {
                    note: Some(format!("Definition names can't have '{}' in them", ch)),
                    location: Some(self.token_location(name.chars().count().max(1))),
                });
            }
            name.push(ch);
            self.advance();
        }

        Ok(self.make_token(token_type, name))
    }

    fn gather_module_name(&mut self) -> Token {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if WHITESPACE.contains(&ch) || ch == '}' {
                break;
            }
            name.push(ch);
            self.advance();
        }
        self.make_token(TokenType::StartModule, name)
    }

    fn gather_string(&mut self, delim: char) -> Result<Token, ForthicError> {
        let mut text = String::new();
        while let Some(ch) = self.advance() {
            if ch == delim {
                return Ok(self.make_token(TokenType::String, text));
            }
            text.push(ch);
        }

        if self.streaming {
            return Ok(self.make_token(TokenType::String, text));
        }

        Err(ForthicError::UnterminatedString {
            location: Some(self.token_location(text.chars().count().max(1))),
        })
    }

    fn gather_triple_quote_string(&mut self, delim: char) -> Result<Token, ForthicError> {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch == delim && self.at_triple_quote() {
                // A fourth delimiter char means this triple is content, not
                // the closer (greedy close)
                if self.peek_at(3) == Some(delim) {
                    text.push(ch);
                    self.advance();
                    continue;
                }
                self.advance();
                self.advance();
                self.advance();
                return Ok(self.make_token(TokenType::String, text));
            }
            text.push(ch);
            self.advance();
        }

        if self.streaming {
            return Ok(self.make_token(TokenType::String, text));
        }

        Err(ForthicError::UnterminatedString {
            location: Some(self.token_location(text.chars().count().max(1))),
        })
    }

    fn gather_word(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if WHITESPACE.contains(&ch) {
                break;
            }

            // A '[' inside a token containing 'T' is a bracketed IANA zone
            // (e.g. 2024-06-05T10:15:00[Europe/London]); fold it in
            if ch == '[' && text.contains('T') {
                text.push(ch);
                self.advance();
                while let Some(zch) = self.advance() {
                    text.push(zch);
                    if zch == ']' {
                        break;
                    }
                }
                continue;
            }

            if WORD_TERMINATORS.contains(&ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }

        if dot_symbol_pattern().is_match(&text) {
            let raw_len = text.chars().count();
            let symbol = text[1..].to_string();
            return Token::new(TokenType::DotSymbol, symbol, self.token_location(raw_len));
        }

        self.make_token(TokenType::Word, text)
    }
}
