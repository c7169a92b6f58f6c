//! Runtime value model for Forthic
//!
//! [`Value`] is the tagged variant every stack slot holds. String literals
//! travel as [`PositionedString`]s so errors raised later (e.g. by a nested
//! `INTERPRET`) can be attributed back to the quoted source text; the
//! interpreter unwraps them to plain strings on pop.

use crate::errors::CodeLocation;
use crate::module::Variable;
use crate::tokenizer::Token;
use crate::word_options::WordOptions;
use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A string literal plus the location of its quoted text
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedString {
    pub text: String,
    pub location: CodeLocation,
}

impl PositionedString {
    pub fn new(text: String, location: CodeLocation) -> Self {
        Self { text, location }
    }
}

/// Core value type for Forthic
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// String literal carrying its source location; unwrapped on pop
    PositionedString(PositionedString),
    Array(Vec<Value>),
    /// Ordered record: key insertion order is preserved
    Record(IndexMap<String, Value>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Tz>),
    /// A materialized variable reference (pushed when a variable name is used)
    Variable(Rc<RefCell<Variable>>),
    /// A raw token; the `[` sentinel consumed by `]`
    Token(Token),
    /// Options built by `~>`
    Options(WordOptions),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::PositionedString(ps) => Some(&ps.text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// If this is a positioned string, project it to a plain string value
    pub fn unwrap_positioned(self) -> Value {
        match self {
            Value::PositionedString(ps) => Value::String(ps.text),
            other => other,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::PositionedString(ps) => write!(f, "{}", ps.text),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(rec) => {
                write!(f, "[")?;
                for (i, (key, value)) in rec.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, ".{} {}", key, value)?;
                }
                write!(f, "]")
            }
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Variable(var) => write!(f, "<variable {}>", var.borrow().name()),
            Value::Token(token) => write!(f, "<token {}>", token.text),
            Value::Options(_) => write!(f, "<options>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Int(42).as_float(), Some(42.0));
        assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
        assert_eq!(Value::Float(2.5).as_int(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::String("x".to_string()).as_string(), Some("x"));
    }

    #[test]
    fn test_positioned_string_reads_as_string() {
        let ps = Value::PositionedString(PositionedString::new(
            "hello".to_string(),
            CodeLocation::default(),
        ));
        assert_eq!(ps.as_string(), Some("hello"));
        assert_eq!(ps.unwrap_positioned(), Value::String("hello".to_string()));
    }

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut rec = IndexMap::new();
        rec.insert("z".to_string(), Value::Int(1));
        rec.insert("a".to_string(), Value::Int(2));
        rec.insert("m".to_string(), Value::Int(3));

        let keys: Vec<&String> = rec.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
