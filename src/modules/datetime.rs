// Datetime module for Forthic
//
// Date/time operations against the interpreter's configured timezone.
// AM and PM adjust a Time already on the stack, which is how `2:30 PM`
// works at the language level (the meridiem arrives as its own word).

use crate::errors::ForthicError;
use crate::interpreter::Interpreter;
use crate::literals;
use crate::module::{Module, ModuleRef};
use crate::values::Value;
use crate::words::BuiltinWord;
use chrono::{Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use std::cell::RefCell;
use std::rc::Rc;

/// Date/time word set
pub struct DateTimeModule {
    module: Module,
}

impl DateTimeModule {
    pub fn new() -> Self {
        let mut module = Module::new("datetime".to_string());

        module.add_exportable_word(Rc::new(BuiltinWord::new("NOW", Self::word_now)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("TODAY", Self::word_today)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("AM", Self::word_am)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("PM", Self::word_pm)));
        module.add_exportable_word(Rc::new(BuiltinWord::new(">DATE", Self::word_to_date)));
        module.add_exportable_word(Rc::new(BuiltinWord::new(">TIME", Self::word_to_time)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("DATE>STR", Self::word_date_to_str)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("TIME>STR", Self::word_time_to_str)));
        module.add_exportable_word(Rc::new(BuiltinWord::new("+DAYS", Self::word_add_days)));

        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_ref(self) -> ModuleRef {
        Rc::new(RefCell::new(self.module))
    }

    fn interpreter_tz(interp: &Interpreter) -> Tz {
        interp.get_timezone().parse().unwrap_or(chrono_tz::UTC)
    }

    /// ( -- time ) current wall-clock time in the interpreter timezone
    fn word_now(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let tz = Self::interpreter_tz(interp);
        let now = Utc::now().with_timezone(&tz);
        interp.stack_push(Value::Time(now.time()));
        Ok(())
    }

    /// ( -- date ) today in the interpreter timezone
    fn word_today(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let tz = Self::interpreter_tz(interp);
        let today = Utc::now().with_timezone(&tz).date_naive();
        interp.stack_push(Value::Date(today));
        Ok(())
    }

    /// ( time -- time ) coerce to before noon
    fn word_am(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let result = match value {
            Value::Time(t) if t.hour() >= 12 => {
                Value::Time(NaiveTime::from_hms_opt(t.hour() - 12, t.minute(), t.second()).unwrap_or(t))
            }
            other => other,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( time -- time ) coerce to after noon
    fn word_pm(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let result = match value {
            Value::Time(t) if t.hour() < 12 => {
                Value::Time(NaiveTime::from_hms_opt(t.hour() + 12, t.minute(), t.second()).unwrap_or(t))
            }
            other => other,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( value -- date )
    fn word_to_date(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let result = match value {
            Value::Date(d) => Value::Date(d),
            Value::DateTime(dt) => Value::Date(dt.date_naive()),
            Value::String(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( value -- time )
    fn word_to_time(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let result = match value {
            Value::Time(t) => Value::Time(t),
            Value::DateTime(dt) => Value::Time(dt.time()),
            Value::String(s) => literals::to_time(&s).unwrap_or(Value::Null),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( date -- string )
    fn word_date_to_str(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let result = match value {
            Value::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Value::String(dt.format("%Y-%m-%d").to_string()),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( time -- string )
    fn word_time_to_str(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let value = interp.stack_pop()?;

        let result = match value {
            Value::Time(t) => Value::String(t.format("%H:%M").to_string()),
            Value::DateTime(dt) => Value::String(dt.format("%H:%M").to_string()),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }

    /// ( date n -- date )
    fn word_add_days(interp: &mut Interpreter) -> Result<(), ForthicError> {
        let n = interp.stack_pop()?;
        let date = interp.stack_pop()?;

        let result = match (date, n.as_int()) {
            (Value::Date(d), Some(n)) => Value::Date(d + Duration::days(n)),
            (Value::DateTime(dt), Some(n)) => Value::DateTime(dt + Duration::days(n)),
            _ => Value::Null,
        };
        interp.stack_push(result);
        Ok(())
    }
}

impl Default for DateTimeModule {
    fn default() -> Self {
        Self::new()
    }
}
