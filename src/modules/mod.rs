//! Standard Forthic modules
//!
//! Each module registers its word set on construction and is imported
//! unprefixed by [`Interpreter::new`](crate::interpreter::Interpreter::new):
//! - **core**: stack ops, variables, INTERPRET, options, debug stops
//! - **math**: arithmetic
//! - **boolean**: comparison, logic, membership
//! - **array**: collection access and transformation
//! - **record**: ordered key/value records
//! - **string**: text processing
//! - **json**: serialization
//! - **datetime**: date/time operations

pub mod array;
pub mod boolean;
pub mod core;
pub mod datetime;
pub mod json;
pub mod math;
pub mod record;
pub mod string;

pub use self::array::ArrayModule;
pub use self::boolean::BooleanModule;
pub use self::core::CoreModule;
pub use self::datetime::DateTimeModule;
pub use self::json::JsonModule;
pub use self::math::MathModule;
pub use self::record::RecordModule;
pub use self::string::StringModule;

use crate::module::ModuleRef;

/// The standard modules imported by a fresh interpreter
pub fn standard_modules() -> Vec<ModuleRef> {
    vec![
        CoreModule::new().into_ref(),
        MathModule::new().into_ref(),
        BooleanModule::new().into_ref(),
        ArrayModule::new().into_ref(),
        RecordModule::new().into_ref(),
        StringModule::new().into_ref(),
        JsonModule::new().into_ref(),
        DateTimeModule::new().into_ref(),
    ]
}
