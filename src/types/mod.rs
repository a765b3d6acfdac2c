//! Type system module
//!
//! Type tags for runtime values plus the rules that decide how two values
//! meet in an operation: coercion to a common type, explicit conversion,
//! and operator dispatch.

pub mod type_def;
pub mod coerce;
pub mod convert;
pub mod operations;

pub use type_def::{Type, TypeError};
pub use coerce::{coerce_for_operation, highest_numeric_type};
pub use convert::{conform, convert};
pub use operations::{binary_op, unary_op};
