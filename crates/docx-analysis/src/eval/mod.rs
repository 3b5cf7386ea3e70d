//! Restricted literal evaluation and static error materialization.
//!
//! Only literal-shaped expressions are evaluated. Names resolve to locals
//! bound by earlier literal assignments or to module-level constants;
//! nothing is executed.

pub mod construct;
pub mod format;
pub mod literal;
pub mod value;

pub use construct::{construct, Constructed};
pub use literal::{eval_call_arguments, eval_expr, eval_lenient, Arguments, EvalScope, InstanceView};
pub use value::Value;
