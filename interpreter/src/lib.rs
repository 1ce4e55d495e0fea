//! Compiles infix formulas such as `y<=sin(x)+2x` into expression trees and
//! evaluates them.

mod equation;
mod identifier;
pub mod parser;
mod value;

pub use equation::Equation;
pub use identifier::Identifier;
pub use parser::{compile, compile_equation, Error, Errors, Full, Operator, Relation};
pub use value::{unresolved_variable, Bindings, EvalContext, Expr, Func, IntoDefines};
