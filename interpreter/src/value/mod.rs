mod define;
mod expr;
mod func;

pub use define::{unresolved_variable, Bindings, EvalContext, IntoDefines};
pub use expr::Expr;
pub use func::Func;
