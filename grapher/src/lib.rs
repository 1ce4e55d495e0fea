pub use interpreter::*;
pub use plot;

#[cfg(feature = "cranelift")]
pub use compiler::cranelift;

mod frame;

pub use frame::{shading_for, trace_expr, Curve, Frame, Graph};
