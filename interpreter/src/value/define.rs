use std::collections::HashMap;

use crate::Identifier;

/// Value used for any variable a [`Bindings`] implementation does not know.
///
/// Unbound names plot as if they were zero instead of failing to compile.
/// Only single letters get here: the lexer splits a run like `ab` into
/// `a * b`, and `pi` and `e` are read as constants, so a multi-letter name
/// never reaches this fallback as one variable.
pub fn unresolved_variable(_id: Identifier) -> f64 {
    0.0
}

/// Source of variable values during evaluation.
pub trait Bindings {
    fn lookup(&self, id: Identifier) -> Option<f64>;

    fn value_of(&self, id: Identifier) -> f64 {
        self.lookup(id).unwrap_or_else(|| unresolved_variable(id))
    }
}

/// The three variables a plotted equation can see.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EvalContext {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl EvalContext {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        EvalContext { x, y, t }
    }

    /// Context for one column of the pixel sweep.
    pub fn at(x: f64) -> Self {
        EvalContext {
            x,
            ..Default::default()
        }
    }

    /// `[x, y, t]`, the layout native code reads the context with.
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.t]
    }
}

impl Bindings for EvalContext {
    fn lookup(&self, id: Identifier) -> Option<f64> {
        match id {
            Identifier::X => Some(self.x),
            Identifier::Y => Some(self.y),
            Identifier::T => Some(self.t),
            _ => None,
        }
    }
}

impl Bindings for HashMap<Identifier, f64> {
    fn lookup(&self, id: Identifier) -> Option<f64> {
        self.get(&id).copied()
    }
}

impl<B: Bindings + ?Sized> Bindings for &B {
    fn lookup(&self, id: Identifier) -> Option<f64> {
        (**self).lookup(id)
    }
}

pub trait IntoDefines {
    fn def(self) -> HashMap<Identifier, f64>;
}

impl<I: Into<Identifier>> IntoDefines for (I, f64) {
    fn def(self) -> HashMap<Identifier, f64> {
        let (ident, value) = self;
        let mut map = HashMap::new();
        map.insert(ident.into(), value);
        map
    }
}

impl<I: Into<Identifier> + Clone> IntoDefines for &[(I, f64)] {
    fn def(self) -> HashMap<Identifier, f64> {
        self.iter()
            .map(|(i, v)| (i.clone().into(), *v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_binds_x_y_t_only() {
        let ctx = EvalContext::new(1.0, 2.0, 3.0);
        assert_eq!(ctx.value_of(Identifier::X), 1.0);
        assert_eq!(ctx.value_of(Identifier::Y), 2.0);
        assert_eq!(ctx.value_of(Identifier::T), 3.0);
        assert_eq!(ctx.lookup(Identifier::from('q')), None);
        assert_eq!(ctx.value_of(Identifier::from('q')), 0.0);
    }

    #[test]
    fn defines_from_pairs() {
        let defs = [('a', 1.5), ('b', -2.0)].as_slice().def();
        assert_eq!(defs.value_of(Identifier::from('a')), 1.5);
        assert_eq!(defs.value_of(Identifier::from('b')), -2.0);
        assert_eq!(defs.value_of(Identifier::X), 0.0);
        assert_eq!(('x', 4.0).def().lookup(Identifier::X), Some(4.0));
    }
}
