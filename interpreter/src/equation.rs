use std::sync::Arc;

use tracing::debug;

use crate::{
    parser::{compile_equation, Error, Errors, Full, Relation},
    Expr,
};

/// User-editable equation text with its compiled form cached.
///
/// The tree is rebuilt lazily by [`Equation::refresh`], and only when the
/// text differs from the text the cached tree was built from. A text that
/// fails to compile is cached as well, so a broken equation costs one parse
/// rather than one per frame.
#[derive(Clone, Debug, Default)]
pub struct Equation {
    text: String,
    relation: Relation,
    snapshot: Option<String>,
    compiled: Option<Arc<Expr>>,
    errors: Errors,
    rebuilds: usize,
}

impl Equation {
    pub fn new(text: impl Into<String>) -> Self {
        Equation {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Returns the tree for the current text, compiling only if the text changed.
    pub fn refresh(&mut self) -> Option<Arc<Expr>> {
        if self.snapshot.as_deref() == Some(self.text.as_str()) {
            return self.compiled.clone();
        }
        self.compiled = None;
        self.errors.clear();

        let (relation, result) = compile_equation(&self.text);
        self.relation = relation;
        self.rebuilds += 1;
        match result {
            Ok(expr) => {
                debug!(text = %self.text, %relation, depth = expr.depth(), "rebuilt equation");
                self.compiled = Some(Arc::new(expr));
            }
            Err(errors) => self.errors = errors,
        }
        self.snapshot = Some(self.text.clone());
        self.compiled.clone()
    }

    /// The tree built by the last refresh, if it compiled.
    pub fn compiled(&self) -> Option<&Arc<Expr>> {
        self.compiled.as_ref()
    }

    /// Relation found by the last refresh.
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Errors from the last refresh; empty when it compiled.
    pub fn errors(&self) -> &[Error<Full>] {
        &self.errors
    }

    /// How many times the text has been compiled.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use crate::EvalContext;

    use super::*;

    #[test]
    fn unchanged_text_reuses_tree() {
        let mut eq = Equation::new("y<=x^2");
        assert_eq!(eq.rebuilds(), 0);
        let first = eq.refresh().unwrap();
        let second = eq.refresh().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(eq.rebuilds(), 1);
        assert_eq!(eq.relation(), Relation::Le);
    }

    #[test]
    fn changed_text_rebuilds() {
        let mut eq = Equation::new("x");
        let first = eq.refresh().unwrap();
        eq.set_text("x+1");
        let second = eq.refresh().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.evaluate(&EvalContext::at(2.0)), 3.0);
        assert_eq!(eq.rebuilds(), 2);

        // same text again is still a cache hit
        eq.set_text("x+1");
        eq.refresh();
        assert_eq!(eq.rebuilds(), 2);
    }

    #[test]
    fn broken_text_is_cached_too() {
        let mut eq = Equation::new("y > (x");
        assert!(eq.refresh().is_none());
        assert!(eq.refresh().is_none());
        assert_eq!(eq.rebuilds(), 1);
        assert_eq!(eq.errors().len(), 1);
        assert_eq!(eq.relation(), Relation::Gt);
        assert!(eq.compiled().is_none());

        eq.set_text("y > (x)");
        assert!(eq.refresh().is_some());
        assert!(eq.errors().is_empty());
    }
}
