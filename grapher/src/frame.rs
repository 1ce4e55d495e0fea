#[cfg(feature = "cranelift")]
use std::sync::Arc;

use interpreter::{EvalContext, Equation, Expr, Relation};
use plot::{
    grid::{self, GridPlan},
    PlotResult, ShadeSide, Shading, Trace, Viewport, ViewportConfig,
};
use tracing::debug;

#[cfg(feature = "cranelift")]
use compiler::cranelift::{self, CompiledExpr};

/// How an equation with this relation is filled, `None` for a plain curve.
pub fn shading_for(relation: Relation) -> Option<Shading> {
    let side = match relation {
        Relation::Eq => return None,
        Relation::Lt | Relation::Le => ShadeSide::Below,
        Relation::Gt | Relation::Ge => ShadeSide::Above,
    };
    Some(Shading {
        side,
        inclusive: !relation.is_strict(),
    })
}

/// Samples `expr` once per pixel column with the tree-walking evaluator.
pub fn trace_expr(viewport: &Viewport, relation: Relation, expr: &Expr) -> Trace {
    Trace::sweep(viewport, shading_for(relation), |x| {
        expr.evaluate(&EvalContext::at(x))
    })
}

#[cfg(feature = "cranelift")]
fn trace_native(viewport: &Viewport, relation: Relation, native: &CompiledExpr) -> Trace {
    let f = native.handle();
    Trace::sweep(viewport, shading_for(relation), move |x| {
        f.call(&EvalContext::at(x))
    })
}

/// One plotted equation.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub relation: Relation,
    pub trace: Trace,
}

/// Everything needed to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub grid: GridPlan,
    /// One entry per equation, `None` where the text does not compile.
    pub curves: Vec<Option<Curve>>,
}

struct Slot {
    equation: Equation,
    /// Native code for the tree it was built from; `None` inside marks a
    /// tree that failed to compile.
    #[cfg(feature = "cranelift")]
    native: Option<(Arc<Expr>, Option<CompiledExpr>)>,
}

impl Slot {
    fn new(equation: Equation) -> Self {
        Slot {
            equation,
            #[cfg(feature = "cranelift")]
            native: None,
        }
    }

    #[cfg(feature = "cranelift")]
    fn native(&mut self, expr: &Arc<Expr>) -> Option<&CompiledExpr> {
        let fresh = matches!(&self.native, Some((built, _)) if Arc::ptr_eq(built, expr));
        if !fresh {
            // release the old code before building the new one
            self.native = None;
            let native = match cranelift::compile(expr) {
                Ok(native) => Some(native),
                Err(e) => {
                    tracing::warn!(text = self.equation.text(), "jit failed, interpreting: {e}");
                    None
                }
            };
            self.native = Some((expr.clone(), native));
        }
        self.native.as_ref().and_then(|(_, native)| native.as_ref())
    }
}

/// The set of equations on screen and the window they are viewed through.
pub struct Graph {
    viewport: Viewport,
    pixels_per_line: f64,
    slots: Vec<Slot>,
    #[cfg(feature = "cranelift")]
    jit: bool,
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new(Viewport::default(), grid::DEFAULT_PIXELS_PER_LINE)
    }
}

impl Graph {
    pub fn new(viewport: Viewport, pixels_per_line: f64) -> Self {
        Graph {
            viewport,
            pixels_per_line,
            slots: Vec::new(),
            #[cfg(feature = "cranelift")]
            jit: false,
        }
    }

    pub fn from_config(config: &ViewportConfig) -> PlotResult<Self> {
        config.validate()?;
        Ok(Graph::new(config.viewport()?, config.pixels_per_line))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Adds an equation and returns its index.
    pub fn push(&mut self, text: impl Into<String>) -> usize {
        self.slots.push(Slot::new(Equation::new(text)));
        self.slots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn equation(&self, index: usize) -> Option<&Equation> {
        self.slots.get(index).map(|s| &s.equation)
    }

    pub fn equation_mut(&mut self, index: usize) -> Option<&mut Equation> {
        self.slots.get_mut(index).map(|s| &mut s.equation)
    }

    pub fn equations(&self) -> impl Iterator<Item = &Equation> {
        self.slots.iter().map(|s| &s.equation)
    }

    /// Sample with native code instead of the tree-walking evaluator.
    #[cfg(feature = "cranelift")]
    pub fn set_jit(&mut self, jit: bool) {
        self.jit = jit;
        if !jit {
            self.slots.iter_mut().for_each(|s| s.native = None);
        }
    }

    /// Refreshes every equation and samples it across the viewport.
    #[tracing::instrument(skip(self), fields(equations = self.slots.len()))]
    pub fn frame(&mut self) -> Frame {
        #[cfg(feature = "tracy")]
        profiling::scope!("Graph::frame");
        let viewport = self.viewport;
        let grid = grid::plan(&viewport, self.pixels_per_line);
        #[cfg(feature = "cranelift")]
        let jit = self.jit;

        let curves = self
            .slots
            .iter_mut()
            .map(|slot| {
                let Some(expr) = slot.equation.refresh() else {
                    #[cfg(feature = "cranelift")]
                    {
                        slot.native = None;
                    }
                    debug!(
                        text = slot.equation.text(),
                        errors = slot.equation.errors().len(),
                        "skipping equation"
                    );
                    return None;
                };
                let relation = slot.equation.relation();
                #[cfg(feature = "cranelift")]
                if jit {
                    if let Some(native) = slot.native(&expr) {
                        let trace = trace_native(&viewport, relation, native);
                        return Some(Curve { relation, trace });
                    }
                }
                let trace = trace_expr(&viewport, relation, &expr);
                Some(Curve { relation, trace })
            })
            .collect();

        Frame { grid, curves }
    }
}
