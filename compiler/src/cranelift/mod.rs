use std::marker::PhantomData;

use anyhow::Error as AnyError;
use cranelift_codegen::{
    ir::{
        condcodes::FloatCC,
        types::{F64, I64},
        AbiParam, ExternalName, FuncRef, Function, InstBuilder, MemFlags, Signature, Value,
    },
    settings::{self, Configurable},
    Context,
};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module, ModuleError};
use interpreter::{unresolved_variable, EvalContext, Expr, Func, Identifier, Operator};
use tracing::debug;

/// Functions that are called into the host instead of lowered to an instruction.
pub const DEF_FUNCS: [Func; 5] = [Func::Sin, Func::Cos, Func::Tan, Func::Log, Func::Exp];

fn index_of(func: Func) -> usize {
    match func {
        Func::Sin => 0,
        Func::Cos => 1,
        Func::Tan => 2,
        Func::Log => 3,
        Func::Exp => 4,
        Func::Sqrt | Func::Abs => unreachable!("{func} is lowered to an instruction"),
    }
}

extern "C" fn host_sin(x: f64) -> f64 {
    x.sin()
}

extern "C" fn host_cos(x: f64) -> f64 {
    x.cos()
}

extern "C" fn host_tan(x: f64) -> f64 {
    x.tan()
}

extern "C" fn host_log(x: f64) -> f64 {
    Func::Log.evaluate(x)
}

extern "C" fn host_exp(x: f64) -> f64 {
    x.exp()
}

extern "C" fn host_pow(a: f64, b: f64) -> f64 {
    Operator::Pow.apply(a, b)
}

const POW_SYMBOL: &str = "host_pow";

fn symbol_name(func: Func) -> String {
    format!("host_{}", func.as_str())
}

fn host_address(func: Func) -> *const u8 {
    let f: extern "C" fn(f64) -> f64 = match func {
        Func::Sin => host_sin,
        Func::Cos => host_cos,
        Func::Tan => host_tan,
        Func::Log => host_log,
        Func::Exp => host_exp,
        Func::Sqrt | Func::Abs => unreachable!("{func} is lowered to an instruction"),
    };
    f as *const u8
}

fn backend(e: impl std::fmt::Display) -> ModuleError {
    ModuleError::Backend(AnyError::msg(e.to_string()))
}

#[derive(Clone)]
pub struct External<T> {
    pow: T,
    functions: [T; DEF_FUNCS.len()],
}

impl<T> External<T> {
    fn map<U>(self, mut map: impl FnMut(T) -> U) -> External<U> {
        External {
            pow: map(self.pow),
            functions: self.functions.map(|f| map(f)),
        }
    }
}

/// SSA values holding the three context variables inside generated code.
pub struct Slots {
    x: Value,
    y: Value,
    t: Value,
}

impl Slots {
    fn get(&self, id: Identifier) -> Option<Value> {
        match id {
            Identifier::X => Some(self.x),
            Identifier::Y => Some(self.y),
            Identifier::T => Some(self.t),
            _ => None,
        }
    }
}

struct JITContext {
    jit_module: JITModule,
    external: External<FuncId>,
    context: Context,
    function_sig: Signature,
    fn_builder_ctx: FunctionBuilderContext,
}

impl JITContext {
    fn new() -> Result<Self, ModuleError> {
        let mut flag_builder = settings::builder();
        flag_builder
            .set("use_colocated_libcalls", "false")
            .map_err(backend)?;
        flag_builder.set("is_pic", "false").map_err(backend)?;
        let isa = cranelift_native::builder()
            .map_err(backend)?
            .finish(settings::Flags::new(flag_builder))
            .map_err(backend)?;

        let mut jit_builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
        for func in DEF_FUNCS {
            jit_builder.symbol(symbol_name(func), host_address(func));
        }
        let pow_fn: extern "C" fn(f64, f64) -> f64 = host_pow;
        jit_builder.symbol(POW_SYMBOL, pow_fn as *const u8);

        let mut jit_module = JITModule::new(jit_builder);
        let mut pow_sig = jit_module.make_signature();
        pow_sig.returns.push(AbiParam::new(F64));
        pow_sig.params.push(AbiParam::new(F64));
        pow_sig.params.push(AbiParam::new(F64));
        let pow = jit_module.declare_function(POW_SYMBOL, Linkage::Import, &pow_sig)?;

        let mut f_sig = jit_module.make_signature();
        f_sig.returns.push(AbiParam::new(F64));
        f_sig.params.push(AbiParam::new(F64));
        let functions = DEF_FUNCS
            .iter()
            .map(|f| jit_module.declare_function(&symbol_name(*f), Linkage::Import, &f_sig))
            .collect::<Result<Vec<_>, _>>()?;
        let functions: [FuncId; DEF_FUNCS.len()] = functions
            .try_into()
            .map_err(|_| backend("host function table has the wrong length"))?;

        // (pointer to [x, y, t]) -> f64
        let mut function_sig = jit_module.make_signature();
        function_sig.params.push(AbiParam::new(I64));
        function_sig.returns.push(AbiParam::new(F64));
        let context = jit_module.make_context();

        Ok(Self {
            jit_module,
            external: External { pow, functions },
            context,
            function_sig,
            fn_builder_ctx: FunctionBuilderContext::new(),
        })
    }

    fn codegen(&mut self, expr: &Expr) -> Function {
        let mut func = Function::with_name_signature(
            ExternalName::User {
                namespace: 0,
                index: 0,
            },
            self.function_sig.clone(),
        );
        let external = self
            .external
            .clone()
            .map(|id| self.jit_module.declare_func_in_func(id, &mut func));

        let mut builder = FunctionBuilder::new(&mut func, &mut self.fn_builder_ctx);
        let header = builder.create_block();
        builder.append_block_params_for_function_params(header);
        builder.switch_to_block(header);
        builder.seal_block(header);

        let ctx = builder.block_params(header)[0];
        let mut load = |offset: i32| builder.ins().load(F64, MemFlags::trusted(), ctx, offset);
        let slots = Slots {
            x: load(0),
            y: load(8),
            t: load(16),
        };

        let val = expr.inline(&mut builder, &slots, &external);
        builder.ins().return_(&[val]);
        builder.seal_all_blocks();
        builder.finalize();

        func
    }

    fn get_addr(&mut self, expr: &Expr) -> Result<*const u8, ModuleError> {
        let func_id =
            self.jit_module
                .declare_function("expr", Linkage::Export, &self.function_sig)?;
        self.context.clear();
        self.context.func = self.codegen(expr);

        self.jit_module
            .define_function(func_id, &mut self.context)?;
        self.jit_module.clear_context(&mut self.context);
        self.jit_module.finalize_definitions();

        Ok(self.jit_module.get_finalized_function(func_id))
    }
}

pub trait CodeGen {
    fn inline(&self, builder: &mut FunctionBuilder, slots: &Slots, external: &External<FuncRef>)
        -> Value;
}

impl CodeGen for Expr {
    fn inline(
        &self,
        builder: &mut FunctionBuilder,
        slots: &Slots,
        external: &External<FuncRef>,
    ) -> Value {
        match self {
            Expr::Literal(n) => builder.ins().f64const(*n),
            Expr::Variable(id) => match slots.get(*id) {
                Some(value) => value,
                None => builder.ins().f64const(unresolved_variable(*id)),
            },
            Expr::Binary(op, a, b) => {
                let a = a.inline(builder, slots, external);
                let b = b.inline(builder, slots, external);
                match op {
                    Operator::Add => builder.ins().fadd(a, b),
                    Operator::Sub => builder.ins().fsub(a, b),
                    Operator::Mul => builder.ins().fmul(a, b),
                    Operator::Div => {
                        let quotient = builder.ins().fdiv(a, b);
                        let zero = builder.ins().f64const(0.0);
                        let is_zero = builder.ins().fcmp(FloatCC::Equal, b, zero);
                        let nan = builder.ins().f64const(f64::NAN);
                        builder.ins().select(is_zero, nan, quotient)
                    }
                    Operator::Pow => {
                        let c = builder.ins().call(external.pow, &[a, b]);
                        builder.func.dfg.first_result(c)
                    }
                }
            }
            Expr::Negate(operand) => {
                let v = operand.inline(builder, slots, external);
                builder.ins().fneg(v)
            }
            Expr::Call(f, arg) => {
                let arg = arg.inline(builder, slots, external);
                match f {
                    Func::Abs => builder.ins().fabs(arg),
                    Func::Sqrt => builder.ins().sqrt(arg),
                    f => {
                        let c = builder.ins().call(external.functions[index_of(*f)], &[arg]);
                        builder.func.dfg.first_result(c)
                    }
                }
            }
        }
    }
}

type RawFn = extern "C" fn(*const f64) -> f64;

/// Native code for one expression. The machine code lives as long as this value.
pub struct CompiledExpr {
    jit_module: Option<JITModule>,
    function: RawFn,
}

impl CompiledExpr {
    pub fn call(&self, ctx: &EvalContext) -> f64 {
        let values = ctx.to_array();
        (self.function)(values.as_ptr())
    }

    /// A `Copy + Send + Sync` handle for parallel sweeps.
    pub fn handle(&self) -> JitFn<'_> {
        JitFn {
            function: self.function,
            _code: PhantomData,
        }
    }
}

impl Drop for CompiledExpr {
    fn drop(&mut self) {
        if let Some(module) = self.jit_module.take() {
            // SAFETY: no `JitFn` can outlive `self`, so nothing can call into this code anymore.
            unsafe { module.free_memory() };
        }
    }
}

#[derive(Clone, Copy)]
pub struct JitFn<'a> {
    function: RawFn,
    _code: PhantomData<&'a ()>,
}

impl JitFn<'_> {
    pub fn call(&self, ctx: &EvalContext) -> f64 {
        let values = ctx.to_array();
        (self.function)(values.as_ptr())
    }
}

/// JIT-compiles `expr` into a function of `x`, `y` and `t` that matches
/// [`Expr::evaluate`] with an [`EvalContext`].
#[tracing::instrument(skip(expr), fields(depth = expr.depth()))]
pub fn compile(expr: &Expr) -> Result<CompiledExpr, ModuleError> {
    let mut context = JITContext::new()?;
    let addr = context.get_addr(expr)?;
    debug!("compiled expression to native code");
    // SAFETY: the function was defined with `function_sig`, one pointer
    // argument returning f64 in the host calling convention, and it only
    // reads three f64 values through that pointer.
    let function = unsafe { std::mem::transmute::<*const u8, RawFn>(addr) };
    Ok(CompiledExpr {
        jit_module: Some(context.jit_module),
        function,
    })
}
