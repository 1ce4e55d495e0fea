use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Log,
    Exp,
    Abs,
}

impl Func {
    pub const fn get_func(&self) -> fn(f64) -> f64 {
        match self {
            Func::Sin => f64::sin,
            Func::Cos => f64::cos,
            Func::Tan => f64::tan,
            Func::Sqrt => f64::sqrt,
            // natural logarithm
            Func::Log => f64::ln,
            Func::Exp => f64::exp,
            Func::Abs => f64::abs,
        }
    }

    pub fn from_str(string: &str) -> Option<Self> {
        match string {
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tan" => Some(Func::Tan),
            "sqrt" => Some(Func::Sqrt),
            "log" | "ln" => Some(Func::Log),
            "exp" => Some(Func::Exp),
            "abs" => Some(Func::Abs),
            _ => None,
        }
    }

    pub fn evaluate(&self, num: f64) -> f64 {
        self.get_func()(num)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Sqrt => "sqrt",
            Func::Log => "log",
            Func::Exp => "exp",
            Func::Abs => "abs",
        }
    }
}

impl Display for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
