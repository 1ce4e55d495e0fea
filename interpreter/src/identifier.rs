use std::fmt::Display;

/// A single-letter variable name.
///
/// Multi-letter runs in the source text are split into one identifier per
/// letter unless they spell a known function or constant, so `xy` is `x * y`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct Identifier(char);

impl Identifier {
    /// Horizontal world coordinate, swept per pixel column.
    pub const X: Identifier = Identifier('x');
    /// Vertical world coordinate.
    pub const Y: Identifier = Identifier('y');
    /// Time parameter.
    pub const T: Identifier = Identifier('t');

    pub const fn name(&self) -> char {
        self.0
    }
}

impl From<char> for Identifier {
    fn from(c: char) -> Self {
        Identifier(c)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
