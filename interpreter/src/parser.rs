use std::{
    f64::consts,
    fmt::Display,
    ops::{Deref, RangeInclusive},
};

use thiserror::Error as ThisError;
use tracing::debug;

use crate::{identifier::Identifier, value::Expr, Func};

/// Deepest nesting of groups, unary operators and powers the parser accepts.
pub const MAX_DEPTH: usize = 128;
/// Longest token stream the parser accepts.
pub const MAX_TOKENS: usize = 2048;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '^' => Some(Operator::Pow),
            _ => None,
        }
    }

    pub const fn as_char(&self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Pow => '^',
        }
    }

    /// IEEE arithmetic, except that a zero divisor gives NaN.
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => {
                if b == 0.0 {
                    f64::NAN
                } else {
                    a / b
                }
            }
            Operator::Pow => a.powf(b),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Comparison an equation is written with; decides curve versus region.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Relation {
    #[default]
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Relation {
    const OPERATORS: [(&'static str, Relation); 4] = [
        ("<=", Relation::Le),
        (">=", Relation::Ge),
        ("<", Relation::Lt),
        (">", Relation::Gt),
    ];

    /// Strips a leading `y=`, `y<`, `y<=`, `y>`, `y>=`, `<`, `<=`, `>` or
    /// `>=` and returns the relation with the rest of the text.
    pub fn split(text: &str) -> (Relation, &str) {
        let text = text.trim_start();
        if let Some(rest) = text.strip_prefix('y').map(str::trim_start) {
            if let Some(rest) = rest.strip_prefix('=') {
                return (Relation::Eq, rest.trim_start());
            }
            if let Some(split) = Self::strip_operator(rest) {
                return split;
            }
        }
        Self::strip_operator(text).unwrap_or((Relation::Eq, text))
    }

    fn strip_operator(text: &str) -> Option<(Relation, &str)> {
        Self::OPERATORS.iter().find_map(|(prefix, relation)| {
            text.strip_prefix(prefix)
                .map(|rest| (*relation, rest.trim_start()))
        })
    }

    pub const fn is_strict(&self) -> bool {
        matches!(self, Relation::Lt | Relation::Gt)
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Eq => write!(f, "="),
            Relation::Lt => write!(f, "<"),
            Relation::Gt => write!(f, ">"),
            Relation::Le => write!(f, "<="),
            Relation::Ge => write!(f, ">="),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TokenKind {
    Number(f64),
    Identifier(Identifier),
    Operator(Operator),
    Ctrl(char),
    Function(Func),
}

impl TokenKind {
    /// Whether the token can begin a power, and so continue a term by
    /// implicit multiplication.
    fn starts_power(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::Identifier(_)
                | TokenKind::Function(_)
                | TokenKind::Ctrl('(')
        )
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    kind: TokenKind,
    span: RangeInclusive<usize>,
}

impl Token {
    pub fn span(&self) -> &RangeInclusive<usize> {
        &self.span
    }
}

impl Deref for Token {
    type Target = TokenKind;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

impl From<Identifier> for TokenKind {
    fn from(id: Identifier) -> Self {
        TokenKind::Identifier(id)
    }
}

impl From<f64> for TokenKind {
    fn from(num: f64) -> Self {
        TokenKind::Number(num)
    }
}

impl From<Func> for TokenKind {
    fn from(func: Func) -> Self {
        TokenKind::Function(func)
    }
}

impl From<Operator> for TokenKind {
    fn from(op: Operator) -> Self {
        TokenKind::Operator(op)
    }
}

/// Constants recognized inside a run of letters.
const CONSTANTS: [(&str, f64); 2] = [("pi", consts::PI), ("e", consts::E)];
/// Longest function or constant name.
const MAX_WORD_LEN: usize = 4;

/// Longest function or constant name at the start of `rest`.
fn known_word(rest: &[char]) -> Option<(usize, TokenKind)> {
    (1..=rest.len().min(MAX_WORD_LEN)).rev().find_map(|len| {
        let word: String = rest[..len].iter().collect();
        Func::from_str(&word)
            .map(TokenKind::Function)
            .or_else(|| {
                CONSTANTS
                    .iter()
                    .find(|(name, _)| *name == word)
                    .map(|(_, value)| TokenKind::Number(*value))
            })
            .map(|kind| (len, kind))
    })
}

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Syntax {
    #[error("unexpected character")]
    UnexpectedChar,
    #[error("invalid number")]
    InvalidNumber,
}

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Parse {
    #[error("expected `{0}`")]
    ExpectedToken(char),
    #[error("expected a value")]
    ExpectedValue,
    #[error("unexpected input after the expression")]
    TrailingInput,
    #[error("expression is nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Full {
    #[error("syntax error: {0}")]
    Syntax(#[from] Syntax),
    #[error("parse error: {0}")]
    Parse(#[from] Parse),
    #[error("empty expression")]
    Empty,
    #[error("expression is too long")]
    TooLong,
}

/// An error kind together with the character span it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct Error<T> {
    pub err: T,
    pub span: RangeInclusive<usize>,
}

impl<T> Error<T> {
    pub fn new(err: T, span: RangeInclusive<usize>) -> Self {
        Error { err, span }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Error<U> {
        Error {
            err: f(self.err),
            span: self.span,
        }
    }

    fn shifted(self, offset: usize) -> Self {
        Error {
            err: self.err,
            span: self.span.start() + offset..=self.span.end() + offset,
        }
    }
}

impl<T: Display> Display for Error<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at column {}", self.err, self.span.start() + 1)
    }
}

impl<T: std::fmt::Debug + Display> std::error::Error for Error<T> {}

pub type Errors = Vec<Error<Full>>;

pub struct TextParser {
    chars: Vec<char>,
    pos: usize,
    start_pos: usize,
    tokens: Vec<Token>,
    errors: Vec<Error<Syntax>>,
}

impl TextParser {
    pub fn new(s: &str) -> Self {
        TextParser {
            chars: s.chars().collect(),
            pos: 0,
            start_pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn start(&mut self) {
        self.start_pos = self.pos;
    }

    fn next(&mut self) -> Option<char> {
        if self.pos < self.chars.len() {
            self.pos += 1;
        }
        self.current()
    }

    /// Pushes a token covering everything consumed since `start`.
    fn token(&mut self, token: impl Into<TokenKind>) {
        self.tokens.push(Token {
            kind: token.into(),
            span: self.start_pos..=self.pos.saturating_sub(1).max(self.start_pos),
        });
    }

    fn error(&mut self, kind: Syntax) {
        self.errors.push(Error {
            err: kind,
            span: self.start_pos..=self.pos.saturating_sub(1).max(self.start_pos),
        });
    }

    fn skip_digits(&mut self) -> usize {
        let mut count = 0;
        while self.current().map_or(false, |c| c.is_ascii_digit()) {
            self.next();
            count += 1;
        }
        count
    }

    fn parse_number(&mut self) {
        let mut digits = self.skip_digits();
        if self.current() == Some('.') {
            self.next();
            digits += self.skip_digits();
        }
        // `e` only belongs to the number when an exponent actually follows,
        // otherwise it is Euler's number multiplied in.
        if matches!(self.current(), Some('e' | 'E')) {
            let sign = matches!(self.peek(1), Some('+' | '-')) as usize;
            if self.peek(1 + sign).map_or(false, |c| c.is_ascii_digit()) {
                self.next();
                if sign == 1 {
                    self.next();
                }
                self.skip_digits();
            }
        }
        let text: String = self.chars[self.start_pos..self.pos].iter().collect();
        if digits == 0 || self.current() == Some('.') {
            while self
                .current()
                .map_or(false, |c| c.is_ascii_digit() || c == '.')
            {
                self.next();
            }
            self.error(Syntax::InvalidNumber);
            return;
        }
        match text.parse::<f64>() {
            Ok(num) => self.token(num),
            Err(_) => self.error(Syntax::InvalidNumber),
        }
    }

    fn parse_word(&mut self) {
        let word_start = self.pos;
        while self.current().map_or(false, char::is_alphabetic) {
            self.next();
        }
        let word_end = self.pos;
        let mut pos = word_start;
        while pos < word_end {
            let rest = &self.chars[pos..word_end];
            let (len, kind) = known_word(rest)
                .unwrap_or((1, TokenKind::Identifier(Identifier::from(rest[0]))));
            self.tokens.push(Token {
                kind,
                span: pos..=pos + len - 1,
            });
            pos += len;
        }
    }

    fn parse_raw(&mut self) {
        #[cfg(feature = "tracy")]
        profiling::scope!("TextParser::parse_raw");
        while let Some(current) = self.current() {
            if current.is_whitespace() {
                self.next();
                continue;
            }
            self.start();
            if current.is_ascii_digit() || current == '.' {
                self.parse_number();
            } else if current.is_alphabetic() {
                self.parse_word();
            } else if let Some(op) = Operator::from_char(current) {
                self.next();
                self.token(op);
            } else if current == '(' || current == ')' {
                self.next();
                self.token(TokenKind::Ctrl(current));
            } else {
                self.next();
                self.error(Syntax::UnexpectedChar);
            }
        }
    }

    pub fn parse(mut self) -> Result<Vec<Token>, Vec<Error<Syntax>>> {
        self.parse_raw();
        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }
}

/// Recursive-descent parser over a token stream.
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := power (('*' | '/') power | power)*
/// power  := factor ('^' power)?
/// factor := number | variable | '(' expr ')' | '-' factor | '+' factor | function factor
/// ```
#[derive(Debug)]
pub struct TokenParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> TokenParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, kind: Parse) -> Error<Parse> {
        let span = match (self.tokens.get(self.pos), self.tokens.last()) {
            (Some(token), _) => token.span.clone(),
            (None, Some(last)) => last.span.end() + 1..=last.span.end() + 1,
            (None, None) => 0..=0,
        };
        Error { err: kind, span }
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) {
        self.pos += 1;
    }

    fn operator(&self) -> Option<Operator> {
        match self.current().map(|t| t.kind) {
            Some(TokenKind::Operator(op)) => Some(op),
            _ => None,
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, Error<Parse>>,
    ) -> Result<T, Error<Parse>> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(Parse::TooDeep));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_expr(&mut self) -> Result<Expr, Error<Parse>> {
        let mut left = self.parse_term()?;
        while let Some(op @ (Operator::Add | Operator::Sub)) = self.operator() {
            self.next();
            let right = self.parse_term()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, Error<Parse>> {
        let mut left = self.parse_power()?;
        loop {
            match self.operator() {
                Some(op @ (Operator::Mul | Operator::Div)) => {
                    self.next();
                    let right = self.parse_power()?;
                    left = Expr::binary(op, left, right);
                }
                Some(_) => break,
                None if self.current().map_or(false, |t| t.starts_power()) => {
                    let right = self.parse_power()?;
                    left = Expr::binary(Operator::Mul, left, right);
                }
                None => break,
            }
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Expr, Error<Parse>> {
        self.nested(|p| {
            let base = p.parse_factor()?;
            if p.operator() == Some(Operator::Pow) {
                p.next();
                let exponent = p.parse_power()?;
                return Ok(Expr::binary(Operator::Pow, base, exponent));
            }
            Ok(base)
        })
    }

    fn parse_factor(&mut self) -> Result<Expr, Error<Parse>> {
        let Some(token) = self.current() else {
            return Err(self.error(Parse::ExpectedValue));
        };
        match token.kind {
            TokenKind::Number(num) => {
                self.next();
                Ok(Expr::Literal(num))
            }
            TokenKind::Identifier(id) => {
                self.next();
                Ok(Expr::Variable(id))
            }
            TokenKind::Operator(Operator::Sub) => {
                self.next();
                self.nested(|p| p.parse_factor().map(Expr::negate))
            }
            TokenKind::Operator(Operator::Add) => {
                self.next();
                self.nested(|p| p.parse_factor())
            }
            TokenKind::Function(func) => {
                self.next();
                self.nested(|p| p.parse_factor().map(|arg| Expr::call(func, arg)))
            }
            TokenKind::Ctrl('(') => {
                self.next();
                let inner = self.nested(|p| p.parse_expr())?;
                match self.current().map(|t| t.kind) {
                    Some(TokenKind::Ctrl(')')) => {
                        self.next();
                        Ok(inner)
                    }
                    _ => Err(self.error(Parse::ExpectedToken(')'))),
                }
            }
            _ => Err(self.error(Parse::ExpectedValue)),
        }
    }

    pub fn parse(mut self) -> Result<Expr, Error<Parse>> {
        let expr = self.parse_expr()?;
        if self.current().is_some() {
            return Err(self.error(Parse::TrailingInput));
        }
        Ok(expr)
    }
}

/// Compiles an expression with no relation prefix.
pub fn compile(text: &str) -> Result<Expr, Errors> {
    let tokens = TextParser::new(text).parse().map_err(|e| {
        e.into_iter()
            .map(|e| e.map(Full::Syntax))
            .collect::<Vec<_>>()
    })?;
    if tokens.is_empty() {
        let end = text.chars().count().saturating_sub(1);
        return Err(vec![Error::new(Full::Empty, 0..=end)]);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(vec![Error::new(Full::TooLong, tokens[MAX_TOKENS].span.clone())]);
    }
    TokenParser::new(&tokens)
        .parse()
        .map_err(|e| vec![e.map(Full::Parse)])
}

/// Strips the relation prefix and compiles the rest.
///
/// Error spans are reported relative to the full `text`.
pub fn compile_equation(text: &str) -> (Relation, Result<Expr, Errors>) {
    let (relation, rest) = Relation::split(text);
    let offset = text.chars().count() - rest.chars().count();
    let result = compile(rest).map_err(|errors| {
        debug!(text, errors = errors.len(), "equation failed to compile");
        errors.into_iter().map(|e| e.shifted(offset)).collect()
    });
    (relation, result)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{EvalContext, IntoDefines};

    fn eval(text: &str, x: f64) -> f64 {
        compile(text).unwrap().evaluate(&EvalContext::at(x))
    }

    fn kinds(text: &str) -> Vec<TokenKind> {
        TextParser::new(text)
            .parse()
            .unwrap()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn simple_statements() {
        assert_eq!(
            eval("2 * cos(0.5) + 2 * 3 ^ 2", 0.0),
            2.0 * 0.5f64.cos() + 2.0 * 3.0f64.powf(2.0)
        );
        for x in -10..=10 {
            let x = x as f64 / 10.0;
            assert_eq!(
                compile("2 * cos(x) + 2 * x ^ 2").unwrap().evaluate(&('x', x).def()),
                2.0 * x.cos() + 2.0 * x.powf(2.0)
            );
        }
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("2+3*4", 0.0), 14.0);
        assert_eq!(eval("2^3^2", 0.0), 512.0);
        assert_eq!(eval("8/4/2", 0.0), 1.0);
        assert_eq!(eval("10-4-3", 0.0), 3.0);
        assert_eq!(eval("(2+3)*4", 0.0), 20.0);
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(eval("2x", 3.0), 6.0);
        assert_eq!(eval("x(x+1)", 2.0), 6.0);
        assert_eq!(eval("2sin(x)", 1.0), 2.0 * 1.0f64.sin());
        assert_eq!(eval("(x+1)(x-1)", 3.0), 8.0);
        assert_eq!(eval("3x^2", 2.0), 12.0);
        assert_eq!(eval("2 -x", 5.0), -3.0);
        assert_eq!(eval("2pi", 0.0), 2.0 * consts::PI);
    }

    #[test]
    fn unary_minus_binds_to_factor() {
        assert_eq!(eval("-3", 0.0), -3.0);
        assert_eq!(eval("--3", 0.0), 3.0);
        assert_eq!(eval("-x^2", 3.0), 9.0);
        assert_eq!(eval("2*-x", 3.0), -6.0);
        assert_eq!(eval("+x", 3.0), 3.0);
    }

    #[test]
    fn functions_without_parentheses() {
        assert_eq!(eval("sin x", 0.5), 0.5f64.sin());
        assert_eq!(eval("sinx", 0.5), 0.5f64.sin());
        assert_eq!(eval("sqrt 16", 0.0), 4.0);
        assert_eq!(eval("log(e)", 0.0), 1.0);
        assert_eq!(eval("ln e", 0.0), 1.0);
        assert_eq!(eval("exp 0", 0.0), 1.0);
        assert_eq!(eval("abs(-x)", 2.0), 2.0);
        assert_eq!(eval("tan 0", 0.0), 0.0);
    }

    #[test]
    fn division_by_zero() {
        assert!(eval("1/x", 0.0).is_nan());
        assert!(eval("1/(x-x)", 7.0).is_nan());
    }

    #[test]
    fn number_forms() {
        assert_eq!(eval(".5", 0.0), 0.5);
        assert_eq!(eval("5.", 0.0), 5.0);
        assert_eq!(eval("1e3", 0.0), 1000.0);
        assert_eq!(eval("2.5e-1", 0.0), 0.25);
        assert_eq!(eval("2e", 0.0), 2.0 * consts::E);
        assert_eq!(eval("2ex", 1.0), 2.0 * consts::E);
    }

    #[test]
    fn letter_runs_split_into_words() {
        assert_eq!(
            kinds("xsin"),
            vec![
                TokenKind::Identifier(Identifier::X),
                TokenKind::Function(Func::Sin)
            ]
        );
        assert_eq!(
            kinds("xy"),
            vec![
                TokenKind::Identifier(Identifier::X),
                TokenKind::Identifier(Identifier::Y)
            ]
        );
        assert_eq!(kinds("exp"), vec![TokenKind::Function(Func::Exp)]);
        assert_eq!(kinds("pi"), vec![TokenKind::Number(consts::PI)]);
        assert_eq!(
            kinds("lnex"),
            vec![
                TokenKind::Function(Func::Log),
                TokenKind::Number(consts::E),
                TokenKind::Identifier(Identifier::X)
            ]
        );
        assert_eq!(
            kinds("sqrtpi"),
            vec![TokenKind::Function(Func::Sqrt), TokenKind::Number(consts::PI)]
        );
    }

    #[test]
    fn token_spans() {
        let tokens = TextParser::new("12 + sin(x)").parse().unwrap();
        let spans: Vec<_> = tokens.iter().map(|t| t.span().clone()).collect();
        assert_eq!(spans, vec![0..=1, 3..=3, 5..=7, 8..=8, 9..=9, 10..=10]);
    }

    #[test]
    fn unknown_variables_compile() {
        let expr = compile("a + b").unwrap();
        assert_eq!(expr.evaluate(&HashMap::<Identifier, f64>::new()), 0.0);
        assert_eq!(expr.evaluate(&[('a', 1.0), ('b', 2.0)].as_slice().def()), 3.0);
    }

    #[test]
    fn malformed_input_is_an_error() {
        let full = |text: &str| -> Vec<Full> {
            compile(text).unwrap_err().into_iter().map(|e| e.err).collect()
        };
        assert_eq!(full(""), vec![Full::Empty]);
        assert_eq!(full("   "), vec![Full::Empty]);
        assert_eq!(full("2 $ 3"), vec![Full::Syntax(Syntax::UnexpectedChar)]);
        assert_eq!(
            full("1 # 2 @"),
            vec![
                Full::Syntax(Syntax::UnexpectedChar),
                Full::Syntax(Syntax::UnexpectedChar)
            ]
        );
        assert_eq!(full("(x + 1"), vec![Full::Parse(Parse::ExpectedToken(')'))]);
        assert_eq!(full("x + 1)"), vec![Full::Parse(Parse::TrailingInput)]);
        assert_eq!(full("2 +"), vec![Full::Parse(Parse::ExpectedValue)]);
        assert_eq!(full("*2"), vec![Full::Parse(Parse::ExpectedValue)]);
        assert_eq!(full("()"), vec![Full::Parse(Parse::ExpectedValue)]);
        assert_eq!(full("sin"), vec![Full::Parse(Parse::ExpectedValue)]);
        assert_eq!(full("1.2.3"), vec![Full::Syntax(Syntax::InvalidNumber)]);
        assert_eq!(full("."), vec![Full::Syntax(Syntax::InvalidNumber)]);
    }

    #[test]
    fn error_spans_point_at_problem() {
        let errors = compile("2 $ 3").unwrap_err();
        assert_eq!(errors[0].span, 2..=2);
        assert_eq!(errors[0].to_string(), "syntax error: unexpected character at column 3");

        let errors = compile("(x + 1").unwrap_err();
        assert_eq!(errors[0].span, 6..=6);
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}x{}", "(".repeat(MAX_DEPTH * 2), ")".repeat(MAX_DEPTH * 2));
        assert_eq!(
            compile(&deep).unwrap_err()[0].err,
            Full::Parse(Parse::TooDeep)
        );
        let minus = format!("{}x", "-".repeat(MAX_DEPTH * 2));
        assert_eq!(
            compile(&minus).unwrap_err()[0].err,
            Full::Parse(Parse::TooDeep)
        );
        let shallow = format!("{}x{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(eval(&shallow, 4.0), 4.0);
    }

    #[test]
    fn token_count_is_bounded() {
        let long = vec!["1"; MAX_TOKENS].join("+");
        assert_eq!(compile(&long).unwrap_err()[0].err, Full::TooLong);
    }

    #[test]
    fn relation_prefixes() {
        assert_eq!(Relation::split("y<=x^2"), (Relation::Le, "x^2"));
        assert_eq!(Relation::split("y>=x"), (Relation::Ge, "x"));
        assert_eq!(Relation::split("y<x"), (Relation::Lt, "x"));
        assert_eq!(Relation::split("y>x"), (Relation::Gt, "x"));
        assert_eq!(Relation::split("y=  x"), (Relation::Eq, "x"));
        assert_eq!(Relation::split(">2x"), (Relation::Gt, "2x"));
        assert_eq!(Relation::split("<= 1"), (Relation::Le, "1"));
        assert_eq!(Relation::split("  y < 3"), (Relation::Lt, "3"));
        assert_eq!(Relation::split("x^2"), (Relation::Eq, "x^2"));
        assert_eq!(Relation::split("y+1"), (Relation::Eq, "y+1"));
    }

    #[test]
    fn compile_equation_strips_relation() {
        let (relation, expr) = compile_equation("y<=x^2");
        assert_eq!(relation, Relation::Le);
        assert_eq!(expr.unwrap(), compile("x^2").unwrap());

        let (relation, expr) = compile_equation(">2x");
        assert_eq!(relation, Relation::Gt);
        assert_eq!(expr.unwrap().evaluate(&EvalContext::at(4.0)), 8.0);

        let (relation, expr) = compile_equation("y = $");
        assert_eq!(relation, Relation::Eq);
        assert_eq!(expr.unwrap_err()[0].span, 4..=4);
    }

    #[test]
    fn relation_display_and_strictness() {
        assert_eq!(Relation::Le.to_string(), "<=");
        assert!(Relation::Lt.is_strict());
        assert!(!Relation::Ge.is_strict());
    }
}
