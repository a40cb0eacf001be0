use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Gas constant in J/(mol·K), as used by TDB model expressions.
pub const GAS_CONSTANT: f64 = 8.3145;

const MAX_SYMBOL_DEPTH: usize = 64;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("Invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unknown symbol '{0}'")]
    UnknownSymbol(String),
    #[error("Symbol '{0}' is defined in terms of itself")]
    CyclicSymbol(String),
    #[error("{function} is undefined for argument {argument}")]
    Domain {
        function: &'static str,
        argument: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Ln,
    Log,
    Exp,
    Sqrt,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "LN" => Some(Func::Ln),
            "LOG" => Some(Func::Log),
            "EXP" => Some(Func::Exp),
            "SQRT" => Some(Func::Sqrt),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Func::Ln => "LN",
            Func::Log => "LOG",
            Func::Exp => "EXP",
            Func::Sqrt => "SQRT",
        }
    }
}

/// Abstract syntax tree of a TDB arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Temperature,
    Pressure,
    GasConstant,
    Symbol(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Func,
        arg: Box<Expr>,
    },
}

impl Expr {
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(text)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.expression()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(ExprError::UnexpectedToken(tok.to_string())),
        }
    }
}

/// One temperature range of a [`Piecewise`] function.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub lower: f64,
    pub upper: f64,
    pub expr: Expr,
}

/// A temperature-piecewise function as written in FUNCTION and PARAMETER commands.
///
/// Segment ranges are half-open `[lower, upper)` except the last one, whose upper
/// bound is inclusive. Outside every range the function evaluates to zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Piecewise {
    pub segments: Vec<Segment>,
}

impl Piecewise {
    pub fn constant(value: f64, lower: f64, upper: f64) -> Self {
        Self {
            segments: vec![Segment {
                lower,
                upper,
                expr: Expr::Number(value),
            }],
        }
    }

    pub fn expr_at(&self, temperature: f64) -> Option<&Expr> {
        let last = self.segments.len().checked_sub(1)?;
        self.segments
            .iter()
            .enumerate()
            .find(|(i, seg)| {
                temperature >= seg.lower
                    && (temperature < seg.upper || (*i == last && temperature <= seg.upper))
            })
            .map(|(_, seg)| &seg.expr)
    }

    pub fn lower_limit(&self) -> Option<f64> {
        self.segments.first().map(|s| s.lower)
    }

    pub fn upper_limit(&self) -> Option<f64> {
        self.segments.last().map(|s| s.upper)
    }
}

/// State variables an expression is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVariables {
    pub temperature: f64,
    pub pressure: f64,
}

/// Evaluates expressions against a symbol table, optionally replacing some symbols
/// with caller-supplied values.
pub struct Evaluator<'a> {
    symbols: &'a BTreeMap<String, Piecewise>,
    overrides: Option<&'a HashMap<String, f64>>,
    state: StateVariables,
    segment_temperature: Option<f64>,
}

impl<'a> Evaluator<'a> {
    pub fn new(symbols: &'a BTreeMap<String, Piecewise>, state: StateVariables) -> Self {
        Self {
            symbols,
            overrides: None,
            state,
            segment_temperature: None,
        }
    }

    pub fn with_overrides(mut self, overrides: &'a HashMap<String, f64>) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Selects piecewise segments at `temperature` instead of the state temperature.
    ///
    /// The chosen expressions are still evaluated at the state temperature, so a
    /// finite-difference stencil around `temperature` stays on one analytic branch
    /// even when it crosses a range limit.
    pub fn with_segment_temperature(mut self, temperature: f64) -> Self {
        self.segment_temperature = Some(temperature);
        self
    }

    pub fn state(&self) -> StateVariables {
        self.state
    }

    pub fn piecewise(&self, function: &Piecewise) -> Result<f64, EvalError> {
        self.piecewise_inner(function, &mut Vec::new())
    }

    pub fn symbol(&self, name: &str) -> Result<f64, EvalError> {
        self.symbol_inner(name, &mut Vec::new())
    }

    pub fn expr(&self, expr: &Expr) -> Result<f64, EvalError> {
        self.expr_inner(expr, &mut Vec::new())
    }

    fn piecewise_inner(
        &self,
        function: &Piecewise,
        stack: &mut Vec<String>,
    ) -> Result<f64, EvalError> {
        let selector = self.segment_temperature.unwrap_or(self.state.temperature);
        match function.expr_at(selector) {
            Some(expr) => self.expr_inner(expr, stack),
            None => Ok(0.0),
        }
    }

    fn symbol_inner(&self, name: &str, stack: &mut Vec<String>) -> Result<f64, EvalError> {
        if let Some(value) = self.overrides.and_then(|o| o.get(name)) {
            return Ok(*value);
        }
        if stack.iter().any(|s| s == name) || stack.len() >= MAX_SYMBOL_DEPTH {
            return Err(EvalError::CyclicSymbol(name.to_string()));
        }
        let function = self
            .symbols
            .get(name)
            .ok_or_else(|| EvalError::UnknownSymbol(name.to_string()))?;
        stack.push(name.to_string());
        let value = self.piecewise_inner(function, stack);
        stack.pop();
        value
    }

    fn expr_inner(&self, expr: &Expr, stack: &mut Vec<String>) -> Result<f64, EvalError> {
        Ok(match expr {
            Expr::Number(v) => *v,
            Expr::Temperature => self.state.temperature,
            Expr::Pressure => self.state.pressure,
            Expr::GasConstant => GAS_CONSTANT,
            Expr::Symbol(name) => self.symbol_inner(name, stack)?,
            Expr::Neg(inner) => -self.expr_inner(inner, stack)?,
            Expr::Binary { op, lhs, rhs } => {
                let a = self.expr_inner(lhs, stack)?;
                let b = self.expr_inner(rhs, stack)?;
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call { func, arg } => {
                let x = self.expr_inner(arg, stack)?;
                match func {
                    Func::Ln | Func::Log if x <= 0.0 => {
                        return Err(EvalError::Domain {
                            function: func.name(),
                            argument: x,
                        });
                    }
                    Func::Sqrt if x < 0.0 => {
                        return Err(EvalError::Domain {
                            function: func.name(),
                            argument: x,
                        });
                    }
                    Func::Ln | Func::Log => x.ln(),
                    Func::Exp => x.exp(),
                    Func::Sqrt => x.sqrt(),
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    LParen,
    RParen,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(v) => write!(f, "{}", v),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Pow => write!(f, "**"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && matches!(chars[i], 'E' | 'e' | 'D' | 'd') {
                    let sign_offset = usize::from(matches!(chars.get(i + 1), Some('+' | '-')));
                    if chars
                        .get(i + 1 + sign_offset)
                        .is_some_and(|d| d.is_ascii_digit())
                    {
                        i += 1 + sign_offset;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let normalized = literal.replace(['D', 'd'], "E");
                let value = normalized
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                // Symbol references may carry a trailing '#'.
                if chars.get(i) == Some(&'#') {
                    i += 1;
                }
                tokens.push(Token::Ident(ident.to_ascii_uppercase()));
            }
            other => return Err(ExprError::UnexpectedChar { ch: other, offset: i }),
        }
    }
    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(ExprError::UnexpectedToken(tok.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ExprError> {
        match self.next() {
            Some(Token::Number(v)) => Ok(Expr::Number(v)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    let func =
                        Func::from_name(&name).ok_or(ExprError::UnknownFunction(name.clone()))?;
                    self.pos += 1;
                    let arg = self.expression()?;
                    self.expect(Token::RParen)?;
                    return Ok(Expr::Call {
                        func,
                        arg: Box::new(arg),
                    });
                }
                Ok(match name.as_str() {
                    "T" => Expr::Temperature,
                    "P" => Expr::Pressure,
                    "R" => Expr::GasConstant,
                    _ => Expr::Symbol(name),
                })
            }
            Some(tok) => Err(ExprError::UnexpectedToken(tok.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}
