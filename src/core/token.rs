//! Canonical expression tokens.
//!
//! The builder only ever writes canonical ASCII forms into the expression.
//! Cosmetic keypad symbols (`×`, `÷`, `−`) are accepted on input and mapped
//! to their canonical operator here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An operator or grouping mark that can be appended to an expression.
///
/// # Example
///
/// ```rust
/// use tally::core::Operator;
///
/// assert_eq!(Operator::from_symbol("×"), Some(Operator::Multiply));
/// assert_eq!(Operator::Multiply.token(), " * ");
/// assert!(!Operator::OpenGroup.is_binary());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    OpenGroup,
    CloseGroup,
}

impl Operator {
    /// Canonical ASCII symbol understood by the evaluation engine.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Power => "^",
            Self::OpenGroup => "(",
            Self::CloseGroup => ")",
        }
    }

    /// The text appended to the committed expression: the symbol
    /// surrounded by single spaces.
    pub fn token(&self) -> String {
        format!(" {} ", self.symbol())
    }

    /// Parse a canonical or cosmetic operator symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" | "−" => Some(Self::Subtract),
            "*" | "×" | "x" | "X" => Some(Self::Multiply),
            "/" | "÷" => Some(Self::Divide),
            "^" => Some(Self::Power),
            "(" => Some(Self::OpenGroup),
            ")" => Some(Self::CloseGroup),
            _ => None,
        }
    }

    /// True for the arithmetic operators that take two operands.
    pub fn is_binary(&self) -> bool {
        !matches!(self, Self::OpenGroup | Self::CloseGroup)
    }

    /// True if this operator may start an expression: unary minus or an
    /// opening grouping mark.
    pub fn may_lead(&self) -> bool {
        matches!(self, Self::Subtract | Self::OpenGroup)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A named function that opens a grouping when appended (`sin(`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Log,
    Ln,
    Abs,
    Exp,
}

impl Function {
    pub const ALL: [Function; 11] = [
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Asin,
        Self::Acos,
        Self::Atan,
        Self::Sqrt,
        Self::Log,
        Self::Ln,
        Self::Abs,
        Self::Exp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sqrt => "sqrt",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::Abs => "abs",
            Self::Exp => "exp",
        }
    }

    /// Function name followed by its opening grouping mark.
    pub fn token(&self) -> String {
        format!("{}(", self.name())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
