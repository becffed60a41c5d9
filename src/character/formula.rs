//! 派生属性公式：一个只支持算术和白名单函数的小型表达式语言。
//!
//! 变量名绑定到角色的主属性值。支持 `+ - * /`、`**`（或 `^`）乘方、
//! 一元负号、括号，以及 `min max abs sqrt floor ceil round pow clamp`。

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use thiserror::Error;

/// 数据文件中的公式写法：权重表（线性加权和）或表达式字符串
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormulaSource {
    Weights(BTreeMap<String, f32>),
    Expression(String),
}

impl From<&str> for FormulaSource {
    fn from(text: &str) -> Self {
        FormulaSource::Expression(text.to_string())
    }
}

impl<const N: usize> From<[(&str, f32); N]> for FormulaSource {
    fn from(weights: [(&str, f32); N]) -> Self {
        FormulaSource::Weights(
            weights
                .into_iter()
                .map(|(name, weight)| (name.to_string(), weight))
                .collect(),
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("function `{name}` takes {expected} arguments, got {got}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("formula nests deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f32),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Power => "**".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, FormulaError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f32>()
                    .map_err(|_| FormulaError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Power);
                i += 2;
            }
            _ => {
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '^' => Token::Power,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    other => return Err(FormulaError::UnexpectedChar(other, i)),
                });
                i += 1;
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Min,
    Max,
    Abs,
    Sqrt,
    Floor,
    Ceil,
    Round,
    Pow,
    Clamp,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "min" => Function::Min,
            "max" => Function::Max,
            "abs" => Function::Abs,
            "sqrt" => Function::Sqrt,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "round" => Function::Round,
            "pow" => Function::Pow,
            "clamp" => Function::Clamp,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Function::Min => "min",
            Function::Max => "max",
            Function::Abs => "abs",
            Function::Sqrt => "sqrt",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Round => "round",
            Function::Pow => "pow",
            Function::Clamp => "clamp",
        }
    }

    fn check_arity(self, got: usize) -> Result<(), FormulaError> {
        let (ok, expected) = match self {
            Function::Min | Function::Max => (got >= 1, "at least 1"),
            Function::Abs | Function::Sqrt | Function::Floor | Function::Ceil | Function::Round => {
                (got == 1, "1")
            }
            Function::Pow => (got == 2, "2"),
            Function::Clamp => (got == 3, "3"),
        };
        if ok {
            Ok(())
        } else {
            Err(FormulaError::Arity {
                name: self.name(),
                expected,
                got,
            })
        }
    }

    fn apply(self, args: &[f32]) -> f32 {
        match self {
            Function::Min => args.iter().copied().fold(f32::INFINITY, f32::min),
            Function::Max => args.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Function::Abs => args[0].abs(),
            Function::Sqrt => args[0].sqrt(),
            Function::Floor => args[0].floor(),
            Function::Ceil => args[0].ceil(),
            Function::Round => args[0].round(),
            Function::Pow => args[0].powf(args[1]),
            Function::Clamp => args[0].max(args[1]).min(args[2]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f32),
    Var(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    fn evaluate(&self, lookup: &dyn Fn(&str) -> f32) -> f32 {
        match self {
            Expr::Number(value) => *value,
            Expr::Var(name) => lookup(name),
            Expr::Neg(inner) => -inner.evaluate(lookup),
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.evaluate(lookup), rhs.evaluate(lookup));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(function, args) => {
                let values: Vec<f32> = args.iter().map(|arg| arg.evaluate(lookup)).collect();
                function.apply(&values)
            }
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Var(name) => {
                out.insert(name.as_str());
            }
            Expr::Neg(inner) => inner.collect_variables(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|arg| arg.collect_variables(out)),
        }
    }
}

/// 括号、函数参数、一元运算的最大嵌套层数
const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// 递归下降前计数，超过上限直接报错而不是爆栈
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, FormulaError>,
    ) -> Result<T, FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, FormulaError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(FormulaError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(FormulaError::UnexpectedToken(token.describe()))
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        self.nested(Self::sum)
    }

    // expr := term (('+' | '-') term)*
    fn sum(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinOp::Add),
            Some(Token::Minus) => Some(BinOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinOp::Mul),
            Some(Token::Slash) => Some(BinOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        self.nested(Self::signed)
    }

    // unary := ('-' | '+') unary | power
    fn signed(&mut self) -> Result<Expr, FormulaError> {
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

    // power := atom ('**' unary)?   右结合，且比一元负号绑定更紧
    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Power) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, FormulaError> {
        match self.next()? {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) if self.peek() == Some(&Token::LParen) => {
                let function =
                    Function::lookup(&name).ok_or(FormulaError::UnknownFunction(name))?;
                self.pos += 1;
                let mut args = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.peek() == Some(&Token::Comma) {
                            self.pos += 1;
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RParen)?;
                function.check_arity(args.len())?;
                Ok(Expr::Call(function, args))
            }
            Token::Ident(name) => Ok(Expr::Var(name)),
            other => Err(FormulaError::UnexpectedToken(other.describe())),
        }
    }
}

/// 编译后的公式
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
}

impl Formula {
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let mut parser = Parser {
            tokens: tokenize(text)?,
            pos: 0,
            depth: 0,
        };
        let expr = parser.expr()?;
        if let Some(token) = parser.peek() {
            return Err(FormulaError::UnexpectedToken(token.describe()));
        }
        Ok(Self { expr })
    }

    /// 权重表 => `w1 * a + w2 * b + ...`
    pub fn from_weights(weights: &BTreeMap<String, f32>) -> Self {
        let expr = weights
            .iter()
            .map(|(name, weight)| {
                Expr::Binary(
                    BinOp::Mul,
                    Box::new(Expr::Number(*weight)),
                    Box::new(Expr::Var(name.clone())),
                )
            })
            .reduce(|acc, term| Expr::Binary(BinOp::Add, Box::new(acc), Box::new(term)))
            .unwrap_or(Expr::Number(0.0));
        Self { expr }
    }

    pub fn compile(source: &FormulaSource) -> Result<Self, FormulaError> {
        match source {
            FormulaSource::Weights(weights) => Ok(Self::from_weights(weights)),
            FormulaSource::Expression(text) => Self::parse(text),
        }
    }

    /// 公式引用到的变量名
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.expr.collect_variables(&mut out);
        out
    }

    /// 所有变量都必须是已知名字
    pub fn validate(&self, is_known: impl Fn(&str) -> bool) -> Result<(), FormulaError> {
        match self.variables().into_iter().find(|name| !is_known(name)) {
            Some(unknown) => Err(FormulaError::UnknownVariable(unknown.to_string())),
            None => Ok(()),
        }
    }

    /// 结果不是有限数（除以 0 等）时取 0
    pub fn evaluate(&self, lookup: impl Fn(&str) -> f32) -> f32 {
        let value = self.expr.evaluate(&lookup);
        if value.is_finite() { value } else { 0.0 }
    }
}
