//! Expression evaluation for conditional and function-call tags
//!
//! A small lexer + recursive-descent parser + tree-walking evaluator over
//! [`Value`]. Identifiers resolve against the node's parameter scope; there
//! is no general code execution. Supported grammar, lowest precedence
//! first:
//!
//! ```text
//! or      := and ("||" and)*
//! and     := cmp ("&&" cmp)*
//! cmp     := add (("==" | "!=" | "<" | "<=" | ">" | ">=") add)?
//! add     := mul (("+" | "-") mul)*
//! mul     := unary (("*" | "/" | "%") unary)*
//! unary   := ("!" | "-") unary | primary
//! primary := literal | path | "(" or ")"
//! path    := ident ("." (ident | int))*
//! ```

use crate::scope::Scope;
use crate::value::Value;
use thiserror::Error;

/// Expression evaluation failures
///
/// Whether these are fatal or downgraded to warnings is decided by the
/// resolver that triggered the evaluation, per the strict-mode flag.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown identifier \"{0}\"")]
    UnknownIdentifier(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("type error: {0}")]
    Type(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    Null,
    LParen,
    RParen,
    Dot,
    Not,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            ' ' | '\t' | '\n' | '\r' => pos += 1,
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                pos += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                pos += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                pos += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                pos += 1;
            }
            '!' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    pos += 2;
                } else {
                    tokens.push(Token::Not);
                    pos += 1;
                }
            }
            '=' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::Eq);
                    pos += 2;
                } else {
                    return Err(EvalError::Syntax("single '=' is not an operator".into()));
                }
            }
            '<' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    pos += 2;
                } else {
                    tokens.push(Token::Lt);
                    pos += 1;
                }
            }
            '>' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    pos += 2;
                } else {
                    tokens.push(Token::Gt);
                    pos += 1;
                }
            }
            '&' => {
                if chars.get(pos + 1) == Some(&'&') {
                    tokens.push(Token::And);
                    pos += 2;
                } else {
                    return Err(EvalError::Syntax("single '&' is not an operator".into()));
                }
            }
            '|' => {
                if chars.get(pos + 1) == Some(&'|') {
                    tokens.push(Token::Or);
                    pos += 2;
                } else {
                    return Err(EvalError::Syntax("single '|' is not an operator".into()));
                }
            }
            '\'' | '"' => {
                let quote = c;
                pos += 1;
                let mut text = String::new();
                loop {
                    match chars.get(pos) {
                        None => {
                            return Err(EvalError::Syntax("unterminated string literal".into()));
                        }
                        Some(&ch) if ch == quote => {
                            pos += 1;
                            break;
                        }
                        Some(&'\\') => {
                            if let Some(&escaped) = chars.get(pos + 1) {
                                text.push(match escaped {
                                    'n' => '\n',
                                    't' => '\t',
                                    other => other,
                                });
                                pos += 2;
                            } else {
                                return Err(EvalError::Syntax(
                                    "unterminated string literal".into(),
                                ));
                            }
                        }
                        Some(&ch) => {
                            text.push(ch);
                            pos += 1;
                        }
                    }
                }
                tokens.push(Token::Str(text));
            }
            '0'..='9' => {
                let start = pos;
                let mut is_float = false;
                while pos < chars.len() {
                    let ch = chars[pos];
                    if ch.is_ascii_digit() {
                        pos += 1;
                    } else if ch == '.'
                        && !is_float
                        && chars.get(pos + 1).is_some_and(|d| d.is_ascii_digit())
                    {
                        is_float = true;
                        pos += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[start..pos].iter().collect();
                if is_float {
                    let f = text
                        .parse::<f64>()
                        .map_err(|_| EvalError::Syntax(format!("bad number \"{text}\"")))?;
                    tokens.push(Token::Float(f));
                } else {
                    let i = text
                        .parse::<i64>()
                        .map_err(|_| EvalError::Syntax(format!("bad number \"{text}\"")))?;
                    tokens.push(Token::Int(i));
                }
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(EvalError::Syntax(format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Path(Vec<String>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> Result<Expr, EvalError> {
        let expr = self.parse_or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(EvalError::Syntax(format!("unexpected token {token:?}"))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_cmp()?;
        while self.eat(&Token::And) {
            let right = self.parse_cmp()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<Expr, EvalError> {
        let left = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_add()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn parse_add(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_mul()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_mul(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::Float(f))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Null) => Ok(Expr::Literal(Value::Null)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                if self.eat(&Token::RParen) {
                    Ok(inner)
                } else {
                    Err(EvalError::Syntax("expected ')'".into()))
                }
            }
            Some(Token::Ident(name)) => {
                let mut segments = vec![name];
                while self.eat(&Token::Dot) {
                    match self.advance() {
                        Some(Token::Ident(seg)) => segments.push(seg),
                        Some(Token::Int(index)) => segments.push(index.to_string()),
                        other => {
                            return Err(EvalError::Syntax(format!(
                                "expected path segment, got {other:?}"
                            )));
                        }
                    }
                }
                Ok(Expr::Path(segments))
            }
            other => Err(EvalError::Syntax(format!(
                "expected expression, got {other:?}"
            ))),
        }
    }
}

fn eval_expr(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(segments) => {
            let first = &segments[0];
            let Some(base) = scope.get(first) else {
                return Err(EvalError::UnknownIdentifier(first.clone()));
            };
            let mut current = base.clone();
            for segment in &segments[1..] {
                current = match current {
                    Value::Object(map) => map.get(segment).cloned().unwrap_or(Value::Null),
                    Value::Array(items) => segment
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| items.get(i).cloned())
                        .unwrap_or(Value::Null),
                    _ => Value::Null,
                };
            }
            Ok(current)
        }
        Expr::Not(inner) => Ok(Value::Bool(!eval_expr(inner, scope)?.is_truthy())),
        Expr::Neg(inner) => {
            let value = eval_expr(inner, scope)?;
            match value {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(EvalError::Type(format!(
                    "cannot negate {}",
                    other.type_name()
                ))),
            }
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            let left = eval_expr(left, scope)?;
            if !left.is_truthy() {
                return Ok(left);
            }
            eval_expr(right, scope)
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let left = eval_expr(left, scope)?;
            if left.is_truthy() {
                return Ok(left);
            }
            eval_expr(right, scope)
        }
        Expr::Binary(op, left, right) => {
            let left = eval_expr(left, scope)?;
            let right = eval_expr(right, scope)?;
            eval_binary(*op, &left, &right)
        }
    }
}

fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(right))),
        BinaryOp::Ne => Ok(Value::Bool(!left.loose_eq(right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right)?;
            let result = match op {
                BinaryOp::Lt => ordering == std::cmp::Ordering::Less,
                BinaryOp::Le => ordering != std::cmp::Ordering::Greater,
                BinaryOp::Gt => ordering == std::cmp::Ordering::Greater,
                BinaryOp::Ge => ordering != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => {
            if let (Value::Int(a), Value::Int(b)) = (left, right) {
                return Ok(Value::Int(a.wrapping_add(*b)));
            }
            if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
                return Ok(Value::Float(a + b));
            }
            // String concatenation when either side is text
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                return Ok(Value::String(format!(
                    "{}{}",
                    left.interp_text(),
                    right.interp_text()
                )));
            }
            Err(EvalError::Type(format!(
                "cannot add {} and {}",
                left.type_name(),
                right.type_name()
            )))
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
                return Err(EvalError::Type(format!(
                    "arithmetic needs numbers, got {} and {}",
                    left.type_name(),
                    right.type_name()
                )));
            };
            match op {
                BinaryOp::Sub => {
                    if let (Value::Int(x), Value::Int(y)) = (left, right) {
                        Ok(Value::Int(x.wrapping_sub(*y)))
                    } else {
                        Ok(Value::Float(a - b))
                    }
                }
                BinaryOp::Mul => {
                    if let (Value::Int(x), Value::Int(y)) = (left, right) {
                        Ok(Value::Int(x.wrapping_mul(*y)))
                    } else {
                        Ok(Value::Float(a * b))
                    }
                }
                BinaryOp::Div => {
                    if b == 0.0 {
                        Err(EvalError::Type("division by zero".into()))
                    } else {
                        Ok(Value::Float(a / b))
                    }
                }
                BinaryOp::Rem => {
                    if b == 0.0 {
                        Err(EvalError::Type("modulo by zero".into()))
                    } else if let (Value::Int(x), Value::Int(y)) = (left, right) {
                        Ok(Value::Int(x.wrapping_rem(*y)))
                    } else {
                        Ok(Value::Float(a % b))
                    }
                }
                _ => unreachable!(),
            }
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops handled earlier"),
    }
}

fn compare(left: &Value, right: &Value) -> Result<std::cmp::Ordering, EvalError> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return a
            .partial_cmp(&b)
            .ok_or_else(|| EvalError::Type("cannot order NaN".into()));
    }
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    Err(EvalError::Type(format!(
        "cannot compare {} and {}",
        left.type_name(),
        right.type_name()
    )))
}

/// Evaluate an expression string against a scope
pub fn evaluate(input: &str, scope: &Scope) -> Result<Value, EvalError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Value::Null);
    }
    let tokens = tokenize(input)?;
    let ast = Parser::new(tokens).parse()?;
    eval_expr(&ast, scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn scope() -> Arc<Scope> {
        let mut vars = IndexMap::new();
        vars.insert("flag".to_string(), Value::Bool(true));
        vars.insert("count".to_string(), Value::Int(3));
        vars.insert("name".to_string(), Value::from("Al"));
        let mut user = IndexMap::new();
        user.insert("age".to_string(), Value::Int(40));
        vars.insert("user".to_string(), Value::Object(user));
        Scope::root(vars)
    }

    #[test]
    fn literals() {
        let s = scope();
        assert_eq!(evaluate("42", &s), Ok(Value::Int(42)));
        assert_eq!(evaluate("1.5", &s), Ok(Value::Float(1.5)));
        assert_eq!(evaluate("'hi'", &s), Ok(Value::from("hi")));
        assert_eq!(evaluate("true", &s), Ok(Value::Bool(true)));
        assert_eq!(evaluate("null", &s), Ok(Value::Null));
    }

    #[test]
    fn paths_and_identifiers() {
        let s = scope();
        assert_eq!(evaluate("count", &s), Ok(Value::Int(3)));
        assert_eq!(evaluate("user.age", &s), Ok(Value::Int(40)));
        // present base, missing leaf: null rather than an error
        assert_eq!(evaluate("user.missing", &s), Ok(Value::Null));
        assert_eq!(
            evaluate("nope", &s),
            Err(EvalError::UnknownIdentifier("nope".to_string()))
        );
    }

    #[test]
    fn comparisons_and_logic() {
        let s = scope();
        assert_eq!(evaluate("count == 3", &s), Ok(Value::Bool(true)));
        assert_eq!(evaluate("count > 5", &s), Ok(Value::Bool(false)));
        assert_eq!(evaluate("count >= 3 && flag", &s), Ok(Value::Bool(true)));
        assert_eq!(evaluate("!flag || count < 10", &s), Ok(Value::Bool(true)));
        assert_eq!(evaluate("name == 'Al'", &s), Ok(Value::Bool(true)));
    }

    #[test]
    fn short_circuit_skips_missing_identifiers() {
        let s = scope();
        // `nope` never evaluates because the left side decides
        assert_eq!(evaluate("flag || nope", &s), Ok(Value::Bool(true)));
        assert!(evaluate("!flag && nope", &s).is_ok());
    }

    #[test]
    fn arithmetic_and_concat() {
        let s = scope();
        assert_eq!(evaluate("count + 1", &s), Ok(Value::Int(4)));
        assert_eq!(evaluate("count * 2 - 1", &s), Ok(Value::Int(5)));
        assert_eq!(evaluate("10 / 4", &s), Ok(Value::Float(2.5)));
        assert_eq!(evaluate("'n=' + count", &s), Ok(Value::from("n=3")));
        assert!(matches!(evaluate("1 / 0", &s), Err(EvalError::Type(_))));
    }

    #[test]
    fn syntax_errors() {
        let s = scope();
        assert!(matches!(evaluate("count = 3", &s), Err(EvalError::Syntax(_))));
        assert!(matches!(evaluate("(count", &s), Err(EvalError::Syntax(_))));
        assert!(matches!(evaluate("'open", &s), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn parentheses_and_precedence() {
        let s = scope();
        assert_eq!(evaluate("(count + 1) * 2", &s), Ok(Value::Int(8)));
        assert_eq!(evaluate("count + 1 * 2", &s), Ok(Value::Int(5)));
    }
}
