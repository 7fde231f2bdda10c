// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! A small logical expression language.
//!
//! The grammar, from lowest to highest precedence:
//!
//! ```text
//! expr : term (("||" | "or" | "&&" | "and") term)*
//! term : prim (("==" | "!=" | "<" | "<=" | ">" | ">=") prim)?
//! prim : INT | STRING | NAME | "(" expr ")"
//! ```
//!
//! Names are substituted through a [`SymbolTable`]; a name with no binding
//! stands for itself. The connectives short-circuit and leave the unneeded
//! operand unread, so `1 || (bogus` is true.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./expr_test.rs"]
mod expr_test;

static TOKEN_DELIMITERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\w.+]+|\s+|==|!=|<=|>=|[()<>]").expect("token pattern is a valid regex")
});

/// A resolved operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// Parse integers, keep everything else as a string.
    pub fn from_token(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(i) => Self::Int(i),
            Err(_) => Self::Str(token.to_string()),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Int(i) => *i != 0,
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
        }
    }

    /// Total ordering across the variants.
    ///
    /// Booleans order as the integers 0 and 1, and every number orders
    /// before every string.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Str(_), _) => Ordering::Greater,
            (_, Self::Str(_)) => Ordering::Less,
            (a, b) => a.as_number().cmp(&b.as_number()),
        }
    }

    fn as_number(&self) -> i64 {
        match self {
            Self::Int(i) => *i,
            Self::Bool(b) => i64::from(*b),
            Self::Str(_) => 0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Name to value bindings consulted while evaluating an expression.
///
/// Lookups ignore case unless the table was built with
/// [`SymbolTable::case_sensitive`].
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Value>,
    case_sensitive: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_sensitive() -> Self {
        Self {
            symbols: HashMap::new(),
            case_sensitive: true,
        }
    }

    /// Bind `key` to `value`, replacing any earlier binding.
    pub fn define<K: AsRef<str>, V: Into<Value>>(&mut self, key: K, value: V) -> &mut Self {
        let key = self.normalize(key.as_ref());
        self.symbols.insert(key, value.into());
        self
    }

    /// Builder form of [`SymbolTable::define`].
    pub fn with<K: AsRef<str>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.define(key, value);
        self
    }

    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.symbols.get(&self.normalize(key))
    }

    /// Substitute a name token, integer-parsing the result.
    fn resolve(&self, token: &str) -> Value {
        match self.lookup(token) {
            Some(Value::Str(s)) => Value::from_token(s),
            Some(value) => value.clone(),
            None => Value::from_token(token),
        }
    }

    fn normalize(&self, key: &str) -> String {
        if self.case_sensitive {
            key.to_string()
        } else {
            key.to_lowercase()
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// Lexical classes of the tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Or,
    And,
    Cmp(CmpOp),
    LParen,
    RParen,
    Atom(String),
}

impl Token {
    fn classify(raw: &str) -> Self {
        match raw {
            "||" | "or" => Self::Or,
            "&&" | "and" => Self::And,
            "(" => Self::LParen,
            ")" => Self::RParen,
            _ => match CmpOp::parse(raw) {
                Some(op) => Self::Cmp(op),
                None => Self::Atom(raw.to_string()),
            },
        }
    }

    pub(crate) fn is_connective(&self) -> bool {
        matches!(self, Self::Or | Self::And)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Cmp(CmpOp::Eq) => "==",
            Self::Cmp(CmpOp::Ne) => "!=",
            Self::Cmp(CmpOp::Lt) => "<",
            Self::Cmp(CmpOp::Le) => "<=",
            Self::Cmp(CmpOp::Gt) => ">",
            Self::Cmp(CmpOp::Ge) => ">=",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Atom(a) => a,
        };
        f.write_str(text)
    }
}

/// Split an expression into tokens, dropping whitespace.
///
/// Runs of word characters (plus `.` and `+`), the two-character comparison
/// operators, `<`, `>` and the parentheses delimit tokens; any other text
/// between delimiters, such as `||`, is a token of its own.
pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in TOKEN_DELIMITERS.find_iter(source) {
        if m.start() > last {
            tokens.push(Token::classify(&source[last..m.start()]));
        }
        if !m.as_str().trim().is_empty() {
            tokens.push(Token::classify(m.as_str()));
        }
        last = m.end();
    }
    if last < source.len() {
        tokens.push(Token::classify(&source[last..]));
    }
    tokens
}

/// Orders two operands for the comparison operators.
pub trait Comparator {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Ordering;
}

/// The native ordering of [`Value::compare`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOrder;

impl Comparator for NativeOrder {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Ordering {
        lhs.compare(rhs)
    }
}

/// A tokenized expression that can be evaluated many times.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    tokens: Vec<Token>,
}

impl Expression {
    pub fn compile<S: Into<String>>(source: S) -> Self {
        let source = source.into();
        let tokens = tokenize(&source);
        Self { source, tokens }
    }

    pub(crate) fn from_tokens(source: String, tokens: Vec<Token>) -> Self {
        Self { source, tokens }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Evaluate against `symbols`; an empty expression is `false`.
    pub fn eval(&self, symbols: &SymbolTable) -> Result<Value> {
        self.eval_with(symbols, &NativeOrder)
    }

    /// Evaluate using a custom ordering for the comparison operators.
    pub fn eval_with(&self, symbols: &SymbolTable, order: &dyn Comparator) -> Result<Value> {
        if self.is_empty() {
            return Ok(Value::Bool(false));
        }
        let mut parser = Parser {
            source: &self.source,
            tokens: &self.tokens,
            pos: 0,
            symbols,
            order,
        };
        // || and && short circuit, so trailing tokens may remain unread
        Ok(parser.expr()?.unwrap_or(Value::Bool(false)))
    }

    pub fn is_true(&self, symbols: &SymbolTable) -> Result<bool> {
        Ok(self.eval(symbols)?.is_truthy())
    }
}

/// Compile and evaluate `source` in one step.
pub fn evaluate(source: &str, symbols: &SymbolTable) -> Result<Value> {
    Expression::compile(source).eval(symbols)
}

/// Single-use recursive descent evaluator with one token of pushback.
///
/// `None` operands stand for the end of input.
struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    symbols: &'a SymbolTable,
    order: &'a dyn Comparator,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn push_back(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    fn expr(&mut self) -> Result<Option<Value>> {
        let mut lhs = self.term()?;
        loop {
            match self.next() {
                Some(Token::Or) => {
                    if !is_truthy(&lhs) {
                        lhs = Some(self.operand("||", Self::term)?);
                    }
                }
                Some(Token::And) => {
                    if is_truthy(&lhs) {
                        lhs = Some(self.operand("&&", Self::term)?);
                    }
                }
                Some(_) => {
                    self.push_back();
                    return Ok(lhs);
                }
                None => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> Result<Option<Value>> {
        let Some(lhs) = self.prim()? else {
            return Ok(None);
        };
        match self.next() {
            Some(Token::Cmp(op)) => {
                let rhs = self.operand(&op_text(*op), Self::prim)?;
                let ordering = self.order.compare(&lhs, &rhs);
                Ok(Some(Value::Bool(op.holds(ordering))))
            }
            Some(_) => {
                self.push_back();
                Ok(Some(lhs))
            }
            None => Ok(Some(lhs)),
        }
    }

    fn prim(&mut self) -> Result<Option<Value>> {
        match self.next() {
            None => Ok(None),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(self.error(format!("saw \"{other}\" where ')' was expected"))),
                    None => Err(self.error("missing ')'")),
                }
            }
            Some(Token::Atom(atom)) => Ok(Some(self.symbols.resolve(atom))),
            Some(other) => Err(self.error(format!("unexpected \"{other}\""))),
        }
    }

    /// Parse the operand that must follow `after`.
    fn operand(
        &mut self,
        after: &str,
        parse: fn(&mut Self) -> Result<Option<Value>>,
    ) -> Result<Value> {
        parse(self)?.ok_or_else(|| self.error(format!("expected an operand after \"{after}\"")))
    }

    fn error<M: Into<String>>(&self, message: M) -> Error {
        Error::syntax(self.source, message)
    }
}

fn is_truthy(value: &Option<Value>) -> bool {
    value.as_ref().is_some_and(Value::is_truthy)
}

fn op_text(op: CmpOp) -> String {
    Token::Cmp(op).to_string()
}
