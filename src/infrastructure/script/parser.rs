//! Snippet parser and checker.
//!
//! Parsing and checking happen in one pass: locals are resolved to slots,
//! builtin and method names and arities are validated, `_.field` is
//! checked against the bound kind's field schema and literal regexes are
//! compiled. Anything that fails here is a configuration error.

use std::collections::HashMap;

use regex::Regex;

use super::interpreter::Value;
use super::lexer::{tokenize, Pos, Token};
use crate::domain::errors::ScriptError;
use crate::domain::node_kind::NodeKind;

/// Name of the matched node inside a snippet.
pub const NODE_VARIABLE: &str = "_";

#[derive(Debug)]
pub enum Stmt {
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    ForEach {
        slot: usize,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Let {
        slot: usize,
        init: Expr,
    },
    Assign {
        slot: usize,
        value: Expr,
    },
    Return,
    Expr(Expr),
    Empty,
}

#[derive(Debug)]
pub struct Expr {
    pub pos: Pos,
    pub kind: ExprKind,
}

#[derive(Debug)]
pub enum ExprKind {
    Literal(Value),
    /// `_`
    Node,
    Local(usize),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Builtin(Builtin, Vec<Expr>),
    Method {
        receiver: Box<Expr>,
        method: Method,
        args: Vec<Expr>,
        /// Precompiled when the pattern is a literal.
        regex: Option<Regex>,
    },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
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

impl BinaryOp {
    fn from_token(token: &Token) -> Option<(BinaryOp, u8)> {
        Some(match token {
            Token::OrOr => (BinaryOp::Or, 1),
            Token::AndAnd => (BinaryOp::And, 2),
            Token::Eq => (BinaryOp::Eq, 3),
            Token::Ne => (BinaryOp::Ne, 3),
            Token::Lt => (BinaryOp::Lt, 4),
            Token::Le => (BinaryOp::Le, 4),
            Token::Gt => (BinaryOp::Gt, 4),
            Token::Ge => (BinaryOp::Ge, 4),
            Token::Plus => (BinaryOp::Add, 5),
            Token::Minus => (BinaryOp::Sub, 5),
            Token::Star => (BinaryOp::Mul, 6),
            Token::Slash => (BinaryOp::Div, 6),
            Token::Percent => (BinaryOp::Rem, 6),
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

/// Free functions callable from a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Println,
    Printf,
    Format,
    Resolve,
    ResolveType,
    Fail,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "print" => Builtin::Print,
            "println" => Builtin::Println,
            "printf" => Builtin::Printf,
            "format" => Builtin::Format,
            "resolve" => Builtin::Resolve,
            "resolveType" => Builtin::ResolveType,
            "fail" => Builtin::Fail,
            _ => return None,
        })
    }

    /// Inclusive bounds on the argument count; `None` means unbounded.
    fn arity(self) -> (usize, Option<usize>) {
        match self {
            Builtin::Println => (0, Some(1)),
            Builtin::Printf | Builtin::Format => (1, None),
            _ => (1, Some(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Location,
    Text,
    Kind,
    Length,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    ToLowerCase,
    ToUpperCase,
    Size,
    IsEmpty,
    Get,
    Join,
    ToString,
    Equals,
    IsNull,
}

const METHODS: &[(&str, Method)] = &[
    ("location", Method::Location),
    ("text", Method::Text),
    ("kind", Method::Kind),
    ("length", Method::Length),
    ("contains", Method::Contains),
    ("startsWith", Method::StartsWith),
    ("endsWith", Method::EndsWith),
    ("matches", Method::Matches),
    ("toLowerCase", Method::ToLowerCase),
    ("toUpperCase", Method::ToUpperCase),
    ("size", Method::Size),
    ("isEmpty", Method::IsEmpty),
    ("get", Method::Get),
    ("join", Method::Join),
    ("toString", Method::ToString),
    ("equals", Method::Equals),
    ("isNull", Method::IsNull),
];

impl Method {
    fn from_name(name: &str) -> Option<Method> {
        METHODS.iter().find(|(n, _)| *n == name).map(|(_, m)| *m)
    }

    pub fn name(self) -> &'static str {
        METHODS.iter().find(|(_, m)| *m == self).map_or("?", |(n, _)| n)
    }

    fn arity(self) -> usize {
        match self {
            Method::Contains
            | Method::StartsWith
            | Method::EndsWith
            | Method::Matches
            | Method::Get
            | Method::Join
            | Method::Equals => 1,
            _ => 0,
        }
    }
}

/// Anchors `pattern` so it must match the whole string.
pub fn full_match_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

/// A checked snippet.
#[derive(Debug)]
pub struct Program {
    pub body: Vec<Stmt>,
    /// Number of local slots the body needs.
    pub slots: usize,
}

pub fn parse_program(source: &str, kind: NodeKind) -> Result<Program, ScriptError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        current: 0,
        kind,
        scopes: vec![HashMap::new()],
        slots: 0,
    };
    let mut body = Vec::new();
    while *parser.peek() != Token::Eof {
        body.push(parser.statement()?);
    }
    Ok(Program { body, slots: parser.slots })
}

struct Parser {
    tokens: Vec<(Token, Pos)>,
    current: usize,
    kind: NodeKind,
    scopes: Vec<HashMap<String, usize>>,
    slots: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)].0
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.current + offset).min(self.tokens.len() - 1)].0
    }

    fn pos(&self) -> Pos {
        self.tokens[self.current.min(self.tokens.len() - 1)].1
    }

    fn advance(&mut self) -> (Token, Pos) {
        let entry = self.tokens[self.current.min(self.tokens.len() - 1)].clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        entry
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<Pos, ScriptError> {
        if self.check(&token) {
            return Ok(self.advance().1);
        }
        Err(self.unexpected(&format!("`{}`", token_text(&token))))
    }

    fn expect_ident(&mut self) -> Result<(String, Pos), ScriptError> {
        match self.advance() {
            (Token::Ident(name), pos) => Ok((name, pos)),
            (other, pos) => Err(pos.error(format!("expected identifier, found {}", other.describe()))),
        }
    }

    fn unexpected(&self, expected: &str) -> ScriptError {
        self.pos().error(format!("expected {}, found {}", expected, self.peek().describe()))
    }

    /// `;`, optional before `}` and at the end of the snippet.
    fn terminator(&mut self) -> Result<(), ScriptError> {
        if self.eat(&Token::Semicolon) || matches!(self.peek(), Token::RightBrace | Token::Eof) {
            return Ok(());
        }
        Err(self.unexpected("`;`"))
    }

    fn declare(&mut self, name: String, pos: Pos) -> Result<usize, ScriptError> {
        if name == NODE_VARIABLE {
            return Err(pos.error("`_` is reserved for the matched node"));
        }
        let slot = self.slots;
        self.slots += 1;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, slot);
        }
        Ok(slot)
    }

    fn lookup(&self, name: &str, pos: Pos) -> Result<usize, ScriptError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .ok_or_else(|| pos.error(format!("undefined variable `{}`", name)))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        match self.peek() {
            Token::LeftBrace => {
                self.advance();
                self.scopes.push(HashMap::new());
                let mut body = Vec::new();
                while !self.check(&Token::RightBrace) {
                    if self.check(&Token::Eof) {
                        self.scopes.pop();
                        return Err(self.unexpected("`}`"));
                    }
                    body.push(self.statement()?);
                }
                self.advance();
                self.scopes.pop();
                Ok(Stmt::Block(body))
            }
            Token::If => {
                self.advance();
                self.expect(Token::LeftParen)?;
                let condition = self.expression()?;
                self.expect(Token::RightParen)?;
                let then = Box::new(self.scoped_statement()?);
                let otherwise = if self.eat(&Token::Else) {
                    Some(Box::new(self.scoped_statement()?))
                } else {
                    None
                };
                Ok(Stmt::If { condition, then, otherwise })
            }
            Token::For => {
                self.advance();
                self.expect(Token::LeftParen)?;
                self.eat(&Token::Var);
                let (name, pos) = self.expect_ident()?;
                self.expect(Token::Colon)?;
                let iterable = self.expression()?;
                self.expect(Token::RightParen)?;
                self.scopes.push(HashMap::new());
                let loop_body = self.declare(name, pos).and_then(|slot| Ok((slot, self.statement()?)));
                self.scopes.pop();
                let (slot, body) = loop_body?;
                Ok(Stmt::ForEach { slot, iterable, body: Box::new(body) })
            }
            Token::Var => {
                self.advance();
                let (name, pos) = self.expect_ident()?;
                self.expect(Token::Assign)?;
                let init = self.expression()?;
                self.terminator()?;
                let slot = self.declare(name, pos)?;
                Ok(Stmt::Let { slot, init })
            }
            Token::Return => {
                self.advance();
                self.terminator()?;
                Ok(Stmt::Return)
            }
            Token::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            Token::Ident(_) if *self.peek_at(1) == Token::Assign => {
                let (name, pos) = self.expect_ident()?;
                if name == NODE_VARIABLE {
                    return Err(pos.error("cannot assign to `_`"));
                }
                let slot = self.lookup(&name, pos)?;
                self.advance();
                let value = self.expression()?;
                self.terminator()?;
                Ok(Stmt::Assign { slot, value })
            }
            _ => {
                let expr = self.expression()?;
                self.terminator()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// A branch body gets its own scope even without braces.
    fn scoped_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.scopes.push(HashMap::new());
        let stmt = self.statement();
        self.scopes.pop();
        stmt
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        let condition = self.binary(1)?;
        if !self.check(&Token::Question) {
            return Ok(condition);
        }
        let pos = self.advance().1;
        let then_value = self.expression()?;
        self.expect(Token::Colon)?;
        let else_value = self.expression()?;
        Ok(Expr {
            pos,
            kind: ExprKind::Conditional(Box::new(condition), Box::new(then_value), Box::new(else_value)),
        })
    }

    /// Precedence climbing over the left-associative binary operators.
    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ScriptError> {
        let mut lhs = self.unary()?;
        while let Some((op, precedence)) = BinaryOp::from_token(self.peek()) {
            if precedence < min_precedence {
                break;
            }
            let pos = self.advance().1;
            let rhs = self.binary(precedence + 1)?;
            lhs = Expr { pos, kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)) };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        let pos = self.advance().1;
        let operand = self.unary()?;
        Ok(Expr { pos, kind: ExprKind::Unary(op, Box::new(operand)) })
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            if self.check(&Token::Dot) {
                self.advance();
                let (name, pos) = self.expect_ident()?;
                if self.check(&Token::LeftParen) {
                    expr = self.method_call(expr, name, pos)?;
                } else {
                    if matches!(expr.kind, ExprKind::Node) && !self.kind.has_field(&name) {
                        return Err(pos.error(format!("{} has no field `{}`", self.kind, name)));
                    }
                    expr = Expr { pos, kind: ExprKind::Member(Box::new(expr), name) };
                }
            } else if self.check(&Token::LeftBracket) {
                let pos = self.advance().1;
                let index = self.expression()?;
                self.expect(Token::RightBracket)?;
                expr = Expr { pos, kind: ExprKind::Index(Box::new(expr), Box::new(index)) };
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ScriptError> {
        self.expect(Token::LeftParen)?;
        let mut args = Vec::new();
        if self.eat(&Token::RightParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::RightParen) {
                return Ok(args);
            }
            self.expect(Token::Comma)?;
        }
    }

    fn method_call(&mut self, receiver: Expr, name: String, pos: Pos) -> Result<Expr, ScriptError> {
        let method =
            Method::from_name(&name).ok_or_else(|| pos.error(format!("unknown method `{}`", name)))?;
        let args = self.arguments()?;
        if args.len() != method.arity() {
            return Err(pos.error(format!(
                "`{}` takes {} argument(s), found {}",
                name,
                method.arity(),
                args.len()
            )));
        }
        let regex = match (method, args.first()) {
            (Method::Matches, Some(Expr { kind: ExprKind::Literal(Value::Str(pattern)), pos })) => Some(
                full_match_regex(pattern)
                    .map_err(|e| pos.error(format!("invalid regular expression: {}", e)))?,
            ),
            _ => None,
        };
        Ok(Expr {
            pos,
            kind: ExprKind::Method { receiver: Box::new(receiver), method, args, regex },
        })
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let (token, pos) = self.advance();
        let literal = |value: Value| -> Result<Expr, ScriptError> { Ok(Expr { pos, kind: ExprKind::Literal(value) }) };
        match token {
            Token::Int(v) => literal(Value::Int(v)),
            Token::Float(v) => literal(Value::Float(v)),
            Token::Str(v) => literal(Value::Str(v)),
            Token::Char(v) => literal(Value::Char(v)),
            Token::True => literal(Value::Bool(true)),
            Token::False => literal(Value::Bool(false)),
            Token::Null => literal(Value::Null),
            Token::LeftParen => {
                let inner = self.expression()?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
            Token::Ident(name) if self.check(&Token::LeftParen) => {
                let builtin = Builtin::from_name(&name)
                    .ok_or_else(|| pos.error(format!("unknown function `{}`", name)))?;
                let args = self.arguments()?;
                let (min, max) = builtin.arity();
                if args.len() < min || max.is_some_and(|max| args.len() > max) {
                    return Err(pos.error(format!("wrong number of arguments to `{}`", name)));
                }
                Ok(Expr { pos, kind: ExprKind::Builtin(builtin, args) })
            }
            Token::Ident(name) if name == NODE_VARIABLE => Ok(Expr { pos, kind: ExprKind::Node }),
            Token::Ident(name) => {
                let slot = self.lookup(&name, pos)?;
                Ok(Expr { pos, kind: ExprKind::Local(slot) })
            }
            other => Err(pos.error(format!("expected expression, found {}", other.describe()))),
        }
    }
}

fn token_text(token: &Token) -> String {
    let described = token.describe();
    described.trim_matches('`').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str) -> Result<Program, ScriptError> {
        parse_program(source, NodeKind::MethodInvocation)
    }

    #[test]
    fn test_precedence() {
        let program = check("1 + 2 * 3 == 7 && !false").unwrap();
        let Stmt::Expr(expr) = &program.body[0] else { panic!("expression statement") };
        let ExprKind::Binary(BinaryOp::And, lhs, _) = &expr.kind else { panic!("&& at the root") };
        let ExprKind::Binary(BinaryOp::Eq, sum, _) = &lhs.kind else { panic!("== under &&") };
        let ExprKind::Binary(BinaryOp::Add, _, product) = &sum.kind else { panic!("+ under ==") };
        assert!(matches!(product.kind, ExprKind::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn test_locals_get_slots_and_scopes_end() {
        let program = check("var a = 1; { var b = a; b = 2 } for (x : _.arguments) println(x)").unwrap();
        assert_eq!(program.slots, 3);

        let err = check("{ var b = 1; } println(b)").unwrap_err();
        assert!(err.message.contains("undefined variable `b`"), "{}", err);
    }

    #[test]
    fn test_final_semicolon_is_optional() {
        assert!(check("println(_.methodName)").is_ok());
        assert!(check("if (true) { println(1) }").is_ok());
        let err = check("println(1) println(2)").unwrap_err();
        assert_eq!(err.column, 12);
    }

    #[test]
    fn test_field_schema_is_checked() {
        assert!(check("println(_.methodName + _.span.line)").is_ok());
        let err = check("println(_.fieldName)").unwrap_err();
        assert_eq!((err.line, err.column), (1, 11));
        assert!(err.message.contains("methodInvocation has no field `fieldName`"), "{}", err);

        // Abstract kinds only expose what all their concrete kinds share.
        assert!(parse_program("_.value", NodeKind::Literal).is_ok());
        assert!(parse_program("_.methodName", NodeKind::Rvalue).is_err());
    }

    #[test]
    fn test_unknown_names_and_arity() {
        assert!(check("frobnicate(1)").unwrap_err().message.contains("unknown function"));
        assert!(check("_.methodName.reverse()").unwrap_err().message.contains("unknown method"));
        assert!(check("_.methodName.startsWith()").unwrap_err().message.contains("takes 1"));
        assert!(check("println(1, 2)").unwrap_err().message.contains("wrong number"));
        assert!(check("_ = 1").unwrap_err().message.contains("cannot assign"));
    }

    #[test]
    fn test_literal_regex_is_compiled_up_front() {
        assert!(check(r#"_.methodName.matches("get[A-Z].*")"#).is_ok());
        let err = check(r#"_.methodName.matches("(")"#).unwrap_err();
        assert!(err.message.contains("invalid regular expression"), "{}", err);
    }
}
