//! Snippet evaluation.
//!
//! Nodes are seen as structured values (their serialized form): objects
//! whose `kind` and `span` keys identify them as nodes. Printing a node
//! prints the source text its span covers.

use std::cmp::Ordering;

use serde_json::{Map, Value as Json};

use super::format;
use super::parser::{full_match_regex, BinaryOp, Builtin, Expr, ExprKind, Method, Stmt, UnaryOp};
use crate::domain::ast::Span;
use crate::domain::errors::ActionError;
use crate::domain::traverser::ActionContext;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    List(Vec<Value>),
    Object(Map<String, Json>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(map) if node_span(map).is_some() => "node",
            Value::Object(_) => "object",
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Object(map),
        }
    }
}

/// The span of a node value; `None` for values that are not nodes.
fn node_span(map: &Map<String, Json>) -> Option<Span> {
    map.get("kind")?.as_str()?;
    let span = map.get("span")?.as_object()?;
    let field = |name: &str| span.get(name).and_then(Json::as_u64).map(|v| v as usize);
    Some(Span {
        line: field("line")?,
        column: field("column")?,
        start: field("start")?,
        end: field("end")?,
    })
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => (*x as f64) == *y,
        _ => a == b,
    }
}

enum Flow {
    Normal,
    Return,
}

type Eval<T> = Result<T, ActionError>;

pub struct Interpreter<'c, 'a> {
    cx: &'c mut ActionContext<'a>,
    node: Value,
    node_span: Span,
    locals: Vec<Value>,
}

impl<'c, 'a> Interpreter<'c, 'a> {
    pub fn new(cx: &'c mut ActionContext<'a>, node: Value, node_span: Span, slots: usize) -> Self {
        Interpreter { cx, node, node_span, locals: vec![Value::Null; slots] }
    }

    pub fn run(&mut self, body: &[Stmt]) -> Eval<()> {
        for stmt in body {
            if let Flow::Return = self.exec(stmt)? {
                break;
            }
        }
        Ok(())
    }

    /// Runtime faults are reported at the matched node.
    fn fault(&self, message: impl Into<String>) -> ActionError {
        ActionError::fault(self.cx.location(&self.node_span), message)
    }

    fn text_of(&self, span: &Span) -> String {
        self.cx.text(span).to_string()
    }

    /// How `print` and string concatenation render a value.
    pub fn display(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Char(c) => c.to_string(),
            Value::Str(s) => s.clone(),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| self.display(v)).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Object(map) => match node_span(map) {
                Some(span) => self.text_of(&span),
                None => Json::Object(map.clone()).to_string(),
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn exec(&mut self, stmt: &Stmt) -> Eval<Flow> {
        match stmt {
            Stmt::Block(body) => {
                for stmt in body {
                    if let Flow::Return = self.exec(stmt)? {
                        return Ok(Flow::Return);
                    }
                }
            }
            Stmt::If { condition, then, otherwise } => {
                if self.condition(condition)? {
                    return self.exec(then);
                }
                if let Some(otherwise) = otherwise {
                    return self.exec(otherwise);
                }
            }
            Stmt::ForEach { slot, iterable, body } => {
                let items = match self.eval(iterable)? {
                    Value::List(items) => items,
                    Value::Str(s) => s.chars().map(Value::Char).collect(),
                    Value::Null => return Err(self.fault("cannot iterate over null")),
                    other => return Err(self.fault(format!("cannot iterate over {}", other.type_name()))),
                };
                for item in items {
                    self.locals[*slot] = item;
                    if let Flow::Return = self.exec(body)? {
                        return Ok(Flow::Return);
                    }
                }
            }
            Stmt::Let { slot, init } | Stmt::Assign { slot, value: init } => {
                let value = self.eval(init)?;
                self.locals[*slot] = value;
            }
            Stmt::Return => return Ok(Flow::Return),
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
            Stmt::Empty => {}
        }
        Ok(Flow::Normal)
    }

    fn condition(&mut self, expr: &Expr) -> Eval<bool> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(self.fault(format!("condition must be boolean, found {}", other.type_name()))),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    fn eval(&mut self, expr: &Expr) -> Eval<Value> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Node => Ok(self.node.clone()),
            ExprKind::Local(slot) => Ok(self.locals[*slot].clone()),
            // `_.field` copies the field, not the whole node.
            ExprKind::Member(target, name) if matches!(target.kind, ExprKind::Node) => match &self.node {
                Value::Object(map) => match map.get(name.as_str()) {
                    Some(json) => Ok(Value::from(json.clone())),
                    None => Err(self.fault(format!("node has no field `{}`", name))),
                },
                _ => Err(self.fault(format!("cannot read `{}` of {}", name, self.node.type_name()))),
            },
            ExprKind::Member(target, name) => {
                let target = self.eval(target)?;
                self.member(target, name)
            }
            ExprKind::Index(target, index) => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                self.index(target, index)
            }
            ExprKind::Builtin(builtin, args) => {
                let args = args.iter().map(|a| self.eval(a)).collect::<Eval<Vec<_>>>()?;
                self.builtin(*builtin, args)
            }
            ExprKind::Method { receiver, method, args, regex } => {
                let receiver = self.eval(receiver)?;
                let args = args.iter().map(|a| self.eval(a)).collect::<Eval<Vec<_>>>()?;
                self.method(receiver, *method, args, regex.as_ref())
            }
            ExprKind::Unary(op, operand) => {
                let operand = self.eval(operand)?;
                match (op, operand) {
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
                    (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
                    (UnaryOp::Not, other) => {
                        Err(self.fault(format!("cannot apply `!` to {}", other.type_name())))
                    }
                    (UnaryOp::Neg, other) => {
                        Err(self.fault(format!("cannot apply `-` to {}", other.type_name())))
                    }
                }
            }
            ExprKind::Binary(BinaryOp::And, lhs, rhs) => {
                Ok(Value::Bool(self.condition(lhs)? && self.condition(rhs)?))
            }
            ExprKind::Binary(BinaryOp::Or, lhs, rhs) => {
                Ok(Value::Bool(self.condition(lhs)? || self.condition(rhs)?))
            }
            ExprKind::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.binary(*op, lhs, rhs)
            }
            ExprKind::Conditional(condition, then_value, else_value) => {
                if self.condition(condition)? {
                    self.eval(then_value)
                } else {
                    self.eval(else_value)
                }
            }
        }
    }

    fn member(&self, target: Value, name: &str) -> Eval<Value> {
        match target {
            Value::Object(mut map) => match map.remove(name) {
                Some(json) => Ok(Value::from(json)),
                None => {
                    let what = map.get("kind").and_then(Json::as_str).unwrap_or("object").to_string();
                    Err(self.fault(format!("{} has no field `{}`", what, name)))
                }
            },
            Value::Null => Err(self.fault(format!("cannot read `{}` of null", name))),
            other => Err(self.fault(format!("cannot read `{}` of {}", name, other.type_name()))),
        }
    }

    fn index(&self, target: Value, index: Value) -> Eval<Value> {
        let Value::Int(i) = index else {
            return Err(self.fault(format!("index must be an int, found {}", index.type_name())));
        };
        let out_of_range = |len: usize| self.fault(format!("index {} out of range for length {}", i, len));
        match target {
            Value::List(mut items) => {
                let len = items.len();
                match usize::try_from(i) {
                    Ok(i) if i < len => Ok(items.swap_remove(i)),
                    _ => Err(out_of_range(len)),
                }
            }
            Value::Str(s) => {
                let len = s.chars().count();
                usize::try_from(i)
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(Value::Char)
                    .ok_or_else(|| out_of_range(len))
            }
            Value::Null => Err(self.fault("cannot index null")),
            other => Err(self.fault(format!("cannot index {}", other.type_name()))),
        }
    }

    fn binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> Eval<Value> {
        use Value::{Float, Int, Str};

        let mismatch = |lhs: &Value, rhs: &Value| {
            self.fault(format!(
                "cannot apply `{}` to {} and {}",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ))
        };

        match op {
            BinaryOp::Eq => return Ok(Value::Bool(values_equal(&lhs, &rhs))),
            BinaryOp::Ne => return Ok(Value::Bool(!values_equal(&lhs, &rhs))),
            BinaryOp::Add if matches!(lhs, Str(_)) || matches!(rhs, Str(_)) => {
                return Ok(Str(format!("{}{}", self.display(&lhs), self.display(&rhs))));
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = match (&lhs, &rhs) {
                    (Int(a), Int(b)) => Some(a.cmp(b)),
                    (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
                    (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
                    (Float(a), Float(b)) => a.partial_cmp(b),
                    (Str(a), Str(b)) => Some(a.cmp(b)),
                    (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
                    _ => return Err(mismatch(&lhs, &rhs)),
                };
                let result = match ordering {
                    None => false,
                    Some(o) => match op {
                        BinaryOp::Lt => o == Ordering::Less,
                        BinaryOp::Le => o != Ordering::Greater,
                        BinaryOp::Gt => o == Ordering::Greater,
                        _ => o != Ordering::Less,
                    },
                };
                return Ok(Value::Bool(result));
            }
            _ => {}
        }

        match (&lhs, &rhs) {
            (Int(a), Int(b)) => {
                let (a, b) = (*a, *b);
                let result = match op {
                    BinaryOp::Add => Some(a.wrapping_add(b)),
                    BinaryOp::Sub => Some(a.wrapping_sub(b)),
                    BinaryOp::Mul => Some(a.wrapping_mul(b)),
                    BinaryOp::Div => a.checked_div(b),
                    BinaryOp::Rem => a.checked_rem(b),
                    _ => return Err(mismatch(&lhs, &rhs)),
                };
                match result {
                    Some(v) => Ok(Int(v)),
                    None if b == 0 => Err(self.fault("division by zero")),
                    None => Err(self.fault("integer overflow")),
                }
            }
            (Int(_) | Float(_), Int(_) | Float(_)) => {
                let as_float = |v: &Value| match v {
                    Int(i) => *i as f64,
                    Float(f) => *f,
                    _ => f64::NAN,
                };
                let (a, b) = (as_float(&lhs), as_float(&rhs));
                Ok(Float(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Rem => a % b,
                    _ => return Err(mismatch(&lhs, &rhs)),
                }))
            }
            _ => Err(mismatch(&lhs, &rhs)),
        }
    }

    fn string_arg(&self, value: &Value, what: &str) -> Eval<String> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            Value::Char(c) => Ok(c.to_string()),
            other => Err(self.fault(format!("{} needs a string, found {}", what, other.type_name()))),
        }
    }

    fn builtin(&mut self, builtin: Builtin, args: Vec<Value>) -> Eval<Value> {
        match builtin {
            Builtin::Print => {
                let text = self.display(&args[0]);
                write!(self.cx.out, "{}", text)?;
                Ok(Value::Null)
            }
            Builtin::Println => {
                let text = args.first().map(|v| self.display(v)).unwrap_or_default();
                writeln!(self.cx.out, "{}", text)?;
                Ok(Value::Null)
            }
            Builtin::Printf | Builtin::Format => {
                let fmt = self.string_arg(&args[0], "format string")?;
                let text = format::format(&fmt, &args[1..], &|v| self.display(v)).map_err(|e| self.fault(e))?;
                if builtin == Builtin::Format {
                    return Ok(Value::Str(text));
                }
                write!(self.cx.out, "{}", text)?;
                Ok(Value::Null)
            }
            Builtin::Resolve | Builtin::ResolveType => {
                let name = self.string_arg(&args[0], "class name")?;
                let found = if builtin == Builtin::Resolve {
                    self.cx.classes.resolve(&name)
                } else {
                    self.cx.classes.resolve_in_unit(self.cx.unit, &name)
                };
                Ok(match found {
                    Some(descriptor) => serde_json::to_value(&*descriptor).map(Value::from).unwrap_or(Value::Null),
                    None => Value::Null,
                })
            }
            Builtin::Fail => Err(self.fault(self.display(&args[0]))),
        }
    }

    fn method(&self, receiver: Value, method: Method, args: Vec<Value>, regex: Option<&regex::Regex>) -> Eval<Value> {
        let wrong = |receiver: &Value| {
            self.fault(format!("`{}` is not defined on {}", method.name(), receiver.type_name()))
        };
        let arg = args.first();

        Ok(match (method, &receiver) {
            (Method::ToString, _) => Value::Str(self.display(&receiver)),
            (Method::Equals, _) => Value::Bool(values_equal(&receiver, arg.unwrap_or(&Value::Null))),
            (Method::IsNull, _) => Value::Bool(receiver == Value::Null),
            (_, Value::Null) => return Err(self.fault(format!("`{}` called on null", method.name()))),

            (Method::Location, Value::Object(map)) => match node_span(map) {
                Some(span) => Value::Str(self.cx.location(&span)),
                None => return Err(wrong(&receiver)),
            },
            (Method::Text, Value::Object(map)) => match node_span(map) {
                Some(span) => Value::Str(self.text_of(&span)),
                None => return Err(wrong(&receiver)),
            },
            (Method::Kind, Value::Object(map)) => match map.get("kind").and_then(Json::as_str) {
                Some(kind) => Value::Str(kind.to_string()),
                None => return Err(wrong(&receiver)),
            },
            (Method::Get, Value::Object(map)) => {
                let key = self.string_arg(arg.unwrap_or(&Value::Null), "get")?;
                map.get(&key).cloned().map(Value::from).unwrap_or(Value::Null)
            }

            (Method::Length | Method::Size, Value::Str(s)) => Value::Int(s.chars().count() as i64),
            (Method::IsEmpty, Value::Str(s)) => Value::Bool(s.is_empty()),
            (Method::Contains, Value::Str(s)) => {
                Value::Bool(s.contains(&self.string_arg(arg.unwrap_or(&Value::Null), "contains")?))
            }
            (Method::StartsWith, Value::Str(s)) => {
                Value::Bool(s.starts_with(&self.string_arg(arg.unwrap_or(&Value::Null), "startsWith")?))
            }
            (Method::EndsWith, Value::Str(s)) => {
                Value::Bool(s.ends_with(&self.string_arg(arg.unwrap_or(&Value::Null), "endsWith")?))
            }
            (Method::Matches, Value::Str(s)) => match regex {
                Some(re) => Value::Bool(re.is_match(s)),
                None => {
                    let pattern = self.string_arg(arg.unwrap_or(&Value::Null), "matches")?;
                    let re = full_match_regex(&pattern)
                        .map_err(|e| self.fault(format!("invalid regular expression: {}", e)))?;
                    Value::Bool(re.is_match(s))
                }
            },
            (Method::ToLowerCase, Value::Str(s)) => Value::Str(s.to_lowercase()),
            (Method::ToUpperCase, Value::Str(s)) => Value::Str(s.to_uppercase()),

            (Method::Size | Method::Length, Value::List(items)) => Value::Int(items.len() as i64),
            (Method::IsEmpty, Value::List(items)) => Value::Bool(items.is_empty()),
            (Method::Contains, Value::List(items)) => {
                let wanted = arg.unwrap_or(&Value::Null);
                Value::Bool(items.iter().any(|item| values_equal(item, wanted)))
            }
            (Method::Get, Value::List(_)) => {
                return self.index(receiver.clone(), arg.cloned().unwrap_or(Value::Null));
            }
            (Method::Join, Value::List(items)) => {
                let sep = self.string_arg(arg.unwrap_or(&Value::Null), "join")?;
                let parts: Vec<String> = items.iter().map(|v| self.display(v)).collect();
                Value::Str(parts.join(&sep))
            }

            _ => return Err(wrong(&receiver)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_values_are_recognized_by_kind_and_span() {
        let node = Value::from(json!({
            "kind": "stringLiteral",
            "span": {"line": 1, "column": 2, "start": 1, "end": 4},
            "value": "\"a\""
        }));
        let Value::Object(map) = &node else { panic!("object") };
        assert_eq!(node_span(map), Some(Span { line: 1, column: 2, start: 1, end: 4 }));
        assert_eq!(node.type_name(), "node");

        let descriptor = Value::from(json!({"name": "p.A", "origin": {"kind": "source", "path": "A.java"}}));
        assert_eq!(descriptor.type_name(), "object");
    }

    #[test]
    fn test_json_numbers_and_lists() {
        assert_eq!(Value::from(json!(3)), Value::Int(3));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
        assert_eq!(
            Value::from(json!(["a", null])),
            Value::List(vec![Value::Str("a".into()), Value::Null])
        );
    }

    #[test]
    fn test_numeric_equality_crosses_int_and_float() {
        assert!(values_equal(&Value::Int(2), &Value::Float(2.0)));
        assert!(!values_equal(&Value::Int(2), &Value::Str("2".into())));
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(0.25), "0.25");
    }
}
