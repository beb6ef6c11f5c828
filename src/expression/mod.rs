//! Condition language used to gate sounds, block effects and region overlays.
//!
//! A rule string is compiled once against an [`ExpressionScope`] into an
//! immutable [`Expression`]. Evaluation takes the subject explicitly, so one
//! compiled rule can be shared between threads and evaluated against any
//! region without mutating anything.
//!
//! ```ignore
//! let scope = ExpressionScope::standard(&tags, registry.keys());
//! let rule = Expression::compile("biome.rainfall > 0.5 && biome.isForest", &scope)?;
//! if rule.matches(region) { /* ... */ }
//! ```
//!
//! The empty string compiles to a rule that is always true.

pub mod lexer;
pub mod parser;
pub mod scope;
pub mod value;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::resources::resourcekey::ResourceKey;
use crate::resources::tags::TagId;
use lexer::Op;
use parser::{Builtin, Node, SubjectVar, UnaryOp};

pub use scope::{Binding, ExpressionScope};
pub use value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("unterminated string starting at {pos}")]
    UnterminatedString { pos: usize },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected {token} at {pos}")]
    UnexpectedToken { pos: usize, token: String },
    #[error("unexpected end of expression at {pos}")]
    UnexpectedEnd { pos: usize },
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("wrong argument count for {function} at {pos}: expected {expected}, found {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
        pos: usize,
    },
}

/// What a condition is evaluated against. Implemented by region profiles.
pub trait ConditionSubject {
    fn name(&self) -> &str;
    fn key(&self) -> &ResourceKey;
    fn rainfall(&self) -> f32;
    fn temperature(&self) -> f32;
    fn humidity(&self) -> f32;
    fn is_fake(&self) -> bool;
    fn has_tag(&self, tag: TagId) -> bool;
    /// `true` when the region named `other` belongs to the same similarity
    /// class as this subject.
    fn is_like(&self, other: &str) -> bool;
}

/// Something that is only active while its condition holds.
pub trait Conditional {
    fn condition(&self) -> &Expression;

    fn is_active(&self, subject: &dyn ConditionSubject) -> bool {
        self.condition().matches(subject)
    }
}

/// A compiled rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: Arc<str>,
    root: Option<Node>,
}

impl Expression {
    pub fn compile(source: &str, scope: &ExpressionScope) -> Result<Self, ExpressionError> {
        let tokens = lexer::tokenize(source)?;
        let root = parser::parse(&tokens, scope, source.len())?;
        Ok(Self {
            source: source.trim().into(),
            root,
        })
    }

    /// The rule that matches everything.
    pub fn always() -> Self {
        Self {
            source: "".into(),
            root: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_always(&self) -> bool {
        self.root.is_none()
    }

    pub fn eval(&self, subject: &dyn ConditionSubject) -> Value {
        match &self.root {
            None => Value::TRUE,
            Some(node) => eval_node(node, Some(subject)).unwrap_or(Value::FALSE),
        }
    }

    pub fn matches(&self, subject: &dyn ConditionSubject) -> bool {
        self.eval(subject).as_bool()
    }
}

impl Default for Expression {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn subject_value(var: SubjectVar, subject: &dyn ConditionSubject) -> Value {
    match var {
        SubjectVar::Name => Value::text(subject.name()),
        SubjectVar::Key => Value::text(subject.key().to_string()),
        SubjectVar::Namespace => Value::text(subject.key().namespace()),
        SubjectVar::Rainfall => Value::Number(subject.rainfall()),
        SubjectVar::Temperature => Value::Number(subject.temperature()),
        SubjectVar::Humidity => Value::Number(subject.humidity()),
        SubjectVar::IsFake => Value::Bool(subject.is_fake()),
        SubjectVar::Tag(tag) => Value::Bool(subject.has_tag(tag)),
    }
}

fn arithmetic(op: Op, l: f32, r: f32) -> f32 {
    match op {
        Op::Minus => l - r,
        Op::Star => l * r,
        Op::Slash => l / r,
        Op::Percent => l % r,
        Op::Caret => l.powf(r),
        _ => f32::NAN,
    }
}

/// Evaluate a node. Returns `None` only when the node reads the subject and
/// no subject was given (constant folding at compile time).
pub(crate) fn eval_node(node: &Node, subject: Option<&dyn ConditionSubject>) -> Option<Value> {
    let value = match node {
        Node::Literal(v) => v.clone(),
        Node::Subject(var) => subject_value(*var, subject?),
        Node::Unary(UnaryOp::Neg, operand) => {
            Value::Number(-eval_node(operand, subject)?.as_number())
        }
        Node::Unary(UnaryOp::Not, operand) => Value::Bool(!eval_node(operand, subject)?.as_bool()),
        Node::Binary(Op::And, l, r) => {
            Value::Bool(eval_node(l, subject)?.as_bool() && eval_node(r, subject)?.as_bool())
        }
        Node::Binary(Op::Or, l, r) => {
            Value::Bool(eval_node(l, subject)?.as_bool() || eval_node(r, subject)?.as_bool())
        }
        Node::Binary(op, l, r) => {
            let l = eval_node(l, subject)?;
            let r = eval_node(r, subject)?;
            match op {
                Op::Plus => l.add(&r),
                Op::Eq => Value::Bool(l.compare(&r) == Ordering::Equal),
                Op::Ne => Value::Bool(l.compare(&r) != Ordering::Equal),
                Op::Lt => Value::Bool(l.compare(&r) == Ordering::Less),
                Op::Le => Value::Bool(l.compare(&r) != Ordering::Greater),
                Op::Gt => Value::Bool(l.compare(&r) == Ordering::Greater),
                Op::Ge => Value::Bool(l.compare(&r) != Ordering::Less),
                _ => Value::Number(arithmetic(*op, l.as_number(), r.as_number())),
            }
        }
        Node::Call(builtin, args) => call(*builtin, args, subject)?,
    };
    Some(value)
}

fn call(builtin: Builtin, args: &[Node], subject: Option<&dyn ConditionSubject>) -> Option<Value> {
    let arg = |i: usize| match args.get(i) {
        Some(node) => eval_node(node, subject),
        None => Some(Value::FALSE),
    };
    let value = match builtin {
        Builtin::Not => Value::Bool(!arg(0)?.as_bool()),
        Builtin::If => {
            if arg(0)?.as_bool() {
                arg(1)?
            } else {
                arg(2)?
            }
        }
        Builtin::Min | Builtin::Max => {
            let mut best: Option<f32> = None;
            for node in args {
                let n = eval_node(node, subject)?.as_number();
                best = Some(match best {
                    None => n,
                    Some(b) if builtin == Builtin::Min => b.min(n),
                    Some(b) => b.max(n),
                });
            }
            Value::Number(best.unwrap_or(0.0))
        }
        Builtin::Abs => Value::Number(arg(0)?.as_number().abs()),
        Builtin::Floor => Value::Number(arg(0)?.as_number().floor()),
        Builtin::Ceiling => Value::Number(arg(0)?.as_number().ceil()),
        Builtin::Round => Value::Number(arg(0)?.as_number().round()),
        Builtin::Sqrt => Value::Number(arg(0)?.as_number().sqrt()),
        Builtin::IsLike => {
            let name = arg(0)?;
            Value::Bool(subject?.is_like(&name.as_text()))
        }
    };
    Some(value)
}
