//! Pratt parser producing the expression tree.
//!
//! Binding powers, loosest first: `||` 2, `&&` 4, comparisons 10, `+ -` 20,
//! `* / %` 30, `^` 40 (right associative), prefix `-` and `!` 60.

use crate::expression::ExpressionError;
use crate::expression::lexer::{Op, Spanned, Token};
use crate::expression::scope::{Binding, ExpressionScope};
use crate::expression::value::Value;
use crate::resources::tags::TagId;

/// Attribute of the subject read at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectVar {
    Name,
    Key,
    Namespace,
    Rainfall,
    Temperature,
    Humidity,
    IsFake,
    Tag(TagId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Not,
    If,
    Min,
    Max,
    Abs,
    Floor,
    Ceiling,
    Round,
    Sqrt,
    IsLike,
}

impl Builtin {
    /// Accepted argument count as `(min, max)`; `None` means unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Builtin::If => (3, Some(3)),
            Builtin::Min | Builtin::Max => (1, None),
            _ => (1, Some(1)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Not => "NOT",
            Builtin::If => "IF",
            Builtin::Min => "MIN",
            Builtin::Max => "MAX",
            Builtin::Abs => "ABS",
            Builtin::Floor => "FLOOR",
            Builtin::Ceiling => "CEILING",
            Builtin::Round => "ROUND",
            Builtin::Sqrt => "SQRT",
            Builtin::IsLike => "biome.isLike",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Value),
    Subject(SubjectVar),
    Unary(UnaryOp, Box<Node>),
    Binary(Op, Box<Node>, Box<Node>),
    Call(Builtin, Vec<Node>),
}

fn infix_power(op: Op) -> Option<(u8, u8)> {
    let bp = match op {
        Op::Or => (2, 3),
        Op::And => (4, 5),
        Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => (10, 11),
        Op::Plus | Op::Minus => (20, 21),
        Op::Star | Op::Slash | Op::Percent => (30, 31),
        Op::Caret => (41, 40),
        Op::Not => return None,
    };
    Some(bp)
}

const PREFIX_POWER: u8 = 60;

struct Parser<'a> {
    tokens: &'a [Spanned],
    at: usize,
    scope: &'a ExpressionScope,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.at).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<&'a Spanned> {
        let tok = self.tokens.get(self.at);
        self.at += 1;
        tok
    }

    fn expect(&mut self, want: Token) -> Result<(), ExpressionError> {
        match self.next() {
            Some(s) if s.token == want => Ok(()),
            Some(s) => Err(unexpected(s)),
            None => Err(ExpressionError::UnexpectedEnd { pos: self.end }),
        }
    }

    fn expr(&mut self, min_bp: u8) -> Result<Node, ExpressionError> {
        let mut lhs = self.prefix()?;

        while let Some(Token::Op(op)) = self.peek() {
            let Some((l_bp, r_bp)) = infix_power(*op) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            let op = *op;
            self.at += 1;
            let rhs = self.expr(r_bp)?;
            lhs = fold(Node::Binary(op, Box::new(lhs), Box::new(rhs)));
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Node, ExpressionError> {
        let Some(spanned) = self.next() else {
            return Err(ExpressionError::UnexpectedEnd { pos: self.end });
        };
        match &spanned.token {
            Token::Number(n) => Ok(Node::Literal(Value::Number(*n))),
            Token::Text(s) => Ok(Node::Literal(Value::text(s.as_str()))),
            Token::LParen => {
                let inner = self.expr(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Op(Op::Minus) => {
                let operand = self.expr(PREFIX_POWER)?;
                Ok(fold(Node::Unary(UnaryOp::Neg, Box::new(operand))))
            }
            Token::Op(Op::Not) => {
                let operand = self.expr(PREFIX_POWER)?;
                Ok(fold(Node::Unary(UnaryOp::Not, Box::new(operand))))
            }
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    self.call(name, spanned.pos)
                } else {
                    match self.scope.variable(name) {
                        Some(Binding::Constant(v)) => Ok(Node::Literal(v.clone())),
                        Some(Binding::Subject(var)) => Ok(Node::Subject(*var)),
                        None => Err(ExpressionError::UnknownVariable(name.clone())),
                    }
                }
            }
            _ => Err(unexpected(spanned)),
        }
    }

    fn call(&mut self, name: &str, pos: usize) -> Result<Node, ExpressionError> {
        let builtin = self
            .scope
            .function(name)
            .ok_or_else(|| ExpressionError::UnknownFunction(name.to_string()))?;
        self.expect(Token::LParen)?;

        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.at += 1;
        } else {
            loop {
                args.push(self.expr(0)?);
                match self.next() {
                    Some(s) if s.token == Token::Comma => continue,
                    Some(s) if s.token == Token::RParen => break,
                    Some(s) => return Err(unexpected(s)),
                    None => return Err(ExpressionError::UnexpectedEnd { pos: self.end }),
                }
            }
        }

        let (min, max) = builtin.arity();
        if args.len() < min || max.is_some_and(|m| args.len() > m) {
            return Err(ExpressionError::Arity {
                function: builtin.name().to_string(),
                expected: min,
                found: args.len(),
                pos,
            });
        }
        Ok(Node::Call(builtin, args))
    }
}

fn unexpected(spanned: &Spanned) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        pos: spanned.pos,
        token: format!("{:?}", spanned.token),
    }
}

/// Collapse operators whose operands are all literals.
fn fold(node: Node) -> Node {
    let constant = match &node {
        Node::Unary(_, operand) => matches!(**operand, Node::Literal(_)),
        Node::Binary(_, l, r) => {
            matches!(**l, Node::Literal(_)) && matches!(**r, Node::Literal(_))
        }
        _ => false,
    };
    if !constant {
        return node;
    }
    match crate::expression::eval_node(&node, None) {
        Some(v) => Node::Literal(v),
        None => node,
    }
}

/// Parse a complete token stream. An empty stream yields `None`.
pub fn parse(
    tokens: &[Spanned],
    scope: &ExpressionScope,
    src_len: usize,
) -> Result<Option<Node>, ExpressionError> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut parser = Parser {
        tokens,
        at: 0,
        scope,
        end: src_len,
    };
    let root = parser.expr(0)?;
    if let Some(extra) = parser.next() {
        return Err(unexpected(extra));
    }
    Ok(Some(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::lexer::tokenize;

    fn tree(src: &str) -> Result<Option<Node>, ExpressionError> {
        let scope = ExpressionScope::new();
        parse(&tokenize(src)?, &scope, src.len())
    }

    fn num(src: &str) -> f32 {
        match tree(src).unwrap() {
            Some(Node::Literal(v)) => v.as_number(),
            other => panic!("not folded: {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(num("1 + 2 * 3"), 7.0);
        assert_eq!(num("(1 + 2) * 3"), 9.0);
        assert_eq!(num("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(num("-2 ^ 2"), 4.0);
        assert_eq!(num("10 - 4 - 3"), 3.0);
        assert_eq!(num("7 % 4"), 3.0);
    }

    #[test]
    fn test_logic_binds_looser_than_comparison() {
        assert_eq!(num("1 < 2 && 3 > 4 || 1 == 1"), 1.0);
        assert_eq!(num("!0 && 1"), 1.0);
    }

    #[test]
    fn test_empty_source_has_no_root() {
        assert_eq!(tree("   ").unwrap(), None);
    }

    #[test]
    fn test_call_arity() {
        assert!(matches!(
            tree("IF(1, 2)"),
            Err(ExpressionError::Arity { expected: 3, found: 2, .. })
        ));
        assert!(matches!(tree("MAX()"), Err(ExpressionError::Arity { .. })));
        assert!(tree("max(1, 2, 3)").unwrap().is_some());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(tree("1 +"), Err(ExpressionError::UnexpectedEnd { pos: 3 })));
        assert!(matches!(tree("(1"), Err(ExpressionError::UnexpectedEnd { .. })));
        assert!(matches!(tree("1 2"), Err(ExpressionError::UnexpectedToken { pos: 2, .. })));
        assert_eq!(
            tree("nothing"),
            Err(ExpressionError::UnknownVariable("nothing".into()))
        );
        assert_eq!(
            tree("frob(1)"),
            Err(ExpressionError::UnknownFunction("frob".into()))
        );
    }
}
