//! Runtime values of the condition language.
//!
//! Every value can be read as a number, a boolean or a string. Binary `+` and
//! the comparison operators dispatch on the type of the *left* operand:
//!
//! | left      | `+`                  | comparison            |
//! |-----------|----------------------|-----------------------|
//! | `Text`    | concatenation        | string order          |
//! | `Number`  | sum                  | numeric order         |
//! | `Bool`    | logical OR           | `false < true`        |

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f32),
    Text(Arc<str>),
    Bool(bool),
}

impl Value {
    pub const TRUE: Value = Value::Bool(true);
    pub const FALSE: Value = Value::Bool(false);

    pub fn text(s: impl Into<Arc<str>>) -> Self {
        Value::Text(s.into())
    }

    pub fn as_number(&self) -> f32 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(&**s),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        }
    }

    /// Type-dependent `+`.
    pub fn add(&self, rhs: &Value) -> Value {
        match self {
            Value::Text(s) => {
                let mut out = String::with_capacity(s.len() + 8);
                out.push_str(s);
                out.push_str(&rhs.as_text());
                Value::text(out)
            }
            Value::Number(n) => Value::Number(n + rhs.as_number()),
            Value::Bool(b) => Value::Bool(*b || rhs.as_bool()),
        }
    }

    /// Ordering of `self` against `rhs`, using the type of `self`.
    pub fn compare(&self, rhs: &Value) -> Ordering {
        match self {
            Value::Text(s) => {
                let left: &str = s;
                left.cmp(rhs.as_text().as_ref())
            }
            Value::Number(n) => n.partial_cmp(&rhs.as_number()).unwrap_or(Ordering::Equal),
            Value::Bool(b) => b.cmp(&rhs.as_bool()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_type_dependent() {
        assert_eq!(
            Value::text("deep").add(&Value::text("_ocean")),
            Value::text("deep_ocean")
        );
        assert_eq!(Value::Number(1.5).add(&Value::Number(2.0)), Value::Number(3.5));
        assert_eq!(Value::FALSE.add(&Value::TRUE), Value::TRUE);
        assert_eq!(Value::FALSE.add(&Value::FALSE), Value::FALSE);
    }

    #[test]
    fn test_add_coerces_right_operand() {
        assert_eq!(Value::text("n=").add(&Value::Number(2.0)), Value::text("n=2"));
        assert_eq!(Value::Number(1.0).add(&Value::TRUE), Value::Number(2.0));
    }

    #[test]
    fn test_conversions() {
        assert!(Value::Number(0.1).as_bool());
        assert!(!Value::Number(0.0).as_bool());
        assert!(Value::text("TRUE").as_bool());
        assert_eq!(Value::text(" 0.5 ").as_number(), 0.5);
        assert_eq!(Value::text("abc").as_number(), 0.0);
        assert_eq!(Value::TRUE.as_number(), 1.0);
    }

    #[test]
    fn test_compare_uses_left_type() {
        assert_eq!(Value::Number(0.8).compare(&Value::Number(0.5)), Ordering::Greater);
        assert_eq!(Value::text("abc").compare(&Value::text("abd")), Ordering::Less);
        assert_eq!(Value::TRUE.compare(&Value::Number(1.0)), Ordering::Equal);
    }
}
