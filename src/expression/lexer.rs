//! Tokenizer for condition strings.

use crate::expression::ExpressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f32),
    Text(String),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Op(Op),
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

fn ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

pub fn tokenize(src: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|(_, c)| *c);

    while i < chars.len() {
        let (pos, ch) = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        // number: 12, 0.5, .5, 1e-3
        if ch.is_ascii_digit() || (ch == '.' && peek(i + 1).is_some_and(|c| c.is_ascii_digit())) {
            let start = i;
            while peek(i).is_some_and(|c| c.is_ascii_digit() || c == '.') {
                i += 1;
            }
            if peek(i).is_some_and(|c| c == 'e' || c == 'E') {
                let mark = i;
                i += 1;
                if peek(i).is_some_and(|c| c == '+' || c == '-') {
                    i += 1;
                }
                if peek(i).is_some_and(|c| c.is_ascii_digit()) {
                    while peek(i).is_some_and(|c| c.is_ascii_digit()) {
                        i += 1;
                    }
                } else {
                    i = mark;
                }
            }
            let end = chars.get(i).map(|(p, _)| *p).unwrap_or(src.len());
            let text = &src[pos..end];
            let value: f32 = text
                .parse()
                .map_err(|_| ExpressionError::InvalidNumber(text.to_string()))?;
            tokens.push(Spanned {
                token: Token::Number(value),
                pos: chars[start].0,
            });
            continue;
        }

        if ident_start(ch) {
            let mut name = String::new();
            while let Some(c) = peek(i).filter(|c| ident_continue(*c)) {
                name.push(c);
                i += 1;
            }
            tokens.push(Spanned {
                token: Token::Ident(name),
                pos,
            });
            continue;
        }

        if ch == '"' || ch == '\'' {
            let quote = ch;
            let mut text = String::new();
            i += 1;
            loop {
                match peek(i) {
                    None => return Err(ExpressionError::UnterminatedString { pos }),
                    Some('\\') if peek(i + 1).is_some() => {
                        if let Some(escaped) = peek(i + 1) {
                            text.push(escaped);
                        }
                        i += 2;
                    }
                    Some(c) if c == quote => {
                        i += 1;
                        break;
                    }
                    Some(c) => {
                        text.push(c);
                        i += 1;
                    }
                }
            }
            tokens.push(Spanned {
                token: Token::Text(text),
                pos,
            });
            continue;
        }

        let next = peek(i + 1);
        let (token, width) = match (ch, next) {
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (',', _) => (Token::Comma, 1),
            ('&', Some('&')) => (Token::Op(Op::And), 2),
            ('|', Some('|')) => (Token::Op(Op::Or), 2),
            ('=', Some('=')) => (Token::Op(Op::Eq), 2),
            ('!', Some('=')) => (Token::Op(Op::Ne), 2),
            ('<', Some('>')) => (Token::Op(Op::Ne), 2),
            ('<', Some('=')) => (Token::Op(Op::Le), 2),
            ('>', Some('=')) => (Token::Op(Op::Ge), 2),
            ('=', _) => (Token::Op(Op::Eq), 1),
            ('<', _) => (Token::Op(Op::Lt), 1),
            ('>', _) => (Token::Op(Op::Gt), 1),
            ('!', _) => (Token::Op(Op::Not), 1),
            ('+', _) => (Token::Op(Op::Plus), 1),
            ('-', _) => (Token::Op(Op::Minus), 1),
            ('*', _) => (Token::Op(Op::Star), 1),
            ('/', _) => (Token::Op(Op::Slash), 1),
            ('%', _) => (Token::Op(Op::Percent), 1),
            ('^', _) => (Token::Op(Op::Caret), 1),
            _ => return Err(ExpressionError::UnexpectedChar { pos, ch }),
        };
        tokens.push(Spanned { token, pos });
        i += width;
    }

    Ok(tokens)
}
