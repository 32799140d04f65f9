//! Expression parsing.
//!
//! The accepted language is deliberately tiny:
//!
//! ```text
//! Expr    := Ident | Callee "(" ArgList? ")"
//! ArgList := Arg ("," Arg)*
//! ```
//!
//! Each argument is empty, a word made of letters, digits, `_`, `-` and
//! `.`, or one complete double-quoted or back-quoted literal, kept verbatim
//! with its quotes. Anything else rejects the whole expression.

use crate::error::CallError;

/// A parsed call: lower-cased name and trimmed positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Callee, lower-cased for lookup.
    pub name: String,
    /// Argument source text, trimmed, in order.
    pub args: Vec<String>,
}

/// Parse one line of input.
pub fn parse(input: &str) -> Result<Expression, CallError> {
    let input = input.trim();

    let Some(open) = input.find('(') else {
        if !is_identifier(input) {
            return Err(CallError::UnknownExpression);
        }
        return Ok(Expression {
            name: input.to_lowercase(),
            args: Vec::new(),
        });
    };

    let callee = input[..open].trim_end();
    if !is_word(callee) {
        return Err(CallError::UnknownExpression);
    }

    let Some(inner) = input[open + 1..].strip_suffix(')') else {
        return Err(CallError::UnknownExpression);
    };

    Ok(Expression {
        name: callee.to_lowercase(),
        args: split_arguments(inner)?,
    })
}

/// Split the text between the parentheses on top-level commas.
fn split_arguments(inner: &str) -> Result<Vec<String>, CallError> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == '\\' && q == '"' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '`' => {
                    quote = Some(c);
                    current.push(c);
                }
                ',' => args.push(std::mem::take(&mut current).trim().to_string()),
                // nested calls and stray parentheses
                '(' | ')' => return Err(CallError::UnknownExpression),
                _ => current.push(c),
            },
        }
    }

    if quote.is_some() {
        return Err(CallError::UnknownExpression);
    }
    args.push(current.trim().to_string());

    if !args.iter().all(|arg| is_argument(arg)) {
        return Err(CallError::UnknownExpression);
    }
    Ok(args)
}

fn is_argument(arg: &str) -> bool {
    arg.is_empty()
        || arg
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        || is_quoted(arg)
}

/// Exactly one literal: the opening quote is closed by the last character.
fn is_quoted(arg: &str) -> bool {
    let mut chars = arg.char_indices();
    let Some((_, q)) = chars.next() else {
        return false;
    };
    if q != '"' && q != '`' {
        return false;
    }

    while let Some((i, c)) = chars.next() {
        if c == '\\' && q == '"' {
            chars.next();
        } else if c == q {
            return i + c.len_utf8() == arg.len();
        }
    }
    false
}

/// Letter or underscore, then letters, digits or underscores.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// An identifier or a literal-like word such as `0`.
fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}
