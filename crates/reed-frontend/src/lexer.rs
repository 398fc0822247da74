use anyhow::{anyhow, bail, Result};

use crate::token::{Token, TokenKind, TokenValue};

const KEYWORDS: &[&str] = &[
    "import", "let", "as", "fn", "if", "else", "while", "for", "break",
];

pub struct Lexer;

impl Lexer {
    /// Tokenize a whole source text. The returned stream always ends with a
    /// single `Eof` token carrying the position one past the last character.
    pub fn tokenize(src: &str) -> Result<Vec<Token>> {
        let chars: Vec<char> = src.chars().collect();
        let mut toks = Vec::new();
        let mut i = 0usize;
        let mut row = 1u32;
        let mut col = 1u32;

        macro_rules! advance {
            () => {{
                if chars[i] == '\n' {
                    row += 1;
                    col = 1;
                } else {
                    col += 1;
                }
                i += 1;
            }};
        }

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                advance!();
                continue;
            }
            if c == '/' && chars.get(i + 1) == Some(&'/') {
                while i < chars.len() && chars[i] != '\n' {
                    advance!();
                }
                continue;
            }
            let (trow, tcol) = (row, col);
            if c.is_alphabetic() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    advance!();
                }
                let s: String = chars[start..i].iter().collect();
                let tok = if s == "true" || s == "false" {
                    let value = TokenValue::Bool(s == "true");
                    Token::new(TokenKind::BoolLit, s, trow, tcol).with_value(value)
                } else if KEYWORDS.contains(&s.as_str()) {
                    Token::new(TokenKind::Keyword, s, trow, tcol)
                } else {
                    Token::new(TokenKind::Ident, s, trow, tcol)
                };
                toks.push(tok);
                continue;
            }
            if c.is_ascii_digit() {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    advance!();
                }
                let mut is_float = false;
                if chars.get(i) == Some(&'.')
                    && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
                {
                    is_float = true;
                    advance!();
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        advance!();
                    }
                }
                let s: String = chars[start..i].iter().collect();
                let tok = if is_float {
                    let v = s
                        .parse::<f64>()
                        .map_err(|e| anyhow!("{trow}:{tcol}: bad float literal '{s}': {e}"))?;
                    Token::new(TokenKind::FloatLit, s, trow, tcol)
                        .with_value(TokenValue::Float(v))
                } else {
                    let v = s
                        .parse::<i64>()
                        .map_err(|e| anyhow!("{trow}:{tcol}: bad int literal '{s}': {e}"))?;
                    Token::new(TokenKind::IntLit, s, trow, tcol).with_value(TokenValue::Int(v))
                };
                toks.push(tok);
                continue;
            }
            if c == '"' {
                let start = i;
                advance!();
                let mut s = String::new();
                let mut closed = false;
                while i < chars.len() {
                    let ch = chars[i];
                    if ch == '\\' {
                        advance!();
                        let Some(&esc) = chars.get(i) else {
                            bail!("{trow}:{tcol}: unterminated string literal");
                        };
                        s.push(unescape(esc));
                        advance!();
                        continue;
                    }
                    if ch == '"' {
                        advance!();
                        closed = true;
                        break;
                    }
                    s.push(ch);
                    advance!();
                }
                if !closed {
                    bail!("{trow}:{tcol}: unterminated string literal");
                }
                let rep: String = chars[start..i].iter().collect();
                toks.push(
                    Token::new(TokenKind::StrLit, rep, trow, tcol)
                        .with_value(TokenValue::Str(s)),
                );
                continue;
            }
            if c == '\'' {
                let start = i;
                advance!();
                let Some(&ch) = chars.get(i) else {
                    bail!("{trow}:{tcol}: unterminated char literal");
                };
                let value = if ch == '\\' {
                    advance!();
                    let Some(&esc) = chars.get(i) else {
                        bail!("{trow}:{tcol}: unterminated char literal");
                    };
                    advance!();
                    unescape(esc)
                } else {
                    advance!();
                    ch
                };
                if chars.get(i) != Some(&'\'') {
                    bail!("{trow}:{tcol}: unterminated char literal");
                }
                advance!();
                let rep: String = chars[start..i].iter().collect();
                toks.push(
                    Token::new(TokenKind::CharLit, rep, trow, tcol)
                        .with_value(TokenValue::Char(value)),
                );
                continue;
            }

            // Longest match first so "||", "==", "->", ... win over their prefixes.
            let two: Option<String> = chars.get(i + 1).map(|n| [c, *n].iter().collect());
            if let Some(two) = two {
                let kind = match two.as_str() {
                    "||" | "&&" | "==" | "!=" | "<=" | ">=" => Some(TokenKind::Operator),
                    "->" => Some(TokenKind::Punct),
                    _ => None,
                };
                if let Some(kind) = kind {
                    advance!();
                    advance!();
                    toks.push(Token::new(kind, two, trow, tcol));
                    continue;
                }
            }
            let kind = match c {
                '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '!' | '<' | '>' => {
                    TokenKind::Operator
                }
                '(' | ')' | '[' | ']' | '{' | '}' | ',' | ':' | ';' | '=' => TokenKind::Punct,
                _ => bail!("{trow}:{tcol}: unexpected character '{c}'"),
            };
            advance!();
            toks.push(Token::new(kind, c.to_string(), trow, tcol));
        }
        toks.push(Token::new(TokenKind::Eof, "", row, col));
        Ok(toks)
    }
}

fn unescape(esc: char) -> char {
    match esc {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}
