use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::JmespathError;
use crate::token::{Token, TokenKind, TokenValue};
use crate::value::Value;

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Scanner<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn len(&self) -> usize {
        self.src.len()
    }

    /// Consume characters up to (and past) the closing `delimiter`,
    /// treating `\` as an escape that protects the following character
    /// from ending the scan. Returns the raw (still-escaped) body.
    fn consume_delimited(
        &mut self,
        start: usize,
        delimiter: char,
    ) -> Result<(String, usize), JmespathError> {
        let mut buf = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(JmespathError::lexer(
                        start,
                        format!("unclosed {} delimiter", delimiter),
                    ))
                }
                Some((_, '\\')) => {
                    buf.push('\\');
                    match self.bump() {
                        Some((_, c)) => buf.push(c),
                        None => {
                            return Err(JmespathError::lexer(
                                start,
                                format!("unclosed {} delimiter", delimiter),
                            ))
                        }
                    }
                }
                Some((pos, c)) if c == delimiter => {
                    let end = pos + c.len_utf8();
                    return Ok((buf, end));
                }
                Some((_, c)) => buf.push(c),
            }
        }
    }
}

/// Tokenize a JMESPath source expression. Fails with `EmptyExpression` on
/// an empty source, or a `LexerError` at the offending byte position on an
/// unclosed delimiter, a malformed literal/escape, or an unknown character.
pub fn tokenize(src: &str) -> Result<Vec<Token>, JmespathError> {
    if src.is_empty() {
        return Err(JmespathError::empty_expression());
    }

    let mut scanner = Scanner::new(src);
    let mut tokens = Vec::new();

    while let Some((start, c)) = scanner.peek() {
        match c {
            '.' | '*' | ']' | ',' | ':' | '@' | '(' | ')' | '{' | '}' => {
                scanner.bump();
                let kind = match c {
                    '.' => TokenKind::Dot,
                    '*' => TokenKind::Star,
                    ']' => TokenKind::RBracket,
                    ',' => TokenKind::Comma,
                    ':' => TokenKind::Colon,
                    '@' => TokenKind::Current,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    _ => unreachable!(),
                };
                tokens.push(Token::new(
                    kind,
                    TokenValue::Text(c.to_string()),
                    start,
                    start + c.len_utf8(),
                ));
            }
            '&' => {
                scanner.bump();
                match scanner.peek() {
                    Some((_, '&')) => {
                        scanner.bump();
                        tokens.push(Token::new(
                            TokenKind::And,
                            TokenValue::Text("&&".into()),
                            start,
                            start + 2,
                        ));
                    }
                    _ => tokens.push(Token::new(
                        TokenKind::Expref,
                        TokenValue::Text("&".into()),
                        start,
                        start + 1,
                    )),
                }
            }
            c if c.is_whitespace() => {
                scanner.bump();
            }
            '[' => {
                scanner.bump();
                match scanner.peek() {
                    Some((_, ']')) => {
                        scanner.bump();
                        tokens.push(Token::new(
                            TokenKind::Flatten,
                            TokenValue::Text("[]".into()),
                            start,
                            start + 2,
                        ));
                    }
                    Some((_, '?')) => {
                        scanner.bump();
                        tokens.push(Token::new(
                            TokenKind::Filter,
                            TokenValue::Text("[?".into()),
                            start,
                            start + 2,
                        ));
                    }
                    _ => {
                        tokens.push(Token::new(
                            TokenKind::LBracket,
                            TokenValue::Text("[".into()),
                            start,
                            start + 1,
                        ));
                    }
                }
            }
            '\'' => {
                scanner.bump();
                let (raw, end) = scanner.consume_delimited(start, '\'')?;
                let unescaped = unescape_raw_string(&raw);
                tokens.push(Token::new(
                    TokenKind::RawStringLiteral,
                    TokenValue::Literal(Value::String(unescaped)),
                    start,
                    end,
                ));
            }
            '|' => {
                scanner.bump();
                match scanner.peek() {
                    Some((_, '|')) => {
                        scanner.bump();
                        tokens.push(Token::new(
                            TokenKind::Or,
                            TokenValue::Text("||".into()),
                            start,
                            start + 2,
                        ));
                    }
                    _ => tokens.push(Token::new(
                        TokenKind::Pipe,
                        TokenValue::Text("|".into()),
                        start,
                        start + 1,
                    )),
                }
            }
            '`' => {
                scanner.bump();
                let (raw, end) = scanner.consume_delimited(start, '`')?;
                let value = consume_literal_value(start, &raw)?;
                tokens.push(Token::new(TokenKind::Literal, TokenValue::Literal(value), start, end));
            }
            '-' | '0'..='9' => {
                let (value, end) = consume_number(&mut scanner, start)?;
                tokens.push(Token::new(
                    TokenKind::Number,
                    TokenValue::Number(value),
                    start,
                    end,
                ));
            }
            '"' => {
                scanner.bump();
                let (raw, end) = scanner.consume_delimited(start, '"')?;
                let wrapped = format!("\"{}\"", raw);
                let decoded: String = serde_json::from_str(&wrapped).map_err(|e| {
                    JmespathError::lexer(start, format!("invalid quoted identifier: {}", e))
                })?;
                tokens.push(Token::new(
                    TokenKind::QuotedIdentifier,
                    TokenValue::Text(decoded),
                    start,
                    end,
                ));
            }
            '<' => {
                tokens.push(match_or_else(&mut scanner, start, '=', TokenKind::Lte, TokenKind::Lt)?);
            }
            '>' => {
                tokens.push(match_or_else(&mut scanner, start, '=', TokenKind::Gte, TokenKind::Gt)?);
            }
            '!' => {
                scanner.bump();
                match scanner.peek() {
                    Some((_, '=')) => {
                        scanner.bump();
                        tokens.push(Token::new(
                            TokenKind::Ne,
                            TokenValue::Text("!=".into()),
                            start,
                            start + 2,
                        ));
                    }
                    _ => tokens.push(Token::new(
                        TokenKind::Not,
                        TokenValue::Text("!".into()),
                        start,
                        start + 1,
                    )),
                }
            }
            '=' => {
                scanner.bump();
                match scanner.peek() {
                    Some((_, '=')) => {
                        scanner.bump();
                        tokens.push(Token::new(
                            TokenKind::Eq,
                            TokenValue::Text("==".into()),
                            start,
                            start + 2,
                        ));
                    }
                    _ => {
                        return Err(JmespathError::lexer(
                            start,
                            "expected '==', a single '=' is not a valid operator",
                        ))
                    }
                }
            }
            c if is_identifier_start(c) => {
                let mut end = start + c.len_utf8();
                scanner.bump();
                while let Some((pos, ch)) = scanner.peek() {
                    if is_identifier_char(ch) {
                        end = pos + ch.len_utf8();
                        scanner.bump();
                    } else {
                        break;
                    }
                }
                let text = src[start..end].to_string();
                tokens.push(Token::new(TokenKind::UnquotedIdentifier, TokenValue::Text(text), start, end));
            }
            other => {
                return Err(JmespathError::lexer(
                    start,
                    format!("unknown character '{}'", other),
                ))
            }
        }
    }

    tokens.push(Token::new(
        TokenKind::Eof,
        TokenValue::None,
        scanner.len(),
        scanner.len(),
    ));
    Ok(tokens)
}

fn match_or_else(
    scanner: &mut Scanner,
    start: usize,
    expected: char,
    match_kind: TokenKind,
    else_kind: TokenKind,
) -> Result<Token, JmespathError> {
    let (_, current) = scanner.bump().unwrap();
    match scanner.peek() {
        Some((_, c)) if c == expected => {
            scanner.bump();
            Ok(Token::new(
                match_kind,
                TokenValue::Text(format!("{}{}", current, expected)),
                start,
                start + 2,
            ))
        }
        _ => Ok(Token::new(
            else_kind,
            TokenValue::Text(current.to_string()),
            start,
            start + 1,
        )),
    }
}

fn consume_number(scanner: &mut Scanner, start: usize) -> Result<(i64, usize), JmespathError> {
    let mut buf = String::new();
    if let Some((_, '-')) = scanner.peek() {
        buf.push('-');
        scanner.bump();
    }
    let digits_start = buf.len();
    let mut end = start + buf.len();
    while let Some((pos, c)) = scanner.peek() {
        if c.is_ascii_digit() {
            buf.push(c);
            end = pos + 1;
            scanner.bump();
        } else {
            break;
        }
    }
    if buf.len() == digits_start {
        return Err(JmespathError::lexer(start, "malformed number literal"));
    }
    let value: i64 = buf
        .parse()
        .map_err(|_| JmespathError::lexer(start, "number literal out of range"))?;
    Ok((value, end))
}

/// Unescape a raw-string-literal body: only `\'` and `\\` are special.
fn unescape_raw_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\'') => {
                    out.push('\'');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode a backtick-literal body: unescape `` \` `` to `` ` ``, parse as
/// JSON; on failure, left-trim and retry as a JSON string (the JEP-12
/// deprecated fallback), logging the fallback path since it is slated for
/// removal upstream.
fn consume_literal_value(start: usize, raw: &str) -> Result<Value, JmespathError> {
    let unescaped = raw.replace("\\`", "`");
    match serde_json::from_str::<serde_json::Value>(&unescaped) {
        Ok(v) => Ok(Value::from(v)),
        Err(_) => {
            let trimmed = unescaped.trim_start();
            let wrapped = format!("\"{}\"", trimmed);
            match serde_json::from_str::<serde_json::Value>(&wrapped) {
                Ok(v) => {
                    log::trace!(
                        "literal at byte {} used the deprecated JEP-12 string fallback",
                        start
                    );
                    Ok(Value::from(v))
                }
                Err(_) => Err(JmespathError::lexer(
                    start,
                    format!("bad token `{}`", unescaped),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_field_path() {
        assert_eq!(
            kinds("foo.bar"),
            vec![
                TokenKind::UnquotedIdentifier,
                TokenKind::Dot,
                TokenKind::UnquotedIdentifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn bracket_disambiguation() {
        assert_eq!(kinds("a[]"), vec![TokenKind::UnquotedIdentifier, TokenKind::Flatten, TokenKind::Eof]);
        assert_eq!(kinds("a[?b]"), vec![
            TokenKind::UnquotedIdentifier,
            TokenKind::Filter,
            TokenKind::UnquotedIdentifier,
            TokenKind::RBracket,
            TokenKind::Eof
        ]);
        assert_eq!(kinds("a[0]"), vec![
            TokenKind::UnquotedIdentifier,
            TokenKind::LBracket,
            TokenKind::Number,
            TokenKind::RBracket,
            TokenKind::Eof
        ]);
    }

    #[test]
    fn two_character_operators_take_precedence() {
        assert_eq!(kinds("a<=b"), vec![
            TokenKind::UnquotedIdentifier,
            TokenKind::Lte,
            TokenKind::UnquotedIdentifier,
            TokenKind::Eof
        ]);
        assert_eq!(kinds("a==b"), vec![
            TokenKind::UnquotedIdentifier,
            TokenKind::Eq,
            TokenKind::UnquotedIdentifier,
            TokenKind::Eof
        ]);
        assert_eq!(kinds("!a"), vec![TokenKind::Not, TokenKind::UnquotedIdentifier, TokenKind::Eof]);
    }

    #[test]
    fn bare_equals_is_an_error() {
        assert!(tokenize("a=b").is_err());
    }

    #[test]
    fn empty_expression_is_an_error() {
        assert!(tokenize("").is_err());
    }

    #[test]
    fn quoted_identifier_decodes_escapes() {
        let tokens = tokenize(r#""a\nb""#).unwrap();
        match &tokens[0].value {
            TokenValue::Text(s) => assert_eq!(s, "a\nb"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn literal_parses_json() {
        let tokens = tokenize("`[1,2,3]`").unwrap();
        match &tokens[0].value {
            TokenValue::Literal(Value::Array(items)) => assert_eq!(items.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn literal_jep12_fallback_wraps_bare_word_as_string() {
        let tokens = tokenize("`foo`").unwrap();
        match &tokens[0].value {
            TokenValue::Literal(Value::String(s)) => assert_eq!(s, "foo"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unclosed_literal_is_a_lexer_error() {
        assert!(tokenize("`[1,2,3]").is_err());
    }

    #[test]
    fn ampersand_disambiguates_expref_from_and() {
        assert_eq!(kinds("&foo"), vec![TokenKind::Expref, TokenKind::UnquotedIdentifier, TokenKind::Eof]);
        assert_eq!(kinds("a&&b"), vec![
            TokenKind::UnquotedIdentifier,
            TokenKind::And,
            TokenKind::UnquotedIdentifier,
            TokenKind::Eof
        ]);
    }

    #[test]
    fn negative_number() {
        let tokens = tokenize("[-1]").unwrap();
        match &tokens[1].value {
            TokenValue::Number(n) => assert_eq!(*n, -1),
            other => panic!("unexpected {:?}", other),
        }
    }
}
