use crate::ast::{Ast, Comparator};
use crate::error::{ErrorKind, JmespathError};
use crate::interpreter::functions;
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind, TokenValue};

/// A Pratt (top-down operator-precedence) parser over the token stream
/// produced by [`crate::lexer::tokenize`]. `nud` handles a token in prefix
/// position, `led` handles one found while already holding a left-hand
/// expression; `expression(rbp)` is the usual precedence-climbing loop.
struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

/// Parse `src` into an [`Ast`]. The returned tree holds no reference to
/// `src`; callers needing source-position diagnostics on a later error
/// should attach it via [`JmespathError::with_expression`].
pub fn parse(src: &str) -> Result<Ast, JmespathError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, position: 0 };
    let ast = parser.expression(0)?;
    parser.expect_eof()?;
    Ok(ast)
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, JmespathError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.parse_error())
        }
    }

    fn expect_eof(&mut self) -> Result<(), JmespathError> {
        if self.peek().kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(self.parse_error())
        }
    }

    fn parse_error(&self) -> JmespathError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            return JmespathError::new(ErrorKind::IncompleteExpression, Some(token.start));
        }
        JmespathError::new(
            ErrorKind::ParseError {
                token_kind: token.kind,
                token_value: token.display_value(),
            },
            Some(token.start),
        )
    }

    /// Parse an expression whose operators bind at least as tightly as `rbp`.
    fn expression(&mut self, rbp: u8) -> Result<Ast, JmespathError> {
        let token = self.advance();
        let mut left = self.nud(&token)?;
        while rbp < self.peek().kind.lbp() {
            let token = self.advance();
            left = self.led(&token, left)?;
        }
        Ok(left)
    }

    fn nud(&mut self, token: &Token) -> Result<Ast, JmespathError> {
        match token.kind {
            TokenKind::Current => Ok(Ast::CurrentNode),
            TokenKind::QuotedIdentifier if self.peek().kind == TokenKind::LParen => {
                // Functions must be called by an unquoted name; `"name"(...)`
                // is rejected here rather than let `led_function_call` treat
                // it like `name(...)`.
                let next = self.peek();
                Err(JmespathError::new(
                    ErrorKind::ParseError {
                        token_kind: next.kind,
                        token_value: next.display_value(),
                    },
                    Some(next.start),
                ))
            }
            TokenKind::UnquotedIdentifier | TokenKind::QuotedIdentifier => {
                Ok(Ast::field(token.value.as_text()))
            }
            TokenKind::RawStringLiteral | TokenKind::Literal => match &token.value {
                TokenValue::Literal(v) => Ok(Ast::Literal(v.clone())),
                _ => unreachable!("lexer always attaches a literal value to this token kind"),
            },
            TokenKind::Star => {
                // Bare `*` at the start of an expression projects over the
                // current node's values, same as `@.*`.
                let right = self.parse_projection_rhs(20)?;
                Ok(Ast::ValueProjection(Box::new(Ast::Identity), Box::new(right)))
            }
            TokenKind::Flatten => {
                let right = self.parse_projection_rhs(9)?;
                Ok(Ast::Projection(
                    Box::new(Ast::Flatten(Box::new(Ast::Identity))),
                    Box::new(right),
                ))
            }
            TokenKind::Filter => self.led_filter(Ast::Identity),
            TokenKind::Not => {
                let operand = self.expression(45)?;
                Ok(Ast::NotExpression(Box::new(operand)))
            }
            TokenKind::LParen => {
                let inner = self.expression(0)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => self.nud_lbracket(),
            TokenKind::LBrace => self.parse_multi_select_hash(),
            TokenKind::Expref => {
                let expr = self.expression(60)?;
                Ok(Ast::ExpressionReference(Box::new(expr)))
            }
            // Running out of tokens mid-production (e.g. `foo.`, `abs(`,
            // `a ||`) always surfaces here, since `expression(rbp)`
            // unconditionally calls `nud` on whatever it advances past.
            // This must be `IncompleteExpression`, not a `ParseError`
            // naming `eof` as the unexpected token (spec §7).
            TokenKind::Eof => Err(JmespathError::new(ErrorKind::IncompleteExpression, Some(token.start))),
            _ => Err(JmespathError::new(
                ErrorKind::ParseError {
                    token_kind: token.kind,
                    token_value: token.display_value(),
                },
                Some(token.start),
            )),
        }
    }

    fn led(&mut self, token: &Token, left: Ast) -> Result<Ast, JmespathError> {
        match token.kind {
            TokenKind::Dot => {
                if self.peek().kind == TokenKind::Star {
                    self.advance();
                    let right = self.parse_projection_rhs(40)?;
                    Ok(Ast::ValueProjection(Box::new(left), Box::new(right)))
                } else {
                    let right = self.parse_dot_rhs(40)?;
                    Ok(Ast::SubExpression(Box::new(left), Box::new(right)))
                }
            }
            TokenKind::Pipe => {
                let right = self.expression(1)?;
                Ok(Ast::Pipe(Box::new(left), Box::new(right)))
            }
            TokenKind::Or => {
                let right = self.expression(2)?;
                Ok(Ast::OrExpression(Box::new(left), Box::new(right)))
            }
            TokenKind::And => {
                let right = self.expression(3)?;
                Ok(Ast::AndExpression(Box::new(left), Box::new(right)))
            }
            TokenKind::Eq | TokenKind::Ne | TokenKind::Lt | TokenKind::Lte | TokenKind::Gt | TokenKind::Gte => {
                let comparator = match token.kind {
                    TokenKind::Eq => Comparator::Eq,
                    TokenKind::Ne => Comparator::Ne,
                    TokenKind::Lt => Comparator::Lt,
                    TokenKind::Lte => Comparator::Lte,
                    TokenKind::Gt => Comparator::Gt,
                    TokenKind::Gte => Comparator::Gte,
                    _ => unreachable!(),
                };
                let right = self.expression(5)?;
                Ok(Ast::Comparator(comparator, Box::new(left), Box::new(right)))
            }
            TokenKind::Flatten => {
                let right = self.parse_projection_rhs(9)?;
                Ok(Ast::Projection(
                    Box::new(Ast::Flatten(Box::new(left))),
                    Box::new(right),
                ))
            }
            TokenKind::LBracket => self.led_lbracket(left),
            TokenKind::Filter => self.led_filter(left),
            TokenKind::LParen => self.led_function_call(left),
            _ => Err(JmespathError::new(
                ErrorKind::ParseError {
                    token_kind: token.kind,
                    token_value: token.display_value(),
                },
                Some(token.start),
            )),
        }
    }

    /// The right-hand side of `.` or a projection must itself be able to
    /// start a sub-expression but a bare `*`/`[...]` there is still valid.
    fn parse_dot_rhs(&mut self, rbp: u8) -> Result<Ast, JmespathError> {
        if self.peek().kind == TokenKind::LBracket {
            self.advance();
            return self.nud_lbracket();
        }
        self.expression(rbp)
    }

    /// The right-hand side of a projection. Per the fixed binding-power
    /// table, anything with `lbp < 10` (comparators, `||`, `|`, `&&`,
    /// `flatten`, closing tokens, `eof`) ends the projection with an
    /// implicit identity; `flatten` in particular must terminate here
    /// rather than nest into the rhs, so that `foo[*][]` parses as
    /// "flatten the projected array" and not "flatten each element".
    /// Otherwise only `dot`, `lbracket` and `filter` can continue the
    /// projection body; anything else at this position is a syntax error.
    fn parse_projection_rhs(&mut self, rbp: u8) -> Result<Ast, JmespathError> {
        if self.peek().kind.lbp() < 10 {
            return Ok(Ast::Identity);
        }
        match self.peek().kind {
            TokenKind::Dot => {
                self.advance();
                self.parse_dot_rhs(rbp)
            }
            TokenKind::LBracket | TokenKind::Filter => self.expression(rbp),
            _ => Err(self.parse_error()),
        }
    }

    /// `[` in prefix position also admits a multi-select-list
    /// (`[a, b]`), since there is no left-hand expression a bare list
    /// could otherwise be mistaken for an index against.
    fn nud_lbracket(&mut self) -> Result<Ast, JmespathError> {
        self.lbracket(Ast::Identity, true)
    }

    /// `[` in led position (directly after a left-hand expression) only
    /// admits `[number]`, `[*]`, or a slice — `foo[bar]` is not valid
    /// JMESPath, so the multi-select-list fallback does not apply here.
    fn led_lbracket(&mut self, left: Ast) -> Result<Ast, JmespathError> {
        self.lbracket(left, false)
    }

    fn lbracket(&mut self, left: Ast, allow_multi_select_list: bool) -> Result<Ast, JmespathError> {
        match self.peek().kind {
            TokenKind::Number | TokenKind::Colon => {
                let node = self.parse_bracket_index_or_slice()?;
                self.project_if_slice(left, node)
            }
            TokenKind::Star if self.token_after_star_is_rbracket() => {
                self.advance();
                self.expect(TokenKind::RBracket)?;
                let right = self.parse_projection_rhs(20)?;
                Ok(Ast::Projection(Box::new(left), Box::new(right)))
            }
            _ if allow_multi_select_list => {
                let list = self.parse_multi_select_list()?;
                Ok(Ast::IndexExpression(Box::new(left), Box::new(list)))
            }
            _ => Err(self.parse_error()),
        }
    }

    /// A slice bracket keeps the expression open for a following
    /// projection right-hand side (`foo[0:5].bar` maps `.bar` over the
    /// sliced elements); a plain index does not.
    fn project_if_slice(&mut self, left: Ast, node: Ast) -> Result<Ast, JmespathError> {
        let index_expr = Ast::IndexExpression(Box::new(left), Box::new(node.clone()));
        if matches!(node, Ast::Slice { .. }) {
            let right = self.parse_projection_rhs(20)?;
            Ok(Ast::Projection(Box::new(index_expr), Box::new(right)))
        } else {
            Ok(index_expr)
        }
    }

    fn token_after_star_is_rbracket(&self) -> bool {
        self.tokens
            .get(self.position + 1)
            .map(|t| t.kind == TokenKind::RBracket)
            .unwrap_or(false)
    }

    /// Parses the inside of an already-opened `[` as either `N`, `:stop`,
    /// `start:stop`, or `start:stop:step`, through the closing `]`.
    fn parse_bracket_index_or_slice(&mut self) -> Result<Ast, JmespathError> {
        if self.peek().kind == TokenKind::Number && self.token_after_number_is_rbracket() {
            let n = self.parse_signed_number()?;
            self.expect(TokenKind::RBracket)?;
            return Ok(Ast::Index(n));
        }
        let start = self.parse_optional_slice_part()?;
        self.expect(TokenKind::Colon)?;
        let stop = self.parse_optional_slice_part()?;
        let step = if self.peek().kind == TokenKind::Colon {
            self.advance();
            self.parse_optional_slice_part()?.unwrap_or(1)
        } else {
            1
        };
        self.expect(TokenKind::RBracket)?;
        Ok(Ast::Slice { start, stop, step })
    }

    fn token_after_number_is_rbracket(&self) -> bool {
        self.tokens
            .get(self.position + 1)
            .map(|t| t.kind == TokenKind::RBracket)
            .unwrap_or(false)
    }

    fn parse_optional_slice_part(&mut self) -> Result<Option<i64>, JmespathError> {
        if self.peek().kind == TokenKind::Number {
            Ok(Some(self.parse_signed_number()?))
        } else {
            Ok(None)
        }
    }

    fn parse_signed_number(&mut self) -> Result<i64, JmespathError> {
        let token = self.expect(TokenKind::Number)?;
        match token.value {
            TokenValue::Number(n) => Ok(n),
            _ => unreachable!("number tokens always carry a TokenValue::Number"),
        }
    }

    fn led_filter(&mut self, left: Ast) -> Result<Ast, JmespathError> {
        let predicate = self.expression(0)?;
        self.expect(TokenKind::RBracket)?;
        let right = self.parse_projection_rhs(21)?;
        Ok(Ast::FilterProjection {
            left: Box::new(left),
            right: Box::new(right),
            predicate: Box::new(predicate),
        })
    }

    fn parse_multi_select_list(&mut self) -> Result<Ast, JmespathError> {
        let mut items = vec![self.expression(0)?];
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            items.push(self.expression(0)?);
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Ast::MultiSelectList(items))
    }

    fn parse_multi_select_hash(&mut self) -> Result<Ast, JmespathError> {
        let mut pairs = vec![self.parse_keyval_pair()?];
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            pairs.push(self.parse_keyval_pair()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Ast::MultiSelectHash(pairs))
    }

    fn parse_keyval_pair(&mut self) -> Result<(String, Ast), JmespathError> {
        let key_token = self.advance();
        let key = match key_token.kind {
            TokenKind::UnquotedIdentifier | TokenKind::QuotedIdentifier => {
                key_token.value.as_text().to_string()
            }
            _ => {
                return Err(JmespathError::new(
                    ErrorKind::ParseError {
                        token_kind: key_token.kind,
                        token_value: key_token.display_value(),
                    },
                    Some(key_token.start),
                ))
            }
        };
        self.expect(TokenKind::Colon)?;
        let value = self.expression(0)?;
        Ok((key, value))
    }

    fn led_function_call(&mut self, left: Ast) -> Result<Ast, JmespathError> {
        let name = match &left {
            Ast::Field(name) => name.clone(),
            _ => {
                let token = self.peek();
                return Err(JmespathError::new(
                    ErrorKind::ParseError {
                        token_kind: token.kind,
                        token_value: token.display_value(),
                    },
                    Some(token.start),
                ));
            }
        };
        let mut args = Vec::new();
        if self.peek().kind != TokenKind::RParen {
            args.push(self.parse_function_arg()?);
            while self.peek().kind == TokenKind::Comma {
                self.advance();
                args.push(self.parse_function_arg()?);
            }
        }
        self.expect(TokenKind::RParen)?;

        let signature = functions::lookup_signature(&name).ok_or_else(|| {
            JmespathError::new(
                ErrorKind::UnknownFunction {
                    function_name: name.clone(),
                },
                None,
            )
        })?;
        signature.check_arity(&name, args.len())?;

        Ok(Ast::FunctionExpression(name, args))
    }

    /// A function argument is an expression, or `&expr` wrapped as an
    /// expression reference; `&` already has a `nud` so this is just
    /// `expression(0)`.
    fn parse_function_arg(&mut self) -> Result<Ast, JmespathError> {
        self.expression(0)
    }
}
