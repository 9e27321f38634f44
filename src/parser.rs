use crate::Span;
use crate::evaluator::Fault;
use crate::lexer::{LexerError, LexerErrorKind, Token, TokenKind, spanned};
use crate::types::Sexpr;
use logos::{Logos, SpannedIter};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Parse Error [at {0}]: Unexpected ')'")]
    UnexpectedParen(Span),
    #[error("Parse Error: Unexpected end of input. Expected {0}")]
    UnexpectedEof(String, Span),
    #[error("Lexer Error during parse: {0}")]
    LexerError(#[from] LexerError), // Propagate lexer errors
}

impl ParseError {
    /// The sentinel class this error is reported as once it leaves the reader.
    pub fn fault(&self) -> Fault {
        match self {
            ParseError::UnexpectedParen(_) => Fault::UnexpectedParen,
            ParseError::UnexpectedEof(..) => Fault::UnexpectedEof,
            ParseError::LexerError(lex_err) => match lex_err.error {
                LexerErrorKind::UnterminatedString => Fault::UnterminatedString,
                LexerErrorKind::InvalidToken => Fault::InvalidToken,
            },
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedParen(span) | ParseError::UnexpectedEof(_, span) => *span,
            ParseError::LexerError(lex_err) => lex_err.span,
        }
    }
}

// Result type alias for convenience
pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent reader. Tokens are pulled lazily, so anything after the
/// first complete expression is never looked at by `parse_expr`.
pub struct Parser<'src> {
    tokens: SpannedIter<'src, TokenKind>,
    end: usize,
}

impl<'src> Parser<'src> {
    pub fn new(input: &'src str) -> Self {
        Parser {
            tokens: TokenKind::lexer(input).spanned(),
            end: input.len(),
        }
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> ParseResult<Option<Token>> {
        let token = self
            .tokens
            .next()
            .map(|(result, range)| spanned(result, range))
            .transpose()?;
        Ok(token)
    }

    fn eof_span(&self) -> Span {
        Span::new(self.end, self.end)
    }

    /// Parses a single S-expression from the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<Sexpr> {
        match self.next_token()? {
            Some(token) => self.parse_expr_with_token(token),
            None => Err(ParseError::UnexpectedEof(
                "an expression".to_string(),
                self.eof_span(),
            )),
        }
    }

    /// Parses the next top-level expression, or `None` once the input is used up.
    pub fn next_expr(&mut self) -> ParseResult<Option<Sexpr>> {
        match self.next_token()? {
            Some(token) => self.parse_expr_with_token(token).map(Some),
            None => Ok(None),
        }
    }

    fn parse_expr_with_token(&mut self, token: Token) -> ParseResult<Sexpr> {
        match token.kind {
            TokenKind::LParen => self.parse_list(token.span),
            TokenKind::RParen => Err(ParseError::UnexpectedParen(token.span)),
            TokenKind::Quote => self.parse_quoted_expr(),
            TokenKind::String(s) => Ok(Sexpr::String(s)),
            TokenKind::Atom(text) => Ok(parse_atom(&text)),
        }
    }

    /// Parses the rest of a list after its `(`. Elements are purely
    /// positional; a `.` is just another symbol.
    fn parse_list(&mut self, open: Span) -> ParseResult<Sexpr> {
        let mut items = Vec::new();
        loop {
            match self.next_token()? {
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => return Ok(Sexpr::list(items)),
                Some(token) => items.push(self.parse_expr_with_token(token)?),
                None => {
                    return Err(ParseError::UnexpectedEof(
                        format!("')' to close the list opened at {}", open),
                        self.eof_span().merge(open),
                    ));
                }
            }
        }
    }

    /// Parses a quoted expression `'expr` into `(quote expr)`.
    fn parse_quoted_expr(&mut self) -> ParseResult<Sexpr> {
        let quoted_expr = self.parse_expr()?;
        Ok(Sexpr::list(vec![Sexpr::symbol("quote"), quoted_expr]))
    }
}

/// Classifies an atom token. Tokens that start like a number and parse as one
/// completely become numbers; everything else is a symbol.
fn parse_atom(text: &str) -> Sexpr {
    let numeric_start = text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '.');
    if numeric_start && let Some(value) = text.parse::<f64>().ok().or_else(|| parse_hex(text)) {
        return Sexpr::number(value);
    }
    Sexpr::Symbol(text.to_string())
}

/// Hexadecimal numbers the way `strtod` reads them: `0x1F`, `-0x1.8`, `0x1p-2`.
fn parse_hex(text: &str) -> Option<f64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))?;
    let (mantissa, exponent) = match rest.split_once(['p', 'P']) {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().ok()?),
        None => (rest, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut value = 0.0_f64;
    for c in whole.chars() {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    let mut scale = 1.0 / 16.0;
    for c in fraction.chars() {
        value += f64::from(c.to_digit(16)?) * scale;
        scale /= 16.0;
    }
    value *= 2f64.powi(exponent);
    Some(if negative { -value } else { value })
}

/// Lexes and parses one expression, keeping the structured error.
pub fn read_str(input: &str) -> ParseResult<Sexpr> {
    Parser::new(input).parse_expr()
}

/// Reads every top-level expression in `input`.
pub fn read_all(input: &str) -> ParseResult<Vec<Sexpr>> {
    let mut parser = Parser::new(input);
    let mut expressions = Vec::new();
    while let Some(expr) = parser.next_expr()? {
        expressions.push(expr);
    }
    Ok(expressions)
}

/// Reads one expression. Reader failures come back as sentinel values.
pub fn parse(input: &str) -> Sexpr {
    read_str(input).unwrap_or_else(|err| {
        debug!(error = %err, "reader failed");
        err.fault().sentinel()
    })
}
