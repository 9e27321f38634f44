use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

// Whitespace is the C `isspace` set. Comments are not special here; the
// session strips them before text reaches the reader.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\x0B\x0C]+")]
#[logos(error = LexerErrorKind)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("'")]
    Quote,
    // No escapes: the string runs to the next literal '"'.
    #[regex(r#""[^"]*"?"#, |lex| {
        let slice = lex.slice();
        let len = slice.len();
        // make sure string was terminated
        if len == 1 || !slice.ends_with('"') {
            return Err(LexerErrorKind::UnterminatedString);
        }
        Ok(slice[1..len - 1].to_string())
    })]
    String(String),
    // Numbers and symbols share one token shape; the parser tells them apart.
    #[regex(r#"[^ \t\n\r\x0B\x0C()'"][^ \t\n\r\x0B\x0C()]*"#, |lex| lex.slice().to_string())]
    Atom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

// Implement Display for easy printing
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Quote => write!(f, "'"),
            TokenKind::Atom(s) => write!(f, "{}", s),
            TokenKind::String(s) => write!(f, "\"{}\"", s), // Display with quotes for clarity
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Error)]
pub enum LexerErrorKind {
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[default]
    #[error("Invalid Token")]
    InvalidToken,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct LexerError {
    pub error: LexerErrorKind,
    pub span: Span,
}

// Result type alias for convenience
type LexerRangedResult<T> = Result<T, LexerError>;

/// Turns one raw logos item into a spanned token.
pub(crate) fn spanned(
    result: Result<TokenKind, LexerErrorKind>,
    range: std::ops::Range<usize>,
) -> LexerRangedResult<Token> {
    let span = Span::from(range);
    match result {
        Ok(kind) => Ok(Token { kind, span }),
        Err(error) => Err(LexerError { error, span }),
    }
}

// Helper function to tokenize a string directly (useful for tests and the REPL)
pub fn tokenize(input: &str) -> LexerRangedResult<Vec<Token>> {
    TokenKind::lexer(input)
        .spanned() // This yields (Result<TokenKind, LexerErrorKind>, Range<usize>)
        .map(|(result, range)| spanned(result, range))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to simplify testing token sequences
    fn assert_tokens(input: &str, expected: Vec<TokenKind>) {
        match tokenize(input) {
            Ok(tokens) => {
                let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
                assert_eq!(kinds, expected, "Input: '{}'", input);
            }
            Err(e) => panic!("Lexing failed for input '{}': {}", input, e.error),
        }
    }

    // Helper to simplify testing for lexer errors
    fn assert_lexer_error(input: &str, expected_error: LexerErrorKind) {
        match tokenize(input) {
            Ok(tokens) => panic!(
                "Expected lexing to fail for input '{}', but got tokens: {:?}",
                input, tokens
            ),
            Err(e) => assert_eq!(e.error, expected_error, "Input: '{}'", input),
        }
    }

    fn atom(s: &str) -> TokenKind {
        TokenKind::Atom(s.to_string())
    }

    #[test]
    fn test_empty_input() {
        assert_tokens("", vec![]);
        assert_tokens(" \t\n ", vec![]);
    }

    #[test]
    fn test_parentheses_and_quote() {
        assert_tokens("()", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens("( )", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens(" ' ", vec![TokenKind::Quote]);
        assert_tokens(
            "(')",
            vec![TokenKind::LParen, TokenKind::Quote, TokenKind::RParen],
        );
    }

    #[test]
    fn test_atoms() {
        assert_tokens(
            "foo 123 -4.5 .5 add",
            vec![atom("foo"), atom("123"), atom("-4.5"), atom(".5"), atom("add")],
        );
        assert_tokens("nil?", vec![atom("nil?")]);
        assert_tokens("1.5abc", vec![atom("1.5abc")]);
    }

    #[test]
    fn test_atom_stops_at_parens_only() {
        assert_tokens(
            "(a(b)c)",
            vec![
                TokenKind::LParen,
                atom("a"),
                TokenKind::LParen,
                atom("b"),
                TokenKind::RParen,
                atom("c"),
                TokenKind::RParen,
            ],
        );
        // Quotes inside an atom belong to the atom
        assert_tokens("a'b", vec![atom("a'b")]);
        assert_tokens("ab\"c", vec![atom("ab\"c")]);
        // Semicolons are not comments at this level
        assert_tokens(";x", vec![atom(";x")]);
    }

    #[test]
    fn test_dot_is_an_atom() {
        assert_tokens(
            " a . b ",
            vec![atom("a"), atom("."), atom("b")],
        );
    }

    #[test]
    fn test_strings() {
        assert_tokens(r#""hello""#, vec![TokenKind::String("hello".to_string())]);
        assert_tokens(
            r#""with space""#,
            vec![TokenKind::String("with space".to_string())],
        );
        assert_tokens(r#""""#, vec![TokenKind::String(String::new())]);
        // Backslashes are kept as-is
        assert_tokens(
            r#""a\nb""#,
            vec![TokenKind::String("a\\nb".to_string())],
        );
        assert_tokens(
            r#"("x"y)"#,
            vec![
                TokenKind::LParen,
                TokenKind::String("x".to_string()),
                atom("y"),
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_lexer_error(r#""hello"#, LexerErrorKind::UnterminatedString);
        assert_lexer_error(r#"""#, LexerErrorKind::UnterminatedString);
        assert_lexer_error(r#"(a "b)"#, LexerErrorKind::UnterminatedString);
    }

    #[test]
    fn test_tokenize_spans() {
        let input = "(add 1)";
        let tokens = tokenize(input).expect("Should tokenize successfully");

        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].span, Span { start: 0, end: 1 });
        assert_eq!(tokens[1].kind, atom("add"));
        assert_eq!(tokens[1].span, Span { start: 1, end: 4 });
        assert_eq!(tokens[2].span, Span { start: 5, end: 6 });
        assert_eq!(tokens[3].span, Span { start: 6, end: 7 });
    }
}
