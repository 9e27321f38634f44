use crate::ParseError;
use ariadne::{Label, Report, ReportKind, Source};

impl ParseError {
    /// Writes an annotated report of this error against `input` to stderr.
    pub fn pretty_print(&self, source_id: &str, input: &str) -> std::io::Result<()> {
        let mut range = self.span().to_range();
        // Zero-width spans (end of input) still need one column to point at
        if range.is_empty() {
            range.end = range.start + 1;
        }
        let (message, label) = match self {
            ParseError::UnexpectedParen(_) => (
                "Unexpected ')'".to_string(),
                "There is no open list for this to close".to_string(),
            ),
            ParseError::UnexpectedEof(expected, _) => {
                ("Unexpected EOF".to_string(), format!("Expected {}", expected))
            }
            ParseError::LexerError(lex_err) => {
                ("Lexer Error".to_string(), lex_err.error.to_string())
            }
        };
        Report::build(ReportKind::Error, (source_id, range.clone()))
            .with_message(message)
            .with_note(format!("evaluates to {}", self.fault()))
            .with_label(Label::new((source_id, range)).with_message(label))
            .finish()
            .eprint((source_id, Source::from(input)))
    }
}
