//! Line-oriented front end shared by the binaries: comment stripping,
//! multi-line accumulation and the read-eval-print loop over one global
//! environment.

use crate::environment::{Environment, new_global_environment};
use crate::evaluator::eval;
use crate::parser::Parser;
use crate::types::Sexpr;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use tracing::debug;

/// The line that ends an interactive session.
pub const EXIT_COMMAND: &str = "exit";

/// Drops everything from the first `;` that is not inside a string.
pub fn strip_comment(line: &str) -> &str {
    scan_line(line, false).0
}

/// Strips comments from each line of `text`. A string left open at the end of
/// one line carries over to the next.
pub fn strip_comments(text: &str) -> String {
    let mut in_string = false;
    text.lines()
        .map(|line| {
            let (code, open) = scan_line(line, in_string);
            in_string = open;
            code
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Returns the line up to its comment, and whether it ends inside a string.
fn scan_line(line: &str, mut in_string: bool) -> (&str, bool) {
    for (index, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            ';' if !in_string => return (&line[..index], false),
            _ => {}
        }
    }
    (line, in_string)
}

/// Open minus close parentheses, ignoring those inside strings.
pub fn paren_balance(text: &str) -> i64 {
    let mut in_string = false;
    let mut depth = 0;
    for c in text.chars() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Collects input lines until their parentheses balance.
#[derive(Debug, Default)]
pub struct Accumulator {
    buffer: String,
    in_string: bool,
}

impl Accumulator {
    /// Adds a line. Returns the complete text once every open parenthesis
    /// has been closed.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let (code, in_string) = scan_line(line, self.in_string);
        self.in_string = in_string;
        self.buffer.push_str(code);
        self.buffer.push('\n');
        if paren_balance(&self.buffer) > 0 {
            return None;
        }
        self.finish()
    }

    /// Whether an unfinished expression is waiting for more lines.
    pub fn is_pending(&self) -> bool {
        !self.buffer.trim().is_empty()
    }

    /// Hands back whatever has been collected, balanced or not.
    pub fn finish(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.buffer);
        self.in_string = false;
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// One global environment reused by every expression of a run.
pub struct Session {
    env: Rc<RefCell<Environment>>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            env: new_global_environment(),
        }
    }

    pub fn env(&self) -> &Rc<RefCell<Environment>> {
        &self.env
    }

    /// Reads and evaluates the first expression in `text`.
    pub fn eval_str(&self, text: &str) -> Sexpr {
        eval(&crate::parser::parse(text), &self.env)
    }

    /// Evaluates every expression in `text` in order, returning each input
    /// with its result. A reader failure ends the chunk with its sentinel.
    pub fn eval_chunk(&self, text: &str) -> Vec<(Option<Sexpr>, Sexpr)> {
        let mut parser = Parser::new(text);
        let mut results = Vec::new();
        loop {
            match parser.next_expr() {
                Ok(Some(expr)) => {
                    let value = eval(&expr, &self.env);
                    results.push((Some(expr), value));
                }
                Ok(None) => break,
                Err(err) => {
                    debug!(error = %err, "reader failed");
                    results.push((None, err.fault().sentinel()));
                    break;
                }
            }
        }
        results
    }

    /// Feeds `input` line by line through the reader and evaluator, writing
    /// one printed result per expression. Stops at a lone `exit` line.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: &mut W, echo: bool) -> io::Result<()> {
        let mut accumulator = Accumulator::default();
        for line in input.lines() {
            let line = line?;
            if !accumulator.is_pending() && line.trim() == EXIT_COMMAND {
                break;
            }
            if let Some(text) = accumulator.push_line(&line) {
                self.write_results(&text, output, echo)?;
            }
        }
        // Unbalanced leftovers still go through the reader, which reports them
        if let Some(text) = accumulator.finish() {
            self.write_results(&text, output, echo)?;
        }
        output.flush()
    }

    fn write_results<W: Write>(&self, text: &str, output: &mut W, echo: bool) -> io::Result<()> {
        for (expr, value) in self.eval_chunk(text) {
            if echo && let Some(expr) = expr {
                writeln!(output, "> {}", expr)?;
            }
            writeln!(output, "{}", value)?;
        }
        Ok(())
    }
}
