use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser as ArgParser;
use conslisp::session::{EXIT_COMMAND, paren_balance, strip_comments};
use conslisp::{Environment, Parser, Session, TokenKind, eval, evaluator, tokenize};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use tracing::Level;
use tracing_subscriber::EnvFilter;

const HISTORY_FILE: &str = "conslisp_history.txt";

/// Interactive line editor for the interpreter.
#[derive(ArgParser, Debug)]
#[command(name = "repl", version, about)]
struct Args {
    /// Use Vi key bindings instead of Emacs
    #[arg(long)]
    vi: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

struct LispCompleter {
    env: Rc<RefCell<Environment>>,
}

impl LispCompleter {
    fn new(env: Rc<RefCell<Environment>>) -> Self {
        LispCompleter { env }
    }
}

impl rustyline::completion::Completer for LispCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = match tokenize(&line[..pos]) {
            Ok(tokens) => match tokens.last().map(|t| t.kind.clone()) {
                Some(TokenKind::Atom(prefix)) if line[..pos].ends_with(&prefix) => prefix,
                _ => return Ok((pos, vec![])),
            },
            Err(_) => return Ok((pos, vec![])),
        };
        let mut candidates: Vec<String> = self
            .env
            .borrow()
            .get_identifiers()
            .union(&evaluator::special_form_identifiers())
            .filter(|id| id.starts_with(&prefix))
            .map(|id| id[prefix.len()..].to_string())
            .collect();
        candidates.sort();
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputHelper {
    #[rustyline(Validator)]
    validator: LispValidator,
    #[rustyline(Highlighter)]
    highlighter: LispHighlighter,
    #[rustyline(Completer)]
    completer: LispCompleter,
}

struct LispValidator;

impl Validator for LispValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let code = strip_comments(ctx.input());
        // Stray ')' are left to the reader, which reports them
        if paren_balance(&code) > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct LispHighlighter;

impl Highlighter for LispHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> std::borrow::Cow<'l, str> {
        // (char index, byte offset in `highlighted`) of each open paren
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::new();
        let mut in_string = false;

        for (i, c) in line.chars().enumerate() {
            if in_string {
                if c == '"' {
                    in_string = false;
                }
                highlighted.push_str(&format!("\x1b[32m{}\x1b[0m", c)); // Green for strings
                continue;
            }

            match c {
                '"' => {
                    in_string = true;
                    highlighted.push_str(&format!("\x1b[32m{}\x1b[0m", c));
                }
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((open, matching_pos)) if open + 1 == pos || i + 1 == pos => {
                        highlighted.push_str(&format!("\x1b[34m{}\x1b[0m", c)); // Blue for matching parens
                        highlighted.replace_range(matching_pos..=matching_pos, "\x1b[1;34m(\x1b[0m");
                    }
                    Some(_) => highlighted.push(c),
                    None => highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)), // Red for unmatched
                },
                _ => highlighted.push(c),
            }
        }

        std::borrow::Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn eval_input(session: &Session, input: &str) {
    let code = strip_comments(input);
    let mut parser = Parser::new(&code);
    loop {
        match parser.next_expr() {
            Ok(Some(expr)) => println!("{}", eval(&expr, session.env())),
            Ok(None) => break,
            Err(parse_err) => {
                if let Err(io_err) = parse_err.pretty_print("REPL", &code) {
                    eprintln!("Parse Error: {} ({})", parse_err, io_err);
                }
                println!("{}", parse_err.fault().sentinel());
                break;
            }
        }
    }
}

fn main() -> rustyline::Result<()> {
    let args = Args::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    println!("conslisp REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type '{}' or press Ctrl-D to quit.", EXIT_COMMAND);

    let session = Session::new();
    let helper = InputHelper {
        highlighter: LispHighlighter,
        validator: LispValidator,
        completer: LispCompleter::new(session.env().clone()),
    };
    let edit_mode = if args.vi {
        rustyline::EditMode::Vi
    } else {
        rustyline::EditMode::Emacs
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(edit_mode)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline("conslisp> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input == EXIT_COMMAND {
                    break;
                }
                eval_input(&session, trimmed_input);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type '{}' or Ctrl-D to quit.", EXIT_COMMAND);
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(HISTORY_FILE)
}
