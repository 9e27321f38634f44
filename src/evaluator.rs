use crate::environment::{Environment, lookup};
use crate::primitives::{PrimitiveFunc, find_primitive, primitive_names};
use crate::types::{Closure, Sexpr, cadddr, caddr, cadr, car, cdddr, cdr, cons};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

// --- Faults ---

/// Every way evaluation (or reading) can go wrong.
///
/// Faults are never raised. They are turned into ordinary symbol values with
/// [`Fault::sentinel`] and flow through the rest of the computation like any
/// other result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    // Reader
    #[error("UnterminatedString")]
    UnterminatedString,
    #[error("UnexpectedParen")]
    UnexpectedParen,
    #[error("UnexpectedEof")]
    UnexpectedEof,
    #[error("InvalidToken")]
    InvalidToken,
    // Type errors
    #[error("NotANumber")]
    NotANumber,
    #[error("NotAPair")]
    NotAPair,
    #[error("NotASymbol")]
    NotASymbol,
    #[error("TypeMismatch")]
    TypeMismatch,
    #[error("ListEquality")]
    ListEquality,
    // Everything else
    #[error("ArityMismatch")]
    ArityMismatch,
    #[error("DivideByZero")]
    DivideByZero,
    #[error("NoBranchMatched")]
    NoBranchMatched,
}

impl Fault {
    pub fn sentinel(self) -> Sexpr {
        Sexpr::Symbol(self.to_string())
    }
}

const SPECIAL_FORMS: &[&str] = &[
    "quote", "set", "define", "lambda", "cons", "car", "cdr", "and", "or", "if", "cond",
];

/// Names the evaluator handles itself: the syntax forms plus every primitive.
pub fn special_form_identifiers() -> HashSet<String> {
    SPECIAL_FORMS
        .iter()
        .copied()
        .chain(primitive_names())
        .map(str::to_string)
        .collect()
}

// --- Evaluate Function ---

/// Evaluates `expr` within `env`. Always produces a value; errors are
/// sentinel values.
pub fn eval(expr: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    trace!(%expr, "eval");
    match expr {
        Sexpr::Nil => Sexpr::Nil,

        // Self-evaluating
        Sexpr::Long(_) | Sexpr::Double(_) | Sexpr::String(_) | Sexpr::Closure(_) => expr.clone(),

        // Unbound symbols come back unchanged
        Sexpr::Symbol(_) => lookup(expr, env),

        Sexpr::Pair(pair) => {
            if let Sexpr::Symbol(name) = &pair.car
                && let Some(result) = evaluate_special_form(name, expr, env)
            {
                return result;
            }
            evaluate_application(expr, env)
        }
    }
}

fn evaluate_special_form(
    name: &str,
    form: &Sexpr,
    env: &Rc<RefCell<Environment>>,
) -> Option<Sexpr> {
    let result = match name {
        "quote" => cadr(form),
        "set" => evaluate_set(form, env),
        "define" => evaluate_define(form, env),
        "lambda" => evaluate_lambda(form, env),
        "cons" => {
            let head = eval(&cadr(form), env);
            let tail = eval(&caddr(form), env);
            cons(head, tail)
        }
        "car" => car(&eval(&cadr(form), env)),
        "cdr" => cdr(&eval(&cadr(form), env)),
        "and" => evaluate_and(form, env),
        "or" => evaluate_or(form, env),
        "if" => evaluate_if(form, env),
        "cond" => evaluate_cond(form, env),
        _ => {
            let primitive = find_primitive(name)?;
            match primitive.func {
                PrimitiveFunc::Unary(func) => func(&eval(&cadr(form), env)),
                PrimitiveFunc::Binary(func) => {
                    let left = eval(&cadr(form), env);
                    let right = eval(&caddr(form), env);
                    func(&left, &right)
                }
            }
        }
    };
    Some(result)
}

/// `(set S V)`: binds S in the current frame.
fn evaluate_set(form: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    match cadr(form) {
        Sexpr::Symbol(name) => {
            let value = eval(&caddr(form), env);
            debug!(%name, %value, "set");
            env.borrow_mut().define(name, value)
        }
        _ => Fault::NotASymbol.sentinel(),
    }
}

/// `(define S (P...) B)` or `(define S EXPR)`. Returns the symbol S.
fn evaluate_define(form: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    let symbol = cadr(form);
    let Sexpr::Symbol(name) = &symbol else {
        return Fault::NotASymbol.sentinel();
    };

    let value = if cdddr(form).is_pair() {
        Sexpr::Closure(Rc::new(Closure::new(
            caddr(form),
            cadddr(form),
            env.clone(),
        )))
    } else {
        eval(&caddr(form), env)
    };

    debug!(%name, %value, "define");
    env.borrow_mut().define(name.clone(), value);
    symbol
}

/// `(lambda (P...) B)`: captures the current frame by reference.
fn evaluate_lambda(form: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    Sexpr::Closure(Rc::new(Closure::new(cadr(form), caddr(form), env.clone())))
}

/// Short-circuits on Nil; otherwise yields the second operand's value.
fn evaluate_and(form: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    if eval(&cadr(form), env).is_nil() {
        Sexpr::Nil
    } else {
        eval(&caddr(form), env)
    }
}

/// Any non-Nil first operand yields the truth symbol, not the operand.
fn evaluate_or(form: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    if eval(&cadr(form), env).is_truthy() {
        Sexpr::truth()
    } else {
        eval(&caddr(form), env)
    }
}

fn evaluate_if(form: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    if eval(&cadr(form), env).is_truthy() {
        eval(&caddr(form), env)
    } else {
        eval(&cadddr(form), env)
    }
}

fn evaluate_cond(form: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    for clause in cdr(form).iter() {
        if eval(&car(clause), env).is_truthy() {
            return eval(&cadr(clause), env);
        }
    }
    Fault::NoBranchMatched.sentinel()
}

/// Calls a closure. Anything else in operator position leaves the whole
/// form unevaluated.
fn evaluate_application(form: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    let Sexpr::Closure(closure) = eval(&car(form), env) else {
        return form.clone();
    };

    // Arguments are evaluated in the caller's environment, left to right
    let args: Vec<Sexpr> = cdr(form).iter().map(|arg| eval(arg, env)).collect();
    apply(&closure, args)
}

/// Binds `args` to the closure's parameters in a fresh frame under its
/// captured environment and evaluates the body there.
pub fn apply(closure: &Closure, args: Vec<Sexpr>) -> Sexpr {
    let arity = closure.arity();
    if args.len() != arity {
        debug!(expected = arity, got = args.len(), "closure arity mismatch");
        return Fault::ArityMismatch.sentinel();
    }
    debug!(params = %closure.params, "apply closure");
    let frame = Environment::extend(&closure.params, args, closure.env.clone());
    eval(&closure.body, &frame)
}
