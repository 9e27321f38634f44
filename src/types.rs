use crate::environment::Environment;
use crate::evaluator::Fault;
use std::cell::RefCell;
use std::fmt; // For custom display formatting
use std::rc::Rc;

/// Text of the canonical truth symbol.
pub const TRUTH: &str = "t";

/// A value in the interpreter. Code and data share this representation.
///
/// Every atom is immutable once built. Pairs and closures are reference
/// counted so that lists and captured environments can be shared freely.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Nil,            // Empty list and logical false, all in one
    Long(i64),      // Integral numbers
    Double(f64),    // Anything that isn't integral
    Symbol(String), // e.g., add, x, t
    String(String), // "hello", no escape processing
    Pair(Rc<Pair>),
    Closure(Rc<Closure>),
}

/// A cons cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub car: Sexpr,
    pub cdr: Sexpr,
}

/// A user-defined function together with the environment it was created in.
pub struct Closure {
    pub params: Sexpr,
    pub body: Sexpr,
    pub env: Rc<RefCell<Environment>>,
}

impl Closure {
    pub fn new(params: Sexpr, body: Sexpr, env: Rc<RefCell<Environment>>) -> Self {
        Closure { params, body, env }
    }

    pub fn arity(&self) -> usize {
        self.params.iter().count()
    }
}

// The captured environment usually refers back to this closure, so it is
// left out of the debug output.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

// Closures are only ever equal to themselves.
impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Sexpr {
    pub fn long(value: i64) -> Self {
        Sexpr::Long(value)
    }

    pub fn double(value: f64) -> Self {
        Sexpr::Double(value)
    }

    pub fn symbol(name: &str) -> Self {
        Sexpr::Symbol(name.to_string())
    }

    pub fn string(text: &str) -> Self {
        Sexpr::String(text.to_string())
    }

    pub fn truth() -> Self {
        Sexpr::symbol(TRUTH)
    }

    /// Builds a Long when `value` is exactly integral and fits an i64,
    /// otherwise a Double.
    pub fn number(value: f64) -> Self {
        // `as` saturates, so 2^63 itself must be kept out by the range check
        let in_range = value >= i64::MIN as f64 && value < -(i64::MIN as f64);
        if in_range && value.trunc() == value {
            Sexpr::Long(value as i64)
        } else {
            Sexpr::Double(value)
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value { Sexpr::truth() } else { Sexpr::Nil }
    }

    /// Builds a proper list out of `items`.
    pub fn list(items: Vec<Sexpr>) -> Self {
        items
            .into_iter()
            .rev()
            .fold(Sexpr::Nil, |tail, head| cons(head, tail))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Sexpr::Nil)
    }

    pub fn is_truthy(&self) -> bool {
        !self.is_nil()
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Sexpr::Pair(_))
    }

    /// Lists are Nil or a pair; anything else is an atom or a closure.
    pub fn is_list(&self) -> bool {
        matches!(self, Sexpr::Nil | Sexpr::Pair(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Sexpr::Long(_) | Sexpr::Double(_))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Iterates over the cars of a list, stopping at the first cdr that is
    /// not a pair.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { current: self }
    }
}

pub struct ListIter<'a> {
    current: &'a Sexpr,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Sexpr;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current {
            Sexpr::Pair(pair) => {
                self.current = &pair.cdr;
                Some(&pair.car)
            }
            _ => None,
        }
    }
}

// --- Constructors & accessors ---

pub fn cons(car: Sexpr, cdr: Sexpr) -> Sexpr {
    Sexpr::Pair(Rc::new(Pair { car, cdr }))
}

/// Head of a pair. The empty list is its own head; any other non-pair is a
/// type error.
pub fn car(value: &Sexpr) -> Sexpr {
    match value {
        Sexpr::Pair(pair) => pair.car.clone(),
        Sexpr::Nil => Sexpr::Nil,
        _ => Fault::NotAPair.sentinel(),
    }
}

/// Tail of a pair, with the same rules as `car`.
pub fn cdr(value: &Sexpr) -> Sexpr {
    match value {
        Sexpr::Pair(pair) => pair.cdr.clone(),
        Sexpr::Nil => Sexpr::Nil,
        _ => Fault::NotAPair.sentinel(),
    }
}

pub fn cadr(value: &Sexpr) -> Sexpr {
    car(&cdr(value))
}

pub fn cddr(value: &Sexpr) -> Sexpr {
    cdr(&cdr(value))
}

pub fn caddr(value: &Sexpr) -> Sexpr {
    car(&cddr(value))
}

pub fn cdddr(value: &Sexpr) -> Sexpr {
    cdr(&cddr(value))
}

pub fn cadddr(value: &Sexpr) -> Sexpr {
    car(&cdddr(value))
}

// --- Printer ---

/// Renders a value in its canonical textual form.
pub fn print(value: &Sexpr) -> String {
    value.to_string()
}

// Matches C's "%f".
fn write_double(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        write!(f, "nan")
    } else {
        write!(f, "{:.6}", value)
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Nil => write!(f, "()"),
            Sexpr::Long(n) => write!(f, "{}", n),
            Sexpr::Double(n) => write_double(f, *n),
            Sexpr::Symbol(s) => write!(f, "{}", s),
            Sexpr::String(s) => write!(f, "\"{}\"", s),
            Sexpr::Closure(_) => write!(f, "#<closure>"),
            Sexpr::Pair(pair) => {
                write!(f, "(")?;
                let mut current = pair;
                loop {
                    write!(f, "{}", current.car)?;
                    match &current.cdr {
                        Sexpr::Nil => break,
                        Sexpr::Pair(next) => {
                            write!(f, " ")?;
                            current = next;
                        }
                        // Dotted pair
                        tail => {
                            write!(f, " . {}", tail)?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
        }
    }
}
