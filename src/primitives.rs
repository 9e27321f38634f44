//! Built-in operations reachable as special forms.
//!
//! Every primitive takes already-evaluated operands and always returns a
//! value. Bad input comes back as a sentinel rather than an `Err`.

use crate::evaluator::Fault;
use crate::types::Sexpr;

/// How many operands a primitive consumes from its form.
#[derive(Clone, Copy)]
pub enum PrimitiveFunc {
    Unary(fn(&Sexpr) -> Sexpr),
    Binary(fn(&Sexpr, &Sexpr) -> Sexpr),
}

pub struct Primitive {
    pub name: &'static str,
    pub func: PrimitiveFunc,
}

static PRIMITIVES: &[Primitive] = &[
    // Arithmetic
    Primitive { name: "add", func: PrimitiveFunc::Binary(prim_add) },
    Primitive { name: "sub", func: PrimitiveFunc::Binary(prim_sub) },
    Primitive { name: "mul", func: PrimitiveFunc::Binary(prim_mul) },
    Primitive { name: "div", func: PrimitiveFunc::Binary(prim_div) },
    Primitive { name: "mod", func: PrimitiveFunc::Binary(prim_mod) },
    // Comparison
    Primitive { name: "lt", func: PrimitiveFunc::Binary(prim_less_than) },
    Primitive { name: "gt", func: PrimitiveFunc::Binary(prim_greater_than) },
    Primitive { name: "lte", func: PrimitiveFunc::Binary(prim_less_than_or_equals) },
    Primitive { name: "gte", func: PrimitiveFunc::Binary(prim_greater_than_or_equals) },
    Primitive { name: "eq", func: PrimitiveFunc::Binary(prim_eq) },
    // Logic and type predicates
    Primitive { name: "not", func: PrimitiveFunc::Unary(prim_not) },
    Primitive { name: "nil?", func: PrimitiveFunc::Unary(prim_is_nil) },
    Primitive { name: "symbol?", func: PrimitiveFunc::Unary(prim_is_symbol) },
    Primitive { name: "number?", func: PrimitiveFunc::Unary(prim_is_number) },
    Primitive { name: "string?", func: PrimitiveFunc::Unary(prim_is_string) },
    Primitive { name: "list?", func: PrimitiveFunc::Unary(prim_is_list) },
];

pub fn find_primitive(name: &str) -> Option<&'static Primitive> {
    PRIMITIVES.iter().find(|primitive| primitive.name == name)
}

pub fn primitive_names() -> impl Iterator<Item = &'static str> {
    PRIMITIVES.iter().map(|primitive| primitive.name)
}

/// Numeric view of a value; only Long and Double have one.
pub fn get_number(value: &Sexpr) -> Option<f64> {
    match value {
        Sexpr::Long(n) => Some(*n as f64),
        Sexpr::Double(n) => Some(*n),
        _ => None,
    }
}

fn numbers(a: &Sexpr, b: &Sexpr) -> Result<(f64, f64), Fault> {
    match (get_number(a), get_number(b)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(Fault::NotANumber),
    }
}

fn arithmetic<F: Fn(f64, f64) -> Result<f64, Fault>>(a: &Sexpr, b: &Sexpr, func: F) -> Sexpr {
    match numbers(a, b).and_then(|(x, y)| func(x, y)) {
        Ok(result) => Sexpr::number(result),
        Err(fault) => fault.sentinel(),
    }
}

fn compare<F: Fn(f64, f64) -> bool>(a: &Sexpr, b: &Sexpr, compare: F) -> Sexpr {
    match numbers(a, b) {
        Ok((x, y)) => Sexpr::from_bool(compare(x, y)),
        Err(fault) => fault.sentinel(),
    }
}

pub fn prim_add(a: &Sexpr, b: &Sexpr) -> Sexpr {
    arithmetic(a, b, |x, y| Ok(x + y))
}

pub fn prim_sub(a: &Sexpr, b: &Sexpr) -> Sexpr {
    arithmetic(a, b, |x, y| Ok(x - y))
}

pub fn prim_mul(a: &Sexpr, b: &Sexpr) -> Sexpr {
    arithmetic(a, b, |x, y| Ok(x * y))
}

pub fn prim_div(a: &Sexpr, b: &Sexpr) -> Sexpr {
    arithmetic(a, b, |x, y| {
        if y == 0.0 {
            Err(Fault::DivideByZero)
        } else {
            Ok(x / y)
        }
    })
}

/// Integer remainder of the truncated operands.
pub fn prim_mod(a: &Sexpr, b: &Sexpr) -> Sexpr {
    arithmetic(a, b, |x, y| {
        let divisor = y as i64;
        if divisor == 0 {
            Err(Fault::DivideByZero)
        } else {
            Ok((x as i64).wrapping_rem(divisor) as f64)
        }
    })
}

pub fn prim_less_than(a: &Sexpr, b: &Sexpr) -> Sexpr {
    compare(a, b, |x, y| x < y)
}

pub fn prim_greater_than(a: &Sexpr, b: &Sexpr) -> Sexpr {
    compare(a, b, |x, y| x > y)
}

pub fn prim_less_than_or_equals(a: &Sexpr, b: &Sexpr) -> Sexpr {
    compare(a, b, |x, y| x <= y)
}

pub fn prim_greater_than_or_equals(a: &Sexpr, b: &Sexpr) -> Sexpr {
    compare(a, b, |x, y| x >= y)
}

/// Atom equality. Lists of any shape are refused, even identical ones.
pub fn prim_eq(a: &Sexpr, b: &Sexpr) -> Sexpr {
    match (a, b) {
        (Sexpr::Symbol(x), Sexpr::Symbol(y)) | (Sexpr::String(x), Sexpr::String(y)) => {
            Sexpr::from_bool(x == y)
        }
        _ if a.is_list() && b.is_list() => Fault::ListEquality.sentinel(),
        _ => match (get_number(a), get_number(b)) {
            (Some(x), Some(y)) => Sexpr::from_bool(x == y),
            _ => Fault::TypeMismatch.sentinel(),
        },
    }
}

pub fn prim_not(a: &Sexpr) -> Sexpr {
    Sexpr::from_bool(a.is_nil())
}

// --- Type Predicates ---

pub fn prim_is_nil(a: &Sexpr) -> Sexpr {
    Sexpr::from_bool(a.is_nil())
}

pub fn prim_is_symbol(a: &Sexpr) -> Sexpr {
    Sexpr::from_bool(matches!(a, Sexpr::Symbol(_)))
}

pub fn prim_is_number(a: &Sexpr) -> Sexpr {
    Sexpr::from_bool(a.is_number())
}

pub fn prim_is_string(a: &Sexpr) -> Sexpr {
    Sexpr::from_bool(matches!(a, Sexpr::String(_)))
}

pub fn prim_is_list(a: &Sexpr) -> Sexpr {
    Sexpr::from_bool(a.is_list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{cons, print};

    fn long(n: i64) -> Sexpr {
        Sexpr::long(n)
    }

    fn sym(s: &str) -> Sexpr {
        Sexpr::symbol(s)
    }

    fn assert_prints(value: Sexpr, expected: &str) {
        assert_eq!(print(&value), expected);
    }

    #[test]
    fn test_arithmetic() {
        let point5 = Sexpr::double(2.5);
        assert_prints(prim_add(&long(2), &long(3)), "5");
        assert_prints(prim_add(&point5, &long(3)), "5.500000");
        assert_prints(prim_sub(&long(10), &long(4)), "6");
        assert_prints(prim_sub(&long(10), &point5), "7.500000");
        assert_prints(prim_mul(&long(3), &long(4)), "12");
        assert_prints(prim_mul(&point5, &long(4)), "10");
        assert_prints(prim_div(&long(10), &long(2)), "5");
        assert_prints(prim_div(&long(10), &long(4)), "2.500000");
        assert_prints(prim_mod(&long(10), &long(3)), "1");
        assert_prints(prim_mod(&long(10), &long(5)), "0");
        assert_prints(prim_mod(&long(-7), &long(2)), "-1");
    }

    #[test]
    fn test_results_are_canonicalized() {
        assert_eq!(prim_mul(&point(2.5), &long(4)), Sexpr::Long(10));
        assert_eq!(prim_add(&point(0.5), &point(0.25)), Sexpr::Double(0.75));
    }

    fn point(n: f64) -> Sexpr {
        Sexpr::double(n)
    }

    #[test]
    fn test_divide_by_zero() {
        let div = prim_div(&long(10), &long(0));
        let rem = prim_mod(&long(10), &long(0));
        assert_eq!(div, Fault::DivideByZero.sentinel());
        assert_eq!(print(&div), print(&rem));
        // The divisor is truncated before the check
        assert_eq!(prim_mod(&long(10), &point(0.5)), Fault::DivideByZero.sentinel());
        assert_prints(prim_div(&long(1), &point(0.5)), "2");
    }

    #[test]
    fn test_arithmetic_type_errors() {
        assert_eq!(prim_add(&long(1), &sym("a")), Fault::NotANumber.sentinel());
        assert_eq!(
            prim_div(&Sexpr::string("x"), &long(0)),
            Fault::NotANumber.sentinel()
        );
        assert_eq!(prim_mul(&Sexpr::Nil, &long(2)), Fault::NotANumber.sentinel());
    }

    #[test]
    fn test_comparison() {
        assert_prints(prim_less_than(&long(2), &long(3)), "t");
        assert_prints(prim_less_than(&long(3), &long(2)), "()");
        assert_prints(prim_greater_than(&long(5), &long(2)), "t");
        assert_prints(prim_greater_than(&long(2), &long(5)), "()");
        assert_prints(prim_less_than_or_equals(&long(2), &long(2)), "t");
        assert_prints(prim_less_than_or_equals(&long(3), &long(2)), "()");
        assert_prints(prim_greater_than_or_equals(&long(3), &long(2)), "t");
        assert_prints(prim_greater_than_or_equals(&long(2), &long(3)), "()");
        assert_prints(prim_less_than(&point(1.5), &long(2)), "t");
    }

    #[test]
    fn test_comparison_type_errors() {
        assert_prints(prim_less_than(&sym("a"), &sym("b")), "NotANumber");
        assert_prints(prim_greater_than(&long(2), &sym("b")), "NotANumber");
        assert_prints(prim_less_than_or_equals(&sym("a"), &long(2)), "NotANumber");
        assert_prints(prim_greater_than_or_equals(&long(2), &Sexpr::Nil), "NotANumber");
    }

    #[test]
    fn test_eq_atoms() {
        assert_prints(prim_eq(&long(2), &long(2)), "t");
        assert_prints(prim_eq(&long(2), &point(2.5)), "()");
        assert_prints(prim_eq(&long(2), &point(2.0)), "t");
        assert_prints(prim_eq(&sym("a"), &sym("a")), "t");
        assert_prints(prim_eq(&sym("a"), &sym("b")), "()");
        assert_prints(prim_eq(&Sexpr::string("hi"), &Sexpr::string("hi")), "t");
        assert_prints(prim_eq(&Sexpr::truth(), &sym("t")), "t");
    }

    #[test]
    fn test_eq_type_mismatch() {
        assert_eq!(prim_eq(&long(1), &sym("a")), Fault::TypeMismatch.sentinel());
        assert_eq!(
            prim_eq(&sym("a"), &Sexpr::string("a")),
            Fault::TypeMismatch.sentinel()
        );
        assert_eq!(prim_eq(&Sexpr::Nil, &long(1)), Fault::TypeMismatch.sentinel());
    }

    #[test]
    fn test_eq_refuses_lists() {
        let list1 = Sexpr::list(vec![long(1), long(2), long(3)]);
        let list2 = Sexpr::list(vec![long(1), long(2), long(3)]);
        assert_eq!(prim_eq(&list1, &list2), Fault::ListEquality.sentinel());
        assert_eq!(prim_eq(&list1, &list1), Fault::ListEquality.sentinel());
        assert_eq!(
            prim_eq(&Sexpr::Nil, &cons(long(1), Sexpr::Nil)),
            Fault::ListEquality.sentinel()
        );
    }

    #[test]
    fn test_not() {
        assert_prints(prim_not(&Sexpr::Nil), "t");
        assert_prints(prim_not(&Sexpr::truth()), "()");
        assert_prints(prim_not(&long(0)), "()");
    }

    #[test]
    fn test_type_predicates() {
        assert_prints(prim_is_nil(&Sexpr::Nil), "t");
        assert_prints(prim_is_nil(&long(5)), "()");
        assert_prints(prim_is_number(&long(123)), "t");
        assert_prints(prim_is_number(&point(3.14)), "t");
        assert_prints(prim_is_number(&sym("x")), "()");
        assert_prints(prim_is_symbol(&sym("x")), "t");
        assert_prints(prim_is_symbol(&Sexpr::string("hi")), "()");
        assert_prints(prim_is_string(&Sexpr::string("hello")), "t");
        assert_prints(prim_is_string(&long(42)), "()");
        assert_prints(prim_is_list(&Sexpr::Nil), "t");
        assert_prints(prim_is_list(&cons(long(1), Sexpr::Nil)), "t");
        assert_prints(prim_is_list(&sym("y")), "()");
    }

    #[test]
    fn test_registry() {
        assert!(find_primitive("add").is_some());
        assert!(matches!(
            find_primitive("not").map(|p| p.func),
            Some(PrimitiveFunc::Unary(_))
        ));
        assert!(find_primitive("+").is_none());
        assert_eq!(primitive_names().count(), 16);
    }
}
