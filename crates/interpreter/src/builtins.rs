use std::{cmp::Ordering, rc::Rc};

use ast::{
    ast::List,
    hir::{Extension, Namespace, RFunc, TVal, Val},
};
use errors::InterpretingError;
use native_derive::native;
use parser::{parse_float, parse_integer};
use smol_str::SmolStr;

use crate::{
    eval::{eval_arg, eval_args, expect_arity, expect_at_least},
    forms,
};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

fn readable(val: &TVal) -> SmolStr {
    val.inner.to_readable_type()
}

fn int_operand(val: &TVal) -> Result<i64, InterpretingError> {
    match val.inner {
        Val::Int(int) => Ok(int),
        _ => Err(InterpretingError::OperandMustBeInteger {
            position: val.span.clone(),
            found: readable(val),
        }),
    }
}

fn bool_operand(val: &TVal) -> Result<bool, InterpretingError> {
    match val.inner {
        Val::Bool(bool) => Ok(bool),
        _ => Err(InterpretingError::OperandMustBeBoolean {
            position: val.span.clone(),
            found: readable(val),
        }),
    }
}

fn to_f64(val: &Val) -> Option<f64> {
    match val {
        Val::Int(int) => Some(*int as f64),
        Val::Float(float) => Some(*float),
        _ => None,
    }
}

fn int_op(op: Arith, l: i64, r: i64, rhs: &TVal) -> RFunc {
    let result = match op {
        Arith::Add => l.checked_add(r),
        Arith::Sub => l.checked_sub(r),
        Arith::Mul => l.checked_mul(r),
        Arith::Div if r == 0 => {
            return Err(InterpretingError::DivisionByZero {
                position: rhs.span.clone(),
            })
        }
        Arith::Div => l.checked_div(r),
    };

    result
        .map(Val::Int)
        .ok_or_else(|| InterpretingError::ArithmeticOverflow {
            position: rhs.span.clone(),
        })
}

fn float_op(op: Arith, l: f64, r: f64) -> Val {
    Val::Float(match op {
        Arith::Add => l + r,
        Arith::Sub => l - r,
        Arith::Mul => l * r,
        Arith::Div => l / r,
    })
}

fn combine(op: Arith, lhs: &Val, rhs: &TVal) -> RFunc {
    match (lhs, &rhs.inner) {
        (Val::Int(l), Val::Int(r)) => int_op(op, *l, *r, rhs),
        (Val::Int(l), Val::Float(r)) => Ok(float_op(op, *l as f64, *r)),
        (Val::Float(l), Val::Int(r)) => Ok(float_op(op, *l, *r as f64)),
        (Val::Float(l), Val::Float(r)) => Ok(float_op(op, *l, *r)),

        (Val::String(l), r @ (Val::Int(_) | Val::Float(_) | Val::Bool(_) | Val::String(_))) => {
            Ok(Val::String(format!("{l}{r}").into()))
        }
        (Val::String(_), r) => Err(InterpretingError::TypeMismatch {
            position: rhs.span.clone(),
            expected: "String".into(),
            found: r.to_readable_type(),
        }),
        (l, Val::String(_)) => Err(InterpretingError::TypeMismatch {
            position: rhs.span.clone(),
            expected: l.to_readable_type(),
            found: "String".into(),
        }),

        (_, r) => Err(InterpretingError::NonArithmeticDataType {
            position: rhs.span.clone(),
            found: r.to_readable_type(),
        }),
    }
}

/// Left fold over two or more operands. Any Float operand turns the running
/// value into a Float; a leading String makes `+` concatenate.
fn arithmetic(op: Arith, list: &List, ns: &Namespace<'_>) -> RFunc {
    expect_at_least(list, 2)?;

    let first = eval_arg(list, 1, ns)?;
    match &first.inner {
        Val::Int(_) | Val::Float(_) => {}
        Val::String(_) if op == Arith::Add => {}
        other => {
            return Err(InterpretingError::NonArithmeticDataType {
                position: first.span.clone(),
                found: other.to_readable_type(),
            })
        }
    }

    let mut acc = first.inner;
    for index in 2..list.len() {
        let rhs = eval_arg(list, index, ns)?;
        acc = combine(op, &acc, &rhs)?;
    }

    Ok(acc)
}

#[native(%)]
fn rem(_list: &List, lhs: &TVal, rhs: &TVal) -> RFunc {
    let (l, r) = (int_operand(lhs)?, int_operand(rhs)?);
    if r == 0 {
        return Err(InterpretingError::DivisionByZero {
            position: rhs.span.clone(),
        });
    }

    l.checked_rem(r)
        .map(Val::Int)
        .ok_or_else(|| InterpretingError::ArithmeticOverflow {
            position: rhs.span.clone(),
        })
}

fn ordering(lhs: &TVal, rhs: &TVal) -> Result<Option<Ordering>, InterpretingError> {
    match (&lhs.inner, &rhs.inner) {
        (Val::Int(l), Val::Int(r)) => Ok(Some(l.cmp(r))),
        (Val::String(l), Val::String(r)) => Ok(Some(l.cmp(r))),
        (l, r) => match (to_f64(l), to_f64(r)) {
            (Some(l), Some(r)) => Ok(l.partial_cmp(&r)),
            _ if l.is_numeric() || matches!(l, Val::String(_)) => {
                Err(InterpretingError::TypeMismatch {
                    position: rhs.span.clone(),
                    expected: l.to_readable_type(),
                    found: r.to_readable_type(),
                })
            }
            _ => Err(InterpretingError::NonArithmeticDataType {
                position: lhs.span.clone(),
                found: l.to_readable_type(),
            }),
        },
    }
}

macro_rules! comparison {
    ($name:ident, $sym:tt, $($ord:pat_param)|+) => {
        #[native($sym)]
        fn $name(_list: &List, lhs: &TVal, rhs: &TVal) -> RFunc {
            Ok(Val::Bool(matches!(ordering(lhs, rhs)?, Some($($ord)|+))))
        }
    };
}

comparison!(lt, <, Ordering::Less);
comparison!(le, <=, Ordering::Less | Ordering::Equal);
comparison!(gt, >, Ordering::Greater);
comparison!(ge, >=, Ordering::Greater | Ordering::Equal);

fn equal(lhs: &TVal, rhs: &TVal) -> Result<bool, InterpretingError> {
    match (&lhs.inner, &rhs.inner) {
        (Val::Int(l), Val::Int(r)) => Ok(l == r),
        (l, r) => match (to_f64(l), to_f64(r)) {
            (Some(l), Some(r)) => Ok(l == r),
            _ if l.to_readable_type() == r.to_readable_type() => Ok(l == r),
            _ => Err(InterpretingError::TypeMismatch {
                position: rhs.span.clone(),
                expected: l.to_readable_type(),
                found: r.to_readable_type(),
            }),
        },
    }
}

fn eq(list: &List, ns: &Namespace<'_>) -> RFunc {
    expect_at_least(list, 2)?;

    let args = eval_args(list, ns)?;
    let mut result = true;
    for pair in args.windows(2) {
        result &= equal(&pair[0], &pair[1])?;
    }

    Ok(Val::Bool(result))
}

#[native]
fn not(_list: &List, value: &TVal) -> RFunc {
    Ok(Val::Bool(!bool_operand(value)?))
}

/// `and` stops at the first `false`, `or` at the first `true`.
fn logic(list: &List, ns: &Namespace<'_>, stop_at: bool) -> RFunc {
    expect_at_least(list, 2)?;

    for index in 1..list.len() {
        if bool_operand(&eval_arg(list, index, ns)?)? == stop_at {
            return Ok(Val::Bool(stop_at));
        }
    }

    Ok(Val::Bool(!stop_at))
}

fn bitwise(list: &List, ns: &Namespace<'_>, f: fn(i64, i64) -> i64) -> RFunc {
    expect_at_least(list, 2)?;

    let mut acc = int_operand(&eval_arg(list, 1, ns)?)?;
    for index in 2..list.len() {
        acc = f(acc, int_operand(&eval_arg(list, index, ns)?)?);
    }

    Ok(Val::Int(acc))
}

fn bxor(list: &List, ns: &Namespace<'_>) -> RFunc {
    expect_at_least(list, 1)?;

    let mut acc = int_operand(&eval_arg(list, 1, ns)?)?;
    if list.len() == 2 {
        return Ok(Val::Int(!acc));
    }
    for index in 2..list.len() {
        acc ^= int_operand(&eval_arg(list, index, ns)?)?;
    }

    Ok(Val::Int(acc))
}

fn shift_count(val: &TVal) -> Result<u32, InterpretingError> {
    let count = int_operand(val)?;
    u32::try_from(count)
        .ok()
        .filter(|count| *count < i64::BITS)
        .ok_or_else(|| InterpretingError::ValueOutOfRange {
            position: val.span.clone(),
            value: count,
            min: 0,
            max: i64::from(i64::BITS - 1),
        })
}

#[native]
fn lshift(_list: &List, value: &TVal, count: &TVal) -> RFunc {
    Ok(Val::Int(int_operand(value)?.wrapping_shl(shift_count(count)?)))
}

#[native]
fn rshift(_list: &List, value: &TVal, count: &TVal) -> RFunc {
    Ok(Val::Int(int_operand(value)?.wrapping_shr(shift_count(count)?)))
}

fn to_str(list: &List, ns: &Namespace<'_>) -> RFunc {
    expect_at_least(list, 1)?;

    let mut out = String::new();
    for arg in eval_args(list, ns)? {
        out.push_str(&arg.inner.to_string());
    }

    Ok(Val::String(out.into()))
}

fn invalid_number<S: Into<SmolStr>>(val: &TVal, text: S) -> InterpretingError {
    InterpretingError::InvalidNumber {
        position: val.span.clone(),
        text: text.into(),
    }
}

fn not_convertible(val: &TVal) -> InterpretingError {
    InterpretingError::TypeMismatch {
        position: val.span.clone(),
        expected: "Int, Float or String".into(),
        found: readable(val),
    }
}

/// Truncates toward zero.
#[native]
fn int(_list: &List, value: &TVal) -> RFunc {
    match &value.inner {
        Val::Int(int) => Ok(Val::Int(*int)),
        Val::Float(float) => {
            // 2^63, exact in f64
            const LIMIT: f64 = 9.223_372_036_854_775_808e18;
            if float.is_finite() && (-LIMIT..LIMIT).contains(float) {
                Ok(Val::Int(float.trunc() as i64))
            } else {
                Err(invalid_number(value, value.inner.to_string()))
            }
        }
        Val::String(text) => parse_integer(text.trim())
            .map(Val::Int)
            .ok_or_else(|| invalid_number(value, text.clone())),
        _ => Err(not_convertible(value)),
    }
}

#[native]
fn float(_list: &List, value: &TVal) -> RFunc {
    match &value.inner {
        Val::Int(int) => Ok(Val::Float(*int as f64)),
        Val::Float(float) => Ok(Val::Float(*float)),
        Val::String(text) => {
            let text = text.trim();
            parse_integer(text)
                .map(|int| int as f64)
                .or_else(|| parse_float(text))
                .map(Val::Float)
                .ok_or_else(|| invalid_number(value, text))
        }
        _ => Err(not_convertible(value)),
    }
}

/// Installs the default catalog and the `true`, `false` and `nil` constants
/// into the root of `ns`.
pub fn background_ns(ns: &Namespace<'_>) {
    let root = ns.root();

    for (name, val) in [
        ("true", Val::Bool(true)),
        ("false", Val::Bool(false)),
        ("nil", Val::Nil),
    ] {
        let id = root.intern(name);
        root.set(id, val);
    }

    root.register_fn("+", |list, ns| arithmetic(Arith::Add, list, ns));
    root.register_fn("-", |list, ns| arithmetic(Arith::Sub, list, ns));
    root.register_fn("*", |list, ns| arithmetic(Arith::Mul, list, ns));
    root.register_fn("/", |list, ns| arithmetic(Arith::Div, list, ns));

    root.register_fn("eq", eq);
    root.register_fn("and", |list, ns| logic(list, ns, false));
    root.register_fn("or", |list, ns| logic(list, ns, true));

    root.register_fn("band", |list, ns| bitwise(list, ns, |l, r| l & r));
    root.register_fn("bor", |list, ns| bitwise(list, ns, |l, r| l | r));
    root.register_fn("bxor", bxor);

    root.register_fn("str", to_str);

    let fixed: [(SmolStr, Rc<dyn Extension>); 10] = [
        rem(),
        lt(),
        le(),
        gt(),
        ge(),
        not(),
        lshift(),
        rshift(),
        int(),
        float(),
    ];
    for (name, ext) in fixed {
        root.register_native(name, ext);
    }

    forms::install(root);
}
