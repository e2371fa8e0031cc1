use ast::{
    ast::{Element, List},
    hir::{Callable, Namespace, RFunc, TVal, UserFunction, Val},
    symbols::SymbolId,
    trivia::{new, Position},
};
use errors::InterpretingError;
use log::trace;
use smol_str::SmolStr;

pub fn eval(element: &Element, ns: &Namespace<'_>) -> RFunc {
    match element {
        Element::List(list) => eval_list(list, ns),
        Element::Int(int) => Ok(Val::Int(int.inner)),
        Element::Float(float) => Ok(Val::Float(float.inner)),
        Element::String(str) => Ok(Val::String(str.inner.clone())),
        Element::Symbol(sym) => lookup(sym.inner, &sym.span, ns),
    }
}

fn lookup(id: SymbolId, span: &Position, ns: &Namespace<'_>) -> RFunc {
    ns.get(id)
        .ok_or_else(|| InterpretingError::UndefinedSymbol {
            position: span.clone(),
            name: symbol_name(id, ns),
        })
}

/// Falls back to the id's display form for ids the table never handed out.
pub fn symbol_name(id: SymbolId, ns: &Namespace<'_>) -> SmolStr {
    ns.symbol_name(id)
        .unwrap_or_else(|_| SmolStr::new(id.to_string()))
}

/// Evaluates the head, then dispatches: user functions get their arguments
/// evaluated in `ns`, natives get the raw list.
pub fn eval_list(list: &List, ns: &Namespace<'_>) -> RFunc {
    let Some(head) = list.get(0) else {
        return Err(InterpretingError::EmptyListNotAllowed {
            position: list.span.clone(),
        });
    };

    match eval(head, ns)? {
        Val::Callable(Callable::Function(func)) => call_function(&func, list, ns),
        Val::Callable(Callable::Native(native)) => {
            trace!("{} dispatching native {}", list.span, native.name);
            native.ext.call(list, ns)
        }
        other => Err(InterpretingError::FirstElementMustBeCallable {
            position: head.span().clone(),
            found: other.to_readable_type(),
        }),
    }
}

fn call_function(func: &UserFunction, list: &List, ns: &Namespace<'_>) -> RFunc {
    expect_arity(list, func.params.len())?;
    let args = eval_args(list, ns)?;

    trace!("{} calling <func/{}>", list.span, func.params.len());

    let local = Namespace::child_of_root(ns);
    for (param, arg) in func.params.iter().zip(args) {
        local.set(*param, arg.inner);
    }

    eval(&func.body, &local)
}

/// The raw element at `index`; the head is index 0.
pub fn nth_arg(list: &List, index: usize) -> Result<&Element, InterpretingError> {
    list.get(index)
        .ok_or_else(|| InterpretingError::ArgumentCountMismatch {
            position: list.span.clone(),
            expected: index,
            actual: list.len().saturating_sub(1),
        })
}

pub fn eval_arg(list: &List, index: usize, ns: &Namespace<'_>) -> Result<TVal, InterpretingError> {
    let element = nth_arg(list, index)?;
    Ok(new(eval(element, ns)?, element.span().clone()))
}

/// Every argument, left to right, stopping at the first error.
pub fn eval_args(list: &List, ns: &Namespace<'_>) -> Result<Vec<TVal>, InterpretingError> {
    list.args()
        .iter()
        .map(|element| Ok(new(eval(element, ns)?, element.span().clone())))
        .collect()
}

pub fn expect_arity(list: &List, expected: usize) -> Result<(), InterpretingError> {
    let actual = list.len().saturating_sub(1);
    if actual != expected {
        return Err(InterpretingError::ArgumentCountMismatch {
            position: list.span.clone(),
            expected,
            actual,
        });
    }

    Ok(())
}

pub fn expect_at_least(list: &List, minimum: usize) -> Result<(), InterpretingError> {
    let actual = list.len().saturating_sub(1);
    if actual < minimum {
        return Err(InterpretingError::InsufficientArguments {
            position: list.span.clone(),
            minimum,
            actual,
        });
    }

    Ok(())
}
