use std::rc::Rc;

use ast::{
    ast::{Element, List},
    hir::{Callable, Namespace, RFunc, UserFunction, Val},
};
use errors::InterpretingError;
use log::trace;

use crate::eval::{eval, eval_arg, expect_arity, expect_at_least, nth_arg, symbol_name};

/// `(set name value)`: binds in the namespace the form is evaluated in.
fn set(list: &List, ns: &Namespace<'_>) -> RFunc {
    // the target is checked before the count
    let target = match list.get(1) {
        Some(target) => target,
        None => return expect_arity(list, 2).map(|()| Val::Nil),
    };
    let Some(id) = target.as_symbol() else {
        return Err(InterpretingError::CannotBindToNonSymbol {
            position: target.span().clone(),
        });
    };

    expect_arity(list, 2)?;

    let value = eval_arg(list, 2, ns)?.inner;
    trace!("{} set {} = {value}", list.span, symbol_name(id, ns));
    ns.set(id, value.clone());

    Ok(value)
}

fn condition(list: &List, ns: &Namespace<'_>) -> Result<bool, InterpretingError> {
    let cond = eval_arg(list, 1, ns)?;
    match cond.inner {
        Val::Bool(bool) => Ok(bool),
        other => Err(InterpretingError::OperandMustBeBoolean {
            position: cond.span,
            found: other.to_readable_type(),
        }),
    }
}

/// `(if cond then else)`
fn if_(list: &List, ns: &Namespace<'_>) -> RFunc {
    expect_arity(list, 3)?;

    let branch = if condition(list, ns)? { 2 } else { 3 };
    eval(nth_arg(list, branch)?, ns)
}

/// `(while cond body)`: the last body value, `nil` if the body never ran.
fn while_(list: &List, ns: &Namespace<'_>) -> RFunc {
    expect_arity(list, 2)?;

    let mut last = Val::Nil;
    while condition(list, ns)? {
        last = eval_arg(list, 2, ns)?.inner;
    }

    Ok(last)
}

/// `(func (params...) body)`
fn func(list: &List, _ns: &Namespace<'_>) -> RFunc {
    expect_arity(list, 2)?;

    let params = nth_arg(list, 1)?;
    let Some(params) = params.as_list() else {
        return Err(InterpretingError::ArgumentListMustBeSymbolsOnly {
            position: params.span().clone(),
        });
    };

    let params = params
        .elements
        .iter()
        .map(|param| {
            param
                .as_symbol()
                .ok_or_else(|| InterpretingError::ArgumentListMustBeSymbolsOnly {
                    position: param.span().clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let body: Element = nth_arg(list, 2)?.clone();
    trace!("{} defined <func/{}>", list.span, params.len());

    Ok(Val::Callable(Callable::Function(Rc::new(UserFunction {
        params,
        body,
    }))))
}

/// `(do expr...)`: evaluates in order, yielding the last value.
fn do_(list: &List, ns: &Namespace<'_>) -> RFunc {
    expect_at_least(list, 1)?;

    let mut last = Val::Nil;
    for element in list.args() {
        last = eval(element, ns)?;
    }

    Ok(last)
}

pub fn install(ns: &Namespace<'_>) {
    ns.register_fn("set", set);
    ns.register_fn("if", if_);
    ns.register_fn("while", while_);
    ns.register_fn("func", func);
    ns.register_fn("do", do_);
}
