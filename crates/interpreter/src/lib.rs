use std::rc::Rc;

use ast::{
    ast::List,
    hir::{Extension, Namespace, RFunc, Val},
    symbols::{SymbolId, SymbolTable},
};
use errors::{InterpretingError, ParsingError, ScmError};
use log::debug;
use smol_str::SmolStr;

pub mod builtins;
pub mod eval;
mod forms;


pub use eval::{eval, eval_arg, eval_args, eval_list, expect_arity, expect_at_least, nth_arg};

/// One interpreter instance: a symbol table and the root namespace that owns it.
pub struct Session {
    ns: Namespace<'static>,
}

impl Session {
    /// A session with the default catalog installed.
    pub fn new() -> Self {
        let session = Self::bare();
        builtins::background_ns(&session.ns);
        session
    }

    /// A session with nothing bound.
    pub fn bare() -> Self {
        Self {
            ns: Namespace::new_root(SymbolTable::new()),
        }
    }

    pub fn namespace(&self) -> &Namespace<'static> {
        &self.ns
    }

    pub fn register<S: Into<SmolStr>>(&self, name: S, ext: Rc<dyn Extension>) -> SymbolId {
        self.ns.register_native(name, ext)
    }

    pub fn register_fn<S, F>(&self, name: S, f: F) -> SymbolId
    where
        S: Into<SmolStr>,
        F: Fn(&List, &Namespace<'_>) -> RFunc + 'static,
    {
        self.ns.register_fn(name, f)
    }

    pub fn parse(&self, source: &str, text: &str) -> Result<Vec<Rc<List>>, ParsingError> {
        parser::parse(source, text, &mut self.ns.symbols_mut())
    }

    /// Evaluates every top-level form; an error only aborts its own form.
    pub fn run_each(
        &self,
        source: &str,
        text: &str,
    ) -> Result<Vec<Result<Val, InterpretingError>>, ParsingError> {
        let forms = self.parse(source, text)?;
        debug!("running {} forms from {source}", forms.len());

        Ok(forms.iter().map(|form| eval_list(form, &self.ns)).collect())
    }

    /// Evaluates forms in order up to the first error. `nil` for no forms.
    pub fn run(&self, source: &str, text: &str) -> Result<Val, ScmError> {
        let forms = self.parse(source, text)?;
        debug!("running {} forms from {source}", forms.len());

        let mut last = Val::Nil;
        for form in &forms {
            last = eval_list(form, &self.ns)?;
        }

        Ok(last)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run_on_src<S>(src: S) -> Result<Val, ScmError>
where
    S: AsRef<str>,
{
    Session::new().run("<src>", src.as_ref())
}
