use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

use errors::{InterpretingError, UndefinedSymbolId};
use log::debug;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::{
    ast::{Element, List},
    symbols::{SymbolId, SymbolTable},
    trivia::Trivia,
};

pub type TVal = Trivia<Val>;
pub type RFunc = Result<Val, InterpretingError>;

/// A host-side operation. It receives the whole call list, head included,
/// unevaluated, along with the caller's namespace.
pub trait Extension {
    fn call(&self, list: &List, ns: &Namespace<'_>) -> RFunc;
}

struct FnExtension<F>(F);

impl<F> Extension for FnExtension<F>
where
    F: Fn(&List, &Namespace<'_>) -> RFunc,
{
    fn call(&self, list: &List, ns: &Namespace<'_>) -> RFunc {
        (self.0)(list, ns)
    }
}

#[derive(Clone)]
pub struct Native {
    pub name: SmolStr,
    pub ext: Rc<dyn Extension>,
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Native").field("name", &self.name).finish()
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.ext).cast::<()>() == Rc::as_ptr(&other.ext).cast::<()>()
    }
}

#[derive(Debug, PartialEq)]
pub struct UserFunction {
    pub params: Vec<SymbolId>,
    pub body: Element,
}

#[derive(Clone, Debug)]
pub enum Callable {
    Function(Rc<UserFunction>),
    Native(Native),
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Function(l), Self::Function(r)) => Rc::ptr_eq(l, r),
            (Self::Native(l), Self::Native(r)) => l == r,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Val {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(SmolStr),
    Callable(Callable),
}

impl Val {
    pub fn to_readable_type(&self) -> SmolStr {
        match self {
            Val::Nil => "Nil",
            Val::Bool(_) => "Bool",
            Val::Int(_) => "Int",
            Val::Float(_) => "Float",
            Val::String(_) => "String",
            Val::Callable(Callable::Function(_)) => "Function",
            Val::Callable(Callable::Native(_)) => "Builtin",
        }
        .into()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Val::Int(_) | Val::Float(_))
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Nil => write!(f, "nil"),
            Val::Bool(bool) => write!(f, "{bool}"),
            Val::Int(int) => write!(f, "{int}"),
            Val::Float(float) => write!(f, "{float:?}"),
            Val::String(str) => write!(f, "{str}"),
            Val::Callable(Callable::Function(func)) => write!(f, "<func/{}>", func.params.len()),
            Val::Callable(Callable::Native(native)) => write!(f, "<builtin {}>", native.name),
        }
    }
}

enum Scope<'r> {
    Root(RefCell<SymbolTable>),
    Child(&'r Namespace<'r>),
}

/// A binding table. The root owns the symbol table; every other namespace is
/// a call-local scope whose parent is the root.
pub struct Namespace<'r> {
    bindings: RefCell<FxHashMap<SymbolId, Val>>,
    scope: Scope<'r>,
}

impl Namespace<'static> {
    pub fn new_root(symbols: SymbolTable) -> Self {
        Self {
            bindings: RefCell::default(),
            scope: Scope::Root(RefCell::new(symbols)),
        }
    }
}

impl<'r> Namespace<'r> {
    /// A fresh, empty scope parented to the root of `ns`, never to `ns` itself.
    pub fn child_of_root(ns: &'r Namespace<'_>) -> Namespace<'r> {
        Namespace {
            bindings: RefCell::default(),
            scope: Scope::Child(ns.root()),
        }
    }

    pub fn root(&self) -> &Namespace<'r> {
        match &self.scope {
            Scope::Root(_) => self,
            Scope::Child(parent) => parent.root(),
        }
    }

    pub fn parent(&self) -> Option<&Namespace<'r>> {
        match &self.scope {
            Scope::Root(_) => None,
            Scope::Child(parent) => Some(*parent),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.scope, Scope::Root(_))
    }

    pub fn get(&self, id: SymbolId) -> Option<Val> {
        if let Some(val) = self.bindings.borrow().get(&id) {
            return Some(val.clone());
        }

        self.parent().and_then(|parent| parent.get(id))
    }

    /// Binds in this namespace only.
    pub fn set(&self, id: SymbolId, val: Val) {
        self.bindings.borrow_mut().insert(id, val);
    }

    fn table(&self) -> &RefCell<SymbolTable> {
        match &self.scope {
            Scope::Root(symbols) => symbols,
            Scope::Child(parent) => parent.table(),
        }
    }

    pub fn symbols(&self) -> Ref<'_, SymbolTable> {
        self.table().borrow()
    }

    pub fn symbols_mut(&self) -> RefMut<'_, SymbolTable> {
        self.table().borrow_mut()
    }

    pub fn intern(&self, name: &str) -> SymbolId {
        self.symbols_mut().intern(name)
    }

    pub fn symbol_name(&self, id: SymbolId) -> Result<SmolStr, UndefinedSymbolId> {
        self.symbols().name_of(id).cloned()
    }

    /// Binds `name` in the root, whichever namespace this is called through.
    pub fn register_native<S: Into<SmolStr>>(&self, name: S, ext: Rc<dyn Extension>) -> SymbolId {
        let name = name.into();
        let root = self.root();
        let id = root.intern(&name);

        debug!("registering native {name} as {id}");
        root.set(id, Val::Callable(Callable::Native(Native { name, ext })));

        id
    }

    pub fn register_fn<S, F>(&self, name: S, f: F) -> SymbolId
    where
        S: Into<SmolStr>,
        F: Fn(&List, &Namespace<'_>) -> RFunc + 'static,
    {
        self.register_native(name, Rc::new(FnExtension(f)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trivia::Position;

    fn root() -> Namespace<'static> {
        Namespace::new_root(SymbolTable::new())
    }

    #[test]
    fn test_lookup_walks_to_root() {
        let root = root();
        let x = root.intern("x");
        let y = root.intern("y");
        root.set(x, Val::Int(1));

        let local = Namespace::child_of_root(&root);
        local.set(y, Val::Int(2));

        assert_eq!(local.get(x), Some(Val::Int(1)));
        assert_eq!(local.get(y), Some(Val::Int(2)));
        assert_eq!(root.get(y), None);

        // shadowing stays local
        local.set(x, Val::Int(3));
        assert_eq!(local.get(x), Some(Val::Int(3)));
        assert_eq!(root.get(x), Some(Val::Int(1)));
    }

    #[test]
    fn test_children_parent_to_root() {
        let root = root();
        let x = root.intern("x");

        let outer = Namespace::child_of_root(&root);
        outer.set(x, Val::Bool(true));

        let inner = Namespace::child_of_root(&outer);
        assert!(inner.parent().is_some_and(Namespace::is_root));
        assert_eq!(inner.get(x), None);
        assert!(std::ptr::eq(inner.root(), &root));
    }

    #[test]
    fn test_register_targets_root() {
        let root = root();
        let local = Namespace::child_of_root(&root);

        let id = local.register_fn("answer", |_, _| Ok(Val::Int(42)));

        assert_eq!(root.symbol_name(id).as_deref(), Ok("answer"));
        match root.get(id) {
            Some(Val::Callable(Callable::Native(native))) => {
                assert_eq!(native.name, "answer");
                let list = List::new(crate::ast::Bracket::Paren, Position::new("t", 1, 1));
                assert_eq!(native.ext.call(&list, &local), Ok(Val::Int(42)));
            }
            other => panic!("expected a native, got {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Val::Int(6).to_string(), "6");
        assert_eq!(Val::Float(6.0).to_string(), "6.0");
        assert_eq!(Val::Float(f64::INFINITY).to_string(), "inf");
        assert_eq!(Val::Bool(false).to_string(), "false");
        assert_eq!(Val::Nil.to_string(), "nil");
        assert_eq!(Val::String("hi".into()).to_string(), "hi");
    }
}
