use std::fmt;

use errors::UndefinedSymbolId;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Interned symbol. Only meaningful together with the table that produced it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Growth-only mapping between symbol spellings and sequential ids.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    ids: FxHashMap<SmolStr, SymbolId>,
    names: Vec<SmolStr>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }

        let id = SymbolId(self.names.len() as u32);
        let name = SmolStr::new(name);
        self.names.push(name.clone());
        self.ids.insert(name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: SymbolId) -> Result<&SmolStr, UndefinedSymbolId> {
        self.names
            .get(id.0 as usize)
            .ok_or(UndefinedSymbolId(id.0))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
