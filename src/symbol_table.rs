//! Lexical scope resolution: where a name lives, and how an inner function
//! reaches out to a name defined in an enclosing scope.
//!
//! Nested scopes chain through `outer`; `define` assigns `Scope::Global` at
//! the outermost table and `Scope::Local` in any nested one, and redefining
//! an existing name returns its original binding rather than shadowing it
//! with a new index. `resolve` walks outward through `outer`, and reifies a
//! name found past a function boundary as a new `Scope::Free` entry only the
//! first time it crosses that boundary — repeated lookups of an
//! already-free name return the existing entry instead of appending a
//! duplicate each time.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
    Builtin,
    Free,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: Scope,
    pub index: u16,
}

/// A single lexical scope, chained to its enclosing scope via `outer`.
#[derive(Debug, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    num_defs: u16,
    /// Names resolved from an enclosing scope, in the order first reified —
    /// a closure's `CLOSURE` instruction reads these back to know which
    /// outer-scope slots to capture.
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new scope nested inside `outer` (e.g. entering a function body).
    pub fn new_enclosed(outer: SymbolTable) -> Self {
        Self {
            outer: Some(Box::new(outer)),
            store: HashMap::new(),
            num_defs: 0,
            free_symbols: Vec::new(),
        }
    }

    /// Leave the current scope, handing back the enclosing one.
    pub fn pop(self) -> Option<SymbolTable> {
        self.outer.map(|b| *b)
    }

    /// Define `name` in this scope. Global at the outermost table, Local in
    /// any nested one. Redefining an already-defined name is a no-op that
    /// returns the original binding rather than allocating a new index.
    pub fn define(&mut self, name: &str) -> Symbol {
        if let Some(existing) = self.store.get(name) {
            return existing.clone();
        }

        let scope = if self.outer.is_none() {
            Scope::Global
        } else {
            Scope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_defs,
        };
        self.num_defs += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Register a host builtin by its registry index. Builtins always live
    /// in a flat `Scope::Builtin` namespace regardless of nesting depth.
    pub fn define_builtin(&mut self, index: u16, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: Scope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Look up `name`, walking outward through enclosing scopes. A name
    /// found in an enclosing *function* scope (anything but `Global` or
    /// `Builtin`) is reified as a `Scope::Free` entry in every scope between
    /// its definition and this one, so the compiler can emit `GET_FREE`
    /// instead of reaching across a closure boundary directly.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;

        match symbol.scope {
            Scope::Global | Scope::Builtin => Some(symbol),
            _ => Some(self.define_free(symbol)),
        }
    }

    /// Reify `original` as a free variable of this scope, reusing the
    /// existing entry if `original` was already reified here.
    fn define_free(&mut self, original: Symbol) -> Symbol {
        if let Some(existing) = self.store.get(&original.name) {
            if existing.scope == Scope::Free {
                return existing.clone();
            }
        }

        let index = self.free_symbols.len() as u16;
        self.free_symbols.push(original.clone());

        let symbol = Symbol {
            name: original.name.clone(),
            scope: Scope::Free,
            index,
        };
        self.store.insert(original.name, symbol.clone());
        symbol
    }

    pub fn num_definitions(&self) -> u16 {
        self.num_defs
    }
}
