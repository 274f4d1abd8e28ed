//! Interned identifiers for symbols and operator tags.

use std::{collections::HashMap, fmt, rc::Rc};

/// A symbol reference, such as `x` or `theta`.
///
/// Symbols are compared by identity first, then by name. Two symbols handed out by the same
/// [`Interner`] for the same name share an identity, while [`Interner::fresh_symbol`] creates a
/// symbol that is distinct from every other, even one with the same name (useful for the bound
/// variable of a binder).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    id: u32,
    name: Rc<str>,
}

impl Symbol {
    /// Returns the unique identifier of this symbol.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the name of this symbol.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An operator tag distinguishing kinds of branch nodes, such as `add` or `pow`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    id: u32,
    name: Rc<str>,
}

impl Tag {
    /// Returns the unique identifier of this tag.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the name of this tag.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A table that hands out [`Symbol`]s and [`Tag`]s.
///
/// Identifiers are assigned in creation order, so building the same expressions in the same order
/// always produces the same identifiers. There is no process-wide table; every caller owns the
/// interner its nodes were built with, and nodes built from different interners should not be
/// mixed.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    /// The next unique identifier to assign.
    next_id: u32,

    /// Symbols interned by name.
    symbols: HashMap<Rc<str>, Symbol>,

    /// Tags interned by name.
    tags: HashMap<Rc<str>, Tag>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unique identifier.
    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Returns the symbol with the given name, creating it if needed.
    pub fn symbol(&mut self, name: &str) -> Symbol {
        if let Some(symbol) = self.symbols.get(name) {
            return symbol.clone();
        }

        let symbol = Symbol { id: self.next_id(), name: name.into() };
        self.symbols.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Creates a symbol with the given name that is distinct from every other symbol, including
    /// the one [`Interner::symbol`] returns for the same name.
    pub fn fresh_symbol(&mut self, name: &str) -> Symbol {
        Symbol { id: self.next_id(), name: name.into() }
    }

    /// Returns the tag with the given name, creating it if needed.
    pub fn tag(&mut self, name: &str) -> Tag {
        if let Some(tag) = self.tags.get(name) {
            return tag.clone();
        }

        let tag = Tag { id: self.next_id(), name: name.into() };
        self.tags.insert(tag.name.clone(), tag.clone());
        tag
    }
}
