//! The metadata cache attached to every [`Node`](super::Node).
//!
//! The cache memoizes work done on a node: its fully-reduced form, which rules have already been
//! tried on it without success, and the alternative forms found for it during search. Each slot
//! is written **at most once**; later writes to an occupied slot are ignored. Since nodes are
//! immutable, a value computed for a node stays valid for as long as the rule set that produced it
//! is unchanged.
//!
//! The cache uses interior mutability and is **not** thread-safe. Nodes are `!Send`, so the
//! compiler enforces this.
//!
//! # Rule sets are fixed for the lifetime of a cached node
//!
//! Cached reduced forms and "tried" flags are never invalidated. If the rule set changes (for
//! example, a new [`Engine`](crate::Engine) is built with different rules), build fresh nodes for
//! it instead of reusing nodes that an older engine already reduced.
//!
//! The same holds for [`EngineOptions`](crate::EngineOptions). A node reduced under a larger depth
//! budget keeps its deeper reduced form, and an engine with a smaller budget reuses it. The one
//! exception is a depth budget of zero, which always returns the node as it is.

use crate::{context::Context, rule::RuleId};
use std::{any::{Any, TypeId}, cell::RefCell, collections::{hash_map::Entry, HashMap}, fmt, rc::Rc};

/// The key of a slot in the metadata cache.
///
/// Every engine-owned key carries the [`Context`] the value was computed under; the same node may
/// reduce differently inside a binder than outside of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaKey {
    /// The fully-reduced form of the node.
    Reduced(Context),

    /// Set once the given rule was tried on the node and did not apply.
    Tried(RuleId, Context),

    /// The alternative forms of the node found by search.
    Alternatives(Context),

    /// A slot for callers, keyed by a type of their choosing.
    Custom(TypeId),
}

impl MetaKey {
    /// Returns the custom key for the type `K`.
    pub fn custom<K: Any>() -> Self {
        Self::Custom(TypeId::of::<K>())
    }
}

/// A write-once map from [`MetaKey`]s to values of any type.
#[derive(Default)]
pub struct Meta {
    slots: RefCell<HashMap<MetaKey, Rc<dyn Any>>>,
}

impl fmt::Debug for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meta")
            .field("slots", &self.slots.borrow().len())
            .finish()
    }
}

impl Meta {
    /// Returns true if the slot is occupied.
    pub fn contains(&self, key: &MetaKey) -> bool {
        self.slots.borrow().contains_key(key)
    }

    /// Returns the value stored in the slot, if the slot is occupied by a value of type `T`.
    pub fn get<T: Any>(&self, key: &MetaKey) -> Option<Rc<T>> {
        let value = self.slots.borrow().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Stores a value in the slot. Returns false and drops the value if the slot was already
    /// occupied.
    pub fn insert<T: Any>(&self, key: MetaKey, value: T) -> bool {
        match self.slots.borrow_mut().entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Rc::new(value));
                true
            },
        }
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Returns true if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}
