//! Opaque payloads carried by [`Kind::Opaque`](super::Kind::Opaque) leaves.

use std::{
    any::{Any, TypeId},
    cmp::Ordering,
    fmt::{Debug, Display},
    hash::{Hash, Hasher},
};

/// A non-algebraic value stored in a leaf node.
///
/// This is implemented for every type that is [`Ord`], [`Hash`], [`Debug`] and [`Display`], so a
/// matrix handle, a string label, or an index into some external table can all be stored in a
/// node without the engine knowing anything about them. Payloads of different types never compare
/// equal, and are ordered by type name first.
pub trait Payload: Any + Debug + Display {
    /// Returns the payload as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// The name of the concrete type of the payload.
    fn type_name(&self) -> &'static str;

    /// Returns true if both payloads are of the same type and equal.
    fn payload_eq(&self, other: &dyn Payload) -> bool;

    /// Compares two payloads, ordering payloads of different types by type name.
    fn payload_cmp(&self, other: &dyn Payload) -> Ordering;

    /// Feeds the payload into the given hasher.
    fn payload_hash(&self, state: &mut dyn Hasher);
}

impl<T> Payload for T
where
    T: Any + Debug + Display + Ord + Hash,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn payload_eq(&self, other: &dyn Payload) -> bool {
        other.as_any()
            .downcast_ref::<T>()
            .map(|other| self == other)
            .unwrap_or(false)
    }

    fn payload_cmp(&self, other: &dyn Payload) -> Ordering {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self.cmp(other),
            None => self.type_name()
                .cmp(other.type_name())
                .then_with(|| TypeId::of::<T>().cmp(&other.as_any().type_id())),
        }
    }

    fn payload_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_compares_by_value() {
        let a: &dyn Payload = &3u8;
        let b: &dyn Payload = &5u8;
        assert!(a.payload_eq(&3u8));
        assert!(!a.payload_eq(b));
        assert_eq!(a.payload_cmp(b), Ordering::Less);
    }

    #[test]
    fn different_types_never_equal() {
        let a: &dyn Payload = &3u8;
        let b: &dyn Payload = &String::from("3");
        assert!(!a.payload_eq(b));
        assert_ne!(a.payload_cmp(b), Ordering::Equal);
        assert_eq!(a.payload_cmp(b), b.payload_cmp(a).reverse());
    }
}
