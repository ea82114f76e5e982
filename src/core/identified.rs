//! Ordered collections keyed by stable identity.
//!
//! An [`IdentifiedVec`] replaces a position-indexed `Vec` wherever elements
//! are addressed from the outside (by actions, by effects). Positions shift
//! when elements are removed; identities do not, so an action addressed to
//! an element can never land on a different element.

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt::Debug;
use std::hash::Hash;

/// A value with a stable identity.
///
/// # Example
///
/// ```rust
/// use tether::core::Identifiable;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Attendee {
///     id: u32,
///     name: String,
/// }
///
/// impl Identifiable for Attendee {
///     type Id = u32;
///
///     fn id(&self) -> u32 {
///         self.id
///     }
/// }
/// ```
pub trait Identifiable {
    /// Identity type. Must never be reused for a different logical entity.
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;
}

/// Insertion-ordered collection keyed by element identity.
///
/// Lookups, inserts and updates by id are O(1) on average. Removal preserves
/// the order of the remaining elements. There is deliberately no positional
/// mutator: elements are reached through their id only.
///
/// # Example
///
/// ```rust
/// use tether::core::{Identifiable, IdentifiedVec};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Row {
///     id: u8,
///     label: &'static str,
/// }
///
/// impl Identifiable for Row {
///     type Id = u8;
///     fn id(&self) -> u8 {
///         self.id
///     }
/// }
///
/// let mut rows: IdentifiedVec<Row> = [Row { id: 1, label: "a" }, Row { id: 2, label: "b" }]
///     .into_iter()
///     .collect();
///
/// rows.update(&2, |row| row.label = "B");
/// rows.remove(&1);
/// rows.remove(&1); // no-op
///
/// assert_eq!(rows.ids().collect::<Vec<_>>(), vec![&2]);
/// assert_eq!(rows.get(&2).map(|r| r.label), Some("B"));
/// ```
#[derive(Clone, Debug)]
pub struct IdentifiedVec<T: Identifiable> {
    elements: IndexMap<T::Id, T>,
}

impl<T: Identifiable> Default for IdentifiedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identifiable> IdentifiedVec<T> {
    pub fn new() -> Self {
        Self {
            elements: IndexMap::new(),
        }
    }

    /// Insert an element.
    ///
    /// A new id is appended at the end. An existing id keeps its position and
    /// the previous value is returned.
    pub fn insert(&mut self, value: T) -> Option<T> {
        self.elements.insert(value.id(), value)
    }

    /// Remove the element with `id`. Missing ids are a no-op.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        self.elements.shift_remove(id)
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.elements.get(id)
    }

    /// Mutable access by id. Changing the element's identity through this
    /// reference is a logic error.
    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.elements.get_mut(id)
    }

    /// Apply `f` to the element with `id`. Returns `false` if absent.
    pub fn update<F>(&mut self, id: &T::Id, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.elements.get_mut(id) {
            Some(element) => {
                f(element);
                debug_assert!(
                    element.id() == *id,
                    "update must not change the identity of {id:?}"
                );
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &T::Id> + '_ {
        self.elements.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.elements.values()
    }

    pub fn first(&self) -> Option<&T> {
        self.elements.first().map(|(_, value)| value)
    }

    pub fn last(&self) -> Option<&T> {
        self.elements.last().map(|(_, value)| value)
    }
}

impl<T: Identifiable + PartialEq> PartialEq for IdentifiedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(other.elements.iter())
                .all(|(a, b)| a == b)
    }
}

impl<T: Identifiable> FromIterator<T> for IdentifiedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::new();
        for value in iter {
            collection.insert(value);
        }
        collection
    }
}

impl<T: Identifiable> IntoIterator for IdentifiedVec<T> {
    type Item = T;
    type IntoIter = indexmap::map::IntoValues<T::Id, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_values()
    }
}

impl<'a, T: Identifiable> IntoIterator for &'a IdentifiedVec<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, T::Id, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.values()
    }
}

impl<T: Identifiable + Serialize> Serialize for IdentifiedVec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.elements.values())
    }
}

impl<'de, T: Identifiable + Deserialize<'de>> Deserialize<'de> for IdentifiedVec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<T>::deserialize(deserializer)?;
        Ok(values.into_iter().collect())
    }
}
