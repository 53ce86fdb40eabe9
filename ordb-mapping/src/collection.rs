//! Collection-valued fields.
//!
//! Each supported target container implements [`CollectionShape`], which
//! tells the builder how to allocate an instance of the requested length
//! and how to place elements into it:
//!
//! ```text
//! Vec<E>, VecDeque<E>   growable    allocate(len) reserves, place(i) appends
//! Box<[E]>              fixed size  allocate(len) fills defaults, place(i) overwrites
//! [E; N]                fixed size  allocate(N) only; other lengths rejected
//! ```
//!
//! Source values are normalized before building: a bare single value is
//! treated as a one-element list. A missing, null or empty source produces
//! `None` on the target property, never a zero-length container. Writing a
//! `None` property back produces an explicit null field.

use crate::element::{Element, ElementKind};
use crate::error::MappingError;
use ordb_protocol::Value;
use std::collections::VecDeque;

/// A concrete container type a collection field can be materialized into.
pub trait CollectionShape: Sized + Send + Sync + 'static {
    type Item: Element;

    /// Human readable shape name, used in errors and logs.
    const SHAPE: &'static str;

    /// Creates an instance able to hold `len` elements, or `None` if this
    /// shape cannot have that length.
    fn allocate(len: usize) -> Option<Self>;

    /// Stores `item` at `index`. Growable shapes fill any gap with defaults.
    /// Returns `false` if `index` lies outside a fixed-size instance.
    fn place(&mut self, index: usize, item: Self::Item) -> bool;

    fn iter_items(&self) -> Box<dyn Iterator<Item = &Self::Item> + '_>;
}

fn place_in_slice<E>(slots: &mut [E], index: usize, item: E) -> bool {
    match slots.get_mut(index) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

impl<E: Element> CollectionShape for Vec<E> {
    type Item = E;
    const SHAPE: &'static str = "Vec";

    fn allocate(len: usize) -> Option<Self> {
        Some(Vec::with_capacity(len))
    }

    fn place(&mut self, index: usize, item: E) -> bool {
        if index < self.len() {
            self[index] = item;
        } else {
            self.resize_with(index, E::default);
            self.push(item);
        }
        true
    }

    fn iter_items(&self) -> Box<dyn Iterator<Item = &E> + '_> {
        Box::new(self.iter())
    }
}

impl<E: Element> CollectionShape for VecDeque<E> {
    type Item = E;
    const SHAPE: &'static str = "VecDeque";

    fn allocate(len: usize) -> Option<Self> {
        Some(VecDeque::with_capacity(len))
    }

    fn place(&mut self, index: usize, item: E) -> bool {
        if index < self.len() {
            self[index] = item;
        } else {
            self.resize_with(index, E::default);
            self.push_back(item);
        }
        true
    }

    fn iter_items(&self) -> Box<dyn Iterator<Item = &E> + '_> {
        Box::new(self.iter())
    }
}

impl<E: Element> CollectionShape for Box<[E]> {
    type Item = E;
    const SHAPE: &'static str = "Box<[T]>";

    fn allocate(len: usize) -> Option<Self> {
        Some((0..len).map(|_| E::default()).collect())
    }

    fn place(&mut self, index: usize, item: E) -> bool {
        place_in_slice(self, index, item)
    }

    fn iter_items(&self) -> Box<dyn Iterator<Item = &E> + '_> {
        Box::new(self.iter())
    }
}

impl<E: Element, const N: usize> CollectionShape for [E; N] {
    type Item = E;
    const SHAPE: &'static str = "[T; N]";

    fn allocate(len: usize) -> Option<Self> {
        (len == N).then(|| std::array::from_fn(|_| E::default()))
    }

    fn place(&mut self, index: usize, item: E) -> bool {
        place_in_slice(self, index, item)
    }

    fn iter_items(&self) -> Box<dyn Iterator<Item = &E> + '_> {
        Box::new(self.iter())
    }
}

/// Builds a collection from a stored field value.
pub fn build_collection<C: CollectionShape>(
    value: Option<&Value>,
    path: &str,
) -> Result<Option<C>, MappingError> {
    let items: &[Value] = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::List(items)) => items,
        Some(single) => std::slice::from_ref(single),
    };
    if items.is_empty() {
        return Ok(None);
    }

    let length_mismatch = || MappingError::LengthMismatch {
        path: path.to_string(),
        shape: C::SHAPE,
        actual: items.len(),
    };
    let mut target = C::allocate(items.len()).ok_or_else(length_mismatch)?;

    for (index, item) in items.iter().enumerate() {
        let element = C::Item::from_value(item, &format!("{path}[{index}]"))?;
        if !target.place(index, element) {
            return Err(length_mismatch());
        }
    }

    tracing::trace!(
        path,
        shape = C::SHAPE,
        nested = C::Item::KIND == ElementKind::Nested,
        len = items.len(),
        "built collection"
    );
    Ok(Some(target))
}

/// Converts a collection property back into a stored field value.
pub fn collection_value<C: CollectionShape>(source: Option<&C>) -> Result<Value, MappingError> {
    match source {
        None => Ok(Value::Null),
        Some(items) => items
            .iter_items()
            .map(Element::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
    }
}
