use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::any::type_name;
use core::cmp::Ordering;
use core::hash::Hash;
use std::collections::HashMap;

use crate::builder::Assembly;
use crate::error::BuildError;
use crate::path::Segment;
use crate::shape::{AccessError, Fixture, Shape};
use crate::tree::{BranchNode, BuildCx};
use crate::value::Value;

/// Navigation through an `Option` is transparent: its members are the
/// payload's members.
impl<T: Fixture + Clone> Fixture for Option<T> {
    fn default_constructor() -> Option<fn() -> Self> {
        // only as constructible as the payload, so that an immutable payload
        // is built through its factory rather than written into a `None`
        T::default_constructor().map(|_| none::<T> as fn() -> Self)
    }

    fn member(segment: &Segment) -> Option<Shape> {
        T::member(segment)
    }

    fn member_names() -> &'static [&'static str] {
        T::member_names()
    }

    fn read(&self, segment: &Segment) -> Result<Option<Value>, AccessError> {
        match self {
            Some(inner) => inner.read(segment),
            None => Ok(None),
        }
    }

    fn write(&mut self, segment: &Segment, value: Value) -> Result<(), AccessError> {
        if self.is_none() {
            let ctor = T::default_constructor().ok_or_else(|| absent::<T>(segment))?;
            *self = Some(ctor());
        }
        match self {
            Some(inner) => inner.write(segment, value),
            None => Err(absent::<T>(segment)),
        }
    }

    fn shape() -> Shape {
        let mut shape = Shape::of::<Self>();
        shape.build = build_some::<T>;
        shape
    }
}

fn none<T>() -> Option<T> {
    None
}

fn absent<T: 'static>(segment: &Segment) -> AccessError {
    AccessError::Absent {
        type_name: type_name::<T>(),
        segment: segment.key().into(),
    }
}

fn build_some<T: Fixture>(node: &BranchNode, cx: BuildCx<'_>) -> Result<Value, BuildError> {
    Assembly::<T>::new(node, cx)
        .assemble(None, None, None)
        .map(|built| Value::new(Some(built)))
}

/// Indexed by position. Writing at the current length appends.
impl<T: Fixture + Clone> Fixture for Vec<T> {
    fn default_constructor() -> Option<fn() -> Self> {
        Some(Vec::new as fn() -> Self)
    }

    fn member(segment: &Segment) -> Option<Shape> {
        segment.single_index()?.to_key::<usize>().map(|_| T::shape())
    }

    fn read(&self, segment: &Segment) -> Result<Option<Value>, AccessError> {
        let index = key_of::<usize, Self>(segment)?;
        Ok(self.get(index).cloned().map(Value::new))
    }

    fn write(&mut self, segment: &Segment, value: Value) -> Result<(), AccessError> {
        let index = key_of::<usize, Self>(segment)?;
        let value = value.into_member::<T>(segment)?;
        match index.cmp(&self.len()) {
            Ordering::Less => self[index] = value,
            Ordering::Equal => self.push(value),
            Ordering::Greater => {
                return Err(AccessError::IndexOutOfBounds {
                    type_name: type_name::<Self>(),
                    index,
                    len: self.len(),
                });
            }
        }
        Ok(())
    }
}

impl<K, V> Fixture for HashMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Fixture + Clone,
{
    fn default_constructor() -> Option<fn() -> Self> {
        Some(HashMap::new as fn() -> Self)
    }

    fn member(segment: &Segment) -> Option<Shape> {
        segment.single_index()?.to_key::<K>().map(|_| V::shape())
    }

    fn read(&self, segment: &Segment) -> Result<Option<Value>, AccessError> {
        let key = key_of::<K, Self>(segment)?;
        Ok(self.get(&key).cloned().map(Value::new))
    }

    fn write(&mut self, segment: &Segment, value: Value) -> Result<(), AccessError> {
        let key = key_of::<K, Self>(segment)?;
        self.insert(key, value.into_member::<V>(segment)?);
        Ok(())
    }
}

impl<K, V> Fixture for BTreeMap<K, V>
where
    K: Ord + Clone + 'static,
    V: Fixture + Clone,
{
    fn default_constructor() -> Option<fn() -> Self> {
        Some(BTreeMap::new as fn() -> Self)
    }

    fn member(segment: &Segment) -> Option<Shape> {
        segment.single_index()?.to_key::<K>().map(|_| V::shape())
    }

    fn read(&self, segment: &Segment) -> Result<Option<Value>, AccessError> {
        let key = key_of::<K, Self>(segment)?;
        Ok(self.get(&key).cloned().map(Value::new))
    }

    fn write(&mut self, segment: &Segment, value: Value) -> Result<(), AccessError> {
        let key = key_of::<K, Self>(segment)?;
        self.insert(key, value.into_member::<V>(segment)?);
        Ok(())
    }
}

/// The single indexer argument of `segment` as a `K`, for collection `C`.
fn key_of<K: Clone + 'static, C: 'static>(segment: &Segment) -> Result<K, AccessError> {
    segment
        .single_index()
        .and_then(|arg| arg.to_key::<K>())
        .ok_or_else(|| AccessError::bad_index::<C>(segment))
}
