use http::Extensions;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Type-keyed state attached to a single router with `RouterBuilder::data`.
#[derive(Default)]
pub(crate) struct DataMap {
    inner: Extensions,
}

impl DataMap {
    pub(crate) fn new() -> DataMap {
        DataMap::default()
    }

    pub(crate) fn insert<T: Clone + Send + Sync + 'static>(&mut self, val: T) {
        self.inner.insert(val);
    }

    pub(crate) fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.get::<T>()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Debug for DataMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "DataMap({} entries)", self.inner.len())
    }
}

/// The data maps of every router a request has entered, outermost first.
///
/// Lookups walk from the innermost router outwards, so a sub-router's data shadows its parent's.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedData {
    maps: Vec<Arc<DataMap>>,
}

impl SharedData {
    pub(crate) fn push(&mut self, map: Arc<DataMap>) {
        self.maps.push(map);
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.maps.truncate(len);
    }

    pub(crate) fn len(&self) -> usize {
        self.maps.len()
    }

    pub(crate) fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.maps.iter().rev().find_map(|map| map.get::<T>())
    }
}
