use std::collections::hash_map::{Iter, Keys};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Represents a map of the route parameters using the name of the parameter specified in the path as their respective keys.
///
/// Please refer to the [Route Parameters](./index.html#route-parameters) section for more info.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    /// Creates an empty route parameters map.
    pub fn new() -> RouteParams {
        RouteParams(HashMap::new())
    }

    /// Creates an empty route parameters map with the specified capacity.
    pub fn with_capacity(capacity: usize) -> RouteParams {
        RouteParams(HashMap::with_capacity(capacity))
    }

    /// Sets a new parameter entry with the specified key and the value.
    ///
    /// Returns the previous value if the key was already present.
    pub fn set<N: Into<String>, V: Into<String>>(&mut self, param_name: N, param_val: V) -> Option<String> {
        self.0.insert(param_name.into(), param_val.into())
    }

    /// Returns the route parameter value mapped with the specified key.
    pub fn get<N: AsRef<str>>(&self, param_name: N) -> Option<&String> {
        self.0.get(param_name.as_ref())
    }

    /// Checks if a route parameter exists.
    pub fn has<N: AsRef<str>>(&self, param_name: N) -> bool {
        self.0.contains_key(param_name.as_ref())
    }

    /// Returns the length of the route parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no route parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an [`Iterator`](https://doc.rust-lang.org/std/collections/hash_map/struct.Keys.html) over the parameter names.
    pub fn params_names(&self) -> Keys<'_, String, String> {
        self.0.keys()
    }

    /// Returns an [`Iterator`](https://doc.rust-lang.org/std/collections/hash_map/struct.Iter.html) over the parameter entries
    /// as `(parameter_name: &String, parameter_value: &String)`.
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.0.iter()
    }

    /// Merges parameters captured by a nested match into this map.
    ///
    /// Keys not captured by `other` are left alone. A key captured by both keeps the nested value.
    pub(crate) fn extend(&mut self, other: RouteParams) {
        for (key, val) in other.0 {
            if let Some(prev) = self.0.insert(key.clone(), val) {
                tracing::debug!(param = %key, previous = %prev, "nested match replaced route parameter");
            }
        }
    }
}

impl Display for RouteParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort();

        write!(f, "{{")?;
        for (idx, (key, val)) in entries.into_iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:?}", key, val)?;
        }
        write!(f, "}}")
    }
}

impl<'a> IntoIterator for &'a RouteParams {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
