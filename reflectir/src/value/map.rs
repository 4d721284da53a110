use indexmap::IndexMap;

use super::any::{Any, AnyKey};

/// Keyed mapping container.
///
/// Keys use [`AnyKey`] semantics: PODs and strings by value, other objects
/// by identity. Iteration follows insertion order, which keeps serialized
/// output stable.
#[derive(Debug, Default)]
pub struct MapObj {
    entries: IndexMap<AnyKey, Any>,
}

impl MapObj {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Any, Any)>) -> Self {
        let mut entries = IndexMap::new();
        for (key, value) in pairs {
            entries.insert(AnyKey(key), value);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Any) -> Option<&Any> {
        self.entries.get(&AnyKey(key.clone()))
    }

    pub fn contains_key(&self, key: &Any) -> bool {
        self.entries.contains_key(&AnyKey(key.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Any, &Any)> {
        self.entries.iter().map(|(k, v)| (k.value(), v))
    }

    /// True when every key is a string; such maps serialize keys inline.
    pub fn all_string_keys(&self) -> bool {
        self.entries.keys().all(|k| matches!(k.value(), Any::Str(_)))
    }
}
