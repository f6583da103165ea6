use std::borrow::Cow;
use std::hash::Hasher;
use std::sync::Mutex;

use fnv::{FnvHashMap, FnvHasher};
use tracing::warn;

use crate::types::Id;

/// Resolves the opaque string identifiers of inbound data to numeric ids. Implementations must
/// be append-only: once a string got an id, it keeps it.
pub trait IdMapping {
    fn add(&mut self, name: &str) -> Id;
}

/// Default mapping. Strings which already are numbers map to themselves, everything else to its
/// 64 bit FNV-1a hash, so that ids stay stable across runs and historical files (which store
/// the numeric ids) line up with freshly resolved inbound data.
#[derive(Debug, Default)]
pub struct StringIdMapping {
    names: FnvHashMap<Id, String>,
}

impl StringIdMapping {

    pub fn new() -> Self {
        StringIdMapping::default()
    }

    pub fn to_id(name: &str) -> Id {
        match name.parse::<Id>() {
            Ok(id) => id,
            Err(_) => {
                let mut hasher = FnvHasher::default();
                hasher.write(name.as_bytes());
                hasher.finish() as Id
            }
        }
    }

    pub fn name(&self, id: Id) -> Option<&str> {
        self.names.get(&id).map(|name| name.as_str())
    }

    /// The original name if we have seen one, otherwise the numeric id itself.
    pub fn name_or_id(&self, id: Id) -> Cow<str> {
        match self.name(id) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(id.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl IdMapping for StringIdMapping {

    fn add(&mut self, name: &str) -> Id {
        let id = StringIdMapping::to_id(name);

        match self.names.get(&id) {
            Some(known_name) => {
                if known_name != name {
                    warn!("Ids of {:?} and {:?} collide, both map to {}", known_name, name, id);
                }
            },
            None => {
                self.names.insert(id, name.to_owned());
            }
        }

        id
    }
}

/// Lets several readers resolve ids through one mapping from different threads.
pub struct SharedMapping<'a, M: IdMapping> {
    mapping: &'a Mutex<M>,
}

impl<'a, M: IdMapping> SharedMapping<'a, M> {
    pub fn new(mapping: &'a Mutex<M>) -> Self {
        SharedMapping { mapping }
    }
}

impl<'a, M: IdMapping> IdMapping for SharedMapping<'a, M> {

    fn add(&mut self, name: &str) -> Id {
        // A panicking reader cannot leave the mapping half-updated, so poisoning is ignored.
        let mut mapping = self.mapping.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        mapping.add(name)
    }
}

#[cfg(test)]
mod tests {

    use std::sync::Mutex;

    use super::{IdMapping, SharedMapping, StringIdMapping};

    #[test]
    fn numeric_names_keep_their_value() {
        let mut mapping = StringIdMapping::new();

        assert_eq!(mapping.add("42"), 42);
        assert_eq!(mapping.add("-7"), -7);
        assert_eq!(mapping.name(42), Some("42"));
    }

    #[test]
    fn names_are_assigned_stable_ids() {
        let mut mapping = StringIdMapping::new();

        let alice = mapping.add("alice");
        let bob = mapping.add("bob");

        assert_ne!(alice, bob);
        assert_eq!(mapping.add("alice"), alice);
        assert_eq!(StringIdMapping::to_id("alice"), alice);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.name_or_id(alice), "alice");
        assert_eq!(mapping.name_or_id(12345), "12345");
    }

    #[test]
    fn shared_mapping_resolves_through_the_lock() {
        let mapping = Mutex::new(StringIdMapping::new());

        let id = SharedMapping::new(&mapping).add("pony");

        let mapping = mapping.into_inner().unwrap();
        assert_eq!(mapping.name(id), Some("pony"));
    }
}
