//! Thread-safe in-memory [`SessionStorage`] implementation.

// self
use crate::{
	_prelude::*,
	store::{SessionStorage, StoreError},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Storage backend that keeps entries in-process; one instance models one browser tab.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStorage(StoreMap);
impl MemorySessionStorage {
	/// Number of stored keys.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Stores a single raw entry; handy for seeding or corrupting state in tests.
	pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
		self.0.write().insert(key.into(), value.into());
	}
}
impl SessionStorage for MemorySessionStorage {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set_all(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
		let mut guard = self.0.write();

		for (key, value) in entries {
			guard.insert((*key).to_owned(), value.clone());
		}

		Ok(())
	}

	fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError> {
		let mut guard = self.0.write();

		for key in keys {
			guard.remove(*key);
		}

		Ok(())
	}
}
