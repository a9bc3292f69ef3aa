//! Tab-scoped key/value storage contract and the built-in in-memory implementation.
//!
//! The contract mirrors a browser's session storage: string keys, string values, and
//! synchronous access so cached tokens can be served without suspending the caller.

pub mod memory;

pub use memory::MemorySessionStorage;

// self
use crate::_prelude::*;

/// Storage backend contract used by the token cache.
pub trait SessionStorage
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, if present.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores or replaces the values for every `(key, value)` pair as one unit.
	fn set_all(&self, entries: &[(&str, String)]) -> Result<(), StoreError>;

	/// Removes every key in `keys` as one unit; missing keys are ignored.
	fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError>;
}

/// Error type produced by [`SessionStorage`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Storage quota or capacity exhausted.
	#[error("Session storage is full: {message}.")]
	QuotaExceeded {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
