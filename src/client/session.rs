//! Sources of the caller's bearer session.

// self
use crate::{_prelude::*, auth::BearerCredential};

/// Supplies the bearer session the client authenticates issuer calls with.
///
/// Returning `None` makes token lookups fail with
/// [`Error::Unauthenticated`](crate::error::Error::Unauthenticated) without any network call.
pub trait SessionSource
where
	Self: Send + Sync,
{
	/// Returns the current session, if one exists.
	fn current_session(&self) -> Option<BearerCredential>;
}
impl SessionSource for BearerCredential {
	fn current_session(&self) -> Option<BearerCredential> {
		Some(self.clone())
	}
}
impl SessionSource for Option<BearerCredential> {
	fn current_session(&self) -> Option<BearerCredential> {
		self.clone()
	}
}

/// Session slot that sign-in and sign-out flows update while clients keep reading it.
#[derive(Clone, Debug, Default)]
pub struct SharedSession(Arc<RwLock<Option<BearerCredential>>>);
impl SharedSession {
	/// Creates a slot holding `credential`.
	pub fn signed_in(credential: BearerCredential) -> Self {
		Self(Arc::new(RwLock::new(Some(credential))))
	}

	/// Replaces the current session.
	pub fn sign_in(&self, credential: BearerCredential) {
		*self.0.write() = Some(credential);
	}

	/// Drops the current session, returning it if one was present.
	pub fn sign_out(&self) -> Option<BearerCredential> {
		self.0.write().take()
	}
}
impl SessionSource for SharedSession {
	fn current_session(&self) -> Option<BearerCredential> {
		self.0.read().clone()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn shared_session_tracks_sign_in_and_out() {
		let session = SharedSession::default();
		let reader = session.clone();
		let credential = BearerCredential::new("s1").expect("Fixture should be valid.");

		assert!(reader.current_session().is_none());

		session.sign_in(credential.clone());

		assert_eq!(reader.current_session(), Some(credential.clone()));
		assert_eq!(session.sign_out(), Some(credential));
		assert!(reader.current_session().is_none());
	}
}
