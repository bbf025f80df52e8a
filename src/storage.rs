//! Credential persistence and login validation.

use std::cell::RefCell;

use thiserror::Error;

use crate::config::{CREDENTIAL_SLOT, MIN_CREDENTIAL_LEN};

/// A single durable slot holding the raw credential.
pub trait CredentialStore {
	/// Stored credential, if any.
	fn get(&self) -> Option<String>;
	/// Replace the stored credential.
	fn set(&self, credential: &str);
	/// Remove the stored credential.
	fn clear(&self);
}

/// `window.localStorage` under a fixed key. Storage failures read as logged out.
#[derive(Clone, Copy, Debug)]
pub struct LocalStorage {
	slot: &'static str,
}

impl Default for LocalStorage {
	fn default() -> Self {
		Self {
			slot: CREDENTIAL_SLOT,
		}
	}
}

impl LocalStorage {
	fn storage() -> Option<web_sys::Storage> {
		web_sys::window()?.local_storage().ok()?
	}
}

impl CredentialStore for LocalStorage {
	fn get(&self) -> Option<String> {
		Self::storage()?
			.get_item(self.slot)
			.ok()?
			.filter(|c| !c.is_empty())
	}

	fn set(&self, credential: &str) {
		if let Some(storage) = Self::storage() {
			let _ = storage.set_item(self.slot, credential);
		}
	}

	fn clear(&self) {
		if let Some(storage) = Self::storage() {
			let _ = storage.remove_item(self.slot);
		}
	}
}

/// In-memory slot for hosts without browser storage.
#[derive(Debug, Default)]
pub struct MemoryStore(RefCell<Option<String>>);

impl CredentialStore for MemoryStore {
	fn get(&self) -> Option<String> {
		self.0.borrow().clone()
	}

	fn set(&self, credential: &str) {
		*self.0.borrow_mut() = Some(credential.to_string());
	}

	fn clear(&self) {
		*self.0.borrow_mut() = None;
	}
}

/// Rejected login input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoginError {
	/// Fewer characters than the minimum after trimming.
	#[error("API key is too short, expected at least {min} characters")]
	TooShort {
		/// Required length.
		min: usize,
	},
}

/// Validate and persist a credential typed into the login form.
pub fn login(store: &impl CredentialStore, input: &str) -> Result<String, LoginError> {
	let credential = input.trim();
	if credential.chars().count() < MIN_CREDENTIAL_LEN {
		return Err(LoginError::TooShort {
			min: MIN_CREDENTIAL_LEN,
		});
	}
	store.set(credential);
	Ok(credential.to_string())
}

/// Forget the stored credential.
pub fn logout(store: &impl CredentialStore) {
	store.clear();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_keys_are_rejected_and_not_stored() {
		let store = MemoryStore::default();
		let err = login(&store, "too-short").unwrap_err();
		assert_eq!(err, LoginError::TooShort { min: 20 });
		assert_eq!(store.get(), None);
	}

	#[test]
	fn accepted_key_is_persisted_trimmed() {
		let store = MemoryStore::default();
		let key = login(&store, "  0123456789abcdefghij  ").unwrap();
		assert_eq!(key, "0123456789abcdefghij");
		assert_eq!(store.get().as_deref(), Some("0123456789abcdefghij"));
	}

	#[test]
	fn logout_clears_the_slot() {
		let store = MemoryStore::default();
		store.set("0123456789abcdefghij");
		logout(&store);
		assert_eq!(store.get(), None);
	}
}
