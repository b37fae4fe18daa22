use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::CredentialProvider;
use orgscope_domain::User;

type Listener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

/// Holds the signed-in user and bearer token. Constructed and passed explicitly.
#[derive(Clone, Default)]
pub struct UserStore {
	inner: Arc<Mutex<StoreState>>,
}

#[derive(Default)]
struct StoreState {
	user: Option<User>,
	token: Option<String>,
	listeners: Vec<(u64, Listener)>,
	next_listener: u64,
}

/// Keeps a listener registered until dropped or [`Subscription::unsubscribe`]d.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct Subscription {
	store: Weak<Mutex<StoreState>>,
	id: u64,
}
impl Subscription {
	pub fn unsubscribe(self) {
		drop(self);
	}
}
impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(store) = self.store.upgrade() {
			lock(&store).listeners.retain(|(id, _)| *id != self.id);
		}
	}
}

impl UserStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn user(&self) -> Option<User> {
		lock(&self.inner).user.clone()
	}

	pub fn is_signed_in(&self) -> bool {
		lock(&self.inner).user.is_some()
	}

	pub fn set_user(&self, user: User, token: Option<String>) {
		let listeners = {
			let mut state = lock(&self.inner);

			state.user = Some(user.clone());
			state.token = token;

			listeners_of(&state)
		};

		for listener in listeners {
			listener(Some(&user));
		}
	}

	pub fn clear(&self) {
		let listeners = {
			let mut state = lock(&self.inner);

			state.user = None;
			state.token = None;

			listeners_of(&state)
		};

		for listener in listeners {
			listener(None);
		}
	}

	/// Listeners run outside the store lock and may read the store.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(Option<&User>) + Send + Sync + 'static,
	{
		let mut state = lock(&self.inner);
		let id = state.next_listener;

		state.next_listener += 1;
		state.listeners.push((id, Arc::new(listener)));

		Subscription { store: Arc::downgrade(&self.inner), id }
	}
}
impl CredentialProvider for UserStore {
	fn token(&self) -> Option<String> {
		lock(&self.inner).token.clone()
	}
}

fn lock(store: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
	store.lock().unwrap_or_else(|err| err.into_inner())
}

fn listeners_of(state: &StoreState) -> Vec<Listener> {
	state.listeners.iter().map(|(_, listener)| Arc::clone(listener)).collect()
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[test]
	fn dropped_subscriptions_stop_receiving() {
		let store = UserStore::new();
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let subscription = store.subscribe(move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		store.set_user(User::new("u1", "Ada"), Some("token".to_string()));

		assert_eq!(store.token().as_deref(), Some("token"));

		subscription.unsubscribe();
		store.clear();

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(store.token().is_none());
	}
}
