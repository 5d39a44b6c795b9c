use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{state::IdentityState, StoreError};

/// Observer notified after every change of the cached state.
#[async_trait]
pub trait StateListener: Send + Sync {
    async fn state_changed(
        &self,
        old_state: &IdentityState,
        new_state: &IdentityState,
    ) -> Result<(), StoreError>;
}

/// In-memory identity state shared by the store views.
///
/// Mutations are serialized; each effective mutation notifies the single
/// listener exactly once with the complete new state. If the listener
/// fails, the mutation is rolled back.
pub struct JsonCache {
    state: Mutex<IdentityState>,
    listener: Arc<dyn StateListener>,
}

impl JsonCache {
    pub fn new(state: IdentityState, listener: Arc<dyn StateListener>) -> Self {
        Self {
            state: Mutex::new(state),
            listener,
        }
    }

    /// Run a read-only projection over the current state.
    pub async fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&IdentityState) -> T,
    {
        let state = self.state.lock().await;
        f(&state)
    }

    pub async fn snapshot(&self) -> IdentityState {
        self.read(IdentityState::clone).await
    }

    /// Apply `f` to the state and notify the listener if anything changed.
    pub async fn update<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut IdentityState) -> T,
    {
        let mut state = self.state.lock().await;
        let old_state = state.clone();

        let output = f(&mut state);

        if *state == old_state {
            return Ok(output);
        }

        if let Err(err) = self.listener.state_changed(&old_state, &state).await {
            tracing::error!("state listener failed, rolling back: {err}");
            *state = old_state;
            return Err(err);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Message;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingListener {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl StateListener for RecordingListener {
        async fn state_changed(
            &self,
            _old_state: &IdentityState,
            _new_state: &IdentityState,
        ) -> Result<(), StoreError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::InvalidRecord("listener down".to_owned()));
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn message(id: &str) -> Message {
        serde_json::from_value(serde_json::json!({ "id": id, "type": "test" })).unwrap()
    }

    #[tokio::test]
    async fn notifies_once_per_effective_mutation() {
        let listener = Arc::new(RecordingListener::default());
        let cache = JsonCache::new(IdentityState::default(), listener.clone());

        cache
            .update(|state| state.messages.insert("m1".into(), message("m1")))
            .await
            .unwrap();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);

        // No-op: nothing to remove
        cache
            .update(|state| state.messages.remove("unknown"))
            .await
            .unwrap();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_notification_rolls_back() {
        let listener = Arc::new(RecordingListener::default());
        listener.fail.store(true, Ordering::SeqCst);
        let cache = JsonCache::new(IdentityState::default(), listener.clone());

        let result = cache
            .update(|state| state.messages.insert("m1".into(), message("m1")))
            .await;

        assert!(result.is_err());
        assert!(cache.snapshot().await.messages.is_empty());
    }
}
