//! Lock-guarded store handle for concurrent recorders
//!
//! `AssertionStore::record_assertion` is a read-modify-write over nested
//! maps. When several session runs feed one store, they share it through
//! this handle; every call holds the lock for its whole duration.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::AssertionStore;
use crate::types::{Assertion, SessionAssertions};

/// Cloneable, thread-safe handle to an [`AssertionStore`]
#[derive(Debug, Clone, Default)]
pub struct SharedAssertionStore {
    inner: Arc<RwLock<AssertionStore>>,
}

impl SharedAssertionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_assertion(&self, session_id: &str, frame_id: &str, assertion: Assertion) {
        self.inner.write().record_assertion(session_id, frame_id, assertion);
    }

    pub fn session_assertions_count(&self, session_id: &str) -> usize {
        self.inner.read().session_assertions_count(session_id)
    }

    pub fn common_session_assertions<I, S>(
        &self,
        session_ids: I,
        starting_assertions: Option<&SessionAssertions>,
    ) -> SessionAssertions
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner
            .read()
            .common_session_assertions(session_ids, starting_assertions)
    }

    /// Independent copy of one session's assertions
    pub fn snapshot_session(&self, session_id: &str) -> Option<SessionAssertions> {
        self.inner.read().session(session_id).cloned()
    }

    /// Fails with `NotFound` when nothing was recorded for `session_id`
    pub fn require_session(&self, session_id: &str) -> Result<()> {
        if self.inner.read().session(session_id).is_none() {
            return Err(Error::NotFound {
                kind: "session".to_string(),
                id: session_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.read().session_ids().cloned().collect();
        ids.sort();
        ids
    }

    pub fn remove_session(&self, session_id: &str) -> Option<SessionAssertions> {
        self.inner.write().remove_session(session_id)
    }

    /// Run `f` against the store under the read lock
    pub fn with_store<R>(&self, f: impl FnOnce(&AssertionStore) -> R) -> R {
        f(&*self.inner.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_concurrent_recorders() {
        let shared = SharedAssertionStore::new();

        let handles: Vec<_> = (0..4)
            .map(|run| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let session_id = format!("run-{}", run);
                    for i in 0..50 {
                        let assertion = Assertion::new("count", vec![json!(format!("li.{}", i))], i as i64);
                        shared.record_assertion(&session_id, "main", assertion);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.session_ids(), vec!["run-0", "run-1", "run-2", "run-3"]);
        for id in shared.session_ids() {
            assert_eq!(shared.session_assertions_count(&id), 50);
        }

        let consensus = shared.common_session_assertions(shared.session_ids(), None);
        assert_eq!(consensus["main"].len(), 50);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let shared = SharedAssertionStore::new();
        shared.record_assertion("s1", "f1", Assertion::new("url", vec![], "https://example.org/"));

        let mut snapshot = shared.snapshot_session("s1").unwrap();
        snapshot.clear();

        assert_eq!(shared.session_assertions_count("s1"), 1);
        assert!(shared.remove_session("s1").is_some());
        assert!(shared.snapshot_session("s1").is_none());
    }

    #[test]
    fn test_require_session() {
        let shared = SharedAssertionStore::new();
        shared.record_assertion("s1", "f1", Assertion::new("url", vec![], "https://example.org/"));

        assert!(shared.require_session("s1").is_ok());
        match shared.require_session("s9") {
            Err(Error::NotFound { kind, id }) => {
                assert_eq!(kind, "session");
                assert_eq!(id, "s9");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
