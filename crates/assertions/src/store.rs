//! Per-session assertion storage
//!
//! Holds `session → frame → key → Assertion` for every session that has
//! recorded something. Recording is an upsert; reads never create entries,
//! except for `iter_session_assertions_by_frame_id`, which materializes an
//! empty bucket so iteration over an unseen session always succeeds.

use std::collections::HashMap;
use tracing::debug;

use crate::consensus;
use crate::types::{Assertion, FrameAssertions, FrameId, SessionAssertions, SessionId};

/// Store of recorded assertions, indexed by session id
#[derive(Debug, Clone, Default)]
pub struct AssertionStore {
    sessions: HashMap<SessionId, SessionAssertions>,
}

impl AssertionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an assertion at its key for `session_id`/`frame_id`.
    ///
    /// A missing `key` is derived from `(type, args)`; a supplied one is kept.
    pub fn record_assertion(&mut self, session_id: &str, frame_id: &str, mut assertion: Assertion) {
        let key = assertion.query_key();
        assertion.key = Some(key.clone());

        let frame = self
            .sessions
            .entry(session_id.to_string())
            .or_default()
            .entry(frame_id.to_string())
            .or_default();

        debug!(session_id, frame_id, key = %key, "Recording assertion");
        frame.insert(key, assertion);
    }

    pub fn session_assertion_with_query(
        &self,
        session_id: &str,
        frame_id: &str,
        key: &str,
    ) -> Option<&Assertion> {
        self.sessions.get(session_id)?.get(frame_id)?.get(key)
    }

    /// Frames of a session in insertion order.
    ///
    /// An unseen session gets an empty bucket, matching `record_assertion`.
    pub fn iter_session_assertions_by_frame_id(
        &mut self,
        session_id: &str,
    ) -> indexmap::map::Iter<'_, FrameId, FrameAssertions> {
        self.sessions.entry(session_id.to_string()).or_default().iter()
    }

    /// Total assertions across all frames of a session; 0 when unseen
    pub fn session_assertions_count(&self, session_id: &str) -> usize {
        self.sessions
            .get(session_id)
            .map(crate::types::assertion_count)
            .unwrap_or(0)
    }

    pub fn session(&self, session_id: &str) -> Option<&SessionAssertions> {
        self.sessions.get(session_id)
    }

    pub fn session_ids(&self) -> impl Iterator<Item = &SessionId> {
        self.sessions.keys()
    }

    /// Discard everything recorded for a session
    pub fn remove_session(&mut self, session_id: &str) -> Option<SessionAssertions> {
        let removed = self.sessions.remove(session_id);
        if removed.is_some() {
            debug!(session_id, "Removed session assertions");
        }
        removed
    }

    /// See [`consensus::common_session_assertions`]
    pub fn common_session_assertions<I, S>(
        &self,
        session_ids: I,
        starting_assertions: Option<&SessionAssertions>,
    ) -> SessionAssertions
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        consensus::common_session_assertions(self, session_ids, starting_assertions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn count(selector: &str, n: i64) -> Assertion {
        Assertion::new("count", vec![json!(selector)], n)
    }

    #[test]
    fn test_record_derives_key() {
        let mut store = AssertionStore::new();
        store.record_assertion("s1", "f1", count("a", 3));

        let stored = store
            .session_assertion_with_query("s1", "f1", r#"count:["a"]"#)
            .unwrap();
        assert_eq!(stored.key.as_deref(), Some(r#"count:["a"]"#));
        assert_eq!(stored.result.as_number(), Some(3.0));
    }

    #[test]
    fn test_record_respects_supplied_key() {
        let mut store = AssertionStore::new();
        store.record_assertion("s1", "f1", count("a", 3).with_key("anchors"));

        assert!(store.session_assertion_with_query("s1", "f1", "anchors").is_some());
        assert!(store
            .session_assertion_with_query("s1", "f1", r#"count:["a"]"#)
            .is_none());
    }

    #[test]
    fn test_record_overwrites_in_place() {
        let mut store = AssertionStore::new();
        store.record_assertion("s1", "f1", count("a", 3));
        store.record_assertion("s1", "f1", count("b", 1));
        assert_eq!(store.session_assertions_count("s1"), 2);

        store.record_assertion("s1", "f1", count("a", 3));
        assert_eq!(store.session_assertions_count("s1"), 2);

        store.record_assertion("s1", "f1", count("a", 7));
        assert_eq!(store.session_assertions_count("s1"), 2);
        let stored = store
            .session_assertion_with_query("s1", "f1", r#"count:["a"]"#)
            .unwrap();
        assert_eq!(stored.result.as_number(), Some(7.0));

        // overwrite keeps the original position
        let keys: Vec<_> = store.session("s1").unwrap()["f1"].keys().cloned().collect();
        assert_eq!(keys, vec![r#"count:["a"]"#, r#"count:["b"]"#]);
    }

    #[test]
    fn test_count_spans_frames() {
        let mut store = AssertionStore::new();
        store.record_assertion("s1", "f1", count("a", 3));
        store.record_assertion("s1", "f2", count("a", 3));
        store.record_assertion("s1", "f2", count("b", 3));

        assert_eq!(store.session_assertions_count("s1"), 3);
        assert_eq!(store.session_assertions_count("unseen"), 0);
    }

    #[test]
    fn test_reads_do_not_materialize() {
        let store = AssertionStore::new();
        assert!(store.session_assertion_with_query("s1", "f1", "k").is_none());
        assert!(store.session("s1").is_none());
        assert_eq!(store.session_ids().count(), 0);
    }

    #[test]
    fn test_iterate_unseen_session_creates_bucket() {
        let mut store = AssertionStore::new();
        assert_eq!(store.iter_session_assertions_by_frame_id("s1").count(), 0);
        assert!(store.session("s1").is_some());
        assert_eq!(store.session_assertions_count("s1"), 0);
    }

    #[test]
    fn test_iterate_preserves_frame_insertion_order() {
        let mut store = AssertionStore::new();
        store.record_assertion("s1", "main", count("a", 1));
        store.record_assertion("s1", "ad-frame", count("a", 1));
        store.record_assertion("s1", "login", count("a", 1));

        let frames: Vec<_> = store
            .iter_session_assertions_by_frame_id("s1")
            .map(|(frame_id, _)| frame_id.clone())
            .collect();
        assert_eq!(frames, vec!["main", "ad-frame", "login"]);
    }

    #[test]
    fn test_remove_session() {
        let mut store = AssertionStore::new();
        store.record_assertion("s1", "f1", count("a", 3));

        let removed = store.remove_session("s1").unwrap();
        assert_eq!(removed["f1"].len(), 1);
        assert_eq!(store.session_assertions_count("s1"), 0);
        assert!(store.remove_session("s1").is_none());
    }
}
