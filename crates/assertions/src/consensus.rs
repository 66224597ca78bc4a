//! Cross-session consensus
//!
//! Merges the assertions of several sessions into the state they all agree
//! on. The consensus only ever narrows or shrinks from its seed:
//!
//! - equal results are kept as they are
//! - differing numeric results narrow to the lower value with `>=`
//! - any other mismatch drops the entry
//! - an entry missing from a session is dropped

use tracing::debug;

use crate::store::AssertionStore;
use crate::types::{assertion_count, AssertionResult, Comparison, SessionAssertions};

/// Compute the assertions every named session agrees on.
///
/// The result starts as an independent copy of `starting_assertions`. When
/// that is absent or empty, the first session in `session_ids` with any
/// recorded assertions seeds it instead, and sessions before it are
/// skipped. Each following session is merged in the order given. Stored
/// session data is never modified.
pub fn common_session_assertions<I, S>(
    store: &AssertionStore,
    session_ids: I,
    starting_assertions: Option<&SessionAssertions>,
) -> SessionAssertions
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unseen = SessionAssertions::new();
    let mut state: Option<SessionAssertions> =
        starting_assertions.filter(|s| !s.is_empty()).cloned();

    for session_id in session_ids {
        let session_id = session_id.as_ref();
        let session = store.session(session_id).unwrap_or(&unseen);

        if state.is_none() {
            if assertion_count(session) > 0 {
                debug!(session_id, "Seeding consensus from session");
                state = Some(session.clone());
            }
            continue;
        }

        if let Some(shared) = state.as_mut() {
            narrow_to_session(shared, session, session_id);
            prune_absent(shared, session, session_id);
        }
    }

    state
        .or_else(|| starting_assertions.cloned())
        .unwrap_or_default()
}

fn narrow_to_session(shared: &mut SessionAssertions, session: &SessionAssertions, session_id: &str) {
    for (frame_id, session_frame) in session {
        let Some(shared_frame) = shared.get_mut(frame_id) else {
            continue;
        };

        for (key, session_assert) in session_frame {
            let Some(shared_assert) = shared_frame.get_mut(key) else {
                continue;
            };

            if shared_assert.result == session_assert.result {
                continue;
            }

            match (shared_assert.result.as_number(), session_assert.result.as_number()) {
                (Some(shared_value), Some(session_value)) => {
                    shared_assert.result = AssertionResult::Number(shared_value.min(session_value));
                    shared_assert.comparison = Comparison::AtLeast;
                    debug!(
                        session_id,
                        frame_id = %frame_id,
                        key = %key,
                        bound = %shared_assert.result,
                        "Narrowed numeric assertion"
                    );
                }
                _ => {
                    shared_frame.shift_remove(key);
                    debug!(session_id, frame_id = %frame_id, key = %key, "Dropped mismatched assertion");
                }
            }
        }
    }
}

fn prune_absent(shared: &mut SessionAssertions, session: &SessionAssertions, session_id: &str) {
    let before = assertion_count(shared);

    shared.retain(|frame_id, shared_frame| {
        match session.get(frame_id) {
            Some(session_frame) => shared_frame.retain(|key, _| session_frame.contains_key(key)),
            None => shared_frame.clear(),
        }
        !shared_frame.is_empty()
    });

    let pruned = before - assertion_count(shared);
    if pruned > 0 {
        debug!(session_id, pruned, "Pruned assertions absent from session");
    }
}
