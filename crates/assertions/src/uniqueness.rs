//! Isolate what is distinctive to each of several states

use tracing::debug;

use crate::types::{FrameId, QueryKey, SessionAssertions};

/// Remove every assertion that another state holds with the same key and
/// the same result, from both states. Mutates `states` in place; pass
/// copies to keep the originals.
///
/// While comparing one key, the scan over the other states stops at the
/// first state that lacks the frame entirely, so states after it are not
/// compared for that key.
pub fn remove_asserts_shared_between_states(states: &mut [SessionAssertions]) {
    let mut stripped = 0usize;

    for index in 0..states.len() {
        let frame_ids: Vec<FrameId> = states[index].keys().cloned().collect();

        for frame_id in frame_ids {
            let keys: Vec<QueryKey> = match states[index].get(&frame_id) {
                Some(frame) => frame.keys().cloned().collect(),
                None => continue,
            };

            for key in keys {
                let Some(result) = states[index]
                    .get(&frame_id)
                    .and_then(|frame| frame.get(&key))
                    .map(|assertion| assertion.result.clone())
                else {
                    continue;
                };

                let mut shared = false;
                for other in 0..states.len() {
                    if other == index {
                        continue;
                    }
                    let Some(other_frame) = states[other].get_mut(&frame_id) else {
                        break;
                    };
                    if other_frame.get(&key).is_some_and(|a| a.result == result) {
                        other_frame.shift_remove(&key);
                        stripped += 1;
                        shared = true;
                    }
                }

                if shared {
                    if let Some(frame) = states[index].get_mut(&frame_id) {
                        frame.shift_remove(&key);
                        stripped += 1;
                    }
                    debug!(frame_id = %frame_id, key = %key, "Stripped shared assertion");
                }
            }
        }
    }

    debug!(states = states.len(), stripped, "Removed assertions shared between states");
}
