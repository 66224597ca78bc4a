//! PageState Assertions Library
//!
//! Records per-session assertions about observed page state and derives a
//! consensus "page state signature" that holds across independent runs of
//! the same scripted scenario.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  recorder ──record_assertion──▶ AssertionStore              │
//! │                                   session → frame → key     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  common_session_assertions(ids, start) -> SessionAssertions │
//! │    ├── equal results        keep                            │
//! │    ├── numeric mismatch     narrow to min, comparison >=    │
//! │    ├── other mismatch       drop                            │
//! │    └── absent in a session  drop                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  remove_asserts_shared_between_states(&mut [states])        │
//! │  match_state(expected, observed) -> MatchReport             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod consensus;
pub mod error;
pub mod matcher;
pub mod recording;
pub mod shared;
pub mod store;
pub mod types;
pub mod uniqueness;

// Re-export commonly used types
pub use consensus::common_session_assertions;
pub use error::{Error, Result};
pub use matcher::{match_state, MatchReport};
pub use recording::Recording;
pub use shared::SharedAssertionStore;
pub use store::AssertionStore;
pub use types::*;
pub use uniqueness::remove_asserts_shared_between_states;

/// PageState version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
