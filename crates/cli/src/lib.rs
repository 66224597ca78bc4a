//! PageState CLI
//!
//! Command-line front-end for loading session recordings, computing
//! consensus states, isolating distinct states and checking observed
//! pages against them.

pub mod commands;
pub mod config;
pub mod output;
