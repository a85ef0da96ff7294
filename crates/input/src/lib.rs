//! Input routing: raw key and mouse events mapped to logical camera actions.
//!
//! # Invariants
//! - One binding per logical key; subscribing again replaces it.
//! - Actions are queued and only applied to the camera between frames.

pub mod action;
pub mod router;

pub use action::{Action, mouse_turn_axis};
pub use router::{InputRouter, LogicalKey, Subscription};

pub fn crate_info() -> &'static str {
    "cubefield-input v0.1.0"
}
