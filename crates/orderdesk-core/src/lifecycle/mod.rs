//! The order lifecycle model.
//!
//! This module provides the pure rules of the order state machine: the
//! transition table defining legal status moves and the action gate
//! deriving the capability flags the UI reads. Both are stateless and safe
//! to call from any number of callers.

pub mod gate;
pub mod transitions;

pub use gate::{actions_for, derive_actions};
pub use transitions::{allowed_next_statuses, is_terminal, is_transition_allowed};
