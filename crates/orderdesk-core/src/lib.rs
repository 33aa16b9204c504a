//! Core order lifecycle engine for the orderdesk system.
//!
//! This crate owns the order lifecycle model: the transition table that
//! defines which status moves are legal, the action gate that derives the
//! capability flags the presentation layer consumes, the guarded order
//! store that applies committed changes, and the event bus other
//! components subscribe to.

pub mod event_bus;
pub mod lifecycle;
pub mod store;

pub use event_bus::EventBus;
pub use lifecycle::{
	actions_for, allowed_next_statuses, derive_actions, is_terminal, is_transition_allowed,
};
pub use store::{OrderStore, StoreError};
