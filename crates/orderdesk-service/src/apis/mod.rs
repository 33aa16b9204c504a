//! API handler logic for the orderdesk HTTP surface.

pub mod order;
