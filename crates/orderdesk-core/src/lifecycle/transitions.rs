//! The order status transition table.
//!
//! Orders move through the lifecycle NEW/PENDING -> CONFIRMED ->
//! SHIPPED -> DELIVERED, with cancellation possible from any state that
//! has not yet shipped. DELIVERED and CANCELLED are terminal.
//!
//! Every function here is a pure, deterministic lookup: no side effects,
//! no I/O, identical results for identical inputs. Status values that do
//! not belong to the taxonomy are rejected earlier, at the wire-parsing
//! boundary, so these lookups are total over the enum.

use once_cell::sync::Lazy;
use orderdesk_types::OrderStatus;
use std::collections::{HashMap, HashSet};

/// Static transition table - each status maps to the statuses reachable by
/// exactly one direct user action.
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::New,
		HashSet::from([OrderStatus::Confirmed, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Pending,
		HashSet::from([OrderStatus::Confirmed, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Confirmed,
		HashSet::from([OrderStatus::Shipped, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Processing,
		HashSet::from([OrderStatus::Shipped, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Shipped,
		HashSet::from([OrderStatus::Delivered]),
	);
	m.insert(OrderStatus::Delivered, HashSet::new()); // terminal
	m.insert(OrderStatus::Cancelled, HashSet::new()); // terminal
	m
});

/// Returns the set of statuses reachable from `current` in one move.
///
/// Terminal statuses map to the empty set.
pub fn allowed_next_statuses(current: OrderStatus) -> &'static HashSet<OrderStatus> {
	// The table covers every variant; the expect can only fire if a new
	// status is added to the enum without a table entry.
	TRANSITIONS
		.get(&current)
		.expect("transition table covers all statuses")
}

/// Checks whether a single move from `from` to `to` is legal.
pub fn is_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
	allowed_next_statuses(from).contains(&to)
}

/// Returns true when no further lifecycle moves exist.
pub fn is_terminal(status: OrderStatus) -> bool {
	allowed_next_statuses(status).is_empty()
}
