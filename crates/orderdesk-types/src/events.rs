//! Event types for order history and inter-component communication.
//!
//! Two kinds of events live here: timeline events, the append-only history
//! stored on each order record, and bus events, broadcast by the order
//! store so other components can react to committed changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OrderStatus, PaymentStatus};

/// Who performed a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
	/// A human operator working the desk.
	Agent,
	/// The service itself.
	System,
	/// The customer, acting through a storefront or conversation.
	Customer,
}

/// Kind of change recorded on an order timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineEventType {
	/// The order record was created.
	OrderCreated,
	/// The order status moved along a lifecycle edge.
	StatusChanged,
	/// The payment status was updated.
	PaymentStatusChanged,
}

/// An immutable record of a change made to an order.
///
/// Timeline events are append-only: once written they are never mutated or
/// reordered, and their timestamps are non-decreasing in append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
	/// What kind of change happened.
	#[serde(rename = "type")]
	pub event_type: TimelineEventType,
	/// Human-readable description of the change.
	pub description: String,
	/// Name or id of whoever made the change.
	pub actor: String,
	/// Category of the actor.
	pub actor_type: ActorType,
	/// When the change was committed.
	pub created_at: DateTime<Utc>,
}

/// Events broadcast by the order store after a committed change.
///
/// Consumers subscribe through the event bus; a lagging or absent consumer
/// never blocks the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A new order was ingested.
	Created { order_id: String, order_number: String },
	/// An order moved along a lifecycle edge.
	StatusChanged {
		order_id: String,
		from: OrderStatus,
		to: OrderStatus,
		actor: String,
	},
	/// An order's payment axis changed.
	PaymentStatusChanged {
		order_id: String,
		from: PaymentStatus,
		to: PaymentStatus,
		actor: String,
	},
}
