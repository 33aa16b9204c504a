//! Order domain types for the orderdesk system.
//!
//! This module defines the order record and its two status axes. The order
//! status is the sole authority for lifecycle position; the payment status
//! is an independent axis that only gates refunds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::{ActorType, TimelineEvent, TimelineEventType};

/// Error returned when a wire value does not name a known status.
///
/// Unknown values indicate a schema mismatch with a peer and must be
/// surfaced rather than mapped to a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind} value: {value}")]
pub struct InvalidStatus {
	/// Which taxonomy was being parsed.
	pub kind: &'static str,
	/// The offending wire value.
	pub value: String,
}

/// Lifecycle stage of a commerce order.
///
/// Serialized in SCREAMING_SNAKE_CASE to match the wire shape consumed by
/// the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Order has been captured from a conversation but not yet reviewed.
	New,
	/// Order is awaiting operator review.
	Pending,
	/// Order has been confirmed by an operator.
	Confirmed,
	/// Order is being prepared for shipment.
	Processing,
	/// Order has been handed to a carrier.
	Shipped,
	/// Order has reached the customer. Terminal.
	Delivered,
	/// Order has been cancelled. Terminal.
	Cancelled,
}

impl OrderStatus {
	/// Every status in the taxonomy, in lifecycle order.
	pub const ALL: [OrderStatus; 7] = [
		OrderStatus::New,
		OrderStatus::Pending,
		OrderStatus::Confirmed,
		OrderStatus::Processing,
		OrderStatus::Shipped,
		OrderStatus::Delivered,
		OrderStatus::Cancelled,
	];

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::New => "NEW",
			OrderStatus::Pending => "PENDING",
			OrderStatus::Confirmed => "CONFIRMED",
			OrderStatus::Processing => "PROCESSING",
			OrderStatus::Shipped => "SHIPPED",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Cancelled => "CANCELLED",
		}
	}
}

impl FromStr for OrderStatus {
	type Err = InvalidStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"NEW" => Ok(OrderStatus::New),
			"PENDING" => Ok(OrderStatus::Pending),
			"CONFIRMED" => Ok(OrderStatus::Confirmed),
			"PROCESSING" => Ok(OrderStatus::Processing),
			"SHIPPED" => Ok(OrderStatus::Shipped),
			"DELIVERED" => Ok(OrderStatus::Delivered),
			"CANCELLED" => Ok(OrderStatus::Cancelled),
			other => Err(InvalidStatus {
				kind: "order status",
				value: other.to_string(),
			}),
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Whether money has been collected or returned for an order.
///
/// Independent of [`OrderStatus`]; a paid order may be refunded even after
/// delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
	/// No payment has been collected.
	Unpaid,
	/// Payment has been collected in full.
	Paid,
	/// A collected payment has been returned.
	Refunded,
}

impl PaymentStatus {
	/// Returns the wire representation of the payment status.
	pub fn as_str(&self) -> &'static str {
		match self {
			PaymentStatus::Unpaid => "UNPAID",
			PaymentStatus::Paid => "PAID",
			PaymentStatus::Refunded => "REFUNDED",
		}
	}
}

impl FromStr for PaymentStatus {
	type Err = InvalidStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"UNPAID" => Ok(PaymentStatus::Unpaid),
			"PAID" => Ok(PaymentStatus::Paid),
			"REFUNDED" => Ok(PaymentStatus::Refunded),
			other => Err(InvalidStatus {
				kind: "payment status",
				value: other.to_string(),
			}),
		}
	}
}

impl fmt::Display for PaymentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Messaging channel the order originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
	Instagram,
	Whatsapp,
	Messenger,
}

impl fmt::Display for Channel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Channel::Instagram => write!(f, "INSTAGRAM"),
			Channel::Whatsapp => write!(f, "WHATSAPP"),
			Channel::Messenger => write!(f, "MESSENGER"),
		}
	}
}

/// Reference to the customer an order belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRef {
	/// Opaque customer identifier.
	pub id: String,
	/// Display name, as shown in the inbox.
	pub name: String,
}

/// A single purchased item on an order. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
	/// Product name.
	pub name: String,
	/// Number of units purchased.
	pub quantity: u32,
	/// Price per unit in the order currency.
	pub unit_price: Decimal,
	/// Quantity times unit price.
	pub line_total: Decimal,
}

/// A commerce order tracked by the desk.
///
/// The record is only ever mutated through the order store; the status
/// moves exclusively along the lifecycle transition table and every change
/// appends a timeline event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Opaque unique identifier.
	pub id: String,
	/// Human-readable order number. Unique and immutable once issued.
	pub order_number: String,
	/// Current lifecycle position. Sole authority for what the order may do next.
	pub order_status: OrderStatus,
	/// Payment axis, gating refunds only.
	pub payment_status: PaymentStatus,
	/// ISO 4217 currency code for the monetary fields.
	pub currency: String,
	/// Total amount charged for the order.
	pub total_amount: Decimal,
	/// The customer this order belongs to.
	pub customer: CustomerRef,
	/// Conversation channel the order came from.
	pub channel: Channel,
	/// Operator the order is assigned to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assignee: Option<String>,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last updated.
	pub last_updated_at: DateTime<Utc>,
	/// Modification counter, incremented on every committed change.
	/// Compared against a caller-supplied expected version to detect
	/// concurrent modification.
	#[serde(default)]
	pub version: u64,
	/// Tentative status staged locally but not yet confirmed. Never
	/// authoritative; cleared on confirm or abort.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pending_status: Option<OrderStatus>,
	/// Purchased items. Not part of the state machine.
	#[serde(default)]
	pub items: Vec<LineItem>,
	/// Append-only history of every change made to the order.
	#[serde(default)]
	pub timeline: Vec<TimelineEvent>,
}

impl Order {
	/// Creates a new order in the `NEW`/`UNPAID` state with an
	/// `ORDER_CREATED` timeline entry.
	pub fn new(
		order_number: String,
		currency: String,
		total_amount: Decimal,
		customer: CustomerRef,
		channel: Channel,
		items: Vec<LineItem>,
	) -> Self {
		let now = Utc::now();
		let created = TimelineEvent {
			event_type: TimelineEventType::OrderCreated,
			description: format!("Order {} created via {}", order_number, channel),
			actor: "orderdesk".to_string(),
			actor_type: ActorType::System,
			created_at: now,
		};

		Self {
			id: uuid::Uuid::new_v4().to_string(),
			order_number,
			order_status: OrderStatus::New,
			payment_status: PaymentStatus::Unpaid,
			currency,
			total_amount,
			customer,
			channel,
			assignee: None,
			created_at: now,
			last_updated_at: now,
			version: 1,
			pending_status: None,
			items,
			timeline: vec![created],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn order_status_round_trips_through_wire_form() {
		for status in OrderStatus::ALL {
			assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
		}
	}

	#[test]
	fn unknown_order_status_is_rejected() {
		let err = "ARCHIVED".parse::<OrderStatus>().unwrap_err();
		assert_eq!(err.kind, "order status");
		assert_eq!(err.value, "ARCHIVED");
	}

	#[test]
	fn unknown_payment_status_is_rejected() {
		let err = "paid".parse::<PaymentStatus>().unwrap_err();
		assert_eq!(err.kind, "payment status");
	}

	#[test]
	fn order_serializes_with_ui_field_names() {
		let order = sample_order();
		let json = serde_json::to_value(&order).unwrap();
		assert_eq!(json["orderStatus"], "NEW");
		assert_eq!(json["paymentStatus"], "UNPAID");
		assert_eq!(json["orderNumber"], "SO-1001");
		assert!(json.get("totalAmount").is_some());
		assert!(json.get("lastUpdatedAt").is_some());
	}

	fn sample_order() -> Order {
		Order::new(
			"SO-1001".to_string(),
			"USD".to_string(),
			Decimal::new(4999, 2),
			CustomerRef {
				id: "cust-1".to_string(),
				name: "Ayu".to_string(),
			},
			Channel::Instagram,
			vec![],
		)
	}
}
