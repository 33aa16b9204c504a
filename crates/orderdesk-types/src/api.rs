//! API types for the orderdesk HTTP API.
//!
//! This module defines the request and response types for the order
//! endpoints, in the wire shape the presentation layer consumes: camelCase
//! field names and SCREAMING_SNAKE_CASE status values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ActorType, Channel, CustomerRef, LineItem, Order, OrderStatus, PaymentStatus};

/// Derived capabilities the presentation layer reads to enable or disable
/// operator actions.
///
/// A pure view over the two status axes; recomputed, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderActions {
	/// The order may be confirmed.
	pub can_confirm: bool,
	/// The order may be handed to a carrier.
	pub can_ship: bool,
	/// The order may be marked delivered.
	pub can_deliver: bool,
	/// The order may be cancelled.
	pub can_cancel: bool,
	/// The collected payment may be returned. Depends only on the payment
	/// axis, not the lifecycle position.
	pub can_refund: bool,
	/// No further lifecycle moves exist.
	pub is_terminal: bool,
}

/// Request body for ingesting a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
	/// Human-readable order number. Must be unique.
	pub order_number: String,
	/// ISO 4217 currency code.
	pub currency: String,
	/// Total amount charged.
	pub total_amount: Decimal,
	/// The customer placing the order.
	pub customer: CustomerRef,
	/// Conversation channel the order came from.
	pub channel: Channel,
	/// Operator to assign the order to, if any.
	#[serde(default)]
	pub assignee: Option<String>,
	/// Purchased items.
	#[serde(default)]
	pub items: Vec<LineItem>,
}

/// Request body for moving an order along a lifecycle edge.
///
/// The status arrives as a raw string and is parsed at this boundary so
/// unrecognized values surface as a 400 rather than a generic
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
	/// Target status wire value, e.g. "CONFIRMED".
	pub status: String,
	/// Who is making the change.
	pub actor: String,
	/// Category of the actor. Defaults to AGENT.
	#[serde(default)]
	pub actor_type: Option<ActorType>,
	/// Version the caller last observed. When present, the transition is
	/// rejected with a conflict if the stored record has moved on.
	#[serde(default)]
	pub expected_version: Option<u64>,
}

/// Request body for updating the payment axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdateRequest {
	/// Target payment status wire value, e.g. "PAID".
	pub payment_status: String,
	/// Who is making the change.
	pub actor: String,
	/// Category of the actor. Defaults to AGENT.
	#[serde(default)]
	pub actor_type: Option<ActorType>,
}

/// Condensed order representation for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
	pub id: String,
	pub order_number: String,
	pub order_status: OrderStatus,
	pub payment_status: PaymentStatus,
	pub currency: String,
	pub total_amount: Decimal,
	pub customer: CustomerRef,
	pub channel: Channel,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub last_updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Order> for OrderSummary {
	fn from(order: &Order) -> Self {
		Self {
			id: order.id.clone(),
			order_number: order.order_number.clone(),
			order_status: order.order_status,
			payment_status: order.payment_status,
			currency: order.currency.clone(),
			total_amount: order.total_amount,
			customer: order.customer.clone(),
			channel: order.channel,
			created_at: order.created_at,
			last_updated_at: order.last_updated_at,
		}
	}
}

/// Full order detail returned to the order drawer, with the derived
/// lifecycle information the UI needs to render its buttons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
	/// The order record itself.
	#[serde(flatten)]
	pub order: Order,
	/// Statuses reachable by exactly one user action.
	pub allowed_next_statuses: Vec<OrderStatus>,
	/// Derived capability flags.
	pub actions: OrderActions,
}

/// Derived lifecycle information for one order, served to button-rendering
/// code that does not need the full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionsResponse {
	/// Statuses reachable by exactly one user action.
	pub allowed_next_statuses: Vec<OrderStatus>,
	/// Derived capability flags.
	pub actions: OrderActions,
}

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code.
	pub error: String,
	/// Human-readable description.
	pub message: String,
	/// Additional error context.
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Bad request with validation errors (400).
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Resource does not exist (404).
	NotFound { error_type: String, message: String },
	/// Concurrent modification detected (409).
	Conflict {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Unprocessable entity for business rule failures (422).
	UnprocessableEntity {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Internal server error (500).
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::NotFound {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
			APIError::Conflict {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::UnprocessableEntity {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
			APIError::UnprocessableEntity { message, .. } => {
				write!(f, "Unprocessable Entity: {}", message)
			}
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			}
		}
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = match self.status_code() {
			400 => StatusCode::BAD_REQUEST,
			404 => StatusCode::NOT_FOUND,
			409 => StatusCode::CONFLICT,
			422 => StatusCode::UNPROCESSABLE_ENTITY,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}
