//! Order API handler logic.
//!
//! Parses the wire shapes at the boundary, delegates to the order store,
//! and maps store errors onto HTTP error responses. Unrecognized status
//! strings are rejected here so schema drift between the UI and this
//! service surfaces as an explicit 400 rather than a silent no-op.

use orderdesk_core::lifecycle::{actions_for, allowed_next_statuses};
use orderdesk_core::{OrderStore, StoreError};
use orderdesk_types::{
	APIError, ActionsResponse, ActorType, CreateOrderRequest, InvalidStatus, Order,
	OrderDetailResponse, OrderStatus, OrderSummary, PaymentStatus, PaymentUpdateRequest,
	TransitionRequest,
};
use rust_decimal::Decimal;

/// Creates a new order from an ingestion request.
pub async fn create_order(
	store: &OrderStore,
	request: CreateOrderRequest,
) -> Result<OrderDetailResponse, APIError> {
	if request.order_number.trim().is_empty() {
		return Err(APIError::BadRequest {
			error_type: "INVALID_ORDER_NUMBER".to_string(),
			message: "Order number cannot be empty".to_string(),
			details: None,
		});
	}
	if request.total_amount < Decimal::ZERO {
		return Err(APIError::BadRequest {
			error_type: "INVALID_AMOUNT".to_string(),
			message: "Total amount cannot be negative".to_string(),
			details: None,
		});
	}

	let mut order = Order::new(
		request.order_number,
		request.currency,
		request.total_amount,
		request.customer,
		request.channel,
		request.items,
	);
	order.assignee = request.assignee;

	let order = store.insert_order(order).await.map_err(map_store_error)?;
	Ok(detail(order))
}

/// Lists all orders as summaries, newest first.
pub async fn list_orders(store: &OrderStore) -> Result<Vec<OrderSummary>, APIError> {
	let orders = store.list_orders().await.map_err(map_store_error)?;
	Ok(orders.iter().map(OrderSummary::from).collect())
}

/// Retrieves one order with its derived lifecycle information.
pub async fn get_order(store: &OrderStore, id: &str) -> Result<OrderDetailResponse, APIError> {
	let order = store.get_order(id).await.map_err(map_store_error)?;
	Ok(detail(order))
}

/// Applies a lifecycle transition requested by the UI.
pub async fn apply_transition(
	store: &OrderStore,
	id: &str,
	request: TransitionRequest,
) -> Result<OrderDetailResponse, APIError> {
	let new_status: OrderStatus = request.status.parse().map_err(invalid_status)?;
	let actor_type = request.actor_type.unwrap_or(ActorType::Agent);

	let order = store
		.apply_transition(
			id,
			new_status,
			&request.actor,
			actor_type,
			request.expected_version,
		)
		.await
		.map_err(map_store_error)?;
	Ok(detail(order))
}

/// Updates the payment axis of one order.
pub async fn update_payment(
	store: &OrderStore,
	id: &str,
	request: PaymentUpdateRequest,
) -> Result<OrderDetailResponse, APIError> {
	let new_payment: PaymentStatus = request.payment_status.parse().map_err(invalid_status)?;
	let actor_type = request.actor_type.unwrap_or(ActorType::Agent);

	let order = store
		.update_payment_status(id, new_payment, &request.actor, actor_type)
		.await
		.map_err(map_store_error)?;
	Ok(detail(order))
}

/// Returns the derived capability flags for one order.
pub async fn get_actions(store: &OrderStore, id: &str) -> Result<ActionsResponse, APIError> {
	let order = store.get_order(id).await.map_err(map_store_error)?;
	Ok(ActionsResponse {
		allowed_next_statuses: sorted_allowed(order.order_status),
		actions: actions_for(&order),
	})
}

/// Builds the detail response with the derived lifecycle view attached.
fn detail(order: Order) -> OrderDetailResponse {
	OrderDetailResponse {
		allowed_next_statuses: sorted_allowed(order.order_status),
		actions: actions_for(&order),
		order,
	}
}

/// Allowed next statuses in stable lifecycle order, for deterministic
/// response bodies.
fn sorted_allowed(status: OrderStatus) -> Vec<OrderStatus> {
	let allowed = allowed_next_statuses(status);
	OrderStatus::ALL
		.into_iter()
		.filter(|s| allowed.contains(s))
		.collect()
}

fn invalid_status(err: InvalidStatus) -> APIError {
	APIError::BadRequest {
		error_type: "INVALID_STATUS".to_string(),
		message: err.to_string(),
		details: None,
	}
}

/// Maps store failures onto the HTTP error taxonomy.
fn map_store_error(err: StoreError) -> APIError {
	match err {
		StoreError::NotFound(id) => APIError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: format!("Order not found: {}", id),
		},
		StoreError::DuplicateOrderNumber(number) => APIError::UnprocessableEntity {
			error_type: "DUPLICATE_ORDER_NUMBER".to_string(),
			message: format!("Order number already in use: {}", number),
			details: None,
		},
		StoreError::IllegalTransition { from, to } => APIError::UnprocessableEntity {
			error_type: "ILLEGAL_TRANSITION".to_string(),
			message: format!("Illegal transition from {} to {}", from, to),
			details: Some(serde_json::json!({
				"from": from,
				"to": to,
				"allowedNextStatuses": sorted_allowed(from),
			})),
		},
		StoreError::Conflict { expected, actual } => APIError::Conflict {
			error_type: "CONFLICT".to_string(),
			message: "Order was modified concurrently; refetch and retry".to_string(),
			details: Some(serde_json::json!({
				"expectedVersion": expected,
				"actualVersion": actual,
			})),
		},
		StoreError::NothingStaged(id) => APIError::UnprocessableEntity {
			error_type: "NOTHING_STAGED".to_string(),
			message: format!("No staged transition for order {}", id),
			details: None,
		},
		StoreError::Storage(message) => APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message,
		},
	}
}
