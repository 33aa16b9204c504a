//! HTTP server for the orderdesk API.
//!
//! This module provides the HTTP surface the presentation layer talks to:
//! routing, CORS, and the mapping from handlers to the order store.

use axum::{
	extract::{Path, State},
	http::HeaderValue,
	response::Json,
	routing::{get, post},
	Router,
};
use orderdesk_config::ApiConfig;
use orderdesk_core::OrderStore;
use orderdesk_types::{
	APIError, ActionsResponse, CreateOrderRequest, OrderDetailResponse, OrderSummary,
	PaymentUpdateRequest, TransitionRequest,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::apis;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// The order store handling all reads and mutations.
	pub store: Arc<OrderStore>,
}

/// Starts the HTTP server for the API.
///
/// This function creates and configures the HTTP server with routing,
/// middleware, and error handling for the order endpoints, and serves
/// until Ctrl+C.
pub async fn start_server(
	api_config: ApiConfig,
	store: Arc<OrderStore>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { store };

	let cors = build_cors_layer(&api_config);

	// Build the router with /api base path and the order endpoints
	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(handle_create_order).get(handle_list_orders))
				.route("/orders/{id}", get(handle_get_order))
				.route("/orders/{id}/status", post(handle_transition))
				.route("/orders/{id}/payment", post(handle_payment_update))
				.route("/orders/{id}/actions", get(handle_get_actions)),
		)
		.layer(ServiceBuilder::new().layer(cors))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("orderdesk API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			tokio::signal::ctrl_c().await.ok();
		})
		.await?;

	Ok(())
}

/// Builds the CORS layer from configuration, allowing everything when no
/// origins are configured.
fn build_cors_layer(api_config: &ApiConfig) -> CorsLayer {
	match &api_config.cors {
		Some(cors) => {
			let origins: Vec<HeaderValue> = cors
				.allowed_origins
				.iter()
				.filter_map(|origin| origin.parse().ok())
				.collect();
			CorsLayer::new()
				.allow_origin(origins)
				.allow_methods(Any)
				.allow_headers(Any)
		}
		None => CorsLayer::permissive(),
	}
}

/// Handles POST /api/orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<Json<OrderDetailResponse>, APIError> {
	match apis::order::create_order(&state.store, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order creation failed: {}", e);
			Err(e)
		}
	}
}

/// Handles GET /api/orders requests.
async fn handle_list_orders(
	State(state): State<AppState>,
) -> Result<Json<Vec<OrderSummary>>, APIError> {
	match apis::order::list_orders(&state.store).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order listing failed: {}", e);
			Err(e)
		}
	}
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderDetailResponse>, APIError> {
	match apis::order::get_order(&state.store, &id).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order retrieval failed: {}", e);
			Err(e)
		}
	}
}

/// Handles POST /api/orders/{id}/status requests.
async fn handle_transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<TransitionRequest>,
) -> Result<Json<OrderDetailResponse>, APIError> {
	match apis::order::apply_transition(&state.store, &id, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Transition failed: {}", e);
			Err(e)
		}
	}
}

/// Handles POST /api/orders/{id}/payment requests.
async fn handle_payment_update(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<PaymentUpdateRequest>,
) -> Result<Json<OrderDetailResponse>, APIError> {
	match apis::order::update_payment(&state.store, &id, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Payment update failed: {}", e);
			Err(e)
		}
	}
}

/// Handles GET /api/orders/{id}/actions requests.
async fn handle_get_actions(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<ActionsResponse>, APIError> {
	match apis::order::get_actions(&state.store, &id).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Action lookup failed: {}", e);
			Err(e)
		}
	}
}
