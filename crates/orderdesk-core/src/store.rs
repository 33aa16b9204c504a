//! Guarded order store.
//!
//! Owns the authoritative order records behind the desk. Every change goes
//! through here: transitions are validated against the lifecycle table and
//! evaluated against the stored state, never against a caller-supplied
//! copy. Attempts on the same order are serialized through a per-order
//! lock, and a version counter detects writers racing each other across
//! processes. A change commits as a single storage write of the updated
//! record, so a cancelled request never leaves a half-applied order.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use orderdesk_storage::{StorageError, StorageService};
use orderdesk_types::{
	truncate_id, ActorType, Order, OrderEvent, OrderStatus, PaymentStatus, StorageKey,
	TimelineEvent, TimelineEventType,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::event_bus::EventBus;
use crate::lifecycle::transitions::is_transition_allowed;

/// Errors that can occur while reading or mutating orders.
///
/// All variants are local validation or infrastructure failures; no retry
/// policy lives at this layer.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Order number already in use: {0}")]
	DuplicateOrderNumber(String),
	/// The requested move is not an edge of the lifecycle table. The
	/// caller should re-read the order and re-derive its allowed actions.
	#[error("Illegal transition from {from} to {to}")]
	IllegalTransition { from: OrderStatus, to: OrderStatus },
	/// The order changed since the caller last observed it. The caller
	/// must refetch and re-decide, not blindly resubmit.
	#[error("Order was modified concurrently: expected version {expected}, found {actual}")]
	Conflict { expected: u64, actual: u64 },
	#[error("No staged transition for order {0}")]
	NothingStaged(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

/// Manages order persistence, lifecycle transitions, and change events.
pub struct OrderStore {
	storage: Arc<StorageService>,
	events: EventBus,
	/// Per-key mutexes serializing concurrent mutations of one record.
	locks: DashMap<String, Arc<Mutex<()>>>,
}

impl OrderStore {
	pub fn new(storage: Arc<StorageService>, events: EventBus) -> Self {
		Self {
			storage,
			events,
			locks: DashMap::new(),
		}
	}

	/// Ingests a new order, enforcing order-number uniqueness.
	pub async fn insert_order(&self, order: Order) -> Result<Order, StoreError> {
		// Lock on the order number so two ingestions of the same number
		// cannot interleave between the existence check and the write.
		let lock = self.lock_for(&format!("number:{}", order.order_number));
		let _guard = lock.lock().await;

		if self
			.storage
			.exists(StorageKey::OrderByNumber, &order.order_number)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?
		{
			return Err(StoreError::DuplicateOrderNumber(order.order_number));
		}

		self.storage
			.store(StorageKey::Orders, &order.id, &order)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;
		self.storage
			.store(StorageKey::OrderByNumber, &order.order_number, &order.id)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;

		tracing::info!(
			order_id = %truncate_id(&order.id),
			order_number = %order.order_number,
			"Order ingested"
		);

		self.events
			.publish(OrderEvent::Created {
				order_id: order.id.clone(),
				order_number: order.order_number.clone(),
			})
			.ok();

		Ok(order)
	}

	/// Gets an order by id.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, StoreError> {
		self.load(order_id).await
	}

	/// Gets an order by its human-readable number.
	pub async fn get_order_by_number(&self, order_number: &str) -> Result<Order, StoreError> {
		let order_id: String = self
			.storage
			.retrieve(StorageKey::OrderByNumber, order_number)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => StoreError::NotFound(order_number.to_string()),
				other => StoreError::Storage(other.to_string()),
			})?;
		self.load(&order_id).await
	}

	/// Lists all orders, newest first.
	pub async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all(StorageKey::Orders)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))?;
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(orders)
	}

	/// Applies a confirmed lifecycle transition.
	///
	/// The guard is evaluated against the stored order. When
	/// `expected_version` is given, the transition is rejected with a
	/// conflict if the record has been modified since the caller observed
	/// that version.
	pub async fn apply_transition(
		&self,
		order_id: &str,
		new_status: OrderStatus,
		actor: &str,
		actor_type: ActorType,
		expected_version: Option<u64>,
	) -> Result<Order, StoreError> {
		let lock = self.lock_for(order_id);
		let _guard = lock.lock().await;

		let order = self.load(order_id).await?;

		if let Some(expected) = expected_version {
			if order.version != expected {
				return Err(StoreError::Conflict {
					expected,
					actual: order.version,
				});
			}
		}

		self.commit_status_change(order, new_status, actor, actor_type)
			.await
	}

	/// Updates the payment axis.
	///
	/// No transition table governs payment status; any value may follow
	/// any other. The change still appends a timeline event and bumps the
	/// version.
	pub async fn update_payment_status(
		&self,
		order_id: &str,
		new_payment_status: PaymentStatus,
		actor: &str,
		actor_type: ActorType,
	) -> Result<Order, StoreError> {
		let lock = self.lock_for(order_id);
		let _guard = lock.lock().await;

		let mut order = self.load(order_id).await?;
		let from = order.payment_status;
		let now = next_event_time(&order);

		order.payment_status = new_payment_status;
		order.last_updated_at = now;
		order.version += 1;
		order.timeline.push(TimelineEvent {
			event_type: TimelineEventType::PaymentStatusChanged,
			description: format!("Payment status changed from {} to {}", from, new_payment_status),
			actor: actor.to_string(),
			actor_type,
			created_at: now,
		});

		self.persist(&order).await?;

		tracing::info!(
			order_id = %truncate_id(order_id),
			from = %from,
			to = %new_payment_status,
			"Payment status updated"
		);

		self.events
			.publish(OrderEvent::PaymentStatusChanged {
				order_id: order.id.clone(),
				from,
				to: new_payment_status,
				actor: actor.to_string(),
			})
			.ok();

		Ok(order)
	}

	/// Stages a tentative transition without committing it.
	///
	/// The target is guard-checked against the current status, then
	/// recorded as the order's pending status. No timeline event is
	/// appended and the version does not move: staged state is never
	/// authoritative.
	pub async fn stage_transition(
		&self,
		order_id: &str,
		new_status: OrderStatus,
	) -> Result<Order, StoreError> {
		let lock = self.lock_for(order_id);
		let _guard = lock.lock().await;

		let mut order = self.load(order_id).await?;
		if !is_transition_allowed(order.order_status, new_status) {
			return Err(StoreError::IllegalTransition {
				from: order.order_status,
				to: new_status,
			});
		}

		order.pending_status = Some(new_status);
		self.persist(&order).await?;
		Ok(order)
	}

	/// Promotes a staged transition to a committed one.
	///
	/// The guard is re-evaluated at confirmation time; a stale staged
	/// value that is no longer legal fails and stays pending for the
	/// caller to abort.
	pub async fn confirm_staged(
		&self,
		order_id: &str,
		actor: &str,
		actor_type: ActorType,
	) -> Result<Order, StoreError> {
		let lock = self.lock_for(order_id);
		let _guard = lock.lock().await;

		let order = self.load(order_id).await?;
		let pending = order
			.pending_status
			.ok_or_else(|| StoreError::NothingStaged(order_id.to_string()))?;

		self.commit_status_change(order, pending, actor, actor_type)
			.await
	}

	/// Discards a staged transition, e.g. after the backing request was
	/// rejected or cancelled.
	pub async fn abort_staged(&self, order_id: &str) -> Result<Order, StoreError> {
		let lock = self.lock_for(order_id);
		let _guard = lock.lock().await;

		let mut order = self.load(order_id).await?;
		if order.pending_status.is_none() {
			return Err(StoreError::NothingStaged(order_id.to_string()));
		}

		order.pending_status = None;
		self.persist(&order).await?;
		Ok(order)
	}

	/// Validates and commits a status change as one storage write.
	///
	/// Callers must hold the order's lock.
	async fn commit_status_change(
		&self,
		mut order: Order,
		new_status: OrderStatus,
		actor: &str,
		actor_type: ActorType,
	) -> Result<Order, StoreError> {
		let from = order.order_status;
		if !is_transition_allowed(from, new_status) {
			return Err(StoreError::IllegalTransition {
				from,
				to: new_status,
			});
		}

		let now = next_event_time(&order);
		order.order_status = new_status;
		order.pending_status = None;
		order.last_updated_at = now;
		order.version += 1;
		order.timeline.push(TimelineEvent {
			event_type: TimelineEventType::StatusChanged,
			description: format!("Status changed from {} to {}", from, new_status),
			actor: actor.to_string(),
			actor_type,
			created_at: now,
		});

		self.persist(&order).await?;

		tracing::info!(
			order_id = %truncate_id(&order.id),
			from = %from,
			to = %new_status,
			actor = %actor,
			"Transition applied"
		);

		self.events
			.publish(OrderEvent::StatusChanged {
				order_id: order.id.clone(),
				from,
				to: new_status,
				actor: actor.to_string(),
			})
			.ok();

		Ok(order)
	}

	async fn load(&self, order_id: &str) -> Result<Order, StoreError> {
		self.storage
			.retrieve(StorageKey::Orders, order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => StoreError::NotFound(order_id.to_string()),
				other => StoreError::Storage(other.to_string()),
			})
	}

	async fn persist(&self, order: &Order) -> Result<(), StoreError> {
		self.storage
			.update(StorageKey::Orders, &order.id, order)
			.await
			.map_err(|e| StoreError::Storage(e.to_string()))
	}

	fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
		self.locks
			.entry(key.to_string())
			.or_insert_with(|| Arc::new(Mutex::new(())))
			.clone()
	}
}

/// Timestamp for the next timeline event.
///
/// Clamped so the timeline stays non-decreasing even if the wall clock
/// steps backwards between two appends.
fn next_event_time(order: &Order) -> DateTime<Utc> {
	let now = Utc::now();
	match order.timeline.last() {
		Some(last) if last.created_at > now => last.created_at,
		_ => now,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use orderdesk_storage::implementations::memory::MemoryStorage;
	use orderdesk_types::{Channel, CustomerRef};
	use rust_decimal::Decimal;

	fn test_store() -> OrderStore {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		OrderStore::new(storage, EventBus::new(64))
	}

	fn sample_order(number: &str) -> Order {
		Order::new(
			number.to_string(),
			"USD".to_string(),
			Decimal::new(12900, 2),
			CustomerRef {
				id: "cust-7".to_string(),
				name: "Bima".to_string(),
			},
			Channel::Whatsapp,
			vec![],
		)
	}

	#[tokio::test]
	async fn insert_and_lookup_by_id_and_number() {
		let store = test_store();
		let order = store.insert_order(sample_order("SO-2001")).await.unwrap();

		let by_id = store.get_order(&order.id).await.unwrap();
		assert_eq!(by_id.order_number, "SO-2001");
		assert_eq!(by_id.order_status, OrderStatus::New);
		assert_eq!(by_id.payment_status, PaymentStatus::Unpaid);

		let by_number = store.get_order_by_number("SO-2001").await.unwrap();
		assert_eq!(by_number.id, order.id);
	}

	#[tokio::test]
	async fn duplicate_order_numbers_are_rejected() {
		let store = test_store();
		store.insert_order(sample_order("SO-2002")).await.unwrap();

		let result = store.insert_order(sample_order("SO-2002")).await;
		assert!(matches!(
			result,
			Err(StoreError::DuplicateOrderNumber(n)) if n == "SO-2002"
		));
	}

	#[tokio::test]
	async fn confirming_a_new_order_appends_one_timeline_event() {
		let store = test_store();
		let order = store.insert_order(sample_order("SO-2003")).await.unwrap();
		let before = order.timeline.len();

		let updated = store
			.apply_transition(
				&order.id,
				OrderStatus::Confirmed,
				"agent-1",
				ActorType::Agent,
				None,
			)
			.await
			.unwrap();

		assert_eq!(updated.order_status, OrderStatus::Confirmed);
		assert_eq!(updated.timeline.len(), before + 1);
		assert_eq!(updated.version, order.version + 1);
		assert!(updated.last_updated_at >= order.last_updated_at);

		let last = updated.timeline.last().unwrap();
		assert_eq!(last.event_type, TimelineEventType::StatusChanged);
		assert_eq!(last.actor, "agent-1");
	}

	#[tokio::test]
	async fn illegal_transition_leaves_the_order_untouched() {
		let store = test_store();
		let order = store.insert_order(sample_order("SO-2004")).await.unwrap();

		for status in [
			OrderStatus::Confirmed,
			OrderStatus::Shipped,
			OrderStatus::Delivered,
		] {
			store
				.apply_transition(&order.id, status, "agent-1", ActorType::Agent, None)
				.await
				.unwrap();
		}
		let delivered = store.get_order(&order.id).await.unwrap();

		let result = store
			.apply_transition(
				&order.id,
				OrderStatus::Shipped,
				"agent-1",
				ActorType::Agent,
				None,
			)
			.await;
		assert!(matches!(
			result,
			Err(StoreError::IllegalTransition {
				from: OrderStatus::Delivered,
				to: OrderStatus::Shipped,
			})
		));

		// State and timeline are exactly as they were before the attempt.
		let after = store.get_order(&order.id).await.unwrap();
		assert_eq!(after.order_status, OrderStatus::Delivered);
		assert_eq!(after.version, delivered.version);
		assert_eq!(after.timeline.len(), delivered.timeline.len());
	}

	#[tokio::test]
	async fn stale_version_is_a_conflict() {
		let store = test_store();
		let order = store.insert_order(sample_order("SO-2005")).await.unwrap();

		store
			.apply_transition(
				&order.id,
				OrderStatus::Confirmed,
				"agent-1",
				ActorType::Agent,
				Some(order.version),
			)
			.await
			.unwrap();

		// A second operator still holding the original version loses.
		let result = store
			.apply_transition(
				&order.id,
				OrderStatus::Cancelled,
				"agent-2",
				ActorType::Agent,
				Some(order.version),
			)
			.await;
		assert!(matches!(result, Err(StoreError::Conflict { .. })));
	}

	#[tokio::test]
	async fn concurrent_shipping_attempts_produce_one_winner() {
		let store = Arc::new(test_store());
		let order = store.insert_order(sample_order("SO-2006")).await.unwrap();
		let confirmed = store
			.apply_transition(
				&order.id,
				OrderStatus::Confirmed,
				"agent-1",
				ActorType::Agent,
				None,
			)
			.await
			.unwrap();

		let mut handles = Vec::new();
		for actor in ["agent-1", "agent-2"] {
			let store = Arc::clone(&store);
			let order_id = order.id.clone();
			let expected = confirmed.version;
			handles.push(tokio::spawn(async move {
				store
					.apply_transition(
						&order_id,
						OrderStatus::Shipped,
						actor,
						ActorType::Agent,
						Some(expected),
					)
					.await
			}));
		}

		let mut wins = 0;
		for handle in handles {
			if handle.await.unwrap().is_ok() {
				wins += 1;
			}
		}
		assert_eq!(wins, 1);

		let after = store.get_order(&order.id).await.unwrap();
		assert_eq!(after.order_status, OrderStatus::Shipped);
		assert_eq!(after.version, confirmed.version + 1);
	}

	#[tokio::test]
	async fn payment_status_moves_are_unrestricted() {
		let store = test_store();
		let order = store.insert_order(sample_order("SO-2007")).await.unwrap();
		let before = order.timeline.len();

		for payment in [
			PaymentStatus::Paid,
			PaymentStatus::Refunded,
			PaymentStatus::Unpaid,
		] {
			store
				.update_payment_status(&order.id, payment, "agent-1", ActorType::Agent)
				.await
				.unwrap();
		}

		let after = store.get_order(&order.id).await.unwrap();
		assert_eq!(after.payment_status, PaymentStatus::Unpaid);
		assert_eq!(after.timeline.len(), before + 3);
		assert!(after
			.timeline
			.iter()
			.skip(before)
			.all(|e| e.event_type == TimelineEventType::PaymentStatusChanged));
	}

	#[tokio::test]
	async fn staged_transitions_commit_or_roll_back() {
		let store = test_store();
		let order = store.insert_order(sample_order("SO-2008")).await.unwrap();

		// Staging records the pending target without committing anything.
		let staged = store
			.stage_transition(&order.id, OrderStatus::Confirmed)
			.await
			.unwrap();
		assert_eq!(staged.pending_status, Some(OrderStatus::Confirmed));
		assert_eq!(staged.order_status, OrderStatus::New);
		assert_eq!(staged.version, order.version);
		assert_eq!(staged.timeline.len(), order.timeline.len());

		// Aborting clears it.
		let aborted = store.abort_staged(&order.id).await.unwrap();
		assert_eq!(aborted.pending_status, None);
		assert_eq!(aborted.order_status, OrderStatus::New);

		// Stage again and confirm; only now does the order move.
		store
			.stage_transition(&order.id, OrderStatus::Confirmed)
			.await
			.unwrap();
		let confirmed = store
			.confirm_staged(&order.id, "agent-1", ActorType::Agent)
			.await
			.unwrap();
		assert_eq!(confirmed.order_status, OrderStatus::Confirmed);
		assert_eq!(confirmed.pending_status, None);
		assert_eq!(confirmed.version, order.version + 1);
	}

	#[tokio::test]
	async fn staging_an_illegal_move_fails() {
		let store = test_store();
		let order = store.insert_order(sample_order("SO-2009")).await.unwrap();

		let result = store
			.stage_transition(&order.id, OrderStatus::Delivered)
			.await;
		assert!(matches!(
			result,
			Err(StoreError::IllegalTransition {
				from: OrderStatus::New,
				to: OrderStatus::Delivered,
			})
		));

		let result = store.confirm_staged(&order.id, "agent-1", ActorType::Agent).await;
		assert!(matches!(result, Err(StoreError::NothingStaged(_))));
	}

	#[tokio::test]
	async fn timeline_timestamps_never_decrease() {
		let store = test_store();
		let order = store.insert_order(sample_order("SO-2010")).await.unwrap();

		store
			.apply_transition(
				&order.id,
				OrderStatus::Confirmed,
				"agent-1",
				ActorType::Agent,
				None,
			)
			.await
			.unwrap();
		store
			.update_payment_status(&order.id, PaymentStatus::Paid, "agent-1", ActorType::Agent)
			.await
			.unwrap();

		let after = store.get_order(&order.id).await.unwrap();
		for pair in after.timeline.windows(2) {
			assert!(pair[0].created_at <= pair[1].created_at);
		}
	}

	#[tokio::test]
	async fn list_orders_returns_newest_first() {
		let store = test_store();
		store.insert_order(sample_order("SO-2011")).await.unwrap();
		store.insert_order(sample_order("SO-2012")).await.unwrap();

		let orders = store.list_orders().await.unwrap();
		assert_eq!(orders.len(), 2);
		assert!(orders[0].created_at >= orders[1].created_at);
	}

	#[tokio::test]
	async fn transitions_on_missing_orders_fail_cleanly() {
		let store = test_store();
		let result = store
			.apply_transition(
				"no-such-order",
				OrderStatus::Confirmed,
				"agent-1",
				ActorType::Agent,
				None,
			)
			.await;
		assert!(matches!(result, Err(StoreError::NotFound(_))));
	}
}
