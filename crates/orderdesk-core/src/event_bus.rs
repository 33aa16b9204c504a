//! Event bus for inter-component communication.
//!
//! The order store publishes an event after every committed change;
//! interested components subscribe and react. Built on a tokio broadcast
//! channel: publishing never blocks, and a slow subscriber only loses its
//! own backlog.

use orderdesk_types::OrderEvent;
use tokio::sync::broadcast;

/// Broadcast bus carrying committed order changes.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<OrderEvent>,
}

impl EventBus {
	/// Creates a new event bus retaining up to `capacity` undelivered
	/// events per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all current subscribers.
	///
	/// Fails only when there are no subscribers; callers that don't care
	/// whether anyone is listening discard the result.
	pub fn publish(&self, event: OrderEvent) -> Result<usize, broadcast::error::SendError<OrderEvent>> {
		self.sender.send(event)
	}

	/// Creates a new subscription receiving all events published after
	/// this call.
	pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1000)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn subscribers_receive_published_events() {
		let bus = EventBus::new(16);
		let mut rx = bus.subscribe();

		bus.publish(OrderEvent::Created {
			order_id: "ord-1".to_string(),
			order_number: "SO-1001".to_string(),
		})
		.unwrap();

		match rx.recv().await.unwrap() {
			OrderEvent::Created { order_id, .. } => assert_eq!(order_id, "ord-1"),
			other => panic!("unexpected event: {:?}", other),
		}
	}

	#[tokio::test]
	async fn publish_without_subscribers_is_an_error_not_a_panic() {
		let bus = EventBus::new(16);
		let result = bus.publish(OrderEvent::Created {
			order_id: "ord-1".to_string(),
			order_number: "SO-1001".to_string(),
		});
		assert!(result.is_err());
	}
}
