//! The action gate.
//!
//! Translates the transition table plus the payment axis into the boolean
//! capability flags the presentation layer reads to enable or disable
//! operator buttons. Pure and memoizable; a derived view, never stored.

use orderdesk_types::{Order, OrderActions, OrderStatus, PaymentStatus};

use crate::lifecycle::transitions::{allowed_next_statuses, is_terminal};

/// Derives the capability flags for an order in the given state.
///
/// Refund eligibility depends only on the payment axis: a paid order may
/// be refunded even after delivery.
pub fn derive_actions(status: OrderStatus, payment: PaymentStatus) -> OrderActions {
	let next = allowed_next_statuses(status);

	OrderActions {
		can_confirm: next.contains(&OrderStatus::Confirmed),
		can_ship: next.contains(&OrderStatus::Shipped),
		can_deliver: next.contains(&OrderStatus::Delivered),
		can_cancel: next.contains(&OrderStatus::Cancelled),
		can_refund: payment == PaymentStatus::Paid,
		is_terminal: is_terminal(status),
	}
}

/// Convenience wrapper deriving the flags straight from an order record.
pub fn actions_for(order: &Order) -> OrderActions {
	derive_actions(order.order_status, order.payment_status)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_order_can_confirm_but_not_ship() {
		let actions = derive_actions(OrderStatus::New, PaymentStatus::Unpaid);
		assert!(actions.can_confirm);
		assert!(!actions.can_ship);
		assert!(!actions.can_deliver);
		assert!(actions.can_cancel);
		assert!(!actions.can_refund);
		assert!(!actions.is_terminal);
	}

	#[test]
	fn shipped_order_can_only_deliver() {
		let actions = derive_actions(OrderStatus::Shipped, PaymentStatus::Paid);
		assert!(!actions.can_confirm);
		assert!(!actions.can_ship);
		assert!(actions.can_deliver);
		assert!(!actions.can_cancel);
	}

	#[test]
	fn delivered_paid_order_is_terminal_but_refundable() {
		let actions = derive_actions(OrderStatus::Delivered, PaymentStatus::Paid);
		assert!(actions.is_terminal);
		assert!(actions.can_refund);
		assert!(!actions.can_confirm);
		assert!(!actions.can_ship);
		assert!(!actions.can_deliver);
		assert!(!actions.can_cancel);
	}

	#[test]
	fn refund_depends_only_on_payment_axis() {
		for status in OrderStatus::ALL {
			let paid = derive_actions(status, PaymentStatus::Paid);
			let unpaid = derive_actions(status, PaymentStatus::Unpaid);
			let refunded = derive_actions(status, PaymentStatus::Refunded);

			assert!(paid.can_refund);
			assert!(!unpaid.can_refund);
			assert!(!refunded.can_refund);

			// Toggling the payment axis flips can_refund and nothing else.
			for (a, b) in [(paid, unpaid), (paid, refunded)] {
				assert_eq!(a.can_confirm, b.can_confirm);
				assert_eq!(a.can_ship, b.can_ship);
				assert_eq!(a.can_deliver, b.can_deliver);
				assert_eq!(a.can_cancel, b.can_cancel);
				assert_eq!(a.is_terminal, b.is_terminal);
			}
		}
	}

	#[test]
	fn actions_serialize_camel_case() {
		let actions = derive_actions(OrderStatus::New, PaymentStatus::Paid);
		let json = serde_json::to_value(actions).unwrap();
		assert_eq!(json["canConfirm"], true);
		assert_eq!(json["canRefund"], true);
		assert_eq!(json["isTerminal"], false);
	}
}
