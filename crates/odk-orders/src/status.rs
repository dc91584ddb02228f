//! Order status state machine.
//!
//! # Design
//!
//! Explicit state machine for the lifecycle of a single order. The legal
//! transitions are a constant adjacency table ([`allowed_transitions`])
//! checked with a single lookup, and [`validate_transition`] is a *total*
//! pure function over the full status pair space: every `(from, requested)`
//! pair yields an allow or a [`TransitionError`], consulting no other order
//! state, no clock and no external service.
//!
//! # State diagram
//!
//! ```text
//!   pending ──► accepted ──► preparing ──► ready ──► out_for_delivery
//!      │            │            │          │  │            │
//!      │            │            │          │  └────────────┼──► delivered (term.)
//!      └────────────┴────────────┴──────────┴───────────────┴──► cancelled (term.)
//! ```
//!
//! `cancelled` is reachable from every non-terminal state — it is the
//! emergency escape valve for an in-flight order. `delivered` and
//! `cancelled` accept no further transitions, and no status may transition
//! to itself.

use serde::{Deserialize, Serialize};

use crate::OrderError;

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// All valid states an order can occupy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the customer; awaiting the restaurant's decision.
    Pending,
    /// Accepted by the restaurant.
    Accepted,
    /// The kitchen is working on it.
    Preparing,
    /// Ready for pickup / handoff to a courier.
    Ready,
    /// On its way to the customer.
    OutForDelivery,
    /// Handed to the customer. **Terminal.**
    Delivered,
    /// Abandoned by either party. **Terminal.**
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order. Used for exhaustive checks.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Wire / storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, OrderError> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }

    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        allowed_transitions(*self).is_empty()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// The constant adjacency table: which statuses `from` may move to.
///
/// A status never appears in its own successor list, so self-transitions are
/// rejected by the same lookup as any other illegal pair.
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Accepted, Cancelled],
        Accepted => &[Preparing, Cancelled],
        Preparing => &[Ready, Cancelled],
        Ready => &[OutForDelivery, Delivered, Cancelled],
        OutForDelivery => &[Delivered, Cancelled],
        Delivered | Cancelled => &[],
    }
}

/// Check that `from → requested` is a legal transition.
///
/// # Errors
/// Returns [`TransitionError`] for every pair not present in the adjacency
/// table; the error message names the current status and enumerates the
/// legal next states so the caller can self-correct.
pub fn validate_transition(
    from: OrderStatus,
    requested: OrderStatus,
) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&requested) {
        Ok(())
    } else {
        Err(TransitionError { from, requested })
    }
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

/// Returned when a requested status change is not in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    /// The status the order was in when the request arrived.
    pub from: OrderStatus,
    /// The status the caller asked for.
    pub requested: OrderStatus,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let allowed = allowed_transitions(self.from);
        if allowed.is_empty() {
            write!(
                f,
                "invalid status transition from '{}' to '{}': '{}' is terminal and accepts no further changes",
                self.from, self.requested, self.from
            )
        } else {
            let options = allowed
                .iter()
                .map(OrderStatus::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            write!(
                f,
                "invalid status transition from '{}' to '{}'; valid options are: {}",
                self.from, self.requested, options
            )
        }
    }
}

impl std::error::Error for TransitionError {}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    #[test]
    fn happy_path_to_delivery() {
        for (from, to) in [
            (Pending, Accepted),
            (Accepted, Preparing),
            (Preparing, Ready),
            (Ready, OutForDelivery),
            (OutForDelivery, Delivered),
        ] {
            assert!(validate_transition(from, to).is_ok(), "{from} -> {to}");
        }
    }

    #[test]
    fn ready_may_skip_delivery_leg() {
        // Pickup orders go ready -> delivered directly.
        assert!(validate_transition(Ready, Delivered).is_ok());
    }

    #[test]
    fn cancel_reachable_from_every_non_terminal_state() {
        for from in OrderStatus::ALL {
            let verdict = validate_transition(from, Cancelled);
            if from.is_terminal() {
                assert!(verdict.is_err(), "{from} is terminal");
            } else {
                assert!(verdict.is_ok(), "{from} must allow cancellation");
            }
        }
    }

    #[test]
    fn terminal_states_reject_everything() {
        for from in [Delivered, Cancelled] {
            assert!(from.is_terminal());
            for to in OrderStatus::ALL {
                assert!(
                    validate_transition(from, to).is_err(),
                    "{from} -> {to} must be rejected"
                );
            }
        }
    }

    #[test]
    fn no_status_transitions_to_itself() {
        for s in OrderStatus::ALL {
            assert!(validate_transition(s, s).is_err(), "{s} -> {s}");
        }
    }

    #[test]
    fn validator_is_total_and_matches_adjacency_table() {
        // Exhaustive over the full 7x7 pair space: the validator accepts a
        // pair iff the adjacency table lists it.
        let mut allowed_pairs = 0;
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = allowed_transitions(from).contains(&to);
                assert_eq!(validate_transition(from, to).is_ok(), expected);
                if expected {
                    allowed_pairs += 1;
                }
            }
        }
        // 2 + 2 + 2 + 3 + 2 successors; the other 38 pairs deny.
        assert_eq!(allowed_pairs, 11);
    }

    #[test]
    fn rejection_enumerates_legal_options() {
        let err = validate_transition(Pending, Preparing).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'pending'"), "{msg}");
        assert!(msg.contains("accepted, cancelled"), "{msg}");
    }

    #[test]
    fn terminal_rejection_names_terminal_status() {
        let err = validate_transition(Delivered, Pending).unwrap_err();
        assert!(err.to_string().contains("terminal"), "{err}");
    }

    #[test]
    fn as_str_parse_roundtrip() {
        for s in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(OrderStatus::parse("shipped").is_err());
    }
}
