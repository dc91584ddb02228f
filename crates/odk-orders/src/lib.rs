//! Order domain core.
//!
//! Pure, synchronous logic shared by the store and the HTTP layer:
//!
//! - [`Cents`] — fixed-point money at 2 fractional digits.
//! - [`OrderStatus`] — the order lifecycle state machine with a constant
//!   adjacency table and a total transition validator.
//! - [`price_order`] / [`order_total`] — line-item validation, price
//!   snapshotting and exact total computation.
//!
//! Nothing in this crate performs I/O or consults the clock. The store
//! (`odk-db`) wraps these checks inside its transactions; the daemon maps
//! [`OrderError`] to HTTP 400 responses.

mod money;
mod order;
mod status;

pub use money::{Cents, ParseMoneyError};
pub use order::{order_total, price_order, CatalogItem, DraftItem, PricedItem, PricedOrder};
pub use status::{allowed_transitions, validate_transition, OrderStatus, TransitionError};

use uuid::Uuid;

/// Caller-correctable validation failures raised while building or mutating
/// an order. Every variant maps to an HTTP 400 at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("invalid restaurant")]
    InvalidRestaurant,

    #[error("order must contain at least one item")]
    EmptyOrder,

    #[error("unknown menu item {menu_item_id}")]
    UnknownMenuItem { menu_item_id: Uuid },

    #[error("menu item '{name}' does not belong to this restaurant")]
    ForeignMenuItem { name: String },

    #[error("menu item '{name}' is currently unavailable")]
    ItemUnavailable { name: String },

    #[error("quantity must be a positive integer")]
    NonPositiveQuantity,

    #[error("order total exceeds the supported money range")]
    TotalOverflow,

    #[error("unknown order status '{0}'")]
    UnknownStatus(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}
