//! Order pricing and total computation.
//!
//! [`price_order`] turns a customer's draft line items into priced line
//! items by resolving each referenced menu item through a caller-supplied
//! lookup, validating it against the target restaurant, and snapshotting its
//! current price. The snapshot is the line item's price forever — later
//! catalog edits never touch it.
//!
//! [`order_total`] is the single named recomputation operation for the
//! invariant `order.total == sum(item.subtotal)`. It is invoked explicitly
//! by the store after any item-set change, never as a hidden save side
//! effect, and is idempotent: integer cents make repeated recomputation
//! bit-for-bit stable.

use uuid::Uuid;

use crate::{Cents, OrderError};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A menu catalog entry as seen at pricing time.
///
/// The store materializes these from locked catalog rows so availability and
/// price cannot change underneath the pricing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub menu_item_id: Uuid,
    /// The restaurant that owns this catalog entry.
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: Cents,
    pub is_available: bool,
}

/// One requested line of a new order, exactly as the customer sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub special_instructions: String,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// A validated line item carrying its snapshot price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItem {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    /// Unit price captured from the catalog at creation time. Immutable.
    pub unit_price: Cents,
    pub special_instructions: String,
}

impl PricedItem {
    /// `unit_price × quantity`, or `None` on `i64` overflow.
    pub fn subtotal(&self) -> Option<Cents> {
        self.unit_price.checked_mul_qty(i64::from(self.quantity))
    }
}

/// The result of pricing a draft: line items plus their exact total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub items: Vec<PricedItem>,
    pub total: Cents,
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Validate and price a draft order against the menu catalog.
///
/// `resolve` looks up a catalog entry by id; returning `None` marks the
/// referenced item unknown. Validation is all-or-nothing: the first failing
/// line rejects the whole draft, so the store either persists every line or
/// nothing.
///
/// # Errors
/// - [`OrderError::EmptyOrder`] — no draft lines.
/// - [`OrderError::NonPositiveQuantity`] — a line with `quantity <= 0`.
/// - [`OrderError::UnknownMenuItem`] — `resolve` returned `None`.
/// - [`OrderError::ForeignMenuItem`] — the item belongs to another restaurant.
/// - [`OrderError::ItemUnavailable`] — the item is currently unavailable.
/// - [`OrderError::TotalOverflow`] — a subtotal or the total overflows.
pub fn price_order(
    restaurant_id: Uuid,
    drafts: &[DraftItem],
    resolve: impl Fn(Uuid) -> Option<CatalogItem>,
) -> Result<PricedOrder, OrderError> {
    if drafts.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut items = Vec::with_capacity(drafts.len());
    for draft in drafts {
        if draft.quantity <= 0 {
            return Err(OrderError::NonPositiveQuantity);
        }

        let entry = resolve(draft.menu_item_id).ok_or(OrderError::UnknownMenuItem {
            menu_item_id: draft.menu_item_id,
        })?;
        if entry.restaurant_id != restaurant_id {
            return Err(OrderError::ForeignMenuItem { name: entry.name });
        }
        if !entry.is_available {
            return Err(OrderError::ItemUnavailable { name: entry.name });
        }

        items.push(PricedItem {
            menu_item_id: entry.menu_item_id,
            quantity: draft.quantity,
            unit_price: entry.price,
            special_instructions: draft.special_instructions.clone(),
        });
    }

    let total = order_total(&items)?;
    Ok(PricedOrder { items, total })
}

/// Recompute an order's total as the exact sum of line-item subtotals.
///
/// This is the only way a total is ever produced; creation and any later
/// item-set change both funnel through it.
pub fn order_total(items: &[PricedItem]) -> Result<Cents, OrderError> {
    let mut total = Cents::ZERO;
    for item in items {
        let subtotal = item.subtotal().ok_or(OrderError::TotalOverflow)?;
        total = total.checked_add(subtotal).ok_or(OrderError::TotalOverflow)?;
    }
    Ok(total)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
