//! The order aggregate: creation, projection, status transitions.
//!
//! # Invariant
//!
//! `orders.total_cents == sum(order_items.price_cents * quantity)` after
//! every committed mutation. Both mutations that can disturb it (creation
//! and any future item-set change) funnel through
//! [`recompute_order_total`], which recomputes the sum with checked integer
//! arithmetic and persists it inside the caller's transaction.
//!
//! # Concurrency
//!
//! Status updates are a read-validate-write sequence wrapped in one
//! transaction with `SELECT ... FOR UPDATE`, so two concurrent updates on
//! the same order serialize at the row lock and cannot both commit
//! conflicting results. Order creation takes `FOR SHARE` locks on the
//! referenced catalog rows so availability and price stay put between
//! validation and insert.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use odk_orders::{
    order_total, price_order, validate_transition, CatalogItem, Cents, DraftItem, OrderStatus,
    PricedItem,
};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::{OrderError, StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub special_instructions: String,
    pub total: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderItemRow {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    /// Current catalog name of the referenced item (joined, not snapshot).
    pub menu_item_name: String,
    pub quantity: i32,
    /// Unit price snapshot taken at order creation.
    pub unit_price: Cents,
    pub special_instructions: String,
}

impl OrderItemRow {
    pub fn subtotal(&self) -> Cents {
        // Persisted rows passed creation-time checked arithmetic; the raw
        // multiply here cannot overflow for values the store accepted.
        Cents::new(self.unit_price.raw() * i64::from(self.quantity))
    }
}

/// Full order projection returned to the API layer.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub restaurant_id: Uuid,
    pub delivery_address: String,
    pub special_instructions: String,
    pub items: Vec<DraftItem>,
}

const ORDER_COLUMNS: &str = r#"
    order_id, customer_id, restaurant_id, status, delivery_address,
    special_instructions, total_cents, created_at, updated_at
"#;

fn order_from_row(row: &PgRow) -> StoreResult<OrderRow> {
    Ok(OrderRow {
        order_id: row.try_get("order_id")?,
        customer_id: row.try_get("customer_id")?,
        restaurant_id: row.try_get("restaurant_id")?,
        status: OrderStatus::parse(&row.try_get::<String, _>("status")?)?,
        delivery_address: row.try_get("delivery_address")?,
        special_instructions: row.try_get("special_instructions")?,
        total: Cents::new(row.try_get::<i64, _>("total_cents")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_item_from_row(row: &PgRow) -> Result<OrderItemRow, sqlx::Error> {
    Ok(OrderItemRow {
        order_item_id: row.try_get("order_item_id")?,
        order_id: row.try_get("order_id")?,
        menu_item_id: row.try_get("menu_item_id")?,
        menu_item_name: row.try_get("menu_item_name")?,
        quantity: row.try_get("quantity")?,
        unit_price: Cents::new(row.try_get::<i64, _>("price_cents")?),
        special_instructions: row.try_get("special_instructions")?,
    })
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Create an order with its line items in one transaction.
///
/// Sequence: resolve the restaurant → lock and load the referenced catalog
/// rows (`FOR SHARE`) → validate and price every line → insert the order and
/// its items → recompute and persist the total. Any failure aborts the
/// whole transaction; there is no partial creation.
pub async fn create_order(
    pool: &PgPool,
    customer_id: Uuid,
    new: &NewOrder,
) -> StoreResult<OrderWithItems> {
    let mut tx = pool.begin().await?;

    let restaurant: Option<(Uuid,)> =
        sqlx::query_as("select restaurant_id from restaurants where restaurant_id = $1")
            .bind(new.restaurant_id)
            .fetch_optional(&mut *tx)
            .await?;
    if restaurant.is_none() {
        return Err(StoreError::Validation(OrderError::InvalidRestaurant));
    }

    // Lock the referenced catalog rows so price and availability cannot
    // change between validation and insert.
    let ids: Vec<Uuid> = new.items.iter().map(|i| i.menu_item_id).collect();
    let rows = sqlx::query(
        r#"
        select menu_item_id, restaurant_id, name, price_cents, is_available
        from menu_items
        where menu_item_id = any($1)
        for share
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *tx)
    .await?;

    let mut catalog: HashMap<Uuid, CatalogItem> = HashMap::with_capacity(rows.len());
    for row in &rows {
        let entry = CatalogItem {
            menu_item_id: row.try_get("menu_item_id")?,
            restaurant_id: row.try_get("restaurant_id")?,
            name: row.try_get("name")?,
            price: Cents::new(row.try_get::<i64, _>("price_cents")?),
            is_available: row.try_get("is_available")?,
        };
        catalog.insert(entry.menu_item_id, entry);
    }

    let priced = price_order(new.restaurant_id, &new.items, |id| catalog.get(&id).cloned())?;

    let order_id = Uuid::new_v4();
    sqlx::query(
        r#"
        insert into orders (order_id, customer_id, restaurant_id, delivery_address, special_instructions)
        values ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(order_id)
    .bind(customer_id)
    .bind(new.restaurant_id)
    .bind(&new.delivery_address)
    .bind(&new.special_instructions)
    .execute(&mut *tx)
    .await?;

    for item in &priced.items {
        sqlx::query(
            r#"
            insert into order_items (order_item_id, order_id, menu_item_id, quantity, price_cents, special_instructions)
            values ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(item.menu_item_id)
        .bind(item.quantity)
        .bind(item.unit_price.raw())
        .bind(&item.special_instructions)
        .execute(&mut *tx)
        .await?;
    }

    // The item set just changed; recompute the persisted total from it.
    let total = recompute_order_total(&mut tx, order_id).await?;
    debug_assert_eq!(total, priced.total);

    let order = fetch_order_on(&mut tx, order_id).await?;
    let items = fetch_order_items_on(&mut tx, order_id).await?;

    tx.commit().await?;

    Ok(OrderWithItems { order, items })
}

// ---------------------------------------------------------------------------
// Total recalculation
// ---------------------------------------------------------------------------

/// Recompute an order's total from its current item set and persist it.
///
/// Runs on the caller's connection so it joins whatever transaction the
/// item-set change happened in. Idempotent: integer cents, no rounding.
pub async fn recompute_order_total(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> StoreResult<Cents> {
    let rows = sqlx::query(
        r#"
        select menu_item_id, quantity, price_cents, special_instructions
        from order_items
        where order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(PricedItem {
            menu_item_id: row.try_get("menu_item_id")?,
            quantity: row.try_get("quantity")?,
            unit_price: Cents::new(row.try_get::<i64, _>("price_cents")?),
            special_instructions: row.try_get("special_instructions")?,
        });
    }

    let total = order_total(&items)?;

    let res = sqlx::query(
        "update orders set total_cents = $2, updated_at = now() where order_id = $1",
    )
    .bind(order_id)
    .bind(total.raw())
    .execute(&mut *conn)
    .await?;

    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound { what: "order" });
    }
    Ok(total)
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

async fn fetch_order_on(conn: &mut PgConnection, order_id: Uuid) -> StoreResult<OrderRow> {
    let sql = format!("select {ORDER_COLUMNS} from orders where order_id = $1");
    let row = sqlx::query(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound { what: "order" })?;
    order_from_row(&row)
}

async fn fetch_order_items_on(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> StoreResult<Vec<OrderItemRow>> {
    let rows = sqlx::query(
        r#"
        select oi.order_item_id, oi.order_id, oi.menu_item_id, mi.name as menu_item_name,
               oi.quantity, oi.price_cents, oi.special_instructions
        from order_items oi
        join menu_items mi on mi.menu_item_id = oi.menu_item_id
        where oi.order_id = $1
        order by oi.order_item_id
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(|r| Ok(order_item_from_row(r)?)).collect()
}

pub async fn fetch_order(pool: &PgPool, order_id: Uuid) -> StoreResult<OrderRow> {
    let mut conn = pool.acquire().await?;
    fetch_order_on(&mut conn, order_id).await
}

pub async fn fetch_order_items(pool: &PgPool, order_id: Uuid) -> StoreResult<Vec<OrderItemRow>> {
    let mut conn = pool.acquire().await?;
    fetch_order_items_on(&mut conn, order_id).await
}

/// Order plus items, for the read endpoint.
pub async fn fetch_order_with_items(pool: &PgPool, order_id: Uuid) -> StoreResult<OrderWithItems> {
    let mut conn = pool.acquire().await?;
    let order = fetch_order_on(&mut conn, order_id).await?;
    let items = fetch_order_items_on(&mut conn, order_id).await?;
    Ok(OrderWithItems { order, items })
}

pub async fn list_orders_for_customer(
    pool: &PgPool,
    customer_id: Uuid,
) -> StoreResult<Vec<OrderRow>> {
    let sql = format!(
        "select {ORDER_COLUMNS} from orders where customer_id = $1 order by created_at desc"
    );
    let rows = sqlx::query(&sql).bind(customer_id).fetch_all(pool).await?;
    rows.iter().map(order_from_row).collect()
}

pub async fn list_orders_for_restaurant(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> StoreResult<Vec<OrderRow>> {
    let sql = format!(
        "select {ORDER_COLUMNS} from orders where restaurant_id = $1 order by created_at desc"
    );
    let rows = sqlx::query(&sql).bind(restaurant_id).fetch_all(pool).await?;
    rows.iter().map(order_from_row).collect()
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Apply a validated status transition.
///
/// The read-validate-write sequence runs inside one transaction with the
/// order row locked, so a concurrent update waits and then re-validates
/// against the committed status rather than the stale one.
pub async fn update_order_status(
    pool: &PgPool,
    order_id: Uuid,
    requested: OrderStatus,
) -> StoreResult<OrderRow> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query("select status from orders where order_id = $1 for update")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound { what: "order" })?;

    let current = OrderStatus::parse(&row.try_get::<String, _>("status")?)?;
    validate_transition(current, requested).map_err(OrderError::from)?;

    let sql = format!(
        r#"
        update orders
        set status = $2, updated_at = now()
        where order_id = $1
        returning {ORDER_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(order_id)
        .bind(requested.as_str())
        .fetch_one(&mut *tx)
        .await?;
    let order = order_from_row(&row)?;

    tx.commit().await?;
    Ok(order)
}
