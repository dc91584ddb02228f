//! Menu catalog: categories and items.
//!
//! Catalog rows are the live source of truth for pricing *new* orders only.
//! Historical orders keep their snapshot prices, which is why deleting an
//! item referenced by order history is refused rather than cascaded.

use chrono::{DateTime, Utc};
use odk_orders::Cents;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{is_constraint_violation, StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub category_id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn category_from_row(row: &PgRow) -> Result<CategoryRow, sqlx::Error> {
    Ok(CategoryRow {
        category_id: row.try_get("category_id")?,
        restaurant_id: row.try_get("restaurant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn insert_category(
    pool: &PgPool,
    restaurant_id: Uuid,
    new: &NewCategory,
) -> StoreResult<CategoryRow> {
    if new.name.trim().is_empty() {
        return Err(StoreError::Invalid("category name must not be empty".to_string()));
    }

    let row = sqlx::query(
        r#"
        insert into menu_categories (category_id, restaurant_id, name, description, is_active)
        values ($1, $2, $3, $4, $5)
        returning category_id, restaurant_id, name, description, is_active,
                  created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(restaurant_id)
    .bind(new.name.trim())
    .bind(&new.description)
    .bind(new.is_active)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_constraint_violation(&e, "uq_menu_categories_restaurant_name") {
            StoreError::Conflict("a category with this name already exists")
        } else {
            e.into()
        }
    })?;

    Ok(category_from_row(&row)?)
}

pub async fn list_categories(pool: &PgPool, restaurant_id: Uuid) -> StoreResult<Vec<CategoryRow>> {
    let rows = sqlx::query(
        r#"
        select category_id, restaurant_id, name, description, is_active,
               created_at, updated_at
        from menu_categories
        where restaurant_id = $1
        order by name
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(|r| Ok(category_from_row(r)?)).collect()
}

// ---------------------------------------------------------------------------
// Menu items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: Cents,
    pub category_id: Option<Uuid>,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_available: bool,
    pub preparation_minutes: i32,
}

#[derive(Debug, Clone)]
pub struct MenuItemRow {
    pub menu_item_id: Uuid,
    pub restaurant_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub price: Cents,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_available: bool,
    pub preparation_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const MENU_ITEM_COLUMNS: &str = r#"
    menu_item_id, restaurant_id, category_id, name, description, price_cents,
    is_vegetarian, is_vegan, is_gluten_free, is_available, preparation_minutes,
    created_at, updated_at
"#;

fn menu_item_from_row(row: &PgRow) -> Result<MenuItemRow, sqlx::Error> {
    Ok(MenuItemRow {
        menu_item_id: row.try_get("menu_item_id")?,
        restaurant_id: row.try_get("restaurant_id")?,
        category_id: row.try_get("category_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Cents::new(row.try_get::<i64, _>("price_cents")?),
        is_vegetarian: row.try_get("is_vegetarian")?,
        is_vegan: row.try_get("is_vegan")?,
        is_gluten_free: row.try_get("is_gluten_free")?,
        is_available: row.try_get("is_available")?,
        preparation_minutes: row.try_get("preparation_minutes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn validate_item_fields(name: &str, price: Cents, preparation_minutes: i32) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Invalid("item name must not be empty".to_string()));
    }
    if !price.is_non_negative() {
        return Err(StoreError::Invalid("price must not be negative".to_string()));
    }
    if preparation_minutes <= 0 {
        return Err(StoreError::Invalid(
            "preparation_minutes must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

pub async fn insert_menu_item(
    pool: &PgPool,
    restaurant_id: Uuid,
    new: &NewMenuItem,
) -> StoreResult<MenuItemRow> {
    validate_item_fields(&new.name, new.price, new.preparation_minutes)?;

    // A category, if given, must belong to the same restaurant.
    if let Some(category_id) = new.category_id {
        let owned: Option<(Uuid,)> = sqlx::query_as(
            "select category_id from menu_categories where category_id = $1 and restaurant_id = $2",
        )
        .bind(category_id)
        .bind(restaurant_id)
        .fetch_optional(pool)
        .await?;
        if owned.is_none() {
            return Err(StoreError::Invalid(
                "category does not belong to your restaurant".to_string(),
            ));
        }
    }

    let sql = format!(
        r#"
        insert into menu_items (
          menu_item_id, restaurant_id, category_id, name, description, price_cents,
          is_vegetarian, is_vegan, is_gluten_free, is_available, preparation_minutes
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        returning {MENU_ITEM_COLUMNS}
        "#
    );

    let row = sqlx::query(&sql)
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(new.category_id)
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.price.raw())
        .bind(new.is_vegetarian)
        .bind(new.is_vegan)
        .bind(new.is_gluten_free)
        .bind(new.is_available)
        .bind(new.preparation_minutes)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_constraint_violation(&e, "uq_menu_items_restaurant_name") {
                StoreError::Conflict("an item with this name already exists")
            } else {
                e.into()
            }
        })?;

    Ok(menu_item_from_row(&row)?)
}

pub async fn fetch_menu_item(pool: &PgPool, menu_item_id: Uuid) -> StoreResult<MenuItemRow> {
    let sql = format!("select {MENU_ITEM_COLUMNS} from menu_items where menu_item_id = $1");
    let row = sqlx::query(&sql)
        .bind(menu_item_id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound { what: "menu item" })?;
    Ok(menu_item_from_row(&row)?)
}

/// Fields to change; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Cents>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_gluten_free: Option<bool>,
    pub is_available: Option<bool>,
    pub preparation_minutes: Option<i32>,
}

/// Apply a partial update.
///
/// Catalog price changes deliberately touch only this row: line items on
/// existing orders keep their snapshot price and totals are never revisited.
pub async fn update_menu_item(
    pool: &PgPool,
    menu_item_id: Uuid,
    upd: &MenuItemUpdate,
) -> StoreResult<MenuItemRow> {
    if let Some(name) = &upd.name {
        if name.trim().is_empty() {
            return Err(StoreError::Invalid("item name must not be empty".to_string()));
        }
    }
    if let Some(price) = upd.price {
        if !price.is_non_negative() {
            return Err(StoreError::Invalid("price must not be negative".to_string()));
        }
    }
    if let Some(mins) = upd.preparation_minutes {
        if mins <= 0 {
            return Err(StoreError::Invalid(
                "preparation_minutes must be a positive integer".to_string(),
            ));
        }
    }

    let sql = format!(
        r#"
        update menu_items
        set name = coalesce($2, name),
            description = coalesce($3, description),
            price_cents = coalesce($4, price_cents),
            is_vegetarian = coalesce($5, is_vegetarian),
            is_vegan = coalesce($6, is_vegan),
            is_gluten_free = coalesce($7, is_gluten_free),
            is_available = coalesce($8, is_available),
            preparation_minutes = coalesce($9, preparation_minutes),
            updated_at = now()
        where menu_item_id = $1
        returning {MENU_ITEM_COLUMNS}
        "#
    );

    let row = sqlx::query(&sql)
        .bind(menu_item_id)
        .bind(upd.name.as_deref().map(str::trim))
        .bind(&upd.description)
        .bind(upd.price.map(Cents::raw))
        .bind(upd.is_vegetarian)
        .bind(upd.is_vegan)
        .bind(upd.is_gluten_free)
        .bind(upd.is_available)
        .bind(upd.preparation_minutes)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            if is_constraint_violation(&e, "uq_menu_items_restaurant_name") {
                StoreError::Conflict("an item with this name already exists")
            } else {
                StoreError::from(e)
            }
        })?
        .ok_or(StoreError::NotFound { what: "menu item" })?;

    Ok(menu_item_from_row(&row)?)
}

/// Delete a catalog entry.
///
/// Refused when any order item references it — historical orders must keep
/// resolvable provenance for their price snapshots.
pub async fn delete_menu_item(pool: &PgPool, menu_item_id: Uuid) -> StoreResult<()> {
    let res = sqlx::query("delete from menu_items where menu_item_id = $1")
        .bind(menu_item_id)
        .execute(pool)
        .await
        .map_err(|e| {
            if is_constraint_violation(&e, "order_items_menu_item_id_fkey") {
                StoreError::Invalid(
                    "menu item is referenced by existing orders and cannot be deleted".to_string(),
                )
            } else {
                StoreError::from(e)
            }
        })?;

    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound { what: "menu item" });
    }
    Ok(())
}

pub async fn list_menu_for_restaurant(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> StoreResult<Vec<MenuItemRow>> {
    let sql = format!(
        "select {MENU_ITEM_COLUMNS} from menu_items where restaurant_id = $1 order by name"
    );
    let rows = sqlx::query(&sql).bind(restaurant_id).fetch_all(pool).await?;
    rows.iter().map(|r| Ok(menu_item_from_row(r)?)).collect()
}
