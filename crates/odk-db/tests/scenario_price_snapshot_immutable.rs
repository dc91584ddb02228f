//! Line items snapshot their price at creation; later catalog edits must
//! never alter historical orders.
//!
//! DB-backed test. Skips if ODK_DATABASE_URL is not set.

use odk_orders::{Cents, DraftItem};
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = match std::env::var(odk_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: ODK_DATABASE_URL not set");
            return None;
        }
    };
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect");
    odk_db::migrate(&pool).await.expect("migrate");
    Some(pool)
}

#[tokio::test]
async fn catalog_price_change_does_not_touch_existing_orders() -> anyhow::Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };

    let restaurant_id = odk_db::accounts::register_user(
        &pool,
        &odk_db::accounts::NewUser {
            email: format!("resto-{}@example.com", Uuid::new_v4().simple()),
            password: "hunter22hunter22".to_string(),
            role: odk_db::UserRole::Restaurant,
        },
    )
    .await?
    .profile_id;

    let customer_id = odk_db::accounts::register_user(
        &pool,
        &odk_db::accounts::NewUser {
            email: format!("diner-{}@example.com", Uuid::new_v4().simple()),
            password: "hunter22hunter22".to_string(),
            role: odk_db::UserRole::Customer,
        },
    )
    .await?
    .profile_id;

    let menu_item_id = odk_db::menu::insert_menu_item(
        &pool,
        restaurant_id,
        &odk_db::menu::NewMenuItem {
            name: format!("item-{}", Uuid::new_v4().simple()),
            description: String::new(),
            price: "4.25".parse().unwrap(),
            category_id: None,
            is_vegetarian: false,
            is_vegan: false,
            is_gluten_free: false,
            is_available: true,
            preparation_minutes: 10,
        },
    )
    .await?
    .menu_item_id;

    let created = odk_db::orders::create_order(
        &pool,
        customer_id,
        &odk_db::orders::NewOrder {
            restaurant_id,
            delivery_address: String::new(),
            special_instructions: String::new(),
            items: vec![DraftItem {
                menu_item_id,
                quantity: 3,
                special_instructions: String::new(),
            }],
        },
    )
    .await?;
    let order_id = created.order.order_id;
    assert_eq!(created.order.total, Cents::new(1275)); // 3 × 4.25

    // Double the catalog price.
    odk_db::menu::update_menu_item(
        &pool,
        menu_item_id,
        &odk_db::menu::MenuItemUpdate {
            price: Some("8.50".parse().unwrap()),
            ..Default::default()
        },
    )
    .await?;

    // The stored order is untouched: snapshot price and total both hold.
    let after = odk_db::orders::fetch_order_with_items(&pool, order_id).await?;
    assert_eq!(after.items[0].unit_price, Cents::new(425));
    assert_eq!(after.order.total, Cents::new(1275));

    // Even an explicit recompute uses the snapshots, not the catalog.
    let mut conn = pool.acquire().await?;
    let recomputed = odk_db::orders::recompute_order_total(&mut conn, order_id).await?;
    assert_eq!(recomputed, Cents::new(1275));

    // New orders, of course, price at the new catalog value.
    let fresh = odk_db::orders::create_order(
        &pool,
        customer_id,
        &odk_db::orders::NewOrder {
            restaurant_id,
            delivery_address: String::new(),
            special_instructions: String::new(),
            items: vec![DraftItem {
                menu_item_id,
                quantity: 1,
                special_instructions: String::new(),
            }],
        },
    )
    .await?;
    assert_eq!(fresh.order.total, Cents::new(850));

    Ok(())
}

#[tokio::test]
async fn menu_item_referenced_by_orders_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };

    let restaurant_id = odk_db::accounts::register_user(
        &pool,
        &odk_db::accounts::NewUser {
            email: format!("resto-{}@example.com", Uuid::new_v4().simple()),
            password: "hunter22hunter22".to_string(),
            role: odk_db::UserRole::Restaurant,
        },
    )
    .await?
    .profile_id;

    let customer_id = odk_db::accounts::register_user(
        &pool,
        &odk_db::accounts::NewUser {
            email: format!("diner-{}@example.com", Uuid::new_v4().simple()),
            password: "hunter22hunter22".to_string(),
            role: odk_db::UserRole::Customer,
        },
    )
    .await?
    .profile_id;

    let menu_item_id = odk_db::menu::insert_menu_item(
        &pool,
        restaurant_id,
        &odk_db::menu::NewMenuItem {
            name: format!("item-{}", Uuid::new_v4().simple()),
            description: String::new(),
            price: "2.00".parse().unwrap(),
            category_id: None,
            is_vegetarian: false,
            is_vegan: false,
            is_gluten_free: false,
            is_available: true,
            preparation_minutes: 5,
        },
    )
    .await?
    .menu_item_id;

    odk_db::orders::create_order(
        &pool,
        customer_id,
        &odk_db::orders::NewOrder {
            restaurant_id,
            delivery_address: String::new(),
            special_instructions: String::new(),
            items: vec![DraftItem {
                menu_item_id,
                quantity: 1,
                special_instructions: String::new(),
            }],
        },
    )
    .await?;

    let res = odk_db::menu::delete_menu_item(&pool, menu_item_id).await;
    assert!(
        matches!(res, Err(odk_db::StoreError::Invalid(_))),
        "delete of a referenced item must be refused"
    );

    Ok(())
}
