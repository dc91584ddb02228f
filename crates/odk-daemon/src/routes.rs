//! Axum router and all HTTP handlers for odk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use odk_db::accounts::{
    self, AuthedUser, CustomerProfileUpdate, NewUser, RestaurantProfileUpdate,
};
use odk_db::menu::{self, MenuItemUpdate, NewCategory, NewMenuItem};
use odk_db::orders::{self, NewOrder, OrderRow};
use odk_orders::{Cents, DraftItem};

use crate::api_types::*;
use crate::auth::{require_customer, require_restaurant, require_user};
use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/whoami", get(whoami))
        .route(
            "/v1/profiles/restaurant",
            get(restaurant_profile_get).put(restaurant_profile_put),
        )
        .route(
            "/v1/profiles/customer",
            get(customer_profile_get).put(customer_profile_put),
        )
        .route("/v1/menu/categories", post(category_create).get(category_list))
        .route("/v1/menu/items", post(menu_item_create))
        .route(
            "/v1/menu/items/:menu_item_id",
            get(menu_item_get).put(menu_item_update).delete(menu_item_delete),
        )
        .route("/v1/restaurants/:restaurant_id/menu", get(restaurant_menu_list))
        .route("/v1/orders", post(order_create).get(order_list))
        .route("/v1/orders/:order_id", get(order_get))
        .route("/v1/orders/:order_id/items", get(order_items_get))
        .route("/v1/orders/:order_id/status", post(order_status_update))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/auth/register
// ---------------------------------------------------------------------------

/// Create a user and its typed profile in one transaction.
pub(crate) async fn register(
    State(st): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registered = accounts::register_user(
        &st.db,
        &NewUser { email: req.email, password: req.password, role: req.role },
    )
    .await?;

    info!(user_id = %registered.user_id, role = %registered.role, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: registered.user_id,
            email: registered.email,
            role: registered.role,
            profile_id: registered.profile_id,
        }),
    ))
}

// ---------------------------------------------------------------------------
// POST /v1/auth/login
// ---------------------------------------------------------------------------

pub(crate) async fn login(
    State(st): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = accounts::login(
        &st.db,
        &req.email,
        &req.password,
        st.config.session_ttl_minutes,
    )
    .await?;

    info!(user_id = %session.user_id, "session issued");

    Ok(Json(LoginResponse {
        token: session.token,
        role: session.role,
        expires_at: session.expires_at,
    }))
}

// ---------------------------------------------------------------------------
// GET /v1/auth/whoami
// ---------------------------------------------------------------------------

pub(crate) async fn whoami(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    Ok(Json(WhoamiResponse { email: user.email, role: user.role }))
}

// ---------------------------------------------------------------------------
// /v1/profiles/restaurant
// ---------------------------------------------------------------------------

pub(crate) async fn restaurant_profile_get(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let restaurant_id = require_restaurant(&user)?;
    let profile = accounts::fetch_restaurant_profile(&st.db, restaurant_id).await?;
    Ok(Json(RestaurantProfileResponse::from(profile)))
}

pub(crate) async fn restaurant_profile_put(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<UpdateRestaurantProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let restaurant_id = require_restaurant(&user)?;
    let profile = accounts::update_restaurant_profile(
        &st.db,
        restaurant_id,
        &RestaurantProfileUpdate {
            name: req.name,
            location: req.location,
            phone_number: req.phone_number,
        },
    )
    .await?;
    Ok(Json(RestaurantProfileResponse::from(profile)))
}

// ---------------------------------------------------------------------------
// /v1/profiles/customer
// ---------------------------------------------------------------------------

pub(crate) async fn customer_profile_get(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let customer_id = require_customer(&user)?;
    let profile = accounts::fetch_customer_profile(&st.db, customer_id).await?;
    Ok(Json(CustomerProfileResponse::from(profile)))
}

pub(crate) async fn customer_profile_put(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<UpdateCustomerProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let customer_id = require_customer(&user)?;
    let profile = accounts::update_customer_profile(
        &st.db,
        customer_id,
        &CustomerProfileUpdate { phone_number: req.phone_number, address: req.address },
    )
    .await?;
    Ok(Json(CustomerProfileResponse::from(profile)))
}

// ---------------------------------------------------------------------------
// /v1/menu/categories
// ---------------------------------------------------------------------------

pub(crate) async fn category_create(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let restaurant_id = require_restaurant(&user)?;
    let row = menu::insert_category(
        &st.db,
        restaurant_id,
        &NewCategory {
            name: req.name,
            description: req.description,
            is_active: req.is_active,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(row))))
}

pub(crate) async fn category_list(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let restaurant_id = require_restaurant(&user)?;
    let rows = menu::list_categories(&st.db, restaurant_id).await?;
    Ok(Json(
        rows.into_iter().map(CategoryResponse::from).collect::<Vec<_>>(),
    ))
}

// ---------------------------------------------------------------------------
// /v1/menu/items
// ---------------------------------------------------------------------------

fn parse_price(s: &str) -> Result<Cents, ApiError> {
    let price: Cents = s.parse().map_err(|e: odk_orders::ParseMoneyError| {
        ApiError::BadRequest(e.to_string())
    })?;
    if !price.is_non_negative() {
        return Err(ApiError::BadRequest("price must not be negative".to_string()));
    }
    Ok(price)
}

pub(crate) async fn menu_item_create(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateMenuItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let restaurant_id = require_restaurant(&user)?;

    let row = menu::insert_menu_item(
        &st.db,
        restaurant_id,
        &NewMenuItem {
            name: req.name,
            description: req.description,
            price: parse_price(&req.price)?,
            category_id: req.category_id,
            is_vegetarian: req.is_vegetarian,
            is_vegan: req.is_vegan,
            is_gluten_free: req.is_gluten_free,
            is_available: req.is_available,
            preparation_minutes: req.preparation_minutes,
        },
    )
    .await?;

    info!(menu_item_id = %row.menu_item_id, restaurant_id = %restaurant_id, "menu item created");
    Ok((StatusCode::CREATED, Json(MenuItemResponse::from(row))))
}

pub(crate) async fn menu_item_get(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(menu_item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let _user = require_user(&st, &headers).await?;
    let row = menu::fetch_menu_item(&st.db, menu_item_id).await?;
    Ok(Json(MenuItemResponse::from(row)))
}

/// Only the owning restaurant may mutate a catalog entry.
async fn owned_menu_item(
    st: &AppState,
    user: &AuthedUser,
    menu_item_id: Uuid,
) -> Result<(), ApiError> {
    let restaurant_id = require_restaurant(user)?;
    let row = menu::fetch_menu_item(&st.db, menu_item_id).await?;
    if row.restaurant_id != restaurant_id {
        return Err(ApiError::Forbidden("this menu item belongs to another restaurant"));
    }
    Ok(())
}

pub(crate) async fn menu_item_update(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(menu_item_id): Path<Uuid>,
    Json(req): Json<UpdateMenuItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    owned_menu_item(&st, &user, menu_item_id).await?;

    let price = match &req.price {
        Some(s) => Some(parse_price(s)?),
        None => None,
    };

    let row = menu::update_menu_item(
        &st.db,
        menu_item_id,
        &MenuItemUpdate {
            name: req.name,
            description: req.description,
            price,
            is_vegetarian: req.is_vegetarian,
            is_vegan: req.is_vegan,
            is_gluten_free: req.is_gluten_free,
            is_available: req.is_available,
            preparation_minutes: req.preparation_minutes,
        },
    )
    .await?;

    Ok(Json(MenuItemResponse::from(row)))
}

pub(crate) async fn menu_item_delete(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(menu_item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    owned_menu_item(&st, &user, menu_item_id).await?;
    menu::delete_menu_item(&st.db, menu_item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /v1/restaurants/:restaurant_id/menu
// ---------------------------------------------------------------------------

pub(crate) async fn restaurant_menu_list(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(restaurant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let _user = require_user(&st, &headers).await?;
    let rows = menu::list_menu_for_restaurant(&st.db, restaurant_id).await?;
    Ok(Json(
        rows.into_iter().map(MenuItemResponse::from).collect::<Vec<_>>(),
    ))
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

pub(crate) async fn order_create(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let customer_id = require_customer(&user)?;

    let items = req
        .items
        .into_iter()
        .map(|i| DraftItem {
            menu_item_id: i.menu_item_id,
            quantity: i.quantity,
            special_instructions: i.special_instructions,
        })
        .collect();

    let created = orders::create_order(
        &st.db,
        customer_id,
        &NewOrder {
            restaurant_id: req.restaurant_id,
            delivery_address: req.delivery_address,
            special_instructions: req.special_instructions,
            items,
        },
    )
    .await?;

    info!(
        order_id = %created.order.order_id,
        restaurant_id = %created.order.restaurant_id,
        total = %created.order.total,
        "order created"
    );

    Ok((StatusCode::CREATED, Json(OrderResponse::from(created))))
}

// ---------------------------------------------------------------------------
// GET /v1/orders
// ---------------------------------------------------------------------------

/// Customers see the orders they placed; restaurants see the orders they
/// received.
pub(crate) async fn order_list(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;

    let rows = match (user.customer_id, user.restaurant_id) {
        (Some(customer_id), _) => orders::list_orders_for_customer(&st.db, customer_id).await?,
        (_, Some(restaurant_id)) => {
            orders::list_orders_for_restaurant(&st.db, restaurant_id).await?
        }
        (None, None) => Vec::new(),
    };

    Ok(Json(
        rows.into_iter().map(OrderSummaryResponse::from).collect::<Vec<_>>(),
    ))
}

// ---------------------------------------------------------------------------
// GET /v1/orders/:order_id
// ---------------------------------------------------------------------------

/// Only the customer who placed the order or the restaurant that received
/// it may see or mutate it.
fn check_order_access(user: &AuthedUser, order: &OrderRow) -> Result<(), ApiError> {
    let is_customer = user.customer_id == Some(order.customer_id);
    let is_restaurant = user.restaurant_id == Some(order.restaurant_id);
    if is_customer || is_restaurant {
        Ok(())
    } else {
        Err(ApiError::Forbidden("you are not a party to this order"))
    }
}

pub(crate) async fn order_get(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let full = orders::fetch_order_with_items(&st.db, order_id).await?;
    check_order_access(&user, &full.order)?;
    Ok(Json(OrderResponse::from(full)))
}

// ---------------------------------------------------------------------------
// GET /v1/orders/:order_id/items
// ---------------------------------------------------------------------------

pub(crate) async fn order_items_get(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let order = orders::fetch_order(&st.db, order_id).await?;
    check_order_access(&user, &order)?;
    let items = orders::fetch_order_items(&st.db, order_id).await?;
    Ok(Json(
        items.into_iter().map(OrderItemResponse::from).collect::<Vec<_>>(),
    ))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:order_id/status
// ---------------------------------------------------------------------------

pub(crate) async fn order_status_update(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&st, &headers).await?;
    let order = orders::fetch_order(&st.db, order_id).await?;
    check_order_access(&user, &order)?;

    let updated = orders::update_order_status(&st.db, order_id, req.status).await?;

    info!(order_id = %order_id, status = %updated.status, "order status updated");

    let items = orders::fetch_order_items(&st.db, order_id).await?;
    Ok(Json(OrderResponse::from(odk_db::orders::OrderWithItems {
        order: updated,
        items,
    })))
}
