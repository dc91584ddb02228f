//! Request and response types for all odk-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded by
//! Axum and decoded by tests. Money crosses the wire as decimal strings
//! (`"13.50"`); no business logic lives here.

use chrono::{DateTime, Utc};
use odk_db::accounts::{CustomerProfile, RestaurantProfile};
use odk_db::menu::{CategoryRow, MenuItemRow};
use odk_db::orders::{OrderItemRow, OrderRow, OrderWithItems};
use odk_db::UserRole;
use odk_orders::OrderStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

// Serialize only: the &'static str fields cannot be deserialized, and no
// consumer needs to.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Uniform error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// "validation" | "unauthorized" | "forbidden" | "not_found" | "conflict" | "internal"
    pub kind: String,
}

// ---------------------------------------------------------------------------
// /v1/auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    /// The restaurant_id or customer_id created alongside the user.
    pub profile_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub email: String,
    pub role: UserRole,
}

// ---------------------------------------------------------------------------
// /v1/profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantProfileResponse {
    pub restaurant_id: Uuid,
    pub email: String,
    pub name: String,
    pub location: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RestaurantProfile> for RestaurantProfileResponse {
    fn from(p: RestaurantProfile) -> Self {
        Self {
            restaurant_id: p.restaurant_id,
            email: p.email,
            name: p.name,
            location: p.location,
            phone_number: p.phone_number,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRestaurantProfileRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfileResponse {
    pub customer_id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerProfile> for CustomerProfileResponse {
    fn from(p: CustomerProfile) -> Self {
        Self {
            customer_id: p.customer_id,
            email: p.email,
            phone_number: p.phone_number,
            address: p.address,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomerProfileRequest {
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

// ---------------------------------------------------------------------------
// /v1/menu
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_prep_minutes() -> i32 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub category_id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for CategoryResponse {
    fn from(c: CategoryRow) -> Self {
        Self {
            category_id: c.category_id,
            restaurant_id: c.restaurant_id,
            name: c.name,
            description: c.description,
            is_active: c.is_active,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMenuItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Decimal string, e.g. "5.00".
    pub price: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_gluten_free: bool,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default = "default_prep_minutes")]
    pub preparation_minutes: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Decimal string, e.g. "8.50".
    pub price: Option<String>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_gluten_free: Option<bool>,
    pub is_available: Option<bool>,
    pub preparation_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemResponse {
    pub menu_item_id: Uuid,
    pub restaurant_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    /// Decimal string, e.g. "5.00".
    pub price: String,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_available: bool,
    pub preparation_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItemResponse {
    fn from(m: MenuItemRow) -> Self {
        Self {
            menu_item_id: m.menu_item_id,
            restaurant_id: m.restaurant_id,
            category_id: m.category_id,
            name: m.name,
            description: m.description,
            price: m.price.to_string(),
            is_vegetarian: m.is_vegetarian,
            is_vegan: m.is_vegan,
            is_gluten_free: m.is_gluten_free,
            is_available: m.is_available,
            preparation_minutes: m.preparation_minutes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// /v1/orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderItemRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: Uuid,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub special_instructions: String,
    pub items: Vec<CreateOrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub order_item_id: Uuid,
    pub menu_item_id: Uuid,
    pub menu_item_name: String,
    pub quantity: i32,
    /// Snapshot unit price, decimal string.
    pub price: String,
    /// `price × quantity`, decimal string.
    pub subtotal: String,
    pub special_instructions: String,
}

impl From<OrderItemRow> for OrderItemResponse {
    fn from(i: OrderItemRow) -> Self {
        let subtotal = i.subtotal();
        Self {
            order_item_id: i.order_item_id,
            menu_item_id: i.menu_item_id,
            menu_item_name: i.menu_item_name,
            quantity: i.quantity,
            price: i.unit_price.to_string(),
            subtotal: subtotal.to_string(),
            special_instructions: i.special_instructions,
        }
    }
}

/// Order summary without line items, used by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummaryResponse {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderSummaryResponse {
    fn from(o: OrderRow) -> Self {
        Self {
            order_id: o.order_id,
            customer_id: o.customer_id,
            restaurant_id: o.restaurant_id,
            status: o.status,
            total_amount: o.total.to_string(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// Full order projection including line items and the computed total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub special_instructions: String,
    pub total_amount: String,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderWithItems> for OrderResponse {
    fn from(full: OrderWithItems) -> Self {
        let o = full.order;
        Self {
            order_id: o.order_id,
            customer_id: o.customer_id,
            restaurant_id: o.restaurant_id,
            status: o.status,
            delivery_address: o.delivery_address,
            special_instructions: o.special_instructions,
            total_amount: o.total.to_string(),
            items: full.items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}
