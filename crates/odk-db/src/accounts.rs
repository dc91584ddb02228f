//! Users, sessions and profiles.
//!
//! Registration creates the user row and exactly one typed profile row in a
//! single transaction — there is no reactive "ensure a profile exists"
//! machinery anywhere else. Login issues an opaque session token; the
//! daemon resolves it once per request via [`authenticate`].

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{is_constraint_violation, StoreError, StoreResult, UserRole};

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

/// Salted SHA-256 digest, hex encoded.
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    /// The restaurant_id or customer_id created alongside the user.
    pub profile_id: Uuid,
}

/// Create a user and its typed profile atomically.
///
/// # Errors
/// - `Invalid` for a malformed email or a password under 8 characters.
/// - `Conflict` when the email is already registered.
pub async fn register_user(pool: &PgPool, new: &NewUser) -> StoreResult<RegisteredUser> {
    let email = new.email.trim().to_lowercase();
    if email.len() < 3 || !email.contains('@') {
        return Err(StoreError::Invalid("invalid email address".to_string()));
    }
    if new.password.len() < 8 {
        return Err(StoreError::Invalid(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let user_id = Uuid::new_v4();
    let profile_id = Uuid::new_v4();
    let salt = new_salt();
    let password_hash = hash_password(&salt, &new.password);

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        insert into users (user_id, email, password_hash, password_salt, role)
        values ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(&salt)
    .bind(new.role.as_str())
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
        if is_constraint_violation(&e, "uq_users_email") {
            return Err(StoreError::Conflict("email already registered"));
        }
        return Err(e.into());
    }

    // The typed profile is an explicit step of registration, inside the same
    // transaction as the user row.
    match new.role {
        UserRole::Restaurant => {
            sqlx::query(
                "insert into restaurants (restaurant_id, user_id) values ($1, $2)",
            )
            .bind(profile_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }
        UserRole::Customer => {
            sqlx::query("insert into customers (customer_id, user_id) values ($1, $2)")
                .bind(profile_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    Ok(RegisteredUser { user_id, email, role: new.role, profile_id })
}

// ---------------------------------------------------------------------------
// Login / sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

/// Verify credentials and issue a session token.
///
/// The same `BadCredentials` error covers an unknown email and a wrong
/// password, so the endpoint does not leak which addresses are registered.
pub async fn login(
    pool: &PgPool,
    email: &str,
    password: &str,
    ttl_minutes: i64,
) -> StoreResult<Session> {
    let email = email.trim().to_lowercase();

    let row = sqlx::query(
        "select user_id, password_hash, password_salt, role from users where email = $1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::BadCredentials)?;

    let user_id: Uuid = row.try_get("user_id")?;
    let stored_hash: String = row.try_get("password_hash")?;
    let salt: String = row.try_get("password_salt")?;
    let role = UserRole::parse(&row.try_get::<String, _>("role")?)?;

    if hash_password(&salt, password) != stored_hash {
        return Err(StoreError::BadCredentials);
    }

    let token = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);

    sqlx::query("insert into sessions (token, user_id, expires_at) values ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(Session { token, user_id, role, expires_at })
}

/// The identity a bearer token resolves to.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    /// Set iff `role == Restaurant`.
    pub restaurant_id: Option<Uuid>,
    /// Set iff `role == Customer`.
    pub customer_id: Option<Uuid>,
}

/// Resolve a bearer token to its user, or `None` for unknown/expired tokens.
pub async fn authenticate(pool: &PgPool, token: Uuid) -> StoreResult<Option<AuthedUser>> {
    let row = sqlx::query(
        r#"
        select u.user_id, u.email, u.role, r.restaurant_id, c.customer_id
        from sessions s
        join users u on u.user_id = s.user_id
        left join restaurants r on r.user_id = u.user_id
        left join customers c on c.user_id = u.user_id
        where s.token = $1 and s.expires_at > now()
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(AuthedUser {
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        role: UserRole::parse(&row.try_get::<String, _>("role")?)?,
        restaurant_id: row.try_get("restaurant_id")?,
        customer_id: row.try_get("customer_id")?,
    }))
}

// ---------------------------------------------------------------------------
// Restaurant profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RestaurantProfile {
    pub restaurant_id: Uuid,
    pub email: String,
    pub name: String,
    pub location: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct RestaurantProfileUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn fetch_restaurant_profile(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> StoreResult<RestaurantProfile> {
    let row = sqlx::query(
        r#"
        select r.restaurant_id, u.email, r.name, r.location, r.phone_number,
               r.created_at, r.updated_at
        from restaurants r
        join users u on u.user_id = r.user_id
        where r.restaurant_id = $1
        "#,
    )
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound { what: "restaurant profile" })?;

    Ok(RestaurantProfile {
        restaurant_id: row.try_get("restaurant_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        location: row.try_get("location")?,
        phone_number: row.try_get("phone_number")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Apply the non-`None` fields and return the fresh profile.
pub async fn update_restaurant_profile(
    pool: &PgPool,
    restaurant_id: Uuid,
    upd: &RestaurantProfileUpdate,
) -> StoreResult<RestaurantProfile> {
    let res = sqlx::query(
        r#"
        update restaurants
        set name = coalesce($2, name),
            location = coalesce($3, location),
            phone_number = coalesce($4, phone_number),
            updated_at = now()
        where restaurant_id = $1
        "#,
    )
    .bind(restaurant_id)
    .bind(&upd.name)
    .bind(&upd.location)
    .bind(&upd.phone_number)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound { what: "restaurant profile" });
    }
    fetch_restaurant_profile(pool, restaurant_id).await
}

// ---------------------------------------------------------------------------
// Customer profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub customer_id: Uuid,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerProfileUpdate {
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

pub async fn fetch_customer_profile(
    pool: &PgPool,
    customer_id: Uuid,
) -> StoreResult<CustomerProfile> {
    let row = sqlx::query(
        r#"
        select c.customer_id, u.email, c.phone_number, c.address,
               c.created_at, c.updated_at
        from customers c
        join users u on u.user_id = c.user_id
        where c.customer_id = $1
        "#,
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound { what: "customer profile" })?;

    Ok(CustomerProfile {
        customer_id: row.try_get("customer_id")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        address: row.try_get("address")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn update_customer_profile(
    pool: &PgPool,
    customer_id: Uuid,
    upd: &CustomerProfileUpdate,
) -> StoreResult<CustomerProfile> {
    let res = sqlx::query(
        r#"
        update customers
        set phone_number = coalesce($2, phone_number),
            address = coalesce($3, address),
            updated_at = now()
        where customer_id = $1
        "#,
    )
    .bind(customer_id)
    .bind(&upd.phone_number)
    .bind(&upd.address)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound { what: "customer profile" });
    }
    fetch_customer_profile(pool, customer_id).await
}

// ---------------------------------------------------------------------------
// Unit tests (pure parts only; store behavior is covered in tests/)
// ---------------------------------------------------------------------------
