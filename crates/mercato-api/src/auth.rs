use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use uuid::Uuid;

use mercato_db::Database;
use mercato_db::models::{NewUser, NewVendor, UserRow};
use mercato_types::api::{Claims, LoginRequest, RegisterRequest, UserResponse};
use mercato_types::models::Role;

use crate::error::{ApiError, ApiResult};
use crate::util::{parse_utc, parse_uuid};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.email.is_empty() || !req.email.contains('@') {
        return Err(ApiError::validation("A valid email address is required"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::validation("Email already registered"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();

    let user_id = Uuid::new_v4();
    let user_id_str = user_id.to_string();
    let vendor_id = Uuid::new_v4().to_string();
    let new_user = NewUser {
        id: &user_id_str,
        email: &req.email,
        password_hash: &password_hash,
        role: req.role.as_str(),
        first_name: req.first_name.as_deref(),
        last_name: req.last_name.as_deref(),
    };

    if req.role == Role::Vendor {
        let business_name = req
            .business_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::validation("Business name is required for vendor registration"))?;
        state.db.create_vendor_account(
            &new_user,
            &NewVendor {
                id: &vendor_id,
                business_name,
                vat_number: req.vat_number.as_deref(),
                city: req.city.as_deref(),
            },
        )?;
    } else {
        state.db.create_user(&new_user)?;
    }

    let token = create_token(&state.jwt_secret, user_id, &req.email, req.role)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": {
                "user": {
                    "id": user_id,
                    "email": req.email,
                    "role": req.role,
                    "first_name": req.first_name,
                    "last_name": req.last_name,
                },
                "token": token,
            }
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or_else(|| ApiError::auth("Invalid email or password"))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {e}"))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::auth("Invalid email or password"))?;

    let role: Role = user
        .role
        .parse()
        .map_err(anyhow::Error::msg)?;
    let user_id = parse_uuid(&user.id, "user id");

    let token = create_token(&state.jwt_secret, user_id, &user.email, role)?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "user": user_response(&user, role),
            "token": token,
        }
    })))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let role: Role = user.role.parse().map_err(anyhow::Error::msg)?;

    Ok(Json(json!({
        "status": "success",
        "data": { "user": user_response(&user, role) }
    })))
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn user_response(user: &UserRow, role: Role) -> UserResponse {
    UserResponse {
        id: parse_uuid(&user.id, "user id"),
        email: user.email.clone(),
        role,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        created_at: parse_utc(&user.created_at, "user created_at"),
    }
}
