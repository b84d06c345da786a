use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    auth::{
        clear_login_attempts, hash_password, lock_active, new_id, register_failed_login,
        sign_token, verify_password, AuthUser,
    },
    db::fetch_user,
    error::{ApiError, ApiResult},
    models::{UserRow, UserType},
    respond,
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(web::resource("/register").route(web::post().to(register)))
            .service(web::resource("/login").route(web::post().to(login)))
            .service(web::resource("/me").route(web::get().to(me)))
            .service(web::resource("/logout").route(web::post().to(logout)))
            .service(web::resource("/change-password").route(web::put().to(change_password))),
    );
}

/// Sanitized user representation; never exposes the password hash or
/// lockout counters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_type: String,
    pub status: String,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            user_type: row.user_type,
            status: row.status,
            email_verified: row.email_verified != 0,
            phone_verified: row.phone_verified != 0,
            last_login: row.last_login,
            created_at: row.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    phone: String,
    password: String,
    user_type: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

fn email_valid(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

pub fn phone_valid(phone: &str) -> bool {
    phone.len() == 10
        && phone.chars().all(|c| c.is_ascii_digit())
        && matches!(phone.as_bytes()[0], b'6'..=b'9')
}

async fn register(state: web::Data<AppState>, payload: web::Json<RegisterRequest>) -> ApiResult {
    let payload = payload.into_inner();
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();
    let phone = payload.phone.trim().to_string();

    let mut errors = Vec::new();
    if name.len() < 2 || name.len() > 100 {
        errors.push("Name must be between 2 and 100 characters".to_string());
    }
    if !email_valid(&email) {
        errors.push("Please enter a valid email".to_string());
    }
    if !phone_valid(&phone) {
        errors.push("Please enter a valid phone number".to_string());
    }
    if payload.password.len() < 8 {
        errors.push("Password must be at least 8 characters long".to_string());
    }
    let user_type = match payload.user_type.as_deref() {
        None | Some("customer") => UserType::Customer,
        Some("professional") => UserType::Professional,
        Some(_) => {
            errors.push("Invalid user type".to_string());
            UserType::Customer
        }
    };
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let existing =
        sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE email = ? OR phone = ? LIMIT 1")
            .bind(&email)
            .bind(&phone)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::Validation(vec![
            "User already exists with this email or phone number".to_string(),
        ]));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|err| ApiError::Internal(format!("password hash failed: {err}")))?;
    let id = new_id();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO users (id, name, email, phone, password_hash, user_type, status, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, 'active', ?, ?)"#,
    )
    .bind(&id)
    .bind(&name)
    .bind(&email)
    .bind(&phone)
    .bind(&password_hash)
    .bind(user_type.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let token = sign_token(&id, user_type.as_str(), &state.jwt)?;
    let user = fetch_user(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::Internal("registered user missing".to_string()))?;

    Ok(respond::created(
        "User registered successfully",
        json!({ "user": UserView::from(user), "token": token }),
    ))
}

async fn login(state: web::Data<AppState>, payload: web::Json<LoginRequest>) -> ApiResult {
    let payload = payload.into_inner();
    let mut errors = Vec::new();
    if payload.email.trim().is_empty() {
        errors.push("Email is required".to_string());
    }
    if payload.password.is_empty() {
        errors.push("Password is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // The identifier may be an email address or a phone number.
    let identifier = payload.email.trim();
    let user = sqlx::query_as::<_, UserRow>(
        "SELECT * FROM users WHERE email = ? OR phone = ? LIMIT 1",
    )
    .bind(identifier.to_lowercase())
    .bind(identifier)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if lock_active(user.lock_until.as_deref()) {
        return Err(ApiError::Locked);
    }

    if !verify_password(&payload.password, &user.password_hash) {
        register_failed_login(&state.db, &user).await?;
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    clear_login_attempts(&state.db, &user.id).await?;

    let token = sign_token(&user.id, &user.user_type, &state.jwt)?;
    let user = fetch_user(&state.db, &user.id)
        .await?
        .ok_or_else(|| ApiError::Internal("logged-in user missing".to_string()))?;

    Ok(respond::ok_message(
        "Login successful",
        json!({ "user": UserView::from(user), "token": token }),
    ))
}

async fn me(state: web::Data<AppState>, auth: AuthUser) -> ApiResult {
    let user = fetch_user(&state.db, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(respond::ok(UserView::from(user)))
}

async fn logout(_auth: AuthUser) -> HttpResponse {
    // Stateless tokens: the client discards its copy.
    respond::message("Logged out successfully")
}

async fn change_password(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult {
    let payload = payload.into_inner();
    let mut errors = Vec::new();
    if payload.current_password.is_empty() {
        errors.push("Current password is required".to_string());
    }
    if payload.new_password.len() < 8 {
        errors.push("New password must be at least 8 characters long".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = fetch_user(&state.db, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(&payload.current_password, &user.password_hash) {
        return Err(ApiError::invalid_state("Current password is incorrect"));
    }

    let password_hash = hash_password(&payload.new_password)
        .map_err(|err| ApiError::Internal(format!("password hash failed: {err}")))?;
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(Utc::now().to_rfc3339())
        .bind(&auth.id)
        .execute(&state.db)
        .await?;

    Ok(respond::message("Password changed successfully"))
}
