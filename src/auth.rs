use std::future::Future;
use std::pin::Pin;

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{UserRow, UserType, USER_ACTIVE},
    state::{AppState, JwtConfig},
};

pub const MAX_LOGIN_ATTEMPTS: i64 = 5;
pub const LOCK_DURATION_HOURS: i64 = 2;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_type: String,
    pub iat: u64,
    pub exp: u64,
}

pub fn sign_token(user_id: &str, user_type: &str, config: &JwtConfig) -> Result<String, ApiError> {
    let now = Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: user_id.to_string(),
        user_type: user_type.to_string(),
        iat: now,
        exp: now + (config.expire_hours as u64) * 3600,
    };
    let key = EncodingKey::from_secret(config.secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|err| ApiError::Internal(format!("token signing failed: {err}")))
}

pub fn verify_token(token: &str, config: &JwtConfig) -> Option<Claims> {
    let key = DecodingKey::from_secret(config.secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Whether a lockout stamp is still in the future.
pub fn lock_active(lock_until: Option<&str>) -> bool {
    lock_until
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|until| until > Utc::now())
        .unwrap_or(false)
}

/// Record a failed login. A lock that has already expired restarts the
/// counter at one; the fifth consecutive failure locks the account for
/// two hours.
pub async fn register_failed_login(
    pool: &sqlx::SqlitePool,
    user: &UserRow,
) -> Result<(), sqlx::Error> {
    if user.lock_until.is_some() && !lock_active(user.lock_until.as_deref()) {
        sqlx::query("UPDATE users SET login_attempts = 1, lock_until = NULL WHERE id = ?")
            .bind(&user.id)
            .execute(pool)
            .await?;
        return Ok(());
    }

    let attempts = user.login_attempts + 1;
    if attempts >= MAX_LOGIN_ATTEMPTS {
        let until = (Utc::now() + Duration::hours(LOCK_DURATION_HOURS)).to_rfc3339();
        sqlx::query("UPDATE users SET login_attempts = ?, lock_until = ? WHERE id = ?")
            .bind(attempts)
            .bind(until)
            .bind(&user.id)
            .execute(pool)
            .await?;
    } else {
        sqlx::query("UPDATE users SET login_attempts = ? WHERE id = ?")
            .bind(attempts)
            .bind(&user.id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub async fn clear_login_attempts(
    pool: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET login_attempts = 0, lock_until = NULL, last_login = ? WHERE id = ?",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// The authenticated actor, attached once per request and read-only after.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Access denied. Admin privileges required.",
            ))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| ApiError::Internal("application state missing".to_string()))?
                .clone();

            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .ok_or_else(|| ApiError::unauthorized("Access denied. No token provided."))?
                .to_string();

            let claims = verify_token(&token, &state.jwt)
                .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

            let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ? LIMIT 1")
                .bind(&claims.sub)
                .fetch_optional(&state.db)
                .await?
                .ok_or_else(|| ApiError::unauthorized("Token is not valid. User not found."))?;

            if user.status != USER_ACTIVE {
                return Err(ApiError::unauthorized(
                    "Account is inactive. Please contact support.",
                ));
            }

            let user_type = UserType::parse(&user.user_type)
                .ok_or_else(|| ApiError::Internal(format!("unknown user type {}", user.user_type)))?;

            Ok(AuthUser {
                id: user.id,
                name: user.name,
                email: user.email,
                user_type,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let config = JwtConfig {
            secret: "test-secret".to_string(),
            expire_hours: 1,
        };
        let token = sign_token("user-1", "customer", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.user_type, "customer");
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let config = JwtConfig {
            secret: "secret-a".to_string(),
            expire_hours: 1,
        };
        let other = JwtConfig {
            secret: "secret-b".to_string(),
            expire_hours: 1,
        };
        let token = sign_token("user-1", "customer", &config).unwrap();
        assert!(verify_token(&token, &other).is_none());
    }

    #[test]
    fn lock_stamp_comparison() {
        let future = (Utc::now() + Duration::hours(1)).to_rfc3339();
        let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
        assert!(lock_active(Some(&future)));
        assert!(!lock_active(Some(&past)));
        assert!(!lock_active(None));
        assert!(!lock_active(Some("not a timestamp")));
    }
}
