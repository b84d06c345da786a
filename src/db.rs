use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    models::{slugify, BookingRow, ProfessionalRow, ServiceRow, UserRow},
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Column list for professional reads. Payout details stay out of every query
/// that feeds an API response.
pub const PROFESSIONAL_COLUMNS: &str =
    "id, user_id, business_name, description, experience_years, current_status, \
     identity_verification, background_verification, skills_verification, \
     rating_average, rating_count, rating_1, rating_2, rating_3, rating_4, rating_5, \
     total_bookings, completed_bookings, cancelled_bookings, completion_rate, \
     total_earnings, status, revision, created_at, updated_at";

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_admin(pool).await?;
    seed_catalog(pool).await?;
    Ok(())
}

async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing =
        sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE user_type = 'admin' LIMIT 1")
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Ok(());
    }

    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@homeserve.local".to_string());
    let phone = env::var("ADMIN_PHONE").unwrap_or_else(|_| "9000000000".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Platform Admin".to_string());

    if password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash = hash_password(&password)
        .map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO users (id, name, email, phone, password_hash, user_type, status, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, 'admin', 'active', ?, ?)"#,
    )
    .bind(new_id())
    .bind(name)
    .bind(email.to_lowercase())
    .bind(phone)
    .bind(password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_catalog(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let seed = env::var("SEED_CATALOG").unwrap_or_else(|_| "false".to_string());
    if seed != "true" {
        return Ok(());
    }

    let services = vec![
        ("Plumbing", "repair", "Leak fixes, pipe work, and fittings.", 350.0),
        ("Deep Cleaning", "cleaning", "Full-home deep clean with supplies included.", 250.0),
        ("AC Repair", "repair", "Split and window AC diagnosis and repair.", 400.0),
        ("Electrical Work", "home-maintenance", "Wiring, switchboards, and installations.", 380.0),
        ("Gardening", "gardening", "Lawn care, pruning, and seasonal planting.", 200.0),
    ];

    for (name, category, description, base_price) in services {
        let slug = slugify(name);
        let exists =
            sqlx::query_as::<_, (String,)>("SELECT id FROM services WHERE slug = ? LIMIT 1")
                .bind(&slug)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"INSERT INTO services (id, name, slug, description, category, icon, base_price, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, '', ?, ?, ?)"#,
        )
        .bind(new_id())
        .bind(name)
        .bind(&slug)
        .bind(description)
        .bind(category)
        .bind(base_price)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_user(pool: &SqlitePool, user_id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ? LIMIT 1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_service(
    pool: &SqlitePool,
    service_id: &str,
) -> Result<Option<ServiceRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceRow>("SELECT * FROM services WHERE id = ? LIMIT 1")
        .bind(service_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_professional(
    pool: &SqlitePool,
    professional_id: &str,
) -> Result<Option<ProfessionalRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfessionalRow>(&format!(
        "SELECT {PROFESSIONAL_COLUMNS} FROM professionals WHERE id = ? LIMIT 1"
    ))
    .bind(professional_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_professional_by_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<ProfessionalRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfessionalRow>(&format!(
        "SELECT {PROFESSIONAL_COLUMNS} FROM professionals WHERE user_id = ? LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_booking(
    pool: &SqlitePool,
    booking_id: &str,
) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ? LIMIT 1")
        .bind(booking_id)
        .fetch_optional(pool)
        .await
}
