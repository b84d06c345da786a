use actix_web::web;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthUser,
    db::{fetch_professional_by_user, fetch_user},
    error::{ApiError, ApiResult},
    models::{new_ticket_code, BookingRow, UserType},
    respond,
    routes::auth::{phone_valid, UserView},
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .service(
                web::resource("/profile")
                    .route(web::get().to(get_profile))
                    .route(web::put().to(update_profile)),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard)))
            .service(web::resource("/support").route(web::post().to(support))),
    );
}

async fn get_profile(state: web::Data<AppState>, auth: AuthUser) -> ApiResult {
    let user = fetch_user(&state.db, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(respond::ok(UserView::from(user)))
}

#[derive(Deserialize)]
struct ProfilePayload {
    name: Option<String>,
    phone: Option<String>,
}

// Only name and phone are caller-editable; everything else on the account
// moves through auth or admin flows.
async fn update_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<ProfilePayload>,
) -> ApiResult {
    let payload = payload.into_inner();
    let user = fetch_user(&state.db, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut errors = Vec::new();
    let name = match &payload.name {
        Some(name) => {
            let name = name.trim();
            if name.len() < 2 || name.len() > 60 {
                errors.push("Name must be between 2 and 60 characters".to_string());
            }
            name.to_string()
        }
        None => user.name.clone(),
    };
    let phone = match &payload.phone {
        Some(phone) => {
            let phone = phone.trim();
            if !phone_valid(phone) {
                errors.push("Please provide a valid 10-digit mobile number".to_string());
            }
            phone.to_string()
        }
        None => user.phone.clone(),
    };
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if phone != user.phone {
        let taken = sqlx::query_as::<_, (String,)>(
            "SELECT id FROM users WHERE phone = ? AND id != ? LIMIT 1",
        )
        .bind(&phone)
        .bind(&user.id)
        .fetch_optional(&state.db)
        .await?;
        if taken.is_some() {
            return Err(ApiError::Validation(vec![
                "Phone number is already in use".to_string(),
            ]));
        }
    }

    sqlx::query("UPDATE users SET name = ?, phone = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&phone)
        .bind(Utc::now().to_rfc3339())
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    let user = fetch_user(&state.db, &auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(respond::ok_message(
        "Profile updated successfully",
        UserView::from(user),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingStats {
    total: i64,
    pending: i64,
    confirmed: i64,
    completed: i64,
    cancelled: i64,
    total_spent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentBooking {
    id: String,
    booking_code: String,
    service_id: String,
    scheduled_date: String,
    status: String,
    total_amount: f64,
}

impl From<BookingRow> for RecentBooking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            booking_code: row.booking_code,
            service_id: row.service_id,
            scheduled_date: row.scheduled_date,
            status: row.status,
            total_amount: row.total_amount,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfessionalPanel {
    professional_id: String,
    current_status: String,
    rating_average: f64,
    rating_count: i64,
    completed_bookings: i64,
    completion_rate: f64,
    total_earnings: f64,
}

async fn dashboard(state: web::Data<AppState>, auth: AuthUser) -> ApiResult {
    // Professionals see their worksheet, everyone else their order history.
    let (scope_column, scope_id, professional) = match auth.user_type {
        UserType::Professional => {
            let profile = fetch_professional_by_user(&state.db, &auth.id)
                .await?
                .ok_or_else(|| ApiError::not_found("Professional profile not found"))?;
            ("professional_id", profile.id.clone(), Some(profile))
        }
        _ => ("customer_id", auth.id.clone(), None),
    };

    let stats_sql = format!(
        "SELECT COUNT(*), \
           COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0), \
           COALESCE(SUM(CASE WHEN status = 'confirmed' THEN 1 ELSE 0 END), 0), \
           COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0), \
           COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0), \
           COALESCE(SUM(CASE WHEN status = 'completed' THEN total_amount ELSE 0 END), 0) \
         FROM bookings WHERE {scope_column} = ?"
    );
    let row = sqlx::query_as::<_, (i64, i64, i64, i64, i64, f64)>(&stats_sql)
        .bind(&scope_id)
        .fetch_one(&state.db)
        .await?;
    let stats = BookingStats {
        total: row.0,
        pending: row.1,
        confirmed: row.2,
        completed: row.3,
        cancelled: row.4,
        total_spent: row.5,
    };

    let recent_sql = format!(
        "SELECT * FROM bookings WHERE {scope_column} = ? ORDER BY created_at DESC LIMIT 5"
    );
    let recent = sqlx::query_as::<_, BookingRow>(&recent_sql)
        .bind(&scope_id)
        .fetch_all(&state.db)
        .await?;
    let recent: Vec<RecentBooking> = recent.into_iter().map(RecentBooking::from).collect();

    let panel = professional.map(|p| ProfessionalPanel {
        professional_id: p.id,
        current_status: p.current_status,
        rating_average: p.rating_average,
        rating_count: p.rating_count,
        completed_bookings: p.completed_bookings,
        completion_rate: p.completion_rate,
        total_earnings: p.total_earnings,
    });

    Ok(respond::ok(serde_json::json!({
        "stats": stats,
        "recentBookings": recent,
        "professional": panel,
    })))
}

#[derive(Deserialize)]
struct SupportPayload {
    subject: String,
    message: String,
}

async fn support(auth: AuthUser, payload: web::Json<SupportPayload>) -> ApiResult {
    let payload = payload.into_inner();
    let subject = payload.subject.trim();
    let message = payload.message.trim();
    if subject.is_empty() || message.is_empty() {
        return Err(ApiError::Validation(vec![
            "Subject and message are required".to_string(),
        ]));
    }

    let ticket = new_ticket_code();
    log::info!(
        "Support request {ticket} from {} ({}): {subject}",
        auth.name,
        auth.email
    );

    Ok(respond::ok_message(
        "Support request received. Our team will reach out shortly.",
        serde_json::json!({ "ticketId": ticket }),
    ))
}
