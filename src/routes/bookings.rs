use actix_web::web;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    auth::{new_id, AuthUser},
    db::{fetch_booking, fetch_professional, fetch_professional_by_user, fetch_service},
    error::{ApiError, ApiResult},
    models::{
        booking_total, new_booking_code, BookingRow, BookingStatus, FeedbackAspects, MessageRow,
        PaymentMethod, TimelineRow, UserType, PROFESSIONAL_ACTIVE, SERVICE_ACTIVE,
    },
    respond::{self, Pagination},
    routes::services::clamp_page,
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/bookings")
            .service(
                web::resource("")
                    .route(web::get().to(list))
                    .route(web::post().to(create)),
            )
            .service(web::resource("/{id}/status").route(web::put().to(update_status)))
            .service(web::resource("/{id}/feedback").route(web::post().to(submit_feedback)))
            .service(web::resource("/{id}/messages").route(web::post().to(post_message)))
            .service(web::resource("/{id}").route(web::get().to(get_by_id))),
    );
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PricingView {
    base_amount: f64,
    additional_charges: f64,
    tax_amount: f64,
    discount_amount: f64,
    total_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingView {
    id: String,
    booking_code: String,
    customer_id: String,
    professional_id: String,
    service_id: String,
    scheduled_date: String,
    slot_start: Option<String>,
    slot_end: Option<String>,
    estimated_duration_min: Option<i64>,
    address: String,
    city: String,
    instructions: Option<String>,
    pricing: PricingView,
    payment_method: String,
    payment_status: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl From<BookingRow> for BookingView {
    fn from(row: BookingRow) -> Self {
        Self {
            pricing: PricingView {
                base_amount: row.base_amount,
                additional_charges: row.additional_charges,
                tax_amount: row.tax_amount,
                discount_amount: row.discount_amount,
                total_amount: row.total_amount,
            },
            id: row.id,
            booking_code: row.booking_code,
            customer_id: row.customer_id,
            professional_id: row.professional_id,
            service_id: row.service_id,
            scheduled_date: row.scheduled_date,
            slot_start: row.slot_start,
            slot_end: row.slot_end,
            estimated_duration_min: row.estimated_duration_min,
            address: row.address,
            city: row.city,
            instructions: row.instructions,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackSlotView {
    rating: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspects: Option<Value>,
    submitted_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineView {
    status: String,
    note: Option<String>,
    actor_id: Option<String>,
    at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageView {
    id: String,
    sender_id: String,
    body: String,
    kind: String,
    created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingDetail {
    #[serde(flatten)]
    booking: BookingView,
    service_name: String,
    customer_name: String,
    professional_name: String,
    timeline: Vec<TimelineView>,
    messages: Vec<MessageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_feedback: Option<FeedbackSlotView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    professional_feedback: Option<FeedbackSlotView>,
}

fn feedback_slot(
    rating: Option<i64>,
    review: Option<String>,
    aspects: Option<String>,
    at: Option<String>,
) -> Option<FeedbackSlotView> {
    let rating = rating?;
    Some(FeedbackSlotView {
        rating,
        review,
        aspects: aspects.and_then(|raw| serde_json::from_str(&raw).ok()),
        submitted_at: at.unwrap_or_default(),
    })
}

/// Who may see and act on a booking: the customer, the assigned
/// professional's account, or an admin.
enum Access {
    Customer,
    Professional,
    Admin,
}

async fn check_access(
    pool: &SqlitePool,
    auth: &AuthUser,
    booking: &BookingRow,
) -> Result<Access, ApiError> {
    if auth.is_admin() {
        return Ok(Access::Admin);
    }
    if booking.customer_id == auth.id {
        return Ok(Access::Customer);
    }
    if let Some(profile) = fetch_professional_by_user(pool, &auth.id).await? {
        if profile.id == booking.professional_id {
            return Ok(Access::Professional);
        }
    }
    Err(ApiError::forbidden("Access denied for this booking"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePayload {
    professional_id: String,
    service_id: String,
    scheduled_date: String,
    slot_start: Option<String>,
    slot_end: Option<String>,
    estimated_duration_min: Option<i64>,
    address: String,
    city: String,
    instructions: Option<String>,
    payment_method: Option<String>,
}

async fn create(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<CreatePayload>,
) -> ApiResult {
    let payload = payload.into_inner();

    let mut errors = Vec::new();
    if payload.scheduled_date.trim().is_empty() {
        errors.push("Scheduled date is required".to_string());
    }
    if payload.address.trim().is_empty() {
        errors.push("Service address is required".to_string());
    }
    if payload.city.trim().is_empty() {
        errors.push("City is required".to_string());
    }
    if let Some(minutes) = payload.estimated_duration_min {
        if minutes <= 0 {
            errors.push("Estimated duration must be positive".to_string());
        }
    }
    let payment_method = match payload.payment_method.as_deref() {
        None => PaymentMethod::Cash,
        Some(raw) => match PaymentMethod::parse(raw) {
            Some(method) => method,
            None => {
                errors.push("Payment method must be one of: cash, upi, card, wallet".to_string());
                PaymentMethod::Cash
            }
        },
    };
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // A suspended or missing party reads the same to the caller.
    let professional = fetch_professional(&state.db, &payload.professional_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Professional not found or inactive"))?;
    if professional.status != PROFESSIONAL_ACTIVE {
        return Err(ApiError::not_found("Professional not found or inactive"));
    }
    if professional.user_id == auth.id {
        return Err(ApiError::invalid_state("You cannot book yourself"));
    }

    let service = fetch_service(&state.db, &payload.service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found or inactive"))?;
    if service.status != SERVICE_ACTIVE {
        return Err(ApiError::not_found("Service not found or inactive"));
    }

    let offering = sqlx::query_as::<_, (f64,)>(
        "SELECT hourly_rate FROM professional_services \
         WHERE professional_id = ? AND service_id = ? LIMIT 1",
    )
    .bind(&professional.id)
    .bind(&service.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        ApiError::invalid_state("This professional does not offer the selected service")
    })?;

    let base_amount = booking_total(offering.0, payload.estimated_duration_min);
    let total_amount = base_amount;

    let id = new_id();
    let booking_code = new_booking_code();
    let now = Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"INSERT INTO bookings
           (id, booking_code, customer_id, professional_id, service_id, scheduled_date,
            slot_start, slot_end, estimated_duration_min, address, city, instructions,
            base_amount, additional_charges, tax_amount, discount_amount, total_amount,
            payment_method, payment_status, status, revision, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, 0, ?, ?, 'pending',
                   'pending', 0, ?, ?)"#,
    )
    .bind(&id)
    .bind(&booking_code)
    .bind(&auth.id)
    .bind(&professional.id)
    .bind(&service.id)
    .bind(payload.scheduled_date.trim())
    .bind(payload.slot_start.as_deref())
    .bind(payload.slot_end.as_deref())
    .bind(payload.estimated_duration_min)
    .bind(payload.address.trim())
    .bind(payload.city.trim())
    .bind(payload.instructions.as_deref())
    .bind(base_amount)
    .bind(total_amount)
    .bind(payment_method.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO booking_timeline (id, booking_id, status, note, actor_id, created_at) \
         VALUES (?, ?, 'pending', 'Booking created', ?, ?)",
    )
    .bind(new_id())
    .bind(&id)
    .bind(&auth.id)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE services SET total_bookings = total_bookings + 1, updated_at = ? WHERE id = ?",
    )
    .bind(&now)
    .bind(&service.id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "UPDATE professionals SET total_bookings = total_bookings + 1, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&now)
    .bind(&professional.id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    let booking = fetch_booking(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::Internal("created booking missing".to_string()))?;
    Ok(respond::created(
        "Booking created successfully",
        BookingView::from(booking),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    status: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ListQuery>,
) -> ApiResult {
    let query = query.into_inner();
    let (page, limit) = clamp_page(query.page, query.limit);

    let mut filters = String::from("WHERE 1 = 1");
    let mut scope_id = None;
    match auth.user_type {
        UserType::Admin => {}
        UserType::Customer => {
            filters.push_str(" AND customer_id = ?");
            scope_id = Some(auth.id.clone());
        }
        UserType::Professional => {
            let profile = fetch_professional_by_user(&state.db, &auth.id)
                .await?
                .ok_or_else(|| ApiError::not_found("Professional profile not found"))?;
            filters.push_str(" AND professional_id = ?");
            scope_id = Some(profile.id);
        }
    }
    if query.status.is_some() {
        filters.push_str(" AND status = ?");
    }

    let sql = format!(
        "SELECT * FROM bookings {filters} ORDER BY created_at DESC LIMIT ? OFFSET ?"
    );
    let count_sql = format!("SELECT COUNT(*) FROM bookings {filters}");

    let mut rows_query = sqlx::query_as::<_, BookingRow>(&sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(id) = &scope_id {
        rows_query = rows_query.bind(id);
        count_query = count_query.bind(id);
    }
    if let Some(status) = &query.status {
        rows_query = rows_query.bind(status);
        count_query = count_query.bind(status);
    }
    rows_query = rows_query.bind(limit).bind((page - 1) * limit);

    let rows = rows_query.fetch_all(&state.db).await?;
    let total = count_query.fetch_one(&state.db).await?;

    let bookings: Vec<BookingView> = rows.into_iter().map(BookingView::from).collect();
    Ok(respond::page(bookings, Pagination::new(page, limit, total)))
}

async fn load_detail(pool: &SqlitePool, booking: BookingRow) -> Result<BookingDetail, ApiError> {
    let service_name = sqlx::query_scalar::<_, String>("SELECT name FROM services WHERE id = ?")
        .bind(&booking.service_id)
        .fetch_optional(pool)
        .await?
        .unwrap_or_default();
    let customer_name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?")
        .bind(&booking.customer_id)
        .fetch_optional(pool)
        .await?
        .unwrap_or_default();
    let professional_name = sqlx::query_scalar::<_, String>(
        "SELECT u.name FROM professionals p JOIN users u ON u.id = p.user_id WHERE p.id = ?",
    )
    .bind(&booking.professional_id)
    .fetch_optional(pool)
    .await?
    .unwrap_or_default();

    let timeline = sqlx::query_as::<_, TimelineRow>(
        "SELECT * FROM booking_timeline WHERE booking_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(&booking.id)
    .fetch_all(pool)
    .await?;

    let messages = sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM booking_messages WHERE booking_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(&booking.id)
    .fetch_all(pool)
    .await?;

    let customer_feedback = feedback_slot(
        booking.customer_rating,
        booking.customer_review.clone(),
        booking.customer_aspects.clone(),
        booking.customer_feedback_at.clone(),
    );
    let professional_feedback = feedback_slot(
        booking.professional_rating,
        booking.professional_review.clone(),
        None,
        booking.professional_feedback_at.clone(),
    );

    Ok(BookingDetail {
        booking: BookingView::from(booking),
        service_name,
        customer_name,
        professional_name,
        timeline: timeline
            .into_iter()
            .map(|row| TimelineView {
                status: row.status,
                note: row.note,
                actor_id: row.actor_id,
                at: row.created_at,
            })
            .collect(),
        messages: messages
            .into_iter()
            .map(|row| MessageView {
                id: row.id,
                sender_id: row.sender_id,
                body: row.body,
                kind: row.kind,
                created_at: row.created_at,
            })
            .collect(),
        customer_feedback,
        professional_feedback,
    })
}

async fn get_by_id(state: web::Data<AppState>, auth: AuthUser, path: web::Path<String>) -> ApiResult {
    let booking = fetch_booking(&state.db, &path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    check_access(&state.db, &auth, &booking).await?;
    let detail = load_detail(&state.db, booking).await?;
    Ok(respond::ok(detail))
}

#[derive(Deserialize)]
struct StatusPayload {
    status: String,
    note: Option<String>,
}

fn transition_allowed_for(access: &Access, next: BookingStatus) -> bool {
    match access {
        Access::Admin => true,
        Access::Customer => matches!(next, BookingStatus::Cancelled | BookingStatus::Disputed),
        Access::Professional => matches!(
            next,
            BookingStatus::Confirmed
                | BookingStatus::InProgress
                | BookingStatus::Completed
                | BookingStatus::Cancelled
                | BookingStatus::NoShow
        ),
    }
}

async fn update_status(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<StatusPayload>,
) -> ApiResult {
    let booking_id = path.into_inner();
    let payload = payload.into_inner();

    let next = BookingStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::Validation(vec![format!("Unknown booking status: {}", payload.status)])
    })?;

    let booking = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    let access = check_access(&state.db, &auth, &booking).await?;

    let current = BookingStatus::parse(&booking.status)
        .ok_or_else(|| ApiError::Internal(format!("corrupt booking status {}", booking.status)))?;
    if !current.can_transition_to(next) {
        return Err(ApiError::invalid_state(&format!(
            "Cannot move booking from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    if !transition_allowed_for(&access, next) {
        return Err(ApiError::forbidden(
            "You are not allowed to set this booking status",
        ));
    }

    let now = Utc::now().to_rfc3339();
    let mut tx = state.db.begin().await?;

    let updated = sqlx::query(
        "UPDATE bookings SET status = ?, revision = revision + 1, updated_at = ? \
         WHERE id = ? AND revision = ?",
    )
    .bind(next.as_str())
    .bind(&now)
    .bind(&booking.id)
    .bind(booking.revision)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(ApiError::Conflict(
            "Booking was modified concurrently. Please retry.".to_string(),
        ));
    }

    sqlx::query(
        "INSERT INTO booking_timeline (id, booking_id, status, note, actor_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(new_id())
    .bind(&booking.id)
    .bind(next.as_str())
    .bind(payload.note.as_deref())
    .bind(&auth.id)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    match next {
        BookingStatus::Completed => {
            // Derived counters move with the booking in the same transaction.
            sqlx::query(
                "UPDATE professionals SET \
                   completed_bookings = completed_bookings + 1, \
                   total_earnings = total_earnings + ?, \
                   completion_rate = CAST(completed_bookings + 1 AS REAL) / \
                     CASE WHEN total_bookings > 0 THEN total_bookings ELSE 1 END, \
                   updated_at = ? \
                 WHERE id = ?",
            )
            .bind(booking.total_amount)
            .bind(&now)
            .bind(&booking.professional_id)
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE bookings SET payment_status = 'paid' WHERE id = ?")
                .bind(&booking.id)
                .execute(&mut *tx)
                .await?;
        }
        BookingStatus::Cancelled => {
            sqlx::query(
                "UPDATE professionals SET cancelled_bookings = cancelled_bookings + 1, \
                 updated_at = ? WHERE id = ?",
            )
            .bind(&now)
            .bind(&booking.professional_id)
            .execute(&mut *tx)
            .await?;
        }
        _ => {}
    }
    tx.commit().await?;

    let booking = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    Ok(respond::ok_message(
        "Booking status updated",
        BookingView::from(booking),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackPayload {
    rating: u8,
    review: Option<String>,
    aspects: Option<FeedbackAspects>,
}

const RATING_CAS_ATTEMPTS: usize = 3;

/// Fold one new customer rating into the professional's running aggregate.
/// Uses the revision column so two concurrent reviews never clobber each
/// other; a lost race re-reads and retries.
async fn apply_professional_rating(
    conn: &mut sqlx::SqliteConnection,
    professional_id: &str,
    rating: u8,
) -> Result<(), ApiError> {
    for _ in 0..RATING_CAS_ATTEMPTS {
        let professional = sqlx::query_as::<_, crate::models::ProfessionalRow>(&format!(
            "SELECT {} FROM professionals WHERE id = ? LIMIT 1",
            crate::db::PROFESSIONAL_COLUMNS
        ))
        .bind(professional_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;
        let mut aggregate = professional.rating();
        aggregate.apply(rating);

        let updated = sqlx::query(
            r#"UPDATE professionals SET rating_average = ?, rating_count = ?,
               rating_1 = ?, rating_2 = ?, rating_3 = ?, rating_4 = ?, rating_5 = ?,
               revision = revision + 1, updated_at = ?
               WHERE id = ? AND revision = ?"#,
        )
        .bind(aggregate.average)
        .bind(aggregate.count)
        .bind(aggregate.histogram[0])
        .bind(aggregate.histogram[1])
        .bind(aggregate.histogram[2])
        .bind(aggregate.histogram[3])
        .bind(aggregate.histogram[4])
        .bind(Utc::now().to_rfc3339())
        .bind(professional_id)
        .bind(professional.revision)
        .execute(&mut *conn)
        .await?;
        if updated.rows_affected() == 1 {
            return Ok(());
        }
    }
    Err(ApiError::Conflict(
        "Rating update lost a concurrent race. Please retry.".to_string(),
    ))
}

async fn submit_feedback(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<FeedbackPayload>,
) -> ApiResult {
    let booking_id = path.into_inner();
    let payload = payload.into_inner();

    if !(1..=5).contains(&payload.rating) {
        return Err(ApiError::Validation(vec![
            "Rating must be between 1 and 5".to_string(),
        ]));
    }

    let booking = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    let access = check_access(&state.db, &auth, &booking).await?;

    if booking.status != BookingStatus::Completed.as_str() {
        return Err(ApiError::invalid_state(
            "Feedback is only accepted on completed bookings",
        ));
    }

    let now = Utc::now().to_rfc3339();
    match access {
        Access::Customer => {
            let aspects = match &payload.aspects {
                Some(aspects) => {
                    Some(serde_json::to_string(aspects).map_err(|e| ApiError::Internal(e.to_string()))?)
                }
                None => None,
            };

            // Slot write, professional aggregate, and service aggregate either
            // all land or none do. The IS NULL guard makes the slot
            // write-exactly-once even under concurrent submissions.
            let mut tx = state.db.begin().await?;
            let updated = sqlx::query(
                "UPDATE bookings SET customer_rating = ?, customer_review = ?, \
                 customer_aspects = ?, customer_feedback_at = ?, updated_at = ? \
                 WHERE id = ? AND customer_rating IS NULL",
            )
            .bind(i64::from(payload.rating))
            .bind(payload.review.as_deref())
            .bind(aspects.as_deref())
            .bind(&now)
            .bind(&now)
            .bind(&booking.id)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(ApiError::invalid_state(
                    "Feedback has already been submitted for this booking",
                ));
            }

            apply_professional_rating(&mut *tx, &booking.professional_id, payload.rating).await?;

            // The catalog entry carries its own running average.
            sqlx::query(
                "UPDATE services SET \
                   rating_average = (rating_average * rating_count + ?) / (rating_count + 1), \
                   rating_count = rating_count + 1, updated_at = ? \
                 WHERE id = ?",
            )
            .bind(f64::from(payload.rating))
            .bind(&now)
            .bind(&booking.service_id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
        }
        Access::Professional => {
            let updated = sqlx::query(
                "UPDATE bookings SET professional_rating = ?, professional_review = ?, \
                 professional_feedback_at = ?, updated_at = ? \
                 WHERE id = ? AND professional_rating IS NULL",
            )
            .bind(i64::from(payload.rating))
            .bind(payload.review.as_deref())
            .bind(&now)
            .bind(&now)
            .bind(&booking.id)
            .execute(&state.db)
            .await?;
            if updated.rows_affected() == 0 {
                return Err(ApiError::invalid_state(
                    "Feedback has already been submitted for this booking",
                ));
            }
        }
        Access::Admin => {
            return Err(ApiError::forbidden(
                "Only booking participants can leave feedback",
            ));
        }
    }

    Ok(respond::message("Feedback submitted. Thank you!"))
}

#[derive(Deserialize)]
struct MessagePayload {
    body: String,
    kind: Option<String>,
}

async fn post_message(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<MessagePayload>,
) -> ApiResult {
    let booking_id = path.into_inner();
    let payload = payload.into_inner();

    let body = payload.body.trim();
    if body.is_empty() || body.len() > 1000 {
        return Err(ApiError::Validation(vec![
            "Message must be between 1 and 1000 characters".to_string(),
        ]));
    }

    let booking = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    check_access(&state.db, &auth, &booking).await?;

    let id = new_id();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO booking_messages (id, booking_id, sender_id, body, kind, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&booking.id)
    .bind(&auth.id)
    .bind(body)
    .bind(payload.kind.as_deref().unwrap_or("text"))
    .bind(&now)
    .execute(&state.db)
    .await?;

    Ok(respond::created(
        "Message sent",
        MessageView {
            id,
            sender_id: auth.id,
            body: body.to_string(),
            kind: payload.kind.unwrap_or_else(|| "text".to_string()),
            created_at: now,
        },
    ))
}
