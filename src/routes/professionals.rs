use actix_web::web;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    auth::{new_id, AuthUser},
    db::{fetch_professional, fetch_professional_by_user, PROFESSIONAL_COLUMNS},
    error::{ApiError, ApiResult},
    models::{
        OfferingRow, ProfessionalRow, ServiceAreaRow, WorkingHourRow, DEFAULT_REGION,
        PROFESSIONAL_ACTIVE,
    },
    respond::{self, Pagination},
    routes::services::clamp_page,
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/professionals")
            .service(
                web::resource("")
                    .route(web::get().to(list))
                    .route(web::post().to(create_profile)),
            )
            .service(web::resource("/service/{service_id}").route(web::get().to(by_service)))
            .service(web::resource("/{id}/availability").route(web::put().to(set_availability)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_by_id))
                    .route(web::put().to(update_profile)),
            ),
    );
}

fn prefixed_columns() -> String {
    PROFESSIONAL_COLUMNS
        .split(',')
        .map(|col| format!("p.{}", col.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, sqlx::FromRow)]
struct JoinedRow {
    #[sqlx(flatten)]
    professional: ProfessionalRow,
    user_name: String,
    user_phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RatingView {
    average: f64,
    count: i64,
    breakdown: [i64; 5],
}

impl From<&ProfessionalRow> for RatingView {
    fn from(row: &ProfessionalRow) -> Self {
        let rating = row.rating();
        Self {
            average: rating.average,
            count: rating.count,
            breakdown: rating.histogram,
        }
    }
}

/// Trimmed card for listings and discovery. Never includes payout or
/// verification-document data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfessionalSummary {
    id: String,
    name: String,
    phone: String,
    business_name: Option<String>,
    description: Option<String>,
    experience_years: i64,
    current_status: String,
    verified: bool,
    rating: RatingView,
    completed_bookings: i64,
    total_bookings: i64,
    completion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    hourly_rate: Option<f64>,
    service_areas: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OfferingView {
    service_id: String,
    service_name: String,
    hourly_rate: f64,
    experience_years: i64,
    specialties: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAreaView {
    city: String,
    areas: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkingHourView {
    weekday: i64,
    start_time: String,
    end_time: String,
    available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfessionalDetail {
    id: String,
    user_id: String,
    name: String,
    phone: String,
    business_name: Option<String>,
    description: Option<String>,
    experience_years: i64,
    current_status: String,
    status: String,
    verified: bool,
    identity_verification: String,
    background_verification: String,
    skills_verification: String,
    rating: RatingView,
    total_bookings: i64,
    completed_bookings: i64,
    cancelled_bookings: i64,
    completion_rate: f64,
    services: Vec<OfferingView>,
    service_areas: Vec<ServiceAreaView>,
    working_hours: Vec<WorkingHourView>,
    member_since: String,
}

async fn load_area_cities(
    pool: &SqlitePool,
    professional_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT city FROM service_areas WHERE professional_id = ? ORDER BY city",
    )
    .bind(professional_id)
    .fetch_all(pool)
    .await?;
    let mut cities: Vec<String> = rows.into_iter().map(|(city,)| city).collect();
    if cities.is_empty() {
        cities.push(DEFAULT_REGION.to_string());
    }
    Ok(cities)
}

async fn summarize(
    pool: &SqlitePool,
    row: JoinedRow,
    hourly_rate: Option<f64>,
) -> Result<ProfessionalSummary, sqlx::Error> {
    let service_areas = load_area_cities(pool, &row.professional.id).await?;
    let p = row.professional;
    Ok(ProfessionalSummary {
        rating: RatingView::from(&p),
        verified: p.is_verified(),
        id: p.id,
        name: row.user_name,
        phone: row.user_phone,
        business_name: p.business_name,
        description: p.description,
        experience_years: p.experience_years,
        current_status: p.current_status,
        completed_bookings: p.completed_bookings,
        total_bookings: p.total_bookings,
        completion_rate: p.completion_rate,
        hourly_rate,
        service_areas,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    service: Option<String>,
    location: Option<String>,
    rating: Option<f64>,
    sort_by: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

async fn list(state: web::Data<AppState>, query: web::Query<ListQuery>) -> ApiResult {
    let query = query.into_inner();
    let (page, limit) = clamp_page(query.page, query.limit);

    let mut filters = String::from("WHERE p.status = 'active'");
    if query.service.is_some() {
        filters.push_str(
            " AND EXISTS (SELECT 1 FROM professional_services ps \
             WHERE ps.professional_id = p.id AND ps.service_id = ?)",
        );
    }
    if query.location.is_some() {
        filters.push_str(
            " AND EXISTS (SELECT 1 FROM service_areas sa \
             WHERE sa.professional_id = p.id AND LOWER(sa.city) LIKE ?)",
        );
    }
    if query.rating.is_some() {
        filters.push_str(" AND p.rating_average >= ?");
    }

    let order = match query.sort_by.as_deref() {
        Some("price") => {
            "(SELECT MIN(ps.hourly_rate) FROM professional_services ps \
             WHERE ps.professional_id = p.id) ASC"
        }
        Some("experience") => "p.experience_years DESC",
        Some("reviews") => "p.rating_count DESC",
        _ => "p.rating_average DESC, p.rating_count DESC",
    };

    let columns = prefixed_columns();
    let sql = format!(
        "SELECT {columns}, u.name AS user_name, u.phone AS user_phone \
         FROM professionals p JOIN users u ON u.id = p.user_id \
         {filters} ORDER BY {order} LIMIT ? OFFSET ?"
    );
    let count_sql = format!("SELECT COUNT(*) FROM professionals p {filters}");

    let location_pattern = query
        .location
        .as_deref()
        .map(|s| format!("%{}%", s.trim().to_lowercase()));

    let mut rows_query = sqlx::query_as::<_, JoinedRow>(&sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(service) = &query.service {
        rows_query = rows_query.bind(service);
        count_query = count_query.bind(service);
    }
    if let Some(pattern) = &location_pattern {
        rows_query = rows_query.bind(pattern);
        count_query = count_query.bind(pattern);
    }
    if let Some(min_rating) = query.rating {
        rows_query = rows_query.bind(min_rating);
        count_query = count_query.bind(min_rating);
    }
    rows_query = rows_query.bind(limit).bind((page - 1) * limit);

    let rows = rows_query.fetch_all(&state.db).await?;
    let total = count_query.fetch_one(&state.db).await?;

    let mut professionals = Vec::with_capacity(rows.len());
    for row in rows {
        professionals.push(summarize(&state.db, row, None).await?);
    }
    Ok(respond::page(
        professionals,
        Pagination::new(page, limit, total),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveryQuery {
    location: Option<String>,
    sort_by: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct DiscoveryRow {
    #[sqlx(flatten)]
    professional: ProfessionalRow,
    user_name: String,
    user_phone: String,
    hourly_rate: f64,
}

async fn by_service(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DiscoveryQuery>,
) -> ApiResult {
    let service_id = path.into_inner();
    let query = query.into_inner();
    let (page, limit) = clamp_page(query.page, query.limit);

    let mut filters = String::from(
        "WHERE p.status = 'active' AND ps.service_id = ?",
    );
    if query.location.is_some() {
        filters.push_str(
            " AND EXISTS (SELECT 1 FROM service_areas sa \
             WHERE sa.professional_id = p.id AND LOWER(sa.city) LIKE ?)",
        );
    }

    // Composite default favors a track record over a single perfect review.
    let order = match query.sort_by.as_deref() {
        Some("rating") => "p.rating_average DESC, p.rating_count DESC",
        Some("price") => "ps.hourly_rate ASC",
        _ => "(p.rating_average * 10 + p.completed_bookings) DESC",
    };

    let columns = prefixed_columns();
    let sql = format!(
        "SELECT {columns}, u.name AS user_name, u.phone AS user_phone, ps.hourly_rate \
         FROM professionals p \
         JOIN professional_services ps ON ps.professional_id = p.id \
         JOIN users u ON u.id = p.user_id \
         {filters} ORDER BY {order} LIMIT ? OFFSET ?"
    );
    let count_sql = format!(
        "SELECT COUNT(*) FROM professionals p \
         JOIN professional_services ps ON ps.professional_id = p.id {filters}"
    );

    let location_pattern = query
        .location
        .as_deref()
        .map(|s| format!("%{}%", s.trim().to_lowercase()));

    let mut rows_query = sqlx::query_as::<_, DiscoveryRow>(&sql).bind(&service_id);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(&service_id);
    if let Some(pattern) = &location_pattern {
        rows_query = rows_query.bind(pattern);
        count_query = count_query.bind(pattern);
    }
    rows_query = rows_query.bind(limit).bind((page - 1) * limit);

    let rows = rows_query.fetch_all(&state.db).await?;
    let total = count_query.fetch_one(&state.db).await?;

    let mut professionals = Vec::with_capacity(rows.len());
    for row in rows {
        let rate = row.hourly_rate;
        let joined = JoinedRow {
            professional: row.professional,
            user_name: row.user_name,
            user_phone: row.user_phone,
        };
        professionals.push(summarize(&state.db, joined, Some(rate)).await?);
    }
    Ok(respond::page(
        professionals,
        Pagination::new(page, limit, total),
    ))
}

#[derive(Debug, sqlx::FromRow)]
struct OfferingJoin {
    #[sqlx(flatten)]
    offering: OfferingRow,
    service_name: String,
}

async fn load_detail(
    pool: &SqlitePool,
    professional: ProfessionalRow,
) -> Result<ProfessionalDetail, ApiError> {
    let user = crate::db::fetch_user(pool, &professional.user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("professional without user".to_string()))?;

    let offerings = sqlx::query_as::<_, OfferingJoin>(
        "SELECT ps.professional_id, ps.service_id, ps.hourly_rate, ps.experience_years, \
                ps.specialties, s.name AS service_name \
         FROM professional_services ps JOIN services s ON s.id = ps.service_id \
         WHERE ps.professional_id = ?",
    )
    .bind(&professional.id)
    .fetch_all(pool)
    .await?;

    let areas = sqlx::query_as::<_, ServiceAreaRow>(
        "SELECT * FROM service_areas WHERE professional_id = ? ORDER BY city",
    )
    .bind(&professional.id)
    .fetch_all(pool)
    .await?;

    let hours = sqlx::query_as::<_, WorkingHourRow>(
        "SELECT * FROM working_hours WHERE professional_id = ? ORDER BY weekday",
    )
    .bind(&professional.id)
    .fetch_all(pool)
    .await?;

    let services = offerings
        .into_iter()
        .map(|join| OfferingView {
            specialties: join.offering.specialties_vec(),
            service_id: join.offering.service_id,
            service_name: join.service_name,
            hourly_rate: join.offering.hourly_rate,
            experience_years: join.offering.experience_years,
        })
        .collect();

    let service_areas = if areas.is_empty() {
        vec![ServiceAreaView {
            city: DEFAULT_REGION.to_string(),
            areas: Vec::new(),
        }]
    } else {
        areas
            .into_iter()
            .map(|row| ServiceAreaView {
                areas: serde_json::from_str(&row.areas).unwrap_or_default(),
                city: row.city,
            })
            .collect()
    };

    let working_hours = hours
        .into_iter()
        .map(|row| WorkingHourView {
            weekday: row.weekday,
            start_time: row.start_time,
            end_time: row.end_time,
            available: row.available != 0,
        })
        .collect();

    Ok(ProfessionalDetail {
        rating: RatingView::from(&professional),
        verified: professional.is_verified(),
        id: professional.id,
        user_id: professional.user_id,
        name: user.name,
        phone: user.phone,
        business_name: professional.business_name,
        description: professional.description,
        experience_years: professional.experience_years,
        current_status: professional.current_status,
        status: professional.status,
        identity_verification: professional.identity_verification,
        background_verification: professional.background_verification,
        skills_verification: professional.skills_verification,
        total_bookings: professional.total_bookings,
        completed_bookings: professional.completed_bookings,
        cancelled_bookings: professional.cancelled_bookings,
        completion_rate: professional.completion_rate,
        services,
        service_areas,
        working_hours,
        member_since: professional.created_at,
    })
}

async fn get_by_id(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let professional = fetch_professional(&state.db, &path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;
    let detail = load_detail(&state.db, professional).await?;
    Ok(respond::ok(detail))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferingPayload {
    service_id: String,
    hourly_rate: f64,
    experience_years: Option<i64>,
    specialties: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAreaPayload {
    city: String,
    areas: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkingHourPayload {
    weekday: i64,
    start_time: String,
    end_time: String,
    available: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePayload {
    business_name: Option<String>,
    description: Option<String>,
    experience_years: Option<i64>,
    services: Option<Vec<OfferingPayload>>,
    service_areas: Option<Vec<ServiceAreaPayload>>,
    working_hours: Option<Vec<WorkingHourPayload>>,
    // Admin-only fields, ignored for everyone else.
    status: Option<String>,
    identity_verification: Option<String>,
    background_verification: Option<String>,
    skills_verification: Option<String>,
}

fn validate_offerings(services: &[OfferingPayload]) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if services.is_empty() {
        errors.push("At least one service offering is required".to_string());
    }
    for offering in services {
        if offering.hourly_rate <= 0.0 {
            errors.push("Hourly rate must be greater than zero".to_string());
            break;
        }
    }
    for offering in services {
        if let Some(years) = offering.experience_years {
            if years < 0 {
                errors.push("Experience years cannot be negative".to_string());
                break;
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

async fn replace_offerings(
    pool: &SqlitePool,
    professional_id: &str,
    services: &[OfferingPayload],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM professional_services WHERE professional_id = ?")
        .bind(professional_id)
        .execute(pool)
        .await?;
    for offering in services {
        let service = crate::db::fetch_service(pool, &offering.service_id)
            .await?
            .ok_or_else(|| {
                ApiError::Validation(vec![format!("Unknown service: {}", offering.service_id)])
            })?;
        let specialties = serde_json::to_string(
            offering.specialties.as_deref().unwrap_or(&[]),
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?;
        sqlx::query(
            "INSERT INTO professional_services \
             (professional_id, service_id, hourly_rate, experience_years, specialties) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(professional_id)
        .bind(&service.id)
        .bind(offering.hourly_rate)
        .bind(offering.experience_years.unwrap_or(0))
        .bind(&specialties)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn replace_areas(
    pool: &SqlitePool,
    professional_id: &str,
    areas: &[ServiceAreaPayload],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM service_areas WHERE professional_id = ?")
        .bind(professional_id)
        .execute(pool)
        .await?;
    for area in areas {
        let city = area.city.trim();
        if city.is_empty() {
            continue;
        }
        let list = serde_json::to_string(area.areas.as_deref().unwrap_or(&[]))
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        sqlx::query(
            "INSERT INTO service_areas (professional_id, city, areas) VALUES (?, ?, ?)",
        )
        .bind(professional_id)
        .bind(city)
        .bind(&list)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn replace_hours(
    pool: &SqlitePool,
    professional_id: &str,
    hours: &[WorkingHourPayload],
) -> Result<(), ApiError> {
    for hour in hours {
        if !(0..=6).contains(&hour.weekday) {
            return Err(ApiError::Validation(vec![
                "Weekday must be between 0 and 6".to_string(),
            ]));
        }
    }
    sqlx::query("DELETE FROM working_hours WHERE professional_id = ?")
        .bind(professional_id)
        .execute(pool)
        .await?;
    for hour in hours {
        sqlx::query(
            "INSERT INTO working_hours \
             (professional_id, weekday, start_time, end_time, available) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(professional_id)
        .bind(hour.weekday)
        .bind(&hour.start_time)
        .bind(&hour.end_time)
        .bind(hour.available.unwrap_or(true) as i64)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn create_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<ProfilePayload>,
) -> ApiResult {
    let payload = payload.into_inner();

    if fetch_professional_by_user(&state.db, &auth.id)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation(vec![
            "Professional profile already exists".to_string(),
        ]));
    }

    let services = payload.services.as_deref().unwrap_or(&[]);
    validate_offerings(services)?;

    let id = new_id();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"INSERT INTO professionals
           (id, user_id, business_name, description, experience_years, current_status,
            status, revision, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, 'offline', 'pending', 0, ?, ?)"#,
    )
    .bind(&id)
    .bind(&auth.id)
    .bind(payload.business_name.as_deref())
    .bind(payload.description.as_deref())
    .bind(payload.experience_years.unwrap_or(0))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    replace_offerings(&state.db, &id, services).await?;
    if let Some(areas) = &payload.service_areas {
        replace_areas(&state.db, &id, areas).await?;
    }
    if let Some(hours) = &payload.working_hours {
        replace_hours(&state.db, &id, hours).await?;
    }

    // The account doubles as a professional from now on.
    sqlx::query("UPDATE users SET user_type = 'professional', updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(&auth.id)
        .execute(&state.db)
        .await?;

    let professional = fetch_professional(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::Internal("created profile missing".to_string()))?;
    let detail = load_detail(&state.db, professional).await?;
    Ok(respond::created(
        "Professional profile created. Verification is pending.",
        detail,
    ))
}

async fn update_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<ProfilePayload>,
) -> ApiResult {
    let professional_id = path.into_inner();
    let payload = payload.into_inner();

    let professional = fetch_professional(&state.db, &professional_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;
    if professional.user_id != auth.id && !auth.is_admin() {
        return Err(ApiError::forbidden("You can only update your own profile"));
    }

    if let Some(services) = &payload.services {
        validate_offerings(services)?;
    }

    let business_name = payload
        .business_name
        .or(professional.business_name.clone());
    let description = payload.description.or(professional.description.clone());
    let experience_years = payload
        .experience_years
        .unwrap_or(professional.experience_years);

    let (status, identity, background, skills) = if auth.is_admin() {
        (
            payload.status.unwrap_or_else(|| professional.status.clone()),
            payload
                .identity_verification
                .unwrap_or_else(|| professional.identity_verification.clone()),
            payload
                .background_verification
                .unwrap_or_else(|| professional.background_verification.clone()),
            payload
                .skills_verification
                .unwrap_or_else(|| professional.skills_verification.clone()),
        )
    } else {
        (
            professional.status.clone(),
            professional.identity_verification.clone(),
            professional.background_verification.clone(),
            professional.skills_verification.clone(),
        )
    };

    let updated = sqlx::query(
        r#"UPDATE professionals SET business_name = ?, description = ?, experience_years = ?,
           status = ?, identity_verification = ?, background_verification = ?,
           skills_verification = ?, revision = revision + 1, updated_at = ?
           WHERE id = ? AND revision = ?"#,
    )
    .bind(business_name.as_deref())
    .bind(description.as_deref())
    .bind(experience_years)
    .bind(&status)
    .bind(&identity)
    .bind(&background)
    .bind(&skills)
    .bind(Utc::now().to_rfc3339())
    .bind(&professional.id)
    .bind(professional.revision)
    .execute(&state.db)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(ApiError::Conflict(
            "Profile was modified concurrently. Please retry.".to_string(),
        ));
    }

    if let Some(services) = &payload.services {
        replace_offerings(&state.db, &professional.id, services).await?;
    }
    if let Some(areas) = &payload.service_areas {
        replace_areas(&state.db, &professional.id, areas).await?;
    }
    if let Some(hours) = &payload.working_hours {
        replace_hours(&state.db, &professional.id, hours).await?;
    }

    let professional = fetch_professional(&state.db, &professional_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;
    let detail = load_detail(&state.db, professional).await?;
    Ok(respond::ok_message("Profile updated successfully", detail))
}

#[derive(Deserialize)]
struct AvailabilityPayload {
    status: String,
}

async fn set_availability(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<AvailabilityPayload>,
) -> ApiResult {
    let professional_id = path.into_inner();
    let professional = fetch_professional(&state.db, &professional_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;
    if professional.user_id != auth.id {
        return Err(ApiError::forbidden(
            "You can only update your own availability",
        ));
    }
    let status = payload.status.as_str();
    if professional.status != PROFESSIONAL_ACTIVE && status != "offline" {
        return Err(ApiError::invalid_state(
            "Profile must be active before going online",
        ));
    }
    if !matches!(status, "available" | "busy" | "offline") {
        return Err(ApiError::Validation(vec![
            "Status must be one of: available, busy, offline".to_string(),
        ]));
    }

    sqlx::query(
        "UPDATE professionals SET current_status = ?, updated_at = ? WHERE id = ?",
    )
    .bind(status)
    .bind(Utc::now().to_rfc3339())
    .bind(&professional.id)
    .execute(&state.db)
    .await?;

    Ok(respond::message("Availability updated"))
}
