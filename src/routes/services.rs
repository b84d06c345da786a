use actix_web::web;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{new_id, AuthUser},
    db::fetch_service,
    error::{ApiError, ApiResult},
    models::{is_valid_category, slugify, ServiceRow},
    respond::{self, Pagination},
    state::AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/services")
            .service(
                web::resource("")
                    .route(web::get().to(list))
                    .route(web::post().to(create)),
            )
            .service(web::resource("/popular").route(web::get().to(popular)))
            .service(web::resource("/categories").route(web::get().to(categories)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_by_id))
                    .route(web::put().to(update))
                    .route(web::delete().to(delete)),
            ),
    );
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub icon: String,
    pub base_price: f64,
    pub price_unit: String,
    pub rating: RatingView,
    pub total_bookings: i64,
    pub featured: bool,
    pub popularity_score: f64,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub average: f64,
    pub count: i64,
}

impl From<ServiceRow> for ServiceView {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            category: row.category,
            icon: row.icon,
            base_price: row.base_price,
            price_unit: row.price_unit,
            rating: RatingView {
                average: row.rating_average,
                count: row.rating_count,
            },
            total_bookings: row.total_bookings,
            featured: row.featured != 0,
            popularity_score: row.popularity_score,
            status: row.status,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    search: Option<String>,
    category: Option<String>,
    location: Option<String>,
    featured: Option<String>,
    sort_by: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct PopularQuery {
    limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicePayload {
    name: String,
    description: String,
    category: String,
    icon: Option<String>,
    base_price: f64,
    price_unit: Option<String>,
    featured: Option<bool>,
    popularity_score: Option<f64>,
    status: Option<String>,
    locations: Option<Vec<String>>,
}

pub fn clamp_page(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    (page, limit)
}

async fn list(state: web::Data<AppState>, query: web::Query<ListQuery>) -> ApiResult {
    let query = query.into_inner();
    let (page, limit) = clamp_page(query.page, query.limit);

    let mut filters = String::from("WHERE status = 'active'");
    if query.search.is_some() {
        filters.push_str(" AND (name LIKE ? OR description LIKE ?)");
    }
    if query.category.is_some() {
        filters.push_str(" AND category = ?");
    }
    if query.location.is_some() {
        filters.push_str(
            " AND EXISTS (SELECT 1 FROM service_locations l \
             WHERE l.service_id = services.id AND LOWER(l.city) LIKE ?)",
        );
    }
    if query.featured.as_deref() == Some("true") {
        filters.push_str(" AND featured = 1");
    }

    let order = match query.sort_by.as_deref() {
        Some("rating") => "rating_average DESC, rating_count DESC",
        Some("price") => "base_price ASC",
        Some("name") => "name ASC",
        _ => "popularity_score DESC, rating_average DESC",
    };

    let sql = format!(
        "SELECT * FROM services {filters} ORDER BY {order} LIMIT ? OFFSET ?"
    );
    let count_sql = format!("SELECT COUNT(*) FROM services {filters}");

    let search_pattern = query.search.as_deref().map(|s| format!("%{}%", s.trim()));
    let location_pattern = query
        .location
        .as_deref()
        .map(|s| format!("%{}%", s.trim().to_lowercase()));

    let mut rows_query = sqlx::query_as::<_, ServiceRow>(&sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(pattern) = &search_pattern {
        rows_query = rows_query.bind(pattern).bind(pattern);
        count_query = count_query.bind(pattern).bind(pattern);
    }
    if let Some(category) = &query.category {
        rows_query = rows_query.bind(category);
        count_query = count_query.bind(category);
    }
    if let Some(pattern) = &location_pattern {
        rows_query = rows_query.bind(pattern);
        count_query = count_query.bind(pattern);
    }
    rows_query = rows_query.bind(limit).bind((page - 1) * limit);

    let rows = rows_query.fetch_all(&state.db).await?;
    let total = count_query.fetch_one(&state.db).await?;

    let services: Vec<ServiceView> = rows.into_iter().map(ServiceView::from).collect();
    Ok(respond::page(services, Pagination::new(page, limit, total)))
}

async fn popular(state: web::Data<AppState>, query: web::Query<PopularQuery>) -> ApiResult {
    let limit = query.limit.unwrap_or(8).clamp(1, 50);
    let rows = sqlx::query_as::<_, ServiceRow>(
        "SELECT * FROM services WHERE status = 'active' \
         ORDER BY popularity_score DESC, rating_average DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    let services: Vec<ServiceView> = rows.into_iter().map(ServiceView::from).collect();
    Ok(respond::ok(services))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategorySummary {
    category: String,
    count: i64,
    avg_rating: f64,
}

async fn categories(state: web::Data<AppState>) -> ApiResult {
    let rows = sqlx::query_as::<_, (String, i64, f64)>(
        "SELECT category, COUNT(*), AVG(rating_average) FROM services \
         WHERE status = 'active' GROUP BY category ORDER BY COUNT(*) DESC",
    )
    .fetch_all(&state.db)
    .await?;

    let summaries: Vec<CategorySummary> = rows
        .into_iter()
        .map(|(category, count, avg_rating)| CategorySummary {
            category,
            count,
            avg_rating,
        })
        .collect();
    Ok(respond::ok(summaries))
}

async fn get_by_id(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let service = fetch_service(&state.db, &path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(respond::ok(ServiceView::from(service)))
}

fn validate_payload(payload: &ServicePayload) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    let name = payload.name.trim();
    if name.is_empty() || name.len() > 100 {
        errors.push("Service name must be between 1 and 100 characters".to_string());
    }
    if payload.description.trim().is_empty() || payload.description.len() > 500 {
        errors.push("Description must be between 1 and 500 characters".to_string());
    }
    if !is_valid_category(&payload.category) {
        errors.push("Invalid service category".to_string());
    }
    if payload.base_price < 0.0 {
        errors.push("Price cannot be negative".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

async fn replace_locations(
    pool: &sqlx::SqlitePool,
    service_id: &str,
    locations: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM service_locations WHERE service_id = ?")
        .bind(service_id)
        .execute(pool)
        .await?;
    for city in locations {
        let city = city.trim();
        if city.is_empty() {
            continue;
        }
        sqlx::query("INSERT OR IGNORE INTO service_locations (service_id, city) VALUES (?, ?)")
            .bind(service_id)
            .bind(city)
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn create(
    state: web::Data<AppState>,
    auth: AuthUser,
    payload: web::Json<ServicePayload>,
) -> ApiResult {
    auth.require_admin()?;
    let payload = payload.into_inner();
    validate_payload(&payload)?;

    let slug = slugify(payload.name.trim());
    let existing =
        sqlx::query_as::<_, (String,)>("SELECT id FROM services WHERE slug = ? LIMIT 1")
            .bind(&slug)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::Validation(vec![
            "A service with this name already exists".to_string(),
        ]));
    }

    let id = new_id();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"INSERT INTO services
           (id, name, slug, description, category, icon, base_price, price_unit,
            featured, popularity_score, status, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(payload.name.trim())
    .bind(&slug)
    .bind(payload.description.trim())
    .bind(&payload.category)
    .bind(payload.icon.as_deref().unwrap_or(""))
    .bind(payload.base_price)
    .bind(payload.price_unit.as_deref().unwrap_or("hour"))
    .bind(payload.featured.unwrap_or(false) as i64)
    .bind(payload.popularity_score.unwrap_or(0.0))
    .bind(payload.status.as_deref().unwrap_or("active"))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    if let Some(locations) = &payload.locations {
        replace_locations(&state.db, &id, locations).await?;
    }

    let service = fetch_service(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::Internal("created service missing".to_string()))?;
    Ok(respond::created(
        "Service created successfully",
        ServiceView::from(service),
    ))
}

async fn update(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<ServicePayload>,
) -> ApiResult {
    auth.require_admin()?;
    let service_id = path.into_inner();
    let payload = payload.into_inner();
    validate_payload(&payload)?;

    let existing = fetch_service(&state.db, &service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    // The slug follows the name deterministically.
    let slug = slugify(payload.name.trim());
    if slug != existing.slug {
        let clash = sqlx::query_as::<_, (String,)>(
            "SELECT id FROM services WHERE slug = ? AND id != ? LIMIT 1",
        )
        .bind(&slug)
        .bind(&service_id)
        .fetch_optional(&state.db)
        .await?;
        if clash.is_some() {
            return Err(ApiError::Validation(vec![
                "A service with this name already exists".to_string(),
            ]));
        }
    }

    sqlx::query(
        r#"UPDATE services SET name = ?, slug = ?, description = ?, category = ?, icon = ?,
           base_price = ?, price_unit = ?, featured = ?, popularity_score = ?, status = ?,
           updated_at = ?
           WHERE id = ?"#,
    )
    .bind(payload.name.trim())
    .bind(&slug)
    .bind(payload.description.trim())
    .bind(&payload.category)
    .bind(payload.icon.as_deref().unwrap_or(""))
    .bind(payload.base_price)
    .bind(payload.price_unit.as_deref().unwrap_or("hour"))
    .bind(payload.featured.unwrap_or(existing.featured != 0) as i64)
    .bind(payload.popularity_score.unwrap_or(existing.popularity_score))
    .bind(payload.status.as_deref().unwrap_or(&existing.status))
    .bind(Utc::now().to_rfc3339())
    .bind(&service_id)
    .execute(&state.db)
    .await?;

    if let Some(locations) = &payload.locations {
        replace_locations(&state.db, &service_id, locations).await?;
    }

    let service = fetch_service(&state.db, &service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(respond::ok_message(
        "Service updated successfully",
        ServiceView::from(service),
    ))
}

async fn delete(state: web::Data<AppState>, auth: AuthUser, path: web::Path<String>) -> ApiResult {
    auth.require_admin()?;
    let service_id = path.into_inner();

    let existing = fetch_service(&state.db, &service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    sqlx::query("DELETE FROM service_locations WHERE service_id = ?")
        .bind(&existing.id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM professional_services WHERE service_id = ?")
        .bind(&existing.id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(&existing.id)
        .execute(&state.db)
        .await?;

    Ok(respond::message("Service deleted successfully"))
}
