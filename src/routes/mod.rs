use actix_web::HttpResponse;
use chrono::Utc;
use serde_json::json;

pub mod auth;
pub mod bookings;
pub mod professionals;
pub mod services;
pub mod users;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
