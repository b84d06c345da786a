use actix_web::{test, web, App};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::auth::hash_password;
use crate::state::{AppState, JwtConfig};

// In-memory SQLite disappears when its last connection closes, so the test
// pool is pinned to a single connection.
async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::db::run_migrations(&pool).await.unwrap();
    pool
}

macro_rules! spawn_app {
    ($pool:expr) => {{
        let state = AppState {
            db: $pool.clone(),
            jwt: JwtConfig::from_env(),
        };
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/api/health", web::get().to(crate::routes::health))
                .configure(crate::routes::auth::configure)
                .configure(crate::routes::services::configure)
                .configure(crate::routes::professionals::configure)
                .configure(crate::routes::bookings::configure)
                .configure(crate::routes::users::configure),
        )
        .await
    }};
}

async fn seed_admin(pool: &SqlitePool) -> String {
    let id = crate::auth::new_id();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (id, name, email, phone, password_hash, user_type, status, created_at, updated_at) \
         VALUES (?, 'Admin', 'admin@example.com', '9000000000', ?, 'admin', 'active', ?, ?)",
    )
    .bind(&id)
    .bind(hash_password("admin-password").unwrap())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();
    id
}

fn admin_token(admin_id: &str) -> String {
    crate::auth::sign_token(admin_id, "admin", &JwtConfig::from_env()).unwrap()
}

macro_rules! api {
    ($app:expr, $method:ident, $uri:expr) => {
        test::call_service(
            &$app,
            test::TestRequest::$method().uri($uri).to_request(),
        )
        .await
    };
    ($app:expr, $method:ident, $uri:expr, $token:expr) => {
        test::call_service(
            &$app,
            test::TestRequest::$method()
                .uri($uri)
                .insert_header(("Authorization", format!("Bearer {}", $token)))
                .to_request(),
        )
        .await
    };
    ($app:expr, $method:ident, $uri:expr, $token:expr, $body:expr) => {
        test::call_service(
            &$app,
            test::TestRequest::$method()
                .uri($uri)
                .insert_header(("Authorization", format!("Bearer {}", $token)))
                .set_json($body)
                .to_request(),
        )
        .await
    };
}

async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
    phone: &str,
) -> (String, String) {
    let resp = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": name,
                "email": email,
                "phone": phone,
                "password": "password123",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let id = body["data"]["user"]["id"].as_str().unwrap().to_string();
    (token, id)
}

async fn create_service(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    token: &str,
    name: &str,
) -> String {
    let resp = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/services")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({
                "name": name,
                "description": "Professional home service",
                "category": "cleaning",
                "basePrice": 500.0,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    body["data"]["id"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn health_endpoint_responds() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let resp = api!(app, get, "/api/health");
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "OK");
}

#[actix_web::test]
async fn register_login_and_me_flow() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);

    let (token, _) = register_user(&app, "Asha Nair", "asha@example.com", "9876543210").await;

    let resp = api!(app, get, "/api/auth/me", token);
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["email"], "asha@example.com");
    assert_eq!(body["data"]["userType"], "customer");
    assert!(body["data"].get("passwordHash").is_none());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "asha@example.com", "password": "password123" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["token"].as_str().unwrap().len() > 20);
}

#[actix_web::test]
async fn register_rejects_bad_input() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": "A",
                "email": "not-an-email",
                "phone": "12345",
                "password": "short",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["errors"].as_array().unwrap().len() >= 3);
}

#[actix_web::test]
async fn account_locks_after_repeated_failures() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    register_user(&app, "Ravi Kumar", "ravi@example.com", "9876500001").await;

    for _ in 0..5 {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "ravi@example.com", "password": "wrong-password" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 401);
    }

    // Even the correct password is refused while the lock holds.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "ravi@example.com", "password": "password123" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 423);
}

#[actix_web::test]
async fn service_catalog_crud_and_listing() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let admin_id = seed_admin(&pool).await;
    let token = admin_token(&admin_id);

    let service_id = create_service(&app, &token, "Deep Cleaning").await;

    let resp = api!(app, get, &format!("/api/services/{service_id}"));
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["slug"], "deep-cleaning");
    assert_eq!(body["data"]["basePrice"], 500.0);

    // Same name again clashes on the slug.
    let resp = api!(
        app,
        post,
        "/api/services",
        token,
        &json!({
            "name": "Deep Cleaning",
            "description": "Another one",
            "category": "cleaning",
            "basePrice": 300.0,
        })
    );
    assert_eq!(resp.status(), 400);

    let resp = api!(app, get, "/api/services?category=cleaning");
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 1);

    let resp = api!(app, get, "/api/services/categories");
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["category"], "cleaning");
    assert_eq!(body["data"][0]["count"], 1);

    let resp = api!(app, get, "/api/services/popular");
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn service_mutations_require_admin() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let (customer_token, _) =
        register_user(&app, "Meera Menon", "meera@example.com", "9876500002").await;

    let payload = json!({
        "name": "Plumbing",
        "description": "Pipes and fittings",
        "category": "repair",
        "basePrice": 400.0,
    });

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/services")
            .set_json(&payload)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 401);

    let resp = api!(app, post, "/api/services", customer_token, &payload);
    assert_eq!(resp.status(), 403);
}

struct Marketplace {
    customer_token: String,
    professional_token: String,
    professional_id: String,
    service_id: String,
}

async fn setup_marketplace(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    pool: &SqlitePool,
) -> Marketplace {
    let admin_id = seed_admin(pool).await;
    let admin = admin_token(&admin_id);
    let service_id = create_service(app, &admin, "AC Repair").await;

    let (professional_token, _) =
        register_user(app, "Suresh Pillai", "suresh@example.com", "9876500010").await;
    let resp = api!(
        app,
        post,
        "/api/professionals",
        professional_token,
        &json!({
            "businessName": "Pillai Cooling Works",
            "experienceYears": 6,
            "services": [{ "serviceId": service_id, "hourlyRate": 300.0 }],
            "serviceAreas": [{ "city": "Kochi", "areas": ["Kakkanad"] }],
        })
    );
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let professional_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "pending");

    // Profiles take bookings only once an admin approves them.
    let resp = api!(
        app,
        put,
        &format!("/api/professionals/{professional_id}"),
        admin,
        &json!({ "status": "active", "identityVerification": "verified", "backgroundVerification": "verified" })
    );
    assert_eq!(resp.status(), 200);

    let (customer_token, _) =
        register_user(app, "Lakshmi Varma", "lakshmi@example.com", "9876500011").await;

    Marketplace {
        customer_token,
        professional_token,
        professional_id,
        service_id,
    }
}

#[actix_web::test]
async fn booking_lifecycle_end_to_end() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let m = setup_marketplace(&app, &pool).await;

    let resp = api!(
        app,
        post,
        "/api/bookings",
        m.customer_token,
        &json!({
            "professionalId": m.professional_id,
            "serviceId": m.service_id,
            "scheduledDate": "2026-09-05",
            "estimatedDurationMin": 120,
            "address": "12 MG Road",
            "city": "Kochi",
        })
    );
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["pricing"]["totalAmount"], 600.0);
    assert!(body["data"]["bookingCode"].as_str().unwrap().starts_with("BK"));

    for status in ["confirmed", "in-progress", "completed"] {
        let resp = api!(
            app,
            put,
            &format!("/api/bookings/{booking_id}/status"),
            m.professional_token,
            &json!({ "status": status })
        );
        assert_eq!(resp.status(), 200, "moving to {status}");
    }

    // Completed is final for everything except a dispute.
    let resp = api!(
        app,
        put,
        &format!("/api/bookings/{booking_id}/status"),
        m.professional_token,
        &json!({ "status": "confirmed" })
    );
    assert_eq!(resp.status(), 400);

    let resp = api!(
        app,
        get,
        &format!("/api/bookings/{booking_id}"),
        m.customer_token
    );
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["paymentStatus"], "paid");
    let timeline = body["data"]["timeline"].as_array().unwrap();
    assert_eq!(timeline.len(), 4);
    assert_eq!(timeline[0]["status"], "pending");
    assert_eq!(timeline[3]["status"], "completed");
}

#[actix_web::test]
async fn feedback_updates_professional_rating() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let m = setup_marketplace(&app, &pool).await;

    let resp = api!(
        app,
        post,
        "/api/bookings",
        m.customer_token,
        &json!({
            "professionalId": m.professional_id,
            "serviceId": m.service_id,
            "scheduledDate": "2026-09-05",
            "address": "12 MG Road",
            "city": "Kochi",
        })
    );
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();
    // No duration estimate: one hour at the offered rate.
    assert_eq!(body["data"]["pricing"]["totalAmount"], 300.0);

    // Feedback before completion is refused.
    let resp = api!(
        app,
        post,
        &format!("/api/bookings/{booking_id}/feedback"),
        m.customer_token,
        &json!({ "rating": 5 })
    );
    assert_eq!(resp.status(), 400);

    for status in ["confirmed", "in-progress", "completed"] {
        let resp = api!(
            app,
            put,
            &format!("/api/bookings/{booking_id}/status"),
            m.professional_token,
            &json!({ "status": status })
        );
        assert_eq!(resp.status(), 200);
    }

    let resp = api!(
        app,
        post,
        &format!("/api/bookings/{booking_id}/feedback"),
        m.customer_token,
        &json!({ "rating": 5, "review": "Fixed it fast", "aspects": { "punctuality": 5 } })
    );
    assert_eq!(resp.status(), 200);

    // Only one review per booking.
    let resp = api!(
        app,
        post,
        &format!("/api/bookings/{booking_id}/feedback"),
        m.customer_token,
        &json!({ "rating": 4 })
    );
    assert_eq!(resp.status(), 400);

    let resp = api!(app, get, &format!("/api/professionals/{}", m.professional_id));
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["rating"]["count"], 1);
    assert_eq!(body["data"]["rating"]["average"], 5.0);
    assert_eq!(body["data"]["rating"]["breakdown"][4], 1);
    assert_eq!(body["data"]["completedBookings"], 1);

    // The rejected duplicate left the service aggregate alone as well.
    let resp = api!(app, get, &format!("/api/services/{}", m.service_id));
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["rating"]["count"], 1);
    assert_eq!(body["data"]["rating"]["average"], 5.0);

    // The professional's slot is also write-once.
    let resp = api!(
        app,
        post,
        &format!("/api/bookings/{booking_id}/feedback"),
        m.professional_token,
        &json!({ "rating": 4, "review": "Polite customer" })
    );
    assert_eq!(resp.status(), 200);
    let resp = api!(
        app,
        post,
        &format!("/api/bookings/{booking_id}/feedback"),
        m.professional_token,
        &json!({ "rating": 3 })
    );
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn inactive_parties_read_as_missing() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let m = setup_marketplace(&app, &pool).await;
    let admin_id =
        sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE user_type = 'admin'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let admin = admin_token(&admin_id);

    let booking_payload = json!({
        "professionalId": m.professional_id,
        "serviceId": m.service_id,
        "scheduledDate": "2026-09-05",
        "address": "12 MG Road",
        "city": "Kochi",
    });

    let resp = api!(
        app,
        put,
        &format!("/api/professionals/{}", m.professional_id),
        admin,
        &json!({ "status": "suspended" })
    );
    assert_eq!(resp.status(), 200);

    let resp = api!(app, post, "/api/bookings", m.customer_token, &booking_payload);
    assert_eq!(resp.status(), 404);

    let resp = api!(
        app,
        put,
        &format!("/api/professionals/{}", m.professional_id),
        admin,
        &json!({ "status": "active" })
    );
    assert_eq!(resp.status(), 200);

    sqlx::query("UPDATE services SET status = 'inactive' WHERE id = ?")
        .bind(&m.service_id)
        .execute(&pool)
        .await
        .unwrap();

    let resp = api!(app, post, "/api/bookings", m.customer_token, &booking_payload);
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn booking_requires_matching_offering() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let m = setup_marketplace(&app, &pool).await;
    let admin_id =
        sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE user_type = 'admin'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let other_service = create_service(&app, &admin_token(&admin_id), "Gardening Care").await;

    let resp = api!(
        app,
        post,
        "/api/bookings",
        m.customer_token,
        &json!({
            "professionalId": m.professional_id,
            "serviceId": other_service,
            "scheduledDate": "2026-09-05",
            "address": "12 MG Road",
            "city": "Kochi",
        })
    );
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn bookings_are_scoped_per_role() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let m = setup_marketplace(&app, &pool).await;

    let resp = api!(
        app,
        post,
        "/api/bookings",
        m.customer_token,
        &json!({
            "professionalId": m.professional_id,
            "serviceId": m.service_id,
            "scheduledDate": "2026-09-05",
            "address": "12 MG Road",
            "city": "Kochi",
        })
    );
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    let (stranger_token, _) =
        register_user(&app, "Anil Joseph", "anil@example.com", "9876500012").await;
    let resp = api!(
        app,
        get,
        &format!("/api/bookings/{booking_id}"),
        stranger_token
    );
    assert_eq!(resp.status(), 403);

    let resp = api!(app, get, "/api/bookings", m.customer_token);
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = api!(app, get, "/api/bookings", stranger_token);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn discovery_lists_professionals_for_service() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let m = setup_marketplace(&app, &pool).await;

    let resp = api!(
        app,
        get,
        &format!("/api/professionals/service/{}", m.service_id)
    );
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let pros = body["data"].as_array().unwrap();
    assert_eq!(pros.len(), 1);
    assert_eq!(pros[0]["hourlyRate"], 300.0);
    assert_eq!(pros[0]["serviceAreas"][0], "Kochi");
    assert!(pros[0].get("bankAccountNumber").is_none());

    // Nobody serves this city.
    let resp = api!(
        app,
        get,
        &format!("/api/professionals/service/{}?location=Delhi", m.service_id)
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn dashboard_and_support() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let m = setup_marketplace(&app, &pool).await;

    let resp = api!(
        app,
        post,
        "/api/bookings",
        m.customer_token,
        &json!({
            "professionalId": m.professional_id,
            "serviceId": m.service_id,
            "scheduledDate": "2026-09-05",
            "address": "12 MG Road",
            "city": "Kochi",
        })
    );
    assert_eq!(resp.status(), 201);

    let resp = api!(app, get, "/api/users/dashboard", m.customer_token);
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["stats"]["total"], 1);
    assert_eq!(body["data"]["stats"]["pending"], 1);
    assert!(body["data"]["professional"].is_null());

    let resp = api!(app, get, "/api/users/dashboard", m.professional_token);
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["stats"]["total"], 1);
    assert!(body["data"]["professional"]["professionalId"].is_string());

    let resp = api!(
        app,
        post,
        "/api/users/support",
        m.customer_token,
        &json!({ "subject": "Billing", "message": "Question about my invoice" })
    );
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["ticketId"].as_str().unwrap().starts_with("TK"));
}

#[actix_web::test]
async fn profile_update_validates_phone() {
    let pool = test_pool().await;
    let app = spawn_app!(pool);
    let (token, _) = register_user(&app, "Divya Raj", "divya@example.com", "9876500020").await;

    let resp = api!(
        app,
        put,
        "/api/users/profile",
        token,
        &json!({ "phone": "12345" })
    );
    assert_eq!(resp.status(), 400);

    let resp = api!(
        app,
        put,
        "/api/users/profile",
        token,
        &json!({ "name": "Divya R", "phone": "9876500021" })
    );
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["phone"], "9876500021");
}
